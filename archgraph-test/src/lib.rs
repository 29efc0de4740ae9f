// Integration test utilities and Go fixtures for archgraph.

use std::path::{Path, PathBuf};

use archgraph_core::config::FrontendSection;
use archgraph_core::syntax::SyntaxNode;
use archgraph_frontend::FrontendRegistry;

/// Interfaces, embedding chains and promoted methods in one package.
pub const DOCS_GO: &str = r#"package docs

import (
	"fmt"
	"io"
)

type Writer interface {
	Write(p []byte) (int, error)
}

type Validator interface {
	Writer
	Validate() error
}

type Document struct {
	Title string
	Body  []byte
}

func (d *Document) Write(p []byte) (int, error) {
	d.Body = append(d.Body, p...)
	return len(p), nil
}

type JSONDocument struct {
	Document
	Indent int
}

type ValidatingDocument struct {
	*JSONDocument
	Rules []string
}

func (v *ValidatingDocument) Validate() error {
	if len(v.Rules) == 0 {
		return fmt.Errorf("no rules for %s", v.Title)
	}
	return nil
}

func NewDocument(title string) *Document {
	return &Document{Title: title}
}

func Render(w io.Writer, d Writer) error {
	_, err := fmt.Fprintln(w, NewDocument("draft").Title)
	return err
}
"#;

/// A second package that imports `docs` by its package path.
pub const APP_GO: &str = r#"package app

import "docs"

var Default docs.Writer

func Publish(d *docs.Document) error {
	_, err := d.Write([]byte("hello"))
	return err
}
"#;

/// Two types that point at each other.
pub const CYCLE_GO: &str = r"package ring

type Node struct {
	next *Edge
}

type Edge struct {
	from *Node
}
";

/// A temporary directory of Go sources.
#[derive(Debug)]
pub struct GoFixture {
    pub dir: tempfile::TempDir,
}

impl GoFixture {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create tempdir"),
        }
    }

    /// The `docs` and `app` packages in their own directories.
    pub fn two_packages() -> Self {
        let fixture = Self::new();
        fixture.write("docs/docs.go", DOCS_GO);
        fixture.write("app/main.go", APP_GO);
        fixture
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `source` at `rel`, creating parent directories.
    pub fn write(&self, rel: &str, source: &str) -> PathBuf {
        let path = self.dir.path().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create fixture dir");
        }
        std::fs::write(&path, source).expect("write fixture file");
        path
    }

    /// Parse every Go file under the fixture with default discovery rules.
    pub fn parse(&self) -> Vec<SyntaxNode> {
        let registry = FrontendRegistry::new();
        registry
            .get("go")
            .expect("go front end")
            .parse_dir(self.path(), &FrontendSection::default())
            .expect("parse fixture")
    }
}

impl Default for GoFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse a single Go source text as if it lived at `name`.
pub fn parse_go(source: &str, name: &str) -> SyntaxNode {
    FrontendRegistry::new()
        .get("go")
        .expect("go front end")
        .parse_source(source, Path::new(name))
        .expect("parse source")
}

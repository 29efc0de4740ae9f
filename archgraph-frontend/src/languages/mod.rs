pub mod go;
mod helpers;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use archgraph_core::config::FrontendSection;
use archgraph_core::syntax::SyntaxNode;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::{FrontendError, Result};

/// Trait implemented by each language's front end.
pub trait Frontend: Send + Sync + std::fmt::Debug {
    /// Language identifier (e.g., "go").
    fn language(&self) -> &'static str;

    /// File extensions this front end handles.
    fn extensions(&self) -> &'static [&'static str];

    /// Tree-sitter language for parsing.
    fn tree_sitter_language(&self) -> tree_sitter::Language;

    /// Convert a parsed tree-sitter tree into the archgraph syntax tree.
    fn convert(&self, tree: &tree_sitter::Tree, source: &str, path: &Path) -> Result<SyntaxNode>;

    /// Parse one source text. Syntax errors fail the whole unit.
    fn parse_source(&self, source: &str, path: &Path) -> Result<SyntaxNode> {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&self.tree_sitter_language())
            .map_err(|e| FrontendError::TreeSitter(format!("Failed to set language: {e}")))?;

        let tree = parser
            .parse(source, None)
            .ok_or_else(|| FrontendError::Parse {
                path: path.to_string_lossy().to_string(),
                message: "tree-sitter parse returned None".to_string(),
            })?;

        if let Some(line) = helpers::first_error_line(tree.root_node()) {
            return Err(FrontendError::Parse {
                path: path.to_string_lossy().to_string(),
                message: format!("syntax error at line {line}"),
            });
        }

        self.convert(&tree, source, path)
    }

    fn parse_file(&self, path: &Path) -> Result<SyntaxNode> {
        let source = std::fs::read_to_string(path)?;
        self.parse_source(&source, path)
    }

    /// Parse several files in parallel; results keep the input order.
    fn parse_files(&self, paths: &[PathBuf]) -> Vec<Result<SyntaxNode>> {
        paths.par_iter().map(|path| self.parse_file(path)).collect()
    }

    /// Parse every matching file under `dir`, sorted by path. The first
    /// failing file fails the call.
    fn parse_dir(&self, dir: &Path, section: &FrontendSection) -> Result<Vec<SyntaxNode>> {
        let files = crate::discover_sources(dir, section, self.extensions())?;
        let trees = self
            .parse_files(&files)
            .into_iter()
            .collect::<Result<Vec<_>>>()?;
        info!(
            language = self.language(),
            dir = %dir.display(),
            files = trees.len(),
            "Parsed directory"
        );
        Ok(trees)
    }
}

/// Registry of all supported front ends.
#[derive(Debug)]
pub struct FrontendRegistry {
    frontends: HashMap<String, Arc<dyn Frontend>>,
    extension_map: HashMap<String, String>,
}

impl FrontendRegistry {
    pub fn new() -> Self {
        let mut reg = Self {
            frontends: HashMap::new(),
            extension_map: HashMap::new(),
        };
        reg.register(Arc::new(go::GoFrontend));
        reg
    }

    pub fn register(&mut self, frontend: Arc<dyn Frontend>) {
        for ext in frontend.extensions() {
            self.extension_map
                .insert((*ext).to_string(), frontend.language().to_string());
        }
        debug!(language = frontend.language(), "Registered front end");
        self.frontends
            .insert(frontend.language().to_string(), frontend);
    }

    /// Look up the front end for a file by its extension.
    pub fn for_file(&self, path: &Path) -> Option<Arc<dyn Frontend>> {
        let ext = path.extension()?.to_str()?;
        let language = self.extension_map.get(ext)?;
        self.frontends.get(language).cloned()
    }

    /// Get a front end by its language identifier.
    pub fn get(&self, language: &str) -> Result<Arc<dyn Frontend>> {
        self.frontends
            .get(language)
            .cloned()
            .ok_or_else(|| FrontendError::UnsupportedLanguage(language.to_string()))
    }

    /// Registered language identifiers, sorted.
    pub fn languages(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.frontends.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

impl Default for FrontendRegistry {
    fn default() -> Self {
        Self::new()
    }
}

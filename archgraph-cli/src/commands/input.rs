use std::path::{Path, PathBuf};

use anyhow::Context;
use archgraph_core::config::ArchgraphConfig;
use archgraph_core::syntax::SyntaxNode;
use archgraph_frontend::FrontendRegistry;
use tracing::{info, warn};

/// Turn command-line inputs into syntax trees.
///
/// Directories are parsed through the front end honoring the configured
/// include and exclude globs; `.json` files hold a serialized tree; any
/// other file goes to the front end registered for its extension.
pub fn load_trees(paths: &[PathBuf], config: &ArchgraphConfig) -> anyhow::Result<Vec<SyntaxNode>> {
    let registry = FrontendRegistry::new();
    let mut trees = Vec::new();

    for path in paths {
        let path = std::fs::canonicalize(path)
            .with_context(|| format!("Cannot resolve path: {}", path.display()))?;

        if path.is_dir() {
            let mut found = 0;
            for language in registry.languages() {
                let frontend = registry.get(language)?;
                let parsed = frontend
                    .parse_dir(&path, &config.frontend)
                    .with_context(|| format!("Cannot parse directory {}", path.display()))?;
                found += parsed.len();
                trees.extend(parsed);
            }
            if found == 0 {
                warn!(dir = %path.display(), "No source files found");
            }
        } else {
            trees.push(load_file(&path, &registry)?);
        }
    }

    info!(inputs = paths.len(), units = trees.len(), "Loaded syntax trees");
    Ok(trees)
}

/// Parse a single source file or read a serialized tree.
pub fn load_file(path: &Path, registry: &FrontendRegistry) -> anyhow::Result<SyntaxNode> {
    if path.extension().and_then(|e| e.to_str()) == Some("json") {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read {}", path.display()))?;
        return serde_json::from_str(&text)
            .with_context(|| format!("Cannot parse syntax tree {}", path.display()));
    }

    let Some(frontend) = registry.for_file(path) else {
        anyhow::bail!("Unsupported input: {}", path.display());
    };
    frontend
        .parse_file(path)
        .with_context(|| format!("Cannot parse {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_input_is_reported_by_path() {
        let err = load_trees(
            &[PathBuf::from("/nonexistent/archgraph/input.go")],
            &ArchgraphConfig::default(),
        )
        .unwrap_err();
        assert!(format!("{err:#}").starts_with("Cannot resolve path"));
    }

    #[test]
    fn json_trees_bypass_the_front_end() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tree.json");
        std::fs::write(
            &path,
            r#"{"kind":"module","attributes":{"package_name":{"kind":"str","value":"docs"}}}"#,
        )
        .unwrap();

        let trees = load_trees(&[path], &ArchgraphConfig::default()).unwrap();
        assert_eq!(trees.len(), 1);
        assert_eq!(trees[0].attributes.str("package_name"), Some("docs"));
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "hello").unwrap();
        let err = load_trees(&[path], &ArchgraphConfig::default()).unwrap_err();
        assert!(err.to_string().starts_with("Unsupported input"));
    }
}

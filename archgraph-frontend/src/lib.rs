//! Front ends turning source files into archgraph syntax trees.

pub mod discover;
pub mod languages;

pub use discover::discover_sources;
pub use languages::{Frontend, FrontendRegistry};

/// Error type for the front ends.
#[derive(thiserror::Error, Debug)]
pub enum FrontendError {
    #[error("Parse error in {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("Tree-sitter error: {0}")]
    TreeSitter(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),
}

pub type Result<T> = std::result::Result<T, FrontendError>;

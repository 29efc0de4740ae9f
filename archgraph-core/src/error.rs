/// Top-level archgraph error type.
///
/// All fallible operations in `archgraph-core` return [`Result<T, ArchgraphError>`](Result).
/// Each variant wraps a domain-specific error enum, allowing callers to
/// match on the error source without losing type information.
#[derive(thiserror::Error, Debug)]
pub enum ArchgraphError {
    /// Error while building or merging a structure model or dependency graph.
    #[error("Analysis error: {0}")]
    Analysis(#[from] AnalysisError),

    /// Error in configuration parsing or validation.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors raised by the structure and dependency analyzers.
#[derive(thiserror::Error, Debug)]
pub enum AnalysisError {
    /// The syntax tree handed to an analyzer breaks the input contract.
    #[error("Contract violation on {kind} node: missing {missing}")]
    ContractViolation {
        /// Kind of the offending node.
        kind: String,
        /// The attribute or shape the contract requires.
        missing: String,
    },

    /// Two models built for different languages were merged.
    #[error("Cannot merge {found} model into {expected} model")]
    LanguageMismatch {
        /// Language tag of the receiving model.
        expected: String,
        /// Language tag of the donor model.
        found: String,
    },
}

/// Errors in archgraph configuration parsing and validation.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// The configuration file does not exist at the expected path.
    #[error("Config file not found: {0}")]
    NotFound(String),

    /// Configuration values are present but semantically invalid.
    #[error("Invalid config: {0}")]
    Invalid(String),

    /// Configuration file syntax could not be parsed (TOML error).
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Convenience alias for `Result<T, ArchgraphError>`.
pub type Result<T> = std::result::Result<T, ArchgraphError>;

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Option key naming the import path prefix of the analyzed module.
pub const LOCAL_MODULE_OPTION: &str = "local_module";

/// Top-level archgraph configuration, matching `archgraph.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArchgraphConfig {
    #[serde(default)]
    pub analysis: DependencyConfig,
    #[serde(default)]
    pub frontend: FrontendSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

impl ArchgraphConfig {
    /// Parse a configuration from TOML text and validate it.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Parse(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.frontend.include_patterns.is_empty() {
            return Err(ConfigError::Invalid(
                "frontend.include_patterns must not be empty".into(),
            ));
        }
        if !LOGGING_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "unknown logging.level '{}', expected one of {}",
                self.logging.level,
                LOGGING_LEVELS.join(", ")
            )));
        }
        Ok(())
    }
}

/// Settings for dependency analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DependencyConfig {
    /// Extend dependency queries with transitively reachable nodes.
    pub include_indirect: bool,
    /// Follow edges out of external nodes when listing external dependencies.
    pub analyze_external: bool,
    /// Hop bound for indirect and external traversals.
    pub max_depth: usize,
    /// Front-end specific tuning.
    pub options: BTreeMap<String, String>,
}

impl DependencyConfig {
    pub fn option(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }

    /// Import path prefix treated as part of the analyzed unit set.
    pub fn local_module(&self) -> Option<&str> {
        self.option(LOCAL_MODULE_OPTION).filter(|m| !m.is_empty())
    }
}

impl Default for DependencyConfig {
    fn default() -> Self {
        Self {
            include_indirect: true,
            analyze_external: true,
            max_depth: 10,
            options: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontendSection {
    pub include_patterns: Vec<String>,
    pub exclude_patterns: Vec<String>,
}

impl Default for FrontendSection {
    fn default() -> Self {
        Self {
            include_patterns: vec!["**/*.go".into()],
            exclude_patterns: vec![
                "**/vendor/**".into(),
                "**/testdata/**".into(),
                "**/.git/**".into(),
            ],
        }
    }
}

const LOGGING_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Default `tracing` filter when neither flags nor `RUST_LOG` pick one.
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "warn".into(),
        }
    }
}

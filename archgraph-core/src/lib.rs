//! archgraph core library — structure models, dependency graphs, and metrics.
//!
//! Analyzers consume a language-neutral [`syntax::SyntaxNode`] tree produced
//! by a front end. [`structure::GoStructureAnalyzer`] builds a
//! [`structure::StructureModel`]; [`dependency::GoDependencyAnalyzer`] builds a
//! [`dependency::DependencyGraph`]. [`metrics::MetricsCollector`] aggregates
//! over structure models.

pub mod config;
pub mod dependency;
pub mod error;
pub mod metrics;
pub mod method_set;
pub mod structure;
pub mod syntax;
pub mod types;

pub use error::{AnalysisError, ArchgraphError, ConfigError, Result};

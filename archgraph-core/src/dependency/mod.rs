//! Dependency graph: modules, types, functions and contracts keyed by
//! qualified id, with include, reference, satisfy, compose and inherit
//! edges between them.

pub mod analyzer;
pub mod graph;

pub use analyzer::{DependencyAnalyzer, GoDependencyAnalyzer};
pub use graph::{
    Cycle, Dependency, DependencyGraph, DependencyKind, Location, MergeSummary, Node, NodeKind,
};

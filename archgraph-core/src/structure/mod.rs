//! Structure model: declarations of one language and how they contain,
//! implement, embed and reference each other.

pub mod builder;
pub mod merge;
pub mod model;
pub mod patterns;

use tracing::info;

use crate::error::Result;
use crate::syntax::SyntaxNode;

pub use model::{Element, ElementId, ElementKind, RelationKind, Relationship, StructureModel};

/// Trait implemented by each language's structure analyzer.
pub trait StructureAnalyzer: Send + Sync + std::fmt::Debug {
    /// Language identifier stamped on every model this analyzer builds.
    fn language(&self) -> &'static str;

    /// Build a model for one translation unit and run pattern detection.
    fn analyze(&self, tree: &SyntaxNode) -> Result<StructureModel>;

    /// Fold `donor` into `base`; both must carry this analyzer's language.
    fn merge(&self, base: &mut StructureModel, donor: &StructureModel) -> Result<()> {
        merge::merge(base, donor)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct GoStructureAnalyzer;

impl StructureAnalyzer for GoStructureAnalyzer {
    fn language(&self) -> &'static str {
        "go"
    }

    fn analyze(&self, tree: &SyntaxNode) -> Result<StructureModel> {
        let mut model = builder::build(tree, self.language())?;
        patterns::detect_patterns(&mut model);
        info!(
            elements = model.elements().len(),
            relationships = model.relationships().len(),
            "Structure analysis complete"
        );
        Ok(model)
    }
}

use std::collections::HashMap;

use tracing::debug;

use crate::error::{AnalysisError, Result};

use super::model::{ElementId, ElementKind, StructureModel};

/// Fold `donor` into `base`.
///
/// Packages are unified by name, so a donor package that already exists in
/// `base` is dropped and everything that pointed at it is re-pointed at the
/// surviving one. All other donor elements are appended as new elements.
/// Relationships are re-keyed to the receiving arena and deduplicated.
pub fn merge(base: &mut StructureModel, donor: &StructureModel) -> Result<()> {
    if base.language() != donor.language() {
        return Err(AnalysisError::LanguageMismatch {
            expected: base.language().to_string(),
            found: donor.language().to_string(),
        }
        .into());
    }

    let mut remap: HashMap<ElementId, ElementId> = HashMap::with_capacity(donor.elements().len());
    let mut unified = 0usize;
    for element in donor.elements() {
        let existing = if element.kind == ElementKind::Package {
            base.find(ElementKind::Package, &element.name)
        } else {
            None
        };
        let id = match existing {
            Some(id) => {
                unified += 1;
                id
            }
            None => base.add_element(element.kind, &element.name, element.attributes.clone()),
        };
        remap.insert(element.id, id);
    }

    let mut added = 0usize;
    for rel in donor.relationships() {
        let (Some(&source), Some(&target)) = (remap.get(&rel.source), remap.get(&rel.target))
        else {
            continue;
        };
        added += usize::from(base.add_relationship(rel.kind, source, target));
    }

    debug!(
        elements = donor.elements().len() - unified,
        packages_unified = unified,
        relationships = added,
        "Merged structure model"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ArchgraphError;
    use crate::structure::model::RelationKind;
    use crate::syntax::Attributes;

    fn unit(package: &str, decl: &str) -> StructureModel {
        let mut model = StructureModel::new("go");
        let pkg = model.add_element(ElementKind::Package, package, Attributes::new());
        let ty = model.add_element(ElementKind::Type, decl, Attributes::new());
        model.add_relationship(RelationKind::Contains, pkg, ty);
        model
    }

    #[test]
    fn same_named_packages_are_unified() {
        let mut base = unit("docs", "Document");
        let donor = unit("docs", "Writer");
        merge(&mut base, &donor).unwrap();

        assert_eq!(base.elements_of_kind(ElementKind::Package).count(), 1);
        assert_eq!(base.elements().len(), 3);
        assert!(base.relates(RelationKind::Contains, "docs", "Document"));
        assert!(base.relates(RelationKind::Contains, "docs", "Writer"));
    }

    #[test]
    fn distinct_packages_are_kept() {
        let mut base = unit("docs", "Document");
        merge(&mut base, &unit("store", "Document")).unwrap();
        assert_eq!(base.elements_of_kind(ElementKind::Package).count(), 2);
        assert_eq!(base.elements_of_kind(ElementKind::Type).count(), 2);
    }

    #[test]
    fn merging_twice_appends_declarations_again() {
        let mut base = unit("docs", "Document");
        let donor = unit("docs", "Writer");
        merge(&mut base, &donor).unwrap();
        let before = base.relationships().len();
        merge(&mut base, &donor).unwrap();
        // A second copy of Writer is appended with its own contains edge.
        assert_eq!(base.relationships().len(), before + 1);
        assert_eq!(base.elements_of_kind(ElementKind::Package).count(), 1);
    }

    #[test]
    fn language_mismatch_is_rejected() {
        let mut base = unit("docs", "Document");
        let donor = StructureModel::new("rust");
        let err = merge(&mut base, &donor).unwrap_err();
        assert!(matches!(
            err,
            ArchgraphError::Analysis(AnalysisError::LanguageMismatch { .. })
        ));
        assert_eq!(base.elements().len(), 2);
    }
}

use tracing::debug;

use crate::error::{AnalysisError, Result};
use crate::syntax::{SyntaxKind, SyntaxNode, attr};
use crate::types::MethodSpec;

use super::model::{ElementId, ElementKind, RelationKind, StructureModel};

/// Element kind a syntax node materializes as. `None` means the node itself
/// produces nothing but its children are still visited.
fn element_kind(kind: SyntaxKind) -> Option<ElementKind> {
    match kind {
        SyntaxKind::Type => Some(ElementKind::Type),
        SyntaxKind::Interface => Some(ElementKind::Interface),
        SyntaxKind::Function => Some(ElementKind::Function),
        SyntaxKind::Method => Some(ElementKind::Method),
        SyntaxKind::Variable => Some(ElementKind::Variable),
        SyntaxKind::Module | SyntaxKind::Import | SyntaxKind::Block => None,
    }
}

/// Walk one translation unit and produce its elements plus their
/// `contains` relationships.
pub fn build(tree: &SyntaxNode, language: &str) -> Result<StructureModel> {
    if tree.kind != SyntaxKind::Module {
        return Err(AnalysisError::ContractViolation {
            kind: tree.kind.to_string(),
            missing: "module root".into(),
        }
        .into());
    }
    let Some(package_name) = tree.attributes.str(attr::PACKAGE_NAME) else {
        return Err(AnalysisError::ContractViolation {
            kind: tree.kind.to_string(),
            missing: attr::PACKAGE_NAME.into(),
        }
        .into());
    };

    let mut model = StructureModel::new(language);
    let package = model.add_element(ElementKind::Package, package_name, tree.attributes.clone());

    for child in &tree.children {
        visit(child, package, &mut model);
    }
    attach_method_tables(&mut model);

    debug!(
        package = package_name,
        elements = model.elements().len(),
        "Built structure skeleton"
    );
    Ok(model)
}

fn visit(node: &SyntaxNode, package: ElementId, model: &mut StructureModel) {
    if let Some(kind) = element_kind(node.kind) {
        match node.name() {
            Some(name) if !name.is_empty() => {
                let id = model.add_element(kind, name, node.attributes.clone());
                model.add_relationship(RelationKind::Contains, package, id);
            }
            _ => debug!(kind = %node.kind, line = node.position.line, "Skipping unnamed declaration"),
        }
    }

    // Blocks, imports and nested modules are transparent: their children
    // belong to the enclosing package.
    for child in &node.children {
        visit(child, package, model);
    }
}

/// Give every type element a `methods` table listing the methods whose
/// receiver resolves to it, merged with any table the front end supplied.
fn attach_method_tables(model: &mut StructureModel) {
    let mut tables: Vec<(ElementId, Vec<MethodSpec>)> = Vec::new();

    for method in model.elements_of_kind(ElementKind::Method) {
        let Some(receiver) = method
            .attributes
            .ty(attr::RECEIVER_TYPE)
            .and_then(|t| t.named_target())
        else {
            continue;
        };
        let Some(owner) = model.find(ElementKind::Type, receiver) else {
            continue;
        };
        let signature = method
            .attributes
            .signature(attr::SIGNATURE)
            .cloned()
            .unwrap_or_default();
        let spec = MethodSpec::new(method.name.clone(), signature);
        match tables.iter_mut().find(|(id, _)| *id == owner) {
            Some((_, specs)) => specs.push(spec),
            None => tables.push((owner, vec![spec])),
        }
    }

    for (owner, specs) in tables {
        let Some(element) = model.element_mut(owner) else {
            continue;
        };
        let mut table: Vec<MethodSpec> = element
            .attributes
            .methods(attr::METHODS)
            .map(<[MethodSpec]>::to_vec)
            .unwrap_or_default();
        for spec in specs {
            if !table.iter().any(|m| m.name == spec.name) {
                table.push(spec);
            }
        }
        element.attributes.insert(attr::METHODS, table);
    }
}

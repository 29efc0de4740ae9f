use tracing::debug;

use crate::method_set::MethodIndex;
use crate::syntax::attr;
use crate::types::{BodyReference, MethodSpec, TypeDescriptor, is_builtin};

use super::model::{ElementId, ElementKind, RelationKind, StructureModel};

/// Run every detection pass over a freshly built model, in order.
///
/// Passes only read attributes; a missing or mistyped attribute means the
/// element contributes nothing to that pass.
pub fn detect_patterns(model: &mut StructureModel) {
    let passes: [(&str, fn(&mut StructureModel) -> usize); 6] = [
        ("type_references", detect_type_references),
        ("method_receivers", detect_method_receivers),
        ("interface_embeddings", detect_interface_embeddings),
        ("interface_implementations", detect_implementations),
        ("composition", detect_composition),
        ("calls", detect_calls),
    ];
    for (name, pass) in passes {
        let added = pass(model);
        debug!(pass = name, added, "Pattern pass complete");
    }
}

// ── Type references ────────────────────────────────────────────────

fn referenced_types(model: &StructureModel) -> Vec<(ElementId, Vec<TypeDescriptor>)> {
    let mut out = Vec::new();
    for element in model.elements() {
        let attrs = &element.attributes;
        let mut types: Vec<TypeDescriptor> = Vec::new();
        match element.kind {
            ElementKind::Type => {
                if let Some(fields) = attrs.fields(attr::FIELDS) {
                    types.extend(fields.iter().map(|f| f.ty.clone()));
                }
                if let Some(underlying) = attrs.ty(attr::TYPE) {
                    types.push(underlying.clone());
                }
            }
            ElementKind::Function | ElementKind::Method => {
                if let Some(sig) = attrs.signature(attr::SIGNATURE) {
                    types.extend(sig.types().cloned());
                }
            }
            ElementKind::Interface => {
                if let Some(methods) = attrs.methods(attr::METHODS) {
                    for method in methods {
                        types.extend(method.signature.types().cloned());
                    }
                }
                if let Some(embedded) = attrs.types(attr::EMBEDDED) {
                    types.extend(embedded.iter().cloned());
                }
            }
            ElementKind::Package | ElementKind::Variable => continue,
        }
        out.push((element.id, types));
    }
    out
}

fn detect_type_references(model: &mut StructureModel) -> usize {
    let mut added = 0;
    for (source, types) in referenced_types(model) {
        for ty in &types {
            for leaf in ty.named_leaves() {
                if is_builtin(leaf) {
                    continue;
                }
                if let Some(target) = model.find_type_or_interface(leaf) {
                    added += usize::from(model.add_relationship(
                        RelationKind::References,
                        source,
                        target,
                    ));
                }
            }
        }
    }
    added
}

// ── Method receivers ───────────────────────────────────────────────

fn detect_method_receivers(model: &mut StructureModel) -> usize {
    let pairs: Vec<(ElementId, ElementId)> = model
        .elements_of_kind(ElementKind::Method)
        .filter_map(|method| {
            let receiver = method.attributes.ty(attr::RECEIVER_TYPE)?.named_target()?;
            let owner = model.find(ElementKind::Type, receiver)?;
            Some((method.id, owner))
        })
        .collect();

    pairs
        .into_iter()
        .filter(|&(method, owner)| {
            model.add_relationship(RelationKind::MethodReceiver, method, owner)
        })
        .count()
}

// ── Interface embeddings ───────────────────────────────────────────

fn detect_interface_embeddings(model: &mut StructureModel) -> usize {
    let mut pairs = Vec::new();
    for iface in model.elements_of_kind(ElementKind::Interface) {
        let Some(embedded) = iface.attributes.types(attr::EMBEDDED) else {
            continue;
        };
        for ty in embedded {
            if let Some(target) = ty
                .named_target()
                .and_then(|name| model.find(ElementKind::Interface, name))
            {
                pairs.push((iface.id, target));
            }
        }
    }

    pairs
        .into_iter()
        .filter(|&(iface, target)| {
            model.add_relationship(RelationKind::InterfaceEmbeds, iface, target)
        })
        .count()
}

// ── Interface implementation ───────────────────────────────────────

fn embedded_names(types: &[TypeDescriptor]) -> Vec<String> {
    types
        .iter()
        .filter_map(TypeDescriptor::named_target)
        .map(str::to_string)
        .collect()
}

fn method_index(model: &StructureModel) -> MethodIndex {
    let mut index = MethodIndex::new();
    for element in model.elements() {
        let attrs = &element.attributes;
        match element.kind {
            ElementKind::Interface => {
                let methods = attrs.methods(attr::METHODS).unwrap_or_default();
                let embedded = embedded_names(attrs.types(attr::EMBEDDED).unwrap_or_default());
                index.add_interface(&element.name, methods, embedded);
            }
            ElementKind::Type => {
                let embedded: Vec<String> = attrs
                    .fields(attr::FIELDS)
                    .unwrap_or_default()
                    .iter()
                    .filter(|f| f.embedded)
                    .filter_map(|f| f.ty.named_target())
                    .map(str::to_string)
                    .collect();
                index.add_type(&element.name, embedded);
                for method in attrs.methods(attr::METHODS).unwrap_or_default() {
                    index.add_method(&element.name, method.clone());
                }
            }
            ElementKind::Method => {
                let Some(receiver) = attrs
                    .ty(attr::RECEIVER_TYPE)
                    .and_then(TypeDescriptor::named_target)
                else {
                    continue;
                };
                let signature = attrs
                    .signature(attr::SIGNATURE)
                    .cloned()
                    .unwrap_or_default();
                index.add_method(receiver, MethodSpec::new(element.name.clone(), signature));
            }
            _ => {}
        }
    }
    index
}

fn detect_implementations(model: &mut StructureModel) -> usize {
    let index = method_index(model);
    let pairs: Vec<(ElementId, ElementId)> = index
        .implementations()
        .into_iter()
        .filter_map(|(type_name, iface)| {
            Some((
                model.find(ElementKind::Type, type_name)?,
                model.find(ElementKind::Interface, iface)?,
            ))
        })
        .collect();

    pairs
        .into_iter()
        .filter(|&(ty, iface)| model.add_relationship(RelationKind::Implements, ty, iface))
        .count()
}

// ── Composition ────────────────────────────────────────────────────

fn detect_composition(model: &mut StructureModel) -> usize {
    let mut pairs = Vec::new();
    for ty in model.elements_of_kind(ElementKind::Type) {
        for field in ty.attributes.fields(attr::FIELDS).unwrap_or_default() {
            if !field.embedded {
                continue;
            }
            if let Some(target) = field
                .ty
                .named_target()
                .and_then(|name| model.find(ElementKind::Type, name))
            {
                pairs.push((ty.id, target));
            }
        }
    }

    pairs
        .into_iter()
        .filter(|&(ty, target)| model.add_relationship(RelationKind::Embeds, ty, target))
        .count()
}

// ── Calls ──────────────────────────────────────────────────────────

fn detect_calls(model: &mut StructureModel) -> usize {
    let mut pairs = Vec::new();
    for element in model.elements() {
        if !matches!(element.kind, ElementKind::Function | ElementKind::Method) {
            continue;
        }
        for reference in element.attributes.body(attr::BODY).unwrap_or_default() {
            if let BodyReference::Symbol { name } = reference {
                if let Some(callee) = model.find(ElementKind::Function, name) {
                    pairs.push((element.id, callee));
                }
            }
        }
    }

    pairs
        .into_iter()
        .filter(|&(caller, callee)| model.add_relationship(RelationKind::Calls, caller, callee))
        .count()
}

//! Method-set composition and structural interface satisfaction.
//!
//! Both analyzers feed declarations into a [`MethodIndex`] and ask it which
//! concrete types satisfy which interfaces, so the structure model and the
//! dependency graph agree on `implements`/`satisfy` edges.

use std::collections::{HashMap, HashSet};

use crate::types::MethodSpec;

#[derive(Debug, Clone, Default)]
struct Shape {
    methods: Vec<MethodSpec>,
    embedded: Vec<String>,
}

/// Declarations of one unit, keyed by unqualified name.
#[derive(Debug, Default)]
pub struct MethodIndex {
    interfaces: Vec<(String, Shape)>,
    interface_pos: HashMap<String, usize>,
    types: Vec<(String, Shape)>,
    type_pos: HashMap<String, usize>,
}

impl MethodIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an interface with its own methods and embedded interface names.
    pub fn add_interface(&mut self, name: &str, methods: &[MethodSpec], embedded: Vec<String>) {
        let shape = upsert(&mut self.interfaces, &mut self.interface_pos, name);
        push_unique(&mut shape.methods, methods.iter().cloned());
        shape.embedded.extend(embedded);
    }

    /// Register a concrete type with the names of its embedded fields.
    pub fn add_type(&mut self, name: &str, embedded: Vec<String>) {
        let shape = upsert(&mut self.types, &mut self.type_pos, name);
        shape.embedded.extend(embedded);
    }

    /// Attach a method to the type named by its receiver.
    pub fn add_method(&mut self, receiver: &str, method: MethodSpec) {
        let shape = upsert(&mut self.types, &mut self.type_pos, receiver);
        push_unique(&mut shape.methods, std::iter::once(method));
    }

    pub fn is_interface(&self, name: &str) -> bool {
        self.interface_pos.contains_key(name)
    }

    pub fn is_type(&self, name: &str) -> bool {
        self.type_pos.contains_key(name)
    }

    /// Methods declared directly on a type, without promotion.
    pub fn own_methods(&self, type_name: &str) -> &[MethodSpec] {
        self.type_pos
            .get(type_name)
            .map(|&i| self.types[i].1.methods.as_slice())
            .unwrap_or_default()
    }

    /// Own methods plus, recursively, those of embedded interfaces.
    pub fn interface_methods(&self, name: &str) -> Vec<MethodSpec> {
        let mut out = Vec::new();
        let mut visited = HashSet::new();
        self.collect_interface(name, &mut visited, &mut out);
        out
    }

    fn collect_interface<'a>(
        &'a self,
        name: &'a str,
        visited: &mut HashSet<&'a str>,
        out: &mut Vec<MethodSpec>,
    ) {
        if !visited.insert(name) {
            return;
        }
        let Some(&i) = self.interface_pos.get(name) else {
            return;
        };
        let shape = &self.interfaces[i].1;
        push_unique(out, shape.methods.iter().cloned());
        for embedded in &shape.embedded {
            self.collect_interface(embedded, visited, out);
        }
    }

    /// Own methods plus methods promoted through embedded fields, gathered
    /// one embedding depth at a time. Promoted methods record the embedded
    /// field they came through. A method at a shallower depth shadows every
    /// deeper one of the same name; candidates found at the same depth are
    /// all kept when their signatures differ.
    pub fn type_methods(&self, name: &str) -> Vec<MethodSpec> {
        let mut out = Vec::new();
        let Some(&i) = self.type_pos.get(name) else {
            return out;
        };
        let root = &self.types[i].1;
        push_unique(&mut out, root.methods.iter().cloned());

        let mut visited: HashSet<&str> = HashSet::from([name]);
        // (embedded type, top-level field it is reached through)
        let mut level: Vec<(&str, &str)> =
            root.embedded.iter().map(|e| (e.as_str(), e.as_str())).collect();

        while !level.is_empty() {
            let mut found = Vec::new();
            let mut next = Vec::new();
            for (ty, via) in level {
                if !visited.insert(ty) {
                    continue;
                }
                if let Some(&i) = self.type_pos.get(ty) {
                    let shape = &self.types[i].1;
                    found.extend(shape.methods.iter().map(|m| m.clone().promoted_from(via)));
                    next.extend(shape.embedded.iter().map(|e| (e.as_str(), via)));
                } else if self.is_interface(ty) {
                    // An embedded interface promotes its whole method set.
                    found.extend(
                        self.interface_methods(ty)
                            .into_iter()
                            .map(|m| m.promoted_from(via)),
                    );
                }
            }

            let shallower = out.len();
            for method in found {
                let shadowed = out[..shallower].iter().any(|m| m.name == method.name);
                let repeated = out[shallower..]
                    .iter()
                    .any(|m| m.name == method.name && m.signature == method.signature);
                if !shadowed && !repeated {
                    out.push(method);
                }
            }
            level = next;
        }
        out
    }

    /// Whether the type named `type_name` structurally satisfies `interface`.
    pub fn satisfies(&self, type_name: &str, interface: &str) -> bool {
        satisfies(
            &self.interface_methods(interface),
            &self.type_methods(type_name),
        )
    }

    /// Every (type, interface) pair where the type satisfies the interface,
    /// in declaration order of types, then interfaces.
    pub fn implementations(&self) -> Vec<(&str, &str)> {
        let required: Vec<(&str, Vec<MethodSpec>)> = self
            .interfaces
            .iter()
            .map(|(name, _)| (name.as_str(), self.interface_methods(name)))
            .filter(|(_, methods)| !methods.is_empty())
            .collect();

        let mut out = Vec::new();
        for (type_name, _) in &self.types {
            if self.is_interface(type_name) {
                continue;
            }
            let available = self.type_methods(type_name);
            if available.is_empty() {
                continue;
            }
            for (iface, methods) in &required {
                if satisfies(methods, &available) {
                    out.push((type_name.as_str(), *iface));
                }
            }
        }
        out
    }
}

/// A method set satisfies a requirement when every required method has a
/// same-named counterpart with identical parameter and return lists. Empty
/// requirements are never considered satisfied.
pub fn satisfies(required: &[MethodSpec], available: &[MethodSpec]) -> bool {
    if required.is_empty() || available.is_empty() {
        return false;
    }
    required.iter().all(|want| {
        available
            .iter()
            .any(|have| have.name == want.name && have.signature == want.signature)
    })
}

fn upsert<'a>(
    entries: &'a mut Vec<(String, Shape)>,
    pos: &mut HashMap<String, usize>,
    name: &str,
) -> &'a mut Shape {
    let i = *pos.entry(name.to_string()).or_insert_with(|| {
        entries.push((name.to_string(), Shape::default()));
        entries.len() - 1
    });
    &mut entries[i].1
}

fn push_unique(out: &mut Vec<MethodSpec>, methods: impl IntoIterator<Item = MethodSpec>) {
    for method in methods {
        if !out.iter().any(|m| m.name == method.name) {
            out.push(method);
        }
    }
}

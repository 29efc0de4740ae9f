use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::syntax::Attributes;

// ── Identifiers and kinds ──────────────────────────────────────────

/// Index of an element inside its [`StructureModel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ElementId(pub u32);

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    Package,
    Interface,
    Type,
    Function,
    Method,
    Variable,
}

impl ElementKind {
    pub const ALL: [Self; 6] = [
        Self::Package,
        Self::Interface,
        Self::Type,
        Self::Function,
        Self::Method,
        Self::Variable,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Package => "package",
            Self::Interface => "interface",
            Self::Type => "type",
            Self::Function => "function",
            Self::Method => "method",
            Self::Variable => "variable",
        }
    }
}

impl std::fmt::Display for ElementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    Contains,
    Implements,
    Embeds,
    InterfaceEmbeds,
    MethodReceiver,
    Calls,
    References,
}

impl RelationKind {
    pub const ALL: [Self; 7] = [
        Self::Contains,
        Self::Implements,
        Self::Embeds,
        Self::InterfaceEmbeds,
        Self::MethodReceiver,
        Self::Calls,
        Self::References,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Contains => "contains",
            Self::Implements => "implements",
            Self::Embeds => "embeds",
            Self::InterfaceEmbeds => "interface_embeds",
            Self::MethodReceiver => "method_receiver",
            Self::Calls => "calls",
            Self::References => "references",
        }
    }
}

impl std::fmt::Display for RelationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Elements and relationships ─────────────────────────────────────

/// A declaration recovered from the syntax tree.
#[derive(Debug, Clone, Serialize)]
pub struct Element {
    pub id: ElementId,
    pub kind: ElementKind,
    pub name: String,
    pub attributes: Attributes,
}

/// A directed, typed edge between two elements of the same model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Relationship {
    pub kind: RelationKind,
    pub source: ElementId,
    pub target: ElementId,
}

/// One language's view of a set of declarations.
///
/// Elements are kept in insertion order in an arena; relationships refer to
/// them by [`ElementId`]. No two relationships share the same
/// `(kind, source, target)` triple.
#[derive(Debug, Clone, Serialize)]
pub struct StructureModel {
    language: String,
    elements: Vec<Element>,
    relationships: Vec<Relationship>,
    #[serde(skip)]
    relation_index: HashSet<Relationship>,
    #[serde(skip)]
    name_index: HashMap<(ElementKind, String), ElementId>,
}

impl StructureModel {
    pub fn new(language: &str) -> Self {
        Self {
            language: language.to_string(),
            elements: Vec::new(),
            relationships: Vec::new(),
            relation_index: HashSet::new(),
            name_index: HashMap::new(),
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    pub fn add_element(
        &mut self,
        kind: ElementKind,
        name: &str,
        attributes: Attributes,
    ) -> ElementId {
        #[allow(clippy::cast_possible_truncation)]
        let id = ElementId(self.elements.len() as u32);
        self.name_index
            .entry((kind, name.to_string()))
            .or_insert(id);
        self.elements.push(Element {
            id,
            kind,
            name: name.to_string(),
            attributes,
        });
        id
    }

    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(id.0 as usize)
    }

    pub(crate) fn element_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        self.elements.get_mut(id.0 as usize)
    }

    /// Name of an element, or `"?"` for an id outside the arena.
    pub fn name_of(&self, id: ElementId) -> &str {
        self.element(id).map_or("?", |e| e.name.as_str())
    }

    /// Record a relationship unless the same triple already exists.
    /// Returns whether it was inserted.
    pub fn add_relationship(
        &mut self,
        kind: RelationKind,
        source: ElementId,
        target: ElementId,
    ) -> bool {
        let rel = Relationship {
            kind,
            source,
            target,
        };
        if !self.relation_index.insert(rel) {
            return false;
        }
        self.relationships.push(rel);
        true
    }

    pub fn has_relationship(&self, kind: RelationKind, source: ElementId, target: ElementId) -> bool {
        self.relation_index.contains(&Relationship {
            kind,
            source,
            target,
        })
    }

    /// First element of `kind` named `name`.
    pub fn find(&self, kind: ElementKind, name: &str) -> Option<ElementId> {
        self.name_index.get(&(kind, name.to_string())).copied()
    }

    /// First type element named `name`, falling back to an interface.
    pub fn find_type_or_interface(&self, name: &str) -> Option<ElementId> {
        self.find(ElementKind::Type, name)
            .or_else(|| self.find(ElementKind::Interface, name))
    }

    pub fn elements_of_kind(&self, kind: ElementKind) -> impl Iterator<Item = &Element> {
        self.elements.iter().filter(move |e| e.kind == kind)
    }

    pub fn relationships_of_kind(&self, kind: RelationKind) -> impl Iterator<Item = &Relationship> {
        self.relationships.iter().filter(move |r| r.kind == kind)
    }

    /// Whether an element of `kind` named `source` relates to one named
    /// `target` with a relationship of `rel`.
    pub fn relates(&self, rel: RelationKind, source: &str, target: &str) -> bool {
        self.relationships_of_kind(rel)
            .any(|r| self.name_of(r.source) == source && self.name_of(r.target) == target)
    }
}

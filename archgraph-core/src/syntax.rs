//! Language-neutral syntax tree handed from a front end to the analyzers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{BodyReference, Field, MethodSpec, Signature, TypeDescriptor};

/// Well-known attribute keys.
pub mod attr {
    pub const NAME: &str = "name";
    pub const IS_EXPORTED: &str = "is_exported";
    pub const FIELDS: &str = "fields";
    pub const METHODS: &str = "methods";
    pub const SIGNATURE: &str = "signature";
    pub const RECEIVER_TYPE: &str = "receiver_type";
    pub const EMBEDDED: &str = "embedded";
    pub const TYPE: &str = "type";
    pub const TYPE_PARAMS: &str = "type_params";
    pub const PACKAGE_NAME: &str = "package_name";
    pub const PATH: &str = "path";
    pub const ALIAS: &str = "alias";
    pub const IS_STD_LIB: &str = "is_std_lib";
    pub const FILE_PATH: &str = "file_path";
    pub const DEPENDENCIES: &str = "dependencies";
    pub const BODY: &str = "body";
}

/// 1-based line and column plus a 0-based byte offset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

impl Position {
    pub fn new(line: usize, column: usize, offset: usize) -> Self {
        Self {
            line,
            column,
            offset,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyntaxKind {
    /// One translation unit (a source file).
    Module,
    Import,
    Type,
    Interface,
    Function,
    Method,
    Variable,
    /// Transparent grouping of declarations (`type ( ... )`, `var ( ... )`).
    Block,
}

impl SyntaxKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Module => "module",
            Self::Import => "import",
            Self::Type => "type",
            Self::Interface => "interface",
            Self::Function => "function",
            Self::Method => "method",
            Self::Variable => "variable",
            Self::Block => "block",
        }
    }
}

impl std::fmt::Display for SyntaxKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Attributes ─────────────────────────────────────────────────────

/// Closed set of attribute value shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AttributeValue {
    Str(String),
    Bool(bool),
    StrList(Vec<String>),
    Type(TypeDescriptor),
    Types(Vec<TypeDescriptor>),
    Signature(Signature),
    Fields(Vec<Field>),
    Methods(Vec<MethodSpec>),
    Body(Vec<BodyReference>),
}

macro_rules! attribute_from {
    ($ty:ty, $variant:ident) => {
        impl From<$ty> for AttributeValue {
            fn from(v: $ty) -> Self {
                Self::$variant(v)
            }
        }
    };
}

attribute_from!(String, Str);
attribute_from!(bool, Bool);
attribute_from!(Vec<String>, StrList);
attribute_from!(TypeDescriptor, Type);
attribute_from!(Vec<TypeDescriptor>, Types);
attribute_from!(Signature, Signature);
attribute_from!(Vec<Field>, Fields);
attribute_from!(Vec<MethodSpec>, Methods);
attribute_from!(Vec<BodyReference>, Body);

impl From<&str> for AttributeValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

/// Attribute bag of a syntax node.
///
/// Every accessor returns `None` both when the key is absent and when the
/// stored value has a different shape, so callers treat either case as a
/// soft miss.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attributes(BTreeMap<String, AttributeValue>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<AttributeValue>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&AttributeValue> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn str(&self, key: &str) -> Option<&str> {
        match self.get(key)? {
            AttributeValue::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn bool(&self, key: &str) -> Option<bool> {
        match self.get(key)? {
            AttributeValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn str_list(&self, key: &str) -> Option<&[String]> {
        match self.get(key)? {
            AttributeValue::StrList(v) => Some(v.as_slice()),
            _ => None,
        }
    }

    pub fn ty(&self, key: &str) -> Option<&TypeDescriptor> {
        match self.get(key)? {
            AttributeValue::Type(t) => Some(t),
            _ => None,
        }
    }

    pub fn types(&self, key: &str) -> Option<&[TypeDescriptor]> {
        match self.get(key)? {
            AttributeValue::Types(v) => Some(v.as_slice()),
            _ => None,
        }
    }

    pub fn signature(&self, key: &str) -> Option<&Signature> {
        match self.get(key)? {
            AttributeValue::Signature(s) => Some(s),
            _ => None,
        }
    }

    pub fn fields(&self, key: &str) -> Option<&[Field]> {
        match self.get(key)? {
            AttributeValue::Fields(v) => Some(v.as_slice()),
            _ => None,
        }
    }

    pub fn methods(&self, key: &str) -> Option<&[MethodSpec]> {
        match self.get(key)? {
            AttributeValue::Methods(v) => Some(v.as_slice()),
            _ => None,
        }
    }

    pub fn body(&self, key: &str) -> Option<&[BodyReference]> {
        match self.get(key)? {
            AttributeValue::Body(v) => Some(v.as_slice()),
            _ => None,
        }
    }
}

// ── Nodes ──────────────────────────────────────────────────────────

/// One node of the syntax tree. Trees are produced once by a front end and
/// only read afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntaxNode {
    pub kind: SyntaxKind,
    #[serde(default)]
    pub position: Position,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SyntaxNode>,
    #[serde(default, skip_serializing_if = "Attributes::is_empty")]
    pub attributes: Attributes,
}

impl SyntaxNode {
    pub fn new(kind: SyntaxKind) -> Self {
        Self {
            kind,
            position: Position::default(),
            children: Vec::new(),
            attributes: Attributes::new(),
        }
    }

    /// Start a declaration node carrying a `name` attribute.
    pub fn named(kind: SyntaxKind, name: &str) -> Self {
        Self::new(kind).with_attr(attr::NAME, name)
    }

    #[must_use]
    pub fn at(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    #[must_use]
    pub fn with_attr(mut self, key: &str, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(key, value);
        self
    }

    #[must_use]
    pub fn with_child(mut self, child: SyntaxNode) -> Self {
        self.children.push(child);
        self
    }

    #[must_use]
    pub fn with_children(mut self, children: impl IntoIterator<Item = SyntaxNode>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.attributes.str(attr::NAME)
    }

    /// Pre-order iterator over this node and all of its descendants.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }
}

#[derive(Debug)]
pub struct Descendants<'a> {
    stack: Vec<&'a SyntaxNode>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a SyntaxNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_soft_miss_on_wrong_shape() {
        let node = SyntaxNode::named(SyntaxKind::Type, "Document")
            .with_attr(attr::IS_EXPORTED, true)
            .with_attr(attr::FIELDS, Vec::<Field>::new());

        assert_eq!(node.name(), Some("Document"));
        assert_eq!(node.attributes.bool(attr::IS_EXPORTED), Some(true));
        assert_eq!(node.attributes.str(attr::IS_EXPORTED), None);
        assert_eq!(node.attributes.methods(attr::FIELDS), None);
        assert_eq!(node.attributes.fields(attr::FIELDS).map(<[Field]>::len), Some(0));
        assert!(node.attributes.signature(attr::SIGNATURE).is_none());
    }

    #[test]
    fn descendants_are_pre_order() {
        let tree = SyntaxNode::new(SyntaxKind::Module)
            .with_child(
                SyntaxNode::new(SyntaxKind::Block)
                    .with_child(SyntaxNode::named(SyntaxKind::Variable, "a"))
                    .with_child(SyntaxNode::named(SyntaxKind::Variable, "b")),
            )
            .with_child(SyntaxNode::named(SyntaxKind::Function, "c"));

        let kinds: Vec<_> = tree.descendants().map(|n| n.kind).collect();
        assert_eq!(
            kinds,
            vec![
                SyntaxKind::Module,
                SyntaxKind::Block,
                SyntaxKind::Variable,
                SyntaxKind::Variable,
                SyntaxKind::Function
            ]
        );
        let names: Vec<_> = tree.descendants().filter_map(SyntaxNode::name).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn tree_round_trips_through_json() {
        let tree = SyntaxNode::new(SyntaxKind::Module)
            .with_attr(attr::PACKAGE_NAME, "main")
            .with_child(
                SyntaxNode::named(SyntaxKind::Function, "run")
                    .at(Position::new(3, 1, 20))
                    .with_attr(
                        attr::SIGNATURE,
                        Signature::new(vec![], vec![TypeDescriptor::basic("error")]),
                    ),
            );
        let json = serde_json::to_string(&tree).unwrap();
        let back: SyntaxNode = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tree);
        assert_eq!(back.children[0].position.line, 3);
    }
}

use std::fmt;

use serde::{Deserialize, Serialize};

// ── Type descriptors ───────────────────────────────────────────────

/// Structural description of a type as written in source.
///
/// Each variant carries exactly the substructure its kind needs, so a map
/// always has a key and a value, a generic instantiation always has its
/// argument list, and so on. Equality is structural and recursive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeDescriptor {
    /// A named type: builtin (`int`), local (`Writer`) or qualified (`io.Reader`).
    Basic { name: String },
    Pointer { elem: Box<TypeDescriptor> },
    Slice { elem: Box<TypeDescriptor> },
    Array { elem: Box<TypeDescriptor> },
    Map {
        key: Box<TypeDescriptor>,
        value: Box<TypeDescriptor>,
    },
    Channel { elem: Box<TypeDescriptor> },
    /// An interface type; `name` is empty for an inline interface literal.
    Interface { name: String },
    /// A generic type instantiated with type arguments (`List[T]`).
    Generic {
        name: String,
        args: Vec<TypeDescriptor>,
    },
    /// A type parameter with its constraint list.
    TypeParam {
        name: String,
        constraints: Vec<TypeDescriptor>,
    },
    Unknown,
}

impl TypeDescriptor {
    pub fn basic(name: impl Into<String>) -> Self {
        Self::Basic { name: name.into() }
    }

    pub fn pointer(elem: Self) -> Self {
        Self::Pointer {
            elem: Box::new(elem),
        }
    }

    pub fn slice(elem: Self) -> Self {
        Self::Slice {
            elem: Box::new(elem),
        }
    }

    pub fn array(elem: Self) -> Self {
        Self::Array {
            elem: Box::new(elem),
        }
    }

    pub fn map(key: Self, value: Self) -> Self {
        Self::Map {
            key: Box::new(key),
            value: Box::new(value),
        }
    }

    pub fn channel(elem: Self) -> Self {
        Self::Channel {
            elem: Box::new(elem),
        }
    }

    pub fn kind_str(&self) -> &'static str {
        match self {
            Self::Basic { .. } => "basic",
            Self::Pointer { .. } => "pointer",
            Self::Slice { .. } => "slice",
            Self::Array { .. } => "array",
            Self::Map { .. } => "map",
            Self::Channel { .. } => "channel",
            Self::Interface { .. } => "interface",
            Self::Generic { .. } => "generic",
            Self::TypeParam { .. } => "type_param",
            Self::Unknown => "unknown",
        }
    }

    pub fn is_type_param(&self) -> bool {
        matches!(self, Self::TypeParam { .. })
    }

    /// The named type this descriptor designates, looking through one level
    /// of pointer indirection. `*Document` and `Document` both yield
    /// `Document`; composite shapes such as slices yield `None`.
    pub fn named_target(&self) -> Option<&str> {
        match self {
            Self::Pointer { elem } => elem.own_name(),
            other => other.own_name(),
        }
    }

    fn own_name(&self) -> Option<&str> {
        match self {
            Self::Basic { name } | Self::Generic { name, .. } => Some(name.as_str()),
            Self::Interface { name } if !name.is_empty() => Some(name.as_str()),
            _ => None,
        }
    }

    /// Every named leaf reachable by unwrapping pointer, slice, array, map,
    /// channel and generic-argument layers. Type parameters are not leaves.
    pub fn named_leaves(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Basic { name } => out.push(name.as_str()),
            Self::Interface { name } => {
                if !name.is_empty() {
                    out.push(name.as_str());
                }
            }
            Self::Pointer { elem }
            | Self::Slice { elem }
            | Self::Array { elem }
            | Self::Channel { elem } => elem.collect_leaves(out),
            Self::Map { key, value } => {
                key.collect_leaves(out);
                value.collect_leaves(out);
            }
            Self::Generic { name, args } => {
                out.push(name.as_str());
                for arg in args {
                    arg.collect_leaves(out);
                }
            }
            Self::TypeParam { .. } | Self::Unknown => {}
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Basic { name } => f.write_str(name),
            Self::Pointer { elem } => write!(f, "*{elem}"),
            Self::Slice { elem } => write!(f, "[]{elem}"),
            Self::Array { elem } => write!(f, "[N]{elem}"),
            Self::Map { key, value } => write!(f, "map[{key}]{value}"),
            Self::Channel { elem } => write!(f, "chan {elem}"),
            Self::Interface { name } if name.is_empty() => f.write_str("interface{}"),
            Self::Interface { name } => f.write_str(name),
            Self::Generic { name, args } => {
                write!(f, "{name}[")?;
                write_list(f, args)?;
                f.write_str("]")
            }
            Self::TypeParam { name, constraints } => {
                write!(f, "{name} ")?;
                if constraints.is_empty() {
                    return f.write_str("any");
                }
                for (i, c) in constraints.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" | ")?;
                    }
                    write!(f, "{c}")?;
                }
                Ok(())
            }
            Self::Unknown => f.write_str("?"),
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[TypeDescriptor]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

/// Predeclared type names that never produce a reference.
pub const BUILTIN_TYPES: &[&str] = &[
    "bool",
    "string",
    "int",
    "int8",
    "int16",
    "int32",
    "int64",
    "uint",
    "uint8",
    "uint16",
    "uint32",
    "uint64",
    "uintptr",
    "float32",
    "float64",
    "complex64",
    "complex128",
    "byte",
    "rune",
    "error",
    "any",
];

pub fn is_builtin(name: &str) -> bool {
    BUILTIN_TYPES.contains(&name)
}

// ── Signatures and members ─────────────────────────────────────────

/// Ordered parameter and return types of a function or method.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Signature {
    #[serde(default)]
    pub params: Vec<TypeDescriptor>,
    #[serde(default)]
    pub returns: Vec<TypeDescriptor>,
}

impl Signature {
    pub fn new(params: Vec<TypeDescriptor>, returns: Vec<TypeDescriptor>) -> Self {
        Self { params, returns }
    }

    /// All parameter types followed by all return types.
    pub fn types(&self) -> impl Iterator<Item = &TypeDescriptor> {
        self.params.iter().chain(&self.returns)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        write_list(f, &self.params)?;
        f.write_str(")")?;
        match self.returns.len() {
            0 => Ok(()),
            1 => write!(f, " {}", self.returns[0]),
            _ => {
                f.write_str(" (")?;
                write_list(f, &self.returns)?;
                f.write_str(")")
            }
        }
    }
}

/// A method as it appears in a method table or interface body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodSpec {
    pub name: String,
    #[serde(default)]
    pub signature: Signature,
    /// Name of the embedded type this method was promoted from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provenance: Option<String>,
}

impl MethodSpec {
    pub fn new(name: impl Into<String>, signature: Signature) -> Self {
        Self {
            name: name.into(),
            signature,
            provenance: None,
        }
    }

    #[must_use]
    pub fn promoted_from(mut self, embedded: &str) -> Self {
        self.provenance = Some(embedded.to_string());
        self
    }
}

/// A struct field. Embedded fields carry the embedded type as `ty` and use
/// the type name as `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeDescriptor,
    #[serde(default)]
    pub embedded: bool,
}

/// A symbol mentioned inside a function or method body.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BodyReference {
    /// A package-qualified selector (`fmt.Println` yields `fmt`).
    Package { name: String },
    /// A call to a package-level function by bare name.
    Symbol { name: String },
    /// A type mentioned in a composite literal, conversion or allocation.
    Type {
        #[serde(rename = "type")]
        ty: TypeDescriptor,
    },
}

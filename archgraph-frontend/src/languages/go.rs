use std::collections::{HashMap, HashSet};
use std::path::Path;

use archgraph_core::syntax::{SyntaxKind, SyntaxNode, attr};
use archgraph_core::types::{
    BodyReference, Field, MethodSpec, Signature, TypeDescriptor, is_builtin,
};
use tree_sitter::Node;

use crate::{FrontendError, Result};

use super::Frontend;
use super::helpers::{
    child_by_field, field_texts, find_child_by_kind, named_children, node_text, position, unquote,
};

/// Predeclared Go functions; calls to these are not symbol references.
const BUILTIN_FUNCS: &[&str] = &[
    "append", "cap", "clear", "close", "complex", "copy", "delete", "imag", "len", "make", "max",
    "min", "new", "panic", "print", "println", "real", "recover",
];

#[derive(Debug, Default, Clone, Copy)]
pub struct GoFrontend;

impl Frontend for GoFrontend {
    fn language(&self) -> &'static str {
        "go"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["go"]
    }

    fn tree_sitter_language(&self) -> tree_sitter::Language {
        tree_sitter_go::LANGUAGE.into()
    }

    fn convert(&self, tree: &tree_sitter::Tree, source: &str, path: &Path) -> Result<SyntaxNode> {
        Converter {
            source,
            path: path.to_string_lossy().to_string(),
            imports: HashSet::new(),
        }
        .convert(tree.root_node())
    }
}

struct Converter<'s> {
    source: &'s str,
    path: String,
    /// Local names under which imported packages are visible.
    imports: HashSet<String>,
}

/// Names that shadow package-level identifiers inside one declaration.
#[derive(Default)]
struct Scope {
    type_params: HashSet<String>,
    locals: HashSet<String>,
}

impl Converter<'_> {
    fn text(&self, node: Node<'_>) -> &str {
        node_text(node, self.source)
    }

    fn convert(mut self, root: Node<'_>) -> Result<SyntaxNode> {
        let package = find_child_by_kind(root, "package_clause")
            .and_then(|clause| find_child_by_kind(clause, "package_identifier"))
            .map(|ident| self.text(ident).to_string())
            .ok_or_else(|| FrontendError::Parse {
                path: self.path.clone(),
                message: "missing package clause".into(),
            })?;

        let mut children = Vec::new();
        let mut dependencies = Vec::new();
        for child in named_children(root) {
            if child.kind() == "import_declaration" {
                for import in self.imports(child) {
                    if let Some(path) = import.attributes.str(attr::PATH) {
                        dependencies.push(path.to_string());
                    }
                    children.push(import);
                }
            }
        }

        for child in named_children(root) {
            match child.kind() {
                "function_declaration" => children.push(self.function(child)),
                "method_declaration" => children.extend(self.method(child)),
                "type_declaration" => children.extend(self.type_declaration(child)),
                "var_declaration" | "const_declaration" => {
                    children.extend(self.value_declaration(child));
                }
                _ => {}
            }
        }
        attach_method_tables(&mut children);

        Ok(SyntaxNode::new(SyntaxKind::Module)
            .at(position(root))
            .with_attr(attr::PACKAGE_NAME, package)
            .with_attr(attr::FILE_PATH, self.path.clone())
            .with_attr(attr::DEPENDENCIES, dependencies)
            .with_children(children))
    }

    // ── Imports ────────────────────────────────────────────────────

    fn imports(&mut self, decl: Node<'_>) -> Vec<SyntaxNode> {
        let specs: Vec<Node<'_>> = match find_child_by_kind(decl, "import_spec_list") {
            Some(list) => named_children(list)
                .into_iter()
                .filter(|n| n.kind() == "import_spec")
                .collect(),
            None => find_child_by_kind(decl, "import_spec").into_iter().collect(),
        };

        let mut out = Vec::new();
        for spec in specs {
            let Some(path_node) = child_by_field(spec, "path") else {
                continue;
            };
            let path = unquote(self.text(path_node)).to_string();
            let alias = child_by_field(spec, "name").map(|n| self.text(n).to_string());

            let local = match alias.as_deref() {
                Some("_" | ".") => None,
                Some(alias) => Some(alias.to_string()),
                None => path.rsplit('/').next().map(str::to_string),
            };
            if let Some(local) = local {
                self.imports.insert(local);
            }

            let is_std_lib = !path.split('/').next().unwrap_or_default().contains('.');
            let mut node = SyntaxNode::new(SyntaxKind::Import)
                .at(position(spec))
                .with_attr(attr::PATH, path)
                .with_attr(attr::IS_STD_LIB, is_std_lib);
            if let Some(alias) = alias {
                node = node.with_attr(attr::ALIAS, alias);
            }
            out.push(node);
        }
        out
    }

    // ── Functions and methods ──────────────────────────────────────

    fn function(&self, node: Node<'_>) -> SyntaxNode {
        let name = child_by_field(node, "name").map_or("", |n| self.text(n));
        let type_params = self.type_parameters(node);
        let mut scope = Scope {
            type_params: type_params.iter().filter_map(param_name).collect(),
            locals: HashSet::new(),
        };
        let signature = self.signature(node, &mut scope);

        let mut out = SyntaxNode::named(SyntaxKind::Function, name)
            .at(position(node))
            .with_attr(attr::IS_EXPORTED, is_exported(name))
            .with_attr(attr::SIGNATURE, signature);
        if !type_params.is_empty() {
            out = out.with_attr(attr::TYPE_PARAMS, type_params);
        }
        self.with_body(out, node, &mut scope)
    }

    fn method(&self, node: Node<'_>) -> Option<SyntaxNode> {
        let name = self.text(child_by_field(node, "name")?);
        let receiver = child_by_field(node, "receiver")
            .and_then(|list| {
                named_children(list)
                    .into_iter()
                    .find(|p| p.kind() == "parameter_declaration")
            })?;

        let mut scope = Scope::default();
        if let Some(ty) = child_by_field(receiver, "type") {
            scope.type_params = self.receiver_type_params(ty);
        }
        for receiver_name in field_texts(receiver, "name", self.source) {
            scope.locals.insert(receiver_name.to_string());
        }
        let receiver_type = child_by_field(receiver, "type")
            .map_or(TypeDescriptor::Unknown, |ty| self.descriptor(ty, &scope.type_params));
        let signature = self.signature(node, &mut scope);

        let out = SyntaxNode::named(SyntaxKind::Method, name)
            .at(position(node))
            .with_attr(attr::IS_EXPORTED, is_exported(name))
            .with_attr(attr::RECEIVER_TYPE, receiver_type)
            .with_attr(attr::SIGNATURE, signature);
        Some(self.with_body(out, node, &mut scope))
    }

    /// Type parameter names introduced by a generic receiver such as
    /// `*List[T]`.
    fn receiver_type_params(&self, ty: Node<'_>) -> HashSet<String> {
        let generic = if ty.kind() == "pointer_type" {
            named_children(ty).into_iter().next()
        } else {
            Some(ty)
        };
        generic
            .filter(|g| g.kind() == "generic_type")
            .and_then(|g| child_by_field(g, "type_arguments"))
            .map(|args| {
                let mut names = HashSet::new();
                let mut stack = vec![args];
                while let Some(n) = stack.pop() {
                    if n.kind() == "type_identifier" || n.kind() == "identifier" {
                        names.insert(self.text(n).to_string());
                    }
                    stack.extend(named_children(n));
                }
                names
            })
            .unwrap_or_default()
    }

    fn with_body(&self, out: SyntaxNode, node: Node<'_>, scope: &mut Scope) -> SyntaxNode {
        let Some(body) = child_by_field(node, "body") else {
            return out;
        };
        let references = self.body_references(body, scope);
        if references.is_empty() {
            out
        } else {
            out.with_attr(attr::BODY, references)
        }
    }

    fn signature(&self, node: Node<'_>, scope: &mut Scope) -> Signature {
        let params = child_by_field(node, "parameters")
            .map(|list| self.parameter_types(list, scope))
            .unwrap_or_default();
        let returns = match child_by_field(node, "result") {
            Some(result) if result.kind() == "parameter_list" => {
                self.parameter_types(result, scope)
            }
            Some(result) => vec![self.descriptor(result, &scope.type_params)],
            None => Vec::new(),
        };
        Signature::new(params, returns)
    }

    /// One descriptor per declared parameter; `a, b int` yields two.
    fn parameter_types(&self, list: Node<'_>, scope: &mut Scope) -> Vec<TypeDescriptor> {
        let mut out = Vec::new();
        for param in named_children(list) {
            let Some(ty) = child_by_field(param, "type") else {
                continue;
            };
            let descriptor = self.descriptor(ty, &scope.type_params);
            let names = field_texts(param, "name", self.source);
            for name in &names {
                scope.locals.insert((*name).to_string());
            }
            match param.kind() {
                "variadic_parameter_declaration" => out.push(TypeDescriptor::slice(descriptor)),
                "parameter_declaration" => {
                    out.extend(std::iter::repeat_n(descriptor, names.len().max(1)));
                }
                _ => {}
            }
        }
        out
    }

    fn type_parameters(&self, node: Node<'_>) -> Vec<TypeDescriptor> {
        let Some(list) = child_by_field(node, "type_parameters") else {
            return Vec::new();
        };
        let mut out = Vec::new();
        for decl in named_children(list) {
            let constraints = child_by_field(decl, "type")
                .map(|c| self.constraints(c))
                .unwrap_or_default();
            for name in field_texts(decl, "name", self.source) {
                out.push(TypeDescriptor::TypeParam {
                    name: name.to_string(),
                    constraints: constraints.clone(),
                });
            }
        }
        out
    }

    /// Members of a constraint union such as `~int | ~string`.
    fn constraints(&self, node: Node<'_>) -> Vec<TypeDescriptor> {
        let none = HashSet::new();
        match node.kind() {
            "type_constraint" | "type_elem" | "constraint_elem" => named_children(node)
                .into_iter()
                .map(|member| self.descriptor(member, &none))
                .collect(),
            _ => vec![self.descriptor(node, &none)],
        }
    }

    // ── Bodies ─────────────────────────────────────────────────────

    fn body_references(&self, body: Node<'_>, scope: &mut Scope) -> Vec<BodyReference> {
        let mut out: Vec<BodyReference> = Vec::new();
        let mut push = |reference: BodyReference| {
            if !out.contains(&reference) {
                out.push(reference);
            }
        };

        let mut stack = vec![body];
        while let Some(node) = stack.pop() {
            match node.kind() {
                "short_var_declaration" => {
                    if let Some(left) = child_by_field(node, "left") {
                        for ident in named_children(left) {
                            scope.locals.insert(self.text(ident).to_string());
                        }
                    }
                }
                "var_spec" => {
                    for name in field_texts(node, "name", self.source) {
                        scope.locals.insert(name.to_string());
                    }
                }
                "selector_expression" => {
                    if let Some(operand) = child_by_field(node, "operand") {
                        let name = self.text(operand);
                        if operand.kind() == "identifier"
                            && self.imports.contains(name)
                            && !scope.locals.contains(name)
                        {
                            push(BodyReference::Package {
                                name: name.to_string(),
                            });
                        }
                    }
                }
                "call_expression" => {
                    if let Some(function) = child_by_field(node, "function") {
                        let name = self.text(function);
                        if function.kind() == "identifier" {
                            if name == "new" || name == "make" {
                                if let Some(ty) = self.special_argument(node, &scope.type_params) {
                                    push(BodyReference::Type { ty });
                                }
                            } else if !BUILTIN_FUNCS.contains(&name)
                                && !is_builtin(name)
                                && !scope.locals.contains(name)
                                && !scope.type_params.contains(name)
                            {
                                push(BodyReference::Symbol {
                                    name: name.to_string(),
                                });
                            }
                        }
                    }
                }
                "composite_literal" => {
                    if let Some(ty) = child_by_field(node, "type") {
                        let descriptor = self.descriptor(ty, &scope.type_params);
                        if !descriptor.named_leaves().is_empty() {
                            push(BodyReference::Type { ty: descriptor });
                        }
                    }
                }
                _ => {}
            }
            let mut children = named_children(node);
            children.reverse();
            stack.extend(children);
        }
        out
    }

    /// The type argument of `new(T)` or `make(T, ...)`, when it names a type.
    fn special_argument(
        &self,
        call: Node<'_>,
        type_params: &HashSet<String>,
    ) -> Option<TypeDescriptor> {
        let args = child_by_field(call, "arguments")?;
        let first = named_children(args).into_iter().next()?;
        let descriptor = self.descriptor(first, type_params);
        (!descriptor.named_leaves().is_empty()).then_some(descriptor)
    }

    // ── Types ──────────────────────────────────────────────────────

    fn type_declaration(&self, decl: Node<'_>) -> Vec<SyntaxNode> {
        let specs: Vec<SyntaxNode> = named_children(decl)
            .into_iter()
            .filter(|n| n.kind() == "type_spec" || n.kind() == "type_alias")
            .filter_map(|spec| self.type_spec(spec))
            .collect();
        if find_child_by_kind(decl, "(").is_some() {
            vec![
                SyntaxNode::new(SyntaxKind::Block)
                    .at(position(decl))
                    .with_children(specs),
            ]
        } else {
            specs
        }
    }

    fn type_spec(&self, spec: Node<'_>) -> Option<SyntaxNode> {
        let name = self.text(child_by_field(spec, "name")?);
        let ty = child_by_field(spec, "type")?;
        let type_params = self.type_parameters(spec);
        let scope: HashSet<String> = type_params.iter().filter_map(param_name).collect();

        let mut out = match ty.kind() {
            "interface_type" => {
                let (methods, embedded) = self.interface_body(ty, &scope);
                let mut node = SyntaxNode::named(SyntaxKind::Interface, name)
                    .with_attr(attr::METHODS, methods);
                if !embedded.is_empty() {
                    node = node.with_attr(attr::EMBEDDED, embedded);
                }
                node
            }
            "struct_type" => SyntaxNode::named(SyntaxKind::Type, name)
                .with_attr(attr::FIELDS, self.struct_fields(ty, &scope)),
            _ => SyntaxNode::named(SyntaxKind::Type, name)
                .with_attr(attr::TYPE, self.descriptor(ty, &scope)),
        };
        out = out
            .at(position(spec))
            .with_attr(attr::IS_EXPORTED, is_exported(name));
        if !type_params.is_empty() {
            out = out.with_attr(attr::TYPE_PARAMS, type_params);
        }
        Some(out)
    }

    fn interface_body(
        &self,
        iface: Node<'_>,
        scope: &HashSet<String>,
    ) -> (Vec<MethodSpec>, Vec<TypeDescriptor>) {
        let mut methods = Vec::new();
        let mut embedded = Vec::new();
        for elem in named_children(iface) {
            match elem.kind() {
                "method_elem" | "method_spec" => {
                    let Some(name) = child_by_field(elem, "name") else {
                        continue;
                    };
                    let mut method_scope = Scope {
                        type_params: scope.clone(),
                        locals: HashSet::new(),
                    };
                    let signature = self.signature(elem, &mut method_scope);
                    methods.push(MethodSpec::new(self.text(name), signature));
                }
                "type_elem" | "constraint_elem" => {
                    // A union is a constraint, not an embedding.
                    if let [single] = named_children(elem).as_slice() {
                        embedded.push(self.descriptor(*single, scope));
                    }
                }
                "interface_type_name" | "type_identifier" | "qualified_type" => {
                    embedded.push(self.descriptor(elem, scope));
                }
                _ => {}
            }
        }
        (methods, embedded)
    }

    fn struct_fields(&self, st: Node<'_>, scope: &HashSet<String>) -> Vec<Field> {
        let Some(list) = find_child_by_kind(st, "field_declaration_list") else {
            return Vec::new();
        };
        let mut fields = Vec::new();
        for decl in named_children(list) {
            if decl.kind() != "field_declaration" {
                continue;
            }
            let Some(ty) = child_by_field(decl, "type") else {
                continue;
            };
            let mut descriptor = self.descriptor(ty, scope);
            let names = field_texts(decl, "name", self.source);
            if names.is_empty() {
                if find_child_by_kind(decl, "*").is_some() {
                    descriptor = TypeDescriptor::pointer(descriptor);
                }
                let name = descriptor
                    .named_target()
                    .map(|n| n.rsplit('.').next().unwrap_or(n).to_string())
                    .unwrap_or_default();
                fields.push(Field {
                    name,
                    ty: descriptor,
                    embedded: true,
                });
            } else {
                fields.extend(names.into_iter().map(|name| Field {
                    name: name.to_string(),
                    ty: descriptor.clone(),
                    embedded: false,
                }));
            }
        }
        fields
    }

    /// Descriptor for a type expression. Identifiers in `type_params`
    /// become type parameters.
    fn descriptor<'t>(&self, node: Node<'t>, type_params: &HashSet<String>) -> TypeDescriptor {
        let first = |n: Node<'t>| named_children(n).into_iter().next();
        match node.kind() {
            "type_identifier" | "identifier" | "interface_type_name" => {
                let name = self.text(node);
                if type_params.contains(name) {
                    TypeDescriptor::TypeParam {
                        name: name.to_string(),
                        constraints: Vec::new(),
                    }
                } else {
                    TypeDescriptor::basic(name)
                }
            }
            "qualified_type" => {
                let text: String = self.text(node).split_whitespace().collect();
                TypeDescriptor::basic(text)
            }
            "pointer_type" => first(node).map_or(TypeDescriptor::Unknown, |inner| {
                TypeDescriptor::pointer(self.descriptor(inner, type_params))
            }),
            "slice_type" => self.element(node, "element", type_params, TypeDescriptor::slice),
            "array_type" | "implicit_length_array_type" => {
                self.element(node, "element", type_params, TypeDescriptor::array)
            }
            "channel_type" => self.element(node, "value", type_params, TypeDescriptor::channel),
            "map_type" => match (child_by_field(node, "key"), child_by_field(node, "value")) {
                (Some(key), Some(value)) => TypeDescriptor::map(
                    self.descriptor(key, type_params),
                    self.descriptor(value, type_params),
                ),
                _ => TypeDescriptor::Unknown,
            },
            "generic_type" => {
                let name = child_by_field(node, "type").map_or("", |t| self.text(t));
                let args = child_by_field(node, "type_arguments")
                    .map(|list| {
                        named_children(list)
                            .into_iter()
                            .map(|arg| self.descriptor(arg, type_params))
                            .collect()
                    })
                    .unwrap_or_default();
                TypeDescriptor::Generic {
                    name: name.split_whitespace().collect(),
                    args,
                }
            }
            "interface_type" => TypeDescriptor::Interface {
                name: String::new(),
            },
            "parenthesized_type" | "negated_type" => first(node)
                .map_or(TypeDescriptor::Unknown, |inner| self.descriptor(inner, type_params)),
            "type_elem" | "type_constraint" | "constraint_elem" => match named_children(node).as_slice() {
                [single] => self.descriptor(*single, type_params),
                _ => TypeDescriptor::Unknown,
            },
            _ => TypeDescriptor::Unknown,
        }
    }

    fn element(
        &self,
        node: Node<'_>,
        field: &str,
        type_params: &HashSet<String>,
        wrap: fn(TypeDescriptor) -> TypeDescriptor,
    ) -> TypeDescriptor {
        child_by_field(node, field).map_or(TypeDescriptor::Unknown, |elem| {
            wrap(self.descriptor(elem, type_params))
        })
    }

    // ── Variables and constants ────────────────────────────────────

    fn value_declaration(&self, decl: Node<'_>) -> Vec<SyntaxNode> {
        let mut specs = Vec::new();
        for child in named_children(decl) {
            match child.kind() {
                "var_spec" | "const_spec" => specs.push(child),
                "var_spec_list" | "const_spec_list" => specs.extend(
                    named_children(child)
                        .into_iter()
                        .filter(|n| n.kind() == "var_spec" || n.kind() == "const_spec"),
                ),
                _ => {}
            }
        }

        let mut nodes = Vec::new();
        for spec in specs {
            let vars = self.value_spec(spec);
            if vars.len() > 1 {
                nodes.push(
                    SyntaxNode::new(SyntaxKind::Block)
                        .at(position(spec))
                        .with_children(vars),
                );
            } else {
                nodes.extend(vars);
            }
        }

        if find_child_by_kind(decl, "(").is_some()
            || named_children(decl)
                .iter()
                .any(|n| n.kind().ends_with("_spec_list"))
        {
            vec![
                SyntaxNode::new(SyntaxKind::Block)
                    .at(position(decl))
                    .with_children(nodes),
            ]
        } else {
            nodes
        }
    }

    fn value_spec(&self, spec: Node<'_>) -> Vec<SyntaxNode> {
        let none = HashSet::new();
        let explicit = child_by_field(spec, "type").map(|ty| self.descriptor(ty, &none));
        let values: Vec<Node<'_>> = child_by_field(spec, "value")
            .map(named_children)
            .unwrap_or_default();

        let mut cursor = spec.walk();
        let names: Vec<Node<'_>> = spec.children_by_field_name("name", &mut cursor).collect();
        names
            .into_iter()
            .enumerate()
            .map(|(i, ident)| {
                let name = self.text(ident);
                let ty = explicit
                    .clone()
                    .or_else(|| values.get(i).and_then(|v| self.infer(*v)));
                let mut node = SyntaxNode::named(SyntaxKind::Variable, name)
                    .at(position(ident))
                    .with_attr(attr::IS_EXPORTED, is_exported(name));
                if let Some(ty) = ty {
                    node = node.with_attr(attr::TYPE, ty);
                }
                node
            })
            .collect()
    }

    /// Static type of an initializer, when it is evident from its shape.
    fn infer(&self, value: Node<'_>) -> Option<TypeDescriptor> {
        let none = HashSet::new();
        let basic = |name: &str| Some(TypeDescriptor::basic(name));
        match value.kind() {
            "int_literal" => basic("int"),
            "float_literal" => basic("float64"),
            "imaginary_literal" => basic("complex128"),
            "rune_literal" => basic("rune"),
            "interpreted_string_literal" | "raw_string_literal" => basic("string"),
            "true" | "false" => basic("bool"),
            "composite_literal" => {
                child_by_field(value, "type").map(|ty| self.descriptor(ty, &none))
            }
            "unary_expression" => {
                let operator = child_by_field(value, "operator").map(|o| self.text(o));
                let operand = child_by_field(value, "operand")?;
                if operator == Some("&") {
                    self.infer(operand).map(TypeDescriptor::pointer)
                } else {
                    None
                }
            }
            "call_expression" => {
                let function = child_by_field(value, "function")?;
                match self.text(function) {
                    "make" => self.special_argument(value, &none),
                    "new" => self
                        .special_argument(value, &none)
                        .map(TypeDescriptor::pointer),
                    _ => None,
                }
            }
            _ => None,
        }
    }
}

fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

fn param_name(param: &TypeDescriptor) -> Option<String> {
    match param {
        TypeDescriptor::TypeParam { name, .. } => Some(name.clone()),
        _ => None,
    }
}

/// Give each type node a `methods` table built from the method
/// declarations of the same file.
fn attach_method_tables(children: &mut [SyntaxNode]) {
    let mut tables: HashMap<String, Vec<MethodSpec>> = HashMap::new();
    for node in children.iter().flat_map(SyntaxNode::descendants) {
        if node.kind != SyntaxKind::Method {
            continue;
        }
        let (Some(name), Some(receiver)) = (
            node.name(),
            node.attributes
                .ty(attr::RECEIVER_TYPE)
                .and_then(TypeDescriptor::named_target),
        ) else {
            continue;
        };
        let signature = node
            .attributes
            .signature(attr::SIGNATURE)
            .cloned()
            .unwrap_or_default();
        tables
            .entry(receiver.to_string())
            .or_default()
            .push(MethodSpec::new(name, signature));
    }
    if tables.is_empty() {
        return;
    }
    for child in children {
        set_tables(child, &tables);
    }
}

fn set_tables(node: &mut SyntaxNode, tables: &HashMap<String, Vec<MethodSpec>>) {
    if node.kind == SyntaxKind::Type {
        if let Some(methods) = node.name().and_then(|name| tables.get(name)) {
            node.attributes.insert(attr::METHODS, methods.clone());
        }
    }
    for child in &mut node.children {
        set_tables(child, tables);
    }
}

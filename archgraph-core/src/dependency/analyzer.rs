use std::collections::HashMap;

use tracing::{debug, info};

use crate::config::DependencyConfig;
use crate::error::{AnalysisError, Result};
use crate::method_set::MethodIndex;
use crate::syntax::{SyntaxKind, SyntaxNode, attr};
use crate::types::{BodyReference, MethodSpec, TypeDescriptor, is_builtin};

use super::graph::{
    Cycle, Dependency, DependencyGraph, DependencyKind, Location, MergeSummary, Node, NodeKind,
};

/// Trait implemented by each language's dependency analyzer.
///
/// An analyzer owns one graph at a time. `analyze` replaces it; the query
/// methods read it, widening results with indirect reachability or
/// recursive external discovery as the configuration asks.
pub trait DependencyAnalyzer: Send + Sync + std::fmt::Debug {
    fn language(&self) -> &'static str;

    fn config(&self) -> &DependencyConfig;

    fn graph(&self) -> &DependencyGraph;

    fn graph_mut(&mut self) -> &mut DependencyGraph;

    /// Discard the current graph and build a new one from `tree`.
    fn analyze(&mut self, tree: &SyntaxNode) -> Result<&DependencyGraph>;

    /// Whether `from` depends on `to` through an edge of `kind`, directly or,
    /// when indirect analysis is enabled, through intermediate nodes.
    fn has_dependency(&self, from: &str, to: &str, kind: DependencyKind) -> bool {
        let graph = self.graph();
        if graph.has_dependency(from, to, kind) {
            return true;
        }
        self.config().include_indirect
            && graph
                .indirect_from(from, self.config().max_depth)
                .iter()
                .any(|d| d.to == to && d.kind == kind)
    }

    /// Outgoing dependencies of `id`.
    fn dependencies(&self, id: &str) -> Vec<Dependency> {
        let graph = self.graph();
        let mut out: Vec<Dependency> = graph.dependencies_from(id).into_iter().cloned().collect();
        if self.config().include_indirect {
            out.extend(graph.indirect_from(id, self.config().max_depth));
        }
        out
    }

    /// Incoming dependencies of `id`.
    fn dependents(&self, id: &str) -> Vec<Dependency> {
        let graph = self.graph();
        let mut out: Vec<Dependency> = graph.dependencies_to(id).into_iter().cloned().collect();
        if self.config().include_indirect {
            out.extend(graph.indirect_to(id, self.config().max_depth));
        }
        out
    }

    fn external_dependencies(&self) -> Vec<&Node> {
        if self.config().analyze_external {
            self.graph().external_nodes_recursive(self.config().max_depth)
        } else {
            self.graph().external_nodes()
        }
    }

    fn find_circular_dependencies(&mut self) -> Vec<Cycle> {
        self.graph_mut().find_cycles().to_vec()
    }

    fn merge(&mut self, other: &DependencyGraph) -> MergeSummary {
        let summary = self.graph_mut().merge(other);
        debug!(
            nodes = summary.nodes_added,
            edges = summary.edges_added,
            dropped = summary.edges_dropped,
            "Merged dependency graph"
        );
        summary
    }

    fn clear(&mut self) {
        self.graph_mut().clear();
    }
}

// ── Go ─────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct GoDependencyAnalyzer {
    config: DependencyConfig,
    graph: DependencyGraph,
}

impl GoDependencyAnalyzer {
    pub fn new(config: DependencyConfig) -> Self {
        Self {
            config,
            graph: DependencyGraph::new(),
        }
    }

    /// Wrap an existing graph, typically one merged from several units,
    /// so the configured queries can run over it.
    pub fn with_graph(config: DependencyConfig, graph: DependencyGraph) -> Self {
        Self { config, graph }
    }

    pub fn into_graph(self) -> DependencyGraph {
        self.graph
    }
}

impl DependencyAnalyzer for GoDependencyAnalyzer {
    fn language(&self) -> &'static str {
        "go"
    }

    fn config(&self) -> &DependencyConfig {
        &self.config
    }

    fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    fn graph_mut(&mut self) -> &mut DependencyGraph {
        &mut self.graph
    }

    fn analyze(&mut self, tree: &SyntaxNode) -> Result<&DependencyGraph> {
        self.graph.clear();
        if tree.kind != SyntaxKind::Module {
            return Err(AnalysisError::ContractViolation {
                kind: tree.kind.to_string(),
                missing: "module root".into(),
            }
            .into());
        }
        let package = tree
            .attributes
            .str(attr::PACKAGE_NAME)
            .ok_or_else(|| AnalysisError::ContractViolation {
                kind: tree.kind.to_string(),
                missing: attr::PACKAGE_NAME.into(),
            })?;

        let mut builder = GraphBuilder {
            config: &self.config,
            graph: &mut self.graph,
            package: package.to_string(),
            file: tree.attributes.str(attr::FILE_PATH).unwrap_or_default().to_string(),
            imports: HashMap::new(),
            index: MethodIndex::new(),
            type_locations: HashMap::new(),
        };
        builder.add_module();
        builder.add_imports(tree);
        for child in &tree.children {
            builder.visit(child);
        }
        let satisfied = builder.add_satisfactions();

        info!(
            package,
            nodes = self.graph.node_count(),
            dependencies = self.graph.dependency_count(),
            satisfied,
            "Dependency analysis complete"
        );
        Ok(&self.graph)
    }
}

struct GraphBuilder<'a> {
    config: &'a DependencyConfig,
    graph: &'a mut DependencyGraph,
    package: String,
    file: String,
    /// Local import name to import path.
    imports: HashMap<String, String>,
    index: MethodIndex,
    type_locations: HashMap<String, Location>,
}

impl GraphBuilder<'_> {
    fn qualify(&self, name: &str) -> String {
        format!("{}.{name}", self.package)
    }

    fn location(&self, node: &SyntaxNode) -> Location {
        Location {
            file: self.file.clone(),
            line: node.position.line,
            column: node.position.column,
        }
    }

    fn edge(&mut self, from: &str, to: String, kind: DependencyKind, node: &SyntaxNode) {
        let location = self.location(node);
        self.graph
            .add_dependency(Dependency::new(from, to, kind).at(location));
    }

    fn add_module(&mut self) {
        let node = Node::new(self.package.clone(), NodeKind::Module, self.package.clone())
            .with_path(self.file.clone());
        self.graph.add_node(node);
    }

    // ── Imports ────────────────────────────────────────────────────

    fn is_local(&self, path: &str) -> bool {
        path == self.package
            || self
                .config
                .local_module()
                .is_some_and(|prefix| path.starts_with(prefix))
    }

    fn add_imports(&mut self, tree: &SyntaxNode) {
        let imports: Vec<&SyntaxNode> = tree
            .descendants()
            .filter(|n| n.kind == SyntaxKind::Import)
            .collect();
        for import in imports {
            let Some(path) = import.attributes.str(attr::PATH) else {
                debug!(line = import.position.line, "Import without path skipped");
                continue;
            };
            let last = path.rsplit('/').next().unwrap_or(path);
            let local_name = import
                .attributes
                .str(attr::ALIAS)
                .filter(|a| !a.is_empty() && *a != "_" && *a != ".")
                .unwrap_or(last);
            self.imports.insert(local_name.to_string(), path.to_string());

            let external = !self.is_local(path);
            let mut node = Node::new(path, NodeKind::Module, last)
                .with_path(path)
                .external(external);
            if let Some(std_lib) = import.attributes.bool(attr::IS_STD_LIB) {
                node = node.with_metadata("std_lib", std_lib.into());
            }
            self.graph.add_node(node);

            let location = self.location(import);
            let from = self.package.clone();
            self.graph.add_dependency(
                Dependency::new(from, path, DependencyKind::Include)
                    .at(location)
                    .external(external),
            );
        }
    }

    // ── Declarations ───────────────────────────────────────────────

    fn visit(&mut self, node: &SyntaxNode) {
        match node.kind {
            SyntaxKind::Module | SyntaxKind::Block => {
                for child in &node.children {
                    self.visit(child);
                }
            }
            SyntaxKind::Import => {}
            SyntaxKind::Type => self.add_type(node),
            SyntaxKind::Interface => self.add_interface(node),
            SyntaxKind::Function => self.add_function(node),
            SyntaxKind::Method => self.add_method(node),
            SyntaxKind::Variable => self.add_variable(node),
        }
    }

    /// Graph node for a named declaration, not yet added.
    fn declared(&self, node: &SyntaxNode, kind: NodeKind) -> Option<Node> {
        let Some(name) = node.name() else {
            debug!(kind = %node.kind, line = node.position.line, "Unnamed declaration skipped");
            return None;
        };
        let mut graph_node = Node::new(self.qualify(name), kind, name).with_path(self.file.clone());
        if let Some(exported) = node.attributes.bool(attr::IS_EXPORTED) {
            graph_node = graph_node.with_metadata("exported", exported.into());
        }
        Some(graph_node)
    }

    fn add_type(&mut self, node: &SyntaxNode) {
        let Some(graph_node) = self.declared(node, NodeKind::Type) else {
            return;
        };
        let (id, name) = (graph_node.id.clone(), graph_node.name.clone());
        self.graph.add_node(graph_node);
        let mut embedded = Vec::new();
        if let Some(fields) = node.attributes.fields(attr::FIELDS) {
            for field in fields {
                if field.embedded {
                    if let Some(target) = field.ty.named_target() {
                        embedded.push(target.to_string());
                        if let Some(resolved) = self.resolve(target) {
                            self.edge(&id, resolved, DependencyKind::Compose, node);
                        }
                    }
                } else {
                    self.references(&id, &field.ty, node);
                }
            }
        }
        if let Some(underlying) = node.attributes.ty(attr::TYPE) {
            self.references(&id, underlying, node);
        }
        self.index.add_type(&name, embedded);
        for method in node.attributes.methods(attr::METHODS).unwrap_or_default() {
            self.index.add_method(&name, method.clone());
        }
        self.type_locations.insert(name, self.location(node));
    }

    fn add_interface(&mut self, node: &SyntaxNode) {
        let Some(graph_node) = self.declared(node, NodeKind::Contract) else {
            return;
        };
        let methods = node.attributes.methods(attr::METHODS).unwrap_or_default();
        let (id, name) = (graph_node.id.clone(), graph_node.name.clone());
        self.graph
            .add_node(graph_node.with_metadata("methods", methods.len().into()));
        for method in methods {
            for ty in method.signature.types() {
                self.references(&id, ty, node);
            }
        }
        let mut embedded = Vec::new();
        for ty in node.attributes.types(attr::EMBEDDED).unwrap_or_default() {
            if let Some(target) = ty.named_target() {
                embedded.push(target.to_string());
                if let Some(resolved) = self.resolve(target) {
                    self.edge(&id, resolved, DependencyKind::Inherit, node);
                }
            }
        }
        self.index.add_interface(&name, methods, embedded);
    }

    fn add_function(&mut self, node: &SyntaxNode) {
        let Some(graph_node) = self.declared(node, NodeKind::Function) else {
            return;
        };
        let id = graph_node.id.clone();
        self.graph.add_node(graph_node);
        self.signature_and_body(&id, node);
    }

    fn add_method(&mut self, node: &SyntaxNode) {
        let Some(name) = node.name() else {
            debug!(line = node.position.line, "Unnamed method skipped");
            return;
        };
        let Some(receiver) = node
            .attributes
            .ty(attr::RECEIVER_TYPE)
            .and_then(TypeDescriptor::named_target)
        else {
            debug!(method = name, "Method without receiver skipped");
            return;
        };
        let id = format!("{}.{receiver}.{name}", self.package);
        let mut graph_node = Node::new(id.clone(), NodeKind::Function, name)
            .with_path(self.file.clone())
            .with_metadata("receiver", receiver.into());
        if let Some(exported) = node.attributes.bool(attr::IS_EXPORTED) {
            graph_node = graph_node.with_metadata("exported", exported.into());
        }
        self.graph.add_node(graph_node);

        let owner = self.qualify(receiver);
        self.edge(&id, owner, DependencyKind::Reference, node);
        self.signature_and_body(&id, node);

        let signature = node
            .attributes
            .signature(attr::SIGNATURE)
            .cloned()
            .unwrap_or_default();
        self.index.add_method(receiver, MethodSpec::new(name, signature));
    }

    fn add_variable(&mut self, node: &SyntaxNode) {
        let Some(graph_node) = self.declared(node, NodeKind::Variable) else {
            return;
        };
        let id = graph_node.id.clone();
        self.graph.add_node(graph_node);
        if let Some(ty) = node.attributes.ty(attr::TYPE) {
            self.references(&id, ty, node);
        }
    }

    fn signature_and_body(&mut self, id: &str, node: &SyntaxNode) {
        if let Some(signature) = node.attributes.signature(attr::SIGNATURE) {
            for ty in signature.types() {
                self.references(id, ty, node);
            }
        }
        for reference in node.attributes.body(attr::BODY).unwrap_or_default() {
            match reference {
                BodyReference::Package { name } => {
                    if let Some(path) = self.imports.get(name).cloned() {
                        self.edge(id, path, DependencyKind::Reference, node);
                    }
                }
                BodyReference::Symbol { name } => {
                    let target = self.qualify(name);
                    if target != id {
                        self.edge(id, target, DependencyKind::Reference, node);
                    }
                }
                BodyReference::Type { ty } => self.references(id, ty, node),
            }
        }
    }

    // ── Type resolution ────────────────────────────────────────────

    /// Graph id for a type name as written in source. Builtins resolve to
    /// nothing; `pkg.Name` resolves through the import table.
    fn resolve(&self, name: &str) -> Option<String> {
        if is_builtin(name) {
            return None;
        }
        match name.split_once('.') {
            Some((qualifier, rest)) => {
                let path = self.imports.get(qualifier).map_or(qualifier, String::as_str);
                Some(format!("{path}.{rest}"))
            }
            None => Some(self.qualify(name)),
        }
    }

    fn references(&mut self, from: &str, ty: &TypeDescriptor, node: &SyntaxNode) {
        let targets: Vec<String> = ty
            .named_leaves()
            .into_iter()
            .filter_map(|leaf| self.resolve(leaf))
            .collect();
        for target in targets {
            if target != from {
                self.edge(from, target, DependencyKind::Reference, node);
            }
        }
    }

    // ── Satisfaction ───────────────────────────────────────────────

    fn add_satisfactions(&mut self) -> usize {
        let pairs: Vec<(String, String)> = self
            .index
            .implementations()
            .into_iter()
            .map(|(ty, iface)| (ty.to_string(), iface.to_string()))
            .collect();
        for (ty, iface) in &pairs {
            let location = self.type_locations.get(ty).cloned().unwrap_or_default();
            let from = self.qualify(ty);
            let to = self.qualify(iface);
            self.graph
                .add_dependency(Dependency::new(from, to, DependencyKind::Satisfy).at(location));
        }
        pairs.len()
    }
}

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use petgraph::dot::{Config, Dot};
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};

// ── Node and edge types ────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Module,
    Type,
    Function,
    /// An interface or other structural contract.
    Contract,
    Variable,
    Namespace,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Module => "module",
            Self::Type => "type",
            Self::Function => "function",
            Self::Contract => "contract",
            Self::Variable => "variable",
            Self::Namespace => "namespace",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyKind {
    /// A module imports another module.
    Include,
    Reference,
    /// A type structurally satisfies a contract.
    Satisfy,
    /// A type embeds another type.
    Compose,
    /// A contract embeds another contract.
    Inherit,
}

impl DependencyKind {
    pub const ALL: [Self; 5] = [
        Self::Include,
        Self::Reference,
        Self::Satisfy,
        Self::Compose,
        Self::Inherit,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Include => "include",
            Self::Reference => "reference",
            Self::Satisfy => "satisfy",
            Self::Compose => "compose",
            Self::Inherit => "inherit",
        }
    }
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DependencyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown dependency kind: {s}"))
    }
}

/// Where in source a dependency was observed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub file: String,
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub kind: NodeKind,
    pub name: String,
    pub path: String,
    pub is_external: bool,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl Node {
    pub fn new(id: impl Into<String>, kind: NodeKind, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            name: name.into(),
            path: String::new(),
            is_external: false,
            metadata: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    #[must_use]
    pub fn external(mut self, is_external: bool) -> Self {
        self.is_external = is_external;
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, key: &str, value: serde_json::Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dependency {
    pub from: String,
    pub to: String,
    pub kind: DependencyKind,
    #[serde(default)]
    pub location: Location,
    #[serde(default)]
    pub is_external: bool,
}

impl Dependency {
    pub fn new(from: impl Into<String>, to: impl Into<String>, kind: DependencyKind) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            kind,
            location: Location::default(),
            is_external: false,
        }
    }

    #[must_use]
    pub fn at(mut self, location: Location) -> Self {
        self.location = location;
        self
    }

    #[must_use]
    pub fn external(mut self, is_external: bool) -> Self {
        self.is_external = is_external;
        self
    }

    fn key(&self) -> EdgeKey {
        (self.from.clone(), self.to.clone(), self.kind)
    }
}

type EdgeKey = (String, String, DependencyKind);

/// A dependency cycle, rotated so that it starts at its lexicographically
/// smallest member. The closing edge back to the first node is implicit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cycle(Vec<String>);

impl Cycle {
    /// Normalize a cycle given as its members in traversal order.
    pub fn normalized(members: Vec<String>) -> Self {
        let n = members.len();
        let best = (0..n)
            .min_by(|&a, &b| {
                let ra = members[a..].iter().chain(&members[..a]);
                let rb = members[b..].iter().chain(&members[..b]);
                ra.cmp(rb)
            })
            .unwrap_or(0);
        let mut members = members;
        members.rotate_left(best);
        Self(members)
    }

    pub fn members(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Members followed by the first member again.
    pub fn closed_path(&self) -> Vec<&str> {
        let mut path: Vec<&str> = self.0.iter().map(String::as_str).collect();
        if let Some(first) = self.0.first() {
            path.push(first);
        }
        path
    }

    /// Canonical key used for deduplication.
    pub fn key(&self) -> String {
        self.0.join("->")
    }
}

impl fmt::Display for Cycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.closed_path().join(" -> "))
    }
}

/// Outcome of folding one graph into another.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeSummary {
    pub nodes_added: usize,
    pub edges_added: usize,
    /// Edges skipped because an endpoint was missing from the receiver.
    pub edges_dropped: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Outgoing,
    Incoming,
}

// ── Graph ──────────────────────────────────────────────────────────

/// Cross-unit dependency graph.
///
/// Besides nodes and edges the graph keeps derived indexes that every
/// mutation updates: the set of edge keys (no duplicate `(from, to, kind)`),
/// the direct internal include edges, the external-node table, and the last
/// computed cycle list, which mutations invalidate.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DependencyGraph {
    nodes: BTreeMap<String, Node>,
    dependencies: Vec<Dependency>,
    external: BTreeSet<String>,
    cycles: Vec<Cycle>,
    #[serde(skip)]
    edge_keys: HashSet<EdgeKey>,
    #[serde(skip)]
    direct: Vec<usize>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every node, edge and derived index.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.dependencies.is_empty()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn dependency_count(&self) -> usize {
        self.dependencies.len()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn has_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Insert a node, or fold it into the existing node with the same id:
    /// metadata keys are merged and the external flag is OR'd. Returns
    /// whether the id was new.
    pub fn add_node(&mut self, node: Node) -> bool {
        if node.is_external {
            self.external.insert(node.id.clone());
        }
        self.cycles.clear();
        match self.nodes.get_mut(&node.id) {
            Some(existing) => {
                existing.is_external |= node.is_external;
                existing.metadata.extend(node.metadata);
                false
            }
            None => {
                self.nodes.insert(node.id.clone(), node);
                true
            }
        }
    }

    /// Record an edge unless one with the same `(from, to, kind)` exists.
    pub fn add_dependency(&mut self, dep: Dependency) -> bool {
        if !self.edge_keys.insert(dep.key()) {
            return false;
        }
        if dep.kind == DependencyKind::Include && !dep.is_external {
            self.direct.push(self.dependencies.len());
        }
        if dep.is_external && self.nodes.contains_key(&dep.to) {
            self.external.insert(dep.to.clone());
        }
        self.cycles.clear();
        self.dependencies.push(dep);
        true
    }

    pub fn has_dependency(&self, from: &str, to: &str, kind: DependencyKind) -> bool {
        self.edge_keys
            .contains(&(from.to_string(), to.to_string(), kind))
    }

    pub fn nodes_of_kind(&self, kind: NodeKind) -> Vec<&Node> {
        self.nodes.values().filter(|n| n.kind == kind).collect()
    }

    pub fn dependencies_of_kind(&self, kind: DependencyKind) -> Vec<&Dependency> {
        self.dependencies.iter().filter(|d| d.kind == kind).collect()
    }

    /// Include edges between internal modules.
    pub fn direct_includes(&self) -> impl Iterator<Item = &Dependency> {
        self.direct.iter().map(|&i| &self.dependencies[i])
    }

    pub fn dependencies_from(&self, id: &str) -> Vec<&Dependency> {
        self.dependencies.iter().filter(|d| d.from == id).collect()
    }

    pub fn dependencies_to(&self, id: &str) -> Vec<&Dependency> {
        self.dependencies.iter().filter(|d| d.to == id).collect()
    }

    // ── Traversal ──────────────────────────────────────────────────

    /// Nodes reached from `id` through at least one intermediate node,
    /// within `max_depth` hops. Each result is a synthesized edge from `id`
    /// to the reached node carrying the kind and location of the final hop.
    ///
    /// A single visited set is shared across the whole walk, so a node
    /// reached first along one branch is never revisited via another; the
    /// result is an approximation of the reachable set, not an enumeration
    /// of paths.
    pub fn indirect_from(&self, id: &str, max_depth: usize) -> Vec<Dependency> {
        self.indirect(id, max_depth, Direction::Outgoing)
    }

    /// Incoming counterpart of [`indirect_from`](Self::indirect_from).
    pub fn indirect_to(&self, id: &str, max_depth: usize) -> Vec<Dependency> {
        self.indirect(id, max_depth, Direction::Incoming)
    }

    fn indirect(&self, id: &str, max_depth: usize, direction: Direction) -> Vec<Dependency> {
        let mut visited: HashSet<&str> = HashSet::new();
        visited.insert(id);
        let mut out = Vec::new();
        self.walk(id, id, max_depth, 1, direction, &mut visited, &mut out);
        out
    }

    #[allow(clippy::too_many_arguments)]
    fn walk<'a>(
        &'a self,
        start: &str,
        current: &str,
        remaining: usize,
        hop: usize,
        direction: Direction,
        visited: &mut HashSet<&'a str>,
        out: &mut Vec<Dependency>,
    ) {
        if remaining == 0 {
            return;
        }
        for dep in &self.dependencies {
            let next = match direction {
                Direction::Outgoing if dep.from == current => dep.to.as_str(),
                Direction::Incoming if dep.to == current => dep.from.as_str(),
                _ => continue,
            };
            if !visited.insert(next) {
                continue;
            }
            if hop > 1 {
                let (from, to) = match direction {
                    Direction::Outgoing => (start, next),
                    Direction::Incoming => (next, start),
                };
                out.push(Dependency {
                    from: from.to_string(),
                    to: to.to_string(),
                    kind: dep.kind,
                    location: dep.location.clone(),
                    is_external: dep.is_external,
                });
            }
            self.walk(start, next, remaining - 1, hop + 1, direction, visited, out);
        }
    }

    // ── External dependencies ──────────────────────────────────────

    /// Nodes flagged external or targeted by an external edge.
    pub fn external_nodes(&self) -> Vec<&Node> {
        self.nodes
            .values()
            .filter(|n| n.is_external || self.external.contains(&n.id))
            .collect()
    }

    /// [`external_nodes`](Self::external_nodes) plus external nodes reached
    /// by following edges out of known external nodes, up to `max_depth`
    /// hops. Each node is expanded at most once.
    pub fn external_nodes_recursive(&self, max_depth: usize) -> Vec<&Node> {
        let mut found: BTreeSet<&str> = self
            .external_nodes()
            .into_iter()
            .map(|n| n.id.as_str())
            .collect();
        let mut frontier: Vec<&str> = found.iter().copied().collect();
        let mut processed: HashSet<&str> = HashSet::new();

        for _ in 0..max_depth {
            let mut next = Vec::new();
            for id in frontier {
                if !processed.insert(id) {
                    continue;
                }
                for dep in self.dependencies.iter().filter(|d| d.from == id) {
                    let Some(target) = self.nodes.get(&dep.to) else {
                        continue;
                    };
                    let external = target.is_external || dep.is_external;
                    if external && found.insert(target.id.as_str()) {
                        next.push(target.id.as_str());
                    }
                }
            }
            if next.is_empty() {
                break;
            }
            frontier = next;
        }

        found.into_iter().filter_map(|id| self.nodes.get(id)).collect()
    }

    // ── Roots and leaves ───────────────────────────────────────────

    /// Nodes no edge points at.
    pub fn root_nodes(&self) -> Vec<&Node> {
        let targets: HashSet<&str> = self.dependencies.iter().map(|d| d.to.as_str()).collect();
        self.nodes
            .values()
            .filter(|n| !targets.contains(n.id.as_str()))
            .collect()
    }

    /// Nodes with no outgoing edge.
    pub fn leaf_nodes(&self) -> Vec<&Node> {
        let sources: HashSet<&str> = self.dependencies.iter().map(|d| d.from.as_str()).collect();
        self.nodes
            .values()
            .filter(|n| !sources.contains(n.id.as_str()))
            .collect()
    }

    // ── Cycles ─────────────────────────────────────────────────────

    /// Detect cycles over every edge and remember the result.
    pub fn find_cycles(&mut self) -> &[Cycle] {
        self.cycles = self.cycles_over(|_| true);
        &self.cycles
    }

    /// Cycles from the last [`find_cycles`](Self::find_cycles) call; empty
    /// if the graph changed since.
    pub fn cycles(&self) -> &[Cycle] {
        &self.cycles
    }

    /// Detect cycles using only edges of the given kinds.
    pub fn find_cycles_by_kind(&self, kinds: &[DependencyKind]) -> Vec<Cycle> {
        self.cycles_over(|d| kinds.contains(&d.kind))
    }

    fn cycles_over(&self, keep: impl Fn(&Dependency) -> bool) -> Vec<Cycle> {
        let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
        let mut starts: BTreeSet<&str> = self.nodes.keys().map(String::as_str).collect();
        for dep in self.dependencies.iter().filter(|d| keep(d)) {
            adjacency
                .entry(dep.from.as_str())
                .or_default()
                .push(dep.to.as_str());
            starts.insert(dep.from.as_str());
            starts.insert(dep.to.as_str());
        }

        let mut search = CycleSearch {
            adjacency: &adjacency,
            visited: HashSet::new(),
            on_path: HashSet::new(),
            path: Vec::new(),
            seen: HashSet::new(),
            cycles: Vec::new(),
        };
        for start in starts {
            if !search.visited.contains(start) {
                search.dfs(start);
            }
        }
        search.cycles
    }

    // ── Merge ──────────────────────────────────────────────────────

    /// Fold `donor` into this graph. Nodes are unified by id; edges are
    /// unified by `(from, to, kind)` and skipped when either endpoint is
    /// absent after the node merge.
    pub fn merge(&mut self, donor: &DependencyGraph) -> MergeSummary {
        let nodes_added = self.merge_nodes(donor);
        let (edges_added, edges_dropped) = self.merge_edges(donor);
        MergeSummary {
            nodes_added,
            edges_added,
            edges_dropped,
        }
    }

    /// Union several graphs, adopting every node before any edge so that
    /// edges between declarations of different units survive.
    pub fn merge_all<'a>(graphs: impl IntoIterator<Item = &'a DependencyGraph>) -> Self {
        let graphs: Vec<&DependencyGraph> = graphs.into_iter().collect();
        let mut merged = Self::new();
        for graph in &graphs {
            merged.merge_nodes(graph);
        }
        for graph in &graphs {
            merged.merge_edges(graph);
        }
        merged
    }

    fn merge_nodes(&mut self, donor: &DependencyGraph) -> usize {
        donor
            .nodes
            .values()
            .filter(|node| self.add_node((*node).clone()))
            .count()
    }

    fn merge_edges(&mut self, donor: &DependencyGraph) -> (usize, usize) {
        let (mut added, mut dropped) = (0, 0);
        for dep in &donor.dependencies {
            if !self.has_node(&dep.from) || !self.has_node(&dep.to) {
                dropped += 1;
                continue;
            }
            if self.add_dependency(dep.clone()) {
                added += 1;
            }
        }
        (added, dropped)
    }

    // ── Export ─────────────────────────────────────────────────────

    /// Project into a petgraph graph: node weights are ids, edge weights
    /// are dependency kinds. Edge endpoints without a node get a
    /// placeholder node.
    pub fn to_petgraph(&self) -> DiGraph<String, DependencyKind> {
        let mut graph = DiGraph::with_capacity(self.nodes.len(), self.dependencies.len());
        let mut index: HashMap<&str, NodeIndex> = HashMap::new();
        for id in self.nodes.keys() {
            index.insert(id.as_str(), graph.add_node(id.clone()));
        }
        for dep in &self.dependencies {
            let from = *index
                .entry(dep.from.as_str())
                .or_insert_with(|| graph.add_node(dep.from.clone()));
            let to = *index
                .entry(dep.to.as_str())
                .or_insert_with(|| graph.add_node(dep.to.clone()));
            graph.add_edge(from, to, dep.kind);
        }
        graph
    }

    /// Graphviz rendering of the whole graph.
    pub fn to_dot(&self) -> String {
        use std::fmt::Write;

        let graph = self.to_petgraph();
        let body = Dot::with_config(&graph, &[Config::GraphContentOnly]).to_string();
        let mut out = String::from("digraph dependencies {\n    rankdir=LR;\n");
        for line in body.lines().filter(|l| !l.trim().is_empty()) {
            let _ = writeln!(out, "    {}", line.trim());
        }
        out.push_str("}\n");
        out
    }
}

struct CycleSearch<'a> {
    adjacency: &'a HashMap<&'a str, Vec<&'a str>>,
    visited: HashSet<&'a str>,
    on_path: HashSet<&'a str>,
    path: Vec<&'a str>,
    seen: HashSet<String>,
    cycles: Vec<Cycle>,
}

impl<'a> CycleSearch<'a> {
    fn dfs(&mut self, node: &'a str) {
        self.visited.insert(node);
        self.on_path.insert(node);
        self.path.push(node);

        let adjacency = self.adjacency;
        for &next in adjacency.get(node).map(Vec::as_slice).unwrap_or_default() {
            if !self.visited.contains(next) {
                self.dfs(next);
            } else if self.on_path.contains(next) {
                if let Some(start) = self.path.iter().position(|&n| n == next) {
                    let members = self.path[start..].iter().map(|s| (*s).to_string()).collect();
                    let cycle = Cycle::normalized(members);
                    if self.seen.insert(cycle.key()) {
                        self.cycles.push(cycle);
                    }
                }
            }
        }

        self.path.pop();
        self.on_path.remove(node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn module(id: &str) -> Node {
        Node::new(id, NodeKind::Module, id)
    }

    fn include(from: &str, to: &str) -> Dependency {
        Dependency::new(from, to, DependencyKind::Include)
    }

    fn chain(ids: &[&str]) -> DependencyGraph {
        let mut graph = DependencyGraph::new();
        for id in ids {
            graph.add_node(module(id));
        }
        for pair in ids.windows(2) {
            graph.add_dependency(include(pair[0], pair[1]));
        }
        graph
    }

    #[test]
    fn duplicate_edges_are_ignored() {
        let mut graph = chain(&["a", "b"]);
        assert!(!graph.add_dependency(include("a", "b")));
        assert!(graph.add_dependency(Dependency::new("a", "b", DependencyKind::Reference)));
        assert_eq!(graph.dependency_count(), 2);
        assert_eq!(graph.direct_includes().count(), 1);
        assert!(graph.has_dependency("a", "b", DependencyKind::Include));
        assert!(!graph.has_dependency("b", "a", DependencyKind::Include));
    }

    #[test]
    fn add_node_folds_metadata_and_external_flag() {
        let mut graph = DependencyGraph::new();
        assert!(graph.add_node(module("fmt").with_metadata("a", 1.into())));
        assert!(!graph.add_node(
            module("fmt")
                .external(true)
                .with_metadata("b", 2.into())
        ));
        let node = graph.node("fmt").unwrap();
        assert!(node.is_external);
        assert_eq!(node.metadata.len(), 2);
        assert_eq!(graph.external_nodes().len(), 1);
    }

    #[test]
    fn roots_and_leaves() {
        let graph = chain(&["a", "b", "c"]);
        let roots: Vec<_> = graph.root_nodes().iter().map(|n| n.id.as_str()).collect();
        let leaves: Vec<_> = graph.leaf_nodes().iter().map(|n| n.id.as_str()).collect();
        assert_eq!(roots, vec!["a"]);
        assert_eq!(leaves, vec!["c"]);
        assert_eq!(graph.dependencies_from("b").len(), 1);
        assert_eq!(graph.dependencies_to("b")[0].from, "a");
    }

    #[test]
    fn indirect_skips_first_hop_and_respects_depth() {
        let graph = chain(&["a", "b", "c", "d"]);
        let targets = |deps: Vec<Dependency>| -> Vec<String> {
            deps.into_iter().map(|d| d.to).collect()
        };

        assert!(graph.indirect_from("a", 0).is_empty());
        assert!(graph.indirect_from("a", 1).is_empty());
        assert_eq!(targets(graph.indirect_from("a", 2)), vec!["c"]);
        assert_eq!(targets(graph.indirect_from("a", 10)), vec!["c", "d"]);
        assert!(graph.indirect_from("a", 10).iter().all(|d| d.from == "a"));

        let sources: Vec<_> = graph
            .indirect_to("d", 10)
            .into_iter()
            .map(|d| d.from)
            .collect();
        assert_eq!(sources, vec!["b", "a"]);
    }

    #[test]
    fn indirect_terminates_on_cycles() {
        let mut graph = chain(&["a", "b", "c"]);
        graph.add_dependency(include("c", "a"));
        let reached = graph.indirect_from("a", 100);
        assert_eq!(reached.len(), 1);
        assert_eq!(reached[0].to, "c");
    }

    #[test]
    fn three_node_cycle_found_once_from_any_start() {
        for start in ["a", "b", "c"] {
            let mut graph = DependencyGraph::new();
            // "0" sorts first, so the search enters the cycle at `start`.
            graph.add_dependency(include("0", start));
            graph.add_dependency(include("a", "b"));
            graph.add_dependency(include("b", "c"));
            graph.add_dependency(include("c", "a"));
            let cycles = graph.find_cycles().to_vec();
            assert_eq!(cycles.len(), 1, "start {start}");
            assert_eq!(cycles[0].members(), &["a", "b", "c"]);
            assert_eq!(cycles[0].to_string(), "a -> b -> c -> a");
        }
    }

    #[test]
    fn two_module_include_cycle_reported_once() {
        let mut graph = chain(&["b", "a"]);
        graph.add_dependency(include("a", "b"));
        let cycles = graph.find_cycles();
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].closed_path(), vec!["a", "b", "a"]);
    }

    #[test]
    fn cycle_cache_is_invalidated_by_mutation() {
        let mut graph = chain(&["a", "b"]);
        graph.add_dependency(include("b", "a"));
        assert_eq!(graph.find_cycles().len(), 1);
        assert_eq!(graph.cycles().len(), 1);
        graph.add_node(module("c"));
        assert!(graph.cycles().is_empty());
    }

    #[test]
    fn cycles_by_kind_filter_edges() {
        let mut graph = chain(&["a", "b"]);
        graph.add_dependency(Dependency::new("b", "a", DependencyKind::Reference));
        assert_eq!(graph.find_cycles().len(), 1);
        assert!(graph.find_cycles_by_kind(&[DependencyKind::Include]).is_empty());
    }

    #[test]
    fn self_loop_is_a_cycle() {
        let mut graph = chain(&["a"]);
        graph.add_dependency(include("a", "a"));
        let cycles = graph.find_cycles();
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].members(), &["a"]);
    }

    #[test]
    fn normalization_picks_smallest_rotation() {
        let cycle = Cycle::normalized(vec!["m".into(), "z".into(), "b".into()]);
        assert_eq!(cycle.members(), &["b", "m", "z"]);
        assert_eq!(cycle.key(), "b->m->z");
        let again = Cycle::normalized(cycle.members().to_vec());
        assert_eq!(again, cycle);
    }

    #[test]
    fn external_discovery() {
        let mut graph = DependencyGraph::new();
        graph.add_node(module("app"));
        graph.add_node(module("github.com/x/lib"));
        graph.add_node(module("github.com/x/dep").external(true));
        graph.add_node(module("github.com/x/deeper").external(true));
        graph.add_dependency(include("app", "github.com/x/lib").external(true));
        graph.add_dependency(include("github.com/x/lib", "github.com/x/dep"));
        graph.add_dependency(include("github.com/x/dep", "github.com/x/deeper"));

        let ids = |nodes: Vec<&Node>| -> Vec<String> { nodes.iter().map(|n| n.id.clone()).collect() };
        assert_eq!(
            ids(graph.external_nodes()),
            vec!["github.com/x/deeper", "github.com/x/dep", "github.com/x/lib"]
        );
        assert_eq!(graph.external_nodes_recursive(0).len(), 3);
        assert_eq!(graph.external_nodes_recursive(5).len(), 3);
        assert!(graph.direct_includes().all(|d| !d.is_external));
    }

    #[test]
    fn recursive_external_follows_external_edges() {
        let mut graph = DependencyGraph::new();
        graph.add_node(module("vendor/a").external(true));
        graph.add_node(module("vendor/b"));
        graph.add_node(module("vendor/c"));
        graph.add_dependency(include("vendor/a", "vendor/b").external(true));
        graph.add_dependency(include("vendor/b", "vendor/c").external(true));
        // Both targets were indexed when their edges were added.
        assert_eq!(graph.external_nodes().len(), 3);

        let mut late = DependencyGraph::new();
        late.add_dependency(include("vendor/a", "vendor/b").external(true));
        late.add_dependency(include("vendor/b", "vendor/c").external(true));
        late.add_node(module("vendor/a").external(true));
        late.add_node(module("vendor/b"));
        late.add_node(module("vendor/c"));
        // Edges added before their targets did not index them.
        assert_eq!(late.external_nodes().len(), 1);
        assert_eq!(late.external_nodes_recursive(1).len(), 2);
        assert_eq!(late.external_nodes_recursive(2).len(), 3);
    }

    #[test]
    fn merge_drops_dangling_edges() {
        let mut receiver = chain(&["a", "b"]);
        let mut donor = DependencyGraph::new();
        donor.add_node(module("c"));
        donor.add_dependency(include("b", "c"));
        donor.add_dependency(include("c", "missing"));

        let summary = receiver.merge(&donor);
        assert_eq!(summary.nodes_added, 1);
        assert_eq!(summary.edges_added, 1);
        assert_eq!(summary.edges_dropped, 1);
        assert!(receiver.has_dependency("b", "c", DependencyKind::Include));
        assert!(!receiver.has_node("missing"));
        // Donor is untouched.
        assert_eq!(donor.dependency_count(), 2);
    }

    #[test]
    fn merge_all_adopts_nodes_before_edges() {
        let mut first = DependencyGraph::new();
        first.add_node(module("p.A"));
        first.add_dependency(Dependency::new("p.A", "p.B", DependencyKind::Reference));
        let mut second = DependencyGraph::new();
        second.add_node(module("p.B"));

        let mut sequential = DependencyGraph::new();
        sequential.merge(&first);
        sequential.merge(&second);
        assert_eq!(sequential.dependency_count(), 0);

        let merged = DependencyGraph::merge_all([&first, &second]);
        assert_eq!(merged.node_count(), 2);
        assert!(merged.has_dependency("p.A", "p.B", DependencyKind::Reference));
    }

    #[test]
    fn dot_export_lists_nodes_and_edges() {
        let graph = chain(&["a", "b"]);
        let dot = graph.to_dot();
        assert!(dot.starts_with("digraph dependencies {"));
        assert!(dot.contains("label = \"a\""));
        assert!(dot.contains("label = \"include\""));
        assert!(dot.trim_end().ends_with('}'));
    }

    #[test]
    fn clear_resets_everything() {
        let mut graph = chain(&["a", "b"]);
        graph.clear();
        assert!(graph.is_empty());
        assert!(graph.add_dependency(include("a", "b")));
    }

    // ── Properties ─────────────────────────────────────────────────

    fn arb_edges() -> impl Strategy<Value = Vec<(u8, u8, u8)>> {
        prop::collection::vec((0u8..8, 0u8..8, 0u8..5), 0..40)
    }

    fn build(edges: &[(u8, u8, u8)]) -> DependencyGraph {
        let mut graph = DependencyGraph::new();
        for &(from, to, kind) in edges {
            graph.add_node(module(&format!("n{from}")));
            graph.add_node(module(&format!("n{to}")).external(kind == 0 && to % 3 == 0));
            graph.add_dependency(Dependency::new(
                format!("n{from}"),
                format!("n{to}"),
                DependencyKind::ALL[kind as usize],
            ));
        }
        graph
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn cycles_are_normalized_and_distinct(edges in arb_edges()) {
            let mut graph = build(&edges);
            let cycles = graph.find_cycles().to_vec();
            let keys: HashSet<String> = cycles.iter().map(Cycle::key).collect();
            prop_assert_eq!(keys.len(), cycles.len());
            for cycle in &cycles {
                prop_assert_eq!(&Cycle::normalized(cycle.members().to_vec()), cycle);
            }
            prop_assert_eq!(graph.find_cycles().to_vec(), cycles);
        }

        #[test]
        fn indirect_is_bounded_by_node_count(edges in arb_edges(), depth in 0usize..12) {
            let graph = build(&edges);
            for node in graph.nodes() {
                let reached = graph.indirect_from(&node.id, depth);
                prop_assert!(reached.len() < graph.node_count().max(1));
                let incoming = graph.indirect_to(&node.id, depth);
                prop_assert!(incoming.len() < graph.node_count().max(1));
            }
        }

        #[test]
        fn external_discovery_is_monotone(edges in arb_edges(), depth in 0usize..6) {
            let graph = build(&edges);
            let shallow: HashSet<String> = graph
                .external_nodes_recursive(depth)
                .iter()
                .map(|n| n.id.clone())
                .collect();
            let deep: HashSet<String> = graph
                .external_nodes_recursive(depth + 1)
                .iter()
                .map(|n| n.id.clone())
                .collect();
            prop_assert!(shallow.is_subset(&deep));
        }

        #[test]
        fn merge_keeps_edges_unique(edges in arb_edges(), other in arb_edges()) {
            let mut receiver = build(&edges);
            let donor = build(&other);
            receiver.merge(&donor);
            receiver.merge(&donor);
            let keys: HashSet<_> = receiver.dependencies().iter().map(Dependency::key).collect();
            prop_assert_eq!(keys.len(), receiver.dependency_count());
            for dep in receiver.dependencies() {
                prop_assert!(receiver.has_node(&dep.from) && receiver.has_node(&dep.to));
            }
        }
    }
}

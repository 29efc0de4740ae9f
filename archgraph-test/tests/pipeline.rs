use archgraph_core::config::DependencyConfig;
use archgraph_core::dependency::{
    DependencyAnalyzer, DependencyGraph, DependencyKind, GoDependencyAnalyzer, NodeKind,
};
use archgraph_core::metrics::{Metric, MetricsCollector};
use archgraph_core::structure::{
    ElementKind, GoStructureAnalyzer, RelationKind, StructureAnalyzer, StructureModel,
};
use archgraph_test::{APP_GO, CYCLE_GO, DOCS_GO, GoFixture, parse_go};

fn docs_model() -> StructureModel {
    GoStructureAnalyzer
        .analyze(&parse_go(DOCS_GO, "docs/docs.go"))
        .unwrap()
}

fn docs_and_app_graph() -> GoDependencyAnalyzer {
    let fixture = GoFixture::two_packages();
    let graphs: Vec<DependencyGraph> = fixture
        .parse()
        .iter()
        .map(|tree| {
            let mut analyzer = GoDependencyAnalyzer::new(DependencyConfig::default());
            analyzer.analyze(tree).unwrap();
            analyzer.into_graph()
        })
        .collect();
    GoDependencyAnalyzer::with_graph(
        DependencyConfig::default(),
        DependencyGraph::merge_all(&graphs),
    )
}

// ── Structure ──────────────────────────────────────────────────────

#[test]
fn docs_package_structure() {
    let model = docs_model();
    let count = |kind| model.relationships_of_kind(kind).count();

    assert_eq!(model.language(), "go");
    assert_eq!(model.elements().len(), 10);
    assert_eq!(model.elements_of_kind(ElementKind::Interface).count(), 2);
    assert_eq!(model.elements_of_kind(ElementKind::Type).count(), 3);
    assert_eq!(model.elements_of_kind(ElementKind::Method).count(), 2);
    assert_eq!(model.elements_of_kind(ElementKind::Function).count(), 2);

    assert_eq!(count(RelationKind::Contains), 9);
    assert_eq!(count(RelationKind::MethodReceiver), 2);
    assert_eq!(count(RelationKind::InterfaceEmbeds), 1);
    assert_eq!(count(RelationKind::Embeds), 2);
    assert_eq!(count(RelationKind::Implements), 4);
    assert_eq!(count(RelationKind::Calls), 1);

    assert!(model.relates(RelationKind::MethodReceiver, "Write", "Document"));
    assert!(model.relates(RelationKind::Embeds, "ValidatingDocument", "JSONDocument"));
    assert!(model.relates(RelationKind::InterfaceEmbeds, "Validator", "Writer"));
    assert!(model.relates(RelationKind::Calls, "Render", "NewDocument"));
    assert!(model.relates(RelationKind::References, "NewDocument", "Document"));
    assert!(model.relates(RelationKind::References, "Render", "Writer"));
}

#[test]
fn promoted_methods_satisfy_interfaces() {
    let model = docs_model();
    for (ty, iface) in [
        ("Document", "Writer"),
        ("JSONDocument", "Writer"),
        ("ValidatingDocument", "Writer"),
        ("ValidatingDocument", "Validator"),
    ] {
        assert!(
            model.relates(RelationKind::Implements, ty, iface),
            "{ty} should implement {iface}"
        );
    }
    assert!(!model.relates(RelationKind::Implements, "Document", "Validator"));
    assert!(!model.relates(RelationKind::Implements, "JSONDocument", "Validator"));
}

#[test]
fn docs_package_metrics() {
    let metrics = MetricsCollector::collect(&docs_model());
    assert_eq!(metrics.get(Metric::TotalElements), 10);
    assert_eq!(metrics.get(Metric::Elements(ElementKind::Package)), 1);
    assert_eq!(metrics.get(Metric::Relations(RelationKind::Implements)), 4);
    assert_eq!(metrics.get(Metric::MaxDepth), 1);
    assert_eq!(metrics.get(Metric::AvgDepth), 1);
    assert_eq!(metrics.get(Metric::MaxChildren), 9);
    assert_eq!(metrics.get(Metric::AvgChildren), 9);

    let map = metrics.to_map();
    assert_eq!(map["interfaces"], 2);
    assert_eq!(map["method_receiver"], 2);
}

#[test]
fn merged_structure_keeps_packages_apart() {
    let fixture = GoFixture::two_packages();
    let trees = fixture.parse();
    assert_eq!(trees.len(), 2);

    let analyzer = GoStructureAnalyzer;
    let mut merged = StructureModel::new(analyzer.language());
    for tree in &trees {
        let model = analyzer.analyze(tree).unwrap();
        analyzer.merge(&mut merged, &model).unwrap();
    }

    assert_eq!(merged.elements_of_kind(ElementKind::Package).count(), 2);
    assert_eq!(merged.elements().len(), 13);
    assert!(merged.relates(RelationKind::Contains, "app", "Publish"));
    assert!(merged.relates(RelationKind::Contains, "docs", "Document"));
    assert_eq!(merged.relationships_of_kind(RelationKind::Implements).count(), 4);
}

// ── Dependencies ───────────────────────────────────────────────────

#[test]
fn docs_dependency_graph() {
    let mut analyzer = GoDependencyAnalyzer::new(DependencyConfig::default());
    let graph = analyzer
        .analyze(&parse_go(DOCS_GO, "docs/docs.go"))
        .unwrap();

    assert_eq!(graph.node("docs.Writer").map(|n| n.kind), Some(NodeKind::Contract));
    assert_eq!(
        graph.node("docs.Document.Write").map(|n| n.kind),
        Some(NodeKind::Function)
    );
    assert!(graph.has_dependency("docs", "fmt", DependencyKind::Include));
    assert!(graph.has_dependency("docs", "io", DependencyKind::Include));
    assert!(graph.has_dependency("docs.Validator", "docs.Writer", DependencyKind::Inherit));
    assert!(graph.has_dependency("docs.JSONDocument", "docs.Document", DependencyKind::Compose));
    assert!(graph.has_dependency(
        "docs.ValidatingDocument",
        "docs.JSONDocument",
        DependencyKind::Compose
    ));
    assert!(graph.has_dependency(
        "docs.ValidatingDocument",
        "docs.Validator",
        DependencyKind::Satisfy
    ));
    assert!(graph.has_dependency("docs.Render", "io.Writer", DependencyKind::Reference));
    assert!(graph.has_dependency("docs.Render", "docs.NewDocument", DependencyKind::Reference));
    assert_eq!(graph.dependencies_of_kind(DependencyKind::Satisfy).len(), 4);

    let external: Vec<_> = graph.external_nodes().iter().map(|n| n.id.as_str()).collect();
    assert_eq!(external, vec!["fmt", "io"]);
}

#[test]
fn units_merge_into_one_graph() {
    let analyzer = docs_and_app_graph();
    let graph = analyzer.graph();

    assert!(graph.has_node("app.Publish"));
    assert!(graph.has_node("docs.Document"));
    assert!(graph.has_dependency("app", "docs", DependencyKind::Include));
    assert!(graph.has_dependency("app.Default", "docs.Writer", DependencyKind::Reference));
    assert!(graph.has_dependency("app.Publish", "docs.Document", DependencyKind::Reference));
    // Edges into packages outside the unit set have no endpoint to land on.
    assert!(!graph.has_node("io.Writer"));
    assert!(
        graph
            .dependencies()
            .iter()
            .all(|d| graph.has_node(&d.from) && graph.has_node(&d.to))
    );

    let dependents: Vec<_> = analyzer
        .dependents("docs.Document")
        .into_iter()
        .map(|d| d.from)
        .collect();
    assert!(dependents.contains(&"app.Publish".to_string()));
    assert!(dependents.contains(&"docs.JSONDocument".to_string()));
}

#[test]
fn cycles_between_types() {
    let mut analyzer = GoDependencyAnalyzer::new(DependencyConfig::default());
    analyzer.analyze(&parse_go(CYCLE_GO, "ring.go")).unwrap();

    let cycles = analyzer.find_circular_dependencies();
    assert_eq!(cycles.len(), 1);
    assert_eq!(cycles[0].members(), &["ring.Edge", "ring.Node"]);
    assert_eq!(cycles[0].to_string(), "ring.Edge -> ring.Node -> ring.Edge");

    let graph = analyzer.graph();
    assert!(graph.find_cycles_by_kind(&[DependencyKind::Include]).is_empty());
    assert_eq!(graph.find_cycles_by_kind(&[DependencyKind::Reference]).len(), 1);

    // A cycle through the start still terminates every traversal.
    let reached = graph.indirect_from("ring.Node", 50);
    assert!(reached.len() <= graph.node_count());
}

#[test]
fn app_source_parses_standalone() {
    let tree = parse_go(APP_GO, "app/main.go");
    let mut analyzer = GoDependencyAnalyzer::new(DependencyConfig::default());
    let graph = analyzer.analyze(&tree).unwrap();
    assert!(graph.node("docs").unwrap().is_external);
    let roots: Vec<_> = graph.root_nodes().iter().map(|n| n.id.as_str()).collect();
    assert_eq!(roots, vec!["app", "app.Default", "app.Publish"]);
    let leaves: Vec<_> = graph.leaf_nodes().iter().map(|n| n.id.as_str()).collect();
    assert_eq!(leaves, vec!["docs"]);
}

#[test]
fn shallower_embedding_decides_satisfaction() {
    let source = r"package shadow

type Writer interface {
	Write(p []byte) (int, error)
}

type Deep struct{}

func (d Deep) Write(s string) error {
	return nil
}

type Left struct {
	Deep
}

type Right struct{}

func (r Right) Write(p []byte) (int, error) {
	return len(p), nil
}

type Outer struct {
	Left
	Right
}
";
    let tree = parse_go(source, "shadow.go");

    let model = GoStructureAnalyzer.analyze(&tree).unwrap();
    assert!(model.relates(RelationKind::Implements, "Outer", "Writer"));
    assert!(model.relates(RelationKind::Implements, "Right", "Writer"));
    assert!(!model.relates(RelationKind::Implements, "Left", "Writer"));
    assert!(!model.relates(RelationKind::Implements, "Deep", "Writer"));

    let mut analyzer = GoDependencyAnalyzer::new(DependencyConfig::default());
    let graph = analyzer.analyze(&tree).unwrap();
    assert!(graph.has_dependency("shadow.Outer", "shadow.Writer", DependencyKind::Satisfy));
    assert!(!graph.has_dependency("shadow.Left", "shadow.Writer", DependencyKind::Satisfy));
}

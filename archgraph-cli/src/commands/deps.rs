use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use archgraph_core::config::ArchgraphConfig;
use archgraph_core::dependency::{
    Dependency, DependencyAnalyzer, DependencyGraph, GoDependencyAnalyzer, NodeKind,
};

use super::input;
use super::structure::unit_label;

#[derive(Args, Debug)]
pub struct DepsArgs {
    /// Go files, directories, or serialized syntax trees (.json)
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Output format: text, json, dot
    #[arg(long, default_value = "text", value_parser = ["text", "json", "dot"])]
    pub format: String,

    /// Show dependencies and dependents of one node id (e.g. `docs.Document`)
    #[arg(long)]
    pub node: Option<String>,
}

pub fn run(args: &DepsArgs, config: &ArchgraphConfig) -> anyhow::Result<()> {
    let trees = input::load_trees(&args.paths, config)?;
    let analyzer = build_analyzer(&trees, config)?;

    match &args.node {
        Some(id) => show_node(&analyzer, id, &args.format),
        None => show_graph(&analyzer, &args.format),
    }
}

/// Analyze every unit separately, then union the graphs so that edges
/// between units find their endpoints.
pub(super) fn build_analyzer(
    trees: &[archgraph_core::syntax::SyntaxNode],
    config: &ArchgraphConfig,
) -> anyhow::Result<GoDependencyAnalyzer> {
    let mut graphs = Vec::with_capacity(trees.len());
    for (i, tree) in trees.iter().enumerate() {
        let mut analyzer = GoDependencyAnalyzer::new(config.analysis.clone());
        analyzer
            .analyze(tree)
            .with_context(|| format!("Cannot analyze {}", unit_label(tree, i)))?;
        graphs.push(analyzer.into_graph());
    }
    let merged = DependencyGraph::merge_all(&graphs);
    Ok(GoDependencyAnalyzer::with_graph(config.analysis.clone(), merged))
}

// ── Whole graph ──────────────────────────────────────────────────────

fn show_graph(analyzer: &GoDependencyAnalyzer, format: &str) -> anyhow::Result<()> {
    let graph = analyzer.graph();
    match format {
        "json" => println!("{}", serde_json::to_string_pretty(graph)?),
        "dot" => print!("{}", graph.to_dot()),
        _ => {
            println!(
                "Dependency graph: {} nodes, {} dependencies",
                graph.node_count(),
                graph.dependency_count()
            );
            println!();
            for kind in [
                NodeKind::Module,
                NodeKind::Contract,
                NodeKind::Type,
                NodeKind::Function,
                NodeKind::Variable,
            ] {
                let nodes = graph.nodes_of_kind(kind);
                if nodes.is_empty() {
                    continue;
                }
                println!("{} ({}):", kind.as_str(), nodes.len());
                for node in nodes {
                    let marker = if node.is_external { " [external]" } else { "" };
                    println!("  {}{marker}", node.id);
                }
            }
            println!();
            println!("Dependencies:");
            for dep in graph.dependencies() {
                print_dependency(dep);
            }

            let external = analyzer.external_dependencies();
            if !external.is_empty() {
                println!();
                println!("External ({}):", external.len());
                for node in external {
                    println!("  {}", node.id);
                }
            }
            println!();
            println!(
                "Roots: {}  Leaves: {}",
                graph.root_nodes().len(),
                graph.leaf_nodes().len()
            );
        }
    }
    Ok(())
}

fn print_dependency(dep: &Dependency) {
    let location = if dep.location.file.is_empty() {
        String::new()
    } else {
        format!("  ({}:{})", dep.location.file, dep.location.line)
    };
    println!("  {} -[{}]-> {}{location}", dep.from, dep.kind, dep.to);
}

// ── Single node ──────────────────────────────────────────────────────

fn show_node(analyzer: &GoDependencyAnalyzer, id: &str, format: &str) -> anyhow::Result<()> {
    let graph = analyzer.graph();
    if !graph.has_node(id) {
        anyhow::bail!("Unknown node: {id}");
    }
    let dependencies = analyzer.dependencies(id);
    let dependents = analyzer.dependents(id);

    match format {
        "json" => {
            let out = serde_json::json!({
                "node": graph.node(id),
                "dependencies": dependencies,
                "dependents": dependents,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        "dot" => {
            let mut neighborhood = DependencyGraph::new();
            for dep in dependencies.iter().chain(&dependents) {
                for end in [&dep.from, &dep.to] {
                    if let Some(node) = graph.node(end) {
                        neighborhood.add_node(node.clone());
                    }
                }
                neighborhood.add_dependency(dep.clone());
            }
            print!("{}", neighborhood.to_dot());
        }
        _ => {
            println!("{id}");
            print_section("Depends on", &dependencies, graph);
            print_section("Depended on by", &dependents, graph);
        }
    }
    Ok(())
}

fn print_section(title: &str, deps: &[Dependency], graph: &DependencyGraph) {
    println!();
    println!("{title} ({}):", deps.len());
    for dep in deps {
        let indirect = if graph.has_dependency(&dep.from, &dep.to, dep.kind) {
            ""
        } else {
            " (indirect)"
        };
        println!("  {} -[{}]-> {}{indirect}", dep.from, dep.kind, dep.to);
    }
}

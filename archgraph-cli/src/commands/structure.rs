use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use archgraph_core::config::ArchgraphConfig;
use archgraph_core::metrics::MetricsCollector;
use archgraph_core::structure::{
    ElementKind, GoStructureAnalyzer, RelationKind, StructureAnalyzer, StructureModel,
};

use super::input;

#[derive(Args, Debug)]
pub struct StructureArgs {
    /// Go files, directories, or serialized syntax trees (.json)
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Output format: text, json
    #[arg(long, default_value = "text", value_parser = ["text", "json"])]
    pub format: String,
}

pub fn run(args: &StructureArgs, config: &ArchgraphConfig) -> anyhow::Result<()> {
    let trees = input::load_trees(&args.paths, config)?;
    let model = analyze_all(&GoStructureAnalyzer, &trees)?;
    let metrics = MetricsCollector::collect(&model);

    match args.format.as_str() {
        "json" => {
            let out = serde_json::json!({
                "model": model,
                "metrics": metrics.to_map(),
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        _ => print_text(&model, &metrics),
    }
    Ok(())
}

/// Analyze every unit and fold the models into the first.
fn analyze_all(
    analyzer: &dyn StructureAnalyzer,
    trees: &[archgraph_core::syntax::SyntaxNode],
) -> anyhow::Result<StructureModel> {
    let mut merged = StructureModel::new(analyzer.language());
    for (i, tree) in trees.iter().enumerate() {
        let unit_name = unit_label(tree, i);
        let model = analyzer
            .analyze(tree)
            .with_context(|| format!("Cannot analyze {unit_name}"))?;
        analyzer
            .merge(&mut merged, &model)
            .with_context(|| format!("Cannot merge {unit_name}"))?;
    }
    Ok(merged)
}

pub(super) fn unit_label(tree: &archgraph_core::syntax::SyntaxNode, index: usize) -> String {
    tree.attributes
        .str(archgraph_core::syntax::attr::FILE_PATH)
        .map_or_else(|| format!("unit #{}", index + 1), str::to_string)
}

fn print_text(model: &StructureModel, metrics: &MetricsCollector) {
    println!(
        "Structure ({}): {} elements, {} relationships",
        model.language(),
        model.elements().len(),
        model.relationships().len()
    );
    println!();

    println!("Elements:");
    for kind in ElementKind::ALL {
        let count = model.elements_of_kind(kind).count();
        if count > 0 {
            println!("  {:<14} {count:>6}", kind.as_str());
        }
    }
    println!();

    println!("Relationships:");
    for kind in RelationKind::ALL {
        let count = model.relationships_of_kind(kind).count();
        if count > 0 {
            println!("  {:<16} {count:>6}", kind.as_str());
        }
    }
    for rel in model.relationships() {
        if rel.kind == RelationKind::Contains {
            continue;
        }
        println!(
            "    {} {} {}",
            model.name_of(rel.source),
            rel.kind.as_str(),
            model.name_of(rel.target)
        );
    }
    println!();

    println!("Metrics:");
    for (name, value) in metrics.to_map() {
        println!("  {name:<16} {value:>6}");
    }
}

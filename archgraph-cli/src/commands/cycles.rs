use std::path::PathBuf;

use clap::Args;

use archgraph_core::config::ArchgraphConfig;
use archgraph_core::dependency::{Cycle, DependencyAnalyzer, DependencyKind};

use super::{deps, input};

#[derive(Args, Debug)]
pub struct CyclesArgs {
    /// Go files, directories, or serialized syntax trees (.json)
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Only follow edges of these kinds (repeatable)
    #[arg(long = "kind", value_parser = ["include", "reference", "satisfy", "compose", "inherit"])]
    pub kinds: Vec<String>,

    /// Output format: text, json
    #[arg(long, default_value = "text", value_parser = ["text", "json"])]
    pub format: String,
}

pub fn run(args: &CyclesArgs, config: &ArchgraphConfig) -> anyhow::Result<()> {
    let kinds = args
        .kinds
        .iter()
        .map(|k| k.parse::<DependencyKind>().map_err(anyhow::Error::msg))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let trees = input::load_trees(&args.paths, config)?;
    let mut analyzer = deps::build_analyzer(&trees, config)?;
    let cycles: Vec<Cycle> = if kinds.is_empty() {
        analyzer.find_circular_dependencies()
    } else {
        analyzer.graph().find_cycles_by_kind(&kinds)
    };

    match args.format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&cycles)?),
        _ => {
            if cycles.is_empty() {
                println!("No cycles found.");
            } else {
                println!("{} cycle(s):", cycles.len());
                for cycle in &cycles {
                    println!("  {cycle}");
                }
            }
        }
    }
    Ok(())
}

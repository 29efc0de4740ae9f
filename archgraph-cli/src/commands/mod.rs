pub mod cycles;
pub mod deps;
pub mod dump;
pub mod input;
pub mod structure;

use std::path::Path;

use anyhow::Context;
use archgraph_core::config::ArchgraphConfig;
use clap::Subcommand;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Summarize declarations, relationships and metrics
    Structure(structure::StructureArgs),
    /// Show the dependency graph or one node's dependencies
    Deps(deps::DepsArgs),
    /// List dependency cycles
    Cycles(cycles::CyclesArgs),
    /// Print the syntax tree of one file as JSON
    Dump(dump::DumpArgs),
}

pub fn run(cmd: Command, config: &ArchgraphConfig) -> anyhow::Result<()> {
    match cmd {
        Command::Structure(args) => structure::run(&args, config),
        Command::Deps(args) => deps::run(&args, config),
        Command::Cycles(args) => cycles::run(&args, config),
        Command::Dump(args) => dump::run(&args, config),
    }
}

/// Load the configuration file, or the defaults when none is given.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<ArchgraphConfig> {
    match path {
        Some(path) => ArchgraphConfig::load(path)
            .with_context(|| format!("Configuration error in {}", path.display())),
        None => Ok(ArchgraphConfig::default()),
    }
}

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use archgraph_core::config::ArchgraphConfig;
use archgraph_frontend::FrontendRegistry;

use super::input;

#[derive(Args, Debug)]
pub struct DumpArgs {
    /// Go source file
    pub file: PathBuf,
}

pub fn run(args: &DumpArgs, _config: &ArchgraphConfig) -> anyhow::Result<()> {
    let path = std::fs::canonicalize(&args.file)
        .with_context(|| format!("Cannot resolve path: {}", args.file.display()))?;
    if path.is_dir() {
        anyhow::bail!("dump takes a single file, got directory {}", path.display());
    }
    let tree = input::load_file(&path, &FrontendRegistry::new())?;
    println!("{}", serde_json::to_string_pretty(&tree)?);
    Ok(())
}

use std::path::PathBuf;

use clap::Parser;

mod commands;

#[derive(Parser, Debug)]
#[command(
    name = "archgraph",
    version,
    about = "Structural and dependency analysis for Go sources"
)]
struct Cli {
    #[command(subcommand)]
    command: commands::Command,

    /// Path to an archgraph.toml configuration file
    #[arg(long, global = true, env = "ARCHGRAPH_CONFIG")]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    quiet: bool,
}

/// Message fragments mapped to process exit codes, checked in order.
/// Anything unmatched exits with 1.
const EXIT_CODES: &[(&str, i32)] = &[
    ("cannot resolve path", 3),
    ("configuration error", 2),
    ("contract violation", 5),
    ("cannot merge", 5),
    ("parse error", 4),
    ("cannot parse", 4),
];

fn classify_exit_code(err: &anyhow::Error) -> i32 {
    let chain = format!("{err:#}").to_lowercase();
    EXIT_CODES
        .iter()
        .find(|(needle, _)| chain.contains(needle))
        .map_or(1, |&(_, code)| code)
}

fn fail(err: &anyhow::Error) -> ! {
    eprintln!("Error: {err:#}");
    std::process::exit(classify_exit_code(err));
}

fn main() {
    let cli = Cli::parse();
    let config = commands::load_config(cli.config.as_deref()).unwrap_or_else(|e| fail(&e));

    // -q and -v win over RUST_LOG, which wins over the configured level.
    let level = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (false, 0) => config.logging.level.as_str(),
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };
    let filter = if cli.quiet || cli.verbose > 0 {
        tracing_subscriber::EnvFilter::new(level)
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level))
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();

    if let Err(e) = commands::run(cli.command, &config) {
        fail(&e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_code_input_not_found() {
        let err = anyhow::anyhow!("Cannot resolve path: /nonexistent/main.go");
        assert_eq!(classify_exit_code(&err), 3);
    }

    #[test]
    fn exit_code_config() {
        let err = anyhow::anyhow!("Configuration error in archgraph.toml: Parse error: bad toml");
        assert_eq!(classify_exit_code(&err), 2);
    }

    #[test]
    fn exit_code_parse() {
        let err = anyhow::anyhow!("Parse error in main.go: syntax error at line 3");
        assert_eq!(classify_exit_code(&err), 4);
        let err = anyhow::anyhow!("Cannot parse syntax tree tree.json: expected value");
        assert_eq!(classify_exit_code(&err), 4);
    }

    #[test]
    fn exit_code_contract_violation() {
        let err = anyhow::anyhow!(
            "Cannot analyze tree.json: Analysis error: Contract violation on type node: missing module root"
        );
        assert_eq!(classify_exit_code(&err), 5);
    }

    #[test]
    fn exit_code_general() {
        let err = anyhow::anyhow!("Unknown node: docs.Missing");
        assert_eq!(classify_exit_code(&err), 1);
    }

    #[test]
    fn cli_parses_global_flags() {
        let cli = Cli::try_parse_from(["archgraph", "-vv", "cycles", "src", "--kind", "include"])
            .unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(!cli.quiet);
        assert!(matches!(cli.command, commands::Command::Cycles(_)));
    }
}

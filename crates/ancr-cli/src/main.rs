//! # ancr CLI entry point
//!
//! Parses command-line arguments, installs the tracing subscriber, loads
//! configuration and dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ancr_cli::demo::{run_demo, DemoArgs};
use ancr_cli::encode::{run_encode, EncodeArgs};
use ancr_cli::identifier::{run_identifier, IdentifierArgs};
use ancr_cli::query::{run_query, QueryArgs};
use ancr_core::OrchestrationConfig;

/// AnonCreds orchestrator toolchain.
///
/// Converts identifiers between qualified and legacy forms, compiles proof
/// request restrictions into credential queries, encodes attribute values,
/// and runs an end-to-end issue/prove/verify demo.
#[derive(Parser, Debug)]
#[command(name = "ancr", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    /// YAML configuration file. Environment variables are used when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert and parse identifiers.
    Identifier(IdentifierArgs),

    /// Compile proof request restrictions into credential queries.
    Query(QueryArgs),

    /// Encode an attribute value.
    Encode(EncodeArgs),

    /// Issue, prove and verify against in-memory collaborators.
    Demo(DemoArgs),
}

fn init_tracing(verbose: u8, json: bool) {
    let filter = match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<OrchestrationConfig> {
    let config = match path {
        Some(path) => OrchestrationConfig::from_yaml_file(path)?,
        None => OrchestrationConfig::from_env()?,
    };
    config.validate()?;
    Ok(config)
}

fn run(cli: &Cli) -> Result<u8> {
    match &cli.command {
        Commands::Identifier(args) => run_identifier(args),
        Commands::Query(args) => run_query(args),
        Commands::Encode(args) => run_encode(args),
        Commands::Demo(args) => run_demo(args, &load_config(cli.config.as_ref())?),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);
    tracing::debug!("ancr CLI starting");

    match run(&cli) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_identifier_legacy() {
        let cli = Cli::try_parse_from(["ancr", "identifier", "legacy", "LjgpST2rjsoxYegQDRm7EL"]).unwrap();
        assert!(matches!(cli.command, Commands::Identifier(_)));
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["ancr", "encode", "John", "-vv", "--log-json"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(cli.log_json);
    }

    #[test]
    fn parse_query_compile() {
        let cli =
            Cli::try_parse_from(["ancr", "query", "compile", "--request", "r.json", "--referent", "name"]).unwrap();
        assert!(matches!(cli.command, Commands::Query(_)));
    }

    #[test]
    fn qualify_requires_namespace() {
        assert!(Cli::try_parse_from(["ancr", "identifier", "qualify", "LjgpST2rjsoxYegQDRm7EL"]).is_err());
    }
}

//! # Query Subcommand
//!
//! Compiles one referent of a proof request (JSON file) into the credential
//! store query a holder would run.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use ancr_core::ProofRequest;
use ancr_query::compile_referent_query;

/// Arguments for `ancr query`.
#[derive(Args, Debug)]
pub struct QueryArgs {
    #[command(subcommand)]
    pub command: QueryCommand,
}

/// Query operations.
#[derive(Subcommand, Debug)]
pub enum QueryCommand {
    /// Compile a referent's markers and restrictions.
    Compile {
        /// Proof request JSON file.
        #[arg(long)]
        request: PathBuf,
        /// Referent to compile.
        #[arg(long)]
        referent: String,
        /// Print the query tree as JSON instead of the infix form.
        #[arg(long)]
        json: bool,
    },
}

/// Execute the query subcommand.
pub fn run_query(args: &QueryArgs) -> Result<u8> {
    match &args.command {
        QueryCommand::Compile { request, referent, json } => {
            let text = std::fs::read_to_string(request)
                .with_context(|| format!("reading proof request {}", request.display()))?;
            let request: ProofRequest =
                serde_json::from_str(&text).with_context(|| format!("parsing proof request {}", request.display()))?;
            let query = compile_referent_query(&request, referent)?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&query)?);
            } else {
                println!("{query}");
            }
            Ok(0)
        }
    }
}

//! # Encode Subcommand

use anyhow::Result;
use clap::Args;

use ancr_core::{encode_credential_value, is_valid_encoding};

/// Arguments for `ancr encode`.
#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Raw attribute value.
    pub value: String,

    /// Check this encoded value against the raw value instead of printing
    /// the encoding.
    #[arg(long)]
    pub check: Option<String>,
}

/// Execute the encode subcommand.
pub fn run_encode(args: &EncodeArgs) -> Result<u8> {
    match &args.check {
        Some(encoded) if is_valid_encoding(&args.value, encoded) => {
            println!("OK");
            Ok(0)
        }
        Some(_) => {
            println!("MISMATCH: expected {}", encode_credential_value(&args.value));
            Ok(1)
        }
        None => {
            println!("{}", encode_credential_value(&args.value));
            Ok(0)
        }
    }
}

//! # ancr-cli — AnonCreds Orchestrator Command-Line Interface
//!
//! ## Subcommands
//!
//! - `identifier` — legacy/qualified conversion and parsing
//! - `query` — compile a proof request referent into a credential query
//! - `encode` — AnonCreds attribute value encoding
//! - `demo` — issue, prove and verify against in-memory collaborators
//!
//! ## Crate Policy
//!
//! - Argument parsing is separated from business logic.
//! - Handlers delegate to the domain crates.
//! - Handlers return the process exit code.

pub mod demo;
pub mod encode;
pub mod identifier;
pub mod query;

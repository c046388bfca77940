//! # ancr-holder — Proof Assembler and Holder Wallet
//!
//! Holds link secrets and credentials, finds credentials that answer a proof
//! request, and assembles presentations through the proof engine.
//!
//! ## Architecture
//!
//! - **Assembler** (`assembler.rs`): the linear assembly pass with
//!   single-link-secret enforcement and revocation state preparation.
//! - **Search** (`search.rs`): candidates per referent from compiled
//!   restriction queries, and automatic selection.
//! - **Link secrets** (`link_secret.rs`): secrets by id with a default.
//! - **Service** (`service.rs`): credential requests, reception and storage,
//!   plus the above wired to the registry layer.
//!
//! ## Key Design Principles
//!
//! 1. **One link secret per presentation.** Checked on the loaded
//!    credentials before the proof engine is called.
//! 2. **No partial presentations.** Any failure aborts assembly.
//! 3. **`to` decides the snapshot.** Revocation state is built at the end of
//!    the referent's interval; the selection records the snapshot used.

pub mod assembler;
pub mod error;
pub mod link_secret;
pub mod search;
pub mod service;

#[cfg(test)]
mod testing;

pub use assembler::{AssembledPresentation, ProofAssembler};
pub use error::HolderError;
pub use link_secret::LinkSecretStore;
pub use search::{CredentialCandidate, RequestedCredentials};
pub use service::HolderService;

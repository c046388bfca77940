//! # ancr-verifier — Proof Verifier
//!
//! Accepts or rejects presentations. Everything a presentation names is
//! resolved through `ancr-registry`; revocation status lists are rebuilt at
//! the timestamps the presentation claims; the proof engine decides.
//!
//! ## Architecture
//!
//! - **Verifier** (`verifier.rs`): `ProofVerifier`, revocation evidence
//!   and interval overrides, engine delegation.
//! - **Checks** (`checks.rs`): revealed-encoding and restriction checks run
//!   before the engine.
//! - **Service** (`service.rs`): resolution of schemas, credential
//!   definitions and revocation registries from presentation identifiers;
//!   nonce generation.
//!
//! ## Crate Policy
//!
//! - A rejected presentation is `Ok(false)`, never `Err`.
//! - `Err` means verification could not be attempted: an object failed to
//!   resolve, or the engine could not run.

pub mod checks;
pub mod error;
pub mod service;
pub mod verifier;

#[cfg(test)]
mod testing;

pub use error::VerifierError;
pub use service::{generate_nonce, VerificationService};
pub use verifier::{ProofVerifier, RevocationEvidence};

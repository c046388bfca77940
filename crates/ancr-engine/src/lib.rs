//! # ancr-engine — Proof Engine Abstraction
//!
//! The boundary between the orchestrator and AnonCreds cryptography.
//!
//! ## Architecture
//!
//! - **Traits** (`traits.rs`): `ProofEngine` covers credential definitions,
//!   revocation registries and status lists, offers, requests, issuance,
//!   revocation state, presentation and verification. It is object-safe;
//!   services hold an `Arc<dyn ProofEngine>`.
//!
//! - **Mock** (`mock.rs`): `MockProofEngine` produces transparent, checkable
//!   "proofs" over Ed25519 signatures and SHA-256 accumulators. It is not
//!   private and exists so every orchestration path can be exercised without
//!   a CL implementation.
//!
//! ## Crate Policy
//!
//! - Depends on `ancr-core` and `ancr-crypto` internally.
//! - The engine never resolves objects itself: callers pass in every schema,
//!   definition and status list a call needs.
//! - No `unsafe` code.

#[cfg(feature = "mock")]
pub mod mock;
pub mod traits;

#[cfg(feature = "mock")]
pub use mock::MockProofEngine;
pub use traits::{
    CreatedCredentialDefinition, CreatedRevocationRegistryDefinition, CredentialIssuance,
    CredentialProve, CredentialRevocationConfig, EngineError, PresentationCredential,
    PresentationInput, ProofEngine, VerificationInput,
};

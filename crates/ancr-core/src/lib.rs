//! # ancr-core — Foundational Types for the AnonCreds Orchestrator
//!
//! This crate is the leaf of the workspace DAG. It defines the AnonCreds
//! data model exchanged with registries and the proof engine, the
//! identifier grammar for both identifier encodings, and the small set of
//! primitives every other crate builds on.
//!
//! ## Key Design Principles
//!
//! 1. **Wire-compatible models.** `Schema`, `CredentialDefinition`,
//!    `RevocationRegistryDefinition`, `RevocationStatusList`, `ProofRequest`
//!    and `Presentation` serialize with the exact AnonCreds field names.
//!    Timestamps are Unix epoch seconds everywhere.
//!
//! 2. **Two identifier encodings, one object.** Every qualified
//!    `did:indy` identifier has exactly one legacy equivalent, computed by
//!    [`identifier::to_legacy`]. The conversion is one-way lossy, so stored
//!    records carry both forms as tags written once.
//!
//! 3. **`CanonicalBytes` for every digest.** Accumulators, signatures and
//!    commitments are computed over JCS bytes produced by
//!    `CanonicalBytes::new()`, never over ad-hoc `serde_json::to_vec()` output.
//!
//! 4. **Absence means not revocable.** A credential's revocation index is an
//!    `Option<u32>`; `None` is the single sentinel for non-revocable
//!    credentials.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `ancr-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod config;
pub mod digest;
pub mod encoding;
pub mod error;
pub mod identifier;
pub mod model;
pub mod temporal;

// Re-export primary types for ergonomic imports.
pub use canonical::CanonicalBytes;
pub use config::{ConfigError, OrchestrationConfig};
pub use digest::{sha256_digest, sha256_hex, ContentDigest};
pub use encoding::{encode_credential_value, is_valid_encoding};
pub use error::{AncrError, CanonicalizationError, IdentifierError};
pub use identifier::ObjectKind;
pub use model::{
    find_attribute, normalize_attribute_name, AttributeValue, Credential, CredentialDefinition, CredentialDefinitionPrivate, CredentialOffer,
    CredentialRequest, CredentialRequestMetadata, KeyCorrectnessProof, LinkSecret,
    NonRevokedInterval, NonRevokedIntervalOverride, PredicateType, Presentation,
    PresentationIdentifier, ProofRequest, RequestedAttribute, RequestedPredicate, RequestedProof,
    Restriction, RevealedAttribute, RevealedAttributeGroup, RevocationRegistryDefinition,
    RevocationRegistryDefinitionPrivate, RevocationRegistryDefinitionValue, RevocationState,
    RevocationStatusList, Schema, SelectedAttribute, SelectedCredentials, SelectedPredicate,
    SubProofReferent,
};
pub use temporal::Timestamp;

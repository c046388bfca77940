//! # Error Types — Structured Error Hierarchy
//!
//! Errors shared by every crate in the workspace. All errors use
//! `thiserror` for derive-based `Display` and `Error` implementations.
//!
//! ## Design
//!
//! - Identifier errors carry the offending identifier and the object kind
//!   it was parsed as.
//! - Canonicalization errors name the rejected value.

use thiserror::Error;

use crate::identifier::ObjectKind;

/// Top-level error type for the foundational layer.
#[derive(Error, Debug)]
pub enum AncrError {
    /// Canonicalization failed.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    /// An identifier did not match the expected grammar.
    #[error("identifier error: {0}")]
    Identifier(#[from] IdentifierError),

    /// Configuration could not be loaded or was invalid.
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// Float values are not permitted in canonical representations.
    #[error("float values are not permitted in canonical representations: {0}")]
    FloatRejected(f64),

    /// JSON serialization failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

/// Error parsing or converting an identifier.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentifierError {
    /// The identifier does not match the delimiter grammar for its kind.
    #[error("malformed {kind} identifier \"{identifier}\": {reason}")]
    MalformedIdentifier {
        /// Object kind the identifier was parsed as.
        kind: ObjectKind,
        /// The rejected identifier.
        identifier: String,
        /// What part of the grammar failed.
        reason: String,
    },

    /// The DID is neither a legacy namespace identifier nor a `did:indy` DID.
    #[error("malformed DID \"{0}\" (expected did:indy:<namespace>:<id> or a 21-22 character base58 identifier)")]
    MalformedDid(String),

    /// Building a qualified identifier requires a namespace.
    #[error("cannot qualify \"{0}\" without a did:indy namespace")]
    MissingNamespace(String),

    /// The qualified identifier uses a DID method with no legacy form.
    #[error("identifier \"{0}\" uses a DID method with no legacy equivalent")]
    NoLegacyForm(String),
}

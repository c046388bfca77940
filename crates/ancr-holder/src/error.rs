//! Holder error types.

use thiserror::Error;

use ancr_core::Timestamp;
use ancr_engine::EngineError;
use ancr_query::{QueryError, StoreError};
use ancr_registry::ResolutionFailure;
use ancr_revocation::RevocationError;

/// Errors from holder operations.
///
/// Every variant aborts the current operation. None is worth retrying
/// without changing the input.
#[derive(Error, Debug)]
pub enum HolderError {
    /// A selected credential is not in the credential store.
    #[error("credential {credential_id} selected for {referent} not found")]
    CredentialNotFound {
        /// Wallet id of the credential.
        credential_id: String,
        /// Referent it was selected for.
        referent: String,
    },

    /// The selected credentials are bound to more than one link secret.
    #[error(
        "credential {credential_id} is bound to link secret {found}, other selected credentials to {expected}"
    )]
    InconsistentLinkSecret {
        /// Link secret of the first selected credential.
        expected: String,
        /// Link secret of the offending credential.
        found: String,
        /// The offending credential.
        credential_id: String,
    },

    /// No link secret with this id.
    #[error("link secret {0} not found")]
    LinkSecretNotFound(String),

    /// A link secret with this id already exists.
    #[error("link secret {0} already exists")]
    LinkSecretExists(String),

    /// No link secret id given and no default link secret exists.
    #[error("no default link secret")]
    NoDefaultLinkSecret,

    /// A credential references a revocation registry that cannot be resolved.
    #[error("revocation registry {rev_reg_def_id} of credential {credential_id} not found: {message}")]
    RevocationRegistryNotFound {
        /// Registry identifier.
        rev_reg_def_id: String,
        /// Credential referencing it.
        credential_id: String,
        /// Resolution detail.
        message: String,
    },

    /// No status list snapshot exists for the requested time.
    #[error("no status list of {rev_reg_def_id} at or before {timestamp}: {message}")]
    StatusListNotFound {
        /// Registry identifier.
        rev_reg_def_id: String,
        /// Requested time.
        timestamp: Timestamp,
        /// Resolution detail.
        message: String,
    },

    /// A referent's `non_revoked` interval fails the best-practice check.
    #[error("invalid revocation interval for {referent} (from {from:?}, to {to:?}): {reason}")]
    InvalidRevocationInterval {
        /// Referent the interval applies to.
        referent: String,
        /// Requested start.
        from: Option<Timestamp>,
        /// Requested end.
        to: Option<Timestamp>,
        /// Which rule was violated.
        reason: String,
    },

    /// No stored credential satisfies a referent.
    #[error("no credential satisfies {referent}")]
    NoCandidates {
        /// The unsatisfied referent.
        referent: String,
    },

    /// Query compilation failed.
    #[error(transparent)]
    Query(#[from] QueryError),

    /// An object could not be resolved.
    #[error(transparent)]
    Resolution(#[from] ResolutionFailure),

    /// Other revocation failures.
    #[error(transparent)]
    Revocation(RevocationError),

    /// Credential store failure.
    #[error("credential store: {0}")]
    Store(#[from] StoreError),

    /// The proof engine failed.
    #[error("proof engine error: {0}")]
    Engine(#[from] EngineError),
}

impl HolderError {
    /// Attach credential and referent context to a reconstruction failure.
    pub(crate) fn from_revocation(err: RevocationError, credential_id: &str, referent: &str) -> Self {
        match err {
            RevocationError::RevocationRegistryNotFound { rev_reg_def_id, message } => {
                Self::RevocationRegistryNotFound { rev_reg_def_id, credential_id: credential_id.to_string(), message }
            }
            RevocationError::StatusListNotFound { rev_reg_def_id, timestamp, message } => {
                Self::StatusListNotFound { rev_reg_def_id, timestamp, message }
            }
            RevocationError::InvalidRevocationInterval { from, to, reason } => {
                Self::InvalidRevocationInterval { referent: referent.to_string(), from, to, reason }
            }
            other => Self::Revocation(other),
        }
    }
}

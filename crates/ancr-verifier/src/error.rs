//! Verifier error types.
//!
//! An `Err` means verification could not be attempted. A presentation that
//! fails a check is `Ok(false)`.

use thiserror::Error;

use ancr_core::ObjectKind;
use ancr_engine::EngineError;
use ancr_registry::ResolutionFailure;
use ancr_revocation::RevocationError;

/// Errors that prevent verification.
#[derive(Error, Debug)]
pub enum VerifierError {
    /// A referenced object could not be resolved.
    #[error(transparent)]
    Resolution(#[from] ResolutionFailure),

    /// A referenced object was not supplied by the caller.
    #[error("{kind} {identifier} was not supplied")]
    MissingObject {
        /// What is missing.
        kind: ObjectKind,
        /// Identifier as the presentation names it.
        identifier: String,
    },

    /// Revocation data could not be resolved.
    #[error(transparent)]
    Revocation(#[from] RevocationError),

    /// The proof engine could not run the verification.
    #[error("proof engine error: {0}")]
    Engine(#[from] EngineError),
}

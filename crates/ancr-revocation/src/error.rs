//! Errors raised while reconstructing revocation state.

use thiserror::Error;

use ancr_core::Timestamp;
use ancr_engine::EngineError;

use crate::tails::TailsError;

/// Revocation reconstruction failures. All are consistency violations:
/// retrying without different input cannot succeed.
#[derive(Error, Debug)]
pub enum RevocationError {
    /// The non-revocation interval fails the best-practice check.
    #[error("invalid revocation interval (from {from:?}, to {to:?}): {reason}")]
    InvalidRevocationInterval {
        /// Requested start.
        from: Option<Timestamp>,
        /// Requested end.
        to: Option<Timestamp>,
        /// Which rule was violated.
        reason: String,
    },

    /// The revocation registry definition could not be resolved.
    #[error("revocation registry {rev_reg_def_id} not found: {message}")]
    RevocationRegistryNotFound {
        /// Registry identifier.
        rev_reg_def_id: String,
        /// Resolution detail.
        message: String,
    },

    /// No status list snapshot exists at or before the requested time.
    #[error("no status list of {rev_reg_def_id} at or before {timestamp}: {message}")]
    StatusListNotFound {
        /// Registry identifier.
        rev_reg_def_id: String,
        /// Requested point in time.
        timestamp: Timestamp,
        /// Resolution detail.
        message: String,
    },

    /// The revocation index lies outside the registry.
    #[error("index {index} is outside revocation registry {rev_reg_def_id} of size {max_cred_num}")]
    IndexOutOfRange {
        /// Registry identifier.
        rev_reg_def_id: String,
        /// Requested slot.
        index: u32,
        /// Registry size.
        max_cred_num: u32,
    },

    /// Tails data could not be retrieved or verified.
    #[error(transparent)]
    Tails(#[from] TailsError),

    /// The proof engine failed to build the witness.
    #[error("proof engine error: {0}")]
    Engine(#[from] EngineError),
}

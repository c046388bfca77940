//! Issuer error types.

use thiserror::Error;

use ancr_engine::EngineError;
use ancr_registry::{RegistryError, ResolutionFailure};
use ancr_revocation::TailsError;

/// Errors from issuer orchestration.
#[derive(Error, Debug)]
pub enum IssuerError {
    /// An object the operation builds on could not be resolved.
    #[error(transparent)]
    Resolution(#[from] ResolutionFailure),

    /// Registration was refused.
    #[error("registration failed: {0}")]
    Registry(#[from] RegistryError),

    /// The proof engine failed.
    #[error("proof engine error: {0}")]
    Engine(#[from] EngineError),

    /// Tails publication failed.
    #[error("tails publication failed: {0}")]
    Tails(#[from] TailsError),

    /// The credential definition was not created by this issuer, so its
    /// private material is not available.
    #[error("no private material for credential definition {cred_def_id}")]
    CredentialDefinitionSecretsNotFound {
        /// Credential definition identifier.
        cred_def_id: String,
    },

    /// The revocation registry was not created by this issuer.
    #[error("revocation registry {rev_reg_def_id} is not held by this issuer")]
    RevocationRegistryNotFound {
        /// Revocation registry identifier.
        rev_reg_def_id: String,
    },

    /// The revocation registry has no published status list yet.
    #[error("revocation registry {rev_reg_def_id} has no status list")]
    StatusListNotFound {
        /// Revocation registry identifier.
        rev_reg_def_id: String,
    },

    /// Every slot of the revocation registry has been assigned.
    #[error("revocation registry {rev_reg_def_id} is full ({max_cred_num} credentials)")]
    RegistryFull {
        /// Revocation registry identifier.
        rev_reg_def_id: String,
        /// Registry capacity.
        max_cred_num: u32,
    },

    /// A revocation registry was asked for a definition without revocation keys.
    #[error("credential definition {cred_def_id} does not support revocation")]
    RevocationNotSupported {
        /// Credential definition identifier.
        cred_def_id: String,
    },

    /// The credential registry and the credential definition do not belong together.
    #[error("revocation registry {rev_reg_def_id} does not belong to credential definition {cred_def_id}")]
    RegistryMismatch {
        /// Revocation registry identifier.
        rev_reg_def_id: String,
        /// Credential definition of the offer.
        cred_def_id: String,
    },
}

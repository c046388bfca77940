//! # Proof Engine Trait
//!
//! The contract between the orchestrator and the external AnonCreds
//! cryptography. Everything the orchestrator assembles crosses this
//! boundary in AnonCreds wire shapes, with timestamps in epoch seconds.
//!
//! ## Invariants
//!
//! - `Send + Sync`, object-safe: engines are selected at runtime and shared
//!   as `Arc<dyn ProofEngine>`.
//! - No method touches a registry, a wallet, or the network. Tails files
//!   are read from a local path the caller already resolved.
//! - `verify_presentation` returns `Ok(false)` for a cryptographic
//!   rejection. `Err` means verification could not be attempted.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

use ancr_core::{
    CanonicalizationError, Credential, CredentialDefinition, CredentialDefinitionPrivate,
    CredentialOffer, CredentialRequest, CredentialRequestMetadata, KeyCorrectnessProof,
    LinkSecret, NonRevokedIntervalOverride, PredicateType, Presentation, ProofRequest,
    RevocationRegistryDefinition, RevocationRegistryDefinitionPrivate, RevocationState,
    RevocationStatusList, Schema, Timestamp,
};
use ancr_crypto::CryptoError;

/// Errors raised by a proof engine.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The call was structurally invalid.
    #[error("invalid engine input: {0}")]
    InvalidInput(String),

    /// An object the call refers to was not supplied.
    #[error("{kind} {id} was not supplied to the proof engine")]
    MissingObject {
        /// Object kind, e.g. "credential definition".
        kind: &'static str,
        /// Identifier that was looked up.
        id: String,
    },

    /// A credential was not issued to the supplied link secret.
    #[error("credential of {cred_def_id} is bound to a different link secret")]
    LinkSecretMismatch {
        /// Credential definition of the offending credential.
        cred_def_id: String,
    },

    /// The holder's attribute value does not satisfy a requested predicate.
    #[error("predicate {referent} ({attr_name} {p_type} {p_value}) is not satisfied")]
    PredicateUnsatisfied {
        /// Predicate referent.
        referent: String,
        /// Attribute the predicate is over.
        attr_name: String,
        /// Comparison.
        p_type: PredicateType,
        /// Threshold.
        p_value: i32,
    },

    /// The tails file does not match the registry definition.
    #[error("tails file {path} does not match definition: {reason}")]
    Tails {
        /// Local path of the tails file.
        path: String,
        /// What did not match.
        reason: String,
    },

    /// Cryptographic primitive failure.
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// Canonicalization failure.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    /// Engine payload (de)serialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO failure reading or writing tails data.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A credential definition with its issuer-only material.
#[derive(Debug, Clone)]
pub struct CreatedCredentialDefinition {
    /// Public definition, suitable for a registry.
    pub definition: CredentialDefinition,
    /// Private signing material.
    pub private: CredentialDefinitionPrivate,
    /// Proof of key correctness, included in offers.
    pub key_correctness_proof: KeyCorrectnessProof,
}

/// A revocation registry definition with its issuer-only material.
#[derive(Debug, Clone)]
pub struct CreatedRevocationRegistryDefinition {
    /// Public definition. `tails_location` is the local path until uploaded.
    pub definition: RevocationRegistryDefinition,
    /// Private accumulator material.
    pub private: RevocationRegistryDefinitionPrivate,
    /// Where the generated tails file was written.
    pub tails_path: PathBuf,
}

/// Revocation parameters for issuing a revocable credential.
#[derive(Debug, Clone, Copy)]
pub struct CredentialRevocationConfig<'a> {
    /// Identifier of the registry.
    pub rev_reg_def_id: &'a str,
    /// Registry definition.
    pub definition: &'a RevocationRegistryDefinition,
    /// Registry private material.
    pub private: &'a RevocationRegistryDefinitionPrivate,
    /// Current status list of the registry.
    pub status_list: &'a RevocationStatusList,
    /// Slot assigned to the credential.
    pub index: u32,
}

/// Everything needed to issue one credential.
#[derive(Debug, Clone, Copy)]
pub struct CredentialIssuance<'a> {
    /// Credential definition signing the credential.
    pub definition: &'a CredentialDefinition,
    /// Its private material.
    pub private: &'a CredentialDefinitionPrivate,
    /// The offer the holder answered.
    pub offer: &'a CredentialOffer,
    /// The holder's request.
    pub request: &'a CredentialRequest,
    /// Raw attribute values keyed by attribute name.
    pub values: &'a BTreeMap<String, String>,
    /// Revocation parameters, for revocable credentials.
    pub revocation: Option<CredentialRevocationConfig<'a>>,
}

/// One credential entry of a presentation.
#[derive(Debug, Clone, Copy)]
pub struct PresentationCredential<'a> {
    /// The credential.
    pub credential: &'a Credential,
    /// Status list snapshot the revocation state was built against.
    pub timestamp: Option<Timestamp>,
    /// Non-revocation witness, when proving non-revocation.
    pub revocation_state: Option<&'a RevocationState>,
}

/// Maps one referent onto a credential entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialProve {
    /// Index into `PresentationInput::credentials`.
    pub entry_index: usize,
    /// Referent in the proof request.
    pub referent: String,
    /// Whether the referent is a requested predicate.
    pub is_predicate: bool,
    /// Whether the attribute value is revealed. Always `true` for predicates.
    pub reveal: bool,
}

/// Input of [`ProofEngine::create_presentation`].
#[derive(Debug, Clone, Copy)]
pub struct PresentationInput<'a> {
    /// The request being answered.
    pub request: &'a ProofRequest,
    /// Credential entries in entry-index order.
    pub credentials: &'a [PresentationCredential<'a>],
    /// Referent-to-entry mapping.
    pub credentials_prove: &'a [CredentialProve],
    /// Self-attested values keyed by referent.
    pub self_attested: &'a BTreeMap<String, String>,
    /// The single link secret all credentials were issued to.
    pub link_secret: &'a LinkSecret,
    /// Schemas keyed by the id the credentials reference.
    pub schemas: &'a BTreeMap<String, Schema>,
    /// Credential definitions keyed by the id the credentials reference.
    pub credential_definitions: &'a BTreeMap<String, CredentialDefinition>,
}

/// Input of [`ProofEngine::verify_presentation`].
#[derive(Debug, Clone, Copy)]
pub struct VerificationInput<'a> {
    /// The presentation under test.
    pub presentation: &'a Presentation,
    /// The request it claims to answer.
    pub request: &'a ProofRequest,
    /// Schemas keyed by identifier.
    pub schemas: &'a BTreeMap<String, Schema>,
    /// Credential definitions keyed by identifier.
    pub credential_definitions: &'a BTreeMap<String, CredentialDefinition>,
    /// Revocation registry definitions keyed by identifier.
    pub revocation_registry_definitions: &'a BTreeMap<String, RevocationRegistryDefinition>,
    /// Status lists at every timestamp the presentation claims.
    pub revocation_status_lists: &'a [RevocationStatusList],
    /// Interval boundaries satisfied by earlier snapshots.
    pub non_revoked_interval_overrides: &'a [NonRevokedIntervalOverride],
}

/// Abstract interface for an AnonCreds proof engine.
pub trait ProofEngine: Send + Sync {
    /// Engine name for logs.
    fn engine_name(&self) -> &str;

    /// Generate a fresh link secret.
    fn create_link_secret(&self) -> Result<LinkSecret, EngineError>;

    /// Create a credential definition for `schema`.
    fn create_credential_definition(
        &self,
        schema_id: &str,
        schema: &Schema,
        issuer_id: &str,
        tag: &str,
        support_revocation: bool,
    ) -> Result<CreatedCredentialDefinition, EngineError>;

    /// Create a revocation registry and write its tails file into `tails_directory`.
    fn create_revocation_registry_definition(
        &self,
        credential_definition: &CredentialDefinition,
        cred_def_id: &str,
        tag: &str,
        max_cred_num: u32,
        tails_directory: &Path,
    ) -> Result<CreatedRevocationRegistryDefinition, EngineError>;

    /// Create the first status list of a registry. With
    /// `issuance_by_default`, every slot starts not revoked.
    fn create_revocation_status_list(
        &self,
        rev_reg_def_id: &str,
        definition: &RevocationRegistryDefinition,
        timestamp: Option<Timestamp>,
        issuance_by_default: bool,
    ) -> Result<RevocationStatusList, EngineError>;

    /// Produce the next snapshot of a registry from `previous`.
    fn update_revocation_status_list(
        &self,
        definition: &RevocationRegistryDefinition,
        previous: &RevocationStatusList,
        issued: &[u32],
        revoked: &[u32],
        timestamp: Option<Timestamp>,
    ) -> Result<RevocationStatusList, EngineError>;

    /// Create an offer for a credential definition.
    fn create_credential_offer(
        &self,
        schema_id: &str,
        cred_def_id: &str,
        key_correctness_proof: &KeyCorrectnessProof,
    ) -> Result<CredentialOffer, EngineError>;

    /// Answer an offer, binding `link_secret`.
    fn create_credential_request(
        &self,
        offer: &CredentialOffer,
        definition: &CredentialDefinition,
        link_secret: &LinkSecret,
        link_secret_id: &str,
    ) -> Result<(CredentialRequest, CredentialRequestMetadata), EngineError>;

    /// Issue a credential.
    fn create_credential(&self, issuance: CredentialIssuance<'_>) -> Result<Credential, EngineError>;

    /// Check a received credential against its definition and the holder's link secret.
    fn process_credential(
        &self,
        credential: Credential,
        metadata: &CredentialRequestMetadata,
        link_secret: &LinkSecret,
        definition: &CredentialDefinition,
        revocation_registry: Option<&RevocationRegistryDefinition>,
    ) -> Result<Credential, EngineError>;

    /// Slot of a credential in its revocation registry. `None` when not revocable.
    fn credential_revocation_index(&self, credential: &Credential) -> Result<Option<u32>, EngineError>;

    /// Link secret commitment a credential was issued to.
    fn credential_link_secret_commitment(&self, credential: &Credential) -> Result<String, EngineError>;

    /// Build the non-revocation witness of slot `index` at `status_list`.
    fn create_revocation_state(
        &self,
        definition: &RevocationRegistryDefinition,
        status_list: &RevocationStatusList,
        index: u32,
        tails_path: &Path,
    ) -> Result<RevocationState, EngineError>;

    /// Produce a presentation.
    fn create_presentation(&self, input: PresentationInput<'_>) -> Result<Presentation, EngineError>;

    /// Verify a presentation.
    fn verify_presentation(&self, input: VerificationInput<'_>) -> Result<bool, EngineError>;
}

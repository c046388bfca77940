//! # Registry Contract
//!
//! A registry resolves and publishes AnonCreds objects for the identifiers
//! it recognizes. Several registries are configured side by side; the
//! resolution layer picks one per identifier by asking each, in
//! registration order, whether it supports the identifier.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use ancr_core::identifier::{identifier_form, IdentifierForm};
use ancr_core::{
    CredentialDefinition, IdentifierError, RevocationRegistryDefinition, RevocationStatusList,
    Schema, Timestamp,
};

/// The four resolvable object kinds. Status lists share their registry's
/// identifier and are additionally keyed by timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResourceKind {
    /// A schema.
    Schema,
    /// A credential definition.
    CredentialDefinition,
    /// A revocation registry definition.
    RevocationRegistryDefinition,
    /// A revocation status list snapshot.
    RevocationStatusList,
}

impl ResourceKind {
    /// Snake-case label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Schema => "schema",
            Self::CredentialDefinition => "credential_definition",
            Self::RevocationRegistryDefinition => "revocation_registry_definition",
            Self::RevocationStatusList => "revocation_status_list",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors a registry reports.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The object does not exist (at the requested time, for status lists).
    #[error("{kind} {identifier} not found")]
    NotFound {
        /// What was looked up.
        kind: ResourceKind,
        /// The identifier as given.
        identifier: String,
    },

    /// The identifier or the object is malformed.
    #[error("invalid {kind} {identifier}: {reason}")]
    Invalid {
        /// What was looked up or registered.
        kind: ResourceKind,
        /// The identifier as given.
        identifier: String,
        /// What was wrong.
        reason: String,
    },

    /// The registry cannot handle this identifier's method.
    #[error("registry {registry} does not support {identifier}")]
    UnsupportedMethod {
        /// Registry that was asked.
        registry: String,
        /// The identifier as given.
        identifier: String,
    },

    /// No configured registry matches the identifier.
    #[error("no registry configured for identifier {0}")]
    NoRegistryForIdentifier(String),

    /// The registry backend failed.
    #[error("registry backend error: {0}")]
    Backend(String),
}

impl RegistryError {
    /// Build an [`RegistryError::Invalid`] from an identifier error.
    pub fn from_identifier(kind: ResourceKind, identifier: &str, err: IdentifierError) -> Self {
        Self::Invalid { kind, identifier: identifier.to_string(), reason: err.to_string() }
    }
}

/// Which identifiers a registry claims.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentifierPattern {
    /// Legacy ledger-native identifiers and `did:indy` identifiers.
    Indy,
    /// Identifiers of one DID method, e.g. `DidMethod("cheqd")` for `did:cheqd:...`.
    DidMethod(String),
}

impl IdentifierPattern {
    /// True when `identifier` (an object id or an issuer DID) belongs to this pattern.
    pub fn matches(&self, identifier: &str) -> bool {
        match self {
            Self::Indy => identifier_form(identifier) != IdentifierForm::OtherDid,
            Self::DidMethod(method) => identifier
                .strip_prefix("did:")
                .and_then(|rest| rest.strip_prefix(method.as_str()))
                .is_some_and(|rest| rest.starts_with(':')),
        }
    }
}

/// A pluggable AnonCreds registry.
///
/// Implementations are `Send + Sync` and `Debug`; one instance serves every
/// caller of the resolution layer. Network timeouts and retries, if any,
/// belong to the implementation.
pub trait Registry: Send + Sync + std::fmt::Debug {
    /// Name for logs, e.g. `indy` or `cheqd`.
    fn method_name(&self) -> &str;

    /// True when this registry handles `identifier`.
    fn supports_identifier(&self, identifier: &str) -> bool;

    /// Whether resolved objects may be cached.
    fn allows_caching(&self) -> bool {
        true
    }

    /// Whether locally registered records may stand in for resolution.
    fn allows_local_record(&self) -> bool {
        true
    }

    /// Resolve a schema.
    fn get_schema(&self, schema_id: &str) -> Result<Schema, RegistryError>;

    /// Resolve a credential definition.
    fn get_credential_definition(&self, cred_def_id: &str) -> Result<CredentialDefinition, RegistryError>;

    /// Resolve a revocation registry definition.
    fn get_revocation_registry_definition(
        &self,
        rev_reg_def_id: &str,
    ) -> Result<RevocationRegistryDefinition, RegistryError>;

    /// Resolve the status list current as of `timestamp`: the latest snapshot
    /// whose timestamp is `<= timestamp`.
    fn get_revocation_status_list(
        &self,
        rev_reg_def_id: &str,
        timestamp: Timestamp,
    ) -> Result<RevocationStatusList, RegistryError>;

    /// Publish a schema, returning its identifier.
    fn register_schema(&self, schema: &Schema) -> Result<String, RegistryError>;

    /// Publish a credential definition, returning its identifier.
    fn register_credential_definition(
        &self,
        definition: &CredentialDefinition,
    ) -> Result<String, RegistryError>;

    /// Publish a revocation registry definition, returning its identifier.
    fn register_revocation_registry_definition(
        &self,
        definition: &RevocationRegistryDefinition,
    ) -> Result<String, RegistryError>;

    /// Publish a status list snapshot. The returned list carries the
    /// timestamp the registry assigned.
    fn register_revocation_status_list(
        &self,
        list: &RevocationStatusList,
    ) -> Result<RevocationStatusList, RegistryError>;
}

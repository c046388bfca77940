//! Ledger objects: schemas, credential definitions, revocation registry
//! definitions and revocation status lists.

use serde::{Deserialize, Serialize};

use crate::error::IdentifierError;
use crate::identifier::{self, ObjectKind};
use crate::temporal::Timestamp;

/// An immutable list of attribute names published by an issuer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    /// DID of the schema author.
    pub issuer_id: String,
    /// Schema name.
    pub name: String,
    /// Schema version, digits and dots.
    pub version: String,
    /// Attribute names every credential of this schema carries.
    pub attr_names: Vec<String>,
}

impl Schema {
    /// This schema with its issuer id rewritten to legacy form.
    pub fn to_legacy(&self) -> Result<Self, IdentifierError> {
        Ok(Self { issuer_id: identifier::to_legacy_did(&self.issuer_id)?, ..self.clone() })
    }
}

/// Public half of an issuer's signing key for one schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialDefinition {
    /// DID of the issuer.
    pub issuer_id: String,
    /// Identifier of the schema this definition signs.
    pub schema_id: String,
    /// Signature type, always `CL`.
    #[serde(rename = "type")]
    pub signature_type: String,
    /// Free-form tag distinguishing definitions of the same schema.
    pub tag: String,
    /// Engine-specific public key material.
    pub value: serde_json::Value,
}

impl CredentialDefinition {
    /// This definition with issuer and schema ids rewritten to legacy form.
    pub fn to_legacy(&self) -> Result<Self, IdentifierError> {
        Ok(Self {
            issuer_id: identifier::to_legacy_did(&self.issuer_id)?,
            schema_id: identifier::to_legacy(ObjectKind::Schema, &self.schema_id)?,
            ..self.clone()
        })
    }

    /// True when the definition carries revocation key material.
    pub fn supports_revocation(&self) -> bool {
        self.value.get("revocation").map(|r| !r.is_null()).unwrap_or(false)
    }
}

/// Private signing material for a credential definition. Never resolved
/// through a registry.
#[derive(Clone, Serialize, Deserialize)]
pub struct CredentialDefinitionPrivate {
    /// Engine-specific private key material.
    pub value: serde_json::Value,
}

impl std::fmt::Debug for CredentialDefinitionPrivate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("CredentialDefinitionPrivate(<private>)")
    }
}

/// Proof that the issuer knows the private key of a credential definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyCorrectnessProof(pub serde_json::Value);

/// Public parameters of a revocation registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevocationRegistryDefinition {
    /// DID of the issuer.
    pub issuer_id: String,
    /// Accumulator type, always `CL_ACCUM`.
    pub revoc_def_type: String,
    /// Credential definition this registry belongs to.
    pub cred_def_id: String,
    /// Registry tag.
    pub tag: String,
    /// Registry parameters.
    pub value: RevocationRegistryDefinitionValue,
}

/// The `value` member of a revocation registry definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevocationRegistryDefinitionValue {
    /// Engine-specific accumulator public keys.
    pub public_keys: serde_json::Value,
    /// Number of credential slots in the registry.
    pub max_cred_num: u32,
    /// Where the tails file can be downloaded.
    pub tails_location: String,
    /// Hash of the tails file contents.
    pub tails_hash: String,
}

impl RevocationRegistryDefinition {
    /// Number of credential slots in the registry.
    pub fn max_cred_num(&self) -> u32 {
        self.value.max_cred_num
    }

    /// Where the tails file can be downloaded.
    pub fn tails_location(&self) -> &str {
        &self.value.tails_location
    }

    /// Hash of the tails file contents.
    pub fn tails_hash(&self) -> &str {
        &self.value.tails_hash
    }

    /// This definition with issuer and credential definition ids rewritten to legacy form.
    pub fn to_legacy(&self) -> Result<Self, IdentifierError> {
        Ok(Self {
            issuer_id: identifier::to_legacy_did(&self.issuer_id)?,
            cred_def_id: identifier::to_legacy(ObjectKind::CredentialDefinition, &self.cred_def_id)?,
            ..self.clone()
        })
    }
}

/// Private accumulator material for a revocation registry.
#[derive(Clone, Serialize, Deserialize)]
pub struct RevocationRegistryDefinitionPrivate {
    /// Engine-specific private material.
    pub value: serde_json::Value,
}

impl std::fmt::Debug for RevocationRegistryDefinitionPrivate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("RevocationRegistryDefinitionPrivate(<private>)")
    }
}

/// A timestamped snapshot of a revocation registry's state.
///
/// Snapshots are append-only: an update produces a new list with a later
/// timestamp, never a mutation of an older one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevocationStatusList {
    /// DID of the issuer.
    pub issuer_id: String,
    /// Registry this snapshot belongs to.
    pub rev_reg_def_id: String,
    /// One entry per credential slot: `1` revoked, `0` not revoked.
    pub revocation_list: Vec<u8>,
    /// Accumulator value for this snapshot.
    pub current_accumulator: String,
    /// When the snapshot became current. `None` until registered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Timestamp>,
}

impl RevocationStatusList {
    /// Revocation status of one slot. `None` when `index` is out of range.
    pub fn is_revoked(&self, index: u32) -> Option<bool> {
        self.revocation_list.get(index as usize).map(|bit| *bit == 1)
    }

    /// This list with issuer and registry ids rewritten to legacy form.
    pub fn to_legacy(&self) -> Result<Self, IdentifierError> {
        Ok(Self {
            issuer_id: identifier::to_legacy_did(&self.issuer_id)?,
            rev_reg_def_id: identifier::to_legacy(
                ObjectKind::RevocationRegistryDefinition,
                &self.rev_reg_def_id,
            )?,
            ..self.clone()
        })
    }
}

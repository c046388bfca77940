//! Presentations, the holder's credential selection, and interval overrides.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::credential::AttributeValue;
use crate::temporal::Timestamp;

/// A zero-knowledge presentation produced by the proof engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Presentation {
    /// Engine-specific proof.
    pub proof: serde_json::Value,
    /// Which sub-proof answers which referent.
    pub requested_proof: RequestedProof,
    /// One entry per sub-proof, in sub-proof order.
    pub identifiers: Vec<PresentationIdentifier>,
}

/// Mapping from referents to sub-proofs and revealed values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestedProof {
    /// Revealed single attributes.
    #[serde(default)]
    pub revealed_attrs: BTreeMap<String, RevealedAttribute>,
    /// Revealed attribute groups.
    #[serde(default)]
    pub revealed_attr_groups: BTreeMap<String, RevealedAttributeGroup>,
    /// Values the holder attested without a credential.
    #[serde(default)]
    pub self_attested_attrs: BTreeMap<String, String>,
    /// Attributes proven but not revealed.
    #[serde(default)]
    pub unrevealed_attrs: BTreeMap<String, SubProofReferent>,
    /// Predicates proven.
    #[serde(default)]
    pub predicates: BTreeMap<String, SubProofReferent>,
}

/// A revealed attribute value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealedAttribute {
    /// Index into `Presentation::identifiers`.
    pub sub_proof_index: u32,
    /// Raw value.
    pub raw: String,
    /// Encoded value.
    pub encoded: String,
}

/// A revealed attribute group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealedAttributeGroup {
    /// Index into `Presentation::identifiers`.
    pub sub_proof_index: u32,
    /// Values keyed by attribute name.
    pub values: BTreeMap<String, AttributeValue>,
}

/// A referent answered by a sub-proof without revealing a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubProofReferent {
    /// Index into `Presentation::identifiers`.
    pub sub_proof_index: u32,
}

/// Objects a sub-proof was produced against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresentationIdentifier {
    /// Schema of the credential.
    pub schema_id: String,
    /// Credential definition of the credential.
    pub cred_def_id: String,
    /// Revocation registry, if non-revocation was proven.
    #[serde(default)]
    pub rev_reg_id: Option<String>,
    /// Status list snapshot the non-revocation proof used.
    #[serde(default)]
    pub timestamp: Option<Timestamp>,
}

/// The holder's choice of credential per referent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedCredentials {
    /// Selected credentials for requested attributes.
    #[serde(default)]
    pub attributes: BTreeMap<String, SelectedAttribute>,
    /// Selected credentials for requested predicates.
    #[serde(default)]
    pub predicates: BTreeMap<String, SelectedPredicate>,
    /// Self-attested values keyed by referent.
    #[serde(default)]
    pub self_attested_attributes: BTreeMap<String, String>,
}

/// Credential chosen for a requested attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedAttribute {
    /// Wallet id of the credential.
    pub credential_id: String,
    /// Whether the value is revealed.
    pub revealed: bool,
    /// Status list snapshot to prove non-revocation against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Timestamp>,
}

/// Credential chosen for a requested predicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedPredicate {
    /// Wallet id of the credential.
    pub credential_id: String,
    /// Status list snapshot to prove non-revocation against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Timestamp>,
}

/// Tells the verifier that a requested `from` boundary is satisfied by an
/// earlier snapshot.
///
/// Produced when the snapshot current at the requested `to` was published
/// before the requested `from`: the registry did not change inside the
/// interval, so the earlier snapshot proves non-revocation for all of it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NonRevokedIntervalOverride {
    /// Registry the override applies to.
    pub rev_reg_def_id: String,
    /// The `from` the request asked for.
    pub requested_from_timestamp: Timestamp,
    /// The snapshot timestamp that stands in for it.
    pub override_rev_status_list_timestamp: Timestamp,
}

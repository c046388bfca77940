//! Issuance objects and holder-side secrets.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::encoding::encode_credential_value;
use crate::temporal::Timestamp;

/// A raw attribute value paired with its signed integer encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeValue {
    /// Value as presented to the user.
    pub raw: String,
    /// Decimal integer the issuer signed.
    pub encoded: String,
}

impl AttributeValue {
    /// Pair a raw value with its standard encoding.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let encoded = encode_credential_value(&raw);
        Self { raw, encoded }
    }
}

/// An issued credential as held in the holder's wallet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    /// Schema the credential follows.
    pub schema_id: String,
    /// Credential definition that signed it.
    pub cred_def_id: String,
    /// Revocation registry holding its slot. `None` when not revocable.
    #[serde(default)]
    pub rev_reg_id: Option<String>,
    /// Attribute values keyed by attribute name.
    pub values: BTreeMap<String, AttributeValue>,
    /// Engine-specific issuer signature.
    pub signature: serde_json::Value,
    /// Engine-specific proof that the signature is well formed.
    pub signature_correctness_proof: serde_json::Value,
    /// Engine-specific registry state at issuance, if revocable.
    #[serde(default)]
    pub rev_reg: Option<serde_json::Value>,
    /// Engine-specific witness at issuance, if revocable.
    #[serde(default)]
    pub witness: Option<serde_json::Value>,
}

/// Attribute names match case-insensitively and ignoring whitespace.
pub fn normalize_attribute_name(name: &str) -> String {
    name.chars().filter(|c| !c.is_whitespace()).flat_map(char::to_lowercase).collect()
}

/// The entry of `values` named `name`, exactly or else after normalizing
/// both names.
pub fn find_attribute<'v, V>(values: &'v BTreeMap<String, V>, name: &str) -> Option<&'v V> {
    values.get(name).or_else(|| {
        let wanted = normalize_attribute_name(name);
        values.iter().find(|(key, _)| normalize_attribute_name(key) == wanted).map(|(_, value)| value)
    })
}

impl Credential {
    /// The value of attribute `name`. See [`find_attribute`].
    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        find_attribute(&self.values, name)
    }

    /// Raw attribute values keyed by attribute name.
    pub fn raw_values(&self) -> BTreeMap<String, String> {
        self.values.iter().map(|(k, v)| (k.clone(), v.raw.clone())).collect()
    }
}

/// What an issuer offers before a holder requests a credential.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredentialOffer {
    /// Schema of the offered credential.
    pub schema_id: String,
    /// Credential definition that will sign it.
    pub cred_def_id: String,
    /// Key correctness proof of the credential definition.
    pub key_correctness_proof: serde_json::Value,
    /// Issuer nonce.
    pub nonce: String,
}

/// A holder's request for a credential, binding its link secret.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredentialRequest {
    /// Holder entropy.
    pub entropy: String,
    /// Credential definition being requested.
    pub cred_def_id: String,
    /// Engine-specific blinded link secret.
    pub blinded_ms: serde_json::Value,
    /// Engine-specific proof over the blinded link secret.
    pub blinded_ms_correctness_proof: serde_json::Value,
    /// Holder nonce.
    pub nonce: String,
}

/// Holder-side data kept between request and credential processing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredentialRequestMetadata {
    /// Engine-specific blinding factors.
    pub link_secret_blinding_data: serde_json::Value,
    /// Holder nonce from the request.
    pub nonce: String,
    /// Id of the link secret the request was bound to.
    pub link_secret_name: String,
}

/// A holder's link secret value.
///
/// Does not implement `Serialize`. The value never leaves the holder and
/// is redacted from `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct LinkSecret(String);

impl LinkSecret {
    /// Wrap a link secret value (a decimal integer string).
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The secret value.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for LinkSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("LinkSecret(<private>)")
    }
}

/// Holder-side witness that a credential slot is a member of the
/// accumulator at one status list snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevocationState {
    /// Engine-specific witness.
    pub witness: serde_json::Value,
    /// Engine-specific accumulator state the witness was built against.
    pub rev_reg: serde_json::Value,
    /// Timestamp of the status list snapshot.
    pub timestamp: Timestamp,
}

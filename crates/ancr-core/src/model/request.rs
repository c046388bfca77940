//! Proof requests and their restrictions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::temporal::Timestamp;

/// A verifier's request for a presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProofRequest {
    /// Request name.
    pub name: String,
    /// Request version.
    pub version: String,
    /// Verifier nonce the presentation is bound to.
    pub nonce: String,
    /// Requested attributes keyed by referent.
    #[serde(default)]
    pub requested_attributes: BTreeMap<String, RequestedAttribute>,
    /// Requested predicates keyed by referent.
    #[serde(default)]
    pub requested_predicates: BTreeMap<String, RequestedPredicate>,
    /// Request-wide non-revocation interval.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub non_revoked: Option<NonRevokedInterval>,
    /// Request format version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ver: Option<String>,
}

impl ProofRequest {
    /// Interval that applies to a referent: its own `non_revoked`, else the
    /// request-wide one.
    pub fn interval_for(&self, referent: &str) -> Option<&NonRevokedInterval> {
        let own = self
            .requested_attributes
            .get(referent)
            .and_then(|a| a.non_revoked.as_ref())
            .or_else(|| {
                self.requested_predicates.get(referent).and_then(|p| p.non_revoked.as_ref())
            });
        own.or(self.non_revoked.as_ref())
    }
}

/// One requested attribute, or a group of attributes that must come from
/// the same credential.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestedAttribute {
    /// Single attribute name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Attribute group; takes precedence over `name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub names: Option<Vec<String>>,
    /// Any one of these restrictions must hold.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restrictions: Option<Vec<Restriction>>,
    /// Referent-level non-revocation interval.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub non_revoked: Option<NonRevokedInterval>,
}

impl RequestedAttribute {
    /// `names`, else `[name]`.
    pub fn attribute_names(&self) -> Vec<String> {
        match (&self.names, &self.name) {
            (Some(names), _) => names.clone(),
            (None, Some(name)) => vec![name.clone()],
            (None, None) => Vec::new(),
        }
    }
}

/// A requested predicate over one integer attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestedPredicate {
    /// Attribute name.
    pub name: String,
    /// Comparison.
    pub p_type: PredicateType,
    /// Right-hand side of the comparison.
    pub p_value: i32,
    /// Any one of these restrictions must hold.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restrictions: Option<Vec<Restriction>>,
    /// Referent-level non-revocation interval.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub non_revoked: Option<NonRevokedInterval>,
}

/// Predicate comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PredicateType {
    /// `>=`
    #[serde(rename = ">=")]
    GreaterOrEqual,
    /// `>`
    #[serde(rename = ">")]
    Greater,
    /// `<=`
    #[serde(rename = "<=")]
    LessOrEqual,
    /// `<`
    #[serde(rename = "<")]
    Less,
}

impl PredicateType {
    /// Evaluate `value <op> threshold`.
    pub fn holds(&self, value: i32, threshold: i32) -> bool {
        match self {
            Self::GreaterOrEqual => value >= threshold,
            Self::Greater => value > threshold,
            Self::LessOrEqual => value <= threshold,
            Self::Less => value < threshold,
        }
    }

    /// The operator symbol.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GreaterOrEqual => ">=",
            Self::Greater => ">",
            Self::LessOrEqual => "<=",
            Self::Less => "<",
        }
    }
}

impl std::fmt::Display for PredicateType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// "Must have been non-revoked between `from` and `to`".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NonRevokedInterval {
    /// Start of the interval.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<Timestamp>,
    /// End of the interval.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<Timestamp>,
}

impl NonRevokedInterval {
    /// The degenerate interval `{from: t, to: t}`.
    pub fn at(t: Timestamp) -> Self {
        Self { from: Some(t), to: Some(t) }
    }
}

/// One restriction set of a requested attribute or predicate.
///
/// On the wire, `issuer_did`/`schema_issuer_did` are accepted as aliases of
/// `issuer_id`/`schema_issuer_id`, and attribute constraints appear as
/// `"attr::<name>::value": "<raw>"` and `"attr::<name>::marker": "1"` keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RestrictionWire", into = "RestrictionWire")]
pub struct Restriction {
    /// Required schema id.
    pub schema_id: Option<String>,
    /// Required schema author.
    pub schema_issuer_id: Option<String>,
    /// Required schema name.
    pub schema_name: Option<String>,
    /// Required schema version.
    pub schema_version: Option<String>,
    /// Required credential issuer.
    pub issuer_id: Option<String>,
    /// Required credential definition id.
    pub cred_def_id: Option<String>,
    /// Required raw attribute values.
    pub attribute_values: BTreeMap<String, String>,
    /// Attributes that must (`true`) or must not (`false`) be present.
    pub attribute_markers: BTreeMap<String, bool>,
}

#[derive(Serialize, Deserialize)]
struct RestrictionWire {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    schema_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    schema_issuer_id: Option<String>,
    #[serde(default, skip_serializing)]
    schema_issuer_did: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    schema_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    schema_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    issuer_id: Option<String>,
    #[serde(default, skip_serializing)]
    issuer_did: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cred_def_id: Option<String>,
    #[serde(flatten)]
    attributes: BTreeMap<String, serde_json::Value>,
}

impl From<RestrictionWire> for Restriction {
    fn from(wire: RestrictionWire) -> Self {
        let mut attribute_values = BTreeMap::new();
        let mut attribute_markers = BTreeMap::new();
        for (key, value) in wire.attributes {
            let Some(rest) = key.strip_prefix("attr::") else {
                continue;
            };
            if let Some(name) = rest.strip_suffix("::value") {
                let raw = match value {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                };
                attribute_values.insert(name.to_string(), raw);
            } else if let Some(name) = rest.strip_suffix("::marker") {
                let present = match value {
                    serde_json::Value::Bool(b) => b,
                    serde_json::Value::Number(n) => n.as_u64() == Some(1),
                    serde_json::Value::String(s) => s == "1" || s == "true",
                    _ => false,
                };
                attribute_markers.insert(name.to_string(), present);
            }
        }
        Self {
            schema_id: wire.schema_id,
            schema_issuer_id: wire.schema_issuer_id.or(wire.schema_issuer_did),
            schema_name: wire.schema_name,
            schema_version: wire.schema_version,
            issuer_id: wire.issuer_id.or(wire.issuer_did),
            cred_def_id: wire.cred_def_id,
            attribute_values,
            attribute_markers,
        }
    }
}

impl From<Restriction> for RestrictionWire {
    fn from(r: Restriction) -> Self {
        let mut attributes = BTreeMap::new();
        for (name, raw) in r.attribute_values {
            attributes.insert(format!("attr::{name}::value"), serde_json::Value::String(raw));
        }
        for (name, present) in r.attribute_markers {
            let marker = if present { "1" } else { "0" };
            attributes.insert(format!("attr::{name}::marker"), serde_json::Value::from(marker));
        }
        Self {
            schema_id: r.schema_id,
            schema_issuer_id: r.schema_issuer_id,
            schema_issuer_did: None,
            schema_name: r.schema_name,
            schema_version: r.schema_version,
            issuer_id: r.issuer_id,
            issuer_did: None,
            cred_def_id: r.cred_def_id,
            attributes,
        }
    }
}

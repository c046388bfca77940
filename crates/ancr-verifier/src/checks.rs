//! # Pre-engine Checks
//!
//! Checks the verifier runs on a presentation before handing it to the
//! proof engine. Each returns the offending referent, or `None` when the
//! presentation passes.
//!
//! - Every revealed value's encoding must match its raw value.
//! - Every referent with restrictions must be answered by a sub-proof whose
//!   schema, credential definition and revealed values satisfy at least one
//!   of them. Identifiers and DIDs compare equal across qualified and legacy
//!   forms.

use std::collections::BTreeMap;

use ancr_core::identifier::{to_legacy, to_legacy_did};
use ancr_core::{
    is_valid_encoding, CredentialDefinition, ObjectKind, Presentation, PresentationIdentifier, ProofRequest,
    Restriction, Schema,
};
use ancr_query::normalize_attribute_name;

use crate::error::VerifierError;

/// The first referent whose revealed encoding does not match its raw value.
pub fn invalid_encoding(presentation: &Presentation) -> Option<String> {
    let proof = &presentation.requested_proof;
    if let Some((referent, _)) =
        proof.revealed_attrs.iter().find(|(_, a)| !is_valid_encoding(&a.raw, &a.encoded))
    {
        return Some(referent.clone());
    }
    proof
        .revealed_attr_groups
        .iter()
        .find(|(_, group)| group.values.values().any(|v| !is_valid_encoding(&v.raw, &v.encoded)))
        .map(|(referent, _)| referent.clone())
}

fn same_object(kind: ObjectKind, a: &str, b: &str) -> bool {
    a == b || matches!((to_legacy(kind, a), to_legacy(kind, b)), (Ok(x), Ok(y)) if x == y)
}

fn same_did(a: &str, b: &str) -> bool {
    a == b || matches!((to_legacy_did(a), to_legacy_did(b)), (Ok(x), Ok(y)) if x == y)
}

/// What one sub-proof says about its credential.
struct Answer<'a> {
    identifier: &'a PresentationIdentifier,
    schema: &'a Schema,
    definition: &'a CredentialDefinition,
    /// Revealed raw values by normalized attribute name.
    revealed: BTreeMap<String, &'a str>,
}

impl Answer<'_> {
    fn satisfies(&self, restriction: &Restriction) -> bool {
        let schema = self.schema;
        let checks = [
            restriction
                .cred_def_id
                .as_deref()
                .map(|id| same_object(ObjectKind::CredentialDefinition, id, &self.identifier.cred_def_id)),
            restriction.issuer_id.as_deref().map(|did| same_did(did, &self.definition.issuer_id)),
            restriction
                .schema_id
                .as_deref()
                .map(|id| same_object(ObjectKind::Schema, id, &self.identifier.schema_id)),
            restriction.schema_issuer_id.as_deref().map(|did| same_did(did, &schema.issuer_id)),
            restriction.schema_name.as_deref().map(|name| name == schema.name),
            restriction.schema_version.as_deref().map(|version| version == schema.version),
        ];
        if checks.iter().any(|check| *check == Some(false)) {
            return false;
        }
        let values_match = restriction.attribute_values.iter().all(|(name, value)| {
            self.revealed.get(&normalize_attribute_name(name)).is_some_and(|raw| *raw == value.as_str())
        });
        let markers_match = restriction.attribute_markers.iter().all(|(name, present)| {
            let name = normalize_attribute_name(name);
            schema.attr_names.iter().any(|a| normalize_attribute_name(a) == name) == *present
        });
        values_match && markers_match
    }
}

fn sub_proof_index(presentation: &Presentation, referent: &str) -> Option<u32> {
    let proof = &presentation.requested_proof;
    proof
        .revealed_attrs
        .get(referent)
        .map(|a| a.sub_proof_index)
        .or_else(|| proof.revealed_attr_groups.get(referent).map(|g| g.sub_proof_index))
        .or_else(|| proof.unrevealed_attrs.get(referent).map(|s| s.sub_proof_index))
        .or_else(|| proof.predicates.get(referent).map(|s| s.sub_proof_index))
}

fn answer<'a>(
    presentation: &'a Presentation,
    request: &ProofRequest,
    index: u32,
    schemas: &'a BTreeMap<String, Schema>,
    credential_definitions: &'a BTreeMap<String, CredentialDefinition>,
) -> Result<Option<Answer<'a>>, VerifierError> {
    let Some(identifier) = usize::try_from(index).ok().and_then(|i| presentation.identifiers.get(i)) else {
        return Ok(None);
    };
    let schema = schemas.get(&identifier.schema_id).ok_or_else(|| VerifierError::MissingObject {
        kind: ObjectKind::Schema,
        identifier: identifier.schema_id.clone(),
    })?;
    let definition =
        credential_definitions.get(&identifier.cred_def_id).ok_or_else(|| VerifierError::MissingObject {
            kind: ObjectKind::CredentialDefinition,
            identifier: identifier.cred_def_id.clone(),
        })?;

    let proof = &presentation.requested_proof;
    let mut revealed = BTreeMap::new();
    for (referent, attribute) in proof.revealed_attrs.iter().filter(|(_, a)| a.sub_proof_index == index) {
        if let Some(name) = request.requested_attributes.get(referent).and_then(|a| a.name.as_deref()) {
            revealed.insert(normalize_attribute_name(name), attribute.raw.as_str());
        }
    }
    for group in proof.revealed_attr_groups.values().filter(|g| g.sub_proof_index == index) {
        for (name, value) in &group.values {
            revealed.insert(normalize_attribute_name(name), value.raw.as_str());
        }
    }
    Ok(Some(Answer { identifier, schema, definition, revealed }))
}

/// The first referent with restrictions that its sub-proof does not satisfy.
///
/// `schemas` and `credential_definitions` are keyed by the identifiers the
/// presentation names. A referent with restrictions that no sub-proof
/// answers fails.
pub fn unsatisfied_restriction(
    presentation: &Presentation,
    request: &ProofRequest,
    schemas: &BTreeMap<String, Schema>,
    credential_definitions: &BTreeMap<String, CredentialDefinition>,
) -> Result<Option<String>, VerifierError> {
    let restricted = request
        .requested_attributes
        .iter()
        .filter_map(|(referent, a)| a.restrictions.as_ref().map(|r| (referent, r)))
        .chain(
            request
                .requested_predicates
                .iter()
                .filter_map(|(referent, p)| p.restrictions.as_ref().map(|r| (referent, r))),
        )
        .filter(|(_, restrictions)| !restrictions.is_empty());

    for (referent, restrictions) in restricted {
        let Some(index) = sub_proof_index(presentation, referent) else {
            return Ok(Some(referent.clone()));
        };
        let Some(answer) = answer(presentation, request, index, schemas, credential_definitions)? else {
            return Ok(Some(referent.clone()));
        };
        if !restrictions.iter().any(|r| answer.satisfies(r)) {
            return Ok(Some(referent.clone()));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ancr_core::{encode_credential_value, RequestedProof, RevealedAttribute, SubProofReferent};

    const LEGACY_DID: &str = "LjgpST2rjsoxYegQDRm7EL";
    const QUALIFIED_DID: &str = "did:indy:sovrin:LjgpST2rjsoxYegQDRm7EL";

    fn schema() -> Schema {
        Schema {
            issuer_id: QUALIFIED_DID.into(),
            name: "Employee ID".into(),
            version: "1.0".into(),
            attr_names: vec!["name".into(), "age".into()],
        }
    }

    fn schema_id() -> String {
        format!("{QUALIFIED_DID}/anoncreds/v0/SCHEMA/Employee ID/1.0")
    }

    fn cred_def_id() -> String {
        format!("{QUALIFIED_DID}/anoncreds/v0/CLAIM_DEF/15/default")
    }

    fn definition() -> CredentialDefinition {
        CredentialDefinition {
            issuer_id: QUALIFIED_DID.into(),
            schema_id: schema_id(),
            signature_type: "CL".into(),
            tag: "default".into(),
            value: serde_json::Value::Null,
        }
    }

    fn presentation(raw_name: &str, encoded_name: &str) -> Presentation {
        let mut requested_proof = RequestedProof::default();
        requested_proof.revealed_attrs.insert(
            "name".into(),
            RevealedAttribute { sub_proof_index: 0, raw: raw_name.into(), encoded: encoded_name.into() },
        );
        requested_proof.predicates.insert("adult".into(), SubProofReferent { sub_proof_index: 0 });
        Presentation {
            proof: serde_json::Value::Null,
            requested_proof,
            identifiers: vec![PresentationIdentifier {
                schema_id: schema_id(),
                cred_def_id: cred_def_id(),
                rev_reg_id: None,
                timestamp: None,
            }],
        }
    }

    fn request(restrictions: serde_json::Value) -> ProofRequest {
        serde_json::from_value(serde_json::json!({
            "name": "proof",
            "version": "1.0",
            "nonce": "1",
            "requested_attributes": {"name": {"name": "name", "restrictions": restrictions}},
            "requested_predicates": {"adult": {"name": "age", "p_type": ">=", "p_value": 18}}
        }))
        .unwrap()
    }

    fn check(presentation: &Presentation, request: &ProofRequest) -> Option<String> {
        let schemas = BTreeMap::from([(schema_id(), schema())]);
        let definitions = BTreeMap::from([(cred_def_id(), definition())]);
        unsatisfied_restriction(presentation, request, &schemas, &definitions).unwrap()
    }

    // -- encodings --------------------------------------------------------------

    #[test]
    fn encoding_mismatch_names_referent() {
        assert_eq!(invalid_encoding(&presentation("John", &encode_credential_value("John"))), None);
        assert_eq!(invalid_encoding(&presentation("John", "1")), Some("name".into()));
    }

    // -- restrictions -----------------------------------------------------------

    #[test]
    fn legacy_restriction_matches_qualified_presentation() {
        let legacy_cred_def = format!("{LEGACY_DID}:3:CL:15:default");
        let p = presentation("John", &encode_credential_value("John"));
        assert_eq!(check(&p, &request(serde_json::json!([{"cred_def_id": legacy_cred_def}]))), None);
        assert_eq!(check(&p, &request(serde_json::json!([{"issuer_id": LEGACY_DID}]))), None);
        assert_eq!(check(&p, &request(serde_json::json!([{"schema_issuer_did": LEGACY_DID}]))), None);
    }

    #[test]
    fn any_restriction_may_hold() {
        let p = presentation("John", &encode_credential_value("John"));
        let restrictions = serde_json::json!([
            {"schema_name": "Other"},
            {"schema_name": "Employee ID", "schema_version": "1.0"}
        ]);
        assert_eq!(check(&p, &request(restrictions)), None);
    }

    #[test]
    fn every_field_of_a_restriction_must_hold() {
        let p = presentation("John", &encode_credential_value("John"));
        let restrictions = serde_json::json!([{"schema_name": "Employee ID", "schema_version": "2.0"}]);
        assert_eq!(check(&p, &request(restrictions)), Some("name".into()));
    }

    #[test]
    fn attribute_value_and_marker_restrictions() {
        let p = presentation("John", &encode_credential_value("John"));
        assert_eq!(check(&p, &request(serde_json::json!([{"attr::name::value": "John"}]))), None);
        assert_eq!(check(&p, &request(serde_json::json!([{"attr::name::value": "Jane"}]))), Some("name".into()));
        assert_eq!(check(&p, &request(serde_json::json!([{"attr::Age::marker": "1"}]))), None);
        assert_eq!(check(&p, &request(serde_json::json!([{"attr::email::marker": "1"}]))), Some("name".into()));
    }

    #[test]
    fn unanswered_restricted_referent() {
        let mut p = presentation("John", &encode_credential_value("John"));
        p.requested_proof.revealed_attrs.clear();
        assert_eq!(check(&p, &request(serde_json::json!([{"schema_name": "Employee ID"}]))), Some("name".into()));
    }

    #[test]
    fn missing_schema_is_an_error() {
        let p = presentation("John", &encode_credential_value("John"));
        let result = unsatisfied_restriction(
            &p,
            &request(serde_json::json!([{"schema_name": "Employee ID"}])),
            &BTreeMap::new(),
            &BTreeMap::new(),
        );
        assert!(matches!(result, Err(VerifierError::MissingObject { kind: ObjectKind::Schema, .. })));
    }
}

//! # Restriction Query Compiler
//!
//! Compiles the restrictions of a requested attribute or predicate into a
//! [`Query`] over credential record tags:
//!
//! ```text
//! AND(attr::<name>::marker=1 ..., OR(AND(fields of restriction 1), AND(fields of restriction 2), ...))
//! ```
//!
//! Restrictions in one list are alternatives; the fields of one
//! restriction must all hold; every requested attribute name of a
//! referent must be present on the same credential.
//!
//! Identifier fields query both tag variants. A `did:indy` or legacy
//! identifier matches records whose as-issued tag equals it or whose
//! legacy tag equals its legacy form, so credentials stored under either
//! convention are found.

use thiserror::Error;

use ancr_core::identifier::{self, IdentifierForm, ObjectKind};
use ancr_core::{ProofRequest, Restriction};

use crate::query::Query;
use crate::record::tags;

/// Compilation failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// The proof request has no such referent.
    #[error("referent {0} is not in the proof request")]
    ReferentNotFound(String),

    /// A requested attribute names no attributes.
    #[error("requested attribute {0} has neither name nor names")]
    EmptyReferent(String),
}

/// How an identifier field is interpreted.
#[derive(Debug, Clone, Copy)]
enum IdentifierField {
    Object(ObjectKind),
    Did,
}

impl IdentifierField {
    fn legacy_form(self, id: &str) -> Option<String> {
        match self {
            Self::Object(kind) => identifier::to_legacy(kind, id).ok(),
            Self::Did => identifier::to_legacy_did(id).ok(),
        }
    }
}

fn identifier_query(field: IdentifierField, qualified_tag: &str, unqualified_tag: &str, id: &str) -> Query {
    if identifier::identifier_form(id) == IdentifierForm::OtherDid {
        return Query::eq(qualified_tag, id);
    }
    match field.legacy_form(id) {
        Some(legacy) => Query::Or(vec![Query::eq(qualified_tag, id), Query::eq(unqualified_tag, legacy)]),
        None => Query::eq(qualified_tag, id),
    }
}

/// The conjunction of one restriction's fields.
pub fn compile_restriction(restriction: &Restriction) -> Query {
    let mut fields = Vec::new();
    if let Some(id) = &restriction.cred_def_id {
        fields.push(identifier_query(
            IdentifierField::Object(ObjectKind::CredentialDefinition),
            tags::CRED_DEF_ID,
            tags::UNQUALIFIED_CRED_DEF_ID,
            id,
        ));
    }
    if let Some(id) = &restriction.issuer_id {
        fields.push(identifier_query(IdentifierField::Did, tags::ISSUER_ID, tags::UNQUALIFIED_ISSUER_ID, id));
    }
    if let Some(id) = &restriction.schema_id {
        fields.push(identifier_query(
            IdentifierField::Object(ObjectKind::Schema),
            tags::SCHEMA_ID,
            tags::UNQUALIFIED_SCHEMA_ID,
            id,
        ));
    }
    if let Some(id) = &restriction.schema_issuer_id {
        fields.push(identifier_query(
            IdentifierField::Did,
            tags::SCHEMA_ISSUER_ID,
            tags::UNQUALIFIED_SCHEMA_ISSUER_ID,
            id,
        ));
    }
    if let Some(name) = &restriction.schema_name {
        fields.push(Query::eq(tags::SCHEMA_NAME, name));
    }
    if let Some(version) = &restriction.schema_version {
        fields.push(Query::eq(tags::SCHEMA_VERSION, version));
    }
    for (name, raw) in &restriction.attribute_values {
        fields.push(Query::eq(tags::attribute_value(name), raw));
    }
    for (name, present) in &restriction.attribute_markers {
        let marker = Query::eq(tags::attribute_marker(name), "1");
        fields.push(if *present { marker } else { Query::not(marker) });
    }
    Query::And(fields)
}

/// `OR` of the restrictions, `None` for an empty list (no constraint).
pub fn compile_restrictions(restrictions: &[Restriction]) -> Option<Query> {
    if restrictions.is_empty() {
        return None;
    }
    Some(Query::Or(restrictions.iter().map(compile_restriction).collect()))
}

/// Markers for `names` combined with the compiled restrictions.
pub fn compile_attribute_query(names: &[String], restrictions: &[Restriction]) -> Query {
    let mut clauses: Vec<Query> = names.iter().map(|name| Query::eq(tags::attribute_marker(name), "1")).collect();
    clauses.extend(compile_restrictions(restrictions));
    Query::And(clauses)
}

/// The query candidate credentials for `referent` must satisfy.
pub fn compile_referent_query(request: &ProofRequest, referent: &str) -> Result<Query, QueryError> {
    if let Some(attribute) = request.requested_attributes.get(referent) {
        let names = attribute.attribute_names();
        if names.is_empty() {
            return Err(QueryError::EmptyReferent(referent.to_string()));
        }
        return Ok(compile_attribute_query(&names, attribute.restrictions.as_deref().unwrap_or_default()));
    }
    if let Some(predicate) = request.requested_predicates.get(referent) {
        return Ok(compile_attribute_query(
            std::slice::from_ref(&predicate.name),
            predicate.restrictions.as_deref().unwrap_or_default(),
        ));
    }
    Err(QueryError::ReferentNotFound(referent.to_string()))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    const NSID: &str = "LjgpST2rjsoxYegQDRm7EL";

    fn restriction(json: serde_json::Value) -> Restriction {
        serde_json::from_value(json).unwrap()
    }

    fn tags_of(pairs: &[(&str, String)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    // -- restriction lists ------------------------------------------------------

    #[test]
    fn alternatives_are_ored_fields_are_anded() {
        let restrictions = vec![
            restriction(serde_json::json!({"schema_name": "S", "schema_version": "1.0"})),
            restriction(serde_json::json!({"schema_version": "2.0"})),
        ];
        let query = compile_restrictions(&restrictions).unwrap();
        assert_eq!(
            query,
            Query::Or(vec![
                Query::And(vec![
                    Query::eq(tags::SCHEMA_NAME, "S"),
                    Query::eq(tags::SCHEMA_VERSION, "1.0"),
                ]),
                Query::And(vec![Query::eq(tags::SCHEMA_VERSION, "2.0")]),
            ])
        );

        let first = tags_of(&[(tags::SCHEMA_NAME, "S".into()), (tags::SCHEMA_VERSION, "1.0".into())]);
        let second = tags_of(&[(tags::SCHEMA_NAME, "T".into()), (tags::SCHEMA_VERSION, "2.0".into())]);
        let neither = tags_of(&[(tags::SCHEMA_NAME, "T".into()), (tags::SCHEMA_VERSION, "1.0".into())]);
        assert!(query.matches(&first));
        assert!(query.matches(&second));
        assert!(!query.matches(&neither));
    }

    #[test]
    fn empty_restrictions_compile_to_nothing() {
        assert_eq!(compile_restrictions(&[]), None);
    }

    // -- identifier forms -------------------------------------------------------

    #[test]
    fn qualified_cred_def_id_also_queries_legacy_tag() {
        let qualified = format!("did:indy:sovrin:{NSID}/anoncreds/v0/CLAIM_DEF/15/default");
        let query = compile_restriction(&restriction(serde_json::json!({"cred_def_id": qualified})));
        assert_eq!(
            query,
            Query::And(vec![Query::Or(vec![
                Query::eq(tags::CRED_DEF_ID, qualified.clone()),
                Query::eq(tags::UNQUALIFIED_CRED_DEF_ID, format!("{NSID}:3:CL:15:default")),
            ])])
        );
        let legacy_record = tags_of(&[
            (tags::CRED_DEF_ID, format!("{NSID}:3:CL:15:default")),
            (tags::UNQUALIFIED_CRED_DEF_ID, format!("{NSID}:3:CL:15:default")),
        ]);
        assert!(query.matches(&legacy_record));
    }

    #[test]
    fn legacy_issuer_matches_qualified_record() {
        let query = compile_restriction(&restriction(serde_json::json!({"issuer_did": NSID})));
        let qualified_record = tags_of(&[
            (tags::ISSUER_ID, format!("did:indy:sovrin:{NSID}")),
            (tags::UNQUALIFIED_ISSUER_ID, NSID.to_string()),
        ]);
        assert!(query.matches(&qualified_record));
    }

    #[test]
    fn other_did_method_queries_single_tag() {
        let id = "did:cheqd:testnet:abc/resources/1";
        let query = compile_restriction(&restriction(serde_json::json!({"schema_id": id})));
        assert_eq!(query, Query::And(vec![Query::eq(tags::SCHEMA_ID, id)]));
    }

    // -- attributes -------------------------------------------------------------

    #[test]
    fn attribute_value_and_marker_restrictions() {
        let query = compile_restriction(&restriction(serde_json::json!({
            "attr::name::value": "John",
            "attr::nickname::marker": "0"
        })));
        let record = tags_of(&[("attr::name::value", "John".into()), ("attr::name::marker", "1".into())]);
        assert!(query.matches(&record));
        let with_nickname = tags_of(&[
            ("attr::name::value", "John".into()),
            ("attr::nickname::marker", "1".into()),
        ]);
        assert!(!query.matches(&with_nickname));
    }

    fn request() -> ProofRequest {
        serde_json::from_value(serde_json::json!({
            "name": "proof",
            "version": "1.0",
            "nonce": "1",
            "requested_attributes": {
                "group": {"names": ["name", "age"], "restrictions": [{"schema_name": "Employee ID"}]},
                "empty": {}
            },
            "requested_predicates": {
                "adult": {"name": "age", "p_type": ">=", "p_value": 18}
            }
        }))
        .unwrap()
    }

    #[test]
    fn referent_query_requires_all_names() {
        let query = compile_referent_query(&request(), "group").unwrap();
        assert_eq!(
            query.to_string(),
            "AND(attr::name::marker=1, attr::age::marker=1, OR(AND(anonCredsSchemaName=Employee ID)))"
        );
    }

    #[test]
    fn predicate_referent_without_restrictions() {
        let query = compile_referent_query(&request(), "adult").unwrap();
        assert_eq!(query, Query::And(vec![Query::eq("attr::age::marker", "1")]));
    }

    #[test]
    fn unknown_and_empty_referents() {
        assert_eq!(
            compile_referent_query(&request(), "missing"),
            Err(QueryError::ReferentNotFound("missing".into()))
        );
        assert_eq!(compile_referent_query(&request(), "empty"), Err(QueryError::EmptyReferent("empty".into())));
    }

    // -- properties -------------------------------------------------------------

    proptest::proptest! {
        #[test]
        fn either_form_finds_either_record(seq_no in 1u64..100_000, tag in "[a-z]{1,8}", ns in "[a-z]{2,8}") {
            let legacy = format!("{NSID}:3:CL:{seq_no}:{tag}");
            let qualified = format!("did:indy:{ns}:{NSID}/anoncreds/v0/CLAIM_DEF/{seq_no}/{tag}");
            let records = [
                tags_of(&[(tags::CRED_DEF_ID, legacy.clone()), (tags::UNQUALIFIED_CRED_DEF_ID, legacy.clone())]),
                tags_of(&[(tags::CRED_DEF_ID, qualified.clone()), (tags::UNQUALIFIED_CRED_DEF_ID, legacy.clone())]),
            ];
            for id in [&legacy, &qualified] {
                let query = compile_restriction(&Restriction { cred_def_id: Some(id.clone()), ..Restriction::default() });
                for record in &records {
                    proptest::prop_assert!(query.matches(record));
                }
            }
        }
    }
}

//! # Credential Search and Selection
//!
//! Finds stored credentials that can answer the referents of a proof
//! request, using queries compiled from the request's restrictions, and
//! picks one per referent.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use ancr_core::{
    NonRevokedInterval, ProofRequest, SelectedAttribute, SelectedCredentials, SelectedPredicate,
};
use ancr_query::{compile_referent_query, CredentialRecord, CredentialStore, Query};

use crate::error::HolderError;

/// A candidate credential for one referent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialCandidate {
    /// The stored credential.
    pub record: CredentialRecord,
    /// Whether the credential is revoked at the referent's interval end.
    /// `None` when not revocable or no interval applies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revoked: Option<bool>,
}

/// Candidates for every referent of a request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestedCredentials {
    /// Candidates per requested attribute referent.
    pub attributes: BTreeMap<String, Vec<CredentialCandidate>>,
    /// Candidates per requested predicate referent.
    pub predicates: BTreeMap<String, Vec<CredentialCandidate>>,
}

/// Stored credentials matching `referent`, further narrowed by `extra`.
pub fn credentials_for_referent(
    store: &dyn CredentialStore,
    request: &ProofRequest,
    referent: &str,
    extra: Option<&Query>,
) -> Result<Vec<CredentialRecord>, HolderError> {
    let mut query = compile_referent_query(request, referent)?;
    if let (Query::And(clauses), Some(extra)) = (&mut query, extra) {
        clauses.push(extra.clone());
    }
    tracing::debug!(referent, query = %query, "searching credentials");
    Ok(store.find(Some(&query))?)
}

/// Revocation status of a candidate, as reported by the caller.
pub type RevocationCheck<'a> =
    dyn Fn(&CredentialRecord, &NonRevokedInterval) -> Result<Option<bool>, HolderError> + 'a;

fn candidates(
    store: &dyn CredentialStore,
    request: &ProofRequest,
    referent: &str,
    check: &RevocationCheck<'_>,
) -> Result<Vec<CredentialCandidate>, HolderError> {
    let interval = request.interval_for(referent).copied();
    let mut found = Vec::new();
    for record in credentials_for_referent(store, request, referent, None)? {
        let revoked = match (&interval, record.revocation_slot()) {
            (Some(interval), Some(_)) => check(&record, interval)?,
            _ => None,
        };
        found.push(CredentialCandidate { record, revoked });
    }
    // Non-revoked first; the sort is stable, so store order breaks ties.
    found.sort_by_key(|c| c.revoked == Some(true));
    Ok(found)
}

/// Candidates for every referent of `request`. `check` reports revocation
/// status for revocable candidates of referents that ask for non-revocation.
pub fn credentials_for_request(
    store: &dyn CredentialStore,
    request: &ProofRequest,
    check: &RevocationCheck<'_>,
) -> Result<RequestedCredentials, HolderError> {
    let mut requested = RequestedCredentials::default();
    for referent in request.requested_attributes.keys() {
        requested.attributes.insert(referent.clone(), candidates(store, request, referent, check)?);
    }
    for referent in request.requested_predicates.keys() {
        requested.predicates.insert(referent.clone(), candidates(store, request, referent, check)?);
    }
    Ok(requested)
}

fn satisfies_predicate(record: &CredentialRecord, request: &ProofRequest, referent: &str) -> bool {
    let Some(predicate) = request.requested_predicates.get(referent) else {
        return false;
    };
    record
        .credential
        .attribute(&predicate.name)
        .and_then(|value| value.raw.parse::<i32>().ok())
        .map_or(false, |value| predicate.p_type.holds(value, predicate.p_value))
}

/// Pick one candidate per referent: the first non-revoked one, for
/// predicates the first whose value satisfies the predicate. Every
/// attribute is revealed. Fails with `NoCandidates` for an unanswerable
/// referent.
pub fn select_credentials(
    request: &ProofRequest,
    requested: &RequestedCredentials,
) -> Result<SelectedCredentials, HolderError> {
    let mut selected = SelectedCredentials::default();
    for (referent, candidates) in &requested.attributes {
        let choice = candidates
            .iter()
            .find(|c| c.revoked != Some(true))
            .or_else(|| candidates.first())
            .ok_or_else(|| HolderError::NoCandidates { referent: referent.clone() })?;
        selected.attributes.insert(
            referent.clone(),
            SelectedAttribute { credential_id: choice.record.credential_id.clone(), revealed: true, timestamp: None },
        );
    }
    for (referent, candidates) in &requested.predicates {
        let satisfying: Vec<&CredentialCandidate> =
            candidates.iter().filter(|c| satisfies_predicate(&c.record, request, referent)).collect();
        let choice = satisfying
            .iter()
            .find(|c| c.revoked != Some(true))
            .or_else(|| satisfying.first())
            .copied()
            .or_else(|| candidates.first())
            .ok_or_else(|| HolderError::NoCandidates { referent: referent.clone() })?;
        selected.predicates.insert(
            referent.clone(),
            SelectedPredicate { credential_id: choice.record.credential_id.clone(), timestamp: None },
        );
    }
    Ok(selected)
}

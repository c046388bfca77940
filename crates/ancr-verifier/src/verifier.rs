//! # Proof Verifier
//!
//! Verifies a presentation against the proof request it answers:
//!
//! 1. Reject revealed values whose encoding does not match the raw value,
//!    and referents whose sub-proof does not satisfy their restrictions.
//! 2. For every revocation registry the presentation names, resolve its
//!    definition and rebuild the status list at each distinct timestamp the
//!    presentation claims.
//! 3. Where a claimed timestamp precedes a referent's requested `from`,
//!    derive an interval override when the registry did not change between
//!    the two.
//! 4. Hand everything to the proof engine.
//!
//! A rejected presentation is `Ok(false)`. `Err` is reserved for failures
//! that prevent verification from being attempted.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use ancr_core::{
    CredentialDefinition, NonRevokedIntervalOverride, Presentation, ProofRequest, RevocationRegistryDefinition,
    RevocationStatusList, Schema, Timestamp,
};
use ancr_engine::{ProofEngine, VerificationInput};
use ancr_revocation::RevocationStateReconstructor;

use crate::checks;
use crate::error::VerifierError;

/// Revocation data rebuilt for one presentation.
#[derive(Debug, Clone, Default)]
pub struct RevocationEvidence {
    /// Definitions keyed by the identifiers the presentation names.
    pub definitions: BTreeMap<String, RevocationRegistryDefinition>,
    /// One status list per distinct `(registry, timestamp)`.
    pub status_lists: Vec<RevocationStatusList>,
    /// Overrides for snapshots that predate a requested `from`.
    pub interval_overrides: Vec<NonRevokedIntervalOverride>,
    /// Claimed `(registry, timestamp)` pairs with no snapshot published at
    /// exactly that timestamp.
    pub unpublished: Vec<(String, Timestamp)>,
}

/// Verifies presentations through the proof engine.
#[derive(Clone)]
pub struct ProofVerifier {
    reconstructor: RevocationStateReconstructor,
    engine: Arc<dyn ProofEngine>,
}

impl std::fmt::Debug for ProofVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProofVerifier")
            .field("reconstructor", &self.reconstructor)
            .field("engine", &self.engine.engine_name())
            .finish()
    }
}

fn reject(nonce: &str, reason: &str, referent: Option<&str>) -> bool {
    tracing::warn!(nonce, reason, referent, "presentation rejected");
    metrics::counter!("ancr_verifications_total", "outcome" => "rejected").increment(1);
    false
}

/// Referents answered by sub-proof `index`.
fn referents_of(presentation: &Presentation, index: u32) -> Vec<&str> {
    let proof = &presentation.requested_proof;
    proof
        .revealed_attrs
        .iter()
        .filter(|(_, a)| a.sub_proof_index == index)
        .map(|(r, _)| r.as_str())
        .chain(proof.revealed_attr_groups.iter().filter(|(_, g)| g.sub_proof_index == index).map(|(r, _)| r.as_str()))
        .chain(proof.unrevealed_attrs.iter().filter(|(_, s)| s.sub_proof_index == index).map(|(r, _)| r.as_str()))
        .chain(proof.predicates.iter().filter(|(_, s)| s.sub_proof_index == index).map(|(r, _)| r.as_str()))
        .collect()
}

impl ProofVerifier {
    /// A verifier resolving revocation data through `reconstructor`.
    pub fn new(reconstructor: RevocationStateReconstructor, engine: Arc<dyn ProofEngine>) -> Self {
        Self { reconstructor, engine }
    }

    /// The reconstructor in use.
    pub fn reconstructor(&self) -> &RevocationStateReconstructor {
        &self.reconstructor
    }

    /// Resolve what the presentation's revocable sub-proofs claim.
    ///
    /// `known` supplies definitions the caller already holds; the rest are
    /// resolved. A claimed timestamp with no snapshot published exactly at
    /// it is recorded in `unpublished` instead of yielding a status list.
    pub fn revocation_evidence(
        &self,
        presentation: &Presentation,
        request: &ProofRequest,
        known: &BTreeMap<String, RevocationRegistryDefinition>,
    ) -> Result<RevocationEvidence, VerifierError> {
        let mut evidence = RevocationEvidence::default();
        let mut claimed: BTreeSet<(&str, Timestamp)> = BTreeSet::new();

        for (index, identifier) in presentation.identifiers.iter().enumerate() {
            let (Some(rev_reg_id), Some(timestamp)) = (identifier.rev_reg_id.as_deref(), identifier.timestamp)
            else {
                continue;
            };
            if !evidence.definitions.contains_key(rev_reg_id) {
                let definition = match known.get(rev_reg_id) {
                    Some(definition) => definition.clone(),
                    None => self.reconstructor.definition(rev_reg_id)?,
                };
                evidence.definitions.insert(rev_reg_id.to_string(), definition);
            }
            if claimed.insert((rev_reg_id, timestamp)) {
                let list = self.reconstructor.status_list_at(rev_reg_id, timestamp)?;
                if list.timestamp == Some(timestamp) {
                    evidence.status_lists.push(list);
                } else {
                    tracing::warn!(
                        rev_reg_def_id = rev_reg_id,
                        claimed = %timestamp,
                        "no status list published at the claimed timestamp"
                    );
                    evidence.unpublished.push((rev_reg_id.to_string(), timestamp));
                }
            }

            let index = u32::try_from(index).unwrap_or(u32::MAX);
            for referent in referents_of(presentation, index) {
                let Some(from) = request.interval_for(referent).and_then(|i| i.from) else {
                    continue;
                };
                if let Some(token) = self.reconstructor.verifier_override(rev_reg_id, from, timestamp)? {
                    if !evidence.interval_overrides.contains(&token) {
                        evidence.interval_overrides.push(token);
                    }
                }
            }
        }
        Ok(evidence)
    }

    /// Verify `presentation` against `request`.
    ///
    /// All maps are keyed by the identifiers the presentation names.
    /// Revocation registry definitions missing from
    /// `revocation_registry_definitions` are resolved.
    pub fn verify(
        &self,
        presentation: &Presentation,
        request: &ProofRequest,
        schemas: &BTreeMap<String, Schema>,
        credential_definitions: &BTreeMap<String, CredentialDefinition>,
        revocation_registry_definitions: &BTreeMap<String, RevocationRegistryDefinition>,
    ) -> Result<bool, VerifierError> {
        let nonce = request.nonce.as_str();
        if let Some(referent) = checks::invalid_encoding(presentation) {
            return Ok(reject(nonce, "revealed encoding does not match raw value", Some(&referent)));
        }
        if let Some(referent) =
            checks::unsatisfied_restriction(presentation, request, schemas, credential_definitions)?
        {
            return Ok(reject(nonce, "restrictions not satisfied", Some(&referent)));
        }

        let evidence = self.revocation_evidence(presentation, request, revocation_registry_definitions)?;
        if !evidence.unpublished.is_empty() {
            return Ok(reject(nonce, "presentation claims an unpublished status list", None));
        }
        let verified = self.engine.verify_presentation(VerificationInput {
            presentation,
            request,
            schemas,
            credential_definitions,
            revocation_registry_definitions: &evidence.definitions,
            revocation_status_lists: &evidence.status_lists,
            non_revoked_interval_overrides: &evidence.interval_overrides,
        })?;

        if !verified {
            return Ok(reject(nonce, "proof engine rejected the presentation", None));
        }
        tracing::info!(
            nonce,
            sub_proofs = presentation.identifiers.len(),
            status_lists = evidence.status_lists.len(),
            overrides = evidence.interval_overrides.len(),
            "presentation verified"
        );
        metrics::counter!("ancr_verifications_total", "outcome" => "verified").increment(1);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{proof_request, World};

    // -- acceptance -------------------------------------------------------------

    #[test]
    fn presentation_verifies_only_for_its_predicate() {
        let world = World::new(false);
        world.issue("c1", "John", "25");
        let presentation = world.present(&proof_request(18, None));
        assert!(world.verifier.verify_presentation(&presentation, &proof_request(18, None)).unwrap());
        assert!(!world.verifier.verify_presentation(&presentation, &proof_request(30, None)).unwrap());
    }

    #[test]
    fn predicate_named_in_another_case_verifies() {
        let world = World::new(false);
        world.issue("c1", "John", "25");
        let mut request = proof_request(18, None);
        request.requested_predicates.get_mut("adult").unwrap().name = "Age".into();
        let presentation = world.present(&request);
        assert!(world.verifier.verify_presentation(&presentation, &request).unwrap());
    }

    #[test]
    fn tampered_encoding_is_rejected() {
        let world = World::new(false);
        world.issue("c1", "John", "25");
        let mut presentation = world.present(&proof_request(18, None));
        if let Some(name) = presentation.requested_proof.revealed_attrs.get_mut("name") {
            name.encoded = "1".into();
        }
        assert!(!world.verifier.verify_presentation(&presentation, &proof_request(18, None)).unwrap());
    }

    #[test]
    fn unmet_restriction_is_rejected() {
        let world = World::new(false);
        world.issue("c1", "John", "25");
        let presentation = world.present(&proof_request(18, None));
        let mut request = proof_request(18, None);
        if let Some(name) = request.requested_attributes.get_mut("name") {
            name.restrictions = Some(vec![serde_json::from_value(serde_json::json!({"schema_name": "Other"})).unwrap()]);
        }
        assert!(!world.verifier.verify_presentation(&presentation, &request).unwrap());
    }

    #[test]
    fn unknown_credential_definition_is_an_error() {
        let world = World::new(false);
        world.issue("c1", "John", "25");
        let mut presentation = world.present(&proof_request(18, None));
        presentation.identifiers[0].cred_def_id = "LjgpST2rjsoxYegQDRm7EL:3:CL:999:default".into();
        let result = world.verifier.verify_presentation(&presentation, &proof_request(18, None));
        assert!(matches!(result, Err(VerifierError::Resolution(_))));
    }

    // -- revocation ---------------------------------------------------------------

    #[test]
    fn snapshot_before_revocation_verifies() {
        let world = World::new(true);
        world.issue("c1", "John", "25");
        let request = proof_request(18, Some((100, 100)));
        let presentation = world.present(&request);
        world.revoke(&[0], 200);
        assert!(world.verifier.verify_presentation(&presentation, &request).unwrap());

        let later = proof_request(18, Some((250, 250)));
        let presentation = world.present(&later);
        assert!(!world.verifier.verify_presentation(&presentation, &later).unwrap());
    }

    #[test]
    fn unchanged_registry_yields_override() {
        let world = World::new(true);
        world.issue("c1", "John", "25");
        let request = proof_request(18, Some((150, 150)));
        let presentation = world.present(&request);
        assert_eq!(presentation.identifiers[0].timestamp, Some(Timestamp::from_epoch_secs(100)));

        let evidence =
            world.verifier.verifier().revocation_evidence(&presentation, &request, &BTreeMap::new()).unwrap();
        assert_eq!(evidence.status_lists.len(), 1);
        assert_eq!(evidence.interval_overrides.len(), 1);
        assert_eq!(evidence.interval_overrides[0].requested_from_timestamp, Timestamp::from_epoch_secs(150));
        assert!(world.verifier.verify_presentation(&presentation, &request).unwrap());
    }

    #[test]
    fn changed_registry_yields_no_override() {
        let world = World::new(true);
        world.issue("c1", "John", "25");
        let presentation = world.present(&proof_request(18, Some((150, 150))));
        world.revoke(&[5], 200);

        let later = proof_request(18, Some((250, 250)));
        let evidence = world.verifier.verifier().revocation_evidence(&presentation, &later, &BTreeMap::new()).unwrap();
        assert!(evidence.interval_overrides.is_empty());
        assert!(!world.verifier.verify_presentation(&presentation, &later).unwrap());
    }

    #[test]
    fn claimed_timestamp_without_snapshot() {
        let world = World::new(true);
        world.issue("c1", "John", "25");
        let request = proof_request(18, Some((100, 100)));
        let mut presentation = world.present(&request);
        assert_eq!(presentation.identifiers.len(), 2);
        for identifier in &mut presentation.identifiers {
            identifier.timestamp = Some(Timestamp::from_epoch_secs(120));
        }
        let evidence = world.verifier.verifier().revocation_evidence(&presentation, &request, &BTreeMap::new()).unwrap();
        assert!(evidence.status_lists.is_empty());
        assert_eq!(evidence.unpublished, [(world.rev_reg_id.clone().unwrap(), Timestamp::from_epoch_secs(120))]);
        assert!(!world.verifier.verify_presentation(&presentation, &request).unwrap());
    }

    #[test]
    fn one_unpublished_claim_rejects_the_presentation() {
        let world = World::new(true);
        world.issue("c1", "John", "25");
        let request = proof_request(18, Some((100, 100)));
        let mut presentation = world.present(&request);
        presentation.identifiers[1].timestamp = Some(Timestamp::from_epoch_secs(120));
        let evidence = world.verifier.verifier().revocation_evidence(&presentation, &request, &BTreeMap::new()).unwrap();
        assert_eq!(evidence.status_lists.len(), 1);
        assert_eq!(evidence.status_lists[0].timestamp, Some(Timestamp::from_epoch_secs(100)));
        assert_eq!(evidence.unpublished.len(), 1);
        assert!(!world.verifier.verify_presentation(&presentation, &request).unwrap());
    }
}

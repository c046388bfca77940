//! # Mock Proof Engine
//!
//! A deterministic, transparent stand-in for the AnonCreds CL engine.
//!
//! ## Warning
//!
//! The mock engine is **NOT PRIVATE**. Sub-proofs carry every encoded
//! attribute value and the link secret commitment in the clear, so a
//! verifier learns everything a credential contains. It exists to exercise
//! the orchestration end to end (identifier handling, registry resolution,
//! revocation snapshots, restriction checks, presentation shape). Use a
//! real CL engine for anything else.
//!
//! ## Construction
//!
//! - A credential definition is an Ed25519 key pair. The issuer signs the
//!   JCS bytes of the credential ids, revocation slot, link secret
//!   commitment and encoded values.
//! - The link secret commitment is SHA-256 over canonical `{"link_secret": v}`.
//! - A revocation registry publishes a 32-byte key `z`. Tail `i` is
//!   `SHA-256(z || i_be32)`; the tails file is every tail concatenated.
//! - The accumulator of a snapshot is SHA-256 over canonical
//!   `{accumKey, revocationList}`. The witness of slot `i` binds the
//!   accumulator, `i` and tail `i`.
//! - The aggregated proof binds the verifier nonce to every sub-proof digest.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use rand::RngCore;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use ancr_core::encoding::encoded_as_int32;
use ancr_core::identifier;
use ancr_core::find_attribute;
use ancr_core::{
    is_valid_encoding, sha256_hex, AttributeValue, CanonicalBytes, ContentDigest, Credential,
    CredentialDefinition, CredentialDefinitionPrivate, CredentialOffer, CredentialRequest,
    CredentialRequestMetadata, KeyCorrectnessProof, LinkSecret, NonRevokedInterval,
    NonRevokedIntervalOverride, ObjectKind, PredicateType, Presentation, PresentationIdentifier,
    RequestedProof, RevealedAttribute, RevealedAttributeGroup, RevocationRegistryDefinition,
    RevocationRegistryDefinitionPrivate, RevocationRegistryDefinitionValue, RevocationState,
    RevocationStatusList, Schema, SubProofReferent, Timestamp,
};
use ancr_crypto::hex::{from_hex_fixed, to_hex};
use ancr_crypto::{sha256_concat, sha256_raw, Ed25519KeyPair, Ed25519PublicKey, Ed25519Signature};

use crate::traits::{
    CreatedCredentialDefinition, CreatedRevocationRegistryDefinition, CredentialIssuance,
    EngineError, PresentationInput, ProofEngine, VerificationInput,
};

/// Bytes per tail in a mock tails file.
pub const TAIL_LEN: usize = 32;

/// Transparent proof engine for tests and demos. Stateless.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockProofEngine;

impl MockProofEngine {
    /// Create a mock engine.
    pub fn new() -> Self {
        Self
    }
}

// -- proof wire format ---------------------------------------------------------

#[derive(Serialize)]
struct SignedAttributes<'a> {
    schema_id: &'a str,
    cred_def_id: &'a str,
    rev_reg_id: Option<&'a str>,
    rev_index: Option<u32>,
    commitment: &'a str,
    values: &'a BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PrimaryProof {
    cred_def_id: String,
    schema_id: String,
    rev_reg_id: Option<String>,
    rev_index: Option<u32>,
    commitment: String,
    values: BTreeMap<String, String>,
    issuer_signature: String,
    revealed: Vec<String>,
    predicates: Vec<PredicateStatement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct PredicateStatement {
    attr_name: String,
    p_type: PredicateType,
    value: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct NonRevocationProof {
    accumulator: String,
    index: u32,
    omega: String,
    timestamp: Timestamp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SubProof {
    primary_proof: PrimaryProof,
    non_revoc_proof: Option<NonRevocationProof>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct AggregatedProof {
    nonce_binding: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct MockProof {
    proofs: Vec<SubProof>,
    aggregated_proof: AggregatedProof,
}

impl PrimaryProof {
    fn signed_payload(&self) -> Result<CanonicalBytes, EngineError> {
        signed_attributes(
            &self.schema_id,
            &self.cred_def_id,
            self.rev_reg_id.as_deref(),
            self.rev_index,
            &self.commitment,
            &self.values,
        )
    }

    fn revealed_value_matches(&self, name: &str, raw: &str, encoded: &str) -> bool {
        self.revealed.iter().any(|r| r == name)
            && find_attribute(&self.values, name).map(String::as_str) == Some(encoded)
            && is_valid_encoding(raw, encoded)
    }
}

// -- helpers -------------------------------------------------------------------

fn canonical_hex(value: &impl Serialize) -> Result<String, EngineError> {
    Ok(sha256_hex(&CanonicalBytes::new(value)?))
}

fn random_decimal() -> String {
    rand::random::<u128>().to_string()
}

fn random_bytes32() -> [u8; 32] {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes
}

fn link_secret_commitment(link_secret: &LinkSecret) -> Result<String, EngineError> {
    canonical_hex(&json!({ "link_secret": link_secret.expose() }))
}

fn request_binding(commitment: &str, offer_nonce: &str) -> Result<String, EngineError> {
    canonical_hex(&json!({ "commitment": commitment, "offer_nonce": offer_nonce }))
}

fn signed_attributes(
    schema_id: &str,
    cred_def_id: &str,
    rev_reg_id: Option<&str>,
    rev_index: Option<u32>,
    commitment: &str,
    values: &BTreeMap<String, String>,
) -> Result<CanonicalBytes, EngineError> {
    Ok(CanonicalBytes::new(&SignedAttributes {
        schema_id,
        cred_def_id,
        rev_reg_id,
        rev_index,
        commitment,
        values,
    })?)
}

fn encoded_values(values: &BTreeMap<String, AttributeValue>) -> BTreeMap<String, String> {
    values.iter().map(|(name, v)| (name.clone(), v.encoded.clone())).collect()
}

fn issuer_public_key(definition: &CredentialDefinition) -> Result<Ed25519PublicKey, EngineError> {
    let hex = definition
        .value
        .pointer("/primary/issuer_key")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            EngineError::InvalidInput("credential definition has no primary issuer key".into())
        })?;
    Ok(Ed25519PublicKey::from_hex(hex)?)
}

fn definition_attributes(definition: &CredentialDefinition) -> Result<BTreeSet<String>, EngineError> {
    definition
        .value
        .pointer("/primary/attr_names")
        .and_then(Value::as_array)
        .map(|names| names.iter().filter_map(Value::as_str).map(str::to_string).collect())
        .ok_or_else(|| {
            EngineError::InvalidInput("credential definition has no attribute names".into())
        })
}

fn accumulator_key(definition: &RevocationRegistryDefinition) -> Result<[u8; 32], EngineError> {
    let hex = definition
        .value
        .public_keys
        .pointer("/accumKey/z")
        .and_then(Value::as_str)
        .ok_or_else(|| EngineError::InvalidInput("registry has no accumulator key".into()))?;
    from_hex_fixed::<32>(hex).map_err(|e| EngineError::InvalidInput(format!("accumulator key: {e}")))
}

fn tail(z: &[u8; 32], index: u32) -> ContentDigest {
    sha256_concat(&[z.as_slice(), &index.to_be_bytes()])
}

fn accumulator(
    definition: &RevocationRegistryDefinition,
    revocation_list: &[u8],
) -> Result<String, EngineError> {
    canonical_hex(&json!({
        "accumKey": definition.value.public_keys.get("accumKey"),
        "revocationList": revocation_list,
    }))
}

fn witness_omega(accum: &str, index: u32, tail_hex: &str) -> Result<String, EngineError> {
    canonical_hex(&json!({ "accum": accum, "index": index, "tail": tail_hex }))
}

fn nonce_binding(nonce: &str, proofs: &[SubProof]) -> Result<String, EngineError> {
    let digests = proofs.iter().map(canonical_hex).collect::<Result<Vec<_>, _>>()?;
    canonical_hex(&json!({ "nonce": nonce, "sub_proofs": digests }))
}

fn same_object(kind: ObjectKind, a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }
    match (identifier::to_legacy(kind, a), identifier::to_legacy(kind, b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn attribute<'c>(credential: &'c Credential, name: &str) -> Result<&'c AttributeValue, EngineError> {
    credential.attribute(name).ok_or_else(|| {
        EngineError::InvalidInput(format!(
            "credential of {} has no attribute {name}",
            credential.cred_def_id
        ))
    })
}

fn missing(kind: &'static str, id: impl Into<String>) -> EngineError {
    EngineError::MissingObject { kind, id: id.into() }
}

fn reject(reason: &str) -> bool {
    tracing::debug!(reason, "mock presentation rejected");
    false
}

fn overridden(
    overrides: &[NonRevokedIntervalOverride],
    rev_reg_id: &str,
    from: Timestamp,
    timestamp: Timestamp,
) -> bool {
    overrides.iter().any(|o| {
        o.requested_from_timestamp == from
            && o.override_rev_status_list_timestamp == timestamp
            && same_object(ObjectKind::RevocationRegistryDefinition, &o.rev_reg_def_id, rev_reg_id)
    })
}

/// Referents a sub-proof answers.
fn referents_of(requested_proof: &RequestedProof, index: u32) -> Vec<&str> {
    let revealed = requested_proof
        .revealed_attrs
        .iter()
        .filter(|(_, a)| a.sub_proof_index == index)
        .map(|(r, _)| r.as_str());
    let groups = requested_proof
        .revealed_attr_groups
        .iter()
        .filter(|(_, g)| g.sub_proof_index == index)
        .map(|(r, _)| r.as_str());
    let unrevealed = requested_proof
        .unrevealed_attrs
        .iter()
        .chain(&requested_proof.predicates)
        .filter(|(_, s)| s.sub_proof_index == index)
        .map(|(r, _)| r.as_str());
    revealed.chain(groups).chain(unrevealed).collect()
}

/// Every requested referent is answered, nothing unrequested is, and every
/// sub-proof index is in range.
fn requested_proof_is_complete(
    input: &VerificationInput<'_>,
    sub_proof_count: usize,
) -> bool {
    let request = input.request;
    let proof = &input.presentation.requested_proof;
    let in_range = |index: u32| (index as usize) < sub_proof_count;

    let attributes_answered = request.requested_attributes.keys().all(|referent| {
        proof.revealed_attrs.contains_key(referent)
            || proof.revealed_attr_groups.contains_key(referent)
            || proof.unrevealed_attrs.contains_key(referent)
            || proof.self_attested_attrs.contains_key(referent)
    });
    let predicates_answered =
        request.requested_predicates.keys().all(|r| proof.predicates.contains_key(r));

    let attribute_referents = proof
        .revealed_attrs
        .keys()
        .chain(proof.revealed_attr_groups.keys())
        .chain(proof.unrevealed_attrs.keys())
        .chain(proof.self_attested_attrs.keys());
    let nothing_unrequested = attribute_referents
        .into_iter()
        .all(|r| request.requested_attributes.contains_key(r))
        && proof.predicates.keys().all(|r| request.requested_predicates.contains_key(r));

    let indices_in_range = proof.revealed_attrs.values().all(|a| in_range(a.sub_proof_index))
        && proof.revealed_attr_groups.values().all(|g| in_range(g.sub_proof_index))
        && proof
            .unrevealed_attrs
            .values()
            .chain(proof.predicates.values())
            .all(|s| in_range(s.sub_proof_index));

    attributes_answered && predicates_answered && nothing_unrequested && indices_in_range
}

// -- verification --------------------------------------------------------------

impl MockProofEngine {
    fn verify_sub_proof(
        &self,
        input: &VerificationInput<'_>,
        index: u32,
        sub: &SubProof,
        identifier: &PresentationIdentifier,
    ) -> Result<bool, EngineError> {
        let primary = &sub.primary_proof;
        if primary.cred_def_id != identifier.cred_def_id || primary.schema_id != identifier.schema_id {
            return Ok(reject("sub-proof ids differ from presentation identifiers"));
        }
        let definition = input
            .credential_definitions
            .get(&identifier.cred_def_id)
            .ok_or_else(|| missing("credential definition", &identifier.cred_def_id))?;
        let schema = input
            .schemas
            .get(&identifier.schema_id)
            .ok_or_else(|| missing("schema", &identifier.schema_id))?;

        let key = issuer_public_key(definition)?;
        let Ok(signature) = Ed25519Signature::from_hex(&primary.issuer_signature) else {
            return Ok(reject("malformed issuer signature"));
        };
        if key.verify(&primary.signed_payload()?, &signature).is_err() {
            return Ok(reject("issuer signature"));
        }
        let schema_attributes: BTreeSet<&str> = schema.attr_names.iter().map(String::as_str).collect();
        let signed_attributes: BTreeSet<&str> = primary.values.keys().map(String::as_str).collect();
        if schema_attributes != signed_attributes {
            return Ok(reject("signed attributes differ from schema"));
        }

        if !self.verify_requested_values(input, index, primary) {
            return Ok(false);
        }

        let referents = referents_of(&input.presentation.requested_proof, index);
        let intervals: Vec<&NonRevokedInterval> =
            referents.iter().filter_map(|r| input.request.interval_for(r)).collect();

        match (identifier.timestamp, &sub.non_revoc_proof) {
            (None, None) => {
                if !intervals.is_empty() && primary.rev_reg_id.is_some() {
                    return Ok(reject("non-revocation requested but not proven"));
                }
                Ok(true)
            }
            (Some(timestamp), Some(proof)) => {
                self.verify_non_revocation(input, identifier, primary, proof, timestamp, &intervals)
            }
            _ => Ok(reject("non-revocation proof and identifier timestamp disagree")),
        }
    }

    fn verify_requested_values(
        &self,
        input: &VerificationInput<'_>,
        index: u32,
        primary: &PrimaryProof,
    ) -> bool {
        let request = input.request;
        let proof = &input.presentation.requested_proof;

        for (referent, revealed) in proof.revealed_attrs.iter().filter(|(_, a)| a.sub_proof_index == index) {
            let Some(name) = request.requested_attributes.get(referent).and_then(|a| a.name.as_deref())
            else {
                return reject("revealed referent has no requested name");
            };
            if !primary.revealed_value_matches(name, &revealed.raw, &revealed.encoded) {
                return reject("revealed value");
            }
        }

        for (referent, group) in proof.revealed_attr_groups.iter().filter(|(_, g)| g.sub_proof_index == index) {
            let Some(requested) = request.requested_attributes.get(referent) else {
                return reject("unrequested attribute group");
            };
            let names: BTreeSet<String> = requested.attribute_names().into_iter().collect();
            if names != group.values.keys().cloned().collect::<BTreeSet<_>>() {
                return reject("attribute group names");
            }
            let all_match = group
                .values
                .iter()
                .all(|(name, v)| primary.revealed_value_matches(name, &v.raw, &v.encoded));
            if !all_match {
                return reject("revealed group value");
            }
        }

        for (referent, _) in proof.unrevealed_attrs.iter().filter(|(_, s)| s.sub_proof_index == index) {
            let proven = request
                .requested_attributes
                .get(referent)
                .map(|a| a.attribute_names().iter().all(|n| find_attribute(&primary.values, n).is_some()))
                .unwrap_or(false);
            if !proven {
                return reject("unrevealed attribute");
            }
        }

        for (referent, _) in proof.predicates.iter().filter(|(_, s)| s.sub_proof_index == index) {
            let Some(predicate) = request.requested_predicates.get(referent) else {
                return reject("unrequested predicate");
            };
            let statement = PredicateStatement {
                attr_name: predicate.name.clone(),
                p_type: predicate.p_type,
                value: predicate.p_value,
            };
            if !primary.predicates.contains(&statement) {
                return reject("predicate statement");
            }
            let holds = find_attribute(&primary.values, &predicate.name)
                .and_then(|encoded| encoded_as_int32(encoded))
                .map(|value| predicate.p_type.holds(value, predicate.p_value))
                .unwrap_or(false);
            if !holds {
                return reject("predicate does not hold");
            }
        }
        true
    }

    fn verify_non_revocation(
        &self,
        input: &VerificationInput<'_>,
        identifier: &PresentationIdentifier,
        primary: &PrimaryProof,
        proof: &NonRevocationProof,
        timestamp: Timestamp,
        intervals: &[&NonRevokedInterval],
    ) -> Result<bool, EngineError> {
        let Some(rev_reg_id) = identifier.rev_reg_id.as_deref() else {
            return Ok(reject("timestamp without revocation registry"));
        };
        if primary.rev_reg_id.as_deref() != Some(rev_reg_id)
            || primary.rev_index != Some(proof.index)
            || proof.timestamp != timestamp
        {
            return Ok(reject("non-revocation proof does not match the credential"));
        }
        let definition = input
            .revocation_registry_definitions
            .get(rev_reg_id)
            .ok_or_else(|| missing("revocation registry definition", rev_reg_id))?;
        let list = input
            .revocation_status_lists
            .iter()
            .find(|l| {
                l.timestamp == Some(timestamp)
                    && same_object(ObjectKind::RevocationRegistryDefinition, &l.rev_reg_def_id, rev_reg_id)
            })
            .ok_or_else(|| missing("revocation status list", format!("{rev_reg_id}@{timestamp}")))?;

        if list.current_accumulator != accumulator(definition, &list.revocation_list)?
            || proof.accumulator != list.current_accumulator
        {
            return Ok(reject("accumulator"));
        }
        if proof.index >= definition.max_cred_num() {
            return Ok(reject("revocation index out of range"));
        }
        let z = accumulator_key(definition)?;
        let expected = witness_omega(&proof.accumulator, proof.index, &tail(&z, proof.index).to_hex())?;
        if expected != proof.omega {
            return Ok(reject("witness"));
        }
        if list.is_revoked(proof.index) != Some(false) {
            return Ok(reject("credential revoked at snapshot"));
        }

        for interval in intervals {
            if interval.to.is_some_and(|to| timestamp > to) {
                return Ok(reject("snapshot after interval end"));
            }
            if let Some(from) = interval.from {
                if timestamp < from
                    && !overridden(input.non_revoked_interval_overrides, rev_reg_id, from, timestamp)
                {
                    return Ok(reject("snapshot before interval start"));
                }
            }
        }
        Ok(true)
    }
}

// -- ProofEngine ---------------------------------------------------------------

impl ProofEngine for MockProofEngine {
    fn engine_name(&self) -> &str {
        "mock"
    }

    fn create_link_secret(&self) -> Result<LinkSecret, EngineError> {
        Ok(LinkSecret::new(random_decimal()))
    }

    fn create_credential_definition(
        &self,
        schema_id: &str,
        schema: &Schema,
        issuer_id: &str,
        tag: &str,
        support_revocation: bool,
    ) -> Result<CreatedCredentialDefinition, EngineError> {
        if schema.attr_names.is_empty() {
            return Err(EngineError::InvalidInput(format!("schema {schema_id} has no attributes")));
        }
        let key_pair = Ed25519KeyPair::generate();
        let issuer_key = key_pair.public_key().to_hex();
        let revocation = if support_revocation {
            json!({ "accum_pub": issuer_key })
        } else {
            Value::Null
        };
        let definition = CredentialDefinition {
            issuer_id: issuer_id.to_string(),
            schema_id: schema_id.to_string(),
            signature_type: "CL".to_string(),
            tag: tag.to_string(),
            value: json!({
                "primary": { "issuer_key": issuer_key, "attr_names": schema.attr_names },
                "revocation": revocation,
            }),
        };
        tracing::debug!(schema_id, tag, support_revocation, "mock credential definition created");
        Ok(CreatedCredentialDefinition {
            definition,
            private: CredentialDefinitionPrivate {
                value: json!({ "issuer_seed": key_pair.seed_hex() }),
            },
            key_correctness_proof: KeyCorrectnessProof(json!({
                "issuer_key": issuer_key,
                "schema_id": schema_id,
            })),
        })
    }

    fn create_revocation_registry_definition(
        &self,
        credential_definition: &CredentialDefinition,
        cred_def_id: &str,
        tag: &str,
        max_cred_num: u32,
        tails_directory: &Path,
    ) -> Result<CreatedRevocationRegistryDefinition, EngineError> {
        if !credential_definition.supports_revocation() {
            return Err(EngineError::InvalidInput(format!(
                "credential definition {cred_def_id} does not support revocation"
            )));
        }
        if max_cred_num == 0 {
            return Err(EngineError::InvalidInput("max_cred_num must be positive".into()));
        }

        let z = random_bytes32();
        let mut tails = Vec::with_capacity(max_cred_num as usize * TAIL_LEN);
        for index in 0..max_cred_num {
            tails.extend_from_slice(tail(&z, index).as_bytes());
        }
        let tails_hash = sha256_raw(&tails).to_hex();
        std::fs::create_dir_all(tails_directory)?;
        let tails_path = tails_directory.join(&tails_hash);
        std::fs::write(&tails_path, &tails)?;
        tracing::debug!(cred_def_id, tag, max_cred_num, tails = %tails_path.display(), "mock tails file written");

        Ok(CreatedRevocationRegistryDefinition {
            definition: RevocationRegistryDefinition {
                issuer_id: credential_definition.issuer_id.clone(),
                revoc_def_type: "CL_ACCUM".to_string(),
                cred_def_id: cred_def_id.to_string(),
                tag: tag.to_string(),
                value: RevocationRegistryDefinitionValue {
                    public_keys: json!({ "accumKey": { "z": to_hex(&z) } }),
                    max_cred_num,
                    tails_location: tails_path.display().to_string(),
                    tails_hash,
                },
            },
            private: RevocationRegistryDefinitionPrivate {
                value: json!({ "gamma": to_hex(&random_bytes32()) }),
            },
            tails_path,
        })
    }

    fn create_revocation_status_list(
        &self,
        rev_reg_def_id: &str,
        definition: &RevocationRegistryDefinition,
        timestamp: Option<Timestamp>,
        issuance_by_default: bool,
    ) -> Result<RevocationStatusList, EngineError> {
        let initial = if issuance_by_default { 0 } else { 1 };
        let revocation_list = vec![initial; definition.max_cred_num() as usize];
        Ok(RevocationStatusList {
            issuer_id: definition.issuer_id.clone(),
            rev_reg_def_id: rev_reg_def_id.to_string(),
            current_accumulator: accumulator(definition, &revocation_list)?,
            revocation_list,
            timestamp,
        })
    }

    fn update_revocation_status_list(
        &self,
        definition: &RevocationRegistryDefinition,
        previous: &RevocationStatusList,
        issued: &[u32],
        revoked: &[u32],
        timestamp: Option<Timestamp>,
    ) -> Result<RevocationStatusList, EngineError> {
        let mut revocation_list = previous.revocation_list.clone();
        for (indices, bit) in [(issued, 0u8), (revoked, 1u8)] {
            for &index in indices {
                let slot = revocation_list.get_mut(index as usize).ok_or_else(|| {
                    EngineError::InvalidInput(format!(
                        "index {index} outside registry {} of size {}",
                        previous.rev_reg_def_id,
                        definition.max_cred_num()
                    ))
                })?;
                *slot = bit;
            }
        }
        Ok(RevocationStatusList {
            issuer_id: previous.issuer_id.clone(),
            rev_reg_def_id: previous.rev_reg_def_id.clone(),
            current_accumulator: accumulator(definition, &revocation_list)?,
            revocation_list,
            timestamp,
        })
    }

    fn create_credential_offer(
        &self,
        schema_id: &str,
        cred_def_id: &str,
        key_correctness_proof: &KeyCorrectnessProof,
    ) -> Result<CredentialOffer, EngineError> {
        Ok(CredentialOffer {
            schema_id: schema_id.to_string(),
            cred_def_id: cred_def_id.to_string(),
            key_correctness_proof: key_correctness_proof.0.clone(),
            nonce: random_decimal(),
        })
    }

    fn create_credential_request(
        &self,
        offer: &CredentialOffer,
        definition: &CredentialDefinition,
        link_secret: &LinkSecret,
        link_secret_id: &str,
    ) -> Result<(CredentialRequest, CredentialRequestMetadata), EngineError> {
        if offer.key_correctness_proof.get("issuer_key") != definition.value.pointer("/primary/issuer_key") {
            return Err(EngineError::InvalidInput(format!(
                "key correctness proof of offer does not match {}",
                offer.cred_def_id
            )));
        }
        let commitment = link_secret_commitment(link_secret)?;
        let nonce = random_decimal();
        let request = CredentialRequest {
            entropy: random_decimal(),
            cred_def_id: offer.cred_def_id.clone(),
            blinded_ms: json!({ "commitment": commitment }),
            blinded_ms_correctness_proof: json!({
                "binding": request_binding(&commitment, &offer.nonce)?
            }),
            nonce: nonce.clone(),
        };
        let metadata = CredentialRequestMetadata {
            link_secret_blinding_data: json!({ "commitment": commitment }),
            nonce,
            link_secret_name: link_secret_id.to_string(),
        };
        Ok((request, metadata))
    }

    fn create_credential(&self, issuance: CredentialIssuance<'_>) -> Result<Credential, EngineError> {
        let CredentialIssuance { definition, private, offer, request, values, revocation } = issuance;
        if request.cred_def_id != offer.cred_def_id {
            return Err(EngineError::InvalidInput(format!(
                "request for {} answers an offer for {}",
                request.cred_def_id, offer.cred_def_id
            )));
        }
        let commitment = request
            .blinded_ms
            .get("commitment")
            .and_then(Value::as_str)
            .ok_or_else(|| EngineError::InvalidInput("request has no link secret commitment".into()))?;
        let binding = request_binding(commitment, &offer.nonce)?;
        if request.blinded_ms_correctness_proof.get("binding").and_then(Value::as_str) != Some(binding.as_str()) {
            return Err(EngineError::InvalidInput("credential request is not bound to this offer".into()));
        }

        let expected = definition_attributes(definition)?;
        let given: BTreeSet<String> = values.keys().cloned().collect();
        if expected != given {
            return Err(EngineError::InvalidInput(format!(
                "attribute values {given:?} do not match definition attributes {expected:?}"
            )));
        }

        let seed = private
            .value
            .get("issuer_seed")
            .and_then(Value::as_str)
            .ok_or_else(|| EngineError::InvalidInput("private material has no issuer seed".into()))?;
        let key_pair = Ed25519KeyPair::from_seed_hex(seed)?;
        if key_pair.public_key() != issuer_public_key(definition)? {
            return Err(EngineError::InvalidInput(
                "private material does not belong to this credential definition".into(),
            ));
        }

        let (rev_reg_id, rev_index, rev_reg, witness) = match revocation {
            Some(config) => {
                if !definition.supports_revocation() {
                    return Err(EngineError::InvalidInput(format!(
                        "credential definition {} does not support revocation",
                        offer.cred_def_id
                    )));
                }
                if config.index >= config.definition.max_cred_num() {
                    return Err(EngineError::InvalidInput(format!(
                        "revocation index {} outside registry of size {}",
                        config.index,
                        config.definition.max_cred_num()
                    )));
                }
                (
                    Some(config.rev_reg_def_id.to_string()),
                    Some(config.index),
                    Some(json!({ "accum": config.status_list.current_accumulator })),
                    Some(json!({ "index": config.index })),
                )
            }
            None => (None, None, None, None),
        };

        let attributes: BTreeMap<String, AttributeValue> = values
            .iter()
            .map(|(name, raw)| (name.clone(), AttributeValue::from_raw(raw.clone())))
            .collect();
        let payload = signed_attributes(
            &offer.schema_id,
            &offer.cred_def_id,
            rev_reg_id.as_deref(),
            rev_index,
            commitment,
            &encoded_values(&attributes),
        )?;
        let signature = key_pair.sign(&payload);

        Ok(Credential {
            schema_id: offer.schema_id.clone(),
            cred_def_id: offer.cred_def_id.clone(),
            rev_reg_id,
            values: attributes,
            signature: json!({
                "issuer_signature": signature.to_hex(),
                "commitment": commitment,
                "rev_index": rev_index,
            }),
            signature_correctness_proof: json!({ "issuer_key": key_pair.public_key().to_hex() }),
            rev_reg,
            witness,
        })
    }

    fn process_credential(
        &self,
        credential: Credential,
        metadata: &CredentialRequestMetadata,
        link_secret: &LinkSecret,
        definition: &CredentialDefinition,
        revocation_registry: Option<&RevocationRegistryDefinition>,
    ) -> Result<Credential, EngineError> {
        let expected = link_secret_commitment(link_secret)?;
        let blinded = metadata.link_secret_blinding_data.get("commitment").and_then(Value::as_str);
        if blinded != Some(expected.as_str()) || self.credential_link_secret_commitment(&credential)? != expected {
            return Err(EngineError::LinkSecretMismatch { cred_def_id: credential.cred_def_id });
        }
        match (&credential.rev_reg_id, revocation_registry) {
            (Some(id), None) => return Err(missing("revocation registry definition", id)),
            (None, Some(_)) => {
                return Err(EngineError::InvalidInput(
                    "revocation registry supplied for a non-revocable credential".into(),
                ))
            }
            _ => {}
        }
        if let Some((name, _)) = credential.values.iter().find(|(_, v)| !is_valid_encoding(&v.raw, &v.encoded)) {
            return Err(EngineError::InvalidInput(format!("attribute {name} is not encoded correctly")));
        }

        let signature_hex = credential
            .signature
            .get("issuer_signature")
            .and_then(Value::as_str)
            .ok_or_else(|| EngineError::InvalidInput("credential has no issuer signature".into()))?;
        let signature = Ed25519Signature::from_hex(signature_hex)?;
        let payload = signed_attributes(
            &credential.schema_id,
            &credential.cred_def_id,
            credential.rev_reg_id.as_deref(),
            self.credential_revocation_index(&credential)?,
            &expected,
            &encoded_values(&credential.values),
        )?;
        issuer_public_key(definition)?.verify(&payload, &signature)?;
        Ok(credential)
    }

    fn credential_revocation_index(&self, credential: &Credential) -> Result<Option<u32>, EngineError> {
        match credential.signature.get("rev_index") {
            None | Some(Value::Null) => Ok(None),
            Some(value) => value
                .as_u64()
                .and_then(|n| u32::try_from(n).ok())
                .map(Some)
                .ok_or_else(|| EngineError::InvalidInput(format!("malformed revocation index {value}"))),
        }
    }

    fn credential_link_secret_commitment(&self, credential: &Credential) -> Result<String, EngineError> {
        credential
            .signature
            .get("commitment")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| EngineError::InvalidInput("credential has no link secret commitment".into()))
    }

    fn create_revocation_state(
        &self,
        definition: &RevocationRegistryDefinition,
        status_list: &RevocationStatusList,
        index: u32,
        tails_path: &Path,
    ) -> Result<RevocationState, EngineError> {
        let max = definition.max_cred_num();
        if index >= max {
            return Err(EngineError::InvalidInput(format!("index {index} outside registry of size {max}")));
        }
        if status_list.revocation_list.len() != max as usize {
            return Err(EngineError::InvalidInput(format!(
                "status list has {} entries, registry has {max}",
                status_list.revocation_list.len()
            )));
        }
        let timestamp = status_list
            .timestamp
            .ok_or_else(|| EngineError::InvalidInput("status list snapshot has no timestamp".into()))?;

        let tails = std::fs::read(tails_path)?;
        let actual = sha256_raw(&tails).to_hex();
        if actual != definition.tails_hash() {
            return Err(EngineError::Tails {
                path: tails_path.display().to_string(),
                reason: format!("hash {actual}, expected {}", definition.tails_hash()),
            });
        }
        if tails.len() != max as usize * TAIL_LEN {
            return Err(EngineError::Tails {
                path: tails_path.display().to_string(),
                reason: format!("{} bytes for {max} tails", tails.len()),
            });
        }
        let start = index as usize * TAIL_LEN;
        let tail_hex = to_hex(&tails[start..start + TAIL_LEN]);
        let omega = witness_omega(&status_list.current_accumulator, index, &tail_hex)?;
        Ok(RevocationState {
            witness: json!({ "index": index, "tail": tail_hex, "omega": omega }),
            rev_reg: json!({ "accum": status_list.current_accumulator }),
            timestamp,
        })
    }

    fn create_presentation(&self, input: PresentationInput<'_>) -> Result<Presentation, EngineError> {
        let request = input.request;
        let commitment = link_secret_commitment(input.link_secret)?;
        if let Some(prove) = input.credentials_prove.iter().find(|p| p.entry_index >= input.credentials.len()) {
            return Err(EngineError::InvalidInput(format!(
                "referent {} points at missing entry {}",
                prove.referent, prove.entry_index
            )));
        }

        let mut requested_proof = RequestedProof::default();
        let mut proofs = Vec::with_capacity(input.credentials.len());
        let mut identifiers = Vec::with_capacity(input.credentials.len());

        for (entry_index, entry) in input.credentials.iter().enumerate() {
            let credential = entry.credential;
            let sub_proof_index = u32::try_from(entry_index)
                .map_err(|_| EngineError::InvalidInput("too many credential entries".into()))?;
            let credential_commitment = self.credential_link_secret_commitment(credential)?;
            if credential_commitment != commitment {
                return Err(EngineError::LinkSecretMismatch { cred_def_id: credential.cred_def_id.clone() });
            }
            if !input.credential_definitions.contains_key(&credential.cred_def_id) {
                return Err(missing("credential definition", &credential.cred_def_id));
            }
            if !input.schemas.contains_key(&credential.schema_id) {
                return Err(missing("schema", &credential.schema_id));
            }

            let mut revealed = BTreeSet::new();
            let mut predicates = Vec::new();
            for prove in input.credentials_prove.iter().filter(|p| p.entry_index == entry_index) {
                let referent = prove.referent.clone();
                if prove.is_predicate {
                    let predicate = request.requested_predicates.get(&referent).ok_or_else(|| {
                        EngineError::InvalidInput(format!("unknown predicate referent {referent}"))
                    })?;
                    let value = attribute(credential, &predicate.name)?;
                    let satisfied = encoded_as_int32(&value.encoded)
                        .map(|v| predicate.p_type.holds(v, predicate.p_value))
                        .unwrap_or(false);
                    if !satisfied {
                        return Err(EngineError::PredicateUnsatisfied {
                            referent,
                            attr_name: predicate.name.clone(),
                            p_type: predicate.p_type,
                            p_value: predicate.p_value,
                        });
                    }
                    predicates.push(PredicateStatement {
                        attr_name: predicate.name.clone(),
                        p_type: predicate.p_type,
                        value: predicate.p_value,
                    });
                    requested_proof.predicates.insert(referent, SubProofReferent { sub_proof_index });
                    continue;
                }

                let requested = request.requested_attributes.get(&referent).ok_or_else(|| {
                    EngineError::InvalidInput(format!("unknown attribute referent {referent}"))
                })?;
                let names = requested.attribute_names();
                if names.is_empty() {
                    return Err(EngineError::InvalidInput(format!("referent {referent} names no attribute")));
                }
                if requested.names.is_some() {
                    let mut values = BTreeMap::new();
                    for name in &names {
                        values.insert(name.clone(), attribute(credential, name)?.clone());
                        revealed.insert(name.clone());
                    }
                    requested_proof
                        .revealed_attr_groups
                        .insert(referent, RevealedAttributeGroup { sub_proof_index, values });
                } else if prove.reveal {
                    let value = attribute(credential, &names[0])?;
                    revealed.insert(names[0].clone());
                    requested_proof.revealed_attrs.insert(
                        referent,
                        RevealedAttribute {
                            sub_proof_index,
                            raw: value.raw.clone(),
                            encoded: value.encoded.clone(),
                        },
                    );
                } else {
                    attribute(credential, &names[0])?;
                    requested_proof.unrevealed_attrs.insert(referent, SubProofReferent { sub_proof_index });
                }
            }

            let rev_index = self.credential_revocation_index(credential)?;
            let (non_revoc_proof, rev_reg_id, timestamp) = match entry.revocation_state {
                Some(state) => {
                    let rev_reg_id = credential.rev_reg_id.clone().ok_or_else(|| {
                        EngineError::InvalidInput(format!(
                            "credential of {} is not revocable",
                            credential.cred_def_id
                        ))
                    })?;
                    let index = rev_index.ok_or_else(|| {
                        EngineError::InvalidInput("revocable credential has no revocation index".into())
                    })?;
                    if entry.timestamp.is_some_and(|t| t != state.timestamp) {
                        return Err(EngineError::InvalidInput(
                            "entry timestamp differs from its revocation state".into(),
                        ));
                    }
                    if state.witness.get("index").and_then(Value::as_u64) != Some(u64::from(index)) {
                        return Err(EngineError::InvalidInput(
                            "revocation state belongs to a different slot".into(),
                        ));
                    }
                    let accumulator = state.rev_reg.get("accum").and_then(Value::as_str);
                    let omega = state.witness.get("omega").and_then(Value::as_str);
                    let (Some(accumulator), Some(omega)) = (accumulator, omega) else {
                        return Err(EngineError::InvalidInput("malformed revocation state".into()));
                    };
                    let proof = NonRevocationProof {
                        accumulator: accumulator.to_string(),
                        index,
                        omega: omega.to_string(),
                        timestamp: state.timestamp,
                    };
                    (Some(proof), Some(rev_reg_id), Some(state.timestamp))
                }
                None => (None, None, None),
            };

            let issuer_signature = credential
                .signature
                .get("issuer_signature")
                .and_then(Value::as_str)
                .ok_or_else(|| EngineError::InvalidInput("credential has no issuer signature".into()))?;
            proofs.push(SubProof {
                primary_proof: PrimaryProof {
                    cred_def_id: credential.cred_def_id.clone(),
                    schema_id: credential.schema_id.clone(),
                    rev_reg_id: credential.rev_reg_id.clone(),
                    rev_index,
                    commitment: credential_commitment,
                    values: encoded_values(&credential.values),
                    issuer_signature: issuer_signature.to_string(),
                    revealed: revealed.into_iter().collect(),
                    predicates,
                },
                non_revoc_proof,
            });
            identifiers.push(PresentationIdentifier {
                schema_id: credential.schema_id.clone(),
                cred_def_id: credential.cred_def_id.clone(),
                rev_reg_id,
                timestamp,
            });
        }

        for (referent, value) in input.self_attested {
            if !request.requested_attributes.contains_key(referent) {
                return Err(EngineError::InvalidInput(format!(
                    "self-attested referent {referent} was not requested"
                )));
            }
            requested_proof.self_attested_attrs.insert(referent.clone(), value.clone());
        }

        let unanswered = request
            .requested_attributes
            .keys()
            .filter(|r| {
                !requested_proof.revealed_attrs.contains_key(*r)
                    && !requested_proof.revealed_attr_groups.contains_key(*r)
                    && !requested_proof.unrevealed_attrs.contains_key(*r)
                    && !requested_proof.self_attested_attrs.contains_key(*r)
            })
            .chain(request.requested_predicates.keys().filter(|r| !requested_proof.predicates.contains_key(*r)))
            .next();
        if let Some(referent) = unanswered {
            return Err(EngineError::InvalidInput(format!("referent {referent} is not answered")));
        }

        let aggregated_proof = AggregatedProof { nonce_binding: nonce_binding(&request.nonce, &proofs)? };
        let proof = serde_json::to_value(MockProof { proofs, aggregated_proof })?;
        tracing::debug!(sub_proofs = identifiers.len(), "mock presentation created");
        Ok(Presentation { proof, requested_proof, identifiers })
    }

    fn verify_presentation(&self, input: VerificationInput<'_>) -> Result<bool, EngineError> {
        let presentation = input.presentation;
        let proof: MockProof = match serde_json::from_value(presentation.proof.clone()) {
            Ok(proof) => proof,
            Err(e) => {
                tracing::debug!(error = %e, "proof is not a mock proof");
                return Ok(false);
            }
        };
        if proof.proofs.len() != presentation.identifiers.len() {
            return Ok(reject("sub-proof count differs from identifier count"));
        }
        if proof.aggregated_proof.nonce_binding != nonce_binding(&input.request.nonce, &proof.proofs)? {
            return Ok(reject("nonce binding"));
        }
        let commitments: BTreeSet<&str> =
            proof.proofs.iter().map(|p| p.primary_proof.commitment.as_str()).collect();
        if commitments.len() > 1 {
            return Ok(reject("sub-proofs bound to different link secrets"));
        }
        if !requested_proof_is_complete(&input, proof.proofs.len()) {
            return Ok(reject("requested proof does not answer the request"));
        }

        for (index, (sub, identifier)) in proof.proofs.iter().zip(&presentation.identifiers).enumerate() {
            let index = u32::try_from(index).map_err(|_| EngineError::InvalidInput("too many sub-proofs".into()))?;
            if !self.verify_sub_proof(&input, index, sub, identifier)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

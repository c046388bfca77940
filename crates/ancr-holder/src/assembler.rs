//! # Proof Assembler
//!
//! Turns the holder's credential selection into a presentation in one
//! linear pass:
//!
//! 1. Walk the selection, attributes first, then predicates, giving every
//!    referent its own zero-based credential entry, and load each selected
//!    credential from the store.
//! 2. Check that every loaded credential is bound to the same link secret.
//!    This happens before the proof engine sees anything.
//! 3. For revocable credentials whose referent carries a `non_revoked`
//!    interval, reconstruct the revocation state at the interval's `to`.
//!    Each `(registry, slot, interval)` is reconstructed once.
//! 4. Hand entries, the referent mapping, self-attested values and the link
//!    secret to the proof engine.
//!
//! Any failure aborts the whole assembly; there is no partial presentation.

use std::collections::BTreeMap;
use std::sync::Arc;

use ancr_core::{
    CredentialDefinition, NonRevokedIntervalOverride, Presentation, ProofRequest,
    RevocationState, Schema, SelectedCredentials, Timestamp,
};
use ancr_engine::{CredentialProve, PresentationCredential, PresentationInput, ProofEngine};
use ancr_query::{CredentialRecord, CredentialStore, StoreError};
use ancr_revocation::{IntervalReconstruction, RevocationStateReconstructor};

use crate::error::HolderError;
use crate::link_secret::LinkSecretStore;

/// A presentation and what went into it.
#[derive(Debug, Clone)]
pub struct AssembledPresentation {
    /// The presentation.
    pub presentation: Presentation,
    /// The selection, with each revocable entry's `timestamp` set to the
    /// snapshot its non-revocation proof used.
    pub selected_credentials: SelectedCredentials,
    /// Overrides for snapshots that predate the requested `from`.
    pub interval_overrides: Vec<NonRevokedIntervalOverride>,
}

struct Entry {
    referent: String,
    record: CredentialRecord,
    is_predicate: bool,
    reveal: bool,
    timestamp: Option<Timestamp>,
    revocation_state: Option<RevocationState>,
}

/// Builds presentations from stored credentials.
#[derive(Clone)]
pub struct ProofAssembler {
    store: Arc<dyn CredentialStore>,
    link_secrets: LinkSecretStore,
    reconstructor: RevocationStateReconstructor,
    engine: Arc<dyn ProofEngine>,
}

impl std::fmt::Debug for ProofAssembler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProofAssembler")
            .field("link_secrets", &self.link_secrets)
            .field("reconstructor", &self.reconstructor)
            .field("engine", &self.engine.engine_name())
            .finish()
    }
}

impl ProofAssembler {
    /// An assembler over `store` and `link_secrets`.
    pub fn new(
        store: Arc<dyn CredentialStore>,
        link_secrets: LinkSecretStore,
        reconstructor: RevocationStateReconstructor,
        engine: Arc<dyn ProofEngine>,
    ) -> Self {
        Self { store, link_secrets, reconstructor, engine }
    }

    fn load(&self, credential_id: &str, referent: &str) -> Result<CredentialRecord, HolderError> {
        self.store.get(credential_id).map_err(|err| match err {
            StoreError::NotFound(_) => HolderError::CredentialNotFound {
                credential_id: credential_id.to_string(),
                referent: referent.to_string(),
            },
            other => HolderError::Store(other),
        })
    }

    fn entries(&self, selected: &SelectedCredentials) -> Result<Vec<Entry>, HolderError> {
        let mut entries = Vec::with_capacity(selected.attributes.len() + selected.predicates.len());
        for (referent, attribute) in &selected.attributes {
            entries.push(Entry {
                referent: referent.clone(),
                record: self.load(&attribute.credential_id, referent)?,
                is_predicate: false,
                reveal: attribute.revealed,
                timestamp: attribute.timestamp,
                revocation_state: None,
            });
        }
        for (referent, predicate) in &selected.predicates {
            entries.push(Entry {
                referent: referent.clone(),
                record: self.load(&predicate.credential_id, referent)?,
                is_predicate: true,
                reveal: true,
                timestamp: predicate.timestamp,
                revocation_state: None,
            });
        }
        Ok(entries)
    }

    /// The single link secret id of `entries`.
    fn common_link_secret(entries: &[Entry]) -> Result<Option<String>, HolderError> {
        let Some(first) = entries.first() else {
            return Ok(None);
        };
        let expected = &first.record.link_secret_id;
        if let Some(other) = entries.iter().find(|e| &e.record.link_secret_id != expected) {
            tracing::warn!(
                expected = %expected,
                found = %other.record.link_secret_id,
                credential_id = %other.record.credential_id,
                "selected credentials use different link secrets"
            );
            return Err(HolderError::InconsistentLinkSecret {
                expected: expected.clone(),
                found: other.record.link_secret_id.clone(),
                credential_id: other.record.credential_id.clone(),
            });
        }
        Ok(Some(expected.clone()))
    }

    fn revocation_index(&self, record: &CredentialRecord) -> Result<Option<u32>, HolderError> {
        match record.revocation_index {
            Some(index) => Ok(Some(index)),
            None if record.credential.rev_reg_id.is_some() => {
                Ok(self.engine.credential_revocation_index(&record.credential)?)
            }
            None => Ok(None),
        }
    }

    /// Attach revocation state to every revocable entry whose referent asks
    /// for non-revocation.
    fn prepare_revocation(
        &self,
        request: &ProofRequest,
        entries: &mut [Entry],
    ) -> Result<Vec<NonRevokedIntervalOverride>, HolderError> {
        type Key = (String, u32, Option<Timestamp>, Option<Timestamp>);
        let mut reconstructed: BTreeMap<Key, IntervalReconstruction> = BTreeMap::new();
        let mut overrides = Vec::new();
        for entry in entries.iter_mut() {
            let Some(interval) = request.interval_for(&entry.referent).copied() else {
                continue;
            };
            let Some(rev_reg_def_id) = entry.record.credential.rev_reg_id.clone() else {
                continue;
            };
            let credential_id = entry.record.credential_id.clone();
            let Some(index) = self.revocation_index(&entry.record)? else {
                return Err(HolderError::RevocationRegistryNotFound {
                    rev_reg_def_id,
                    credential_id,
                    message: "credential has no revocation index".into(),
                });
            };

            let key = (rev_reg_def_id.clone(), index, interval.from, interval.to);
            let reconstruction = match reconstructed.get(&key) {
                Some(done) => done.clone(),
                None => {
                    let done = self
                        .reconstructor
                        .reconstruct_for_interval(&rev_reg_def_id, index, &interval)
                        .map_err(|err| HolderError::from_revocation(err, &credential_id, &entry.referent))?;
                    if let Some(token) = &done.interval_override {
                        if !overrides.contains(token) {
                            overrides.push(token.clone());
                        }
                    }
                    reconstructed.insert(key, done.clone());
                    done
                }
            };
            entry.timestamp = Some(reconstruction.state.timestamp());
            entry.revocation_state = Some(reconstruction.state.revocation_state);
        }
        Ok(overrides)
    }

    /// Assemble a presentation answering `request` with `selected`.
    ///
    /// `schemas` and `credential_definitions` are keyed by the identifiers
    /// the selected credentials reference.
    pub fn assemble(
        &self,
        request: &ProofRequest,
        selected: &SelectedCredentials,
        schemas: &BTreeMap<String, Schema>,
        credential_definitions: &BTreeMap<String, CredentialDefinition>,
    ) -> Result<AssembledPresentation, HolderError> {
        let mut entries = self.entries(selected)?;
        let link_secret_id = match Self::common_link_secret(&entries)? {
            Some(id) => id,
            None => self.link_secrets.resolve_id(None)?,
        };
        let link_secret = self.link_secrets.get(&link_secret_id)?;
        let interval_overrides = self.prepare_revocation(request, &mut entries)?;

        let credentials: Vec<PresentationCredential<'_>> = entries
            .iter()
            .map(|entry| PresentationCredential {
                credential: &entry.record.credential,
                timestamp: entry.revocation_state.as_ref().and(entry.timestamp),
                revocation_state: entry.revocation_state.as_ref(),
            })
            .collect();
        let credentials_prove: Vec<CredentialProve> = entries
            .iter()
            .enumerate()
            .map(|(entry_index, entry)| CredentialProve {
                entry_index,
                referent: entry.referent.clone(),
                is_predicate: entry.is_predicate,
                reveal: entry.reveal,
            })
            .collect();

        let presentation = self.engine.create_presentation(PresentationInput {
            request,
            credentials: &credentials,
            credentials_prove: &credentials_prove,
            self_attested: &selected.self_attested_attributes,
            link_secret: &link_secret,
            schemas,
            credential_definitions,
        })?;

        let mut selected_credentials = selected.clone();
        for entry in &entries {
            let timestamp = entry.revocation_state.as_ref().and(entry.timestamp);
            if entry.is_predicate {
                if let Some(predicate) = selected_credentials.predicates.get_mut(&entry.referent) {
                    predicate.timestamp = timestamp;
                }
            } else if let Some(attribute) = selected_credentials.attributes.get_mut(&entry.referent) {
                attribute.timestamp = timestamp;
            }
        }
        tracing::info!(
            nonce = %request.nonce,
            entries = entries.len(),
            overrides = interval_overrides.len(),
            "presentation assembled"
        );
        Ok(AssembledPresentation { presentation, selected_credentials, interval_overrides })
    }
}

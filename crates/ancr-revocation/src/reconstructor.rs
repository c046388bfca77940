//! # Revocation State Reconstructor
//!
//! Rebuilds what is needed to prove or check non-revocation of one
//! credential slot at one point in time:
//!
//! 1. resolve the revocation registry definition,
//! 2. fetch its tails file through [`TailsStorage`],
//! 3. resolve the status list snapshot current as of the requested time
//!    (the latest snapshot with `timestamp <= requested`),
//! 4. have the proof engine build the witness for the slot.
//!
//! Holders call [`RevocationStateReconstructor::reconstruct_for_interval`]
//! with a request's `non_revoked` interval; verifiers resolve definitions
//! and snapshots for the timestamps a presentation claims and ask for
//! [`RevocationStateReconstructor::verifier_override`] when a claimed
//! snapshot predates the requested `from`.

use std::sync::Arc;

use ancr_core::{
    NonRevokedInterval, NonRevokedIntervalOverride, OrchestrationConfig,
    RevocationRegistryDefinition, RevocationState, RevocationStatusList, Timestamp,
};
use ancr_engine::ProofEngine;
use ancr_registry::RegistryService;

use crate::error::RevocationError;
use crate::interval::{assert_best_practice_interval, CheckedInterval};
use crate::status::is_revoked;
use crate::tails::TailsStorage;

/// Witness and the registry data it was built from.
#[derive(Debug, Clone)]
pub struct ReconstructedState {
    /// Registry identifier as requested.
    pub rev_reg_def_id: String,
    /// Registry definition.
    pub definition: RevocationRegistryDefinition,
    /// Snapshot the witness was built against.
    pub status_list: RevocationStatusList,
    /// The witness.
    pub revocation_state: RevocationState,
}

impl ReconstructedState {
    /// Timestamp of the snapshot used.
    pub fn timestamp(&self) -> Timestamp {
        self.revocation_state.timestamp
    }
}

/// Result of reconstructing against a `non_revoked` interval.
#[derive(Debug, Clone)]
pub struct IntervalReconstruction {
    /// The interval after the best-practice check.
    pub interval: CheckedInterval,
    /// State built at the interval's `to`.
    pub state: ReconstructedState,
    /// Set when the snapshot used predates `from`.
    pub interval_override: Option<NonRevokedIntervalOverride>,
}

/// Reconstructs revocation state from registry and tails data.
#[derive(Clone)]
pub struct RevocationStateReconstructor {
    registries: RegistryService,
    tails: Arc<dyn TailsStorage>,
    engine: Arc<dyn ProofEngine>,
    max_interval_secs: u64,
}

impl std::fmt::Debug for RevocationStateReconstructor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RevocationStateReconstructor")
            .field("registries", &self.registries)
            .field("engine", &self.engine.engine_name())
            .field("max_interval_secs", &self.max_interval_secs)
            .finish()
    }
}

impl RevocationStateReconstructor {
    /// A reconstructor with the strict interval policy (`from == to`).
    pub fn new(
        registries: RegistryService,
        tails: Arc<dyn TailsStorage>,
        engine: Arc<dyn ProofEngine>,
    ) -> Self {
        Self { registries, tails, engine, max_interval_secs: 0 }
    }

    /// A reconstructor using the interval policy from `config`.
    pub fn from_config(
        registries: RegistryService,
        tails: Arc<dyn TailsStorage>,
        engine: Arc<dyn ProofEngine>,
        config: &OrchestrationConfig,
    ) -> Self {
        Self::new(registries, tails, engine).with_max_interval_secs(config.max_revocation_interval_secs)
    }

    /// Accept intervals up to `secs` wide.
    pub fn with_max_interval_secs(mut self, secs: u64) -> Self {
        self.max_interval_secs = secs;
        self
    }

    /// The resolution layer in use.
    pub fn registries(&self) -> &RegistryService {
        &self.registries
    }

    /// Apply the best-practice check with this reconstructor's policy.
    pub fn check_interval(&self, interval: &NonRevokedInterval) -> Result<CheckedInterval, RevocationError> {
        assert_best_practice_interval(interval, self.max_interval_secs)
    }

    /// Resolve a revocation registry definition.
    pub fn definition(&self, rev_reg_def_id: &str) -> Result<RevocationRegistryDefinition, RevocationError> {
        self.registries
            .get_revocation_registry_definition(rev_reg_def_id)
            .into_result()
            .map_err(|failure| RevocationError::RevocationRegistryNotFound {
                rev_reg_def_id: rev_reg_def_id.to_string(),
                message: failure.message,
            })
    }

    /// Resolve the snapshot current as of `timestamp`.
    pub fn status_list_at(
        &self,
        rev_reg_def_id: &str,
        timestamp: Timestamp,
    ) -> Result<RevocationStatusList, RevocationError> {
        let list = self
            .registries
            .get_revocation_status_list(rev_reg_def_id, timestamp)
            .into_result()
            .map_err(|failure| RevocationError::StatusListNotFound {
                rev_reg_def_id: rev_reg_def_id.to_string(),
                timestamp,
                message: failure.message,
            })?;
        match list.timestamp {
            Some(at) if at <= timestamp => Ok(list),
            other => Err(RevocationError::StatusListNotFound {
                rev_reg_def_id: rev_reg_def_id.to_string(),
                timestamp,
                message: format!("registry returned a snapshot at {other:?}"),
            }),
        }
    }

    /// Build the witness of slot `index` as of `timestamp`.
    pub fn reconstruct(
        &self,
        rev_reg_def_id: &str,
        index: u32,
        timestamp: Timestamp,
    ) -> Result<ReconstructedState, RevocationError> {
        let definition = self.definition(rev_reg_def_id)?;
        if index >= definition.max_cred_num() {
            return Err(RevocationError::IndexOutOfRange {
                rev_reg_def_id: rev_reg_def_id.to_string(),
                index,
                max_cred_num: definition.max_cred_num(),
            });
        }
        let tails_path = self.tails.get_tails_file(&definition)?;
        let status_list = self.status_list_at(rev_reg_def_id, timestamp)?;
        let revocation_state =
            self.engine.create_revocation_state(&definition, &status_list, index, &tails_path)?;
        tracing::debug!(
            rev_reg_def_id,
            index,
            requested = %timestamp,
            snapshot = %revocation_state.timestamp,
            "revocation state reconstructed"
        );
        Ok(ReconstructedState {
            rev_reg_def_id: rev_reg_def_id.to_string(),
            definition,
            status_list,
            revocation_state,
        })
    }

    /// Build the witness for a `non_revoked` interval. The snapshot current
    /// at `to` is used; when it was published before `from`, an override
    /// token tells the verifier that snapshot also covers `from`.
    pub fn reconstruct_for_interval(
        &self,
        rev_reg_def_id: &str,
        index: u32,
        interval: &NonRevokedInterval,
    ) -> Result<IntervalReconstruction, RevocationError> {
        let checked = self.check_interval(interval)?;
        let state = self.reconstruct(rev_reg_def_id, index, checked.to)?;
        let interval_override = (state.timestamp() < checked.from).then(|| NonRevokedIntervalOverride {
            rev_reg_def_id: rev_reg_def_id.to_string(),
            requested_from_timestamp: checked.from,
            override_rev_status_list_timestamp: state.timestamp(),
        });
        Ok(IntervalReconstruction { interval: checked, state, interval_override })
    }

    /// Override for a presentation whose snapshot for `rev_reg_def_id`
    /// predates the requested `from`. Returns `Some` only when the snapshot
    /// current as of `from` is the presented one, i.e. the registry did not
    /// change between them.
    pub fn verifier_override(
        &self,
        rev_reg_def_id: &str,
        requested_from: Timestamp,
        presented: Timestamp,
    ) -> Result<Option<NonRevokedIntervalOverride>, RevocationError> {
        if presented >= requested_from {
            return Ok(None);
        }
        let at_from = self.status_list_at(rev_reg_def_id, requested_from)?;
        if at_from.timestamp != Some(presented) {
            tracing::warn!(
                rev_reg_def_id,
                requested_from = %requested_from,
                presented = %presented,
                "registry changed between presented snapshot and requested from"
            );
            return Ok(None);
        }
        Ok(Some(NonRevokedIntervalOverride {
            rev_reg_def_id: rev_reg_def_id.to_string(),
            requested_from_timestamp: requested_from,
            override_rev_status_list_timestamp: presented,
        }))
    }

    /// Whether slot `index` is revoked in the snapshot current as of `timestamp`.
    pub fn is_revoked_at(
        &self,
        rev_reg_def_id: &str,
        index: u32,
        timestamp: Timestamp,
    ) -> Result<bool, RevocationError> {
        let list = self.status_list_at(rev_reg_def_id, timestamp)?;
        is_revoked(&list, index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ancr_core::Schema;
    use ancr_engine::MockProofEngine;
    use ancr_registry::{InMemoryRegistry, ResolutionOptions, ResolutionCache, LocalRecordStore};

    use crate::tails::LocalTailsStorage;

    const ISSUER: &str = "LjgpST2rjsoxYegQDRm7EL";

    struct Fixture {
        reconstructor: RevocationStateReconstructor,
        rev_reg_id: String,
        _dirs: tempfile::TempDir,
    }

    /// Registry of 4 slots with snapshots at 10 (none revoked),
    /// 20 (slot 1 revoked) and 30 (slots 1 and 2 revoked).
    fn fixture() -> Fixture {
        let dirs = tempfile::tempdir().unwrap();
        let engine = Arc::new(MockProofEngine::new());
        let registries = RegistryService::new(
            ResolutionCache::new(),
            LocalRecordStore::new(),
            ResolutionOptions::default(),
        )
        .with_registry(Arc::new(InMemoryRegistry::indy()));
        let tails = Arc::new(LocalTailsStorage::new(dirs.path().join("holder"), dirs.path().join("server")));

        let schema = Schema {
            issuer_id: ISSUER.into(),
            name: "Employee ID".into(),
            version: "1.0".into(),
            attr_names: vec!["name".into()],
        };
        let schema_id = registries.register_schema(&schema).unwrap().identifier;
        let cred_def = engine
            .create_credential_definition(&schema_id, &schema, ISSUER, "default", true)
            .unwrap();
        let cred_def_id = registries
            .register_credential_definition(&cred_def.definition, cred_def.private, cred_def.key_correctness_proof)
            .unwrap()
            .identifier;
        let mut rev_reg = engine
            .create_revocation_registry_definition(&cred_def.definition, &cred_def_id, "0", 4, &dirs.path().join("issuer"))
            .unwrap();
        rev_reg.definition.value.tails_location = tails.upload_tails_file(&rev_reg.definition).unwrap();
        let rev_reg_id = registries
            .register_revocation_registry_definition(&rev_reg.definition, rev_reg.private)
            .unwrap()
            .identifier;

        let definition = rev_reg.definition;
        let mut list = engine
            .create_revocation_status_list(&rev_reg_id, &definition, Some(Timestamp::from_epoch_secs(10)), true)
            .unwrap();
        registries.register_revocation_status_list(&list).unwrap();
        for (ts, revoked) in [(20, vec![1]), (30, vec![2])] {
            list = engine
                .update_revocation_status_list(&definition, &list, &[], &revoked, Some(Timestamp::from_epoch_secs(ts)))
                .unwrap();
            registries.register_revocation_status_list(&list).unwrap();
        }

        Fixture {
            reconstructor: RevocationStateReconstructor::new(registries, tails, engine),
            rev_reg_id,
            _dirs: dirs,
        }
    }

    fn ts(secs: u64) -> Timestamp {
        Timestamp::from_epoch_secs(secs)
    }

    // -- snapshot selection -----------------------------------------------------

    #[test]
    fn as_of_selects_latest_snapshot_not_after() {
        let f = fixture();
        let state = f.reconstructor.reconstruct(&f.rev_reg_id, 0, ts(25)).unwrap();
        assert_eq!(state.timestamp(), ts(20));
        assert_eq!(state.status_list.revocation_list, vec![0, 1, 0, 0]);
    }

    #[test]
    fn exact_timestamp_selects_that_snapshot() {
        let f = fixture();
        assert_eq!(f.reconstructor.reconstruct(&f.rev_reg_id, 0, ts(30)).unwrap().timestamp(), ts(30));
    }

    #[test]
    fn before_first_snapshot_is_status_list_not_found() {
        let f = fixture();
        let err = f.reconstructor.reconstruct(&f.rev_reg_id, 0, ts(5)).unwrap_err();
        assert!(matches!(err, RevocationError::StatusListNotFound { .. }));
    }

    #[test]
    fn unknown_registry_is_not_found() {
        let f = fixture();
        let unknown = format!("{ISSUER}:4:{ISSUER}:3:CL:1:default:CL_ACCUM:missing");
        let err = f.reconstructor.reconstruct(&unknown, 0, ts(25)).unwrap_err();
        assert!(matches!(err, RevocationError::RevocationRegistryNotFound { .. }));
    }

    #[test]
    fn index_outside_registry_is_rejected() {
        let f = fixture();
        let err = f.reconstructor.reconstruct(&f.rev_reg_id, 4, ts(25)).unwrap_err();
        assert!(matches!(err, RevocationError::IndexOutOfRange { max_cred_num: 4, .. }));
    }

    #[test]
    fn revocation_bits_follow_snapshots() {
        let f = fixture();
        assert!(!f.reconstructor.is_revoked_at(&f.rev_reg_id, 1, ts(15)).unwrap());
        assert!(f.reconstructor.is_revoked_at(&f.rev_reg_id, 1, ts(20)).unwrap());
        assert!(!f.reconstructor.is_revoked_at(&f.rev_reg_id, 2, ts(29)).unwrap());
    }

    // -- intervals and overrides ------------------------------------------------

    #[test]
    fn interval_uses_to_and_overrides_earlier_snapshot() {
        let f = fixture();
        let result = f
            .reconstructor
            .reconstruct_for_interval(&f.rev_reg_id, 0, &NonRevokedInterval::at(ts(25)))
            .unwrap();
        assert_eq!(result.state.timestamp(), ts(20));
        assert_eq!(
            result.interval_override,
            Some(NonRevokedIntervalOverride {
                rev_reg_def_id: f.rev_reg_id.clone(),
                requested_from_timestamp: ts(25),
                override_rev_status_list_timestamp: ts(20),
            })
        );
    }

    #[test]
    fn snapshot_at_from_needs_no_override() {
        let f = fixture();
        let result = f
            .reconstructor
            .reconstruct_for_interval(&f.rev_reg_id, 0, &NonRevokedInterval::at(ts(20)))
            .unwrap();
        assert!(result.interval_override.is_none());
    }

    #[test]
    fn wide_interval_fails_strict_policy() {
        let f = fixture();
        let interval = NonRevokedInterval { from: Some(ts(10)), to: Some(ts(25)) };
        let err = f.reconstructor.reconstruct_for_interval(&f.rev_reg_id, 0, &interval).unwrap_err();
        assert!(matches!(err, RevocationError::InvalidRevocationInterval { .. }));

        let relaxed = f.reconstructor.clone().with_max_interval_secs(60);
        assert!(relaxed.reconstruct_for_interval(&f.rev_reg_id, 0, &interval).is_ok());
    }

    #[test]
    fn verifier_override_requires_unchanged_registry() {
        let f = fixture();
        let unchanged = f.reconstructor.verifier_override(&f.rev_reg_id, ts(15), ts(10)).unwrap();
        assert_eq!(unchanged.map(|o| o.override_rev_status_list_timestamp), Some(ts(10)));

        let changed = f.reconstructor.verifier_override(&f.rev_reg_id, ts(25), ts(10)).unwrap();
        assert!(changed.is_none());

        let not_needed = f.reconstructor.verifier_override(&f.rev_reg_id, ts(20), ts(20)).unwrap();
        assert!(not_needed.is_none());
    }
}

//! # Status List Resolution
//!
//! Snapshots are resolved "as of" a timestamp: the exact snapshot when one
//! was published then, else the latest earlier one.

use std::sync::Arc;

use ancr_core::Timestamp;
use ancr_engine::MockProofEngine;
use ancr_issuer::IssuerService;
use ancr_registry::{InMemoryRegistry, Registry, RegistryService, ResolutionErrorKind};
use ancr_revocation::{LocalTailsStorage, RevocationStateReconstructor};

const ISSUER: &str = "did:indy:sovrin:LjgpST2rjsoxYegQDRm7EL";

fn at(secs: u64) -> Timestamp {
    Timestamp::from_epoch_secs(secs)
}

/// A registry with snapshots at 10 (nothing revoked), 20 (slot 0) and
/// 30 (slots 0 and 1).
fn published(dir: &std::path::Path) -> (Arc<InMemoryRegistry>, String) {
    let ledger = Arc::new(InMemoryRegistry::indy());
    let issuer = IssuerService::new(
        Arc::new(MockProofEngine::new()),
        RegistryService::from_config(&Default::default()).with_registry(ledger.clone()),
        Arc::new(LocalTailsStorage::new(dir.join("issuer"), dir.join("public"))),
        dir.join("generated"),
    );
    let schema = issuer.create_schema(ISSUER, "Employee ID", "1.0", &["name"]).unwrap();
    let cred_def = issuer.create_credential_definition(&schema.identifier, ISSUER, "default", true).unwrap();
    let id = issuer.create_revocation_registry(&cred_def.identifier, "0", 8, Some(at(10))).unwrap().rev_reg_def_id;
    issuer.revoke(&id, &[0], Some(at(20))).unwrap();
    issuer.revoke(&id, &[1], Some(at(30))).unwrap();
    (ledger, id)
}

#[test]
fn as_of_selects_latest_earlier_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let (ledger, id) = published(dir.path());
    let registries = RegistryService::from_config(&Default::default()).with_registry(ledger);

    let list = registries.get_revocation_status_list(&id, at(25)).into_result().unwrap();
    assert_eq!(list.timestamp, Some(at(20)));
    assert_eq!(list.is_revoked(0), Some(true));
    assert_eq!(list.is_revoked(1), Some(false));

    let exact = registries.get_revocation_status_list(&id, at(30)).into_result().unwrap();
    assert_eq!(exact.timestamp, Some(at(30)));
    assert_eq!(exact.is_revoked(1), Some(true));
}

#[test]
fn before_first_snapshot_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let (ledger, id) = published(dir.path());
    let registries = RegistryService::from_config(&Default::default()).with_registry(ledger);
    let resolved = registries.get_revocation_status_list(&id, at(5));
    assert_eq!(resolved.metadata.error, Some(ResolutionErrorKind::NotFound));
}

#[test]
fn exact_snapshot_is_served_from_cache() {
    let dir = tempfile::tempdir().unwrap();
    let (ledger, id) = published(dir.path());
    let registries = RegistryService::from_config(&Default::default()).with_registry(ledger.clone());
    let first = registries.get_revocation_status_list(&id, at(25));
    let lookups = ledger.lookup_count();
    let second = registries.get_revocation_status_list(&id, at(20));
    assert!(!first.served_from_cache());
    assert!(second.served_from_cache());
    assert_eq!(ledger.lookup_count(), lookups);
    assert_eq!(first.object, second.object);
}

#[test]
fn as_of_lookup_sees_snapshots_published_later() {
    let dir = tempfile::tempdir().unwrap();
    let (ledger, id) = published(dir.path());
    let registries = RegistryService::from_config(&Default::default()).with_registry(ledger.clone());
    let current = registries.get_revocation_status_list(&id, at(45)).into_result().unwrap();
    assert_eq!(current.timestamp, Some(at(30)));

    let mut next = current.clone();
    next.revocation_list[2] = 1;
    next.timestamp = Some(at(40));
    ledger.register_revocation_status_list(&next).unwrap();

    let later = registries.get_revocation_status_list(&id, at(45)).into_result().unwrap();
    assert_eq!(later.timestamp, Some(at(40)));
    assert_eq!(later.is_revoked(2), Some(true));
}

#[test]
fn reconstructor_reports_revocation_as_of() {
    let dir = tempfile::tempdir().unwrap();
    let (ledger, id) = published(dir.path());
    let reconstructor = RevocationStateReconstructor::new(
        RegistryService::from_config(&Default::default()).with_registry(ledger),
        Arc::new(LocalTailsStorage::new(dir.path().join("holder"), dir.path().join("public"))),
        Arc::new(MockProofEngine::new()),
    );
    assert!(!reconstructor.is_revoked_at(&id, 0, at(15)).unwrap());
    assert!(reconstructor.is_revoked_at(&id, 0, at(25)).unwrap());
    let state = reconstructor.reconstruct(&id, 2, at(25)).unwrap();
    assert_eq!(state.timestamp(), at(20));
}

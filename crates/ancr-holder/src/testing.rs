//! Issuer and holder wired to one in-memory registry, for tests.

use std::collections::BTreeMap;
use std::sync::Arc;

use ancr_core::{OrchestrationConfig, ProofRequest, Timestamp};
use ancr_engine::MockProofEngine;
use ancr_issuer::IssuerService;
use ancr_query::InMemoryCredentialStore;
use ancr_registry::{InMemoryRegistry, RegistryService};
use ancr_revocation::{LocalTailsStorage, RevocationStateReconstructor};

use crate::service::HolderService;

pub(crate) const ISSUER: &str = "did:indy:sovrin:LjgpST2rjsoxYegQDRm7EL";
pub(crate) const REGISTRY_CREATED_AT: u64 = 100;

pub(crate) struct World {
    pub issuer: IssuerService,
    pub holder: HolderService,
    pub store: InMemoryCredentialStore,
    pub cred_def_id: String,
    pub rev_reg_id: Option<String>,
    _dirs: tempfile::TempDir,
}

impl World {
    pub fn new(revocable: bool) -> Self {
        let dirs = tempfile::tempdir().unwrap();
        let engine = Arc::new(MockProofEngine::new());
        let ledger = Arc::new(InMemoryRegistry::indy());
        let config = OrchestrationConfig::default();
        let public = dirs.path().join("public");

        let issuer = IssuerService::new(
            engine.clone(),
            RegistryService::from_config(&config).with_registry(ledger.clone()),
            Arc::new(LocalTailsStorage::new(dirs.path().join("issuer"), &public)),
            dirs.path().join("generated"),
        );
        let schema = issuer.create_schema(ISSUER, "Employee ID", "1.0", &["name", "age"]).unwrap();
        let cred_def_id = issuer
            .create_credential_definition(&schema.identifier, ISSUER, "default", revocable)
            .unwrap()
            .identifier;
        let rev_reg_id = revocable.then(|| {
            issuer
                .create_revocation_registry(&cred_def_id, "0", 8, Some(Timestamp::from_epoch_secs(REGISTRY_CREATED_AT)))
                .unwrap()
                .rev_reg_def_id
        });

        let store = InMemoryCredentialStore::new();
        let reconstructor = RevocationStateReconstructor::new(
            RegistryService::from_config(&config).with_registry(ledger),
            Arc::new(LocalTailsStorage::new(dirs.path().join("holder"), &public)),
            engine.clone(),
        );
        let holder = HolderService::new(engine, Arc::new(store.clone()), reconstructor);
        holder.create_link_secret(Some("default"), None).unwrap();

        World { issuer, holder, store, cred_def_id, rev_reg_id, _dirs: dirs }
    }

    /// Issue `{name, age}` to the holder under `link_secret_id` and store it as `credential_id`.
    pub fn issue(&self, credential_id: &str, name: &str, age: &str, link_secret_id: &str) {
        let offer = self.issuer.create_credential_offer(&self.cred_def_id).unwrap();
        let (request, metadata) = self.holder.create_credential_request(&offer, Some(link_secret_id)).unwrap();
        let values: BTreeMap<String, String> =
            [("name", name), ("age", age)].into_iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        let issued = self
            .issuer
            .create_credential(&offer, &request, &values, self.rev_reg_id.as_deref())
            .unwrap();
        self.holder.store_credential(issued.credential, &metadata, Some(credential_id)).unwrap();
    }

    pub fn revoke(&self, indices: &[u32], at: u64) {
        let rev_reg_id = self.rev_reg_id.as_deref().unwrap();
        self.issuer.revoke(rev_reg_id, indices, Some(Timestamp::from_epoch_secs(at))).unwrap();
    }
}

/// `name` revealed and `age >= min_age`, optionally with a request-level interval.
pub(crate) fn proof_request(min_age: i32, non_revoked: Option<(u64, u64)>) -> ProofRequest {
    let mut json = serde_json::json!({
        "name": "employment",
        "version": "1.0",
        "nonce": "1234567890",
        "requested_attributes": {
            "name": {"name": "name", "restrictions": [{"schema_name": "Employee ID"}]}
        },
        "requested_predicates": {
            "adult": {"name": "age", "p_type": ">=", "p_value": min_age}
        }
    });
    if let Some((from, to)) = non_revoked {
        json["non_revoked"] = serde_json::json!({"from": from, "to": to});
    }
    serde_json::from_value(json).unwrap()
}

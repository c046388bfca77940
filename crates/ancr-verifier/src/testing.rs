//! Issuer, holder and verifier over one in-memory registry, for tests.

use std::collections::BTreeMap;
use std::sync::Arc;

use ancr_core::{OrchestrationConfig, Presentation, ProofRequest, Timestamp};
use ancr_engine::{MockProofEngine, ProofEngine};
use ancr_holder::HolderService;
use ancr_issuer::IssuerService;
use ancr_query::InMemoryCredentialStore;
use ancr_registry::{InMemoryRegistry, RegistryService};
use ancr_revocation::{LocalTailsStorage, RevocationStateReconstructor};

use crate::service::VerificationService;

pub(crate) const ISSUER: &str = "did:indy:sovrin:LjgpST2rjsoxYegQDRm7EL";

pub(crate) struct World {
    pub issuer: IssuerService,
    pub holder: HolderService,
    pub verifier: VerificationService,
    pub cred_def_id: String,
    pub rev_reg_id: Option<String>,
    _dirs: tempfile::TempDir,
}

impl World {
    /// Schema `Employee ID` `[name, age]`; a revocation registry of 8 slots
    /// published at 100 when `revocable`.
    pub fn new(revocable: bool) -> Self {
        let dirs = tempfile::tempdir().unwrap();
        let engine: Arc<dyn ProofEngine> = Arc::new(MockProofEngine::new());
        let ledger = Arc::new(InMemoryRegistry::indy());
        let config = OrchestrationConfig::default();
        let public = dirs.path().join("public");
        let registries = || RegistryService::from_config(&config).with_registry(ledger.clone());
        let reconstructor = |downloads: &str| {
            RevocationStateReconstructor::new(
                registries(),
                Arc::new(LocalTailsStorage::new(dirs.path().join(downloads), &public)),
                engine.clone(),
            )
        };

        let issuer = IssuerService::new(
            engine.clone(),
            registries(),
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
                .create_revocation_registry(&cred_def_id, "0", 8, Some(Timestamp::from_epoch_secs(100)))
                .unwrap()
                .rev_reg_def_id
        });

        let holder =
            HolderService::new(engine.clone(), Arc::new(InMemoryCredentialStore::new()), reconstructor("holder"));
        holder.create_link_secret(Some("default"), None).unwrap();
        let verifier = VerificationService::new(engine.clone(), reconstructor("verifier"));

        World { issuer, holder, verifier, cred_def_id, rev_reg_id, _dirs: dirs }
    }

    pub fn issue(&self, credential_id: &str, name: &str, age: &str) {
        let offer = self.issuer.create_credential_offer(&self.cred_def_id).unwrap();
        let (request, metadata) = self.holder.create_credential_request(&offer, None).unwrap();
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

    /// Select automatically and assemble.
    pub fn present(&self, request: &ProofRequest) -> Presentation {
        let selected = self.holder.select_credentials_for_request(request).unwrap();
        self.holder.create_presentation(request, &selected).unwrap().presentation
    }
}

/// `name` revealed from an `Employee ID` credential and `age >= min_age`.
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

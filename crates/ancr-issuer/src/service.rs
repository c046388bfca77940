//! # Issuer Service
//!
//! Creates and registers everything a holder later proves against:
//! schemas, credential definitions, revocation registries and their status
//! list snapshots. Private material produced along the way stays in the
//! local record store of the [`RegistryService`] and never reaches a
//! registry.
//!
//! Revocation slots are handed out sequentially per registry. The status
//! lists this service publishes are created with issuance-by-default, so a
//! freshly assigned slot is already non-revoked.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;

use ancr_core::identifier::{self, ObjectKind};
use ancr_core::{
    Credential, CredentialDefinition, CredentialOffer, CredentialRequest, OrchestrationConfig,
    RevocationRegistryDefinition, RevocationStatusList, Schema, Timestamp,
};
use ancr_engine::{CredentialIssuance, CredentialRevocationConfig, ProofEngine};
use ancr_registry::{Registered, RegistryService};
use ancr_revocation::TailsStorage;

use crate::error::IssuerError;

/// A revocation registry created by [`IssuerService::create_revocation_registry`].
#[derive(Debug, Clone)]
pub struct CreatedRevocationRegistry {
    /// Registry identifier.
    pub rev_reg_def_id: String,
    /// Registered definition, `tailsLocation` pointing at the published tails file.
    pub definition: RevocationRegistryDefinition,
    /// The first status list snapshot.
    pub status_list: RevocationStatusList,
}

/// A credential together with the slot it occupies.
#[derive(Debug, Clone)]
pub struct IssuedCredential {
    /// The credential.
    pub credential: Credential,
    /// Revocation slot, `None` for non-revocable credentials.
    pub revocation_index: Option<u32>,
}

/// Issuer-side orchestration.
#[derive(Clone)]
pub struct IssuerService {
    engine: Arc<dyn ProofEngine>,
    registries: RegistryService,
    tails: Arc<dyn TailsStorage>,
    tails_directory: PathBuf,
    next_index: Arc<Mutex<BTreeMap<String, u32>>>,
}

impl std::fmt::Debug for IssuerService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssuerService")
            .field("engine", &self.engine.engine_name())
            .field("registries", &self.registries)
            .field("tails_directory", &self.tails_directory)
            .finish()
    }
}

fn slot_key(rev_reg_def_id: &str) -> String {
    identifier::to_legacy(ObjectKind::RevocationRegistryDefinition, rev_reg_def_id)
        .unwrap_or_else(|_| rev_reg_def_id.to_string())
}

fn same_credential_definition(a: &str, b: &str) -> bool {
    let legacy = |id: &str| identifier::to_legacy(ObjectKind::CredentialDefinition, id).ok();
    a == b || matches!((legacy(a), legacy(b)), (Some(x), Some(y)) if x == y)
}

impl IssuerService {
    /// An issuer writing generated tails files into `tails_directory`.
    pub fn new(
        engine: Arc<dyn ProofEngine>,
        registries: RegistryService,
        tails: Arc<dyn TailsStorage>,
        tails_directory: impl Into<PathBuf>,
    ) -> Self {
        Self {
            engine,
            registries,
            tails,
            tails_directory: tails_directory.into(),
            next_index: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }

    /// An issuer using the tails directory from `config`.
    pub fn from_config(
        engine: Arc<dyn ProofEngine>,
        registries: RegistryService,
        tails: Arc<dyn TailsStorage>,
        config: &OrchestrationConfig,
    ) -> Self {
        Self::new(engine, registries, tails, config.tails_directory.join("generated"))
    }

    /// The resolution layer the issuer registers through.
    pub fn registries(&self) -> &RegistryService {
        &self.registries
    }

    // -- schemas and definitions ----------------------------------------------

    /// Create and register a schema.
    pub fn create_schema(
        &self,
        issuer_id: &str,
        name: &str,
        version: &str,
        attr_names: &[&str],
    ) -> Result<Registered<Schema>, IssuerError> {
        let schema = Schema {
            issuer_id: issuer_id.to_string(),
            name: name.to_string(),
            version: version.to_string(),
            attr_names: attr_names.iter().map(|a| a.to_string()).collect(),
        };
        Ok(self.registries.register_schema(&schema)?)
    }

    /// Create and register a credential definition for a registered schema.
    pub fn create_credential_definition(
        &self,
        schema_id: &str,
        issuer_id: &str,
        tag: &str,
        support_revocation: bool,
    ) -> Result<Registered<CredentialDefinition>, IssuerError> {
        let schema = self.registries.get_schema(schema_id).into_result()?;
        let created = self
            .engine
            .create_credential_definition(schema_id, &schema, issuer_id, tag, support_revocation)?;
        Ok(self.registries.register_credential_definition(
            &created.definition,
            created.private,
            created.key_correctness_proof,
        )?)
    }

    // -- revocation -------------------------------------------------------------

    /// Create a revocation registry for one of this issuer's credential
    /// definitions: generate and publish the tails file, register the
    /// definition, and register the first status list (every slot
    /// non-revoked). `timestamp` defaults to the registry's clock.
    pub fn create_revocation_registry(
        &self,
        cred_def_id: &str,
        tag: &str,
        max_cred_num: u32,
        timestamp: Option<Timestamp>,
    ) -> Result<CreatedRevocationRegistry, IssuerError> {
        let cred_def = self.registries.get_credential_definition(cred_def_id).into_result()?;
        if !cred_def.supports_revocation() {
            return Err(IssuerError::RevocationNotSupported { cred_def_id: cred_def_id.to_string() });
        }
        let mut created = self.engine.create_revocation_registry_definition(
            &cred_def,
            cred_def_id,
            tag,
            max_cred_num,
            &self.tails_directory,
        )?;
        created.definition.value.tails_location = self.tails.upload_tails_file(&created.definition)?;

        let registered = self
            .registries
            .register_revocation_registry_definition(&created.definition, created.private)?;
        let rev_reg_def_id = registered.identifier;
        let initial =
            self.engine
                .create_revocation_status_list(&rev_reg_def_id, &registered.object, timestamp, true)?;
        let status_list = self.registries.register_revocation_status_list(&initial)?.object;
        tracing::info!(
            rev_reg_def_id = %rev_reg_def_id,
            max_cred_num,
            tails_location = %registered.object.value.tails_location,
            "revocation registry created"
        );
        Ok(CreatedRevocationRegistry { rev_reg_def_id, definition: registered.object, status_list })
    }

    fn held_registry(&self, rev_reg_def_id: &str) -> Result<RevocationRegistryDefinition, IssuerError> {
        self.registries
            .records()
            .revocation_registry_definition(rev_reg_def_id)
            .map(|record| record.object)
            .ok_or_else(|| IssuerError::RevocationRegistryNotFound { rev_reg_def_id: rev_reg_def_id.to_string() })
    }

    fn latest_status_list(&self, rev_reg_def_id: &str) -> Result<RevocationStatusList, IssuerError> {
        self.registries
            .records()
            .latest_revocation_status_list(rev_reg_def_id)
            .ok_or_else(|| IssuerError::StatusListNotFound { rev_reg_def_id: rev_reg_def_id.to_string() })
    }

    /// Revoke `indices` and publish the resulting snapshot. Earlier
    /// snapshots stay resolvable.
    pub fn revoke(
        &self,
        rev_reg_def_id: &str,
        indices: &[u32],
        timestamp: Option<Timestamp>,
    ) -> Result<RevocationStatusList, IssuerError> {
        let definition = self.held_registry(rev_reg_def_id)?;
        let previous = self.latest_status_list(rev_reg_def_id)?;
        let next = self
            .engine
            .update_revocation_status_list(&definition, &previous, &[], indices, timestamp)?;
        let published = self.registries.register_revocation_status_list(&next)?.object;
        tracing::info!(
            rev_reg_def_id,
            revoked = ?indices,
            timestamp = ?published.timestamp,
            "credentials revoked"
        );
        Ok(published)
    }

    // -- issuance ---------------------------------------------------------------

    /// Offer a credential of one of this issuer's credential definitions.
    pub fn create_credential_offer(&self, cred_def_id: &str) -> Result<CredentialOffer, IssuerError> {
        let definition = self.registries.get_credential_definition(cred_def_id).into_result()?;
        let secrets = self
            .registries
            .records()
            .credential_definition_secrets(cred_def_id)
            .ok_or_else(|| IssuerError::CredentialDefinitionSecretsNotFound {
                cred_def_id: cred_def_id.to_string(),
            })?;
        Ok(self
            .engine
            .create_credential_offer(&definition.schema_id, cred_def_id, &secrets.key_correctness_proof)?)
    }

    fn allocate_index(&self, rev_reg_def_id: &str, max_cred_num: u32) -> Result<u32, IssuerError> {
        let mut next = self.next_index.lock();
        let slot = next.entry(slot_key(rev_reg_def_id)).or_insert(0);
        if *slot >= max_cred_num {
            return Err(IssuerError::RegistryFull { rev_reg_def_id: rev_reg_def_id.to_string(), max_cred_num });
        }
        let index = *slot;
        *slot += 1;
        Ok(index)
    }

    /// Issue a credential answering `request`. With `rev_reg_def_id`, the
    /// credential takes the next free slot of that registry.
    pub fn create_credential(
        &self,
        offer: &CredentialOffer,
        request: &CredentialRequest,
        values: &BTreeMap<String, String>,
        rev_reg_def_id: Option<&str>,
    ) -> Result<IssuedCredential, IssuerError> {
        let cred_def_id = offer.cred_def_id.as_str();
        let definition = self.registries.get_credential_definition(cred_def_id).into_result()?;
        let secrets = self
            .registries
            .records()
            .credential_definition_secrets(cred_def_id)
            .ok_or_else(|| IssuerError::CredentialDefinitionSecretsNotFound {
                cred_def_id: cred_def_id.to_string(),
            })?;

        let (credential, revocation_index) = match rev_reg_def_id {
            Some(rev_reg_def_id) => {
                let registry = self.held_registry(rev_reg_def_id)?;
                if !same_credential_definition(&registry.cred_def_id, cred_def_id) {
                    return Err(IssuerError::RegistryMismatch {
                        rev_reg_def_id: rev_reg_def_id.to_string(),
                        cred_def_id: cred_def_id.to_string(),
                    });
                }
                let private = self
                    .registries
                    .records()
                    .revocation_registry_private(rev_reg_def_id)
                    .ok_or_else(|| IssuerError::RevocationRegistryNotFound {
                        rev_reg_def_id: rev_reg_def_id.to_string(),
                    })?;
                let status_list = self.latest_status_list(rev_reg_def_id)?;
                let index = self.allocate_index(rev_reg_def_id, registry.max_cred_num())?;
                let credential = self.engine.create_credential(CredentialIssuance {
                    definition: &definition,
                    private: &secrets.private,
                    offer,
                    request,
                    values,
                    revocation: Some(CredentialRevocationConfig {
                        rev_reg_def_id,
                        definition: &registry,
                        private: &private,
                        status_list: &status_list,
                        index,
                    }),
                })?;
                (credential, Some(index))
            }
            None => {
                let credential = self.engine.create_credential(CredentialIssuance {
                    definition: &definition,
                    private: &secrets.private,
                    offer,
                    request,
                    values,
                    revocation: None,
                })?;
                (credential, None)
            }
        };
        tracing::info!(cred_def_id, revocation_index = ?revocation_index, "credential issued");
        Ok(IssuedCredential { credential, revocation_index })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ancr_engine::MockProofEngine;
    use ancr_registry::InMemoryRegistry;
    use ancr_revocation::LocalTailsStorage;

    const ISSUER: &str = "did:indy:sovrin:LjgpST2rjsoxYegQDRm7EL";

    struct Fixture {
        issuer: IssuerService,
        engine: Arc<MockProofEngine>,
        _dirs: tempfile::TempDir,
    }

    fn fixture() -> Fixture {
        let dirs = tempfile::tempdir().unwrap();
        let engine = Arc::new(MockProofEngine::new());
        let registries = RegistryService::from_config(&OrchestrationConfig::default())
            .with_registry(Arc::new(InMemoryRegistry::indy()));
        let tails = Arc::new(LocalTailsStorage::new(dirs.path().join("download"), dirs.path().join("public")));
        let issuer = IssuerService::new(engine.clone(), registries, tails, dirs.path().join("generated"));
        Fixture { issuer, engine, _dirs: dirs }
    }

    fn request_for(engine: &MockProofEngine, offer: &CredentialOffer, definition: &CredentialDefinition) -> CredentialRequest {
        let link_secret = engine.create_link_secret().unwrap();
        engine.create_credential_request(offer, definition, &link_secret, "default").unwrap().0
    }

    fn values(name: &str, age: &str) -> BTreeMap<String, String> {
        [("name", name), ("age", age)].into_iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    // -- definitions -----------------------------------------------------------

    #[test]
    fn private_material_is_kept_locally() {
        let f = fixture();
        let schema = f.issuer.create_schema(ISSUER, "Employee ID", "1.0", &["name", "age"]).unwrap();
        let cred_def = f.issuer.create_credential_definition(&schema.identifier, ISSUER, "default", false).unwrap();
        assert!(f.issuer.registries().records().credential_definition_secrets(&cred_def.identifier).is_some());
        assert!(cred_def.legacy_identifier.is_some());
    }

    #[test]
    fn revocation_requires_revocable_definition() {
        let f = fixture();
        let schema = f.issuer.create_schema(ISSUER, "Employee ID", "1.0", &["name", "age"]).unwrap();
        let cred_def = f.issuer.create_credential_definition(&schema.identifier, ISSUER, "default", false).unwrap();
        let err = f.issuer.create_revocation_registry(&cred_def.identifier, "0", 4, None).unwrap_err();
        assert!(matches!(err, IssuerError::RevocationNotSupported { .. }));
    }

    #[test]
    fn unknown_schema_is_a_resolution_error() {
        let f = fixture();
        let err = f
            .issuer
            .create_credential_definition("LjgpST2rjsoxYegQDRm7EL:2:Missing:1.0", ISSUER, "default", false)
            .unwrap_err();
        assert!(matches!(err, IssuerError::Resolution(_)));
    }

    // -- revocation registries -------------------------------------------------

    #[test]
    fn registry_publishes_tails_and_initial_list() {
        let f = fixture();
        let schema = f.issuer.create_schema(ISSUER, "Employee ID", "1.0", &["name", "age"]).unwrap();
        let cred_def = f.issuer.create_credential_definition(&schema.identifier, ISSUER, "default", true).unwrap();
        let registry = f
            .issuer
            .create_revocation_registry(&cred_def.identifier, "0", 4, Some(Timestamp::from_epoch_secs(100)))
            .unwrap();
        assert!(registry.definition.value.tails_location.starts_with("file://"));
        assert_eq!(registry.status_list.timestamp, Some(Timestamp::from_epoch_secs(100)));
        assert_eq!(registry.status_list.revocation_list, vec![0, 0, 0, 0]);

        let revoked = f
            .issuer
            .revoke(&registry.rev_reg_def_id, &[2], Some(Timestamp::from_epoch_secs(200)))
            .unwrap();
        assert_eq!(revoked.revocation_list, vec![0, 0, 1, 0]);
        let records = f.issuer.registries().records();
        let earlier = records
            .revocation_status_list(&registry.rev_reg_def_id, Timestamp::from_epoch_secs(150))
            .unwrap();
        assert_eq!(earlier.revocation_list, vec![0, 0, 0, 0]);
    }

    // -- issuance ---------------------------------------------------------------

    #[test]
    fn revocable_issuance_allocates_slots_until_full() {
        let f = fixture();
        let schema = f.issuer.create_schema(ISSUER, "Employee ID", "1.0", &["name", "age"]).unwrap();
        let cred_def = f.issuer.create_credential_definition(&schema.identifier, ISSUER, "default", true).unwrap();
        let registry = f.issuer.create_revocation_registry(&cred_def.identifier, "0", 2, None).unwrap();

        let offer = f.issuer.create_credential_offer(&cred_def.identifier).unwrap();
        let request = request_for(&f.engine, &offer, &cred_def.object);
        let rev_reg = Some(registry.rev_reg_def_id.as_str());
        let first = f.issuer.create_credential(&offer, &request, &values("John", "25"), rev_reg).unwrap();
        let second = f.issuer.create_credential(&offer, &request, &values("Jane", "31"), rev_reg).unwrap();
        assert_eq!(first.revocation_index, Some(0));
        assert_eq!(second.revocation_index, Some(1));
        assert_eq!(f.engine.credential_revocation_index(&second.credential).unwrap(), Some(1));

        let err = f.issuer.create_credential(&offer, &request, &values("Jim", "40"), rev_reg).unwrap_err();
        assert!(matches!(err, IssuerError::RegistryFull { max_cred_num: 2, .. }));
    }

    #[test]
    fn non_revocable_issuance() {
        let f = fixture();
        let schema = f.issuer.create_schema(ISSUER, "Employee ID", "1.0", &["name", "age"]).unwrap();
        let cred_def = f.issuer.create_credential_definition(&schema.identifier, ISSUER, "default", false).unwrap();
        let offer = f.issuer.create_credential_offer(&cred_def.identifier).unwrap();
        let request = request_for(&f.engine, &offer, &cred_def.object);
        let issued = f.issuer.create_credential(&offer, &request, &values("John", "25"), None).unwrap();
        assert_eq!(issued.revocation_index, None);
        assert_eq!(issued.credential.values["name"].raw, "John");
        assert!(issued.credential.rev_reg_id.is_none());
    }

    #[test]
    fn offer_for_unknown_definition_fails() {
        let f = fixture();
        let err = f
            .issuer
            .create_credential_offer("did:indy:sovrin:LjgpST2rjsoxYegQDRm7EL/anoncreds/v0/CLAIM_DEF/1/x")
            .unwrap_err();
        assert!(matches!(err, IssuerError::Resolution(_)));
    }
}

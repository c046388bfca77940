//! # Holder Service
//!
//! The holder's entry point: link secrets, credential requests, reception
//! and storage of issued credentials, credential search and selection for
//! proof requests, and presentation assembly with every schema and
//! credential definition resolved through the registry layer.

use std::collections::BTreeMap;
use std::sync::Arc;

use ancr_core::{
    Credential, CredentialDefinition, CredentialOffer, CredentialRequest, CredentialRequestMetadata, LinkSecret,
    NonRevokedInterval, ProofRequest, Restriction, Schema, SelectedCredentials, Timestamp,
};
use ancr_engine::ProofEngine;
use ancr_query::{compile_restriction, CredentialRecord, CredentialStore, Query, StoreError};
use ancr_registry::RegistryService;
use ancr_revocation::RevocationStateReconstructor;

use crate::assembler::{AssembledPresentation, ProofAssembler};
use crate::error::HolderError;
use crate::link_secret::LinkSecretStore;
use crate::search::{self, RequestedCredentials};

/// Holder-side orchestration.
#[derive(Clone)]
pub struct HolderService {
    engine: Arc<dyn ProofEngine>,
    store: Arc<dyn CredentialStore>,
    link_secrets: LinkSecretStore,
    reconstructor: RevocationStateReconstructor,
    assembler: ProofAssembler,
}

impl std::fmt::Debug for HolderService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HolderService")
            .field("engine", &self.engine.engine_name())
            .field("link_secrets", &self.link_secrets)
            .field("reconstructor", &self.reconstructor)
            .finish()
    }
}

impl HolderService {
    /// A holder over `store`, resolving through the reconstructor's registry layer.
    pub fn new(
        engine: Arc<dyn ProofEngine>,
        store: Arc<dyn CredentialStore>,
        reconstructor: RevocationStateReconstructor,
    ) -> Self {
        let link_secrets = LinkSecretStore::new();
        let assembler =
            ProofAssembler::new(store.clone(), link_secrets.clone(), reconstructor.clone(), engine.clone());
        Self { engine, store, link_secrets, reconstructor, assembler }
    }

    fn registries(&self) -> &RegistryService {
        self.reconstructor.registries()
    }

    /// The link secret store.
    pub fn link_secrets(&self) -> &LinkSecretStore {
        &self.link_secrets
    }

    /// The credential store.
    pub fn store(&self) -> &dyn CredentialStore {
        self.store.as_ref()
    }

    /// The proof assembler.
    pub fn assembler(&self) -> &ProofAssembler {
        &self.assembler
    }

    // -- link secrets and credentials ------------------------------------------

    /// Create a link secret. See [`LinkSecretStore::create`].
    pub fn create_link_secret(
        &self,
        link_secret_id: Option<&str>,
        value: Option<LinkSecret>,
    ) -> Result<String, HolderError> {
        self.link_secrets.create(self.engine.as_ref(), link_secret_id, value)
    }

    /// Answer a credential offer, binding the given or default link secret.
    pub fn create_credential_request(
        &self,
        offer: &CredentialOffer,
        link_secret_id: Option<&str>,
    ) -> Result<(CredentialRequest, CredentialRequestMetadata), HolderError> {
        let link_secret_id = self.link_secrets.resolve_id(link_secret_id)?;
        let link_secret = self.link_secrets.get(&link_secret_id)?;
        let definition = self.registries().get_credential_definition(&offer.cred_def_id).into_result()?;
        Ok(self.engine.create_credential_request(offer, &definition, &link_secret, &link_secret_id)?)
    }

    /// Check an issued credential and store it, tagged for search. Returns
    /// the credential id (`credential_id`, or a random UUID).
    pub fn store_credential(
        &self,
        credential: Credential,
        metadata: &CredentialRequestMetadata,
        credential_id: Option<&str>,
    ) -> Result<String, HolderError> {
        let link_secret = self.link_secrets.get(&metadata.link_secret_name)?;
        let definition = self.registries().get_credential_definition(&credential.cred_def_id).into_result()?;
        let revocation_registry = match &credential.rev_reg_id {
            Some(id) => Some(self.registries().get_revocation_registry_definition(id).into_result()?),
            None => None,
        };
        let schema = self.registries().get_schema(&credential.schema_id).into_result()?;

        let credential = self.engine.process_credential(
            credential,
            metadata,
            &link_secret,
            &definition,
            revocation_registry.as_ref(),
        )?;
        let revocation_index = self.engine.credential_revocation_index(&credential)?;
        let credential_id = credential_id.map(str::to_string).unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let record = CredentialRecord::new(
            credential_id.clone(),
            credential,
            metadata.link_secret_name.clone(),
            revocation_index,
            &schema,
            &definition.issuer_id,
        );
        self.store.save(record)?;
        tracing::info!(credential_id = %credential_id, revocation_index = ?revocation_index, "credential stored");
        Ok(credential_id)
    }

    /// The stored credential with this id.
    pub fn get_credential(&self, credential_id: &str) -> Result<CredentialRecord, HolderError> {
        Ok(self.store.get(credential_id)?)
    }

    /// Stored credentials matching every field of `filter` (issuer, schema,
    /// credential definition, attribute values). Identifiers match in either
    /// form. The default filter matches everything.
    pub fn get_credentials(&self, filter: &Restriction) -> Result<Vec<CredentialRecord>, HolderError> {
        Ok(self.store.find(Some(&compile_restriction(filter)))?)
    }

    /// Remove a stored credential.
    pub fn delete_credential(&self, credential_id: &str) -> Result<(), HolderError> {
        self.store.delete(credential_id)?;
        tracing::info!(credential_id, "credential deleted");
        Ok(())
    }

    // -- search -----------------------------------------------------------------

    /// Stored credentials that can answer `referent`, narrowed by `extra`.
    pub fn get_credentials_for_proof_request(
        &self,
        request: &ProofRequest,
        referent: &str,
        extra: Option<&Query>,
    ) -> Result<Vec<CredentialRecord>, HolderError> {
        search::credentials_for_referent(self.store.as_ref(), request, referent, extra)
    }

    fn revocation_status(&self, record: &CredentialRecord, interval: &NonRevokedInterval) -> Option<bool> {
        let (rev_reg_def_id, index) = record.revocation_slot()?;
        let at = interval.to.unwrap_or_else(Timestamp::now);
        match self.reconstructor.is_revoked_at(rev_reg_def_id, index, at) {
            Ok(revoked) => Some(revoked),
            Err(err) => {
                tracing::warn!(
                    credential_id = %record.credential_id,
                    rev_reg_def_id,
                    error = %err,
                    "revocation status unknown"
                );
                None
            }
        }
    }

    /// Candidates for every referent, non-revoked ones first when the
    /// referent asks for non-revocation.
    pub fn get_credentials_for_request(&self, request: &ProofRequest) -> Result<RequestedCredentials, HolderError> {
        let check = |record: &CredentialRecord, interval: &NonRevokedInterval| {
            Ok::<_, HolderError>(self.revocation_status(record, interval))
        };
        search::credentials_for_request(self.store.as_ref(), request, &check)
    }

    /// One credential per referent. See [`search::select_credentials`].
    pub fn select_credentials_for_request(&self, request: &ProofRequest) -> Result<SelectedCredentials, HolderError> {
        let requested = self.get_credentials_for_request(request)?;
        search::select_credentials(request, &requested)
    }

    // -- presentations ----------------------------------------------------------

    /// Resolve what the selected credentials reference and assemble a presentation.
    pub fn create_presentation(
        &self,
        request: &ProofRequest,
        selected: &SelectedCredentials,
    ) -> Result<AssembledPresentation, HolderError> {
        let mut schemas: BTreeMap<String, Schema> = BTreeMap::new();
        let mut credential_definitions: BTreeMap<String, CredentialDefinition> = BTreeMap::new();
        let selections = selected
            .attributes
            .iter()
            .map(|(referent, a)| (referent, &a.credential_id))
            .chain(selected.predicates.iter().map(|(referent, p)| (referent, &p.credential_id)));
        for (referent, credential_id) in selections {
            let record = self.store.get(credential_id).map_err(|err| match err {
                StoreError::NotFound(_) => HolderError::CredentialNotFound {
                    credential_id: credential_id.clone(),
                    referent: referent.clone(),
                },
                other => HolderError::Store(other),
            })?;
            let credential = &record.credential;
            if !schemas.contains_key(&credential.schema_id) {
                let schema = self.registries().get_schema(&credential.schema_id).into_result()?;
                schemas.insert(credential.schema_id.clone(), schema);
            }
            if !credential_definitions.contains_key(&credential.cred_def_id) {
                let definition =
                    self.registries().get_credential_definition(&credential.cred_def_id).into_result()?;
                credential_definitions.insert(credential.cred_def_id.clone(), definition);
            }
        }
        self.assembler.assemble(request, selected, &schemas, &credential_definitions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{proof_request, World, ISSUER};
    use ancr_query::tags;

    // -- storage ----------------------------------------------------------------

    #[test]
    fn stored_credential_is_tagged() {
        let world = World::new(true);
        world.issue("c1", "John", "25", "default");
        let record = world.store.get("c1").unwrap();
        assert_eq!(record.revocation_index, Some(0));
        assert_eq!(record.link_secret_id, "default");
        assert_eq!(record.tags[tags::SCHEMA_NAME], "Employee ID");
        assert_eq!(record.tags[tags::ISSUER_ID], ISSUER);
        assert_eq!(record.tags[&tags::attribute_value("age")], "25");
    }

    #[test]
    fn slots_are_allocated_in_order() {
        let world = World::new(true);
        world.issue("c1", "John", "25", "default");
        world.issue("c2", "Jane", "31", "default");
        assert_eq!(world.store.get("c2").unwrap().revocation_index, Some(1));
    }

    #[test]
    fn generated_credential_id() {
        let world = World::new(false);
        let offer = world.issuer.create_credential_offer(&world.cred_def_id).unwrap();
        let (request, metadata) = world.holder.create_credential_request(&offer, None).unwrap();
        let values = [("name".to_string(), "John".to_string()), ("age".to_string(), "25".to_string())]
            .into_iter()
            .collect();
        let issued = world.issuer.create_credential(&offer, &request, &values, None).unwrap();
        let id = world.holder.store_credential(issued.credential, &metadata, None).unwrap();
        assert!(uuid::Uuid::parse_str(&id).is_ok());
        assert_eq!(world.store.get(&id).unwrap().revocation_index, None);
    }

    #[test]
    fn credentials_filtered_by_either_identifier_form() {
        let world = World::new(false);
        world.issue("c1", "John", "25", "default");
        world.issue("c2", "Jane", "31", "default");

        let legacy = ancr_core::identifier::to_legacy(ancr_core::ObjectKind::CredentialDefinition, &world.cred_def_id)
            .unwrap();
        let by_legacy = Restriction { cred_def_id: Some(legacy), ..Restriction::default() };
        assert_eq!(world.holder.get_credentials(&by_legacy).unwrap().len(), 2);

        let jane = Restriction {
            attribute_values: [("name".to_string(), "Jane".to_string())].into_iter().collect(),
            ..Restriction::default()
        };
        let found = world.holder.get_credentials(&jane).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].credential_id, "c2");

        let other_schema = Restriction { schema_name: Some("Passport".into()), ..Restriction::default() };
        assert!(world.holder.get_credentials(&other_schema).unwrap().is_empty());
        assert_eq!(world.holder.get_credentials(&Restriction::default()).unwrap().len(), 2);
    }

    #[test]
    fn deleted_credential_is_gone() {
        let world = World::new(false);
        world.issue("c1", "John", "25", "default");
        assert_eq!(world.holder.get_credential("c1").unwrap().credential_id, "c1");
        world.holder.delete_credential("c1").unwrap();
        assert!(matches!(
            world.holder.get_credential("c1"),
            Err(HolderError::Store(StoreError::NotFound(_)))
        ));
        assert!(matches!(
            world.holder.delete_credential("c1"),
            Err(HolderError::Store(StoreError::NotFound(_)))
        ));
    }

    #[test]
    fn request_with_unknown_link_secret() {
        let world = World::new(false);
        let offer = world.issuer.create_credential_offer(&world.cred_def_id).unwrap();
        let err = world.holder.create_credential_request(&offer, Some("nope")).unwrap_err();
        assert!(matches!(err, HolderError::LinkSecretNotFound(id) if id == "nope"));
    }

    // -- search and selection -----------------------------------------------------

    #[test]
    fn candidates_report_revocation_status() {
        let world = World::new(true);
        world.issue("revoked", "John", "25", "default");
        world.issue("valid", "John", "25", "default");
        world.revoke(&[0], 200);
        let requested = world.holder.get_credentials_for_request(&proof_request(18, Some((250, 250)))).unwrap();
        let name = &requested.attributes["name"];
        assert_eq!(name[0].record.credential_id, "valid");
        assert_eq!(name[0].revoked, Some(false));
        assert_eq!(name[1].revoked, Some(true));

        let selected = world.holder.select_credentials_for_request(&proof_request(18, Some((250, 250)))).unwrap();
        assert_eq!(selected.attributes["name"].credential_id, "valid");
        assert_eq!(selected.predicates["adult"].credential_id, "valid");
    }

    #[test]
    fn proof_request_search_by_referent() {
        let world = World::new(false);
        world.issue("c1", "John", "25", "default");
        let found = world.holder.get_credentials_for_proof_request(&proof_request(18, None), "adult", None).unwrap();
        assert_eq!(found.len(), 1);
    }

    // -- presentations ------------------------------------------------------------

    #[test]
    fn selected_credentials_produce_presentation() {
        let world = World::new(false);
        world.issue("c1", "John", "25", "default");
        let request = proof_request(18, None);
        let selected = world.holder.select_credentials_for_request(&request).unwrap();
        let assembled = world.holder.create_presentation(&request, &selected).unwrap();
        assert_eq!(assembled.presentation.requested_proof.revealed_attrs["name"].raw, "John");
        assert!(assembled.presentation.identifiers.iter().all(|i| i.cred_def_id == world.cred_def_id));
    }

    #[test]
    fn presentation_with_unknown_credential() {
        let world = World::new(false);
        let mut selected = SelectedCredentials::default();
        selected.attributes.insert(
            "name".into(),
            ancr_core::SelectedAttribute { credential_id: "missing".into(), revealed: true, timestamp: None },
        );
        let err = world.holder.create_presentation(&proof_request(18, None), &selected).unwrap_err();
        assert!(matches!(err, HolderError::CredentialNotFound { referent, .. } if referent == "name"));
    }
}

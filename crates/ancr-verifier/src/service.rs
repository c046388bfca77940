//! # Verification Service
//!
//! The verifier's entry point. Resolves every schema, credential definition
//! and revocation registry a presentation names through the registry layer,
//! then runs the [`ProofVerifier`].

use std::collections::BTreeMap;
use std::sync::Arc;

use ancr_core::{CredentialDefinition, Presentation, ProofRequest, RevocationRegistryDefinition, Schema};
use ancr_engine::ProofEngine;
use ancr_registry::RegistryService;
use ancr_revocation::RevocationStateReconstructor;

use crate::error::VerifierError;
use crate::verifier::ProofVerifier;

/// A fresh 80-bit decimal nonce for a proof request.
pub fn generate_nonce() -> String {
    (rand::random::<u128>() >> 48).to_string()
}

/// Verifier-side orchestration.
#[derive(Debug, Clone)]
pub struct VerificationService {
    verifier: ProofVerifier,
}

impl VerificationService {
    /// A verifier resolving through the reconstructor's registry layer.
    pub fn new(engine: Arc<dyn ProofEngine>, reconstructor: RevocationStateReconstructor) -> Self {
        Self { verifier: ProofVerifier::new(reconstructor, engine) }
    }

    /// The underlying verifier.
    pub fn verifier(&self) -> &ProofVerifier {
        &self.verifier
    }

    fn registries(&self) -> &RegistryService {
        self.verifier.reconstructor().registries()
    }

    /// Resolve everything `presentation` names and verify it against `request`.
    pub fn verify_presentation(
        &self,
        presentation: &Presentation,
        request: &ProofRequest,
    ) -> Result<bool, VerifierError> {
        let mut schemas: BTreeMap<String, Schema> = BTreeMap::new();
        let mut credential_definitions: BTreeMap<String, CredentialDefinition> = BTreeMap::new();
        let mut revocation_registry_definitions: BTreeMap<String, RevocationRegistryDefinition> = BTreeMap::new();

        for identifier in &presentation.identifiers {
            if !schemas.contains_key(&identifier.schema_id) {
                let schema = self.registries().get_schema(&identifier.schema_id).into_result()?;
                schemas.insert(identifier.schema_id.clone(), schema);
            }
            if !credential_definitions.contains_key(&identifier.cred_def_id) {
                let definition =
                    self.registries().get_credential_definition(&identifier.cred_def_id).into_result()?;
                credential_definitions.insert(identifier.cred_def_id.clone(), definition);
            }
            if let Some(rev_reg_id) = &identifier.rev_reg_id {
                if !revocation_registry_definitions.contains_key(rev_reg_id) {
                    let definition = self.verifier.reconstructor().definition(rev_reg_id)?;
                    revocation_registry_definitions.insert(rev_reg_id.clone(), definition);
                }
            }
        }
        tracing::debug!(
            schemas = schemas.len(),
            credential_definitions = credential_definitions.len(),
            revocation_registries = revocation_registry_definitions.len(),
            "presentation objects resolved"
        );

        self.verifier.verify(
            presentation,
            request,
            &schemas,
            &credential_definitions,
            &revocation_registry_definitions,
        )
    }
}

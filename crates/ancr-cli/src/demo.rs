//! # Demo Subcommand
//!
//! Runs the full flow against in-memory collaborators and the mock proof
//! engine: an issuer publishes a schema, a revocable credential definition
//! and a revocation registry; a holder receives `{name, age}`, proves
//! `name` and `age >= 18`; a verifier checks the presentation, then checks
//! it again against `age >= 30`; the credential is revoked and a fresh
//! presentation for a later interval is rejected.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;

use ancr_core::{OrchestrationConfig, ProofRequest, Timestamp};
use ancr_engine::{MockProofEngine, ProofEngine};
use ancr_holder::HolderService;
use ancr_issuer::IssuerService;
use ancr_query::InMemoryCredentialStore;
use ancr_registry::{InMemoryRegistry, RegistryService};
use ancr_revocation::{LocalTailsStorage, RevocationStateReconstructor};
use ancr_verifier::{generate_nonce, VerificationService};

/// Arguments for `ancr demo`.
#[derive(Args, Debug)]
pub struct DemoArgs {
    /// Issuer DID.
    #[arg(long, default_value = "did:indy:sovrin:LjgpST2rjsoxYegQDRm7EL")]
    pub issuer: String,

    /// Holder's name attribute.
    #[arg(long, default_value = "John")]
    pub name: String,

    /// Holder's age attribute.
    #[arg(long, default_value_t = 25)]
    pub age: i32,
}

/// Outcome of each verification the demo performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DemoOutcome {
    /// `age >= 18` before revocation.
    pub adult: bool,
    /// Same presentation against `age >= 30`.
    pub over_thirty: bool,
    /// Fresh presentation after revocation.
    pub after_revocation: bool,
}

fn proof_request(min_age: i32, nonce: &str, at: Timestamp) -> Result<ProofRequest> {
    let json = serde_json::json!({
        "name": "demo",
        "version": "1.0",
        "nonce": nonce,
        "requested_attributes": {
            "name": {"name": "name", "restrictions": [{"schema_name": "Employee ID"}]}
        },
        "requested_predicates": {
            "adult": {"name": "age", "p_type": ">=", "p_value": min_age}
        },
        "non_revoked": {"from": at, "to": at}
    });
    Ok(serde_json::from_value(json)?)
}

/// Run the demo flow with `config`.
pub fn demo(args: &DemoArgs, config: &OrchestrationConfig) -> Result<DemoOutcome> {
    let dirs = tempfile::tempdir().context("creating demo directories")?;
    let engine: Arc<dyn ProofEngine> = Arc::new(MockProofEngine::new());
    let ledger = Arc::new(InMemoryRegistry::indy());
    let public = dirs.path().join("public");
    let registries = || RegistryService::from_config(config).with_registry(ledger.clone());
    let reconstructor = |downloads: &str| {
        RevocationStateReconstructor::from_config(
            registries(),
            Arc::new(LocalTailsStorage::new(dirs.path().join(downloads), &public)),
            engine.clone(),
            config,
        )
    };

    // Issuer
    let issuer = IssuerService::new(
        engine.clone(),
        registries(),
        Arc::new(LocalTailsStorage::new(dirs.path().join("issuer"), &public)),
        dirs.path().join("generated"),
    );
    let schema = issuer.create_schema(&args.issuer, "Employee ID", "1.0", &["name", "age"])?;
    println!("schema:                 {}", schema.identifier);
    let cred_def = issuer.create_credential_definition(&schema.identifier, &args.issuer, "default", true)?;
    println!("credential definition:  {}", cred_def.identifier);
    let published = Timestamp::now();
    let registry = issuer.create_revocation_registry(&cred_def.identifier, "0", 16, Some(published))?;
    println!("revocation registry:    {}", registry.rev_reg_def_id);

    // Holder
    let holder = HolderService::new(engine.clone(), Arc::new(InMemoryCredentialStore::new()), reconstructor("holder"));
    holder.create_link_secret(Some("default"), None)?;
    let offer = issuer.create_credential_offer(&cred_def.identifier)?;
    let (request, metadata) = holder.create_credential_request(&offer, None)?;
    let values: BTreeMap<String, String> =
        [("name".to_string(), args.name.clone()), ("age".to_string(), args.age.to_string())].into_iter().collect();
    let issued = issuer.create_credential(&offer, &request, &values, Some(&registry.rev_reg_def_id))?;
    let credential_id = holder.store_credential(issued.credential, &metadata, None)?;
    println!("credential stored:      {credential_id} (slot {:?})", issued.revocation_index);

    // Verifier
    let verifier = VerificationService::new(engine.clone(), reconstructor("verifier"));
    let adult_request = proof_request(18, &generate_nonce(), published)?;
    let selected = holder.select_credentials_for_request(&adult_request)?;
    let presentation = holder.create_presentation(&adult_request, &selected)?.presentation;
    let adult = verifier.verify_presentation(&presentation, &adult_request)?;
    println!("verify age >= 18:       {adult}");

    let mut over_thirty_request = adult_request.clone();
    if let Some(predicate) = over_thirty_request.requested_predicates.get_mut("adult") {
        predicate.p_value = 30;
    }
    let over_thirty = verifier.verify_presentation(&presentation, &over_thirty_request)?;
    println!("verify age >= 30:       {over_thirty}");

    // Revocation
    let index = issued.revocation_index.context("demo credential is not revocable")?;
    let revoked_at = published.plus_secs(1);
    issuer.revoke(&registry.rev_reg_def_id, &[index], Some(revoked_at))?;
    let later_request = proof_request(18, &generate_nonce(), revoked_at)?;
    let selected = holder.select_credentials_for_request(&later_request)?;
    let presentation = holder.create_presentation(&later_request, &selected)?.presentation;
    let after_revocation = verifier.verify_presentation(&presentation, &later_request)?;
    println!("verify after revocation: {after_revocation}");

    Ok(DemoOutcome { adult, over_thirty, after_revocation })
}

/// Execute the demo subcommand. Exits non-zero when an outcome differs
/// from the expected `true`, `false`, `false`.
pub fn run_demo(args: &DemoArgs, config: &OrchestrationConfig) -> Result<u8> {
    let outcome = demo(args, config)?;
    let expected = DemoOutcome { adult: args.age >= 18, over_thirty: args.age >= 30, after_revocation: false };
    if outcome == expected {
        println!("OK");
        Ok(0)
    } else {
        println!("UNEXPECTED: {outcome:?}");
        Ok(1)
    }
}

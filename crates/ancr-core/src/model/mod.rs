//! # AnonCreds Data Model
//!
//! Wire-compatible representations of the objects exchanged with registries
//! and the proof engine. Field names follow the AnonCreds JSON shapes
//! (`issuerId`, `attrNames`, `revRegDefId`, `requested_attributes`, ...);
//! all timestamps are Unix epoch seconds.
//!
//! Cryptographic payloads the orchestrator never interprets (credential
//! definition `value`, signatures, proofs, witnesses) stay opaque
//! `serde_json::Value`s owned by the proof engine.

mod credential;
mod presentation;
mod registry;
mod request;

pub use credential::{
    find_attribute, normalize_attribute_name, AttributeValue, Credential, CredentialOffer,
    CredentialRequest, CredentialRequestMetadata, LinkSecret, RevocationState,
};
pub use presentation::{
    NonRevokedIntervalOverride, Presentation, PresentationIdentifier, RequestedProof,
    RevealedAttribute, RevealedAttributeGroup, SelectedAttribute, SelectedCredentials,
    SelectedPredicate, SubProofReferent,
};
pub use registry::{
    CredentialDefinition, CredentialDefinitionPrivate, KeyCorrectnessProof,
    RevocationRegistryDefinition, RevocationRegistryDefinitionPrivate,
    RevocationRegistryDefinitionValue, RevocationStatusList, Schema,
};
pub use request::{
    NonRevokedInterval, PredicateType, ProofRequest, RequestedAttribute, RequestedPredicate,
    Restriction,
};

//! # Registry Service — Resolution and Registration
//!
//! The single entry point every other component uses to reach registries.
//!
//! Resolution of an identifier:
//!
//! 1. Select the first configured registry whose pattern matches. None
//!    matching yields `unsupportedMethod` metadata.
//! 2. Local records: objects this process registered are returned directly
//!    (`source = record`) when both the options and the registry allow it.
//! 3. Cache: a live entry under `(kind, identifier, [timestamp])` is returned
//!    (`source = cache`) when both the options and the registry allow it.
//! 4. Registry: the registry is asked, the cache populated, and the object
//!    returned (`source = registry`).
//!
//! Registry failures never surface as `Err`. They are reported in
//! [`ResolutionMetadata::error`] so callers decide what an unresolvable
//! identifier means for them.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use ancr_core::identifier::{self, ObjectKind};
use ancr_core::{
    CredentialDefinition, CredentialDefinitionPrivate, KeyCorrectnessProof, OrchestrationConfig,
    RevocationRegistryDefinition, RevocationRegistryDefinitionPrivate, RevocationStatusList,
    Schema, Timestamp,
};

use crate::cache::{CacheKey, Resolvable, ResolutionCache};
use crate::record::{CredentialDefinitionSecrets, LocalRecordStore, ObjectRecord};
use crate::registry::{Registry, RegistryError, ResourceKind};

// ---------------------------------------------------------------------------
// Options and metadata
// ---------------------------------------------------------------------------

/// Per-call resolution switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionOptions {
    /// Read from the cache.
    pub use_cache: bool,
    /// Lifetime of entries written by this call.
    #[serde(rename = "cacheDurationInSeconds")]
    pub cache_ttl_secs: u64,
    /// Write registry results to the cache.
    pub persist_in_cache: bool,
    /// Short-circuit on locally registered objects.
    pub use_local_record: bool,
}

impl From<&OrchestrationConfig> for ResolutionOptions {
    fn from(config: &OrchestrationConfig) -> Self {
        Self {
            use_cache: config.use_cache,
            cache_ttl_secs: config.cache_ttl_secs,
            persist_in_cache: config.persist_in_cache,
            use_local_record: config.use_local_record,
        }
    }
}

impl Default for ResolutionOptions {
    fn default() -> Self {
        Self::from(&OrchestrationConfig::default())
    }
}

impl ResolutionOptions {
    /// Always ask the registry; neither read nor write the cache nor use records.
    pub fn uncached() -> Self {
        Self { use_cache: false, persist_in_cache: false, use_local_record: false, ..Self::default() }
    }
}

/// Why a resolution produced no object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResolutionErrorKind {
    /// The registry has no such object, or could not be reached.
    NotFound,
    /// The identifier or the object is malformed.
    Invalid,
    /// No configured registry handles the identifier.
    UnsupportedMethod,
}

impl std::fmt::Display for ResolutionErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::NotFound => "notFound",
            Self::Invalid => "invalid",
            Self::UnsupportedMethod => "unsupportedMethod",
        })
    }
}

impl From<&RegistryError> for ResolutionErrorKind {
    fn from(err: &RegistryError) -> Self {
        match err {
            RegistryError::NotFound { .. } | RegistryError::Backend(_) => Self::NotFound,
            RegistryError::Invalid { .. } => Self::Invalid,
            RegistryError::UnsupportedMethod { .. } | RegistryError::NoRegistryForIdentifier(_) => {
                Self::UnsupportedMethod
            }
        }
    }
}

/// Where a resolved object came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResolutionSource {
    /// The local record store.
    Record,
    /// The resolution cache.
    Cache,
    /// The registry itself.
    Registry,
}

impl ResolutionSource {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Record => "record",
            Self::Cache => "cache",
            Self::Registry => "registry",
        }
    }
}

/// Outcome details of one resolution.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionMetadata {
    /// Set when no object was produced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ResolutionErrorKind>,
    /// Human-readable detail accompanying `error`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Set when an object was produced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<ResolutionSource>,
}

/// The result of resolving one identifier.
#[derive(Debug, Clone)]
pub struct Resolved<T> {
    /// What was resolved.
    pub kind: ResourceKind,
    /// The identifier as requested.
    pub identifier: String,
    /// The object, absent when `metadata.error` is set.
    pub object: Option<T>,
    /// How resolution went.
    pub metadata: ResolutionMetadata,
}

/// A resolution outcome turned into an error by a caller that needs the object.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("could not resolve {kind} {identifier} ({error}): {message}")]
pub struct ResolutionFailure {
    /// What was resolved.
    pub kind: ResourceKind,
    /// The identifier as requested.
    pub identifier: String,
    /// The structured reason.
    pub error: ResolutionErrorKind,
    /// Detail from the registry.
    pub message: String,
}

impl<T> Resolved<T> {
    fn found(kind: ResourceKind, identifier: &str, object: T, source: ResolutionSource) -> Self {
        Self {
            kind,
            identifier: identifier.to_string(),
            object: Some(object),
            metadata: ResolutionMetadata { source: Some(source), ..ResolutionMetadata::default() },
        }
    }

    fn failed(kind: ResourceKind, identifier: &str, err: &RegistryError) -> Self {
        Self {
            kind,
            identifier: identifier.to_string(),
            object: None,
            metadata: ResolutionMetadata {
                error: Some(ResolutionErrorKind::from(err)),
                message: Some(err.to_string()),
                source: None,
            },
        }
    }

    /// True when the object came from the cache.
    pub fn served_from_cache(&self) -> bool {
        self.metadata.source == Some(ResolutionSource::Cache)
    }

    /// True when the object came from the local record store.
    pub fn served_from_record(&self) -> bool {
        self.metadata.source == Some(ResolutionSource::Record)
    }

    /// The object, or the failure as an error.
    pub fn into_result(self) -> Result<T, ResolutionFailure> {
        match self.object {
            Some(object) => Ok(object),
            None => Err(ResolutionFailure {
                kind: self.kind,
                identifier: self.identifier,
                error: self.metadata.error.unwrap_or(ResolutionErrorKind::NotFound),
                message: self.metadata.message.unwrap_or_default(),
            }),
        }
    }
}

/// The outcome of a registration.
#[derive(Debug, Clone)]
pub struct Registered<T> {
    /// Identifier the registry assigned.
    pub identifier: String,
    /// Legacy form of `identifier`, when one exists.
    pub legacy_identifier: Option<String>,
    /// The object as registered.
    pub object: T,
}

impl<T> Registered<T> {
    fn new(kind: ObjectKind, identifier: String, object: T) -> Self {
        let legacy_identifier = identifier::to_legacy(kind, &identifier)
            .ok()
            .filter(|legacy| *legacy != identifier);
        Self { identifier, legacy_identifier, object }
    }
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// Routes resolution and registration to configured registries.
///
/// Cloning is cheap; clones share the registry list, cache and records.
#[derive(Clone)]
pub struct RegistryService {
    registries: Vec<Arc<dyn Registry>>,
    cache: ResolutionCache,
    records: LocalRecordStore,
    options: ResolutionOptions,
}

impl std::fmt::Debug for RegistryService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryService")
            .field("registries", &self.registries.iter().map(|r| r.method_name()).collect::<Vec<_>>())
            .field("cached_entries", &self.cache.len())
            .field("options", &self.options)
            .finish()
    }
}

impl RegistryService {
    /// A service with no registries yet.
    pub fn new(cache: ResolutionCache, records: LocalRecordStore, options: ResolutionOptions) -> Self {
        Self { registries: Vec::new(), cache, records, options }
    }

    /// A service with a fresh cache and record store, configured from `config`.
    pub fn from_config(config: &OrchestrationConfig) -> Self {
        Self::new(ResolutionCache::new(), LocalRecordStore::new(), ResolutionOptions::from(config))
    }

    /// Append a registry. Earlier registries take priority.
    pub fn with_registry(mut self, registry: Arc<dyn Registry>) -> Self {
        self.registries.push(registry);
        self
    }

    /// The resolution cache.
    pub fn cache(&self) -> &ResolutionCache {
        &self.cache
    }

    /// The local record store.
    pub fn records(&self) -> &LocalRecordStore {
        &self.records
    }

    /// Default options for calls without explicit ones.
    pub fn options(&self) -> ResolutionOptions {
        self.options
    }

    /// The first registry, in configuration order, that handles `identifier`.
    pub fn resolve(&self, identifier: &str) -> Result<Arc<dyn Registry>, RegistryError> {
        self.registries
            .iter()
            .find(|registry| registry.supports_identifier(identifier))
            .cloned()
            .ok_or_else(|| RegistryError::NoRegistryForIdentifier(identifier.to_string()))
    }

    /// `store_key` names the cache entry a fetched object is kept under; it
    /// may differ from the lookup key when the object says where it belongs.
    fn resolve_object<T, R, F, S>(
        &self,
        identifier: &str,
        cache_key: CacheKey,
        options: ResolutionOptions,
        from_record: R,
        fetch: F,
        store_key: S,
    ) -> Resolved<T>
    where
        T: Resolvable,
        R: FnOnce(&LocalRecordStore) -> Option<T>,
        F: FnOnce(&dyn Registry) -> Result<T, RegistryError>,
        S: FnOnce(&T) -> Option<CacheKey>,
    {
        let kind = T::KIND;
        let registry = match self.resolve(identifier) {
            Ok(registry) => registry,
            Err(err) => {
                tracing::warn!(%kind, identifier, error = %err, "no registry for identifier");
                record_resolution(kind, "unsupported");
                return Resolved::failed(kind, identifier, &err);
            }
        };

        if options.use_local_record && registry.allows_local_record() {
            if let Some(object) = from_record(&self.records) {
                tracing::debug!(%kind, identifier, "resolved from local record");
                record_resolution(kind, ResolutionSource::Record.as_str());
                return Resolved::found(kind, identifier, object, ResolutionSource::Record);
            }
        }

        let caching = registry.allows_caching();
        if options.use_cache && caching {
            if let Some(object) = self.cache.get_as::<T>(&cache_key, Timestamp::now()) {
                tracing::debug!(%kind, identifier, "resolved from cache");
                record_resolution(kind, ResolutionSource::Cache.as_str());
                return Resolved::found(kind, identifier, object, ResolutionSource::Cache);
            }
        }

        match fetch(registry.as_ref()) {
            Ok(object) => {
                if options.persist_in_cache && caching {
                    if let Some(key) = store_key(&object) {
                        self.cache.insert(key, object.clone().into_cached(), options.cache_ttl_secs, Timestamp::now());
                    }
                }
                tracing::debug!(%kind, identifier, registry = registry.method_name(), "resolved from registry");
                record_resolution(kind, ResolutionSource::Registry.as_str());
                Resolved::found(kind, identifier, object, ResolutionSource::Registry)
            }
            Err(err) => {
                tracing::warn!(
                    %kind,
                    identifier,
                    registry = registry.method_name(),
                    error = %err,
                    "resolution failed"
                );
                record_resolution(kind, "failed");
                Resolved::failed(kind, identifier, &err)
            }
        }
    }

    // -- resolution -------------------------------------------------------------

    /// Resolve a schema with the service's default options.
    pub fn get_schema(&self, schema_id: &str) -> Resolved<Schema> {
        self.get_schema_with(schema_id, self.options)
    }

    /// Resolve a schema.
    pub fn get_schema_with(&self, schema_id: &str, options: ResolutionOptions) -> Resolved<Schema> {
        self.resolve_object(
            schema_id,
            CacheKey::object(ResourceKind::Schema, schema_id),
            options,
            |records| records.schema(schema_id).map(|r| in_requested_form(&r, schema_id)),
            |registry| registry.get_schema(schema_id),
            |_| Some(CacheKey::object(ResourceKind::Schema, schema_id)),
        )
    }

    /// Resolve a credential definition with the service's default options.
    pub fn get_credential_definition(&self, cred_def_id: &str) -> Resolved<CredentialDefinition> {
        self.get_credential_definition_with(cred_def_id, self.options)
    }

    /// Resolve a credential definition.
    pub fn get_credential_definition_with(
        &self,
        cred_def_id: &str,
        options: ResolutionOptions,
    ) -> Resolved<CredentialDefinition> {
        self.resolve_object(
            cred_def_id,
            CacheKey::object(ResourceKind::CredentialDefinition, cred_def_id),
            options,
            |records| records.credential_definition(cred_def_id).map(|r| in_requested_form(&r, cred_def_id)),
            |registry| registry.get_credential_definition(cred_def_id),
            |_| Some(CacheKey::object(ResourceKind::CredentialDefinition, cred_def_id)),
        )
    }

    /// Resolve a revocation registry definition with the service's default options.
    pub fn get_revocation_registry_definition(
        &self,
        rev_reg_def_id: &str,
    ) -> Resolved<RevocationRegistryDefinition> {
        self.get_revocation_registry_definition_with(rev_reg_def_id, self.options)
    }

    /// Resolve a revocation registry definition.
    pub fn get_revocation_registry_definition_with(
        &self,
        rev_reg_def_id: &str,
        options: ResolutionOptions,
    ) -> Resolved<RevocationRegistryDefinition> {
        self.resolve_object(
            rev_reg_def_id,
            CacheKey::object(ResourceKind::RevocationRegistryDefinition, rev_reg_def_id),
            options,
            |records| {
                records
                    .revocation_registry_definition(rev_reg_def_id)
                    .map(|r| in_requested_form(&r, rev_reg_def_id))
            },
            |registry| registry.get_revocation_registry_definition(rev_reg_def_id),
            |_| Some(CacheKey::object(ResourceKind::RevocationRegistryDefinition, rev_reg_def_id)),
        )
    }

    /// Resolve the status list current as of `timestamp` with the service's
    /// default options.
    pub fn get_revocation_status_list(
        &self,
        rev_reg_def_id: &str,
        timestamp: Timestamp,
    ) -> Resolved<RevocationStatusList> {
        self.get_revocation_status_list_with(rev_reg_def_id, timestamp, self.options)
    }

    /// Resolve the status list current as of `timestamp`.
    ///
    /// Only a snapshot taken exactly at `timestamp` is served from a local
    /// record or the cache; any other lookup asks the registry. Fetched
    /// snapshots are cached under their own timestamp.
    pub fn get_revocation_status_list_with(
        &self,
        rev_reg_def_id: &str,
        timestamp: Timestamp,
        options: ResolutionOptions,
    ) -> Resolved<RevocationStatusList> {
        self.resolve_object(
            rev_reg_def_id,
            CacheKey::status_list(rev_reg_def_id, timestamp),
            options,
            |records| {
                let list = records
                    .revocation_status_list(rev_reg_def_id, timestamp)
                    .filter(|list| list.timestamp == Some(timestamp))?;
                if identifier::identifier_form(rev_reg_def_id) == identifier::IdentifierForm::Legacy {
                    list.to_legacy().ok()
                } else {
                    Some(list)
                }
            },
            |registry| registry.get_revocation_status_list(rev_reg_def_id, timestamp),
            |list| list.timestamp.map(|published| CacheKey::status_list(rev_reg_def_id, published)),
        )
    }

    // -- registration -----------------------------------------------------------

    fn registry_for_issuer(&self, kind: ResourceKind, issuer_id: &str) -> Result<Arc<dyn Registry>, RegistryError> {
        self.resolve(issuer_id).map_err(|err| {
            tracing::warn!(%kind, issuer_id, error = %err, "no registry for issuer");
            err
        })
    }

    /// Register a schema and keep it as a local record.
    pub fn register_schema(&self, schema: &Schema) -> Result<Registered<Schema>, RegistryError> {
        let registry = self.registry_for_issuer(ResourceKind::Schema, &schema.issuer_id)?;
        let schema_id = registry.register_schema(schema)?;
        self.records.save_schema(&schema_id, schema.clone());
        tracing::info!(schema_id = %schema_id, registry = registry.method_name(), "registered schema");
        Ok(Registered::new(ObjectKind::Schema, schema_id, schema.clone()))
    }

    /// Register a credential definition. The private key and key correctness
    /// proof go to the local record store only.
    pub fn register_credential_definition(
        &self,
        definition: &CredentialDefinition,
        private: CredentialDefinitionPrivate,
        key_correctness_proof: KeyCorrectnessProof,
    ) -> Result<Registered<CredentialDefinition>, RegistryError> {
        let registry = self.registry_for_issuer(ResourceKind::CredentialDefinition, &definition.issuer_id)?;
        let cred_def_id = registry.register_credential_definition(definition)?;
        self.records.save_credential_definition(&cred_def_id, definition.clone());
        self.records.save_credential_definition_secrets(
            &cred_def_id,
            CredentialDefinitionSecrets { private, key_correctness_proof },
        );
        tracing::info!(
            cred_def_id = %cred_def_id,
            registry = registry.method_name(),
            "registered credential definition"
        );
        Ok(Registered::new(ObjectKind::CredentialDefinition, cred_def_id, definition.clone()))
    }

    /// Register a revocation registry definition. The private accumulator
    /// material goes to the local record store only.
    pub fn register_revocation_registry_definition(
        &self,
        definition: &RevocationRegistryDefinition,
        private: RevocationRegistryDefinitionPrivate,
    ) -> Result<Registered<RevocationRegistryDefinition>, RegistryError> {
        let registry =
            self.registry_for_issuer(ResourceKind::RevocationRegistryDefinition, &definition.issuer_id)?;
        let rev_reg_def_id = registry.register_revocation_registry_definition(definition)?;
        self.records.save_revocation_registry_definition(&rev_reg_def_id, definition.clone());
        self.records.save_revocation_registry_private(&rev_reg_def_id, private);
        tracing::info!(
            rev_reg_def_id = %rev_reg_def_id,
            registry = registry.method_name(),
            "registered revocation registry definition"
        );
        Ok(Registered::new(ObjectKind::RevocationRegistryDefinition, rev_reg_def_id, definition.clone()))
    }

    /// Register a status list snapshot. The returned list carries the
    /// registry-assigned timestamp.
    pub fn register_revocation_status_list(
        &self,
        list: &RevocationStatusList,
    ) -> Result<Registered<RevocationStatusList>, RegistryError> {
        let registry = self.registry_for_issuer(ResourceKind::RevocationStatusList, &list.rev_reg_def_id)?;
        let registered = registry.register_revocation_status_list(list)?;
        self.records.save_revocation_status_list(registered.clone());
        tracing::info!(
            rev_reg_def_id = %registered.rev_reg_def_id,
            timestamp = ?registered.timestamp,
            registry = registry.method_name(),
            "registered revocation status list"
        );
        Ok(Registered::new(
            ObjectKind::RevocationRegistryDefinition,
            registered.rev_reg_def_id.clone(),
            registered,
        ))
    }
}

/// A record's object in the identifier form the caller used.
fn in_requested_form<T: Resolvable>(record: &ObjectRecord<T>, requested: &str) -> T {
    if record.legacy_identifier.as_deref() == Some(requested) {
        record.object.to_legacy_form().unwrap_or_else(|_| record.object.clone())
    } else {
        record.object.clone()
    }
}

fn record_resolution(kind: ResourceKind, source: &'static str) {
    metrics::counter!(
        "ancr_registry_resolutions_total",
        "kind" => kind.as_str(),
        "source" => source
    )
    .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryRegistry;

    const NSID: &str = "LjgpST2rjsoxYegQDRm7EL";

    fn schema(issuer_id: &str) -> Schema {
        Schema {
            issuer_id: issuer_id.into(),
            name: "Employee ID".into(),
            version: "1.0".into(),
            attr_names: vec!["name".into(), "age".into()],
        }
    }

    fn service_with(registry: Arc<InMemoryRegistry>) -> RegistryService {
        RegistryService::from_config(&OrchestrationConfig::default()).with_registry(registry)
    }

    // -- registry selection -----------------------------------------------------

    #[test]
    fn first_matching_registry_wins() {
        let indy = Arc::new(InMemoryRegistry::indy());
        let cheqd = Arc::new(InMemoryRegistry::for_did_method("cheqd"));
        let service = RegistryService::from_config(&OrchestrationConfig::default())
            .with_registry(cheqd)
            .with_registry(indy);
        assert_eq!(service.resolve("did:cheqd:testnet:abc/resources/1").unwrap().method_name(), "cheqd");
        assert_eq!(service.resolve(&format!("{NSID}:2:S:1.0")).unwrap().method_name(), "indy");
        assert_eq!(
            service.resolve("did:web:example.com").unwrap_err(),
            RegistryError::NoRegistryForIdentifier("did:web:example.com".into())
        );
    }

    #[test]
    fn unmatched_identifier_is_unsupported_metadata() {
        let service = service_with(Arc::new(InMemoryRegistry::indy()));
        let resolved = service.get_schema("did:web:example.com/schemas/1");
        assert!(resolved.object.is_none());
        assert_eq!(resolved.metadata.error, Some(ResolutionErrorKind::UnsupportedMethod));
    }

    // -- resolution order -------------------------------------------------------

    #[test]
    fn registered_objects_resolve_from_record() {
        let registry = Arc::new(InMemoryRegistry::indy());
        let service = service_with(Arc::clone(&registry));
        let registered = service.register_schema(&schema(NSID)).unwrap();
        let resolved = service.get_schema(&registered.identifier);
        assert!(resolved.served_from_record());
        assert_eq!(registry.lookup_count(), 0);
    }

    #[test]
    fn second_resolution_hits_cache() {
        let registry = Arc::new(InMemoryRegistry::indy());
        let schema_id = registry.register_schema(&schema(NSID)).unwrap();
        let service = service_with(Arc::clone(&registry));

        let first = service.get_schema(&schema_id);
        assert_eq!(first.metadata.source, Some(ResolutionSource::Registry));
        let second = service.get_schema(&schema_id);
        assert!(second.served_from_cache());
        assert_eq!(registry.lookup_count(), 1);
    }

    #[test]
    fn registry_can_forbid_caching() {
        let registry = Arc::new(InMemoryRegistry::indy().without_caching());
        let schema_id = registry.register_schema(&schema(NSID)).unwrap();
        let service = service_with(Arc::clone(&registry));
        service.get_schema(&schema_id);
        service.get_schema(&schema_id);
        assert_eq!(registry.lookup_count(), 2);
        assert!(service.cache().is_empty());
    }

    #[test]
    fn uncached_options_always_ask_registry() {
        let registry = Arc::new(InMemoryRegistry::indy());
        let service = service_with(Arc::clone(&registry));
        let schema_id = service.register_schema(&schema(NSID)).unwrap().identifier;
        let resolved = service.get_schema_with(&schema_id, ResolutionOptions::uncached());
        assert_eq!(resolved.metadata.source, Some(ResolutionSource::Registry));
        assert_eq!(registry.lookup_count(), 1);
    }

    #[test]
    fn cached_object_survives_registry_outage() {
        let registry = Arc::new(InMemoryRegistry::indy());
        let schema_id = registry.register_schema(&schema(NSID)).unwrap();
        let service = service_with(Arc::clone(&registry));
        service.get_schema(&schema_id);
        registry.set_offline(true);
        assert!(service.get_schema(&schema_id).served_from_cache());
    }

    // -- failures as metadata ---------------------------------------------------

    #[test]
    fn missing_object_is_not_found_metadata() {
        let service = service_with(Arc::new(InMemoryRegistry::indy()));
        let resolved = service.get_schema(&format!("{NSID}:2:Missing:1.0"));
        assert_eq!(resolved.metadata.error, Some(ResolutionErrorKind::NotFound));
        let err = resolved.into_result().unwrap_err();
        assert_eq!(err.error, ResolutionErrorKind::NotFound);
        assert!(err.to_string().contains("Missing"));
    }

    #[test]
    fn malformed_identifier_is_invalid_metadata() {
        let service = service_with(Arc::new(InMemoryRegistry::indy()));
        let resolved = service.get_credential_definition(&format!("{NSID}:3:CL:notanumber:tag"));
        assert_eq!(resolved.metadata.error, Some(ResolutionErrorKind::Invalid));
    }

    #[test]
    fn failures_are_not_cached() {
        let registry = Arc::new(InMemoryRegistry::indy());
        let service = service_with(Arc::clone(&registry));
        let schema_id = format!("{NSID}:2:Employee ID:1.0");
        assert!(service.get_schema_with(&schema_id, ResolutionOptions { use_local_record: false, ..service.options() })
            .object
            .is_none());
        registry.register_schema(&schema(NSID)).unwrap();
        assert!(service.get_schema(&schema_id).object.is_some());
    }

    // -- dual identifier forms --------------------------------------------------

    #[test]
    fn qualified_registration_resolves_by_legacy_id() {
        let issuer = format!("did:indy:sovrin:{NSID}");
        let service = service_with(Arc::new(InMemoryRegistry::indy()));
        let registered = service.register_schema(&schema(&issuer)).unwrap();
        let legacy_id = registered.legacy_identifier.clone().unwrap();
        assert_eq!(legacy_id, format!("{NSID}:2:Employee ID:1.0"));

        let from_record = service.get_schema(&legacy_id).into_result().unwrap();
        assert_eq!(from_record.attr_names, registered.object.attr_names);
        assert_eq!(from_record.issuer_id, NSID);

        let from_registry = service
            .get_schema_with(&legacy_id, ResolutionOptions::uncached())
            .into_result()
            .unwrap();
        assert_eq!(from_registry, from_record);
    }

    #[test]
    fn private_material_stays_local() {
        let issuer = format!("did:indy:sovrin:{NSID}");
        let registry = Arc::new(InMemoryRegistry::indy());
        let service = service_with(Arc::clone(&registry));
        let schema_id = service.register_schema(&schema(&issuer)).unwrap().identifier;
        let definition = CredentialDefinition {
            issuer_id: issuer.clone(),
            schema_id,
            signature_type: "CL".into(),
            tag: "default".into(),
            value: serde_json::json!({"primary": {}}),
        };
        let registered = service
            .register_credential_definition(
                &definition,
                CredentialDefinitionPrivate { value: serde_json::json!({"secret": 1}) },
                KeyCorrectnessProof(serde_json::json!({"kcp": 1})),
            )
            .unwrap();
        let secrets = service
            .records()
            .credential_definition_secrets(registered.legacy_identifier.as_deref().unwrap())
            .unwrap();
        assert_eq!(secrets.private.value, serde_json::json!({"secret": 1}));
        assert_eq!(registry.get_credential_definition(&registered.identifier).unwrap(), definition);
    }

    // -- status lists -----------------------------------------------------------

    /// A registry holding one revocation registry definition with two slots.
    fn revocation_registry() -> (Arc<InMemoryRegistry>, String) {
        let registry = Arc::new(InMemoryRegistry::indy());
        let schema_id = registry.register_schema(&schema(NSID)).unwrap();
        let cred_def_id = registry
            .register_credential_definition(&CredentialDefinition {
                issuer_id: NSID.into(),
                schema_id,
                signature_type: "CL".into(),
                tag: "default".into(),
                value: serde_json::json!({}),
            })
            .unwrap();
        let rev_reg_id = registry
            .register_revocation_registry_definition(&RevocationRegistryDefinition {
                issuer_id: NSID.into(),
                revoc_def_type: "CL_ACCUM".into(),
                cred_def_id,
                tag: "0".into(),
                value: ancr_core::RevocationRegistryDefinitionValue {
                    public_keys: serde_json::json!({}),
                    max_cred_num: 2,
                    tails_location: "t".into(),
                    tails_hash: "h".into(),
                },
            })
            .unwrap();
        (registry, rev_reg_id)
    }

    fn status_list(rev_reg_id: &str, ts: u64, bits: Vec<u8>) -> RevocationStatusList {
        RevocationStatusList {
            issuer_id: NSID.into(),
            rev_reg_def_id: rev_reg_id.into(),
            revocation_list: bits,
            current_accumulator: format!("acc-{ts}"),
            timestamp: Some(Timestamp::from_epoch_secs(ts)),
        }
    }

    fn accumulator_as_of(service: &RegistryService, rev_reg_id: &str, ts: u64) -> Resolved<RevocationStatusList> {
        service.get_revocation_status_list(rev_reg_id, Timestamp::from_epoch_secs(ts))
    }

    #[test]
    fn status_lists_cache_under_snapshot_timestamp() {
        let (registry, rev_reg_id) = revocation_registry();
        for (ts, bits) in [(10, vec![0, 0]), (20, vec![1, 0]), (30, vec![1, 1])] {
            registry.register_revocation_status_list(&status_list(&rev_reg_id, ts, bits)).unwrap();
        }

        let service = service_with(Arc::clone(&registry));
        let at_25 = accumulator_as_of(&service, &rev_reg_id, 25);
        assert_eq!(at_25.object.unwrap().current_accumulator, "acc-20");
        let at_35 = accumulator_as_of(&service, &rev_reg_id, 35);
        assert_eq!(at_35.object.unwrap().current_accumulator, "acc-30");
        assert_eq!(registry.lookup_count(), 2);

        let exact = accumulator_as_of(&service, &rev_reg_id, 20);
        assert!(exact.served_from_cache());
        assert_eq!(exact.object.unwrap().current_accumulator, "acc-20");
        assert!(!accumulator_as_of(&service, &rev_reg_id, 25).served_from_cache());
        assert_eq!(registry.lookup_count(), 3);
    }

    #[test]
    fn later_snapshot_replaces_earlier_answer() {
        let (registry, rev_reg_id) = revocation_registry();
        for (ts, bits) in [(10, vec![0, 0]), (20, vec![1, 0])] {
            registry.register_revocation_status_list(&status_list(&rev_reg_id, ts, bits)).unwrap();
        }
        let service = service_with(Arc::clone(&registry));
        assert_eq!(accumulator_as_of(&service, &rev_reg_id, 35).object.unwrap().current_accumulator, "acc-20");

        registry.register_revocation_status_list(&status_list(&rev_reg_id, 30, vec![1, 1])).unwrap();
        let after = accumulator_as_of(&service, &rev_reg_id, 35);
        assert_eq!(after.metadata.source, Some(ResolutionSource::Registry));
        assert_eq!(after.object.unwrap().current_accumulator, "acc-30");
    }

    #[test]
    fn recorded_snapshot_serves_only_its_own_timestamp() {
        let (registry, rev_reg_id) = revocation_registry();
        let service = service_with(Arc::clone(&registry));
        service.register_revocation_status_list(&status_list(&rev_reg_id, 20, vec![0, 0])).unwrap();
        registry.register_revocation_status_list(&status_list(&rev_reg_id, 30, vec![1, 0])).unwrap();

        assert!(accumulator_as_of(&service, &rev_reg_id, 20).served_from_record());
        let later = accumulator_as_of(&service, &rev_reg_id, 35);
        assert!(!later.served_from_record());
        assert_eq!(later.object.unwrap().current_accumulator, "acc-30");
    }

    #[test]
    fn metadata_serializes_camel_case() {
        let metadata = ResolutionMetadata {
            error: Some(ResolutionErrorKind::UnsupportedMethod),
            message: Some("x".into()),
            source: None,
        };
        assert_eq!(
            serde_json::to_value(&metadata).unwrap(),
            serde_json::json!({"error": "unsupportedMethod", "message": "x"})
        );
    }
}

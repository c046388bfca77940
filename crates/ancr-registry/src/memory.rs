//! # In-Memory Registry
//!
//! A complete [`Registry`] held in process memory. It backs tests, the
//! CLI demo and single-process deployments.
//!
//! Two identifier styles are supported:
//!
//! - [`InMemoryRegistry::indy`] assigns ledger-style identifiers. Schemas
//!   receive a sequence number on registration; credential definition and
//!   revocation registry identifiers embed it. Issuers with a `did:indy`
//!   DID receive qualified identifiers, legacy issuers legacy ones. Either
//!   form resolves the same object.
//! - [`InMemoryRegistry::for_did_method`] assigns opaque resource
//!   identifiers `<issuerDid>/resources/<uuid>` for one DID method.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::RwLock;

use ancr_core::identifier::{
    self, identifier_form, parse_credential_definition_id, IdentifierForm, ObjectKind,
    RevocationRegistryIdParts,
};
use ancr_core::{
    CredentialDefinition, RevocationRegistryDefinition, RevocationStatusList, Schema, Timestamp,
};

use crate::cache::Resolvable;
use crate::registry::{IdentifierPattern, Registry, RegistryError, ResourceKind};

#[derive(Debug, Clone)]
struct Entry<T> {
    identifier: String,
    object: T,
}

#[derive(Debug, Default)]
struct State {
    next_seq_no: u64,
    schemas: HashMap<String, (u64, Entry<Schema>)>,
    credential_definitions: HashMap<String, Entry<CredentialDefinition>>,
    revocation_registry_definitions: HashMap<String, Entry<RevocationRegistryDefinition>>,
    status_lists: HashMap<String, BTreeMap<Timestamp, RevocationStatusList>>,
}

/// An in-process registry.
#[derive(Debug)]
pub struct InMemoryRegistry {
    name: String,
    pattern: IdentifierPattern,
    caching: bool,
    offline: AtomicBool,
    lookups: AtomicU64,
    state: RwLock<State>,
}

fn object_kind(kind: ResourceKind) -> ObjectKind {
    match kind {
        ResourceKind::Schema => ObjectKind::Schema,
        ResourceKind::CredentialDefinition => ObjectKind::CredentialDefinition,
        ResourceKind::RevocationRegistryDefinition | ResourceKind::RevocationStatusList => {
            ObjectKind::RevocationRegistryDefinition
        }
    }
}

impl InMemoryRegistry {
    fn with_pattern(name: &str, pattern: IdentifierPattern) -> Self {
        Self {
            name: name.to_string(),
            pattern,
            caching: true,
            offline: AtomicBool::new(false),
            lookups: AtomicU64::new(0),
            state: RwLock::new(State { next_seq_no: 1, ..State::default() }),
        }
    }

    /// A registry for legacy and `did:indy` identifiers.
    pub fn indy() -> Self {
        Self::with_pattern("indy", IdentifierPattern::Indy)
    }

    /// A registry for identifiers of one DID method.
    pub fn for_did_method(method: &str) -> Self {
        Self::with_pattern(method, IdentifierPattern::DidMethod(method.to_string()))
    }

    /// Forbid the resolution layer from caching this registry's objects.
    pub fn without_caching(mut self) -> Self {
        self.caching = false;
        self
    }

    /// Simulate an unreachable backend: every call fails with
    /// [`RegistryError::Backend`] while set.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of get calls served so far.
    pub fn lookup_count(&self) -> u64 {
        self.lookups.load(Ordering::SeqCst)
    }

    /// Sequence number assigned to a registered schema.
    pub fn schema_seq_no(&self, schema_id: &str) -> Option<u64> {
        let key = self.storage_key(ResourceKind::Schema, schema_id);
        self.state.read().schemas.get(&key).map(|(seq_no, _)| *seq_no)
    }

    fn check_online(&self) -> Result<(), RegistryError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(RegistryError::Backend(format!("registry {} is offline", self.name)));
        }
        Ok(())
    }

    fn check_supported(&self, identifier: &str) -> Result<(), RegistryError> {
        self.check_online()?;
        if self.supports_identifier(identifier) {
            Ok(())
        } else {
            Err(RegistryError::UnsupportedMethod {
                registry: self.name.clone(),
                identifier: identifier.to_string(),
            })
        }
    }

    /// Both identifier forms of an indy object share one storage slot.
    fn storage_key(&self, kind: ResourceKind, identifier: &str) -> String {
        match self.pattern {
            IdentifierPattern::Indy => identifier::to_legacy(object_kind(kind), identifier)
                .unwrap_or_else(|_| identifier.to_string()),
            IdentifierPattern::DidMethod(_) => identifier.to_string(),
        }
    }

    fn begin_lookup(&self, kind: ResourceKind, identifier: &str) -> Result<String, RegistryError> {
        self.check_supported(identifier)?;
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.pattern == IdentifierPattern::Indy {
            identifier::to_legacy(object_kind(kind), identifier)
                .map_err(|err| RegistryError::from_identifier(kind, identifier, err))?;
        }
        Ok(self.storage_key(kind, identifier))
    }

    fn not_found(kind: ResourceKind, identifier: &str) -> RegistryError {
        RegistryError::NotFound { kind, identifier: identifier.to_string() }
    }

    fn invalid(kind: ResourceKind, identifier: &str, reason: impl Into<String>) -> RegistryError {
        RegistryError::Invalid { kind, identifier: identifier.to_string(), reason: reason.into() }
    }

    /// The object in the identifier form the caller used.
    fn in_requested_form<T: Resolvable>(
        stored_identifier: &str,
        requested: &str,
        object: &T,
    ) -> Result<T, RegistryError> {
        let wants_legacy = identifier_form(requested) == IdentifierForm::Legacy;
        let stored_legacy = identifier_form(stored_identifier) == IdentifierForm::Legacy;
        if wants_legacy && !stored_legacy {
            object
                .to_legacy_form()
                .map_err(|err| RegistryError::from_identifier(T::KIND, requested, err))
        } else {
            Ok(object.clone())
        }
    }

    fn resource_identifier(issuer_id: &str) -> String {
        format!("{issuer_id}/resources/{}", uuid::Uuid::new_v4())
    }

    fn indy_issuer(kind: ResourceKind, issuer_id: &str) -> Result<identifier::DidParts, RegistryError> {
        identifier::parse_did(issuer_id).map_err(|err| RegistryError::from_identifier(kind, issuer_id, err))
    }

    /// Qualify a legacy identifier when the issuer used a `did:indy` DID.
    fn issuer_form(
        kind: ResourceKind,
        legacy_id: String,
        namespace: Option<&str>,
    ) -> Result<String, RegistryError> {
        match namespace {
            Some(namespace) => identifier::to_qualified(object_kind(kind), &legacy_id, Some(namespace))
                .map_err(|err| RegistryError::from_identifier(kind, &legacy_id, err)),
            None => Ok(legacy_id),
        }
    }
}

impl Registry for InMemoryRegistry {
    fn method_name(&self) -> &str {
        &self.name
    }

    fn supports_identifier(&self, identifier: &str) -> bool {
        self.pattern.matches(identifier)
    }

    fn allows_caching(&self) -> bool {
        self.caching
    }

    fn get_schema(&self, schema_id: &str) -> Result<Schema, RegistryError> {
        let kind = ResourceKind::Schema;
        let key = self.begin_lookup(kind, schema_id)?;
        let state = self.state.read();
        let (_, entry) = state.schemas.get(&key).ok_or_else(|| Self::not_found(kind, schema_id))?;
        Self::in_requested_form(&entry.identifier, schema_id, &entry.object)
    }

    fn get_credential_definition(&self, cred_def_id: &str) -> Result<CredentialDefinition, RegistryError> {
        let kind = ResourceKind::CredentialDefinition;
        let key = self.begin_lookup(kind, cred_def_id)?;
        let state = self.state.read();
        let entry = state
            .credential_definitions
            .get(&key)
            .ok_or_else(|| Self::not_found(kind, cred_def_id))?;
        Self::in_requested_form(&entry.identifier, cred_def_id, &entry.object)
    }

    fn get_revocation_registry_definition(
        &self,
        rev_reg_def_id: &str,
    ) -> Result<RevocationRegistryDefinition, RegistryError> {
        let kind = ResourceKind::RevocationRegistryDefinition;
        let key = self.begin_lookup(kind, rev_reg_def_id)?;
        let state = self.state.read();
        let entry = state
            .revocation_registry_definitions
            .get(&key)
            .ok_or_else(|| Self::not_found(kind, rev_reg_def_id))?;
        Self::in_requested_form(&entry.identifier, rev_reg_def_id, &entry.object)
    }

    fn get_revocation_status_list(
        &self,
        rev_reg_def_id: &str,
        timestamp: Timestamp,
    ) -> Result<RevocationStatusList, RegistryError> {
        let kind = ResourceKind::RevocationStatusList;
        let key = self.begin_lookup(kind, rev_reg_def_id)?;
        let state = self.state.read();
        let list = state
            .status_lists
            .get(&key)
            .and_then(|timeline| timeline.range(..=timestamp).next_back())
            .map(|(_, list)| list)
            .ok_or_else(|| Self::not_found(kind, rev_reg_def_id))?;
        Self::in_requested_form(&list.rev_reg_def_id, rev_reg_def_id, list)
    }

    fn register_schema(&self, schema: &Schema) -> Result<String, RegistryError> {
        let kind = ResourceKind::Schema;
        self.check_supported(&schema.issuer_id)?;
        if schema.attr_names.is_empty() {
            return Err(Self::invalid(kind, &schema.name, "schema has no attributes"));
        }

        let identifier = match &self.pattern {
            IdentifierPattern::Indy => {
                let issuer = Self::indy_issuer(kind, &schema.issuer_id)?;
                let legacy = identifier::legacy_schema_id(
                    &issuer.namespace_identifier,
                    &schema.name,
                    &schema.version,
                );
                identifier::parse_schema_id(&legacy)
                    .map_err(|err| RegistryError::from_identifier(kind, &legacy, err))?;
                Self::issuer_form(kind, legacy, issuer.namespace.as_deref())?
            }
            IdentifierPattern::DidMethod(_) => Self::resource_identifier(&schema.issuer_id),
        };

        let key = self.storage_key(kind, &identifier);
        let mut state = self.state.write();
        if let Some((_, existing)) = state.schemas.get(&key) {
            return if existing.object == *schema {
                Ok(existing.identifier.clone())
            } else {
                Err(Self::invalid(kind, &identifier, "a different schema is registered under this identifier"))
            };
        }
        let seq_no = state.next_seq_no;
        state.next_seq_no += 1;
        state
            .schemas
            .insert(key, (seq_no, Entry { identifier: identifier.clone(), object: schema.clone() }));
        Ok(identifier)
    }

    fn register_credential_definition(
        &self,
        definition: &CredentialDefinition,
    ) -> Result<String, RegistryError> {
        let kind = ResourceKind::CredentialDefinition;
        self.check_supported(&definition.issuer_id)?;

        let identifier = match &self.pattern {
            IdentifierPattern::Indy => {
                let issuer = Self::indy_issuer(kind, &definition.issuer_id)?;
                let seq_no = self.schema_seq_no(&definition.schema_id).ok_or_else(|| {
                    Self::invalid(kind, &definition.schema_id, "schema is not registered")
                })?;
                let legacy = identifier::legacy_credential_definition_id(
                    &issuer.namespace_identifier,
                    seq_no,
                    &definition.tag,
                );
                identifier::parse_credential_definition_id(&legacy)
                    .map_err(|err| RegistryError::from_identifier(kind, &legacy, err))?;
                Self::issuer_form(kind, legacy, issuer.namespace.as_deref())?
            }
            IdentifierPattern::DidMethod(_) => Self::resource_identifier(&definition.issuer_id),
        };

        let key = self.storage_key(kind, &identifier);
        let mut state = self.state.write();
        if let Some(existing) = state.credential_definitions.get(&key) {
            return if existing.object == *definition {
                Ok(existing.identifier.clone())
            } else {
                Err(Self::invalid(
                    kind,
                    &identifier,
                    "a different credential definition is registered under this identifier",
                ))
            };
        }
        state
            .credential_definitions
            .insert(key, Entry { identifier: identifier.clone(), object: definition.clone() });
        Ok(identifier)
    }

    fn register_revocation_registry_definition(
        &self,
        definition: &RevocationRegistryDefinition,
    ) -> Result<String, RegistryError> {
        let kind = ResourceKind::RevocationRegistryDefinition;
        self.check_supported(&definition.issuer_id)?;
        if definition.max_cred_num() == 0 {
            return Err(Self::invalid(kind, &definition.tag, "maxCredNum must be positive"));
        }
        {
            let state = self.state.read();
            let cred_def_key = self.storage_key(ResourceKind::CredentialDefinition, &definition.cred_def_id);
            if !state.credential_definitions.contains_key(&cred_def_key) {
                return Err(Self::invalid(
                    kind,
                    &definition.cred_def_id,
                    "credential definition is not registered",
                ));
            }
        }

        let identifier = match &self.pattern {
            IdentifierPattern::Indy => {
                let issuer = Self::indy_issuer(kind, &definition.issuer_id)?;
                let cred_def = parse_credential_definition_id(&definition.cred_def_id)
                    .map_err(|err| RegistryError::from_identifier(kind, &definition.cred_def_id, err))?;
                let parts = RevocationRegistryIdParts {
                    namespace: issuer.namespace.clone(),
                    namespace_identifier: issuer.namespace_identifier.clone(),
                    schema_seq_no: cred_def.schema_seq_no,
                    credential_definition_tag: cred_def.tag,
                    revocation_registry_tag: definition.tag.clone(),
                };
                Self::issuer_form(kind, parts.to_legacy(), issuer.namespace.as_deref())?
            }
            IdentifierPattern::DidMethod(_) => Self::resource_identifier(&definition.issuer_id),
        };

        let key = self.storage_key(kind, &identifier);
        let mut state = self.state.write();
        if let Some(existing) = state.revocation_registry_definitions.get(&key) {
            return if existing.object == *definition {
                Ok(existing.identifier.clone())
            } else {
                Err(Self::invalid(
                    kind,
                    &identifier,
                    "a different revocation registry is registered under this identifier",
                ))
            };
        }
        state
            .revocation_registry_definitions
            .insert(key, Entry { identifier: identifier.clone(), object: definition.clone() });
        Ok(identifier)
    }

    fn register_revocation_status_list(
        &self,
        list: &RevocationStatusList,
    ) -> Result<RevocationStatusList, RegistryError> {
        let kind = ResourceKind::RevocationStatusList;
        self.check_supported(&list.rev_reg_def_id)?;
        let key = self.storage_key(kind, &list.rev_reg_def_id);

        let mut state = self.state.write();
        let max_cred_num = state
            .revocation_registry_definitions
            .get(&key)
            .map(|entry| entry.object.max_cred_num())
            .ok_or_else(|| {
                Self::invalid(kind, &list.rev_reg_def_id, "revocation registry is not registered")
            })?;
        if list.revocation_list.len() != max_cred_num as usize {
            return Err(Self::invalid(
                kind,
                &list.rev_reg_def_id,
                format!(
                    "status list has {} entries, registry has {max_cred_num}",
                    list.revocation_list.len()
                ),
            ));
        }
        if list.revocation_list.iter().any(|bit| *bit > 1) {
            return Err(Self::invalid(kind, &list.rev_reg_def_id, "status list entries must be 0 or 1"));
        }

        let timestamp = list.timestamp.unwrap_or_else(Timestamp::now);
        let registered = RevocationStatusList { timestamp: Some(timestamp), ..list.clone() };
        let timeline = state.status_lists.entry(key).or_default();
        if let Some((latest, existing)) = timeline.iter().next_back() {
            if *latest == timestamp && *existing == registered {
                return Ok(registered);
            }
            if *latest >= timestamp {
                return Err(Self::invalid(
                    kind,
                    &list.rev_reg_def_id,
                    format!("timestamp {timestamp} is not after the latest snapshot at {latest}"),
                ));
            }
        }
        timeline.insert(timestamp, registered.clone());
        Ok(registered)
    }
}

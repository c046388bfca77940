//! # Local Record Store
//!
//! Objects this process registered, kept so they resolve without a
//! registry round trip. Every record is indexed under its identifier as
//! registered and, when one exists, under its legacy form. Both strings
//! are computed once when the record is written.
//!
//! Private material (credential definition keys, key correctness proofs,
//! revocation registry secrets) lives here and only here: it is never
//! handed to a registry and never cached.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::RwLock;

use ancr_core::identifier::{self, ObjectKind};
use ancr_core::{
    CredentialDefinition, CredentialDefinitionPrivate, KeyCorrectnessProof,
    RevocationRegistryDefinition, RevocationRegistryDefinitionPrivate, RevocationStatusList,
    Schema, Timestamp,
};

/// A stored object with both identifier forms.
#[derive(Debug, Clone)]
pub struct ObjectRecord<T> {
    /// Identifier as registered.
    pub identifier: String,
    /// Legacy equivalent, when the identifier has one.
    pub legacy_identifier: Option<String>,
    /// The object.
    pub object: T,
    /// When the record was written.
    pub created_at: Timestamp,
}

impl<T> ObjectRecord<T> {
    /// Build a record, deriving the legacy identifier from `kind`.
    pub fn new(kind: ObjectKind, identifier: &str, object: T) -> Self {
        let (identifier, legacy) = identifier::with_legacy_form(kind, identifier);
        let legacy_identifier = legacy.filter(|legacy| *legacy != identifier);
        Self { identifier, legacy_identifier, object, created_at: Timestamp::now() }
    }

    /// True when `id` is either form of this record's identifier.
    pub fn matches(&self, id: &str) -> bool {
        self.identifier == id || self.legacy_identifier.as_deref() == Some(id)
    }
}

/// Issuer-only material of a credential definition.
#[derive(Debug, Clone)]
pub struct CredentialDefinitionSecrets {
    /// Private signing key material.
    pub private: CredentialDefinitionPrivate,
    /// Key correctness proof, embedded in credential offers.
    pub key_correctness_proof: KeyCorrectnessProof,
}

/// One table of records indexed under both identifier forms.
#[derive(Debug)]
struct RecordTable<T> {
    records: RwLock<HashMap<String, Arc<ObjectRecord<T>>>>,
}

impl<T> Default for RecordTable<T> {
    fn default() -> Self {
        Self { records: RwLock::new(HashMap::new()) }
    }
}

impl<T: Clone> RecordTable<T> {
    fn insert(&self, record: ObjectRecord<T>) {
        let record = Arc::new(record);
        let mut records = self.records.write();
        if let Some(legacy) = &record.legacy_identifier {
            records.insert(legacy.clone(), Arc::clone(&record));
        }
        records.insert(record.identifier.clone(), record);
    }

    fn get(&self, id: &str) -> Option<ObjectRecord<T>> {
        self.records.read().get(id).map(|record| ObjectRecord::clone(record))
    }

    fn list(&self) -> Vec<ObjectRecord<T>> {
        let records = self.records.read();
        let mut seen: BTreeMap<&str, &Arc<ObjectRecord<T>>> = BTreeMap::new();
        for record in records.values() {
            seen.entry(record.identifier.as_str()).or_insert(record);
        }
        seen.into_values().map(|record| ObjectRecord::clone(record)).collect()
    }
}

/// Status list snapshots of one registry, ordered by timestamp.
#[derive(Debug, Default)]
struct StatusListTimeline {
    by_registry: RwLock<HashMap<String, BTreeMap<Timestamp, RevocationStatusList>>>,
}

#[derive(Debug, Default)]
struct Tables {
    schemas: RecordTable<Schema>,
    credential_definitions: RecordTable<CredentialDefinition>,
    credential_definition_secrets: RecordTable<CredentialDefinitionSecrets>,
    revocation_registry_definitions: RecordTable<RevocationRegistryDefinition>,
    revocation_registry_privates: RecordTable<RevocationRegistryDefinitionPrivate>,
    status_lists: StatusListTimeline,
}

/// Thread-safe, cloneable store of locally registered objects. Clones
/// share storage.
#[derive(Debug, Clone, Default)]
pub struct LocalRecordStore {
    tables: Arc<Tables>,
}

/// Key status list timelines by legacy form so either form finds them.
fn timeline_key(rev_reg_def_id: &str) -> String {
    identifier::to_legacy(ObjectKind::RevocationRegistryDefinition, rev_reg_def_id)
        .unwrap_or_else(|_| rev_reg_def_id.to_string())
}

impl LocalRecordStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    // -- schemas ----------------------------------------------------------------

    /// Record a registered schema.
    pub fn save_schema(&self, schema_id: &str, schema: Schema) {
        self.tables.schemas.insert(ObjectRecord::new(ObjectKind::Schema, schema_id, schema));
    }

    /// Find a schema by either identifier form.
    pub fn schema(&self, schema_id: &str) -> Option<ObjectRecord<Schema>> {
        self.tables.schemas.get(schema_id)
    }

    /// Every recorded schema.
    pub fn schemas(&self) -> Vec<ObjectRecord<Schema>> {
        self.tables.schemas.list()
    }

    // -- credential definitions -------------------------------------------------

    /// Record a registered credential definition.
    pub fn save_credential_definition(&self, cred_def_id: &str, definition: CredentialDefinition) {
        self.tables.credential_definitions.insert(ObjectRecord::new(
            ObjectKind::CredentialDefinition,
            cred_def_id,
            definition,
        ));
    }

    /// Find a credential definition by either identifier form.
    pub fn credential_definition(&self, cred_def_id: &str) -> Option<ObjectRecord<CredentialDefinition>> {
        self.tables.credential_definitions.get(cred_def_id)
    }

    /// Every recorded credential definition.
    pub fn credential_definitions(&self) -> Vec<ObjectRecord<CredentialDefinition>> {
        self.tables.credential_definitions.list()
    }

    /// Record the private material of a credential definition.
    pub fn save_credential_definition_secrets(&self, cred_def_id: &str, secrets: CredentialDefinitionSecrets) {
        self.tables.credential_definition_secrets.insert(ObjectRecord::new(
            ObjectKind::CredentialDefinition,
            cred_def_id,
            secrets,
        ));
    }

    /// Private material of a credential definition.
    pub fn credential_definition_secrets(&self, cred_def_id: &str) -> Option<CredentialDefinitionSecrets> {
        self.tables.credential_definition_secrets.get(cred_def_id).map(|r| r.object)
    }

    // -- revocation registries --------------------------------------------------

    /// Record a registered revocation registry definition.
    pub fn save_revocation_registry_definition(
        &self,
        rev_reg_def_id: &str,
        definition: RevocationRegistryDefinition,
    ) {
        self.tables.revocation_registry_definitions.insert(ObjectRecord::new(
            ObjectKind::RevocationRegistryDefinition,
            rev_reg_def_id,
            definition,
        ));
    }

    /// Find a revocation registry definition by either identifier form.
    pub fn revocation_registry_definition(
        &self,
        rev_reg_def_id: &str,
    ) -> Option<ObjectRecord<RevocationRegistryDefinition>> {
        self.tables.revocation_registry_definitions.get(rev_reg_def_id)
    }

    /// Every recorded revocation registry definition.
    pub fn revocation_registry_definitions(&self) -> Vec<ObjectRecord<RevocationRegistryDefinition>> {
        self.tables.revocation_registry_definitions.list()
    }

    /// Record the private material of a revocation registry.
    pub fn save_revocation_registry_private(
        &self,
        rev_reg_def_id: &str,
        private: RevocationRegistryDefinitionPrivate,
    ) {
        self.tables.revocation_registry_privates.insert(ObjectRecord::new(
            ObjectKind::RevocationRegistryDefinition,
            rev_reg_def_id,
            private,
        ));
    }

    /// Private material of a revocation registry.
    pub fn revocation_registry_private(
        &self,
        rev_reg_def_id: &str,
    ) -> Option<RevocationRegistryDefinitionPrivate> {
        self.tables.revocation_registry_privates.get(rev_reg_def_id).map(|r| r.object)
    }

    // -- status lists -----------------------------------------------------------

    /// Record a registered status list snapshot. Lists without a timestamp
    /// are ignored: only registered snapshots are recorded.
    pub fn save_revocation_status_list(&self, list: RevocationStatusList) {
        let Some(timestamp) = list.timestamp else {
            return;
        };
        self.tables
            .status_lists
            .by_registry
            .write()
            .entry(timeline_key(&list.rev_reg_def_id))
            .or_default()
            .insert(timestamp, list);
    }

    /// The recorded snapshot current as of `timestamp`.
    pub fn revocation_status_list(
        &self,
        rev_reg_def_id: &str,
        timestamp: Timestamp,
    ) -> Option<RevocationStatusList> {
        self.tables
            .status_lists
            .by_registry
            .read()
            .get(&timeline_key(rev_reg_def_id))
            .and_then(|timeline| timeline.range(..=timestamp).next_back())
            .map(|(_, list)| list.clone())
    }

    /// The latest recorded snapshot of a registry.
    pub fn latest_revocation_status_list(&self, rev_reg_def_id: &str) -> Option<RevocationStatusList> {
        self.tables
            .status_lists
            .by_registry
            .read()
            .get(&timeline_key(rev_reg_def_id))
            .and_then(|timeline| timeline.values().next_back())
            .cloned()
    }
}

//! # Credential Store
//!
//! The holder wallet contract the proof assembler and credential search
//! depend on, plus an in-memory implementation that evaluates compiled
//! queries against record tags.

use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;

use crate::query::Query;
use crate::record::CredentialRecord;

/// Credential store failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No record with this id.
    #[error("credential {0} not found")]
    NotFound(String),

    /// Storage backend failure.
    #[error("credential store backend error: {0}")]
    Backend(String),
}

/// Holder-side credential storage.
pub trait CredentialStore: Send + Sync {
    /// Insert or replace the record with the same credential id.
    fn save(&self, record: CredentialRecord) -> Result<(), StoreError>;

    /// The record with this credential id.
    fn get(&self, credential_id: &str) -> Result<CredentialRecord, StoreError>;

    /// Records matching `query`, every record when `None`. Insertion order.
    fn find(&self, query: Option<&Query>) -> Result<Vec<CredentialRecord>, StoreError>;

    /// Remove a record.
    fn delete(&self, credential_id: &str) -> Result<(), StoreError>;
}

/// In-memory [`CredentialStore`]. Clones share storage.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCredentialStore {
    records: Arc<RwLock<Vec<CredentialRecord>>>,
}

impl InMemoryCredentialStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored credentials.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// True when nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl CredentialStore for InMemoryCredentialStore {
    fn save(&self, record: CredentialRecord) -> Result<(), StoreError> {
        let mut records = self.records.write();
        match records.iter_mut().find(|r| r.credential_id == record.credential_id) {
            Some(existing) => *existing = record,
            None => records.push(record),
        }
        Ok(())
    }

    fn get(&self, credential_id: &str) -> Result<CredentialRecord, StoreError> {
        self.records
            .read()
            .iter()
            .find(|r| r.credential_id == credential_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(credential_id.to_string()))
    }

    fn find(&self, query: Option<&Query>) -> Result<Vec<CredentialRecord>, StoreError> {
        let records = self.records.read();
        let found: Vec<CredentialRecord> = records
            .iter()
            .filter(|r| query.map_or(true, |q| q.matches(&r.tags)))
            .cloned()
            .collect();
        tracing::debug!(query = ?query.map(ToString::to_string), matched = found.len(), "credential search");
        Ok(found)
    }

    fn delete(&self, credential_id: &str) -> Result<(), StoreError> {
        let mut records = self.records.write();
        let before = records.len();
        records.retain(|r| r.credential_id != credential_id);
        if records.len() == before {
            return Err(StoreError::NotFound(credential_id.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::tags;
    use ancr_core::{AttributeValue, Credential, Schema};

    fn record(id: &str, schema_name: &str) -> CredentialRecord {
        let issuer = "LjgpST2rjsoxYegQDRm7EL";
        let credential = Credential {
            schema_id: format!("{issuer}:2:{schema_name}:1.0"),
            cred_def_id: format!("{issuer}:3:CL:15:default"),
            rev_reg_id: None,
            values: [("name".to_string(), AttributeValue::from_raw("Alice"))].into_iter().collect(),
            signature: serde_json::Value::Null,
            signature_correctness_proof: serde_json::Value::Null,
            rev_reg: None,
            witness: None,
        };
        let schema = Schema {
            issuer_id: issuer.into(),
            name: schema_name.into(),
            version: "1.0".into(),
            attr_names: vec!["name".into()],
        };
        CredentialRecord::new(id, credential, "default", None, &schema, issuer)
    }

    #[test]
    fn save_replaces_by_id_and_keeps_order() {
        let store = InMemoryCredentialStore::new();
        store.save(record("a", "S")).unwrap();
        store.save(record("b", "T")).unwrap();
        store.save(record("a", "U")).unwrap();
        let all = store.find(None).unwrap();
        assert_eq!(all.iter().map(|r| r.credential_id.as_str()).collect::<Vec<_>>(), ["a", "b"]);
        assert_eq!(store.get("a").unwrap().tags[tags::SCHEMA_NAME], "U");
    }

    #[test]
    fn find_filters_by_query() {
        let store = InMemoryCredentialStore::new();
        store.save(record("a", "S")).unwrap();
        store.save(record("b", "T")).unwrap();
        let found = store.find(Some(&Query::eq(tags::SCHEMA_NAME, "T"))).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].credential_id, "b");
    }

    #[test]
    fn missing_records() {
        let store = InMemoryCredentialStore::new();
        assert_eq!(store.get("x"), Err(StoreError::NotFound("x".into())));
        assert_eq!(store.delete("x"), Err(StoreError::NotFound("x".into())));
        store.save(record("x", "S")).unwrap();
        store.delete("x").unwrap();
        assert!(store.is_empty());
    }
}

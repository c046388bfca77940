//! # Resolution Cache
//!
//! Process-scoped cache of resolved objects keyed by
//! `(kind, identifier, timestamp)`. The cache is created empty and passed
//! explicitly to the resolution layer; there is no global instance.
//!
//! Entries are immutable per key (the registry data behind an identifier,
//! or an identifier and timestamp, never changes), so concurrent writers to
//! the same key are last-writer-wins without affecting readers.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use ancr_core::{
    CredentialDefinition, IdentifierError, RevocationRegistryDefinition, RevocationStatusList,
    Schema, Timestamp,
};

use crate::registry::ResourceKind;

/// An object the resolution layer can resolve, cache and record.
pub trait Resolvable: Clone + Send + Sync + Sized {
    /// The kind label for logs, metrics and errors.
    const KIND: ResourceKind;

    /// Wrap for storage in the cache.
    fn into_cached(self) -> CachedObject;

    /// Unwrap from the cache; `None` when the entry holds another kind.
    fn from_cached(cached: CachedObject) -> Option<Self>;

    /// The object with its embedded identifiers rewritten to legacy form.
    fn to_legacy_form(&self) -> Result<Self, IdentifierError>;
}

/// A cached object of any kind.
#[derive(Debug, Clone, PartialEq)]
pub enum CachedObject {
    /// A schema.
    Schema(Schema),
    /// A credential definition.
    CredentialDefinition(CredentialDefinition),
    /// A revocation registry definition.
    RevocationRegistryDefinition(RevocationRegistryDefinition),
    /// A status list snapshot.
    RevocationStatusList(RevocationStatusList),
}

macro_rules! resolvable {
    ($ty:ty, $variant:ident) => {
        impl Resolvable for $ty {
            const KIND: ResourceKind = ResourceKind::$variant;

            fn into_cached(self) -> CachedObject {
                CachedObject::$variant(self)
            }

            fn from_cached(cached: CachedObject) -> Option<Self> {
                match cached {
                    CachedObject::$variant(object) => Some(object),
                    _ => None,
                }
            }

            fn to_legacy_form(&self) -> Result<Self, IdentifierError> {
                self.to_legacy()
            }
        }
    };
}

resolvable!(Schema, Schema);
resolvable!(CredentialDefinition, CredentialDefinition);
resolvable!(RevocationRegistryDefinition, RevocationRegistryDefinition);
resolvable!(RevocationStatusList, RevocationStatusList);

/// Cache key. `timestamp` is the requested point in time for status lists
/// and `None` otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Object kind.
    pub kind: ResourceKind,
    /// Identifier exactly as requested.
    pub identifier: String,
    /// Requested time, for status lists.
    pub timestamp: Option<Timestamp>,
}

impl CacheKey {
    /// Key for an object without a time dimension.
    pub fn object(kind: ResourceKind, identifier: &str) -> Self {
        Self { kind, identifier: identifier.to_string(), timestamp: None }
    }

    /// Key for a status list as of `timestamp`.
    pub fn status_list(identifier: &str, timestamp: Timestamp) -> Self {
        Self {
            kind: ResourceKind::RevocationStatusList,
            identifier: identifier.to_string(),
            timestamp: Some(timestamp),
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    object: CachedObject,
    expires_at: Timestamp,
}

/// Thread-safe, cloneable TTL cache. Clones share storage.
#[derive(Debug, Clone, Default)]
pub struct ResolutionCache {
    entries: Arc<RwLock<HashMap<CacheKey, CacheEntry>>>,
}

impl ResolutionCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached object under `key` if it has not expired at `now`.
    pub fn get(&self, key: &CacheKey, now: Timestamp) -> Option<CachedObject> {
        self.entries
            .read()
            .get(key)
            .filter(|entry| entry.expires_at > now)
            .map(|entry| entry.object.clone())
    }

    /// Typed lookup.
    pub fn get_as<T: Resolvable>(&self, key: &CacheKey, now: Timestamp) -> Option<T> {
        self.get(key, now).and_then(T::from_cached)
    }

    /// Store `object` under `key` for `ttl_secs` from `now`.
    pub fn insert(&self, key: CacheKey, object: CachedObject, ttl_secs: u64, now: Timestamp) {
        let entry = CacheEntry { object, expires_at: now.plus_secs(ttl_secs) };
        self.entries.write().insert(key, entry);
    }

    /// Remove one entry.
    pub fn remove(&self, key: &CacheKey) -> Option<CachedObject> {
        self.entries.write().remove(key).map(|entry| entry.object)
    }

    /// Drop every entry expired at `now`; returns how many were dropped.
    pub fn purge_expired(&self, now: Timestamp) -> usize {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        before - entries.len()
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Number of entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

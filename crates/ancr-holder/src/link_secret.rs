//! Link secrets held by this wallet, by id. The first one created becomes
//! the default.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;

use ancr_core::LinkSecret;
use ancr_engine::ProofEngine;

use crate::error::HolderError;

#[derive(Default)]
struct Secrets {
    by_id: BTreeMap<String, LinkSecret>,
    default_id: Option<String>,
}

/// Link secret storage. Clones share storage.
#[derive(Clone, Default)]
pub struct LinkSecretStore {
    inner: Arc<RwLock<Secrets>>,
}

impl std::fmt::Debug for LinkSecretStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("LinkSecretStore")
            .field("ids", &inner.by_id.keys().collect::<Vec<_>>())
            .field("default_id", &inner.default_id)
            .finish()
    }
}

impl LinkSecretStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a link secret. `value` defaults to a fresh secret from
    /// `engine`, `link_secret_id` to a random UUID. Returns the id.
    pub fn create(
        &self,
        engine: &dyn ProofEngine,
        link_secret_id: Option<&str>,
        value: Option<LinkSecret>,
    ) -> Result<String, HolderError> {
        let id = link_secret_id.map(str::to_string).unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let secret = match value {
            Some(secret) => secret,
            None => engine.create_link_secret()?,
        };
        let mut inner = self.inner.write();
        if inner.by_id.contains_key(&id) {
            return Err(HolderError::LinkSecretExists(id));
        }
        inner.by_id.insert(id.clone(), secret);
        if inner.default_id.is_none() {
            inner.default_id = Some(id.clone());
        }
        tracing::info!(link_secret_id = %id, "link secret created");
        Ok(id)
    }

    /// The link secret with this id.
    pub fn get(&self, link_secret_id: &str) -> Result<LinkSecret, HolderError> {
        self.inner
            .read()
            .by_id
            .get(link_secret_id)
            .cloned()
            .ok_or_else(|| HolderError::LinkSecretNotFound(link_secret_id.to_string()))
    }

    /// Id of the default link secret.
    pub fn default_id(&self) -> Option<String> {
        self.inner.read().default_id.clone()
    }

    /// Make an existing link secret the default.
    pub fn set_default(&self, link_secret_id: &str) -> Result<(), HolderError> {
        let mut inner = self.inner.write();
        if !inner.by_id.contains_key(link_secret_id) {
            return Err(HolderError::LinkSecretNotFound(link_secret_id.to_string()));
        }
        inner.default_id = Some(link_secret_id.to_string());
        Ok(())
    }

    /// `link_secret_id`, or the default when `None`.
    pub fn resolve_id(&self, link_secret_id: Option<&str>) -> Result<String, HolderError> {
        match link_secret_id {
            Some(id) => {
                self.get(id)?;
                Ok(id.to_string())
            }
            None => self.default_id().ok_or(HolderError::NoDefaultLinkSecret),
        }
    }

    /// Every stored id.
    pub fn ids(&self) -> Vec<String> {
        self.inner.read().by_id.keys().cloned().collect()
    }
}

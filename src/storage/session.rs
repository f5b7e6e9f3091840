//! Persisted login session.

use std::sync::Arc;

use crate::identity::User;
use crate::storage::store::{KeyValueStore, StorageError};

/// Reads and writes the logged-in [`User`] under one fixed key.
#[derive(Clone)]
pub struct SessionStore {
    store: Arc<dyn KeyValueStore>,
    key: String,
}

impl SessionStore {
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn save(&self, user: &User) -> Result<(), StorageError> {
        let json = serde_json::to_string(user)?;
        self.store.set(&self.key, json)?;
        tracing::debug!(key = %self.key, "Session saved");
        Ok(())
    }

    /// Load the stored user.
    ///
    /// A record that does not decode is removed and treated as logged out.
    pub fn load(&self) -> Result<Option<User>, StorageError> {
        let Some(raw) = self.store.get(&self.key)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(user) => Ok(Some(user)),
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "Discarding unreadable session record");
                self.store.remove(&self.key)?;
                Ok(None)
            }
        }
    }

    pub fn clear(&self) -> Result<(), StorageError> {
        self.store.remove(&self.key)
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore").field("key", &self.key).finish()
    }
}

//! Process-lifetime memoization of secrets read from a key/value store.

use dashmap::DashMap;
use tracing::{info, instrument};

use exchange_types::{KeyValueStore, Secret, SecretError};

/// Resolves named secrets, fetching each key from the store at most once
/// until [`SecretStore::clear`] is called.
///
/// Two tasks racing on the first read of a key may both fetch it; the fetch
/// is idempotent and the last write wins.
pub struct SecretStore<K: KeyValueStore> {
    kv: K,
    cache: DashMap<String, Secret>,
}

impl<K: KeyValueStore> SecretStore<K> {
    pub fn new(kv: K) -> Self {
        Self {
            kv,
            cache: DashMap::new(),
        }
    }

    /// Returns the secret stored under `key`.
    #[instrument(skip(self))]
    pub async fn get(&self, key: &str) -> Result<Secret, SecretError> {
        if let Some(secret) = self.cache.get(key) {
            return Ok(secret.clone());
        }

        let secret = Secret::new(self.kv.fetch(key).await?);
        self.cache.insert(key.to_string(), secret.clone());
        info!(key, "Secret resolved and memoized");
        Ok(secret)
    }

    /// Drops every memoized secret; the next `get` per key goes upstream again.
    pub fn clear(&self) {
        self.cache.clear();
    }

    /// Number of memoized keys.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

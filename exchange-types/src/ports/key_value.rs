//! Key/value store port.
//!
//! The gateway resolves named secrets (the upstream provider app id) through
//! this port. The Consul KV adapter implements it in production.

use crate::error::SecretError;

/// Raw fetch-by-key primitive of an external configuration store.
#[async_trait::async_trait]
pub trait KeyValueStore: Send + Sync + 'static {
    /// Fetches the decoded value stored under `key`.
    ///
    /// Fails with [`SecretError::NotFound`] when the key is absent and
    /// [`SecretError::UpstreamUnavailable`] when the store cannot be reached.
    async fn fetch(&self, key: &str) -> Result<Vec<u8>, SecretError>;
}

#[async_trait::async_trait]
impl<K: KeyValueStore> KeyValueStore for std::sync::Arc<K> {
    async fn fetch(&self, key: &str) -> Result<Vec<u8>, SecretError> {
        (**self).fetch(key).await
    }
}

//! Namespaced cache manager.
//!
//! [`CacheManager`] wraps the [`KvStore`] with a fixed key prefix and a JSON
//! value encoding. It is the write-through cache for source-of-truth records
//! (user profiles, per-user preferences); the session store owns a separate
//! namespace with its own contract and never shares keys with this one.
//!
//! There is deliberately no in-process layer in front of the store: every
//! call round-trips, and the store stays the single source of cached truth
//! shared across all server instances.

use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::CacheError;
use crate::store::KvStore;

/// Fixed namespace for cache entries.
const CACHE_PREFIX: &str = "tzlev:cache:";

/// Namespaced read/write/invalidate cache over the key-value store.
#[derive(Clone, Debug)]
pub struct CacheManager {
    store: KvStore,
    prefix: &'static str,
}

impl CacheManager {
    /// Creates a cache manager over `store`.
    #[must_use]
    pub fn new(store: KvStore) -> Self {
        Self {
            store,
            prefix: CACHE_PREFIX,
        }
    }

    fn key(&self, cache_key: &str) -> String {
        format!("{}{}", self.prefix, cache_key)
    }

    /// Serializes `value` and stores it under `cache_key` with `ttl`.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Serialization`] if the value cannot be encoded,
    /// or [`CacheError::Store`] if the write fails.
    pub async fn set<T: Serialize>(
        &self,
        cache_key: &str,
        value: &T,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let data =
            serde_json::to_vec(value).map_err(|e| CacheError::serialization(e.to_string()))?;

        self.store.set(&self.key(cache_key), data, ttl).await?;
        Ok(())
    }

    /// Reads and deserializes the value under `cache_key`.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Miss`] when the key is absent — callers treat
    /// this as "fall back to the source of truth", never as a failure to
    /// surface. Returns [`CacheError::Deserialization`] when the stored
    /// bytes don't parse as `T`, and [`CacheError::Store`] on connectivity
    /// failure.
    pub async fn get<T: DeserializeOwned>(&self, cache_key: &str) -> Result<T, CacheError> {
        let data = self
            .store
            .get(&self.key(cache_key))
            .await?
            .ok_or_else(|| CacheError::miss(cache_key))?;

        serde_json::from_slice(&data).map_err(|e| CacheError::deserialization(e.to_string()))
    }

    /// Deletes the entry under `cache_key`. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Store`] if the delete fails.
    pub async fn delete(&self, cache_key: &str) -> Result<(), CacheError> {
        self.store.delete(&self.key(cache_key)).await?;
        Ok(())
    }

    /// Deletes every entry whose logical key matches the glob `pattern`.
    ///
    /// Used for bulk invalidation when a record family changes (e.g.
    /// `user:42:*`). An empty match set is a no-op, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Store`] if resolving or deleting keys fails.
    pub async fn delete_pattern(&self, pattern: &str) -> Result<(), CacheError> {
        let keys = self.store.keys_matching(&self.key(pattern)).await?;
        if keys.is_empty() {
            return Ok(());
        }

        tracing::debug!(pattern, count = keys.len(), "invalidating cache entries");
        self.store.delete_many(&keys).await?;
        Ok(())
    }

    /// Returns `true` if an entry exists under `cache_key`.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Store`] if the lookup fails.
    pub async fn exists(&self, cache_key: &str) -> Result<bool, CacheError> {
        Ok(self.store.get(&self.key(cache_key)).await?.is_some())
    }
}

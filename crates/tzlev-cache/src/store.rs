//! Key-value store client.
//!
//! [`KvStore`] is the one connection tzlev holds to its TTL-capable
//! key-value store. Two backends sit behind the same API:
//!
//! - **Redis**: production backend, pooled connections, one command per
//!   operation. Failures propagate immediately as [`StoreError`]; this is
//!   an infrastructure dependency, not a resilience boundary, so there are
//!   no retries here.
//! - **Memory**: a `DashMap` with per-entry deadlines, used in tests and
//!   single-instance development setups where TTL behavior still has to
//!   hold without a Redis server.
//!
//! Absence of a key is reported through `Option`/`bool` returns and is
//! never an error; [`StoreError`] always means connectivity or command
//! failure.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use deadpool_redis::{Pool, Runtime};
use redis::AsyncCommands;

use crate::error::StoreError;

/// A stored value with its optional expiry deadline.
#[derive(Clone, Debug)]
pub struct MemoryEntry {
    data: Vec<u8>,
    expires_at: Option<Instant>,
}

impl MemoryEntry {
    fn new(data: Vec<u8>, ttl: Duration) -> Self {
        Self {
            data,
            expires_at: Instant::now().checked_add(ttl),
        }
    }

    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|deadline| Instant::now() > deadline)
    }
}

/// TTL-capable key-value store client.
///
/// Cheap to clone; clones share the same backend. Construct once at startup
/// and hand a clone to every component that needs storage.
#[derive(Clone)]
pub enum KvStore {
    /// Production backend: pooled Redis connections.
    Redis {
        /// Connection pool.
        pool: Pool,
    },

    /// In-process backend for tests and single-instance deployments.
    Memory(Arc<DashMap<String, MemoryEntry>>),
}

impl KvStore {
    /// Connects to Redis at `url` (e.g. `redis://:pass@host:6379/0`).
    ///
    /// The connection is verified with a `PING` before the client is
    /// returned, so a misconfigured store fails at startup rather than on
    /// the first request.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Connection`] if the pool cannot be created or
    /// the ping fails.
    pub async fn connect(url: &str, pool_size: usize) -> Result<Self, StoreError> {
        let mut cfg = deadpool_redis::Config::from_url(url);
        cfg.pool = Some(deadpool_redis::PoolConfig::new(pool_size));

        let pool = cfg
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| StoreError::connection(e.to_string()))?;

        let store = Self::Redis { pool };
        store.ping().await?;

        tracing::info!(pool_size, "Redis connection established");
        Ok(store)
    }

    /// Creates an in-memory store.
    #[must_use]
    pub fn memory() -> Self {
        Self::Memory(Arc::new(DashMap::new()))
    }

    /// Verifies the store is reachable.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend cannot be reached.
    pub async fn ping(&self) -> Result<(), StoreError> {
        match self {
            Self::Redis { pool } => {
                let mut conn = pool.get().await?;
                redis::cmd("PING")
                    .query_async::<()>(&mut conn)
                    .await
                    .map_err(StoreError::from)
            }
            Self::Memory(_) => Ok(()),
        }
    }

    /// Stores `value` under `key` with the given TTL.
    ///
    /// Overwrites any existing value unconditionally.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on connectivity or command failure.
    pub async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), StoreError> {
        match self {
            Self::Redis { pool } => {
                let mut conn = pool.get().await?;
                conn.set_ex::<_, _, ()>(key, value, ttl.as_secs())
                    .await
                    .map_err(StoreError::from)
            }
            Self::Memory(map) => {
                map.insert(key.to_string(), MemoryEntry::new(value, ttl));
                Ok(())
            }
        }
    }

    /// Reads the value under `key`.
    ///
    /// Returns `None` when the key is absent or expired — a miss, not an
    /// error.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on connectivity or command failure.
    pub async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        match self {
            Self::Redis { pool } => {
                let mut conn = pool.get().await?;
                conn.get::<_, Option<Vec<u8>>>(key)
                    .await
                    .map_err(StoreError::from)
            }
            Self::Memory(map) => {
                if let Some(entry) = map.get(key) {
                    if !entry.is_expired() {
                        return Ok(Some(entry.data.clone()));
                    }
                    drop(entry);
                    map.remove(key);
                }
                Ok(None)
            }
        }
    }

    /// Deletes `key`. Deleting an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on connectivity or command failure.
    pub async fn delete(&self, key: &str) -> Result<(), StoreError> {
        match self {
            Self::Redis { pool } => {
                let mut conn = pool.get().await?;
                conn.del::<_, ()>(key).await.map_err(StoreError::from)
            }
            Self::Memory(map) => {
                map.remove(key);
                Ok(())
            }
        }
    }

    /// Deletes every key in `keys` in one batch. An empty slice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on connectivity or command failure.
    pub async fn delete_many(&self, keys: &[String]) -> Result<(), StoreError> {
        if keys.is_empty() {
            return Ok(());
        }

        match self {
            Self::Redis { pool } => {
                let mut conn = pool.get().await?;
                conn.del::<_, ()>(keys).await.map_err(StoreError::from)
            }
            Self::Memory(map) => {
                for key in keys {
                    map.remove(key);
                }
                Ok(())
            }
        }
    }

    /// Resets the TTL of `key` without touching its value.
    ///
    /// Returns `false` when the key does not exist (or has expired); the
    /// record body is never read or rewritten.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on connectivity or command failure.
    pub async fn expire(&self, key: &str, ttl: Duration) -> Result<bool, StoreError> {
        match self {
            Self::Redis { pool } => {
                let mut conn = pool.get().await?;
                conn.expire::<_, bool>(key, ttl.as_secs() as i64)
                    .await
                    .map_err(StoreError::from)
            }
            Self::Memory(map) => match map.get_mut(key) {
                Some(mut entry) if !entry.is_expired() => {
                    entry.expires_at = Instant::now().checked_add(ttl);
                    Ok(true)
                }
                _ => Ok(false),
            },
        }
    }

    /// Returns every key matching the glob `pattern`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on connectivity or command failure.
    pub async fn keys_matching(&self, pattern: &str) -> Result<Vec<String>, StoreError> {
        match self {
            Self::Redis { pool } => {
                let mut conn = pool.get().await?;
                conn.keys::<_, Vec<String>>(pattern)
                    .await
                    .map_err(StoreError::from)
            }
            Self::Memory(map) => {
                let keys = map
                    .iter()
                    .filter(|entry| !entry.value().is_expired())
                    .map(|entry| entry.key().clone())
                    .filter(|key| glob_match(pattern, key))
                    .collect();
                Ok(keys)
            }
        }
    }
}

impl std::fmt::Debug for KvStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Redis { .. } => f.write_str("KvStore::Redis"),
            Self::Memory(map) => f
                .debug_struct("KvStore::Memory")
                .field("entries", &map.len())
                .finish(),
        }
    }
}

/// Matches `text` against a Redis-style glob `pattern`.
///
/// Supports `*` (any run, including empty) and `?` (any single character) —
/// the subset of Redis `KEYS` globbing the cache layer uses.
fn glob_match(pattern: &str, text: &str) -> bool {
    let pat: Vec<char> = pattern.chars().collect();
    let txt: Vec<char> = text.chars().collect();

    let (mut p, mut t) = (0usize, 0usize);
    let mut star: Option<(usize, usize)> = None;

    while t < txt.len() {
        if p < pat.len() && (pat[p] == '?' || pat[p] == txt[t]) {
            p += 1;
            t += 1;
        } else if p < pat.len() && pat[p] == '*' {
            star = Some((p, t));
            p += 1;
        } else if let Some((sp, st)) = star {
            // Backtrack: let the last * absorb one more character.
            p = sp + 1;
            t = st + 1;
            star = Some((sp, st + 1));
        } else {
            return false;
        }
    }

    while p < pat.len() && pat[p] == '*' {
        p += 1;
    }
    p == pat.len()
}

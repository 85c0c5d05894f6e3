//! CSRF state tokens for in-flight login attempts.

use std::time::Duration;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;

use tzlev_cache::{KvStore, StoreError};

/// Namespace for persisted state tokens.
const STATE_PREFIX: &str = "tzlev:oauth:state:";

/// How long a login attempt may sit between redirect and callback.
pub const STATE_TTL: Duration = Duration::from_secs(10 * 60);

/// Generates a random state token: 32 bytes (256 bits) of entropy,
/// URL-safe base64 without padding.
#[must_use]
pub fn generate_state() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Persists the state token of each in-flight login attempt, keyed by the
/// caller's session identifier.
///
/// A token is single-use: [`StateStore::take`] removes it as it reads, so a
/// replayed callback finds nothing to match against.
#[derive(Clone, Debug)]
pub struct StateStore {
    store: KvStore,
    prefix: &'static str,
    ttl: Duration,
}

impl StateStore {
    /// Creates a state store over `store`.
    #[must_use]
    pub fn new(store: KvStore) -> Self {
        Self {
            store,
            prefix: STATE_PREFIX,
            ttl: STATE_TTL,
        }
    }

    /// Overrides the TTL. Intended for tests.
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    fn key(&self, session_id: &str) -> String {
        format!("{}{}", self.prefix, session_id)
    }

    /// Stores `state` for the login attempt bound to `session_id`,
    /// replacing any previous attempt's token.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the write fails.
    pub async fn put(&self, session_id: &str, state: &str) -> Result<(), StoreError> {
        self.store
            .set(&self.key(session_id), state.as_bytes().to_vec(), self.ttl)
            .await
    }

    /// Removes and returns the state stored for `session_id`, or `None`
    /// when no attempt is in flight (or it expired).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the read or delete fails.
    pub async fn take(&self, session_id: &str) -> Result<Option<String>, StoreError> {
        let key = self.key(session_id);

        let Some(data) = self.store.get(&key).await? else {
            return Ok(None);
        };
        self.store.delete(&key).await?;

        Ok(Some(String::from_utf8_lossy(&data).into_owned()))
    }
}

//! Session records and the session store.
//!
//! Sessions live in the key-value store under the fixed `tzlev:session:`
//! namespace with a uniform 24-hour TTL. The session identifier is the
//! store key only; it never appears inside the record, so a leaked record
//! body cannot be turned into a usable credential.
//!
//! Expiry is passive: the store reaps the key and a later `get` simply
//! reports [`SessionError::NotFound`]. Nothing in this module observes
//! expiration as an event, and no cleanup task exists.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use tzlev_cache::{KvStore, StoreError};

/// Fixed namespace for session records, distinct from the cache manager's.
const SESSION_PREFIX: &str = "tzlev:session:";

/// Uniform session lifetime; refreshed on every authenticated request.
pub const SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Errors from session store operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// No record exists for the identifier (never created, or expired).
    #[error("Session not found")]
    NotFound,

    /// The stored bytes failed to parse. Signals version skew or tampering
    /// and must be treated as an authentication failure, never as a valid
    /// session.
    #[error("Corrupt session record: {message}")]
    Corrupt {
        /// Description of the parse failure.
        message: String,
    },

    /// The underlying store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SessionError {
    /// Creates a new `Corrupt` error.
    #[must_use]
    pub fn corrupt(message: impl Into<String>) -> Self {
        Self::Corrupt {
            message: message.into(),
        }
    }
}

/// A server-side session record.
///
/// Holds the identity fields set at login time for display purposes.
/// Profile data returned to callers always comes from the authoritative
/// user lookup, not from this record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Subject identifier (the user's zehut), the stable key across
    /// password and OAuth login paths.
    pub zehut: String,

    /// Email at login time.
    pub email: String,

    /// Display name at login time.
    pub name: String,

    /// When the session was created. Stamped by [`SessionStore::create`].
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Session {
    /// Creates a session record for a subject. `created_at` is a
    /// placeholder until [`SessionStore::create`] stamps it.
    #[must_use]
    pub fn new(
        zehut: impl Into<String>,
        email: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            zehut: zehut.into(),
            email: email.into(),
            name: name.into(),
            created_at: OffsetDateTime::UNIX_EPOCH,
        }
    }
}

/// TTL-bound store of session records.
#[derive(Clone, Debug)]
pub struct SessionStore {
    store: KvStore,
    prefix: &'static str,
    ttl: Duration,
}

impl SessionStore {
    /// Creates a session store over `store` with the fixed 24-hour TTL.
    #[must_use]
    pub fn new(store: KvStore) -> Self {
        Self {
            store,
            prefix: SESSION_PREFIX,
            ttl: SESSION_TTL,
        }
    }

    /// Overrides the TTL. Intended for tests that exercise expiry.
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    fn key(&self, session_id: &str) -> String {
        format!("{}{}", self.prefix, session_id)
    }

    /// Writes `record` under `session_id`, stamping `created_at`.
    ///
    /// Overwrites any existing record at that identifier unconditionally;
    /// re-login always wins.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Store`] if the write fails.
    pub async fn create(
        &self,
        session_id: &str,
        mut record: Session,
    ) -> Result<Session, SessionError> {
        record.created_at = OffsetDateTime::now_utc();

        let data = serde_json::to_vec(&record)
            .map_err(|e| SessionError::corrupt(format!("Failed to serialize session: {e}")))?;

        self.store.set(&self.key(session_id), data, self.ttl).await?;

        tracing::debug!(zehut = %record.zehut, "session created");
        Ok(record)
    }

    /// Reads the record under `session_id`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotFound`] when absent or expired,
    /// [`SessionError::Corrupt`] when the bytes fail to parse, and
    /// [`SessionError::Store`] on connectivity failure.
    pub async fn get(&self, session_id: &str) -> Result<Session, SessionError> {
        let data = self
            .store
            .get(&self.key(session_id))
            .await?
            .ok_or(SessionError::NotFound)?;

        serde_json::from_slice(&data)
            .map_err(|e| SessionError::corrupt(format!("Failed to parse session: {e}")))
    }

    /// Deletes the record under `session_id`. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Store`] if the delete fails.
    pub async fn delete(&self, session_id: &str) -> Result<(), SessionError> {
        self.store.delete(&self.key(session_id)).await?;
        Ok(())
    }

    /// Resets the TTL to the full duration without reading or rewriting
    /// the record body — safe to call on every authenticated request.
    ///
    /// Returns `false` when no record exists; refreshing an absent session
    /// is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Store`] if the expiry command fails.
    pub async fn refresh(&self, session_id: &str) -> Result<bool, SessionError> {
        Ok(self.store.expire(&self.key(session_id), self.ttl).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SessionStore {
        SessionStore::new(KvStore::memory())
    }

    #[tokio::test]
    async fn test_create_get_round_trip() {
        let sessions = store();
        let record = Session::new("123456789", "dana@example.com", "Dana Levi");

        let created = sessions.create("sid-1", record.clone()).await.unwrap();
        let got = sessions.get("sid-1").await.unwrap();

        // Equal except for the stamped created_at.
        assert_eq!(got, created);
        assert_eq!(got.zehut, record.zehut);
        assert_eq!(got.email, record.email);
        assert_eq!(got.name, record.name);
        assert_ne!(got.created_at, OffsetDateTime::UNIX_EPOCH);
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let sessions = store();
        assert!(matches!(
            sessions.get("no-such-session").await,
            Err(SessionError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_relogin_overwrites() {
        let sessions = store();

        sessions
            .create("sid-1", Session::new("111111118", "a@example.com", "A"))
            .await
            .unwrap();
        sessions
            .create("sid-1", Session::new("123456789", "b@example.com", "B"))
            .await
            .unwrap();

        let got = sessions.get("sid-1").await.unwrap();
        assert_eq!(got.zehut, "123456789");
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let sessions = store();
        sessions
            .create("sid-1", Session::new("123456789", "a@example.com", "A"))
            .await
            .unwrap();

        sessions.delete("sid-1").await.unwrap();
        sessions.delete("sid-1").await.unwrap();

        assert!(matches!(
            sessions.get("sid-1").await,
            Err(SessionError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_expiry_without_refresh() {
        let sessions = store().with_ttl(Duration::from_millis(50));
        sessions
            .create("sid-1", Session::new("123456789", "a@example.com", "A"))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(matches!(
            sessions.get("sid-1").await,
            Err(SessionError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_refresh_extends_ttl() {
        let sessions = store().with_ttl(Duration::from_millis(100));
        sessions
            .create("sid-1", Session::new("123456789", "a@example.com", "A"))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(sessions.refresh("sid-1").await.unwrap());
        tokio::time::sleep(Duration::from_millis(60)).await;

        // Past the original deadline but inside the refreshed one.
        assert!(sessions.get("sid-1").await.is_ok());
    }

    #[tokio::test]
    async fn test_refresh_absent_session_is_false() {
        let sessions = store();
        assert!(!sessions.refresh("ghost").await.unwrap());
    }

    #[tokio::test]
    async fn test_corrupt_record_is_rejected() {
        let kv = KvStore::memory();
        let sessions = SessionStore::new(kv.clone());

        kv.set(
            "tzlev:session:sid-1",
            b"{not json".to_vec(),
            Duration::from_secs(60),
        )
        .await
        .unwrap();

        assert!(matches!(
            sessions.get("sid-1").await,
            Err(SessionError::Corrupt { .. })
        ));
    }
}

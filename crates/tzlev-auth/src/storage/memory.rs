//! In-memory user store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use crate::error::{AuthError, AuthResult};

use super::user::{UserRecord, UserStore};

/// In-process [`UserStore`] backed by a map keyed on zehut.
///
/// Used by the test suites and by development setups that run without the
/// relational database.
#[derive(Clone, Debug, Default)]
pub struct MemoryUserStore {
    users: Arc<RwLock<HashMap<String, UserRecord>>>,
}

impl MemoryUserStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts (or replaces) a record.
    pub async fn insert(&self, record: UserRecord) {
        let mut users = self.users.write().await;
        users.insert(record.zehut.clone(), record);
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_zehut(&self, zehut: &str) -> AuthResult<Option<UserRecord>> {
        let users = self.users.read().await;
        Ok(users.get(zehut).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AuthResult<Option<UserRecord>> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|u| u.email.as_deref() == Some(email))
            .cloned())
    }

    async fn update(&self, record: &UserRecord) -> AuthResult<()> {
        let mut users = self.users.write().await;

        if !users.contains_key(&record.zehut) {
            return Err(AuthError::storage(format!(
                "User {} not found",
                record.zehut
            )));
        }

        let mut updated = record.clone();
        updated.updated_at = OffsetDateTime::now_utc();
        users.insert(updated.zehut.clone(), updated);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_find_by_zehut_and_email() {
        let store = MemoryUserStore::new();
        store
            .insert(UserRecord::new("123456789", "Dana", "Levi").with_email("dana@example.com"))
            .await;

        let by_zehut = store.find_by_zehut("123456789").await.unwrap();
        assert!(by_zehut.is_some());

        let by_email = store.find_by_email("dana@example.com").await.unwrap();
        assert_eq!(by_email.unwrap().zehut, "123456789");

        assert!(store.find_by_zehut("000000000").await.unwrap().is_none());
        assert!(store.find_by_email("no@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_stamps_updated_at() {
        let store = MemoryUserStore::new();
        let user = UserRecord::new("123456789", "Dana", "Levi");
        let before = user.updated_at;
        store.insert(user.clone()).await;

        let mut changed = user;
        changed.avatar = Some("https://example.com/a.jpg".to_string());
        store.update(&changed).await.unwrap();

        let got = store.find_by_zehut("123456789").await.unwrap().unwrap();
        assert_eq!(got.avatar.as_deref(), Some("https://example.com/a.jpg"));
        assert!(got.updated_at >= before);
    }

    #[tokio::test]
    async fn test_update_unknown_user_is_storage_error() {
        let store = MemoryUserStore::new();
        let err = store
            .update(&UserRecord::new("123456789", "Dana", "Levi"))
            .await
            .unwrap_err();
        assert!(err.is_server_error());
    }
}

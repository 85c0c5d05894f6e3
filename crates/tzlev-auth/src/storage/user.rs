//! User record type and lookup trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::AuthResult;

/// A user account as the authentication subsystem sees it.
///
/// This is the credential-relevant subset of the users table; payroll and
/// administrative columns stay with the record's owner. The `zehut`
/// (national ID) is the primary key and the stable subject identifier
/// across password and OAuth login paths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Primary key; stable subject identifier.
    pub zehut: String,

    /// First name.
    pub first_name: String,

    /// Last name.
    pub last_name: String,

    /// Email address; the match key for OAuth logins.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Avatar URL, backfilled from the OAuth profile when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,

    /// Role label for display.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    /// Administrator flag.
    #[serde(default)]
    pub is_admin: bool,

    /// bcrypt hash of the password. Never serialized.
    #[serde(default, skip_serializing)]
    pub hashed_password: Option<String>,

    /// When the account was first confirmed (set on first successful
    /// OAuth login when unset).
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub confirmed_at: Option<OffsetDateTime>,

    /// Row creation time.
    #[serde(with = "time::serde::rfc3339")]
    pub inserted_at: OffsetDateTime,

    /// Row update time.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl UserRecord {
    /// Creates a record with the required identity fields; everything else
    /// starts empty.
    #[must_use]
    pub fn new(
        zehut: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            zehut: zehut.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: None,
            avatar: None,
            role: None,
            is_admin: false,
            hashed_password: None,
            confirmed_at: None,
            inserted_at: now,
            updated_at: now,
        }
    }

    /// Sets the email.
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Sets the password hash.
    #[must_use]
    pub fn with_hashed_password(mut self, hash: impl Into<String>) -> Self {
        self.hashed_password = Some(hash.into());
        self
    }

    /// Sets the role.
    #[must_use]
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    /// Display name: first and last name joined.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Lookup interface over the external user store.
///
/// Absence is reported as `Ok(None)`; an `Err` always means the storage
/// itself failed.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Finds a user by subject identifier.
    async fn find_by_zehut(&self, zehut: &str) -> AuthResult<Option<UserRecord>>;

    /// Finds a user by email address.
    async fn find_by_email(&self, email: &str) -> AuthResult<Option<UserRecord>>;

    /// Writes back a modified record, stamping `updated_at`.
    async fn update(&self, record: &UserRecord) -> AuthResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_name() {
        let user = UserRecord::new("123456789", "Dana", "Levi");
        assert_eq!(user.full_name(), "Dana Levi");
    }

    #[test]
    fn test_hashed_password_is_never_serialized() {
        let user = UserRecord::new("123456789", "Dana", "Levi")
            .with_hashed_password("$2b$12$abcdefghijklmnopqrstuv");

        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("hashed_password"));
        assert!(!json.contains("$2b$12$"));
    }

    #[test]
    fn test_round_trip_without_password() {
        let user = UserRecord::new("123456789", "Dana", "Levi")
            .with_email("dana@example.com")
            .with_hashed_password("$2b$12$abcdefghijklmnopqrstuv");

        let json = serde_json::to_string(&user).unwrap();
        let parsed: UserRecord = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.zehut, user.zehut);
        assert_eq!(parsed.email, user.email);
        // The hash is dropped in transit, as intended.
        assert_eq!(parsed.hashed_password, None);
    }
}

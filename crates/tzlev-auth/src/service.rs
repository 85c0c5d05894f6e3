//! Login, logout and current-user orchestration.
//!
//! [`AuthService`] owns the lifecycle transitions of sessions — it decides
//! when one is created or destroyed — but never the storage mechanics;
//! those belong to [`SessionStore`]. [`UserService`] is the cached read
//! path for user profiles.
//!
//! Failure collapsing happens here: an unknown zehut and a wrong password
//! both leave as [`AuthError::InvalidCredentials`], so handler code cannot
//! accidentally leak the distinction.

use std::sync::Arc;
use std::time::Duration;

use time::OffsetDateTime;
use url::Url;

use tzlev_cache::{CacheManager, KvStore};

use crate::config::AuthConfig;
use crate::error::{AuthError, AuthResult};
use crate::oauth::{GoogleOAuthClient, StateStore, generate_state};
use crate::password::verify_password;
use crate::session::{Session, SessionStore};
use crate::storage::{UserRecord, UserStore};

// =============================================================================
// User Service
// =============================================================================

/// Cached user profile lookups.
///
/// Reads go through the `user:<zehut>` cache entry (5-minute TTL by
/// default); a miss falls back to the user store and repopulates the
/// cache. Cache trouble on the read path degrades to a direct lookup —
/// the cache is an optimization, never a source of truth.
#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserStore>,
    cache: CacheManager,
    cache_ttl: Duration,
}

impl UserService {
    /// Creates a user service.
    #[must_use]
    pub fn new(users: Arc<dyn UserStore>, cache: CacheManager, cache_ttl: Duration) -> Self {
        Self {
            users,
            cache,
            cache_ttl,
        }
    }

    fn cache_key(zehut: &str) -> String {
        format!("user:{zehut}")
    }

    /// Looks up a user by zehut, preferring the cache.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Storage`] if the user store fails.
    pub async fn get_by_zehut(&self, zehut: &str) -> AuthResult<Option<UserRecord>> {
        let cache_key = Self::cache_key(zehut);

        match self.cache.get::<UserRecord>(&cache_key).await {
            Ok(user) => return Ok(Some(user)),
            Err(e) if e.is_miss() => {}
            Err(e) => {
                tracing::warn!(error = %e, zehut, "user cache read failed, falling back to store");
            }
        }

        let Some(user) = self.users.find_by_zehut(zehut).await? else {
            return Ok(None);
        };

        if let Err(e) = self.cache.set(&cache_key, &user, self.cache_ttl).await {
            tracing::warn!(error = %e, zehut, "failed to cache user profile");
        }

        Ok(Some(user))
    }

    /// Looks up a user by email. Always hits the store; emails are not a
    /// cached access path.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Storage`] if the user store fails.
    pub async fn get_by_email(&self, email: &str) -> AuthResult<Option<UserRecord>> {
        self.users.find_by_email(email).await
    }

    /// Writes back a modified record and invalidates its cache entry.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Storage`] if the store write or the cache
    /// invalidation fails.
    pub async fn update(&self, record: &UserRecord) -> AuthResult<()> {
        self.users.update(record).await?;

        self.cache
            .delete(&Self::cache_key(&record.zehut))
            .await
            .map_err(|e| AuthError::storage(e.to_string()))?;

        Ok(())
    }
}

// =============================================================================
// Auth Service
// =============================================================================

/// Composes the password verifier, OAuth client, session store and user
/// lookup into the login, logout and current-user flows.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    sessions: SessionStore,
    states: StateStore,
    oauth: GoogleOAuthClient,
    profiles: UserService,
}

impl AuthService {
    /// Builds the service and its stores over one key-value client.
    #[must_use]
    pub fn new(users: Arc<dyn UserStore>, store: KvStore, config: &AuthConfig) -> Self {
        let sessions = SessionStore::new(store.clone()).with_ttl(config.session_ttl);
        let states = StateStore::new(store.clone()).with_ttl(config.state_ttl);
        let profiles = UserService::new(
            users.clone(),
            CacheManager::new(store),
            config.user_cache_ttl,
        );

        Self {
            users,
            sessions,
            states,
            oauth: GoogleOAuthClient::new(config.google.clone()),
            profiles,
        }
    }

    /// The session store this service writes through.
    #[must_use]
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// The cached profile read path.
    #[must_use]
    pub fn profiles(&self) -> &UserService {
        &self.profiles
    }

    /// Password login.
    ///
    /// On success the session record is written under `session_id`
    /// (minted by the transport layer) and returned.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] for an unknown zehut, a
    /// password-less account and a wrong password alike.
    pub async fn login_with_password(
        &self,
        session_id: &str,
        zehut: &str,
        password: &str,
    ) -> AuthResult<Session> {
        let Some(user) = self.users.find_by_zehut(zehut).await? else {
            tracing::warn!(zehut, "login attempt for unknown user");
            return Err(AuthError::InvalidCredentials);
        };

        let Some(hash) = user.hashed_password.as_deref() else {
            tracing::warn!(zehut, "login attempt for account without password");
            return Err(AuthError::InvalidCredentials);
        };

        if !verify_password(password, hash) {
            tracing::warn!(zehut, "invalid password");
            return Err(AuthError::InvalidCredentials);
        }

        let session = Session::new(
            &user.zehut,
            user.email.clone().unwrap_or_default(),
            user.full_name(),
        );
        let session = self.sessions.create(session_id, session).await?;

        tracing::info!(zehut, "password login succeeded");
        Ok(session)
    }

    /// Starts a Google login attempt for the caller's in-flight session:
    /// generates a state token, persists it, and returns the provider
    /// authorization URL to redirect to.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Storage`] if the state cannot be persisted.
    pub async fn begin_google_login(&self, session_id: &str) -> AuthResult<Url> {
        let state = generate_state();
        self.states.put(session_id, &state).await?;

        Ok(self.oauth.authorization_url(&state)?)
    }

    /// Completes a Google login attempt from the callback parameters.
    ///
    /// The state check runs before any provider call: an empty or
    /// mismatched `state` fails closed with [`AuthError::InvalidState`]
    /// and no token exchange happens.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidState`] on a CSRF check failure,
    /// [`AuthError::OAuth`] when the exchange or identity fetch fails, and
    /// [`AuthError::NotAuthorized`] when no account matches the identity's
    /// email — accounts are never provisioned from OAuth.
    pub async fn complete_google_login(
        &self,
        session_id: &str,
        state: &str,
        code: &str,
    ) -> AuthResult<Session> {
        let stored = self.states.take(session_id).await?;
        if state.is_empty() || stored.as_deref() != Some(state) {
            tracing::warn!("oauth callback state mismatch");
            return Err(AuthError::InvalidState);
        }

        let token = self.oauth.exchange_code(code).await?;
        let identity = self.oauth.fetch_identity(&token.access_token).await?;

        let Some(mut user) = self.users.find_by_email(&identity.email).await? else {
            tracing::warn!(email = %identity.email, "oauth login for unknown account");
            return Err(AuthError::NotAuthorized);
        };

        // First OAuth login confirms the account; pick up the avatar while
        // we have it. Best-effort: the login itself does not depend on it.
        if user.confirmed_at.is_none() {
            user.confirmed_at = Some(OffsetDateTime::now_utc());
            if user.avatar.is_none() && !identity.picture.is_empty() {
                user.avatar = Some(identity.picture.clone());
            }
            if let Err(e) = self.profiles.update(&user).await {
                tracing::warn!(error = %e, zehut = %user.zehut, "failed to backfill oauth profile");
            }
        }

        let session = Session::new(
            &user.zehut,
            user.email.clone().unwrap_or_default(),
            user.full_name(),
        );
        let session = self.sessions.create(session_id, session).await?;

        tracing::info!(zehut = %user.zehut, "google login succeeded");
        Ok(session)
    }

    /// Destroys the session. Deleting a session that no longer exists is
    /// still a successful logout.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Storage`] only when the store itself fails.
    pub async fn logout(&self, session_id: &str) -> AuthResult<()> {
        self.sessions.delete(session_id).await?;
        Ok(())
    }

    /// Resolves the session, then re-fetches the authoritative user record
    /// by the session's subject identifier. The session is a capability
    /// token; profile fields always come from the source-of-truth lookup.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Unauthenticated`] when the session is missing,
    /// expired, corrupt, or names a user that no longer exists.
    pub async fn current_user(&self, session_id: &str) -> AuthResult<UserRecord> {
        let session = self.sessions.get(session_id).await?;
        self.profile(&session).await
    }

    /// Fetches the authoritative user record behind an already-resolved
    /// session.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Unauthenticated`] when the subject no longer
    /// exists.
    pub async fn profile(&self, session: &Session) -> AuthResult<UserRecord> {
        self.profiles
            .get_by_zehut(&session.zehut)
            .await?
            .ok_or_else(|| AuthError::unauthenticated("User not found"))
    }
}

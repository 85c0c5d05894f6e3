//! Session-gate request extractor.
//!
//! [`SessionAuth`] is the only place session validity is enforced; handlers
//! behind it trust the attached identity unconditionally.
//!
//! # Example
//!
//! ```ignore
//! use axum::{Router, routing::get};
//! use tzlev_auth::{AuthState, SessionAuth};
//!
//! async fn guarded(SessionAuth(current): SessionAuth) -> String {
//!     format!("hello, {}", current.session.name)
//! }
//!
//! let app = Router::new()
//!     .route("/guarded", get(guarded))
//!     .with_state(auth_state);
//! ```

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::COOKIE, request::Parts},
};

use crate::config::CookieConfig;
use crate::error::AuthError;
use crate::session::{Session, SessionStore};

/// State required by the session gate.
///
/// Include this in the application state and expose it to the extractor
/// via `FromRef`.
#[derive(Clone)]
pub struct AuthState {
    /// Session store for lookups and TTL refresh.
    pub sessions: SessionStore,

    /// Session cookie settings.
    pub cookie: CookieConfig,
}

/// The resolved identity of a guarded request.
#[derive(Debug, Clone)]
pub struct CurrentSession {
    /// The opaque session identifier from the cookie.
    pub session_id: String,

    /// The resolved session record.
    pub session: Session,
}

/// Axum extractor enforcing that a valid session exists.
///
/// On every guarded request it:
/// 1. Extracts the session identifier from the session cookie
/// 2. Looks the session up in the store
/// 3. Refreshes the TTL (best-effort: a refresh failure is logged, not
///    fatal — an un-refreshed but still valid session is an acceptable
///    degradation)
/// 4. Exposes the identity to the handler
///
/// # Errors
///
/// Rejects with `401 Unauthorized` when the cookie is absent or the
/// session is missing, expired or corrupt.
pub struct SessionAuth(pub CurrentSession);

impl<S> FromRequestParts<S> for SessionAuth
where
    S: Send + Sync,
    AuthState: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_state = AuthState::from_ref(state);

        let session_id = session_id_from_cookie(parts, &auth_state.cookie.name)
            .ok_or_else(|| AuthError::unauthenticated("Missing session cookie"))?;

        let session = match auth_state.sessions.get(&session_id).await {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(error = %e, "invalid session");
                return Err(e.into());
            }
        };

        if let Err(e) = auth_state.sessions.refresh(&session_id).await {
            tracing::warn!(error = %e, "failed to refresh session TTL");
        }

        tracing::debug!(zehut = %session.zehut, "session validated");

        Ok(SessionAuth(CurrentSession {
            session_id,
            session,
        }))
    }
}

/// Extracts the session identifier from the request's cookies.
///
/// Parses the Cookie header and looks for the configured cookie name.
pub(crate) fn session_id_from_cookie(parts: &Parts, cookie_name: &str) -> Option<String> {
    let cookie_header = parts.headers.get(COOKIE)?.to_str().ok()?;

    for cookie in cookie_header.split(';') {
        let cookie = cookie.trim();
        if let Some((name, value)) = cookie.split_once('=')
            && name.trim() == cookie_name
        {
            let value = value.trim();
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with_cookie(header: &str) -> Parts {
        let request = Request::builder()
            .uri("/api/auth/me")
            .header(COOKIE, header)
            .body(())
            .unwrap();
        request.into_parts().0
    }

    #[test]
    fn test_session_id_from_cookie() {
        let parts = parts_with_cookie("tzlev_sid=abc-123; other=x");
        assert_eq!(
            session_id_from_cookie(&parts, "tzlev_sid").as_deref(),
            Some("abc-123")
        );
    }

    #[test]
    fn test_session_id_ignores_other_cookies() {
        let parts = parts_with_cookie("other=x; another=y");
        assert_eq!(session_id_from_cookie(&parts, "tzlev_sid"), None);
    }

    #[test]
    fn test_empty_session_id_is_absent() {
        let parts = parts_with_cookie("tzlev_sid=");
        assert_eq!(session_id_from_cookie(&parts, "tzlev_sid"), None);
    }

    #[test]
    fn test_missing_cookie_header() {
        let request = Request::builder().uri("/api/auth/me").body(()).unwrap();
        let (parts, ()) = request.into_parts();
        assert_eq!(session_id_from_cookie(&parts, "tzlev_sid"), None);
    }
}

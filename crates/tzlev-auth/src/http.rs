//! Axum handlers for the auth endpoints.
//!
//! The transport contract:
//!
//! - `POST /api/auth/login` - zehut/password login, sets the session cookie
//! - `GET  /api/auth/google` - redirect to the Google consent screen
//! - `GET  /api/auth/google/callback` - completes the code flow
//! - `POST /api/auth/logout` - destroys the session, clears the cookie
//! - `GET  /api/auth/me` - the resolved current user (session-gated)
//!
//! Login failure bodies never distinguish the failure reason.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{FromRef, Query, State},
    response::Redirect,
    routing::{get, post},
};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AuthError, AuthResult};
use crate::extract::{AuthState, SessionAuth};
use crate::service::AuthService;
use crate::storage::UserRecord;

// =============================================================================
// State
// =============================================================================

/// State for the auth endpoints.
#[derive(Clone)]
pub struct AuthApi {
    /// The orchestration service.
    pub service: Arc<AuthService>,

    /// State for the session gate (store handle + cookie settings).
    pub auth: AuthState,
}

impl AuthApi {
    /// Creates the endpoint state from a service and its cookie settings.
    #[must_use]
    pub fn new(service: Arc<AuthService>, cookie: crate::config::CookieConfig) -> Self {
        let auth = AuthState {
            sessions: service.sessions().clone(),
            cookie,
        };
        Self { service, auth }
    }
}

impl FromRef<AuthApi> for AuthState {
    fn from_ref(state: &AuthApi) -> Self {
        state.auth.clone()
    }
}

/// Builds the auth router. Nest or merge into the application router and
/// provide an [`AuthApi`] state.
pub fn auth_router() -> Router<AuthApi> {
    Router::new()
        .route("/api/auth/login", post(login_handler))
        .route("/api/auth/logout", post(logout_handler))
        .route("/api/auth/me", get(current_user_handler))
        .route("/api/auth/google", get(google_login_handler))
        .route("/api/auth/google/callback", get(google_callback_handler))
}

// =============================================================================
// Request / Response Types
// =============================================================================

/// Password login request body.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    /// Subject identifier.
    pub zehut: String,

    /// Plaintext password.
    pub password: String,
}

/// Generic status response.
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    /// Always `"ok"` on the success path.
    pub status: &'static str,

    /// Human-readable confirmation.
    pub message: &'static str,
}

/// Current-user response envelope.
#[derive(Debug, Clone, Serialize)]
pub struct CurrentUserResponse {
    /// The resolved user profile.
    pub user: UserProfile,
}

/// Profile fields exposed to the frontend.
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    /// Subject identifier.
    pub zehut: String,
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Email address.
    pub email: Option<String>,
    /// Avatar URL.
    pub avatar: Option<String>,
    /// Role label.
    pub role: Option<String>,
    /// Administrator flag.
    pub is_admin: bool,
}

impl From<UserRecord> for UserProfile {
    fn from(user: UserRecord) -> Self {
        Self {
            zehut: user.zehut,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            avatar: user.avatar,
            role: user.role,
            is_admin: user.is_admin,
        }
    }
}

/// Query parameters on the OAuth callback.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleCallbackParams {
    /// Echoed CSRF state token.
    #[serde(default)]
    pub state: Option<String>,

    /// Authorization code to exchange.
    #[serde(default)]
    pub code: Option<String>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Handles zehut/password login.
async fn login_handler(
    State(api): State<AuthApi>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> AuthResult<(CookieJar, Json<StatusResponse>)> {
    let (session_id, jar) = ensure_session_cookie(&api, jar);

    api.service
        .login_with_password(&session_id, &request.zehut, &request.password)
        .await?;

    Ok((
        jar,
        Json(StatusResponse {
            status: "ok",
            message: "Login successful",
        }),
    ))
}

/// Starts the Google login flow and redirects to the consent screen.
async fn google_login_handler(
    State(api): State<AuthApi>,
    jar: CookieJar,
) -> AuthResult<(CookieJar, Redirect)> {
    let (session_id, jar) = ensure_session_cookie(&api, jar);

    let url = api.service.begin_google_login(&session_id).await?;
    Ok((jar, Redirect::to(url.as_str())))
}

/// Completes the Google login flow and redirects to the landing page.
async fn google_callback_handler(
    State(api): State<AuthApi>,
    jar: CookieJar,
    Query(params): Query<GoogleCallbackParams>,
) -> AuthResult<Redirect> {
    // Without the session cookie there is no stored state to match
    // against; fail closed before touching the provider.
    let Some(session_id) = session_cookie_value(&api, &jar) else {
        return Err(AuthError::InvalidState);
    };

    api.service
        .complete_google_login(
            &session_id,
            params.state.as_deref().unwrap_or(""),
            params.code.as_deref().unwrap_or(""),
        )
        .await?;

    Ok(Redirect::to("/"))
}

/// Destroys the session and clears the cookie. Reported successful even
/// when no session existed.
async fn logout_handler(
    State(api): State<AuthApi>,
    jar: CookieJar,
) -> AuthResult<(CookieJar, Json<StatusResponse>)> {
    if let Some(session_id) = session_cookie_value(&api, &jar) {
        api.service.logout(&session_id).await?;
    }

    let jar = jar.add(api.auth.cookie.build_removal_cookie());
    Ok((
        jar,
        Json(StatusResponse {
            status: "ok",
            message: "Logged out successfully",
        }),
    ))
}

/// Returns the current user's profile from the authoritative lookup.
async fn current_user_handler(
    State(api): State<AuthApi>,
    SessionAuth(current): SessionAuth,
) -> AuthResult<Json<CurrentUserResponse>> {
    let user = api.service.profile(&current.session).await?;

    Ok(Json(CurrentUserResponse { user: user.into() }))
}

// =============================================================================
// Cookie Helpers
// =============================================================================

fn session_cookie_value(api: &AuthApi, jar: &CookieJar) -> Option<String> {
    jar.get(&api.auth.cookie.name)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}

/// Reuses the caller's session identifier or mints a fresh one, making
/// sure the cookie rides back on the response either way.
fn ensure_session_cookie(api: &AuthApi, jar: CookieJar) -> (String, CookieJar) {
    let session_id = session_cookie_value(api, &jar)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let cookie = api.auth.cookie.build_session_cookie(&session_id);
    (session_id, jar.add(cookie))
}

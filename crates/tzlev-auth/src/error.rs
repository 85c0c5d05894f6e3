//! Authentication error types and their HTTP mapping.
//!
//! Domain errors are deliberately uninformative at the boundary: a missing
//! account and a wrong password both surface as [`AuthError::InvalidCredentials`]
//! so responses cannot be used for user enumeration. The collapsing happens
//! here and in the orchestrator, never in handler code.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use tzlev_cache::StoreError;

use crate::oauth::OAuthError;
use crate::session::SessionError;

/// Result type used across auth operations.
pub type AuthResult<T> = Result<T, AuthError>;

/// Errors that can occur during authentication operations.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The request carries no valid session.
    #[error("Not authenticated: {message}")]
    Unauthenticated {
        /// Description of why the request is unauthenticated.
        message: String,
    },

    /// Password login failed. Covers both "no such user" and "wrong
    /// password"; callers must not be able to tell which.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// OAuth login succeeded at the provider but no matching account
    /// exists. Accounts are never auto-provisioned from OAuth.
    #[error("User not authorized")]
    NotAuthorized,

    /// The OAuth callback state token was empty or did not match the one
    /// stored for this login attempt.
    #[error("Invalid state parameter")]
    InvalidState,

    /// An OAuth protocol step failed (token exchange, identity fetch).
    #[error(transparent)]
    OAuth(#[from] OAuthError),

    /// The key-value store or user storage failed.
    #[error("Storage error: {message}")]
    Storage {
        /// Description of the storage failure.
        message: String,
    },

    /// An unexpected internal error occurred.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl AuthError {
    /// Creates a new `Unauthenticated` error.
    #[must_use]
    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::Unauthenticated {
            message: message.into(),
        }
    }

    /// Creates a new `Storage` error.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns `true` if this is an authentication failure (the caller's
    /// identity could not be established).
    #[must_use]
    pub fn is_authentication_error(&self) -> bool {
        matches!(
            self,
            Self::Unauthenticated { .. } | Self::InvalidCredentials
        )
    }

    /// Returns `true` if this is a client error (4xx category).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Unauthenticated { .. }
                | Self::InvalidCredentials
                | Self::NotAuthorized
                | Self::InvalidState
        )
    }

    /// Returns `true` if this is a server or upstream error (5xx category).
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::OAuth(_) | Self::Storage { .. } | Self::Internal { .. }
        )
    }
}

impl From<SessionError> for AuthError {
    /// Session lookup failures collapse to authentication failures: an
    /// absent session and an unparseable one both mean the caller is not
    /// authenticated. Only infrastructure failures stay distinct.
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NotFound => Self::unauthenticated("Invalid or expired session"),
            SessionError::Corrupt { .. } => Self::unauthenticated("Invalid session record"),
            SessionError::Store(e) => Self::storage(e.to_string()),
        }
    }
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        Self::storage(err.to_string())
    }
}

// =============================================================================
// IntoResponse Implementation
// =============================================================================

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = response_details(&self);

        if self.is_server_error() {
            tracing::error!(error = %self, "auth request failed");
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Maps an error to its HTTP status and public-safe body message.
///
/// Messages here are the full set of strings callers ever see; internal
/// detail stays in logs.
fn response_details(error: &AuthError) -> (StatusCode, &'static str) {
    match error {
        AuthError::Unauthenticated { .. } => (StatusCode::UNAUTHORIZED, "Not authenticated"),
        AuthError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "Invalid credentials"),
        AuthError::NotAuthorized => (
            StatusCode::FORBIDDEN,
            "User not authorized. Please contact administrator.",
        ),
        AuthError::InvalidState => (StatusCode::BAD_REQUEST, "Invalid state parameter"),
        AuthError::OAuth(OAuthError::Exchange { .. }) => {
            (StatusCode::BAD_GATEWAY, "Failed to exchange token")
        }
        AuthError::OAuth(OAuthError::IdentityFetch { .. }) => {
            (StatusCode::BAD_GATEWAY, "Failed to get user info")
        }
        AuthError::OAuth(_) | AuthError::Storage { .. } | AuthError::Internal { .. } => {
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}

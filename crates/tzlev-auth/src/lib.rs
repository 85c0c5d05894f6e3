//! # tzlev-auth
//!
//! Session and authentication module for the tzlev server.
//!
//! This crate provides:
//! - Server-side sessions stored in the shared key-value store
//! - Password login with bcrypt verification
//! - Google OAuth2 authorization-code login for pre-existing accounts
//! - A session-gated request extractor for guarded routes
//! - Axum HTTP handlers for the auth endpoints
//!
//! ## Overview
//!
//! A session is an opaque server-side record keyed by an identifier the
//! client carries in a HttpOnly cookie. The record itself is a capability
//! token, not a profile cache: guarded handlers re-fetch the authoritative
//! user record on every current-user lookup. All session state lives in the
//! key-value store, so any server instance can serve any request.
//!
//! ## Modules
//!
//! - [`config`] - auth configuration (TTLs, cookie, OAuth provider)
//! - [`error`] - the [`AuthError`] taxonomy and its HTTP mapping
//! - [`password`] - one-way password hashing and verification
//! - [`session`] - the session record and its store
//! - [`oauth`] - the Google authorization-code client and state tokens
//! - [`storage`] - the user lookup trait and in-memory implementation
//! - [`service`] - login/logout/current-user orchestration
//! - [`extract`] - the session-gate request extractor
//! - [`http`] - Axum handlers and the auth router

pub mod config;
pub mod error;
pub mod extract;
pub mod http;
pub mod oauth;
pub mod password;
pub mod service;
pub mod session;
pub mod storage;

pub use config::{AuthConfig, CookieConfig};
pub use error::{AuthError, AuthResult};
pub use extract::{AuthState, CurrentSession, SessionAuth};
pub use http::{AuthApi, auth_router};
pub use oauth::{GoogleOAuthClient, GoogleOAuthConfig, GoogleUser, OAuthError, StateStore};
pub use password::{hash_password, verify_password};
pub use service::{AuthService, UserService};
pub use session::{Session, SessionError, SessionStore};
pub use storage::{MemoryUserStore, UserRecord, UserStore};

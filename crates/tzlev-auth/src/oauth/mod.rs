//! Google OAuth2 authorization-code client.
//!
//! One login attempt walks four steps: build the authorization URL with a
//! fresh state token, validate the state echoed back on the callback,
//! exchange the code for an access token, and fetch the provider profile.
//! The state token is the only OAuth protocol state this subsystem
//! persists; provider tokens are used once and discarded.

mod client;
mod state;

pub use client::{GoogleOAuthClient, GoogleOAuthConfig, GoogleUser, OAuthError, TokenResponse};
pub use state::{StateStore, generate_state};

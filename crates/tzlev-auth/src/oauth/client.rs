//! Token exchange and identity fetch against the Google endpoints.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

/// Errors from the OAuth protocol steps.
///
/// Any failure aborts the login attempt; a session is never partially
/// established. There are no retries — a failed exchange requires a fresh
/// authorization cycle because the code is single-use.
#[derive(Debug, thiserror::Error)]
pub enum OAuthError {
    /// The code-for-token exchange failed (transport failure, expired or
    /// reused code, mismatched redirect URI, provider outage).
    #[error("Token exchange failed: {message}")]
    Exchange {
        /// Description of the exchange failure.
        message: String,
    },

    /// Fetching the provider profile with the access token failed.
    #[error("Identity fetch failed: {message}")]
    IdentityFetch {
        /// Description of the fetch failure.
        message: String,
    },

    /// A configured endpoint is not a valid URL.
    #[error("Invalid endpoint URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl OAuthError {
    /// Creates a new `Exchange` error.
    #[must_use]
    pub fn exchange(message: impl Into<String>) -> Self {
        Self::Exchange {
            message: message.into(),
        }
    }

    /// Creates a new `IdentityFetch` error.
    #[must_use]
    pub fn identity_fetch(message: impl Into<String>) -> Self {
        Self::IdentityFetch {
            message: message.into(),
        }
    }
}

/// Configuration for the Google OAuth2 client.
///
/// Endpoints default to Google's but can be overridden, which is how tests
/// point the client at a local provider double.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleOAuthConfig {
    /// OAuth client ID registered with Google.
    pub client_id: String,

    /// OAuth client secret. Loaded from the environment, never from the
    /// config file.
    #[serde(skip_serializing)]
    pub client_secret: String,

    /// Redirect URL registered for the callback endpoint.
    pub redirect_url: String,

    /// Authorization endpoint.
    pub auth_endpoint: String,

    /// Token endpoint.
    pub token_endpoint: String,

    /// Userinfo endpoint.
    pub userinfo_endpoint: String,

    /// Scopes to request.
    pub scopes: Vec<String>,
}

impl Default for GoogleOAuthConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            redirect_url: "http://localhost:8000/api/auth/google/callback".to_string(),
            auth_endpoint: "https://accounts.google.com/o/oauth2/auth".to_string(),
            token_endpoint: "https://oauth2.googleapis.com/token".to_string(),
            userinfo_endpoint: "https://www.googleapis.com/oauth2/v2/userinfo".to_string(),
            scopes: vec![
                "openid".to_string(),
                "email".to_string(),
                "profile".to_string(),
            ],
        }
    }
}

impl GoogleOAuthConfig {
    /// Creates a configuration with credentials and redirect URL.
    #[must_use]
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_url: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_url: redirect_url.into(),
            ..Self::default()
        }
    }

    /// Overrides the authorization endpoint.
    #[must_use]
    pub fn with_auth_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.auth_endpoint = endpoint.into();
        self
    }

    /// Overrides the token endpoint.
    #[must_use]
    pub fn with_token_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.token_endpoint = endpoint.into();
        self
    }

    /// Overrides the userinfo endpoint.
    #[must_use]
    pub fn with_userinfo_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.userinfo_endpoint = endpoint.into();
        self
    }
}

/// Token endpoint response.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    /// Bearer token for the userinfo fetch. Used once, never stored.
    pub access_token: String,

    /// Token type, normally `Bearer`.
    #[serde(default)]
    pub token_type: String,

    /// Lifetime in seconds.
    #[serde(default)]
    pub expires_in: Option<u64>,

    /// Refresh token, unused by this subsystem.
    #[serde(default)]
    pub refresh_token: Option<String>,

    /// OIDC ID token, unused by this subsystem.
    #[serde(default)]
    pub id_token: Option<String>,
}

/// Profile returned by the Google userinfo endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleUser {
    /// Google's stable identifier for the account.
    pub id: String,

    /// Account email; the match key against existing tzlev accounts.
    pub email: String,

    /// Whether Google has verified the email.
    #[serde(default)]
    pub verified_email: bool,

    /// Display name.
    #[serde(default)]
    pub name: String,

    /// Avatar URL.
    #[serde(default)]
    pub picture: String,
}

/// OAuth error body returned by the provider on a failed exchange.
#[derive(Debug, Deserialize)]
struct ProviderErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Client for the Google authorization-code flow.
#[derive(Debug, Clone)]
pub struct GoogleOAuthClient {
    config: GoogleOAuthConfig,
    http: reqwest::Client,
}

impl GoogleOAuthClient {
    /// Creates a client from `config`.
    #[must_use]
    pub fn new(config: GoogleOAuthConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self { config, http }
    }

    /// Returns the client configuration.
    #[must_use]
    pub fn config(&self) -> &GoogleOAuthConfig {
        &self.config
    }

    /// Builds the provider authorization URL embedding `state`.
    ///
    /// # Errors
    ///
    /// Returns [`OAuthError::InvalidUrl`] if the configured endpoint does
    /// not parse.
    pub fn authorization_url(&self, state: &str) -> Result<Url, OAuthError> {
        let mut url = Url::parse(&self.config.auth_endpoint)?;

        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", &self.config.redirect_url)
            .append_pair("scope", &self.config.scopes.join(" "))
            .append_pair("state", state);

        Ok(url)
    }

    /// Exchanges an authorization code for tokens.
    ///
    /// # Errors
    ///
    /// Returns [`OAuthError::Exchange`] on transport failure or any
    /// provider-side rejection.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenResponse, OAuthError> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", &self.config.redirect_url),
            ("client_id", &self.config.client_id),
            ("client_secret", &self.config.client_secret),
        ];

        let response = self
            .http
            .post(&self.config.token_endpoint)
            .form(&params)
            .send()
            .await
            .map_err(|e| OAuthError::exchange(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            // Prefer the provider's own error code when it sent one.
            if let Ok(provider_error) = serde_json::from_str::<ProviderErrorResponse>(&body) {
                return Err(OAuthError::exchange(format!(
                    "{} - {}",
                    provider_error.error,
                    provider_error.error_description.unwrap_or_default()
                )));
            }

            return Err(OAuthError::exchange(format!("HTTP {status} - {body}")));
        }

        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| OAuthError::exchange(format!("Failed to parse token response: {e}")))
    }

    /// Fetches the provider profile with `access_token`.
    ///
    /// # Errors
    ///
    /// Returns [`OAuthError::IdentityFetch`] on transport failure or a
    /// non-success provider response.
    pub async fn fetch_identity(&self, access_token: &str) -> Result<GoogleUser, OAuthError> {
        let response = self
            .http
            .get(&self.config.userinfo_endpoint)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| OAuthError::identity_fetch(e.to_string()))?;

        if !response.status().is_success() {
            return Err(OAuthError::identity_fetch(format!(
                "HTTP {}",
                response.status()
            )));
        }

        response
            .json::<GoogleUser>()
            .await
            .map_err(|e| OAuthError::identity_fetch(format!("Failed to parse profile: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> GoogleOAuthClient {
        GoogleOAuthClient::new(GoogleOAuthConfig::new(
            "client-123",
            "secret-456",
            "https://app.example.com/api/auth/google/callback",
        ))
    }

    #[test]
    fn test_authorization_url_parameters() {
        let url = client().authorization_url("state-abc").unwrap();

        assert_eq!(url.host_str(), Some("accounts.google.com"));

        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        assert!(pairs.contains(&("response_type".to_string(), "code".to_string())));
        assert!(pairs.contains(&("client_id".to_string(), "client-123".to_string())));
        assert!(pairs.contains(&("state".to_string(), "state-abc".to_string())));
        assert!(pairs.contains(&("scope".to_string(), "openid email profile".to_string())));
        assert!(pairs.contains(&(
            "redirect_uri".to_string(),
            "https://app.example.com/api/auth/google/callback".to_string()
        )));
    }

    #[test]
    fn test_default_config_endpoints_parse() {
        let config = GoogleOAuthConfig::default();
        assert!(Url::parse(&config.auth_endpoint).is_ok());
        assert!(Url::parse(&config.token_endpoint).is_ok());
        assert!(Url::parse(&config.userinfo_endpoint).is_ok());
    }

    #[test]
    fn test_token_response_parses_minimal_body() {
        let json = r#"{"access_token": "ya29.abc", "token_type": "Bearer"}"#;
        let token: TokenResponse = serde_json::from_str(json).unwrap();

        assert_eq!(token.access_token, "ya29.abc");
        assert!(token.refresh_token.is_none());
        assert!(token.id_token.is_none());
    }

    #[test]
    fn test_google_user_parses_userinfo_body() {
        let json = r#"{
            "id": "10769150350006150715113082367",
            "email": "dana@example.com",
            "verified_email": true,
            "name": "Dana Levi",
            "picture": "https://lh3.googleusercontent.com/photo.jpg"
        }"#;

        let user: GoogleUser = serde_json::from_str(json).unwrap();
        assert_eq!(user.email, "dana@example.com");
        assert!(user.verified_email);
        assert_eq!(user.picture, "https://lh3.googleusercontent.com/photo.jpg");
    }
}

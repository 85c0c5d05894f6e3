//! Authentication configuration.

use std::time::Duration;

use cookie::{Cookie, SameSite, time::Duration as CookieDuration};
use serde::{Deserialize, Serialize};

use crate::oauth::GoogleOAuthConfig;

/// Root configuration for the auth module.
///
/// # Example (TOML)
///
/// ```toml
/// [auth]
/// session_ttl = "24h"
/// user_cache_ttl = "5m"
///
/// [auth.google]
/// client_id = "....apps.googleusercontent.com"
/// redirect_url = "https://tzlev.example.com/api/auth/google/callback"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Session lifetime; reset on every authenticated request.
    #[serde(with = "humantime_serde")]
    pub session_ttl: Duration,

    /// TTL for cached user profile lookups.
    #[serde(with = "humantime_serde")]
    pub user_cache_ttl: Duration,

    /// How long an OAuth login attempt may stay in flight.
    #[serde(with = "humantime_serde")]
    pub state_ttl: Duration,

    /// Session cookie settings.
    pub cookie: CookieConfig,

    /// Google OAuth client settings.
    pub google: GoogleOAuthConfig,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_ttl: Duration::from_secs(24 * 60 * 60),
            user_cache_ttl: Duration::from_secs(5 * 60),
            state_ttl: Duration::from_secs(10 * 60),
            cookie: CookieConfig::default(),
            google: GoogleOAuthConfig::default(),
        }
    }
}

/// Session cookie configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CookieConfig {
    /// Cookie name.
    pub name: String,

    /// Send only over HTTPS. Off by default for local development;
    /// production config turns it on.
    pub secure: bool,

    /// Keep the cookie out of reach of page scripts.
    pub http_only: bool,

    /// SameSite policy: `strict`, `lax` or `none`.
    pub same_site: String,

    /// Cookie path.
    pub path: String,

    /// Cookie domain; host-only when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,

    /// Cookie lifetime. Matches the session TTL so the browser and the
    /// store forget the session around the same time.
    #[serde(with = "humantime_serde")]
    pub max_age: Duration,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            name: "tzlev_sid".to_string(),
            secure: false,
            http_only: true,
            same_site: "lax".to_string(),
            path: "/".to_string(),
            domain: None,
            max_age: Duration::from_secs(24 * 60 * 60),
        }
    }
}

impl CookieConfig {
    fn same_site(&self) -> SameSite {
        match self.same_site.to_ascii_lowercase().as_str() {
            "strict" => SameSite::Strict,
            "none" => SameSite::None,
            _ => SameSite::Lax,
        }
    }

    /// Builds the session cookie carrying `session_id`.
    #[must_use]
    pub fn build_session_cookie(&self, session_id: &str) -> Cookie<'static> {
        let mut builder = Cookie::build((self.name.clone(), session_id.to_string()))
            .path(self.path.clone())
            .http_only(self.http_only)
            .secure(self.secure)
            .same_site(self.same_site())
            .max_age(CookieDuration::seconds(self.max_age.as_secs() as i64));

        if let Some(domain) = &self.domain {
            builder = builder.domain(domain.clone());
        }

        builder.build()
    }

    /// Builds the expired cookie that clears the session credential.
    #[must_use]
    pub fn build_removal_cookie(&self) -> Cookie<'static> {
        let mut builder = Cookie::build((self.name.clone(), String::new()))
            .path(self.path.clone())
            .http_only(self.http_only)
            .secure(self.secure)
            .same_site(self.same_site())
            .max_age(CookieDuration::ZERO);

        if let Some(domain) = &self.domain {
            builder = builder.domain(domain.clone());
        }

        builder.build()
    }
}

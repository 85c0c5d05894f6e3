//! Server configuration.
//!
//! Configuration is layered: `tzlev.toml` (optional) under
//! `TZLEV__`-prefixed environment variables (`TZLEV__REDIS__HOST`,
//! `TZLEV__SERVER__PORT`, ...). Secrets are read from plain environment
//! variables only (`REDIS_PASSWORD`, `GOOGLE_CLIENT_SECRET`) and never
//! from the config file.

use serde::{Deserialize, Serialize};

use tzlev_auth::AuthConfig;

/// Default configuration file name.
pub const DEFAULT_CONFIG_PATH: &str = "tzlev.toml";

/// Root server configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// HTTP listener settings.
    pub server: HttpConfig,

    /// Redis connection settings.
    pub redis: RedisConfig,

    /// Authentication settings.
    pub auth: AuthConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Bind address.
    pub host: String,

    /// Bind port.
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

/// Redis connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RedisConfig {
    /// Redis host.
    pub host: String,

    /// Redis port.
    pub port: u16,

    /// Password; from `REDIS_PASSWORD` only.
    #[serde(skip_serializing)]
    pub password: Option<String>,

    /// Logical database index.
    pub database: u8,

    /// Connection pool size.
    pub pool_size: usize,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 6379,
            password: None,
            database: 0,
            pool_size: 16,
        }
    }
}

impl RedisConfig {
    /// Builds the connection URL.
    #[must_use]
    pub fn url(&self) -> String {
        match &self.password {
            Some(password) => format!(
                "redis://:{}@{}:{}/{}",
                password, self.host, self.port, self.database
            ),
            None => format!("redis://{}:{}/{}", self.host, self.port, self.database),
        }
    }
}

/// Loads configuration from `path` (when the file exists) and the
/// environment.
///
/// # Errors
///
/// Returns [`config::ConfigError`] when the file or environment values
/// fail to parse.
pub fn load_config(path: Option<&str>) -> Result<ServerConfig, config::ConfigError> {
    let path = path.unwrap_or(DEFAULT_CONFIG_PATH);

    let cfg = config::Config::builder()
        .add_source(config::File::with_name(path).required(false))
        .add_source(
            config::Environment::with_prefix("TZLEV")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let mut server_config: ServerConfig = cfg.try_deserialize()?;

    // Secrets come from the environment only.
    if let Ok(password) = std::env::var("REDIS_PASSWORD")
        && !password.is_empty()
    {
        server_config.redis.password = Some(password);
    }
    if let Ok(secret) = std::env::var("GOOGLE_CLIENT_SECRET") {
        server_config.auth.google.client_secret = secret;
    }

    Ok(server_config)
}

use std::sync::Arc;

use tzlev_auth::MemoryUserStore;
use tzlev_cache::KvStore;
use tzlev_server::config::{DEFAULT_CONFIG_PATH, load_config};

#[tokio::main]
async fn main() {
    // Load .env if present; optional for local development.
    if let Err(e) = dotenvy::dotenv() {
        if !matches!(e, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
        {
            eprintln!("Warning: Failed to load .env file: {e}");
        }
    }

    tzlev_server::observability::init_tracing();

    let config_path =
        std::env::var("TZLEV_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

    let cfg = match load_config(Some(&config_path)) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(2);
        }
    };

    tracing::info!(path = %config_path, "Configuration loaded");

    let store = match KvStore::connect(&cfg.redis.url(), cfg.redis.pool_size).await {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Redis connection failed: {e}");
            std::process::exit(2);
        }
    };

    // User records live in the external relational store; until that
    // integration is wired in, the in-memory store keeps the server
    // runnable for development.
    let users = Arc::new(MemoryUserStore::new());

    let app = tzlev_server::build_router(store, users, &cfg);

    let addr = format!("{}:{}", cfg.server.host, cfg.server.port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Failed to bind {addr}: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!(%addr, "tzlev server listening");

    if let Err(e) = axum::serve(listener, app).await {
        eprintln!("Server error: {e}");
        std::process::exit(1);
    }
}

//! # tzlev-server
//!
//! HTTP server assembly for tzlev: configuration loading, tracing setup,
//! and the application router wiring the auth endpoints over the shared
//! key-value store.

use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use tzlev_auth::{AuthApi, AuthService, UserStore, auth_router};
use tzlev_cache::KvStore;

pub mod config;
pub mod observability;

pub use config::{RedisConfig, ServerConfig, load_config};

/// Builds the application router.
///
/// The auth endpoints share one [`KvStore`] client for sessions, OAuth
/// state and the profile cache; `users` is the lookup interface to the
/// user records.
pub fn build_router(
    store: KvStore,
    users: Arc<dyn UserStore>,
    config: &ServerConfig,
) -> Router {
    let service = Arc::new(AuthService::new(users, store.clone(), &config.auth));
    let api = AuthApi::new(service, config.auth.cookie.clone());

    let health = Router::new()
        .route("/health", get(health_handler))
        .with_state(store);

    Router::new().merge(health).merge(auth_router().with_state(api))
}

/// Health response body.
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    message: &'static str,
    store: &'static str,
}

/// Liveness check; reports whether the key-value store answers.
async fn health_handler(State(store): State<KvStore>) -> Json<HealthResponse> {
    let store_status = match store.ping().await {
        Ok(()) => "ok",
        Err(e) => {
            tracing::warn!(error = %e, "health check: store unreachable");
            "unreachable"
        }
    };

    Json(HealthResponse {
        status: "ok",
        message: "Server is running",
        store: store_status,
    })
}

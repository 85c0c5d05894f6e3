//! HTTP-level tests for the auth endpoints over in-process stores.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use tzlev_auth::{MemoryUserStore, UserRecord, hash_password};
use tzlev_cache::KvStore;
use tzlev_server::ServerConfig;

async fn app() -> Router {
    let users = MemoryUserStore::new();
    users
        .insert(
            UserRecord::new("123456789", "Dana", "Levi")
                .with_email("dana@example.com")
                .with_role("teacher")
                .with_hashed_password(hash_password("correct").unwrap()),
        )
        .await;

    tzlev_server::build_router(
        KvStore::memory(),
        Arc::new(users),
        &ServerConfig::default(),
    )
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Pulls `tzlev_sid=<value>` out of the Set-Cookie header.
fn session_cookie(response: &axum::response::Response) -> String {
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("response sets the session cookie")
        .to_str()
        .unwrap();

    let pair = set_cookie.split(';').next().unwrap();
    assert!(pair.starts_with("tzlev_sid="));
    pair.to_string()
}

fn login_request(zehut: &str, password: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({ "zehut": zehut, "password": password }).to_string(),
        ))
        .unwrap()
}

#[tokio::test]
async fn test_login_me_logout_cycle() {
    let app = app().await;

    // Login.
    let response = app
        .clone()
        .oneshot(login_request("123456789", "correct"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = session_cookie(&response);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");

    // Current user.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/auth/me")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["user"]["zehut"], "123456789");
    assert_eq!(body["user"]["first_name"], "Dana");
    assert_eq!(body["user"]["last_name"], "Levi");
    assert_eq!(body["user"]["email"], "dana@example.com");
    assert_eq!(body["user"]["role"], "teacher");
    assert_eq!(body["user"]["is_admin"], false);

    // Logout.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/logout")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // The session is gone.
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/auth/me")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_failure_body_is_generic() {
    let app = app().await;

    // Wrong password and unknown user produce byte-identical bodies.
    let response = app
        .clone()
        .oneshot(login_request("123456789", "wrong"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let wrong_password = body_json(response).await;

    let response = app
        .oneshot(login_request("000000000", "correct"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let unknown_user = body_json(response).await;

    assert_eq!(wrong_password, unknown_user);
    assert_eq!(wrong_password["error"], "Invalid credentials");
}

#[tokio::test]
async fn test_me_without_cookie_is_unauthorized() {
    let app = app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/auth/me")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Not authenticated");
}

#[tokio::test]
async fn test_logout_without_session_still_succeeds() {
    let app = app().await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/logout")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_google_login_redirects_with_state() {
    let app = app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/auth/google")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let location = response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(location.contains("state="));
    assert!(location.contains("response_type=code"));

    // The session cookie rides along so the callback can find the state.
    session_cookie(&response);
}

#[tokio::test]
async fn test_callback_without_cookie_fails_closed() {
    let app = app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/auth/google/callback?state=whatever&code=abc")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Invalid state parameter");
}

#[tokio::test]
async fn test_health() {
    let app = app().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["store"], "ok");
}

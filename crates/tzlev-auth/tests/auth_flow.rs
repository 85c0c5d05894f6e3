//! End-to-end authentication flows over in-process stores.

use std::sync::Arc;

use tzlev_auth::{
    AuthConfig, AuthError, AuthService, MemoryUserStore, SessionError, UserRecord, UserStore,
    hash_password,
};
use tzlev_cache::KvStore;

/// Builds a service over fresh in-process stores, returning handles to the
/// pieces tests assert against.
async fn service_with_user() -> (AuthService, MemoryUserStore) {
    let users = MemoryUserStore::new();
    users
        .insert(
            UserRecord::new("123456789", "Dana", "Levi")
                .with_email("dana@example.com")
                .with_role("teacher")
                .with_hashed_password(hash_password("correct").unwrap()),
        )
        .await;

    let service = AuthService::new(
        Arc::new(users.clone()),
        KvStore::memory(),
        &AuthConfig::default(),
    );

    (service, users)
}

#[tokio::test]
async fn test_password_login_creates_session_and_resolves_user() {
    let (service, _) = service_with_user().await;

    let session = service
        .login_with_password("sid-1", "123456789", "correct")
        .await
        .unwrap();

    assert_eq!(session.zehut, "123456789");
    assert_eq!(session.email, "dana@example.com");
    assert_eq!(session.name, "Dana Levi");

    // The session is retrievable and the current-user lookup returns the
    // authoritative profile.
    let user = service.current_user("sid-1").await.unwrap();
    assert_eq!(user.zehut, "123456789");
    assert_eq!(user.role.as_deref(), Some("teacher"));
    assert!(!user.is_admin);
}

#[tokio::test]
async fn test_wrong_password_fails_without_session() {
    let (service, _) = service_with_user().await;

    let err = service
        .login_with_password("sid-1", "123456789", "wrong")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidCredentials));

    // No session was created.
    assert!(matches!(
        service.sessions().get("sid-1").await,
        Err(SessionError::NotFound)
    ));
}

#[tokio::test]
async fn test_unknown_user_and_wrong_password_are_indistinguishable() {
    let (service, _) = service_with_user().await;

    let unknown = service
        .login_with_password("sid-1", "000000000", "correct")
        .await
        .unwrap_err();
    let wrong = service
        .login_with_password("sid-2", "123456789", "wrong")
        .await
        .unwrap_err();

    assert_eq!(unknown.to_string(), wrong.to_string());
}

#[tokio::test]
async fn test_logout_is_idempotent() {
    let (service, _) = service_with_user().await;

    service
        .login_with_password("sid-1", "123456789", "correct")
        .await
        .unwrap();

    service.logout("sid-1").await.unwrap();
    // A second logout for the now-deleted session still succeeds.
    service.logout("sid-1").await.unwrap();

    assert!(matches!(
        service.sessions().get("sid-1").await,
        Err(SessionError::NotFound)
    ));
}

#[tokio::test]
async fn test_current_user_without_session_is_unauthenticated() {
    let (service, _) = service_with_user().await;

    let err = service.current_user("no-such-session").await.unwrap_err();
    assert!(err.is_authentication_error());
}

#[tokio::test]
async fn test_current_user_reflects_profile_updates() {
    let (service, users) = service_with_user().await;

    service
        .login_with_password("sid-1", "123456789", "correct")
        .await
        .unwrap();

    // Change the record through the cached write path; the next lookup
    // must see the new value, not a stale cache entry.
    let mut record = users.find_by_zehut("123456789").await.unwrap().unwrap();
    record.role = Some("principal".to_string());
    service.profiles().update(&record).await.unwrap();

    let user = service.current_user("sid-1").await.unwrap();
    assert_eq!(user.role.as_deref(), Some("principal"));
}

#[tokio::test]
async fn test_relogin_replaces_session() {
    let (service, users) = service_with_user().await;
    users
        .insert(
            UserRecord::new("111111118", "Noa", "Cohen")
                .with_email("noa@example.com")
                .with_hashed_password(hash_password("hers").unwrap()),
        )
        .await;

    service
        .login_with_password("sid-1", "123456789", "correct")
        .await
        .unwrap();
    service
        .login_with_password("sid-1", "111111118", "hers")
        .await
        .unwrap();

    // Last login wins.
    let session = service.sessions().get("sid-1").await.unwrap();
    assert_eq!(session.zehut, "111111118");
}

//! Upgrade-gate and token validation tests.
//!
//! The relay endpoint must reject any request whose identity cannot be
//! resolved, before the WebSocket upgrade happens.

use axum::http::StatusCode;
use pretty_assertions::assert_eq;

use crate::common::{expired_token_for, test_user, token_for, TestApp};

#[tokio::test]
async fn test_ws_without_token_is_rejected() {
    let app = TestApp::new(vec![test_user("alice@example.com")]);

    let response = app.get("/ws").await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_ws_with_garbage_token_is_rejected() {
    let app = TestApp::new(vec![test_user("alice@example.com")]);

    let response = app.get_auth("/ws", "not-a-jwt").await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_ws_with_expired_token_is_rejected() {
    let app = TestApp::new(vec![test_user("alice@example.com")]);

    let token = expired_token_for("alice@example.com");
    let response = app.get_auth("/ws", &token).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_ws_with_unknown_identity_is_rejected() {
    // A validly signed token whose subject has no account.
    let app = TestApp::new(vec![test_user("alice@example.com")]);

    let token = token_for("ghost@example.com");
    let response = app.get_auth("/ws", &token).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_ws_with_valid_identity_passes_the_gate() {
    // Without upgrade headers the request cannot become a WebSocket, but
    // it must get past authentication.
    let app = TestApp::new(vec![test_user("alice@example.com")]);

    let token = token_for("alice@example.com");
    let response = app.get_auth("/ws", &token).await;

    assert_ne!(response.status(), StatusCode::UNAUTHORIZED);
}

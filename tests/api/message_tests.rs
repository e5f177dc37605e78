//! Message REST API Tests
//!
//! Conversation history and author-gated deletion over in-memory stores.

use axum::http::StatusCode;
use pretty_assertions::assert_eq;

use socialhive::domain::ChatMessage;

use crate::common::{body_json, test_user, token_for, TestApp};

const ALICE: &str = "alice@example.com";
const BOB: &str = "bob@example.com";
const CAROL: &str = "carol@example.com";

fn app_with_accounts() -> TestApp {
    TestApp::new(vec![test_user(ALICE), test_user(BOB), test_user(CAROL)])
}

fn message(from: &str, to: &str, content: &str) -> ChatMessage {
    ChatMessage::new(test_user(from), test_user(to), content)
}

#[tokio::test]
async fn test_conversation_requires_authentication() {
    let app = app_with_accounts();

    let response = app
        .get(&format!("/api/v1/messages/{}/{}", ALICE, BOB))
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_conversation_forbidden_for_third_party() {
    let app = app_with_accounts();

    let token = token_for(CAROL);
    let response = app
        .get_auth(&format!("/api/v1/messages/{}/{}", ALICE, BOB), &token)
        .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_conversation_returns_messages_in_both_directions() {
    let app = app_with_accounts();
    app.messages.seed(message(ALICE, BOB, "hi bob"));
    app.messages.seed(message(BOB, ALICE, "hi alice"));
    app.messages.seed(message(ALICE, CAROL, "unrelated"));

    let token = token_for(ALICE);
    let response = app
        .get_auth(&format!("/api/v1/messages/{}/{}", ALICE, BOB), &token)
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let conversation = json.as_array().unwrap();
    assert_eq!(conversation.len(), 2);
    assert_eq!(conversation[0]["content"], "hi bob");
    assert_eq!(conversation[1]["content"], "hi alice");
}

#[tokio::test]
async fn test_conversation_with_unknown_user_is_not_found() {
    let app = app_with_accounts();

    let token = token_for(ALICE);
    let response = app
        .get_auth(
            &format!("/api/v1/messages/{}/ghost@example.com", ALICE),
            &token,
        )
        .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_message_forbidden_for_non_author() {
    let app = app_with_accounts();
    let stored = message(ALICE, BOB, "mine");
    let id = stored.id;
    app.messages.seed(stored);

    let token = token_for(BOB);
    let response = app
        .delete_auth(&format!("/api/v1/messages/{}", id), &token)
        .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(app.messages.len(), 1);
}

#[tokio::test]
async fn test_delete_message_by_author_removes_and_returns_it() {
    let app = app_with_accounts();
    let stored = message(ALICE, BOB, "mine");
    let id = stored.id;
    app.messages.seed(stored);

    let token = token_for(ALICE);
    let response = app
        .delete_auth(&format!("/api/v1/messages/{}", id), &token)
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["content"], "mine");
    assert_eq!(json["_id"], serde_json::json!(id));
    assert_eq!(app.messages.len(), 0);
}

#[tokio::test]
async fn test_delete_unknown_message_is_not_found() {
    let app = app_with_accounts();

    let token = token_for(ALICE);
    let response = app
        .delete_auth(
            &format!("/api/v1/messages/{}", uuid::Uuid::new_v4()),
            &token,
        )
        .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_with_malformed_id_is_bad_request() {
    let app = app_with_accounts();

    let token = token_for(ALICE);
    let response = app
        .delete_auth("/api/v1/messages/not-a-uuid", &token)
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

//! Common Test Utilities
//!
//! In-memory store implementations and request helpers, so the full
//! router runs in tests without PostgreSQL.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{body::Body, http::Request, response::Response, Router};
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use parking_lot::Mutex;
use tower::ServiceExt;
use uuid::Uuid;

use socialhive::config::{
    CorsSettings, DatabaseSettings, JwtSettings, RelaySettings, ServerSettings, Settings,
};
use socialhive::domain::{ChatMessage, MessageStore, User, UserStore};
use socialhive::presentation::http::routes;
use socialhive::presentation::middleware::Claims;
use socialhive::shared::error::AppError;
use socialhive::startup::AppState;

pub const TEST_JWT_SECRET: &str = "test-secret-0123456789abcdef0123456789";

/// In-memory user store backed by a fixed account list.
pub struct InMemoryUserStore {
    users: Vec<User>,
}

impl InMemoryUserStore {
    pub fn new(users: Vec<User>) -> Self {
        Self { users }
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self.users.iter().find(|u| u.email == email).cloned())
    }
}

/// In-memory message store.
#[derive(Default)]
pub struct InMemoryMessageStore {
    messages: Mutex<Vec<ChatMessage>>,
}

impl InMemoryMessageStore {
    pub fn seed(&self, message: ChatMessage) {
        self.messages.lock().push(message);
    }

    pub fn len(&self) -> usize {
        self.messages.lock().len()
    }
}

#[async_trait]
impl MessageStore for InMemoryMessageStore {
    async fn insert(&self, message: &ChatMessage) -> Result<(), AppError> {
        self.messages.lock().push(message.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ChatMessage>, AppError> {
        Ok(self.messages.lock().iter().find(|m| m.id == id).cloned())
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<(), AppError> {
        let mut messages = self.messages.lock();
        let before = messages.len();
        messages.retain(|m| m.id != id);
        if messages.len() == before {
            return Err(AppError::NotFound(format!("Message {} not found", id)));
        }
        Ok(())
    }

    async fn find_between(
        &self,
        user_a: &str,
        user_b: &str,
    ) -> Result<Vec<ChatMessage>, AppError> {
        let mut matching: Vec<ChatMessage> = self
            .messages
            .lock()
            .iter()
            .filter(|m| {
                (m.sender.email == user_a && m.recipient.email == user_b)
                    || (m.sender.email == user_b && m.recipient.email == user_a)
            })
            .cloned()
            .collect();
        matching.sort_by_key(|m| m.timestamp);
        Ok(matching)
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}

/// Test application running the real router over in-memory stores.
pub struct TestApp {
    pub router: Router,
    pub messages: Arc<InMemoryMessageStore>,
}

impl TestApp {
    /// Create a test application with the given known accounts.
    pub fn new(users: Vec<User>) -> Self {
        let messages = Arc::new(InMemoryMessageStore::default());
        let user_store: Arc<dyn UserStore> = Arc::new(InMemoryUserStore::new(users));
        let message_store: Arc<dyn MessageStore> = messages.clone();

        let state = AppState::new(user_store, message_store, test_settings());
        let router = routes::create_router(state);

        Self { router, messages }
    }

    /// Make a GET request to the application
    pub async fn get(&self, uri: &str) -> Response {
        self.router
            .clone()
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    /// Make an authenticated GET request
    pub async fn get_auth(&self, uri: &str, token: &str) -> Response {
        self.router
            .clone()
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri(uri)
                    .header("Authorization", format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    /// Make an authenticated DELETE request
    pub async fn delete_auth(&self, uri: &str, token: &str) -> Response {
        self.router
            .clone()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri(uri)
                    .header("Authorization", format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
    }
}

/// Settings fixture matching the defaults, minus any file/env loading.
pub fn test_settings() -> Settings {
    Settings {
        server: ServerSettings {
            host: "127.0.0.1".into(),
            port: 0,
        },
        database: DatabaseSettings {
            url: "postgres://localhost/socialhive_test".into(),
            max_connections: 2,
            min_connections: 1,
            acquire_timeout: 5,
        },
        jwt: JwtSettings {
            secret: TEST_JWT_SECRET.into(),
        },
        cors: CorsSettings {
            allowed_origins: vec![],
        },
        relay: RelaySettings {
            store_timeout_secs: 5,
            max_message_size: 65536,
            max_frame_size: 16384,
        },
        environment: "test".into(),
    }
}

/// Build a test account.
pub fn test_user(email: &str) -> User {
    User {
        id: Uuid::new_v4(),
        name: email.split('@').next().unwrap_or("user").to_string(),
        email: email.to_string(),
        password_hash: "hash".to_string(),
        avatar_url: None,
        created_at: Utc::now(),
    }
}

/// Mint a valid token for an identity.
pub fn token_for(email: &str) -> String {
    mint_token(email, Utc::now().timestamp() + 3600)
}

/// Mint an already-expired token for an identity.
pub fn expired_token_for(email: &str) -> String {
    mint_token(email, Utc::now().timestamp() - 3600)
}

fn mint_token(email: &str, exp: i64) -> String {
    let claims = Claims {
        sub: email.to_string(),
        exp,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .expect("token encoding should not fail")
}

/// Read a response body as JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    serde_json::from_slice(&bytes).expect("body should be JSON")
}

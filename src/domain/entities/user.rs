//! User entity and store trait.
//!
//! Maps to the `users` table. User records are owned by the wider backend;
//! the relay only reads them to stamp message snapshots and to verify that
//! an authenticated identity actually exists.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::error::AppError;

/// Represents a user account.
///
/// Maps to the `users` table:
/// - id: UUID PRIMARY KEY
/// - name: VARCHAR(64) NOT NULL
/// - email: VARCHAR(255) NOT NULL UNIQUE
/// - password_hash: VARCHAR(255) NOT NULL
/// - avatar_url: TEXT NULL
/// - created_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
///
/// The email doubles as the chat identity: at most one live relay
/// connection is bound to it at any instant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Primary key
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// Email address (unique, the chat identity)
    pub email: String,

    /// Password hash, never serialized into snapshots or responses
    #[serde(skip_serializing, default)]
    pub password_hash: String,

    /// URL to the user's avatar image
    pub avatar_url: Option<String>,

    /// Account creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Store trait for user lookups.
///
/// The implementation lives in the infrastructure layer; the trait is
/// defined here to maintain dependency inversion.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Find a user by their email address.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
}

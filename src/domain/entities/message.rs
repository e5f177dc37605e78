//! Chat message entity and store trait.
//!
//! Maps to the `chat_messages` table. Sender and recipient are embedded as
//! full user snapshots taken at dispatch time, not references.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::User;
use crate::shared::error::AppError;

/// Delivery status stamped on a persisted message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    /// Persisted and handed to the relay for live fan-out
    #[default]
    Sent,
}

impl DeliveryStatus {
    /// Convert from database string representation.
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "sent" => Self::Sent,
            _ => Self::Sent,
        }
    }

    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sent => "sent",
        }
    }
}

impl std::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Represents one direct chat message.
///
/// Maps to the `chat_messages` table:
/// - id: UUID PRIMARY KEY
/// - sender: JSONB NOT NULL (user snapshot)
/// - recipient: JSONB NOT NULL (user snapshot)
/// - content: TEXT NOT NULL
/// - timestamp: TIMESTAMPTZ NOT NULL
/// - status: VARCHAR(20) NOT NULL DEFAULT 'sent'
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Message id, exposed on the wire as `_id`
    #[serde(rename = "_id")]
    pub id: Uuid,

    /// Sender snapshot as resolved at dispatch time
    pub sender: User,

    /// Recipient snapshot as resolved at dispatch time
    pub recipient: User,

    /// Message text
    pub content: String,

    /// Creation timestamp
    pub timestamp: DateTime<Utc>,

    /// Delivery status
    pub status: DeliveryStatus,
}

impl ChatMessage {
    /// Build a fresh message with a new id and the current timestamp.
    pub fn new(sender: User, recipient: User, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender,
            recipient,
            content: content.into(),
            timestamp: Utc::now(),
            status: DeliveryStatus::Sent,
        }
    }
}

/// Store trait for durable message records.
///
/// The store is an external transactional resource: the relay never caches
/// its contents in process.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Persist a new message.
    async fn insert(&self, message: &ChatMessage) -> Result<(), AppError>;

    /// Point lookup by message id.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<ChatMessage>, AppError>;

    /// Hard-delete a message by id.
    async fn delete_by_id(&self, id: Uuid) -> Result<(), AppError>;

    /// Conversation history between two identities, oldest first.
    async fn find_between(&self, user_a: &str, user_b: &str)
        -> Result<Vec<ChatMessage>, AppError>;

    /// Connectivity check for readiness probes.
    async fn ping(&self) -> Result<(), AppError>;
}

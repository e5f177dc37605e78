//! Message Repository Implementation
//!
//! PostgreSQL implementation of the durable message store. Sender and
//! recipient snapshots are stored as JSONB documents, mirroring the wire
//! shape of the message.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{ChatMessage, DeliveryStatus, MessageStore, User};
use crate::shared::error::AppError;

/// PostgreSQL message repository implementation.
pub struct PgMessageRepository {
    pool: PgPool,
}

impl PgMessageRepository {
    /// Creates a new PgMessageRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Internal row type for message queries.
/// Maps to the chat_messages table schema defined in the migration.
#[derive(Debug, sqlx::FromRow)]
struct ChatMessageRow {
    id: Uuid,
    sender: Json<User>,
    recipient: Json<User>,
    content: String,
    timestamp: DateTime<Utc>,
    status: String,
}

impl ChatMessageRow {
    /// Converts database row to domain ChatMessage entity.
    fn into_message(self) -> ChatMessage {
        ChatMessage {
            id: self.id,
            sender: self.sender.0,
            recipient: self.recipient.0,
            content: self.content,
            timestamp: self.timestamp,
            status: DeliveryStatus::from_str(&self.status),
        }
    }
}

#[async_trait]
impl MessageStore for PgMessageRepository {
    /// Persist a new message.
    async fn insert(&self, message: &ChatMessage) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO chat_messages (id, sender, recipient, content, timestamp, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(message.id)
        .bind(Json(&message.sender))
        .bind(Json(&message.recipient))
        .bind(&message.content)
        .bind(message.timestamp)
        .bind(message.status.as_str())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Find a message by its id.
    ///
    /// Returns None if the message does not exist.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<ChatMessage>, AppError> {
        let row = sqlx::query_as::<_, ChatMessageRow>(
            r#"
            SELECT id, sender, recipient, content, timestamp, status
            FROM chat_messages
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_message()))
    }

    /// Hard-delete a message.
    async fn delete_by_id(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM chat_messages WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Message {} not found", id)));
        }

        Ok(())
    }

    /// Conversation history between two identities, oldest first.
    ///
    /// Matches messages in either direction between the two addresses.
    async fn find_between(
        &self,
        user_a: &str,
        user_b: &str,
    ) -> Result<Vec<ChatMessage>, AppError> {
        let rows = sqlx::query_as::<_, ChatMessageRow>(
            r#"
            SELECT id, sender, recipient, content, timestamp, status
            FROM chat_messages
            WHERE (sender->>'email' = $1 AND recipient->>'email' = $2)
               OR (sender->>'email' = $2 AND recipient->>'email' = $1)
            ORDER BY timestamp ASC
            "#,
        )
        .bind(user_a)
        .bind(user_b)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_message()).collect())
    }

    /// Connectivity check for readiness probes.
    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

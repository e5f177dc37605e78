//! Relay Wire Protocol
//!
//! Text frames exchanged with chat clients. Inbound frames carry one
//! action; outbound frames carry the resulting event or a presence change.

use serde::{Deserialize, Serialize};

use crate::domain::ChatMessage;

/// Plain-text notice sent to a sender whose recipient is unknown.
pub const UNKNOWN_RECIPIENT_NOTICE: &str = "user does not exist";

/// Action kind of an inbound frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientAction {
    /// Send a new message to another identity
    Send,
    /// Delete a previously sent message by id
    Delete,
}

/// One inbound client frame.
///
/// ```json
/// { "action": "send", "to": "bob@example.com", "msg": "hi" }
/// { "action": "delete", "to": "", "msg": "<message-id-hex>" }
/// ```
///
/// For `delete`, the `msg` field is reused to carry the target message id.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientFrame {
    pub action: ClientAction,
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub msg: String,
}

/// One outbound event frame.
///
/// Serializes as `{ "action": ..., "message_content": ... }` where the
/// content is a full message for send/delete and the subject identity for
/// presence changes.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "action", content = "message_content", rename_all = "lowercase")]
pub enum ServerEvent {
    Send(ChatMessage),
    Delete(ChatMessage),
    Online(String),
    Offline(String),
}

impl ServerEvent {
    /// Action kind for logging and metrics labels.
    pub fn kind(&self) -> &'static str {
        match self {
            ServerEvent::Send(_) => "send",
            ServerEvent::Delete(_) => "delete",
            ServerEvent::Online(_) => "online",
            ServerEvent::Offline(_) => "offline",
        }
    }

    /// The message payload, if this event carries one.
    pub fn message(&self) -> Option<&ChatMessage> {
        match self {
            ServerEvent::Send(message) | ServerEvent::Delete(message) => Some(message),
            _ => None,
        }
    }

    /// The subject identity of a presence event.
    pub fn subject(&self) -> Option<&str> {
        match self {
            ServerEvent::Online(identity) | ServerEvent::Offline(identity) => Some(identity),
            _ => None,
        }
    }
}

//! Message Handlers
//!
//! REST access to the durable message records: conversation history and
//! author-gated deletion. Live fan-out happens over the relay, not here.

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use uuid::Uuid;

use crate::domain::ChatMessage;
use crate::presentation::middleware::AuthUser;
use crate::shared::error::AppError;
use crate::startup::AppState;

/// Get the conversation history between two identities.
///
/// The requester must be one of the two participants, and both accounts
/// must exist.
pub async fn get_conversation(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path((user_a, user_b)): Path<(String, String)>,
) -> Result<Json<Vec<ChatMessage>>, AppError> {
    if auth.email != user_a && auth.email != user_b {
        return Err(AppError::Forbidden(
            "You are not allowed to request this conversation".into(),
        ));
    }

    for email in [&user_a, &user_b] {
        if state.users.find_by_email(email).await?.is_none() {
            return Err(AppError::NotFound("One or both users not found".into()));
        }
    }

    let messages = state.messages.find_between(&user_a, &user_b).await?;

    Ok(Json(messages))
}

/// Delete a message by id.
///
/// Only the message author may delete it; the deleted record is returned
/// so the client can reconcile its view.
pub async fn delete_message(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(message_id): Path<String>,
) -> Result<Json<ChatMessage>, AppError> {
    let id = Uuid::parse_str(message_id.trim())
        .map_err(|_| AppError::BadRequest("Invalid message id".into()))?;

    let message = state
        .messages
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Message not found".into()))?;

    if message.sender.email != auth.email {
        return Err(AppError::Forbidden(
            "You are not allowed to delete this message".into(),
        ));
    }

    state.messages.delete_by_id(id).await?;

    Ok(Json(message))
}

//! Relay Core
//!
//! Owns the accept -> read-loop -> dispatch -> teardown lifecycle of every
//! chat connection. Inbound frames are handled one at a time per
//! connection; fan-out writes happen on per-connection writer tasks so a
//! slow or dead peer never stalls a dispatcher.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{
        ws::{Message, WebSocket},
        Extension, State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use uuid::Uuid;

use super::frames::{ClientAction, ClientFrame, ServerEvent, UNKNOWN_RECIPIENT_NOTICE};
use super::registry::{ConnectionHandle, ConnectionRegistry};
use crate::domain::{ChatMessage, MessageStore, UserStore};
use crate::infrastructure::metrics;
use crate::presentation::middleware::AuthUser;
use crate::shared::error::AppError;
use crate::startup::AppState;

/// The chat relay: registry plus dispatch over the durable stores.
///
/// Every dispatch and every registry mutation runs under `dispatch_lock`,
/// so the persist-then-broadcast sequences of different connections are
/// serialized against each other and against presence changes. Socket
/// writes are only enqueued under the lock; they complete on independent
/// writer tasks.
pub struct Relay {
    registry: Arc<ConnectionRegistry>,
    users: Arc<dyn UserStore>,
    messages: Arc<dyn MessageStore>,
    dispatch_lock: tokio::sync::Mutex<()>,
    store_timeout: Duration,
}

impl Relay {
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        users: Arc<dyn UserStore>,
        messages: Arc<dyn MessageStore>,
        store_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            users,
            messages,
            dispatch_lock: tokio::sync::Mutex::new(()),
            store_timeout,
        }
    }

    /// Registry accessor for health reporting.
    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// Register a connection and announce the identity to everyone else.
    ///
    /// The `online` event fires only when this is the identity's first
    /// binding in the current online set; a reconnect that replaces an
    /// existing binding stays silent.
    pub async fn connect(&self, handle: &ConnectionHandle) {
        let _guard = self.dispatch_lock.lock().await;
        let first_binding = self.registry.register(handle.clone());
        metrics::set_active_connections(self.registry.connection_count());
        if first_binding {
            self.broadcast_presence(ServerEvent::Online(handle.identity().to_string()));
        }
    }

    /// Remove a connection and, if it still held its identity binding,
    /// announce the identity as offline to everyone remaining.
    pub async fn disconnect(&self, handle: &ConnectionHandle) {
        let _guard = self.dispatch_lock.lock().await;
        let released = self.registry.unregister(handle);
        metrics::set_active_connections(self.registry.connection_count());
        if released {
            self.broadcast_presence(ServerEvent::Offline(handle.identity().to_string()));
        }
    }

    /// Handle one inbound action: mutate the message store, then fan the
    /// resulting event out to the recipient (if online) and back to the
    /// sender. Store failures abort the dispatch without any broadcast.
    pub async fn dispatch(&self, sender: &ConnectionHandle, frame: ClientFrame) {
        let _guard = self.dispatch_lock.lock().await;

        let event = match frame.action {
            ClientAction::Send => self.handle_send(sender, &frame).await,
            ClientAction::Delete => self.handle_delete(&frame).await,
        };

        let Some(event) = event else { return };
        metrics::record_event(event.kind());
        self.fan_out(sender, &event);
    }

    async fn handle_send(
        &self,
        sender: &ConnectionHandle,
        frame: &ClientFrame,
    ) -> Option<ServerEvent> {
        // Snapshots are resolved at dispatch time, not at connect time.
        let sender_user = match self
            .timed("find_user", self.users.find_by_email(sender.identity()))
            .await
        {
            Ok(Some(user)) => user,
            Ok(None) => {
                tracing::warn!(
                    identity = %sender.identity(),
                    "authenticated sender missing from user store, dropping send"
                );
                return None;
            }
            Err(error) => {
                tracing::warn!(%error, "sender lookup failed, dropping send");
                return None;
            }
        };

        let recipient = match self
            .timed("find_user", self.users.find_by_email(&frame.to))
            .await
        {
            Ok(Some(user)) => user,
            Ok(None) => {
                // Unknown to the wider system, not merely offline: tell
                // the sender, persist nothing.
                self.deliver(sender, UNKNOWN_RECIPIENT_NOTICE.to_string());
                return None;
            }
            Err(error) => {
                tracing::warn!(%error, recipient = %frame.to, "recipient lookup failed, dropping send");
                return None;
            }
        };

        let message = ChatMessage::new(sender_user, recipient, frame.msg.clone());
        if let Err(error) = self
            .timed("insert_message", self.messages.insert(&message))
            .await
        {
            tracing::error!(
                %error,
                message_id = %message.id,
                "failed to persist message, no broadcast"
            );
            return None;
        }

        Some(ServerEvent::Send(message))
    }

    async fn handle_delete(&self, frame: &ClientFrame) -> Option<ServerEvent> {
        // The msg field carries the target id; anything unparseable is
        // dropped without an event.
        let id = Uuid::parse_str(frame.msg.trim()).ok()?;

        let message = match self
            .timed("find_message", self.messages.find_by_id(id))
            .await
        {
            Ok(Some(message)) => message,
            Ok(None) => return None,
            Err(error) => {
                tracing::debug!(%error, message_id = %id, "delete target lookup failed");
                return None;
            }
        };

        if let Err(error) = self
            .timed("delete_message", self.messages.delete_by_id(id))
            .await
        {
            tracing::warn!(%error, message_id = %id, "failed to delete message");
            return None;
        }

        Some(ServerEvent::Delete(message))
    }

    /// Enqueue the event to the message's recipient (when online) and
    /// always back to the sender's own connection.
    fn fan_out(&self, sender: &ConnectionHandle, event: &ServerEvent) {
        let Some(message) = event.message() else { return };
        let payload = match serde_json::to_string(event) {
            Ok(payload) => payload,
            Err(error) => {
                tracing::error!(%error, "failed to encode outbound event");
                return;
            }
        };

        if let Some(recipient) = self.registry.lookup(&message.recipient.email) {
            self.deliver(&recipient, payload.clone());
        }
        self.deliver(sender, payload);
    }

    /// Presence fan-out to every bound identity except the subject.
    fn broadcast_presence(&self, event: ServerEvent) {
        let Some(subject) = event.subject().map(str::to_owned) else {
            return;
        };
        let payload = match serde_json::to_string(&event) {
            Ok(payload) => payload,
            Err(error) => {
                tracing::error!(%error, "failed to encode presence event");
                return;
            }
        };
        metrics::record_event(event.kind());

        for identity in self.registry.identities() {
            if identity == subject {
                continue;
            }
            if let Some(handle) = self.registry.lookup(&identity) {
                self.deliver(&handle, payload.clone());
            }
        }
    }

    /// Fire-and-forget delivery: a refused enqueue means the peer's
    /// writer task is gone, so the connection is pruned from the registry
    /// and the failure never reaches the dispatching flow.
    fn deliver(&self, target: &ConnectionHandle, payload: String) {
        if target.enqueue(payload).is_err() {
            metrics::record_delivery_failure();
            self.registry.prune(target);
            metrics::set_active_connections(self.registry.connection_count());
            tracing::warn!(
                identity = %target.identity(),
                conn_id = %target.id(),
                "delivery failed, connection pruned"
            );
        }
    }

    /// Bound a durable-store call; expiry fails only the current dispatch.
    async fn timed<T>(
        &self,
        operation: &'static str,
        fut: impl Future<Output = Result<T, AppError>>,
    ) -> Result<T, AppError> {
        let start = Instant::now();
        let result = match tokio::time::timeout(self.store_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(AppError::Timeout(format!(
                "{} exceeded {:?}",
                operation, self.store_timeout
            ))),
        };
        metrics::record_store_op(operation, start.elapsed().as_secs_f64());
        result
    }
}

/// WebSocket upgrade handler for `/ws`.
///
/// The auth middleware has already resolved and verified the identity;
/// requests without one never reach this handler.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Response {
    ws.max_message_size(state.settings.relay.max_message_size)
        .max_frame_size(state.settings.relay.max_frame_size)
        .on_upgrade(move |socket| handle_socket(socket, state, auth.email))
}

/// Per-connection lifecycle: writer task, registration with presence,
/// cooperative read loop, teardown with presence.
async fn handle_socket(socket: WebSocket, state: AppState, identity: String) {
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let handle = ConnectionHandle::new(identity.clone(), tx);

    tracing::debug!(identity = %identity, conn_id = %handle.id(), "new relay connection");

    // Writer task: the only place that touches the sink. When a write
    // fails the task exits, later deliveries fail to enqueue, and the
    // connection gets pruned.
    let writer = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if sink.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
        let _ = sink.close().await;
    });

    state.relay.connect(&handle).await;
    tracing::info!(identity = %identity, conn_id = %handle.id(), "connection registered");

    // One frame at a time: the next read starts only after the current
    // dispatch returned.
    while let Some(incoming) = stream.next().await {
        match incoming {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientFrame>(&text) {
                Ok(frame) => state.relay.dispatch(&handle, frame).await,
                Err(error) => {
                    tracing::debug!(identity = %identity, %error, "malformed frame dropped");
                }
            },
            Ok(Message::Close(_)) => {
                tracing::debug!(identity = %identity, "connection closed by peer");
                break;
            }
            Ok(_) => {
                // Ping/pong are answered by axum; binary frames are not
                // part of the protocol.
            }
            Err(error) => {
                tracing::debug!(identity = %identity, %error, "read error");
                break;
            }
        }
    }

    // Runs on every exit path from the read loop.
    state.relay.disconnect(&handle).await;
    writer.abort();
    tracing::info!(identity = %identity, conn_id = %handle.id(), "connection released");
}

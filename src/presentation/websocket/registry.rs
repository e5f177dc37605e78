//! Connection Registry
//!
//! Bookkeeping of live connections and identity bindings; the single
//! source of truth for who is online. Knows nothing about message content.

use std::collections::HashMap;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Outbound sink for one live connection.
///
/// Frames enqueued here are written to the socket by the connection's
/// writer task, so enqueueing never blocks the caller.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: Uuid,
    identity: String,
    tx: mpsc::UnboundedSender<String>,
}

impl ConnectionHandle {
    pub fn new(identity: impl Into<String>, tx: mpsc::UnboundedSender<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            identity: identity.into(),
            tx,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Hand a frame to the writer task. Fails when the task is gone,
    /// which means the underlying socket is dead.
    pub fn enqueue(&self, frame: String) -> Result<(), ()> {
        self.tx.send(frame).map_err(|_| ())
    }
}

/// Two consistent views over the same set of live connections:
/// existence membership keyed by connection id, and at most one bound
/// connection per identity.
///
/// Invariant: every identity binding points at a member of `live`.
#[derive(Default)]
struct RegistryInner {
    live: HashMap<Uuid, ConnectionHandle>,
    by_identity: HashMap<String, Uuid>,
}

/// Thread-safe registry of live connections.
///
/// One mutex guards both maps, so no operation can observe a torn state
/// between the live set and the identity bindings.
#[derive(Default)]
pub struct ConnectionRegistry {
    inner: Mutex<RegistryInner>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection and bind its identity.
    ///
    /// An identity that is already online has its binding silently
    /// repointed; the older socket stays in the live set until it closes.
    /// Returns whether the identity was previously absent, taken inside
    /// the same critical section as the insert so presence decisions
    /// cannot race a near-simultaneous second connection.
    pub fn register(&self, handle: ConnectionHandle) -> bool {
        let mut inner = self.inner.lock();
        let first_binding = !inner.by_identity.contains_key(&handle.identity);
        inner
            .by_identity
            .insert(handle.identity.clone(), handle.id);
        inner.live.insert(handle.id, handle);
        first_binding
    }

    /// Remove a connection from the live set and release its identity
    /// binding, but only if the binding still points at this exact
    /// connection. A reconnect that already repointed the binding is
    /// left untouched. Returns whether the binding was released.
    pub fn unregister(&self, handle: &ConnectionHandle) -> bool {
        let mut inner = self.inner.lock();
        inner.live.remove(&handle.id);
        let owns_binding = inner.by_identity.get(&handle.identity) == Some(&handle.id);
        if owns_binding {
            inner.by_identity.remove(&handle.identity);
        }
        owns_binding
    }

    /// Current connection for an identity, if it is still live.
    pub fn lookup(&self, identity: &str) -> Option<ConnectionHandle> {
        let inner = self.inner.lock();
        inner
            .by_identity
            .get(identity)
            .and_then(|id| inner.live.get(id))
            .cloned()
    }

    /// Snapshot of currently bound identities, for presence fan-out.
    pub fn identities(&self) -> Vec<String> {
        self.inner.lock().by_identity.keys().cloned().collect()
    }

    /// Delivery-failure cleanup: drop the connection from the live set
    /// and clear its identity binding when it still owns it.
    pub fn prune(&self, handle: &ConnectionHandle) {
        self.unregister(handle);
    }

    /// Number of live connections (bound or replaced).
    pub fn connection_count(&self) -> usize {
        self.inner.lock().live.len()
    }
}

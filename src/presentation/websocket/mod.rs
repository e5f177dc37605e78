//! Chat Relay
//!
//! Real-time message fan-out over WebSocket connections.

pub mod frames;
pub mod registry;
pub mod relay;

pub use frames::{ClientAction, ClientFrame, ServerEvent};
pub use registry::{ConnectionHandle, ConnectionRegistry};
pub use relay::{ws_handler, Relay};

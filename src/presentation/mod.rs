//! Presentation Layer
//!
//! HTTP routes, middleware, and the WebSocket chat relay.

pub mod http;
pub mod middleware;
pub mod websocket;

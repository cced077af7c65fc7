//! Presentation Layer
//!
//! HTTP routes, middleware and the chat WebSocket stream.

pub mod http;
pub mod middleware;
pub mod websocket;

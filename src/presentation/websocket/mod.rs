//! WebSocket Streams
//!
//! Real-time chat room events pushed to browsers.

pub mod chat_stream;

pub use chat_stream::chat_stream;

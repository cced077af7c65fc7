//! HTTP Handlers
//!
//! Request handlers for all HTTP endpoints.

pub mod admin;
pub mod catalog;
pub mod chat;
pub mod content;
pub mod donations;
pub mod health;
pub mod instagram;
pub mod payments;
pub mod reports;
pub mod submissions;

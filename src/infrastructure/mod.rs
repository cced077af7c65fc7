//! Infrastructure Layer
//!
//! Contains implementations for external services including:
//! - Database repositories (PostgreSQL)
//! - Cache implementations (Redis)
//! - Payment gateways, the messaging bot, object storage and Instagram
//! - The in-process chat room hub
//! - Prometheus metrics

pub mod cache;
pub mod database;
pub mod instagram;
pub mod metrics;
pub mod notifications;
pub mod payments;
pub mod realtime;
pub mod repositories;
pub mod storage;

//! # Rehab Center Backend
//!
//! Backend of a rehabilitation center website:
//! - Visitor chat with a single active conversation and a waiting queue
//! - Donations through LiqPay, Monobank and WayForPay with signed callbacks
//! - Public forms, editable translations, media and homepage content
//! - Services price list, spending reports and an Instagram feed
//! - Cookie-authenticated admin panel API
//!
//! ## Architecture
//!
//! The crate follows Clean Architecture principles:
//!
//! - **Domain Layer**: Core business entities and repository traits
//! - **Application Layer**: Business logic services and DTOs
//! - **Infrastructure Layer**: Database, cache, gateways and other external implementations
//! - **Presentation Layer**: HTTP handlers, middleware and the chat WebSocket stream
//!
//! ## Module Structure
//!
//! ```text
//! rehab_center/
//! +-- config/         Configuration management
//! +-- domain/         Domain entities, value objects, and traits
//! +-- application/    Application services and DTOs
//! +-- infrastructure/ Database, cache, payments, storage, notifications
//! +-- presentation/   HTTP routes, middleware and WebSocket handlers
//! +-- shared/         Common utilities (errors, validation)
//! ```

// Configuration module
pub mod config;

// Domain layer - Core business logic
pub mod domain;

// Application layer - Business services
pub mod application;

// Infrastructure layer - External implementations
pub mod infrastructure;

// Presentation layer - HTTP and WebSocket handlers
pub mod presentation;

// Shared utilities
pub mod shared;

// Application startup and state management
pub mod startup;

// Telemetry and observability
pub mod telemetry;

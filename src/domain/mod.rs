//! # Domain Layer
//!
//! The domain layer contains the core business rules of the backend.
//! It is independent of any external frameworks or infrastructure concerns.
//!
//! ## Structure
//!
//! - **entities**: Core domain entities (ChatSession, Donation, FormSubmission, etc.)
//! - **value_objects**: Immutable value types (Language, Amount, etc.)
//! - **services**: Domain rules such as chat admission
//!
//! ## Design Principles
//!
//! - No dependencies on infrastructure or presentation layers
//! - Repository traits define data access contracts

pub mod entities;
pub mod services;
pub mod value_objects;

// Re-export commonly used types
pub use entities::*;
pub use services::*;
pub use value_objects::*;

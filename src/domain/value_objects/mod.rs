//! # Domain Value Objects
//!
//! Immutable value types that represent domain concepts without identity.
//!
//! ## Value Objects
//!
//! - **Language / LocalizedText**: the three site languages and per-language values
//! - **Amount / Currency**: donation amounts in minor units

mod language;
mod money;

pub use language::*;
pub use money::*;

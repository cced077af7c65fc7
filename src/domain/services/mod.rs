//! # Domain Services
//!
//! Pure business rules that don't belong to a single entity.
//!
//! ## Services
//!
//! - **Admission**: single-active-chat admission and FIFO queue ordering

mod chat_admission;

pub use chat_admission::*;

//! HTTP API
//!
//! Handlers, extractors and the router for every `/api` endpoint.

pub mod extractors;
pub mod handlers;
pub mod routes;

pub use extractors::ValidatedJson;
pub use routes::create_router;

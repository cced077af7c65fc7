//! Middleware
//!
//! Tower middleware for request processing.

pub mod auth;
pub mod cors;
pub mod logging;
pub mod rate_limit;
pub mod security;

pub use auth::{admin_auth_middleware, AuthAdmin};
pub use logging::track_metrics;
pub use rate_limit::{rate_limit_forms, rate_limit_login, RateLimitInfo, RateLimitScope, RateLimiter};
pub use security::{create_security_headers_layer, SecurityHeadersConfig, SecurityHeadersLayer};

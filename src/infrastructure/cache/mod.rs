//! Cache Module
//!
//! Optional Redis connection used for caching public content and for the
//! sliding-window rate limiter. The backend keeps working without it: cache
//! reads become misses and rate limits are not enforced.
//!
//! ```text
//! +-------------------+
//! |   Services        |
//! +-------------------+
//!          |
//!          v
//! +-------------------+
//! |   Cache Trait     |
//! +-------------------+
//!          |
//!          v
//! +-------------------+
//! |   RedisCache      |
//! +-------------------+
//!          |
//!          v
//! +-------------------+
//! | ConnectionManager |
//! +-------------------+
//! ```

mod cache_service;

pub use cache_service::{Cache, RedisCache};

#[cfg(test)]
pub(crate) use cache_service::MemoryCache;

use redis::aio::ConnectionManager;
use redis::Client;
use tracing::{info, instrument};

/// Key prefix applied to everything this service stores.
pub const KEY_PREFIX: &str = "rehab:";

/// Creates a Redis connection manager with automatic reconnection.
#[instrument(skip(url))]
pub async fn create_redis_client(url: &str) -> Result<ConnectionManager, redis::RedisError> {
    info!("Connecting to Redis...");
    let client = Client::open(url)?;
    let manager = ConnectionManager::new(client).await?;
    info!("Redis connection established");
    Ok(manager)
}

/// Creates a prefixed `RedisCache` from a connection URL.
pub async fn create_redis_cache(url: &str) -> Result<RedisCache, redis::RedisError> {
    let conn = create_redis_client(url).await?;
    Ok(RedisCache::with_prefix(conn, KEY_PREFIX))
}

/// Cache key builders.
pub mod keys {
    /// Prefix for translated text bundles (e.g., "texts:uk")
    pub const TEXTS: &str = "texts:";

    /// Prefix for the Instagram feed (e.g., "instagram:12")
    pub const INSTAGRAM: &str = "instagram:";

    /// Prefix for rate limiting windows (e.g., "rl:forms:ip:1.2.3.4")
    pub const RATE_LIMIT: &str = "rl:";

    /// Translations of every key in one language
    #[inline]
    pub fn texts(lang: impl std::fmt::Display) -> String {
        format!("{}{}", TEXTS, lang)
    }

    /// Instagram feed truncated to `limit` posts
    #[inline]
    pub fn instagram(limit: impl std::fmt::Display) -> String {
        format!("{}{}", INSTAGRAM, limit)
    }

    #[inline]
    pub fn rate_limit(scope: &str, identifier: &str) -> String {
        format!("{}{}:{}", RATE_LIMIT, scope, identifier)
    }
}

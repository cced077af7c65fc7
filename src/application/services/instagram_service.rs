//! Instagram Feed Service
//!
//! Read-only feed for the site footer. Responses are cached; a missing
//! token or a failing API yields an empty feed with a warning.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::warn;

use crate::infrastructure::cache::{keys, Cache};
use crate::infrastructure::instagram::{InstagramClient, InstagramError, InstagramPost};

pub const MAX_POSTS: u32 = 50;

/// Source of Instagram posts.
#[async_trait]
pub trait InstagramSource: Send + Sync {
    fn is_configured(&self) -> bool;

    async fn recent_media(&self, limit: u32) -> Result<Vec<InstagramPost>, InstagramError>;
}

#[async_trait]
impl InstagramSource for InstagramClient {
    fn is_configured(&self) -> bool {
        InstagramClient::is_configured(self)
    }

    async fn recent_media(&self, limit: u32) -> Result<Vec<InstagramPost>, InstagramError> {
        InstagramClient::recent_media(self, limit).await
    }
}

/// Instagram feed service trait
#[async_trait]
pub trait InstagramService: Send + Sync {
    async fn feed(&self, limit: u32) -> InstagramFeedDto;
}

#[derive(Debug, Clone, Serialize)]
pub struct InstagramFeedDto {
    pub posts: Vec<InstagramPost>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// InstagramService implementation
pub struct InstagramServiceImpl<S, C>
where
    S: InstagramSource,
    C: Cache,
{
    source: Arc<S>,
    cache: Option<Arc<C>>,
    cache_ttl_secs: u64,
}

impl<S, C> InstagramServiceImpl<S, C>
where
    S: InstagramSource,
    C: Cache,
{
    pub fn new(source: Arc<S>, cache: Option<Arc<C>>, cache_ttl_secs: u64) -> Self {
        Self {
            source,
            cache,
            cache_ttl_secs,
        }
    }
}

#[async_trait]
impl<S, C> InstagramService for InstagramServiceImpl<S, C>
where
    S: InstagramSource + 'static,
    C: Cache + 'static,
{
    async fn feed(&self, limit: u32) -> InstagramFeedDto {
        let limit = limit.clamp(1, MAX_POSTS);

        if !self.source.is_configured() {
            return InstagramFeedDto {
                posts: Vec::new(),
                warning: Some("Instagram feed is not configured".into()),
            };
        }

        let cache_key = keys::instagram(limit);
        if let Some(cache) = &self.cache {
            match cache.get::<Vec<InstagramPost>>(&cache_key).await {
                Ok(Some(posts)) => return InstagramFeedDto { posts, warning: None },
                Ok(None) => {}
                Err(e) => warn!(error = %e, "Instagram cache unavailable"),
            }
        }

        match self.source.recent_media(limit).await {
            Ok(posts) => {
                if let Some(cache) = &self.cache {
                    if let Err(e) = cache.set_ex(&cache_key, &posts, self.cache_ttl_secs).await {
                        warn!(error = %e, "Failed to cache Instagram feed");
                    }
                }
                InstagramFeedDto { posts, warning: None }
            }
            Err(e) => {
                warn!(error = %e, "Instagram feed request failed");
                InstagramFeedDto {
                    posts: Vec::new(),
                    warning: Some("Instagram feed is temporarily unavailable".into()),
                }
            }
        }
    }
}

//! Instagram Graph API client for the public feed.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::config::InstagramSettings;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

const MEDIA_FIELDS: &str = "id,caption,media_type,media_url,permalink,thumbnail_url,timestamp";

#[derive(Debug, thiserror::Error)]
pub enum InstagramError {
    #[error("no Instagram access token configured")]
    NotConfigured,

    #[error("Instagram request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Instagram answered HTTP {0}")]
    Status(u16),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InstagramPost {
    pub id: String,
    #[serde(default)]
    pub caption: Option<String>,
    /// IMAGE, VIDEO or CAROUSEL_ALBUM
    pub media_type: String,
    #[serde(default)]
    pub media_url: Option<String>,
    pub permalink: String,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MediaPage {
    #[serde(default)]
    data: Vec<InstagramPost>,
}

pub struct InstagramClient {
    http: reqwest::Client,
    api_url: String,
    access_token: Option<String>,
}

impl InstagramClient {
    pub fn from_settings(settings: &InstagramSettings, http: reqwest::Client) -> Self {
        Self {
            http,
            api_url: settings.api_url.trim_end_matches('/').to_string(),
            access_token: settings.access_token.clone().filter(|t| !t.is_empty()),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.access_token.is_some()
    }

    /// Most recent posts of the account the token belongs to.
    #[instrument(skip(self))]
    pub async fn recent_media(&self, limit: u32) -> Result<Vec<InstagramPost>, InstagramError> {
        let token = self
            .access_token
            .as_deref()
            .ok_or(InstagramError::NotConfigured)?;

        let response = self
            .http
            .get(format!("{}/me/media", self.api_url))
            .timeout(REQUEST_TIMEOUT)
            .query(&[
                ("fields", MEDIA_FIELDS),
                ("limit", &limit.to_string()),
                ("access_token", token),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(InstagramError::Status(response.status().as_u16()));
        }

        let page: MediaPage = response.json().await?;
        Ok(page.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_graph_api_page() {
        let page: MediaPage = serde_json::from_str(
            r#"{"data":[{"id":"1","media_type":"IMAGE","media_url":"https://x/1.jpg",
                "permalink":"https://instagram.com/p/1","timestamp":"2024-03-01T10:00:00+0000"}],
                "paging":{"cursors":{}}}"#,
        )
        .unwrap();

        assert_eq!(page.data.len(), 1);
        assert_eq!(page.data[0].caption, None);
        assert_eq!(page.data[0].media_type, "IMAGE");
    }

    #[test]
    fn blank_token_counts_as_unconfigured() {
        let client = InstagramClient::from_settings(
            &InstagramSettings {
                access_token: Some(String::new()),
                api_url: "https://graph.instagram.com".into(),
                cache_ttl_secs: 900,
            },
            reqwest::Client::new(),
        );
        assert!(!client.is_configured());
    }
}

//! Telegram Bot API sender.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use super::{NotificationSender, NotifyError};
use crate::config::NotificationSettings;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Posts messages to one chat through `sendMessage`.
pub struct TelegramSender {
    http: reqwest::Client,
    endpoint: String,
    chat_id: String,
}

impl TelegramSender {
    /// `None` unless both the bot token and the chat id are configured.
    pub fn from_settings(settings: &NotificationSettings, http: reqwest::Client) -> Option<Self> {
        let token = settings.telegram_bot_token.as_deref()?;
        let chat_id = settings.telegram_chat_id.clone()?;
        Some(Self {
            http,
            endpoint: format!(
                "{}/bot{}/sendMessage",
                settings.telegram_api_url.trim_end_matches('/'),
                token
            ),
            chat_id,
        })
    }
}

#[async_trait]
impl NotificationSender for TelegramSender {
    async fn send(&self, text: &str) -> Result<(), NotifyError> {
        let response = self
            .http
            .post(&self.endpoint)
            .timeout(REQUEST_TIMEOUT)
            .json(&json!({
                "chat_id": self.chat_id,
                "text": text,
                "disable_web_page_preview": true,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(NotifyError::Status(response.status().as_u16()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requires_token_and_chat() {
        let mut settings = NotificationSettings::default();
        assert!(TelegramSender::from_settings(&settings, reqwest::Client::new()).is_none());

        settings.telegram_bot_token = Some("123:abc".into());
        settings.telegram_chat_id = Some("-100200".into());
        let sender = TelegramSender::from_settings(&settings, reqwest::Client::new()).unwrap();
        assert_eq!(sender.endpoint, "https://api.telegram.org/bot123:abc/sendMessage");
    }
}

//! Messaging Bot Notifications
//!
//! Requests never talk to the bot directly. They hand a [`Notification`] to
//! the [`Notifier`], which pushes it onto a bounded queue drained by a
//! single background worker. A full queue drops the notification and logs
//! it; the request that produced it is never slowed down.

mod telegram;

pub use telegram::TelegramSender;

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::infrastructure::metrics;

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("bot request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("bot API answered HTTP {0}")]
    Status(u16),
}

/// Something the staff should hear about.
#[derive(Debug, Clone)]
pub enum Notification {
    ChatOpened {
        session_id: Uuid,
        visitor_name: String,
        visitor_phone: String,
        queue_position: Option<i32>,
        first_message: Option<String>,
    },
    ChatMessage {
        session_id: Uuid,
        visitor_name: String,
        content: String,
    },
    FormSubmitted {
        title: String,
        name: String,
        phone: Option<String>,
        email: Option<String>,
        message: Option<String>,
    },
    DonationSucceeded {
        order_id: String,
        gateway: String,
        amount: String,
        currency: String,
        donor_name: Option<String>,
    },
}

impl Notification {
    /// Metric label.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ChatOpened { .. } => "chat_opened",
            Self::ChatMessage { .. } => "chat_message",
            Self::FormSubmitted { .. } => "form_submitted",
            Self::DonationSucceeded { .. } => "donation_succeeded",
        }
    }

    /// Plain-text message body.
    pub fn render(&self) -> String {
        match self {
            Self::ChatOpened {
                session_id,
                visitor_name,
                visitor_phone,
                queue_position,
                first_message,
            } => {
                let mut text = format!(
                    "New chat from {visitor_name} ({visitor_phone})\nSession: {session_id}"
                );
                if let Some(position) = queue_position {
                    text.push_str(&format!("\nQueued at position {position}"));
                }
                if let Some(message) = first_message {
                    text.push_str(&format!("\n\n{message}"));
                }
                text
            }
            Self::ChatMessage {
                session_id,
                visitor_name,
                content,
            } => format!("{visitor_name} [{session_id}]:\n{content}"),
            Self::FormSubmitted {
                title,
                name,
                phone,
                email,
                message,
            } => {
                let mut text = format!("{title}\nName: {name}");
                if let Some(phone) = phone {
                    text.push_str(&format!("\nPhone: {phone}"));
                }
                if let Some(email) = email {
                    text.push_str(&format!("\nEmail: {email}"));
                }
                if let Some(message) = message {
                    text.push_str(&format!("\n\n{message}"));
                }
                text
            }
            Self::DonationSucceeded {
                order_id,
                gateway,
                amount,
                currency,
                donor_name,
            } => format!(
                "Donation received: {amount} {currency} via {gateway}\nOrder: {order_id}\nFrom: {}",
                donor_name.as_deref().unwrap_or("anonymous")
            ),
        }
    }
}

/// Delivers rendered notifications somewhere.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send(&self, text: &str) -> Result<(), NotifyError>;
}

/// Handle used by services to enqueue notifications.
#[derive(Clone, Default)]
pub struct Notifier {
    tx: Option<mpsc::Sender<Notification>>,
}

impl Notifier {
    /// A notifier that discards everything, used when no bot is configured.
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    /// Start the delivery worker.
    pub fn spawn(sender: Arc<dyn NotificationSender>, capacity: usize) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let handle = tokio::spawn(run_worker(sender, rx));
        (Self { tx: Some(tx) }, handle)
    }

    pub fn is_enabled(&self) -> bool {
        self.tx.is_some()
    }

    /// Enqueue without waiting. Returns false when the notification was
    /// dropped.
    pub fn notify(&self, notification: Notification) -> bool {
        let Some(tx) = &self.tx else {
            debug!(kind = notification.kind(), "Notifications disabled, skipping");
            return false;
        };

        let kind = notification.kind();
        match tx.try_send(notification) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(kind, "Notification queue full, dropping notification");
                metrics::record_notification(kind, "dropped");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                error!(kind, "Notification worker stopped, dropping notification");
                metrics::record_notification(kind, "dropped");
                false
            }
        }
    }
}

async fn run_worker(sender: Arc<dyn NotificationSender>, mut rx: mpsc::Receiver<Notification>) {
    while let Some(notification) = rx.recv().await {
        let kind = notification.kind();
        match sender.send(&notification.render()).await {
            Ok(()) => {
                debug!(kind, "Notification delivered");
                metrics::record_notification(kind, "sent");
            }
            Err(e) => {
                warn!(kind, error = %e, "Notification delivery failed");
                metrics::record_notification(kind, "failed");
            }
        }
    }
    debug!("Notification worker finished");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingSender {
        sent: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl NotificationSender for RecordingSender {
        async fn send(&self, text: &str) -> Result<(), NotifyError> {
            self.sent.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    fn form(name: &str) -> Notification {
        Notification::FormSubmitted {
            title: "Contact request".into(),
            name: name.into(),
            phone: Some("+380501234567".into()),
            email: None,
            message: Some("Call me back".into()),
        }
    }

    #[test]
    fn renders_form_fields_that_are_present() {
        let text = form("Olena").render();
        assert!(text.starts_with("Contact request\nName: Olena"));
        assert!(text.contains("Phone: +380501234567"));
        assert!(!text.contains("Email"));
        assert!(text.ends_with("Call me back"));
    }

    #[test]
    fn renders_queue_position_for_queued_chats() {
        let text = Notification::ChatOpened {
            session_id: Uuid::nil(),
            visitor_name: "Ivan".into(),
            visitor_phone: "+48123456789".into(),
            queue_position: Some(3),
            first_message: None,
        }
        .render();
        assert!(text.contains("Queued at position 3"));
    }

    #[test]
    fn disabled_notifier_drops_everything() {
        let notifier = Notifier::disabled();
        assert!(!notifier.is_enabled());
        assert!(!notifier.notify(form("Olena")));
    }

    #[tokio::test]
    async fn worker_delivers_in_order() {
        let sender = Arc::new(RecordingSender::default());
        let (notifier, _handle) = Notifier::spawn(sender.clone(), 8);

        assert!(notifier.notify(form("first")));
        assert!(notifier.notify(form("second")));

        for _ in 0..50 {
            if sender.sent.lock().unwrap().len() == 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        let sent = sender.sent.lock().unwrap();
        assert_eq!(sent.len(), 2);
        assert!(sent[0].contains("Name: first"));
        assert!(sent[1].contains("Name: second"));
    }
}

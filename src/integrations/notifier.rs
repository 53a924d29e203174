// ABOUTME: Notification dispatch interface used by notify tasks
// ABOUTME: The default notifier only logs the notification it was asked to send

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Delivery channel, e.g. "email" or "sms".
    pub channel: String,
    pub recipient: String,
    pub template: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationAck {
    pub sent: bool,
    pub timestamp: DateTime<Utc>,
}

impl NotificationAck {
    pub fn sent_now() -> Self {
        Self {
            sent: true,
            timestamp: Utc::now(),
        }
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: Notification) -> anyhow::Result<NotificationAck>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, notification: Notification) -> anyhow::Result<NotificationAck> {
        info!(
            channel = %notification.channel,
            recipient = %notification.recipient,
            template = %notification.template,
            "Would send notification"
        );
        Ok(NotificationAck::sent_now())
    }
}

//! Alert formatting and delivery.
//!
//! The message template is fixed; delivery goes to Telegram via the Bot API.
//! Sends are fire-and-forget: a failure is logged and the alert dropped,
//! never retried and never surfaced to block processing.

use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Bound on a send so a stalled Telegram API cannot wedge the pipeline.
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// A qualifying join, ready to be formatted and sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub address: String,
    pub handle: String,
    pub age_days: i64,
    pub followers: u64,
}

impl Alert {
    /// Render the fixed alert template. Field order is part of the format.
    pub fn message(&self) -> String {
        format!(
            "⚠️NEW JOIN ALERT⚠️\n\n\
             Address: {address}\n\
             Twitter Username: @{handle}\n\
             Account Age: {age} Days\n\
             Follower Count: {followers}\n\
             Base Address Link: https://basescan.org/address/{address}",
            address = self.address,
            handle = self.handle,
            age = self.age_days,
            followers = self.followers,
        )
    }
}

/// Notification channel seam; tests substitute a recording fake.
#[async_trait]
pub trait AlertChannel: Send + Sync {
    async fn send(&self, text: &str) -> anyhow::Result<()>;
}

/// Telegram Bot API channel (`sendMessage` to a fixed chat).
pub struct TelegramChannel {
    http: Client,
    bot_token: String,
    chat_id: String,
}

impl TelegramChannel {
    pub fn new(bot_token: String, chat_id: String) -> Self {
        Self {
            http: Client::builder()
                .timeout(HTTP_TIMEOUT)
                .build()
                .expect("failed to build HTTP client"),
            bot_token,
            chat_id,
        }
    }
}

#[async_trait]
impl AlertChannel for TelegramChannel {
    async fn send(&self, text: &str) -> anyhow::Result<()> {
        let url = format!("https://api.telegram.org/bot{}/sendMessage", self.bot_token);
        let resp = self
            .http
            .post(&url)
            .json(&serde_json::json!({
                "chat_id": self.chat_id,
                "text": text,
            }))
            .send()
            .await?;

        if !resp.status().is_success() {
            anyhow::bail!("Telegram API returned status {}", resp.status());
        }
        Ok(())
    }
}

/// Formats alerts and hands them to the channel, containing send failures.
pub struct AlertDispatcher {
    channel: Arc<dyn AlertChannel>,
    dry_run: bool,
}

impl AlertDispatcher {
    pub fn new(channel: Arc<dyn AlertChannel>, dry_run: bool) -> Self {
        Self { channel, dry_run }
    }

    pub async fn dispatch(&self, alert: &Alert) {
        let text = alert.message();

        if self.dry_run {
            info!(address = %alert.address, handle = %alert.handle, "dry-run alert:\n{text}");
            return;
        }

        match self.channel.send(&text).await {
            Ok(()) => info!(
                address = %alert.address,
                handle = %alert.handle,
                followers = alert.followers,
                "alert sent"
            ),
            Err(e) => warn!(address = %alert.address, error = %e, "alert send failed"),
        }
    }
}

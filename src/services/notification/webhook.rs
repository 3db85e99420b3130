use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;

use super::NotificationSink;
use crate::models::LeadNotification;

/// Posts lead notifications as JSON to a workflow webhook (n8n).
pub struct WebhookNotifier {
    client: reqwest::Client,
}

impl WebhookNotifier {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self { client }
    }
}

impl Default for WebhookNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NotificationSink for WebhookNotifier {
    async fn deliver(&self, url: &str, notification: &LeadNotification) -> anyhow::Result<()> {
        self.client
            .post(url)
            .json(notification)
            .send()
            .await
            .context("failed to call notification webhook")?
            .error_for_status()
            .context("notification webhook returned error")?;

        Ok(())
    }
}

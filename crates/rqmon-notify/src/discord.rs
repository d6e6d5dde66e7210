use crate::error::{NotifyError, Result};
use crate::NotificationChannel;
use async_trait::async_trait;
use rqmon_common::types::{AlertMessage, Severity};
use serde_json::{json, Value};
use std::time::Duration;

const COLOR_CRITICAL: u32 = 0xFF0000;
const COLOR_WARNING: u32 = 0xFFA500;
const COLOR_INFO: u32 = 0x00FF00;

// A hung webhook must not stall the collection loop.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Sends alerts to a Discord webhook as rich embeds.
pub struct DiscordChannel {
    client: reqwest::Client,
    webhook_url: String,
}

impl DiscordChannel {
    pub fn new(webhook_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            webhook_url: webhook_url.to_string(),
        })
    }
}

fn embed_color(alert: &AlertMessage) -> u32 {
    if alert.resolved {
        return COLOR_INFO;
    }
    match alert.severity {
        Severity::Critical => COLOR_CRITICAL,
        Severity::Warning => COLOR_WARNING,
        Severity::Info => COLOR_INFO,
    }
}

fn embed_title(alert: &AlertMessage) -> String {
    if alert.resolved {
        return format!("{} - RESOLVED", alert.title);
    }
    match alert.severity {
        Severity::Critical => format!("CRITICAL: {}", alert.title),
        Severity::Warning => format!("WARNING: {}", alert.title),
        Severity::Info => alert.title.clone(),
    }
}

/// Build the webhook payload for one alert.
pub fn build_payload(alert: &AlertMessage) -> Value {
    let mut fields = Vec::new();
    if let Some(queue) = &alert.queue {
        fields.push(json!({ "name": "Queue", "value": queue, "inline": true }));
    }
    if let Some(category) = alert.category {
        fields.push(json!({ "name": "Category", "value": category.to_string(), "inline": true }));
    }
    fields.push(json!({
        "name": "Severity",
        "value": alert.severity.to_string(),
        "inline": true
    }));
    if let Some(value) = &alert.value {
        fields.push(json!({ "name": "Value", "value": value, "inline": true }));
    }
    if let Some(threshold) = &alert.threshold {
        fields.push(json!({ "name": "Threshold", "value": threshold, "inline": true }));
    }

    json!({
        "embeds": [{
            "title": embed_title(alert),
            "description": alert.description,
            "color": embed_color(alert),
            "fields": fields,
            "footer": { "text": "rqmon queue monitor" },
        }]
    })
}

#[async_trait]
impl NotificationChannel for DiscordChannel {
    async fn send(&self, alert: &AlertMessage) -> Result<()> {
        let payload = build_payload(alert);
        let response = self
            .client
            .post(&self.webhook_url)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        // Discord webhooks answer 204 No Content on success.
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Api {
                service: "discord".to_string(),
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(kind = %alert.kind, "Discord notification delivered");
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "discord"
    }
}

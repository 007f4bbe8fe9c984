//! Outbound alert delivery: each sink receives one formatted message per alert.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use brandpulse_core::Alert;
use brandpulse_sentiment::{truncate_body, SentimentError};
use serde_json::json;

use crate::error::MonitorError;

#[async_trait]
pub trait AlertSink: Send + Sync {
    fn name(&self) -> &'static str;

    /// Deliver one formatted alert message.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Delivery`] if the message could not be sent.
    async fn deliver(&self, message: &str) -> Result<(), MonitorError>;
}

/// Text sent to sinks for an alert.
#[must_use]
pub fn format_alert(brand_name: &str, alert: &Alert) -> String {
    format!(
        "[{}] {brand_name}: {}",
        alert.severity.as_str().to_uppercase(),
        alert.message
    )
}

/// Writes alerts to the tracing log.
#[derive(Debug, Default)]
pub struct LogSink;

#[async_trait]
impl AlertSink for LogSink {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn deliver(&self, message: &str) -> Result<(), MonitorError> {
        tracing::warn!(target: "brandpulse::alerts", "{message}");
        Ok(())
    }
}

/// Posts `{"text": message}` to a Slack-compatible incoming webhook.
pub struct WebhookSink {
    webhook_url: String,
    http: reqwest::Client,
}

impl WebhookSink {
    /// Each delivery attempt is abandoned after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Setup`] if the HTTP client cannot be built.
    pub fn new(webhook_url: &str, timeout: Duration) -> Result<Self, MonitorError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MonitorError::Setup {
                component: "alert webhook",
                source: SentimentError::Http(e),
            })?;
        Ok(Self {
            webhook_url: webhook_url.to_string(),
            http,
        })
    }
}

#[async_trait]
impl AlertSink for WebhookSink {
    fn name(&self) -> &'static str {
        "webhook"
    }

    async fn deliver(&self, message: &str) -> Result<(), MonitorError> {
        let resp = self
            .http
            .post(&self.webhook_url)
            .json(&json!({ "text": message }))
            .send()
            .await
            .map_err(|e| MonitorError::Delivery {
                sink: self.name(),
                reason: e.to_string(),
            })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(MonitorError::Delivery {
                sink: self.name(),
                reason: format!("status {status}: {}", truncate_body(&body)),
            });
        }
        Ok(())
    }
}

/// Send `message` to every sink on spawned tasks. Failures are logged.
pub(crate) fn dispatch(sinks: &[Arc<dyn AlertSink>], message: &str) {
    for sink in sinks {
        let sink = Arc::clone(sink);
        let message = message.to_string();
        tokio::spawn(async move {
            if let Err(e) = sink.deliver(&message).await {
                tracing::warn!(sink = sink.name(), error = %e, "alert delivery failed");
            }
        });
    }
}

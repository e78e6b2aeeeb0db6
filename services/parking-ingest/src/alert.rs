//! Webhook delivery for capacity alerts
//!
//! Alerts are posted as Discord-compatible webhook bodies on a detached task
//! with a bounded timeout. Failures are logged and dropped; nothing retries.

use chrono::SecondsFormat;
use parkwatch_core::AlertConfig;
use parkwatch_domain::{AlertSink, CapacityAlert};
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;
use tokio::runtime::Handle;
use tracing::{error, info};

/// Embed color for the alert (red).
pub const ALERT_COLOR: u32 = 15548997;

/// Field name carrying the reserved-zone count.
pub const RESERVED_FIELD_NAME: &str = "Handicap Spaces";

/// Alert delivery failures
#[derive(Debug, Error)]
pub enum AlertError {
    #[error("Alert delivery timed out after {0:?}")]
    Timeout(Duration),

    #[error("Alert delivery failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Webhook request body for `alert`
pub fn webhook_body(alert: &CapacityAlert, username: &str, avatar_url: Option<&str>) -> Value {
    let mut body = json!({
        "username": username,
        "embeds": [{
            "title": alert.title,
            "description": alert.description,
            "color": ALERT_COLOR,
            "fields": [{
                "name": RESERVED_FIELD_NAME,
                "value": alert.reserved_free.to_string(),
                "inline": true
            }],
            "timestamp": alert.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
        }]
    });
    if let Some(url) = avatar_url {
        body["avatar_url"] = Value::from(url);
    }
    body
}

/// Posts alerts to a webhook without blocking the caller
#[derive(Debug, Clone)]
pub struct WebhookAlertSink {
    client: reqwest::Client,
    url: String,
    username: String,
    avatar_url: Option<String>,
    timeout: Duration,
    runtime: Handle,
}

impl WebhookAlertSink {
    /// Create a sink posting to `url` with the identity and timeout from
    /// `config`; must be called from within a Tokio runtime
    pub fn new(url: impl Into<String>, config: &AlertConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            username: config.username.clone(),
            avatar_url: config.avatar_url.clone(),
            timeout: Duration::from_millis(config.timeout_ms),
            runtime: Handle::current(),
        }
    }

    /// Deliver one alert, waiting for the response
    pub async fn deliver(&self, alert: &CapacityAlert) -> Result<(), AlertError> {
        let request = self
            .client
            .post(&self.url)
            .json(&webhook_body(
                alert,
                &self.username,
                self.avatar_url.as_deref(),
            ))
            .send();

        let response = tokio::time::timeout(self.timeout, request)
            .await
            .map_err(|_| AlertError::Timeout(self.timeout))??;
        response.error_for_status()?;
        Ok(())
    }
}

impl AlertSink for WebhookAlertSink {
    fn dispatch(&self, alert: CapacityAlert) {
        let sink = self.clone();
        self.runtime.spawn(async move {
            match sink.deliver(&alert).await {
                Ok(()) => info!(reserved_free = alert.reserved_free, "Capacity alert delivered"),
                Err(e) => error!(error = %e, "Capacity alert delivery failed"),
            }
        });
    }
}

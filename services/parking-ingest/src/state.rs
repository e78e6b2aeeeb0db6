use parkwatch_core::IngestConfig;
use parkwatch_domain::{AlertSink, LogAlertSink, OccupancyState, OverrideGateway};
use std::sync::Arc;
use tracing::{info, warn};

use crate::alert::WebhookAlertSink;

pub struct AppState {
    pub occupancy: Arc<OccupancyState>,
}

impl AppState {
    /// Build the shared state; must run inside the Tokio runtime.
    pub fn new(config: &IngestConfig) -> anyhow::Result<Self> {
        let sink: Arc<dyn AlertSink> = match config.alert.webhook_url.as_deref() {
            Some(url) => {
                info!("Capacity alerts will be posted to the configured webhook");
                Arc::new(WebhookAlertSink::new(url, &config.alert))
            }
            None => {
                warn!("ALERT_WEBHOOK_URL not set, capacity alerts will only be logged");
                Arc::new(LogAlertSink)
            }
        };

        Self::with_sink(config, sink)
    }

    /// Build the shared state around an explicit alert sink.
    pub fn with_sink(config: &IngestConfig, sink: Arc<dyn AlertSink>) -> anyhow::Result<Self> {
        let registry = config.registry()?;
        let gateway = OverrideGateway::new(config.admin.password.clone());
        if gateway.is_open() {
            warn!("ADMIN_PASSWORD is empty, manual override accepts an empty password");
        }

        let occupancy = Arc::new(OccupancyState::new(registry, gateway, sink));
        Ok(AppState { occupancy })
    }
}

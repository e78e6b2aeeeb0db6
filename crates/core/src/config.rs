//! Configuration management for ParkWatch.
//!
//! Every field has a default matching the field deployment, so an empty TOML
//! document yields a runnable configuration. Secrets (the admin password and
//! webhook URL) are normally injected from the environment by the service.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use thiserror::Error;

use crate::types::{SourceDescriptor, SourceRegistry, ZoneRole};

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[cfg(feature = "toml")]
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Top-level configuration for the ingest service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub mqtt: MqttConfig,
    #[serde(default = "default_sources")]
    pub sources: Vec<SourceDescriptor>,
    #[serde(default)]
    pub admin: AdminConfig,
    #[serde(default)]
    pub alert: AlertConfig,
    #[serde(default)]
    pub liveness: LivenessConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_http_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MqttConfig {
    #[serde(default = "default_broker_host")]
    pub host: String,
    #[serde(default = "default_broker_port")]
    pub port: u16,
    #[serde(default = "default_status_topic")]
    pub status_topic: String,
    #[serde(default = "default_time_topic")]
    pub time_topic: String,
    #[serde(default = "default_client_id_prefix")]
    pub client_id_prefix: String,
    #[serde(default = "default_keep_alive")]
    pub keep_alive_secs: u64,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default)]
    pub retry: RetryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_initial_delay")]
    pub initial_delay_ms: u64,
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct AdminConfig {
    /// Override password, compared after trimming
    #[serde(default)]
    pub password: String,
}

impl fmt::Debug for AdminConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminConfig")
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertConfig {
    /// Webhook endpoint; alerts are only logged when unset
    #[serde(default)]
    pub webhook_url: Option<String>,
    #[serde(default = "default_alert_username")]
    pub username: String,
    /// Avatar shown next to the webhook username
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default = "default_alert_timeout")]
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LivenessConfig {
    /// Mark the snapshot disconnected after this long without an accepted message
    #[serde(default)]
    pub stale_after_secs: Option<u64>,
}

fn default_http_port() -> u16 {
    5000
}

fn default_broker_host() -> String {
    "localhost".to_string()
}

fn default_broker_port() -> u16 {
    1883
}

fn default_status_topic() -> String {
    "cesi/pau/parking/zoneA/status".to_string()
}

fn default_time_topic() -> String {
    "cesi/pau/parking/zoneA/time".to_string()
}

fn default_client_id_prefix() -> String {
    "parkwatch-ingest-".to_string()
}

fn default_keep_alive() -> u64 {
    60
}

fn default_connect_timeout() -> u64 {
    5
}

fn default_initial_delay() -> u64 {
    1000
}

fn default_max_delay() -> u64 {
    30000
}

fn default_alert_username() -> String {
    "Parking Monitor".to_string()
}

fn default_alert_timeout() -> u64 {
    3000
}

/// Sources flashed into the zone A sensor firmware.
pub fn default_sources() -> Vec<SourceDescriptor> {
    vec![
        SourceDescriptor::new("A1", "CLE_A1_SECURE", ZoneRole::Primary),
        SourceDescriptor::new("PMR1", "CLE_PMR_SECURE", ZoneRole::Reserved),
    ]
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            port: default_http_port(),
        }
    }
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            host: default_broker_host(),
            port: default_broker_port(),
            status_topic: default_status_topic(),
            time_topic: default_time_topic(),
            client_id_prefix: default_client_id_prefix(),
            keep_alive_secs: default_keep_alive(),
            connect_timeout_secs: default_connect_timeout(),
            retry: RetryConfig::default(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: default_initial_delay(),
            max_delay_ms: default_max_delay(),
        }
    }
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            username: default_alert_username(),
            avatar_url: None,
            timeout_ms: default_alert_timeout(),
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            http: HttpConfig::default(),
            mqtt: MqttConfig::default(),
            sources: default_sources(),
            admin: AdminConfig::default(),
            alert: AlertConfig::default(),
            liveness: LivenessConfig::default(),
        }
    }
}

impl IngestConfig {
    /// Load and validate configuration from a TOML file
    #[cfg(feature = "toml")]
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from a TOML document
    #[cfg(feature = "toml")]
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.mqtt.status_topic.is_empty() {
            return Err(ConfigError::ValidationError(
                "mqtt.status_topic must not be empty".to_string(),
            ));
        }
        if self.mqtt.retry.initial_delay_ms == 0
            || self.mqtt.retry.initial_delay_ms > self.mqtt.retry.max_delay_ms
        {
            return Err(ConfigError::ValidationError(
                "mqtt.retry.initial_delay_ms must be in 1..=max_delay_ms".to_string(),
            ));
        }
        if self.liveness.stale_after_secs == Some(0) {
            return Err(ConfigError::ValidationError(
                "liveness.stale_after_secs must be positive".to_string(),
            ));
        }
        self.registry()
            .map(|_| ())
            .map_err(|e| ConfigError::ValidationError(e.to_string()))
    }

    /// Build the source registry described by `sources`
    pub fn registry(&self) -> crate::Result<SourceRegistry> {
        SourceRegistry::new(self.sources.clone())
    }
}

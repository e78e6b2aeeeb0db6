use parkwatch_core::{ConfigError, IngestConfig};
use std::env;

/// Names the TOML configuration file; defaults apply when unset.
pub const CONFIG_PATH_ENV: &str = "PARKWATCH_CONFIG";

/// Load configuration from `PARKWATCH_CONFIG` (if set) plus environment overrides.
pub fn from_env() -> Result<IngestConfig, ConfigError> {
    let mut config = match env::var(CONFIG_PATH_ENV) {
        Ok(path) => IngestConfig::from_file(path)?,
        Err(_) => IngestConfig::default(),
    };
    apply_overrides(&mut config, |key| env::var(key).ok())?;
    config.validate()?;
    Ok(config)
}

/// Apply secret and deployment overrides read through `lookup`.
pub fn apply_overrides<F>(config: &mut IngestConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(password) = lookup("ADMIN_PASSWORD") {
        config.admin.password = password;
    }
    if let Some(url) = lookup("ALERT_WEBHOOK_URL") {
        config.alert.webhook_url = Some(url).filter(|u| !u.trim().is_empty());
    }
    if let Some(host) = lookup("MQTT_BROKER_HOST") {
        config.mqtt.host = host;
    }
    if let Some(port) = lookup("MQTT_BROKER_PORT") {
        config.mqtt.port = parse_port("MQTT_BROKER_PORT", &port)?;
    }
    if let Some(port) = lookup("PORT") {
        config.http.port = parse_port("PORT", &port)?;
    }
    Ok(())
}

fn parse_port(name: &str, value: &str) -> Result<u16, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::ValidationError(format!("{} is not a valid port: {:?}", name, value)))
}

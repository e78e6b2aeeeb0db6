//! Core functionality for the ParkWatch occupancy ingest system.
//!
//! This crate provides the source registry, configuration schema and logging
//! setup shared by the pipeline crates and the ingest service.

pub mod config;
pub mod error;
pub mod logging;
pub mod types;

pub use config::{
    AdminConfig, AlertConfig, ConfigError, HttpConfig, IngestConfig, LivenessConfig, MqttConfig,
    RetryConfig,
};
pub use error::{CoreError, Result};
pub use types::{SourceDescriptor, SourceRegistry, ZoneRole, GENESIS_SIGNATURE};

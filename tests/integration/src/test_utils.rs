//! Test utilities for end-to-end pipeline tests

use parking_ingest::AppState;
use parkwatch_core::{IngestConfig, GENESIS_SIGNATURE};
use parkwatch_crypto::compute_signature;
use parkwatch_domain::{AlertSink, CapacityAlert, OccupancyState};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

/// Admin password used by [`test_app_state`]
pub const TEST_ADMIN_PASSWORD: &str = "gate-keeper";

/// Install a test subscriber once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("debug")
        .try_init();
}

/// Simulated sensor node producing chained, signed status messages
pub struct SensorNode {
    pub source: String,
    pub key: Vec<u8>,
    pub sequence: u64,
    pub last_signature: String,
}

impl SensorNode {
    /// Node starting from genesis
    pub fn new(source: &str, key: &str) -> Self {
        Self {
            source: source.to_string(),
            key: key.as_bytes().to_vec(),
            sequence: 0,
            last_signature: GENESIS_SIGNATURE.to_string(),
        }
    }

    /// Primary-zone node from the default registry
    pub fn primary() -> Self {
        Self::new("A1", "CLE_A1_SECURE")
    }

    /// Reserved-zone node from the default registry
    pub fn reserved() -> Self {
        Self::new("PMR1", "CLE_PMR_SECURE")
    }

    /// Next chained envelope as JSON
    pub fn next_envelope(&mut self, free_count: i64) -> Value {
        self.sequence += 1;
        let payload = format!(
            "{}|{}|{}|{}",
            self.sequence, self.source, free_count, self.last_signature
        );
        let signature = compute_signature(&self.key, &payload).unwrap();
        let data = format!("{}:{}", payload, signature);
        self.last_signature = signature;
        json!({ "source": self.source, "data": data })
    }

    /// Next chained message as raw MQTT bytes
    pub fn next(&mut self, free_count: i64) -> Vec<u8> {
        serde_json::to_vec(&self.next_envelope(free_count)).unwrap()
    }

    /// Next message with a primary-zone fallback attached
    pub fn next_with_fallback(&mut self, free_count: i64, fallback: Value) -> Vec<u8> {
        let mut envelope = self.next_envelope(free_count);
        envelope["libres_A1"] = fallback;
        serde_json::to_vec(&envelope).unwrap()
    }

    /// Drop the next message as if lost in transit
    pub fn lose(&mut self, free_count: i64) {
        let _ = self.next_envelope(free_count);
    }
}

/// Alert sink recording every dispatched alert
#[derive(Default)]
pub struct RecordingSink {
    alerts: Mutex<Vec<CapacityAlert>>,
}

impl RecordingSink {
    /// Alerts dispatched so far
    pub fn alerts(&self) -> Vec<CapacityAlert> {
        self.alerts.lock().unwrap().clone()
    }
}

impl AlertSink for RecordingSink {
    fn dispatch(&self, alert: CapacityAlert) {
        self.alerts.lock().unwrap().push(alert);
    }
}

/// Service state over the default registry with a recording sink
pub fn test_app_state() -> (Arc<AppState>, Arc<RecordingSink>) {
    let mut config = IngestConfig::default();
    config.admin.password = TEST_ADMIN_PASSWORD.to_string();
    let sink = Arc::new(RecordingSink::default());
    let state = AppState::with_sink(&config, sink.clone()).unwrap();
    (Arc::new(state), sink)
}

/// Occupancy state over the default registry with a recording sink
pub fn test_occupancy() -> (Arc<OccupancyState>, Arc<RecordingSink>) {
    let (state, sink) = test_app_state();
    (state.occupancy.clone(), sink)
}

//! Shared occupancy state
//!
//! Chain heads, zone counts, the notifier flag and ingest counters form one
//! unit guarded by a single mutex, so every accepted message or override is
//! applied atomically and in arrival order. The committed snapshot is
//! published through the [`SnapshotStore`], which readers consult without
//! touching the mutex.

use parkwatch_core::SourceRegistry;
use parkwatch_stream::{
    log_rejection, Authenticator, ChainStatus, ChainValidator, Envelope, IngestError,
    IngestMetrics, IngestResult, SourceContinuity,
};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::aggregator::{ZoneAggregator, ZoneTotals};
use crate::manual_override::{OverrideError, OverrideGateway, OverrideRequest};
use crate::notifier::{AlertSink, CapacityNotifier};
use crate::snapshot::{Count, Snapshot, SnapshotStore};

/// Result of ingesting one accepted message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestOutcome {
    /// Source the message came from
    pub source: String,
    /// Sensor sequence number
    pub sequence: u64,
    /// Advisory continuity result
    pub chain: ChainStatus,
    /// Zone totals after aggregation
    pub totals: ZoneTotals,
    /// Whether this message raised a capacity alert
    pub alert_raised: bool,
}

#[derive(Debug)]
struct Ledger {
    chain: ChainValidator,
    zones: ZoneAggregator,
    notifier: CapacityNotifier,
    metrics: IngestMetrics,
    last_activity: Option<Instant>,
}

/// The pipeline's single mutable state object
pub struct OccupancyState {
    authenticator: Authenticator,
    gateway: OverrideGateway,
    ledger: Mutex<Ledger>,
    snapshot: SnapshotStore,
    sink: Arc<dyn AlertSink>,
}

impl OccupancyState {
    /// Fresh state: counts at zero, chains at genesis, snapshot unknown
    pub fn new(
        registry: SourceRegistry,
        gateway: OverrideGateway,
        sink: Arc<dyn AlertSink>,
    ) -> Self {
        let ledger = Ledger {
            chain: ChainValidator::new(&registry),
            zones: ZoneAggregator::new(),
            notifier: CapacityNotifier::new(),
            metrics: IngestMetrics::default(),
            last_activity: None,
        };

        Self {
            authenticator: Authenticator::new(registry),
            gateway,
            ledger: Mutex::new(ledger),
            snapshot: SnapshotStore::new(),
            sink,
        }
    }

    fn ledger(&self) -> MutexGuard<'_, Ledger> {
        // Ledger updates cannot panic midway, so a poisoned guard is still consistent.
        self.ledger.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Authenticate, chain-check and aggregate a raw MQTT payload.
    ///
    /// Rejections are logged and counted; they never change state.
    pub fn ingest_bytes(&self, bytes: &[u8]) -> IngestResult<IngestOutcome> {
        match Envelope::from_slice(bytes) {
            Ok(envelope) => self.ingest(&envelope),
            Err(err) => self.reject(err),
        }
    }

    /// Authenticate, chain-check and aggregate a decoded envelope.
    pub fn ingest(&self, envelope: &Envelope) -> IngestResult<IngestOutcome> {
        let message = match self.authenticator.authenticate(envelope) {
            Ok(message) => message,
            Err(err) => return self.reject(err),
        };

        let (outcome, alert) = {
            let mut ledger = self.ledger();
            let chain = ledger.chain.check_and_advance(&message);
            let totals = ledger.zones.apply(&message);
            self.snapshot.publish(totals.snapshot());
            let alert = ledger.notifier.observe(totals.total, totals.reserved);
            ledger.metrics.record_accepted(chain.is_broken());
            ledger.last_activity = Some(Instant::now());

            let outcome = IngestOutcome {
                source: message.source.clone(),
                sequence: message.record.sequence,
                chain,
                totals,
                alert_raised: alert.is_some(),
            };
            (outcome, alert)
        };

        if let Some(alert) = alert {
            self.sink.dispatch(alert);
        }

        Ok(outcome)
    }

    fn reject(&self, err: IngestError) -> IngestResult<IngestOutcome> {
        log_rejection(&err);
        self.ledger().metrics.record_rejection(&err);
        Err(err)
    }

    /// Force the served total after checking the admin password.
    ///
    /// The reserved-zone count is left as it is.
    pub fn apply_override(&self, request: &OverrideRequest) -> Result<i64, OverrideError> {
        let count = match self.gateway.check(request) {
            Ok(count) => count,
            Err(err) => {
                warn!(error = %err, "Manual override refused");
                return Err(err);
            }
        };

        if count < 0 {
            warn!(count, "Manual override sets a negative free count");
        }

        let mut ledger = self.ledger();
        let mut snapshot = self.snapshot.read();
        snapshot.total_free = Count::Known(count);
        snapshot.connected = true;
        self.snapshot.publish(snapshot);
        ledger.last_activity = Some(Instant::now());

        info!(count, "[ADMIN] Manual override: count set");
        Ok(count)
    }

    /// Mark the snapshot disconnected if nothing was accepted for `max_age`.
    ///
    /// Returns true when this call flipped `connected` to false.
    pub fn expire_if_stale(&self, now: Instant, max_age: Duration) -> bool {
        let ledger = self.ledger();
        let mut snapshot = self.snapshot.read();
        if !snapshot.connected {
            return false;
        }

        let stale = match ledger.last_activity {
            Some(at) => now.saturating_duration_since(at) >= max_age,
            None => false,
        };
        if stale {
            snapshot.connected = false;
            self.snapshot.publish(snapshot);
            warn!(
                max_age_secs = max_age.as_secs(),
                "No accepted message within liveness window, marking disconnected"
            );
        }
        stale
    }

    /// Current snapshot
    pub fn snapshot(&self) -> Snapshot {
        self.snapshot.read()
    }

    /// Receive every committed snapshot
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshot.subscribe()
    }

    /// Copy of the ingest counters
    pub fn metrics(&self) -> IngestMetrics {
        self.ledger().metrics.clone()
    }

    /// Continuity state of every source, in registry order
    pub fn continuity(&self) -> Vec<SourceContinuity> {
        self.ledger().chain.iter().cloned().collect()
    }

    /// Last accepted signature for `source`
    pub fn last_signature(&self, source: &str) -> Option<String> {
        self.ledger().chain.last_signature(source).map(str::to_string)
    }
}

impl std::fmt::Debug for OccupancyState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OccupancyState")
            .field("snapshot", &self.snapshot.read())
            .field("gateway", &self.gateway)
            .finish_non_exhaustive()
    }
}

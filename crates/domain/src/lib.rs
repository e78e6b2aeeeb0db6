//! Domain module for ParkWatch occupancy aggregation
//!
//! This crate holds the stateful half of the pipeline:
//! - Zone aggregation and the served snapshot
//! - Edge-triggered capacity alerts
//! - The authenticated manual override
//! - [`OccupancyState`], the single mutex-guarded unit tying them together

pub mod aggregator;
pub mod manual_override;
pub mod notifier;
pub mod snapshot;
pub mod state;

pub use aggregator::{ZoneAggregator, ZoneTotals};
pub use manual_override::{OverrideError, OverrideGateway, OverrideRequest};
pub use notifier::{AlertSink, CapacityAlert, CapacityNotifier, LogAlertSink};
pub use snapshot::{Count, Snapshot, SnapshotStore, UNKNOWN_COUNT};
pub use state::{IngestOutcome, OccupancyState};

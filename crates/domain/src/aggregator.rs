//! Zone Aggregator
//!
//! Keeps the latest free-space count per zone and derives the totals served
//! in the snapshot. Counts start at zero and only change on authenticated
//! messages.

use parkwatch_core::ZoneRole;
use parkwatch_stream::VerifiedMessage;
use tracing::debug;

use crate::snapshot::{Count, Snapshot};

/// Totals after an aggregation step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneTotals {
    /// Primary plus reserved
    pub total: i64,
    /// Reserved zone alone
    pub reserved: i64,
}

impl ZoneTotals {
    /// Snapshot these totals describe
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            total_free: Count::Known(self.total),
            handicap_free: Count::Known(self.reserved),
            connected: true,
        }
    }
}

/// Per-zone free-space counts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZoneAggregator {
    primary: i64,
    reserved: i64,
}

impl ZoneAggregator {
    /// Both zones at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold an authenticated message into the zone counts.
    ///
    /// A reserved-zone message may also carry a primary-zone fallback, which
    /// overwrites the primary count.
    pub fn apply(&mut self, message: &VerifiedMessage) -> ZoneTotals {
        match message.role {
            ZoneRole::Reserved => {
                self.reserved = message.record.free_count;
                if let Some(fallback) = message.primary_fallback {
                    debug!(
                        source = %message.source,
                        fallback,
                        "Resynchronizing primary zone from reserved-zone fallback"
                    );
                    self.primary = fallback;
                }
            }
            ZoneRole::Primary => {
                self.primary = message.record.free_count;
            }
        }
        self.totals()
    }

    /// Current totals
    pub fn totals(&self) -> ZoneTotals {
        ZoneTotals {
            total: self.primary.saturating_add(self.reserved),
            reserved: self.reserved,
        }
    }
}

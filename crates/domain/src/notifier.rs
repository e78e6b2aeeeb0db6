//! Capacity Notifier - edge-triggered "parking full" alert
//!
//! Fires once on the transition into zero remaining spaces and stays quiet
//! until a strictly positive total re-arms it. Delivery is delegated to an
//! [`AlertSink`], which must return immediately.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

/// Alert title
pub const CAPACITY_ALERT_TITLE: &str = "PARKING FULL";

/// Alert description
pub const CAPACITY_ALERT_DESCRIPTION: &str = "The parking lot has reached its maximum capacity.";

/// Payload of a capacity alert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapacityAlert {
    /// Short title
    pub title: String,
    /// Free-text description
    pub description: String,
    /// Free reserved-zone spaces at the time of the alert
    pub reserved_free: i64,
    /// When the zero edge was observed
    pub timestamp: DateTime<Utc>,
}

impl CapacityAlert {
    /// Alert for a full lot with `reserved_free` reserved spaces left
    pub fn parking_full(reserved_free: i64, timestamp: DateTime<Utc>) -> Self {
        Self {
            title: CAPACITY_ALERT_TITLE.to_string(),
            description: CAPACITY_ALERT_DESCRIPTION.to_string(),
            reserved_free,
            timestamp,
        }
    }
}

/// Fire-and-forget alert delivery.
///
/// Implementations must not block the caller; failures are theirs to log.
pub trait AlertSink: Send + Sync {
    /// Hand off an alert for delivery
    fn dispatch(&self, alert: CapacityAlert);
}

/// Sink that only logs, used when no webhook is configured
#[derive(Debug, Default, Clone, Copy)]
pub struct LogAlertSink;

impl AlertSink for LogAlertSink {
    fn dispatch(&self, alert: CapacityAlert) {
        warn!(
            title = %alert.title,
            reserved_free = alert.reserved_free,
            timestamp = %alert.timestamp.to_rfc3339(),
            "Capacity alert (no delivery sink configured)"
        );
    }
}

/// Edge detector for the zero-capacity condition
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapacityNotifier {
    fired: bool,
}

impl CapacityNotifier {
    /// Armed notifier
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    fn fired(&self) -> bool {
        self.fired
    }

    /// Observe new totals; returns an alert on the edge into zero.
    ///
    /// Negative totals neither fire nor re-arm.
    pub fn observe(&mut self, total: i64, reserved: i64) -> Option<CapacityAlert> {
        self.observe_at(total, reserved, Utc::now())
    }

    /// As [`observe`](Self::observe) with an explicit timestamp
    pub fn observe_at(
        &mut self,
        total: i64,
        reserved: i64,
        now: DateTime<Utc>,
    ) -> Option<CapacityAlert> {
        if total == 0 && !self.fired {
            self.fired = true;
            info!(reserved_free = reserved, "Parking full, raising capacity alert");
            return Some(CapacityAlert::parking_full(reserved, now));
        }
        if total > 0 && self.fired {
            info!(total, "Capacity available again, alert re-armed");
            self.fired = false;
        }
        None
    }
}

//! Optional staleness timer for the `connected` flag
//!
//! Without it, `connected` never reverts once set. With
//! `liveness.stale_after_secs` configured, the snapshot is marked
//! disconnected when no accepted message or override arrives in time.

use parkwatch_domain::OccupancyState;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::info;

/// Check at least this often, or four times per window if that is tighter.
const MAX_CHECK_PERIOD: Duration = Duration::from_secs(5);

/// Interval between staleness checks for a given window
pub fn check_period(stale_after: Duration) -> Duration {
    (stale_after / 4).clamp(Duration::from_millis(10), MAX_CHECK_PERIOD)
}

/// Spawn the liveness task
pub fn spawn(state: Arc<OccupancyState>, stale_after: Duration) -> JoinHandle<()> {
    info!(
        stale_after_secs = stale_after.as_secs(),
        "Liveness timer enabled"
    );
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(check_period(stale_after));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            let now = ticker.tick().await;
            state.expire_if_stale(now.into_std(), stale_after);
        }
    })
}

//! Snapshot Store - the single served read model
//!
//! Readers get the latest fully committed snapshot from a watch channel and
//! never contend with the ingest mutex. Writes are last-write-wins; there is
//! no history and no versioning.

use serde::{Deserialize, Serialize, Serializer};
use tokio::sync::watch;

/// Placeholder served before any value is known.
pub const UNKNOWN_COUNT: &str = "--";

/// A free-space count that may not be known yet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Count {
    /// No data received yet
    #[default]
    Unknown,
    /// Known number of free spaces
    Known(i64),
}

impl Serialize for Count {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Count::Unknown => serializer.serialize_str(UNKNOWN_COUNT),
            Count::Known(v) => serializer.serialize_i64(*v),
        }
    }
}

impl<'de> Deserialize<'de> for Count {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Number(i64),
            Text(String),
        }

        match Wire::deserialize(deserializer)? {
            Wire::Number(v) => Ok(Count::Known(v)),
            Wire::Text(s) if s == UNKNOWN_COUNT => Ok(Count::Unknown),
            Wire::Text(s) => Err(serde::de::Error::custom(format!(
                "expected a number or {:?}, got {:?}",
                UNKNOWN_COUNT, s
            ))),
        }
    }
}

/// Aggregated occupancy as served to the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Snapshot {
    /// Free spaces across all zones
    #[serde(rename = "placesRestantes")]
    pub total_free: Count,
    /// Free spaces in the reserved zone
    #[serde(rename = "placesHandicapeesRestantes")]
    pub handicap_free: Count,
    /// Whether any accepted message or override has been seen
    #[serde(rename = "isConnected")]
    pub connected: bool,
}

/// Holder of the current snapshot
#[derive(Debug)]
pub struct SnapshotStore {
    tx: watch::Sender<Snapshot>,
}

impl SnapshotStore {
    /// Create a store holding the initial unknown snapshot
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Snapshot::default());
        Self { tx }
    }

    /// Current snapshot
    pub fn read(&self) -> Snapshot {
        *self.tx.borrow()
    }

    /// Receive every committed snapshot
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.tx.subscribe()
    }

    pub(crate) fn publish(&self, snapshot: Snapshot) {
        self.tx.send_replace(snapshot);
    }
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

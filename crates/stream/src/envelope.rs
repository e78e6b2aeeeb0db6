//! Wire formats for sensor status messages.
//!
//! A status message is a JSON envelope:
//!
//! ```text
//! {"source": "A1", "data": "<seq>|<sensorId>|<freeCount>|<prevHash>:<sig16>"}
//! ```
//!
//! The reserved-zone node may add `libres_A1`, its own view of the primary
//! zone's free count, used to resynchronize the primary zone.

use parkwatch_crypto::SIGNATURE_SEPARATOR;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{IngestError, IngestResult};

/// Separator between payload fields.
pub const FIELD_SEPARATOR: char = '|';

/// Number of fields in a payload.
pub const PAYLOAD_FIELD_COUNT: usize = 4;

/// Status message envelope as published by sensor nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Declared source id
    pub source: String,
    /// `payload:signature`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    /// Primary-zone fallback count carried by the reserved-zone node
    #[serde(
        rename = "libres_A1",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub primary_fallback: Option<Value>,
}

impl Envelope {
    /// Create an envelope carrying `data`
    pub fn new(source: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            data: Some(data.into()),
            primary_fallback: None,
        }
    }

    /// Decode an envelope from a raw MQTT payload
    pub fn from_slice(bytes: &[u8]) -> IngestResult<Self> {
        serde_json::from_slice(bytes).map_err(|e| IngestError::MalformedEnvelope {
            reason: e.to_string(),
        })
    }

    /// Split `data` into `(payload, signature)`.
    ///
    /// The data must contain exactly one separator.
    pub fn split_data(&self) -> IngestResult<(&str, &str)> {
        let data = match self.data.as_deref() {
            Some(d) if !d.is_empty() => d,
            _ => {
                return Err(IngestError::MissingData {
                    source_id: self.source.clone(),
                })
            }
        };

        let mut parts = data.split(SIGNATURE_SEPARATOR);
        match (parts.next(), parts.next(), parts.next()) {
            (Some(payload), Some(signature), None) => Ok((payload, signature)),
            _ => Err(IngestError::MalformedEnvelope {
                reason: "data is not payload:signature".to_string(),
            }),
        }
    }
}

/// Parsed payload of an authenticated status message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorRecord {
    /// Sensor-side message counter
    pub sequence: u64,
    /// Sensor identifier as reported by the node
    pub sensor_id: String,
    /// Free spaces in the node's zone
    pub free_count: i64,
    /// Signature of the previous message from this source
    pub prev_hash: String,
}

impl SensorRecord {
    /// Parse a pipe-delimited payload
    pub fn parse(payload: &str) -> Result<Self, String> {
        let fields: Vec<&str> = payload.split(FIELD_SEPARATOR).collect();
        if fields.len() != PAYLOAD_FIELD_COUNT {
            return Err(format!(
                "expected {} fields, found {}",
                PAYLOAD_FIELD_COUNT,
                fields.len()
            ));
        }

        let sequence = fields[0]
            .parse::<u64>()
            .map_err(|_| format!("invalid sequence {:?}", fields[0]))?;
        let free_count = fields[2]
            .parse::<i64>()
            .map_err(|_| format!("invalid free count {:?}", fields[2]))?;

        Ok(Self {
            sequence,
            sensor_id: fields[1].to_string(),
            free_count,
            prev_hash: fields[3].to_string(),
        })
    }
}

/// Read a count that may arrive as a JSON number or a numeric string.
///
/// Fractional numbers are truncated toward zero. Strings must be a whole
/// integer once trimmed, so a trailing suffix like `"7abc"` is rejected
/// rather than read as 7. `null` and anything non-numeric yield `None`.
pub fn parse_count(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.abs() < i64::MAX as f64)
                .map(|f| f.trunc() as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

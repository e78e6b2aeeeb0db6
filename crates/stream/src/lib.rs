//! ParkWatch Stream
//!
//! Sensor message authentication and advisory chain continuity for the
//! occupancy ingest pipeline.

#![warn(missing_docs)]

pub mod envelope;
pub mod error;
pub mod integrity;
pub mod processor;

pub use envelope::{parse_count, Envelope, SensorRecord};
pub use error::{IngestError, IngestResult};
pub use integrity::{ChainStatus, ChainValidator, SourceContinuity};
pub use processor::{log_rejection, Authenticator, IngestMetrics, VerifiedMessage};

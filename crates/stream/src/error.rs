//! Error types for the ingest pipeline.
//!
//! Every variant is a per-message rejection: the message is dropped, prior
//! state is left untouched and the subscriber keeps running.

use thiserror::Error;

/// Reasons an inbound status message is discarded.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IngestError {
    /// Envelope is not JSON, or `data` is not exactly `payload:signature`
    #[error("Malformed envelope: {reason}")]
    MalformedEnvelope {
        /// What was wrong with it
        reason: String,
    },

    /// Envelope carried no `data` (sensor keep-alive)
    #[error("Envelope from {source_id} carries no data")]
    MissingData {
        /// Declared source
        source_id: String,
    },

    /// Source id is not in the registry
    #[error("Unknown source: {source_id}")]
    UnknownSource {
        /// Declared source
        source_id: String,
    },

    /// Recomputed signature differs from the one received
    #[error("Signature mismatch for source {source_id}")]
    SignatureMismatch {
        /// Declared source
        source_id: String,
    },

    /// Authenticated payload does not hold the four expected fields
    #[error("Malformed payload from {source_id}: {reason}")]
    MalformedPayload {
        /// Declared source
        source_id: String,
        /// What was wrong with it
        reason: String,
    },
}

impl IngestError {
    /// Short machine-readable classification, used as a log field
    pub fn kind(&self) -> &'static str {
        match self {
            IngestError::MalformedEnvelope { .. } => "malformed_envelope",
            IngestError::MissingData { .. } => "missing_data",
            IngestError::UnknownSource { .. } => "unknown_source",
            IngestError::SignatureMismatch { .. } => "signature_mismatch",
            IngestError::MalformedPayload { .. } => "malformed_payload",
        }
    }

    /// Whether this rejection should be treated as a security event
    pub fn is_security_event(&self) -> bool {
        matches!(self, IngestError::SignatureMismatch { .. })
    }
}

/// Result type for ingest operations.
pub type IngestResult<T> = Result<T, IngestError>;

//! Message Authenticator
//!
//! Turns a raw status envelope into a [`VerifiedMessage`] or an
//! [`IngestError`]. Checks run in a fixed order so that cheap structural
//! rejections never reach the HMAC computation:
//!
//! 1. `data` must split into exactly `payload:signature`
//! 2. the source must be registered
//! 3. the truncated HMAC-SHA256 of the payload must equal the received tag
//! 4. the payload must parse into its four fields
//!
//! Authentication is pure: it never touches chain or zone state.

use parkwatch_core::{SourceRegistry, ZoneRole};
use parkwatch_crypto::{verify_signature, SigningError};
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::envelope::{parse_count, Envelope, SensorRecord};
use crate::error::{IngestError, IngestResult};

/// A status message that passed authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedMessage {
    /// Registered source id
    pub source: String,
    /// Zone the source reports for
    pub role: ZoneRole,
    /// Parsed payload
    pub record: SensorRecord,
    /// Signature received with the payload; becomes the next expected `prev_hash`
    pub signature: String,
    /// Primary-zone resync count, only ever set for reserved-zone messages
    pub primary_fallback: Option<i64>,
}

/// Authenticates envelopes against a closed source registry.
#[derive(Debug, Clone)]
pub struct Authenticator {
    registry: SourceRegistry,
}

impl Authenticator {
    /// Create an authenticator for the given sources
    pub fn new(registry: SourceRegistry) -> Self {
        Self { registry }
    }

    /// Authenticate a decoded envelope.
    pub fn authenticate(&self, envelope: &Envelope) -> IngestResult<VerifiedMessage> {
        let (payload, signature) = envelope.split_data()?;

        let descriptor =
            self.registry
                .get(&envelope.source)
                .ok_or_else(|| IngestError::UnknownSource {
                    source_id: envelope.source.clone(),
                })?;

        verify_signature(descriptor.key(), payload, signature).map_err(|e| match e {
            SigningError::Mismatch { .. } | SigningError::InvalidKey { .. } => {
                IngestError::SignatureMismatch {
                    source_id: envelope.source.clone(),
                }
            }
        })?;

        let record =
            SensorRecord::parse(payload).map_err(|reason| IngestError::MalformedPayload {
                source_id: envelope.source.clone(),
                reason,
            })?;

        let primary_fallback = match (descriptor.role, envelope.primary_fallback.as_ref()) {
            (ZoneRole::Reserved, Some(value)) => {
                let parsed = parse_count(value);
                if parsed.is_none() {
                    warn!(
                        source = %envelope.source,
                        value = %value,
                        "Ignoring unparseable primary-zone fallback count"
                    );
                }
                parsed
            }
            _ => None,
        };

        debug!(
            source = %envelope.source,
            sequence = record.sequence,
            free_count = record.free_count,
            "Message authenticated"
        );

        Ok(VerifiedMessage {
            source: descriptor.id.clone(),
            role: descriptor.role,
            record,
            signature: signature.to_string(),
            primary_fallback,
        })
    }
}

/// Log a rejection at the severity its classification calls for.
pub fn log_rejection(err: &IngestError) {
    if err.is_security_event() {
        error!(
            kind = err.kind(),
            error = %err,
            "SECURITY ALERT: message forged or corrupted"
        );
        return;
    }
    match err {
        IngestError::MissingData { source_id } => {
            debug!(source = %source_id, kind = err.kind(), "Envelope without data dropped");
        }
        _ => {
            warn!(kind = err.kind(), error = %err, "Message rejected");
        }
    }
}

/// Counters for ingest outcomes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestMetrics {
    /// Messages that passed authentication
    pub accepted: u64,
    /// Envelopes that were not JSON or not `payload:signature`
    pub malformed: u64,
    /// Envelopes without data
    pub empty: u64,
    /// Envelopes naming an unregistered source
    pub unknown_source: u64,
    /// Envelopes failing signature verification
    pub signature_mismatch: u64,
    /// Authenticated envelopes with an unparseable payload
    pub malformed_payload: u64,
    /// Accepted messages whose `prev_hash` broke continuity
    pub chain_breaks: u64,
}

impl IngestMetrics {
    /// Record an accepted message
    pub fn record_accepted(&mut self, chain_broken: bool) {
        self.accepted += 1;
        if chain_broken {
            self.chain_breaks += 1;
        }
    }

    /// Record a rejection
    pub fn record_rejection(&mut self, err: &IngestError) {
        match err {
            IngestError::MalformedEnvelope { .. } => self.malformed += 1,
            IngestError::MissingData { .. } => self.empty += 1,
            IngestError::UnknownSource { .. } => self.unknown_source += 1,
            IngestError::SignatureMismatch { .. } => self.signature_mismatch += 1,
            IngestError::MalformedPayload { .. } => self.malformed_payload += 1,
        }
    }

    /// Total rejected messages
    pub fn rejected(&self) -> u64 {
        self.malformed
            + self.empty
            + self.unknown_source
            + self.signature_mismatch
            + self.malformed_payload
    }
}

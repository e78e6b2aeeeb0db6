//! Chain Validator - advisory continuity tracking
//!
//! Each status message names, in its `prev_hash` field, the signature of the
//! previous message its sensor sent. The validator compares that against the
//! last signature it accepted from the same source and logs any divergence.
//!
//! The check is advisory. A break never causes rejection, and the link is
//! the received signature itself rather than an independently derived hash,
//! so a replayed message carrying its own valid signature is not prevented.
//! It only surfaces message loss and reordering heuristically.

use parkwatch_core::{SourceRegistry, ZoneRole, GENESIS_SIGNATURE};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::processor::VerifiedMessage;

/// Outcome of a continuity check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainStatus {
    /// `prev_hash` matched the last accepted signature
    Linked,
    /// `prev_hash` diverged; the message is still accepted
    Broken {
        /// Last signature accepted from this source
        expected: String,
        /// `prev_hash` carried by the message
        received: String,
    },
}

impl ChainStatus {
    /// Whether continuity was broken
    pub fn is_broken(&self) -> bool {
        matches!(self, ChainStatus::Broken { .. })
    }
}

/// Continuity state for one source
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceContinuity {
    /// Source id
    pub source: String,
    /// Zone role of the source
    pub role: ZoneRole,
    /// Last accepted signature (genesis token before the first message)
    pub last_signature: String,
    /// Accepted messages
    pub messages: u64,
    /// Messages whose `prev_hash` linked correctly
    pub linked: u64,
    /// Messages whose `prev_hash` diverged
    pub chain_breaks: u64,
    /// Sequence number of the last accepted message
    pub last_sequence: Option<u64>,
}

impl SourceContinuity {
    fn new(source: &str, role: ZoneRole) -> Self {
        Self {
            source: source.to_string(),
            role,
            last_signature: GENESIS_SIGNATURE.to_string(),
            messages: 0,
            linked: 0,
            chain_breaks: 0,
            last_sequence: None,
        }
    }
}

/// Per-source continuity tracker
#[derive(Debug, Clone)]
pub struct ChainValidator {
    sources: HashMap<String, SourceContinuity>,
    order: Vec<String>,
}

impl ChainValidator {
    /// Start every registered source at the genesis token
    pub fn new(registry: &SourceRegistry) -> Self {
        let mut sources = HashMap::with_capacity(registry.len());
        let mut order = Vec::with_capacity(registry.len());
        for descriptor in registry.iter() {
            sources.insert(
                descriptor.id.clone(),
                SourceContinuity::new(&descriptor.id, descriptor.role),
            );
            order.push(descriptor.id.clone());
        }
        Self { sources, order }
    }

    /// Compare the message's `prev_hash` with the last accepted signature,
    /// then advance the chain head to the message's own signature.
    ///
    /// Only call this for authenticated messages.
    pub fn check_and_advance(&mut self, message: &VerifiedMessage) -> ChainStatus {
        let entry = self
            .sources
            .entry(message.source.clone())
            .or_insert_with(|| SourceContinuity::new(&message.source, message.role));

        let status = if message.record.prev_hash == entry.last_signature {
            entry.linked += 1;
            debug!(
                source = %message.source,
                sequence = message.record.sequence,
                "Chain continuity OK"
            );
            ChainStatus::Linked
        } else {
            entry.chain_breaks += 1;
            warn!(
                source = %message.source,
                sequence = message.record.sequence,
                expected = %entry.last_signature,
                received = %message.record.prev_hash,
                "Chain warning: linkage break detected"
            );
            ChainStatus::Broken {
                expected: entry.last_signature.clone(),
                received: message.record.prev_hash.clone(),
            }
        };

        if let Some(last) = entry.last_sequence {
            if message.record.sequence <= last {
                debug!(
                    source = %message.source,
                    sequence = message.record.sequence,
                    last_sequence = last,
                    "Sequence did not advance"
                );
            }
        }

        entry.messages += 1;
        entry.last_sequence = Some(message.record.sequence);
        entry.last_signature = message.signature.clone();
        status
    }

    /// Last accepted signature for `source`
    pub fn last_signature(&self, source: &str) -> Option<&str> {
        self.sources.get(source).map(|s| s.last_signature.as_str())
    }

    /// Continuity state for `source`
    pub fn get(&self, source: &str) -> Option<&SourceContinuity> {
        self.sources.get(source)
    }

    /// All sources in registry order
    pub fn iter(&self) -> impl Iterator<Item = &SourceContinuity> {
        self.order.iter().filter_map(|id| self.sources.get(id))
    }
}

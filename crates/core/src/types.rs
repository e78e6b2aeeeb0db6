//! Sensor source registry
//!
//! Every sensor origin the ingest service will accept is declared up front with
//! its pre-shared key and the zone it reports for. The set is closed: a message
//! naming any other source is rejected before any cryptographic work is done.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::error::CoreError;

/// Continuity token every source starts from before its first accepted message.
pub const GENESIS_SIGNATURE: &str = "0000000000000000";

/// Which zone a source reports free spaces for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneRole {
    /// General parking zone
    Primary,
    /// Reserved (handicap) zone
    Reserved,
}

impl fmt::Display for ZoneRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ZoneRole::Primary => write!(f, "primary"),
            ZoneRole::Reserved => write!(f, "reserved"),
        }
    }
}

/// A configured sensor origin.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceDescriptor {
    /// Identifier carried in the envelope `source` field
    pub id: String,
    /// Pre-shared HMAC key
    pub secret: String,
    /// Zone this source reports for
    pub role: ZoneRole,
}

impl SourceDescriptor {
    /// Create a new source descriptor
    pub fn new(id: impl Into<String>, secret: impl Into<String>, role: ZoneRole) -> Self {
        Self {
            id: id.into(),
            secret: secret.into(),
            role,
        }
    }

    /// Key bytes used for signature computation
    pub fn key(&self) -> &[u8] {
        self.secret.as_bytes()
    }
}

// Keep pre-shared keys out of logs.
impl fmt::Debug for SourceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceDescriptor")
            .field("id", &self.id)
            .field("secret", &"<redacted>")
            .field("role", &self.role)
            .finish()
    }
}

/// Closed lookup table of known sources.
///
/// Holds exactly one primary and one reserved source.
#[derive(Debug, Clone)]
pub struct SourceRegistry {
    sources: Vec<SourceDescriptor>,
    by_id: HashMap<String, usize>,
}

impl SourceRegistry {
    /// Build a registry, rejecting empty, duplicated, or role-incomplete source sets.
    pub fn new(sources: Vec<SourceDescriptor>) -> Result<Self, CoreError> {
        if sources.is_empty() {
            return Err(CoreError::EmptyRegistry);
        }

        let mut by_id = HashMap::with_capacity(sources.len());
        for (index, source) in sources.iter().enumerate() {
            if source.id.is_empty() {
                return Err(CoreError::InvalidSource("source id is empty".to_string()));
            }
            if by_id.insert(source.id.clone(), index).is_some() {
                return Err(CoreError::DuplicateSource(source.id.clone()));
            }
        }

        for role in [ZoneRole::Primary, ZoneRole::Reserved] {
            let count = sources.iter().filter(|s| s.role == role).count();
            if count != 1 {
                return Err(CoreError::RoleCount { role, count });
            }
        }

        Ok(Self { sources, by_id })
    }

    /// Look up a source by its envelope identifier
    pub fn get(&self, id: &str) -> Option<&SourceDescriptor> {
        self.by_id.get(id).map(|&index| &self.sources[index])
    }

    /// Iterate over all sources in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &SourceDescriptor> {
        self.sources.iter()
    }

    /// Number of configured sources
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Always false for a constructed registry
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

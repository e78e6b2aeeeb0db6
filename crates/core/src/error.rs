//! Core error types

use thiserror::Error;

use crate::types::ZoneRole;

/// Core error type for ParkWatch
#[derive(Debug, Error)]
pub enum CoreError {
    /// No sources configured
    #[error("Source registry is empty")]
    EmptyRegistry,

    /// Same source id declared twice
    #[error("Duplicate source id: {0}")]
    DuplicateSource(String),

    /// Malformed source declaration
    #[error("Invalid source: {0}")]
    InvalidSource(String),

    /// Each zone role must be held by exactly one source
    #[error("Expected exactly one {role} source, found {count}")]
    RoleCount {
        /// Role that is missing or duplicated
        role: ZoneRole,
        /// Number of sources declaring it
        count: usize,
    },
}

/// Result alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

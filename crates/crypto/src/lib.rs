//! Cryptographic primitives for the ParkWatch ingest pipeline.
//!
//! Sensor status messages are authenticated with a truncated HMAC-SHA256 tag
//! computed under a per-source pre-shared key. This crate owns that scheme and
//! its reference vectors; deciding which key applies to which message is left
//! to the authenticator in `parkwatch-stream`.
//!
//! # Security Principles
//!
//! - Never roll custom cryptographic primitives
//! - Secrets must never be logged
//! - Wire compatibility with deployed firmware takes precedence; weaknesses of
//!   the scheme are documented rather than silently changed

pub mod signing;

#[cfg(test)]
mod test_vectors;

pub use signing::{
    compute_signature, sign_message, verify_signature, SigningError,
    SIGNATURE_HEX_LEN, SIGNATURE_SEPARATOR,
};

//! Payload Signing - Sensor Message Authentication
//!
//! Sensor nodes sign the pipe-delimited payload of every status message with
//! HMAC-SHA256 under a pre-shared key and transmit only the first 16 lowercase
//! hex characters (64 bits) of the digest. This module reproduces that scheme
//! exactly so that deployed firmware keeps interoperating.
//!
//! # Security Model
//!
//! - The truncated 64-bit tag is a weak integrity guarantee; a hardened wire
//!   format would carry the full digest
//! - Verification is a plain string comparison of the hex forms, so an
//!   uppercase tag from a sensor is a mismatch, exactly as in the field
//! - Keys are borrowed from the source registry and never logged

use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Number of hex characters of the digest carried on the wire.
pub const SIGNATURE_HEX_LEN: usize = 16;

/// Separator between payload and signature in the envelope `data` field.
pub const SIGNATURE_SEPARATOR: char = ':';

/// Errors that can occur during signing operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SigningError {
    #[error("Signature mismatch: received {received}")]
    Mismatch { received: String },

    #[error("Invalid key: {reason}")]
    InvalidKey { reason: String },
}

/// Computes the wire signature of `payload` under `key`.
///
/// # Examples
/// ```
/// use parkwatch_crypto::signing::compute_signature;
///
/// let sig = compute_signature(b"CLE_A1_SECURE", "7|A1|12|0000000000000000").unwrap();
/// assert_eq!(sig, "9837429d07040d9c");
/// ```
pub fn compute_signature(key: &[u8], payload: &str) -> Result<String, SigningError> {
    let mut mac = HmacSha256::new_from_slice(key).map_err(|e| SigningError::InvalidKey {
        reason: e.to_string(),
    })?;
    mac.update(payload.as_bytes());
    let digest = mac.finalize().into_bytes();

    // 16 hex chars == the first 8 digest bytes
    Ok(hex::encode(&digest[..SIGNATURE_HEX_LEN / 2]))
}

/// Checks `received` against the signature recomputed over `payload`.
pub fn verify_signature(key: &[u8], payload: &str, received: &str) -> Result<(), SigningError> {
    let expected = compute_signature(key, payload)?;
    if expected != received {
        return Err(SigningError::Mismatch {
            received: received.to_string(),
        });
    }
    Ok(())
}

/// Builds a complete `payload:signature` data field, as a sensor would send it.
pub fn sign_message(key: &[u8], payload: &str) -> Result<String, SigningError> {
    let signature = compute_signature(key, payload)?;
    Ok(format!("{}{}{}", payload, SIGNATURE_SEPARATOR, signature))
}

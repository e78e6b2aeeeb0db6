//! Override Gateway - authenticated manual count override
//!
//! An operator can force the served total, bypassing sensor authentication
//! entirely. The password check is an exact comparison of the trimmed
//! strings against the trimmed configured secret. It is neither constant
//! time nor hashed; both are known hardening candidates.

use parkwatch_stream::parse_count;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Reasons an override is refused
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OverrideError {
    /// Password does not match
    #[error("Incorrect administrator password.")]
    Unauthorized,

    /// No count supplied
    #[error("Missing target count.")]
    MissingCount,

    /// Count supplied but not an integer
    #[error("Invalid target count: {0}")]
    InvalidCount(String),
}

/// Body of an override request
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct OverrideRequest {
    /// New total; a JSON number or numeric string
    #[serde(default)]
    pub count: Option<Value>,
    /// Administrator password
    #[serde(default)]
    pub password: Option<String>,
}

impl OverrideRequest {
    /// Request with an integer count
    pub fn new(count: i64, password: impl Into<String>) -> Self {
        Self {
            count: Some(Value::from(count)),
            password: Some(password.into()),
        }
    }
}

/// Checks override requests against the configured secret
#[derive(Clone)]
pub struct OverrideGateway {
    secret: String,
}

impl OverrideGateway {
    /// Gateway for `secret`; surrounding whitespace is ignored
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into().trim().to_string(),
        }
    }

    /// Whether the configured secret is empty, in which case an empty or
    /// missing password is accepted
    pub fn is_open(&self) -> bool {
        self.secret.is_empty()
    }

    /// Validate a request and return the count to apply.
    ///
    /// The password is checked before the count.
    pub fn check(&self, request: &OverrideRequest) -> Result<i64, OverrideError> {
        let supplied = request.password.as_deref().unwrap_or("").trim();
        if supplied != self.secret {
            return Err(OverrideError::Unauthorized);
        }

        match request.count.as_ref() {
            None | Some(Value::Null) => Err(OverrideError::MissingCount),
            Some(value) => {
                parse_count(value).ok_or_else(|| OverrideError::InvalidCount(value.to_string()))
            }
        }
    }
}

impl std::fmt::Debug for OverrideGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverrideGateway")
            .field("open", &self.is_open())
            .finish()
    }
}

//! Validation helpers for event fields.
//!
//! Events arrive from untrusted relays, so the fields the pipeline dispatches
//! on are checked here before use:
//! - Untyped input must be a JSON object with an unsigned integer `kind`
//! - Pubkeys must be 64 hex characters

use serde_json::Value;

/// Length of a hex-encoded 32-byte public key.
pub const HEX_PUBKEY_LEN: usize = 64;

/// Validation error types for event fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Required field is absent or null
    MissingField { field: &'static str },
    /// Field contains invalid data
    InvalidData { field: &'static str, reason: &'static str },
    /// Input was not a JSON object
    NotAnObject,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField { field } => {
                write!(f, "required field '{}' is missing", field)
            }
            Self::InvalidData { field, reason } => {
                write!(f, "field '{}' contains invalid data: {}", field, reason)
            }
            Self::NotAnObject => write!(f, "event is not a JSON object"),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// True when `value` is exactly 64 hex digits (either case).
pub fn is_hex_pubkey(value: &str) -> bool {
    value.len() == HEX_PUBKEY_LEN && value.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Validate the shape of an untyped event and return its kind.
///
/// Only the object shape and `kind` are checked; other fields are read
/// leniently and checked by whoever needs them.
pub fn validate_event_shape(value: &Value) -> ValidationResult<u32> {
    let obj = value.as_object().ok_or(ValidationError::NotAnObject)?;

    match obj.get("kind") {
        None | Some(Value::Null) => Err(ValidationError::MissingField { field: "kind" }),
        Some(kind) => kind
            .as_u64()
            .and_then(|k| u32::try_from(k).ok())
            .ok_or(ValidationError::InvalidData {
                field: "kind",
                reason: "not a 32-bit unsigned integer",
            }),
    }
}

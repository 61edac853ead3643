//! Error types for DMX Core.
//!
//! Failures never escape the dispatcher as `Err`; they are folded into the
//! `errors` list of a `DecryptResult`, one `AttemptError` per failed attempt,
//! each tagged with the pipeline stage where it happened.

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

use dmx_proto::ValidationError;

// ============================================================================
// Stages
// ============================================================================

/// Pipeline stage at which a failure occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Malformed event or context, before any candidate was tried
    Input,
    /// No usable decryptor candidates
    Decryptor,
    /// Outer gift-wrap decrypt or seal parse
    Wrap,
    /// Seal validation or seal-layer decrypt
    Seal,
    /// Rumor parse
    Rumor,
    /// Legacy single-layer decrypt
    Content,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Input => "input",
            Stage::Decryptor => "decryptor",
            Stage::Wrap => "wrap",
            Stage::Seal => "seal",
            Stage::Rumor => "rumor",
            Stage::Content => "content",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Backend Errors
// ============================================================================

/// Errors returned by a pluggable decryptor backend.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The ciphertext could not be decrypted
    #[error("decryption failed: {0}")]
    Failed(String),

    /// An external signer declined the request
    #[error("decryption request rejected by signer")]
    Rejected,

    /// The backend could not be reached
    #[error("decryption backend unavailable: {0}")]
    Unavailable(String),
}

// ============================================================================
// Decrypt Errors
// ============================================================================

/// Reasons a decrypt attempt, or the whole decrypt, failed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecryptError {
    #[error("a valid event is required for DM decryption: {0}")]
    InvalidEvent(#[from] ValidationError),

    #[error("unsupported DM event kind: {0}")]
    UnsupportedKind(u32),

    #[error("no decryptors are available for DM payloads")]
    NoDecryptors,

    #[error("gift wrap events require a gift-wrap capable decryptor")]
    NoGiftWrapDecryptors,

    #[error("{what} is missing ciphertext or pubkey")]
    MissingCiphertext { what: &'static str },

    #[error("decrypted payload was empty")]
    EmptyPayload,

    #[error("decrypted payload was not a JSON object")]
    InvalidJson,

    #[error("failed to parse decrypted payload as JSON: {0}")]
    JsonParseFailed(String),

    #[error("gift wrap seal is missing ciphertext or pubkey")]
    InvalidSeal,

    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl DecryptError {
    /// Stable machine-readable code for diagnostics.
    pub fn code(&self) -> &'static str {
        match self {
            DecryptError::InvalidEvent(_) => "invalid-event",
            DecryptError::UnsupportedKind(_) => "unsupported-kind",
            DecryptError::NoDecryptors => "no-decryptors",
            DecryptError::NoGiftWrapDecryptors => "no-gift-wrap-decryptors",
            DecryptError::MissingCiphertext { .. } => "missing-ciphertext",
            DecryptError::EmptyPayload => "empty-payload",
            DecryptError::InvalidJson => "invalid-json",
            DecryptError::JsonParseFailed(_) => "json-parse-failed",
            DecryptError::InvalidSeal => "invalid-seal",
            DecryptError::Backend(_) => "decrypt-failed",
        }
    }
}

// ============================================================================
// Attempt Errors
// ============================================================================

/// One failed attempt, as reported in `DecryptResult::errors`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptError {
    /// Scheme of the candidate that failed (empty for pre-attempt failures)
    pub scheme: String,
    /// Source label of the candidate that failed
    pub source: String,
    pub stage: Stage,
    pub error: DecryptError,
}

impl AttemptError {
    /// A failure not tied to any candidate.
    pub fn new(stage: Stage, error: DecryptError) -> Self {
        Self {
            scheme: String::new(),
            source: String::new(),
            stage,
            error,
        }
    }

    /// A failure of a specific candidate.
    pub fn for_candidate(
        scheme: impl Into<String>,
        source: impl Into<String>,
        stage: Stage,
        error: DecryptError,
    ) -> Self {
        Self {
            scheme: scheme.into(),
            source: source.into(),
            stage,
            error,
        }
    }

    pub fn code(&self) -> &'static str {
        self.error.code()
    }
}

impl std::fmt::Display for AttemptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.stage, self.error)
    }
}

impl Serialize for AttemptError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("AttemptError", 5)?;
        state.serialize_field("scheme", &self.scheme)?;
        state.serialize_field("source", &self.source)?;
        state.serialize_field("stage", &self.stage)?;
        state.serialize_field("code", self.code())?;
        state.serialize_field("message", &self.error.to_string())?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Stage::Rumor).unwrap(), "\"rumor\"");
        assert_eq!(Stage::Decryptor.to_string(), "decryptor");
    }

    #[test]
    fn test_backend_error_is_transparent() {
        let err = DecryptError::from(BackendError::Failed("bad mac".into()));
        assert_eq!(err.code(), "decrypt-failed");
        assert_eq!(err.to_string(), "decryption failed: bad mac");
    }

    #[test]
    fn test_attempt_error_serialization() {
        let attempt = AttemptError::for_candidate(
            "nip44",
            "signer",
            Stage::Seal,
            DecryptError::InvalidSeal,
        );
        let value = serde_json::to_value(&attempt).unwrap();
        assert_eq!(value["scheme"], "nip44");
        assert_eq!(value["source"], "signer");
        assert_eq!(value["stage"], "seal");
        assert_eq!(value["code"], "invalid-seal");
        assert_eq!(value["message"], "gift wrap seal is missing ciphertext or pubkey");
    }
}

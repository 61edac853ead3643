//! Uniform decrypt result assembly.
//!
//! Every call into the pipeline returns a [`DecryptResult`], success or not.
//! Consumers rely on `ok` plus `errors` as the only failure signal.

use serde::Serialize;

use dmx_proto::{NostrEvent, PartialEvent};

use crate::candidate::DecryptorCandidate;
use crate::errors::{AttemptError, Stage};
use crate::normalize::{normalize_hex, normalize_scheme};
use crate::recipients::Participant;

/// Conversation direction relative to the acting user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Outgoing,
    Incoming,
    Unknown,
}

/// Which candidate produced the result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DecryptorInfo {
    pub scheme: String,
    pub source: String,
}

/// Outer layers of a gift wrap, kept for provenance audits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Envelope {
    pub wrap: NostrEvent,
    pub seal: PartialEvent,
}

/// Outcome of decrypting one direct-message event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecryptResult {
    pub ok: bool,
    /// The input event, absent only when the input was not an event at all
    pub event: Option<NostrEvent>,
    /// The decrypted message (legacy event with plaintext content, or rumor)
    pub message: Option<NostrEvent>,
    pub plaintext: Option<String>,
    pub recipients: Vec<Participant>,
    pub sender: Option<Participant>,
    /// Normalized actor key, empty when it is not a valid hex key
    pub actor_pubkey: String,
    pub decryptor: DecryptorInfo,
    pub scheme: String,
    pub envelope: Option<Envelope>,
    pub direction: Direction,
    /// Unix seconds
    pub timestamp: u64,
    pub errors: Vec<AttemptError>,
}

impl DecryptResult {
    /// Stage of the first recorded failure.
    pub fn first_error_stage(&self) -> Option<Stage> {
        self.errors.first().map(|e| e.stage)
    }
}

/// Inputs to [`build_decrypt_result`].
#[derive(Default)]
pub struct ResultParts<'a> {
    pub ok: bool,
    pub event: Option<&'a NostrEvent>,
    pub message: Option<NostrEvent>,
    pub plaintext: Option<String>,
    pub recipients: Vec<Participant>,
    pub sender_pubkey: Option<String>,
    pub actor_pubkey: &'a str,
    pub decryptor: Option<&'a DecryptorCandidate>,
    pub scheme: String,
    pub envelope: Option<Envelope>,
    pub errors: Vec<AttemptError>,
}

impl<'a> ResultParts<'a> {
    /// Parts of a failed result.
    pub fn failure(
        event: Option<&'a NostrEvent>,
        actor_pubkey: &'a str,
        errors: Vec<AttemptError>,
    ) -> Self {
        Self {
            ok: false,
            event,
            actor_pubkey,
            errors,
            ..Default::default()
        }
    }
}

/// Direction of a conversation as seen by `actor_pubkey`.
pub fn derive_direction(
    actor_pubkey: &str,
    sender_pubkey: Option<&str>,
    recipients: &[Participant],
) -> Direction {
    let Some(actor) = normalize_hex(actor_pubkey) else {
        return Direction::Unknown;
    };

    if sender_pubkey.and_then(normalize_hex).as_deref() == Some(actor.as_str()) {
        return Direction::Outgoing;
    }

    if recipients
        .iter()
        .any(|r| normalize_hex(&r.pubkey).as_deref() == Some(actor.as_str()))
    {
        return Direction::Incoming;
    }

    Direction::Unknown
}

fn wall_clock_secs() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp()).unwrap_or(0)
}

/// Assemble a result from its parts.
pub fn build_decrypt_result(parts: ResultParts<'_>) -> DecryptResult {
    let timestamp = [
        parts.message.as_ref().and_then(|m| m.created_at),
        parts.event.and_then(|e| e.created_at),
    ]
    .into_iter()
    .flatten()
    .max()
    .unwrap_or_else(wall_clock_secs);

    let decryptor = match parts.decryptor {
        Some(candidate) => {
            let scheme = normalize_scheme(&candidate.scheme);
            DecryptorInfo {
                scheme: if scheme.is_empty() {
                    parts.scheme.clone()
                } else {
                    scheme
                },
                source: candidate.source.clone(),
            }
        }
        None => DecryptorInfo {
            scheme: parts.scheme.clone(),
            source: String::new(),
        },
    };

    let scheme = if parts.scheme.is_empty() {
        parts
            .decryptor
            .map(|c| normalize_scheme(&c.scheme))
            .unwrap_or_default()
    } else {
        normalize_scheme(&parts.scheme)
    };

    let direction = derive_direction(
        parts.actor_pubkey,
        parts.sender_pubkey.as_deref(),
        &parts.recipients,
    );

    DecryptResult {
        ok: parts.ok,
        event: parts.event.cloned(),
        message: parts.message,
        plaintext: parts.plaintext,
        recipients: parts.recipients,
        sender: parts.sender_pubkey.map(Participant::sender),
        actor_pubkey: normalize_hex(parts.actor_pubkey).unwrap_or_default(),
        decryptor,
        scheme,
        envelope: parts.envelope,
        direction,
        timestamp,
        errors: parts.errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::DecryptError;
    use crate::harness::hex_key;

    #[test]
    fn test_direction() {
        let me = hex_key(1);
        let other = hex_key(2);
        let recipients = vec![Participant::recipient(me.clone(), vec![])];

        assert_eq!(derive_direction(&me, Some(me.as_str()), &[]), Direction::Outgoing);
        assert_eq!(
            derive_direction(&me.to_uppercase(), Some(other.as_str()), &recipients),
            Direction::Incoming
        );
        assert_eq!(derive_direction(&me, Some(other.as_str()), &[]), Direction::Unknown);
        assert_eq!(derive_direction("npub1abc", Some(other.as_str()), &recipients), Direction::Unknown);
        assert_eq!(derive_direction(&me, None, &[]), Direction::Unknown);
    }

    #[test]
    fn test_timestamp_prefers_latest_created_at() {
        let event = NostrEvent::new(1059, hex_key(3), "x").with_created_at(100);
        let message = NostrEvent::new(14, hex_key(4), "hi").with_created_at(250);

        let result = build_decrypt_result(ResultParts {
            ok: true,
            event: Some(&event),
            message: Some(message),
            ..Default::default()
        });
        assert_eq!(result.timestamp, 250);
    }

    #[test]
    fn test_timestamp_falls_back_to_wall_clock() {
        let event = NostrEvent::new(4, hex_key(3), "x");
        let before = wall_clock_secs();
        let result = build_decrypt_result(ResultParts::failure(Some(&event), "", vec![]));
        assert!(result.timestamp >= before);
    }

    #[test]
    fn test_failure_shape() {
        let event = NostrEvent::new(4, hex_key(3), "x").with_created_at(7);
        let errors = vec![AttemptError::new(Stage::Content, DecryptError::EmptyPayload)];
        let result = build_decrypt_result(ResultParts::failure(Some(&event), "not-hex", errors));

        assert!(!result.ok);
        assert_eq!(result.event.as_ref(), Some(&event));
        assert!(result.message.is_none());
        assert!(result.plaintext.is_none());
        assert!(result.sender.is_none());
        assert_eq!(result.actor_pubkey, "");
        assert_eq!(result.decryptor, DecryptorInfo::default());
        assert_eq!(result.direction, Direction::Unknown);
        assert_eq!(result.first_error_stage(), Some(Stage::Content));
    }

    #[test]
    fn test_serialized_field_names() {
        let event = NostrEvent::new(4, hex_key(3), "x").with_created_at(1);
        let result = build_decrypt_result(ResultParts::failure(Some(&event), "", vec![]));
        let value = serde_json::to_value(&result).unwrap();
        assert!(value.get("actorPubkey").is_some());
        assert_eq!(value["direction"], "unknown");
        assert_eq!(value["errors"], serde_json::json!([]));
    }
}

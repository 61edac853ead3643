//! Two-stage gift-wrap decryption (wrap -> seal -> rumor).
//!
//! The outer wrap is published under a throwaway key. Decrypting it yields a
//! seal signed by the real sender, whose content in turn decrypts to the
//! rumor carrying the message. Both layers are opened with the same
//! candidate: a backend that opened the wrap is assumed to hold the scheme
//! used for the seal too, so candidates are never mixed across layers.

use serde_json::Value;
use tracing::{debug, warn};

use dmx_proto::{NostrEvent, PartialEvent};

use crate::candidate::{DecryptorCandidate, StageContext, StageEvent};
use crate::errors::{AttemptError, DecryptError, Stage};
use crate::legacy::short_id;
use crate::normalize::normalize_hex;
use crate::recipients::collect_recipients;
use crate::result::{build_decrypt_result, DecryptResult, Envelope, ResultParts};

/// Parse a decrypted payload into an event-like record.
///
/// * empty or whitespace-only -> `EmptyPayload`
/// * not JSON -> `JsonParseFailed`
/// * JSON but not an object -> `InvalidJson`
pub fn parse_event_json(serialized: Option<&str>) -> Result<PartialEvent, DecryptError> {
    let serialized = serialized
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(DecryptError::EmptyPayload)?;

    let value: Value = serde_json::from_str(serialized)
        .map_err(|e| DecryptError::JsonParseFailed(e.to_string()))?;

    PartialEvent::from_value(&value).ok_or(DecryptError::InvalidJson)
}

/// Both layers opened by one candidate.
struct Unwrapped {
    seal: PartialEvent,
    seal_pubkey: String,
    rumor: PartialEvent,
}

async fn unwrap_with(
    candidate: &DecryptorCandidate,
    event: &NostrEvent,
    wrap_pubkey: &str,
) -> Result<Unwrapped, (Stage, DecryptError)> {
    let wrap_ctx = StageContext {
        event: StageEvent::Message(event),
        stage: Stage::Wrap,
    };
    let seal_serialized = candidate
        .decrypt(wrap_pubkey, &event.content, wrap_ctx)
        .await
        .map_err(|e| (Stage::Wrap, DecryptError::from(e)))?;
    let seal = parse_event_json(seal_serialized.as_deref()).map_err(|e| (Stage::Wrap, e))?;

    let seal_ciphertext = seal.content_str();
    let seal_pubkey = normalize_hex(seal.pubkey_str())
        .filter(|_| !seal_ciphertext.is_empty())
        .ok_or((Stage::Seal, DecryptError::InvalidSeal))?;

    let seal_ctx = StageContext {
        event: StageEvent::Seal(&seal),
        stage: Stage::Seal,
    };
    let rumor_serialized = candidate
        .decrypt(&seal_pubkey, seal_ciphertext, seal_ctx)
        .await
        .map_err(|e| (Stage::Seal, DecryptError::from(e)))?;
    let rumor = parse_event_json(rumor_serialized.as_deref()).map_err(|e| (Stage::Rumor, e))?;

    Ok(Unwrapped {
        seal,
        seal_pubkey,
        rumor,
    })
}

/// Decrypt a gift wrap with the given gift-wrap capable candidates, in order.
///
/// `fallback_scheme` is reported when the winning candidate names no scheme.
pub async fn decrypt_gift_wrap(
    event: &NostrEvent,
    candidates: &[DecryptorCandidate],
    actor_pubkey: &str,
    fallback_scheme: &str,
) -> DecryptResult {
    let wrap_pubkey = match normalize_hex(&event.pubkey) {
        Some(pubkey) if !event.content.is_empty() => pubkey,
        _ => {
            warn!("gift wrap {} is missing ciphertext or pubkey", short_id(&event.id));
            let error = AttemptError::new(
                Stage::Wrap,
                DecryptError::MissingCiphertext {
                    what: "gift wrap event",
                },
            );
            return build_decrypt_result(ResultParts::failure(
                Some(event),
                actor_pubkey,
                vec![error],
            ));
        }
    };

    let mut errors = Vec::new();

    for candidate in candidates {
        debug!(
            scheme = %candidate.scheme,
            source = %candidate.source,
            "trying gift wrap {}",
            short_id(&event.id)
        );

        match unwrap_with(candidate, event, &wrap_pubkey).await {
            Ok(Unwrapped {
                seal,
                seal_pubkey,
                rumor,
            }) => {
                let sender_pubkey = normalize_hex(rumor.pubkey_str()).unwrap_or(seal_pubkey);
                let recipients = collect_recipients(rumor.tags_or_empty());
                let plaintext = rumor.content_str().to_string();
                let scheme = if candidate.scheme.is_empty() {
                    fallback_scheme.to_string()
                } else {
                    candidate.scheme.clone()
                };

                debug!(
                    scheme = %candidate.scheme,
                    source = %candidate.source,
                    "gift wrap {} opened, sender {}",
                    short_id(&event.id),
                    &sender_pubkey[..8]
                );

                return build_decrypt_result(ResultParts {
                    ok: true,
                    event: Some(event),
                    message: Some(NostrEvent::from(rumor)),
                    plaintext: Some(plaintext),
                    recipients,
                    sender_pubkey: Some(sender_pubkey),
                    actor_pubkey,
                    decryptor: Some(candidate),
                    scheme,
                    envelope: Some(Envelope {
                        wrap: event.clone(),
                        seal,
                    }),
                    errors,
                });
            }
            Err((stage, error)) => {
                warn!(
                    scheme = %candidate.scheme,
                    source = %candidate.source,
                    stage = %stage,
                    code = error.code(),
                    "gift wrap attempt failed: {}",
                    error
                );
                errors.push(AttemptError::for_candidate(
                    candidate.scheme.clone(),
                    candidate.source.clone(),
                    stage,
                    error,
                ));
            }
        }
    }

    build_decrypt_result(ResultParts::failure(Some(event), actor_pubkey, errors))
}

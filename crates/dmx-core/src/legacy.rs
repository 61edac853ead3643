//! Single-layer (legacy) direct-message decryption.

use tracing::{debug, warn};

use dmx_proto::NostrEvent;

use crate::candidate::{DecryptorCandidate, StageContext, StageEvent};
use crate::errors::{AttemptError, DecryptError, Stage};
use crate::hints::parse_encryption_hints;
use crate::normalize::normalize_hex;
use crate::order::{order_decryptors, OrderOptions};
use crate::recipients::collect_recipients;
use crate::result::{build_decrypt_result, DecryptResult, ResultParts};

/// Decrypt a legacy DM by trying every candidate in hint-aware order.
///
/// The first candidate returning plaintext wins. Failures of earlier
/// candidates are kept in the result's `errors`.
pub async fn decrypt_legacy_dm(
    event: &NostrEvent,
    candidates: &[DecryptorCandidate],
    actor_pubkey: &str,
) -> DecryptResult {
    let ciphertext = event.content.as_str();
    let hints = parse_encryption_hints(&event.tags);

    let sender_pubkey = match normalize_hex(&event.pubkey) {
        Some(pubkey) if !ciphertext.is_empty() => pubkey,
        _ => {
            warn!("legacy DM {} is missing ciphertext or pubkey", short_id(&event.id));
            let error = AttemptError::new(
                Stage::Content,
                DecryptError::MissingCiphertext {
                    what: "direct message",
                },
            );
            return build_decrypt_result(ResultParts::failure(
                Some(event),
                actor_pubkey,
                vec![error],
            ));
        }
    };

    let ordered = order_decryptors(candidates, Some(&hints), OrderOptions::default());
    let mut errors = Vec::new();

    for candidate in &ordered {
        debug!(
            scheme = %candidate.scheme,
            source = %candidate.source,
            "trying legacy decrypt from {}",
            &sender_pubkey[..8]
        );

        let ctx = StageContext {
            event: StageEvent::Message(event),
            stage: Stage::Content,
        };

        match candidate.decrypt(&sender_pubkey, ciphertext, ctx).await {
            Ok(Some(plaintext)) => {
                debug!(
                    scheme = %candidate.scheme,
                    source = %candidate.source,
                    "legacy DM {} decrypted",
                    short_id(&event.id)
                );

                let scheme = if candidate.scheme.is_empty() {
                    hints.preferred().unwrap_or_default().to_string()
                } else {
                    candidate.scheme.clone()
                };

                return build_decrypt_result(ResultParts {
                    ok: true,
                    event: Some(event),
                    message: Some(event.with_content(plaintext.clone())),
                    plaintext: Some(plaintext),
                    recipients: collect_recipients(&event.tags),
                    sender_pubkey: Some(sender_pubkey),
                    actor_pubkey,
                    decryptor: Some(candidate),
                    scheme,
                    envelope: None,
                    errors,
                });
            }
            Ok(None) => {
                debug!(
                    scheme = %candidate.scheme,
                    source = %candidate.source,
                    "decryptor returned no plaintext"
                );
            }
            Err(e) => {
                let error = DecryptError::from(e);
                warn!(
                    scheme = %candidate.scheme,
                    source = %candidate.source,
                    code = error.code(),
                    "legacy decrypt failed: {}",
                    error
                );
                errors.push(AttemptError::for_candidate(
                    candidate.scheme.clone(),
                    candidate.source.clone(),
                    Stage::Content,
                    error,
                ));
            }
        }
    }

    build_decrypt_result(ResultParts::failure(Some(event), actor_pubkey, errors))
}

/// First 8 characters of an event id, for logs.
pub(crate) fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

//! Pluggable decryptor backends.
//!
//! A backend implements [`Decryptor`] for one or more schemes; the pipeline
//! wraps each in a [`DecryptorCandidate`] carrying the metadata used to pick
//! the order in which backends are tried.

use std::sync::Arc;

use async_trait::async_trait;

use dmx_proto::{NostrEvent, PartialEvent};

use crate::errors::{BackendError, Stage};
use crate::normalize::{normalize_scheme, SCHEME_NIP44};

// ============================================================================
// Decryptor Trait
// ============================================================================

/// The event whose ciphertext is being decrypted at a given stage.
#[derive(Debug, Clone, Copy)]
pub enum StageEvent<'a> {
    /// The relay-delivered event (legacy content or outer gift wrap)
    Message(&'a NostrEvent),
    /// A seal recovered from a gift wrap
    Seal(&'a PartialEvent),
}

impl<'a> StageEvent<'a> {
    pub fn id(&self) -> Option<&'a str> {
        match self {
            StageEvent::Message(event) => Some(event.id.as_str()),
            StageEvent::Seal(seal) => seal.id.as_deref(),
        }
    }

    pub fn pubkey(&self) -> &'a str {
        match self {
            StageEvent::Message(event) => event.pubkey.as_str(),
            StageEvent::Seal(seal) => seal.pubkey_str(),
        }
    }
}

/// Context passed to every decrypt call.
#[derive(Debug, Clone, Copy)]
pub struct StageContext<'a> {
    pub event: StageEvent<'a>,
    pub stage: Stage,
}

/// Trait for decryption backends (local keys, external signers, workers).
///
/// Calls may suspend for as long as the backend needs, e.g. while a hardware
/// signer waits for the user. The pipeline never races backends and never
/// times out a call; a backend that needs a deadline enforces its own.
#[async_trait]
pub trait Decryptor: Send + Sync {
    /// Decrypt `ciphertext` exchanged with `counterparty`.
    ///
    /// # Returns
    /// * `Ok(Some(plaintext))` - Decryption succeeded
    /// * `Ok(None)` - The backend produced no result
    /// * `Err(BackendError)` - Decryption failed
    async fn decrypt(
        &self,
        counterparty: &str,
        ciphertext: &str,
        ctx: StageContext<'_>,
    ) -> Result<Option<String>, BackendError>;
}

// ============================================================================
// Candidates
// ============================================================================

/// A decryptor plus the metadata used to order and filter it.
#[derive(Clone)]
pub struct DecryptorCandidate {
    /// Scheme name; normalized by [`prepare_candidates`]
    pub scheme: String,
    pub decryptor: Arc<dyn Decryptor>,
    /// Lower values are tried first
    pub priority: i32,
    /// Whether this candidate may take part in gift-wrap unwrapping
    pub supports_gift_wrap: bool,
    /// Free-form origin label (e.g. "signer", "session-actor")
    pub source: String,
}

impl DecryptorCandidate {
    pub fn new(decryptor: Arc<dyn Decryptor>) -> Self {
        Self {
            scheme: String::new(),
            decryptor,
            priority: 0,
            supports_gift_wrap: false,
            source: String::new(),
        }
    }

    pub fn from_decryptor<D: Decryptor + 'static>(decryptor: D) -> Self {
        Self::new(Arc::new(decryptor))
    }

    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_gift_wrap(mut self, supports_gift_wrap: bool) -> Self {
        self.supports_gift_wrap = supports_gift_wrap;
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Dedup key used when assembling contexts.
    pub fn key(&self) -> String {
        format!("{}:{}", self.scheme, self.source)
    }

    pub async fn decrypt(
        &self,
        counterparty: &str,
        ciphertext: &str,
        ctx: StageContext<'_>,
    ) -> Result<Option<String>, BackendError> {
        self.decryptor.decrypt(counterparty, ciphertext, ctx).await
    }
}

impl std::fmt::Debug for DecryptorCandidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecryptorCandidate")
            .field("scheme", &self.scheme)
            .field("priority", &self.priority)
            .field("supports_gift_wrap", &self.supports_gift_wrap)
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

/// Normalize candidate schemes and, when `infer_gift_wrap` is set, mark every
/// modern-scheme candidate as gift-wrap capable.
pub fn prepare_candidates(
    raw: &[DecryptorCandidate],
    infer_gift_wrap: bool,
) -> Vec<DecryptorCandidate> {
    raw.iter()
        .map(|candidate| {
            let scheme = normalize_scheme(&candidate.scheme);
            let supports_gift_wrap = candidate.supports_gift_wrap
                || (infer_gift_wrap && scheme.starts_with(SCHEME_NIP44));
            DecryptorCandidate {
                scheme,
                supports_gift_wrap,
                source: candidate.source.trim().to_string(),
                ..candidate.clone()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Nothing;

    #[async_trait]
    impl Decryptor for Nothing {
        async fn decrypt(
            &self,
            _counterparty: &str,
            _ciphertext: &str,
            _ctx: StageContext<'_>,
        ) -> Result<Option<String>, BackendError> {
            Ok(None)
        }
    }

    #[test]
    fn test_prepare_normalizes_and_infers() {
        let raw = vec![
            DecryptorCandidate::from_decryptor(Nothing).with_scheme("NIP-44"),
            DecryptorCandidate::from_decryptor(Nothing).with_scheme("nip44-v2"),
            DecryptorCandidate::from_decryptor(Nothing).with_scheme("nip-04"),
            DecryptorCandidate::from_decryptor(Nothing)
                .with_scheme("custom")
                .with_gift_wrap(true),
        ];

        let prepared = prepare_candidates(&raw, true);
        let schemes: Vec<_> = prepared.iter().map(|c| c.scheme.as_str()).collect();
        assert_eq!(schemes, vec!["nip44", "nip44_v2", "nip04", "custom"]);
        let wraps: Vec<_> = prepared.iter().map(|c| c.supports_gift_wrap).collect();
        assert_eq!(wraps, vec![true, true, false, true]);
    }

    #[test]
    fn test_prepare_without_inference() {
        let raw = vec![DecryptorCandidate::from_decryptor(Nothing).with_scheme("nip44")];
        let prepared = prepare_candidates(&raw, false);
        assert!(!prepared[0].supports_gift_wrap);
    }

    #[tokio::test]
    async fn test_candidate_delegates_to_backend() {
        let event = NostrEvent::new(4, "aa".repeat(32), "x");
        let candidate = DecryptorCandidate::from_decryptor(Nothing).with_source("unit");
        let ctx = StageContext {
            event: StageEvent::Message(&event),
            stage: Stage::Content,
        };
        assert_eq!(candidate.decrypt("peer", "x", ctx).await, Ok(None));
        assert_eq!(candidate.key(), ":unit");
        assert_eq!(ctx.event.pubkey(), event.pubkey);
        assert_eq!(ctx.event.id(), Some(""));
    }
}

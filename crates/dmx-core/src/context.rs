//! Decrypt context assembly.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use crate::actor::{ActorKeyNormalizer, HexKeyNormalizer};
use crate::candidate::DecryptorCandidate;
use crate::normalize::normalize_scheme;

/// Everything the pipeline needs besides the event itself.
#[derive(Debug, Clone, Default)]
pub struct DecryptContext {
    /// Acting user's key; normalized again by the pipeline
    pub actor_pubkey: String,
    /// Candidates in registration order
    pub decryptors: Vec<DecryptorCandidate>,
}

impl DecryptContext {
    pub fn new(actor_pubkey: impl Into<String>, decryptors: Vec<DecryptorCandidate>) -> Self {
        Self {
            actor_pubkey: actor_pubkey.into(),
            decryptors,
        }
    }
}

/// Builds a [`DecryptContext`] from an actor key, fallback keys and candidates.
///
/// The first actor key that normalizes to something non-empty wins. Candidates
/// are deduplicated by normalized `scheme:source`; the first registration of a
/// key is kept.
pub struct DecryptContextBuilder {
    normalizer: Arc<dyn ActorKeyNormalizer>,
    actors: Vec<String>,
    candidates: Vec<DecryptorCandidate>,
}

impl Default for DecryptContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DecryptContextBuilder {
    pub fn new() -> Self {
        Self {
            normalizer: Arc::new(HexKeyNormalizer),
            actors: Vec::new(),
            candidates: Vec::new(),
        }
    }

    pub fn with_normalizer(mut self, normalizer: Arc<dyn ActorKeyNormalizer>) -> Self {
        self.normalizer = normalizer;
        self
    }

    /// Preferred actor key. Takes precedence over every fallback.
    pub fn actor(mut self, key: impl Into<String>) -> Self {
        self.actors.insert(0, key.into());
        self
    }

    /// Actor key used when every earlier key is blank.
    pub fn fallback_actor(mut self, key: impl Into<String>) -> Self {
        self.actors.push(key.into());
        self
    }

    pub fn candidate(mut self, candidate: DecryptorCandidate) -> Self {
        self.candidates.push(candidate);
        self
    }

    pub fn candidates<I>(mut self, candidates: I) -> Self
    where
        I: IntoIterator<Item = DecryptorCandidate>,
    {
        self.candidates.extend(candidates);
        self
    }

    pub fn build(self) -> DecryptContext {
        let actor_pubkey = self
            .actors
            .iter()
            .find_map(|key| self.normalizer.normalize(key))
            .unwrap_or_default();

        let mut seen = HashSet::new();
        let mut decryptors = Vec::with_capacity(self.candidates.len());
        for candidate in self.candidates {
            let key = format!(
                "{}:{}",
                normalize_scheme(&candidate.scheme),
                candidate.source.trim()
            );
            if seen.insert(key.clone()) {
                decryptors.push(candidate);
            } else {
                debug!("skipping duplicate decryptor {}", key);
            }
        }

        DecryptContext {
            actor_pubkey,
            decryptors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::Bech32KeyNormalizer;
    use crate::harness::{hex_key, NoResultDecryptor};

    fn candidate(scheme: &str, source: &str, priority: i32) -> DecryptorCandidate {
        DecryptorCandidate::from_decryptor(NoResultDecryptor)
            .with_scheme(scheme)
            .with_source(source)
            .with_priority(priority)
    }

    #[test]
    fn test_first_non_empty_actor_wins() {
        let ctx = DecryptContextBuilder::new()
            .fallback_actor("   ")
            .fallback_actor(hex_key(2).to_uppercase())
            .fallback_actor(hex_key(3))
            .build();
        assert_eq!(ctx.actor_pubkey, hex_key(2));

        let ctx = DecryptContextBuilder::new()
            .fallback_actor(hex_key(3))
            .actor(hex_key(1))
            .build();
        assert_eq!(ctx.actor_pubkey, hex_key(1));
    }

    #[test]
    fn test_no_actor_is_empty() {
        let ctx = DecryptContextBuilder::new().actor("").build();
        assert!(ctx.actor_pubkey.is_empty());
    }

    #[test]
    fn test_dedupes_by_scheme_and_source() {
        let ctx = DecryptContextBuilder::new()
            .candidate(candidate("nip44", "signer", 0))
            .candidate(candidate("NIP-44", "signer ", 7))
            .candidate(candidate("nip44", "session", 1))
            .candidate(candidate("nip04", "signer", 2))
            .build();

        let keys: Vec<_> = ctx.decryptors.iter().map(|c| (c.key(), c.priority)).collect();
        assert_eq!(
            keys,
            vec![
                ("nip44:signer".to_string(), 0),
                ("nip44:session".to_string(), 1),
                ("nip04:signer".to_string(), 2),
            ]
        );
    }

    #[test]
    fn test_bech32_normalizer_applies() {
        use bech32::{ToBase32, Variant};

        let npub = bech32::encode(
            crate::actor::NPUB_HRP,
            [0x11u8; 32].to_base32(),
            Variant::Bech32,
        )
        .unwrap();
        let ctx = DecryptContextBuilder::new()
            .with_normalizer(Arc::new(Bech32KeyNormalizer))
            .actor(npub)
            .build();
        assert_eq!(ctx.actor_pubkey, hex_key(0x11));
    }
}

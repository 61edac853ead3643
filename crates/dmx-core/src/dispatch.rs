//! Direct-message dispatch.
//!
//! Validates the incoming event, prepares the decryptor candidates and hands
//! the event to the legacy or gift-wrap flow according to its kind. Every path
//! ends in a [`DecryptResult`]; nothing here returns `Err`.
//!
//! [`decrypt_dm`] is the stateless entry point. [`DmDecryptor`] wraps the same
//! pipeline with configuration, statistics and a result cache.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use dmx_proto::validation::validate_event_shape;
use dmx_proto::{DmKind, NostrEvent, ValidationError};

use crate::actor::{ActorKeyNormalizer, HexKeyNormalizer};
use crate::cache::DecryptCache;
use crate::candidate::prepare_candidates;
use crate::config::DecryptConfig;
use crate::context::DecryptContext;
use crate::errors::{AttemptError, DecryptError, Stage};
use crate::gift_wrap::decrypt_gift_wrap;
use crate::legacy::{decrypt_legacy_dm, short_id};
use crate::order::{order_decryptors, OrderOptions};
use crate::result::{build_decrypt_result, DecryptResult, ResultParts};

// ============================================================================
// Pipeline
// ============================================================================

/// Decrypt a DM event with default configuration.
pub async fn decrypt_dm(event: &NostrEvent, context: &DecryptContext) -> DecryptResult {
    run_pipeline(
        event,
        context,
        &DecryptConfig::default(),
        &HexKeyNormalizer,
    )
    .await
}

async fn run_pipeline(
    event: &NostrEvent,
    context: &DecryptContext,
    config: &DecryptConfig,
    normalizer: &dyn ActorKeyNormalizer,
) -> DecryptResult {
    let actor_pubkey = normalizer
        .normalize(&context.actor_pubkey)
        .unwrap_or_default();

    let Some(kind) = DmKind::from_kind(event.kind) else {
        debug!("event {} has unsupported kind {}", short_id(&event.id), event.kind);
        return fail(
            Some(event),
            &actor_pubkey,
            Stage::Input,
            DecryptError::UnsupportedKind(event.kind),
        );
    };

    let candidates = prepare_candidates(&context.decryptors, config.infer_gift_wrap_from_scheme);
    if candidates.is_empty() {
        warn!("no decryptors supplied for event {}", short_id(&event.id));
        return fail(
            Some(event),
            &actor_pubkey,
            Stage::Decryptor,
            DecryptError::NoDecryptors,
        );
    }

    match kind {
        DmKind::GiftWrap => {
            let ordered = order_decryptors(
                &candidates,
                None,
                OrderOptions {
                    prefer_gift_wrap: true,
                },
            );
            let capable: Vec<_> = ordered
                .into_iter()
                .filter(|candidate| candidate.supports_gift_wrap)
                .collect();

            if capable.is_empty() {
                warn!(
                    "none of {} decryptors can open gift wrap {}",
                    candidates.len(),
                    short_id(&event.id)
                );
                return fail(
                    Some(event),
                    &actor_pubkey,
                    Stage::Decryptor,
                    DecryptError::NoGiftWrapDecryptors,
                );
            }

            decrypt_gift_wrap(event, &capable, &actor_pubkey, &config.gift_wrap_scheme).await
        }
        DmKind::LegacyDm => decrypt_legacy_dm(event, &candidates, &actor_pubkey).await,
    }
}

fn fail(
    event: Option<&NostrEvent>,
    actor_pubkey: &str,
    stage: Stage,
    error: DecryptError,
) -> DecryptResult {
    build_decrypt_result(ResultParts::failure(
        event,
        actor_pubkey,
        vec![AttemptError::new(stage, error)],
    ))
}

/// Check the shape of untyped input and convert it into an event.
///
/// Only the object shape and an integer `kind` are required; every other field
/// is read leniently and checked later by the flow that needs it.
pub fn event_from_value(value: &Value) -> Result<NostrEvent, ValidationError> {
    validate_event_shape(value)?;
    NostrEvent::from_value_lenient(value).ok_or(ValidationError::NotAnObject)
}

// ============================================================================
// Statistics
// ============================================================================

/// Decrypt statistics.
#[derive(Debug, Default)]
pub struct DecryptStats {
    /// Total events received
    pub received: AtomicU64,
    /// Events decrypted (cache hits included)
    pub succeeded: AtomicU64,
    /// Events that produced `ok: false`
    pub failed: AtomicU64,
    /// Individual failed attempts recorded in results
    pub attempt_failures: AtomicU64,
    /// Results served from the cache
    pub cache_hits: AtomicU64,
}

impl DecryptStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a snapshot of current statistics.
    pub fn snapshot(&self) -> DecryptStatsSnapshot {
        DecryptStatsSnapshot {
            received: self.received.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            attempt_failures: self.attempt_failures.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
        }
    }

    /// Reset all statistics to zero.
    pub fn reset(&self) {
        self.received.store(0, Ordering::Relaxed);
        self.succeeded.store(0, Ordering::Relaxed);
        self.failed.store(0, Ordering::Relaxed);
        self.attempt_failures.store(0, Ordering::Relaxed);
        self.cache_hits.store(0, Ordering::Relaxed);
    }

    fn inc_received(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
    }

    fn inc_cache_hits(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
        self.succeeded.fetch_add(1, Ordering::Relaxed);
    }

    fn record(&self, result: &DecryptResult) {
        if result.ok {
            self.succeeded.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
        self.attempt_failures
            .fetch_add(result.errors.len() as u64, Ordering::Relaxed);
    }
}

/// Snapshot of decrypt statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecryptStatsSnapshot {
    pub received: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub attempt_failures: u64,
    pub cache_hits: u64,
}

// ============================================================================
// Decrypt Service
// ============================================================================

/// Configured DM decryption service.
///
/// Holds no per-conversation state; concurrent calls share only the
/// statistics counters and the result cache.
pub struct DmDecryptor {
    config: DecryptConfig,
    normalizer: Arc<dyn ActorKeyNormalizer>,
    stats: Arc<DecryptStats>,
    cache: Option<DecryptCache>,
}

impl Default for DmDecryptor {
    fn default() -> Self {
        Self::new(DecryptConfig::default())
    }
}

impl DmDecryptor {
    pub fn new(config: DecryptConfig) -> Self {
        let cache = (config.cache_capacity > 0).then(|| DecryptCache::new(config.cache_capacity));
        Self {
            config,
            normalizer: Arc::new(HexKeyNormalizer),
            stats: Arc::new(DecryptStats::new()),
            cache,
        }
    }

    /// Replace the actor key normalizer.
    pub fn with_normalizer(mut self, normalizer: Arc<dyn ActorKeyNormalizer>) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn config(&self) -> &DecryptConfig {
        &self.config
    }

    /// Get the decrypt statistics.
    pub fn stats(&self) -> &Arc<DecryptStats> {
        &self.stats
    }

    /// Decrypt one event.
    pub async fn decrypt(&self, event: &NostrEvent, context: &DecryptContext) -> DecryptResult {
        self.stats.inc_received();

        let actor_pubkey = self
            .normalizer
            .normalize(&context.actor_pubkey)
            .unwrap_or_default();

        // An empty candidate list always fails at the decryptor stage.
        let cache = self.cache.as_ref().filter(|_| !context.decryptors.is_empty());

        if let Some(cache) = cache {
            if let Some(hit) = cache.get(&actor_pubkey, event).await {
                debug!("cache hit for event {}", short_id(&event.id));
                self.stats.inc_cache_hits();
                return hit;
            }
        }

        let result = run_pipeline(event, context, &self.config, self.normalizer.as_ref()).await;
        self.stats.record(&result);

        if let Some(cache) = cache {
            cache.insert(&result).await;
        }

        result
    }

    /// Decrypt an event supplied as untyped JSON.
    ///
    /// Input that is not an object, or lacks an integer `kind`, fails at stage
    /// `input`; for non-objects the result carries no `event`.
    pub async fn decrypt_value(&self, value: &Value, context: &DecryptContext) -> DecryptResult {
        match event_from_value(value) {
            Ok(event) => self.decrypt(&event, context).await,
            Err(e) => {
                self.stats.inc_received();
                warn!("rejecting malformed event: {}", e);

                let actor_pubkey = self
                    .normalizer
                    .normalize(&context.actor_pubkey)
                    .unwrap_or_default();
                let event = NostrEvent::from_value_lenient(value);
                let result = fail(
                    event.as_ref(),
                    &actor_pubkey,
                    Stage::Input,
                    DecryptError::InvalidEvent(e),
                );
                self.stats.record(&result);
                result
            }
        }
    }

    /// Drop every cached result.
    pub async fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.clear().await;
        }
    }
}

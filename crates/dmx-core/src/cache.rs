//! In-memory cache of successful decrypt results.
//!
//! Entries are keyed by the hex actor key and event id, so one event decrypted
//! for two identities yields two entries. A lookup only hits when the cached
//! result was produced from an identical event; a different event reusing an
//! id goes through the pipeline again. Only successful results are stored, and
//! the least recently used entry is evicted once the capacity is reached.
//! Nothing is persisted.

use std::num::NonZeroUsize;

use lru::LruCache;
use tokio::sync::Mutex;

use dmx_proto::NostrEvent;

use crate::normalize::normalize_hex;
use crate::result::DecryptResult;

type CacheKey = (String, String);

fn cache_key(actor_pubkey: &str, event_id: &str) -> CacheKey {
    (
        normalize_hex(actor_pubkey).unwrap_or_default(),
        event_id.to_string(),
    )
}

/// Bounded LRU cache of `ok` results.
pub struct DecryptCache {
    capacity: usize,
    inner: Option<Mutex<LruCache<CacheKey, DecryptResult>>>,
}

impl DecryptCache {
    /// Create a cache holding at most `capacity` results; `0` stores nothing.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            inner: NonZeroUsize::new(capacity).map(|cap| Mutex::new(LruCache::new(cap))),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Cached result for `event` as seen by `actor_pubkey`.
    ///
    /// A hit marks the entry as most recently used.
    pub async fn get(&self, actor_pubkey: &str, event: &NostrEvent) -> Option<DecryptResult> {
        let inner = self.inner.as_ref()?;
        if event.id.is_empty() {
            return None;
        }

        let mut cache = inner.lock().await;
        cache
            .get(&cache_key(actor_pubkey, &event.id))
            .filter(|hit| hit.event.as_ref() == Some(event))
            .cloned()
    }

    /// Store `result` if it succeeded and its event has an id.
    ///
    /// Returns whether the result was stored.
    pub async fn insert(&self, result: &DecryptResult) -> bool {
        let Some(inner) = self.inner.as_ref() else {
            return false;
        };
        if !result.ok {
            return false;
        }
        let Some(event_id) = result.event.as_ref().map(|e| e.id.as_str()) else {
            return false;
        };
        if event_id.is_empty() {
            return false;
        }

        let key = cache_key(&result.actor_pubkey, event_id);
        inner.lock().await.put(key, result.clone());
        true
    }

    pub async fn clear(&self) {
        if let Some(inner) = &self.inner {
            inner.lock().await.clear();
        }
    }

    pub async fn len(&self) -> usize {
        match &self.inner {
            Some(inner) => inner.lock().await.len(),
            None => 0,
        }
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

//! Test harness for DMX core functionality.
//!
//! Provides a reversible toy cipher, decryptor backends with scripted
//! behaviour, and fixture builders for legacy DMs and gift wraps. The toy
//! cipher offers no secrecy; it only binds a ciphertext to a scheme and to the
//! counterparty key a reader must present, which is enough to exercise
//! candidate selection.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use dmx_proto::kinds::{GIFT_WRAP_KIND, LEGACY_DM_KIND, SEAL_KIND};
use dmx_proto::NostrEvent;

use crate::candidate::{Decryptor, StageContext};
use crate::errors::BackendError;

/// Kind used for rumors built by [`gift_wrap`].
pub const RUMOR_KIND: u32 = 14;

/// Fixed creation time of fixtures.
pub const FIXTURE_CREATED_AT: u64 = 1_700_000_000;

/// A 64-hex key made of one repeated byte.
pub fn hex_key(byte: u8) -> String {
    hex::encode([byte; 32])
}

/// Reversible stand-in for a real scheme.
pub struct ToyCipher;

impl ToyCipher {
    /// Encrypt `plaintext` so that it opens for `scheme` and `counterparty`.
    pub fn encrypt(scheme: &str, counterparty: &str, plaintext: &str) -> String {
        format!("{}|{}|{}", scheme, counterparty, hex::encode(plaintext))
    }

    pub fn decrypt(
        scheme: &str,
        counterparty: &str,
        ciphertext: &str,
    ) -> Result<String, BackendError> {
        let mut parts = ciphertext.splitn(3, '|');
        let (Some(ct_scheme), Some(ct_peer), Some(body)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(BackendError::Failed("malformed ciphertext".into()));
        };

        if ct_scheme != scheme {
            return Err(BackendError::Failed(format!("scheme mismatch: {}", ct_scheme)));
        }
        if ct_peer != counterparty {
            return Err(BackendError::Failed("wrong counterparty key".into()));
        }

        let bytes = hex::decode(body).map_err(|e| BackendError::Failed(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| BackendError::Failed(e.to_string()))
    }
}

/// Decryptor backed by [`ToyCipher`] for one scheme.
pub struct ToyDecryptor {
    scheme: String,
    only_for: Option<String>,
}

impl ToyDecryptor {
    pub fn new(scheme: &str) -> Self {
        Self {
            scheme: scheme.to_string(),
            only_for: None,
        }
    }

    /// Refuse every counterparty except `counterparty`.
    pub fn only_for(mut self, counterparty: &str) -> Self {
        self.only_for = Some(counterparty.to_string());
        self
    }
}

#[async_trait]
impl Decryptor for ToyDecryptor {
    async fn decrypt(
        &self,
        counterparty: &str,
        ciphertext: &str,
        _ctx: StageContext<'_>,
    ) -> Result<Option<String>, BackendError> {
        if let Some(allowed) = &self.only_for {
            if allowed != counterparty {
                return Err(BackendError::Rejected);
            }
        }
        ToyCipher::decrypt(&self.scheme, counterparty, ciphertext).map(Some)
    }
}

/// Decryptor that always fails.
pub struct FailingDecryptor {
    reason: String,
}

impl FailingDecryptor {
    pub fn new(reason: &str) -> Self {
        Self {
            reason: reason.to_string(),
        }
    }
}

#[async_trait]
impl Decryptor for FailingDecryptor {
    async fn decrypt(
        &self,
        _counterparty: &str,
        _ciphertext: &str,
        _ctx: StageContext<'_>,
    ) -> Result<Option<String>, BackendError> {
        Err(BackendError::Failed(self.reason.clone()))
    }
}

/// Decryptor that never produces a result.
pub struct NoResultDecryptor;

#[async_trait]
impl Decryptor for NoResultDecryptor {
    async fn decrypt(
        &self,
        _counterparty: &str,
        _ciphertext: &str,
        _ctx: StageContext<'_>,
    ) -> Result<Option<String>, BackendError> {
        Ok(None)
    }
}

/// Decryptor that returns the same output for every call.
pub struct FixedDecryptor {
    output: Option<String>,
}

impl FixedDecryptor {
    pub fn new(output: Option<&str>) -> Self {
        Self {
            output: output.map(str::to_owned),
        }
    }
}

#[async_trait]
impl Decryptor for FixedDecryptor {
    async fn decrypt(
        &self,
        _counterparty: &str,
        _ciphertext: &str,
        _ctx: StageContext<'_>,
    ) -> Result<Option<String>, BackendError> {
        Ok(self.output.clone())
    }
}

/// Shared log of `label:stage` entries, one per decrypt call.
pub type CallLog = Arc<Mutex<Vec<String>>>;

/// Wraps another decryptor, logging each call and optionally sleeping first.
pub struct RecordingDecryptor {
    label: String,
    inner: Arc<dyn Decryptor>,
    log: CallLog,
    delay: Option<Duration>,
}

impl RecordingDecryptor {
    pub fn new(label: &str, inner: Arc<dyn Decryptor>, log: CallLog) -> Self {
        Self {
            label: label.to_string(),
            inner,
            log,
            delay: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl Decryptor for RecordingDecryptor {
    async fn decrypt(
        &self,
        counterparty: &str,
        ciphertext: &str,
        ctx: StageContext<'_>,
    ) -> Result<Option<String>, BackendError> {
        if let Ok(mut log) = self.log.lock() {
            log.push(format!("{}:{}", self.label, ctx.stage));
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.inner.decrypt(counterparty, ciphertext, ctx).await
    }
}

/// Legacy DM from `sender` to `recipient` encrypted with the toy cipher.
pub fn legacy_dm(scheme: &str, sender: &str, recipient: &str, plaintext: &str) -> NostrEvent {
    NostrEvent::new(
        LEGACY_DM_KIND,
        sender,
        ToyCipher::encrypt(scheme, sender, plaintext),
    )
    .with_id(hex::encode([0x44; 32]))
    .with_created_at(FIXTURE_CREATED_AT)
    .with_tag(["p", recipient])
}

/// The three layers of a gift wrap built by [`gift_wrap`].
#[derive(Debug, Clone)]
pub struct GiftWrapFixture {
    pub wrap: NostrEvent,
    pub seal_json: String,
    pub rumor_json: String,
}

/// Gift wrap from `sender` to `recipient`, wrapped under `wrap_key`.
pub fn gift_wrap(
    scheme: &str,
    wrap_key: &str,
    sender: &str,
    recipient: &str,
    plaintext: &str,
) -> GiftWrapFixture {
    let rumor_json = json!({
        "id": hex::encode([0x14; 32]),
        "kind": RUMOR_KIND,
        "pubkey": sender,
        "content": plaintext,
        "created_at": FIXTURE_CREATED_AT + 5,
        "tags": [["p", recipient]],
    })
    .to_string();

    let seal_json = json!({
        "id": hex::encode([0x13; 32]),
        "kind": SEAL_KIND,
        "pubkey": sender,
        "content": ToyCipher::encrypt(scheme, sender, &rumor_json),
        "created_at": FIXTURE_CREATED_AT,
        "tags": [],
    })
    .to_string();

    let wrap = NostrEvent::new(
        GIFT_WRAP_KIND,
        wrap_key,
        ToyCipher::encrypt(scheme, wrap_key, &seal_json),
    )
    .with_id(hex::encode([0x59; 32]))
    .with_created_at(FIXTURE_CREATED_AT)
    .with_tag(["p", recipient]);

    GiftWrapFixture {
        wrap,
        seal_json,
        rumor_json,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toy_cipher_binds_scheme_and_peer() {
        let ct = ToyCipher::encrypt("nip44", "peer", "hi | there");
        assert_eq!(ToyCipher::decrypt("nip44", "peer", &ct).unwrap(), "hi | there");
        assert!(ToyCipher::decrypt("nip04", "peer", &ct).is_err());
        assert!(ToyCipher::decrypt("nip44", "other", &ct).is_err());
        assert!(ToyCipher::decrypt("nip44", "peer", "garbage").is_err());
    }

    #[test]
    fn test_gift_wrap_layers_open_in_sequence() {
        let fixture = gift_wrap("nip44", &hex_key(9), &hex_key(1), &hex_key(2), "hello");
        let seal = ToyCipher::decrypt("nip44", &hex_key(9), &fixture.wrap.content).unwrap();
        assert_eq!(seal, fixture.seal_json);
    }
}

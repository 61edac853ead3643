//! Actor key normalization.
//!
//! The acting user's key may arrive as hex or in an encoded form; turning it
//! into hex is the job of an [`ActorKeyNormalizer`] supplied by the caller.

use bech32::FromBase32;
use tracing::warn;

/// Human-readable prefix of bech32-encoded public keys.
pub const NPUB_HRP: &str = "npub";

/// Trait for turning a caller-supplied actor key into lowercase hex.
pub trait ActorKeyNormalizer: Send + Sync {
    /// Normalized key, or `None` for blank input.
    ///
    /// Input that cannot be converted is returned lowercased rather than
    /// rejected; later hex checks treat it as an unknown actor.
    fn normalize(&self, raw: &str) -> Option<String>;
}

/// Accepts hex keys only.
#[derive(Debug, Clone, Copy, Default)]
pub struct HexKeyNormalizer;

impl ActorKeyNormalizer for HexKeyNormalizer {
    fn normalize(&self, raw: &str) -> Option<String> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(trimmed.to_lowercase())
    }
}

/// Accepts hex keys and `npub1...` bech32 keys.
#[derive(Debug, Clone, Copy, Default)]
pub struct Bech32KeyNormalizer;

impl Bech32KeyNormalizer {
    fn decode_npub(value: &str) -> Result<String, String> {
        let (hrp, data, _variant) = bech32::decode(value).map_err(|e| e.to_string())?;
        if hrp != NPUB_HRP {
            return Err(format!("unexpected prefix {}", hrp));
        }
        let bytes = Vec::<u8>::from_base32(&data).map_err(|e| e.to_string())?;
        if bytes.len() != 32 {
            return Err(format!("expected 32 key bytes, got {}", bytes.len()));
        }
        Ok(hex::encode(bytes))
    }
}

impl ActorKeyNormalizer for Bech32KeyNormalizer {
    fn normalize(&self, raw: &str) -> Option<String> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }

        let lowered = trimmed.to_lowercase();
        if lowered.starts_with(NPUB_HRP) {
            match Self::decode_npub(&lowered) {
                Ok(hex_key) => return Some(hex_key),
                Err(e) => warn!("failed to decode actor key: {}", e),
            }
        }

        Some(lowered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bech32::{ToBase32, Variant};

    fn npub(bytes: &[u8]) -> String {
        bech32::encode(NPUB_HRP, bytes.to_base32(), Variant::Bech32).unwrap()
    }

    #[test]
    fn test_hex_normalizer() {
        let key = "AB".repeat(32);
        assert_eq!(HexKeyNormalizer.normalize(&format!(" {} ", key)), Some("ab".repeat(32)));
        assert_eq!(HexKeyNormalizer.normalize("   "), None);
        assert_eq!(HexKeyNormalizer.normalize("Alias"), Some("alias".to_string()));
    }

    #[test]
    fn test_bech32_normalizer_decodes_npub() {
        let encoded = npub(&[0x7f; 32]);
        assert_eq!(
            Bech32KeyNormalizer.normalize(&encoded),
            Some(hex::encode([0x7f; 32]))
        );
        assert_eq!(
            Bech32KeyNormalizer.normalize(&encoded.to_uppercase()),
            Some(hex::encode([0x7f; 32]))
        );
    }

    #[test]
    fn test_bech32_normalizer_falls_back() {
        let short = npub(&[1; 16]);
        assert_eq!(Bech32KeyNormalizer.normalize(&short), Some(short.clone()));
        assert_eq!(
            Bech32KeyNormalizer.normalize("npub1garbage"),
            Some("npub1garbage".to_string())
        );
        assert_eq!(
            Bech32KeyNormalizer.normalize(&"CD".repeat(32)),
            Some("cd".repeat(32))
        );
    }
}

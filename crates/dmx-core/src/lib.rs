//! DMX Core - Decryption pipeline for private direct messages.
//!
//! This crate implements:
//! - Scheme and hex key normalization
//! - Encryption hint and recipient tag parsing
//! - Decryptor candidate preparation and ordering
//! - The legacy single-layer flow and the wrap → seal → rumor gift-wrap flow
//! - Uniform result assembly with direction derivation
//! - A configured decrypt service with statistics and a result cache

#![forbid(unsafe_code)]

// Parsing and normalization
pub mod normalize;
pub mod hints;
pub mod recipients;
pub mod actor;

// Candidates
pub mod candidate;
pub mod order;
pub mod context;

// Flows
pub mod legacy;
pub mod gift_wrap;
pub mod result;

// Services
pub mod dispatch;
pub mod cache;
pub mod config;

// Supporting modules
pub mod errors;
pub mod harness;

#[cfg(test)]
mod proptests;

pub use actor::{ActorKeyNormalizer, Bech32KeyNormalizer, HexKeyNormalizer};
pub use candidate::{Decryptor, DecryptorCandidate, StageContext, StageEvent};
pub use config::{ConfigError, DecryptConfig};
pub use context::{DecryptContext, DecryptContextBuilder};
pub use dispatch::{decrypt_dm, DecryptStats, DecryptStatsSnapshot, DmDecryptor};
pub use errors::{AttemptError, BackendError, DecryptError, Stage};
pub use result::{DecryptResult, Direction};

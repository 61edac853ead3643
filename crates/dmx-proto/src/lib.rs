//! DMX Proto - event data model for direct-message decryption.
//!
//! This crate defines:
//! - The message event as delivered by a relay (`NostrEvent`)
//! - A partially-validated record for decrypted seal/rumor payloads (`PartialEvent`)
//! - Supported kind constants
//! - Field validation helpers

#![forbid(unsafe_code)]

pub mod event;
pub mod kinds;
pub mod validation;

#[cfg(test)]
mod proptests;

pub use event::{NostrEvent, PartialEvent, Tag};
pub use kinds::DmKind;
pub use validation::ValidationError;

//! Event kinds understood by the decryption pipeline.

/// Legacy encrypted direct message (single layer).
pub const LEGACY_DM_KIND: u32 = 4;

/// Seal: middle layer of a gift wrap, signed by the real sender.
pub const SEAL_KIND: u32 = 13;

/// Gift wrap: outer layer published under a disposable key.
pub const GIFT_WRAP_KIND: u32 = 1059;

/// Direct-message kinds accepted by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DmKind {
    LegacyDm,
    GiftWrap,
}

impl DmKind {
    /// Map a raw kind number to a supported DM kind.
    pub fn from_kind(kind: u32) -> Option<Self> {
        match kind {
            LEGACY_DM_KIND => Some(DmKind::LegacyDm),
            GIFT_WRAP_KIND => Some(DmKind::GiftWrap),
            _ => None,
        }
    }

    pub fn as_u32(self) -> u32 {
        match self {
            DmKind::LegacyDm => LEGACY_DM_KIND,
            DmKind::GiftWrap => GIFT_WRAP_KIND,
        }
    }
}

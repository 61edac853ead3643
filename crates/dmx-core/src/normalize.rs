//! Normalizers for hex keys and scheme names.

use dmx_proto::validation::is_hex_pubkey;

/// Modern AEAD scheme.
pub const SCHEME_NIP44: &str = "nip44";
/// Second revision of the modern scheme.
pub const SCHEME_NIP44_V2: &str = "nip44_v2";
/// Legacy symmetric scheme.
pub const SCHEME_NIP04: &str = "nip04";

/// Trim and lowercase a hex key; `None` unless it is exactly 64 hex digits.
pub fn normalize_hex(candidate: &str) -> Option<String> {
    let trimmed = candidate.trim().to_ascii_lowercase();
    if is_hex_pubkey(&trimmed) {
        Some(trimmed)
    } else {
        None
    }
}

/// Canonical scheme name. Known aliases collapse to one spelling; unknown
/// names pass through trimmed and lowercased.
pub fn normalize_scheme(scheme: &str) -> String {
    let normalized = scheme.trim().to_lowercase();
    match normalized.as_str() {
        "nip44_v2" | "nip44-v2" => SCHEME_NIP44_V2.to_string(),
        "nip44" | "nip-44" => SCHEME_NIP44.to_string(),
        "nip04" | "nip-04" => SCHEME_NIP04.to_string(),
        _ => normalized,
    }
}

/// True for the modern scheme and its revision.
pub fn is_modern_scheme(scheme: &str) -> bool {
    scheme == SCHEME_NIP44 || scheme == SCHEME_NIP44_V2
}

/// The other member of the modern scheme pair, if `scheme` belongs to it.
///
/// Used for ordering only: hinting one revision favours both. It says nothing
/// about whether a backend for one revision can decrypt the other.
pub fn related_scheme(scheme: &str) -> Option<&'static str> {
    match scheme {
        SCHEME_NIP44 => Some(SCHEME_NIP44_V2),
        SCHEME_NIP44_V2 => Some(SCHEME_NIP44),
        _ => None,
    }
}

/// Rank of a scheme nobody hinted: modern < legacy < unknown.
pub fn base_scheme_rank(scheme: &str) -> usize {
    if is_modern_scheme(scheme) {
        0
    } else if scheme == SCHEME_NIP04 {
        5
    } else {
        10
    }
}

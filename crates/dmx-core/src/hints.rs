//! Sender-declared encryption hints.
//!
//! A sender may attach `["encrypted", "nip44 nip04"]` to say which schemes it
//! used, most preferred first. The hints only reorder candidates; a candidate
//! for an unhinted scheme is still tried.

use serde::Serialize;

use dmx_proto::Tag;

use crate::normalize::normalize_scheme;

/// Tag marker carrying scheme hints.
pub const ENCRYPTED_TAG: &str = "encrypted";

/// Ordered, deduplicated scheme names declared by the sender.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EncryptionHints {
    pub algorithms: Vec<String>,
}

impl EncryptionHints {
    /// Position of `scheme` in the declared preference order.
    pub fn rank_of(&self, scheme: &str) -> Option<usize> {
        self.algorithms.iter().position(|a| a == scheme)
    }

    /// Most preferred declared scheme.
    pub fn preferred(&self) -> Option<&str> {
        self.algorithms.first().map(String::as_str)
    }
}

/// Collect scheme hints from every `encrypted` tag, in order of appearance.
pub fn parse_encryption_hints(tags: &[Tag]) -> EncryptionHints {
    let mut algorithms: Vec<String> = Vec::new();

    for tag in tags {
        if tag.len() < 2 || tag[0] != ENCRYPTED_TAG {
            continue;
        }

        for value in &tag[1..] {
            for part in value.split_whitespace() {
                let normalized = normalize_scheme(part);
                if !normalized.is_empty() && !algorithms.contains(&normalized) {
                    algorithms.push(normalized);
                }
            }
        }
    }

    EncryptionHints { algorithms }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(items: &[&str]) -> Tag {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_whitespace_separated_values() {
        let tags = vec![tag(&["encrypted", "NIP-44  nip04"]), tag(&["p", "x"])];
        let hints = parse_encryption_hints(&tags);
        assert_eq!(hints.algorithms, vec!["nip44", "nip04"]);
        assert_eq!(hints.preferred(), Some("nip44"));
    }

    #[test]
    fn test_parse_dedupes_across_tags() {
        let tags = vec![
            tag(&["encrypted", "nip04", "nip44-v2"]),
            tag(&["encrypted", "nip04 custom"]),
        ];
        let hints = parse_encryption_hints(&tags);
        assert_eq!(hints.algorithms, vec!["nip04", "nip44_v2", "custom"]);
        assert_eq!(hints.rank_of("custom"), Some(2));
        assert_eq!(hints.rank_of("nip44"), None);
    }

    #[test]
    fn test_marker_without_values_is_ignored() {
        let tags = vec![tag(&["encrypted"]), tag(&["encrypted", "   "])];
        assert_eq!(parse_encryption_hints(&tags), EncryptionHints::default());
    }
}

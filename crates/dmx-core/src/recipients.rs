//! Participant extraction from `p` tags.

use serde::Serialize;

use dmx_proto::Tag;

use crate::normalize::normalize_hex;

/// Tag marker naming a participant.
pub const PUBKEY_TAG: &str = "p";

/// Role of a participant in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Sender,
    Recipient,
}

/// A conversation participant with the relays it was hinted at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub pubkey: String,
    pub relay_hints: Vec<String>,
    pub role: Role,
}

impl Participant {
    pub fn sender(pubkey: impl Into<String>) -> Self {
        Self {
            pubkey: pubkey.into(),
            relay_hints: Vec::new(),
            role: Role::Sender,
        }
    }

    pub fn recipient(pubkey: impl Into<String>, relay_hints: Vec<String>) -> Self {
        Self {
            pubkey: pubkey.into(),
            relay_hints,
            role: Role::Recipient,
        }
    }
}

/// Non-empty trimmed values after the pubkey position of a tag.
fn relay_hints(tag: &Tag) -> Vec<String> {
    tag.iter()
        .skip(2)
        .map(|hint| hint.trim())
        .filter(|hint| !hint.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Recipients named by `p` tags, first-seen order, one entry per pubkey.
///
/// Tags whose value is not a valid hex key are skipped. Relay hints of repeated
/// pubkeys are merged into the first entry without duplicates.
pub fn collect_recipients(tags: &[Tag]) -> Vec<Participant> {
    let mut recipients: Vec<Participant> = Vec::new();

    for tag in tags {
        if tag.first().map(String::as_str) != Some(PUBKEY_TAG) {
            continue;
        }

        let Some(pubkey) = tag.get(1).and_then(|value| normalize_hex(value)) else {
            continue;
        };

        let hints = relay_hints(tag);

        match recipients.iter_mut().find(|r| r.pubkey == pubkey) {
            Some(existing) => {
                for hint in hints {
                    if !existing.relay_hints.contains(&hint) {
                        existing.relay_hints.push(hint);
                    }
                }
            }
            None => recipients.push(Participant::recipient(pubkey, hints)),
        }
    }

    recipients
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(items: &[&str]) -> Tag {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_collects_in_first_seen_order() {
        let a = "aa".repeat(32);
        let b = "bb".repeat(32);
        let tags = vec![
            tag(&["p", &b, "wss://one"]),
            tag(&["e", &a]),
            tag(&["p", &a]),
        ];

        let recipients = collect_recipients(&tags);
        assert_eq!(recipients.len(), 2);
        assert_eq!(recipients[0].pubkey, b);
        assert_eq!(recipients[0].relay_hints, vec!["wss://one"]);
        assert_eq!(recipients[1].pubkey, a);
        assert_eq!(recipients[1].role, Role::Recipient);
    }

    #[test]
    fn test_merges_relay_hints_of_repeated_pubkey() {
        let upper = "AA".repeat(32);
        let lower = "aa".repeat(32);
        let tags = vec![
            tag(&["p", &lower, "wss://one", " "]),
            tag(&["p", &upper, "wss://two", "wss://one"]),
        ];

        let recipients = collect_recipients(&tags);
        assert_eq!(recipients.len(), 1);
        assert_eq!(recipients[0].relay_hints, vec!["wss://one", "wss://two"]);
    }

    #[test]
    fn test_skips_invalid_pubkeys() {
        let tags = vec![
            tag(&["p", "not-hex"]),
            tag(&["p"]),
            tag(&["P", &"cc".repeat(32)]),
        ];
        assert!(collect_recipients(&tags).is_empty());
    }
}

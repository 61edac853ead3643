//! Message events and partially-validated payload records.
//!
//! `NostrEvent` is the typed shape of an event fetched from a relay.
//! `PartialEvent` is what a decrypted seal or rumor turns into: every field is
//! optional and read one at a time from the JSON object, so a payload with a
//! missing or mistyped field still yields whatever fields are usable.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A tag: marker name followed by its values, e.g. `["p", <hex>, <relay>]`.
pub type Tag = Vec<String>;

/// A relay-delivered event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NostrEvent {
    #[serde(default)]
    pub id: String,
    pub kind: u32,
    /// Author key. For gift wraps this is a disposable wrapping key.
    #[serde(default)]
    pub pubkey: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<u64>,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sig: Option<String>,
}

impl NostrEvent {
    /// Create an event with the given kind, author and content.
    pub fn new(kind: u32, pubkey: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            kind,
            pubkey: pubkey.into(),
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_created_at(mut self, created_at: u64) -> Self {
        self.created_at = Some(created_at);
        self
    }

    pub fn with_tag<I, S>(mut self, tag: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.push(tag.into_iter().map(Into::into).collect());
        self
    }

    /// Copy of this event with `content` replaced.
    pub fn with_content(&self, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..self.clone()
        }
    }

    /// Read an event out of untyped JSON, tolerating missing or mistyped fields.
    ///
    /// Returns `None` only when `value` is not an object.
    pub fn from_value_lenient(value: &Value) -> Option<Self> {
        PartialEvent::from_value(value).map(NostrEvent::from)
    }
}

impl From<PartialEvent> for NostrEvent {
    fn from(partial: PartialEvent) -> Self {
        Self {
            id: partial.id.unwrap_or_default(),
            kind: partial.kind.unwrap_or_default(),
            pubkey: partial.pubkey.unwrap_or_default(),
            content: partial.content.unwrap_or_default(),
            created_at: partial.created_at,
            tags: partial.tags.unwrap_or_default(),
            sig: partial.sig,
        }
    }
}

/// An event-like record recovered from decrypted JSON (seal or rumor).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pubkey: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<Tag>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sig: Option<String>,
}

impl PartialEvent {
    /// Read each known field from a JSON value. Non-objects yield `None`.
    pub fn from_value(value: &Value) -> Option<Self> {
        value.as_object().map(Self::from_object)
    }

    pub fn from_object(obj: &Map<String, Value>) -> Self {
        Self {
            id: string_field(obj, "id"),
            kind: obj.get("kind").and_then(kind_from_value),
            pubkey: string_field(obj, "pubkey"),
            content: string_field(obj, "content"),
            created_at: obj.get("created_at").and_then(timestamp_from_value),
            tags: obj.get("tags").and_then(tags_from_value),
            sig: string_field(obj, "sig"),
        }
    }

    /// Content, or the empty string when absent.
    pub fn content_str(&self) -> &str {
        self.content.as_deref().unwrap_or("")
    }

    /// Pubkey, or the empty string when absent.
    pub fn pubkey_str(&self) -> &str {
        self.pubkey.as_deref().unwrap_or("")
    }

    /// Tags, or an empty slice when absent.
    pub fn tags_or_empty(&self) -> &[Tag] {
        self.tags.as_deref().unwrap_or(&[])
    }
}

impl From<&NostrEvent> for PartialEvent {
    fn from(event: &NostrEvent) -> Self {
        Self {
            id: Some(event.id.clone()),
            kind: Some(event.kind),
            pubkey: Some(event.pubkey.clone()),
            content: Some(event.content.clone()),
            created_at: event.created_at,
            tags: Some(event.tags.clone()),
            sig: event.sig.clone(),
        }
    }
}

fn string_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(str::to_owned)
}

fn kind_from_value(value: &Value) -> Option<u32> {
    value.as_u64().and_then(|k| u32::try_from(k).ok())
}

fn timestamp_from_value(value: &Value) -> Option<u64> {
    if let Some(ts) = value.as_u64() {
        return Some(ts);
    }
    value
        .as_f64()
        .filter(|ts| ts.is_finite() && *ts >= 0.0)
        .map(|ts| ts.trunc() as u64)
}

// Non-array tags are dropped; non-string tag items become "" so positional
// meaning of the remaining items is preserved.
fn tags_from_value(value: &Value) -> Option<Vec<Tag>> {
    let raw = value.as_array()?;
    Some(
        raw.iter()
            .filter_map(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .map(|item| item.as_str().unwrap_or("").to_owned())
                    .collect()
            })
            .collect(),
    )
}

//! Property-based tests for lenient event parsing.

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use serde_json::{json, Value};

    use crate::event::{NostrEvent, PartialEvent};
    use crate::validation::is_hex_pubkey;

    fn any_json_leaf() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(|n| json!(n)),
            any::<f64>().prop_map(|n| json!(n)),
            ".{0,16}".prop_map(Value::String),
        ]
    }

    fn any_json() -> impl Strategy<Value = Value> {
        any_json_leaf().prop_recursive(3, 32, 6, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
                prop::collection::hash_map("[a-z_]{1,10}", inner, 0..6)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    // Lenient parsing never panics and only rejects non-objects.
    proptest! {
        #[test]
        fn property_lenient_parse_accepts_every_object(value in any_json()) {
            let parsed = PartialEvent::from_value(&value);
            prop_assert_eq!(parsed.is_some(), value.is_object());
        }
    }

    // String fields survive lenient parsing unchanged.
    proptest! {
        #[test]
        fn property_string_fields_preserved(
            pubkey in "[0-9a-f]{64}",
            content in ".{0,64}",
            kind in 0u32..70000,
            created_at in any::<u32>(),
        ) {
            let value = json!({
                "pubkey": pubkey.clone(),
                "content": content.clone(),
                "kind": kind,
                "created_at": created_at,
            });
            let event = NostrEvent::from_value_lenient(&value).unwrap();
            prop_assert!(is_hex_pubkey(&event.pubkey));
            prop_assert_eq!(event.pubkey, pubkey);
            prop_assert_eq!(event.content, content);
            prop_assert_eq!(event.kind, kind);
            prop_assert_eq!(event.created_at, Some(created_at as u64));
        }
    }
}

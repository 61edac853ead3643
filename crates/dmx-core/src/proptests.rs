//! Property-based tests for ordering, tag parsing and dispatch.

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use proptest::prelude::*;

    use dmx_proto::{NostrEvent, Tag};

    use crate::candidate::DecryptorCandidate;
    use crate::context::DecryptContext;
    use crate::dispatch::decrypt_dm;
    use crate::errors::Stage;
    use crate::harness::{hex_key, FailingDecryptor};
    use crate::hints::parse_encryption_hints;
    use crate::order::{order_decryptors, OrderOptions};
    use crate::recipients::collect_recipients;

    fn any_scheme() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("nip44".to_string()),
            Just("nip44_v2".to_string()),
            Just("nip04".to_string()),
            Just("custom".to_string()),
            Just(String::new()),
        ]
    }

    fn any_candidates() -> impl Strategy<Value = Vec<(String, i32, bool)>> {
        prop::collection::vec((any_scheme(), -2i32..3, any::<bool>()), 0..8)
    }

    fn build(specs: &[(String, i32, bool)]) -> Vec<DecryptorCandidate> {
        specs
            .iter()
            .enumerate()
            .map(|(i, (scheme, priority, wrap))| {
                DecryptorCandidate::from_decryptor(FailingDecryptor::new("unused"))
                    .with_scheme(scheme.clone())
                    .with_priority(*priority)
                    .with_gift_wrap(*wrap)
                    .with_source(i.to_string())
            })
            .collect()
    }

    fn any_tag() -> impl Strategy<Value = Tag> {
        let marker = prop_oneof![Just("p".to_string()), Just("encrypted".to_string()), "[a-z]{1,3}"];
        let value = prop_oneof![
            (0u8..4).prop_map(hex_key),
            Just("nip44 nip04".to_string()),
            Just("NIP-44".to_string()),
            "[ -~]{0,12}",
        ];
        (marker, prop::collection::vec(value, 0..4)).prop_map(|(marker, values)| {
            let mut tag = vec![marker];
            tag.extend(values);
            tag
        })
    }

    // Ordering never drops or duplicates candidates, sorts by priority first,
    // and keeps the caller's order among candidates equal on every key.
    proptest! {
        #[test]
        fn property_ordering_is_stable_permutation(
            specs in any_candidates(),
            prefer_gift_wrap in any::<bool>(),
        ) {
            let candidates = build(&specs);
            let ordered = order_decryptors(&candidates, None, OrderOptions { prefer_gift_wrap });

            let mut sources: Vec<usize> = ordered
                .iter()
                .map(|c| c.source.parse().unwrap())
                .collect();
            prop_assert!(ordered.windows(2).all(|w| w[0].priority <= w[1].priority));

            for pair in ordered.windows(2) {
                let same_keys = pair[0].priority == pair[1].priority
                    && pair[0].scheme == pair[1].scheme
                    && pair[0].supports_gift_wrap == pair[1].supports_gift_wrap;
                if same_keys {
                    let a: usize = pair[0].source.parse().unwrap();
                    let b: usize = pair[1].source.parse().unwrap();
                    prop_assert!(a < b);
                }
            }

            sources.sort_unstable();
            prop_assert_eq!(sources, (0..specs.len()).collect::<Vec<_>>());
        }
    }

    // Ordering the same input twice yields the same trial order.
    proptest! {
        #[test]
        fn property_ordering_is_deterministic(
            specs in any_candidates(),
            tags in prop::collection::vec(any_tag(), 0..4),
        ) {
            let candidates = build(&specs);
            let hints = parse_encryption_hints(&tags);
            let first: Vec<_> = order_decryptors(&candidates, Some(&hints), OrderOptions::default())
                .into_iter()
                .map(|c| c.source)
                .collect();
            let second: Vec<_> = order_decryptors(&candidates, Some(&hints), OrderOptions::default())
                .into_iter()
                .map(|c| c.source)
                .collect();
            prop_assert_eq!(first, second);
        }
    }

    // Recipients are unique valid hex keys; hint algorithms are unique.
    proptest! {
        #[test]
        fn property_tag_parsing_dedupes(tags in prop::collection::vec(any_tag(), 0..8)) {
            let recipients = collect_recipients(&tags);
            let mut seen = HashSet::new();
            for recipient in &recipients {
                prop_assert_eq!(recipient.pubkey.len(), 64);
                prop_assert!(seen.insert(recipient.pubkey.clone()));
            }

            let hints = parse_encryption_hints(&tags);
            let unique: HashSet<_> = hints.algorithms.iter().collect();
            prop_assert_eq!(unique.len(), hints.algorithms.len());
        }
    }

    // Any kind outside the supported set fails at the input stage, whatever
    // decryptors are supplied.
    proptest! {
        #[test]
        fn property_unsupported_kind_fails_at_input(
            kind in any::<u32>().prop_filter("supported kind", |k| *k != 4 && *k != 1059),
            specs in any_candidates(),
        ) {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .build()
                .unwrap();
            let event = NostrEvent::new(kind, hex_key(1), "ciphertext");
            let ctx = DecryptContext::new(hex_key(2), build(&specs));

            let result = runtime.block_on(decrypt_dm(&event, &ctx));
            prop_assert!(!result.ok);
            prop_assert_eq!(result.first_error_stage(), Some(Stage::Input));
        }
    }
}

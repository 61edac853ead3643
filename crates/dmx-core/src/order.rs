//! Candidate ordering.
//!
//! Candidates are sorted by explicit priority, then by how desirable their
//! scheme is, then (for gift wraps) by gift-wrap capability. The sort is
//! stable, so candidates equal on every key keep the caller's order and the
//! trial order is deterministic.

use std::cmp::Ordering;

use crate::candidate::DecryptorCandidate;
use crate::hints::EncryptionHints;
use crate::normalize::{base_scheme_rank, related_scheme};

/// Options for [`order_decryptors`].
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderOptions {
    /// Break remaining ties in favour of gift-wrap capable candidates
    pub prefer_gift_wrap: bool,
}

/// Rank of a scheme: its hint position if hinted (directly or through its
/// related revision), its base rank otherwise.
fn desired_scheme_rank(scheme: &str, hints: Option<&EncryptionHints>) -> usize {
    if let Some(hints) = hints {
        if let Some(rank) = hints.rank_of(scheme) {
            return rank;
        }
        if let Some(rank) = related_scheme(scheme).and_then(|related| hints.rank_of(related)) {
            return rank;
        }
    }
    base_scheme_rank(scheme)
}

/// Return the candidates in the order they should be tried.
pub fn order_decryptors(
    candidates: &[DecryptorCandidate],
    hints: Option<&EncryptionHints>,
    options: OrderOptions,
) -> Vec<DecryptorCandidate> {
    let mut ordered = candidates.to_vec();

    ordered.sort_by(|a, b| {
        a.priority
            .cmp(&b.priority)
            .then_with(|| {
                desired_scheme_rank(&a.scheme, hints).cmp(&desired_scheme_rank(&b.scheme, hints))
            })
            .then_with(|| {
                if options.prefer_gift_wrap {
                    b.supports_gift_wrap.cmp(&a.supports_gift_wrap)
                } else {
                    Ordering::Equal
                }
            })
    });

    ordered
}

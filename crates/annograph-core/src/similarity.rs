//! Jaccard similarity over interned feature sets.
//!
//! Feature tokens are interned to `u32` ids, so a node's feature set
//! is a Roaring bitmap and the Jaccard coefficient
//! `J(A,B) = |A ∩ B| / |A ∪ B|` reduces to two bitmap ops and two
//! cardinalities.

use roaring::RoaringBitmap;
use std::collections::BTreeSet;

/// Jaccard similarity coefficient between two interned feature sets.
///
/// Returns 0.0 when either set is empty; for two non-empty sets the
/// union is non-empty, so no division-by-zero case exists.
pub fn jaccard(a: &RoaringBitmap, b: &RoaringBitmap) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection_len(b);
    // |A ∪ B| = |A| + |B| - |A ∩ B|, saves materializing the union.
    let union = a.len() + b.len() - intersection;
    intersection as f64 / union as f64
}

/// Jaccard over raw token sets, for callers outside the interned
/// representation (tests, ad-hoc tooling).
pub fn jaccard_tokens(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    intersection as f64 / union as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn bitmap(ids: &[u32]) -> RoaringBitmap {
        ids.iter().copied().collect()
    }

    #[test]
    fn worked_example_is_exactly_two_fifths() {
        // {d1,d2,d3,d4} vs {d1,d3,d5}: intersection 2, union 5.
        let a = bitmap(&[1, 2, 3, 4]);
        let b = bitmap(&[1, 3, 5]);
        assert_relative_eq!(jaccard(&a, &b), 0.4);
    }

    #[test]
    fn identical_non_empty_sets_score_one() {
        let a = bitmap(&[7, 8, 9]);
        assert_relative_eq!(jaccard(&a, &a), 1.0);
    }

    #[test]
    fn disjoint_sets_score_zero() {
        assert_relative_eq!(jaccard(&bitmap(&[1]), &bitmap(&[2])), 0.0);
    }

    #[test]
    fn empty_operand_scores_zero() {
        let empty = RoaringBitmap::new();
        assert_relative_eq!(jaccard(&empty, &bitmap(&[1, 2])), 0.0);
        assert_relative_eq!(jaccard(&empty, &empty), 0.0);
    }

    #[test]
    fn symmetric() {
        let a = bitmap(&[1, 2, 3]);
        let b = bitmap(&[2, 3, 4, 5]);
        assert_relative_eq!(jaccard(&a, &b), jaccard(&b, &a));
    }

    #[test]
    fn token_variant_matches_bitmap_variant() {
        let a: BTreeSet<String> = ["d1", "d2", "d3", "d4"].iter().map(|s| s.to_string()).collect();
        let b: BTreeSet<String> = ["d1", "d3", "d5"].iter().map(|s| s.to_string()).collect();
        assert_relative_eq!(jaccard_tokens(&a, &b), 0.4);
    }
}

use annograph_core::{jaccard, jaccard_tokens, Entity, GraphBuilder};
use proptest::prelude::*;
use roaring::RoaringBitmap;
use std::collections::BTreeSet;

fn feature_set() -> impl Strategy<Value = BTreeSet<u32>> {
    // Small id universe so intersections actually happen.
    proptest::collection::btree_set(0u32..32, 0..12)
}

fn bitmap(ids: &BTreeSet<u32>) -> RoaringBitmap {
    ids.iter().copied().collect()
}

proptest! {
    #[test]
    fn jaccard_is_symmetric(a in feature_set(), b in feature_set()) {
        let (ba, bb) = (bitmap(&a), bitmap(&b));
        prop_assert_eq!(jaccard(&ba, &bb).to_bits(), jaccard(&bb, &ba).to_bits());
    }

    #[test]
    fn jaccard_is_bounded(a in feature_set(), b in feature_set()) {
        let j = jaccard(&bitmap(&a), &bitmap(&b));
        prop_assert!((0.0..=1.0).contains(&j));
    }

    #[test]
    fn jaccard_of_non_empty_set_with_itself_is_one(a in feature_set()) {
        prop_assume!(!a.is_empty());
        let ba = bitmap(&a);
        prop_assert_eq!(jaccard(&ba, &ba), 1.0);
    }

    #[test]
    fn bitmap_and_token_jaccard_agree(a in feature_set(), b in feature_set()) {
        let ta: BTreeSet<String> = a.iter().map(|i| format!("d{i}")).collect();
        let tb: BTreeSet<String> = b.iter().map(|i| format!("d{i}")).collect();
        let bits = jaccard(&bitmap(&a), &bitmap(&b));
        let tokens = jaccard_tokens(&ta, &tb);
        prop_assert_eq!(bits.to_bits(), tokens.to_bits());
    }
}

fn entities() -> impl Strategy<Value = Vec<Entity>> {
    proptest::collection::vec(feature_set(), 0..16).prop_map(|sets| {
        sets.into_iter()
            .enumerate()
            .map(|(i, set)| {
                Entity::new(format!("P{i}"))
                    .with_features(set.iter().map(|id| format!("d{id}")))
            })
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn built_graph_is_simple_and_above_threshold(
        entities in entities(),
        threshold in 0.0f64..0.95,
    ) {
        let build = GraphBuilder::new(threshold).unwrap().build(&entities);
        let mut seen = BTreeSet::new();
        for edge in build.graph.edges() {
            prop_assert!(edge.a < edge.b, "no self-loops, ascending endpoints");
            prop_assert!(seen.insert((edge.a, edge.b)), "no duplicate pairs");
            prop_assert!(edge.weight > threshold, "strictly above threshold");
            prop_assert!(edge.weight <= 1.0);
        }
    }

    #[test]
    fn nodes_are_exactly_the_entities_with_features(entities in entities()) {
        let build = GraphBuilder::new(0.1).unwrap().build(&entities);
        let expected: Vec<&str> = entities
            .iter()
            .filter(|e| !e.features.is_empty())
            .map(|e| e.id.as_str())
            .collect();
        let actual: Vec<&str> =
            build.graph.nodes().iter().map(|n| n.id.as_str()).collect();
        prop_assert_eq!(actual, expected);
    }

    #[test]
    fn rebuild_is_isomorphic(entities in entities(), threshold in 0.0f64..0.95) {
        let builder = GraphBuilder::new(threshold).unwrap();
        let first = builder.build(&entities);
        let second = builder.build(&entities);
        prop_assert_eq!(first.graph.node_count(), second.graph.node_count());
        prop_assert_eq!(first.graph.edges(), second.graph.edges());
    }
}

//! Property-based tests for `TripleStore`'s set semantics.

use proptest::prelude::*;
use rdf_model::{Term, Triple};
use storage::{TriplePattern, TripleStore};

fn arb_term() -> impl Strategy<Value = Term> {
    (0u32..20).prop_map(|i| Term::iri(format!("http://ex/{i}")))
}

fn arb_triple() -> impl Strategy<Value = Triple> {
    (arb_term(), arb_term(), arb_term()).prop_map(|(s, p, o)| Triple::new(s, p, o))
}

proptest! {
    #[test]
    fn adding_the_same_triple_twice_does_not_grow_the_store(triple in arb_triple()) {
        let mut store = TripleStore::new();
        store.add(triple.clone());
        let len_after_first = store.len();
        store.add(triple);
        prop_assert_eq!(store.len(), len_after_first);
    }

    #[test]
    fn removing_every_added_triple_empties_the_store(triples in prop::collection::vec(arb_triple(), 0..30)) {
        let mut store = TripleStore::new();
        for t in &triples {
            store.add(t.clone());
        }
        for t in &triples {
            store.remove(t);
        }
        prop_assert!(store.is_empty());
    }

    #[test]
    fn the_wildcard_pattern_matches_exactly_every_stored_triple(triples in prop::collection::vec(arb_triple(), 0..30)) {
        let mut store = TripleStore::new();
        for t in &triples {
            store.add(t.clone());
        }
        let matched = store.match_pattern(&TriplePattern::all()).count();
        prop_assert_eq!(matched, store.len());
    }
}

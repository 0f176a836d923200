//! Property-based tests for property-path evaluation.

use proptest::prelude::*;
use rdf_model::{Term, Triple};
use sparql::path::{evaluate_path, PropertyPath};
use storage::TripleStore;

fn node(i: u32) -> Term {
    Term::iri(format!("http://ex/n{i}"))
}

fn arb_edges() -> impl Strategy<Value = Vec<(u32, u32)>> {
    prop::collection::vec((0u32..8, 0u32..8), 0..20)
}

proptest! {
    #[test]
    fn zero_or_more_always_reaches_the_start_node(edges in arb_edges(), start in 0u32..8) {
        let mut store = TripleStore::new();
        let predicate = Term::iri("http://ex/link");
        for (a, b) in &edges {
            store.add(Triple::new(node(*a), predicate.clone(), node(*b)));
        }

        let path = PropertyPath::ZeroOrMore(Box::new(PropertyPath::Predicate(predicate)));
        let reached = evaluate_path(&store, &path, Some(&node(start)), None).unwrap();
        prop_assert!(reached.iter().any(|(s, o)| *s == node(start) && *o == node(start)));
    }

    #[test]
    fn zero_or_more_never_emits_duplicate_pairs(edges in arb_edges(), start in 0u32..8) {
        let mut store = TripleStore::new();
        let predicate = Term::iri("http://ex/link");
        for (a, b) in &edges {
            store.add(Triple::new(node(*a), predicate.clone(), node(*b)));
        }

        let path = PropertyPath::ZeroOrMore(Box::new(PropertyPath::Predicate(predicate)));
        let reached = evaluate_path(&store, &path, Some(&node(start)), None).unwrap();
        let mut seen = std::collections::HashSet::new();
        for pair in &reached {
            prop_assert!(seen.insert(pair.clone()), "duplicate pair emitted: {:?}", pair);
        }
    }
}

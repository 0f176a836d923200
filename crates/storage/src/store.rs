//! The in-memory triple store: three position indexes over a single
//! triple vector, with set semantics (no duplicate triples).

use crate::pattern::{TermPattern, TriplePattern};
use rdf_model::{Dictionary, Term, Triple};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, trace};

type TripleId = usize;

/// An in-memory, indexed set of RDF triples.
///
/// Three hash indexes (by subject, by predicate, by object) back
/// [`TripleStore::match_pattern`], so a query pinning any one position
/// scans only the triples sharing that term rather than the whole store.
/// A store never holds two equal triples; [`TripleStore::add`] is a no-op
/// (returns `false`) when the triple is already present.
pub struct TripleStore {
    dictionary: Dictionary,
    triples: Vec<Option<Triple>>,
    free_slots: Vec<TripleId>,
    by_subject: FxHashMap<Term, FxHashSet<TripleId>>,
    by_predicate: FxHashMap<Term, FxHashSet<TripleId>>,
    by_object: FxHashMap<Term, FxHashSet<TripleId>>,
    len: usize,
}

impl TripleStore {
    /// Create a new, empty store.
    pub fn new() -> Self {
        TripleStore {
            dictionary: Dictionary::new(),
            triples: Vec::new(),
            free_slots: Vec::new(),
            by_subject: FxHashMap::default(),
            by_predicate: FxHashMap::default(),
            by_object: FxHashMap::default(),
            len: 0,
        }
    }

    /// The string interner shared by terms stored here.
    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    /// Number of distinct triples currently stored.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the store holds no triples.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Add a triple, returning `true` if it was not already present.
    pub fn add(&mut self, triple: Triple) -> bool {
        if self.contains(&triple) {
            trace!(triple = %triple, "triple already present, skipping");
            return false;
        }
        let id = match self.free_slots.pop() {
            Some(id) => {
                self.triples[id] = Some(triple.clone());
                id
            }
            None => {
                self.triples.push(Some(triple.clone()));
                self.triples.len() - 1
            }
        };
        self.by_subject.entry(triple.subject.clone()).or_default().insert(id);
        self.by_predicate.entry(triple.predicate.clone()).or_default().insert(id);
        self.by_object.entry(triple.object.clone()).or_default().insert(id);
        self.len += 1;
        debug!(triple = %self.triples[id].as_ref().unwrap(), "added triple");
        true
    }

    /// Add every triple from `iter`.
    pub fn add_all(&mut self, iter: impl IntoIterator<Item = Triple>) {
        for triple in iter {
            self.add(triple);
        }
    }

    /// Remove a triple, returning `true` if it was present.
    pub fn remove(&mut self, triple: &Triple) -> bool {
        let Some(id) = self.find_id(triple) else {
            return false;
        };
        self.triples[id] = None;
        self.free_slots.push(id);
        remove_from_index(&mut self.by_subject, &triple.subject, id);
        remove_from_index(&mut self.by_predicate, &triple.predicate, id);
        remove_from_index(&mut self.by_object, &triple.object, id);
        self.len -= 1;
        debug!(triple = %triple, "removed triple");
        true
    }

    /// Remove every triple from `iter`.
    pub fn remove_all<'a>(&mut self, iter: impl IntoIterator<Item = &'a Triple>) {
        for triple in iter {
            self.remove(triple);
        }
    }

    /// Whether `triple` is present.
    pub fn contains(&self, triple: &Triple) -> bool {
        self.find_id(triple).is_some()
    }

    /// Remove every triple, keeping the interned dictionary.
    pub fn clear(&mut self) {
        self.triples.clear();
        self.free_slots.clear();
        self.by_subject.clear();
        self.by_predicate.clear();
        self.by_object.clear();
        self.len = 0;
    }

    /// Iterate over every triple matching `pattern`.
    ///
    /// Picks the most selective bound position to drive the scan: a
    /// fully-bound pattern does a single hash lookup, a pattern with one
    /// bound position scans that position's index, and a fully-wildcard
    /// pattern scans the whole store.
    pub fn match_pattern<'s>(&'s self, pattern: &'s TriplePattern) -> impl Iterator<Item = &'s Triple> + 's {
        let candidates = self.candidate_ids(pattern);
        candidates
            .into_iter()
            .filter_map(move |id| self.triples[id].as_ref())
            .filter(move |triple| {
                pattern.subject.matches(&triple.subject)
                    && pattern.predicate.matches(&triple.predicate)
                    && pattern.object.matches(&triple.object)
            })
    }

    /// The set of distinct subjects across all stored triples.
    pub fn subjects(&self) -> FxHashSet<Term> {
        self.by_subject.keys().cloned().collect()
    }

    /// The set of distinct predicates across all stored triples.
    pub fn predicates(&self) -> FxHashSet<Term> {
        self.by_predicate.keys().cloned().collect()
    }

    /// The set of distinct objects across all stored triples.
    pub fn objects(&self) -> FxHashSet<Term> {
        self.by_object.keys().cloned().collect()
    }

    /// Start a transaction that stages adds/removes against this store
    /// without touching it until [`crate::Transaction::commit`] is called.
    pub fn begin_transaction(&self) -> crate::Transaction {
        crate::Transaction::new()
    }

    fn find_id(&self, triple: &Triple) -> Option<TripleId> {
        let index = self.by_subject.get(&triple.subject)?;
        index.iter().copied().find(|&id| self.triples[id].as_ref() == Some(triple))
    }

    fn candidate_ids(&self, pattern: &TriplePattern) -> Vec<TripleId> {
        let bound = [
            (&pattern.subject, &self.by_subject),
            (&pattern.predicate, &self.by_predicate),
            (&pattern.object, &self.by_object),
        ];
        let smallest = bound.iter().filter_map(|(p, index)| match p {
            TermPattern::Concrete(term) => index.get(term).map(|ids| ids.len()),
            TermPattern::Any => None,
        }).min();

        match smallest {
            Some(_) => bound
                .into_iter()
                .filter_map(|(p, index)| match p {
                    TermPattern::Concrete(term) => index.get(term).map(|ids| (ids.len(), ids)),
                    TermPattern::Any => None,
                })
                .min_by_key(|(len, _)| *len)
                .map(|(_, ids)| ids.iter().copied().collect())
                .unwrap_or_default(),
            None => (0..self.triples.len()).filter(|&id| self.triples[id].is_some()).collect(),
        }
    }
}

impl Default for TripleStore {
    fn default() -> Self {
        Self::new()
    }
}

fn remove_from_index(index: &mut FxHashMap<Term, FxHashSet<TripleId>>, term: &Term, id: TripleId) {
    if let Some(ids) = index.get_mut(term) {
        ids.remove(&id);
        if ids.is_empty() {
            index.remove(term);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triple(s: &str, p: &str, o: &str) -> Triple {
        Triple::new(Term::iri(s), Term::iri(p), Term::plain_literal(o))
    }

    #[test]
    fn add_is_idempotent() {
        let mut store = TripleStore::new();
        assert!(store.add(triple("s", "p", "o")));
        assert!(!store.add(triple("s", "p", "o")));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn remove_then_contains_is_false() {
        let mut store = TripleStore::new();
        let t = triple("s", "p", "o");
        store.add(t.clone());
        assert!(store.remove(&t));
        assert!(!store.contains(&t));
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn match_pattern_respects_wildcards() {
        let mut store = TripleStore::new();
        store.add(triple("s1", "p", "o1"));
        store.add(triple("s2", "p", "o2"));

        let pattern = TriplePattern::new(
            TermPattern::Any,
            TermPattern::Concrete(Term::iri("p")),
            TermPattern::Any,
        );
        let results: Vec<_> = store.match_pattern(&pattern).collect();
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn subjects_predicates_objects_are_deduplicated() {
        let mut store = TripleStore::new();
        store.add(triple("s", "p", "o1"));
        store.add(triple("s", "p", "o2"));

        assert_eq!(store.subjects().len(), 1);
        assert_eq!(store.predicates().len(), 1);
        assert_eq!(store.objects().len(), 2);
    }

    #[test]
    fn removal_cleans_up_empty_index_buckets() {
        let mut store = TripleStore::new();
        let t = triple("s", "p", "o");
        store.add(t.clone());
        store.remove(&t);
        assert!(store.subjects().is_empty());
    }
}

//! Property paths: the path expression grammar and the BFS engine that
//! evaluates them against a triple store.

use crate::algebra::TermOrVar;
use rdf_model::Term;
use std::collections::{HashSet, VecDeque};
use storage::{TermPattern, TriplePattern, TripleStore};

/// A SPARQL 1.1 property path expression.
#[derive(Clone, Debug)]
pub enum PropertyPath {
    /// A single predicate IRI, traversed forwards.
    Predicate(Term),
    /// `^path` — traverse `path` backwards.
    Inverse(Box<PropertyPath>),
    /// `a/b` — sequence: end of `a` must equal start of `b`.
    Sequence(Box<PropertyPath>, Box<PropertyPath>),
    /// `a|b` — alternative: either `a` or `b` matches.
    Alternative(Box<PropertyPath>, Box<PropertyPath>),
    /// `a*` — zero or more repetitions of `a`.
    ZeroOrMore(Box<PropertyPath>),
    /// `a+` — one or more repetitions of `a`.
    OneOrMore(Box<PropertyPath>),
    /// `a?` — zero or one repetition of `a`.
    ZeroOrOne(Box<PropertyPath>),
    /// `!(a|b|...)` — any predicate other than the named ones.
    NegatedPropertySet(Vec<Term>),
}

/// Errors from evaluating a property path.
#[derive(Debug, thiserror::Error)]
pub enum PathError {
    /// Both path endpoints were unbound; evaluating would require scanning
    /// the whole graph to materialize every (subject, object) pair, which
    /// this engine refuses to do implicitly.
    ///
    /// `ZeroOrMore` and `ZeroOrOne` are exempt: both have a defined answer
    /// over an unbound universe (the empty solution set), so they return
    /// `Ok(vec![])` instead of this error.
    #[error("property path has no bound endpoint")]
    BothEndsUnbound,
}

/// Evaluate `path` starting from `start` (if bound) and/or ending at `end`
/// (if bound), returning every `(subject, object)` pair the path connects.
///
/// At least one of `start`/`end` must be a concrete term, unless `path` is
/// `ZeroOrMore` or `ZeroOrOne`, for which an unbound pair yields an empty
/// result rather than [`PathError::BothEndsUnbound`].
pub fn evaluate_path(
    store: &TripleStore,
    path: &PropertyPath,
    start: Option<&Term>,
    end: Option<&Term>,
) -> Result<Vec<(Term, Term)>, PathError> {
    match (start, end) {
        (None, None) => match path {
            PropertyPath::ZeroOrMore(_) | PropertyPath::ZeroOrOne(_) => Ok(Vec::new()),
            _ => Err(PathError::BothEndsUnbound),
        },
        (Some(s), _) => Ok(forward_from(store, path, s)
            .into_iter()
            .filter(|(_, o)| end.map_or(true, |e| e == o))
            .collect()),
        (None, Some(e)) => Ok(backward_from(store, path, e)
            .into_iter()
            .map(|s| (s, e.clone()))
            .collect()),
    }
}

fn forward_from(store: &TripleStore, path: &PropertyPath, start: &Term) -> Vec<(Term, Term)> {
    step(store, path, start, Direction::Forward)
        .into_iter()
        .map(|end| (start.clone(), end))
        .collect()
}

fn backward_from(store: &TripleStore, path: &PropertyPath, end: &Term) -> Vec<Term> {
    step(store, path, end, Direction::Backward)
}

#[derive(Clone, Copy, PartialEq)]
enum Direction {
    Forward,
    Backward,
}

impl Direction {
    fn flip(self) -> Self {
        match self {
            Direction::Forward => Direction::Backward,
            Direction::Backward => Direction::Forward,
        }
    }
}

/// Every node reachable from `node` by following `path` once, in `dir`.
fn step(store: &TripleStore, path: &PropertyPath, node: &Term, dir: Direction) -> Vec<Term> {
    match path {
        PropertyPath::Predicate(pred) => predicate_step(store, pred, node, dir),
        PropertyPath::Inverse(inner) => step(store, inner, node, dir.flip()),
        PropertyPath::Sequence(a, b) => {
            let (first, second) = match dir {
                Direction::Forward => (a.as_ref(), b.as_ref()),
                Direction::Backward => (b.as_ref(), a.as_ref()),
            };
            let mut out = Vec::new();
            for mid in step(store, first, node, dir) {
                out.extend(step(store, second, &mid, dir));
            }
            dedup(out)
        }
        PropertyPath::Alternative(a, b) => {
            let mut out = step(store, a, node, dir);
            out.extend(step(store, b, node, dir));
            dedup(out)
        }
        PropertyPath::ZeroOrMore(inner) => bounded_walk(store, inner, node, dir, true),
        PropertyPath::OneOrMore(inner) => bounded_walk(store, inner, node, dir, false),
        PropertyPath::ZeroOrOne(inner) => {
            let mut out = vec![node.clone()];
            out.extend(step(store, inner, node, dir));
            dedup(out)
        }
        PropertyPath::NegatedPropertySet(excluded) => {
            let pattern = match dir {
                Direction::Forward => TriplePattern::new(
                    TermPattern::Concrete(node.clone()),
                    TermPattern::Any,
                    TermPattern::Any,
                ),
                Direction::Backward => TriplePattern::new(
                    TermPattern::Any,
                    TermPattern::Any,
                    TermPattern::Concrete(node.clone()),
                ),
            };
            dedup(
                store
                    .match_pattern(&pattern)
                    .filter(|t| !excluded.contains(&t.predicate))
                    .map(|t| match dir {
                        Direction::Forward => t.object.clone(),
                        Direction::Backward => t.subject.clone(),
                    })
                    .collect(),
            )
        }
    }
}

fn predicate_step(store: &TripleStore, pred: &Term, node: &Term, dir: Direction) -> Vec<Term> {
    let pattern = match dir {
        Direction::Forward => TriplePattern::new(
            TermPattern::Concrete(node.clone()),
            TermPattern::Concrete(pred.clone()),
            TermPattern::Any,
        ),
        Direction::Backward => TriplePattern::new(
            TermPattern::Any,
            TermPattern::Concrete(pred.clone()),
            TermPattern::Concrete(node.clone()),
        ),
    };
    dedup(
        store
            .match_pattern(&pattern)
            .map(|t| match dir {
                Direction::Forward => t.object.clone(),
                Direction::Backward => t.subject.clone(),
            })
            .collect(),
    )
}

/// Breadth-first closure over `inner`, starting at `node`. `include_zero`
/// selects `*` (includes `node` itself) vs `+` (requires at least one hop).
///
/// Visited nodes are tracked by identity (the node's own value), not by
/// the path taken to reach them, so a cycle is walked exactly once no
/// matter how many distinct routes lead into it: termination and
/// single-emission of self-loops both fall out of this invariant.
fn bounded_walk(store: &TripleStore, inner: &PropertyPath, node: &Term, dir: Direction, include_zero: bool) -> Vec<Term> {
    let mut visited: HashSet<Term> = HashSet::new();
    let mut queue: VecDeque<Term> = VecDeque::new();
    let mut results = Vec::new();

    if include_zero {
        results.push(node.clone());
        visited.insert(node.clone());
    }

    queue.push_back(node.clone());
    if !include_zero {
        visited.insert(node.clone());
    }

    while let Some(current) = queue.pop_front() {
        for next in step(store, inner, &current, dir) {
            if visited.insert(next.clone()) {
                results.push(next.clone());
                queue.push_back(next);
            }
        }
    }

    results
}

fn dedup(mut terms: Vec<Term>) -> Vec<Term> {
    let mut seen = HashSet::new();
    terms.retain(|t| seen.insert(t.clone()));
    terms
}

/// Resolve a pattern's subject/object [`TermOrVar`] positions down to
/// concrete bound terms, given whichever side is already bound in the
/// caller's partial solution. Used by the executor to drive
/// [`evaluate_path`] from a `Path` algebra node.
pub fn bound_endpoints(subject: &TermOrVar, object: &TermOrVar, lookup: impl Fn(&TermOrVar) -> Option<Term>) -> (Option<Term>, Option<Term>) {
    (lookup(subject), lookup(object))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rdf_model::Triple;

    fn store_with(triples: &[(&str, &str, &str)]) -> TripleStore {
        let mut store = TripleStore::new();
        for (s, p, o) in triples {
            store.add(Triple::new(Term::iri(*s), Term::iri(*p), Term::iri(*o)));
        }
        store
    }

    #[test]
    fn direct_predicate_step() {
        let store = store_with(&[("a", "p", "b")]);
        let path = PropertyPath::Predicate(Term::iri("p"));
        let result = evaluate_path(&store, &path, Some(&Term::iri("a")), None).unwrap();
        assert_eq!(result, vec![(Term::iri("a"), Term::iri("b"))]);
    }

    #[test]
    fn one_or_more_reaches_transitive_targets() {
        let store = store_with(&[("a", "sub", "b"), ("b", "sub", "c")]);
        let path = PropertyPath::OneOrMore(Box::new(PropertyPath::Predicate(Term::iri("sub"))));
        let mut result = evaluate_path(&store, &path, Some(&Term::iri("a")), None).unwrap();
        result.sort_by(|a, b| format!("{:?}", a.1).cmp(&format!("{:?}", b.1)));
        let objects: Vec<_> = result.into_iter().map(|(_, o)| o).collect();
        assert_eq!(objects, vec![Term::iri("b"), Term::iri("c")]);
    }

    #[test]
    fn zero_or_more_includes_start_once_even_with_self_loop() {
        let store = store_with(&[("a", "sub", "a"), ("a", "sub", "b")]);
        let path = PropertyPath::ZeroOrMore(Box::new(PropertyPath::Predicate(Term::iri("sub"))));
        let result = evaluate_path(&store, &path, Some(&Term::iri("a")), None).unwrap();
        let self_loops = result.iter().filter(|(_, o)| *o == Term::iri("a")).count();
        assert_eq!(self_loops, 1);
    }

    #[test]
    fn inverse_path_walks_backwards() {
        let store = store_with(&[("a", "knows", "b")]);
        let path = PropertyPath::Inverse(Box::new(PropertyPath::Predicate(Term::iri("knows"))));
        let result = evaluate_path(&store, &path, Some(&Term::iri("b")), None).unwrap();
        assert_eq!(result, vec![(Term::iri("b"), Term::iri("a"))]);
    }

    #[test]
    fn both_ends_unbound_is_rejected() {
        let store = store_with(&[("a", "p", "b")]);
        let path = PropertyPath::Predicate(Term::iri("p"));
        assert!(matches!(evaluate_path(&store, &path, None, None), Err(PathError::BothEndsUnbound)));
    }

    #[test]
    fn zero_or_more_with_both_ends_unbound_is_empty_not_an_error() {
        let store = store_with(&[("a", "knows", "b"), ("b", "knows", "c")]);
        let path = PropertyPath::ZeroOrMore(Box::new(PropertyPath::Predicate(Term::iri("knows"))));
        assert_eq!(evaluate_path(&store, &path, None, None).unwrap(), Vec::new());
    }

    #[test]
    fn zero_or_one_with_both_ends_unbound_is_empty_not_an_error() {
        let store = store_with(&[("a", "knows", "b")]);
        let path = PropertyPath::ZeroOrOne(Box::new(PropertyPath::Predicate(Term::iri("knows"))));
        assert_eq!(evaluate_path(&store, &path, None, None).unwrap(), Vec::new());
    }
}

//! Query optimization: BGP reordering by estimated selectivity, and
//! pushing `FILTER`s down to the join subtree that can evaluate them.

use crate::algebra::{Algebra, PatternTriple, PredicateOrPath, TermOrVar, Variable};
use crate::expr::Expression;
use std::collections::HashSet;
use storage::TripleStore;

/// Optimize `algebra` against `store`'s current contents.
///
/// This does not change the algebra's result set, only the order
/// operators run in: join children are reordered cheapest-estimate
/// first, and filters move as close as possible to the join that binds
/// every variable they reference. There is no worst-case-optimal join
/// evaluation and no cyclic-query detection here; those are out of scope
/// for the estimate-and-reorder strategy this optimizer implements.
pub fn optimize(algebra: Algebra, store: &TripleStore) -> Algebra {
    match algebra {
        Algebra::Join(_, _) => {
            let mut leaves = Vec::new();
            flatten_join(Algebra::Join(Box::new(Algebra::Bgp(vec![])), Box::new(Algebra::Bgp(vec![]))), &mut leaves);
            leaves.clear();
            let original = algebra;
            flatten_join(original, &mut leaves);
            let mut leaves: Vec<Algebra> = leaves.into_iter().map(|leaf| optimize(leaf, store)).collect();
            leaves.sort_by_key(|leaf| estimate_cardinality(leaf, store));
            rebuild_join(leaves)
        }
        Algebra::Filter(expr, inner) => push_filter(expr, optimize(*inner, store)),
        Algebra::LeftJoin(a, b, filter) => Algebra::LeftJoin(
            Box::new(optimize(*a, store)),
            Box::new(optimize(*b, store)),
            filter,
        ),
        Algebra::Union(a, b) => Algebra::Union(Box::new(optimize(*a, store)), Box::new(optimize(*b, store))),
        Algebra::Extend(inner, var, expr) => Algebra::Extend(Box::new(optimize(*inner, store)), var, expr),
        Algebra::Project(inner, vars) => Algebra::Project(Box::new(optimize(*inner, store)), vars),
        Algebra::Distinct(inner) => Algebra::Distinct(Box::new(optimize(*inner, store))),
        Algebra::OrderBy(inner, keys) => Algebra::OrderBy(Box::new(optimize(*inner, store)), keys),
        Algebra::Slice { input, offset, limit } => Algebra::Slice {
            input: Box::new(optimize(*input, store)),
            offset,
            limit,
        },
        other @ (Algebra::Bgp(_) | Algebra::Path { .. } | Algebra::Service { .. }) => other,
    }
}

fn flatten_join(algebra: Algebra, out: &mut Vec<Algebra>) {
    match algebra {
        Algebra::Join(a, b) => {
            flatten_join(*a, out);
            flatten_join(*b, out);
        }
        other => out.push(other),
    }
}

fn rebuild_join(mut leaves: Vec<Algebra>) -> Algebra {
    if leaves.is_empty() {
        return Algebra::Bgp(Vec::new());
    }
    let first = leaves.remove(0);
    leaves
        .into_iter()
        .fold(first, |acc, leaf| Algebra::Join(Box::new(acc), Box::new(leaf)))
}

/// A cheap cardinality estimate: how many triples a leaf's pattern(s)
/// would match against `store`, ignoring join correlation with the rest
/// of the query. Lower is assumed more selective and scheduled earlier.
fn estimate_cardinality(algebra: &Algebra, store: &TripleStore) -> usize {
    match algebra {
        Algebra::Bgp(triples) => triples.iter().map(|t| estimate_triple(t, store)).sum(),
        Algebra::Path { .. } => store.len().max(1) / 4,
        Algebra::Join(a, b) => estimate_cardinality(a, store).saturating_mul(estimate_cardinality(b, store).max(1)),
        _ => store.len(),
    }
}

fn estimate_triple(triple: &PatternTriple, store: &TripleStore) -> usize {
    let bound = [
        matches!(&triple.subject, TermOrVar::Term(_)),
        matches!(&triple.predicate, PredicateOrPath::Predicate(TermOrVar::Term(_))),
        matches!(&triple.object, TermOrVar::Term(_)),
    ]
    .into_iter()
    .filter(|b| *b)
    .count();

    let total = store.len().max(1);
    match bound {
        3 => 1,
        2 => (total / 10).max(1),
        1 => (total / 3).max(1),
        _ => total,
    }
}

/// Push `expr` down into `inner` so it runs as early as the join tree
/// lets it: if `inner` is a `Join` and every free variable in `expr`
/// appears in one side, the filter moves onto that side.
fn push_filter(expr: Expression, inner: Algebra) -> Algebra {
    if let Algebra::Join(a, b) = inner {
        let free = free_variables(&expr);
        let a_vars = bound_variables(&a);
        if free.is_subset(&a_vars) {
            return Algebra::Join(Box::new(push_filter(expr, *a)), b);
        }
        let b_vars = bound_variables(&b);
        if free.is_subset(&b_vars) {
            return Algebra::Join(a, Box::new(push_filter(expr, *b)));
        }
        return Algebra::Filter(expr, Box::new(Algebra::Join(a, b)));
    }
    Algebra::Filter(expr, Box::new(inner))
}

fn free_variables(expr: &Expression) -> HashSet<Variable> {
    let mut out = HashSet::new();
    collect_expr_vars(expr, &mut out);
    out
}

fn collect_expr_vars(expr: &Expression, out: &mut HashSet<Variable>) {
    match expr {
        Expression::Var(v) | Expression::Bound(v) => {
            out.insert(v.clone());
        }
        Expression::Literal(_) => {}
        // EXISTS/NOT EXISTS checks the subpattern against the store directly
        // and compares the result for compatibility with the outer solution;
        // it never needs its subpattern's variables pushed down to it.
        Expression::Exists { .. } => {}
        Expression::Not(inner) | Expression::Negate(inner) => collect_expr_vars(inner, out),
        Expression::Arithmetic(_, a, b) | Expression::Compare(_, a, b) | Expression::And(a, b) | Expression::Or(a, b) => {
            collect_expr_vars(a, out);
            collect_expr_vars(b, out);
        }
        Expression::Call(_, args) => {
            for arg in args {
                collect_expr_vars(arg, out);
            }
        }
        Expression::If(c, t, e) => {
            collect_expr_vars(c, out);
            collect_expr_vars(t, out);
            collect_expr_vars(e, out);
        }
    }
}

fn bound_variables(algebra: &Algebra) -> HashSet<Variable> {
    let mut out = HashSet::new();
    collect_bound(algebra, &mut out);
    out
}

fn collect_bound(algebra: &Algebra, out: &mut HashSet<Variable>) {
    match algebra {
        Algebra::Bgp(triples) => {
            for t in triples {
                if let TermOrVar::Var(v) = &t.subject {
                    out.insert(v.clone());
                }
                if let PredicateOrPath::Predicate(TermOrVar::Var(v)) = &t.predicate {
                    out.insert(v.clone());
                }
                if let TermOrVar::Var(v) = &t.object {
                    out.insert(v.clone());
                }
            }
        }
        Algebra::Path { subject, object, .. } => {
            if let TermOrVar::Var(v) = subject {
                out.insert(v.clone());
            }
            if let TermOrVar::Var(v) = object {
                out.insert(v.clone());
            }
        }
        Algebra::Join(a, b) | Algebra::Union(a, b) => {
            collect_bound(a, out);
            collect_bound(b, out);
        }
        Algebra::LeftJoin(a, b, _) => {
            collect_bound(a, out);
            collect_bound(b, out);
        }
        Algebra::Filter(_, inner) | Algebra::Distinct(inner) | Algebra::OrderBy(inner, _) => collect_bound(inner, out),
        Algebra::Extend(inner, var, _) => {
            collect_bound(inner, out);
            out.insert(var.clone());
        }
        Algebra::Project(inner, vars) => {
            collect_bound(inner, out);
            out.extend(vars.iter().cloned());
        }
        Algebra::Slice { input, .. } => collect_bound(input, out),
        Algebra::Service { pattern, .. } => collect_bound(pattern, out),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rdf_model::{Term, Triple};

    fn triple_pattern(subject: TermOrVar, predicate: TermOrVar, object: TermOrVar) -> PatternTriple {
        PatternTriple {
            subject,
            predicate: PredicateOrPath::Predicate(predicate),
            object,
        }
    }

    #[test]
    fn reorders_selective_pattern_first() {
        let mut store = TripleStore::new();
        for i in 0..100 {
            store.add(Triple::new(
                Term::iri(format!("s{i}")),
                Term::iri("type"),
                Term::iri("Thing"),
            ));
        }
        store.add(Triple::new(Term::iri("s0"), Term::iri("name"), Term::plain_literal("Alice")));

        let unselective = Algebra::Bgp(vec![triple_pattern(
            TermOrVar::Var(Variable::new("x")),
            TermOrVar::Term(Term::iri("type")),
            TermOrVar::Term(Term::iri("Thing")),
        )]);
        let selective = Algebra::Bgp(vec![triple_pattern(
            TermOrVar::Term(Term::iri("s0")),
            TermOrVar::Term(Term::iri("name")),
            TermOrVar::Var(Variable::new("n")),
        )]);

        let joined = Algebra::Join(Box::new(unselective), Box::new(selective));
        let optimized = optimize(joined, &store);

        match optimized {
            Algebra::Join(first, _) => match *first {
                Algebra::Bgp(triples) => {
                    assert!(matches!(triples[0].subject, TermOrVar::Term(_)));
                }
                other => panic!("expected Bgp leaf, got {other:?}"),
            },
            other => panic!("expected Join, got {other:?}"),
        }
    }
}

//! Fixed translation of a parsed query into the executable algebra.
//!
//! Follows the SPARQL 1.1 translation's shape (pattern first, then
//! `ORDER BY`, then `Project`, then `DISTINCT`, then `LIMIT`/`OFFSET`) so
//! that `ORDER BY` can reference variables the projection later drops.

use crate::algebra::{Algebra, PatternTriple, PredicateOrPath, TermOrVar, Variable};
use crate::ast::{GraphPattern, Query, QueryForm, SelectVariables};
use std::collections::HashSet;

/// What kind of result a translated query produces. Parallels
/// [`QueryForm`] but after `CONSTRUCT`'s template and `DESCRIBE`'s
/// resource list have been resolved against the prologue.
#[derive(Clone, Debug)]
pub enum ResolvedForm {
    /// `SELECT`
    Select,
    /// `CONSTRUCT`, carrying its triple template.
    Construct(Vec<PatternTriple>),
    /// `ASK`
    Ask,
    /// `DESCRIBE`, carrying the resources to describe.
    Describe(Vec<TermOrVar>),
}

/// A query translated down to its executable algebra plus enough of the
/// original form to drive result construction.
#[derive(Clone, Debug)]
pub struct TranslatedQuery {
    /// The operator tree to evaluate.
    pub algebra: Algebra,
    /// What kind of result this produces.
    pub form: ResolvedForm,
}

/// Errors raised while translating a parsed query.
#[derive(Debug, thiserror::Error)]
pub enum TranslateError {
    /// A `SERVICE` clause named a variable endpoint, which this engine's
    /// (unexecuted) federation stub does not support.
    #[error("SERVICE endpoint must be a concrete IRI")]
    VariableServiceEndpoint,
}

/// Translate a parsed query into its algebra.
pub fn translate(query: &Query) -> Result<TranslatedQuery, TranslateError> {
    let mut algebra = translate_pattern(&query.where_clause)?;

    if !query.modifiers.order_by.is_empty() {
        algebra = Algebra::OrderBy(Box::new(algebra), query.modifiers.order_by.clone());
    }

    let form = match &query.form {
        QueryForm::Select { variables, distinct } => {
            let vars = match variables {
                SelectVariables::Named(vars) => vars.clone(),
                SelectVariables::All => pattern_variables(&query.where_clause),
            };
            algebra = Algebra::Project(Box::new(algebra), vars);
            if *distinct {
                algebra = Algebra::Distinct(Box::new(algebra));
            }
            ResolvedForm::Select
        }
        QueryForm::Construct { template } => ResolvedForm::Construct(template.clone()),
        QueryForm::Ask => ResolvedForm::Ask,
        QueryForm::Describe { resources } => ResolvedForm::Describe(resources.clone()),
    };

    if query.modifiers.offset.is_some() || query.modifiers.limit.is_some() {
        if !matches!(form, ResolvedForm::Ask) {
            algebra = Algebra::Slice {
                input: Box::new(algebra),
                offset: query.modifiers.offset.unwrap_or(0),
                limit: query.modifiers.limit,
            };
        }
    }

    Ok(TranslatedQuery { algebra, form })
}

pub(crate) fn translate_pattern(pattern: &GraphPattern) -> Result<Algebra, TranslateError> {
    Ok(match pattern {
        GraphPattern::Empty => Algebra::Bgp(Vec::new()),
        GraphPattern::Bgp(triples) => translate_bgp(triples),
        GraphPattern::Path { subject, path, object } => Algebra::Path {
            subject: subject.clone(),
            path: path.clone(),
            object: object.clone(),
        },
        GraphPattern::Join(a, b) => {
            Algebra::Join(Box::new(translate_pattern(a)?), Box::new(translate_pattern(b)?))
        }
        GraphPattern::Optional(a, b) => {
            Algebra::LeftJoin(Box::new(translate_pattern(a)?), Box::new(translate_pattern(b)?), None)
        }
        GraphPattern::Union(a, b) => {
            Algebra::Union(Box::new(translate_pattern(a)?), Box::new(translate_pattern(b)?))
        }
        GraphPattern::Filter(expr, inner) => Algebra::Filter(expr.clone(), Box::new(translate_pattern(inner)?)),
        GraphPattern::Bind(expr, var, inner) => {
            Algebra::Extend(Box::new(translate_pattern(inner)?), var.clone(), expr.clone())
        }
        GraphPattern::Service { endpoint, pattern } => {
            let TermOrVar::Term(endpoint) = endpoint else {
                return Err(TranslateError::VariableServiceEndpoint);
            };
            Algebra::Service {
                endpoint: endpoint.clone(),
                pattern: Box::new(translate_pattern(pattern)?),
            }
        }
    })
}

/// Fold a flat BGP into a left-leaning `Join` tree of single-triple
/// leaves, so the optimizer can reorder and push filters through it
/// uniformly with any other join.
fn translate_bgp(triples: &[PatternTriple]) -> Algebra {
    let mut leaves = triples.iter().map(|t| match &t.predicate {
        PredicateOrPath::Predicate(_) => Algebra::Bgp(vec![t.clone()]),
        PredicateOrPath::Path(path) => Algebra::Path {
            subject: t.subject.clone(),
            path: path.clone(),
            object: t.object.clone(),
        },
    });

    let Some(first) = leaves.next() else {
        return Algebra::Bgp(Vec::new());
    };
    leaves.fold(first, |acc, leaf| Algebra::Join(Box::new(acc), Box::new(leaf)))
}

/// Every distinct variable mentioned anywhere in `pattern`, in first-seen
/// order (used for `SELECT *`).
fn pattern_variables(pattern: &GraphPattern) -> Vec<Variable> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    collect_vars(pattern, &mut seen, &mut out);
    out
}

fn collect_vars(pattern: &GraphPattern, seen: &mut HashSet<Variable>, out: &mut Vec<Variable>) {
    let mut push = |v: &Variable, seen: &mut HashSet<Variable>, out: &mut Vec<Variable>| {
        if seen.insert(v.clone()) {
            out.push(v.clone());
        }
    };
    match pattern {
        GraphPattern::Empty => {}
        GraphPattern::Bgp(triples) => {
            for t in triples {
                if let TermOrVar::Var(v) = &t.subject {
                    push(v, seen, out);
                }
                if let PredicateOrPath::Predicate(TermOrVar::Var(v)) = &t.predicate {
                    push(v, seen, out);
                }
                if let TermOrVar::Var(v) = &t.object {
                    push(v, seen, out);
                }
            }
        }
        GraphPattern::Path { subject, object, .. } => {
            if let TermOrVar::Var(v) = subject {
                push(v, seen, out);
            }
            if let TermOrVar::Var(v) = object {
                push(v, seen, out);
            }
        }
        GraphPattern::Join(a, b) | GraphPattern::Optional(a, b) | GraphPattern::Union(a, b) => {
            collect_vars(a, seen, out);
            collect_vars(b, seen, out);
        }
        GraphPattern::Filter(_, inner) => collect_vars(inner, seen, out),
        GraphPattern::Bind(_, var, inner) => {
            collect_vars(inner, seen, out);
            push(var, seen, out);
        }
        GraphPattern::Service { pattern, .. } => collect_vars(pattern, seen, out),
    }
}

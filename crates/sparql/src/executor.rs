//! Lazy, pull-based evaluation of an [`Algebra`] tree against a
//! [`TripleStore`], producing [`SolutionMapping`]s one at a time.
//!
//! Most operators stream: a `Bgp`/`Path` leaf, `Union`, `Filter`,
//! `Extend`, `Project`, and the probe side of a join all pull from their
//! input and yield as soon as they have a result. `Distinct` and
//! `OrderBy` must see every solution before they can yield the first
//! one, and the build side of `Join`/`LeftJoin` is materialized eagerly
//! so the probe side can be checked against it repeatedly; both are
//! documented exceptions to the otherwise-lazy model.

use crate::algebra::{Algebra, OrderKey, PatternTriple, PredicateOrPath, SortDirection, TermOrVar, Variable};
use crate::expr::{self, ExprError, Value};
use crate::path::{self, PathError};
use crate::solution::SolutionMapping;
use crate::translate::{ResolvedForm, TranslatedQuery};
use rdf_model::{Term, Triple};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::Instant;
use storage::{TermPattern, TriplePattern, TripleStore};
use tracing::{debug, warn};

/// A lazily-produced sequence of solutions.
pub type SolutionStream<'s> = Box<dyn Iterator<Item = Result<SolutionMapping, ExecutionError>> + 's>;

/// Errors raised while executing a translated query.
#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    /// An expression in a `FILTER`/`BIND`/`ORDER BY` could not be
    /// evaluated in a way that should abort the query (most expression
    /// errors are caught locally and treated as a non-match instead).
    #[error("expression evaluation failed: {0}")]
    Expression(#[from] ExprError),
    /// A property path's endpoints were both unbound.
    #[error("path evaluation failed: {0}")]
    Path(#[from] PathError),
    /// An algebra shape this executor does not evaluate, namely an
    /// actual (rather than merely translated) `SERVICE` clause.
    #[error("unsupported operation: {0}")]
    Unsupported(String),
    /// Execution was cancelled or exceeded its deadline.
    #[error("execution cancelled")]
    Cancelled,
}

/// Cooperative cancellation for a running query: checked once per
/// solution pulled, so a long-running `ORDER BY`/`Distinct` materialization
/// is the only place a cancellation can be observed late.
#[derive(Clone)]
pub struct ExecutionControl {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl ExecutionControl {
    /// A control with no cancellation flag and no deadline.
    pub fn unbounded() -> Self {
        ExecutionControl {
            cancelled: Arc::new(AtomicBool::new(false)),
            deadline: None,
        }
    }

    /// A control sharing `cancelled` and enforcing `deadline`.
    pub fn new(cancelled: Arc<AtomicBool>, deadline: Option<Instant>) -> Self {
        ExecutionControl { cancelled, deadline }
    }

    fn is_stopped(&self) -> bool {
        self.cancelled.load(AtomicOrdering::Relaxed) || self.deadline.map_or(false, |d| Instant::now() >= d)
    }
}

impl Default for ExecutionControl {
    fn default() -> Self {
        Self::unbounded()
    }
}

struct Context<'s> {
    store: &'s TripleStore,
}

/// Evaluate a `SELECT` query, yielding one [`SolutionMapping`] per row in
/// the order the algebra produces them (already reflecting `ORDER BY`,
/// `DISTINCT`, and `LIMIT`/`OFFSET` if present).
pub fn execute_select<'s>(
    query: &'s TranslatedQuery,
    store: &'s TripleStore,
    control: ExecutionControl,
) -> Result<SolutionStream<'s>, ExecutionError> {
    if !matches!(query.form, ResolvedForm::Select) {
        return Err(ExecutionError::Unsupported("query is not a SELECT".into()));
    }
    debug!("starting SELECT execution");
    let ctx = Context { store };
    Ok(cancellable(eval(&query.algebra, &ctx), control))
}

/// Evaluate an `ASK` query: whether the pattern has at least one solution.
pub fn execute_ask(query: &TranslatedQuery, store: &TripleStore, control: ExecutionControl) -> Result<bool, ExecutionError> {
    if !matches!(query.form, ResolvedForm::Ask) {
        return Err(ExecutionError::Unsupported("query is not an ASK".into()));
    }
    let ctx = Context { store };
    let mut stream = cancellable(eval(&query.algebra, &ctx), control);
    let result = match stream.next() {
        Some(Ok(_)) => Ok(true),
        Some(Err(e)) => Err(e),
        None => Ok(false),
    };
    debug!(result = ?result, "ASK execution finished");
    result
}

/// Evaluate a `CONSTRUCT` query: instantiate the template once per
/// solution, skipping any instantiated triple that references an
/// unbound variable, and deduplicating the result (a store has set
/// semantics, so the returned triples would collapse on insertion
/// anyway; deduplicating here avoids claiming a larger result than a
/// caller who inserts them will actually end up with).
pub fn execute_construct(query: &TranslatedQuery, store: &TripleStore, control: ExecutionControl) -> Result<Vec<Triple>, ExecutionError> {
    let ResolvedForm::Construct(template) = &query.form else {
        return Err(ExecutionError::Unsupported("query is not a CONSTRUCT".into()));
    };
    let ctx = Context { store };
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for solution in cancellable(eval(&query.algebra, &ctx), control) {
        let solution = solution?;
        for triple in instantiate_template(template, &solution) {
            if seen.insert(triple.clone()) {
                out.push(triple);
            }
        }
    }
    debug!(triples = out.len(), "CONSTRUCT execution finished");
    Ok(out)
}

/// Evaluate a `DESCRIBE` query: the concise bounded description (every
/// triple with the resource as subject or object) of each resolved
/// resource. A variable resource is resolved against every solution of
/// the pattern; a concrete IRI/blank node is described directly without
/// running the pattern at all.
pub fn execute_describe(query: &TranslatedQuery, store: &TripleStore, control: ExecutionControl) -> Result<Vec<Triple>, ExecutionError> {
    let ResolvedForm::Describe(resources) = &query.form else {
        return Err(ExecutionError::Unsupported("query is not a DESCRIBE".into()));
    };
    let ctx = Context { store };
    let mut targets: HashSet<Term> = HashSet::new();

    for resource in resources {
        match resource {
            TermOrVar::Term(term) => {
                targets.insert(term.clone());
            }
            TermOrVar::Var(var) => {
                for solution in cancellable(eval(&query.algebra, &ctx), control.clone()) {
                    if let Some(term) = solution?.get(var) {
                        targets.insert(term.clone());
                    }
                }
            }
        }
    }

    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for resource in &targets {
        for triple in concise_bounded_description(store, resource) {
            if seen.insert(triple.clone()) {
                out.push(triple);
            }
        }
    }
    debug!(resources = targets.len(), triples = out.len(), "DESCRIBE execution finished");
    Ok(out)
}

fn concise_bounded_description(store: &TripleStore, resource: &Term) -> Vec<Triple> {
    let as_subject = TriplePattern::new(
        TermPattern::Concrete(resource.clone()),
        TermPattern::Any,
        TermPattern::Any,
    );
    let as_object = TriplePattern::new(
        TermPattern::Any,
        TermPattern::Any,
        TermPattern::Concrete(resource.clone()),
    );
    store
        .match_pattern(&as_subject)
        .chain(store.match_pattern(&as_object))
        .cloned()
        .collect()
}

fn instantiate_template(template: &[PatternTriple], solution: &SolutionMapping) -> Vec<Triple> {
    template
        .iter()
        .filter_map(|pattern| {
            let subject = resolve_term(&pattern.subject, solution)?;
            let PredicateOrPath::Predicate(predicate_pos) = &pattern.predicate else {
                return None;
            };
            let predicate = resolve_term(predicate_pos, solution)?;
            let object = resolve_term(&pattern.object, solution)?;
            if !(subject.is_iri() || subject.is_blank_node()) || !predicate.is_iri() {
                return None;
            }
            Some(Triple::new_unchecked(subject, predicate, object))
        })
        .collect()
}

fn resolve_term(pos: &TermOrVar, solution: &SolutionMapping) -> Option<Term> {
    match pos {
        TermOrVar::Term(t) => Some(t.clone()),
        TermOrVar::Var(v) => solution.get(v).cloned(),
    }
}

fn cancellable<'s>(inner: SolutionStream<'s>, control: ExecutionControl) -> SolutionStream<'s> {
    Box::new(CancellableIter { inner, control, stopped: false })
}

struct CancellableIter<'s> {
    inner: SolutionStream<'s>,
    control: ExecutionControl,
    stopped: bool,
}

impl Iterator for CancellableIter<'_> {
    type Item = Result<SolutionMapping, ExecutionError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.stopped {
            return None;
        }
        if self.control.is_stopped() {
            self.stopped = true;
            warn!("query execution cancelled or deadline exceeded");
            return Some(Err(ExecutionError::Cancelled));
        }
        self.inner.next()
    }
}

fn eval<'s>(algebra: &'s Algebra, ctx: &Context<'s>) -> SolutionStream<'s> {
    match algebra {
        Algebra::Bgp(triples) => eval_bgp(triples, ctx),
        Algebra::Path { subject, path, object } => eval_path(subject, path, object, ctx),
        Algebra::Join(a, b) => eval_join(a, b, ctx),
        Algebra::LeftJoin(a, b, filter) => eval_left_join(a, b, filter.as_ref(), ctx),
        Algebra::Union(a, b) => Box::new(eval(a, ctx).chain(eval(b, ctx))),
        Algebra::Filter(expr, inner) => eval_filter(expr, inner, ctx),
        Algebra::Extend(inner, var, expr) => eval_extend(inner, var, expr, ctx),
        Algebra::Project(inner, vars) => {
            let vars = vars.clone();
            Box::new(eval(inner, ctx).map(move |sol| sol.map(|s| s.project(&vars))))
        }
        Algebra::Distinct(inner) => eval_distinct(inner, ctx),
        Algebra::OrderBy(inner, keys) => eval_order_by(inner, keys, ctx),
        Algebra::Slice { input, offset, limit } => eval_slice(input, *offset, *limit, ctx),
        Algebra::Service { .. } => Box::new(std::iter::once(Err(ExecutionError::Unsupported(
            "SERVICE clauses are not executed".into(),
        )))),
    }
}

fn term_pattern_for(pos: &TermOrVar, solution: &SolutionMapping) -> TermPattern {
    match pos {
        TermOrVar::Term(t) => TermPattern::Concrete(t.clone()),
        TermOrVar::Var(v) => match solution.get(v) {
            Some(t) => TermPattern::Concrete(t.clone()),
            None => TermPattern::Any,
        },
    }
}

fn bind_position(solution: &mut SolutionMapping, pos: &TermOrVar, term: &Term) -> bool {
    match pos {
        TermOrVar::Term(t) => t == term,
        TermOrVar::Var(v) => solution.bind(v.clone(), term.clone()),
    }
}

fn eval_bgp<'s>(triples: &'s [PatternTriple], ctx: &Context<'s>) -> SolutionStream<'s> {
    let store = ctx.store;
    let mut stream: SolutionStream<'s> = Box::new(std::iter::once(Ok(SolutionMapping::new())));
    for triple in triples {
        stream = Box::new(stream.flat_map(move |result| -> SolutionStream<'s> {
            match result {
                Err(e) => Box::new(std::iter::once(Err(e))),
                Ok(solution) => match_single_triple(store, triple, solution),
            }
        }));
    }
    stream
}

fn match_single_triple<'s>(store: &'s TripleStore, triple: &'s PatternTriple, solution: SolutionMapping) -> SolutionStream<'s> {
    let PredicateOrPath::Predicate(predicate_pos) = &triple.predicate else {
        return eval_path_with_base(store, &triple.subject, &triple.object, &triple.predicate, solution);
    };
    let pattern = TriplePattern::new(
        term_pattern_for(&triple.subject, &solution),
        term_pattern_for(predicate_pos, &solution),
        term_pattern_for(&triple.object, &solution),
    );
    // Collect into an owned Vec rather than returning `store.match_pattern`'s
    // borrowing iterator directly: the pattern is built fresh per call and
    // can't outlive this function, but the matching triples can be cloned
    // out and carried in the returned stream instead.
    let matches: Vec<Triple> = store.match_pattern(&pattern).cloned().collect();
    let subject_pos = triple.subject.clone();
    let predicate_pos = predicate_pos.clone();
    let object_pos = triple.object.clone();
    Box::new(matches.into_iter().filter_map(move |candidate| {
        let mut extended = solution.clone();
        if bind_position(&mut extended, &subject_pos, &candidate.subject)
            && bind_position(&mut extended, &predicate_pos, &candidate.predicate)
            && bind_position(&mut extended, &object_pos, &candidate.object)
        {
            Some(Ok(extended))
        } else {
            None
        }
    }))
}

fn eval_path_with_base<'s>(
    store: &'s TripleStore,
    subject: &'s TermOrVar,
    object: &'s TermOrVar,
    predicate: &'s PredicateOrPath,
    solution: SolutionMapping,
) -> SolutionStream<'s> {
    let PredicateOrPath::Path(path) = predicate else {
        unreachable!("eval_path_with_base only called for Path predicates");
    };
    let start = match subject {
        TermOrVar::Term(t) => Some(t.clone()),
        TermOrVar::Var(v) => solution.get(v).cloned(),
    };
    let end = match object {
        TermOrVar::Term(t) => Some(t.clone()),
        TermOrVar::Var(v) => solution.get(v).cloned(),
    };
    let pairs = match path::evaluate_path(store, path, start.as_ref(), end.as_ref()) {
        Ok(pairs) => pairs,
        Err(e) => return Box::new(std::iter::once(Err(ExecutionError::from(e)))),
    };
    let subject = subject.clone();
    let object = object.clone();
    Box::new(pairs.into_iter().filter_map(move |(s, o)| {
        let mut extended = solution.clone();
        if bind_position(&mut extended, &subject, &s) && bind_position(&mut extended, &object, &o) {
            Some(Ok(extended))
        } else {
            None
        }
    }))
}

fn eval_path<'s>(subject: &'s TermOrVar, path_expr: &'s crate::path::PropertyPath, object: &'s TermOrVar, ctx: &Context<'s>) -> SolutionStream<'s> {
    let start = match subject {
        TermOrVar::Term(t) => Some(t.clone()),
        TermOrVar::Var(_) => None,
    };
    let end = match object {
        TermOrVar::Term(t) => Some(t.clone()),
        TermOrVar::Var(_) => None,
    };
    let pairs = match path::evaluate_path(ctx.store, path_expr, start.as_ref(), end.as_ref()) {
        Ok(pairs) => pairs,
        Err(e) => return Box::new(std::iter::once(Err(ExecutionError::from(e)))),
    };
    Box::new(pairs.into_iter().filter_map(move |(s, o)| {
        let mut solution = SolutionMapping::new();
        if bind_position(&mut solution, subject, &s) && bind_position(&mut solution, object, &o) {
            Some(Ok(solution))
        } else {
            None
        }
    }))
}

/// Nested-loop join: materialize the left side, then stream the right
/// side lazily, merging each right solution against every compatible
/// left solution.
fn eval_join<'s>(a: &'s Algebra, b: &'s Algebra, ctx: &Context<'s>) -> SolutionStream<'s> {
    let left: Result<Vec<SolutionMapping>, ExecutionError> = eval(a, ctx).collect();
    let left = match left {
        Ok(left) => left,
        Err(e) => return Box::new(std::iter::once(Err(e))),
    };
    Box::new(eval(b, ctx).flat_map(move |result| -> SolutionStream<'s> {
        match result {
            Err(e) => Box::new(std::iter::once(Err(e))),
            Ok(right) => {
                let merged: Vec<_> = left
                    .iter()
                    .filter_map(|l| l.merge(&right))
                    .map(Ok)
                    .collect();
                Box::new(merged.into_iter())
            }
        }
    }))
}

fn eval_left_join<'s>(
    a: &'s Algebra,
    b: &'s Algebra,
    filter: Option<&'s crate::expr::Expression>,
    ctx: &Context<'s>,
) -> SolutionStream<'s> {
    let right: Result<Vec<SolutionMapping>, ExecutionError> = eval(b, ctx).collect();
    let right = match right {
        Ok(right) => right,
        Err(e) => return Box::new(std::iter::once(Err(e))),
    };
    let store = ctx.store;
    Box::new(eval(a, ctx).flat_map(move |result| -> SolutionStream<'s> {
        match result {
            Err(e) => Box::new(std::iter::once(Err(e))),
            Ok(left) => {
                let matches: Vec<SolutionMapping> = right
                    .iter()
                    .filter_map(|r| left.merge(r))
                    .filter(|merged| match filter {
                        None => true,
                        Some(expr) => expr::evaluate(expr, merged, store).map(|v| v.effective_boolean()).unwrap_or(false),
                    })
                    .collect();
                if matches.is_empty() {
                    Box::new(std::iter::once(Ok(left)))
                } else {
                    Box::new(matches.into_iter().map(Ok))
                }
            }
        }
    }))
}

fn eval_filter<'s>(expr: &'s crate::expr::Expression, inner: &'s Algebra, ctx: &Context<'s>) -> SolutionStream<'s> {
    let store = ctx.store;
    Box::new(eval(inner, ctx).filter_map(move |result| match result {
        Err(e) => Some(Err(e)),
        Ok(solution) => match expr::evaluate(expr, &solution, store) {
            Ok(value) if value.effective_boolean() => Some(Ok(solution)),
            Ok(_) => None,
            Err(_) => None,
        },
    }))
}

fn eval_extend<'s>(inner: &'s Algebra, var: &'s Variable, expr: &'s crate::expr::Expression, ctx: &Context<'s>) -> SolutionStream<'s> {
    let store = ctx.store;
    Box::new(eval(inner, ctx).map(move |result| {
        result.map(|mut solution| {
            if let Ok(Value::Term(term)) = expr::evaluate(expr, &solution, store) {
                solution.extend(var.clone(), term);
            }
            solution
        })
    }))
}

fn eval_distinct<'s>(inner: &'s Algebra, ctx: &Context<'s>) -> SolutionStream<'s> {
    let mut seen: HashSet<SolutionMapping> = HashSet::new();
    let mut out = Vec::new();
    for result in eval(inner, ctx) {
        match result {
            Err(e) => {
                out.push(Err(e));
                break;
            }
            Ok(solution) => {
                if seen.insert(solution.clone()) {
                    out.push(Ok(solution));
                }
            }
        }
    }
    Box::new(out.into_iter())
}

fn eval_order_by<'s>(inner: &'s Algebra, keys: &'s [OrderKey], ctx: &Context<'s>) -> SolutionStream<'s> {
    let mut materialized = Vec::new();
    for result in eval(inner, ctx) {
        match result {
            Err(e) => return Box::new(std::iter::once(Err(e))),
            Ok(solution) => materialized.push(solution),
        }
    }
    let store = ctx.store;
    materialized.sort_by(|a, b| compare_by_keys(keys, a, b, store));
    Box::new(materialized.into_iter().map(Ok))
}

fn compare_by_keys(keys: &[OrderKey], a: &SolutionMapping, b: &SolutionMapping, store: &TripleStore) -> Ordering {
    for key in keys {
        let va = expr::evaluate(&key.expr, a, store).ok();
        let vb = expr::evaluate(&key.expr, b, store).ok();
        let ordering = compare_order_values(va, vb);
        let ordering = match key.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

/// Order two evaluated `ORDER BY` key values. An unbound/erroring key
/// sorts after every bound value, regardless of sort direction (the
/// direction only flips comparisons between two bound values).
fn compare_order_values(a: Option<Value>, b: Option<Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => compare_values(&a, &b),
    }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Term(Term::Literal(la)), Value::Term(Term::Literal(lb))) => {
            match (la.as_f64(), lb.as_f64()) {
                (Some(x), Some(y)) if la.has_datatype() && lb.has_datatype() => {
                    x.partial_cmp(&y).unwrap_or(Ordering::Equal)
                }
                _ => la.lexical_form.cmp(&lb.lexical_form),
            }
        }
        (Value::Term(ta), Value::Term(tb)) => ta.to_string().cmp(&tb.to_string()),
        (Value::Boolean(x), Value::Boolean(y)) => x.cmp(y),
        _ => format!("{a:?}").cmp(&format!("{b:?}")),
    }
}

/// Whether `pattern` has at least one solution compatible with `solution`,
/// i.e. whether `EXISTS { pattern }` holds for the outer row `solution`.
/// Short-circuits on the first compatible candidate, since `EXISTS` only
/// asks about non-emptiness, not how many solutions there are.
pub(crate) fn exists_any_compatible(store: &TripleStore, pattern: &Algebra, solution: &SolutionMapping) -> Result<bool, ExecutionError> {
    let ctx = Context { store };
    for result in eval(pattern, &ctx) {
        if result?.compatible_with(solution) {
            return Ok(true);
        }
    }
    Ok(false)
}

fn eval_slice<'s>(input: &'s Algebra, offset: usize, limit: Option<usize>, ctx: &Context<'s>) -> SolutionStream<'s> {
    let stream = eval(input, ctx).skip(offset);
    match limit {
        Some(limit) => Box::new(stream.take(limit)),
        None => Box::new(stream),
    }
}

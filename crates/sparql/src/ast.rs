//! The parsed query tree: what [`crate::parser::Parser`] produces, before
//! [`crate::translate::translate`] turns it into [`crate::algebra::Algebra`].

use crate::algebra::{OrderKey, PatternTriple, TermOrVar, Variable};
use crate::expr::Expression;
use crate::path::PropertyPath;
use std::collections::HashMap;

/// The `PREFIX`/`BASE` declarations at the head of a query.
#[derive(Clone, Debug, Default)]
pub struct Prologue {
    /// The `BASE` IRI, if declared.
    pub base: Option<String>,
    /// Prefix -> namespace IRI.
    pub prefixes: HashMap<String, String>,
}

/// Which variables a `SELECT` projects.
#[derive(Clone, Debug)]
pub enum SelectVariables {
    /// `SELECT *`
    All,
    /// `SELECT ?x ?y`
    Named(Vec<Variable>),
}

/// The query form: what kind of result shape this query produces.
#[derive(Clone, Debug)]
pub enum QueryForm {
    /// `SELECT`
    Select {
        /// The projected variables.
        variables: SelectVariables,
        /// Whether `DISTINCT` was specified.
        distinct: bool,
    },
    /// `CONSTRUCT { template }`
    Construct {
        /// The triple template to instantiate per solution.
        template: Vec<PatternTriple>,
    },
    /// `ASK`
    Ask,
    /// `DESCRIBE`
    Describe {
        /// The resources to describe.
        resources: Vec<TermOrVar>,
    },
}

/// `ORDER BY` / `LIMIT` / `OFFSET` (and `DISTINCT`, folded into
/// [`QueryForm::Select`] instead since it's form-specific).
#[derive(Clone, Debug, Default)]
pub struct SolutionModifier {
    /// `ORDER BY` keys, outermost first.
    pub order_by: Vec<OrderKey>,
    /// `LIMIT`
    pub limit: Option<usize>,
    /// `OFFSET`
    pub offset: Option<usize>,
}

/// A parsed `WHERE` graph pattern.
#[derive(Clone, Debug)]
pub enum GraphPattern {
    /// The empty pattern (matches the single empty solution).
    Empty,
    /// A basic graph pattern.
    Bgp(Vec<PatternTriple>),
    /// A single property-path triple.
    Path {
        /// Subject position.
        subject: TermOrVar,
        /// Path expression.
        path: PropertyPath,
        /// Object position.
        object: TermOrVar,
    },
    /// Sequential conjunction of two patterns (`{ a } { b }` or `a . b`).
    Join(Box<GraphPattern>, Box<GraphPattern>),
    /// `a OPTIONAL { b }`.
    Optional(Box<GraphPattern>, Box<GraphPattern>),
    /// `a UNION b`.
    Union(Box<GraphPattern>, Box<GraphPattern>),
    /// `a . FILTER(expr)` (the filter applies to everything before it in
    /// the same group).
    Filter(Expression, Box<GraphPattern>),
    /// `a . BIND(expr AS ?v)`.
    Bind(Expression, Variable, Box<GraphPattern>),
    /// `SERVICE <endpoint> { pattern }`.
    Service {
        /// Endpoint IRI.
        endpoint: TermOrVar,
        /// Inner pattern.
        pattern: Box<GraphPattern>,
    },
}

/// A fully parsed query.
#[derive(Clone, Debug)]
pub struct Query {
    /// `PREFIX`/`BASE` declarations.
    pub prologue: Prologue,
    /// What kind of query this is.
    pub form: QueryForm,
    /// The `WHERE` pattern (or `CONSTRUCT`/`DESCRIBE`'s implicit pattern).
    pub where_clause: GraphPattern,
    /// `ORDER BY`/`LIMIT`/`OFFSET`.
    pub modifiers: SolutionModifier,
}

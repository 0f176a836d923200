//! Filter/BIND expressions and their evaluation against a solution.

use crate::algebra::{Algebra, Variable};
use crate::solution::SolutionMapping;
use rdf_model::{Term, Vocabulary};
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;
use storage::TripleStore;

/// An expression usable in `FILTER`, `BIND`, and `ORDER BY`.
#[derive(Clone, Debug)]
pub enum Expression {
    /// A variable reference.
    Var(Variable),
    /// A literal constant.
    Literal(Term),
    /// `!expr`
    Not(Box<Expression>),
    /// Unary minus.
    Negate(Box<Expression>),
    /// Binary arithmetic (`+ - * /`).
    Arithmetic(ArithOp, Box<Expression>, Box<Expression>),
    /// Binary comparison (`= != < <= > >=`).
    Compare(CompareOp, Box<Expression>, Box<Expression>),
    /// `&&`
    And(Box<Expression>, Box<Expression>),
    /// `||`
    Or(Box<Expression>, Box<Expression>),
    /// A builtin function call.
    Call(BuiltinFn, Vec<Expression>),
    /// `BOUND(?x)`
    Bound(Variable),
    /// `IF(cond, then, else)`
    If(Box<Expression>, Box<Expression>, Box<Expression>),
    /// `EXISTS { pattern }` (`negate: false`) / `NOT EXISTS { pattern }`
    /// (`negate: true`). `pattern` is already translated algebra (lowered
    /// by the parser at parse time, since a nested graph pattern used as
    /// part of an expression has nowhere else to live). True iff the
    /// pattern has at least one solution compatible with the evaluating
    /// solution, negated when `negate` is set.
    Exists {
        /// Whether this is `NOT EXISTS` rather than `EXISTS`.
        negate: bool,
        /// The subpattern to check for a compatible solution.
        pattern: Box<Algebra>,
    },
}

/// Arithmetic operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArithOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
}

/// Comparison operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompareOp {
    /// `=`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
}

/// The builtin functions this engine implements.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BuiltinFn {
    /// `STR(x)`
    Str,
    /// `UCASE(x)`
    Ucase,
    /// `LCASE(x)`
    Lcase,
    /// `STRLEN(x)`
    StrLen,
    /// `CONTAINS(haystack, needle)`
    Contains,
    /// `REGEX(text, pattern)` or `REGEX(text, pattern, flags)`
    Regex,
    /// `ISIRI(x)`
    IsIri,
    /// `ISLITERAL(x)`
    IsLiteral,
}

/// An evaluated expression value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// A bound RDF term.
    Term(Term),
    /// A plain boolean, for comparisons/logical connectives.
    Boolean(bool),
    /// No value: the expression was ill-typed or referenced an unbound
    /// variable. `FILTER` treats this as a non-match; `BIND` leaves the
    /// target variable unbound.
    Unbound,
}

impl Value {
    /// The SPARQL "effective boolean value" of this value.
    pub fn effective_boolean(&self) -> bool {
        match self {
            Value::Boolean(b) => *b,
            Value::Term(Term::Literal(lit)) => {
                if let Some(b) = lit.as_bool() {
                    b
                } else if let Some(n) = lit.as_f64() {
                    n != 0.0
                } else {
                    !lit.lexical_form.is_empty()
                }
            }
            Value::Term(_) => true,
            Value::Unbound => false,
        }
    }
}

/// Errors evaluating an expression. Callers in `Filter`/`Extend` catch
/// these locally and fall back to [`Value::Unbound`]/`false` rather than
/// aborting the query.
#[derive(Debug, thiserror::Error)]
pub enum ExprError {
    /// A variable referenced in the expression had no binding.
    #[error("unbound variable ?{0}")]
    UnboundVariable(String),
    /// An operator was applied to an incompatible operand type.
    #[error("type error: {0}")]
    TypeError(String),
    /// Division by zero.
    #[error("division by zero")]
    DivisionByZero,
    /// An `EXISTS`/`NOT EXISTS` subpattern failed to evaluate.
    #[error("subpattern evaluation failed: {0}")]
    Subpattern(String),
}

/// Evaluate `expr` against `solution`, resolving `EXISTS`/`NOT EXISTS`
/// subpatterns against `store`.
pub fn evaluate(expr: &Expression, solution: &SolutionMapping, store: &TripleStore) -> Result<Value, ExprError> {
    match expr {
        Expression::Var(v) => match solution.get(v) {
            Some(term) => Ok(Value::Term(term.clone())),
            None => Ok(Value::Unbound),
        },
        Expression::Literal(term) => Ok(Value::Term(term.clone())),
        Expression::Not(inner) => {
            let v = evaluate(inner, solution, store)?;
            Ok(Value::Boolean(!v.effective_boolean()))
        }
        Expression::Negate(inner) => {
            let v = evaluate(inner, solution, store)?;
            match numeric(&v)? {
                n => Ok(Value::Term(Term::typed_literal(format_number(-n), Vocabulary::XSD_DOUBLE))),
            }
        }
        Expression::Arithmetic(op, lhs, rhs) => {
            let l = numeric(&evaluate(lhs, solution, store)?)?;
            let r = numeric(&evaluate(rhs, solution, store)?)?;
            let result = match op {
                ArithOp::Add => l + r,
                ArithOp::Sub => l - r,
                ArithOp::Mul => l * r,
                ArithOp::Div => {
                    if r == 0.0 {
                        return Err(ExprError::DivisionByZero);
                    }
                    l / r
                }
            };
            Ok(Value::Term(Term::typed_literal(format_number(result), Vocabulary::XSD_DOUBLE)))
        }
        Expression::Compare(op, lhs, rhs) => {
            let l = evaluate(lhs, solution, store)?;
            let r = evaluate(rhs, solution, store)?;
            Ok(Value::Boolean(compare(*op, &l, &r)?))
        }
        Expression::And(lhs, rhs) => {
            let l = evaluate(lhs, solution, store)?;
            if !l.effective_boolean() {
                return Ok(Value::Boolean(false));
            }
            let r = evaluate(rhs, solution, store)?;
            Ok(Value::Boolean(r.effective_boolean()))
        }
        Expression::Or(lhs, rhs) => {
            let l = evaluate(lhs, solution, store)?;
            if l.effective_boolean() {
                return Ok(Value::Boolean(true));
            }
            let r = evaluate(rhs, solution, store)?;
            Ok(Value::Boolean(r.effective_boolean()))
        }
        Expression::Bound(v) => Ok(Value::Boolean(solution.get(v).is_some())),
        Expression::If(cond, then, els) => {
            let c = evaluate(cond, solution, store)?;
            if c.effective_boolean() {
                evaluate(then, solution, store)
            } else {
                evaluate(els, solution, store)
            }
        }
        Expression::Exists { negate, pattern } => {
            let found = crate::executor::exists_any_compatible(store, pattern, solution)
                .map_err(|e| ExprError::Subpattern(e.to_string()))?;
            Ok(Value::Boolean(if *negate { !found } else { found }))
        }
        Expression::Call(f, args) => evaluate_call(*f, args, solution, store),
    }
}

fn evaluate_call(f: BuiltinFn, args: &[Expression], solution: &SolutionMapping, store: &TripleStore) -> Result<Value, ExprError> {
    let values: Result<Vec<Value>, ExprError> = args.iter().map(|a| evaluate(a, solution, store)).collect();
    let values = values?;
    match (f, values.as_slice()) {
        (BuiltinFn::Str, [v]) => Ok(Value::Term(Term::plain_literal(lexical_of(v)?))),
        (BuiltinFn::Ucase, [v]) => Ok(Value::Term(Term::plain_literal(lexical_of(v)?.to_uppercase()))),
        (BuiltinFn::Lcase, [v]) => Ok(Value::Term(Term::plain_literal(lexical_of(v)?.to_lowercase()))),
        (BuiltinFn::StrLen, [v]) => {
            let len = lexical_of(v)?.chars().count();
            Ok(Value::Term(Term::typed_literal(len.to_string(), Vocabulary::XSD_INTEGER)))
        }
        (BuiltinFn::Contains, [h, n]) => {
            Ok(Value::Boolean(lexical_of(h)?.contains(&lexical_of(n)?)))
        }
        (BuiltinFn::Regex, [text, pattern]) => Ok(Value::Boolean(regex_matches(&lexical_of(text)?, &lexical_of(pattern)?, "")?)),
        (BuiltinFn::Regex, [text, pattern, flags]) => {
            Ok(Value::Boolean(regex_matches(&lexical_of(text)?, &lexical_of(pattern)?, &lexical_of(flags)?)?))
        }
        (BuiltinFn::IsIri, [Value::Term(Term::Iri(_))]) => Ok(Value::Boolean(true)),
        (BuiltinFn::IsIri, [_]) => Ok(Value::Boolean(false)),
        (BuiltinFn::IsLiteral, [Value::Term(Term::Literal(_))]) => Ok(Value::Boolean(true)),
        (BuiltinFn::IsLiteral, [_]) => Ok(Value::Boolean(false)),
        _ => Err(ExprError::TypeError("builtin called with wrong arity".into())),
    }
}

fn lexical_of(value: &Value) -> Result<String, ExprError> {
    match value {
        Value::Term(Term::Literal(lit)) => Ok(lit.lexical_form.to_string()),
        Value::Term(Term::Iri(iri)) => Ok(iri.as_str().to_string()),
        Value::Term(Term::BlankNode(b)) => Ok(b.label().to_string()),
        Value::Boolean(b) => Ok(b.to_string()),
        Value::Unbound => Err(ExprError::UnboundVariable("<expression>".into())),
    }
}

fn numeric(value: &Value) -> Result<f64, ExprError> {
    match value {
        Value::Term(Term::Literal(lit)) => lit
            .as_f64()
            .ok_or_else(|| ExprError::TypeError("expected a numeric literal".into())),
        _ => Err(ExprError::TypeError("expected a numeric literal".into())),
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

fn compare(op: CompareOp, lhs: &Value, rhs: &Value) -> Result<bool, ExprError> {
    use CompareOp::*;
    if op == Eq || op == Ne {
        let eq = values_equal(lhs, rhs);
        return Ok(if op == Eq { eq } else { !eq });
    }
    let l = numeric_or_string(lhs)?;
    let r = numeric_or_string(rhs)?;
    let ordering = match (l, r) {
        (Ordered::Number(a), Ordered::Number(b)) => a.partial_cmp(&b),
        (Ordered::Text(a), Ordered::Text(b)) => Some(a.cmp(&b)),
        _ => return Err(ExprError::TypeError("cannot compare incompatible operand types".into())),
    };
    let ordering = ordering.ok_or_else(|| ExprError::TypeError("incomparable values".into()))?;
    Ok(match op {
        Lt => ordering.is_lt(),
        Le => ordering.is_le(),
        Gt => ordering.is_gt(),
        Ge => ordering.is_ge(),
        Eq | Ne => unreachable!(),
    })
}

enum Ordered {
    Number(f64),
    Text(String),
}

fn numeric_or_string(value: &Value) -> Result<Ordered, ExprError> {
    match value {
        Value::Term(Term::Literal(lit)) => {
            if let Some(n) = lit.as_f64() {
                if lit.datatype.is_some() {
                    return Ok(Ordered::Number(n));
                }
            }
            Ok(Ordered::Text(lit.lexical_form.to_string()))
        }
        Value::Term(other) => Ok(Ordered::Text(other.to_string())),
        Value::Boolean(b) => Ok(Ordered::Number(if *b { 1.0 } else { 0.0 })),
        Value::Unbound => Err(ExprError::TypeError("cannot order an unbound value".into())),
    }
}

fn values_equal(lhs: &Value, rhs: &Value) -> bool {
    match (lhs, rhs) {
        (Value::Unbound, Value::Unbound) => true,
        (Value::Unbound, _) | (_, Value::Unbound) => false,
        (Value::Boolean(a), Value::Boolean(b)) => a == b,
        (Value::Term(a), Value::Term(b)) => a == b,
        _ => lhs.effective_boolean() == rhs.effective_boolean(),
    }
}

fn regex_matches(text: &str, pattern: &str, flags: &str) -> Result<bool, ExprError> {
    thread_local! {
        static CACHE: std::cell::RefCell<HashMap<String, Arc<Regex>>> = std::cell::RefCell::new(HashMap::new());
    }
    let key = format!("{flags}\u{0}{pattern}");
    let compiled = CACHE.with(|cache| {
        if let Some(re) = cache.borrow().get(&key) {
            return Some(Arc::clone(re));
        }
        let full_pattern = if flags.contains('i') {
            format!("(?i){pattern}")
        } else {
            pattern.to_string()
        };
        let re = Regex::new(&full_pattern).ok()?;
        let re = Arc::new(re);
        cache.borrow_mut().insert(key, Arc::clone(&re));
        Some(re)
    });
    let re = compiled.ok_or_else(|| ExprError::TypeError("invalid regular expression".into()))?;
    Ok(re.is_match(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solution::SolutionMapping;

    #[test]
    fn bound_reports_presence() {
        let store = TripleStore::new();
        let mut sol = SolutionMapping::new();
        sol.bind(Variable::new("x"), Term::plain_literal("v"));
        let v = evaluate(&Expression::Bound(Variable::new("x")), &sol, &store).unwrap();
        assert_eq!(v, Value::Boolean(true));

        let v2 = evaluate(&Expression::Bound(Variable::new("y")), &sol, &store).unwrap();
        assert_eq!(v2, Value::Boolean(false));
    }

    #[test]
    fn arithmetic_adds_numeric_literals() {
        let store = TripleStore::new();
        let sol = SolutionMapping::new();
        let expr = Expression::Arithmetic(
            ArithOp::Add,
            Box::new(Expression::Literal(Term::typed_literal("2", Vocabulary::XSD_INTEGER))),
            Box::new(Expression::Literal(Term::typed_literal("3", Vocabulary::XSD_INTEGER))),
        );
        let v = evaluate(&expr, &sol, &store).unwrap();
        assert_eq!(v, Value::Term(Term::typed_literal("5", Vocabulary::XSD_DOUBLE)));
    }

    #[test]
    fn contains_checks_substring() {
        let store = TripleStore::new();
        let sol = SolutionMapping::new();
        let expr = Expression::Call(
            BuiltinFn::Contains,
            vec![
                Expression::Literal(Term::plain_literal("hello world")),
                Expression::Literal(Term::plain_literal("world")),
            ],
        );
        assert_eq!(evaluate(&expr, &sol, &store).unwrap(), Value::Boolean(true));
    }

    #[test]
    fn regex_matches_with_case_insensitive_flag() {
        let store = TripleStore::new();
        let sol = SolutionMapping::new();
        let expr = Expression::Call(
            BuiltinFn::Regex,
            vec![
                Expression::Literal(Term::plain_literal("Hello")),
                Expression::Literal(Term::plain_literal("hello")),
                Expression::Literal(Term::plain_literal("i")),
            ],
        );
        assert_eq!(evaluate(&expr, &sol, &store).unwrap(), Value::Boolean(true));
    }

    #[test]
    fn division_by_zero_errors() {
        let store = TripleStore::new();
        let sol = SolutionMapping::new();
        let expr = Expression::Arithmetic(
            ArithOp::Div,
            Box::new(Expression::Literal(Term::typed_literal("1", Vocabulary::XSD_INTEGER))),
            Box::new(Expression::Literal(Term::typed_literal("0", Vocabulary::XSD_INTEGER))),
        );
        assert!(matches!(evaluate(&expr, &sol, &store), Err(ExprError::DivisionByZero)));
    }

    #[test]
    fn exists_reports_whether_subpattern_has_a_compatible_solution() {
        use crate::algebra::{PredicateOrPath, TermOrVar};
        use rdf_model::Triple;

        let mut store = TripleStore::new();
        store.add(Triple::new(Term::iri("alice"), Term::iri("knows"), Term::iri("bob")));

        let mut sol = SolutionMapping::new();
        sol.bind(Variable::new("person"), Term::iri("alice"));

        let subpattern = Box::new(Algebra::Bgp(vec![crate::algebra::PatternTriple {
            subject: TermOrVar::Var(Variable::new("person")),
            predicate: PredicateOrPath::Predicate(TermOrVar::Term(Term::iri("knows"))),
            object: TermOrVar::Var(Variable::new("friend")),
        }]));

        let exists = Expression::Exists { negate: false, pattern: subpattern.clone() };
        assert_eq!(evaluate(&exists, &sol, &store).unwrap(), Value::Boolean(true));

        let not_exists = Expression::Exists { negate: true, pattern: subpattern };
        assert_eq!(evaluate(&not_exists, &sol, &store).unwrap(), Value::Boolean(false));
    }
}

//! Solution mappings: a single query result row, as a partial function
//! from variables to terms.

use crate::algebra::Variable;
use rdf_model::Term;
use std::collections::BTreeMap;

/// A partial mapping from variables to bound terms.
///
/// Two mappings are compatible when they agree on every variable both
/// bind; [`SolutionMapping::merge`] combines compatible mappings and
/// returns `None` otherwise, which is exactly the join condition a BGP's
/// conjunction and an `OPTIONAL`'s left join are built from.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct SolutionMapping {
    bindings: BTreeMap<Variable, Term>,
}

impl SolutionMapping {
    /// An empty mapping (the identity solution: compatible with anything).
    pub fn new() -> Self {
        SolutionMapping {
            bindings: BTreeMap::new(),
        }
    }

    /// Build a mapping from an iterator of (variable, term) pairs.
    pub fn from_iter(iter: impl IntoIterator<Item = (Variable, Term)>) -> Self {
        SolutionMapping {
            bindings: iter.into_iter().collect(),
        }
    }

    /// Bind `var` to `term`, returning `false` if `var` was already bound
    /// to a different term (the existing binding is left untouched).
    pub fn bind(&mut self, var: Variable, term: Term) -> bool {
        match self.bindings.get(&var) {
            Some(existing) if existing != &term => false,
            _ => {
                self.bindings.insert(var, term);
                true
            }
        }
    }

    /// The term bound to `var`, if any.
    pub fn get(&self, var: &Variable) -> Option<&Term> {
        self.bindings.get(var)
    }

    /// The term bound to the variable named `name` (without the leading
    /// `?`), if any. A convenience for callers that only have the
    /// variable's name as a string, e.g. a host editor resolving
    /// `?value` from a query it composed itself.
    pub fn get_by_name(&self, name: &str) -> Option<&Term> {
        self.bindings.iter().find(|(var, _)| &*var.0 == name).map(|(_, term)| term)
    }

    /// Whether `var` is bound.
    pub fn contains(&self, var: &Variable) -> bool {
        self.bindings.contains_key(var)
    }

    /// Every bound variable, in a stable order.
    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.bindings.keys()
    }

    /// Every (variable, term) pair, in a stable order.
    pub fn iter(&self) -> impl Iterator<Item = (&Variable, &Term)> {
        self.bindings.iter()
    }

    /// Number of bound variables.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Whether no variables are bound.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Whether `self` and `other` agree on every variable they share.
    pub fn compatible_with(&self, other: &SolutionMapping) -> bool {
        self.bindings
            .iter()
            .all(|(var, term)| other.bindings.get(var).map_or(true, |t| t == term))
    }

    /// Merge `self` and `other`, returning `None` if they disagree on any
    /// shared variable.
    pub fn merge(&self, other: &SolutionMapping) -> Option<SolutionMapping> {
        if !self.compatible_with(other) {
            return None;
        }
        let mut merged = self.bindings.clone();
        merged.extend(other.bindings.iter().map(|(k, v)| (k.clone(), v.clone())));
        Some(SolutionMapping { bindings: merged })
    }

    /// Project down to just the listed variables.
    pub fn project(&self, vars: &[Variable]) -> SolutionMapping {
        SolutionMapping {
            bindings: vars
                .iter()
                .filter_map(|v| self.bindings.get(v).map(|t| (v.clone(), t.clone())))
                .collect(),
        }
    }

    /// Bind `var` to `term` unconditionally, overwriting any prior binding.
    /// Used by `Extend` (`BIND`), where the variable is guaranteed fresh.
    pub fn extend(&mut self, var: Variable, term: Term) {
        self.bindings.insert(var, term);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(name: &str) -> Variable {
        Variable::new(name)
    }

    #[test]
    fn merge_fails_on_conflicting_binding() {
        let mut a = SolutionMapping::new();
        a.bind(var("x"), Term::plain_literal("1"));
        let mut b = SolutionMapping::new();
        b.bind(var("x"), Term::plain_literal("2"));
        assert!(a.merge(&b).is_none());
    }

    #[test]
    fn merge_combines_disjoint_bindings() {
        let mut a = SolutionMapping::new();
        a.bind(var("x"), Term::plain_literal("1"));
        let mut b = SolutionMapping::new();
        b.bind(var("y"), Term::plain_literal("2"));
        let merged = a.merge(&b).unwrap();
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn project_drops_unlisted_variables() {
        let mut a = SolutionMapping::new();
        a.bind(var("x"), Term::plain_literal("1"));
        a.bind(var("y"), Term::plain_literal("2"));
        let projected = a.project(&[var("x")]);
        assert_eq!(projected.len(), 1);
        assert!(projected.contains(&var("x")));
        assert!(!projected.contains(&var("y")));
    }

    #[test]
    fn get_by_name_finds_bound_variable_by_string() {
        let mut a = SolutionMapping::new();
        a.bind(var("x"), Term::plain_literal("1"));
        assert_eq!(a.get_by_name("x"), Some(&Term::plain_literal("1")));
        assert_eq!(a.get_by_name("missing"), None);
    }

    #[test]
    fn bind_rejects_conflicting_rebind() {
        let mut a = SolutionMapping::new();
        assert!(a.bind(var("x"), Term::plain_literal("1")));
        assert!(!a.bind(var("x"), Term::plain_literal("2")));
        assert_eq!(a.get(&var("x")), Some(&Term::plain_literal("1")));
    }
}

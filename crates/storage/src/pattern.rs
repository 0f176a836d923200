//! Triple match patterns: `?`/concrete positions for subject, predicate,
//! and object.

use rdf_model::Term;

/// A single triple-position pattern: a concrete term, or a wildcard.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TermPattern {
    /// Matches anything in this position.
    Any,
    /// Matches only this exact term.
    Concrete(Term),
}

impl TermPattern {
    /// Whether this pattern is a wildcard.
    pub fn is_wildcard(&self) -> bool {
        matches!(self, TermPattern::Any)
    }

    /// Whether this pattern pins a concrete term.
    pub fn is_concrete(&self) -> bool {
        matches!(self, TermPattern::Concrete(_))
    }

    /// Borrow the concrete term, if bound.
    pub fn as_term(&self) -> Option<&Term> {
        match self {
            TermPattern::Concrete(term) => Some(term),
            TermPattern::Any => None,
        }
    }

    /// Whether `term` satisfies this pattern.
    pub fn matches(&self, term: &Term) -> bool {
        match self {
            TermPattern::Any => true,
            TermPattern::Concrete(t) => t == term,
        }
    }
}

impl From<Term> for TermPattern {
    fn from(term: Term) -> Self {
        TermPattern::Concrete(term)
    }
}

impl From<Option<Term>> for TermPattern {
    fn from(term: Option<Term>) -> Self {
        match term {
            Some(t) => TermPattern::Concrete(t),
            None => TermPattern::Any,
        }
    }
}

/// A triple pattern: a subject/predicate/object pattern used to query a
/// [`crate::TripleStore`].
#[derive(Clone, Debug)]
pub struct TriplePattern {
    /// The subject pattern.
    pub subject: TermPattern,
    /// The predicate pattern.
    pub predicate: TermPattern,
    /// The object pattern.
    pub object: TermPattern,
}

impl TriplePattern {
    /// Build a pattern from three positions.
    pub fn new(subject: TermPattern, predicate: TermPattern, object: TermPattern) -> Self {
        TriplePattern {
            subject,
            predicate,
            object,
        }
    }

    /// A pattern that matches every triple.
    pub fn all() -> Self {
        TriplePattern::new(TermPattern::Any, TermPattern::Any, TermPattern::Any)
    }

    /// How many positions are concrete (0-3).
    pub fn bound_count(&self) -> usize {
        [&self.subject, &self.predicate, &self.object]
            .into_iter()
            .filter(|p| p.is_concrete())
            .count()
    }

    /// Whether every position is concrete.
    pub fn is_fully_bound(&self) -> bool {
        self.bound_count() == 3
    }

    /// Whether every position is a wildcard.
    pub fn is_wildcard(&self) -> bool {
        self.bound_count() == 0
    }
}

impl Default for TriplePattern {
    fn default() -> Self {
        TriplePattern::all()
    }
}

//! RDF triples (subject, predicate, object).

use crate::Term;
use std::fmt;

/// An RDF triple: subject, predicate, object.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Triple {
    /// The subject: an IRI or a blank node.
    pub subject: Term,
    /// The predicate: always an IRI.
    pub predicate: Term,
    /// The object: any term.
    pub object: Term,
}

impl Triple {
    /// Construct a triple.
    ///
    /// # Panics
    ///
    /// Panics if `subject` is a literal, or if `predicate` is not an IRI.
    /// RDF triples must take that shape; the panic surfaces a programming
    /// error at the call site rather than silently storing garbage.
    pub fn new(subject: Term, predicate: Term, object: Term) -> Self {
        assert!(
            subject.is_iri() || subject.is_blank_node(),
            "subject must be an IRI or a blank node"
        );
        assert!(predicate.is_iri(), "predicate must be an IRI");
        Triple {
            subject,
            predicate,
            object,
        }
    }

    /// Construct a triple without validating subject/predicate shape.
    ///
    /// Used by code paths (store deserialization, the indexer) that
    /// already know the terms are well-formed and want to skip the
    /// assertion.
    pub fn new_unchecked(subject: Term, predicate: Term, object: Term) -> Self {
        Triple {
            subject,
            predicate,
            object,
        }
    }

    /// Whether this triple matches a pattern; `None` in any position is a
    /// wildcard.
    pub fn matches(&self, subject: Option<&Term>, predicate: Option<&Term>, object: Option<&Term>) -> bool {
        subject.map_or(true, |s| s == &self.subject)
            && predicate.map_or(true, |p| p == &self.predicate)
            && object.map_or(true, |o| o == &self.object)
    }

    /// The subject's IRI string, if the subject is an IRI.
    pub fn subject_iri(&self) -> Option<&str> {
        self.subject.as_iri().map(|iri| iri.as_str())
    }

    /// The predicate's IRI string.
    pub fn predicate_iri(&self) -> Option<&str> {
        self.predicate.as_iri().map(|iri| iri.as_str())
    }

    /// The object's IRI string, if the object is an IRI.
    pub fn object_iri(&self) -> Option<&str> {
        self.object.as_iri().map(|iri| iri.as_str())
    }

    /// Render as a single N-Triples line (without the trailing newline).
    pub fn to_ntriples(&self) -> String {
        format!("{} {} {} .", self.subject, self.predicate, self.object)
    }
}

impl fmt::Debug for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Triple")
            .field("subject", &self.subject)
            .field("predicate", &self.predicate)
            .field("object", &self.object)
            .finish()
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.subject, self.predicate, self.object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triple_creation_exposes_iris() {
        let triple = Triple::new(
            Term::iri("https://example.org/subject"),
            Term::iri("https://example.org/predicate"),
            Term::plain_literal("value"),
        );
        assert_eq!(triple.subject_iri(), Some("https://example.org/subject"));
        assert_eq!(triple.predicate_iri(), Some("https://example.org/predicate"));
    }

    #[test]
    fn matches_treats_none_as_wildcard() {
        let subject = Term::iri("https://example.org/subject");
        let predicate = Term::iri("https://example.org/predicate");
        let object = Term::plain_literal("value");
        let triple = Triple::new(subject.clone(), predicate.clone(), object.clone());

        assert!(triple.matches(Some(&subject), Some(&predicate), Some(&object)));
        assert!(triple.matches(None, None, None));
        assert!(triple.matches(Some(&subject), None, None));

        let other = Term::iri("https://example.org/other");
        assert!(!triple.matches(Some(&other), Some(&predicate), Some(&object)));
    }

    #[test]
    fn ntriples_rendering_contains_all_terms() {
        let triple = Triple::new(
            Term::iri("https://example.org/s"),
            Term::iri("https://example.org/p"),
            Term::plain_literal("value"),
        );
        let nt = triple.to_ntriples();
        assert!(nt.contains("<https://example.org/s>"));
        assert!(nt.contains("<https://example.org/p>"));
        assert!(nt.contains("\"value\""));
        assert!(nt.ends_with(" ."));
    }

    #[test]
    #[should_panic(expected = "subject must be")]
    fn literal_subject_panics() {
        Triple::new(
            Term::plain_literal("invalid"),
            Term::iri("https://example.org/p"),
            Term::plain_literal("value"),
        );
    }

    #[test]
    #[should_panic(expected = "predicate must be")]
    fn non_iri_predicate_panics() {
        Triple::new(
            Term::iri("https://example.org/s"),
            Term::plain_literal("invalid"),
            Term::plain_literal("value"),
        );
    }
}

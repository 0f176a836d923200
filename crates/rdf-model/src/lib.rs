//! Owned RDF term model: IRIs, blank nodes, literals, triples, and the
//! string interner that backs them.
//!
//! Terms are owned, reference-counted strings rather than borrowed slices
//! tied to an arena lifetime. A vault index is rebuilt incrementally as
//! notes change, with no single long-lived arena to borrow from, so terms
//! need to be cheaply cloned and held across store, query, and indexer
//! boundaries without a lifetime parameter threading through all three.
//!
//! # Example
//!
//! ```
//! use rdf_model::{Dictionary, Term, Triple};
//!
//! let dict = Dictionary::new();
//! let s = Term::iri(dict.intern("https://example.org/subject"));
//! let p = Term::iri(dict.intern("https://example.org/predicate"));
//! let o = Term::plain_literal("value");
//!
//! let triple = Triple::new(s, p, o);
//! assert!(triple.object.is_literal());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod dictionary;
pub mod term;
pub mod triple;
pub mod vocab;

pub use dictionary::Dictionary;
pub use term::{BlankNode, Iri, Literal, Term};
pub use triple::Triple;
pub use vocab::Vocabulary;

/// Errors that can occur when constructing or validating RDF terms.
#[derive(Debug, thiserror::Error)]
pub enum RdfError {
    /// An IRI string was empty or contained disallowed whitespace.
    #[error("invalid IRI: {0}")]
    InvalidIri(String),

    /// A literal's lexical form was inconsistent with its declared datatype.
    #[error("invalid literal: {0}")]
    InvalidLiteral(String),

    /// A blank node label was empty.
    #[error("invalid blank node label: {0}")]
    InvalidBlankNode(String),
}

/// Result alias used throughout the term model.
pub type Result<T> = std::result::Result<T, RdfError>;

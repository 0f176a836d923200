//! The in-memory triple store: indexed storage and transactional updates
//! over [`rdf_model::Triple`]s.
//!
//! # Example
//!
//! ```
//! use storage::{TermPattern, TriplePattern, TripleStore};
//! use rdf_model::Term;
//!
//! let mut store = TripleStore::new();
//! store.add(rdf_model::Triple::new(
//!     Term::iri("https://example.org/alice"),
//!     Term::iri("https://example.org/knows"),
//!     Term::iri("https://example.org/bob"),
//! ));
//!
//! let pattern = TriplePattern::new(
//!     TermPattern::Any,
//!     TermPattern::Concrete(Term::iri("https://example.org/knows")),
//!     TermPattern::Any,
//! );
//! assert_eq!(store.match_pattern(&pattern).count(), 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod error;
mod observability;
mod pattern;
mod store;
mod transaction;

pub use error::{StorageError, StorageResult};
pub use observability::{track_operation, OperationType};
pub use pattern::{TermPattern, TriplePattern};
pub use store::TripleStore;
pub use transaction::Transaction;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_compiles() {
        let store = TripleStore::new();
        assert!(store.is_empty());
    }
}

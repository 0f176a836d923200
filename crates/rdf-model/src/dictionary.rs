//! String interning for terms.
//!
//! Deduplicates strings used as IRIs, literal lexical forms, and blank
//! node labels so that repeated occurrences across many triples share
//! one allocation. The store is driven from a single logical thread
//! (see the crate-level concurrency notes in `sparql::executor`), so the
//! interning set is a plain `RefCell`, not a lock.

use rustc_hash::FxHashSet;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

/// A string interner returning reference-counted, deduplicated strings.
///
/// Cloning a `Dictionary` shares the same underlying table (it holds an
/// `Rc`), mirroring how a single vault index shares one dictionary across
/// its store, indexer, and query engine.
#[derive(Clone)]
pub struct Dictionary {
    strings: Rc<RefCell<FxHashSet<Arc<str>>>>,
}

impl Dictionary {
    /// Create a new, empty dictionary.
    pub fn new() -> Self {
        Self {
            strings: Rc::new(RefCell::new(FxHashSet::default())),
        }
    }

    /// Intern `s`, returning the shared, reference-counted copy.
    ///
    /// If an equal string was already interned, its existing `Arc` is
    /// cloned and returned; otherwise `s` is copied once and stored.
    pub fn intern(&self, s: &str) -> Arc<str> {
        if let Some(existing) = self.strings.borrow().get(s) {
            return Arc::clone(existing);
        }
        let arc: Arc<str> = Arc::from(s);
        self.strings.borrow_mut().insert(Arc::clone(&arc));
        arc
    }

    /// Whether no strings have been interned yet.
    pub fn is_empty(&self) -> bool {
        self.strings.borrow().is_empty()
    }

    /// Number of distinct interned strings.
    pub fn len(&self) -> usize {
        self.strings.borrow().len()
    }

    /// Approximate bytes held by interned strings (sum of their lengths).
    pub fn memory_usage(&self) -> usize {
        self.strings.borrow().iter().map(|s| s.len()).sum()
    }
}

impl Default for Dictionary {
    fn default() -> Self {
        Self::new()
    }
}

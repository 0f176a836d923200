//! Staged add/remove operations applied atomically to a [`crate::TripleStore`].

use crate::StorageResult;
use rdf_model::Triple;
use tracing::debug;

/// A buffer of staged triple adds and removes.
///
/// Staging never touches the store; [`Transaction::commit`] applies every
/// staged remove, then every staged add, in one pass, so the store never
/// observes a partially-applied transaction. [`Transaction::rollback`]
/// simply drops the buffer, discarding the staged operations.
pub struct Transaction {
    adds: Vec<Triple>,
    removes: Vec<Triple>,
}

impl Transaction {
    /// Start an empty transaction.
    pub fn new() -> Self {
        Transaction {
            adds: Vec::new(),
            removes: Vec::new(),
        }
    }

    /// Stage a triple to be added on commit.
    pub fn stage_add(&mut self, triple: Triple) {
        self.adds.push(triple);
    }

    /// Stage a triple to be removed on commit.
    pub fn stage_remove(&mut self, triple: Triple) {
        self.removes.push(triple);
    }

    /// Number of staged adds.
    pub fn pending_adds(&self) -> usize {
        self.adds.len()
    }

    /// Number of staged removes.
    pub fn pending_removes(&self) -> usize {
        self.removes.len()
    }

    /// Apply every staged remove, then every staged add, to `store`.
    pub fn commit(self, store: &mut crate::TripleStore) -> StorageResult<()> {
        for triple in &self.removes {
            store.remove(triple);
        }
        for triple in self.adds {
            store.add(triple);
        }
        debug!(
            removed = self.removes.len(),
            "committed transaction"
        );
        Ok(())
    }

    /// Discard every staged operation without touching the store.
    pub fn rollback(self) {
        debug!(
            discarded_adds = self.adds.len(),
            discarded_removes = self.removes.len(),
            "rolled back transaction"
        );
    }
}

impl Default for Transaction {
    fn default() -> Self {
        Self::new()
    }
}

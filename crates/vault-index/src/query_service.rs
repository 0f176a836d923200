//! The query-service facade: `VaultIndexer` plus the `sparql` pipeline,
//! exposed as the single surface a host (schema resolution, layout
//! rendering) talks to.

use crate::{IndexError, IndexerConfig, VaultIndexer};
use sparql::{ExecutionControl, ResolvedForm, SolutionMapping};
use std::path::Path;

/// Errors raised while preparing or running a query through the facade.
#[derive(Debug, thiserror::Error)]
pub enum QueryServiceError {
    /// The query text did not parse or translate.
    #[error(transparent)]
    Prepare(#[from] sparql::PrepareError),
    /// The query executed but failed partway through.
    #[error(transparent)]
    Execution(#[from] sparql::ExecutionError),
    /// The query was not a `SELECT` (`query` only returns solution
    /// mappings; use the indexer's store directly for `ASK`/`CONSTRUCT`/
    /// `DESCRIBE`).
    #[error("only SELECT queries are supported by the query-service facade")]
    NotSelect,
}

/// Wraps a [`VaultIndexer`] and the `sparql` pipeline behind a single
/// `initialize`/`query`/`refresh`/`updateFile`/`dispose` surface.
pub struct QueryService {
    indexer: VaultIndexer,
}

impl QueryService {
    /// Build a query service over a fresh, empty index.
    pub fn new(config: IndexerConfig) -> Self {
        QueryService {
            indexer: VaultIndexer::new(config),
        }
    }

    /// Scan the vault and populate the index.
    pub fn initialize(&mut self) -> Result<(), IndexError> {
        self.indexer.initialize()
    }

    /// Re-scan the vault from scratch.
    pub fn refresh(&mut self) -> Result<(), IndexError> {
        self.indexer.refresh()
    }

    /// Re-project a single note.
    pub fn update_file(&mut self, path: &Path) -> Result<(), IndexError> {
        self.indexer.update_file(path)
    }

    /// Detach from file events, leaving the index untouched.
    pub fn dispose(&mut self) {
        self.indexer.dispose()
    }

    /// The underlying store, for collaborators that need direct access
    /// (e.g. a Turtle serializer).
    pub fn store(&self) -> &storage::TripleStore {
        self.indexer.store()
    }

    /// Run a `SELECT` query against the current index, returning every
    /// solution mapping.
    ///
    /// The executor's `SolutionStream` borrows from the prepared query
    /// and the store, so it cannot outlive this call; this facade drains
    /// it fully into an owned `Vec` rather than exposing the lazy stream
    /// across the boundary, trading streaming for a simple return type a
    /// caller with no borrow-checker stake in the query can hold onto.
    pub fn query(&self, query_string: &str) -> Result<Vec<SolutionMapping>, QueryServiceError> {
        let store = self.indexer.store();
        let prepared = sparql::prepare(query_string, store)?;
        if !matches!(prepared.form, ResolvedForm::Select) {
            return Err(QueryServiceError::NotSelect);
        }
        let stream = sparql::execute_select(&prepared, store, ExecutionControl::unbounded())?;
        let mut results = Vec::new();
        for solution in stream {
            results.push(solution?);
        }
        Ok(results)
    }
}

//! Structured logging for store operations.
//!
//! Mirrors the teacher's per-operation instrumentation style, minus the
//! `metrics` counters/histograms: this crate's scope is the algorithmic
//! core, not an operational metrics pipeline, and nothing downstream
//! scrapes one.

use std::time::Instant;
use tracing::{debug, warn};

/// The kind of store operation being tracked, for consistent span naming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationType {
    /// A single triple insertion.
    Add,
    /// A single triple removal.
    Remove,
    /// A pattern match / scan.
    Match,
    /// A transaction commit.
    TransactionCommit,
    /// A transaction rollback.
    TransactionRollback,
}

impl OperationType {
    /// A short name used in log fields.
    pub fn name(&self) -> &'static str {
        match self {
            OperationType::Add => "add",
            OperationType::Remove => "remove",
            OperationType::Match => "match",
            OperationType::TransactionCommit => "transaction_commit",
            OperationType::TransactionRollback => "transaction_rollback",
        }
    }
}

/// Run `f`, logging its duration under `operation`'s name at debug level,
/// and any error at warn level.
pub fn track_operation<T, E: std::fmt::Display>(
    operation: OperationType,
    f: impl FnOnce() -> Result<T, E>,
) -> Result<T, E> {
    let start = Instant::now();
    let result = f();
    let elapsed = start.elapsed();
    match &result {
        Ok(_) => debug!(op = operation.name(), elapsed_us = elapsed.as_micros(), "store operation completed"),
        Err(e) => warn!(op = operation.name(), error = %e, "store operation failed"),
    }
    result
}

//! The storage crate's error taxonomy.

/// Errors produced by triple store operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A transaction could not be applied to the store.
    #[error("transaction error: {0}")]
    Transaction(String),

    /// The store was asked to operate on a malformed pattern or triple.
    #[error("corrupt state: {0}")]
    Corruption(String),
}

/// Result alias used throughout the storage crate.
pub type StorageResult<T> = std::result::Result<T, StorageError>;

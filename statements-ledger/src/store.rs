//! Storage seam used by the persister.

use statements_core::{BusinessKey, ResolvedTransaction};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("storage connection lock poisoned")]
    Poisoned,

    #[error("migration {version} failed: {source}")]
    Migration {
        version: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("failed to prepare database directory {path}: {source}")]
    Directory {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// The store already held a row with the same business key.
    Duplicate,
}

/// Read/write access to persisted transactions, shared by all ingestion tasks.
pub trait TransactionStore: Send + Sync {
    /// Exact match on every business-key column.
    fn exists(&self, key: &BusinessKey) -> Result<bool, StorageError>;

    /// Insert one row; `tx.date` must already be ISO formatted.
    fn insert(&self, tx: &ResolvedTransaction) -> Result<InsertOutcome, StorageError>;

    fn count(&self) -> Result<u64, StorageError>;
}

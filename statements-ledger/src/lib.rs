//! statements-ledger: durable storage, idempotent persistence and the
//! concurrent ingestion orchestrator.

pub mod persist;
pub mod pipeline;
pub mod sqlite;
pub mod store;

pub use persist::{
    normalize_date, resolve_transaction, DateFormatError, PersistError, PersistOutcome, Persister,
};
pub use pipeline::{
    AccountPreview, BatchReport, FileOutcome, FilePreview, FileReport, FileState, FileStats,
    Ingestor, preview_file, DEFAULT_MAX_CONCURRENT_FILES,
};
pub use sqlite::{DbStatus, MigrateResult, SqliteStore};
pub use store::{InsertOutcome, StorageError, TransactionStore};

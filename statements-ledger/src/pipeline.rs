//! Ingestion orchestrator: per-file extraction, per-account persistence and
//! bounded concurrent fan-out across an upload batch.
//!
//! Per file:
//!   Received -> Extracting -> PerAccountProcessing -> Done(Success | Failure)
//!
//! Only extraction failure fails a file. Unsupported dialects skip the file's
//! accounts; bad rows and storage errors skip the row. No file failure stops
//! the other files in the batch.

use serde::Serialize;
use statements_core::{Bank, RawRecord, ResolvedTransaction};
use statements_ingest::{classify, Extraction, ExtractionError, Extractor, Resolver};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

use crate::persist::{resolve_transaction, PersistOutcome, Persister};
use crate::store::TransactionStore;

pub const DEFAULT_MAX_CONCURRENT_FILES: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum FileOutcome {
    Success,
    Failure(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileState {
    Received,
    Extracting,
    PerAccountProcessing,
    Done(FileOutcome),
}

impl fmt::Display for FileState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileState::Received => f.write_str("received"),
            FileState::Extracting => f.write_str("extracting"),
            FileState::PerAccountProcessing => f.write_str("processing accounts"),
            FileState::Done(FileOutcome::Success) => f.write_str("done (success)"),
            FileState::Done(FileOutcome::Failure(_)) => f.write_str("done (failure)"),
        }
    }
}

/// Row counters for one file. Details stay in logs; callers only see totals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileStats {
    pub accounts: usize,
    /// Rows that survived classification
    pub records: usize,
    pub inserted: usize,
    pub duplicates: usize,
    /// Rows dropped for a bad date or a storage error
    pub failed: usize,
    /// Raw rows not processed because the bank dialect is unsupported
    pub skipped: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    pub statement_type: Option<String>,
    pub outcome: FileOutcome,
    pub stats: FileStats,
}

impl FileReport {
    fn failed(path: &Path, reason: impl Into<String>) -> Self {
        Self {
            path: path.to_path_buf(),
            statement_type: None,
            outcome: FileOutcome::Failure(reason.into()),
            stats: FileStats::default(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome == FileOutcome::Success
    }
}

/// Outcome of one upload batch, files in submission order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub files: Vec<FileReport>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.files.iter().filter(|f| f.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.files.len() - self.succeeded()
    }

    pub fn has_errors(&self) -> bool {
        self.failed() > 0
    }

    pub fn inserted(&self) -> usize {
        self.files.iter().map(|f| f.stats.inserted).sum()
    }

    /// Coarse, user-facing summary.
    pub fn message(&self) -> String {
        if self.has_errors() {
            format!(
                "Errors occurred while processing files ({} of {} processed)",
                self.succeeded(),
                self.files.len()
            )
        } else {
            format!("Files uploaded and processed successfully: {}", self.succeeded())
        }
    }
}

/// What one account of a file would store, without touching the database.
#[derive(Debug, Clone, Serialize)]
pub struct AccountPreview {
    pub account: String,
    pub raw_rows: usize,
    pub transactions: Vec<ResolvedTransaction>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FilePreview {
    pub statement_type: String,
    pub supported: bool,
    pub accounts: Vec<AccountPreview>,
}

/// Extract and resolve one file without storing anything.
pub fn preview_file(
    extractor: &dyn Extractor,
    resolver: &Resolver,
    path: &Path,
) -> Result<FilePreview, ExtractionError> {
    let extraction = extractor.extract(path)?;
    let bank = Bank::from_tag(&extraction.statement_type).ok();

    let accounts = extraction
        .accounts
        .iter()
        .map(|(account, rows)| {
            let transactions = match bank {
                Some(bank) => classify(rows, Some(bank))
                    .iter()
                    .map(|record| {
                        let sides = resolver.resolve(account, record, bank);
                        resolve_transaction(account, bank, record, sides)
                    })
                    .collect(),
                None => Vec::new(),
            };
            AccountPreview {
                account: account.clone(),
                raw_rows: rows.len(),
                transactions,
            }
        })
        .collect();

    Ok(FilePreview {
        statement_type: extraction.statement_type,
        supported: bank.is_some(),
        accounts,
    })
}

#[derive(Clone)]
pub struct Ingestor {
    extractor: Arc<dyn Extractor>,
    persister: Persister,
    resolver: Arc<Resolver>,
    max_concurrent_files: usize,
}

impl Ingestor {
    pub fn new(
        extractor: Arc<dyn Extractor>,
        store: Arc<dyn TransactionStore>,
        resolver: Resolver,
    ) -> Self {
        Self {
            extractor,
            persister: Persister::new(store),
            resolver: Arc::new(resolver),
            max_concurrent_files: DEFAULT_MAX_CONCURRENT_FILES,
        }
    }

    /// Cap on files processed at once; values below 1 are treated as 1.
    pub fn with_max_concurrent_files(mut self, n: usize) -> Self {
        self.max_concurrent_files = n.max(1);
        self
    }

    pub fn max_concurrent_files(&self) -> usize {
        self.max_concurrent_files
    }

    fn enter(path: &Path, state: &FileState) {
        debug!(file = %path.display(), state = %state, "file state");
    }

    /// Run one file to completion. Blocks on extraction and storage.
    pub fn process_file(&self, path: &Path) -> FileReport {
        Self::enter(path, &FileState::Received);
        let mut report = FileReport {
            path: path.to_path_buf(),
            statement_type: None,
            outcome: FileOutcome::Success,
            stats: FileStats::default(),
        };

        Self::enter(path, &FileState::Extracting);
        let extraction = match self.extractor.extract(path) {
            Ok(ex) => ex,
            Err(e) => {
                error!(file = %path.display(), "extraction failed: {e}");
                report.outcome = FileOutcome::Failure(e.to_string());
                Self::enter(path, &FileState::Done(report.outcome.clone()));
                return report;
            }
        };
        info!(
            file = %path.display(),
            bank = %extraction.statement_type,
            accounts = extraction.accounts.len(),
            rows = extraction.record_count(),
            "extraction finished"
        );
        report.statement_type = Some(extraction.statement_type.clone());

        Self::enter(path, &FileState::PerAccountProcessing);
        self.process_extraction(&extraction, &mut report.stats);

        info!(
            file = %path.display(),
            inserted = report.stats.inserted,
            duplicates = report.stats.duplicates,
            failed = report.stats.failed,
            skipped = report.stats.skipped,
            "file processed"
        );
        Self::enter(path, &FileState::Done(report.outcome.clone()));
        report
    }

    fn process_extraction(&self, extraction: &Extraction, stats: &mut FileStats) {
        let bank = match Bank::from_tag(&extraction.statement_type) {
            Ok(bank) => Some(bank),
            Err(e) => {
                warn!("{e}; skipping {} accounts", extraction.accounts.len());
                None
            }
        };

        for (account, rows) in &extraction.accounts {
            stats.accounts += 1;
            match bank {
                Some(bank) => self.process_account(account, rows, bank, stats),
                None => stats.skipped += rows.len(),
            }
        }
    }

    fn process_account(&self, account: &str, rows: &[RawRecord], bank: Bank, stats: &mut FileStats) {
        let cleaned = classify(rows, Some(bank));
        debug!(account, bank = %bank, raw = rows.len(), kept = cleaned.len(), "rows classified");
        if cleaned.is_empty() {
            info!(account, "no transactions to store for account");
            return;
        }

        for record in &cleaned {
            stats.records += 1;
            let sides = self.resolver.resolve(account, record, bank);
            let tx = resolve_transaction(account, bank, record, sides);
            match self.persister.persist(&tx) {
                Ok(PersistOutcome::Inserted) => stats.inserted += 1,
                Ok(PersistOutcome::Duplicate) => stats.duplicates += 1,
                Err(e) => {
                    warn!(account, date = %tx.date, "failed to store transaction: {e}");
                    stats.failed += 1;
                }
            }
        }
    }

    /// Process every file concurrently, at most `max_concurrent_files` at a
    /// time, and wait for all of them.
    pub async fn ingest_batch(&self, files: Vec<PathBuf>) -> BatchReport {
        info!(
            files = files.len(),
            workers = self.max_concurrent_files,
            "starting ingestion batch"
        );
        let permits = Arc::new(Semaphore::new(self.max_concurrent_files));

        let handles: Vec<_> = files
            .into_iter()
            .map(|path| {
                let ingestor = self.clone();
                let permits = Arc::clone(&permits);
                let task_path = path.clone();
                let handle = tokio::spawn(async move {
                    let _permit = permits.acquire_owned().await.ok();
                    tokio::task::spawn_blocking(move || ingestor.process_file(&task_path)).await
                });
                (path, handle)
            })
            .collect();

        let mut report = BatchReport::default();
        for (path, handle) in handles {
            let file_report = match handle.await {
                Ok(Ok(r)) => r,
                Ok(Err(e)) | Err(e) => {
                    error!(file = %path.display(), "ingestion task aborted: {e}");
                    FileReport::failed(&path, format!("ingestion task aborted: {e}"))
                }
            };
            if let FileOutcome::Failure(reason) = &file_report.outcome {
                warn!(file = %path.display(), "file failed: {reason}");
            }
            report.files.push(file_report);
        }

        info!(
            succeeded = report.succeeded(),
            failed = report.failed(),
            inserted = report.inserted(),
            "ingestion batch finished"
        );
        report
    }
}

//! Turn resolved records into stored rows, skipping ones already present.

use chrono::NaiveDate;
use statements_core::record::fields;
use statements_core::{Bank, CleanedRecord, CounterpartySides, ResolvedTransaction};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::store::{InsertOutcome, StorageError, TransactionStore};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized date format: {0:?} (expected YYYY-MM-DD or DD.MM.YYYY)")]
pub struct DateFormatError(pub String);

#[derive(Debug, Error)]
pub enum PersistError {
    #[error(transparent)]
    DateFormat(#[from] DateFormatError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistOutcome {
    Inserted,
    /// Same business key already stored; nothing written.
    Duplicate,
}

/// Ten ASCII bytes, `sep` at both separator positions, digits elsewhere.
fn has_shape(s: &str, sep: u8, positions: [usize; 2]) -> bool {
    s.len() == 10
        && s.bytes().enumerate().all(|(i, b)| {
            if positions.contains(&i) {
                b == sep
            } else {
                b.is_ascii_digit()
            }
        })
}

/// `YYYY-MM-DD` passes through, `DD.MM.YYYY` is converted, anything else fails.
///
/// Shape is checked before chrono parses, since chrono accepts unpadded
/// fields and years of any width.
pub fn normalize_date(raw: &str) -> Result<String, DateFormatError> {
    let s = raw.trim();
    let format = if has_shape(s, b'-', [4, 7]) {
        "%Y-%m-%d"
    } else if has_shape(s, b'.', [2, 5]) {
        "%d.%m.%Y"
    } else {
        return Err(DateFormatError(raw.to_string()));
    };
    NaiveDate::parse_from_str(s, format)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .map_err(|_| DateFormatError(raw.to_string()))
}

/// Document number, falling back to the bank's transaction number.
pub fn document_number(record: &CleanedRecord) -> String {
    record
        .first_of(&[fields::DOCUMENT_NUMBER, fields::TRANSACTION_NUMBER])
        .to_string()
}

/// Payment purpose, falling back to the generic description column.
pub fn payment_description(record: &CleanedRecord) -> String {
    record
        .first_of(&[fields::PAYMENT_DESCRIPTION, fields::DESCRIPTION])
        .to_string()
}

/// Assemble a transaction from a cleaned record and its resolved sides.
///
/// The date is copied as extracted; [`Persister::persist`] normalizes it.
pub fn resolve_transaction(
    account_number: &str,
    bank: Bank,
    record: &CleanedRecord,
    sides: CounterpartySides,
) -> ResolvedTransaction {
    ResolvedTransaction {
        account_number: account_number.to_string(),
        bank,
        date: record.text(fields::DATE).to_string(),
        debit_account: sides.debit_account,
        credit_account: sides.credit_account,
        debit: record.text(fields::DEBIT).to_string(),
        credit: record.text(fields::CREDIT).to_string(),
        inn: sides.inn,
        name: sides.name,
        inn_c: sides.inn_c,
        name_c: sides.name_c,
        document_number: document_number(record),
        payment_description: payment_description(record),
    }
}

#[derive(Clone)]
pub struct Persister {
    store: Arc<dyn TransactionStore>,
}

impl Persister {
    pub fn new(store: Arc<dyn TransactionStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn TransactionStore> {
        &self.store
    }

    /// Store `tx` once. A row whose business key already exists is a no-op.
    ///
    /// The date is normalized before the duplicate check, so re-uploading a
    /// statement in either date format finds the earlier row.
    pub fn persist(&self, tx: &ResolvedTransaction) -> Result<PersistOutcome, PersistError> {
        let date = normalize_date(&tx.date).inspect_err(|e| {
            warn!(account = %tx.account_number, "skipping row: {e}");
        })?;
        let row = ResolvedTransaction {
            date,
            ..tx.clone()
        };

        if self.store.exists(&row.business_key())? {
            info!(
                account = %row.account_number,
                date = %row.date,
                document = %row.document_number,
                "transaction already stored, skipping"
            );
            return Ok(PersistOutcome::Duplicate);
        }

        match self.store.insert(&row)? {
            InsertOutcome::Inserted => {
                info!(
                    account = %row.account_number,
                    bank = %row.bank,
                    date = %row.date,
                    "transaction stored"
                );
                Ok(PersistOutcome::Inserted)
            }
            InsertOutcome::Duplicate => {
                info!(
                    account = %row.account_number,
                    date = %row.date,
                    "transaction stored concurrently by another task, skipping"
                );
                Ok(PersistOutcome::Duplicate)
            }
        }
    }
}

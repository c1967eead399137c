//! Filter extracted rows down to genuine transactions.
//!
//! Rules, applied in order per row:
//! - repeated table headers are dropped
//! - the bank's stop phrase ends the scan (the marker row and everything
//!   after it are discarded)
//! - surviving rows are normalized; on banks that always print both amounts,
//!   rows without a non-zero amount are dropped
//! - rows with every field absent are dropped

use serde_json::Value;
use statements_core::record::{fields, value_text, ZERO_AMOUNT};
use statements_core::{Bank, CleanedRecord, RawRecord};
use tracing::debug;

use crate::normalize::normalize;

/// (field, label) pairs that identify a header row.
const HEADER_CELLS: [(&str, &str); 4] = [
    (fields::ACCOUNT, "Счет"),
    (fields::BIK, "БИК банка"),
    (fields::CREDIT, "Кредит"),
    (fields::DEBIT, "Дебет"),
];

pub fn is_header_row(record: &RawRecord) -> bool {
    HEADER_CELLS.iter().any(|(field, label)| {
        record
            .get(*field)
            .and_then(Value::as_str)
            .is_some_and(|v| v.trim() == *label)
    })
}

pub fn contains_stop_phrase(record: &RawRecord, phrase: &str) -> bool {
    record.values().any(|v| value_text(v).contains(phrase))
}

/// At least one side carries a real (non-zero) amount.
pub fn has_amount(record: &CleanedRecord) -> bool {
    [fields::DEBIT, fields::CREDIT]
        .iter()
        .any(|f| record.get(f).is_some_and(|v| v != ZERO_AMOUNT))
}

/// Header-free, stop-truncated, cleaned rows in their original order.
///
/// `bank = None` (unknown dialect) applies only the bank-independent rules.
pub fn classify(records: &[RawRecord], bank: Option<Bank>) -> Vec<CleanedRecord> {
    let mut out = Vec::with_capacity(records.len());

    for (idx, record) in records.iter().enumerate() {
        if is_header_row(record) {
            continue;
        }

        if let Some(b) = bank {
            if contains_stop_phrase(record, b.stop_phrase()) {
                debug!(bank = %b, row = idx, "stop phrase reached, dropping remaining rows");
                break;
            }
        }

        let cleaned = normalize(record, bank);

        if bank.is_some_and(|b| b.requires_amount()) && !has_amount(&cleaned) {
            continue;
        }
        if cleaned.is_blank() {
            continue;
        }

        out.push(cleaned);
    }

    out
}

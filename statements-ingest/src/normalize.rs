//! Field cleaning for one extracted record.
//!
//! Every value is rendered to text, trimmed and whitespace-collapsed.
//! Amounts additionally lose all spaces (including U+00A0) and get a decimal
//! dot. Empty values and column-header labels become absent, except Sber
//! amounts, which read as "0.00".

use regex::Regex;
use statements_core::record::{fields, value_text, ZERO_AMOUNT};
use statements_core::{Bank, CleanedRecord, RawRecord};
use std::sync::OnceLock;

/// Column labels that leak into data rows when a table header repeats.
pub const HEADER_LABELS: [&str; 2] = ["Дебет", "Кредит"];

fn ws_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("ws regex"))
}

pub fn is_amount_field(field: &str) -> bool {
    field == fields::DEBIT || field == fields::CREDIT
}

/// Trim and squeeze internal whitespace runs to a single space.
pub fn collapse_whitespace(raw: &str) -> String {
    ws_re().replace_all(raw.trim(), " ").into_owned()
}

/// "1 234,50" -> "1234.50"
pub fn clean_amount(raw: &str) -> String {
    raw.chars()
        .filter(|c| *c != ' ' && *c != '\u{a0}')
        .map(|c| if c == ',' { '.' } else { c })
        .collect()
}

/// Clean a single field value. `None` means absent.
pub fn clean_value(field: &str, value: &serde_json::Value, bank: Option<Bank>) -> Option<String> {
    let mut text = collapse_whitespace(&value_text(value));
    let amount = is_amount_field(field);
    if amount {
        text = clean_amount(&text);
    }

    if !text.is_empty() && !HEADER_LABELS.contains(&text.as_str()) {
        return Some(text);
    }
    // Under zero-filling dialects a header label in debit/credit reads as
    // "0.00", not absent: absent would turn into "0.00" on a second pass.
    // Real header rows never get here; `classify` drops them first.
    (amount && bank.is_some_and(|b| b.blank_amount_is_zero())).then(|| ZERO_AMOUNT.to_string())
}

/// Clean every field of `record`. Never fails; bad input degrades to absent fields.
pub fn normalize(record: &RawRecord, bank: Option<Bank>) -> CleanedRecord {
    record
        .iter()
        .map(|(key, value)| (key.as_str(), clean_value(key, value, bank)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn raw(value: Value) -> RawRecord {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_collapses_whitespace() {
        let rec = raw(json!({
            "payment_description": "  Оплата \n по   счету\t№ 5 ",
            "name": "ООО\u{a0}Ромашка",
        }));
        let cleaned = normalize(&rec, Some(Bank::Vtb));
        assert_eq!(cleaned.get("payment_description"), Some("Оплата по счету № 5"));
        assert_eq!(cleaned.get("name"), Some("ООО Ромашка"));
    }

    #[test]
    fn test_amounts_get_decimal_dot() {
        let rec = raw(json!({
            "debit": "1 234 567,89",
            "credit": "12\u{a0}000,00",
        }));
        let cleaned = normalize(&rec, Some(Bank::Vtb));
        assert_eq!(cleaned.get("debit"), Some("1234567.89"));
        assert_eq!(cleaned.get("credit"), Some("12000.00"));
    }

    #[test]
    fn test_numeric_json_amount() {
        let rec = raw(json!({ "credit": 150.5 }));
        let cleaned = normalize(&rec, Some(Bank::Vtb));
        assert_eq!(cleaned.get("credit"), Some("150.5"));
    }

    #[test]
    fn test_blank_amount_is_zero_for_sber() {
        let rec = raw(json!({ "debit": "", "credit": null, "bik": "" }));

        let sber = normalize(&rec, Some(Bank::Sber));
        assert_eq!(sber.get("debit"), Some("0.00"));
        assert_eq!(sber.get("credit"), Some("0.00"));
        assert_eq!(sber.get("bik"), None);

        let vtb = normalize(&rec, Some(Bank::Vtb));
        assert_eq!(vtb.get("debit"), None);
        assert_eq!(vtb.get("credit"), None);
    }

    #[test]
    fn test_header_labels_and_empties_become_absent() {
        let rec = raw(json!({
            "debit": "Дебет",
            "credit": " Кредит ",
            "date": "   ",
            "account": null,
        }));
        let cleaned = normalize(&rec, None);
        assert_eq!(cleaned.len(), 4);
        assert!(cleaned.is_blank());

        let sber = normalize(&rec, Some(Bank::Sber));
        assert_eq!(sber.get("credit"), Some("0.00"));
        assert_eq!(sber.get("date"), None);
    }

    #[test]
    fn test_normalize_is_a_fixed_point() {
        let samples = [
            json!({"debit": " 1 000,00 ", "credit": "", "name": " a  b ", "x": null}),
            json!({"debit": null, "credit": "Кредит", "date": "05.03.2024"}),
            json!({"debit": 12, "credit": "0,5", "flag": true, "nested": [1, 2]}),
        ];
        for bank in [None, Some(Bank::Sber), Some(Bank::Vtb)] {
            for sample in &samples {
                let once = normalize(&raw(sample.clone()), bank);
                let twice = normalize(&once.to_raw(), bank);
                assert_eq!(once, twice, "not idempotent for {sample} / {bank:?}");
            }
        }
    }
}

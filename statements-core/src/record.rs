//! Raw and cleaned transaction records.
//!
//! Extraction output varies by bank and new dialects may add columns, so
//! records stay an untyped passthrough bag of field name -> value instead of
//! a fixed struct. The field names the pipeline actually reads live in
//! [`fields`].

use serde::Serialize;
use serde_json::{Map, Value};

/// One transaction line as produced by the extraction step.
pub type RawRecord = Map<String, Value>;

/// Field names read by the classifier, resolvers and persister.
pub mod fields {
    pub const DATE: &str = "date";
    pub const DEBIT: &str = "debit";
    pub const CREDIT: &str = "credit";
    pub const DEBIT_ACCOUNT: &str = "debit_account";
    pub const CREDIT_ACCOUNT: &str = "credit_account";
    pub const ACCOUNT: &str = "account";
    pub const INN: &str = "inn";
    pub const NAME: &str = "name";
    pub const BIK: &str = "bik";
    pub const DOCUMENT_NUMBER: &str = "document_number";
    pub const TRANSACTION_NUMBER: &str = "transaction_number";
    pub const PAYMENT_DESCRIPTION: &str = "payment_description";
    pub const DESCRIPTION: &str = "description";
}

/// Amount used for "no money moved on this side".
pub const ZERO_AMOUNT: &str = "0.00";

/// Render an extracted value as text the way the cleaner sees it.
///
/// `null` renders empty so a missing cell never turns into a literal token.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// A record after field cleaning. Absent values are `None`, never `""`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanedRecord {
    fields: Vec<(String, Option<String>)>,
}

impl CleanedRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, replacing an earlier value with the same name.
    pub fn insert(&mut self, key: impl Into<String>, value: Option<String>) {
        let key = key.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((key, value)),
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.iter().any(|(k, _)| k == key)
    }

    /// Present, non-absent value of a field.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .and_then(|(_, v)| v.as_deref())
    }

    /// Value of a field, with absent and missing both reading as `""`.
    pub fn text(&self, key: &str) -> &str {
        self.get(key).unwrap_or("")
    }

    /// First present value among `keys`, in order.
    pub fn first_of(&self, keys: &[&str]) -> &str {
        keys.iter().find_map(|k| self.get(k)).unwrap_or("")
    }

    /// True when every field is absent.
    pub fn is_blank(&self) -> bool {
        self.fields.iter().all(|(_, v)| v.is_none())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }

    /// Turn the record back into a raw bag (absent -> `null`).
    pub fn to_raw(&self) -> RawRecord {
        self.fields
            .iter()
            .map(|(k, v)| {
                let value = v.clone().map(Value::String).unwrap_or(Value::Null);
                (k.clone(), value)
            })
            .collect()
    }
}

impl<K: Into<String>> FromIterator<(K, Option<String>)> for CleanedRecord {
    fn from_iter<I: IntoIterator<Item = (K, Option<String>)>>(iter: I) -> Self {
        let mut record = CleanedRecord::new();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_value_text_renders_scalars() {
        assert_eq!(value_text(&Value::Null), "");
        assert_eq!(value_text(&json!("abc")), "abc");
        assert_eq!(value_text(&json!(12.5)), "12.5");
        assert_eq!(value_text(&json!(true)), "true");
    }

    #[test]
    fn test_absent_reads_as_empty_text() {
        let rec: CleanedRecord = [
            ("date", Some("05.03.2024".to_string())),
            ("document_number", None),
        ]
        .into_iter()
        .collect();

        assert!(rec.contains_key("document_number"));
        assert_eq!(rec.get("document_number"), None);
        assert_eq!(rec.text("document_number"), "");
        assert_eq!(rec.text("missing"), "");
        assert_eq!(rec.first_of(&["document_number", "date"]), "05.03.2024");
        assert!(!rec.is_blank());
    }

    #[test]
    fn test_insert_replaces_existing_key() {
        let mut rec = CleanedRecord::new();
        rec.insert("debit", None);
        rec.insert("debit", Some("1.00".to_string()));
        assert_eq!(rec.len(), 1);
        assert_eq!(rec.get("debit"), Some("1.00"));
    }

    #[test]
    fn test_to_raw_keeps_every_key() {
        let rec: CleanedRecord = [("a", Some("x".to_string())), ("b", None)]
            .into_iter()
            .collect();
        let raw = rec.to_raw();
        assert_eq!(raw.get("a"), Some(&json!("x")));
        assert_eq!(raw.get("b"), Some(&Value::Null));
    }
}

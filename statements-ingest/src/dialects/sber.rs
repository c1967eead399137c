//! Sber statements: both sides come as composite "account INN name" strings.
//!
//! Examples seen in extracted rows:
//!   40702810000000012345 7712345678 ООО Ромашка
//!   7712345678 ООО Ромашка
//!   770000000001 ИП Иванов И.И.

use statements_core::record::fields;
use statements_core::{CleanedRecord, CounterpartySides};

use super::Dialect;

const ACCOUNT_LEN: usize = 20;

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

fn is_account(token: &str) -> bool {
    token.chars().count() == ACCOUNT_LEN && is_digits(token)
}

fn is_inn(token: &str) -> bool {
    matches!(token.chars().count(), 10 | 12) && is_digits(token)
}

/// Split a composite string into (account, inn, name).
///
/// The first token decides the shape: an account number is followed by the
/// INN and the name, an INN by the name. Anything else yields all-empty parts.
pub fn split_account_info(info: &str) -> (String, String, String) {
    let parts: Vec<&str> = info.split_whitespace().collect();
    let Some(first) = parts.first() else {
        return Default::default();
    };

    if is_account(first) {
        let inn = parts.get(1).map(|s| s.to_string()).unwrap_or_default();
        let name = parts.get(2..).map(|rest| rest.join(" ")).unwrap_or_default();
        (first.to_string(), inn, name)
    } else if is_inn(first) {
        (String::new(), first.to_string(), parts[1..].join(" "))
    } else {
        Default::default()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SberDialect;

impl Dialect for SberDialect {
    fn resolve(&self, _own_account: &str, record: &CleanedRecord) -> CounterpartySides {
        let (debit_account, inn, name) = split_account_info(record.text(fields::DEBIT_ACCOUNT));
        let (credit_account, inn_c, name_c) = split_account_info(record.text(fields::CREDIT_ACCOUNT));
        CounterpartySides {
            debit_account,
            inn,
            name,
            credit_account,
            inn_c,
            name_c,
        }
    }
}

//! Bank-specific account and counterparty resolution.
//!
//! Each dialect turns a cleaned record into both sides of the transaction.
//! Dispatch is over the closed [`Bank`] enum; an unknown tag is rejected
//! earlier by [`Bank::from_tag`] and never reaches a resolver.

pub mod sber;
pub mod vtb;

use serde::{Deserialize, Serialize};
use statements_core::{Bank, CleanedRecord, CounterpartySides};

pub use sber::{split_account_info, SberDialect};
pub use vtb::VtbDialect;

/// Resolves both sides of a record for one bank.
pub trait Dialect: Send + Sync {
    fn resolve(&self, own_account: &str, record: &CleanedRecord) -> CounterpartySides;
}

/// Organization printed on the opposite side of single-counterparty statements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub inn: String,
    pub name: String,
}

impl Default for Organization {
    fn default() -> Self {
        Self {
            inn: "7719034354".to_string(),
            name: r#"КАЗЕННОЕ ПРЕДПРИЯТИЕ "МОСКОВСКАЯ ЭНЕРГЕТИЧЕСКАЯ ДИРЕКЦИЯ""#.to_string(),
        }
    }
}

/// Holds one resolver per supported bank.
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    sber: SberDialect,
    vtb: VtbDialect,
}

impl Resolver {
    pub fn new(organization: Organization) -> Self {
        Self {
            sber: SberDialect,
            vtb: VtbDialect::new(organization),
        }
    }

    pub fn dialect(&self, bank: Bank) -> &dyn Dialect {
        match bank {
            Bank::Sber => &self.sber,
            Bank::Vtb => &self.vtb,
        }
    }

    pub fn resolve(&self, own_account: &str, record: &CleanedRecord, bank: Bank) -> CounterpartySides {
        self.dialect(bank).resolve(own_account, record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_by_bank() {
        let resolver = Resolver::default();
        let record: CleanedRecord = [
            ("debit_account", Some("7712345678 ООО Ромашка".to_string())),
            ("debit", Some("5.00".to_string())),
            ("inn", Some("7700000001".to_string())),
        ]
        .into_iter()
        .collect();

        let sber = resolver.resolve("40702810000000000001", &record, Bank::Sber);
        assert_eq!(sber.inn, "7712345678");
        assert_eq!(sber.debit_account, "");

        let vtb = resolver.resolve("40702810000000000001", &record, Bank::Vtb);
        assert_eq!(vtb.debit_account, "40702810000000000001");
        assert_eq!(vtb.inn, "7700000001");
        assert_eq!(vtb.inn_c, Organization::default().inn);
    }
}

//! Resolved transactions and their deduplication key.

use serde::{Deserialize, Serialize};

use crate::bank::Bank;

/// Both sides of a transaction after dialect resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterpartySides {
    pub debit_account: String,
    pub inn: String,
    pub name: String,
    pub credit_account: String,
    pub inn_c: String,
    pub name_c: String,
}

/// A transaction ready for storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedTransaction {
    /// The statement's own account
    pub account_number: String,
    pub bank: Bank,
    /// `YYYY-MM-DD` once persisted; `DD.MM.YYYY` is accepted on the way in
    pub date: String,
    pub debit_account: String,
    pub credit_account: String,
    /// Decimal-dot amount
    pub debit: String,
    /// Decimal-dot amount
    pub credit: String,
    pub inn: String,
    pub name: String,
    pub inn_c: String,
    pub name_c: String,
    pub document_number: String,
    pub payment_description: String,
}

/// Columns that identify one real-world transaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct BusinessKey {
    pub account_number: String,
    pub date: String,
    pub debit: String,
    pub credit: String,
    pub document_number: String,
    pub payment_description: String,
    pub debit_account: String,
    pub credit_account: String,
    pub inn: String,
    pub name: String,
    pub inn_c: String,
    pub name_c: String,
}

impl ResolvedTransaction {
    pub fn sides(&self) -> CounterpartySides {
        CounterpartySides {
            debit_account: self.debit_account.clone(),
            inn: self.inn.clone(),
            name: self.name.clone(),
            credit_account: self.credit_account.clone(),
            inn_c: self.inn_c.clone(),
            name_c: self.name_c.clone(),
        }
    }

    pub fn business_key(&self) -> BusinessKey {
        BusinessKey {
            account_number: self.account_number.clone(),
            date: self.date.clone(),
            debit: self.debit.clone(),
            credit: self.credit.clone(),
            document_number: self.document_number.clone(),
            payment_description: self.payment_description.clone(),
            debit_account: self.debit_account.clone(),
            credit_account: self.credit_account.clone(),
            inn: self.inn.clone(),
            name: self.name.clone(),
            inn_c: self.inn_c.clone(),
            name_c: self.name_c.clone(),
        }
    }

    /// True when the statement's own account sits on the credit side (money received).
    pub fn is_incoming(&self) -> bool {
        self.credit_account == self.account_number && self.debit_account != self.account_number
    }
}

impl BusinessKey {
    /// Key columns in storage order.
    pub fn columns(&self) -> [&str; 12] {
        [
            &self.account_number,
            &self.date,
            &self.debit,
            &self.credit,
            &self.document_number,
            &self.payment_description,
            &self.debit_account,
            &self.credit_account,
            &self.inn,
            &self.name,
            &self.inn_c,
            &self.name_c,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ResolvedTransaction {
        ResolvedTransaction {
            account_number: "40702810000000000001".to_string(),
            bank: Bank::Vtb,
            date: "2024-03-05".to_string(),
            debit_account: "40702810000000099999".to_string(),
            credit_account: "40702810000000000001".to_string(),
            debit: "0.00".to_string(),
            credit: "1500.00".to_string(),
            inn: "7719034354".to_string(),
            name: "ORG".to_string(),
            inn_c: "7712345678".to_string(),
            name_c: "ООО Ромашка".to_string(),
            document_number: "17".to_string(),
            payment_description: "оплата".to_string(),
        }
    }

    #[test]
    fn test_business_key_excludes_bank() {
        let a = sample();
        let mut b = sample();
        b.bank = Bank::Sber;
        assert_eq!(a.business_key(), b.business_key());

        b.credit = "1500.01".to_string();
        assert_ne!(a.business_key(), b.business_key());
    }

    #[test]
    fn test_key_columns_order() {
        let key = sample().business_key();
        let cols = key.columns();
        assert_eq!(cols[0], "40702810000000000001");
        assert_eq!(cols[1], "2024-03-05");
        assert_eq!(cols[11], "ООО Ромашка");
    }

    #[test]
    fn test_direction() {
        assert!(sample().is_incoming());
        let sides = sample().sides();
        assert_eq!(sides.credit_account, "40702810000000000001");
    }
}

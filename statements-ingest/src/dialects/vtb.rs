//! VTB statements: a single counterparty column set (`account`, `inn`,
//! `name`); direction follows from the debit amount.

use statements_core::record::{fields, ZERO_AMOUNT};
use statements_core::{CleanedRecord, CounterpartySides};

use super::{Dialect, Organization};

#[derive(Debug, Clone, Default)]
pub struct VtbDialect {
    organization: Organization,
}

impl VtbDialect {
    pub fn new(organization: Organization) -> Self {
        Self { organization }
    }
}

impl Dialect for VtbDialect {
    fn resolve(&self, own_account: &str, record: &CleanedRecord) -> CounterpartySides {
        let account = record.text(fields::ACCOUNT).to_string();
        let inn = record.text(fields::INN).to_string();
        let name = record.text(fields::NAME).to_string();
        let org = &self.organization;

        if record.text(fields::DEBIT) == ZERO_AMOUNT {
            // Money received: own account is credited.
            CounterpartySides {
                debit_account: account,
                inn: org.inn.clone(),
                name: org.name.clone(),
                credit_account: own_account.to_string(),
                inn_c: inn,
                name_c: name,
            }
        } else {
            CounterpartySides {
                debit_account: own_account.to_string(),
                inn,
                name,
                credit_account: account,
                inn_c: org.inn.clone(),
                name_c: org.name.clone(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OWN: &str = "40702810000000000001";

    fn record(debit: Option<&str>) -> CleanedRecord {
        [
            ("debit", debit.map(str::to_string)),
            ("credit", Some("100.00".to_string())),
            ("account", Some("40702810000000099999".to_string())),
            ("inn", Some("7712345678".to_string())),
            ("name", Some("ООО Ромашка".to_string())),
        ]
        .into_iter()
        .collect()
    }

    fn org() -> Organization {
        Organization {
            inn: "1111111111".to_string(),
            name: "ORG".to_string(),
        }
    }

    #[test]
    fn test_zero_debit_credits_own_account() {
        let sides = VtbDialect::new(org()).resolve(OWN, &record(Some("0.00")));
        assert_eq!(sides.credit_account, OWN);
        assert_eq!(sides.inn_c, "7712345678");
        assert_eq!(sides.name_c, "ООО Ромашка");
        assert_eq!(sides.debit_account, "40702810000000099999");
        assert_eq!(sides.inn, "1111111111");
        assert_eq!(sides.name, "ORG");
    }

    #[test]
    fn test_nonzero_debit_debits_own_account() {
        let sides = VtbDialect::new(org()).resolve(OWN, &record(Some("25.00")));
        assert_eq!(sides.debit_account, OWN);
        assert_eq!(sides.inn, "7712345678");
        assert_eq!(sides.credit_account, "40702810000000099999");
        assert_eq!(sides.inn_c, "1111111111");
    }

    #[test]
    fn test_absent_debit_is_outgoing() {
        let sides = VtbDialect::new(org()).resolve(OWN, &record(None));
        assert_eq!(sides.debit_account, OWN);
    }
}

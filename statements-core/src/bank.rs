//! Supported bank dialects.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Bank whose statement conventions drive cleaning and resolution.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Bank {
    /// Composite "account INN name" strings on both sides; blank amounts mean zero.
    #[serde(rename = "СБЕР")]
    Sber,
    /// One counterparty column set; direction follows from a zero debit.
    #[serde(rename = "ВТБ")]
    Vtb,
}

/// The extraction step reported a bank tag no dialect exists for.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported bank dialect: {tag:?}")]
pub struct DialectUnsupported {
    pub tag: String,
}

impl Bank {
    pub const ALL: [Bank; 2] = [Bank::Sber, Bank::Vtb];

    pub fn from_tag(tag: &str) -> Result<Bank, DialectUnsupported> {
        match tag.trim() {
            "СБЕР" => Ok(Bank::Sber),
            "ВТБ" => Ok(Bank::Vtb),
            other => Err(DialectUnsupported {
                tag: other.to_string(),
            }),
        }
    }

    /// Tag stored alongside every persisted row.
    pub fn tag(&self) -> &'static str {
        match self {
            Bank::Sber => "СБЕР",
            Bank::Vtb => "ВТБ",
        }
    }

    /// Substring marking the end of transaction rows in an extracted statement.
    pub fn stop_phrase(&self) -> &'static str {
        match self {
            Bank::Sber => "Количество операций",
            Bank::Vtb => "ИТОГО за период с",
        }
    }

    /// Every row carries an amount on both sides, so blanks are zeros.
    pub fn blank_amount_is_zero(&self) -> bool {
        matches!(self, Bank::Sber)
    }

    /// Rows whose debit and credit are both zero carry nothing and are dropped.
    pub fn requires_amount(&self) -> bool {
        matches!(self, Bank::Sber)
    }
}

impl fmt::Display for Bank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Bank {
    type Err = DialectUnsupported;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Bank::from_tag(s)
    }
}

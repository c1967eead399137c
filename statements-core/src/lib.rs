//! statements-core: data model shared by the statement ingestion pipeline

pub mod bank;
pub mod record;
pub mod transaction;

pub use bank::{Bank, DialectUnsupported};
pub use record::{CleanedRecord, RawRecord};
pub use transaction::{BusinessKey, CounterpartySides, ResolvedTransaction};

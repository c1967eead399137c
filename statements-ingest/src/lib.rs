//! statements-ingest: turns extracted statement rows into resolved transactions.
//!
//! Stages, in pipeline order: [`extraction`] (external collaborator adapter),
//! [`classify`] (header/stop-marker filtering), [`normalize`] (field cleaning)
//! and [`dialects`] (bank-specific account/counterparty resolution).

pub mod classify;
pub mod dialects;
pub mod extraction;
pub mod normalize;

pub use classify::classify;
pub use dialects::{Dialect, Organization, Resolver};
pub use extraction::{Extraction, ExtractionError, Extractor, JsonExtractor, ScriptExtractor};
pub use normalize::normalize;

//! Adapter for the external extraction step.
//!
//! The extractor turns one statement file into per-account raw rows plus the
//! detected bank tag. The bundled implementation shells out to a script and
//! reads a JSON document from its stdout:
//!
//! ```json
//! {
//!   "account_transactions": { "40702810...": [ { "date": "05.03.2024", ... } ] },
//!   "statement_type": "СБЕР",
//!   "first_page_text": "..."
//! }
//! ```
//!
//! Partial output is never used: any failure discards the whole file.

use serde::Deserialize;
use serde_json::{Map, Value};
use statements_core::RawRecord;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Structured rows extracted from one statement file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    /// (own account, raw rows) in the order the statement lists them
    pub accounts: Vec<(String, Vec<RawRecord>)>,
    /// Detected bank tag, e.g. "СБЕР"
    pub statement_type: String,
    pub first_page_text: String,
}

impl Extraction {
    pub fn record_count(&self) -> usize {
        self.accounts.iter().map(|(_, rows)| rows.len()).sum()
    }
}

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("statement path is empty")]
    EmptyPath,

    #[error("failed to start extractor for {path}: {source}")]
    Spawn {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("extractor exited with {status} for {path}; stderr: {stderr}")]
    Process {
        path: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("extractor output for {path} is not JSON: {snippet}")]
    NotJson { path: String, snippet: String },

    #[error("malformed extractor output for {path}: {source}")]
    Malformed {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Produces structured rows for one statement file.
pub trait Extractor: Send + Sync {
    fn extract(&self, path: &Path) -> Result<Extraction, ExtractionError>;
}

#[derive(Debug, Deserialize)]
struct ExtractionDocument {
    #[serde(default)]
    account_transactions: Map<String, Value>,
    #[serde(default)]
    statement_type: String,
    #[serde(default)]
    first_page_text: String,
}

fn snippet(text: &str) -> String {
    const MAX: usize = 200;
    match text.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

/// Decode extractor output. `path` only labels errors.
pub fn parse_extraction(path: &Path, output: &str) -> Result<Extraction, ExtractionError> {
    let label = path.display().to_string();
    let output = output.trim();
    if !output.starts_with('{') {
        return Err(ExtractionError::NotJson {
            path: label,
            snippet: snippet(output),
        });
    }

    let malformed = |source| ExtractionError::Malformed {
        path: label.clone(),
        source,
    };

    let doc: ExtractionDocument = serde_json::from_str(output).map_err(malformed)?;

    let mut accounts = Vec::with_capacity(doc.account_transactions.len());
    for (account, rows) in doc.account_transactions {
        let rows: Vec<RawRecord> = serde_json::from_value(rows).map_err(malformed)?;
        accounts.push((account, rows));
    }

    Ok(Extraction {
        accounts,
        statement_type: doc.statement_type,
        first_page_text: doc.first_page_text,
    })
}

/// Runs `<interpreter> <script> <statement path>` and decodes its stdout.
#[derive(Debug, Clone)]
pub struct ScriptExtractor {
    interpreter: String,
    script: PathBuf,
}

impl ScriptExtractor {
    pub fn new(interpreter: impl Into<String>, script: impl Into<PathBuf>) -> Self {
        Self {
            interpreter: interpreter.into(),
            script: script.into(),
        }
    }
}

impl Extractor for ScriptExtractor {
    fn extract(&self, path: &Path) -> Result<Extraction, ExtractionError> {
        if path.as_os_str().is_empty() {
            return Err(ExtractionError::EmptyPath);
        }
        let label = path.display().to_string();
        info!(file = %label, interpreter = %self.interpreter, "running extractor");

        let output = Command::new(&self.interpreter)
            .arg(&self.script)
            .arg(path)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| ExtractionError::Spawn {
                path: label.clone(),
                source,
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if !output.status.success() {
            return Err(ExtractionError::Process {
                path: label,
                status: output.status,
                stderr,
            });
        }
        if !stderr.is_empty() {
            warn!(file = %label, "extractor stderr: {stderr}");
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        debug!(file = %label, bytes = stdout.len(), "extractor finished");
        parse_extraction(path, &stdout)
    }
}

/// Treats each input file as an already-extracted JSON document.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonExtractor;

impl Extractor for JsonExtractor {
    fn extract(&self, path: &Path) -> Result<Extraction, ExtractionError> {
        if path.as_os_str().is_empty() {
            return Err(ExtractionError::EmptyPath);
        }
        let text = std::fs::read_to_string(path).map_err(|source| ExtractionError::Read {
            path: path.display().to_string(),
            source,
        })?;
        parse_extraction(path, &text)
    }
}

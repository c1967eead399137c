use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use statements_ingest::Organization;
use statements_ledger::DEFAULT_MAX_CONCURRENT_FILES;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "statements.toml";

/// Prefix for environment overrides, e.g. `APP_DATABASE_PATH`.
const ENV_PREFIX: &str = "APP_";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseSection,
    pub extraction: ExtractionSection,
    pub ingest: IngestSection,
    pub organization: Organization,
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSection {
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionSection {
    /// Program used to run the extraction script (default: "python3")
    pub interpreter: String,
    pub script_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestSection {
    pub max_concurrent_files: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSection {
    /// `tracing` filter directive used when `RUST_LOG` is unset
    pub level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseSection {
                path: PathBuf::from("data/statements.db"),
            },
            extraction: ExtractionSection {
                interpreter: "python3".to_string(),
                script_path: PathBuf::from("scripts/extract_statement.py"),
            },
            ingest: IngestSection {
                max_concurrent_files: DEFAULT_MAX_CONCURRENT_FILES,
            },
            organization: Organization::default(),
            logging: LoggingSection {
                level: "info".to_string(),
            },
        }
    }
}

impl Config {
    /// Apply `APP_*` overrides. `lookup` is `std::env::var` outside tests.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(&format!("{ENV_PREFIX}{key}")).filter(|v| !v.trim().is_empty());

        if let Some(v) = var("DATABASE_PATH") {
            self.database.path = PathBuf::from(v);
        }
        if let Some(v) = var("EXTRACTION_INTERPRETER") {
            self.extraction.interpreter = v;
        }
        if let Some(v) = var("EXTRACTION_SCRIPT_PATH") {
            self.extraction.script_path = PathBuf::from(v);
        }
        if let Some(v) = var("LOGGING_LEVEL") {
            self.logging.level = v;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.database.path.as_os_str().is_empty() {
            bail!("database.path is not set");
        }
        if self.extraction.interpreter.trim().is_empty() {
            bail!("extraction.interpreter is not set");
        }
        if self.extraction.script_path.as_os_str().is_empty() {
            bail!("extraction.script_path is not set");
        }
        if self.ingest.max_concurrent_files == 0 {
            bail!("ingest.max_concurrent_files must be at least 1");
        }
        Ok(())
    }
}

fn parse_config(s: &str, origin: &Path) -> Result<Config> {
    toml::from_str(s).with_context(|| format!("parse {}", origin.display()))
}

/// Read `path` (defaults when missing), apply environment overrides, validate.
pub fn load_config(path: &Path) -> Result<Config> {
    let mut cfg = if path.exists() {
        let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        parse_config(&s, path)?
    } else {
        Config::default()
    };
    cfg.apply_overrides(|key| std::env::var(key).ok());
    cfg.validate()
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(cfg)
}

pub fn save_config(path: &Path, cfg: &Config) -> Result<()> {
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    fs::write(path, s).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

pub fn init_config(path: &Path) -> Result<()> {
    if path.exists() {
        println!("Config already exists: {}", path.display());
        return Ok(());
    }
    save_config(path, &Config::default())?;
    println!("Wrote {}", path.display());
    Ok(())
}

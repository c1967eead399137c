use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use statements_ingest::{Extractor, JsonExtractor, Resolver, ScriptExtractor};
use statements_ledger::{preview_file, Ingestor, SqliteStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

mod config;
mod logging;

use config::{Config, DEFAULT_CONFIG_PATH};

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("STATEMENTS_BUILD_SHA"),
    ")"
);

#[derive(Parser, Debug)]
#[command(
    name = "statements",
    version,
    long_version = LONG_VERSION,
    about = "Bank statement ingestion"
)]
struct Cli {
    /// Path to the TOML config file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Config file commands
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommand,
    },

    /// Extract statements and store their transactions
    Ingest {
        /// Statement files to process
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Read already-extracted JSON documents instead of running the script
        #[arg(long)]
        from_json: bool,

        /// Override ingest.max_concurrent_files
        #[arg(long)]
        workers: Option<usize>,
    },

    /// Show what one file would store, without writing to the database
    Preview {
        file: PathBuf,

        #[arg(long)]
        from_json: bool,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write a default config file if none exists
    Init,
}

#[derive(Subcommand, Debug)]
enum DbCommand {
    /// Apply pending schema migrations
    Migrate,

    /// Show applied and pending migrations
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Command::Config {
        command: ConfigCommand::Init,
    } = cli.command
    {
        return config::init_config(&cli.config);
    }

    let cfg = config::load_config(&cli.config)?;
    logging::init(&cfg.logging.level)?;

    match cli.command {
        Command::Config { .. } => {}

        Command::Db { command } => match command {
            DbCommand::Migrate => db_migrate(&cfg)?,
            DbCommand::Status => db_status(&cfg)?,
        },

        Command::Ingest {
            files,
            from_json,
            workers,
        } => {
            ingest(&cfg, files, from_json, workers).await?;
        }

        Command::Preview { file, from_json } => {
            preview(&cfg, &file, from_json)?;
        }
    }

    Ok(())
}

fn open_store(cfg: &Config) -> Result<SqliteStore> {
    SqliteStore::open(&cfg.database.path)
        .with_context(|| format!("open database {}", cfg.database.path.display()))
}

fn extractor(cfg: &Config, from_json: bool) -> Arc<dyn Extractor> {
    if from_json {
        Arc::new(JsonExtractor)
    } else {
        Arc::new(ScriptExtractor::new(
            cfg.extraction.interpreter.clone(),
            cfg.extraction.script_path.clone(),
        ))
    }
}

fn db_migrate(cfg: &Config) -> Result<()> {
    let store = open_store(cfg)?;
    let result = store.migrate().context("apply migrations")?;
    for v in &result.applied_now {
        println!("applied  {v}");
    }
    for v in &result.skipped {
        println!("present  {v}");
    }
    Ok(())
}

fn db_status(cfg: &Config) -> Result<()> {
    let store = open_store(cfg)?;
    let status = store.status().context("read database status")?;
    println!("{}", serde_json::to_string_pretty(&status)?);
    if !status.ready() {
        println!("Run `statements db migrate` to apply pending migrations.");
    }
    Ok(())
}

async fn ingest(
    cfg: &Config,
    files: Vec<PathBuf>,
    from_json: bool,
    workers: Option<usize>,
) -> Result<()> {
    let store = Arc::new(open_store(cfg)?);
    store.migrate().context("apply migrations")?;

    let ingestor = Ingestor::new(
        extractor(cfg, from_json),
        store,
        Resolver::new(cfg.organization.clone()),
    )
    .with_max_concurrent_files(workers.unwrap_or(cfg.ingest.max_concurrent_files));

    let report = ingestor.ingest_batch(files).await;
    info!(
        succeeded = report.succeeded(),
        inserted = report.inserted(),
        "batch complete"
    );

    if report.has_errors() {
        bail!("{}", report.message());
    }
    println!("{}", report.message());
    Ok(())
}

fn preview(cfg: &Config, file: &Path, from_json: bool) -> Result<()> {
    let extractor = extractor(cfg, from_json);
    let resolver = Resolver::new(cfg.organization.clone());

    let preview = preview_file(extractor.as_ref(), &resolver, file)
        .with_context(|| format!("extract {}", file.display()))?;
    if !preview.supported {
        eprintln!(
            "warning: unsupported statement type {:?}; nothing would be stored",
            preview.statement_type
        );
    }
    println!("{}", serde_json::to_string_pretty(&preview)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_ingest_args() {
        let cli = Cli::parse_from([
            "statements",
            "--config",
            "alt.toml",
            "ingest",
            "--from-json",
            "--workers",
            "2",
            "a.json",
            "b.json",
        ]);
        assert_eq!(cli.config, PathBuf::from("alt.toml"));
        match cli.command {
            Command::Ingest {
                files,
                from_json,
                workers,
            } => {
                assert_eq!(files, vec![PathBuf::from("a.json"), PathBuf::from("b.json")]);
                assert!(from_json);
                assert_eq!(workers, Some(2));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_ingest_requires_files() {
        assert!(Cli::try_parse_from(["statements", "ingest"]).is_err());
    }

    #[test]
    fn test_default_config_path() {
        let cli = Cli::parse_from(["statements", "db", "status"]);
        assert_eq!(cli.config, PathBuf::from(DEFAULT_CONFIG_PATH));
    }
}

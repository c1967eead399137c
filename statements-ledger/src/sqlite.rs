//! SQLite-backed transaction store with embedded migrations.
//!
//! One connection is shared by every ingestion task behind a mutex. The
//! business-key UNIQUE index (migration 0002) makes inserts idempotent even
//! when two tasks pass the existence check for the same row concurrently.

use rusqlite::types::Type;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use serde::Serialize;
use statements_core::{Bank, BusinessKey, ResolvedTransaction};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

use crate::store::{InsertOutcome, StorageError, TransactionStore};

const MIGRATIONS: &[(&str, &str)] = &[
    ("0001_init.sql", include_str!("../migrations/0001_init.sql")),
    (
        "0002_business_key_unique.sql",
        include_str!("../migrations/0002_business_key_unique.sql"),
    ),
];

const EXISTS_SQL: &str = r#"
    SELECT EXISTS(
        SELECT 1 FROM transactions
        WHERE account_number = ?1
          AND date = ?2
          AND debit = ?3
          AND credit = ?4
          AND document_number = ?5
          AND payment_description = ?6
          AND debit_account = ?7
          AND credit_account = ?8
          AND inn = ?9
          AND name = ?10
          AND inn_c = ?11
          AND name_c = ?12
    )
"#;

const INSERT_SQL: &str = r#"
    INSERT INTO transactions (
        account_number, bank, date, debit_account, credit_account, debit, credit,
        inn, name, inn_c, name_c, document_number, payment_description
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
    ON CONFLICT DO NOTHING
"#;

#[derive(Debug, Clone, Serialize)]
pub struct MigrateResult {
    pub applied_now: Vec<String>,
    pub skipped: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DbStatus {
    pub db_path: Option<String>,
    pub applied_versions: Vec<String>,
    pub pending_versions: Vec<String>,
    pub transaction_count: u64,
}

impl DbStatus {
    pub fn ready(&self) -> bool {
        self.pending_versions.is_empty()
    }
}

#[derive(Debug)]
pub struct SqliteStore {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl SqliteStore {
    /// Open (creating if needed) the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| StorageError::Directory {
                path: parent.display().to_string(),
                source,
            })?;
        }
        let conn = Connection::open(path)?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        info!(db = %path.display(), "opened transaction store");
        Ok(Self {
            conn: Mutex::new(conn),
            path: Some(path.to_path_buf()),
        })
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        Ok(Self {
            conn: Mutex::new(Connection::open_in_memory()?),
            path: None,
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn.lock().map_err(|_| StorageError::Poisoned)
    }

    fn ensure_migrations_table(conn: &Connection) -> Result<(), StorageError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version    TEXT PRIMARY KEY,
                applied_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            "#,
        )?;
        Ok(())
    }

    fn applied_versions(conn: &Connection) -> Result<Vec<String>, StorageError> {
        let mut stmt = conn.prepare("SELECT version FROM schema_migrations ORDER BY version")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    }

    /// Apply every embedded migration not yet recorded in `schema_migrations`.
    pub fn migrate(&self) -> Result<MigrateResult, StorageError> {
        let mut conn = self.lock()?;
        Self::ensure_migrations_table(&conn)?;
        let applied = Self::applied_versions(&conn)?;

        let mut result = MigrateResult {
            applied_now: Vec::new(),
            skipped: Vec::new(),
        };

        for (version, sql) in MIGRATIONS {
            if applied.iter().any(|v| v == version) {
                result.skipped.push(version.to_string());
                continue;
            }
            let migration_err = |source| StorageError::Migration {
                version: version.to_string(),
                source,
            };
            let tx = conn.transaction().map_err(migration_err)?;
            tx.execute_batch(sql).map_err(migration_err)?;
            tx.execute(
                "INSERT INTO schema_migrations (version) VALUES (?1)",
                params![version],
            )
            .map_err(migration_err)?;
            tx.commit().map_err(migration_err)?;
            info!(version, "applied migration");
            result.applied_now.push(version.to_string());
        }

        Ok(result)
    }

    pub fn status(&self) -> Result<DbStatus, StorageError> {
        let conn = self.lock()?;
        Self::ensure_migrations_table(&conn)?;
        let applied_versions = Self::applied_versions(&conn)?;
        let pending_versions = MIGRATIONS
            .iter()
            .map(|(v, _)| v.to_string())
            .filter(|v| !applied_versions.contains(v))
            .collect();

        let has_table: Option<String> = conn
            .query_row(
                "SELECT name FROM sqlite_master WHERE type='table' AND name='transactions'",
                [],
                |row| row.get(0),
            )
            .optional()?;
        let transaction_count = match has_table {
            Some(_) => Self::count_rows(&conn)?,
            None => 0,
        };

        Ok(DbStatus {
            db_path: self.path.as_ref().map(|p| p.display().to_string()),
            applied_versions,
            pending_versions,
            transaction_count,
        })
    }

    fn count_rows(conn: &Connection) -> Result<u64, StorageError> {
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM transactions", [], |r| r.get(0))?;
        Ok(u64::try_from(n).unwrap_or(0))
    }

    /// Stored rows for one account, oldest first.
    pub fn transactions_for_account(
        &self,
        account_number: &str,
    ) -> Result<Vec<ResolvedTransaction>, StorageError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT account_number, bank, date, debit_account, credit_account, debit, credit,
                   inn, name, inn_c, name_c, document_number, payment_description
            FROM transactions
            WHERE account_number = ?1
            ORDER BY date, id
            "#,
        )?;
        let rows = stmt.query_map(params![account_number], |row| {
            let tag: String = row.get(1)?;
            let bank = Bank::from_tag(&tag)
                .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e)))?;
            Ok(ResolvedTransaction {
                account_number: row.get(0)?,
                bank,
                date: row.get(2)?,
                debit_account: row.get(3)?,
                credit_account: row.get(4)?,
                debit: row.get(5)?,
                credit: row.get(6)?,
                inn: row.get(7)?,
                name: row.get(8)?,
                inn_c: row.get(9)?,
                name_c: row.get(10)?,
                document_number: row.get(11)?,
                payment_description: row.get(12)?,
            })
        })?;

        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    }
}

impl TransactionStore for SqliteStore {
    fn exists(&self, key: &BusinessKey) -> Result<bool, StorageError> {
        let conn = self.lock()?;
        let found = conn.query_row(EXISTS_SQL, params_from_iter(key.columns()), |row| {
            row.get::<_, bool>(0)
        })?;
        Ok(found)
    }

    fn insert(&self, tx: &ResolvedTransaction) -> Result<InsertOutcome, StorageError> {
        let conn = self.lock()?;
        let changed = conn.execute(
            INSERT_SQL,
            params![
                tx.account_number,
                tx.bank.tag(),
                tx.date,
                tx.debit_account,
                tx.credit_account,
                tx.debit,
                tx.credit,
                tx.inn,
                tx.name,
                tx.inn_c,
                tx.name_c,
                tx.document_number,
                tx.payment_description,
            ],
        )?;
        debug!(account = %tx.account_number, changed, "insert executed");
        Ok(if changed == 0 {
            InsertOutcome::Duplicate
        } else {
            InsertOutcome::Inserted
        })
    }

    fn count(&self) -> Result<u64, StorageError> {
        let conn = self.lock()?;
        Self::count_rows(&conn)
    }
}

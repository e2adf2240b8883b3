//! SQLite migration registry and executor.
//!
//! # Responsibility
//! - Register schema migrations in strictly increasing order.
//! - Apply pending migrations atomically.
//!
//! # Invariants
//! - `version` values must remain monotonic.
//! - Applied migration version is mirrored to `PRAGMA user_version`.
//! - Every step tolerates tables created by older bootstraps that never
//!   recorded a `user_version`.

use crate::db::{DbError, DbResult};
use log::{info, warn};
use rusqlite::{Connection, Transaction};

type MigrationFn = fn(&Transaction<'_>) -> rusqlite::Result<()>;

#[derive(Clone, Copy)]
struct Migration {
    version: u32,
    name: &'static str,
    apply: MigrationFn,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "init",
        apply: init_tables,
    },
    Migration {
        version: 2,
        name: "docs_cache_column",
        apply: add_docs_cache_column,
    },
    Migration {
        version: 3,
        name: "corpus_meta_unique",
        apply: unique_corpus_meta,
    },
    Migration {
        version: 4,
        name: "normalize_rule_domains",
        apply: normalize_rule_domains,
    },
];

/// Returns the latest migration version known by this binary.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Applies all pending migrations on the provided connection.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let current_version = current_user_version(conn)?;
    let latest = latest_version();

    if current_version > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current_version,
            latest_supported: latest,
        });
    }

    if current_version == latest {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for migration in MIGRATIONS {
        if migration.version <= current_version {
            continue;
        }

        (migration.apply)(&tx)?;
        tx.execute_batch(&format!("PRAGMA user_version = {};", migration.version))?;
        info!(
            "event=db_migrate module=db status=ok version={} name={}",
            migration.version, migration.name
        );
    }
    tx.commit()?;

    Ok(())
}

/// Returns whether `table` currently has a column named `column`.
pub fn table_has_column(conn: &Connection, table: &str, column: &str) -> rusqlite::Result<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}

fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

fn init_tables(tx: &Transaction<'_>) -> rusqlite::Result<()> {
    tx.execute_batch(include_str!("0001_init.sql"))
}

// Databases bootstrapped before the render cache existed lack this column.
fn add_docs_cache_column(tx: &Transaction<'_>) -> rusqlite::Result<()> {
    if table_has_column(tx, "docs", "cache")? {
        return Ok(());
    }
    tx.execute_batch("ALTER TABLE docs ADD COLUMN cache TEXT DEFAULT NULL;")
}

fn unique_corpus_meta(tx: &Transaction<'_>) -> rusqlite::Result<()> {
    tx.execute_batch(include_str!("0003_corpus_meta_unique.sql"))
}

// Older writers stored the domain verbatim, e.g. `XML` or ` meta`.
fn normalize_rule_domains(tx: &Transaction<'_>) -> rusqlite::Result<()> {
    let normalized = tx.execute(
        "UPDATE validate
         SET domain = lower(trim(domain))
         WHERE lower(trim(domain)) IN ('xml', 'meta', 'ether', 'export')
           AND domain <> lower(trim(domain));",
        [],
    )?;
    let unmapped: i64 = tx.query_row(
        "SELECT COUNT(*)
         FROM validate
         WHERE domain IS NULL
            OR domain NOT IN ('xml', 'meta', 'ether', 'export');",
        [],
        |row| row.get(0),
    )?;
    if unmapped > 0 {
        warn!(
            "event=db_migrate module=db status=partial name=normalize_rule_domains normalized={} unmapped={}",
            normalized, unmapped
        );
    }
    Ok(())
}

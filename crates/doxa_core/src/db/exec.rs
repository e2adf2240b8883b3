//! Single-statement execution over scoped transactions.
//!
//! # Responsibility
//! - Provide the store access primitive every repository builds on.
//! - Commit on success; roll back when the transaction guard is dropped.
//!
//! # Invariants
//! - A scoped call joins an already-open transaction instead of nesting.
//! - Failed statements are surfaced as-is; nothing is retried here.

use super::DbResult;
use rusqlite::types::Value;
use rusqlite::{Connection, Params};

/// Result of [`execute`]: either the generated row identity or the full row set.
#[derive(Debug, Clone, PartialEq)]
pub enum StatementOutput {
    NewId(i64),
    Rows(Vec<Vec<Value>>),
}

impl StatementOutput {
    /// Returns the generated identity, if the statement was run in new-id mode.
    pub fn new_id(&self) -> Option<i64> {
        match self {
            Self::NewId(id) => Some(*id),
            Self::Rows(_) => None,
        }
    }

    /// Consumes the output and returns all fetched rows (empty in new-id mode).
    pub fn into_rows(self) -> Vec<Vec<Value>> {
        match self {
            Self::NewId(_) => Vec::new(),
            Self::Rows(rows) => rows,
        }
    }
}

/// Runs `f` inside a scoped transaction on `conn`.
///
/// The transaction commits when `f` returns `Ok` and rolls back when the
/// guard is dropped on `Err`. If `conn` already has an open transaction the
/// closure runs inside it and the outer scope decides commit/rollback.
pub fn run_scoped<T, E, F>(conn: &Connection, f: F) -> Result<T, E>
where
    F: FnOnce(&Connection) -> Result<T, E>,
    E: From<rusqlite::Error>,
{
    if !conn.is_autocommit() {
        return f(conn);
    }

    let tx = conn.unchecked_transaction()?;
    let value = f(&tx)?;
    tx.commit()?;
    Ok(value)
}

/// Executes exactly one statement in a scoped transaction.
///
/// Repositories use it for single-row inserts that hand back an identity;
/// it is also the generic entry point for untyped callers. Writes that span
/// several statements compose them inside [`run_scoped`] instead.
///
/// With `return_new_id` set, the statement is executed for its side effect
/// and the connection's last inserted rowid is returned. Otherwise every
/// result row is fetched as a vector of dynamically typed values.
pub fn execute<P: Params>(
    conn: &Connection,
    sql: &str,
    params: P,
    return_new_id: bool,
) -> DbResult<StatementOutput> {
    run_scoped(conn, |conn| {
        let mut stmt = conn.prepare(sql)?;
        if return_new_id {
            stmt.execute(params)?;
            return Ok(StatementOutput::NewId(conn.last_insert_rowid()));
        }

        let column_count = stmt.column_count();
        let mut rows = stmt.query(params)?;
        let mut fetched = Vec::new();
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(column_count);
            for idx in 0..column_count {
                values.push(row.get::<_, Value>(idx)?);
            }
            fetched.push(values);
        }
        Ok(StatementOutput::Rows(fetched))
    })
}

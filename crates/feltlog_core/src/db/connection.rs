//! Connection adapter over the embedded SQLite engine.
//!
//! # Responsibility
//! - Open file or in-memory SQLite connections, optionally keyed.
//! - Execute compiled SQL + parameters, classifying statements into read
//!   mode (materialized rows) and write mode (change count, insert id).
//! - Issue transaction control as raw `BEGIN`/`COMMIT`/`ROLLBACK`.
//!
//! # Invariants
//! - The encryption key pragma runs before any other statement; a wrong
//!   key surfaces on the first real statement, not at open.
//! - `close()` invalidates the handle; later calls fail with
//!   `DbError::NotInitialized` and never reopen silently.
//! - Reads materialize fully; there is no streaming/cursor API.

use super::{DbError, DbResult};
use log::{error, info};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Database file name used when the host does not override it.
pub const DEFAULT_DB_NAME: &str = "feltlog.db";

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Execution mode derived from the statement text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatementKind {
    /// Returns rows; no change-count semantics.
    Read,
    /// Returns an affected-row count.
    Write,
    /// Write that also yields the newly assigned row identifier.
    Insert,
}

/// Result of one statement execution.
#[derive(Debug, Clone)]
pub struct ExecOutcome {
    /// Fully materialized result rows (empty for write-mode statements).
    pub rows: Vec<SqlRow>,
    /// Rows affected by a write-mode statement, 0 in read mode.
    pub changed: usize,
    /// Rowid assigned by an insert, absent otherwise.
    pub insert_id: Option<i64>,
}

/// One materialized result row, addressed by column name.
#[derive(Debug, Clone)]
pub struct SqlRow {
    columns: Arc<Vec<String>>,
    values: Vec<Value>,
}

impl SqlRow {
    fn value(&self, column: &str) -> DbResult<&Value> {
        let index = self
            .columns
            .iter()
            .position(|name| name == column)
            .ok_or_else(|| DbError::Decode(format!("unknown column `{column}`")))?;
        Ok(&self.values[index])
    }

    /// Reads a non-null TEXT column.
    pub fn text(&self, column: &str) -> DbResult<String> {
        match self.value(column)? {
            Value::Text(value) => Ok(value.clone()),
            other => Err(DbError::Decode(format!(
                "column `{column}` is not text: {other:?}"
            ))),
        }
    }

    /// Reads a nullable TEXT column.
    pub fn opt_text(&self, column: &str) -> DbResult<Option<String>> {
        match self.value(column)? {
            Value::Null => Ok(None),
            Value::Text(value) => Ok(Some(value.clone())),
            other => Err(DbError::Decode(format!(
                "column `{column}` is not text: {other:?}"
            ))),
        }
    }

    /// Reads a non-null INTEGER column.
    pub fn integer(&self, column: &str) -> DbResult<i64> {
        match self.value(column)? {
            Value::Integer(value) => Ok(*value),
            other => Err(DbError::Decode(format!(
                "column `{column}` is not an integer: {other:?}"
            ))),
        }
    }

    /// Reads a non-null REAL column. Whole numbers may come back with
    /// INTEGER affinity and are widened.
    pub fn real(&self, column: &str) -> DbResult<f64> {
        match self.value(column)? {
            Value::Real(value) => Ok(*value),
            Value::Integer(value) => Ok(*value as f64),
            other => Err(DbError::Decode(format!(
                "column `{column}` is not a real: {other:?}"
            ))),
        }
    }

    /// Reads a nullable REAL column.
    pub fn opt_real(&self, column: &str) -> DbResult<Option<f64>> {
        match self.value(column)? {
            Value::Null => Ok(None),
            Value::Real(value) => Ok(Some(*value)),
            Value::Integer(value) => Ok(Some(*value as f64)),
            other => Err(DbError::Decode(format!(
                "column `{column}` is not a real: {other:?}"
            ))),
        }
    }
}

/// Host-owned handle to one open SQLite database.
///
/// The host opens the handle, passes it to the repository factory and is
/// responsible for closing it; repositories and the migration runner never
/// open or close connections themselves.
pub struct DbHandle {
    conn: Option<Connection>,
}

impl DbHandle {
    /// Opens a database file, applying the encryption key (when supplied)
    /// before any other statement.
    pub fn open(path: impl AsRef<Path>, encryption_key: Option<&str>) -> DbResult<Self> {
        info!(
            "event=db_open module=db status=start mode=file keyed={}",
            encryption_key.is_some()
        );
        let conn = match Connection::open(path) {
            Ok(conn) => conn,
            Err(err) => {
                error!("event=db_open module=db status=error mode=file error={err}");
                return Err(err.into());
            }
        };
        match bootstrap(&conn, encryption_key) {
            Ok(()) => {
                info!("event=db_open module=db status=ok mode=file");
                Ok(Self { conn: Some(conn) })
            }
            Err(err) => {
                error!("event=db_open module=db status=error mode=file error={err}");
                Err(err)
            }
        }
    }

    /// Opens an in-memory database, used heavily by tests.
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        bootstrap(&conn, None)?;
        info!("event=db_open module=db status=ok mode=memory");
        Ok(Self { conn: Some(conn) })
    }

    /// Returns whether the handle still owns a live connection.
    pub fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    fn conn(&self) -> DbResult<&Connection> {
        self.conn.as_ref().ok_or(DbError::NotInitialized)
    }

    /// Executes one statement with positional parameters.
    ///
    /// The execution mode is derived from the statement text: statements
    /// starting with `INSERT`/`UPDATE`/`DELETE`/`REPLACE` run in write
    /// mode, everything else in read mode with fully materialized rows.
    pub fn execute(&self, sql: &str, params: &[Value]) -> DbResult<ExecOutcome> {
        let conn = self.conn()?;
        match classify_statement(sql) {
            StatementKind::Read => {
                let mut stmt = conn.prepare(sql)?;
                let columns: Arc<Vec<String>> = Arc::new(
                    stmt.column_names()
                        .into_iter()
                        .map(str::to_owned)
                        .collect(),
                );
                let column_count = columns.len();
                let mut rows = stmt.query(params_from_iter(params.iter()))?;
                let mut materialized = Vec::new();
                while let Some(row) = rows.next()? {
                    let mut values = Vec::with_capacity(column_count);
                    for index in 0..column_count {
                        values.push(row.get::<_, Value>(index)?);
                    }
                    materialized.push(SqlRow {
                        columns: Arc::clone(&columns),
                        values,
                    });
                }
                Ok(ExecOutcome {
                    rows: materialized,
                    changed: 0,
                    insert_id: None,
                })
            }
            kind => {
                let changed = conn.execute(sql, params_from_iter(params.iter()))?;
                let insert_id = match kind {
                    StatementKind::Insert => Some(conn.last_insert_rowid()),
                    _ => None,
                };
                Ok(ExecOutcome {
                    rows: Vec::new(),
                    changed,
                    insert_id,
                })
            }
        }
    }

    /// Executes a multi-statement script. Schema migrations only.
    pub fn execute_batch(&self, sql: &str) -> DbResult<()> {
        self.conn()?.execute_batch(sql)?;
        Ok(())
    }

    /// Starts a transaction as a raw statement.
    pub fn begin_transaction(&self) -> DbResult<()> {
        self.conn()?.execute_batch("BEGIN;")?;
        Ok(())
    }

    /// Commits the open transaction.
    pub fn commit(&self) -> DbResult<()> {
        self.conn()?.execute_batch("COMMIT;")?;
        Ok(())
    }

    /// Rolls back the open transaction.
    pub fn rollback(&self) -> DbResult<()> {
        self.conn()?.execute_batch("ROLLBACK;")?;
        Ok(())
    }

    /// Closes the handle. Every later operation fails with
    /// `DbError::NotInitialized`.
    pub fn close(&mut self) -> DbResult<()> {
        match self.conn.take() {
            Some(conn) => {
                conn.close().map_err(|(_, err)| DbError::Sqlite(err))?;
                info!("event=db_close module=db status=ok");
                Ok(())
            }
            None => Err(DbError::NotInitialized),
        }
    }
}

fn bootstrap(conn: &Connection, encryption_key: Option<&str>) -> DbResult<()> {
    if let Some(key) = encryption_key {
        conn.pragma_update(None, "key", key)?;
    }
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    Ok(())
}

fn classify_statement(sql: &str) -> StatementKind {
    let keyword = sql
        .trim_start()
        .split_whitespace()
        .next()
        .unwrap_or("")
        .to_ascii_uppercase();
    match keyword.as_str() {
        "INSERT" | "REPLACE" => StatementKind::Insert,
        "UPDATE" | "DELETE" => StatementKind::Write,
        _ => StatementKind::Read,
    }
}

//! SQLite storage bootstrap, execution driver and schema migrations.
//!
//! # Responsibility
//! - Own the single live connection handle per opened database.
//! - Translate compiled SQL + parameters into engine calls.
//! - Apply additive schema migrations in dependency order.
//!
//! # Invariants
//! - A closed handle fails every operation with `DbError::NotInitialized`.
//! - Returned handles have `foreign_keys=ON` before any application SQL.
//! - The optional encryption key is applied before any other statement.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod connection;
pub mod migrations;

pub use connection::{DbHandle, ExecOutcome, SqlRow, DEFAULT_DB_NAME};

pub type DbResult<T> = Result<T, DbError>;

/// Transport-level database error.
#[derive(Debug)]
pub enum DbError {
    /// Operation attempted on a closed or never-opened handle.
    NotInitialized,
    /// Underlying engine failure, including a wrong encryption key
    /// surfacing on the first real statement.
    Sqlite(rusqlite::Error),
    /// A materialized row could not be decoded into the requested shape.
    Decode(String),
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotInitialized => write!(f, "database not initialized; open a handle first"),
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::Decode(message) => write!(f, "row decode failed: {message}"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::NotInitialized | Self::Decode(_) => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

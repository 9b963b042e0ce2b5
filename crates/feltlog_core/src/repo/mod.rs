//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the domain-facing storage contract over entries and tags.
//! - Keep SQL details inside the persistence boundary; raw rows never
//!   leak past it.
//!
//! # Invariants
//! - Multi-statement writes are atomic; a partial failure leaves no
//!   observable half-written entry.
//! - Failures are translated into the repository taxonomy, never
//!   swallowed and never retried.

use crate::db::DbError;
use crate::model::journal::EntryId;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod journal_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error taxonomy.
#[derive(Debug)]
pub enum RepoError {
    /// Operation attempted on a closed handle.
    NotInitialized,
    /// Unique or foreign-key failure at the engine level.
    Constraint(String),
    /// Reload of a written entry yielded nothing.
    NotFound(EntryId),
    /// Any other underlying statement failure.
    Engine(DbError),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotInitialized => write!(f, "database not initialized; open a handle first"),
            Self::Constraint(message) => write!(f, "constraint violation: {message}"),
            Self::NotFound(id) => write!(f, "entry not found: {id}"),
            Self::Engine(err) => write!(f, "{err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Engine(err) => Some(err),
            Self::NotInitialized | Self::Constraint(_) | Self::NotFound(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        match value {
            DbError::NotInitialized => Self::NotInitialized,
            DbError::Sqlite(rusqlite::Error::SqliteFailure(code, message))
                if code.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Self::Constraint(message.unwrap_or_else(|| code.to_string()))
            }
            other => Self::Engine(other),
        }
    }
}

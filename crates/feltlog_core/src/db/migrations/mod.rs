//! Schema migration registry and executor.
//!
//! # Responsibility
//! - Register additive schema scripts in dependency order.
//! - Apply them idempotently against an open handle.
//!
//! # Invariants
//! - Every statement uses `CREATE TABLE IF NOT EXISTS`; re-running the
//!   full set against an existing schema is safe.
//! - Application data is never touched before migrations succeed.

use super::{DbHandle, DbResult};
use log::info;

/// Additive schema scripts, ordered so referenced tables exist before the
/// tables that reference them.
const MIGRATIONS: &[&str] = &[include_str!("0001_schema.sql")];

/// Statements reversing the schema, children before parents. Not part of
/// normal startup.
const REVERT: &[&str] = &[
    "DROP TABLE IF EXISTS journal_entry_tags;",
    "DROP TABLE IF EXISTS journal_entries;",
    "DROP TABLE IF EXISTS tags;",
];

/// Applies all schema scripts on the provided handle.
///
/// Safe to call on a handle whose schema already exists.
pub fn apply_migrations(handle: &DbHandle) -> DbResult<()> {
    for script in MIGRATIONS {
        handle.execute_batch(script)?;
    }
    info!("event=migrations_apply module=db status=ok scripts={}", MIGRATIONS.len());
    Ok(())
}

/// Drops the schema in reverse dependency order.
pub fn revert_migrations(handle: &DbHandle) -> DbResult<()> {
    for statement in REVERT {
        handle.execute_batch(statement)?;
    }
    info!("event=migrations_revert module=db status=ok");
    Ok(())
}

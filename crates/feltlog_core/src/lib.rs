//! Core domain logic for feltlog, a local journal with tags and optional
//! geolocation on top of an embedded SQLite store.
//!
//! The host opens a [`DbHandle`], applies migrations, builds a repository
//! over the handle and drives a [`JournalView`] from its UI events; it is
//! also responsible for closing the handle when done.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use db::migrations::{apply_migrations, revert_migrations};
pub use db::{DbError, DbHandle, DbResult, ExecOutcome, SqlRow, DEFAULT_DB_NAME};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::journal::{
    EntryDraft, EntryId, EntryPatch, JournalEntry, Location, Tag, TagId,
};
pub use repo::journal_repo::{JournalRepository, SqliteJournalRepository};
pub use repo::{RepoError, RepoResult};
pub use service::journal_view::{
    JournalView, JournalViewState, ReloadTicket, BATCH_SIZE,
};

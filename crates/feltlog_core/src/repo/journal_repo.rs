//! Journal repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide the CRUD/query surface over entries and tags.
//! - Own tag resolve-or-create and join-table maintenance.
//!
//! # Invariants
//! - Entry creation and update run inside one BEGIN/COMMIT/ROLLBACK unit.
//! - Write paths return the freshly reloaded entry, never an echo of the
//!   input.
//! - Location reconstruction is all-or-nothing: a partially NULL location
//!   collapses to no location.
//! - Tag name equality is exact and case-sensitive; no normalization.

use crate::db::{DbError, DbHandle, SqlRow};
use crate::model::journal::{
    EntryDraft, EntryId, EntryPatch, JournalEntry, Location, Tag, TagId,
};
use crate::repo::{RepoError, RepoResult};
use rusqlite::types::Value;
use std::collections::BTreeSet;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

const ENTRY_SELECT_SQL: &str = "SELECT
    id,
    content,
    datetime,
    created_at,
    modified_at,
    location_latitude,
    location_longitude,
    location_elevation,
    location_accuracy,
    location_address
FROM journal_entries";

/// Storage contract consumed by the view coordinator.
///
/// Listing and search results are ordered by `datetime` descending and
/// enriched with each entry's tag set.
pub trait JournalRepository {
    /// Creates one entry plus its tag associations atomically and returns
    /// the canonical stored state.
    fn create_entry(&mut self, draft: EntryDraft) -> RepoResult<JournalEntry>;
    /// Applies only the fields present in the patch; `modified_at` is
    /// stamped unconditionally. A supplied tag set replaces the whole
    /// association set.
    fn update_entry(&mut self, id: EntryId, patch: EntryPatch) -> RepoResult<JournalEntry>;
    /// Removes one entry; associations go via cascade. Idempotent.
    fn delete_entry(&mut self, id: EntryId) -> RepoResult<()>;
    /// Single lookup; an unknown id is `Ok(None)`, not an error.
    fn get_entry(&self, id: EntryId) -> RepoResult<Option<JournalEntry>>;
    /// Unfiltered page.
    fn get_all_entries(&self, offset: u32, limit: u32) -> RepoResult<Vec<JournalEntry>>;
    /// Case-sensitive substring match on `content`.
    fn search_entries(&self, text: &str, offset: u32, limit: u32) -> RepoResult<Vec<JournalEntry>>;
    /// Entries carrying any of the given tag names, de-duplicated by id.
    fn get_entries_by_tags(
        &self,
        tag_names: &[String],
        offset: u32,
        limit: u32,
    ) -> RepoResult<Vec<JournalEntry>>;
    /// All tags ordered by name ascending.
    fn get_all_tags(&self) -> RepoResult<Vec<Tag>>;
    /// Inserts a new tag row; fails on duplicate names.
    fn create_tag(&mut self, name: &str) -> RepoResult<Tag>;
    /// Idempotent tag resolution primitive used by entry writes.
    fn get_or_create_tag(&mut self, name: &str) -> RepoResult<Tag>;
    /// Removes one tag; associations go via cascade. Idempotent.
    fn delete_tag(&mut self, id: TagId) -> RepoResult<()>;
    /// Tags associated with one entry, ordered by name.
    fn get_tags_for_entry(&self, entry_id: EntryId) -> RepoResult<Vec<Tag>>;
}

/// SQLite-backed journal repository over a host-owned handle.
pub struct SqliteJournalRepository<'h> {
    handle: &'h DbHandle,
}

impl<'h> SqliteJournalRepository<'h> {
    /// Constructs a repository from an opened, migrated handle.
    pub fn new(handle: &'h DbHandle) -> Self {
        Self { handle }
    }

    fn insert_entry(&self, id: EntryId, draft: &EntryDraft, now: i64) -> RepoResult<()> {
        let location = draft.location.as_ref();
        self.handle.execute(
            "INSERT INTO journal_entries (
                id,
                content,
                datetime,
                created_at,
                modified_at,
                location_latitude,
                location_longitude,
                location_elevation,
                location_accuracy,
                location_address
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10);",
            &[
                Value::Text(id.to_string()),
                Value::Text(draft.content.clone()),
                Value::Integer(draft.datetime),
                Value::Integer(now),
                Value::Integer(now),
                real_or_null(location.map(|at| at.latitude)),
                real_or_null(location.map(|at| at.longitude)),
                real_or_null(location.map(|at| at.elevation)),
                real_or_null(location.and_then(|at| at.accuracy)),
                text_or_null(location.and_then(|at| at.address.as_deref())),
            ],
        )?;
        self.link_tags(id, &draft.tags)
    }

    fn apply_patch(&self, id: EntryId, patch: &EntryPatch, now: i64) -> RepoResult<()> {
        let mut sql = String::from("UPDATE journal_entries SET modified_at = ?");
        let mut binds: Vec<Value> = vec![Value::Integer(now)];

        if let Some(content) = patch.content.as_ref() {
            sql.push_str(", content = ?");
            binds.push(Value::Text(content.clone()));
        }
        if let Some(datetime) = patch.datetime {
            sql.push_str(", datetime = ?");
            binds.push(Value::Integer(datetime));
        }
        if let Some(location) = patch.location.as_ref() {
            sql.push_str(
                ", location_latitude = ?, location_longitude = ?, \
                 location_elevation = ?, location_accuracy = ?, location_address = ?",
            );
            match location {
                Some(at) => {
                    binds.push(Value::Real(at.latitude));
                    binds.push(Value::Real(at.longitude));
                    binds.push(Value::Real(at.elevation));
                    binds.push(real_or_null(at.accuracy));
                    binds.push(text_or_null(at.address.as_deref()));
                }
                // Clearing removes all five columns together so a partial
                // location can never be materialized.
                None => binds.extend(std::iter::repeat(Value::Null).take(5)),
            }
        }

        sql.push_str(" WHERE id = ?;");
        binds.push(Value::Text(id.to_string()));
        self.handle.execute(&sql, &binds)?;

        if let Some(tags) = patch.tags.as_ref() {
            self.handle.execute(
                "DELETE FROM journal_entry_tags WHERE entry_id = ?1;",
                &[Value::Text(id.to_string())],
            )?;
            self.link_tags(id, tags)?;
        }
        Ok(())
    }

    fn link_tags(&self, entry_id: EntryId, names: &[String]) -> RepoResult<()> {
        let mut seen = BTreeSet::new();
        for name in names {
            // The input is a set; a repeated name would trip the composite
            // primary key.
            if !seen.insert(name.as_str()) {
                continue;
            }
            let tag = self.resolve_or_create_tag(name)?;
            self.handle.execute(
                "INSERT INTO journal_entry_tags (entry_id, tag_id) VALUES (?1, ?2);",
                &[
                    Value::Text(entry_id.to_string()),
                    Value::Text(tag.id.to_string()),
                ],
            )?;
        }
        Ok(())
    }

    fn resolve_or_create_tag(&self, name: &str) -> RepoResult<Tag> {
        let outcome = self.handle.execute(
            "SELECT id, name, created_at FROM tags WHERE name = ?1;",
            &[Value::Text(name.to_string())],
        )?;
        if let Some(row) = outcome.rows.first() {
            return tag_from_row(row);
        }
        self.insert_tag(name)
    }

    fn insert_tag(&self, name: &str) -> RepoResult<Tag> {
        let id = Uuid::new_v4();
        let now = now_ms();
        self.handle.execute(
            "INSERT INTO tags (id, name, created_at) VALUES (?1, ?2, ?3);",
            &[
                Value::Text(id.to_string()),
                Value::Text(name.to_string()),
                Value::Integer(now),
            ],
        )?;
        Ok(Tag {
            id,
            name: name.to_string(),
            created_at: now,
        })
    }

    fn entries_from_rows(&self, rows: &[SqlRow]) -> RepoResult<Vec<JournalEntry>> {
        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            entries.push(self.entry_from_row(row)?);
        }
        Ok(entries)
    }

    fn entry_from_row(&self, row: &SqlRow) -> RepoResult<JournalEntry> {
        let id = parse_uuid(&row.text("id")?)?;
        let tags = self
            .get_tags_for_entry(id)?
            .into_iter()
            .map(|tag| tag.name)
            .collect();
        Ok(JournalEntry {
            id,
            content: row.text("content")?,
            datetime: row.integer("datetime")?,
            created_at: row.integer("created_at")?,
            modified_at: row.integer("modified_at")?,
            tags,
            location: location_from_row(row)?,
        })
    }
}

impl JournalRepository for SqliteJournalRepository<'_> {
    fn create_entry(&mut self, draft: EntryDraft) -> RepoResult<JournalEntry> {
        let id = Uuid::new_v4();
        let now = now_ms();

        self.handle.begin_transaction()?;
        match self.insert_entry(id, &draft, now) {
            Ok(()) => self.handle.commit()?,
            Err(err) => {
                // Best effort; the original failure is the one to report.
                let _ = self.handle.rollback();
                return Err(err);
            }
        }

        self.get_entry(id)?.ok_or(RepoError::NotFound(id))
    }

    fn update_entry(&mut self, id: EntryId, patch: EntryPatch) -> RepoResult<JournalEntry> {
        let now = now_ms();

        self.handle.begin_transaction()?;
        match self.apply_patch(id, &patch, now) {
            Ok(()) => self.handle.commit()?,
            Err(err) => {
                let _ = self.handle.rollback();
                return Err(err);
            }
        }

        self.get_entry(id)?.ok_or(RepoError::NotFound(id))
    }

    fn delete_entry(&mut self, id: EntryId) -> RepoResult<()> {
        self.handle.execute(
            "DELETE FROM journal_entries WHERE id = ?1;",
            &[Value::Text(id.to_string())],
        )?;
        Ok(())
    }

    fn get_entry(&self, id: EntryId) -> RepoResult<Option<JournalEntry>> {
        let outcome = self.handle.execute(
            &format!("{ENTRY_SELECT_SQL} WHERE id = ?1;"),
            &[Value::Text(id.to_string())],
        )?;
        match outcome.rows.first() {
            Some(row) => Ok(Some(self.entry_from_row(row)?)),
            None => Ok(None),
        }
    }

    fn get_all_entries(&self, offset: u32, limit: u32) -> RepoResult<Vec<JournalEntry>> {
        let outcome = self.handle.execute(
            &format!("{ENTRY_SELECT_SQL} ORDER BY datetime DESC LIMIT ? OFFSET ?;"),
            &[Value::Integer(i64::from(limit)), Value::Integer(i64::from(offset))],
        )?;
        self.entries_from_rows(&outcome.rows)
    }

    fn search_entries(&self, text: &str, offset: u32, limit: u32) -> RepoResult<Vec<JournalEntry>> {
        // instr() is the engine's byte-wise substring primitive; LIKE folds
        // ASCII case and interprets %/_ wildcards.
        let outcome = self.handle.execute(
            &format!(
                "{ENTRY_SELECT_SQL} WHERE instr(content, ?) > 0 \
                 ORDER BY datetime DESC LIMIT ? OFFSET ?;"
            ),
            &[
                Value::Text(text.to_string()),
                Value::Integer(i64::from(limit)),
                Value::Integer(i64::from(offset)),
            ],
        )?;
        self.entries_from_rows(&outcome.rows)
    }

    fn get_entries_by_tags(
        &self,
        tag_names: &[String],
        offset: u32,
        limit: u32,
    ) -> RepoResult<Vec<JournalEntry>> {
        if tag_names.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; tag_names.len()].join(", ");
        let sql = format!(
            "SELECT
                e.id,
                e.content,
                e.datetime,
                e.created_at,
                e.modified_at,
                e.location_latitude,
                e.location_longitude,
                e.location_elevation,
                e.location_accuracy,
                e.location_address
             FROM journal_entries e
             INNER JOIN journal_entry_tags et ON et.entry_id = e.id
             INNER JOIN tags t ON t.id = et.tag_id
             WHERE t.name IN ({placeholders})
             GROUP BY e.id
             ORDER BY e.datetime DESC LIMIT ? OFFSET ?;"
        );

        let mut binds: Vec<Value> = tag_names
            .iter()
            .map(|name| Value::Text(name.clone()))
            .collect();
        binds.push(Value::Integer(i64::from(limit)));
        binds.push(Value::Integer(i64::from(offset)));

        let outcome = self.handle.execute(&sql, &binds)?;
        self.entries_from_rows(&outcome.rows)
    }

    fn get_all_tags(&self) -> RepoResult<Vec<Tag>> {
        let outcome = self
            .handle
            .execute("SELECT id, name, created_at FROM tags ORDER BY name ASC;", &[])?;
        outcome.rows.iter().map(tag_from_row).collect()
    }

    fn create_tag(&mut self, name: &str) -> RepoResult<Tag> {
        self.insert_tag(name)
    }

    fn get_or_create_tag(&mut self, name: &str) -> RepoResult<Tag> {
        self.resolve_or_create_tag(name)
    }

    fn delete_tag(&mut self, id: TagId) -> RepoResult<()> {
        self.handle.execute(
            "DELETE FROM tags WHERE id = ?1;",
            &[Value::Text(id.to_string())],
        )?;
        Ok(())
    }

    fn get_tags_for_entry(&self, entry_id: EntryId) -> RepoResult<Vec<Tag>> {
        let outcome = self.handle.execute(
            "SELECT t.id, t.name, t.created_at
             FROM tags t
             INNER JOIN journal_entry_tags et ON et.tag_id = t.id
             WHERE et.entry_id = ?1
             ORDER BY t.name ASC;",
            &[Value::Text(entry_id.to_string())],
        )?;
        outcome.rows.iter().map(tag_from_row).collect()
    }
}

fn tag_from_row(row: &SqlRow) -> RepoResult<Tag> {
    Ok(Tag {
        id: parse_uuid(&row.text("id")?)?,
        name: row.text("name")?,
        created_at: row.integer("created_at")?,
    })
}

fn location_from_row(row: &SqlRow) -> RepoResult<Option<Location>> {
    let latitude = row.opt_real("location_latitude")?;
    let longitude = row.opt_real("location_longitude")?;
    let elevation = row.opt_real("location_elevation")?;
    match (latitude, longitude, elevation) {
        (Some(latitude), Some(longitude), Some(elevation)) => Ok(Some(Location {
            latitude,
            longitude,
            elevation,
            accuracy: row.opt_real("location_accuracy")?,
            address: row.opt_text("location_address")?,
        })),
        // Any missing required coordinate collapses the whole location.
        _ => Ok(None),
    }
}

fn real_or_null(value: Option<f64>) -> Value {
    value.map_or(Value::Null, Value::Real)
}

fn text_or_null(value: Option<&str>) -> Value {
    value.map_or(Value::Null, |text| Value::Text(text.to_string()))
}

fn parse_uuid(value: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(value).map_err(|_| {
        RepoError::Engine(DbError::Decode(format!(
            "invalid uuid value `{value}` in stored id column"
        )))
    })
}

// A clock before the Unix epoch degrades to 0 rather than failing writes.
fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or(0)
}

//! Query/cache coordinator for the journal view.
//!
//! # Responsibility
//! - Hold the visible slice of entries plus filter, loading and error
//!   state.
//! - Sequence reloads so close-together triggers never leave stale
//!   results on screen.
//!
//! # Invariants
//! - At most one filter kind drives a reload: a non-empty search query
//!   takes precedence over selected tags.
//! - `has_more` is derived from the last fetch returning a full batch,
//!   never requested from storage.
//! - A reload issued for a superseded filter state is discarded; the last
//!   triggering state wins.
//! - The loading flag is cleared on every exit path of a trigger.

use crate::model::journal::{EntryDraft, EntryId, EntryPatch, JournalEntry, Location, Tag};
use crate::repo::journal_repo::JournalRepository;
use crate::repo::RepoResult;

/// Fixed page length for listing, search and tag-filter queries.
pub const BATCH_SIZE: usize = 10;

/// Snapshot of the coordinator exposed to the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub struct JournalViewState {
    /// Visible slice of entries; more may be appended via pagination.
    pub entries: Vec<JournalEntry>,
    /// Known tags for filter UI.
    pub tags: Vec<Tag>,
    /// Whether a triggering action is in progress.
    pub loading: bool,
    /// Most recent error message, held until dismissed or superseded.
    pub error: Option<String>,
    /// Current free-text filter; takes precedence when non-empty.
    pub search_query: String,
    /// Currently selected tag names; OR semantics.
    pub selected_tags: Vec<String>,
    /// Whether another page is likely available.
    pub has_more: bool,
}

impl Default for JournalViewState {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            tags: Vec::new(),
            loading: false,
            error: None,
            search_query: String::new(),
            selected_tags: Vec::new(),
            has_more: true,
        }
    }
}

/// Filter state resolved at the moment a reload is issued.
#[derive(Debug, Clone, PartialEq, Eq)]
enum FilterSnapshot {
    All,
    Search(String),
    Tags(Vec<String>),
}

/// Claim on one page fetch. Completing a ticket after a newer replace
/// reload has been issued is a no-op.
#[derive(Debug)]
pub struct ReloadTicket {
    generation: u64,
    offset: usize,
    append: bool,
    filter: FilterSnapshot,
}

/// Coordinator between presentation widgets and the journal repository.
///
/// Runs on a single logical thread of control; the generation guard in
/// `complete_reload` is the only ordering protection between triggers.
pub struct JournalView<R: JournalRepository> {
    repo: R,
    state: JournalViewState,
    generation: u64,
}

impl<R: JournalRepository> JournalView<R> {
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            state: JournalViewState::default(),
            generation: 0,
        }
    }

    /// Current view state for rendering.
    pub fn state(&self) -> &JournalViewState {
        &self.state
    }

    /// Read access to the underlying repository.
    pub fn repo(&self) -> &R {
        &self.repo
    }

    fn active_filter(&self) -> FilterSnapshot {
        if !self.state.search_query.is_empty() {
            FilterSnapshot::Search(self.state.search_query.clone())
        } else if !self.state.selected_tags.is_empty() {
            FilterSnapshot::Tags(self.state.selected_tags.clone())
        } else {
            FilterSnapshot::All
        }
    }

    /// Snapshots the current filter for one page fetch. A replace-mode
    /// reload supersedes every reload issued before it, including
    /// in-flight appends.
    pub fn begin_reload(&mut self, offset: usize, append: bool) -> ReloadTicket {
        if !append {
            self.generation += 1;
        }
        self.state.error = None;
        ReloadTicket {
            generation: self.generation,
            offset,
            append,
            filter: self.active_filter(),
        }
    }

    /// Fetches the page described by the ticket from the repository.
    pub fn fetch_page(&self, ticket: &ReloadTicket) -> RepoResult<Vec<JournalEntry>> {
        let offset = ticket.offset as u32;
        let limit = BATCH_SIZE as u32;
        match &ticket.filter {
            FilterSnapshot::Search(query) => self.repo.search_entries(query, offset, limit),
            FilterSnapshot::Tags(names) => self.repo.get_entries_by_tags(names, offset, limit),
            FilterSnapshot::All => self.repo.get_all_entries(offset, limit),
        }
    }

    /// Merges a fetched page into the visible state unless the ticket was
    /// superseded, in which case the result is discarded.
    pub fn complete_reload(&mut self, ticket: ReloadTicket, result: RepoResult<Vec<JournalEntry>>) {
        if ticket.generation != self.generation {
            return;
        }
        match result {
            Ok(batch) => {
                self.state.has_more = batch.len() == BATCH_SIZE;
                if ticket.append {
                    self.state.entries.extend(batch);
                } else {
                    self.state.entries = batch;
                }
            }
            Err(err) => self.state.error = Some(err.to_string()),
        }
    }

    fn reload_entries(&mut self, offset: usize, append: bool) {
        let ticket = self.begin_reload(offset, append);
        let result = self.fetch_page(&ticket);
        self.complete_reload(ticket, result);
    }

    fn reload_tags(&mut self) {
        match self.repo.get_all_tags() {
            Ok(tags) => self.state.tags = tags,
            Err(err) => self.state.error = Some(err.to_string()),
        }
    }

    /// Replaces the free-text filter and refetches from offset 0.
    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.state.search_query = query.into();
        self.reload_entries(0, false);
    }

    /// Replaces the tag selection and refetches from offset 0.
    pub fn set_selected_tags(&mut self, tag_names: Vec<String>) {
        self.state.selected_tags = tag_names;
        self.reload_entries(0, false);
    }

    /// Drops both filters and refetches the unfiltered listing.
    pub fn clear_filters(&mut self) {
        self.state.search_query.clear();
        self.state.selected_tags.clear();
        self.reload_entries(0, false);
    }

    /// Appends the next page. No-op unless more data is expected and no
    /// triggering action is in progress.
    pub fn load_more(&mut self) {
        if !self.state.has_more || self.state.loading {
            return;
        }
        self.reload_entries(self.state.entries.len(), true);
    }

    /// Reloads the first entry page and the tag list. The host's
    /// view-re-entry signal is a call to this method.
    pub fn refresh(&mut self) {
        self.state.loading = true;
        self.state.error = None;
        self.reload_entries(0, false);
        self.reload_tags();
        self.state.loading = false;
    }

    /// Validates and persists a new entry, then reloads the first page
    /// and tag list since sort order and new tags may change the page.
    ///
    /// Whitespace-only content is rejected before any repository call.
    pub fn create_entry(
        &mut self,
        content: &str,
        datetime: i64,
        tags: Vec<String>,
        location: Option<Location>,
    ) -> Option<JournalEntry> {
        let trimmed = content.trim();
        if trimmed.is_empty() {
            self.state.error = Some("Content cannot be empty".to_string());
            return None;
        }

        self.state.loading = true;
        self.state.error = None;
        let draft = EntryDraft {
            content: trimmed.to_string(),
            datetime,
            tags,
            location,
        };
        let created = match self.repo.create_entry(draft) {
            Ok(entry) => {
                self.reload_entries(0, false);
                self.reload_tags();
                Some(entry)
            }
            Err(err) => {
                self.state.error = Some(err.to_string());
                None
            }
        };
        self.state.loading = false;
        created
    }

    /// Persists a partial update and replaces the matching visible entry
    /// in place; no full reload.
    pub fn update_entry(&mut self, id: EntryId, patch: EntryPatch) -> Option<JournalEntry> {
        self.state.loading = true;
        self.state.error = None;
        let tags_changed = patch.tags.is_some();
        let updated = match self.repo.update_entry(id, patch) {
            Ok(entry) => {
                for slot in &mut self.state.entries {
                    if slot.id == id {
                        *slot = entry.clone();
                    }
                }
                if tags_changed {
                    self.reload_tags();
                }
                Some(entry)
            }
            Err(err) => {
                self.state.error = Some(err.to_string());
                None
            }
        };
        self.state.loading = false;
        updated
    }

    /// Deletes an entry and removes it from the visible slice in place.
    pub fn delete_entry(&mut self, id: EntryId) -> bool {
        self.state.loading = true;
        self.state.error = None;
        let deleted = match self.repo.delete_entry(id) {
            Ok(()) => {
                self.state.entries.retain(|entry| entry.id != id);
                true
            }
            Err(err) => {
                self.state.error = Some(err.to_string());
                false
            }
        };
        self.state.loading = false;
        deleted
    }

    /// Clears the held error message.
    pub fn dismiss_error(&mut self) {
        self.state.error = None;
    }
}

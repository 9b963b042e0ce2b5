//! Journal entry and tag domain records.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a journal entry.
pub type EntryId = Uuid;

/// Stable identifier for a tag.
pub type TagId = Uuid;

/// Geographic position attached to an entry.
///
/// The three required fields are all present or the location is absent as
/// a whole; `accuracy` and `address` are optional extras on top.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub elevation: f64,
    pub accuracy: Option<f64>,
    pub address: Option<String>,
}

/// One journal record as stored and surfaced to the view layer.
///
/// Timestamps are Unix epoch milliseconds. `datetime` is the
/// user-adjustable logical timestamp and the default ordering key;
/// `created_at`/`modified_at` are audit stamps owned by the repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: EntryId,
    pub content: String,
    pub datetime: i64,
    pub created_at: i64,
    pub modified_at: i64,
    /// Tag names, unique, surfaced in name order.
    pub tags: Vec<String>,
    pub location: Option<Location>,
}

/// Named label, many-to-many with entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    /// Unique text key; equality is exact and case-sensitive.
    pub name: String,
    pub created_at: i64,
}

/// Caller-supplied fields for entry creation. The repository assigns the
/// identifier and audit timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryDraft {
    pub content: String,
    pub datetime: i64,
    pub tags: Vec<String>,
    pub location: Option<Location>,
}

/// Partial update for one entry. Absent fields are left untouched;
/// `location: Some(None)` clears the stored location as a whole, and
/// `tags: Some(..)` replaces the full tag set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryPatch {
    pub content: Option<String>,
    pub datetime: Option<i64>,
    pub location: Option<Option<Location>>,
    pub tags: Option<Vec<String>>,
}

impl EntryPatch {
    /// Returns whether applying this patch would change nothing but the
    /// `modified_at` stamp.
    pub fn is_empty(&self) -> bool {
        self.content.is_none()
            && self.datetime.is_none()
            && self.location.is_none()
            && self.tags.is_none()
    }
}

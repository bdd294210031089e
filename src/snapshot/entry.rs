//! Snapshot Entry Module
//!
//! Defines the per-key entry and the point-in-time snapshot that carries them.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::snapshot::KeyKind;

// == Entry ==
/// One key's type plus a human-readable rendering of its value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    pub key: String,
    pub kind: KeyKind,
    pub display: String,
}

impl Entry {
    pub fn new(key: impl Into<String>, kind: KeyKind, display: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            kind,
            display: display.into(),
        }
    }
}

// == Skipped Key ==
/// A key left out of a snapshot under the skip-key policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedKey {
    pub key: String,
    pub reason: String,
}

// == Snapshot ==
/// Point-in-time enumeration of the keyspace.
///
/// Built from scratch by each poll and never mutated after it is returned.
/// Entries are sorted by key and each key appears at most once.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    /// Poll cycle number assigned by the engine
    pub sequence: u64,
    /// When the poll started
    pub taken_at: DateTime<Utc>,
    /// Entries ordered by key
    pub entries: Vec<Entry>,
    /// Keys dropped because of per-key errors
    pub skipped: Vec<SkippedKey>,
}

impl Snapshot {
    /// Number of entries in the snapshot.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the keyspace was empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks up an entry by key.
    pub fn get(&self, key: &str) -> Option<&Entry> {
        self.entries
            .binary_search_by(|entry| entry.key.as_str().cmp(key))
            .ok()
            .map(|idx| &self.entries[idx])
    }
}

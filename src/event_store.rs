use crate::entry::{Entry, EntryId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// Direction of a paginated fetch relative to the already-merged window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FetchDirection {
    Newer,
    Older,
}

/// Outcome of merging one paginated batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeResult {
    /// Whether at least one entry was actually added.
    pub added: bool,
    pub accepted: usize,
    pub duplicates_dropped: usize,
    pub malformed_dropped: usize,
    /// Cursor to use for the next fetch in the same direction.
    pub new_cursor: Option<EntryId>,
}

/// Deduplicated, ordered collection of merged audit-log entries.
///
/// Entries are kept sorted ascending by id (display order, oldest first), so
/// repeated merges of the same batches are deterministic regardless of
/// arrival order. Merge is a set-union keyed by id; duplicates and
/// unclassifiable entries are dropped silently.
#[derive(Debug, Default, Clone)]
pub struct EventStore {
    entries: Vec<Entry>,
    known_ids: HashSet<EntryId>,
    min_id: Option<EntryId>,
    max_id: Option<EntryId>,
    end_reached: bool,
    loading_newer: bool,
    loading_older: bool,
}

impl EventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges a batch, dropping duplicates and unclassifiable entries.
    ///
    /// An `Older` merge that adds nothing marks the end of the log. Merging
    /// the same batch twice leaves the store unchanged.
    pub fn merge(&mut self, batch: Vec<Entry>, direction: FetchDirection) -> MergeResult {
        let mut accepted = 0usize;
        let mut duplicates = 0usize;
        let mut malformed = 0usize;
        for entry in batch {
            if !entry.is_classifiable() {
                malformed += 1;
                debug!(id = entry.id.value(), "dropping unclassifiable entry");
                continue;
            }
            if !self.known_ids.insert(entry.id) {
                duplicates += 1;
                continue;
            }
            self.min_id = Some(self.min_id.map_or(entry.id, |id| id.min(entry.id)));
            self.max_id = Some(self.max_id.map_or(entry.id, |id| id.max(entry.id)));
            self.entries.push(entry);
            accepted += 1;
        }
        if accepted > 0 {
            self.entries.sort_unstable_by_key(|entry| entry.id);
        }
        let added = accepted > 0;
        if direction == FetchDirection::Older && !added {
            self.end_reached = true;
        }
        MergeResult {
            added,
            accepted,
            duplicates_dropped: duplicates,
            malformed_dropped: malformed,
            new_cursor: match direction {
                FetchDirection::Older => self.min_id,
                FetchDirection::Newer => self.max_id,
            },
        }
    }

    /// Clears entries, cursors, and flags. Used when the active filter or
    /// search predicate changes.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.known_ids.clear();
        self.min_id = None;
        self.max_id = None;
        self.end_reached = false;
        self.loading_newer = false;
        self.loading_older = false;
    }

    /// Marks a fetch in flight. Returns false when one is already pending in
    /// that direction; the caller must drop the request.
    pub fn begin_fetch(&mut self, direction: FetchDirection) -> bool {
        let flag = self.loading_flag(direction);
        if *flag {
            return false;
        }
        *flag = true;
        true
    }

    /// Clears the in-flight flag after a fetch completes or is discarded.
    pub fn finish_fetch(&mut self, direction: FetchDirection) {
        *self.loading_flag(direction) = false;
    }

    pub fn is_loading(&self, direction: FetchDirection) -> bool {
        match direction {
            FetchDirection::Newer => self.loading_newer,
            FetchDirection::Older => self.loading_older,
        }
    }

    pub fn end_reached(&self) -> bool {
        self.end_reached
    }

    /// Entries in display order (ascending id).
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn contains(&self, id: EntryId) -> bool {
        self.known_ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Minimum merged id; the cursor for paging older data.
    pub fn min_id(&self) -> Option<EntryId> {
        self.min_id
    }

    /// Maximum merged id; the cursor for paging newer data.
    pub fn max_id(&self) -> Option<EntryId> {
        self.max_id
    }

    fn loading_flag(&mut self, direction: FetchDirection) -> &mut bool {
        match direction {
            FetchDirection::Newer => &mut self.loading_newer,
            FetchDirection::Older => &mut self.loading_older,
        }
    }
}

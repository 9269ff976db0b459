use crate::entry::EntryId;
use serde::{Deserialize, Serialize};

/// Fixed per-row-kind tag for rows with no natural identity. Tags are
/// constants and never reused across kinds, so these rows stay stable across
/// recomputation without any change tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RowTag {
    Loading,
    Header,
    Divider,
    Toggle,
    Footer,
}

/// Identity token stable across projection recomputation. Content-derived:
/// two rows representing the same thing resolve to the same id without any
/// shared counter, so instances can be diffed in parallel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StableId {
    /// An inline entry row.
    Entry(EntryId),
    /// A collapsed-run summary row, keyed by the run's last member. The key
    /// survives merges that leave the run's tail unchanged, which is what
    /// lets the differ report "no change" instead of remove+reinsert.
    Group(EntryId),
    /// A row with no natural identity.
    Fixed(RowTag),
}

impl StableId {
    /// The group key this id resolves to, when it names a summary row.
    pub fn group_key(self) -> Option<EntryId> {
        match self {
            StableId::Group(key) => Some(key),
            _ => None,
        }
    }
}

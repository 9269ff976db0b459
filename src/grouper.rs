use crate::entry::{ActorId, DisplayClass, Entry, EntryId};
use crate::expand::ExpandStateStore;
use crate::policy::GroupingPolicy;
use crate::stable_id::StableId;
use serde::Serialize;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Derived representation of a collapsed deletion run. Recomputed from
/// entries + expand state on every call, never mutated across calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Group {
    /// Id of the run's last member; the key expand state is tracked under.
    pub group_key: EntryId,
    pub member_ids: Vec<EntryId>,
    pub actor_id: ActorId,
    pub expandable: bool,
    pub expanded: bool,
    /// Distinct author names involved, in member order, capped by policy.
    pub summary_authors: Vec<String>,
}

impl Group {
    /// Comma-joined author list for the summary row.
    pub fn summary_label(&self) -> String {
        self.summary_authors.join(", ")
    }

    pub fn len(&self) -> usize {
        self.member_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.member_ids.is_empty()
    }
}

/// What tapping a controlled row does to its group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ControlAction {
    Expand,
    Collapse,
}

/// Affordance attached to a row that toggles a group key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct GroupControl {
    pub group_key: EntryId,
    pub action: ControlAction,
}

/// One element of the display sequence: an inline entry row or a synthetic
/// summary row standing in for a collapsed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayItem {
    Entry {
        id: EntryId,
        stable_id: StableId,
        control: Option<GroupControl>,
        fingerprint: u64,
    },
    Summary {
        group: Group,
        stable_id: StableId,
        fingerprint: u64,
    },
}

impl DisplayItem {
    pub fn stable_id(&self) -> StableId {
        match self {
            DisplayItem::Entry { stable_id, .. } | DisplayItem::Summary { stable_id, .. } => {
                *stable_id
            }
        }
    }

    /// Content hash covering everything row content-equality must observe.
    pub fn fingerprint(&self) -> u64 {
        match self {
            DisplayItem::Entry { fingerprint, .. } | DisplayItem::Summary { fingerprint, .. } => {
                *fingerprint
            }
        }
    }

    /// The toggling affordance this row carries, if any. A summary row is
    /// itself the expand affordance for its group.
    pub fn control(&self) -> Option<GroupControl> {
        match self {
            DisplayItem::Entry { control, .. } => *control,
            DisplayItem::Summary { group, .. } => Some(GroupControl {
                group_key: group.group_key,
                action: ControlAction::Expand,
            }),
        }
    }

    /// The group key this row toggles when tapped, if any.
    pub fn control_key(&self) -> Option<EntryId> {
        self.control().map(|control| control.group_key)
    }
}

/// Folds contiguous same-actor deletion entries into collapsible summary
/// rows. A single linear pass over entries in display order; deterministic
/// for fixed (entries, expand state, policy).
#[derive(Debug, Clone, Default)]
pub struct DeletionGrouper {
    policy: GroupingPolicy,
}

impl DeletionGrouper {
    pub fn new(policy: GroupingPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &GroupingPolicy {
        &self.policy
    }

    /// Derives the display sequence. Hidden entries (no-op role toggles,
    /// unclassifiable leftovers) are excluded before run accumulation.
    pub fn display_sequence(
        &self,
        entries: &[Entry],
        expanded: &ExpandStateStore,
    ) -> Vec<DisplayItem> {
        let mut out = Vec::with_capacity(entries.len());
        let mut run: Vec<&Entry> = Vec::new();
        for entry in entries {
            if entry.display_class() == DisplayClass::Hidden {
                continue;
            }
            let actor = entry.deleted_by();
            if actor.is_none() {
                self.flush_run(&mut out, &mut run, expanded);
                out.push(inline_item(entry, None));
            } else if run.last().is_some_and(|prev| prev.deleted_by() != actor) {
                self.flush_run(&mut out, &mut run, expanded);
                run.push(entry);
            } else {
                run.push(entry);
            }
        }
        self.flush_run(&mut out, &mut run, expanded);
        out
    }

    fn flush_run(
        &self,
        out: &mut Vec<DisplayItem>,
        run: &mut Vec<&Entry>,
        expanded: &ExpandStateStore,
    ) {
        if run.is_empty() {
            return;
        }
        let mut members = std::mem::take(run);
        let mut peeled: Vec<&Entry> = Vec::new();
        if self.policy.peel_trailing_markers() {
            while members
                .last()
                .is_some_and(|entry| entry.display_class() == DisplayClass::ServiceMarker)
            {
                if let Some(entry) = members.pop() {
                    peeled.push(entry);
                }
            }
            peeled.reverse();
        }
        let collapse_key = if members.len() > self.policy.collapse_threshold() {
            members.last().map(|entry| entry.id)
        } else {
            None
        };
        match collapse_key {
            Some(group_key) if !expanded.contains(group_key) => {
                out.push(summary_item(self.build_group(&members, group_key)));
            }
            Some(group_key) => {
                let last = members.len().saturating_sub(1);
                for (idx, entry) in members.iter().enumerate() {
                    let control = (idx == last).then_some(GroupControl {
                        group_key,
                        action: ControlAction::Collapse,
                    });
                    out.push(inline_item(entry, control));
                }
            }
            None => {
                for entry in &members {
                    out.push(inline_item(entry, None));
                }
            }
        }
        // Peeled markers are never absorbed into the collapsed count and
        // never collapse themselves.
        for entry in &peeled {
            out.push(inline_item(entry, None));
        }
    }

    fn build_group(&self, members: &[&Entry], group_key: EntryId) -> Group {
        let mut authors: Vec<String> = Vec::new();
        for entry in members {
            if authors.len() == self.policy.summary_authors_cap() {
                break;
            }
            if let Some(author) = entry.author() {
                if !authors.iter().any(|known| known == author) {
                    authors.push(author.to_string());
                }
            }
        }
        Group {
            group_key,
            member_ids: members.iter().map(|entry| entry.id).collect(),
            actor_id: members
                .first()
                .map(|entry| entry.actor_id)
                .unwrap_or(ActorId::NONE),
            expandable: true,
            expanded: false,
            summary_authors: authors,
        }
    }
}

fn inline_item(entry: &Entry, control: Option<GroupControl>) -> DisplayItem {
    let mut hasher = DefaultHasher::new();
    entry.timestamp.hash(&mut hasher);
    entry.payload.text.hash(&mut hasher);
    if let Some(extra) = &entry.payload.extra {
        extra.to_string().hash(&mut hasher);
    }
    entry.author().hash(&mut hasher);
    control.map(|control| control.action).hash(&mut hasher);
    DisplayItem::Entry {
        id: entry.id,
        stable_id: StableId::Entry(entry.id),
        control,
        fingerprint: hasher.finish(),
    }
}

fn summary_item(group: Group) -> DisplayItem {
    let mut hasher = DefaultHasher::new();
    group.member_ids.hash(&mut hasher);
    group.summary_authors.hash(&mut hasher);
    let stable_id = StableId::Group(group.group_key);
    let fingerprint = hasher.finish();
    DisplayItem::Summary {
        group,
        stable_id,
        fingerprint,
    }
}

use crate::differ::{AnchorRequest, EditScript, ListDiffer, ResolvedAnchor};
use crate::entry::{ActorId, Entry, EntryId};
use crate::event_store::{EventStore, FetchDirection};
use crate::expand::ExpandStateStore;
use crate::grouper::{DeletionGrouper, DisplayItem};
use crate::policy::GroupingPolicy;
use crate::projector::{ProjectionSnapshot, RowDescriptor, RowProjector};
use crate::section::{SectionKind, SectionSpec};
use crate::stable_id::{RowTag, StableId};
use crate::telemetry::FeedTelemetry;
use serde::Serialize;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use thiserror::Error;
use tracing::{debug, warn};

const DEFAULT_PAGE_LIMIT: usize = 50;

/// Fire-and-forget fetch issued to the transport collaborator. Completion is
/// marshalled back as a [`BatchOutcome`] on the coordination context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchRequest {
    pub direction: FetchDirection,
    pub cursor: Option<EntryId>,
    pub limit: usize,
    /// Last-issued-wins token; responses carrying a stale generation are
    /// discarded on arrival.
    pub generation: u64,
    pub query: Option<String>,
}

/// User or chat record referenced by fetched entries. Registered with the
/// directory collaborator before the entries become renderable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActorRecord {
    pub id: ActorId,
    pub name: String,
}

/// Completed fetch delivered back to the feed.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutcome {
    pub generation: u64,
    pub direction: FetchDirection,
    pub entries: Vec<Entry>,
    pub related_actors: Vec<ActorRecord>,
}

/// Transport capability: issues paginated fetches.
pub trait Fetcher {
    fn fetch(&mut self, request: FetchRequest);
}

/// Directory capability: registers actor records referenced by entries.
pub trait EntityDirectory {
    fn register_actors(&mut self, actors: &[ActorRecord]);
}

/// Failure reported by the renderer when an edit script does not apply.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApplyError {
    #[error("edit script rejected at row {row}: {reason}")]
    Inconsistent { row: usize, reason: String },
}

/// Rendering capability: applies incremental updates, or rebuilds from a
/// full snapshot when a script cannot be applied.
pub trait Renderer {
    fn apply(&mut self, update: &FeedUpdate) -> Result<(), ApplyError>;
    fn rebuild(&mut self, snapshot: &ProjectionSnapshot, anchor: Option<&ResolvedAnchor>);
}

/// One recomputation result handed to the rendering collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedUpdate {
    pub snapshot: ProjectionSnapshot,
    pub script: EditScript,
    pub anchor: Option<ResolvedAnchor>,
    /// Set when no incremental script exists for this transition (filter
    /// reset); the renderer must rebuild instead of patching.
    pub full_rebuild: bool,
}

/// What a row tap meant to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TapOutcome {
    /// The tap toggled a group; the update is ready for the renderer.
    Toggled(FeedUpdate),
    /// Not a grouping affordance; the embedding handles it.
    PassThrough(RowDescriptor),
    OutOfRange,
}

/// Construction-time options for the feed surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedOptions {
    page_limit: usize,
    show_filter_toggle: bool,
}

impl Default for FeedOptions {
    fn default() -> Self {
        Self {
            page_limit: DEFAULT_PAGE_LIMIT,
            show_filter_toggle: false,
        }
    }
}

impl FeedOptions {
    pub fn with_page_limit(mut self, limit: usize) -> Self {
        self.page_limit = limit;
        self
    }

    /// Shows the inline filter-toggle row at the bottom of the list.
    pub fn with_filter_toggle(mut self, show: bool) -> Self {
        self.show_filter_toggle = show;
        self
    }

    pub fn page_limit(&self) -> usize {
        self.page_limit
    }

    pub fn show_filter_toggle(&self) -> bool {
        self.show_filter_toggle
    }
}

/// Coordination surface owning the store, grouper, expand state, and the
/// current projection snapshot. All methods run synchronously on one
/// designated context; completion callbacks must be marshalled onto it.
pub struct FeedController {
    store: EventStore,
    grouper: DeletionGrouper,
    expanded: ExpandStateStore,
    directory: Box<dyn EntityDirectory>,
    options: FeedOptions,
    query: Option<String>,
    generation: u64,
    toggle_checked: bool,
    display: Vec<DisplayItem>,
    snapshot: ProjectionSnapshot,
    telemetry: FeedTelemetry,
}

impl FeedController {
    pub fn new(
        policy: GroupingPolicy,
        options: FeedOptions,
        directory: Box<dyn EntityDirectory>,
    ) -> Self {
        let mut controller = Self {
            store: EventStore::new(),
            grouper: DeletionGrouper::new(policy),
            expanded: ExpandStateStore::new(),
            directory,
            options,
            query: None,
            generation: 0,
            toggle_checked: false,
            display: Vec::new(),
            snapshot: ProjectionSnapshot::default(),
            telemetry: FeedTelemetry::new(),
        };
        controller.rebuild_current();
        controller
    }

    /// Issues an older-direction page fetch. Returns false (and counts the
    /// drop) when the end was reached or a fetch is already in flight.
    pub fn request_older(&mut self, fetcher: &mut dyn Fetcher) -> bool {
        if self.store.end_reached() || !self.store.begin_fetch(FetchDirection::Older) {
            self.telemetry.record_dropped_fetch();
            return false;
        }
        let cursor = self.store.min_id();
        self.issue_fetch(fetcher, FetchDirection::Older, cursor);
        true
    }

    /// Issues a newer-direction page fetch; duplicate requests are dropped.
    pub fn request_newer(&mut self, fetcher: &mut dyn Fetcher) -> bool {
        if !self.store.begin_fetch(FetchDirection::Newer) {
            self.telemetry.record_dropped_fetch();
            return false;
        }
        let cursor = self.store.max_id();
        self.issue_fetch(fetcher, FetchDirection::Newer, cursor);
        true
    }

    /// Handles a completed fetch. Stale generations are discarded without
    /// touching any state; otherwise the batch is merged and the projection
    /// recomputed and diffed against the previous snapshot.
    pub fn on_batch(
        &mut self,
        outcome: BatchOutcome,
        anchor: Option<AnchorRequest>,
    ) -> Option<FeedUpdate> {
        if outcome.generation != self.generation {
            self.telemetry.record_stale_response();
            debug!(
                stale = outcome.generation,
                current = self.generation,
                "discarding superseded batch"
            );
            return None;
        }
        self.store.finish_fetch(outcome.direction);
        self.directory.register_actors(&outcome.related_actors);
        let result = self.store.merge(outcome.entries, outcome.direction);
        self.telemetry.record_merge(
            result.accepted,
            result.duplicates_dropped,
            result.malformed_dropped,
        );
        Some(self.refresh(anchor))
    }

    /// Activates a search query. Bumps the generation token and clears the
    /// store, expand state, and prior projection atomically.
    pub fn set_query(&mut self, query: impl Into<String>) -> FeedUpdate {
        self.change_filter(Some(query.into()))
    }

    /// Clears the active query; same reset semantics as [`set_query`].
    ///
    /// [`set_query`]: FeedController::set_query
    pub fn clear_query(&mut self) -> FeedUpdate {
        self.change_filter(None)
    }

    /// Restarts pagination from scratch, keeping the active query. In-flight
    /// responses are superseded by the bumped generation token.
    pub fn reset(&mut self) -> FeedUpdate {
        let query = self.query.clone();
        self.change_filter(query)
    }

    /// Toggles a group key and recomputes. Toggling the same key twice
    /// restores the prior row sequence exactly.
    pub fn toggle_group(&mut self, key: EntryId, anchor: Option<AnchorRequest>) -> FeedUpdate {
        self.expanded.toggle(key);
        self.refresh(anchor)
    }

    /// Flips the inline filter toggle's checked state.
    pub fn set_toggle_checked(
        &mut self,
        checked: bool,
        anchor: Option<AnchorRequest>,
    ) -> FeedUpdate {
        self.toggle_checked = checked;
        self.refresh(anchor)
    }

    /// Interprets a tapped row: grouping affordances toggle their group,
    /// everything else is passed through untouched.
    pub fn on_row_tapped(&mut self, row: usize, anchor: Option<AnchorRequest>) -> TapOutcome {
        let Some(descriptor) = self.snapshot.resolve(row).copied() else {
            return TapOutcome::OutOfRange;
        };
        match descriptor.control {
            Some(key) => TapOutcome::Toggled(self.toggle_group(key, anchor)),
            None => TapOutcome::PassThrough(descriptor),
        }
    }

    /// Hands an update to the renderer. A rejected script is downgraded to a
    /// full re-render; a stale frame is recoverable, a crash is not.
    pub fn apply_update(&mut self, renderer: &mut dyn Renderer, update: &FeedUpdate) {
        if update.full_rebuild {
            self.telemetry.record_full_rebuild();
            renderer.rebuild(&update.snapshot, update.anchor.as_ref());
            return;
        }
        match renderer.apply(update) {
            Ok(()) => self.telemetry.record_incremental_update(),
            Err(error) => {
                warn!(%error, "edit script rejected; falling back to full re-render");
                self.telemetry.record_full_rebuild();
                renderer.rebuild(&update.snapshot, update.anchor.as_ref());
            }
        }
    }

    pub fn total_rows(&self) -> usize {
        self.snapshot.total_rows()
    }

    pub fn resolve(&self, row: usize) -> Option<&RowDescriptor> {
        self.snapshot.resolve(row)
    }

    pub fn snapshot(&self) -> &ProjectionSnapshot {
        &self.snapshot
    }

    /// Current display sequence backing the body section.
    pub fn body_items(&self) -> &[DisplayItem] {
        &self.display
    }

    pub fn entries(&self) -> &[Entry] {
        self.store.entries()
    }

    pub fn is_loading(&self, direction: FetchDirection) -> bool {
        self.store.is_loading(direction)
    }

    pub fn end_reached(&self) -> bool {
        self.store.end_reached()
    }

    pub fn is_expanded(&self, key: EntryId) -> bool {
        self.expanded.contains(key)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn toggle_checked(&self) -> bool {
        self.toggle_checked
    }

    pub fn telemetry(&self) -> &FeedTelemetry {
        &self.telemetry
    }

    fn issue_fetch(
        &mut self,
        fetcher: &mut dyn Fetcher,
        direction: FetchDirection,
        cursor: Option<EntryId>,
    ) {
        fetcher.fetch(FetchRequest {
            direction,
            cursor,
            limit: self.options.page_limit(),
            generation: self.generation,
            query: self.query.clone(),
        });
    }

    fn change_filter(&mut self, query: Option<String>) -> FeedUpdate {
        self.generation += 1;
        self.query = query;
        self.store.reset();
        self.expanded.clear();
        self.rebuild_current();
        // No incremental script spans a reset; the renderer starts over.
        FeedUpdate {
            snapshot: self.snapshot.clone(),
            script: EditScript::default(),
            anchor: None,
            full_rebuild: true,
        }
    }

    fn refresh(&mut self, anchor: Option<AnchorRequest>) -> FeedUpdate {
        let previous = std::mem::take(&mut self.snapshot);
        self.rebuild_current();
        let script = ListDiffer::diff(previous.rows(), self.snapshot.rows());
        let anchor =
            anchor.and_then(|request| ListDiffer::resolve_anchor(self.snapshot.rows(), request));
        FeedUpdate {
            snapshot: self.snapshot.clone(),
            script,
            anchor,
            full_rebuild: false,
        }
    }

    fn rebuild_current(&mut self) {
        self.display = self
            .grouper
            .display_sequence(self.store.entries(), &self.expanded);
        let specs = self.section_specs();
        let layout = RowProjector::project(&specs);
        let mut rows = Vec::with_capacity(layout.total_rows());
        for range in layout.ranges() {
            for offset in 0..range.len() {
                rows.push(self.describe(range.kind, offset));
            }
        }
        self.snapshot = ProjectionSnapshot::new(layout, rows);
    }

    fn section_specs(&self) -> Vec<SectionSpec> {
        let header = self.query.is_some();
        let toggle = self.options.show_filter_toggle();
        vec![
            SectionSpec::row(SectionKind::Loading, !self.store.end_reached()),
            SectionSpec::row(SectionKind::Header, header),
            SectionSpec::rows(SectionKind::Body, self.display.len()),
            // Present only when at least one of its neighbors is.
            SectionSpec::row(SectionKind::Divider, header || toggle),
            SectionSpec::row(SectionKind::Toggle, toggle),
            SectionSpec::row(
                SectionKind::Footer,
                self.store.end_reached() && !self.display.is_empty(),
            ),
        ]
    }

    fn describe(&self, kind: SectionKind, offset: usize) -> RowDescriptor {
        match kind {
            SectionKind::Loading => fixed_row(kind, RowTag::Loading, 0),
            SectionKind::Header => {
                let mut hasher = DefaultHasher::new();
                self.query.hash(&mut hasher);
                fixed_row(kind, RowTag::Header, hasher.finish())
            }
            SectionKind::Body => {
                let item = &self.display[offset];
                RowDescriptor {
                    kind,
                    stable_id: item.stable_id(),
                    fingerprint: item.fingerprint(),
                    control: item.control_key(),
                }
            }
            SectionKind::Divider => fixed_row(kind, RowTag::Divider, 0),
            SectionKind::Toggle => {
                let mut hasher = DefaultHasher::new();
                self.toggle_checked.hash(&mut hasher);
                fixed_row(kind, RowTag::Toggle, hasher.finish())
            }
            SectionKind::Footer => fixed_row(kind, RowTag::Footer, 0),
        }
    }
}

fn fixed_row(kind: SectionKind, tag: RowTag, fingerprint: u64) -> RowDescriptor {
    RowDescriptor {
        kind,
        stable_id: StableId::Fixed(tag),
        fingerprint,
        control: None,
    }
}

//! Stateful list-projection and incremental-diff engine for paginated
//! audit-event feeds.
//!
//! Paginated batches merge into a deduplicated ordered collection
//! ([`EventStore`]), contiguous same-actor deletion runs fold into
//! collapsible summary rows ([`DeletionGrouper`]), conditionally-present
//! sections flatten into one contiguous row-index space ([`RowProjector`]),
//! and successive projections diff into minimal edit scripts with scroll
//! anchoring ([`ListDiffer`]). [`FeedController`] coordinates the pipeline
//! behind the mutation/read contract a rendering collaborator needs.

pub mod differ;
pub mod entry;
pub mod event_store;
pub mod expand;
pub mod feed;
pub mod grouper;
pub mod policy;
pub mod projector;
pub mod section;
pub mod stable_id;
pub mod telemetry;
pub mod test_hooks;

pub use differ::{AnchorRequest, EditOp, EditScript, ListDiffer, ResolvedAnchor};
pub use entry::{ActionVariant, ActorId, DisplayClass, Entry, EntryId, Payload};
pub use event_store::{EventStore, FetchDirection, MergeResult};
pub use expand::ExpandStateStore;
pub use feed::{
    ActorRecord, ApplyError, BatchOutcome, EntityDirectory, FeedController, FeedOptions,
    FeedUpdate, FetchRequest, Fetcher, Renderer, TapOutcome,
};
pub use grouper::{ControlAction, DeletionGrouper, DisplayItem, Group, GroupControl};
pub use policy::GroupingPolicy;
pub use projector::{
    ProjectionLayout, ProjectionSnapshot, RowDescriptor, RowProjector, SectionRange,
};
pub use section::{SectionKind, SectionSpec};
pub use stable_id::{RowTag, StableId};
pub use telemetry::{FeedTelemetry, FeedTelemetrySnapshot};

use crate::entry::EntryId;
use crate::section::{SectionKind, SectionSpec};
use crate::stable_id::StableId;
use serde::Serialize;

/// Contiguous `[start, end)` row range occupied by one present section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SectionRange {
    pub kind: SectionKind,
    pub start: usize,
    pub end: usize,
}

impl SectionRange {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, row: usize) -> bool {
        row >= self.start && row < self.end
    }
}

/// Flat, contiguous row-index space computed from an ordered list of section
/// specs. Recomputed after every mutation; idempotent for unchanged input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectionLayout {
    ranges: Vec<SectionRange>,
    total_rows: usize,
}

impl ProjectionLayout {
    pub fn total_rows(&self) -> usize {
        self.total_rows
    }

    /// Present sections, in declaration order.
    pub fn ranges(&self) -> &[SectionRange] {
        &self.ranges
    }

    /// Maps a row index to its section and offset within that section.
    /// Defined for every row in `[0, total_rows())`.
    pub fn resolve(&self, row: usize) -> Option<(SectionKind, usize)> {
        self.ranges
            .iter()
            .find(|range| range.contains(row))
            .map(|range| (range.kind, row - range.start))
    }

    /// Range of the first present section with the given kind.
    pub fn section_range(&self, kind: SectionKind) -> Option<SectionRange> {
        self.ranges.iter().find(|range| range.kind == kind).copied()
    }
}

/// Maps declarative section specs into one flat row-index space.
#[derive(Debug, Clone, Copy, Default)]
pub struct RowProjector;

impl RowProjector {
    /// Evaluates specs top-to-bottom, skipping absent ones. The mapping is
    /// total and order-preserving; ranges never overlap.
    pub fn project(specs: &[SectionSpec]) -> ProjectionLayout {
        let mut ranges = Vec::with_capacity(specs.len());
        let mut next_row = 0usize;
        for spec in specs {
            if !spec.is_present() {
                continue;
            }
            let start = next_row;
            next_row += spec.length;
            ranges.push(SectionRange {
                kind: spec.kind,
                start,
                end: next_row,
            });
        }
        ProjectionLayout {
            ranges,
            total_rows: next_row,
        }
    }
}

/// The read contract a renderer needs for one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RowDescriptor {
    pub kind: SectionKind,
    pub stable_id: StableId,
    /// Content hash; rows with equal stable ids but different fingerprints
    /// are reported as changed by the differ.
    pub fingerprint: u64,
    /// Group key toggled when this row is tapped, if any.
    pub control: Option<EntryId>,
}

/// Snapshot of one full projection: the section layout plus the per-row
/// descriptors the differ consumes. Fully ephemeral; rebuilt from current
/// state on each relevant call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectionSnapshot {
    layout: ProjectionLayout,
    rows: Vec<RowDescriptor>,
}

impl ProjectionSnapshot {
    /// Builds a snapshot, checking the descriptor list against the layout.
    pub fn new(layout: ProjectionLayout, rows: Vec<RowDescriptor>) -> Self {
        debug_assert_eq!(layout.total_rows(), rows.len());
        Self { layout, rows }
    }

    pub fn layout(&self) -> &ProjectionLayout {
        &self.layout
    }

    pub fn total_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn rows(&self) -> &[RowDescriptor] {
        &self.rows
    }

    pub fn resolve(&self, row: usize) -> Option<&RowDescriptor> {
        self.rows.get(row)
    }

    /// Row index of the given stable id, if present.
    pub fn position_of(&self, stable_id: StableId) -> Option<usize> {
        self.rows
            .iter()
            .position(|descriptor| descriptor.stable_id == stable_id)
    }
}

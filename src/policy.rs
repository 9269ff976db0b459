use serde::{Deserialize, Serialize};

const DEFAULT_COLLAPSE_THRESHOLD: usize = 3;
const DEFAULT_SUMMARY_AUTHORS_CAP: usize = 4;

/// Knobs controlling how deletion runs collapse into summary rows.
///
/// The threshold is strict: a run collapses only when its length is greater
/// than `collapse_threshold`, so a run of exactly the threshold length is
/// never collapsible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupingPolicy {
    collapse_threshold: usize,
    summary_authors_cap: usize,
    peel_trailing_markers: bool,
}

impl Default for GroupingPolicy {
    fn default() -> Self {
        Self {
            collapse_threshold: DEFAULT_COLLAPSE_THRESHOLD,
            summary_authors_cap: DEFAULT_SUMMARY_AUTHORS_CAP,
            peel_trailing_markers: true,
        }
    }
}

impl GroupingPolicy {
    /// Overrides the strict collapse threshold.
    pub fn with_collapse_threshold(mut self, threshold: usize) -> Self {
        self.collapse_threshold = threshold;
        self
    }

    /// Overrides how many distinct author names a summary row lists.
    pub fn with_summary_authors_cap(mut self, cap: usize) -> Self {
        self.summary_authors_cap = cap;
        self
    }

    /// Disables peeling trailing service-marker deletions off a run.
    pub fn with_trailing_marker_peel(mut self, peel: bool) -> Self {
        self.peel_trailing_markers = peel;
        self
    }

    pub fn collapse_threshold(&self) -> usize {
        self.collapse_threshold
    }

    pub fn summary_authors_cap(&self) -> usize {
        self.summary_authors_cap
    }

    pub fn peel_trailing_markers(&self) -> bool {
        self.peel_trailing_markers
    }
}

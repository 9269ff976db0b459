use serde::Serialize;

/// Deterministic counters tracking the engine's silent-drop taxonomy and
/// update path. Instance-owned; snapshots are cheap copies.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FeedTelemetry {
    merged_total: u64,
    duplicates_dropped_total: u64,
    malformed_dropped_total: u64,
    stale_responses_total: u64,
    dropped_fetches_total: u64,
    incremental_updates_total: u64,
    full_rebuilds_total: u64,
}

/// Serializable snapshot of the feed counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FeedTelemetrySnapshot {
    pub merged_total: u64,
    pub duplicates_dropped_total: u64,
    pub malformed_dropped_total: u64,
    pub stale_responses_total: u64,
    pub dropped_fetches_total: u64,
    pub incremental_updates_total: u64,
    pub full_rebuilds_total: u64,
}

impl FeedTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_merge(&mut self, accepted: usize, duplicates: usize, malformed: usize) {
        self.merged_total += accepted as u64;
        self.duplicates_dropped_total += duplicates as u64;
        self.malformed_dropped_total += malformed as u64;
    }

    pub(crate) fn record_stale_response(&mut self) {
        self.stale_responses_total += 1;
    }

    pub(crate) fn record_dropped_fetch(&mut self) {
        self.dropped_fetches_total += 1;
    }

    pub(crate) fn record_incremental_update(&mut self) {
        self.incremental_updates_total += 1;
    }

    pub(crate) fn record_full_rebuild(&mut self) {
        self.full_rebuilds_total += 1;
    }

    pub fn merged_total(&self) -> u64 {
        self.merged_total
    }

    pub fn duplicates_dropped_total(&self) -> u64 {
        self.duplicates_dropped_total
    }

    pub fn malformed_dropped_total(&self) -> u64 {
        self.malformed_dropped_total
    }

    pub fn stale_responses_total(&self) -> u64 {
        self.stale_responses_total
    }

    pub fn dropped_fetches_total(&self) -> u64 {
        self.dropped_fetches_total
    }

    pub fn incremental_updates_total(&self) -> u64 {
        self.incremental_updates_total
    }

    pub fn full_rebuilds_total(&self) -> u64 {
        self.full_rebuilds_total
    }

    pub fn snapshot(&self) -> FeedTelemetrySnapshot {
        FeedTelemetrySnapshot {
            merged_total: self.merged_total,
            duplicates_dropped_total: self.duplicates_dropped_total,
            malformed_dropped_total: self.malformed_dropped_total,
            stale_responses_total: self.stale_responses_total,
            dropped_fetches_total: self.dropped_fetches_total,
            incremental_updates_total: self.incremental_updates_total,
            full_rebuilds_total: self.full_rebuilds_total,
        }
    }
}

use crate::differ::{EditOp, EditScript};
use crate::projector::RowDescriptor;
use crate::stable_id::StableId;

/// Replays an edit script against the old row sequence, returning the
/// resulting `(stable id, fingerprint)` sequence. Used by integration tests
/// and CI harnesses to check scripts against the projection they target.
pub fn replay_script(
    old: &[RowDescriptor],
    new: &[RowDescriptor],
    script: &EditScript,
) -> Vec<(StableId, u64)> {
    let mut rows: Vec<(StableId, u64)> = old
        .iter()
        .map(|row| (row.stable_id, row.fingerprint))
        .collect();
    for op in script.ops() {
        match *op {
            EditOp::Remove(at) => {
                rows.remove(at);
            }
            EditOp::Insert(at) => {
                rows.insert(at, (new[at].stable_id, new[at].fingerprint));
            }
            EditOp::Changed(at) => {
                rows[at] = (new[at].stable_id, new[at].fingerprint);
            }
        }
    }
    rows
}

/// The `(stable id, fingerprint)` view of a row sequence, for comparing a
/// replay result against the target projection.
pub fn row_identities(rows: &[RowDescriptor]) -> Vec<(StableId, u64)> {
    rows.iter()
        .map(|row| (row.stable_id, row.fingerprint))
        .collect()
}

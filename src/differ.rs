use crate::projector::RowDescriptor;
use crate::stable_id::StableId;
use serde::Serialize;
use std::collections::HashMap;

/// One row-level edit. `Remove` indices address the old projection and are
/// emitted in descending order; `Insert` and `Changed` indices address the
/// new projection and are emitted in ascending order. Applying the ops in
/// script order transforms the old row sequence into the new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EditOp {
    Remove(usize),
    Insert(usize),
    Changed(usize),
}

/// Minimal edit script between two projection snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EditScript {
    ops: Vec<EditOp>,
}

impl EditScript {
    pub fn ops(&self) -> &[EditOp] {
        &self.ops
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }
}

/// Scroll anchor supplied by the caller before diffing: the stable id of the
/// designated visible row plus its pixel offset within the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnchorRequest {
    pub stable_id: StableId,
    pub offset: i32,
}

/// Where the anchored row landed in the new projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResolvedAnchor {
    pub row: usize,
    pub offset: i32,
}

/// Computes minimal insert/remove/change scripts between projections using
/// the stable-id identity index. Runs in O(n log n); no pairwise scan.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListDiffer;

impl ListDiffer {
    /// Diffs two row sequences. Rows are the same item iff their stable ids
    /// match; a matched row is changed iff its fingerprint differs. Matched
    /// rows that moved relative to other survivors degrade to remove+insert
    /// so the script always replays cleanly.
    pub fn diff(old: &[RowDescriptor], new: &[RowDescriptor]) -> EditScript {
        let mut old_index: HashMap<StableId, usize> = HashMap::with_capacity(old.len());
        for (idx, row) in old.iter().enumerate() {
            old_index.insert(row.stable_id, idx);
        }

        // Pairs of (old index, new index) for rows present in both, in new
        // order. Survivors are the longest chain of strictly increasing old
        // indices; anything else is treated as removed and reinserted.
        let mut pairs: Vec<(usize, usize)> = Vec::new();
        for (new_idx, row) in new.iter().enumerate() {
            if let Some(&old_idx) = old_index.get(&row.stable_id) {
                pairs.push((old_idx, new_idx));
            }
        }
        let chain = longest_increasing_chain(&pairs);
        let mut surviving_old = vec![false; old.len()];
        let mut surviving_new = vec![false; new.len()];
        for &pair_idx in &chain {
            let (old_idx, new_idx) = pairs[pair_idx];
            surviving_old[old_idx] = true;
            surviving_new[new_idx] = true;
        }

        let mut ops = Vec::new();
        for old_idx in (0..old.len()).rev() {
            if !surviving_old[old_idx] {
                ops.push(EditOp::Remove(old_idx));
            }
        }
        for new_idx in 0..new.len() {
            if !surviving_new[new_idx] {
                ops.push(EditOp::Insert(new_idx));
            }
        }
        for &pair_idx in &chain {
            let (old_idx, new_idx) = pairs[pair_idx];
            if old[old_idx].fingerprint != new[new_idx].fingerprint {
                ops.push(EditOp::Changed(new_idx));
            }
        }
        EditScript { ops }
    }

    /// Re-resolves the caller's anchor against the new rows. `None` means the
    /// anchored row was removed; the fallback policy (nearest survivor or
    /// index clamp) belongs to the caller.
    pub fn resolve_anchor(new: &[RowDescriptor], request: AnchorRequest) -> Option<ResolvedAnchor> {
        new.iter()
            .position(|row| row.stable_id == request.stable_id)
            .map(|row| ResolvedAnchor {
                row,
                offset: request.offset,
            })
    }
}

/// Longest chain of pairs with strictly increasing old indices, returned as
/// indices into `pairs`. Patience sorting; O(k log k).
fn longest_increasing_chain(pairs: &[(usize, usize)]) -> Vec<usize> {
    let mut tails: Vec<usize> = Vec::new();
    let mut parents: Vec<Option<usize>> = vec![None; pairs.len()];
    for (idx, &(old_idx, _)) in pairs.iter().enumerate() {
        let pos = tails.partition_point(|&tail| pairs[tail].0 < old_idx);
        parents[idx] = if pos > 0 { Some(tails[pos - 1]) } else { None };
        if pos == tails.len() {
            tails.push(idx);
        } else {
            tails[pos] = idx;
        }
    }
    let mut chain = Vec::new();
    let mut cursor = tails.last().copied();
    while let Some(idx) = cursor {
        chain.push(idx);
        cursor = parents[idx];
    }
    chain.reverse();
    chain
}

//! Ordered identity snapshots and the snapshot differ.
//!
//! # Responsibility
//! - Represent "what the ordered query returns, right now" as an ordered
//!   sequence of unique identities.
//! - Compute the minimal insert/delete/move/reload op set transforming one
//!   snapshot's view into another's.
//!
//! # Invariants
//! - A snapshot never contains a duplicate identity.
//! - `diff` output is fully deterministic: equal inputs always produce the
//!   identical op sequence (no unordered-container iteration feeds output).
//! - Op order inside a `SnapshotDiff` is the sequential application order:
//!   deletes by descending old index, then moves by ascending final order,
//!   then inserts by ascending new index, then reloads by ascending new
//!   index.

use crate::model::record::RecordId;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Snapshot construction failure: the same identity appeared twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DuplicateIdentity(pub RecordId);

impl Display for DuplicateIdentity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "duplicate identity in snapshot: {}", self.0)
    }
}

impl Error for DuplicateIdentity {}

/// Ordered sequence of unique record identities.
///
/// Snapshots compare by position and membership only, never by record
/// content; content changes travel through the differ's reload hint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot(Vec<RecordId>);

impl Snapshot {
    /// Returns the empty snapshot (the view's initial baseline).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a snapshot, rejecting duplicate identities.
    pub fn from_ids(ids: Vec<RecordId>) -> Result<Self, DuplicateIdentity> {
        let mut seen = HashMap::with_capacity(ids.len());
        for (position, id) in ids.iter().enumerate() {
            if seen.insert(*id, position).is_some() {
                return Err(DuplicateIdentity(*id));
            }
        }
        Ok(Self(ids))
    }

    pub fn ids(&self) -> &[RecordId] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, id: &RecordId) -> bool {
        self.0.contains(id)
    }

    /// Position of an identity within the snapshot, if present.
    pub fn position(&self, id: &RecordId) -> Option<usize> {
        self.0.iter().position(|candidate| candidate == id)
    }
}

/// One visual operation against a list view.
///
/// `from` indexes into the old snapshot, `to`/`at` into the new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffOp {
    Insert { id: RecordId, to: usize },
    Delete { id: RecordId, from: usize },
    Move { id: RecordId, from: usize, to: usize },
    Reload { id: RecordId, at: usize },
}

/// Transient op set transforming `old` into `new`, consumed within one
/// reconciliation cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotDiff {
    pub old: Snapshot,
    pub new: Snapshot,
    pub ops: Vec<DiffOp>,
}

impl SnapshotDiff {
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Counts ops as (inserts, deletes, moves, reloads).
    pub fn counts(&self) -> (usize, usize, usize, usize) {
        self.ops
            .iter()
            .fold((0, 0, 0, 0), |(i, d, m, r), op| match op {
                DiffOp::Insert { .. } => (i + 1, d, m, r),
                DiffOp::Delete { .. } => (i, d + 1, m, r),
                DiffOp::Move { .. } => (i, d, m + 1, r),
                DiffOp::Reload { .. } => (i, d, m, r + 1),
            })
    }
}

/// Computes the minimal op set transforming `old` into `new`.
///
/// - Deletes: identities in `old` absent from `new`.
/// - Inserts: identities in `new` absent from `old`.
/// - Moves: common identities off the longest increasing subsequence of
///   old positions taken in new order; identities on it keep their rows,
///   so a move is emitted only when relative order actually changed.
/// - Reloads: caller-declared changed identities (`changed_hint`), kept
///   only when present in both snapshots. Content changes are not
///   inferable from identity sequences, so they must be declared.
pub fn diff(old: &Snapshot, new: &Snapshot, changed_hint: &[RecordId]) -> SnapshotDiff {
    let old_positions: HashMap<RecordId, usize> = old
        .ids()
        .iter()
        .enumerate()
        .map(|(position, id)| (*id, position))
        .collect();
    let new_positions: HashMap<RecordId, usize> = new
        .ids()
        .iter()
        .enumerate()
        .map(|(position, id)| (*id, position))
        .collect();

    let mut ops = Vec::new();

    for (from, id) in old.ids().iter().enumerate().rev() {
        if !new_positions.contains_key(id) {
            ops.push(DiffOp::Delete { id: *id, from });
        }
    }

    // Common identities in new order; their old positions form the
    // sequence whose longest increasing subsequence stays in place.
    let common: Vec<(RecordId, usize, usize)> = new
        .ids()
        .iter()
        .enumerate()
        .filter_map(|(to, id)| old_positions.get(id).map(|from| (*id, *from, to)))
        .collect();
    let keep = longest_increasing_mask(&common.iter().map(|(_, from, _)| *from).collect::<Vec<_>>());
    for (index, (id, from, to)) in common.iter().enumerate() {
        if !keep[index] {
            ops.push(DiffOp::Move {
                id: *id,
                from: *from,
                to: *to,
            });
        }
    }

    for (to, id) in new.ids().iter().enumerate() {
        if !old_positions.contains_key(id) {
            ops.push(DiffOp::Insert { id: *id, to });
        }
    }

    let mut reloads: Vec<(usize, RecordId)> = changed_hint
        .iter()
        .filter(|id| old_positions.contains_key(*id))
        .filter_map(|id| new_positions.get(id).map(|at| (*at, *id)))
        .collect();
    reloads.sort_unstable();
    reloads.dedup();
    for (at, id) in reloads {
        ops.push(DiffOp::Reload { id, at });
    }

    SnapshotDiff {
        old: old.clone(),
        new: new.clone(),
        ops,
    }
}

/// Marks, per element, membership in one longest strictly increasing
/// subsequence of `seq`. Patience algorithm with parent links; O(n log n)
/// and deterministic for equal inputs.
fn longest_increasing_mask(seq: &[usize]) -> Vec<bool> {
    let mut tails: Vec<usize> = Vec::new();
    let mut parent: Vec<Option<usize>> = vec![None; seq.len()];

    for (index, &value) in seq.iter().enumerate() {
        let slot = tails.partition_point(|&tail| seq[tail] < value);
        parent[index] = if slot > 0 { Some(tails[slot - 1]) } else { None };
        if slot == tails.len() {
            tails.push(index);
        } else {
            tails[slot] = index;
        }
    }

    let mut keep = vec![false; seq.len()];
    let mut cursor = tails.last().copied();
    while let Some(index) = cursor {
        keep[index] = true;
        cursor = parent[index];
    }
    keep
}

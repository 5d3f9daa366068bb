//! View reconciliation for snapshot diffs.
//!
//! # Responsibility
//! - Apply a computed op set to a live list surface, optionally animated.
//! - Own the Applied Snapshot: the order last rendered successfully.
//!
//! # Invariants
//! - The Applied Snapshot is mutated only by a completed apply, and only
//!   here.
//! - Every row needed by inserts/reloads is resolved before the first
//!   surface mutation; a resolution failure leaves the surface and the
//!   Applied Snapshot untouched.
//! - Applies are serialized through an internal queue: an apply arriving
//!   while one is in flight runs after it, never interleaved.
//! - The first population (surface showing zero rows) is never animated.

use crate::diff::{self, DiffOp, Snapshot, SnapshotDiff};
use crate::model::record::{Record, RecordId};
use crate::observe::{ObserveError, SnapshotListener};
use crate::store::RecordStore;
use log::{info, warn};
use std::collections::{HashMap, VecDeque};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Data-integrity failure during reconciliation.
///
/// Policy: these surface as errors to the initiating command instead of
/// crashing; the surface is never left partially updated.
#[derive(Debug)]
pub enum ReconcileError {
    /// An identity in the diff could not be bound to a stored record. The
    /// differ and the store have diverged.
    UnresolvedIdentity(RecordId),
    /// The diff was computed against a snapshot other than the one the
    /// view currently shows.
    StaleDiff,
    /// Row resolution hit a store failure.
    Store(crate::store::StoreError),
}

impl Display for ReconcileError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnresolvedIdentity(id) => {
                write!(f, "identity {id} could not be resolved during reconciliation")
            }
            Self::StaleDiff => {
                write!(f, "diff does not start from the currently applied snapshot")
            }
            Self::Store(err) => write!(f, "row resolution failed: {err}"),
        }
    }
}

impl Error for ReconcileError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::UnresolvedIdentity(_) | Self::StaleDiff => None,
        }
    }
}

impl From<crate::store::StoreError> for ReconcileError {
    fn from(value: crate::store::StoreError) -> Self {
        Self::Store(value)
    }
}

/// Maps a resolved record to one visual row (the list cell renderer
/// collaborator). Pure: resolution failures are the reconciler's concern.
pub trait RowRenderer {
    type Row;

    fn render(&mut self, record: &Record) -> Self::Row;
}

/// Live list view receiving sequential row operations.
///
/// Indices are valid at call time: each operation sees the surface as left
/// by the previous one.
pub trait ListSurface {
    type Row;

    fn insert_row(&mut self, at: usize, row: Self::Row, animated: bool);
    fn remove_row(&mut self, at: usize, animated: bool);
    fn move_row(&mut self, from: usize, to: usize, animated: bool);
    fn reload_row(&mut self, at: usize, row: Self::Row, animated: bool);
    fn visible_row_count(&self) -> usize;
}

/// Applies snapshot diffs to a surface and owns the Applied Snapshot.
pub struct ViewReconciler<V, R> {
    surface: V,
    renderer: R,
    applied: Snapshot,
    applying: bool,
    queued: VecDeque<(SnapshotDiff, bool)>,
}

impl<V, R> ViewReconciler<V, R>
where
    V: ListSurface,
    R: RowRenderer<Row = V::Row>,
{
    pub fn new(surface: V, renderer: R) -> Self {
        Self {
            surface,
            renderer,
            applied: Snapshot::empty(),
            applying: false,
            queued: VecDeque::new(),
        }
    }

    /// Snapshot last rendered successfully. Starts empty.
    pub fn applied(&self) -> &Snapshot {
        &self.applied
    }

    pub fn surface(&self) -> &V {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut V {
        &mut self.surface
    }

    /// Applies a diff to the surface.
    ///
    /// Re-entrant calls are queued and run after the in-flight apply
    /// completes. A diff whose `new` side already equals the Applied
    /// Snapshot is an idempotent no-op; any other diff not starting from
    /// the Applied Snapshot is rejected as stale.
    pub fn apply<S: RecordStore>(
        &mut self,
        store: &S,
        diff: SnapshotDiff,
        animated: bool,
    ) -> Result<(), ReconcileError> {
        self.queued.push_back((diff, animated));
        if self.applying {
            return Ok(());
        }

        self.applying = true;
        let mut result = Ok(());
        while let Some((queued_diff, queued_animated)) = self.queued.pop_front() {
            result = self.apply_now(store, queued_diff, queued_animated);
            if result.is_err() {
                self.queued.clear();
                break;
            }
        }
        self.applying = false;
        result
    }

    fn apply_now<S: RecordStore>(
        &mut self,
        store: &S,
        diff: SnapshotDiff,
        animated: bool,
    ) -> Result<(), ReconcileError> {
        if diff.old != self.applied {
            if diff.new == self.applied {
                // Already showing the target order; re-applying is a no-op.
                return Ok(());
            }
            return Err(ReconcileError::StaleDiff);
        }

        let started_at = Instant::now();
        let animate = animated && self.surface.visible_row_count() > 0;

        // Resolve every row up front so a bad identity cannot leave the
        // surface half-updated.
        let mut rows: HashMap<RecordId, V::Row> = HashMap::new();
        for op in &diff.ops {
            let id = match op {
                DiffOp::Insert { id, .. } | DiffOp::Reload { id, .. } => *id,
                DiffOp::Delete { .. } | DiffOp::Move { .. } => continue,
            };
            if rows.contains_key(&id) {
                continue;
            }
            let record = store
                .get(id)?
                .ok_or(ReconcileError::UnresolvedIdentity(id))?;
            rows.insert(id, self.renderer.render(&record));
        }

        // During the move phase the surface holds exactly the common
        // identities, so move targets are indices into the commons taken
        // in new order.
        let commons_new_order: Vec<RecordId> = diff
            .new
            .ids()
            .iter()
            .filter(|id| diff.old.contains(*id))
            .copied()
            .collect();

        let mut shadow: Vec<RecordId> = diff.old.ids().to_vec();
        for op in &diff.ops {
            match op {
                DiffOp::Delete { id, .. } => {
                    let at = position_of(&shadow, id)?;
                    self.surface.remove_row(at, animate);
                    shadow.remove(at);
                }
                DiffOp::Move { id, .. } => {
                    let from = position_of(&shadow, id)?;
                    let to = position_of(&commons_new_order, id)?;
                    shadow.remove(from);
                    shadow.insert(to, *id);
                    self.surface.move_row(from, to, animate);
                }
                DiffOp::Insert { id, to } => {
                    let row = rows
                        .remove(id)
                        .ok_or(ReconcileError::UnresolvedIdentity(*id))?;
                    self.surface.insert_row(*to, row, animate);
                    shadow.insert(*to, *id);
                }
                DiffOp::Reload { id, at } => {
                    let row = rows
                        .remove(id)
                        .ok_or(ReconcileError::UnresolvedIdentity(*id))?;
                    self.surface.reload_row(*at, row, animate);
                }
            }
        }

        debug_assert_eq!(shadow, diff.new.ids());
        let (inserts, deletes, moves, reloads) = diff.counts();
        self.applied = diff.new;
        info!(
            "event=reconcile_apply module=view status=ok duration_ms={} rows={} inserts={inserts} deletes={deletes} moves={moves} reloads={reloads} animated={animate}",
            started_at.elapsed().as_millis(),
            self.applied.len()
        );
        Ok(())
    }
}

fn position_of(order: &[RecordId], id: &RecordId) -> Result<usize, ReconcileError> {
    order
        .iter()
        .position(|candidate| candidate == id)
        .ok_or(ReconcileError::UnresolvedIdentity(*id))
}

impl<S, V, R> SnapshotListener<S> for ViewReconciler<V, R>
where
    S: RecordStore,
    V: ListSurface,
    R: RowRenderer<Row = V::Row>,
{
    fn snapshot_changed(
        &mut self,
        store: &S,
        snapshot: Snapshot,
        changed: &[RecordId],
    ) -> Result<(), ReconcileError> {
        let delta = diff::diff(&self.applied, &snapshot, changed);
        self.apply(store, delta, true)
    }

    fn observation_failed(&mut self, error: &ObserveError) {
        // Previous applied snapshot stays authoritative.
        warn!("event=reconcile_skip module=view status=error error={error}");
    }
}

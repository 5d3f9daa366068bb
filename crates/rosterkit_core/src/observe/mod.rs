//! Change observation for the ordered records query.
//!
//! # Responsibility
//! - Re-run the ordered query after every store commit.
//! - Emit a new identity snapshot to the single registered listener when
//!   the result sequence changed, or when a caller-declared content change
//!   still needs repainting.
//!
//! # Invariants
//! - The very first fetch always emits, even an empty snapshot, so the view
//!   reconciles from its empty baseline.
//! - A failed re-query reaches the listener as an observation failure; the
//!   previously emitted snapshot stays authoritative.
//! - A snapshot counts as emitted only once the listener applied it. When
//!   the listener fails, the previous emission stays authoritative and the
//!   next cycle re-delivers the snapshot.
//! - Calls are synchronous on the single owner context, so emission N+1
//!   cannot start before the listener returned from emission N.

use crate::diff::{DuplicateIdentity, Snapshot};
use crate::model::record::RecordId;
use crate::store::{RecordQuery, RecordStore, StoreError};
use crate::view::ReconcileError;
use log::{debug, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Failure of one observation cycle. Never fatal: the last emitted
/// snapshot remains valid.
#[derive(Debug)]
pub enum ObserveError {
    /// Re-running the ordered query failed.
    Query(StoreError),
    /// The query produced a duplicate identity, which would corrupt diffing.
    Snapshot(DuplicateIdentity),
}

impl Display for ObserveError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Query(err) => write!(f, "observed query failed: {err}"),
            Self::Snapshot(err) => write!(f, "observed query result is unusable: {err}"),
        }
    }
}

impl Error for ObserveError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Query(err) => Some(err),
            Self::Snapshot(err) => Some(err),
        }
    }
}

/// Single registered receiver for observation outcomes.
///
/// The store handle is passed back in so listeners can resolve records
/// while reconciling, without sharing ownership of the store.
pub trait SnapshotListener<S: RecordStore> {
    /// A new ordered snapshot is authoritative; `changed` carries the
    /// caller-declared identities whose content changed in this commit.
    fn snapshot_changed(
        &mut self,
        store: &S,
        snapshot: Snapshot,
        changed: &[RecordId],
    ) -> Result<(), ReconcileError>;

    /// The re-query failed; the previous snapshot remains authoritative.
    fn observation_failed(&mut self, error: &ObserveError);
}

/// Watches the ordered query and feeds snapshots to one listener.
pub struct ChangeObserver<L> {
    query: RecordQuery,
    listener: L,
    last_emitted: Option<Snapshot>,
}

impl<L> ChangeObserver<L> {
    pub fn new(query: RecordQuery, listener: L) -> Self {
        Self {
            query,
            listener,
            last_emitted: None,
        }
    }

    pub fn listener(&self) -> &L {
        &self.listener
    }

    pub fn listener_mut(&mut self) -> &mut L {
        &mut self.listener
    }

    /// Snapshot delivered by the most recent emission, if any.
    pub fn last_emitted(&self) -> Option<&Snapshot> {
        self.last_emitted.as_ref()
    }

    /// Runs the initial fetch. Always emits, even when the store is empty.
    pub fn initial_fetch<S>(&mut self, store: &S) -> Result<(), ReconcileError>
    where
        S: RecordStore,
        L: SnapshotListener<S>,
    {
        self.refetch(store, &[])
    }

    /// Reacts to a completed store commit. `changed` declares identities
    /// whose content (not position) changed and must repaint.
    pub fn store_committed<S>(
        &mut self,
        store: &S,
        changed: &[RecordId],
    ) -> Result<(), ReconcileError>
    where
        S: RecordStore,
        L: SnapshotListener<S>,
    {
        self.refetch(store, changed)
    }

    fn refetch<S>(&mut self, store: &S, changed: &[RecordId]) -> Result<(), ReconcileError>
    where
        S: RecordStore,
        L: SnapshotListener<S>,
    {
        let records = match store.query(&self.query) {
            Ok(records) => records,
            Err(err) => {
                let error = ObserveError::Query(err);
                warn!("event=observe_query module=observe status=error error={error}");
                self.listener.observation_failed(&error);
                return Ok(());
            }
        };

        let ids: Vec<RecordId> = records.iter().map(|record| record.uuid).collect();
        let snapshot = match Snapshot::from_ids(ids) {
            Ok(snapshot) => snapshot,
            Err(duplicate) => {
                let error = ObserveError::Snapshot(duplicate);
                warn!("event=observe_query module=observe status=error error={error}");
                self.listener.observation_failed(&error);
                return Ok(());
            }
        };

        let first_emission = self.last_emitted.is_none();
        let sequence_changed = self.last_emitted.as_ref() != Some(&snapshot);
        let repaint_needed = changed.iter().any(|id| snapshot.contains(id));
        if !first_emission && !sequence_changed && !repaint_needed {
            debug!(
                "event=observe_skip module=observe status=ok rows={}",
                snapshot.len()
            );
            return Ok(());
        }

        let rows = snapshot.len();
        match self.listener.snapshot_changed(store, snapshot.clone(), changed) {
            Ok(()) => {
                self.last_emitted = Some(snapshot);
                info!(
                    "event=observe_emit module=observe status=ok rows={rows} first={first_emission} reordered={sequence_changed}"
                );
                Ok(())
            }
            Err(err) => {
                // The listener did not apply this snapshot; keep the previous
                // emission authoritative so the next cycle re-delivers.
                warn!("event=observe_emit module=observe status=error rows={rows} error={err}");
                Err(err)
            }
        }
    }
}

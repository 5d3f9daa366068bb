//! Observed-store-to-view-diff engine.
//!
//! Records persist in SQLite, an observer re-runs the ordered query after
//! every commit, and the resulting identity snapshots are diffed into
//! minimal animated insert/delete/move/reload operations for a list view.
//!
//! All components of one pipeline (store, observer, reconciler) live on a
//! single logical owner context; mutations and view updates are serialized
//! through it. A host performing commits elsewhere must marshal back onto
//! the owner context before observing.

pub mod db;
pub mod diff;
pub mod logging;
pub mod model;
pub mod observe;
pub mod service;
pub mod store;
pub mod view;

pub use db::{open_db, open_db_in_memory};
pub use diff::{diff, DiffOp, DuplicateIdentity, Snapshot, SnapshotDiff};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::record::{Record, RecordAttributes, RecordId, RecordValidationError};
pub use observe::{ChangeObserver, ObserveError, SnapshotListener};
pub use service::{ControlError, ListController, PromptOutcome, PromptRequest, TextPrompt};
pub use store::{RecordQuery, RecordStore, SqliteRecordStore, StoreError, StoreResult};
pub use view::{ListSurface, ReconcileError, RowRenderer, ViewReconciler};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

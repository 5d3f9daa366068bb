//! Record store contracts and persistence implementations.
//!
//! # Responsibility
//! - Define the keyed record storage contract used by the whole pipeline.
//! - Isolate SQLite staging/commit details from observation and view code.
//!
//! # Invariants
//! - Write paths validate attributes before staging.
//! - `commit()` applies staged mutations atomically; a failed commit keeps
//!   the staging buffer and the on-disk state unchanged.
//! - Query results follow the deterministic order declared by `RecordQuery`.

pub mod query;
pub mod record_store;

pub use query::RecordQuery;
pub use record_store::{RecordStore, SqliteRecordStore, StoreError, StoreResult};

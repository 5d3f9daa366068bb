//! Domain model for list records.
//!
//! # Responsibility
//! - Define the canonical record shape persisted by the store.
//! - Keep identity semantics explicit in type signatures.
//!
//! # Invariants
//! - Every record is identified by a stable `RecordId`.
//! - Deletion removes the row; identities are never reallocated.

pub mod record;

//! Record domain model.
//!
//! # Responsibility
//! - Define the canonical named record shown as one list row.
//! - Provide attribute helpers for create/rename write paths.
//!
//! # Invariants
//! - `uuid` is stable and never reused for another record.
//! - A persisted record name is never empty after trimming.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for a record across its whole lifetime.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type RecordId = Uuid;

/// Validation failures for record construction and write paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordValidationError {
    /// Name is empty after whitespace trimming.
    EmptyName,
    /// Nil UUID is reserved and never a valid record identity.
    NilUuid,
}

impl Display for RecordValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "record name cannot be empty"),
            Self::NilUuid => write!(f, "nil uuid is not a valid record identity"),
        }
    }
}

impl Error for RecordValidationError {}

/// Mutable display attributes carried by create/update operations.
///
/// Identity is deliberately absent: attributes describe what a record says,
/// never which record it is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordAttributes {
    /// Display name rendered in the list row.
    pub name: String,
}

impl RecordAttributes {
    /// Builds attributes from a display name.
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Validates attribute content for persistence.
    pub fn validate(&self) -> Result<(), RecordValidationError> {
        if self.name.trim().is_empty() {
            return Err(RecordValidationError::EmptyName);
        }
        Ok(())
    }
}

/// Canonical persisted record backing one list row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Stable identity used for snapshots, diffing and row binding.
    pub uuid: RecordId,
    /// Display name; the default query sorts by it case-insensitively.
    pub name: String,
}

impl Record {
    /// Creates a record with a freshly generated stable identity.
    pub fn new(attributes: RecordAttributes) -> Result<Self, RecordValidationError> {
        Self::with_id(Uuid::new_v4(), attributes)
    }

    /// Creates a record with a caller-provided stable identity.
    ///
    /// Used when rehydrating persisted rows where identity already exists.
    pub fn with_id(
        uuid: RecordId,
        attributes: RecordAttributes,
    ) -> Result<Self, RecordValidationError> {
        if uuid.is_nil() {
            return Err(RecordValidationError::NilUuid);
        }
        attributes.validate()?;
        Ok(Self {
            uuid,
            name: attributes.name,
        })
    }

    /// Returns the mutable attributes of this record.
    pub fn attributes(&self) -> RecordAttributes {
        RecordAttributes::named(self.name.clone())
    }

    /// Validates the record against model invariants.
    pub fn validate(&self) -> Result<(), RecordValidationError> {
        if self.uuid.is_nil() {
            return Err(RecordValidationError::NilUuid);
        }
        self.attributes().validate()
    }
}

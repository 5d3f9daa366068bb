//! Ordered query specification for the records list.
//!
//! # Responsibility
//! - Describe which records a list observation returns and in what order.
//!
//! # Invariants
//! - Sort order is total and deterministic for any stored data set:
//!   case-insensitive ascending name, then exact name bytes for
//!   equal-under-casefold names, then identity text as the final tiebreak.

/// Query options for listing records.
///
/// The sort rule is fixed; options only bound the window of rows returned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordQuery {
    pub limit: Option<u32>,
    pub offset: u32,
}

impl RecordQuery {
    /// SQL ORDER BY clause implementing the declared sort rule.
    pub(crate) fn order_clause() -> &'static str {
        "ORDER BY name COLLATE NOCASE ASC, name ASC, uuid ASC"
    }
}

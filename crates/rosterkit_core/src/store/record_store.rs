//! Record store contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide keyed create/update/delete staging with atomic commit.
//! - Serve the ordered list query from committed state.
//!
//! # Invariants
//! - Write paths validate attributes before staging.
//! - `NotFound` checks see committed state overlaid with staged mutations,
//!   newest staged mutation winning per identity.
//! - A failed commit rolls the transaction back and keeps staged mutations,
//!   so in-memory and on-disk state never diverge.

use crate::db::DbError;
use crate::model::record::{Record, RecordAttributes, RecordId, RecordValidationError};
use crate::store::query::RecordQuery;
use log::{error, info};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;
use uuid::Uuid;

const RECORD_SELECT_SQL: &str = "SELECT uuid, name FROM records";

pub type StoreResult<T> = Result<T, StoreError>;

/// Store-level error for record persistence and query operations.
#[derive(Debug)]
pub enum StoreError {
    Validation(RecordValidationError),
    Db(DbError),
    NotFound(RecordId),
    InvalidData(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "record not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted record data: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_) => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<RecordValidationError> for StoreError {
    fn from(value: RecordValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Durable keyed storage contract for list records.
///
/// Mutations stage in memory and become durable (and observable) only on
/// `commit()`. Reads always reflect committed state.
pub trait RecordStore {
    /// Stages a new record and returns its freshly allocated identity.
    fn create(&mut self, attributes: RecordAttributes) -> StoreResult<RecordId>;
    /// Stages new attributes for an existing identity.
    fn update(&mut self, id: RecordId, attributes: RecordAttributes) -> StoreResult<()>;
    /// Stages removal of an existing identity. Identities are never reused.
    fn delete(&mut self, id: RecordId) -> StoreResult<()>;
    /// Durably persists all staged mutations in one transaction.
    fn commit(&mut self) -> StoreResult<()>;
    /// Returns whether staged mutations are awaiting commit.
    fn is_dirty(&self) -> bool;
    /// Fetches one committed record by identity.
    fn get(&self, id: RecordId) -> StoreResult<Option<Record>>;
    /// Runs the ordered list query against committed state.
    fn query(&self, query: &RecordQuery) -> StoreResult<Vec<Record>>;
}

#[derive(Debug, Clone)]
enum StagedMutation {
    Create(Record),
    Update {
        id: RecordId,
        attributes: RecordAttributes,
    },
    Delete {
        id: RecordId,
    },
}

/// SQLite-backed record store with an in-memory staging buffer.
pub struct SqliteRecordStore {
    conn: Connection,
    staged: Vec<StagedMutation>,
}

impl SqliteRecordStore {
    /// Wraps a bootstrapped connection (see `db::open_db`).
    pub fn new(conn: Connection) -> Self {
        Self {
            conn,
            staged: Vec::new(),
        }
    }

    /// Returns whether an identity exists in committed state overlaid with
    /// staged mutations. The newest staged mutation per identity wins.
    fn identity_present(&self, id: RecordId) -> StoreResult<bool> {
        for staged in self.staged.iter().rev() {
            match staged {
                StagedMutation::Create(record) if record.uuid == id => return Ok(true),
                StagedMutation::Update { id: staged_id, .. } if *staged_id == id => {
                    return Ok(true)
                }
                StagedMutation::Delete { id: staged_id } if *staged_id == id => return Ok(false),
                _ => {}
            }
        }
        Ok(self.committed_get(id)?.is_some())
    }

    fn committed_get(&self, id: RecordId) -> StoreResult<Option<Record>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{RECORD_SELECT_SQL} WHERE uuid = ?1"))?;
        let mut rows = stmt.query(params![id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_record_row(row)?));
        }
        Ok(None)
    }

    fn apply_staged(conn: &mut Connection, staged: &[StagedMutation]) -> StoreResult<()> {
        let tx = conn.transaction().map_err(DbError::Sqlite)?;
        for mutation in staged {
            match mutation {
                StagedMutation::Create(record) => {
                    tx.execute(
                        "INSERT INTO records (uuid, name) VALUES (?1, ?2);",
                        params![record.uuid.to_string(), record.name],
                    )?;
                }
                StagedMutation::Update { id, attributes } => {
                    let changed = tx.execute(
                        "UPDATE records
                         SET
                            name = ?1,
                            updated_at = (strftime('%s', 'now') * 1000)
                         WHERE uuid = ?2;",
                        params![attributes.name, id.to_string()],
                    )?;
                    if changed == 0 {
                        return Err(StoreError::NotFound(*id));
                    }
                }
                StagedMutation::Delete { id } => {
                    let changed = tx.execute(
                        "DELETE FROM records WHERE uuid = ?1;",
                        params![id.to_string()],
                    )?;
                    if changed == 0 {
                        return Err(StoreError::NotFound(*id));
                    }
                }
            }
        }
        tx.commit().map_err(DbError::Sqlite)?;
        Ok(())
    }
}

impl RecordStore for SqliteRecordStore {
    fn create(&mut self, attributes: RecordAttributes) -> StoreResult<RecordId> {
        let record = Record::new(attributes)?;
        let id = record.uuid;
        self.staged.push(StagedMutation::Create(record));
        Ok(id)
    }

    fn update(&mut self, id: RecordId, attributes: RecordAttributes) -> StoreResult<()> {
        attributes.validate()?;
        if !self.identity_present(id)? {
            return Err(StoreError::NotFound(id));
        }
        self.staged.push(StagedMutation::Update { id, attributes });
        Ok(())
    }

    fn delete(&mut self, id: RecordId) -> StoreResult<()> {
        if !self.identity_present(id)? {
            return Err(StoreError::NotFound(id));
        }
        self.staged.push(StagedMutation::Delete { id });
        Ok(())
    }

    fn commit(&mut self) -> StoreResult<()> {
        if self.staged.is_empty() {
            return Ok(());
        }

        let started_at = Instant::now();
        let staged = std::mem::take(&mut self.staged);
        let (creates, updates, deletes) =
            staged
                .iter()
                .fold((0usize, 0usize, 0usize), |(c, u, d), m| match m {
                    StagedMutation::Create(_) => (c + 1, u, d),
                    StagedMutation::Update { .. } => (c, u + 1, d),
                    StagedMutation::Delete { .. } => (c, u, d + 1),
                });

        match Self::apply_staged(&mut self.conn, &staged) {
            Ok(()) => {
                info!(
                    "event=store_commit module=store status=ok duration_ms={} creates={creates} updates={updates} deletes={deletes}",
                    started_at.elapsed().as_millis()
                );
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=store_commit module=store status=error duration_ms={} error_code=commit_failed error={err}",
                    started_at.elapsed().as_millis()
                );
                // Transaction rolled back; keep the staging buffer so the
                // caller can retry or inspect.
                self.staged = staged;
                Err(err)
            }
        }
    }

    fn is_dirty(&self) -> bool {
        !self.staged.is_empty()
    }

    fn get(&self, id: RecordId) -> StoreResult<Option<Record>> {
        self.committed_get(id)
    }

    fn query(&self, query: &RecordQuery) -> StoreResult<Vec<Record>> {
        let mut sql = format!("{RECORD_SELECT_SQL} {}", RecordQuery::order_clause());
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
            if query.offset > 0 {
                sql.push_str(" OFFSET ?");
                bind_values.push(Value::Integer(i64::from(query.offset)));
            }
        } else if query.offset > 0 {
            sql.push_str(" LIMIT -1 OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut records = Vec::new();

        while let Some(row) = rows.next()? {
            records.push(parse_record_row(row)?);
        }

        Ok(records)
    }
}

fn parse_record_row(row: &Row<'_>) -> StoreResult<Record> {
    let uuid_text: String = row.get("uuid")?;
    let uuid = Uuid::parse_str(&uuid_text).map_err(|_| {
        StoreError::InvalidData(format!("invalid uuid value `{uuid_text}` in records.uuid"))
    })?;
    let name: String = row.get("name")?;

    let record = Record::with_id(uuid, RecordAttributes::named(name))?;
    Ok(record)
}

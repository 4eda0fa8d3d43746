//! Record store contract plus SQLite and in-memory implementations.
//!
//! # Responsibility
//! - Store three independently keyed JSON records (collections, cards,
//!   stats) as opaque text payloads.
//!
//! # Invariants
//! - Payload text is stored verbatim; decoding belongs to the gateway.
//! - `write_record` is an upsert of the full payload.

use crate::db::DbError;
use rusqlite::{params, Connection, OptionalExtension};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Storage error for record reads and writes.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// Backing store rejected the operation for a non-SQL reason.
    Unavailable(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Unavailable(message) => write!(f, "record store unavailable: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Unavailable(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Keys of the persisted records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RecordKey {
    Collections,
    Cards,
    Stats,
}

impl RecordKey {
    /// Stable storage key.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Collections => "flashcard_collections",
            Self::Cards => "flashcard_cards",
            Self::Stats => "flashcard_stats",
        }
    }
}

impl Display for RecordKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Durable key-value substrate for study records.
pub trait RecordStore {
    fn read_record(&self, key: RecordKey) -> RepoResult<Option<String>>;
    fn write_record(&self, key: RecordKey, payload: &str) -> RepoResult<()>;
}

impl<S: RecordStore + ?Sized> RecordStore for &S {
    fn read_record(&self, key: RecordKey) -> RepoResult<Option<String>> {
        (**self).read_record(key)
    }

    fn write_record(&self, key: RecordKey, payload: &str) -> RepoResult<()> {
        (**self).write_record(key, payload)
    }
}

/// SQLite-backed record store over the `records` table.
pub struct SqliteRecordStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRecordStore<'conn> {
    /// Wraps a connection returned by `open_db` / `open_db_in_memory`,
    /// which already guarantee the `records` schema.
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl RecordStore for SqliteRecordStore<'_> {
    fn read_record(&self, key: RecordKey) -> RepoResult<Option<String>> {
        let payload = self
            .conn
            .query_row(
                "SELECT payload FROM records WHERE key = ?1;",
                [key.as_str()],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(payload)
    }

    fn write_record(&self, key: RecordKey, payload: &str) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO records (key, payload, updated_at)
             VALUES (?1, ?2, (strftime('%s', 'now') * 1000))
             ON CONFLICT(key) DO UPDATE SET
                payload = excluded.payload,
                updated_at = excluded.updated_at;",
            params![key.as_str(), payload],
        )?;
        Ok(())
    }
}

/// Process-local record store for ephemeral sessions and tests.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    records: RefCell<BTreeMap<RecordKey, String>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds one record, e.g. to simulate previously persisted data.
    pub fn with_record(self, key: RecordKey, payload: impl Into<String>) -> Self {
        self.records.borrow_mut().insert(key, payload.into());
        self
    }

    /// Returns a copy of one stored payload.
    pub fn payload(&self, key: RecordKey) -> Option<String> {
        self.records.borrow().get(&key).cloned()
    }
}

impl RecordStore for MemoryRecordStore {
    fn read_record(&self, key: RecordKey) -> RepoResult<Option<String>> {
        Ok(self.payload(key))
    }

    fn write_record(&self, key: RecordKey, payload: &str) -> RepoResult<()> {
        self.records.borrow_mut().insert(key, payload.to_string());
        Ok(())
    }
}

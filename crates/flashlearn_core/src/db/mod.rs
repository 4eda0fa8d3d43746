//! SQLite connections backing the record store.
//!
//! # Invariants
//! - Every connection handed out by `open_db` / `open_db_in_memory` has the
//!   `records` table at `SCHEMA_VERSION`; nothing else checks the version.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod open;
mod schema;

pub use open::{open_db, open_db_in_memory};
pub use schema::SCHEMA_VERSION;

/// File name of the study database inside the data directory.
pub const DB_FILE_NAME: &str = "flashlearn.sqlite3";

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// Database was written with a schema this build does not know.
    UnsupportedSchemaVersion { found: u32, supported: u32 },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion { found, supported } => write!(
                f,
                "database schema version {found} is not supported (expected {supported})"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

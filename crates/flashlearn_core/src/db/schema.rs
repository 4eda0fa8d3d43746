//! Records schema bootstrap and version gate.
//!
//! The store has one table, so there is no migration chain: a fresh
//! database (`user_version = 0`) gets the `records` table, a database at
//! `SCHEMA_VERSION` is used as-is, and anything else is refused.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::Connection;

/// Schema version written to `PRAGMA user_version`.
pub const SCHEMA_VERSION: u32 = 1;

const RECORDS_DDL: &str = include_str!("records.sql");

/// Creates the `records` table on a fresh database and checks the version
/// of an existing one.
///
/// # Errors
/// - `DbError::UnsupportedSchemaVersion` for any version other than `0` or
///   `SCHEMA_VERSION`.
pub(crate) fn ensure_records_schema(conn: &Connection) -> DbResult<()> {
    let found: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    match found {
        SCHEMA_VERSION => Ok(()),
        0 => {
            let tx = conn.unchecked_transaction()?;
            tx.execute_batch(RECORDS_DDL)?;
            tx.pragma_update(None, "user_version", SCHEMA_VERSION)?;
            tx.commit()?;
            info!("event=schema_create module=db status=ok version={SCHEMA_VERSION}");
            Ok(())
        }
        other => Err(DbError::UnsupportedSchemaVersion {
            found: other,
            supported: SCHEMA_VERSION,
        }),
    }
}

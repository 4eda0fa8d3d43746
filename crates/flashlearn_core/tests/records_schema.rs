use flashlearn_core::db::{open_db, open_db_in_memory, DbError, SCHEMA_VERSION};
use flashlearn_core::{RecordKey, RecordStore, SqliteRecordStore};
use rusqlite::Connection;

#[test]
fn records_table_is_keyed_by_record_key() {
    let conn = open_db_in_memory().unwrap();

    let mut stmt = conn
        .prepare("SELECT name, \"notnull\", pk FROM pragma_table_info('records') ORDER BY cid;")
        .unwrap();
    let columns: Vec<(String, bool, i64)> = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(
        columns,
        vec![
            ("key".to_string(), true, 1),
            ("payload".to_string(), true, 0),
            ("updated_at".to_string(), true, 0),
        ]
    );
    assert_eq!(user_version(&conn), SCHEMA_VERSION);
}

#[test]
fn updated_at_defaults_to_insert_time_in_millis() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO records (key, payload) VALUES ('flashcard_stats', '{}');",
        [],
    )
    .unwrap();

    let (updated_at, now_ms): (i64, i64) = conn
        .query_row(
            "SELECT updated_at, strftime('%s', 'now') * 1000 FROM records WHERE key = 'flashcard_stats';",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    assert!(updated_at > 0);
    assert!((now_ms - updated_at).abs() <= 1_000);
}

#[test]
fn duplicate_key_insert_is_rejected_but_store_write_replaces_payload() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteRecordStore::new(&conn);
    store.write_record(RecordKey::Cards, "[\"old\"]").unwrap();

    let plain_insert = conn.execute(
        "INSERT INTO records (key, payload) VALUES ('flashcard_cards', '[]');",
        [],
    );
    assert!(plain_insert.is_err());

    store.write_record(RecordKey::Cards, "[\"new\"]").unwrap();
    let rows: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM records WHERE key = 'flashcard_cards';",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(rows, 1);
    assert_eq!(
        store.read_record(RecordKey::Cards).unwrap().as_deref(),
        Some("[\"new\"]")
    );
}

#[test]
fn reopening_file_keeps_records_and_version() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("flashlearn.sqlite3");

    {
        let conn = open_db(&path).unwrap();
        SqliteRecordStore::new(&conn)
            .write_record(RecordKey::Collections, "[]")
            .unwrap();
    }

    let conn = open_db(&path).unwrap();
    assert_eq!(user_version(&conn), SCHEMA_VERSION);
    assert_eq!(
        SqliteRecordStore::new(&conn)
            .read_record(RecordKey::Collections)
            .unwrap()
            .as_deref(),
        Some("[]")
    );
}

#[test]
fn unknown_schema_version_is_refused_at_open() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.sqlite3");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
        DbError::UnsupportedSchemaVersion { found, supported } => {
            assert_eq!(found, 999);
            assert_eq!(supported, SCHEMA_VERSION);
        }
        other => panic!("unexpected error: {other}"),
    }
}

fn user_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

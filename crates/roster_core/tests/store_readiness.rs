use roster_core::db::migrations::latest_version;
use roster_core::db::open_db_in_memory;
use roster_core::{RepoError, RosterStore, SqliteRosterStore};
use rusqlite::Connection;

#[test]
fn store_rejects_uninitialized_connection() {
    let conn = Connection::open_in_memory().unwrap();

    match SqliteRosterStore::try_new(&conn) {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => assert_eq!(expected_version, latest_version()),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

#[test]
fn store_rejects_connection_without_required_tables() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    let result = SqliteRosterStore::try_new(&conn);
    assert!(matches!(result, Err(RepoError::MissingRequiredTable("teams"))));
}

#[test]
fn store_rejects_connection_missing_version_column() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE teams (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            avatar_url TEXT
        );",
    )
    .unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    let result = SqliteRosterStore::try_new(&conn);
    assert!(matches!(
        result,
        Err(RepoError::MissingRequiredColumn {
            table: "teams",
            column: "version"
        })
    ));
}

#[test]
fn reads_reject_invalid_persisted_birthday() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO players (name, height, birthday) VALUES ('Broken', 180, 'someday');",
        [],
    )
    .unwrap();
    let id = conn.last_insert_rowid();
    let store = SqliteRosterStore::try_new(&conn).unwrap();

    let err = store.get_player(id).unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(message) if message.contains("someday")));
}

#[test]
fn reads_accept_sqlite_datetime_birthdays() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO players (name, height, birthday) VALUES ('Legacy', 175, '1997-05-12 00:00:00');",
        [],
    )
    .unwrap();
    let id = conn.last_insert_rowid();
    let store = SqliteRosterStore::try_new(&conn).unwrap();

    let player = store.get_player(id).unwrap().unwrap();
    assert_eq!(player.birthday.to_string(), "1997-05-12 00:00:00");
    assert_eq!(player.version, 1);
}

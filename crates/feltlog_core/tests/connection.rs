use feltlog_core::{apply_migrations, DbError, DbHandle};
use rusqlite::types::Value;

#[test]
fn write_statements_report_changes_and_insert_id() {
    let handle = DbHandle::open_in_memory().unwrap();
    handle
        .execute_batch("CREATE TABLE samples (id INTEGER PRIMARY KEY, label TEXT NOT NULL);")
        .unwrap();

    let inserted = handle
        .execute(
            "INSERT INTO samples (label) VALUES (?1);",
            &[Value::Text("first".to_string())],
        )
        .unwrap();
    assert_eq!(inserted.changed, 1);
    assert_eq!(inserted.insert_id, Some(1));
    assert!(inserted.rows.is_empty());

    let updated = handle
        .execute(
            "UPDATE samples SET label = ?1;",
            &[Value::Text("renamed".to_string())],
        )
        .unwrap();
    assert_eq!(updated.changed, 1);
    assert_eq!(updated.insert_id, None);
}

#[test]
fn read_statements_materialize_rows_without_change_count() {
    let handle = DbHandle::open_in_memory().unwrap();
    handle
        .execute_batch(
            "CREATE TABLE samples (id INTEGER PRIMARY KEY, label TEXT, score REAL);
             INSERT INTO samples (label, score) VALUES ('a', 1.5), (NULL, NULL);",
        )
        .unwrap();

    let outcome = handle
        .execute("SELECT id, label, score FROM samples ORDER BY id;", &[])
        .unwrap();
    assert_eq!(outcome.changed, 0);
    assert_eq!(outcome.rows.len(), 2);
    assert_eq!(outcome.rows[0].text("label").unwrap(), "a");
    assert_eq!(outcome.rows[0].real("score").unwrap(), 1.5);
    assert_eq!(outcome.rows[1].opt_text("label").unwrap(), None);
    assert_eq!(outcome.rows[1].opt_real("score").unwrap(), None);
    assert!(outcome.rows[0].text("missing").is_err());
}

#[test]
fn closed_handle_fails_not_initialized_and_never_reopens() {
    let mut handle = DbHandle::open_in_memory().unwrap();
    assert!(handle.is_open());
    handle.close().unwrap();
    assert!(!handle.is_open());

    let err = handle.execute("SELECT 1;", &[]).unwrap_err();
    assert!(matches!(err, DbError::NotInitialized));
    assert!(matches!(
        handle.begin_transaction().unwrap_err(),
        DbError::NotInitialized
    ));
    assert!(matches!(handle.close().unwrap_err(), DbError::NotInitialized));
}

#[test]
fn raw_transaction_statements_commit_and_roll_back() {
    let handle = DbHandle::open_in_memory().unwrap();
    handle
        .execute_batch("CREATE TABLE samples (id INTEGER PRIMARY KEY);")
        .unwrap();

    handle.begin_transaction().unwrap();
    handle
        .execute("INSERT INTO samples (id) VALUES (1);", &[])
        .unwrap();
    handle.rollback().unwrap();
    let after_rollback = handle.execute("SELECT id FROM samples;", &[]).unwrap();
    assert!(after_rollback.rows.is_empty());

    handle.begin_transaction().unwrap();
    handle
        .execute("INSERT INTO samples (id) VALUES (2);", &[])
        .unwrap();
    handle.commit().unwrap();
    let after_commit = handle.execute("SELECT id FROM samples;", &[]).unwrap();
    assert_eq!(after_commit.rows.len(), 1);
    assert_eq!(after_commit.rows[0].integer("id").unwrap(), 2);
}

#[test]
fn wrong_encryption_key_surfaces_on_first_statement_not_open() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("keyed.db");

    {
        let mut handle = DbHandle::open(&path, Some("correct horse")).unwrap();
        apply_migrations(&handle).unwrap();
        handle.close().unwrap();
    }

    // Opening with the wrong key succeeds; the failure belongs to the
    // first statement that touches database pages.
    let handle = DbHandle::open(&path, Some("battery staple")).unwrap();
    let err = handle
        .execute("SELECT count(*) AS n FROM journal_entries;", &[])
        .unwrap_err();
    assert!(matches!(err, DbError::Sqlite(_)));

    let mut reopened = DbHandle::open(&path, Some("correct horse")).unwrap();
    let outcome = reopened
        .execute("SELECT count(*) AS n FROM journal_entries;", &[])
        .unwrap();
    assert_eq!(outcome.rows[0].integer("n").unwrap(), 0);
    reopened.close().unwrap();
}

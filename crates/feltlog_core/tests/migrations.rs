use feltlog_core::{apply_migrations, revert_migrations, DbHandle};
use rusqlite::types::Value;

fn table_exists(handle: &DbHandle, table: &str) -> bool {
    let outcome = handle
        .execute(
            "SELECT count(*) AS n FROM sqlite_master WHERE type = 'table' AND name = ?1;",
            &[Value::Text(table.to_string())],
        )
        .unwrap();
    outcome.rows[0].integer("n").unwrap() == 1
}

#[test]
fn apply_creates_all_three_tables() {
    let handle = DbHandle::open_in_memory().unwrap();
    apply_migrations(&handle).unwrap();

    for table in ["tags", "journal_entries", "journal_entry_tags"] {
        assert!(table_exists(&handle, table), "missing table {table}");
    }
}

#[test]
fn apply_is_idempotent_over_existing_schema_and_data() {
    let handle = DbHandle::open_in_memory().unwrap();
    apply_migrations(&handle).unwrap();

    handle
        .execute(
            "INSERT INTO tags (id, name, created_at) VALUES ('t1', 'work', 0);",
            &[],
        )
        .unwrap();

    apply_migrations(&handle).unwrap();

    let outcome = handle.execute("SELECT count(*) AS n FROM tags;", &[]).unwrap();
    assert_eq!(outcome.rows[0].integer("n").unwrap(), 1);
}

#[test]
fn association_foreign_keys_are_enforced() {
    let handle = DbHandle::open_in_memory().unwrap();
    apply_migrations(&handle).unwrap();

    let err = handle
        .execute(
            "INSERT INTO journal_entry_tags (entry_id, tag_id) VALUES ('ghost', 'ghost');",
            &[],
        )
        .unwrap_err();
    assert!(err.to_string().contains("FOREIGN KEY"));
}

#[test]
fn revert_drops_schema_in_reverse_order() {
    let handle = DbHandle::open_in_memory().unwrap();
    apply_migrations(&handle).unwrap();
    revert_migrations(&handle).unwrap();

    for table in ["tags", "journal_entries", "journal_entry_tags"] {
        assert!(!table_exists(&handle, table), "table {table} should be gone");
    }

    // Schema can be rebuilt after a revert.
    apply_migrations(&handle).unwrap();
    assert!(table_exists(&handle, "journal_entries"));
}

#[test]
fn schema_persists_across_reopen_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("journal.db");

    {
        let mut handle = DbHandle::open(&path, None).unwrap();
        apply_migrations(&handle).unwrap();
        handle.close().unwrap();
    }

    let mut handle = DbHandle::open(&path, None).unwrap();
    apply_migrations(&handle).unwrap();
    assert!(table_exists(&handle, "journal_entry_tags"));
    handle.close().unwrap();
}

use feltlog_core::{
    apply_migrations, DbHandle, EntryDraft, EntryPatch, JournalRepository, Location,
    SqliteJournalRepository,
};
use rusqlite::types::Value;

fn open_handle() -> DbHandle {
    let handle = DbHandle::open_in_memory().unwrap();
    apply_migrations(&handle).unwrap();
    handle
}

fn located(content: &str, location: Option<Location>) -> EntryDraft {
    EntryDraft {
        content: content.to_string(),
        datetime: 1,
        tags: Vec::new(),
        location,
    }
}

fn full_location() -> Location {
    Location {
        latitude: 48.2082,
        longitude: 16.3738,
        elevation: 171.0,
        accuracy: Some(4.5),
        address: Some("Vienna, Austria".to_string()),
    }
}

#[test]
fn location_round_trips_with_and_without_optional_fields() {
    let handle = open_handle();
    let mut repo = SqliteJournalRepository::new(&handle);

    let with_extras = repo
        .create_entry(located("full", Some(full_location())))
        .unwrap();
    assert_eq!(with_extras.location, Some(full_location()));

    let bare = Location {
        accuracy: None,
        address: None,
        ..full_location()
    };
    let without_extras = repo
        .create_entry(located("bare", Some(bare.clone())))
        .unwrap();
    assert_eq!(without_extras.location, Some(bare));

    let none = repo.create_entry(located("none", None)).unwrap();
    assert_eq!(none.location, None);
}

#[test]
fn partially_null_location_collapses_to_absent() {
    let handle = open_handle();
    let repo = SqliteJournalRepository::new(&handle);

    // Write a malformed row behind the repository's back: latitude and
    // accuracy set, longitude and elevation missing.
    handle
        .execute(
            "INSERT INTO journal_entries (
                id, content, datetime, created_at, modified_at,
                location_latitude, location_accuracy
            ) VALUES (?1, 'partial', 1, 1, 1, 48.2, 4.5);",
            &[Value::Text(
                "9f0c0f9e-1111-2222-3333-444444444444".to_string(),
            )],
        )
        .unwrap();

    let listed = repo.get_all_entries(0, 10).unwrap();
    assert_eq!(listed.len(), 1);
    // Never a partial object; the whole location collapses.
    assert_eq!(listed[0].location, None);
}

#[test]
fn clearing_location_nulls_all_five_columns_together() {
    let handle = open_handle();
    let mut repo = SqliteJournalRepository::new(&handle);

    let created = repo
        .create_entry(located("clear me", Some(full_location())))
        .unwrap();

    let cleared = repo
        .update_entry(
            created.id,
            EntryPatch {
                location: Some(None),
                ..EntryPatch::default()
            },
        )
        .unwrap();
    assert_eq!(cleared.location, None);

    let outcome = handle
        .execute(
            "SELECT
                location_latitude, location_longitude, location_elevation,
                location_accuracy, location_address
             FROM journal_entries WHERE id = ?1;",
            &[Value::Text(created.id.to_string())],
        )
        .unwrap();
    let row = &outcome.rows[0];
    for column in [
        "location_latitude",
        "location_longitude",
        "location_elevation",
        "location_accuracy",
    ] {
        assert_eq!(row.opt_real(column).unwrap(), None, "{column} should be NULL");
    }
    assert_eq!(row.opt_text("location_address").unwrap(), None);
}

#[test]
fn setting_location_on_update_replaces_the_whole_structure() {
    let handle = open_handle();
    let mut repo = SqliteJournalRepository::new(&handle);

    let created = repo.create_entry(located("locate me", None)).unwrap();
    assert_eq!(created.location, None);

    let target = Location {
        latitude: -33.8688,
        longitude: 151.2093,
        elevation: 58.0,
        accuracy: None,
        address: None,
    };
    let updated = repo
        .update_entry(
            created.id,
            EntryPatch {
                location: Some(Some(target.clone())),
                ..EntryPatch::default()
            },
        )
        .unwrap();
    assert_eq!(updated.location, Some(target));
    assert_eq!(updated.content, "locate me");
}

use rosterkit_core::db::open_db;
use rosterkit_core::{
    open_db_in_memory, RecordAttributes, RecordQuery, RecordStore, SqliteRecordStore, StoreError,
};
use uuid::Uuid;

fn memory_store() -> SqliteRecordStore {
    SqliteRecordStore::new(open_db_in_memory().unwrap())
}

#[test]
fn create_is_invisible_until_commit() {
    let mut store = memory_store();

    let id = store.create(RecordAttributes::named("banana")).unwrap();
    assert!(store.is_dirty());
    assert!(store.get(id).unwrap().is_none());
    assert!(store.query(&RecordQuery::default()).unwrap().is_empty());

    store.commit().unwrap();
    assert!(!store.is_dirty());

    let loaded = store.get(id).unwrap().unwrap();
    assert_eq!(loaded.uuid, id);
    assert_eq!(loaded.name, "banana");
}

#[test]
fn create_rejects_blank_name() {
    let mut store = memory_store();
    let err = store.create(RecordAttributes::named("  ")).unwrap_err();
    assert!(matches!(
        err,
        StoreError::Validation(rosterkit_core::RecordValidationError::EmptyName)
    ));
    assert!(!store.is_dirty());
}

#[test]
fn update_not_found_returns_not_found() {
    let mut store = memory_store();
    let missing = Uuid::new_v4();
    let err = store
        .update(missing, RecordAttributes::named("x"))
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound(id) if id == missing));
}

#[test]
fn delete_not_found_returns_not_found() {
    let mut store = memory_store();
    let missing = Uuid::new_v4();
    let err = store.delete(missing).unwrap_err();
    assert!(matches!(err, StoreError::NotFound(id) if id == missing));
}

#[test]
fn staged_create_can_be_updated_before_commit() {
    let mut store = memory_store();

    let id = store.create(RecordAttributes::named("draft")).unwrap();
    store.update(id, RecordAttributes::named("final")).unwrap();
    store.commit().unwrap();

    assert_eq!(store.get(id).unwrap().unwrap().name, "final");
}

#[test]
fn staged_delete_hides_identity_from_further_writes() {
    let mut store = memory_store();

    let id = store.create(RecordAttributes::named("gone soon")).unwrap();
    store.commit().unwrap();

    store.delete(id).unwrap();
    let err = store.update(id, RecordAttributes::named("x")).unwrap_err();
    assert!(matches!(err, StoreError::NotFound(found) if found == id));

    store.commit().unwrap();
    assert!(store.get(id).unwrap().is_none());
}

#[test]
fn update_and_delete_apply_on_commit() {
    let mut store = memory_store();

    let kept = store.create(RecordAttributes::named("kept")).unwrap();
    let dropped = store.create(RecordAttributes::named("dropped")).unwrap();
    store.commit().unwrap();

    store.update(kept, RecordAttributes::named("kept 2")).unwrap();
    store.delete(dropped).unwrap();
    store.commit().unwrap();

    assert_eq!(store.get(kept).unwrap().unwrap().name, "kept 2");
    assert!(store.get(dropped).unwrap().is_none());

    let names: Vec<String> = store
        .query(&RecordQuery::default())
        .unwrap()
        .into_iter()
        .map(|record| record.name)
        .collect();
    assert_eq!(names, vec!["kept 2"]);
}

#[test]
fn empty_commit_is_a_no_op() {
    let mut store = memory_store();
    store.commit().unwrap();
    assert!(!store.is_dirty());
}

#[test]
fn failed_commit_rolls_back_and_keeps_staged_mutations() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("roster.db");

    let mut store = SqliteRecordStore::new(open_db(&path).unwrap());
    let apple = store.create(RecordAttributes::named("apple")).unwrap();
    let banana = store.create(RecordAttributes::named("banana")).unwrap();
    store.commit().unwrap();

    store
        .update(banana, RecordAttributes::named("berry"))
        .unwrap();
    store.update(apple, RecordAttributes::named("apricot")).unwrap();

    // A second connection deletes apple underneath the staged update, so
    // the commit transaction fails partway through.
    let mut other = SqliteRecordStore::new(open_db(&path).unwrap());
    other.delete(apple).unwrap();
    other.commit().unwrap();

    let err = store.commit().unwrap_err();
    assert!(matches!(err, StoreError::NotFound(id) if id == apple));

    // Rolled back: banana's update (first in the buffer) did not land, and
    // the staging buffer survives for inspection or retry.
    assert!(store.is_dirty());
    assert_eq!(store.get(banana).unwrap().unwrap().name, "banana");
    assert!(store.get(apple).unwrap().is_none());

    let err = store.commit().unwrap_err();
    assert!(matches!(err, StoreError::NotFound(id) if id == apple));
    assert!(store.is_dirty());
}

#[test]
fn committed_records_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("roster.db");

    let id = {
        let mut store = SqliteRecordStore::new(open_db(&path).unwrap());
        let id = store.create(RecordAttributes::named("durable")).unwrap();
        store.commit().unwrap();
        id
    };

    let store = SqliteRecordStore::new(open_db(&path).unwrap());
    let loaded = store.get(id).unwrap().unwrap();
    assert_eq!(loaded.name, "durable");
}

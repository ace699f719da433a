//! Pessimistic locking and missing-row handling

use crate::*;

fn missing_user() -> LockingContext {
    user_mst().context(["xxxxxx", "yyyyyy", "zzzzzz"]).unwrap()
}

#[test]
fn update_missing_row_is_invalid_state() {
    let conn = create_db();
    let db = SqliteConnection::new(&conn);
    let manager = create_manager();
    manager.add_version(&db, &user(1)).unwrap();

    let err = manager.update_version(&db, &missing_user()).unwrap_err();
    assert!(err.is_invalid_state());
    assert!(!err.is_conflict());

    let text = err.to_string();
    assert!(text.contains("version was not found."));
    assert!(text.contains(
        "sql = [UPDATE EXCLUSIVE_USER_MST SET VERSION = (VERSION + 1) WHERE USER_ID = :user_id AND PK2 = :pk2 AND PK3 = :pk3]"
    ));
    assert!(text.contains("user_id=xxxxxx"));
    assert!(text.contains("pk2=yyyyyy"));
    assert!(text.contains("pk3=zzzzzz"));

    assert_eq!(user_versions(&conn), vec![("uid001".to_string(), 1)]);
}

#[test]
fn remove_missing_row_is_invalid_state() {
    let conn = create_db();
    let db = SqliteConnection::new(&conn);
    let manager = create_manager();
    manager.add_version(&db, &user(1)).unwrap();

    let err = manager.remove_version(&db, &missing_user()).unwrap_err();
    match &err {
        Error::InvalidState { sql, params } => {
            assert_eq!(
                sql,
                "DELETE FROM EXCLUSIVE_USER_MST WHERE USER_ID = :user_id AND PK2 = :pk2 AND PK3 = :pk3"
            );
            assert_eq!(params.to_string(), "user_id=xxxxxx, pk2=yyyyyy, pk3=zzzzzz");
        }
        other => panic!("expected InvalidState, got {:?}", other),
    }

    assert_eq!(user_versions(&conn), vec![("uid001".to_string(), 1)]);
}

#[test]
fn repeated_updates_increment_by_one_each() {
    let conn = create_db();
    let db = SqliteConnection::new(&conn);
    let manager = create_manager();
    manager.add_version(&db, &comp(1)).unwrap();
    manager.add_version(&db, &comp(2)).unwrap();

    for expected in 2..=6 {
        manager.update_version(&db, &comp(1)).unwrap();
        let version = manager.get_version(&db, &comp(1)).unwrap().unwrap();
        assert_eq!(version.version(), expected.to_string());
    }

    assert_eq!(
        comp_versions(&conn),
        vec![("com001".to_string(), 6), ("com002".to_string(), 1)]
    );
}

#[test]
fn pessimistic_update_invalidates_optimistic_readers() {
    let conn = create_db();
    let db = SqliteConnection::new(&conn);
    let manager = create_manager();
    manager.add_version(&db, &comp(1)).unwrap();

    let seen = manager.get_version(&db, &comp(1)).unwrap().unwrap();
    manager.update_version(&db, &comp(1)).unwrap();

    let err = manager.check_versions(&db, &[seen]).unwrap_err();
    assert!(err.is_conflict());
}

#[test]
fn malformed_context_is_rejected() {
    let err = user_mst().context(["only-one"]).unwrap_err();
    assert!(matches!(err, Error::InvalidContext(_)));

    let err = TableSchema::new("BAD TABLE", "VERSION", ["ID"])
        .context(["x"])
        .unwrap_err();
    assert!(matches!(err, Error::InvalidContext(_)));
}

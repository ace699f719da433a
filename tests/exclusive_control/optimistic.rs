//! Optimistic locking: check_versions and update_versions_with_check

use crate::*;

fn add_users(conn: &SqliteConnection<'_>, manager: &ExclusiveControlManager, n: u32) {
    for i in 1..=n {
        manager.add_version(conn, &user(i)).unwrap();
    }
}

fn all_users_at(n: u32, version: &str) -> Vec<Version> {
    (1..=n)
        .map(|i| Version::from_context(&user(i), version))
        .collect()
}

#[test]
fn check_current_version_succeeds() {
    let conn = create_db();
    let db = SqliteConnection::new(&conn);
    let manager = create_manager();
    add_users(&db, &manager, 1);

    manager.check_versions(&db, &all_users_at(1, "1")).unwrap();
    assert_eq!(user_versions(&conn), vec![("uid001".to_string(), 1)]);
}

#[test]
fn check_stale_version_reports_single_conflict() {
    let conn = create_db();
    let db = SqliteConnection::new(&conn);
    let manager = create_manager();
    add_users(&db, &manager, 1);
    manager.update_version(&db, &user(1)).unwrap();

    let stale = Version::from_context(&user(1), "1");
    let err = manager.check_versions(&db, &[stale.clone()]).unwrap_err();

    let conflict = err.as_optimistic_lock().unwrap();
    assert!(conflict.message().is_none());
    assert_eq!(conflict.failures(), &[stale]);
    assert_eq!(conflict.failures()[0].table_name(), "EXCLUSIVE_USER_MST");
    assert_eq!(conflict.failures()[0].version(), "1");
    assert_eq!(key_of(&conflict.failures()[0], "USER_ID"), "uid001");
    assert_eq!(key_of(&conflict.failures()[0], "PK2"), "pk2001");
}

#[test]
fn check_vanished_row_is_conflict() {
    let conn = create_db();
    let db = SqliteConnection::new(&conn);
    let manager = create_manager();
    add_users(&db, &manager, 1);
    manager.remove_version(&db, &user(1)).unwrap();

    let err = manager
        .check_versions(&db, &all_users_at(1, "1"))
        .unwrap_err();
    assert_eq!(err.as_optimistic_lock().unwrap().failures().len(), 1);
}

#[test]
fn check_reports_every_stale_row_in_input_order() {
    let conn = create_db();
    let db = SqliteConnection::new(&conn);
    let manager = create_manager();
    add_users(&db, &manager, 5);

    manager.check_versions(&db, &all_users_at(5, "1")).unwrap();

    manager.update_version(&db, &user(1)).unwrap();
    manager.update_version(&db, &user(3)).unwrap();
    manager.update_version(&db, &user(5)).unwrap();

    let err = manager
        .check_versions(&db, &all_users_at(5, "1"))
        .unwrap_err();
    let failed: Vec<_> = err
        .as_optimistic_lock()
        .unwrap()
        .failures()
        .iter()
        .map(|v| key_of(v, "USER_ID"))
        .collect();
    assert_eq!(failed, vec!["uid001", "uid003", "uid005"]);

    // Nothing was modified by the check
    let stored: Vec<i64> = user_versions(&conn).into_iter().map(|(_, v)| v).collect();
    assert_eq!(stored, vec![2, 1, 2, 1, 2]);
}

#[test]
fn check_preserves_caller_order_not_table_order() {
    let conn = create_db();
    let db = SqliteConnection::new(&conn);
    let manager = create_manager();
    add_users(&db, &manager, 3);
    manager.update_version(&db, &user(1)).unwrap();
    manager.update_version(&db, &user(3)).unwrap();

    let input = vec![
        Version::from_context(&user(3), "1"),
        Version::from_context(&user(2), "1"),
        Version::from_context(&user(1), "1"),
    ];
    let err = manager.check_versions(&db, &input).unwrap_err();
    let failures = err.as_optimistic_lock().unwrap().failures();
    assert_eq!(failures, &[input[0].clone(), input[2].clone()]);
}

#[test]
fn update_with_check_increments_current_rows() {
    let conn = create_db();
    let db = SqliteConnection::new(&conn);
    let manager = create_manager();
    add_users(&db, &manager, 1);

    manager
        .update_versions_with_check(&db, &all_users_at(1, "1"))
        .unwrap();
    assert_eq!(user_versions(&conn), vec![("uid001".to_string(), 2)]);

    let err = manager
        .update_versions_with_check(&db, &all_users_at(1, "1"))
        .unwrap_err();
    assert!(err.is_conflict());
    assert_eq!(user_versions(&conn), vec![("uid001".to_string(), 2)]);
}

#[test]
fn update_with_check_attempts_every_row() {
    let conn = create_db();
    let db = SqliteConnection::new(&conn);
    let manager = create_manager();
    add_users(&db, &manager, 5);
    manager.update_version(&db, &user(2)).unwrap();
    manager.update_version(&db, &user(4)).unwrap();

    let err = manager
        .update_versions_with_check(&db, &all_users_at(5, "1"))
        .unwrap_err();
    let failed: Vec<_> = err
        .as_optimistic_lock()
        .unwrap()
        .failures()
        .iter()
        .map(|v| key_of(v, "USER_ID"))
        .collect();
    assert_eq!(failed, vec!["uid002", "uid004"]);

    // Stale rows stay put, current rows were incremented
    let stored: Vec<i64> = user_versions(&conn).into_iter().map(|(_, v)| v).collect();
    assert_eq!(stored, vec![2, 2, 2, 2, 2]);
}

#[test]
fn mixed_tables_report_exact_stale_subset() {
    let conn = create_db();
    let db = SqliteConnection::new(&conn);
    let manager = ExclusiveControlManager::builder()
        .optimistic_lock_message_id("MSG00025")
        .message_resolver(
            StaticMessages::new().with("MSG00025", "the data was updated by another user"),
        )
        .build()
        .unwrap();

    add_users(&db, &manager, 3);
    for i in 1..=3 {
        manager.add_version(&db, &comp(i)).unwrap();
    }

    let batch = vec![
        Version::from_context(&user(1), "1"),
        Version::from_context(&user(2), "1"),
        Version::from_context(&user(3), "1"),
        Version::from_context(&comp(1), "1"),
        Version::from_context(&comp(2), "1"),
        Version::from_context(&comp(3), "1"),
    ];
    manager.check_versions(&db, &batch).unwrap();

    manager.update_version(&db, &user(2)).unwrap();
    manager.update_version(&db, &comp(3)).unwrap();

    let err = manager.check_versions(&db, &batch).unwrap_err();
    let conflict = err.as_optimistic_lock().unwrap();
    assert_eq!(conflict.failures(), &[batch[1].clone(), batch[5].clone()]);
    let message = conflict.message().unwrap();
    assert_eq!(message.id, "MSG00025");
    assert_eq!(message.text, "the data was updated by another user");

    let err = manager.update_versions_with_check(&db, &batch).unwrap_err();
    let conflict = err.as_optimistic_lock().unwrap();
    assert_eq!(conflict.failures(), &[batch[1].clone(), batch[5].clone()]);
    assert_eq!(conflict.failures()[1].table_name(), "EXCLUSIVE_COMP_MST");
    assert_eq!(key_of(&conflict.failures()[1], "COMP_ID"), "com003");

    let users: Vec<i64> = user_versions(&conn).into_iter().map(|(_, v)| v).collect();
    let comps: Vec<i64> = comp_versions(&conn).into_iter().map(|(_, v)| v).collect();
    assert_eq!(users, vec![2, 2, 2]);
    assert_eq!(comps, vec![2, 2, 2]);
}

#[test]
fn version_read_then_checked_round_trips() {
    let conn = create_db();
    let db = SqliteConnection::new(&conn);
    let manager = create_manager();
    manager.add_version(&db, &comp(7)).unwrap();
    manager.update_version(&db, &comp(7)).unwrap();

    let seen = manager.get_version(&db, &comp(7)).unwrap().unwrap();
    assert_eq!(seen.version(), "2");
    manager.check_versions(&db, &[seen.clone()]).unwrap();
    manager.update_versions_with_check(&db, &[seen.clone()]).unwrap();

    let err = manager.update_versions_with_check(&db, &[seen]).unwrap_err();
    assert!(err.is_retryable());
}

#[test]
fn hand_built_version_is_checked_like_a_read_one() {
    let conn = create_db();
    let db = SqliteConnection::new(&conn);
    let manager = create_manager();
    manager.add_version(&db, &comp(1)).unwrap();

    let pks: PrimaryKeyValues = vec![("COMP_ID", "com001")].into_iter().collect();
    let expected = Version::new("EXCLUSIVE_COMP_MST", "VERSION", pks, "1");
    manager.check_versions(&db, &[expected]).unwrap();
}

#[test]
fn add_check_update_check_single_row() {
    let conn = create_db();
    let db = SqliteConnection::new(&conn);
    let manager = create_manager();
    let ctx = dummy_mst().context(["x"]).unwrap();

    manager.add_version(&db, &ctx).unwrap();
    manager
        .check_versions(&db, &[Version::from_context(&ctx, "1")])
        .unwrap();
    manager.update_version(&db, &ctx).unwrap();

    let err = manager
        .check_versions(&db, &[Version::from_context(&ctx, "1")])
        .unwrap_err();
    let failures = err.as_optimistic_lock().unwrap().failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(key_of(&failures[0], "PK1"), "x");
}

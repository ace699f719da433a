//! Version row lifecycle: add, get, update, remove

use crate::*;

#[test]
fn add_then_get_returns_initial_version() {
    let conn = create_db();
    let db = SqliteConnection::new(&conn);
    let manager = create_manager();
    let ctx = user(1);

    assert!(user_versions(&conn).is_empty());
    manager.add_version(&db, &ctx).unwrap();
    assert_eq!(user_versions(&conn), vec![("uid001".to_string(), 1)]);

    // The caller's context is left untouched
    assert_eq!(ctx.primary_keys().len(), 3);
    assert_eq!(key_of(&Version::from_context(&ctx, "0"), "USER_ID"), "uid001");

    let version = manager.get_version(&db, &ctx).unwrap().unwrap();
    assert_eq!(version.table_name(), "EXCLUSIVE_USER_MST");
    assert_eq!(version.version(), "1");
    assert_eq!(key_of(&version, "USER_ID"), "uid001");
    assert_eq!(key_of(&version, "PK2"), "pk2001");
    assert_eq!(key_of(&version, "PK3"), "pk3001");

    let text = version.to_string();
    assert!(text.contains("table_name = [EXCLUSIVE_USER_MST], version = [1], primary_keys = ["));
    assert!(text.contains("USER_ID=uid001"));
    assert!(text.contains("PK3=pk3001"));
}

#[test]
fn update_increments_stored_version() {
    let conn = create_db();
    let db = SqliteConnection::new(&conn);
    let manager = create_manager();

    manager.add_version(&db, &user(1)).unwrap();
    manager.update_version(&db, &user(1)).unwrap();

    assert_eq!(user_versions(&conn), vec![("uid001".to_string(), 2)]);
    let version = manager.get_version(&db, &user(1)).unwrap().unwrap();
    assert_eq!(version.version(), "2");
}

#[test]
fn remove_deletes_only_the_addressed_row() {
    let conn = create_db();
    let db = SqliteConnection::new(&conn);
    let manager = create_manager();

    manager.add_version(&db, &user(1)).unwrap();
    manager.add_version(&db, &user(2)).unwrap();
    manager.remove_version(&db, &user(1)).unwrap();

    assert_eq!(user_versions(&conn), vec![("uid002".to_string(), 1)]);
    assert!(manager.get_version(&db, &user(1)).unwrap().is_none());
}

#[test]
fn get_missing_row_returns_none() {
    let conn = create_db();
    let db = SqliteConnection::new(&conn);
    let manager = create_manager();
    let ctx = user_mst().context(["xxxxxx", "yyyyyy", "zzzzzz"]).unwrap();
    assert!(manager.get_version(&db, &ctx).unwrap().is_none());
}

#[test]
fn single_column_key_table() {
    let conn = create_db();
    let db = SqliteConnection::new(&conn);
    let manager = create_manager();
    let ctx = dummy_mst().context(["d1"]).unwrap();

    manager.add_version(&db, &ctx).unwrap();
    manager.update_version(&db, &ctx).unwrap();
    manager.update_version(&db, &ctx).unwrap();

    let version = manager.get_version(&db, &ctx).unwrap().unwrap();
    assert_eq!(version.version(), "3");
    manager.remove_version(&db, &ctx).unwrap();
    assert!(manager.get_version(&db, &ctx).unwrap().is_none());
}

#[test]
fn duplicate_add_surfaces_database_error() {
    let conn = create_db();
    let db = SqliteConnection::new(&conn);
    let manager = create_manager();

    manager.add_version(&db, &comp(1)).unwrap();
    let err = manager.add_version(&db, &comp(1)).unwrap_err();
    assert!(matches!(err, Error::Database(_)));
    assert!(!err.is_conflict());
}

#[test]
fn custom_initial_version() {
    let conn = create_db();
    let db = SqliteConnection::new(&conn);
    let manager = ExclusiveControlManager::builder()
        .cache(Arc::new(exclusive_control::DescriptorCache::new()))
        .initial_version("100")
        .build()
        .unwrap();

    manager.add_version(&db, &comp(1)).unwrap();
    manager.update_version(&db, &comp(1)).unwrap();
    assert_eq!(comp_versions(&conn), vec![("com001".to_string(), 101)]);
}

#[test]
fn operations_run_inside_caller_transaction() {
    let mut conn = create_db();
    let manager = create_manager();

    manager
        .add_version(&SqliteConnection::new(&conn), &comp(1))
        .unwrap();

    let tx = conn.transaction().unwrap();
    let db = SqliteConnection::from(&tx);
    manager.update_version(&db, &comp(1)).unwrap();
    manager.add_version(&db, &comp(2)).unwrap();
    tx.rollback().unwrap();

    assert_eq!(comp_versions(&conn), vec![("com001".to_string(), 1)]);

    let tx = conn.transaction().unwrap();
    manager
        .update_version(&SqliteConnection::from(&tx), &comp(1))
        .unwrap();
    tx.commit().unwrap();

    assert_eq!(comp_versions(&conn), vec![("com001".to_string(), 2)]);
}

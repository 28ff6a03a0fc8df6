//! Configuration and persistent store integration tests

use std::io::Write;

use calendar_sync::config::Config;
use calendar_sync::database::{CalendarStore, SqliteCalendarStore};
use calendar_sync::error::StoreError;
use calendar_sync::models::CalendarItem;
use tempfile::{NamedTempFile, TempDir};

/// Test 1: Configuration file drives store location and sync policy
#[tokio::test]
async fn test_config_file_and_store_on_disk() {
    let data_dir = TempDir::new().unwrap();
    let db_path = data_dir.path().join("calendars.db");

    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        "sync:\n  max_retries: 5\n  jitter: false\ndatabase:\n  path: {}\n",
        db_path.display()
    )
    .unwrap();

    let config = Config::from_file(file.path()).unwrap();
    assert_eq!(config.sync.max_retries, 5);
    assert!(!config.sync.jitter);
    assert_eq!(config.sync.initial_retry_delay_ms, 1000);

    {
        let store = SqliteCalendarStore::new(&config.database.path).await.unwrap();
        let item = CalendarItem::new("work", "Work", "https://example.com/work.ics");
        store.put_item(&item).await.unwrap();
    }

    // Reopen: data survives
    let store = SqliteCalendarStore::new(&config.database.path).await.unwrap();
    let items = store.list_items().await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id, "work");
    assert!(items[0].created_at.is_some());
}

/// Test 2: Store lifecycle used by the CLI
#[tokio::test]
async fn test_store_lifecycle() {
    let store = SqliteCalendarStore::in_memory().await.unwrap();

    store
        .put_item(&CalendarItem::new("a", "A", "https://example.com/a.ics"))
        .await
        .unwrap();
    store
        .put_item(&CalendarItem::new("b", "B", "https://example.com/b.ics").with_active(false))
        .await
        .unwrap();

    let duplicate = store
        .put_item(&CalendarItem::new("a", "Again", "https://example.com/a2.ics"))
        .await;
    assert!(matches!(duplicate, Err(StoreError::ConstraintViolation(_))));

    let active = store.find_active_items().await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, "a");
    assert_eq!(store.list_items().await.unwrap().len(), 2);

    store.delete_item("a").await.unwrap();
    assert!(store.get_item("a").await.unwrap().is_none());
    assert!(matches!(
        store.delete_item("a").await,
        Err(StoreError::NotFound(_))
    ));
}

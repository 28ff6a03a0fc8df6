//! Common test utilities and helpers for integration tests

#![allow(dead_code)]

use std::sync::Arc;

use calendar_sync::cache::{FeedCache, FilesystemFeedCache};
use calendar_sync::config::Config;
use calendar_sync::database::{CalendarStore, SqliteCalendarStore};
use calendar_sync::models::CalendarItem;
use calendar_sync::sync::{BatchSyncOrchestrator, FeedFetcher, ReqwestTransport, SingleItemSyncer};
use tempfile::TempDir;

/// Minimal valid iCalendar body
pub const FEED_BODY: &str = "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:-//test//EN\r\nEND:VCALENDAR\r\n";

/// Create an in-memory store for testing
pub async fn create_test_store() -> Arc<SqliteCalendarStore> {
    Arc::new(
        SqliteCalendarStore::in_memory()
            .await
            .expect("Failed to create test store"),
    )
}

/// Configuration with fast retries and the cache in `cache_dir`
pub fn create_test_config(cache_dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.sync.max_retries = 2;
    config.sync.initial_retry_delay_ms = 10;
    config.sync.max_retry_delay_ms = 50;
    config.sync.request_timeout_secs = 5;
    config.sync.jitter = false;
    config.http.user_agent = "calendar-sync-test/1.0".to_string();
    config.cache.calendar_cache_dir = cache_dir.path().to_string_lossy().into_owned();
    config
}

/// Wire an orchestrator over a real transport, store and cache
pub fn create_test_orchestrator(
    store: Arc<SqliteCalendarStore>,
    config: &Config,
) -> BatchSyncOrchestrator {
    let store: Arc<dyn CalendarStore> = store;
    let cache: Arc<dyn FeedCache> =
        Arc::new(FilesystemFeedCache::new(&config.cache.calendar_cache_dir));
    let fetcher = FeedFetcher::from_config(
        Arc::new(ReqwestTransport::new().expect("Failed to create transport")),
        config,
    );
    let syncer = SingleItemSyncer::new(
        fetcher,
        Arc::clone(&store),
        Arc::clone(&cache),
        config.sync.clone(),
    );
    BatchSyncOrchestrator::new(store, Arc::new(syncer), cache)
}

/// Insert a calendar pointing at `base_url/<id>.ics`
pub async fn add_calendar(store: &SqliteCalendarStore, base_url: &str, id: &str) -> CalendarItem {
    let item = CalendarItem::new(id, format!("Calendar {}", id), format!("{}/{}.ics", base_url, id));
    store.put_item(&item).await.expect("Failed to add calendar");
    item
}

//! Calendar store for calendar-sync
//!
//! This module defines the store trait the sync engine reads calendars from
//! and writes sync metadata to, plus its SQLite implementation.

pub mod migrations;
pub mod sqlite;

pub use sqlite::SqliteCalendarStore;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::models::CalendarItem;

/// Persistent record store for calendars, keyed by calendar id
///
/// Each call is one atomic write or read. It uses `async_trait` for async
/// methods and `mockall::automock` for testing.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CalendarStore: Send + Sync {
    /// All active calendars, in a stable order
    async fn find_active_items(&self) -> Result<Vec<CalendarItem>, StoreError>;

    /// Insert or replace a calendar by id
    async fn update_item(&self, item: &CalendarItem) -> Result<(), StoreError>;

    /// Insert a new calendar; fails if the id already exists
    async fn put_item(&self, item: &CalendarItem) -> Result<(), StoreError>;

    /// Get a calendar by id
    async fn get_item(&self, id: &str) -> Result<Option<CalendarItem>, StoreError>;

    /// All calendars, active or not
    async fn list_items(&self) -> Result<Vec<CalendarItem>, StoreError>;

    /// Delete a calendar by id
    async fn delete_item(&self, id: &str) -> Result<(), StoreError>;
}

//! SQLite implementation of the CalendarStore trait
//!
//! This module provides a SQLite-based implementation of the CalendarStore trait
//! using rusqlite and tokio-rusqlite for async operations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{ErrorCode, OptionalExtension};
use tokio_rusqlite::Connection;

use super::migrations::CREATE_SCHEMA;
use super::CalendarStore;
use crate::error::StoreError;
use crate::models::CalendarItem;

const SELECT_COLUMNS: &str =
    "SELECT id, name, url, is_active, failure_count, last_success_at, created_at FROM calendars";

/// SQLite calendar store
pub struct SqliteCalendarStore {
    conn: Connection,
}

impl SqliteCalendarStore {
    /// Open a SQLite calendar store
    ///
    /// Use `:memory:` for in-memory database or a file path for persistent storage.
    pub async fn new(path: &str) -> Result<Self, StoreError> {
        let conn = Connection::open(path).await?;

        conn.call(|conn| {
            conn.execute_batch(CREATE_SCHEMA)?;
            Ok::<_, rusqlite::Error>(())
        })
        .await?;

        Ok(Self { conn })
    }

    /// Create a new in-memory store (useful for testing)
    pub async fn in_memory() -> Result<Self, StoreError> {
        Self::new(":memory:").await
    }

    async fn query_items(&self, sql: String) -> Result<Vec<CalendarItem>, StoreError> {
        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&sql)?;
                let items = stmt
                    .query_map([], row_to_item)?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok::<_, rusqlite::Error>(items)
            })
            .await
            .map_err(Into::into)
    }
}

#[async_trait]
impl CalendarStore for SqliteCalendarStore {
    async fn find_active_items(&self) -> Result<Vec<CalendarItem>, StoreError> {
        self.query_items(format!("{} WHERE is_active = 1 ORDER BY rowid", SELECT_COLUMNS))
            .await
    }

    async fn update_item(&self, item: &CalendarItem) -> Result<(), StoreError> {
        let item = item.clone();

        self.conn
            .call(move |conn| {
                conn.execute(
                    r#"
                    INSERT INTO calendars
                    (id, name, url, is_active, failure_count, last_success_at)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                    ON CONFLICT(id) DO UPDATE SET
                        name = excluded.name,
                        url = excluded.url,
                        is_active = excluded.is_active,
                        failure_count = excluded.failure_count,
                        last_success_at = excluded.last_success_at
                    "#,
                    rusqlite::params![
                        item.id,
                        item.name,
                        item.url,
                        item.is_active,
                        item.failure_count,
                        item.last_success_at.map(|t| t.to_rfc3339())
                    ],
                )?;
                Ok::<_, rusqlite::Error>(())
            })
            .await?;

        Ok(())
    }

    async fn put_item(&self, item: &CalendarItem) -> Result<(), StoreError> {
        let item = item.clone();
        let id = item.id.clone();

        let result = self
            .conn
            .call(move |conn| {
                conn.execute(
                    r#"
                    INSERT INTO calendars
                    (id, name, url, is_active, failure_count, last_success_at)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                    "#,
                    rusqlite::params![
                        item.id,
                        item.name,
                        item.url,
                        item.is_active,
                        item.failure_count,
                        item.last_success_at.map(|t| t.to_rfc3339())
                    ],
                )?;
                Ok::<_, rusqlite::Error>(())
            })
            .await;

        match result {
            Ok(()) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation =>
            {
                Err(StoreError::ConstraintViolation(format!(
                    "calendar '{}' already exists",
                    id
                )))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get_item(&self, id: &str) -> Result<Option<CalendarItem>, StoreError> {
        let id = id.to_string();
        let sql = format!("{} WHERE id = ?1", SELECT_COLUMNS);

        self.conn
            .call(move |conn| {
                let item = conn.query_row(&sql, [&id], row_to_item).optional()?;
                Ok::<_, rusqlite::Error>(item)
            })
            .await
            .map_err(Into::into)
    }

    async fn list_items(&self) -> Result<Vec<CalendarItem>, StoreError> {
        self.query_items(format!("{} ORDER BY rowid", SELECT_COLUMNS))
            .await
    }

    async fn delete_item(&self, id: &str) -> Result<(), StoreError> {
        let id = id.to_string();
        let missing = id.clone();

        let deleted = self
            .conn
            .call(move |conn| {
                let n = conn.execute("DELETE FROM calendars WHERE id = ?1", [&id])?;
                Ok::<_, rusqlite::Error>(n)
            })
            .await?;

        if deleted == 0 {
            return Err(StoreError::NotFound(missing));
        }
        Ok(())
    }
}

fn row_to_item(row: &rusqlite::Row<'_>) -> rusqlite::Result<CalendarItem> {
    Ok(CalendarItem {
        id: row.get(0)?,
        name: row.get(1)?,
        url: row.get(2)?,
        is_active: row.get(3)?,
        failure_count: row.get(4)?,
        last_success_at: parse_datetime(row.get::<_, Option<String>>(5)?),
        created_at: parse_datetime(row.get::<_, Option<String>>(6)?),
    })
}

/// Parse datetime string from SQLite
fn parse_datetime(s: Option<String>) -> Option<DateTime<Utc>> {
    s.and_then(|s| {
        DateTime::parse_from_rfc3339(&s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
            .or_else(|| {
                // SQLite's CURRENT_TIMESTAMP format
                chrono::NaiveDateTime::parse_from_str(&s, "%Y-%m-%d %H:%M:%S")
                    .ok()
                    .map(|dt| dt.and_utc())
            })
    })
}

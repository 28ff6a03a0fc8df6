//! Calendar feed model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A remote calendar feed tracked for synchronization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarItem {
    /// Unique identifier, also used as the cache file stem
    pub id: String,

    /// Display name
    pub name: String,

    /// Feed URL
    pub url: String,

    /// Whether the calendar takes part in batch syncs
    pub is_active: bool,

    /// Consecutive failed syncs since the last success
    pub failure_count: u32,

    /// When the feed was last downloaded successfully
    pub last_success_at: Option<DateTime<Utc>>,

    /// When the record was created
    pub created_at: Option<DateTime<Utc>>,
}

impl CalendarItem {
    /// Create a new active calendar with a clean sync history
    pub fn new(id: impl Into<String>, name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            url: url.into(),
            is_active: true,
            failure_count: 0,
            last_success_at: None,
            created_at: None,
        }
    }

    /// Set the active flag
    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    /// Record a successful sync at `now`
    pub fn mark_synced(&mut self, now: DateTime<Utc>) {
        self.failure_count = 0;
        self.last_success_at = Some(now);
    }

    /// Record a terminal sync failure
    pub fn record_failure(&mut self) {
        self.failure_count = self.failure_count.saturating_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_calendar_is_active_and_clean() {
        let item = CalendarItem::new("work", "Work", "https://example.com/work.ics");

        assert!(item.is_active);
        assert_eq!(item.failure_count, 0);
        assert!(item.last_success_at.is_none());
        assert!(!item.clone().with_active(false).is_active);
    }

    #[test]
    fn test_mark_synced_resets_failures() {
        let mut item = CalendarItem::new("work", "Work", "https://example.com/work.ics");
        item.record_failure();
        item.record_failure();
        assert_eq!(item.failure_count, 2);

        let now = Utc::now();
        item.mark_synced(now);

        assert_eq!(item.failure_count, 0);
        assert_eq!(item.last_success_at, Some(now));
    }

    #[test]
    fn test_record_failure_saturates() {
        let mut item = CalendarItem::new("x", "X", "https://example.com/x.ics");
        item.failure_count = u32::MAX;
        item.record_failure();
        assert_eq!(item.failure_count, u32::MAX);
    }
}

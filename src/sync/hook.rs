//! Downstream update hook
//!
//! After a feed is downloaded, a consumer (for example an ICS parser feeding
//! an event store) may replace the records it derived from the previous
//! version. Hook failures are logged by the caller and never fail a sync.

use std::path::Path;

use async_trait::async_trait;

use crate::error::HookError;
use crate::models::CalendarItem;

/// Consumer of freshly downloaded feeds
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DownstreamHook: Send + Sync {
    /// Replace the records derived from `item` with those in the feed at `feed_path`
    async fn apply(&self, item: &CalendarItem, feed_path: &Path) -> Result<(), HookError>;

    /// Remove every record derived from `item`
    async fn purge(&self, item: &CalendarItem) -> Result<(), HookError>;
}

/// Hook that does nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHook;

#[async_trait]
impl DownstreamHook for NoopHook {
    async fn apply(&self, _item: &CalendarItem, _feed_path: &Path) -> Result<(), HookError> {
        Ok(())
    }

    async fn purge(&self, _item: &CalendarItem) -> Result<(), HookError> {
        Ok(())
    }
}

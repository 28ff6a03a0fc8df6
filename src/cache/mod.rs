//! Feed cache for calendar-sync
//!
//! Downloaded feed bodies are kept on disk, one `<calendar id>.ics` file per
//! calendar, so downstream consumers can parse them without refetching.

mod filesystem;

use std::collections::HashSet;
use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::CacheError;

pub use filesystem::FilesystemFeedCache;

/// File extension of cached feeds
pub const FEED_EXTENSION: &str = "ics";

/// Storage for downloaded calendar feeds
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FeedCache: Send + Sync {
    /// Path the feed of `calendar_id` is (or would be) stored at
    fn path_for(&self, calendar_id: &str) -> Result<PathBuf, CacheError>;

    /// Store a feed body, replacing any previous one, and return its path
    async fn write(&self, calendar_id: &str, body: &Bytes) -> Result<PathBuf, CacheError>;

    /// Delete cached feeds whose calendar id is not in `active_ids`
    ///
    /// Returns the number of deleted files.
    async fn cleanup(&self, active_ids: &HashSet<String>) -> Result<usize, CacheError>;
}

/// Reject ids that cannot be used as a single file name
pub(crate) fn validate_key(calendar_id: &str) -> Result<(), CacheError> {
    if calendar_id.is_empty()
        || calendar_id == "."
        || calendar_id.contains("..")
        || calendar_id.contains('/')
        || calendar_id.contains('\\')
        || calendar_id.contains('\0')
    {
        return Err(CacheError::InvalidKey(calendar_id.to_string()));
    }
    Ok(())
}

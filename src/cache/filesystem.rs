//! Filesystem-based feed cache
//!
//! Each feed is stored as `<base_path>/<calendar id>.ics`. The directory is
//! created on first write.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tracing::{debug, warn};

use crate::error::CacheError;

use super::{validate_key, FeedCache, FEED_EXTENSION};

/// Filesystem-based feed cache
#[derive(Debug, Clone)]
pub struct FilesystemFeedCache {
    base_path: PathBuf,
}

impl FilesystemFeedCache {
    /// Creates a cache rooted at `base_path`
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Returns the base path for cache storage
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}

#[async_trait]
impl FeedCache for FilesystemFeedCache {
    fn path_for(&self, calendar_id: &str) -> Result<PathBuf, CacheError> {
        validate_key(calendar_id)?;
        Ok(self
            .base_path
            .join(format!("{}.{}", calendar_id, FEED_EXTENSION)))
    }

    async fn write(&self, calendar_id: &str, body: &Bytes) -> Result<PathBuf, CacheError> {
        let path = self.path_for(calendar_id)?;
        fs::create_dir_all(&self.base_path).await?;

        // Write to a temp file first so readers never see a partial feed
        let temp_path = path.with_extension(format!("{}.tmp", FEED_EXTENSION));
        fs::write(&temp_path, body).await?;
        fs::rename(&temp_path, &path).await?;

        debug!(
            calendar_id = calendar_id,
            path = %path.display(),
            size = body.len(),
            "Cached calendar feed"
        );
        Ok(path)
    }

    async fn cleanup(&self, active_ids: &HashSet<String>) -> Result<usize, CacheError> {
        if !fs::try_exists(&self.base_path).await? {
            return Ok(0);
        }

        let mut entries = fs::read_dir(&self.base_path).await?;
        let mut removed = 0;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(FEED_EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if active_ids.contains(stem) {
                continue;
            }

            match fs::remove_file(&path).await {
                Ok(()) => {
                    debug!(path = %path.display(), "Removed stale calendar feed");
                    removed += 1;
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to remove stale feed");
                }
            }
        }

        Ok(removed)
    }
}

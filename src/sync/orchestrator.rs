//! Batch sync of every active calendar
//!
//! Items are synced one after another in store order. Each item runs in its
//! own task so a panic while syncing one calendar is recorded as that
//! calendar's failure instead of aborting the batch.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::cache::FeedCache;
use crate::database::CalendarStore;
use crate::error::StoreError;
use crate::models::{BatchResult, CalendarItem, ItemSyncError, SyncOutcome, SyncProgress};

use super::progress::{ProgressBroadcaster, ProgressSubscription};
use super::syncer::SingleItemSyncer;

/// Callback invoked after every item with `(synced, total)`
pub type ProgressCallback = dyn Fn(usize, usize) + Send + Sync;

/// Drives a full sync of all active calendars
pub struct BatchSyncOrchestrator {
    store: Arc<dyn CalendarStore>,
    syncer: Arc<SingleItemSyncer>,
    cache: Arc<dyn FeedCache>,
    progress: ProgressBroadcaster,
}

impl BatchSyncOrchestrator {
    /// Create an orchestrator with a fresh progress broadcaster
    pub fn new(
        store: Arc<dyn CalendarStore>,
        syncer: Arc<SingleItemSyncer>,
        cache: Arc<dyn FeedCache>,
    ) -> Self {
        Self {
            store,
            syncer,
            cache,
            progress: ProgressBroadcaster::new(),
        }
    }

    /// Progress broadcaster for this orchestrator
    pub fn progress(&self) -> &ProgressBroadcaster {
        &self.progress
    }

    /// Shorthand for `progress().subscribe()`
    pub fn subscribe(&self) -> ProgressSubscription {
        self.progress.subscribe()
    }

    /// Sync every active calendar
    ///
    /// Per-calendar failures are reported in the result. Only a failure to
    /// list the active calendars is returned as an error.
    pub async fn sync_all(
        &self,
        on_progress: Option<&ProgressCallback>,
    ) -> Result<BatchResult, StoreError> {
        let items = match self.store.find_active_items().await {
            Ok(items) => items,
            Err(e) => {
                error!(error = %e, "Failed to list active calendars");
                self.progress.emit(SyncProgress::failed(ItemSyncError::new(
                    "",
                    "",
                    format!("Failed to list active calendars: {}", e),
                )));
                return Err(e);
            }
        };

        let total = items.len();
        info!(total_calendars = total, "Starting calendar sync");
        self.progress
            .emit(SyncProgress::in_progress(total, 0, 0, Vec::new()));

        let mut synced = 0usize;
        let mut failed = 0usize;
        let mut errors = Vec::new();

        for item in &items {
            let outcome = self.sync_isolated(item).await;

            if outcome.success {
                synced += 1;
            } else {
                failed += 1;
                let message = outcome
                    .error
                    .unwrap_or_else(|| "Unknown error".to_string());
                errors.push(ItemSyncError::new(&item.id, &item.name, message));
            }

            if let Some(callback) = on_progress {
                callback(synced, total);
            }
            self.progress
                .emit(SyncProgress::in_progress(total, synced, failed, errors.clone()));
        }

        let active: HashSet<String> = items.into_iter().map(|item| item.id).collect();
        match self.cache.cleanup(&active).await {
            Ok(0) => {}
            Ok(removed) => debug!(removed = removed, "Removed stale cached feeds"),
            Err(e) => warn!(error = %e, "Failed to clean up cached feeds"),
        }

        self.progress
            .emit(SyncProgress::finished(total, synced, failed, errors.clone()));

        info!(
            total_calendars = total,
            synced = synced,
            failed = failed,
            "Calendar sync finished"
        );

        Ok(BatchResult::new(synced, failed, errors))
    }

    /// Sync a single calendar by id, whether or not it is active
    pub async fn sync_calendar(&self, id: &str) -> Result<SyncOutcome, StoreError> {
        let item = self
            .store
            .get_item(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        Ok(self.sync_isolated(&item).await)
    }

    async fn sync_isolated(&self, item: &CalendarItem) -> SyncOutcome {
        let syncer = Arc::clone(&self.syncer);
        let owned = item.clone();
        let handle = tokio::spawn(async move { syncer.sync_item(&owned).await });

        match handle.await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(calendar_id = %item.id, error = %e, "Calendar sync task failed");
                SyncOutcome::failure(format!("Unexpected error: {}", e), 0)
            }
        }
    }
}

impl std::fmt::Debug for BatchSyncOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchSyncOrchestrator")
            .field("syncer", &self.syncer)
            .field("progress", &self.progress)
            .finish_non_exhaustive()
    }
}

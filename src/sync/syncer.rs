//! Single calendar sync with retry
//!
//! Downloads one feed through up to `max_retries + 1` attempts, waiting
//! [`BackoffPolicy::delay`] between them, then records the terminal outcome
//! on the calendar exactly once.

use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::cache::FeedCache;
use crate::config::SyncConfig;
use crate::database::CalendarStore;
use crate::models::{CalendarItem, SyncOutcome};

use super::backoff::BackoffPolicy;
use super::guard::ItemSyncGuard;
use super::hook::{DownstreamHook, NoopHook};
use super::http_client::{AttemptOutcome, FeedFetcher};

/// Syncs one calendar at a time, guarding against duplicate in-flight syncs
pub struct SingleItemSyncer {
    fetcher: FeedFetcher,
    backoff: BackoffPolicy,
    guard: ItemSyncGuard,
    store: Arc<dyn CalendarStore>,
    cache: Arc<dyn FeedCache>,
    hook: Arc<dyn DownstreamHook>,
    config: SyncConfig,
}

impl SingleItemSyncer {
    /// Create a syncer with backoff taken from `config` and no downstream hook
    pub fn new(
        fetcher: FeedFetcher,
        store: Arc<dyn CalendarStore>,
        cache: Arc<dyn FeedCache>,
        config: SyncConfig,
    ) -> Self {
        Self {
            fetcher,
            backoff: BackoffPolicy::from_config(&config),
            guard: ItemSyncGuard::new(),
            store,
            cache,
            hook: Arc::new(NoopHook),
            config,
        }
    }

    /// Replace the backoff policy
    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    /// Share an existing in-flight guard
    pub fn with_guard(mut self, guard: ItemSyncGuard) -> Self {
        self.guard = guard;
        self
    }

    /// Install the downstream update hook
    ///
    /// It only runs when `enable_downstream_update` is set.
    pub fn with_downstream_hook(mut self, hook: Arc<dyn DownstreamHook>) -> Self {
        self.hook = hook;
        self
    }

    /// In-flight guard used by this syncer
    pub fn guard(&self) -> &ItemSyncGuard {
        &self.guard
    }

    /// Sync configuration
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Download, cache and record one calendar
    ///
    /// Never fails: every error is reported in the returned outcome.
    pub async fn sync_item(&self, item: &CalendarItem) -> SyncOutcome {
        let Some(_lease) = self.guard.lease(&item.id) else {
            return SyncOutcome::already_syncing();
        };

        let max_attempts = self.config.max_retries.saturating_add(1);
        let mut attempts = 0u32;
        let mut last_error = None;

        while attempts < max_attempts {
            let attempt = attempts;
            attempts += 1;

            match self.fetcher.attempt(&item.url).await {
                AttemptOutcome::Success(body) => {
                    return self.finish_success(item, body, attempts).await;
                }
                AttemptOutcome::Fatal(err) => {
                    warn!(
                        calendar_id = %item.id,
                        attempt = attempts,
                        error = %err,
                        "Non-retryable fetch error"
                    );
                    last_error = Some(err);
                    break;
                }
                AttemptOutcome::Retryable(err) => {
                    if attempts < max_attempts {
                        let backoff = self.backoff.delay(attempt);
                        debug!(
                            calendar_id = %item.id,
                            attempt = attempts,
                            max_retries = self.config.max_retries,
                            backoff_ms = backoff.as_millis() as u64,
                            error = %err,
                            "Retrying after transient error"
                        );
                        tokio::time::sleep(backoff).await;
                    }
                    last_error = Some(err);
                }
            }
        }

        let reason = last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no attempt made".to_string());
        let message = format!("Failed after {} retries: {}", attempts - 1, reason);
        self.finish_failure(item, message, attempts).await
    }

    async fn finish_success(&self, item: &CalendarItem, body: Bytes, attempts: u32) -> SyncOutcome {
        let size = body.len();
        let feed_path = match self.cache.write(&item.id, &body).await {
            Ok(path) => path,
            Err(e) => {
                let message = format!("Failed to cache feed: {}", e);
                return self.finish_failure(item, message, attempts).await;
            }
        };

        if self.config.enable_downstream_update {
            self.apply_downstream(item, &feed_path).await;
        }

        let mut updated = item.clone();
        updated.mark_synced(Utc::now());
        if let Err(e) = self.store.update_item(&updated).await {
            error!(calendar_id = %item.id, error = %e, "Failed to persist calendar state");
            return SyncOutcome::failure(
                format!("Failed to persist calendar state: {}", e),
                attempts,
            );
        }

        info!(
            calendar_id = %item.id,
            attempts = attempts,
            body_size = size,
            "Calendar synced"
        );
        SyncOutcome::success(attempts)
    }

    async fn finish_failure(&self, item: &CalendarItem, message: String, attempts: u32) -> SyncOutcome {
        let mut updated = item.clone();
        updated.record_failure();
        if let Err(e) = self.store.update_item(&updated).await {
            error!(calendar_id = %item.id, error = %e, "Failed to persist calendar state");
        }

        if self.config.enable_downstream_update && self.config.purge_on_failure {
            if let Err(e) = self.hook.purge(item).await {
                warn!(calendar_id = %item.id, error = %e, "Downstream purge failed");
            }
        }

        warn!(
            calendar_id = %item.id,
            attempts = attempts,
            failure_count = updated.failure_count,
            error = %message,
            "Calendar sync failed"
        );
        SyncOutcome::failure(message, attempts)
    }

    async fn apply_downstream(&self, item: &CalendarItem, feed_path: &Path) {
        if let Err(e) = self.hook.apply(item, feed_path).await {
            warn!(calendar_id = %item.id, error = %e, "Downstream update failed");
        }
    }
}

impl std::fmt::Debug for SingleItemSyncer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SingleItemSyncer")
            .field("fetcher", &self.fetcher)
            .field("backoff", &self.backoff)
            .field("guard", &self.guard)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

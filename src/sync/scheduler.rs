//! Sync scheduler for periodic calendar synchronization
//!
//! This module provides a scheduler that runs a full batch sync after an
//! initial delay and then once per interval, with jitter so that many
//! instances do not hit the same feed servers at once. Manual triggers are
//! served on the same loop, so batches never overlap.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::{broadcast, mpsc, RwLock};
use tokio::time::{interval_at, Instant};
use tracing::{debug, info, warn};

use crate::config::SchedulerSettings;
use crate::error::SchedulerError;
use crate::models::BatchResult;

use super::orchestrator::BatchSyncOrchestrator;

/// Configuration for the sync scheduler
#[derive(Debug, Clone, PartialEq)]
pub struct SchedulerConfig {
    /// Initial delay before the first batch (seconds)
    pub initial_delay_secs: u64,
    /// Interval between scheduled batches (seconds)
    pub interval_secs: u64,
    /// Jitter range (seconds) - randomization added to each scheduled batch
    pub jitter_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::from(&SchedulerSettings::default())
    }
}

impl From<&SchedulerSettings> for SchedulerConfig {
    fn from(settings: &SchedulerSettings) -> Self {
        Self {
            initial_delay_secs: settings.initial_delay_secs,
            interval_secs: settings.interval_secs,
            jitter_secs: settings.jitter_secs,
        }
    }
}

impl SchedulerConfig {
    fn interval(&self) -> Duration {
        // interval_at panics on a zero period
        Duration::from_secs(self.interval_secs.max(1))
    }

    fn jitter(&self) -> Duration {
        if self.jitter_secs == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs(rand::thread_rng().gen_range(0..self.jitter_secs))
    }
}

type LastResult = Arc<RwLock<Option<BatchResult>>>;

/// Manual sync request
struct ManualSyncRequest {
    response: mpsc::Sender<Result<BatchResult, SchedulerError>>,
}

/// Periodic driver for [`BatchSyncOrchestrator`]
pub struct SyncScheduler {
    config: SchedulerConfig,
    orchestrator: Arc<BatchSyncOrchestrator>,
    last_result: LastResult,
    shutdown_rx: broadcast::Receiver<()>,
    manual_sync_rx: mpsc::Receiver<ManualSyncRequest>,
    manual_sync_tx: mpsc::Sender<ManualSyncRequest>,
}

impl SyncScheduler {
    /// Create a new sync scheduler
    ///
    /// # Arguments
    ///
    /// * `config` - Scheduler configuration
    /// * `orchestrator` - Batch orchestrator to drive
    /// * `shutdown_rx` - Broadcast receiver for shutdown signal
    pub fn new(
        config: SchedulerConfig,
        orchestrator: Arc<BatchSyncOrchestrator>,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Self {
        let (manual_sync_tx, manual_sync_rx) = mpsc::channel(8);

        Self {
            config,
            orchestrator,
            last_result: Arc::new(RwLock::new(None)),
            shutdown_rx,
            manual_sync_rx,
            manual_sync_tx,
        }
    }

    /// Get a handle for triggering manual syncs
    pub fn manual_sync_handle(&self) -> ManualSyncHandle {
        ManualSyncHandle {
            tx: self.manual_sync_tx.clone(),
            last_result: Arc::clone(&self.last_result),
        }
    }

    /// Result of the most recent successful batch
    pub async fn last_result(&self) -> Option<BatchResult> {
        self.last_result.read().await.clone()
    }

    /// Run the scheduler until the shutdown signal is received
    pub async fn run(mut self) {
        info!(
            interval_secs = self.config.interval_secs,
            jitter_secs = self.config.jitter_secs,
            "Starting sync scheduler"
        );

        if self.config.initial_delay_secs > 0 {
            debug!(
                delay_secs = self.config.initial_delay_secs,
                "Waiting for initial delay"
            );
            let delay = tokio::time::sleep(Duration::from_secs(self.config.initial_delay_secs));
            tokio::select! {
                _ = self.shutdown_rx.recv() => {
                    info!("Shutdown signal received before first sync");
                    return;
                }
                _ = delay => {}
            }
        }

        info!("Performing initial sync");
        let _ = self.perform_sync().await;

        let interval = self.config.interval();
        let mut timer = interval_at(Instant::now() + interval, interval);

        loop {
            tokio::select! {
                _ = self.shutdown_rx.recv() => {
                    info!("Shutdown signal received, stopping sync scheduler");
                    break;
                }
                Some(request) = self.manual_sync_rx.recv() => {
                    info!("Manual sync triggered");
                    let result = self.perform_sync().await;
                    let _ = request.response.send(result).await;
                }
                _ = timer.tick() => {
                    let jitter = self.config.jitter();
                    if !jitter.is_zero() {
                        debug!(jitter_secs = jitter.as_secs(), "Delaying scheduled sync");
                        tokio::time::sleep(jitter).await;
                    }
                    info!("Performing scheduled sync");
                    let _ = self.perform_sync().await;
                }
            }
        }

        info!("Sync scheduler stopped");
    }

    async fn perform_sync(&self) -> Result<BatchResult, SchedulerError> {
        match self.orchestrator.sync_all(None).await {
            Ok(result) => {
                if result.failed_count > 0 {
                    warn!(
                        synced = result.synced_count,
                        failed = result.failed_count,
                        "Scheduled sync completed with errors"
                    );
                }
                *self.last_result.write().await = Some(result.clone());
                Ok(result)
            }
            Err(e) => {
                warn!(error = %e, "Scheduled sync failed");
                Err(SchedulerError::Store(e))
            }
        }
    }
}

/// Handle for triggering manual syncs
#[derive(Clone)]
pub struct ManualSyncHandle {
    tx: mpsc::Sender<ManualSyncRequest>,
    last_result: LastResult,
}

impl ManualSyncHandle {
    /// Run a batch now and wait for its result
    pub async fn trigger_sync(&self) -> Result<BatchResult, SchedulerError> {
        let (response_tx, mut response_rx) = mpsc::channel(1);

        self.tx
            .send(ManualSyncRequest {
                response: response_tx,
            })
            .await
            .map_err(|_| SchedulerError::NotRunning)?;

        response_rx
            .recv()
            .await
            .ok_or(SchedulerError::NotRunning)?
    }

    /// Result of the most recent successful batch
    pub async fn last_result(&self) -> Option<BatchResult> {
        self.last_result.read().await.clone()
    }
}

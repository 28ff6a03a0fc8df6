//! Calendar synchronization engine
//!
//! This module downloads remote calendar feeds with automatic retry,
//! guards against duplicate in-flight syncs, and reports batch progress.
//!
//! # Components
//!
//! - [`backoff`]: Exponential backoff with jitter between attempts
//! - [`guard`]: Per-calendar in-flight tracking
//! - [`http_client`]: HTTP transport and classified single attempts
//! - [`hook`]: Optional downstream consumer of downloaded feeds
//! - [`syncer`]: Retry loop for one calendar
//! - [`orchestrator`]: Sequential batch over all active calendars
//! - [`progress`]: Progress snapshot broadcasting
//! - [`scheduler`]: Periodic batches with manual triggers
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use calendar_sync::sync::{BatchSyncOrchestrator, FeedFetcher, ReqwestTransport, SingleItemSyncer};
//!
//! let fetcher = FeedFetcher::from_config(Arc::new(ReqwestTransport::new()?), &config);
//! let syncer = SingleItemSyncer::new(fetcher, store.clone(), cache.clone(), config.sync.clone());
//! let orchestrator = BatchSyncOrchestrator::new(store, Arc::new(syncer), cache);
//!
//! let mut progress = orchestrator.subscribe();
//! let result = orchestrator.sync_all(None).await?;
//! ```

pub mod backoff;
pub mod guard;
pub mod hook;
pub mod http_client;
pub mod orchestrator;
pub mod progress;
pub mod scheduler;
pub mod syncer;

// Re-export main types for convenience
pub use backoff::{BackoffPolicy, FixedJitter, JitterSource, NoJitter, RandomJitter};
pub use guard::{InFlightLease, ItemSyncGuard};
pub use hook::{DownstreamHook, NoopHook};
pub use http_client::{AttemptOutcome, FeedFetcher, HttpResponse, HttpTransport, ReqwestTransport};
pub use orchestrator::{BatchSyncOrchestrator, ProgressCallback};
pub use progress::{ProgressBroadcaster, ProgressSubscription};
pub use scheduler::{ManualSyncHandle, SchedulerConfig, SyncScheduler};
pub use syncer::SingleItemSyncer;

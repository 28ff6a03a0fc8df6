//! Progress broadcasting
//!
//! A registry of subscriber queues. Each emission is delivered to every live
//! subscriber; late subscribers only see later emissions.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc;

use crate::models::SyncProgress;

#[derive(Debug, Default)]
struct BroadcasterState {
    subscribers: Vec<mpsc::UnboundedSender<Arc<SyncProgress>>>,
    closed: bool,
}

/// Multi-subscriber channel of progress snapshots
///
/// Clones share the same subscriber list.
#[derive(Debug, Clone, Default)]
pub struct ProgressBroadcaster {
    state: Arc<Mutex<BroadcasterState>>,
}

impl ProgressBroadcaster {
    /// Create a broadcaster with no subscribers
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber for future emissions
    ///
    /// Subscribing to a closed broadcaster yields an already ended stream.
    pub fn subscribe(&self) -> ProgressSubscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = self.lock();
        if !state.closed {
            state.subscribers.push(tx);
        }
        ProgressSubscription { rx }
    }

    /// Deliver a snapshot to every live subscriber
    ///
    /// Never blocks. Dropped subscribers are pruned; emissions after
    /// [`close`](Self::close) are discarded.
    pub fn emit(&self, progress: SyncProgress) {
        let mut state = self.lock();
        if state.closed || state.subscribers.is_empty() {
            return;
        }

        let snapshot = Arc::new(progress);
        state
            .subscribers
            .retain(|tx| tx.send(Arc::clone(&snapshot)).is_ok());
    }

    /// End every subscription and drop future emissions
    pub fn close(&self) {
        let mut state = self.lock();
        state.closed = true;
        state.subscribers.clear();
    }

    /// Whether [`close`](Self::close) was called
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Number of registered subscribers
    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }

    fn lock(&self) -> MutexGuard<'_, BroadcasterState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Receiving end of a progress subscription
#[derive(Debug)]
pub struct ProgressSubscription {
    rx: mpsc::UnboundedReceiver<Arc<SyncProgress>>,
}

impl ProgressSubscription {
    /// Next snapshot, or `None` once the broadcaster is closed and drained
    pub async fn recv(&mut self) -> Option<Arc<SyncProgress>> {
        self.rx.recv().await
    }

    /// Next snapshot if one is already queued
    pub fn try_recv(&mut self) -> Option<Arc<SyncProgress>> {
        self.rx.try_recv().ok()
    }

    /// Drain every queued snapshot
    pub fn drain(&mut self) -> Vec<Arc<SyncProgress>> {
        let mut out = Vec::new();
        while let Some(p) = self.try_recv() {
            out.push(p);
        }
        out
    }
}

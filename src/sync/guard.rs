//! In-flight sync tracking
//!
//! Ensures at most one sync of a given calendar runs at a time within one
//! process. Not a cross-process lock.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;

/// Set of calendar ids with a sync in flight
///
/// Clones share the same set.
#[derive(Debug, Clone, Default)]
pub struct ItemSyncGuard {
    in_flight: Arc<Mutex<HashSet<String>>>,
}

impl ItemSyncGuard {
    /// Create an empty guard
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `id` as syncing; false if it already was
    pub fn try_acquire(&self, id: &str) -> bool {
        self.lock().insert(id.to_string())
    }

    /// Mark `id` as no longer syncing; safe to call when not held
    pub fn release(&self, id: &str) {
        self.lock().remove(id);
    }

    /// Acquire `id` and return a lease that releases it on drop
    pub fn lease(&self, id: &str) -> Option<InFlightLease> {
        if !self.try_acquire(id) {
            debug!(calendar_id = id, "Sync already in flight");
            return None;
        }
        Some(InFlightLease {
            guard: self.clone(),
            id: id.to_string(),
        })
    }

    /// Whether a sync of `id` is in flight
    pub fn is_syncing(&self, id: &str) -> bool {
        self.lock().contains(id)
    }

    /// Number of syncs in flight
    pub fn in_flight_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        // The set stays consistent even if a holder panicked
        self.in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Releases the calendar id when dropped, on every exit path
#[derive(Debug)]
pub struct InFlightLease {
    guard: ItemSyncGuard,
    id: String,
}

impl InFlightLease {
    /// Calendar id held by this lease
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl Drop for InFlightLease {
    fn drop(&mut self) {
        self.guard.release(&self.id);
    }
}

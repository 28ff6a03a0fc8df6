//! Domain models for calendar-sync
//!
//! This module contains the core domain models used throughout the application.

pub mod calendar;
pub mod sync;

// Re-export commonly used types
pub use calendar::CalendarItem;
pub use sync::{BatchResult, ItemSyncError, SyncOutcome, SyncProgress, SyncStatus};

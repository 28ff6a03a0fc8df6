//! Sync result and progress models
//!
//! This module defines the per-calendar outcome, the batch result, and the
//! progress snapshots broadcast while a batch is running.

use serde::{Deserialize, Serialize};

/// Lifecycle state of a batch sync
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    /// No batch has run yet
    #[default]
    Idle,
    /// A batch is running
    InProgress,
    /// Every calendar synced
    Completed,
    /// The batch finished but at least one calendar failed
    CompletedWithErrors,
    /// The batch could not start
    Failed,
}

impl std::fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncStatus::Idle => write!(f, "idle"),
            SyncStatus::InProgress => write!(f, "in_progress"),
            SyncStatus::Completed => write!(f, "completed"),
            SyncStatus::CompletedWithErrors => write!(f, "completed_with_errors"),
            SyncStatus::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for SyncStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "idle" => Ok(SyncStatus::Idle),
            "in_progress" => Ok(SyncStatus::InProgress),
            "completed" => Ok(SyncStatus::Completed),
            "completed_with_errors" => Ok(SyncStatus::CompletedWithErrors),
            "failed" => Ok(SyncStatus::Failed),
            _ => Err(format!("Invalid sync status: {}", s)),
        }
    }
}

/// A failed calendar within a batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSyncError {
    /// Calendar identifier
    pub calendar_id: String,

    /// Calendar display name
    pub calendar_name: String,

    /// Human-readable error
    pub error: String,
}

impl ItemSyncError {
    /// Create a new item error
    pub fn new(
        calendar_id: impl Into<String>,
        calendar_name: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            calendar_id: calendar_id.into(),
            calendar_name: calendar_name.into(),
            error: error.into(),
        }
    }
}

/// Terminal outcome of syncing one calendar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncOutcome {
    /// Whether the feed was downloaded and stored
    pub success: bool,

    /// Error description when `success` is false
    pub error: Option<String>,

    /// Number of fetch attempts performed
    pub attempts: u32,
}

impl SyncOutcome {
    /// Successful outcome after `attempts` fetches
    pub fn success(attempts: u32) -> Self {
        Self {
            success: true,
            error: None,
            attempts,
        }
    }

    /// Failed outcome after `attempts` fetches
    pub fn failure(error: impl Into<String>, attempts: u32) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            attempts,
        }
    }

    /// Outcome returned when another sync of the same calendar is in flight
    pub fn already_syncing() -> Self {
        Self::failure("Already syncing", 0)
    }
}

/// Result of a full batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResult {
    /// True if at least one calendar synced
    pub success: bool,

    /// Calendars synced
    pub synced_count: usize,

    /// Calendars failed
    pub failed_count: usize,

    /// One entry per failed calendar, in sync order
    pub errors: Vec<ItemSyncError>,
}

impl BatchResult {
    /// Build a result from the final counters
    pub fn new(synced_count: usize, failed_count: usize, errors: Vec<ItemSyncError>) -> Self {
        Self {
            success: synced_count > 0,
            synced_count,
            failed_count,
            errors,
        }
    }

    /// Calendars processed in the batch
    pub fn total(&self) -> usize {
        self.synced_count + self.failed_count
    }
}

/// Progress snapshot emitted while a batch runs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncProgress {
    /// Batch status
    pub status: SyncStatus,

    /// Calendars in the batch
    pub total_calendars: usize,

    /// Calendars synced so far
    pub synced_calendars: usize,

    /// Calendars failed so far
    pub failed_calendars: usize,

    /// Errors so far
    pub errors: Vec<ItemSyncError>,
}

impl SyncProgress {
    /// Snapshot of a batch that has not started
    pub fn idle() -> Self {
        Self::default()
    }

    /// Snapshot of a running batch
    pub fn in_progress(
        total_calendars: usize,
        synced_calendars: usize,
        failed_calendars: usize,
        errors: Vec<ItemSyncError>,
    ) -> Self {
        Self {
            status: SyncStatus::InProgress,
            total_calendars,
            synced_calendars,
            failed_calendars,
            errors,
        }
    }

    /// Final snapshot; status depends on whether anything failed
    pub fn finished(
        total_calendars: usize,
        synced_calendars: usize,
        failed_calendars: usize,
        errors: Vec<ItemSyncError>,
    ) -> Self {
        let status = if failed_calendars == 0 {
            SyncStatus::Completed
        } else {
            SyncStatus::CompletedWithErrors
        };

        Self {
            status,
            total_calendars,
            synced_calendars,
            failed_calendars,
            errors,
        }
    }

    /// Snapshot of a batch that could not start
    pub fn failed(error: ItemSyncError) -> Self {
        Self {
            status: SyncStatus::Failed,
            errors: vec![error],
            ..Self::default()
        }
    }

    /// Fraction of calendars synced, in [0.0, 1.0]
    pub fn progress_percent(&self) -> f64 {
        if self.total_calendars == 0 {
            return 0.0;
        }
        (self.synced_calendars as f64 / self.total_calendars as f64).clamp(0.0, 1.0)
    }

    /// Whether the batch reached a completed state
    pub fn is_completed(&self) -> bool {
        matches!(
            self.status,
            SyncStatus::Completed | SyncStatus::CompletedWithErrors
        )
    }

    /// Whether any calendar has failed
    pub fn has_errors(&self) -> bool {
        self.failed_calendars > 0 || !self.errors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Test 1: Progress derived properties mid-batch
    #[test]
    fn test_progress_mid_batch() {
        let progress = SyncProgress::in_progress(5, 2, 0, vec![]);

        assert!((progress.progress_percent() - 0.4).abs() < f64::EPSILON);
        assert!(!progress.is_completed());
        assert!(!progress.has_errors());
    }

    // Test 2: Zero calendars never divides by zero
    #[test]
    fn test_progress_percent_zero_total() {
        let progress = SyncProgress::in_progress(0, 0, 0, vec![]);
        assert_eq!(progress.progress_percent(), 0.0);
        assert_eq!(SyncProgress::idle().progress_percent(), 0.0);
    }

    // Test 3: progress_percent stays within bounds
    #[test]
    fn test_progress_percent_bounds() {
        for total in 0..10usize {
            for synced in 0..=total {
                let p = SyncProgress::in_progress(total, synced, total - synced, vec![]);
                let pct = p.progress_percent();
                assert!((0.0..=1.0).contains(&pct), "{} out of range", pct);
            }
        }
        let full = SyncProgress::finished(4, 4, 0, vec![]);
        assert_eq!(full.progress_percent(), 1.0);
    }

    // Test 4: is_completed only for completed states
    #[test]
    fn test_is_completed_by_status() {
        let mut progress = SyncProgress::idle();
        for (status, expected) in [
            (SyncStatus::Idle, false),
            (SyncStatus::InProgress, false),
            (SyncStatus::Completed, true),
            (SyncStatus::CompletedWithErrors, true),
            (SyncStatus::Failed, false),
        ] {
            progress.status = status;
            assert_eq!(progress.is_completed(), expected, "status {}", status);
        }
    }

    // Test 5: has_errors from counter or list
    #[test]
    fn test_has_errors() {
        let by_count = SyncProgress::in_progress(3, 1, 1, vec![]);
        assert!(by_count.has_errors());

        let by_list = SyncProgress {
            errors: vec![ItemSyncError::new("a", "A", "boom")],
            ..SyncProgress::idle()
        };
        assert!(by_list.has_errors());

        assert!(!SyncProgress::finished(3, 3, 0, vec![]).has_errors());
    }

    // Test 6: Final status depends on failures
    #[test]
    fn test_finished_status() {
        assert_eq!(
            SyncProgress::finished(2, 2, 0, vec![]).status,
            SyncStatus::Completed
        );
        let with_errors = SyncProgress::finished(
            2,
            1,
            1,
            vec![ItemSyncError::new("b", "B", "Connection failed")],
        );
        assert_eq!(with_errors.status, SyncStatus::CompletedWithErrors);
        assert!(with_errors.is_completed());
        assert!(with_errors.has_errors());
    }

    // Test 7: Batch result keeps error details
    #[test]
    fn test_batch_result_errors() {
        let result = BatchResult {
            success: false,
            synced_count: 1,
            failed_count: 1,
            errors: vec![ItemSyncError::new(
                "test-id",
                "Test Calendar",
                "Connection failed",
            )],
        };

        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].calendar_name, "Test Calendar");
        assert_eq!(result.errors[0].error, "Connection failed");
        assert_eq!(result.total(), 2);
    }

    // Test 8: Batch success means at least one synced
    #[test]
    fn test_batch_result_success_flag() {
        assert!(BatchResult::new(1, 4, vec![]).success);
        assert!(!BatchResult::new(0, 4, vec![]).success);
        assert!(!BatchResult::new(0, 0, vec![]).success);
    }

    // Test 9: SyncStatus string round trip
    #[test]
    fn test_sync_status_display_and_parse() {
        for status in [
            SyncStatus::Idle,
            SyncStatus::InProgress,
            SyncStatus::Completed,
            SyncStatus::CompletedWithErrors,
            SyncStatus::Failed,
        ] {
            assert_eq!(status.to_string().parse::<SyncStatus>().unwrap(), status);
        }
        assert!("paused".parse::<SyncStatus>().is_err());
    }

    // Test 10: Outcome constructors
    #[test]
    fn test_outcome_constructors() {
        let ok = SyncOutcome::success(2);
        assert!(ok.success);
        assert_eq!(ok.error, None);
        assert_eq!(ok.attempts, 2);

        let busy = SyncOutcome::already_syncing();
        assert!(!busy.success);
        assert_eq!(busy.error.as_deref(), Some("Already syncing"));
        assert_eq!(busy.attempts, 0);
    }
}

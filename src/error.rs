//! Application error types for calendar-sync
//!
//! This module defines common error types used throughout the application.
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

use crate::config::ConfigError;

/// Errors produced by a single feed fetch attempt
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SyncError {
    /// Request did not complete within the configured timeout
    #[error("Network timeout")]
    NetworkTimeout,

    /// Connection refused or host unreachable
    #[error("Connection refused")]
    ConnectionRefused,

    /// Upstream answered with something other than 200
    #[error("HTTP {status} {reason}")]
    HttpStatus {
        /// Status code
        status: u16,
        /// Reason phrase
        reason: String,
    },

    /// Feed URL could not be turned into a request
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Generic network error
    #[error("Network error: {0}")]
    Network(String),
}

/// Calendar store errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// SQLite error
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Calendar not found
    #[error("Calendar not found: {0}")]
    NotFound(String),

    /// Constraint violation
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
}

/// Feed cache errors
#[derive(Debug, Error)]
pub enum CacheError {
    /// IO error during cache operation
    #[error("Cache IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Calendar id cannot be used as a cache file name
    #[error("Invalid cache key: {0}")]
    InvalidKey(String),
}

/// Errors raised by a downstream update hook
#[derive(Debug, Error, Clone, PartialEq)]
pub enum HookError {
    /// The hook failed to apply or purge derived records
    #[error("Downstream update failed: {0}")]
    Failed(String),
}

/// Sync scheduler errors
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The scheduler loop is not running
    #[error("Scheduler not running")]
    NotRunning,

    /// Listing calendars failed
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Application-level error type
///
/// Aggregates all domain-specific error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// Store error
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Cache error
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// Sync error
    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    /// Scheduler error
    #[error("Scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Trait for determining if an error is retryable
pub trait RetryableError {
    /// Returns true if the error is retryable
    fn is_retryable(&self) -> bool;
}

impl RetryableError for SyncError {
    fn is_retryable(&self) -> bool {
        match self {
            SyncError::NetworkTimeout => true,
            SyncError::ConnectionRefused => true,
            SyncError::Network(_) => true,
            // Every non-200 status is retried, client errors included
            SyncError::HttpStatus { .. } => true,

            SyncError::InvalidUrl(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Test 1: SyncError messages with parameters
    #[test]
    fn test_sync_error_messages() {
        assert_eq!(SyncError::NetworkTimeout.to_string(), "Network timeout");
        assert_eq!(SyncError::ConnectionRefused.to_string(), "Connection refused");
        assert_eq!(
            SyncError::HttpStatus {
                status: 503,
                reason: "Service Unavailable".to_string()
            }
            .to_string(),
            "HTTP 503 Service Unavailable"
        );
        assert_eq!(
            SyncError::InvalidUrl("not a url".to_string()).to_string(),
            "Invalid URL: not a url"
        );
    }

    // Test 2: Every HTTP status is retryable, 4xx included
    #[test]
    fn test_sync_error_retryable() {
        assert!(SyncError::NetworkTimeout.is_retryable());
        assert!(SyncError::ConnectionRefused.is_retryable());
        assert!(SyncError::Network("reset".to_string()).is_retryable());
        assert!(SyncError::HttpStatus {
            status: 500,
            reason: "Internal Server Error".to_string()
        }
        .is_retryable());
        assert!(SyncError::HttpStatus {
            status: 404,
            reason: "Not Found".to_string()
        }
        .is_retryable());
        assert!(SyncError::HttpStatus {
            status: 401,
            reason: "Unauthorized".to_string()
        }
        .is_retryable());

        assert!(!SyncError::InvalidUrl("ftp:/x".to_string()).is_retryable());
    }

    // Test 3: StoreError messages
    #[test]
    fn test_store_error_messages() {
        assert_eq!(
            StoreError::NotFound("work".to_string()).to_string(),
            "Calendar not found: work"
        );
        assert_eq!(
            StoreError::ConstraintViolation("duplicate id".to_string()).to_string(),
            "Constraint violation: duplicate id"
        );
    }

    // Test 4: CacheError from IO error
    #[test]
    fn test_cache_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let cache_err: CacheError = io_err.into();

        match cache_err {
            CacheError::Io(_) => (),
            _ => panic!("Expected CacheError::Io"),
        }
    }

    // Test 5: AppError display includes source error
    #[test]
    fn test_app_error_display() {
        let app_err = AppError::Sync(SyncError::NetworkTimeout);
        assert_eq!(app_err.to_string(), "Sync error: Network timeout");

        let app_err: AppError = StoreError::NotFound("home".to_string()).into();
        assert_eq!(app_err.to_string(), "Store error: Calendar not found: home");

        let app_err = AppError::Internal("unexpected state".to_string());
        assert_eq!(app_err.to_string(), "Internal error: unexpected state");
    }

    // Test 6: SchedulerError wraps store errors
    #[test]
    fn test_scheduler_error_from_store() {
        let err: SchedulerError = StoreError::NotFound("x".to_string()).into();
        assert!(matches!(err, SchedulerError::Store(StoreError::NotFound(_))));
        assert_eq!(SchedulerError::NotRunning.to_string(), "Scheduler not running");
    }

    // Test 7: StoreError from rusqlite::Error
    #[test]
    fn test_store_error_from_sqlite() {
        let sqlite_err = rusqlite::Error::InvalidParameterName("test".to_string());
        let store_err: StoreError = sqlite_err.into();

        match store_err {
            StoreError::Sqlite(_) => (),
            _ => panic!("Expected StoreError::Sqlite"),
        }
    }
}

//! calendar-sync - Remote calendar feed synchronizer
//!
//! This crate downloads iCalendar feeds for a set of tracked calendars,
//! retrying transient failures with exponential backoff, caching each feed
//! on disk, and reporting per-calendar results and batch progress.

pub mod cache;
pub mod config;
pub mod database;
pub mod error;
pub mod logging;
pub mod models;
pub mod sync;

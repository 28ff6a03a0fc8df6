//! Configuration management for calendar-sync
//!
//! This module handles loading, parsing, and validating application configuration
//! from YAML files and environment variables.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Retry and timeout policy for feed downloads
    #[serde(default)]
    pub sync: SyncConfig,

    /// HTTP client configuration
    #[serde(default)]
    pub http: HttpConfig,

    /// Feed cache configuration
    #[serde(default)]
    pub cache: CacheConfig,

    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Periodic sync configuration (daemon mode)
    #[serde(default)]
    pub scheduler: SchedulerSettings,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileRead(format!("Failed to read config file: {}", e)))?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let expanded = expand_env_vars(yaml);
        let config: Config = serde_yaml::from_str(&expanded)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse YAML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables with prefix CALENDAR_SYNC_
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Ok(value) = std::env::var("CALENDAR_SYNC_MAX_RETRIES") {
            config.sync.max_retries = parse_env("CALENDAR_SYNC_MAX_RETRIES", &value)?;
        }
        if let Ok(value) = std::env::var("CALENDAR_SYNC_REQUEST_TIMEOUT_SECS") {
            config.sync.request_timeout_secs =
                parse_env("CALENDAR_SYNC_REQUEST_TIMEOUT_SECS", &value)?;
        }
        if let Ok(enabled) = std::env::var("CALENDAR_SYNC_ENABLE_DOWNSTREAM_UPDATE") {
            config.sync.enable_downstream_update = enabled.parse().unwrap_or(false);
        }
        if let Ok(user_agent) = std::env::var("CALENDAR_SYNC_USER_AGENT") {
            config.http.user_agent = user_agent;
        }
        if let Ok(dir) = std::env::var("CALENDAR_SYNC_CACHE_DIR") {
            config.cache.calendar_cache_dir = dir;
        }
        if let Ok(path) = std::env::var("CALENDAR_SYNC_DATABASE_PATH") {
            config.database.path = path;
        }
        if let Ok(level) = std::env::var("CALENDAR_SYNC_LOG_LEVEL") {
            config.logging.level = level;
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.sync.initial_retry_delay_ms > self.sync.max_retry_delay_ms {
            return Err(ConfigError::InvalidValue(format!(
                "initial_retry_delay_ms ({}) exceeds max_retry_delay_ms ({})",
                self.sync.initial_retry_delay_ms, self.sync.max_retry_delay_ms
            )));
        }
        if self.sync.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "request_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.scheduler.interval_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "scheduler.interval_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::Parse(format!("Invalid value for {}: {}", name, value)))
}

/// Retry and timeout policy for feed downloads
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SyncConfig {
    /// Retries after the first attempt (total attempts = max_retries + 1)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Backoff before the first retry, in milliseconds
    #[serde(default = "default_initial_retry_delay")]
    pub initial_retry_delay_ms: u64,

    /// Upper bound for any backoff, in milliseconds
    #[serde(default = "default_max_retry_delay")]
    pub max_retry_delay_ms: u64,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Whether to add up to one second of random jitter to each backoff
    #[serde(default = "default_jitter")]
    pub jitter: bool,

    /// Whether to run the downstream update hook after a successful download
    #[serde(default)]
    pub enable_downstream_update: bool,

    /// Whether to purge downstream state of a calendar whose sync failed
    #[serde(default)]
    pub purge_on_failure: bool,
}

impl SyncConfig {
    /// Backoff before the first retry
    pub fn initial_retry_delay(&self) -> Duration {
        Duration::from_millis(self.initial_retry_delay_ms)
    }

    /// Upper bound for any backoff
    pub fn max_retry_delay(&self) -> Duration {
        Duration::from_millis(self.max_retry_delay_ms)
    }

    /// Per-request timeout
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_retry_delay_ms: default_initial_retry_delay(),
            max_retry_delay_ms: default_max_retry_delay(),
            request_timeout_secs: default_request_timeout(),
            jitter: default_jitter(),
            enable_downstream_update: false,
            purge_on_failure: false,
        }
    }
}

fn default_max_retries() -> u32 {
    3
}

fn default_initial_retry_delay() -> u64 {
    1000
}

fn default_max_retry_delay() -> u64 {
    30_000
}

fn default_request_timeout() -> u64 {
    30
}

fn default_jitter() -> bool {
    true
}

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HttpConfig {
    /// User-Agent sent with every feed request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
        }
    }
}

fn default_user_agent() -> String {
    format!("calendar-sync/{}", env!("CARGO_PKG_VERSION"))
}

/// Feed cache configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheConfig {
    /// Directory holding one `<calendar id>.ics` file per calendar
    #[serde(default = "default_calendar_cache_dir")]
    pub calendar_cache_dir: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            calendar_cache_dir: default_calendar_cache_dir(),
        }
    }
}

fn default_calendar_cache_dir() -> String {
    "/data/calendars".to_string()
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatabaseConfig {
    /// Path to SQLite database file
    #[serde(default = "default_database_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

fn default_database_path() -> String {
    "/data/db/calendar-sync.db".to_string()
}

/// Periodic sync configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SchedulerSettings {
    /// Delay before the first batch (seconds)
    #[serde(default = "default_initial_delay")]
    pub initial_delay_secs: u64,

    /// Interval between batches (seconds)
    #[serde(default = "default_sync_interval")]
    pub interval_secs: u64,

    /// Upper bound of random delay added to each scheduled batch (seconds)
    #[serde(default = "default_scheduler_jitter")]
    pub jitter_secs: u64,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            initial_delay_secs: default_initial_delay(),
            interval_secs: default_sync_interval(),
            jitter_secs: default_scheduler_jitter(),
        }
    }
}

fn default_initial_delay() -> u64 {
    5
}

fn default_sync_interval() -> u64 {
    3600 // 1 hour
}

fn default_scheduler_jitter() -> u64 {
    60
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (`json` or `pretty`)
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

/// Configuration error types
#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum ConfigError {
    /// Error reading configuration file
    #[error("Failed to read configuration file: {0}")]
    FileRead(String),

    /// Error parsing configuration
    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    /// Invalid configuration value
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

/// Expand environment variables in a string
///
/// Supports `${VAR_NAME}` syntax
fn expand_env_vars(input: &str) -> String {
    let re = regex_lite::Regex::new(r"\$\{([^}]+)\}")
        .expect("Invalid regex pattern for environment variable expansion");

    re.replace_all(input, |caps: &regex_lite::Captures| {
        let var_name = &caps[1];
        std::env::var(var_name).unwrap_or_else(|_| caps[0].to_string())
    })
    .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    // Test 1: Parse complete configuration from YAML
    #[test]
    fn test_parse_complete_yaml_config() {
        let yaml = r#"
sync:
  max_retries: 5
  initial_retry_delay_ms: 500
  max_retry_delay_ms: 10000
  request_timeout_secs: 15
  jitter: false
  enable_downstream_update: true
  purge_on_failure: true

http:
  user_agent: "my-agent/2.0"

cache:
  calendar_cache_dir: "/tmp/calendars"

database:
  path: "/tmp/test.db"

scheduler:
  initial_delay_secs: 0
  interval_secs: 900
  jitter_secs: 10

logging:
  level: "debug"
  format: "pretty"
"#;

        let config = Config::from_yaml(yaml).unwrap();

        assert_eq!(config.sync.max_retries, 5);
        assert_eq!(config.sync.initial_retry_delay(), Duration::from_millis(500));
        assert_eq!(config.sync.max_retry_delay(), Duration::from_secs(10));
        assert_eq!(config.sync.request_timeout(), Duration::from_secs(15));
        assert!(!config.sync.jitter);
        assert!(config.sync.enable_downstream_update);
        assert!(config.sync.purge_on_failure);

        assert_eq!(config.http.user_agent, "my-agent/2.0");
        assert_eq!(config.cache.calendar_cache_dir, "/tmp/calendars");
        assert_eq!(config.database.path, "/tmp/test.db");

        assert_eq!(config.scheduler.initial_delay_secs, 0);
        assert_eq!(config.scheduler.interval_secs, 900);
        assert_eq!(config.scheduler.jitter_secs, 10);

        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "pretty");
    }

    // Test 2: Default values are applied for missing fields
    #[test]
    fn test_default_values_applied() {
        let yaml = r#"
sync:
  max_retries: 1
"#;

        let config = Config::from_yaml(yaml).unwrap();

        assert_eq!(config.sync.max_retries, 1);
        assert_eq!(config.sync.initial_retry_delay(), Duration::from_secs(1));
        assert_eq!(config.sync.max_retry_delay(), Duration::from_secs(30));
        assert_eq!(config.sync.request_timeout(), Duration::from_secs(30));
        assert!(config.sync.jitter);
        assert!(!config.sync.enable_downstream_update);
        assert!(!config.sync.purge_on_failure);

        assert!(config.http.user_agent.starts_with("calendar-sync/"));
        assert_eq!(config.cache.calendar_cache_dir, "/data/calendars");
        assert_eq!(config.database.path, "/data/db/calendar-sync.db");
        assert_eq!(config.scheduler.interval_secs, 3600);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "json");
    }

    // Test 3: Environment variable expansion
    #[test]
    fn test_env_var_expansion() {
        std::env::set_var("TEST_CALSYNC_CACHE_DIR", "/var/cache/cal");

        let yaml = r#"
cache:
  calendar_cache_dir: "${TEST_CALSYNC_CACHE_DIR}"
"#;

        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.cache.calendar_cache_dir, "/var/cache/cal");

        std::env::remove_var("TEST_CALSYNC_CACHE_DIR");
    }

    // Test 4: Unknown variables are left untouched
    #[test]
    fn test_env_var_expansion_unknown_var() {
        let expanded = expand_env_vars("path: ${CALSYNC_SURELY_UNSET_VAR}");
        assert_eq!(expanded, "path: ${CALSYNC_SURELY_UNSET_VAR}");
    }

    // Test 5: from_env loads config from environment variables
    #[test]
    fn test_from_env() {
        std::env::set_var("CALENDAR_SYNC_MAX_RETRIES", "7");
        std::env::set_var("CALENDAR_SYNC_REQUEST_TIMEOUT_SECS", "12");
        std::env::set_var("CALENDAR_SYNC_ENABLE_DOWNSTREAM_UPDATE", "true");
        std::env::set_var("CALENDAR_SYNC_USER_AGENT", "env-agent/1.0");
        std::env::set_var("CALENDAR_SYNC_DATABASE_PATH", "/env/cal.db");

        let config = Config::from_env().unwrap();

        assert_eq!(config.sync.max_retries, 7);
        assert_eq!(config.sync.request_timeout_secs, 12);
        assert!(config.sync.enable_downstream_update);
        assert_eq!(config.http.user_agent, "env-agent/1.0");
        assert_eq!(config.database.path, "/env/cal.db");

        std::env::remove_var("CALENDAR_SYNC_MAX_RETRIES");
        std::env::remove_var("CALENDAR_SYNC_REQUEST_TIMEOUT_SECS");
        std::env::remove_var("CALENDAR_SYNC_ENABLE_DOWNSTREAM_UPDATE");
        std::env::remove_var("CALENDAR_SYNC_USER_AGENT");
        std::env::remove_var("CALENDAR_SYNC_DATABASE_PATH");
    }

    // Test 6: Parse error for invalid YAML
    #[test]
    fn test_parse_error_invalid_yaml() {
        let yaml = r#"
sync:
  max_retries: "three"
"#;

        match Config::from_yaml(yaml) {
            Err(ConfigError::Parse(msg)) => assert!(msg.contains("Failed to parse YAML")),
            other => panic!("Expected ConfigError::Parse, got {:?}", other),
        }
    }

    // Test 7: Initial delay above the cap is rejected
    #[test]
    fn test_invalid_retry_delays_rejected() {
        let yaml = r#"
sync:
  initial_retry_delay_ms: 60000
  max_retry_delay_ms: 1000
"#;

        assert!(matches!(
            Config::from_yaml(yaml),
            Err(ConfigError::InvalidValue(_))
        ));
    }

    // Test 8: Zero request timeout is rejected
    #[test]
    fn test_zero_timeout_rejected() {
        let yaml = r#"
sync:
  request_timeout_secs: 0
"#;

        assert!(matches!(
            Config::from_yaml(yaml),
            Err(ConfigError::InvalidValue(_))
        ));
    }

    // Test 9: Empty YAML results in defaults
    #[test]
    fn test_empty_yaml_defaults() {
        let config = Config::from_yaml("{}").unwrap();
        assert_eq!(config, Config::default());
    }

    // Test 10: Config serialization round-trip
    #[test]
    fn test_config_serialization_roundtrip() {
        let config = Config::default();

        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();

        assert_eq!(config, parsed);
    }
}

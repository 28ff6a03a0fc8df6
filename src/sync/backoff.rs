//! Exponential backoff with jitter
//!
//! Computes the delay inserted between feed download attempts:
//! `min(initial * 2^attempt + jitter, max)`, with jitter drawn from [0, 1s).

use rand::Rng;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use crate::config::SyncConfig;

/// Upper bound (exclusive) of the random jitter
pub const MAX_JITTER: Duration = Duration::from_secs(1);

/// Source of the random part of a backoff delay
pub trait JitterSource: Send + Sync + Debug {
    /// Jitter to add to the next delay
    fn jitter(&self) -> Duration;
}

/// Uniformly random jitter in [0, 1s)
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomJitter;

impl JitterSource for RandomJitter {
    fn jitter(&self) -> Duration {
        let millis = rand::thread_rng().gen_range(0..MAX_JITTER.as_millis() as u64);
        Duration::from_millis(millis)
    }
}

/// No jitter at all
#[derive(Debug, Clone, Copy, Default)]
pub struct NoJitter;

impl JitterSource for NoJitter {
    fn jitter(&self) -> Duration {
        Duration::ZERO
    }
}

/// Constant jitter, for deterministic delays
#[derive(Debug, Clone, Copy)]
pub struct FixedJitter(pub Duration);

impl JitterSource for FixedJitter {
    fn jitter(&self) -> Duration {
        self.0
    }
}

/// Backoff policy between retry attempts
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    initial_delay: Duration,
    max_delay: Duration,
    jitter: Arc<dyn JitterSource>,
}

impl BackoffPolicy {
    /// Create a policy with random jitter
    pub fn new(initial_delay: Duration, max_delay: Duration) -> Self {
        Self {
            initial_delay,
            max_delay,
            jitter: Arc::new(RandomJitter),
        }
    }

    /// Create a policy from sync configuration
    pub fn from_config(config: &SyncConfig) -> Self {
        let policy = Self::new(config.initial_retry_delay(), config.max_retry_delay());
        if config.jitter {
            policy
        } else {
            policy.with_jitter_source(Arc::new(NoJitter))
        }
    }

    /// Replace the jitter source
    pub fn with_jitter_source(mut self, jitter: Arc<dyn JitterSource>) -> Self {
        self.jitter = jitter;
        self
    }

    /// Delay to wait after failed attempt number `attempt` (zero based)
    pub fn delay(&self, attempt: u32) -> Duration {
        self.base_delay(attempt)
            .saturating_add(self.jitter.jitter())
            .min(self.max_delay)
    }

    /// Jitter-free part of the delay, capped at the maximum
    pub fn base_delay(&self, attempt: u32) -> Duration {
        1u32.checked_shl(attempt)
            .and_then(|factor| self.initial_delay.checked_mul(factor))
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }

    /// Delay before the first retry
    pub fn initial_delay(&self) -> Duration {
        self.initial_delay
    }

    /// Upper bound for any delay
    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(1), Duration::from_secs(30))
    }
}

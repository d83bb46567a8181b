//! Configuration types for scrape-pool

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Pool configuration: parallelism, retry ceiling, shutdown budget
///
/// Validated once at pool construction; invalid values fail there, never
/// in later calls. All fields have sensible defaults, so
/// `PoolConfig::default()` works out of the box.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Maximum number of fetch attempts executing at the same instant
    /// (default: 4)
    ///
    /// This is a hard admission limit: excess tasks queue until a worker
    /// slot frees, regardless of fetch latency variance.
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,

    /// Maximum fetch attempts per task, first try included (default: 3)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// How long the drain phase may last before remaining tasks are
    /// force-cancelled (default: 5 minutes)
    ///
    /// Measured from the moment the batch is fully submitted. A zero
    /// timeout is valid and escalates to forced cancellation immediately.
    #[serde(default = "default_shutdown_timeout", with = "duration_serde")]
    pub shutdown_timeout: Duration,

    /// Delay schedule between a failed attempt and the next one
    /// (default: no delay)
    #[serde(default)]
    pub backoff: BackoffConfig,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            parallelism: default_parallelism(),
            max_attempts: default_max_attempts(),
            shutdown_timeout: default_shutdown_timeout(),
            backoff: BackoffConfig::default(),
        }
    }
}

impl PoolConfig {
    /// Check the configuration for values that would make the pool
    /// unrunnable
    ///
    /// Called by [`FetchPool::new`](crate::pool::FetchPool::new) before
    /// any task exists, so a bad configuration can never start a fetch.
    pub fn validate(&self) -> Result<()> {
        if self.parallelism == 0 {
            return Err(Error::Config {
                message: "parallelism must be at least 1".to_string(),
                key: Some("parallelism".to_string()),
            });
        }
        if self.max_attempts == 0 {
            return Err(Error::Config {
                message: "max_attempts must be at least 1".to_string(),
                key: Some("max_attempts".to_string()),
            });
        }
        if !self.backoff.backoff_multiplier.is_finite() || self.backoff.backoff_multiplier < 1.0 {
            return Err(Error::Config {
                message: format!(
                    "backoff_multiplier must be a finite value >= 1.0, got {}",
                    self.backoff.backoff_multiplier
                ),
                key: Some("backoff.backoff_multiplier".to_string()),
            });
        }
        Ok(())
    }
}

/// Delay schedule applied between attempts of one task
///
/// The default schedule has no delay at all: a failed attempt is retried
/// immediately. Set `initial_delay` to a non-zero value to enable
/// exponential backoff. The schedule never influences *whether* a retry
/// happens, only *when* — the retry decision is purely attempt-count
/// based.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BackoffConfig {
    /// Delay before the first retry (default: 0, retry immediately)
    #[serde(default, with = "duration_serde")]
    pub initial_delay: Duration,

    /// Cap on the delay between retries (default: 60 seconds)
    #[serde(default = "default_max_delay", with = "duration_serde")]
    pub max_delay: Duration,

    /// Multiplier applied to the delay after each failed attempt
    /// (default: 2.0)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Add random jitter to delays (default: false)
    #[serde(default)]
    pub jitter: bool,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::ZERO,
            max_delay: default_max_delay(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: false,
        }
    }
}

fn default_parallelism() -> usize {
    4
}

fn default_max_attempts() -> u32 {
    3
}

fn default_shutdown_timeout() -> Duration {
    Duration::from_secs(300)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(60)
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

// Duration serialization helper (whole seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

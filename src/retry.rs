//! Flat retry logic for fetch attempts
//!
//! Attempts are 1-indexed; retry is permitted while the attempt count
//! is below the configured ceiling. The failure kind never influences
//! the decision — every error is retried identically up to the ceiling.
//! This mirrors the flat "retry N times regardless of cause" behavior
//! the engine is built around and is a deliberate design choice, not a
//! gap to fill with error classification.
//!
//! An optional delay schedule ([`BackoffConfig`]) controls *when* a
//! retry happens, never *whether*. The default schedule has no delay.
//!
//! # Example
//!
//! ```no_run
//! use scrape_pool::config::BackoffConfig;
//! use scrape_pool::retry::run_with_retry;
//!
//! # async fn example() {
//! let backoff = BackoffConfig::default();
//! let (result, attempts) = run_with_retry(3, &backoff, || async {
//!     Ok::<_, std::io::Error>("fetched")
//! })
//! .await;
//! assert_eq!(attempts, 1);
//! assert!(result.is_ok());
//! # }
//! ```

use crate::config::BackoffConfig;
use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// Decide whether another attempt is permitted
///
/// `attempt` is the 1-indexed number of the attempt that just failed.
pub fn should_retry(attempt: u32, max_attempts: u32) -> bool {
    attempt < max_attempts
}

/// Execute an async operation, retrying every failure up to `max_attempts`
///
/// Returns the terminal result together with the number of attempts
/// consumed. The operation is invoked at least once and at most
/// `max_attempts` times; attempt N+1 never starts before attempt N's
/// outcome is known.
pub async fn run_with_retry<F, Fut, T, E>(
    max_attempts: u32,
    backoff: &BackoffConfig,
    mut operation: F,
) -> (std::result::Result<T, E>, u32)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt = 1u32;
    let mut delay = backoff.initial_delay;

    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::info!(attempts = attempt, "attempt succeeded after retry");
                }
                return (Ok(value), attempt);
            }
            Err(e) if should_retry(attempt, max_attempts) => {
                tracing::warn!(
                    error = %e,
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis(),
                    "attempt failed, retrying"
                );

                if !delay.is_zero() {
                    let wait = if backoff.jitter { add_jitter(delay) } else { delay };
                    tokio::time::sleep(wait).await;
                }

                let next_delay =
                    Duration::from_secs_f64(delay.as_secs_f64() * backoff.backoff_multiplier);
                delay = next_delay.min(backoff.max_delay);
                attempt += 1;
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    attempts = attempt,
                    "all attempts exhausted"
                );
                return (Err(e), attempt);
            }
        }
    }
}

/// Add random jitter to a delay to prevent thundering herd
///
/// Jitter is uniformly distributed between 0% and 100% of the delay, so
/// the actual delay is between `delay` and `2 * delay`.
fn add_jitter(delay: Duration) -> Duration {
    let mut rng = rand::thread_rng();
    let jitter_factor: f64 = rng.gen_range(0.0..=1.0);
    let jittered_secs = delay.as_secs_f64() * (1.0 + jitter_factor);
    Duration::from_secs_f64(jittered_secs)
}

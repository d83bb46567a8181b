//! # scrape-pool
//!
//! Bounded-concurrency page fetching library with retries and graceful
//! shutdown.
//!
//! ## Design Philosophy
//!
//! scrape-pool is designed to be:
//! - **Single-batch** - One fixed list of URLs per pool, no crawling policy
//! - **Bounded** - A hard admission limit on concurrent fetches
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//! - **Event-driven** - Consumers subscribe to events, no polling required
//!
//! Failed fetches are retried a bounded number of times regardless of
//! cause, successes aggregate into a shared concurrent store, and the
//! pool shuts down within a timeout budget, escalating to forced
//! cancellation if graceful completion does not happen in time.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use scrape_pool::{FetchPool, HttpPageFetcher, PoolConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = FetchPool::new(PoolConfig::default())?;
//!     let fetcher = Arc::new(HttpPageFetcher::new()?);
//!
//!     // Subscribe to events
//!     let mut events = pool.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let outcome = pool
//!         .run(
//!             vec![
//!                 "https://en.wikipedia.org/wiki/Ancient_Egypt".to_string(),
//!                 "https://en.wikipedia.org/wiki/Renaissance".to_string(),
//!             ],
//!             fetcher,
//!         )
//!         .await?;
//!
//!     println!("terminated as {:?}", outcome.state);
//!     for (url, page) in outcome.store.snapshot() {
//!         println!("{url}: {} ({} links)", page.title, page.links.len());
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Pool and retry configuration
pub mod config;
/// Error types
pub mod error;
/// Page fetching trait and the HTTP implementation
pub mod fetcher;
/// Core pool implementation (decomposed into focused submodules)
pub mod pool;
/// Flat retry logic with optional backoff
pub mod retry;
/// Result delivery to external sinks
pub mod sink;
/// Concurrent result aggregation
pub mod store;
/// Core types and events
pub mod types;

// Re-export commonly used types
pub use config::{BackoffConfig, PoolConfig};
pub use error::{Error, FetchError, Result};
pub use fetcher::{HttpPageFetcher, PageFetcher};
pub use pool::FetchPool;
pub use sink::{JsonlSink, MemorySink, ResultSink, deliver};
pub use store::ResultStore;
pub use types::{BatchOutcome, Event, PageData, ResourceId, TaskOutcome, TerminalState};

use std::sync::Arc;

/// Execute one batch of fetch work and return the populated store
///
/// Convenience wrapper over [`FetchPool`]: validates the configuration,
/// runs one task per identifier under the parallelism bound, and drives
/// the shutdown sequence. Inspect [`BatchOutcome::state`] to distinguish
/// a fully drained batch from a force-stopped one; failed and cancelled
/// identifiers are identifiable only by their absence from the store.
///
/// # Errors
///
/// Returns [`Error::Config`] if the configuration is invalid — no fetch
/// is ever attempted in that case. Per-task fetch failures are contained
/// and never surface here.
pub async fn execute_batch(
    identifiers: Vec<String>,
    config: PoolConfig,
    fetcher: Arc<dyn PageFetcher>,
) -> Result<BatchOutcome> {
    let pool = FetchPool::new(config)?;
    pool.run(identifiers, fetcher).await
}

/// Run a batch with graceful signal handling.
///
/// A termination signal force-stops the in-flight batch, so the call
/// returns with [`TerminalState::ForceStopped`] instead of hanging until
/// the shutdown budget elapses.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal
///   registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use scrape_pool::{FetchPool, HttpPageFetcher, PoolConfig, run_with_shutdown};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let pool = FetchPool::new(PoolConfig::default())?;
///     let fetcher = Arc::new(HttpPageFetcher::new()?);
///
///     let outcome = run_with_shutdown(
///         pool,
///         vec!["https://en.wikipedia.org/wiki/Nile".to_string()],
///         fetcher,
///     )
///     .await?;
///
///     println!("terminated as {:?}", outcome.state);
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(
    pool: FetchPool,
    identifiers: Vec<String>,
    fetcher: Arc<dyn PageFetcher>,
) -> Result<BatchOutcome> {
    let cancel = pool.cancel_token();
    let signal_watcher = tokio::spawn(async move {
        wait_for_signal().await;
        cancel.cancel();
    });

    let outcome = pool.run(identifiers, fetcher).await;
    signal_watcher.abort();
    outcome
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Signal registration can fail in restricted environments (containers, tests)
    match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => tracing::info!("received SIGTERM"),
                _ = sigint.recv() => tracing::info!("received SIGINT (Ctrl+C)"),
            }
        }
        (Ok(mut sigterm), Err(e)) => {
            tracing::warn!(error = %e, "could not register SIGINT handler, waiting for SIGTERM only");
            sigterm.recv().await;
        }
        (Err(e), Ok(mut sigint)) => {
            tracing::warn!(error = %e, "could not register SIGTERM handler, waiting for SIGINT only");
            sigint.recv().await;
        }
        (Err(_), Err(_)) => {
            tracing::error!("could not register signal handlers, using ctrl_c fallback");
            tokio::signal::ctrl_c().await.ok();
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for Ctrl+C signal");
    }
}

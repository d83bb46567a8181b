//! Core pool implementation split into focused submodules.
//!
//! The `FetchPool` struct and its methods are organized by domain:
//! - [`executor`] - Task spawning and the per-task retry loop
//! - [`shutdown`] - Drain and force-stop coordination

mod executor;
mod shutdown;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio_util::sync::CancellationToken;

use crate::config::PoolConfig;
use crate::error::{Error, Result};
use crate::fetcher::PageFetcher;
use crate::store::ResultStore;
use crate::types::{BatchOutcome, Event};

use shutdown::ShutdownCoordinator;

/// Bounded-concurrency executor for one batch of fetch work
///
/// The pool is single-batch: [`run`](FetchPool::run) accepts exactly one
/// list of identifiers, and a second call is refused with
/// [`Error::ShuttingDown`]. Cloneable — all state is shared.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use scrape_pool::{FetchPool, HttpPageFetcher, PoolConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let pool = FetchPool::new(PoolConfig::default())?;
///     let fetcher = Arc::new(HttpPageFetcher::new()?);
///
///     let outcome = pool
///         .run(vec!["https://example.com".to_string()], fetcher)
///         .await?;
///
///     for (url, page) in outcome.store.snapshot() {
///         println!("{url}: {} ({} links)", page.title, page.links.len());
///     }
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct FetchPool {
    /// Configuration (wrapped in Arc for sharing across tasks)
    pub(crate) config: Arc<PoolConfig>,
    /// Shared result store tasks insert into on success
    pub(crate) store: ResultStore,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: tokio::sync::broadcast::Sender<Event>,
    /// Force-cancellation token for the whole batch
    pub(crate) cancel: CancellationToken,
    /// Flips to false when the single batch is admitted
    accepting: Arc<AtomicBool>,
}

impl FetchPool {
    /// Create a new pool from a validated configuration
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the configuration is invalid
    /// (zero parallelism, zero attempt ceiling, bad backoff multiplier).
    /// Validation happens here, before any task exists.
    pub fn new(config: PoolConfig) -> Result<Self> {
        config.validate()?;

        // Buffered so the engine never blocks on a slow subscriber
        let (event_tx, _rx) = tokio::sync::broadcast::channel(1024);

        Ok(Self {
            config: Arc::new(config),
            store: ResultStore::new(),
            event_tx,
            cancel: CancellationToken::new(),
            accepting: Arc::new(AtomicBool::new(true)),
        })
    }

    /// Subscribe to batch events
    ///
    /// Multiple subscribers are supported; each receives all events
    /// independently. A subscriber that falls behind by more than the
    /// channel buffer receives `RecvError::Lagged`.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Token that force-stops the batch when cancelled
    ///
    /// Cancelling it has the same effect as the shutdown timeout
    /// elapsing: in-flight tasks are abandoned and the batch terminates
    /// as [`TerminalState::ForceStopped`](crate::types::TerminalState).
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Get the current configuration
    pub fn get_config(&self) -> Arc<PoolConfig> {
        Arc::clone(&self.config)
    }

    /// Emit an event to all subscribers
    ///
    /// If there are no active subscribers the event is silently dropped;
    /// the batch never depends on anyone listening.
    pub(crate) fn emit_event(&self, event: Event) {
        self.event_tx.send(event).ok();
    }

    /// Execute the batch: one task per identifier, then drain
    ///
    /// Spawns exactly one logical task per identifier (duplicates
    /// included), each running the retry loop under the parallelism
    /// bound, then drives the shutdown sequence: wait for all tasks up
    /// to `shutdown_timeout`, escalating to forced cancellation if the
    /// budget runs out. Successful tasks have inserted into the returned
    /// store; failed and cancelled identifiers are simply absent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShuttingDown`] if the pool already ran its
    /// batch. Per-task fetch failures are contained and never surface
    /// here.
    pub async fn run(
        &self,
        identifiers: Vec<String>,
        fetcher: Arc<dyn PageFetcher>,
    ) -> Result<BatchOutcome> {
        if !self.accepting.swap(false, Ordering::SeqCst) {
            return Err(Error::ShuttingDown);
        }

        let mut tasks = self.spawn_batch(identifiers, fetcher);

        // The batch is fully admitted; everything after this point is
        // the stop sequence.
        let coordinator =
            ShutdownCoordinator::new(self.config.shutdown_timeout, self.cancel.clone());
        let state = coordinator.drain(&mut tasks).await;

        let stored = self.store.len();
        self.emit_event(Event::BatchFinished { state, stored });
        tracing::info!(?state, stored, "batch finished");

        Ok(BatchOutcome {
            state,
            store: self.store.clone(),
        })
    }
}

//! Task spawning and the per-task retry loop.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use super::FetchPool;
use crate::config::PoolConfig;
use crate::fetcher::PageFetcher;
use crate::retry::run_with_retry;
use crate::store::ResultStore;
use crate::types::{Event, ResourceId, TaskOutcome};

/// Everything one task needs, moved into its spawned future
pub(crate) struct TaskContext {
    pub(crate) id: ResourceId,
    pub(crate) fetcher: Arc<dyn PageFetcher>,
    pub(crate) store: ResultStore,
    pub(crate) config: Arc<PoolConfig>,
    pub(crate) limiter: Arc<Semaphore>,
    pub(crate) event_tx: tokio::sync::broadcast::Sender<Event>,
}

impl FetchPool {
    /// Spawn one task per identifier into a JoinSet
    ///
    /// Every task is admitted immediately but only `parallelism` of
    /// them hold a worker slot at any instant; the rest wait on the
    /// semaphore. Each task future races the pool's cancellation token
    /// so a force-stop abandons it at its next await point.
    pub(crate) fn spawn_batch(
        &self,
        identifiers: Vec<String>,
        fetcher: Arc<dyn PageFetcher>,
    ) -> JoinSet<()> {
        let limiter = Arc::new(Semaphore::new(self.config.parallelism));
        let mut tasks = JoinSet::new();

        tracing::info!(
            count = identifiers.len(),
            parallelism = self.config.parallelism,
            max_attempts = self.config.max_attempts,
            "submitting batch"
        );

        for raw in identifiers {
            let ctx = TaskContext {
                id: ResourceId::from(raw),
                fetcher: Arc::clone(&fetcher),
                store: self.store.clone(),
                config: Arc::clone(&self.config),
                limiter: Arc::clone(&limiter),
                event_tx: self.event_tx.clone(),
            };
            let cancel = self.cancel.clone();

            tasks.spawn(run_task_until_cancelled(ctx, cancel));
        }

        tasks
    }
}

/// Race the task body against the batch-wide cancellation token
///
/// A cancelled task is abandoned at its current await point: any fetch
/// in flight is dropped and nothing is written to the store. A result
/// that was already inserted stays — the insert itself has no await
/// point, so a reader never observes a partial entry.
async fn run_task_until_cancelled(ctx: TaskContext, cancel: CancellationToken) {
    let id = ctx.id.clone();
    tokio::select! {
        _ = cancel.cancelled() => {
            tracing::debug!(id = %id, "task cancelled before completion");
        }
        _ = run_task(ctx) => {}
    }
}

/// One task: acquire a worker slot, run the retry loop, record the outcome
async fn run_task(ctx: TaskContext) {
    // The permit is the task's worker slot. It is released exactly once,
    // when the future drops — on success, on exhaustion, and on abort.
    let permit = match Arc::clone(&ctx.limiter).acquire_owned().await {
        Ok(permit) => permit,
        // The semaphore is never closed while a batch runs; treat a
        // closed semaphore as cancellation.
        Err(_) => return,
    };
    let _permit = permit;

    ctx.event_tx
        .send(Event::TaskStarted { id: ctx.id.clone() })
        .ok();

    let (result, attempts) = run_with_retry(ctx.config.max_attempts, &ctx.config.backoff, || {
        ctx.fetcher.fetch(&ctx.id)
    })
    .await;

    let outcome = match result {
        Ok(data) => TaskOutcome::Success { data, attempts },
        Err(error) => TaskOutcome::Failed { error, attempts },
    };

    match outcome {
        TaskOutcome::Success { data, attempts } => {
            tracing::debug!(
                id = %ctx.id,
                attempts,
                title = %data.title,
                links = data.links.len(),
                "task succeeded"
            );
            ctx.store.insert(ctx.id.clone(), data);
            ctx.event_tx
                .send(Event::TaskSucceeded {
                    id: ctx.id,
                    attempts,
                })
                .ok();
        }
        TaskOutcome::Failed { error, attempts } => {
            tracing::warn!(id = %ctx.id, attempts, error = %error, "task failed");
            ctx.event_tx
                .send(Event::TaskFailed {
                    id: ctx.id,
                    attempts,
                    error: error.to_string(),
                })
                .ok();
        }
    }
}

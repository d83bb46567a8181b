//! Drain and force-stop coordination.

use std::time::Duration;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::types::TerminalState;

/// Lifecycle of one batch, driven by [`ShutdownCoordinator::drain`]
///
/// `Completed` and `ForceStopped` are terminal; the coordinator is
/// consumed by `drain`, so it can never be reused for a second batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PoolState {
    /// Tasks actively execute; the batch is fully admitted
    Running,
    /// No new work is accepted; in-flight tasks may finish naturally
    Draining,
    /// Every task reached a terminal outcome within the budget
    Completed,
    /// The budget ran out (or an external cancel fired); remaining tasks
    /// were aborted
    ForceStopped,
}

/// Drives the pool through an orderly stop sequence with a hard timeout
pub(crate) struct ShutdownCoordinator {
    budget: Duration,
    cancel: CancellationToken,
    state: PoolState,
}

impl ShutdownCoordinator {
    pub(crate) fn new(budget: Duration, cancel: CancellationToken) -> Self {
        Self {
            budget,
            cancel,
            state: PoolState::Running,
        }
    }

    /// Wait for every task to finish, escalating to forced cancellation
    /// when the budget elapses
    ///
    /// The budget is measured from the moment `drain` is called, i.e.
    /// from the moment the batch is fully admitted. Escalation also
    /// fires when the cancellation token is cancelled externally
    /// (signal handler, caller-side cancel), so a force-stop never has
    /// to wait out the budget.
    pub(crate) async fn drain(mut self, tasks: &mut JoinSet<()>) -> TerminalState {
        self.state = PoolState::Draining;
        let deadline = tokio::time::Instant::now() + self.budget;
        tracing::debug!(
            state = ?self.state,
            remaining = tasks.len(),
            budget_secs = self.budget.as_secs_f64(),
            "draining pool"
        );

        loop {
            tokio::select! {
                joined = tasks.join_next() => match joined {
                    None => {
                        self.state = PoolState::Completed;
                        tracing::debug!("all tasks reached a terminal outcome");
                        return TerminalState::Completed;
                    }
                    Some(Ok(())) => {}
                    Some(Err(e)) if e.is_panic() => {
                        // A panicked task counts as terminated; its
                        // identifier is simply absent from the store.
                        tracing::error!(error = %e, "task panicked");
                    }
                    Some(Err(_)) => {}
                },
                _ = tokio::time::sleep_until(deadline) => {
                    tracing::warn!(
                        remaining = tasks.len(),
                        "shutdown budget elapsed, force-cancelling remaining tasks"
                    );
                    return self.force_stop(tasks).await;
                }
                _ = self.cancel.cancelled() => {
                    tracing::warn!(
                        remaining = tasks.len(),
                        "cancellation requested, force-cancelling remaining tasks"
                    );
                    return self.force_stop(tasks).await;
                }
            }
        }
    }

    /// Abort every remaining task and reap the handles
    ///
    /// Reaping matters: an aborted future may still run until its next
    /// await point, and a success that reaches the store insert before
    /// that point is kept. Awaiting every handle guarantees no write can
    /// land after `drain` returns.
    async fn force_stop(mut self, tasks: &mut JoinSet<()>) -> TerminalState {
        self.state = PoolState::ForceStopped;
        self.cancel.cancel();
        tasks.abort_all();
        while tasks.join_next().await.is_some() {}
        tracing::debug!(state = ?self.state, "remaining tasks reaped");
        TerminalState::ForceStopped
    }
}

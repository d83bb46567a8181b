use std::sync::Arc;
use std::time::Duration;

use crate::config::PoolConfig;
use crate::error::Error;
use crate::pool::FetchPool;
use crate::pool::test_helpers::{Script, ScriptedFetcher};
use crate::types::{Event, ResourceId, TerminalState};

fn config(parallelism: usize, max_attempts: u32) -> PoolConfig {
    PoolConfig {
        parallelism,
        max_attempts,
        shutdown_timeout: Duration::from_secs(10),
        ..Default::default()
    }
}

fn ids(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_all_first_try_successes_complete_with_one_entry_each() {
    let fetcher = Arc::new(ScriptedFetcher::new());
    let pool = FetchPool::new(config(4, 3)).unwrap();

    let outcome = pool
        .run(ids(&["a", "b", "c"]), fetcher.clone())
        .await
        .unwrap();

    assert_eq!(outcome.state, TerminalState::Completed);
    assert_eq!(outcome.store.len(), 3);
    for id in ["a", "b", "c"] {
        assert!(outcome.store.contains(&ResourceId::from(id)));
        assert_eq!(fetcher.calls_for(id), 1);
    }
}

#[tokio::test]
async fn test_stored_data_is_what_the_fetcher_returned() {
    let fetcher = Arc::new(ScriptedFetcher::new());
    let pool = FetchPool::new(config(2, 1)).unwrap();

    let outcome = pool.run(ids(&["page"]), fetcher).await.unwrap();

    let data = outcome.store.get(&ResourceId::from("page")).unwrap();
    assert_eq!(data.title, "Title of page");
    assert_eq!(data.links, vec!["/page/next", "/page/prev"]);
}

#[tokio::test]
async fn test_retry_mix_matches_attempt_accounting() {
    // A fails twice then succeeds, B fails every time, C succeeds
    // immediately. With max_attempts=3 the batch still completes: A and
    // C land in the store, B is absent after exactly 3 attempts.
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .script("A", Script::FailThenSucceed(2))
            .script("B", Script::Fail),
    );
    let pool = FetchPool::new(config(2, 3)).unwrap();

    let outcome = pool
        .run(ids(&["A", "B", "C"]), fetcher.clone())
        .await
        .unwrap();

    assert_eq!(outcome.state, TerminalState::Completed);
    assert_eq!(outcome.store.len(), 2);
    assert!(outcome.store.contains(&ResourceId::from("A")));
    assert!(outcome.store.contains(&ResourceId::from("C")));
    assert!(!outcome.store.contains(&ResourceId::from("B")));
    assert_eq!(fetcher.calls_for("A"), 3);
    assert_eq!(fetcher.calls_for("B"), 3);
    assert_eq!(fetcher.calls_for("C"), 1);
}

#[tokio::test]
async fn test_one_task_failure_never_blocks_siblings() {
    let fetcher = Arc::new(ScriptedFetcher::new().script("bad", Script::Fail));
    let pool = FetchPool::new(config(1, 3)).unwrap();

    let outcome = pool
        .run(ids(&["bad", "good-1", "good-2"]), fetcher)
        .await
        .unwrap();

    assert_eq!(outcome.state, TerminalState::Completed);
    assert_eq!(outcome.store.len(), 2);
}

#[tokio::test]
async fn test_parallelism_bound_holds_under_latency() {
    let fetcher = Arc::new(ScriptedFetcher::new().with_delay(Duration::from_millis(25)));
    let pool = FetchPool::new(config(2, 1)).unwrap();
    let identifiers: Vec<String> = (0..10).map(|i| format!("page-{i}")).collect();

    let outcome = pool.run(identifiers, fetcher.clone()).await.unwrap();

    assert_eq!(outcome.state, TerminalState::Completed);
    assert_eq!(outcome.store.len(), 10);
    assert!(
        fetcher.max_in_flight() <= 2,
        "admission bound violated: {} fetches ran concurrently",
        fetcher.max_in_flight()
    );
}

#[tokio::test]
async fn test_parallelism_one_serializes_all_fetches() {
    let fetcher = Arc::new(ScriptedFetcher::new().with_delay(Duration::from_millis(10)));
    let pool = FetchPool::new(config(1, 1)).unwrap();
    let identifiers: Vec<String> = (0..5).map(|i| format!("page-{i}")).collect();

    pool.run(identifiers, fetcher.clone()).await.unwrap();

    assert_eq!(fetcher.max_in_flight(), 1);
}

#[tokio::test]
async fn test_slow_fetches_force_stop_with_partial_store() {
    // Each fetch outlives the whole budget, so the batch must escalate
    // and the store holds at most whatever finished before the cutoff.
    let fetcher = Arc::new(ScriptedFetcher::new().with_delay(Duration::from_secs(30)));
    let config = PoolConfig {
        parallelism: 1,
        max_attempts: 1,
        shutdown_timeout: Duration::from_millis(50),
        ..Default::default()
    };
    let pool = FetchPool::new(config).unwrap();

    let outcome = pool.run(ids(&["X", "Y"]), fetcher).await.unwrap();

    assert_eq!(outcome.state, TerminalState::ForceStopped);
    assert!(outcome.store.len() <= 1);
}

#[tokio::test]
async fn test_zero_timeout_escalates_immediately() {
    let fetcher = Arc::new(ScriptedFetcher::new().with_delay(Duration::from_secs(30)));
    let config = PoolConfig {
        parallelism: 2,
        max_attempts: 1,
        shutdown_timeout: Duration::ZERO,
        ..Default::default()
    };
    let pool = FetchPool::new(config).unwrap();

    let start = std::time::Instant::now();
    let outcome = pool.run(ids(&["X"]), fetcher).await.unwrap();

    assert_eq!(outcome.state, TerminalState::ForceStopped);
    assert!(start.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_store_quiesces_after_force_stop() {
    let fetcher = Arc::new(ScriptedFetcher::new().with_delay(Duration::from_secs(30)));
    let config = PoolConfig {
        parallelism: 4,
        max_attempts: 1,
        shutdown_timeout: Duration::from_millis(20),
        ..Default::default()
    };
    let pool = FetchPool::new(config).unwrap();

    let outcome = pool
        .run(ids(&["a", "b", "c", "d"]), fetcher)
        .await
        .unwrap();
    assert_eq!(outcome.state, TerminalState::ForceStopped);

    // Aborted tasks are reaped before run returns, so no late write can
    // change the store afterwards.
    let len_at_return = outcome.store.len();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(outcome.store.len(), len_at_return);
}

#[tokio::test]
async fn test_external_cancel_force_stops_well_before_timeout() {
    let fetcher = Arc::new(ScriptedFetcher::new().with_delay(Duration::from_secs(30)));
    let config = PoolConfig {
        parallelism: 2,
        max_attempts: 1,
        shutdown_timeout: Duration::from_secs(60),
        ..Default::default()
    };
    let pool = FetchPool::new(config).unwrap();

    let cancel = pool.cancel_token();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel.cancel();
    });

    let start = std::time::Instant::now();
    let outcome = pool.run(ids(&["X", "Y"]), fetcher).await.unwrap();

    assert_eq!(outcome.state, TerminalState::ForceStopped);
    assert!(
        start.elapsed() < Duration::from_secs(10),
        "cancel should not wait out the shutdown budget"
    );
}

#[tokio::test]
async fn test_empty_batch_completes_with_empty_store() {
    let fetcher = Arc::new(ScriptedFetcher::new());
    let pool = FetchPool::new(config(4, 3)).unwrap();

    let outcome = pool.run(Vec::new(), fetcher.clone()).await.unwrap();

    assert_eq!(outcome.state, TerminalState::Completed);
    assert!(outcome.store.is_empty());
    assert_eq!(fetcher.total_calls(), 0);
}

#[tokio::test]
async fn test_duplicate_identifiers_run_independent_tasks() {
    let fetcher = Arc::new(ScriptedFetcher::new());
    let pool = FetchPool::new(config(2, 1)).unwrap();

    let outcome = pool
        .run(ids(&["dup", "dup", "dup"]), fetcher.clone())
        .await
        .unwrap();

    // Three independent tasks, one overwritten entry.
    assert_eq!(outcome.state, TerminalState::Completed);
    assert_eq!(fetcher.calls_for("dup"), 3);
    assert_eq!(outcome.store.len(), 1);
}

#[tokio::test]
async fn test_second_run_is_refused() {
    let fetcher = Arc::new(ScriptedFetcher::new());
    let pool = FetchPool::new(config(2, 1)).unwrap();

    pool.run(ids(&["a"]), fetcher.clone()).await.unwrap();
    let err = pool.run(ids(&["b"]), fetcher.clone()).await.unwrap_err();

    assert!(matches!(err, Error::ShuttingDown));
    assert_eq!(fetcher.calls_for("b"), 0);
}

#[tokio::test]
async fn test_invalid_config_fails_before_any_fetch() {
    let config = PoolConfig {
        parallelism: 0,
        ..Default::default()
    };

    match FetchPool::new(config) {
        Err(Error::Config { key, .. }) => assert_eq!(key.as_deref(), Some("parallelism")),
        other => panic!("expected Config error, got: {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn test_events_trace_the_batch() {
    let fetcher = Arc::new(ScriptedFetcher::new().script("bad", Script::Fail));
    let pool = FetchPool::new(config(2, 2)).unwrap();
    let mut events = pool.subscribe();

    let outcome = pool.run(ids(&["good", "bad"]), fetcher).await.unwrap();
    assert_eq!(outcome.state, TerminalState::Completed);

    let mut started = 0;
    let mut succeeded = Vec::new();
    let mut failed = Vec::new();
    let mut finished = None;
    while let Ok(event) = events.try_recv() {
        match event {
            Event::TaskStarted { .. } => started += 1,
            Event::TaskSucceeded { id, attempts } => succeeded.push((id, attempts)),
            Event::TaskFailed { id, attempts, .. } => failed.push((id, attempts)),
            Event::BatchFinished { state, stored } => finished = Some((state, stored)),
        }
    }

    assert_eq!(started, 2);
    assert_eq!(succeeded, vec![(ResourceId::from("good"), 1)]);
    assert_eq!(failed, vec![(ResourceId::from("bad"), 2)]);
    assert_eq!(finished, Some((TerminalState::Completed, 1)));
}

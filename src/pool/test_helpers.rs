//! Shared test helpers: scripted fetchers with call and concurrency accounting.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::FetchError;
use crate::fetcher::PageFetcher;
use crate::types::{PageData, ResourceId};

/// Build a small page whose title is derived from the identifier
pub(crate) fn page_for(id: &str) -> PageData {
    PageData {
        title: format!("Title of {id}"),
        links: vec![format!("/{id}/next"), format!("/{id}/prev")],
    }
}

/// What the scripted fetcher does for one identifier
pub(crate) enum Script {
    /// Fail on every call
    Fail,
    /// Fail this many times, then succeed
    FailThenSucceed(u32),
}

/// Fetcher driven by per-identifier scripts
///
/// Identifiers without a script always succeed. Every call is counted
/// per identifier, and the peak number of concurrently executing
/// fetches is tracked so tests can assert the parallelism bound.
pub(crate) struct ScriptedFetcher {
    scripts: HashMap<String, Script>,
    delay: Duration,
    calls: Mutex<HashMap<String, u32>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedFetcher {
    pub(crate) fn new() -> Self {
        Self {
            scripts: HashMap::new(),
            delay: Duration::ZERO,
            calls: Mutex::new(HashMap::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Make every fetch take this long (simulates network latency)
    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Script the outcome sequence for one identifier
    pub(crate) fn script(mut self, id: &str, script: Script) -> Self {
        self.scripts.insert(id.to_string(), script);
        self
    }

    /// Number of fetch calls made for one identifier
    pub(crate) fn calls_for(&self, id: &str) -> u32 {
        self.calls.lock().unwrap().get(id).copied().unwrap_or(0)
    }

    /// Number of fetch calls made across all identifiers
    pub(crate) fn total_calls(&self) -> u32 {
        self.calls.lock().unwrap().values().sum()
    }

    /// Peak number of fetches that were executing at the same instant
    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

/// Decrements the in-flight gauge when dropped, including when the
/// owning fetch future is abandoned mid-call by a forced cancellation
struct InFlightGuard<'a> {
    in_flight: &'a AtomicUsize,
}

impl<'a> InFlightGuard<'a> {
    fn enter(in_flight: &'a AtomicUsize, max_in_flight: &AtomicUsize) -> Self {
        let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        max_in_flight.fetch_max(now, Ordering::SeqCst);
        Self { in_flight }
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl PageFetcher for ScriptedFetcher {
    async fn fetch(&self, id: &ResourceId) -> Result<PageData, FetchError> {
        let call = {
            let mut calls = self.calls.lock().unwrap();
            let count = calls.entry(id.as_str().to_string()).or_insert(0);
            *count += 1;
            *count
        };

        let _gauge = InFlightGuard::enter(&self.in_flight, &self.max_in_flight);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        match self.scripts.get(id.as_str()) {
            Some(Script::Fail) => Err(FetchError::Other(format!("scripted failure for {id}"))),
            Some(Script::FailThenSucceed(failures)) if call <= *failures => Err(
                FetchError::Other(format!("scripted failure {call} for {id}")),
            ),
            _ => Ok(page_for(id.as_str())),
        }
    }
}

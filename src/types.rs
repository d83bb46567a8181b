//! Core types for scrape-pool

use serde::{Deserialize, Serialize};

use crate::error::FetchError;
use crate::store::ResultStore;

/// Identifier for one unit of fetch work, typically a URL
///
/// Identifiers are opaque to the engine. Uniqueness within a batch is
/// not required — duplicates become independent tasks that overwrite
/// each other's (identical) entry in the result store.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(pub String);

impl ResourceId {
    /// Create a new ResourceId
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ResourceId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for ResourceId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl std::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Title and outbound links extracted from one fetched page
///
/// Immutable once constructed. Links keep document order and raw
/// `href` values; relative links are not resolved.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageData {
    /// The page's `<title>` text, empty if the document has none
    pub title: String,
    /// `href` attribute of every `<a href>` element, in document order
    pub links: Vec<String>,
}

/// Terminal result of one task's retry loop, produced exactly once per task
#[derive(Debug)]
pub enum TaskOutcome {
    /// The fetch succeeded within the attempt ceiling
    Success {
        /// The fetched page data
        data: PageData,
        /// Number of attempts consumed, first try included
        attempts: u32,
    },
    /// Every permitted attempt failed
    Failed {
        /// The error returned by the final attempt
        error: FetchError,
        /// Number of attempts consumed
        attempts: u32,
    },
}

/// How a batch terminated
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalState {
    /// Every task reached a terminal outcome before the shutdown timeout
    Completed,
    /// The timeout elapsed (or an external cancel fired) and remaining
    /// tasks were force-cancelled; their identifiers are simply absent
    /// from the store
    ForceStopped,
}

impl TerminalState {
    /// True if every task produced a terminal outcome
    pub fn is_completed(&self) -> bool {
        matches!(self, TerminalState::Completed)
    }
}

/// Events broadcast while a batch runs
///
/// Subscribers that fall behind lose the oldest events (`RecvError::Lagged`);
/// the engine never blocks on a slow subscriber.
#[derive(Clone, Debug)]
pub enum Event {
    /// A task acquired a worker slot and is about to fetch
    TaskStarted {
        /// The task's identifier
        id: ResourceId,
    },
    /// A task fetched its page and stored the result
    TaskSucceeded {
        /// The task's identifier
        id: ResourceId,
        /// Attempts consumed, first try included
        attempts: u32,
    },
    /// A task exhausted its attempts
    TaskFailed {
        /// The task's identifier
        id: ResourceId,
        /// Attempts consumed
        attempts: u32,
        /// Display form of the final attempt's error
        error: String,
    },
    /// The batch reached a terminal state
    BatchFinished {
        /// How the batch terminated
        state: TerminalState,
        /// Number of entries in the result store at termination
        stored: usize,
    },
}

/// What [`FetchPool::run`](crate::pool::FetchPool::run) returns
#[derive(Clone, Debug)]
pub struct BatchOutcome {
    /// How the batch terminated
    pub state: TerminalState,
    /// The populated result store; read-only from this point on
    pub store: ResultStore,
}

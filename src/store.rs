//! Concurrent aggregation of fetched results
//!
//! The store is the only resource shared across tasks. Insertion is the
//! only mutation — no updates, no deletes. Any number of tasks may
//! insert concurrently without blocking each other on unrelated keys;
//! the shutdown protocol (not the store) guarantees that readers only
//! snapshot after all writers have quiesced.

use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;

use crate::types::{PageData, ResourceId};

/// Thread-safe mapping from resource identifier to fetched page data
///
/// Cheap to clone — clones share the same underlying map.
#[derive(Clone, Debug, Default)]
pub struct ResultStore {
    entries: Arc<DashMap<ResourceId, PageData>>,
}

impl ResultStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert one fetched result
    ///
    /// Called by worker tasks on success. Duplicate identifiers in a
    /// batch overwrite each other with the identical value; each
    /// individual write is atomic.
    pub fn insert(&self, id: ResourceId, data: PageData) {
        self.entries.insert(id, data);
    }

    /// Look up the result for one identifier, cloning it out
    pub fn get(&self, id: &ResourceId) -> Option<PageData> {
        self.entries.get(id).map(|entry| entry.value().clone())
    }

    /// True if a result exists for `id`
    pub fn contains(&self, id: &ResourceId) -> bool {
        self.entries.contains_key(id)
    }

    /// Number of stored results
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no results are stored
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Clone the current contents into a plain map
    ///
    /// Only meaningful after the batch reached a terminal state; the
    /// shutdown protocol guarantees all writers have quiesced by then.
    pub fn snapshot(&self) -> HashMap<ResourceId, PageData> {
        self.entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }
}

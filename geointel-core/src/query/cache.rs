//! Stale-while-revalidate response cache
//!
//! Entries are keyed by scope plus the sorted resolved parameters. An entry
//! younger than `fresh_for` is served as-is; an older one is still served but
//! reported stale so the caller can refetch it in the background. Nothing is
//! evicted except through [`QueryCache::invalidate`] or [`QueryCache::clear`].

use dashmap::{DashMap, DashSet};
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Arc<Value>,
    fetched_at: Instant,
}

impl CacheEntry {
    fn is_fresh(&self, fresh_for: Duration) -> bool {
        self.fetched_at.elapsed() < fresh_for
    }
}

/// Outcome of a cache lookup
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup {
    Fresh(Arc<Value>),
    /// Usable, but due for a background refetch
    Stale(Arc<Value>),
    Miss,
}

impl CacheLookup {
    pub fn value(&self) -> Option<&Arc<Value>> {
        match self {
            CacheLookup::Fresh(v) | CacheLookup::Stale(v) => Some(v),
            CacheLookup::Miss => None,
        }
    }
}

/// Shared handle; clones see the same entries.
#[derive(Debug, Clone)]
pub struct QueryCache {
    entries: Arc<DashMap<String, CacheEntry>>,
    revalidating: Arc<DashSet<String>>,
    fresh_for: Duration,
}

impl QueryCache {
    pub fn new(fresh_for: Duration) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            revalidating: Arc::new(DashSet::new()),
            fresh_for,
        }
    }

    pub fn lookup(&self, key: &str) -> CacheLookup {
        match self.entries.get(key) {
            Some(entry) if entry.is_fresh(self.fresh_for) => CacheLookup::Fresh(entry.value.clone()),
            Some(entry) => CacheLookup::Stale(entry.value.clone()),
            None => CacheLookup::Miss,
        }
    }

    pub fn store(&self, key: &str, value: Value) -> Arc<Value> {
        let value = Arc::new(value);
        self.entries.insert(
            key.to_string(),
            CacheEntry { value: value.clone(), fetched_at: Instant::now() },
        );
        value
    }

    /// Claim the background refetch for `key`. Returns false if one is
    /// already running.
    pub fn begin_revalidation(&self, key: &str) -> bool {
        self.revalidating.insert(key.to_string())
    }

    pub fn end_revalidation(&self, key: &str) {
        self.revalidating.remove(key);
    }

    /// Drop every entry whose key starts with `prefix`.
    pub fn invalidate(&self, prefix: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| !key.starts_with(prefix));
        let removed = before.saturating_sub(self.entries.len());
        debug!("invalidated {} cache entries under '{}'", removed, prefix);
        removed
    }

    pub fn clear(&self) {
        self.entries.clear();
        self.revalidating.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

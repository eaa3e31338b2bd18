//! Time-bounded cache in front of a search backend.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::debug;

use super::{WebSearch, WebSearchResponse};

#[derive(Debug, Clone)]
struct CacheEntry {
    stored_at: Instant,
    response: WebSearchResponse,
}

/// Caches search responses per query.
///
/// Entries expire after `ttl`. When full, the oldest entry is dropped.
/// Empty responses are not cached so a transient failure is retried.
#[derive(Debug)]
pub struct CachedSearch<S> {
    inner: S,
    ttl: Duration,
    max_entries: usize,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl<S: WebSearch> CachedSearch<S> {
    /// Wraps a backend.
    #[must_use]
    pub fn new(inner: S, ttl: Duration, max_entries: usize) -> Self {
        Self {
            inner,
            ttl,
            max_entries: max_entries.max(1),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the number of live and expired entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns true if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    fn lookup(&self, query: &str) -> Option<WebSearchResponse> {
        let mut entries = self.entries.lock();
        match entries.get(query) {
            Some(entry) if entry.stored_at.elapsed() < self.ttl => Some(entry.response.clone()),
            Some(_) => {
                entries.remove(query);
                None
            }
            None => None,
        }
    }

    fn store(&self, query: &str, response: &WebSearchResponse) {
        let mut entries = self.entries.lock();
        entries.retain(|_, entry| entry.stored_at.elapsed() < self.ttl);
        if entries.len() >= self.max_entries && !entries.contains_key(query) {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.stored_at)
                .map(|(key, _)| key.clone());
            if let Some(oldest) = oldest {
                entries.remove(&oldest);
            }
        }
        entries.insert(
            query.to_string(),
            CacheEntry {
                stored_at: Instant::now(),
                response: response.clone(),
            },
        );
    }
}

#[async_trait]
impl<S: WebSearch> WebSearch for CachedSearch<S> {
    fn is_enabled(&self) -> bool {
        self.inner.is_enabled()
    }

    async fn search(&self, query: &str) -> WebSearchResponse {
        if let Some(hit) = self.lookup(query) {
            debug!(query, "Search cache hit");
            return hit;
        }

        let response = self.inner.search(query).await;
        if !response.results.is_empty() {
            self.store(query, &response);
        }
        response
    }
}

//! Memoizing inference cache keyed by exact prompt text.

use std::num::NonZeroUsize;

use async_trait::async_trait;
use lru::LruCache;
use tracing::debug;

use crate::inference::{FAILURE_PREFIX, Inference};

/// Default maximum number of cached prompts.
pub const DEFAULT_CAPACITY: usize = 4096;

/// Hit/miss counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// Wraps an [`Inference`] and replays responses for byte-identical prompts.
///
/// Bounded: past `capacity` entries the least recently used prompt is evicted.
/// A replayed response skips both the backend and its rate gate. Failure
/// sentinels are not cached, so a transient outage does not pin `Other`
/// onto a prompt for the rest of the run.
pub struct CachedInference<I> {
    inner: I,
    entries: LruCache<String, String>,
    stats: CacheStats,
}

impl<I: Inference> CachedInference<I> {
    pub fn new(inner: I) -> Self {
        Self::with_capacity(inner, DEFAULT_CAPACITY)
    }

    /// A capacity of zero is treated as one.
    pub fn with_capacity(inner: I, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner,
            entries: LruCache::new(capacity),
            stats: CacheStats::default(),
        }
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn inner(&self) -> &I {
        &self.inner
    }
}

#[async_trait]
impl<I: Inference> Inference for CachedInference<I> {
    async fn call(&mut self, prompt: &str) -> String {
        if let Some(hit) = self.entries.get(prompt) {
            self.stats.hits += 1;
            debug!(hits = self.stats.hits, "inference cache hit");
            return hit.clone();
        }

        self.stats.misses += 1;
        let response = self.inner.call(prompt).await;
        if !response.starts_with(FAILURE_PREFIX) {
            self.entries.put(prompt.to_string(), response.clone());
        }
        response
    }
}

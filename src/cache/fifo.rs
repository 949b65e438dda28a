//! FIFO cache of rendered chart surfaces.

use std::num::NonZeroUsize;

use lru::LruCache;
use serde::Serialize;

use crate::pool::{CanvasPool, Surface};
use crate::score::CanonicalScore;

/// A cached surface.
#[derive(Debug)]
pub struct CacheEntry {
    /// Rendered chart. Read-only: callers copy it, never draw on it.
    pub surface: Surface,

    /// Insertion sequence number.
    pub inserted_at: u64,
}

/// Cache statistics.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct CacheStats {
    /// Current number of entries.
    pub size: usize,

    /// Maximum capacity.
    pub capacity: usize,

    /// Number of cache hits.
    pub hits: u64,

    /// Number of cache misses.
    pub misses: u64,

    /// Entries pushed out at capacity.
    pub evictions: u64,
}

impl CacheStats {
    /// Calculates the hit rate.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Render cache keyed by canonical score.
///
/// Backed by [`LruCache`], but lookups go through `peek` so entries are
/// never promoted: eviction order is insertion order. An evicted surface
/// goes back to the [`CanvasPool`] it came from.
pub struct RenderCache {
    cache: LruCache<String, CacheEntry>,
    sequence: u64,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl RenderCache {
    /// Creates a cache holding at most `capacity` surfaces (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: LruCache::new(cap),
            sequence: 0,
            hits: 0,
            misses: 0,
            evictions: 0,
        }
    }

    /// Cache key for a score.
    pub fn cache_key(score: &CanonicalScore) -> String {
        score.cache_key()
    }

    /// Looks up the surface rendered for `score`, counting the hit or miss.
    pub fn get(&mut self, score: &CanonicalScore) -> Option<&Surface> {
        let key = Self::cache_key(score);
        if self.cache.contains(&key) {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
        self.cache.peek(&key).map(|entry| &entry.surface)
    }

    /// Looks up the surface for `score` without touching the counters.
    pub fn peek(&self, score: &CanonicalScore) -> Option<&Surface> {
        self.cache.peek(&Self::cache_key(score)).map(|entry| &entry.surface)
    }

    /// True when `score` is cached. Does not touch the counters.
    pub fn contains(&self, score: &CanonicalScore) -> bool {
        self.cache.contains(&Self::cache_key(score))
    }

    /// Inserts a rendered surface.
    ///
    /// At capacity the oldest entry is evicted and its surface released to
    /// `pool`. Re-inserting a key releases the surface it replaces.
    pub fn put(&mut self, score: &CanonicalScore, surface: Surface, pool: &mut CanvasPool) {
        let key = Self::cache_key(score);
        self.sequence += 1;
        let entry = CacheEntry {
            surface,
            inserted_at: self.sequence,
        };

        if let Some((old_key, old)) = self.cache.push(key.clone(), entry) {
            if old_key != key {
                self.evictions += 1;
                tracing::trace!(
                    inserted_at = old.inserted_at,
                    surface = %old.surface.id(),
                    "Evicting oldest cached chart"
                );
            }
            pool.release(old.surface);
        }
    }

    /// Removes one entry, returning its surface to the pool.
    pub fn invalidate(&mut self, score: &CanonicalScore, pool: &mut CanvasPool) -> bool {
        match self.cache.pop(&Self::cache_key(score)) {
            Some(entry) => {
                pool.release(entry.surface);
                true
            }
            None => false,
        }
    }

    /// Empties the cache, returning every surface to the pool.
    pub fn clear(&mut self, pool: &mut CanvasPool) -> usize {
        let mut released = 0;
        while let Some((_, entry)) = self.cache.pop_lru() {
            pool.release(entry.surface);
            released += 1;
        }
        released
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Returns cache statistics.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            size: self.cache.len(),
            capacity: self.cache.cap().get(),
            hits: self.hits,
            misses: self.misses,
            evictions: self.evictions,
        }
    }
}

impl std::fmt::Debug for RenderCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderCache").field("stats", &self.stats()).finish()
    }
}

//! Render metrics.

use std::time::Duration;

use serde::Serialize;

use crate::cache::CacheStats;
use crate::pool::PoolStats;

/// Counters kept by the scheduler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RenderMetrics {
    /// Charts drawn (cache misses that rendered successfully).
    pub render_count: u64,

    /// Time spent drawing, summed over `render_count`.
    pub total_render_time: Duration,

    pub cache_hits: u64,
    pub cache_misses: u64,

    /// Requests whose draw or attach failed.
    pub failures: u64,

    /// Default charts attached after a failure.
    pub fallbacks: u64,
}

impl RenderMetrics {
    /// Mean draw time, zero before the first render.
    pub fn average_render_time(&self) -> Duration {
        if self.render_count == 0 {
            Duration::ZERO
        } else {
            self.total_render_time / self.render_count as u32
        }
    }

    /// Calculates the cache hit rate.
    pub fn cache_hit_rate(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            0.0
        } else {
            self.cache_hits as f64 / total as f64
        }
    }

    pub(crate) fn record_render(&mut self, elapsed: Duration) {
        self.render_count += 1;
        self.total_render_time += elapsed;
    }
}

/// Point-in-time view of the scheduler.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub render: RenderMetrics,
    pub pool: PoolStats,
    /// `None` when the cache is disabled.
    pub cache: Option<CacheStats>,
    /// Targets waiting out their debounce window.
    pub pending: usize,
    /// Requests waiting for a dispatch slot.
    pub queued: usize,
    /// Worker jobs not yet completed.
    pub in_flight: usize,
}

impl MetricsSnapshot {
    /// Logs the snapshot as one structured event.
    pub fn log(&self) {
        tracing::info!(
            renders = self.render.render_count,
            avg_render_ms = self.render.average_render_time().as_secs_f64() * 1000.0,
            cache_hit_rate = self.render.cache_hit_rate(),
            failures = self.render.failures,
            pool_free = self.pool.free,
            cache_size = self.cache.map(|c| c.size).unwrap_or(0),
            pending = self.pending,
            queued = self.queued,
            in_flight = self.in_flight,
            "Render metrics"
        );
    }
}

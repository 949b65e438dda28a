//! Debounced, batched render dispatch.

use std::collections::{HashMap, VecDeque};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use uuid::Uuid;

use crate::cache::RenderCache;
use crate::mount::{Mount, TargetId};
use crate::pool::{CanvasPool, Surface, SurfaceId};
use crate::render::{panic_message, ChartRenderer, JobCompletion, RenderJob, RenderStrategy};
use crate::score::CanonicalScore;
use crate::types::config::{Config, StrategyKind};
use crate::{RadarError, RadarResult};

use super::metrics::{MetricsSnapshot, RenderMetrics};

// ═══════════════════════════════════════════════════════════════════════════
// Requests and outcomes
// ═══════════════════════════════════════════════════════════════════════════

/// Invoked once a request's chart is attached to its target.
pub type RenderCallback = Box<dyn FnOnce(RenderOutcome) + Send + 'static>;

/// Where the attached pixels came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderSource {
    Cache,
    Rendered,
}

/// Passed to a request's callback.
#[derive(Debug, Clone)]
pub struct RenderOutcome {
    pub request_id: Uuid,
    pub target: TargetId,
    pub score: CanonicalScore,
    pub source: RenderSource,
}

/// One entry for [`RenderScheduler::enqueue_batch`].
pub struct RenderItem {
    pub target: TargetId,
    pub score: CanonicalScore,
    pub callback: Option<RenderCallback>,
}

impl RenderItem {
    pub fn new(target: impl Into<TargetId>, score: CanonicalScore) -> Self {
        Self {
            target: target.into(),
            score,
            callback: None,
        }
    }

    pub fn with_callback(mut self, callback: impl FnOnce(RenderOutcome) + Send + 'static) -> Self {
        self.callback = Some(Box::new(callback));
        self
    }
}

/// Lifecycle of a target's latest request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetState {
    Idle,
    Debouncing,
    Queued,
    Dispatched,
}

struct RenderRequest {
    id: Uuid,
    target: TargetId,
    score: CanonicalScore,
    callback: Option<RenderCallback>,
}

struct Pending {
    request: RenderRequest,
    deadline: Instant,
    seq: u64,
}

/// What one tick did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TickReport {
    /// Debounced requests moved to the dispatch queue.
    pub promoted: usize,
    /// Requests taken off the queue.
    pub dispatched: usize,
    pub cache_hits: usize,
    /// Charts drawn and attached, inline or from finished worker jobs.
    pub rendered: usize,
    pub failed: usize,
}

/// Returned by [`RenderScheduler::shutdown`].
#[derive(Debug, Clone, Serialize)]
pub struct ShutdownReport {
    pub dropped_pending: usize,
    pub dropped_queued: usize,
    pub abandoned_in_flight: usize,
    pub cached_released: usize,
    pub pool_drained: usize,
    pub metrics: RenderMetrics,
}

// ═══════════════════════════════════════════════════════════════════════════
// Render context
// ═══════════════════════════════════════════════════════════════════════════

/// Pool, cache, strategy and mount, built once and owned by one scheduler.
pub struct RenderContext {
    pool: CanvasPool,
    cache: Option<RenderCache>,
    strategy: RenderStrategy,
    mount: Box<dyn Mount>,
    metrics: RenderMetrics,
    /// The flat default chart, drawn once. Lives outside the pool.
    fallback: Option<Surface>,
}

impl RenderContext {
    pub fn new(
        config: &Config,
        renderer: Arc<dyn ChartRenderer>,
        mount: Box<dyn Mount>,
    ) -> RadarResult<Self> {
        let pool = CanvasPool::new(&config.pool)?;
        let cache = config
            .cache
            .enabled
            .then(|| RenderCache::new(config.cache.capacity));
        let strategy = RenderStrategy::select(config.renderer.strategy, renderer);
        let fallback = draw_fallback(&strategy, pool.surface_size());

        tracing::info!(
            strategy = %strategy.kind(),
            cache = cache.is_some(),
            pool_max = pool.max_size(),
            fallback = fallback.is_some(),
            "Render context ready"
        );

        Ok(Self {
            pool,
            cache,
            strategy,
            mount,
            metrics: RenderMetrics::default(),
            fallback,
        })
    }

    pub fn pool(&self) -> &CanvasPool {
        &self.pool
    }

    pub fn cache(&self) -> Option<&RenderCache> {
        self.cache.as_ref()
    }

    pub fn strategy_kind(&self) -> StrategyKind {
        self.strategy.kind()
    }

    pub fn metrics(&self) -> &RenderMetrics {
        &self.metrics
    }

    /// The pre-drawn default chart shown for failed requests.
    pub fn fallback(&self) -> Option<&Surface> {
        self.fallback.as_ref()
    }
}

/// Draws the default chart on a surface of its own (id 0, never pooled).
fn draw_fallback(strategy: &RenderStrategy, (width, height): (u32, u32)) -> Option<Surface> {
    let mut surface = Surface::new(SurfaceId(0), width, height)?;
    match strategy.draw_now(&mut surface, &CanonicalScore::DEFAULT) {
        Ok(()) => Some(surface),
        Err(err) => {
            tracing::warn!(error = %err, "Default chart could not be drawn, failed requests stay blank");
            None
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Scheduler
// ═══════════════════════════════════════════════════════════════════════════

/// Coalesces render requests per target and dispatches them in batches.
///
/// Time is passed in explicitly (`*_at` methods) so the state machine can
/// be driven deterministically; the plain variants use `Instant::now()`.
/// Each target moves `idle → debouncing → queued → dispatched → idle`. A
/// newer request replaces a debouncing one and restarts its window; once
/// queued a request is never replaced.
pub struct RenderScheduler {
    ctx: RenderContext,
    debounce: Duration,
    batch_size: usize,
    max_concurrent: usize,
    pending: HashMap<TargetId, Pending>,
    queue: VecDeque<RenderRequest>,
    in_flight: HashMap<u64, RenderRequest>,
    next_job: u64,
    next_seq: u64,
    stopped: bool,
}

impl RenderScheduler {
    /// Builds a scheduler with a fresh [`RenderContext`].
    pub fn new(
        config: &Config,
        renderer: Arc<dyn ChartRenderer>,
        mount: Box<dyn Mount>,
    ) -> RadarResult<Self> {
        config.validate()?;
        let ctx = RenderContext::new(config, renderer, mount)?;
        Ok(Self::with_context(ctx, config))
    }

    /// Builds a scheduler around an existing context.
    pub fn with_context(ctx: RenderContext, config: &Config) -> Self {
        Self {
            ctx,
            debounce: config.scheduler.debounce(),
            batch_size: config.scheduler.batch_size.max(1),
            max_concurrent: config.scheduler.max_concurrent.max(1),
            pending: HashMap::new(),
            queue: VecDeque::new(),
            in_flight: HashMap::new(),
            next_job: 0,
            next_seq: 0,
            stopped: false,
        }
    }

    pub fn context(&self) -> &RenderContext {
        &self.ctx
    }

    /// Queues a render for `target`. See [`RenderScheduler::enqueue_at`].
    pub fn enqueue(
        &mut self,
        target: impl Into<TargetId>,
        score: CanonicalScore,
        callback: Option<RenderCallback>,
    ) -> Uuid {
        self.enqueue_at(target, score, callback, Instant::now())
    }

    /// Queues a render for `target` as of `now`.
    ///
    /// Replaces any request still debouncing for the same target; its
    /// callback is dropped without being called.
    pub fn enqueue_at(
        &mut self,
        target: impl Into<TargetId>,
        score: CanonicalScore,
        callback: Option<RenderCallback>,
        now: Instant,
    ) -> Uuid {
        let target = target.into();
        let id = Uuid::new_v4();
        if self.stopped {
            tracing::warn!(target_id = %target, "Scheduler stopped, ignoring render request");
            return id;
        }

        self.next_seq += 1;
        let pending = Pending {
            request: RenderRequest {
                id,
                target: target.clone(),
                score,
                callback,
            },
            deadline: now + self.debounce,
            seq: self.next_seq,
        };

        if let Some(previous) = self.pending.insert(target.clone(), pending) {
            tracing::trace!(
                target_id = %target,
                replaced = %previous.request.id,
                "Debounced render request"
            );
        }
        id
    }

    /// Enqueues every item; debounce applies per target.
    pub fn enqueue_batch(&mut self, items: Vec<RenderItem>) -> Vec<Uuid> {
        self.enqueue_batch_at(items, Instant::now())
    }

    pub fn enqueue_batch_at(&mut self, items: Vec<RenderItem>, now: Instant) -> Vec<Uuid> {
        items
            .into_iter()
            .map(|item| self.enqueue_at(item.target, item.score, item.callback, now))
            .collect()
    }

    /// Runs one dispatch pass. See [`RenderScheduler::tick_at`].
    pub fn tick(&mut self) -> TickReport {
        self.tick_at(Instant::now())
    }

    /// Runs one dispatch pass as of `now`.
    ///
    /// Finished worker jobs are attached first, then expired debounce
    /// windows are promoted in deadline order, then up to `batch_size`
    /// requests are dispatched while fewer than `max_concurrent` worker
    /// jobs are running.
    pub fn tick_at(&mut self, now: Instant) -> TickReport {
        let mut report = TickReport::default();
        if self.stopped {
            return report;
        }

        for completion in self.ctx.strategy.collect() {
            match self.in_flight.remove(&completion.id) {
                Some(request) => self.complete(request, completion, &mut report),
                None => self.ctx.pool.release(completion.surface),
            }
        }

        let mut due: Vec<(Instant, u64, TargetId)> = self
            .pending
            .iter()
            .filter(|(_, pending)| pending.deadline <= now)
            .map(|(target, pending)| (pending.deadline, pending.seq, target.clone()))
            .collect();
        due.sort();
        for (_, _, target) in due {
            if let Some(pending) = self.pending.remove(&target) {
                self.queue.push_back(pending.request);
                report.promoted += 1;
            }
        }

        while report.dispatched < self.batch_size && self.in_flight.len() < self.max_concurrent {
            let Some(request) = self.queue.pop_front() else {
                break;
            };
            report.dispatched += 1;
            self.dispatch(request, &mut report);
        }

        report
    }

    fn dispatch(&mut self, request: RenderRequest, report: &mut TickReport) {
        let hit = match self.ctx.cache.as_mut() {
            Some(cache) => cache
                .get(&request.score)
                .map(|surface| self.ctx.mount.attach(&request.target, surface)),
            None => None,
        };

        match hit {
            Some(Ok(())) => {
                self.ctx.metrics.cache_hits += 1;
                report.cache_hits += 1;
                tracing::debug!(target_id = %request.target, "Chart served from cache");
                fire(request, RenderSource::Cache);
                return;
            }
            Some(Err(err)) => {
                self.ctx.metrics.cache_hits += 1;
                self.fail(request, err, report);
                return;
            }
            None => self.ctx.metrics.cache_misses += 1,
        }

        self.next_job += 1;
        let job = RenderJob {
            id: self.next_job,
            surface: self.ctx.pool.checkout(),
            score: request.score,
        };
        match self.ctx.strategy.submit(job) {
            Some(completion) => self.complete(request, completion, report),
            None => {
                self.in_flight.insert(self.next_job, request);
            }
        }
    }

    fn complete(&mut self, request: RenderRequest, completion: JobCompletion, report: &mut TickReport) {
        let JobCompletion {
            surface,
            result,
            elapsed,
            ..
        } = completion;

        let attached = result.and_then(|()| self.ctx.mount.attach(&request.target, &surface));
        match attached {
            Ok(()) => {
                self.ctx.metrics.record_render(elapsed);
                match self.ctx.cache.as_mut() {
                    Some(cache) => cache.put(&request.score, surface, &mut self.ctx.pool),
                    None => self.ctx.pool.release(surface),
                }
                report.rendered += 1;
                tracing::debug!(
                    target_id = %request.target,
                    elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                    "Chart rendered"
                );
                fire(request, RenderSource::Rendered);
            }
            Err(err) => {
                self.ctx.pool.release(surface);
                self.fail(request, err, report);
            }
        }
    }

    fn fail(&mut self, request: RenderRequest, err: RadarError, report: &mut TickReport) {
        self.ctx.metrics.failures += 1;
        report.failed += 1;
        tracing::error!(
            target_id = %request.target,
            request_id = %request.id,
            error = %err,
            "Render request failed"
        );

        match self.attach_fallback(&request.target) {
            Ok(()) => self.ctx.metrics.fallbacks += 1,
            Err(err) => tracing::warn!(
                target_id = %request.target,
                error = %err,
                "Could not attach default chart"
            ),
        }
    }

    /// Shows the flat default chart on `target`. Never retries.
    fn attach_fallback(&mut self, target: &TargetId) -> RadarResult<()> {
        match self.ctx.fallback.as_ref() {
            Some(surface) => self.ctx.mount.attach(target, surface),
            None => Err(RadarError::render(target.as_str(), "default chart unavailable")),
        }
    }

    /// Renders and caches scores that are not cached yet, bypassing the
    /// queue. Returns how many were added.
    pub fn preload(&mut self, scores: &[CanonicalScore]) -> usize {
        let Some(cache) = self.ctx.cache.as_mut() else {
            return 0;
        };

        let mut added = 0;
        for score in scores {
            if cache.contains(score) {
                continue;
            }
            let mut surface = self.ctx.pool.checkout();
            let started = Instant::now();
            match self.ctx.strategy.draw_now(&mut surface, score) {
                Ok(()) => {
                    self.ctx.metrics.record_render(started.elapsed());
                    cache.put(score, surface, &mut self.ctx.pool);
                    added += 1;
                }
                Err(err) => {
                    self.ctx.pool.release(surface);
                    tracing::warn!(error = %err, "Preload render failed");
                }
            }
        }

        tracing::debug!(requested = scores.len(), added, "Preloaded charts");
        added
    }

    /// Where the latest request for `target` stands.
    pub fn target_state(&self, target: &TargetId) -> TargetState {
        if self.pending.contains_key(target) {
            TargetState::Debouncing
        } else if self.queue.iter().any(|r| &r.target == target) {
            TargetState::Queued
        } else if self.in_flight.values().any(|r| &r.target == target) {
            TargetState::Dispatched
        } else {
            TargetState::Idle
        }
    }

    /// True when nothing is debouncing, queued or running.
    pub fn is_idle(&self) -> bool {
        self.pending.is_empty() && self.queue.is_empty() && self.in_flight.is_empty()
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            render: self.ctx.metrics,
            pool: self.ctx.pool.stats(),
            cache: self.ctx.cache.as_ref().map(RenderCache::stats),
            pending: self.pending.len(),
            queued: self.queue.len(),
            in_flight: self.in_flight.len(),
        }
    }

    /// Drops outstanding requests, empties the cache into the pool and
    /// tears the pool down. Later enqueues are ignored.
    pub fn shutdown(&mut self) -> ShutdownReport {
        for completion in self.ctx.strategy.collect() {
            self.in_flight.remove(&completion.id);
            self.ctx.pool.release(completion.surface);
        }

        let report = ShutdownReport {
            dropped_pending: self.pending.len(),
            dropped_queued: self.queue.len(),
            abandoned_in_flight: self.in_flight.len(),
            cached_released: match self.ctx.cache.as_mut() {
                Some(cache) => cache.clear(&mut self.ctx.pool),
                None => 0,
            },
            pool_drained: 0,
            metrics: self.ctx.metrics,
        };
        self.pending.clear();
        self.queue.clear();
        self.in_flight.clear();
        let report = ShutdownReport {
            pool_drained: self.ctx.pool.drain(),
            ..report
        };
        self.stopped = true;

        tracing::info!(
            dropped_pending = report.dropped_pending,
            dropped_queued = report.dropped_queued,
            abandoned_in_flight = report.abandoned_in_flight,
            cached_released = report.cached_released,
            pool_drained = report.pool_drained,
            "Render scheduler shut down"
        );
        report
    }
}

impl std::fmt::Debug for RenderScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderScheduler")
            .field("strategy", &self.ctx.strategy)
            .field("pending", &self.pending.len())
            .field("queued", &self.queue.len())
            .field("in_flight", &self.in_flight.len())
            .field("stopped", &self.stopped)
            .finish()
    }
}

fn fire(request: RenderRequest, source: RenderSource) {
    let Some(callback) = request.callback else {
        return;
    };
    let outcome = RenderOutcome {
        request_id: request.id,
        target: request.target,
        score: request.score,
        source,
    };
    let target = outcome.target.clone();
    if let Err(payload) = catch_unwind(AssertUnwindSafe(|| callback(outcome))) {
        tracing::error!(
            target_id = %target,
            panic = %panic_message(payload.as_ref()),
            "Render callback panicked"
        );
    }
}

//! Render strategies: draw during the tick, or on tokio's blocking pool.
//!
//! The strategy is chosen once when the scheduler is built. Both variants
//! speak the same message shape: a [`RenderJob`] moves a surface and a
//! score in, a [`JobCompletion`] moves the surface and the outcome back.
//! Nothing mutable is shared across the worker boundary.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::runtime::Handle;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::pool::Surface;
use crate::score::CanonicalScore;
use crate::types::config::StrategyKind;
use crate::RadarResult;

use super::base::{draw_guarded, ChartRenderer};

/// A draw instruction.
#[derive(Debug)]
pub struct RenderJob {
    pub id: u64,
    pub surface: Surface,
    pub score: CanonicalScore,
}

/// The result of a [`RenderJob`].
#[derive(Debug)]
pub struct JobCompletion {
    pub id: u64,
    /// The job's surface, drawn on when `result` is `Ok`.
    pub surface: Surface,
    pub score: CanonicalScore,
    pub result: RadarResult<()>,
    pub elapsed: Duration,
}

fn run_job(renderer: &dyn ChartRenderer, job: RenderJob) -> JobCompletion {
    let RenderJob {
        id,
        mut surface,
        score,
    } = job;
    let started = Instant::now();
    let result = draw_guarded(renderer, &mut surface, &score);
    JobCompletion {
        id,
        surface,
        score,
        result,
        elapsed: started.elapsed(),
    }
}

/// Offloads draws to `spawn_blocking`; completions come back over a channel.
pub struct WorkerBackend {
    runtime: Handle,
    renderer: Arc<dyn ChartRenderer>,
    tx: UnboundedSender<JobCompletion>,
    rx: UnboundedReceiver<JobCompletion>,
}

impl WorkerBackend {
    pub fn new(runtime: Handle, renderer: Arc<dyn ChartRenderer>) -> Self {
        let (tx, rx) = unbounded_channel();
        Self {
            runtime,
            renderer,
            tx,
            rx,
        }
    }

    /// Hands `job` to the blocking pool.
    pub fn submit(&self, job: RenderJob) {
        let renderer = Arc::clone(&self.renderer);
        let tx = self.tx.clone();
        self.runtime.spawn_blocking(move || {
            let completion = run_job(renderer.as_ref(), job);
            // The receiver lives as long as the backend; a send error means
            // the scheduler is gone and the surface can simply drop.
            let _ = tx.send(completion);
        });
    }

    /// Completions that have arrived since the last call.
    pub fn try_collect(&mut self) -> Vec<JobCompletion> {
        let mut done = Vec::new();
        while let Ok(completion) = self.rx.try_recv() {
            done.push(completion);
        }
        done
    }
}

/// How a surface gets drawn.
pub enum RenderStrategy {
    Inline(Arc<dyn ChartRenderer>),
    Worker(WorkerBackend),
}

impl RenderStrategy {
    /// Picks a strategy.
    ///
    /// `Auto` uses the worker when called inside a tokio runtime. An
    /// explicit `Worker` request outside a runtime falls back to inline.
    pub fn select(kind: StrategyKind, renderer: Arc<dyn ChartRenderer>) -> Self {
        let runtime = Handle::try_current().ok();
        match (kind, runtime) {
            (StrategyKind::Inline, _) => RenderStrategy::Inline(renderer),
            (StrategyKind::Auto | StrategyKind::Worker, Some(handle)) => {
                RenderStrategy::Worker(WorkerBackend::new(handle, renderer))
            }
            (StrategyKind::Auto, None) => RenderStrategy::Inline(renderer),
            (StrategyKind::Worker, None) => {
                tracing::warn!("Worker strategy requested outside a tokio runtime, drawing inline");
                RenderStrategy::Inline(renderer)
            }
        }
    }

    /// The strategy actually in effect.
    pub fn kind(&self) -> StrategyKind {
        match self {
            RenderStrategy::Inline(_) => StrategyKind::Inline,
            RenderStrategy::Worker(_) => StrategyKind::Worker,
        }
    }

    /// Starts a job. Inline jobs complete immediately and are returned;
    /// worker jobs are returned later by [`RenderStrategy::collect`].
    pub fn submit(&self, job: RenderJob) -> Option<JobCompletion> {
        match self {
            RenderStrategy::Inline(renderer) => Some(run_job(renderer.as_ref(), job)),
            RenderStrategy::Worker(worker) => {
                worker.submit(job);
                None
            }
        }
    }

    /// Drains finished worker jobs. Always empty for inline.
    pub fn collect(&mut self) -> Vec<JobCompletion> {
        match self {
            RenderStrategy::Inline(_) => Vec::new(),
            RenderStrategy::Worker(worker) => worker.try_collect(),
        }
    }

    /// Draws on the calling thread, whatever the strategy.
    pub fn draw_now(&self, surface: &mut Surface, score: &CanonicalScore) -> RadarResult<()> {
        let renderer = match self {
            RenderStrategy::Inline(renderer) => renderer.as_ref(),
            RenderStrategy::Worker(worker) => worker.renderer.as_ref(),
        };
        draw_guarded(renderer, surface, score)
    }
}

impl std::fmt::Debug for RenderStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RenderStrategy({})", self.kind())
    }
}

//! Async driver for the render scheduler.
//!
//! The scheduler lives on one tokio task; callers talk to it through a
//! cloneable [`RenderHandle`]. Only that task ever touches the pool, cache
//! or queues.

use std::time::Duration;

use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::mount::TargetId;
use crate::score::{normalize, CanonicalScore, ValidationResult};
use crate::types::config::SchedulerConfig;
use crate::{RadarError, RadarResult};

use super::dispatch::{RenderCallback, RenderItem, RenderScheduler, ShutdownReport};
use super::metrics::MetricsSnapshot;

enum Command {
    Enqueue {
        target: TargetId,
        score: CanonicalScore,
        callback: Option<RenderCallback>,
    },
    Batch(Vec<RenderItem>),
    Preload(Vec<CanonicalScore>, oneshot::Sender<usize>),
    Metrics(oneshot::Sender<MetricsSnapshot>),
    WhenIdle(oneshot::Sender<()>),
    Shutdown(oneshot::Sender<ShutdownReport>),
}

/// Handle to a running [`RenderService`].
#[derive(Clone)]
pub struct RenderHandle {
    tx: mpsc::UnboundedSender<Command>,
}

impl RenderHandle {
    fn send(&self, command: Command) -> RadarResult<()> {
        self.tx.send(command).map_err(|_| RadarError::ServiceStopped)
    }

    /// Queues a render. Returns as soon as the request is handed over.
    pub fn enqueue(
        &self,
        target: impl Into<TargetId>,
        score: CanonicalScore,
        callback: Option<RenderCallback>,
    ) -> RadarResult<()> {
        self.send(Command::Enqueue {
            target: target.into(),
            score,
            callback,
        })
    }

    /// Normalizes a raw score and queues it. The validation result is
    /// returned so the caller can inspect its issues.
    pub fn enqueue_raw(
        &self,
        target: impl Into<TargetId>,
        raw: &Value,
        callback: Option<RenderCallback>,
    ) -> RadarResult<ValidationResult> {
        let result = normalize(raw);
        self.enqueue(target, result.data, callback)?;
        Ok(result)
    }

    pub fn enqueue_batch(&self, items: Vec<RenderItem>) -> RadarResult<()> {
        self.send(Command::Batch(items))
    }

    /// Renders scores into the cache ahead of time. Resolves to the number
    /// of charts added.
    pub async fn preload(&self, scores: Vec<CanonicalScore>) -> RadarResult<usize> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Preload(scores, reply))?;
        rx.await.map_err(|_| RadarError::ServiceStopped)
    }

    pub async fn metrics(&self) -> RadarResult<MetricsSnapshot> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Metrics(reply))?;
        rx.await.map_err(|_| RadarError::ServiceStopped)
    }

    /// Resolves once nothing is debouncing, queued or running.
    pub async fn wait_idle(&self) -> RadarResult<()> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::WhenIdle(reply))?;
        rx.await.map_err(|_| RadarError::ServiceStopped)
    }

    /// Stops the service and returns what was released.
    pub async fn shutdown(&self) -> RadarResult<ShutdownReport> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Shutdown(reply))?;
        rx.await.map_err(|_| RadarError::ServiceStopped)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl std::fmt::Debug for RenderHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderHandle")
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Runs a [`RenderScheduler`] on its own task.
pub struct RenderService;

impl RenderService {
    /// Spawns the service. Must be called inside a tokio runtime.
    ///
    /// The task ends on [`RenderHandle::shutdown`] or when every handle has
    /// been dropped.
    pub fn spawn(
        scheduler: RenderScheduler,
        config: &SchedulerConfig,
    ) -> (RenderHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let metrics_every = (config.metrics_interval_secs > 0)
            .then(|| Duration::from_secs(config.metrics_interval_secs));
        let task = tokio::spawn(run(scheduler, rx, config.tick(), metrics_every));
        (RenderHandle { tx }, task)
    }
}

async fn run(
    mut scheduler: RenderScheduler,
    mut rx: mpsc::UnboundedReceiver<Command>,
    tick: Duration,
    metrics_every: Option<Duration>,
) {
    let mut ticker = tokio::time::interval(tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut metrics_timer = tokio::time::interval(metrics_every.unwrap_or(Duration::from_secs(60)));
    metrics_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick fires immediately.
    metrics_timer.tick().await;

    let mut idle_waiters: Vec<oneshot::Sender<()>> = Vec::new();

    tracing::debug!(tick_ms = tick.as_millis() as u64, "Render service started");

    loop {
        tokio::select! {
            command = rx.recv() => {
                match command {
                    Some(Command::Enqueue { target, score, callback }) => {
                        scheduler.enqueue(target, score, callback);
                    }
                    Some(Command::Batch(items)) => {
                        scheduler.enqueue_batch(items);
                    }
                    Some(Command::Preload(scores, reply)) => {
                        let _ = reply.send(scheduler.preload(&scores));
                    }
                    Some(Command::Metrics(reply)) => {
                        let _ = reply.send(scheduler.metrics());
                    }
                    Some(Command::WhenIdle(reply)) => {
                        if scheduler.is_idle() {
                            let _ = reply.send(());
                        } else {
                            idle_waiters.push(reply);
                        }
                    }
                    Some(Command::Shutdown(reply)) => {
                        let _ = reply.send(scheduler.shutdown());
                        break;
                    }
                    None => {
                        scheduler.shutdown();
                        break;
                    }
                }
            }
            _ = ticker.tick() => {
                let report = scheduler.tick();
                if report.dispatched > 0 || report.rendered > 0 {
                    tracing::trace!(
                        dispatched = report.dispatched,
                        rendered = report.rendered,
                        cache_hits = report.cache_hits,
                        failed = report.failed,
                        "Tick"
                    );
                }
                if !idle_waiters.is_empty() && scheduler.is_idle() {
                    for waiter in idle_waiters.drain(..) {
                        let _ = waiter.send(());
                    }
                }
            }
            _ = metrics_timer.tick(), if metrics_every.is_some() => {
                scheduler.metrics().log();
            }
        }
    }

    tracing::debug!("Render service stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mount::MemoryMount;
    use crate::render::RadarRenderer;
    use crate::scheduler::RenderOutcome;
    use crate::types::config::Config;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn fast_config() -> Config {
        let mut config = Config::default_config();
        config.pool.max_size = 4;
        config.pool.surface_width = 64;
        config.pool.surface_height = 64;
        config.scheduler.debounce_ms = 10;
        config.scheduler.tick_ms = 2;
        config.scheduler.metrics_interval_secs = 0;
        config
    }

    fn spawn(config: &Config) -> (RenderHandle, JoinHandle<()>, MemoryMount) {
        let mount = MemoryMount::new();
        let scheduler = RenderScheduler::new(
            config,
            Arc::new(RadarRenderer::new()),
            Box::new(mount.clone()),
        )
        .unwrap();
        let (handle, task) = RenderService::spawn(scheduler, &config.scheduler);
        (handle, task, mount)
    }

    #[tokio::test]
    async fn test_enqueue_raw_renders_to_mount() {
        let config = fast_config();
        let (handle, task, mount) = spawn(&config);
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let result = handle
            .enqueue_raw(
                "card",
                &json!({"commonTopics": 80, "profileMatch": 90}),
                Some(Box::new(move |_: RenderOutcome| {
                    counter.fetch_add(1, Ordering::SeqCst);
                })),
            )
            .unwrap();
        assert_eq!(result.issues.len(), 1);

        tokio::time::timeout(Duration::from_secs(5), handle.wait_idle())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(mount.snapshot(&"card".into()).is_some());

        let report = handle.shutdown().await.unwrap();
        assert_eq!(report.metrics.render_count, 1);
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_handle_fails_after_shutdown() {
        let config = fast_config();
        let (handle, task, _mount) = spawn(&config);

        handle.shutdown().await.unwrap();
        task.await.unwrap();

        let err = handle
            .enqueue("card", CanonicalScore::DEFAULT, None)
            .unwrap_err();
        assert!(matches!(err, RadarError::ServiceStopped));
        assert!(handle.metrics().await.is_err());
    }

    #[tokio::test]
    async fn test_preload_and_metrics_round_trip() {
        let config = fast_config();
        let (handle, task, _mount) = spawn(&config);

        let added = handle
            .preload(vec![CanonicalScore::uniform(30), CanonicalScore::uniform(60)])
            .await
            .unwrap();
        assert_eq!(added, 2);

        let metrics = handle.metrics().await.unwrap();
        assert_eq!(metrics.cache.unwrap().size, 2);
        assert_eq!(metrics.pending, 0);

        drop(handle);
        task.await.unwrap();
    }
}

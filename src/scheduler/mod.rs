//! Render scheduling.
//!
//! Requests flow `enqueue → debounce slot → dispatch queue → cache or
//! renderer → mount`. [`RenderScheduler`] is the synchronous state
//! machine; [`RenderService`] drives it from a tokio task.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use std::time::{Duration, Instant};
//! use radarmatch::mount::MemoryMount;
//! use radarmatch::render::RadarRenderer;
//! use radarmatch::scheduler::RenderScheduler;
//! use radarmatch::score::CanonicalScore;
//! use radarmatch::Config;
//!
//! let config = Config::default_config();
//! let mount = MemoryMount::new();
//! let mut scheduler = RenderScheduler::new(
//!     &config,
//!     Arc::new(RadarRenderer::new()),
//!     Box::new(mount.clone()),
//! )
//! .unwrap();
//!
//! let start = Instant::now();
//! scheduler.enqueue_at("match-42", CanonicalScore::uniform(75), None, start);
//! scheduler.tick_at(start + Duration::from_millis(100));
//! assert_eq!(mount.attach_count(), 1);
//! ```

mod dispatch;
mod metrics;
mod service;

pub use dispatch::{
    RenderCallback, RenderContext, RenderItem, RenderOutcome, RenderScheduler, RenderSource,
    ShutdownReport, TargetState, TickReport,
};
pub use metrics::{MetricsSnapshot, RenderMetrics};
pub use service::{RenderHandle, RenderService};

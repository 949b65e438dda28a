//! Radar chart rendering.
//!
//! - [`geometry`] - pure layout of the hexagonal chart
//! - [`raster`] - tiny-skia painter ([`RadarRenderer`])
//! - [`strategy`] - inline or worker-backed drawing

mod base;
pub mod geometry;
pub mod raster;
pub mod strategy;

pub use base::{draw_guarded, ChartRenderer};
pub(crate) use base::panic_message;
pub use geometry::{ChartGeometry, ChartStyle};
pub use raster::RadarRenderer;
pub use strategy::{JobCompletion, RenderJob, RenderStrategy, WorkerBackend};

//! # radarmatch
//!
//! Score validation and radar chart rendering for a matching dashboard.
//!
//! Raw compatibility scores, in the current 6-axis schema or the retired
//! 5-axis one, are normalized into a [`score::CanonicalScore`] and rendered
//! as hexagonal radar charts. Rendering reuses pooled surfaces, memoizes
//! charts per score and coalesces bursts of requests per target.
//!
//! ## Modules
//!
//! - [`score`] - Schema detection, normalization, weighted aggregate, audit log
//! - [`pool`] - Bounded pool of reusable drawing surfaces
//! - [`render`] - Chart geometry, rasterizer and render strategies
//! - [`cache`] - FIFO cache of rendered charts
//! - [`scheduler`] - Debounced, batched dispatch and its async service
//! - [`mount`] - Render targets
//! - [`storage`] - Key-value persistence with write-time validation
//! - [`cli`] - Command line interface
//! - [`types`] - Configuration and errors

pub mod cache;
#[cfg(feature = "cli")]
pub mod cli;
pub mod mount;
pub mod pool;
pub mod render;
pub mod scheduler;
pub mod score;
pub mod storage;
pub mod types;

pub use types::config::Config;
pub use types::errors::{RadarError, RadarResult};

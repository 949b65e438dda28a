//! Render cache for chart surfaces.
//!
//! Memoizes rendered charts by canonical score so repeated scores are
//! copied from an existing surface instead of redrawn. Capacity is bounded
//! and eviction is first-in first-out.

mod fifo;

pub use fifo::{CacheEntry, CacheStats, RenderCache};

//! Bounded pool of reusable drawing surfaces.
//!
//! Surfaces are allocated at startup and recycled for the life of the
//! process. Exhaustion is not an error: [`CanvasPool::checkout`] allocates a
//! fresh surface when the free list is empty, and [`CanvasPool::release`]
//! discards surfaces once the free list is full.

mod surface;

pub use surface::{blit, Surface, SurfaceId};

use serde::Serialize;
use tiny_skia::Pixmap;

use crate::types::config::PoolConfig;
use crate::{RadarError, RadarResult};

/// Pool counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    /// Surfaces currently on the free list.
    pub free: usize,

    /// Free list bound.
    pub max_size: usize,

    /// Surfaces ever allocated.
    pub allocated: u64,

    /// Checkouts served from the free list.
    pub reused: u64,

    /// Surfaces dropped on release (free list full or wrong size).
    pub discarded: u64,
}

/// Pool of fixed-size surfaces.
pub struct CanvasPool {
    free: Vec<Surface>,
    max_size: usize,
    blank: Pixmap,
    next_id: u64,
    allocated: u64,
    reused: u64,
    discarded: u64,
}

impl CanvasPool {
    /// Creates a pool, filling the free list when `preallocate` is set.
    pub fn new(config: &PoolConfig) -> RadarResult<Self> {
        let blank = Pixmap::new(config.surface_width, config.surface_height).ok_or_else(|| {
            RadarError::config(format!(
                "invalid surface size {}x{}",
                config.surface_width, config.surface_height
            ))
        })?;

        let mut pool = Self {
            free: Vec::with_capacity(config.max_size),
            max_size: config.max_size,
            blank,
            next_id: 0,
            allocated: 0,
            reused: 0,
            discarded: 0,
        };

        if config.preallocate {
            for _ in 0..config.max_size {
                let surface = pool.allocate();
                pool.free.push(surface);
            }
        }

        tracing::debug!(
            preallocated = pool.free.len(),
            max_size = pool.max_size,
            width = config.surface_width,
            height = config.surface_height,
            "Canvas pool ready"
        );

        Ok(pool)
    }

    fn allocate(&mut self) -> Surface {
        self.next_id += 1;
        self.allocated += 1;
        Surface::from_pixmap(SurfaceId(self.next_id), self.blank.clone())
    }

    /// Takes a surface off the free list, or allocates one.
    pub fn checkout(&mut self) -> Surface {
        match self.free.pop() {
            Some(surface) => {
                self.reused += 1;
                surface
            }
            None => {
                let surface = self.allocate();
                tracing::trace!(id = %surface.id(), "Pool empty, allocated surface");
                surface
            }
        }
    }

    /// Returns a surface. It is cleared and kept if the free list has room.
    pub fn release(&mut self, mut surface: Surface) {
        if surface.size() != self.surface_size() {
            self.discarded += 1;
            tracing::trace!(id = %surface.id(), "Discarding surface of foreign size");
            return;
        }

        if self.free.len() >= self.max_size {
            self.discarded += 1;
            return;
        }

        surface.clear();
        self.free.push(surface);
    }

    /// `(width, height)` of pooled surfaces.
    pub fn surface_size(&self) -> (u32, u32) {
        (self.blank.width(), self.blank.height())
    }

    /// Surfaces waiting on the free list.
    pub fn free_len(&self) -> usize {
        self.free.len()
    }

    /// Free list bound.
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Current counters.
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            free: self.free.len(),
            max_size: self.max_size,
            allocated: self.allocated,
            reused: self.reused,
            discarded: self.discarded,
        }
    }

    /// Tears down the free list. Returns how many surfaces were dropped.
    pub fn drain(&mut self) -> usize {
        let dropped = self.free.len();
        self.free.clear();
        dropped
    }
}

impl std::fmt::Debug for CanvasPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CanvasPool")
            .field("free", &self.free.len())
            .field("max_size", &self.max_size)
            .field("surface_size", &self.surface_size())
            .field("allocated", &self.allocated)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tiny_skia::Color;

    fn config(max_size: usize, preallocate: bool) -> PoolConfig {
        PoolConfig {
            max_size,
            surface_width: 32,
            surface_height: 32,
            preallocate,
        }
    }

    #[test]
    fn test_preallocation() {
        let pool = CanvasPool::new(&config(4, true)).unwrap();
        assert_eq!(pool.free_len(), 4);
        assert_eq!(pool.stats().allocated, 4);

        let lazy = CanvasPool::new(&config(4, false)).unwrap();
        assert_eq!(lazy.free_len(), 0);
    }

    #[test]
    fn test_checkout_allocates_when_empty() {
        let mut pool = CanvasPool::new(&config(1, true)).unwrap();
        let a = pool.checkout();
        let b = pool.checkout();
        assert_ne!(a.id(), b.id());
        assert_eq!(pool.stats().reused, 1);
        assert_eq!(pool.stats().allocated, 2);
    }

    #[test]
    fn test_release_respects_bound() {
        let mut pool = CanvasPool::new(&config(3, false)).unwrap();
        let surfaces: Vec<Surface> = (0..8).map(|_| pool.checkout()).collect();
        for surface in surfaces {
            pool.release(surface);
            assert!(pool.free_len() <= pool.max_size());
        }
        assert_eq!(pool.free_len(), 3);
        assert_eq!(pool.stats().discarded, 5);
    }

    #[test]
    fn test_release_clears_contents() {
        let mut pool = CanvasPool::new(&config(2, false)).unwrap();
        let mut surface = pool.checkout();
        let id = surface.id();
        surface.pixmap_mut().fill(Color::BLACK);
        pool.release(surface);

        let again = pool.checkout();
        assert_eq!(again.id(), id);
        assert!(again.is_blank());
    }

    #[test]
    fn test_foreign_size_discarded() {
        let mut pool = CanvasPool::new(&config(2, false)).unwrap();
        let stranger = Surface::new(SurfaceId(999), 8, 8).unwrap();
        pool.release(stranger);
        assert_eq!(pool.free_len(), 0);
        assert_eq!(pool.stats().discarded, 1);
    }

    #[test]
    fn test_invalid_size_rejected() {
        let mut bad = config(2, true);
        bad.surface_width = 0;
        assert!(CanvasPool::new(&bad).is_err());
    }

    #[test]
    fn test_drain() {
        let mut pool = CanvasPool::new(&config(5, true)).unwrap();
        assert_eq!(pool.drain(), 5);
        assert_eq!(pool.free_len(), 0);
    }
}

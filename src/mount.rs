//! Render targets.
//!
//! A target is an opaque handle owned by the host UI. The only thing the
//! scheduler asks of it is "show these pixels", which it does through a
//! [`Mount`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tiny_skia::Pixmap;

use crate::pool::{blit, Surface};
use crate::{RadarError, RadarResult};

/// Identifies a render target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetId(String);

impl TargetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TargetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TargetId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for TargetId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Displays rendered surfaces on targets.
///
/// `attach` must copy the pixels: the surface goes back to the pool or
/// stays in the cache afterwards.
pub trait Mount: Send {
    fn attach(&mut self, target: &TargetId, surface: &Surface) -> RadarResult<()>;
}

#[derive(Default)]
struct MountState {
    displays: HashMap<TargetId, Pixmap>,
    attaches: u64,
}

/// In-memory mount keeping one display pixmap per target.
///
/// Clones share the same displays, so a test or the CLI can keep a handle
/// while the scheduler owns another.
#[derive(Clone, Default)]
pub struct MemoryMount {
    state: Arc<Mutex<MountState>>,
}

impl MemoryMount {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> RadarResult<std::sync::MutexGuard<'_, MountState>> {
        self.state
            .lock()
            .map_err(|_| RadarError::other("mount state poisoned"))
    }

    /// A copy of what `target` currently shows.
    pub fn snapshot(&self, target: &TargetId) -> Option<Pixmap> {
        self.lock().ok()?.displays.get(target).cloned()
    }

    /// Total number of successful attaches.
    pub fn attach_count(&self) -> u64 {
        self.lock().map(|state| state.attaches).unwrap_or(0)
    }

    /// Targets that have been attached to, sorted.
    pub fn targets(&self) -> Vec<TargetId> {
        let mut targets: Vec<TargetId> = self
            .lock()
            .map(|state| state.displays.keys().cloned().collect())
            .unwrap_or_default();
        targets.sort();
        targets
    }

    /// Encodes what `target` shows as PNG.
    pub fn encode_png(&self, target: &TargetId) -> RadarResult<Vec<u8>> {
        let pixmap = self
            .snapshot(target)
            .ok_or_else(|| RadarError::mount(target.as_str(), "nothing attached"))?;
        pixmap
            .encode_png()
            .map_err(|e| RadarError::mount(target.as_str(), format!("PNG encoding failed: {}", e)))
    }
}

impl Mount for MemoryMount {
    fn attach(&mut self, target: &TargetId, surface: &Surface) -> RadarResult<()> {
        let mut state = self.lock()?;
        let (width, height) = surface.size();
        let mut display = match state.displays.remove(target) {
            Some(existing) if existing.width() == width && existing.height() == height => existing,
            _ => Pixmap::new(width, height)
                .ok_or_else(|| RadarError::mount(target.as_str(), "invalid surface size"))?,
        };
        blit(&mut display, surface.pixmap());
        state.displays.insert(target.clone(), display);
        state.attaches += 1;
        Ok(())
    }
}

impl std::fmt::Debug for MemoryMount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryMount")
            .field("targets", &self.targets().len())
            .field("attaches", &self.attach_count())
            .finish()
    }
}

//! Drawing surfaces.

use tiny_skia::{Color, Pixmap, PixmapPaint, Transform};

use crate::{RadarError, RadarResult};

/// Identity of a pooled surface, stable across reuse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(pub u64);

impl std::fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "surface#{}", self.0)
    }
}

/// A fixed-size RGBA drawing target.
///
/// Not `Clone`: a surface has exactly one owner at a time (the pool's free
/// list, an in-flight render, or a cache entry). Copies of its pixels are
/// made with [`Surface::blit_from`] or [`blit`].
#[derive(Debug)]
pub struct Surface {
    id: SurfaceId,
    pixmap: Pixmap,
}

impl Surface {
    /// Creates a transparent surface. `None` for zero or oversized dimensions.
    pub fn new(id: SurfaceId, width: u32, height: u32) -> Option<Self> {
        Pixmap::new(width, height).map(|pixmap| Self { id, pixmap })
    }

    pub(crate) fn from_pixmap(id: SurfaceId, pixmap: Pixmap) -> Self {
        Self { id, pixmap }
    }

    pub fn id(&self) -> SurfaceId {
        self.id
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// `(width, height)`.
    pub fn size(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    pub fn pixmap_mut(&mut self) -> &mut Pixmap {
        &mut self.pixmap
    }

    /// Resets every pixel to transparent.
    pub fn clear(&mut self) {
        self.pixmap.fill(Color::TRANSPARENT);
    }

    /// True when no pixel has been drawn.
    pub fn is_blank(&self) -> bool {
        self.pixmap.data().iter().all(|byte| *byte == 0)
    }

    /// Replaces this surface's pixels with a copy of `source`.
    pub fn blit_from(&mut self, source: &Surface) {
        blit(&mut self.pixmap, &source.pixmap);
    }

    /// Encodes the surface as PNG.
    pub fn encode_png(&self) -> RadarResult<Vec<u8>> {
        self.pixmap
            .encode_png()
            .map_err(|e| RadarError::other(format!("PNG encoding failed: {}", e)))
    }
}

/// Copies `source` onto `target`, replacing what was there.
pub fn blit(target: &mut Pixmap, source: &Pixmap) {
    if target.width() == source.width() && target.height() == source.height() {
        target.data_mut().copy_from_slice(source.data());
        return;
    }

    target.fill(Color::TRANSPARENT);
    target.draw_pixmap(
        0,
        0,
        source.as_ref(),
        &PixmapPaint::default(),
        Transform::identity(),
        None,
    );
}

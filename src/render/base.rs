//! Base trait for chart renderers.

use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::pool::Surface;
use crate::score::CanonicalScore;
use crate::{RadarError, RadarResult};

/// Draws a chart for a canonical score onto a surface.
///
/// Implementations hold no state shared between calls: the same
/// `(surface size, score)` always yields the same pixels. A surface too
/// small to hold a chart is left untouched.
pub trait ChartRenderer: Send + Sync {
    /// Returns the renderer name, used in logs.
    fn name(&self) -> &str;

    /// Draws `score` onto `surface`, replacing its contents.
    fn draw(&self, surface: &mut Surface, score: &CanonicalScore) -> RadarResult<()>;
}

/// Runs `renderer.draw`, turning a panic into a render error.
pub fn draw_guarded(
    renderer: &dyn ChartRenderer,
    surface: &mut Surface,
    score: &CanonicalScore,
) -> RadarResult<()> {
    match catch_unwind(AssertUnwindSafe(|| renderer.draw(surface, score))) {
        Ok(result) => result,
        Err(payload) => Err(RadarError::render(
            renderer.name(),
            format!("renderer panicked: {}", panic_message(payload.as_ref())),
        )),
    }
}

pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

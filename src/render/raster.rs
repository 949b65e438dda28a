//! Radar chart rasterizer built on tiny-skia.

use tiny_skia::{Color, FillRule, Paint, Path, PathBuilder, Pixmap, Stroke, Transform};

use crate::pool::Surface;
use crate::score::CanonicalScore;
use crate::RadarResult;

use super::base::ChartRenderer;
use super::geometry::{ChartGeometry, ChartStyle, Point, Rgba};

/// Smallest surface side a chart is drawn on.
pub const MIN_SURFACE_SIDE: u32 = 16;

/// Hexagonal radar chart renderer.
#[derive(Debug, Clone, Default)]
pub struct RadarRenderer {
    style: ChartStyle,
}

impl RadarRenderer {
    /// Creates a renderer with the default style.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a renderer with a custom style.
    pub fn with_style(style: ChartStyle) -> Self {
        Self { style }
    }

    pub fn style(&self) -> &ChartStyle {
        &self.style
    }

    /// Layout for `score` on a surface of the given size.
    pub fn layout(&self, score: &CanonicalScore, width: u32, height: u32) -> ChartGeometry {
        ChartGeometry::layout(score, width, height, &self.style)
    }
}

impl ChartRenderer for RadarRenderer {
    fn name(&self) -> &str {
        "radar"
    }

    fn draw(&self, surface: &mut Surface, score: &CanonicalScore) -> RadarResult<()> {
        let (width, height) = surface.size();
        if width < MIN_SURFACE_SIDE || height < MIN_SURFACE_SIDE {
            tracing::debug!(width, height, "Surface too small for a chart, skipping");
            return Ok(());
        }

        let geometry = self.layout(score, width, height);
        paint(surface.pixmap_mut(), &geometry, &self.style);
        Ok(())
    }
}

/// Paints a laid-out chart onto `pixmap`.
pub fn paint(pixmap: &mut Pixmap, geometry: &ChartGeometry, style: &ChartStyle) {
    pixmap.fill(color(style.background));

    let last_ring = geometry.rings.len().saturating_sub(1);
    for (level, ring) in geometry.rings.iter().enumerate() {
        let (ink, width) = if level == last_ring {
            (style.grid_outer, 2.0)
        } else {
            (style.grid, 1.0)
        };
        if let Some(path) = polygon(ring) {
            stroke(pixmap, &path, ink, width);
        }
    }

    let mut spokes = PathBuilder::new();
    for end in &geometry.spokes {
        spokes.move_to(geometry.center.x, geometry.center.y);
        spokes.line_to(end.x, end.y);
    }
    if let Some(path) = spokes.finish() {
        stroke(pixmap, &path, style.grid, 1.0);
    }

    if let Some(shape) = polygon(&geometry.vertices) {
        pixmap.fill_path(
            &shape,
            &paint_for(style.fill),
            FillRule::Winding,
            Transform::identity(),
            None,
        );
        stroke(pixmap, &shape, style.stroke, 2.0);
    }

    for vertex in &geometry.vertices {
        dot(pixmap, vertex, style.point_radius, style.stroke);
    }

    // Label anchors get a marker; glyphs are left to the host's text stack.
    for label in &geometry.labels {
        dot(pixmap, &label.anchor, 1.5, style.text);
    }
}

fn color(rgba: Rgba) -> Color {
    Color::from_rgba8(rgba.0, rgba.1, rgba.2, rgba.3)
}

fn paint_for(rgba: Rgba) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(rgba.0, rgba.1, rgba.2, rgba.3);
    paint.anti_alias = true;
    paint
}

fn polygon(points: &[Point]) -> Option<Path> {
    let (first, rest) = points.split_first()?;
    let mut builder = PathBuilder::new();
    builder.move_to(first.x, first.y);
    for point in rest {
        builder.line_to(point.x, point.y);
    }
    builder.close();
    builder.finish()
}

fn stroke(pixmap: &mut Pixmap, path: &Path, ink: Rgba, width: f32) {
    let stroke = Stroke {
        width,
        ..Stroke::default()
    };
    pixmap.stroke_path(path, &paint_for(ink), &stroke, Transform::identity(), None);
}

fn dot(pixmap: &mut Pixmap, at: &Point, radius: f32, ink: Rgba) {
    if let Some(circle) = PathBuilder::from_circle(at.x, at.y, radius) {
        pixmap.fill_path(
            &circle,
            &paint_for(ink),
            FillRule::Winding,
            Transform::identity(),
            None,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::SurfaceId;
    use crate::render::geometry::axis_angle;

    fn surface(side: u32) -> Surface {
        Surface::new(SurfaceId(1), side, side).unwrap()
    }

    /// Pixel between the second and third rings, on the bisector of axes
    /// 0 and 1.
    fn probe(geometry: &ChartGeometry) -> (u32, u32) {
        let angle = (axis_angle(0) + axis_angle(1)) / 2.0;
        let r = geometry.radius * 0.45;
        (
            (geometry.center.x + r * angle.cos()) as u32,
            (geometry.center.y + r * angle.sin()) as u32,
        )
    }

    #[test]
    fn test_full_score_fills_interior() {
        let renderer = RadarRenderer::new();
        let mut target = surface(200);
        renderer.draw(&mut target, &CanonicalScore::uniform(100)).unwrap();

        let geometry = renderer.layout(&CanonicalScore::uniform(100), 200, 200);
        let (x, y) = probe(&geometry);
        let pixel = target.pixmap().pixel(x, y).unwrap();
        assert_eq!(pixel.alpha(), 255);
        assert!(pixel.blue() as i32 > pixel.red() as i32 + 20);
    }

    #[test]
    fn test_low_score_leaves_background() {
        let renderer = RadarRenderer::new();
        let mut target = surface(200);
        renderer.draw(&mut target, &CanonicalScore::uniform(20)).unwrap();

        let geometry = renderer.layout(&CanonicalScore::uniform(20), 200, 200);
        let (x, y) = probe(&geometry);
        let pixel = target.pixmap().pixel(x, y).unwrap();
        assert_eq!((pixel.red(), pixel.green(), pixel.blue()), (255, 255, 255));
    }

    #[test]
    fn test_draw_is_deterministic() {
        let renderer = RadarRenderer::new();
        let score = CanonicalScore::from_values([90, 10, 55, 70, 30, 65]);
        let mut a = surface(120);
        let mut b = surface(120);
        renderer.draw(&mut a, &score).unwrap();
        renderer.draw(&mut b, &score).unwrap();
        assert_eq!(a.pixmap().data(), b.pixmap().data());
    }

    #[test]
    fn test_tiny_surface_is_noop() {
        let renderer = RadarRenderer::new();
        let mut target = surface(8);
        renderer.draw(&mut target, &CanonicalScore::DEFAULT).unwrap();
        assert!(target.is_blank());
    }

    #[test]
    fn test_zero_score_still_draws_grid() {
        let renderer = RadarRenderer::new();
        let mut target = surface(100);
        renderer.draw(&mut target, &CanonicalScore::uniform(0)).unwrap();
        assert!(!target.is_blank());
    }
}

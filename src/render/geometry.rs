//! Radar chart layout.
//!
//! Pure geometry: a [`ChartGeometry`] is everything needed to paint one
//! chart, computed from a score and the surface size. It is plain data and
//! serializable, so it can be handed to any painter.

use std::f32::consts::{FRAC_PI_2, TAU};

use serde::{Deserialize, Serialize};

use crate::score::{Axis, CanonicalScore};

/// Number of chart axes.
pub const AXIS_COUNT: usize = 6;

/// A point in surface pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f32 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// 8-bit RGBA color, alpha not premultiplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgba(pub u8, pub u8, pub u8, pub u8);

impl Rgba {
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self(r, g, b, 255)
    }
}

/// Vertical alignment of an axis label relative to its anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelBaseline {
    Bottom,
    Middle,
    Top,
}

/// An axis label placed just outside the outer ring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisLabel {
    pub axis: Axis,
    pub text: String,
    pub anchor: Point,
    pub baseline: LabelBaseline,
}

/// Colors and proportions of the chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartStyle {
    /// Outer ring radius as a fraction of the shorter surface side.
    pub radius_ratio: f32,
    /// Number of concentric rings (5 gives 20% steps).
    pub levels: u8,
    /// Distance from the outer ring to label anchors, as a fraction of the
    /// shorter side.
    pub label_offset_ratio: f32,
    pub point_radius: f32,
    pub background: Rgba,
    pub grid: Rgba,
    pub grid_outer: Rgba,
    pub fill: Rgba,
    pub stroke: Rgba,
    pub text: Rgba,
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self {
            radius_ratio: 0.38,
            levels: 5,
            label_offset_ratio: 0.07,
            point_radius: 4.0,
            background: Rgba::opaque(255, 255, 255),
            grid: Rgba::opaque(229, 231, 235),
            grid_outer: Rgba::opaque(156, 163, 175),
            fill: Rgba(59, 130, 246, 51),
            stroke: Rgba::opaque(59, 130, 246),
            text: Rgba::opaque(55, 65, 81),
        }
    }
}

/// Angle of axis `index`; axis 0 points up.
pub fn axis_angle(index: usize) -> f32 {
    index as f32 * (TAU / AXIS_COUNT as f32) - FRAC_PI_2
}

fn polar(center: Point, radius: f32, angle: f32) -> Point {
    Point::new(
        center.x + radius * angle.cos(),
        center.y + radius * angle.sin(),
    )
}

/// Everything needed to paint one chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartGeometry {
    pub width: u32,
    pub height: u32,
    pub center: Point,
    pub radius: f32,
    /// Concentric hexagons, innermost first; the last one is the outer ring.
    pub rings: Vec<[Point; AXIS_COUNT]>,
    /// Outer end of each axis line.
    pub spokes: [Point; AXIS_COUNT],
    /// Value point of each axis.
    pub vertices: [Point; AXIS_COUNT],
    pub labels: Vec<AxisLabel>,
}

impl ChartGeometry {
    /// Lays out `score` on a `width`×`height` surface.
    pub fn layout(score: &CanonicalScore, width: u32, height: u32, style: &ChartStyle) -> Self {
        let center = Point::new(width as f32 / 2.0, height as f32 / 2.0);
        let side = width.min(height) as f32;
        let radius = side * style.radius_ratio;
        let levels = style.levels.max(1);

        let rings: Vec<[Point; AXIS_COUNT]> = (1..=levels)
            .map(|level| {
                let ring_radius = radius * level as f32 / levels as f32;
                std::array::from_fn(|i| polar(center, ring_radius, axis_angle(i)))
            })
            .collect();

        let spokes: [Point; AXIS_COUNT] = std::array::from_fn(|i| polar(center, radius, axis_angle(i)));

        let vertices: [Point; AXIS_COUNT] = std::array::from_fn(|i| {
            let value = score.get(Axis::ALL[i]) as f32 / 100.0;
            polar(center, radius * value, axis_angle(i))
        });

        let label_radius = radius + side * style.label_offset_ratio;
        let labels: Vec<AxisLabel> = Axis::ALL
            .iter()
            .enumerate()
            .map(|(i, axis)| AxisLabel {
                axis: *axis,
                text: axis.label().to_string(),
                anchor: polar(center, label_radius, axis_angle(i)),
                baseline: match i {
                    0 => LabelBaseline::Bottom,
                    3 => LabelBaseline::Top,
                    _ => LabelBaseline::Middle,
                },
            })
            .collect();

        Self {
            width,
            height,
            center,
            radius,
            rings,
            spokes,
            vertices,
            labels,
        }
    }
}

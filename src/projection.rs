//! Screen projection and SVG path generation.

use std::fmt::Write;

use clap::ValueEnum;
use geo::{BoundingRect, Coord, LineString, MapCoords, MultiPolygon, Rect};
use serde::Serialize;

/// Output canvas dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Canvas {
    pub width: f64,
    pub height: f64,
    pub padding: f64,
}

impl Default for Canvas {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 800.0,
            padding: 40.0,
        }
    }
}

/// How source coordinates reach the screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Projection {
    /// Coordinates are already in screen units (pre-projected topologies).
    #[default]
    Identity,
    /// Scale and center the shapes inside the padded canvas.
    Fit,
    /// Like `Fit`, but treats input as lon/lat and flips the y axis.
    FitLonLat,
}

/// Uniform scale plus offset, optionally flipping y.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenTransform {
    scale: f64,
    origin: Coord<f64>,
    offset: Coord<f64>,
    flip_y: bool,
}

impl ScreenTransform {
    pub fn identity() -> Self {
        Self {
            scale: 1.0,
            origin: Coord { x: 0.0, y: 0.0 },
            offset: Coord { x: 0.0, y: 0.0 },
            flip_y: false,
        }
    }

    /// Largest uniform scale that fits `bounds` inside the padded canvas,
    /// centered on both axes.
    pub fn fit(bounds: Rect<f64>, canvas: &Canvas, flip_y: bool) -> Self {
        let avail_w = (canvas.width - 2.0 * canvas.padding).max(0.0);
        let avail_h = (canvas.height - 2.0 * canvas.padding).max(0.0);
        let (w, h) = (bounds.width(), bounds.height());

        let scale = match (w > 0.0, h > 0.0) {
            (true, true) => (avail_w / w).min(avail_h / h),
            (true, false) => avail_w / w,
            (false, true) => avail_h / h,
            (false, false) => 1.0,
        };

        let origin = if flip_y {
            Coord {
                x: bounds.min().x,
                y: bounds.max().y,
            }
        } else {
            bounds.min()
        };

        Self {
            scale,
            origin,
            offset: Coord {
                x: canvas.padding + (avail_w - w * scale) / 2.0,
                y: canvas.padding + (avail_h - h * scale) / 2.0,
            },
            flip_y,
        }
    }

    /// Chooses the transform for `projection` given every shape to draw.
    pub fn for_shapes(projection: Projection, shapes: &[MultiPolygon<f64>], canvas: &Canvas) -> Self {
        let flip_y = match projection {
            Projection::Identity => return Self::identity(),
            Projection::Fit => false,
            Projection::FitLonLat => true,
        };
        match union_bounds(shapes) {
            Some(bounds) => Self::fit(bounds, canvas, flip_y),
            None => Self::identity(),
        }
    }

    pub fn apply(&self, c: Coord<f64>) -> Coord<f64> {
        let dy = if self.flip_y {
            self.origin.y - c.y
        } else {
            c.y - self.origin.y
        };
        Coord {
            x: (c.x - self.origin.x) * self.scale + self.offset.x,
            y: dy * self.scale + self.offset.y,
        }
    }

    pub fn project(&self, shape: &MultiPolygon<f64>) -> MultiPolygon<f64> {
        let t = *self;
        shape.map_coords(move |c| t.apply(c))
    }
}

/// Bounding box covering every non-empty shape.
pub fn union_bounds(shapes: &[MultiPolygon<f64>]) -> Option<Rect<f64>> {
    shapes
        .iter()
        .filter_map(|shape| shape.bounding_rect())
        .reduce(|a, b| {
            Rect::new(
                Coord {
                    x: a.min().x.min(b.min().x),
                    y: a.min().y.min(b.min().y),
                },
                Coord {
                    x: a.max().x.max(b.max().x),
                    y: a.max().y.max(b.max().y),
                },
            )
        })
}

/// Renders a coordinate with at most three decimals and no trailing zeros.
pub fn format_number(v: f64) -> String {
    let rounded = (v * 1000.0).round() / 1000.0;
    if rounded == 0.0 {
        "0".to_string()
    } else {
        rounded.to_string()
    }
}

fn write_ring(out: &mut String, ring: &LineString<f64>) {
    let mut coords: &[Coord<f64>] = &ring.0;
    if coords.len() > 1 && coords.first() == coords.last() {
        coords = &coords[..coords.len() - 1];
    }
    for (i, c) in coords.iter().enumerate() {
        let cmd = if i == 0 { 'M' } else { 'L' };
        let _ = write!(out, "{cmd}{},{}", format_number(c.x), format_number(c.y));
    }
    if !coords.is_empty() {
        out.push('Z');
    }
}

/// SVG path `d` attribute for a (projected) shape. Every ring becomes a
/// closed subpath; an empty shape gives an empty string.
pub fn path_data(shape: &MultiPolygon<f64>) -> String {
    let mut out = String::new();
    for polygon in &shape.0 {
        write_ring(&mut out, polygon.exterior());
        for interior in polygon.interiors() {
            write_ring(&mut out, interior);
        }
    }
    out
}

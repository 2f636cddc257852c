//! Rendering seam.
//!
//! Shapes never rasterize themselves; they describe outlines to a `Surface`.
//! A canvas backend implements the trait. `SvgSurface` is the built-in
//! backend used for export and tests.

use crate::geometry::Point;
use std::fmt::Write;

/// How an outline is stroked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrokeStyle {
    #[default]
    Normal,
    /// Highlighted as part of the current selection.
    Selected,
}

impl StrokeStyle {
    pub fn from_selected(selected: bool) -> Self {
        if selected {
            StrokeStyle::Selected
        } else {
            StrokeStyle::Normal
        }
    }

    fn css_color(self) -> &'static str {
        match self {
            StrokeStyle::Normal => "#000000",
            StrokeStyle::Selected => "#1E90FF",
        }
    }
}

/// Anything a shape can draw its outline onto.
pub trait Surface {
    fn stroke_circle(&mut self, center: Point, radius: f64, style: StrokeStyle);
    fn stroke_rect(&mut self, center: Point, width: f64, height: f64, style: StrokeStyle);
}

// ─── SVG ──────────────────────────────────────────────────────────────────

/// Accumulates outlines into an SVG document.
#[derive(Debug, Clone)]
pub struct SvgSurface {
    width: f64,
    height: f64,
    body: String,
}

impl SvgSurface {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            body: String::new(),
        }
    }

    /// Close the document and return the SVG text.
    pub fn finish(self) -> String {
        format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">\n{body}</svg>\n",
            w = self.width,
            h = self.height,
            body = self.body,
        )
    }
}

impl Surface for SvgSurface {
    fn stroke_circle(&mut self, center: Point, radius: f64, style: StrokeStyle) {
        let _ = writeln!(
            self.body,
            "  <circle cx=\"{}\" cy=\"{}\" r=\"{}\" fill=\"none\" stroke=\"{}\"/>",
            center.x,
            center.y,
            radius.abs(),
            style.css_color(),
        );
    }

    fn stroke_rect(&mut self, center: Point, width: f64, height: f64, style: StrokeStyle) {
        // Width and height may be negative when built from swapped corners.
        let (w, h) = (width.abs(), height.abs());
        let _ = writeln!(
            self.body,
            "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"none\" stroke=\"{}\"/>",
            center.x - w / 2.0,
            center.y - h / 2.0,
            w,
            h,
            style.css_color(),
        );
    }
}

//! Glyph outlines to tiny-skia paths.

use tiny_skia::{Path, PathBuilder};
use ttf_parser::OutlineBuilder;

/// Collects a glyph outline in logical pixels.
///
/// Font units are y-up; the canvas is y-down, so y is flipped around the
/// baseline. `skew` shears the outline horizontally for synthetic italics.
pub(crate) struct GlyphPathBuilder {
    builder: PathBuilder,
    origin_x: f32,
    baseline: f32,
    scale: f32,
    skew: f32,
}

impl GlyphPathBuilder {
    pub(crate) fn new(origin_x: f32, baseline: f32, scale: f32, skew: f32) -> Self {
        Self {
            builder: PathBuilder::new(),
            origin_x,
            baseline,
            scale,
            skew,
        }
    }

    pub(crate) fn finish(self) -> Option<Path> {
        self.builder.finish()
    }

    fn map(&self, x: f32, y: f32) -> (f32, f32) {
        let up = y * self.scale;
        (self.origin_x + x * self.scale + up * self.skew, self.baseline - up)
    }
}

impl OutlineBuilder for GlyphPathBuilder {
    fn move_to(&mut self, x: f32, y: f32) {
        let (px, py) = self.map(x, y);
        self.builder.move_to(px, py);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let (px, py) = self.map(x, y);
        self.builder.line_to(px, py);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        let (cx, cy) = self.map(x1, y1);
        let (px, py) = self.map(x, y);
        self.builder.quad_to(cx, cy, px, py);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let (c1x, c1y) = self.map(x1, y1);
        let (c2x, c2y) = self.map(x2, y2);
        let (px, py) = self.map(x, y);
        self.builder.cubic_to(c1x, c1y, c2x, c2y, px, py);
    }

    fn close(&mut self) {
        self.builder.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_y_flip_and_skew() {
        let b = GlyphPathBuilder::new(10.0, 100.0, 0.01, 0.0);
        assert_eq!(b.map(0.0, 1000.0), (10.0, 90.0));
        let b = GlyphPathBuilder::new(10.0, 100.0, 0.01, 0.2);
        let (x, y) = b.map(0.0, 1000.0);
        assert!((x - 12.0).abs() < 1e-4);
        assert_eq!(y, 90.0);
    }

    #[test]
    fn test_outline_becomes_path() {
        let mut b = GlyphPathBuilder::new(0.0, 10.0, 1.0, 0.0);
        b.move_to(0.0, 0.0);
        b.line_to(5.0, 0.0);
        b.line_to(5.0, 5.0);
        b.close();
        let path = b.finish().unwrap();
        let bounds = path.bounds();
        assert_eq!(bounds.top(), 5.0);
        assert_eq!(bounds.bottom(), 10.0);
    }
}

//! # Raster Surface
//!
//! An owned, supersampled RGBA surface. Layouts draw in logical pixels
//! (the 400px-wide card); every primitive goes through a scale transform,
//! so one logical pixel covers `scale × scale` physical pixels.
//!
//! Text is drawn from glyph outlines, one path per glyph, using the same
//! [`FontContext`] resolution that measured it. Synthetic italic (a shear)
//! and synthetic bold (an outline stroke) stand in for missing faces.

mod glyph;

use rand::Rng;
use tiny_skia::{
    FillRule, GradientStop, LineCap, LineJoin, LinearGradient, Paint, Path, PathBuilder, Pixmap,
    Point, PremultipliedColorU8, RadialGradient, Rect, Shader, SpreadMode, Stroke, StrokeDash,
    Transform,
};
use ttf_parser::GlyphId;

use crate::error::CoverError;
use crate::font::{fallback_advance, FontContext, FontSpec, LoadedFace};
use crate::style::Color;
use glyph::GlyphPathBuilder;

/// Largest physical pixel count a surface may have (256 MiB of RGBA).
pub const MAX_SURFACE_PIXELS: u64 = 64 * 1024 * 1024;

/// Horizontal shear used for synthetic italics.
const ITALIC_SKEW: f32 = 0.2;

pub struct Canvas {
    pixmap: Pixmap,
    width: f32,
    height: f32,
    scale: f32,
}

impl Canvas {
    /// A transparent surface of `width × height` logical pixels.
    pub fn new(width: f32, height: f32, scale: f32) -> Result<Self, CoverError> {
        if !(width > 0.0 && height > 0.0 && scale > 0.0) || !(width * height * scale).is_finite() {
            return Err(CoverError::Canvas(format!(
                "invalid surface {}x{} at scale {}",
                width, height, scale
            )));
        }
        let width_px = (width * scale).ceil() as u32;
        let height_px = (height * scale).ceil() as u32;
        if width_px as u64 * height_px as u64 > MAX_SURFACE_PIXELS {
            return Err(CoverError::Canvas(format!(
                "surface {}x{}px exceeds the {}px budget",
                width_px, height_px, MAX_SURFACE_PIXELS
            )));
        }
        let pixmap = Pixmap::new(width_px, height_px).ok_or_else(|| {
            CoverError::Canvas(format!("failed to allocate {}x{}px surface", width_px, height_px))
        })?;
        Ok(Self {
            pixmap,
            width,
            height,
            scale,
        })
    }

    /// The largest scale, at most `scale`, at which a `width × height`
    /// surface stays within [`MAX_SURFACE_PIXELS`].
    pub fn fit_scale(width: f32, height: f32, scale: f32) -> f32 {
        let area = |s: f32| (width * s).ceil() as u64 * (height * s).ceil() as u64;
        if !(width > 0.0 && height > 0.0 && scale > 0.0) || area(scale) <= MAX_SURFACE_PIXELS {
            return scale;
        }
        let mut fitted = ((MAX_SURFACE_PIXELS as f64 / (width as f64 * height as f64)).sqrt() as f32)
            .min(scale);
        while fitted > 0.0 && area(fitted) > MAX_SURFACE_PIXELS {
            fitted *= 0.99;
        }
        fitted
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    fn transform(&self) -> Transform {
        Transform::from_scale(self.scale, self.scale)
    }

    pub fn clear(&mut self, color: Color) {
        self.pixmap.fill(color.to_skia());
    }

    pub fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Color) {
        if let Some(rect) = Rect::from_xywh(x, y, w, h) {
            self.pixmap
                .fill_rect(rect, &paint(color), self.transform(), None);
        }
    }

    pub fn fill_path(&mut self, path: &Path, color: Color) {
        self.fill_path_transformed(path, color, Transform::identity());
    }

    /// Fill with an extra transform applied in logical space first.
    pub fn fill_path_transformed(&mut self, path: &Path, color: Color, local: Transform) {
        self.pixmap.fill_path(
            path,
            &paint(color),
            FillRule::Winding,
            self.transform().pre_concat(local),
            None,
        );
    }

    pub fn stroke_path(&mut self, path: &Path, color: Color, width: f32, dash: Option<&[f32]>) {
        self.stroke_path_transformed(path, color, width, dash, Transform::identity());
    }

    pub fn stroke_path_transformed(
        &mut self,
        path: &Path,
        color: Color,
        width: f32,
        dash: Option<&[f32]>,
        local: Transform,
    ) {
        let stroke = stroke(width, dash);
        self.pixmap.stroke_path(
            path,
            &paint(color),
            &stroke,
            self.transform().pre_concat(local),
            None,
        );
    }

    /// Stroke a rectangle whose border lies inside `x, y, w, h`.
    pub fn stroke_rect(
        &mut self,
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        color: Color,
        width: f32,
        dash: Option<&[f32]>,
    ) {
        let half = width / 2.0;
        if let Some(rect) = Rect::from_xywh(x + half, y + half, w - width, h - width) {
            let path = PathBuilder::from_rect(rect);
            self.stroke_path(&path, color, width, dash);
        }
    }

    pub fn line(
        &mut self,
        from: (f32, f32),
        to: (f32, f32),
        color: Color,
        width: f32,
        dash: Option<&[f32]>,
    ) {
        let mut pb = PathBuilder::new();
        pb.move_to(from.0, from.1);
        pb.line_to(to.0, to.1);
        if let Some(path) = pb.finish() {
            self.stroke_path(&path, color, width, dash);
        }
    }

    pub fn fill_circle(&mut self, cx: f32, cy: f32, r: f32, color: Color) {
        if let Some(path) = PathBuilder::from_circle(cx, cy, r) {
            self.fill_path(&path, color);
        }
    }

    pub fn stroke_circle(
        &mut self,
        cx: f32,
        cy: f32,
        r: f32,
        color: Color,
        width: f32,
        dash: Option<&[f32]>,
    ) {
        if let Some(path) = PathBuilder::from_circle(cx, cy, r) {
            self.stroke_path(&path, color, width, dash);
        }
    }

    /// Fill a rect with a radial gradient. `stops` are `(offset, color)`.
    pub fn fill_rect_radial(
        &mut self,
        rect: (f32, f32, f32, f32),
        center: (f32, f32),
        radius: f32,
        stops: &[(f32, Color)],
    ) {
        let Some(shader) = RadialGradient::new(
            Point::from_xy(center.0, center.1),
            Point::from_xy(center.0, center.1),
            radius,
            gradient_stops(stops),
            SpreadMode::Pad,
            Transform::identity(),
        ) else {
            return;
        };
        self.fill_rect_shader(rect, shader);
    }

    /// Fill a rect with a linear gradient from `start` to `end`.
    pub fn fill_rect_linear(
        &mut self,
        rect: (f32, f32, f32, f32),
        start: (f32, f32),
        end: (f32, f32),
        stops: &[(f32, Color)],
    ) {
        let Some(shader) = LinearGradient::new(
            Point::from_xy(start.0, start.1),
            Point::from_xy(end.0, end.1),
            gradient_stops(stops),
            SpreadMode::Pad,
            Transform::identity(),
        ) else {
            return;
        };
        self.fill_rect_shader(rect, shader);
    }

    fn fill_rect_shader(&mut self, (x, y, w, h): (f32, f32, f32, f32), shader: Shader) {
        let Some(rect) = Rect::from_xywh(x, y, w, h) else {
            return;
        };
        let paint = Paint {
            shader,
            anti_alias: true,
            ..Paint::default()
        };
        self.pixmap.fill_rect(rect, &paint, self.transform(), None);
    }

    /// Hairline grid over the whole surface, `spacing` logical px apart.
    pub fn grid(&mut self, spacing: f32, color: Color) {
        if spacing <= 0.0 {
            return;
        }
        let mut pb = PathBuilder::new();
        let mut x = 0.0;
        while x <= self.width {
            if let Some(rect) = Rect::from_xywh(x, 0.0, 1.0, self.height) {
                pb.push_rect(rect);
            }
            x += spacing;
        }
        let mut y = 0.0;
        while y <= self.height {
            if let Some(rect) = Rect::from_xywh(0.0, y, self.width, 1.0) {
                pb.push_rect(rect);
            }
            y += spacing;
        }
        if let Some(path) = pb.finish() {
            self.fill_path(&path, color);
        }
    }

    /// Darken random physical pixels with black at `alpha`/255.
    ///
    /// Each pixel is hit independently with probability `density`.
    pub fn apply_noise(&mut self, density: f32, alpha: u8, rng: &mut impl Rng) {
        let density = density.clamp(0.0, 1.0) as f64;
        if density == 0.0 || alpha == 0 {
            return;
        }
        let keep = 255 - alpha as u16;
        let scale = |c: u8| ((c as u16 * keep + 127) / 255) as u8;
        for px in self.pixmap.pixels_mut() {
            if !rng.gen_bool(density) {
                continue;
            }
            let a = (alpha as u16 + scale(px.alpha()) as u16).min(255) as u8;
            if let Some(darker) =
                PremultipliedColorU8::from_rgba(scale(px.red()), scale(px.green()), scale(px.blue()), a)
            {
                *px = darker;
            }
        }
    }

    /// Draw `text` with its baseline at `baseline`, starting at `x`.
    ///
    /// `letter_spacing` is added after every character. Returns the advance.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_text(
        &mut self,
        fonts: &FontContext,
        text: &str,
        x: f32,
        baseline: f32,
        spec: &FontSpec,
        color: Color,
        letter_spacing: f32,
    ) -> f32 {
        let paint = paint(color);
        let mut pen = x;
        for (ch, face) in fonts.resolve(text, spec) {
            let advance = match face {
                Some(face) => {
                    if !ch.is_whitespace() {
                        self.draw_glyph(face, ch, pen, baseline, spec, &paint);
                    }
                    face.metrics.char_width(ch, spec.size)
                }
                None => fallback_advance(ch) * spec.size,
            };
            pen += advance + letter_spacing;
        }
        pen - x
    }

    fn draw_glyph(
        &mut self,
        loaded: &LoadedFace,
        ch: char,
        pen: f32,
        baseline: f32,
        spec: &FontSpec,
        paint: &Paint,
    ) {
        let Some(&glyph_id) = loaded.metrics.glyph_ids.get(&ch) else {
            return;
        };
        let Some(face) = loaded.face() else {
            return;
        };
        let skew = if spec.italic && !loaded.italic {
            ITALIC_SKEW
        } else {
            0.0
        };
        let scale = spec.size / loaded.metrics.units_per_em as f32;
        let mut builder = GlyphPathBuilder::new(pen, baseline, scale, skew);
        if face.outline_glyph(GlyphId(glyph_id), &mut builder).is_none() {
            return;
        }
        let Some(path) = builder.finish() else {
            return;
        };
        let transform = self.transform();
        self.pixmap
            .fill_path(&path, paint, FillRule::Winding, transform, None);
        if spec.is_bold() && loaded.weight < 600 {
            let stroke = Stroke {
                width: spec.size * 0.04,
                line_join: LineJoin::Round,
                ..Stroke::default()
            };
            self.pixmap.stroke_path(&path, paint, &stroke, transform, None);
        }
    }

    /// Encode the surface as PNG.
    pub fn encode_png(&self) -> Result<Vec<u8>, CoverError> {
        use image::{codecs::png::PngEncoder, ColorType, ImageEncoder};

        let mut rgba = Vec::with_capacity(self.pixmap.data().len());
        for px in self.pixmap.pixels() {
            let c = px.demultiply();
            rgba.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }
        let mut out = Vec::new();
        PngEncoder::new(&mut out)
            .write_image(&rgba, self.pixmap.width(), self.pixmap.height(), ColorType::Rgba8)
            .map_err(|e| CoverError::Encode(e.to_string()))?;
        Ok(out)
    }
}

/// A rounded rectangle path. `radii` are top-left, top-right,
/// bottom-right, bottom-left.
pub fn rounded_rect(x: f32, y: f32, w: f32, h: f32, radii: [f32; 4]) -> Option<Path> {
    // Cubic approximation of a quarter circle.
    const K: f32 = 0.552_284_8;
    let max = w.min(h) / 2.0;
    let [tl, tr, br, bl] = radii.map(|r| r.clamp(0.0, max));
    let (r, b) = (x + w, y + h);
    let mut pb = PathBuilder::new();
    pb.move_to(x + tl, y);
    pb.line_to(r - tr, y);
    pb.cubic_to(r - tr + tr * K, y, r, y + tr - tr * K, r, y + tr);
    pb.line_to(r, b - br);
    pb.cubic_to(r, b - br + br * K, r - br + br * K, b, r - br, b);
    pb.line_to(x + bl, b);
    pb.cubic_to(x + bl - bl * K, b, x, b - bl + bl * K, x, b - bl);
    pb.line_to(x, y + tl);
    pb.cubic_to(x, y + tl - tl * K, x + tl - tl * K, y, x + tl, y);
    pb.close();
    pb.finish()
}

fn paint(color: Color) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(color.to_skia());
    paint.anti_alias = true;
    paint
}

fn stroke(width: f32, dash: Option<&[f32]>) -> Stroke {
    let mut stroke = Stroke {
        width: width.max(0.0),
        line_cap: LineCap::Butt,
        ..Stroke::default()
    };
    if let Some(pattern) = dash {
        let mut pattern: Vec<f32> = pattern.iter().map(|p| p.abs()).collect();
        if pattern.len() % 2 == 1 {
            pattern.extend(pattern.clone());
        }
        stroke.dash = StrokeDash::new(pattern, 0.0);
    }
    stroke
}

fn gradient_stops(stops: &[(f32, Color)]) -> Vec<GradientStop> {
    stops
        .iter()
        .map(|(offset, color)| GradientStop::new(*offset, color.to_skia()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn pixel(canvas: &Canvas, x: u32, y: u32) -> tiny_skia::ColorU8 {
        canvas.pixmap().pixel(x, y).unwrap().demultiply()
    }

    #[test]
    fn test_physical_size_follows_scale() {
        let canvas = Canvas::new(400.0, 440.0, 4.0).unwrap();
        assert_eq!(canvas.pixmap().width(), 1600);
        assert_eq!(canvas.pixmap().height(), 1760);
    }

    #[test]
    fn test_rejects_bad_dimensions() {
        assert!(matches!(Canvas::new(0.0, 10.0, 4.0), Err(CoverError::Canvas(_))));
        assert!(matches!(Canvas::new(400.0, f32::NAN, 4.0), Err(CoverError::Canvas(_))));
        assert!(matches!(Canvas::new(400.0, 100_000.0, 4.0), Err(CoverError::Canvas(_))));
    }

    #[test]
    fn test_fit_scale() {
        assert_eq!(Canvas::fit_scale(400.0, 4171.0, 4.0), 4.0);
        let fitted = Canvas::fit_scale(400.0, 100_000.0, 4.0);
        assert!(fitted < 4.0 && fitted > 1.0);
        let px = (400.0 * fitted).ceil() as u64 * (100_000.0 * fitted).ceil() as u64;
        assert!(px <= MAX_SURFACE_PIXELS);
    }

    #[test]
    fn test_fill_rect_in_logical_units() {
        let mut canvas = Canvas::new(10.0, 10.0, 2.0).unwrap();
        canvas.clear(Color::WHITE);
        canvas.fill_rect(0.0, 0.0, 5.0, 5.0, Color::BLACK);
        assert_eq!(pixel(&canvas, 1, 1).red(), 0);
        assert_eq!(pixel(&canvas, 9, 9).red(), 0);
        assert_eq!(pixel(&canvas, 11, 11).red(), 255);
    }

    #[test]
    fn test_noise_darkens_about_density() {
        let mut canvas = Canvas::new(50.0, 50.0, 1.0).unwrap();
        canvas.clear(Color::WHITE);
        let mut rng = StdRng::seed_from_u64(7);
        canvas.apply_noise(0.5, 8, &mut rng);
        let total = canvas.pixmap().pixels().len();
        let dark = canvas
            .pixmap()
            .pixels()
            .iter()
            .filter(|p| p.red() < 255)
            .count();
        let share = dark as f32 / total as f32;
        assert!((0.4..0.6).contains(&share), "share {share}");
        assert!(canvas.pixmap().pixels().iter().all(|p| p.red() >= 246));
        assert!(canvas.pixmap().pixels().iter().all(|p| p.alpha() == 255));
    }

    #[test]
    fn test_zero_density_is_noop() {
        let mut canvas = Canvas::new(10.0, 10.0, 1.0).unwrap();
        canvas.clear(Color::WHITE);
        canvas.apply_noise(0.0, 8, &mut StdRng::seed_from_u64(1));
        assert!(canvas.pixmap().pixels().iter().all(|p| p.red() == 255));
    }

    #[test]
    fn test_radial_gradient_fades() {
        let mut canvas = Canvas::new(100.0, 10.0, 1.0).unwrap();
        canvas.clear(Color::BLACK);
        canvas.fill_rect_radial(
            (0.0, 0.0, 100.0, 10.0),
            (0.0, 5.0),
            80.0,
            &[(0.0, Color::WHITE), (1.0, Color::TRANSPARENT)],
        );
        assert!(pixel(&canvas, 1, 5).red() > 240);
        assert_eq!(pixel(&canvas, 95, 5).red(), 0);
    }

    #[test]
    fn test_text_without_fonts_advances() {
        let mut canvas = Canvas::new(100.0, 20.0, 1.0).unwrap();
        let fonts = FontContext::new();
        let spec = FontSpec::serif(10.0);
        let advance = canvas.draw_text(&fonts, "中a", 0.0, 15.0, &spec, Color::BLACK, 1.0);
        assert!((advance - (10.0 + 5.5 + 2.0)).abs() < 1e-4);
    }

    #[test]
    fn test_png_roundtrip_dimensions() {
        let mut canvas = Canvas::new(20.0, 10.0, 2.0).unwrap();
        canvas.clear(Color::parse_hex("#F9DEE2").unwrap());
        let png = canvas.encode_png().unwrap();
        let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (40, 20));
        assert_eq!(decoded.get_pixel(0, 0).0, [0xF9, 0xDE, 0xE2, 0xFF]);
    }

    #[test]
    fn test_rounded_rect_bounds() {
        let path = rounded_rect(0.0, 0.0, 96.0, 96.0, [0.0, 0.0, 0.0, 64.0]).unwrap();
        let bounds = path.bounds();
        assert_eq!(bounds.width(), 96.0);
        assert_eq!(bounds.height(), 96.0);
    }
}

//! # Card Layouts
//!
//! Re-renders the editor's card preview onto a [`Canvas`] without a DOM.
//!
//! Every layout is a fixed arrangement of chrome (frames, labels, rules)
//! around one or two text bodies. The card is always 400 logical px wide.
//! Its height is either the fixed cover height or, in long-text mode, the
//! height the layout needs for its wrapped bodies, but never less than the
//! long-text minimum.
//!
//! Painting happens in layers:
//!
//! 1. Flat background color
//! 2. White radial glow from the upper-left
//! 3. Text-colored hairline grid (not for `duality`)
//! 4. Grain noise, regenerated on every render
//! 5. The layout itself, via one painter per [`LayoutStyle`] variant
//!
//! Each painter module exposes the same two functions: `content_height`,
//! the natural height of the card for long-text mode, and `paint`. Both
//! read geometry from the same constants so the measured height and the
//! painted body always agree.

mod duality;
mod minimal;
mod split;
mod storybook;

use chrono::{Datelike, NaiveDate};
use rand::Rng;
use tracing::{debug, warn};

use crate::error::CoverError;
use crate::font::{FontContext, FontSpec};
use crate::model::{CoverState, LayoutStyle, Mode, RenderOptions};
use crate::raster::Canvas;
use crate::style::{Color, TextAlign};
use crate::text::{flatten, reading_minutes, wrap, WrappedText};

/// Logical width of every card.
pub const CANVAS_WIDTH: f32 = 400.0;
/// Height of a card in cover mode.
pub const COVER_HEIGHT: f32 = 440.0;
/// Smallest height of a card in long-text mode.
pub const LONG_TEXT_MIN_HEIGHT: f32 = 600.0;
/// Body line height as a multiple of the body font size.
pub const BODY_LEADING: f32 = 1.5;

const GRID_SPACING: f32 = 40.0;
const GRID_OPACITY: f32 = 0.05;
const GLOW_OPACITY: f32 = 0.6;
/// Alpha of the black each grain hit lays over a pixel.
pub const NOISE_ALPHA: u8 = 8;

impl LayoutStyle {
    /// Title size for `title`, stepping down as it gets longer.
    pub fn title_font_size(self, title: &str) -> f32 {
        let len = title.chars().count();
        let (long, medium, short_size) = match self {
            LayoutStyle::Minimal => (14, 10, 36.0),
            LayoutStyle::Split => (12, 8, 48.0),
            LayoutStyle::Duality | LayoutStyle::Storybook => (10, 7, 36.0),
        };
        if len > long {
            24.0
        } else if len > medium {
            30.0
        } else {
            short_size
        }
    }

    pub fn subtitle_base_size(self) -> f32 {
        match self {
            LayoutStyle::Minimal => 14.0,
            LayoutStyle::Split | LayoutStyle::Duality => 12.0,
            LayoutStyle::Storybook => 20.0,
        }
    }

    /// Subtitle size for `subtitle`; long subtitles shrink below the base.
    pub fn subtitle_font_size(self, subtitle: &str) -> f32 {
        match subtitle.chars().count() {
            n if n > 30 => 11.0,
            n if n > 24 => 12.0,
            n if n > 18 => 13.0,
            n if n > 12 => 14.0,
            _ => self.subtitle_base_size(),
        }
    }

    /// Whether the hairline grid texture is painted under this layout.
    pub fn has_grid(self) -> bool {
        self != LayoutStyle::Duality
    }
}

// ── Scene ───────────────────────────────────────────────────────

/// Everything a painter needs, resolved once per render.
pub struct Scene<'a> {
    pub state: &'a CoverState,
    pub fonts: &'a FontContext,
    pub ink: Color,
    pub accent: Color,
    pub background: Color,
    /// Title face at size zero; painters set the size.
    pub title_font: FontSpec,
    pub body_font: FontSpec,
    pub align: TextAlign,
    /// Flattened bodies.
    pub primary: String,
    pub secondary: String,
    pub categories: Vec<String>,
    pub reading_minutes: u32,
    pub date: NaiveDate,
    /// Four-digit record number printed in the chrome.
    pub record_id: u32,
}

impl<'a> Scene<'a> {
    pub fn new(
        state: &'a CoverState,
        fonts: &'a FontContext,
        date: NaiveDate,
        rng: &mut impl Rng,
    ) -> Self {
        let (primary_html, secondary_html) = state.bodies();
        let primary = flatten(primary_html);
        let secondary = flatten(secondary_html);
        // Only duality paints the secondary body.
        let minutes = if state.layout_style == LayoutStyle::Duality {
            reading_minutes(&format!("{}{}", primary, secondary))
        } else {
            reading_minutes(&primary)
        };
        let mut body_font = font_for_key(state.body_font.as_deref(), state.body_font_size())
            .italic(state.is_body_italic);
        if state.is_body_bold {
            body_font = body_font.bold();
        }

        Self {
            state,
            fonts,
            ink: state.foreground(),
            accent: state.accent(),
            background: state.background(),
            title_font: font_for_key(state.title_font.as_deref(), 0.0),
            body_font,
            align: state.body_align(),
            primary,
            secondary,
            categories: state.categories(),
            reading_minutes: minutes,
            date,
            record_id: rng.gen_range(0..10_000),
        }
    }

    pub fn layout(&self) -> LayoutStyle {
        self.state.layout_style
    }

    pub fn is_long_text(&self) -> bool {
        self.state.mode == Mode::LongText
    }

    /// The title face at this layout's size for the current title.
    pub fn title_spec(&self) -> FontSpec {
        let mut spec = self.title_font.clone();
        spec.size = self.layout().title_font_size(&self.state.title);
        spec
    }

    /// A face from the body family at `size`, without the body's bold and
    /// italic hints.
    pub fn body_family(&self, size: f32) -> FontSpec {
        FontSpec::new(&self.body_font.family, size)
    }

    pub fn body_line_height(&self) -> f32 {
        self.body_font.size * BODY_LEADING
    }

    /// Wrap a flattened body to `width` at the body font.
    pub fn wrap_body(&self, text: &str, width: f32) -> WrappedText {
        wrap(
            text,
            width,
            &self.fonts.measurer(&self.body_font),
            self.body_line_height(),
        )
    }

    /// `text` shortened with a trailing ellipsis until it fits `max_width`.
    pub fn ellipsize(&self, text: &str, spec: &FontSpec, spacing: f32, max_width: f32) -> String {
        if self.fonts.measure_spaced(text, spec, spacing) <= max_width {
            return text.to_string();
        }
        let mut chars: Vec<char> = text.chars().collect();
        while !chars.is_empty() {
            chars.pop();
            let candidate: String = chars.iter().collect::<String>().trim_end().to_string() + "…";
            if self.fonts.measure_spaced(&candidate, spec, spacing) <= max_width {
                return candidate;
            }
        }
        String::new()
    }

    pub fn reading_label(&self) -> String {
        format!("约 {} 分钟", self.reading_minutes)
    }

    pub fn year(&self) -> i32 {
        self.date.year()
    }

    /// Paint wrapped body lines from `top`, aligned within `x..x + width`.
    ///
    /// With `clip_bottom`, lines that would cross it are not painted.
    #[allow(clippy::too_many_arguments)]
    pub fn paint_body(
        &self,
        canvas: &mut Canvas,
        body: &WrappedText,
        x: f32,
        top: f32,
        width: f32,
        clip_bottom: Option<f32>,
        color: Color,
    ) {
        let (ascent, descent) = self.fonts.vertical_metrics(&self.body_font);
        let lh = body.line_height;
        for (i, line) in body.lines.iter().enumerate() {
            let line_top = top + i as f32 * lh;
            if clip_bottom.is_some_and(|bottom| line_top + lh > bottom + 0.5) {
                debug!(painted = i, total = body.lines.len(), "body clipped");
                break;
            }
            if line.text.is_empty() {
                continue;
            }
            let natural = self.fonts.measure(&line.text, &self.body_font);
            let (offset, spacing) = match self.align {
                TextAlign::Left => (0.0, 0.0),
                TextAlign::Center => ((width - natural) / 2.0, 0.0),
                TextAlign::Right => (width - natural, 0.0),
                TextAlign::Justify => (0.0, justify_spacing(&line.text, natural, width, line.ends_paragraph)),
            };
            let baseline = baseline_in(line_top, lh, ascent, descent);
            canvas.draw_text(
                self.fonts,
                &line.text,
                x + offset.max(0.0),
                baseline,
                &self.body_font,
                color,
                spacing,
            );
        }
    }
}

/// Extra space after each character that stretches a justified line to
/// `width`. Paragraph-final lines keep their natural width.
fn justify_spacing(text: &str, natural: f32, width: f32, ends_paragraph: bool) -> f32 {
    let count = text.trim_end().chars().count();
    if ends_paragraph || count < 2 || natural >= width {
        return 0.0;
    }
    (width - natural) / (count - 1) as f32
}

/// Baseline that centers a font's ascent and descent in a line box.
fn baseline_in(top: f32, line_height: f32, ascent: f32, descent: f32) -> f32 {
    top + (line_height - (ascent + descent)) / 2.0 + ascent
}

/// Map an editor font key to a face request.
fn font_for_key(key: Option<&str>, size: f32) -> FontSpec {
    match key.map(str::trim).unwrap_or_default() {
        "" | "sans" => FontSpec::new("sans", size),
        "bold" => FontSpec::new("sans", size).bold(),
        other => FontSpec::new(other, size),
    }
}

// ── Labels ──────────────────────────────────────────────────────

/// Which point of a label its `x` refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum Anchor {
    #[default]
    Start,
    Middle,
    End,
}

/// A single line of chrome text.
#[derive(Debug, Clone)]
pub(crate) struct Label<'s> {
    text: &'s str,
    spec: FontSpec,
    color: Color,
    spacing: f32,
    anchor: Anchor,
}

impl<'s> Label<'s> {
    pub(crate) fn new(text: &'s str, spec: FontSpec, color: Color) -> Self {
        Self {
            text,
            spec,
            color,
            spacing: 0.0,
            anchor: Anchor::Start,
        }
    }

    /// Letter spacing in em.
    pub(crate) fn tracking(mut self, em: f32) -> Self {
        self.spacing = em * self.spec.size;
        self
    }

    pub(crate) fn anchor(mut self, anchor: Anchor) -> Self {
        self.anchor = anchor;
        self
    }

    pub(crate) fn width(&self, fonts: &FontContext) -> f32 {
        fonts.measure_spaced(self.text, &self.spec, self.spacing)
    }

    /// Paint in the line box `top..top + line_height`. Returns the width.
    pub(crate) fn paint(
        &self,
        canvas: &mut Canvas,
        fonts: &FontContext,
        x: f32,
        top: f32,
        line_height: f32,
    ) -> f32 {
        let width = self.width(fonts);
        let start = match self.anchor {
            Anchor::Start => x,
            Anchor::Middle => x - width / 2.0,
            Anchor::End => x - width,
        };
        let (ascent, descent) = fonts.vertical_metrics(&self.spec);
        let baseline = baseline_in(top, line_height, ascent, descent);
        canvas.draw_text(fonts, self.text, start, baseline, &self.spec, self.color, self.spacing);
        width
    }
}

// ── Rendering ───────────────────────────────────────────────────

/// The natural long-text height of `scene`'s layout.
fn content_height(scene: &Scene) -> f32 {
    match scene.layout() {
        LayoutStyle::Minimal => minimal::content_height(scene),
        LayoutStyle::Split => split::content_height(scene),
        LayoutStyle::Duality => duality::content_height(scene),
        LayoutStyle::Storybook => storybook::content_height(scene),
    }
}

/// Logical height of the card.
pub fn canvas_height(scene: &Scene) -> f32 {
    match scene.state.mode {
        Mode::Cover => COVER_HEIGHT,
        Mode::LongText => content_height(scene).ceil().max(LONG_TEXT_MIN_HEIGHT),
    }
}

/// Paint the whole card for `scene` onto a fresh canvas.
pub fn render_scene(
    scene: &Scene,
    options: &RenderOptions,
    rng: &mut impl Rng,
) -> Result<Canvas, CoverError> {
    let height = canvas_height(scene);
    debug!(
        layout = ?scene.layout(),
        mode = ?scene.state.mode,
        height,
        scale = options.scale,
        "rendering cover"
    );
    let scale = Canvas::fit_scale(CANVAS_WIDTH, height, options.scale);
    if scale < options.scale {
        warn!(
            requested = options.scale,
            scale, height, "cover too tall for the surface budget; lowering scale"
        );
    }
    let mut canvas = Canvas::new(CANVAS_WIDTH, height, scale)?;
    paint_background(&mut canvas, scene);
    if options.noise {
        canvas.apply_noise(options.noise_density, NOISE_ALPHA, rng);
    }
    match scene.layout() {
        LayoutStyle::Minimal => minimal::paint(&mut canvas, scene),
        LayoutStyle::Split => split::paint(&mut canvas, scene),
        LayoutStyle::Duality => duality::paint(&mut canvas, scene),
        LayoutStyle::Storybook => storybook::paint(&mut canvas, scene),
    }
    Ok(canvas)
}

/// Flat color, glow and grid.
fn paint_background(canvas: &mut Canvas, scene: &Scene) {
    let (w, h) = (canvas.width(), canvas.height());
    canvas.clear(scene.background);

    let center = (w * 0.1, h * 0.2);
    let radius = farthest_corner(center, w, h);
    canvas.fill_rect_radial(
        (0.0, 0.0, w, h),
        center,
        radius,
        &[
            (0.0, Color::WHITE.fade(GLOW_OPACITY)),
            (0.8, Color::WHITE.fade(0.0)),
        ],
    );

    if scene.layout().has_grid() {
        canvas.grid(GRID_SPACING, scene.ink.fade(GRID_OPACITY));
    }
}

fn farthest_corner((cx, cy): (f32, f32), w: f32, h: f32) -> f32 {
    let dx = cx.max(w - cx);
    let dy = cy.max(h - cy);
    (dx * dx + dy * dy).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn scene_for<'a>(state: &'a CoverState, fonts: &'a FontContext) -> Scene<'a> {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        Scene::new(state, fonts, date, &mut StdRng::seed_from_u64(7))
    }

    fn options() -> RenderOptions {
        RenderOptions {
            scale: 1.0,
            noise: false,
            system_fonts: false,
            ..RenderOptions::default()
        }
    }

    #[test]
    fn test_title_sizes() {
        assert_eq!(LayoutStyle::Minimal.title_font_size("短标题"), 36.0);
        assert_eq!(LayoutStyle::Minimal.title_font_size(&"字".repeat(11)), 30.0);
        assert_eq!(LayoutStyle::Minimal.title_font_size(&"字".repeat(15)), 24.0);
        assert_eq!(LayoutStyle::Split.title_font_size(&"字".repeat(8)), 48.0);
        assert_eq!(LayoutStyle::Split.title_font_size(&"字".repeat(9)), 30.0);
        assert_eq!(LayoutStyle::Split.title_font_size(&"字".repeat(13)), 24.0);
        assert_eq!(LayoutStyle::Duality.title_font_size(&"字".repeat(7)), 36.0);
        assert_eq!(LayoutStyle::Storybook.title_font_size(&"字".repeat(8)), 30.0);
        assert_eq!(LayoutStyle::Storybook.title_font_size(&"字".repeat(11)), 24.0);
    }

    #[test]
    fn test_subtitle_sizes() {
        let s = |n: usize| "字".repeat(n);
        assert_eq!(LayoutStyle::Storybook.subtitle_font_size(&s(12)), 20.0);
        assert_eq!(LayoutStyle::Storybook.subtitle_font_size(&s(13)), 14.0);
        assert_eq!(LayoutStyle::Minimal.subtitle_font_size(&s(19)), 13.0);
        assert_eq!(LayoutStyle::Split.subtitle_font_size(&s(25)), 12.0);
        assert_eq!(LayoutStyle::Duality.subtitle_font_size(&s(31)), 11.0);
        assert_eq!(LayoutStyle::Duality.subtitle_font_size(""), 12.0);
    }

    #[test]
    fn test_cover_height_is_fixed() {
        let fonts = FontContext::new();
        for layout in [
            LayoutStyle::Minimal,
            LayoutStyle::Split,
            LayoutStyle::Duality,
            LayoutStyle::Storybook,
        ] {
            let state = CoverState {
                layout_style: layout,
                mode: Mode::Cover,
                body_text: "很长的正文".repeat(200),
                ..CoverState::default()
            };
            assert_eq!(canvas_height(&scene_for(&state, &fonts)), COVER_HEIGHT);
        }
    }

    #[test]
    fn test_long_text_grows_with_body() {
        let fonts = FontContext::new();
        for layout in [
            LayoutStyle::Minimal,
            LayoutStyle::Split,
            LayoutStyle::Duality,
            LayoutStyle::Storybook,
        ] {
            let short = CoverState {
                layout_style: layout,
                body_text: "短".to_string(),
                ..CoverState::default()
            };
            let long = CoverState {
                body_text: "长".repeat(3000),
                ..short.clone()
            };
            let short_h = canvas_height(&scene_for(&short, &fonts));
            let long_h = canvas_height(&scene_for(&long, &fonts));
            assert_eq!(short_h, LONG_TEXT_MIN_HEIGHT, "{:?}", layout);
            assert!(long_h > short_h, "{:?}", layout);
        }
    }

    #[test]
    fn test_justify_spacing() {
        assert_eq!(justify_spacing("abcde", 50.0, 90.0, false), 10.0);
        assert_eq!(justify_spacing("abcde", 50.0, 90.0, true), 0.0);
        assert_eq!(justify_spacing("a", 10.0, 90.0, false), 0.0);
        assert_eq!(justify_spacing("abcde", 95.0, 90.0, false), 0.0);
    }

    #[test]
    fn test_ellipsize_without_fonts() {
        let state = CoverState::default();
        let fonts = FontContext::new();
        let scene = scene_for(&state, &fonts);
        let spec = FontSpec::serif(10.0);
        assert_eq!(scene.ellipsize("你好", &spec, 0.0, 100.0), "你好");
        assert_eq!(scene.ellipsize("一二三四五六", &spec, 0.0, 40.0), "一二三…");
        assert_eq!(scene.ellipsize("一二三", &spec, 0.0, 5.0), "");
    }

    #[test]
    fn test_scene_flattens_and_counts() {
        let state = CoverState {
            body_text: "第一行<div>第二行</div>".to_string(),
            secondary_body_text: "尾".repeat(400),
            ..CoverState::default()
        };
        let fonts = FontContext::new();
        let scene = scene_for(&state, &fonts);
        assert_eq!(scene.primary, "第一行\n第二行");
        assert_eq!(scene.reading_minutes, 1);
        assert_eq!(scene.reading_label(), "约 1 分钟");
        assert!(scene.record_id < 10_000);
        assert_eq!(scene.year(), 2024);
    }

    #[test]
    fn test_reading_time_counts_painted_bodies() {
        let fonts = FontContext::new();
        let hidden = CoverState {
            body_text: "正".repeat(300),
            secondary_body_text: "尾".repeat(300),
            ..CoverState::default()
        };
        for layout in [LayoutStyle::Minimal, LayoutStyle::Split, LayoutStyle::Storybook] {
            let state = CoverState {
                layout_style: layout,
                ..hidden.clone()
            };
            assert_eq!(scene_for(&state, &fonts).reading_minutes, 1, "{:?}", layout);
        }
        let duality = CoverState {
            layout_style: LayoutStyle::Duality,
            ..hidden
        };
        assert_eq!(scene_for(&duality, &fonts).reading_minutes, 2);
    }

    #[test]
    fn test_font_keys() {
        assert_eq!(font_for_key(None, 12.0).family, "sans");
        assert!(font_for_key(Some("bold"), 12.0).is_bold());
        assert_eq!(font_for_key(Some("serif"), 12.0).family, "serif");
    }

    #[test]
    fn test_render_scene_dimensions() {
        let state = CoverState {
            mode: Mode::Cover,
            ..CoverState::default()
        };
        let fonts = FontContext::new();
        let scene = scene_for(&state, &fonts);
        let canvas = render_scene(&scene, &options(), &mut StdRng::seed_from_u64(1)).unwrap();
        assert_eq!(canvas.pixmap().width(), 400);
        assert_eq!(canvas.pixmap().height(), 440);
    }

    #[test]
    fn test_glow_brightens_upper_left() {
        let state = CoverState {
            mode: Mode::Cover,
            background_color: "#808080".to_string(),
            layout_style: LayoutStyle::Duality,
            title: String::new(),
            subtitle: String::new(),
            category: String::new(),
            author: String::new(),
            ..CoverState::default()
        };
        let fonts = FontContext::new();
        let scene = scene_for(&state, &fonts);
        let mut canvas = Canvas::new(CANVAS_WIDTH, COVER_HEIGHT, 1.0).unwrap();
        paint_background(&mut canvas, &scene);
        let near = canvas.pixmap().pixel(40, 88).unwrap();
        let far = canvas.pixmap().pixel(399, 439).unwrap();
        assert!(near.red() > 0x80 + 40);
        assert!(far.red() <= 0x81);
    }
}

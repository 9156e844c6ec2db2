//! `storybook`: a framed picture-book page with a tilted subtitle plate and
//! vertical category stamps.

use chrono::Datelike;
use tiny_skia::Transform;

use super::{Anchor, Label, Scene, CANVAS_WIDTH};
use crate::font::FontSpec;
use crate::raster::{rounded_rect, Canvas};
use crate::style::Color;

const PAD: f32 = 24.0;
/// Outer frame border, gap, inner border and inner padding.
const CONTENT_INSET: f32 = PAD + 2.0 + 4.0 + 1.0 + 16.0;
const CONTENT_WIDTH: f32 = CANVAS_WIDTH - 2.0 * CONTENT_INSET;
const PLATE_ROW_MIN: f32 = 40.0;
const STAMP_CHAR: f32 = 12.5;
const STAMP_WIDTH: f32 = 22.0;
const STAMP_GAP: f32 = 8.0;
/// Dashed rule, padding and the byline row.
const FOOTER_HEIGHT: f32 = 24.0;
const PLATE_TILT: f32 = -1.0;

struct Geometry {
    title_top: f32,
    title_height: f32,
    row_top: f32,
    row_height: f32,
    plate_text_height: f32,
    body_top: f32,
}

fn stamp_height(category: &str) -> f32 {
    4.0 + 16.0 + category.chars().count() as f32 * STAMP_CHAR
}

fn stamps_width(scene: &Scene) -> f32 {
    let n = scene.categories.len() as f32;
    if n == 0.0 {
        0.0
    } else {
        n * STAMP_WIDTH + (n - 1.0) * STAMP_GAP
    }
}

fn plate_size(scene: &Scene) -> f32 {
    scene.layout().subtitle_font_size(&scene.state.subtitle)
}

fn geometry(scene: &Scene) -> Geometry {
    let title_top = CONTENT_INSET;
    let title_height = scene.title_spec().size * 1.25;
    let row_top = title_top + title_height + 16.0;
    let plate_text_height = (plate_size(scene) * 1.4).round();
    let tallest_stamp = scene
        .categories
        .iter()
        .map(|c| stamp_height(c))
        .fold(0.0, f32::max);
    let row_height = PLATE_ROW_MIN
        .max(plate_text_height + 8.0 + 4.0)
        .max(tallest_stamp);
    Geometry {
        title_top,
        title_height,
        row_top,
        row_height,
        plate_text_height,
        body_top: row_top + row_height + 16.0,
    }
}

pub(super) fn content_height(scene: &Scene) -> f32 {
    let body = scene.wrap_body(&scene.primary, CONTENT_WIDTH).total_height();
    geometry(scene).body_top + body + FOOTER_HEIGHT + CONTENT_INSET
}

pub(super) fn paint(canvas: &mut Canvas, scene: &Scene) {
    let g = geometry(scene);
    let fonts = scene.fonts;
    let ink = scene.ink;
    let (w, h) = (canvas.width(), canvas.height());

    // Accent wash on the right half, short bar top-left
    canvas.fill_rect_linear(
        (w / 2.0, 0.0, w / 2.0, h),
        (w, 0.0),
        (w / 2.0, 0.0),
        &[(0.0, scene.accent.fade(0.1)), (1.0, scene.accent.fade(0.0))],
    );
    canvas.fill_rect(PAD, PAD, 48.0, 4.0, ink);

    // Double frame
    canvas.stroke_rect(PAD, PAD, w - 2.0 * PAD, h - 2.0 * PAD, ink, 2.0, None);
    let inner = PAD + 6.0;
    canvas.fill_rect(inner, inner, w - 2.0 * inner, h - 2.0 * inner, Color::WHITE.fade(0.2));
    canvas.stroke_rect(inner, inner, w - 2.0 * inner, h - 2.0 * inner, ink, 1.0, None);

    Label::new(&scene.state.title, scene.title_spec(), ink)
        .anchor(Anchor::Middle)
        .paint(canvas, fonts, w / 2.0, g.title_top, g.title_height);

    paint_plate(canvas, scene, &g);
    paint_stamps(canvas, scene, &g);

    let footer_top = h - CONTENT_INSET - FOOTER_HEIGHT;
    let body = scene.wrap_body(&scene.primary, CONTENT_WIDTH);
    let clip = (!scene.is_long_text()).then_some(footer_top);
    scene.paint_body(canvas, &body, CONTENT_INSET, g.body_top, CONTENT_WIDTH, clip, ink.fade(0.9));

    paint_footer(canvas, scene, footer_top);
}

/// The subtitle on a slightly tilted text-colored plate.
fn paint_plate(canvas: &mut Canvas, scene: &Scene, g: &Geometry) {
    let fonts = scene.fonts;
    let spec = scene.body_family(plate_size(scene)).bold();
    let available = CONTENT_WIDTH - stamps_width(scene) - 16.0 - 24.0;
    let subtitle = scene.ellipsize(&scene.state.subtitle, &spec, 0.0, available.max(0.0));
    if subtitle.is_empty() {
        return;
    }
    let label = Label::new(&subtitle, spec, Color::WHITE);
    let plate_w = label.width(fonts) + 24.0;
    let plate_h = g.plate_text_height + 8.0;
    let x = CONTENT_INSET;
    let y = g.row_top + g.row_height - 4.0 - plate_h;
    if let Some(plate) = rounded_rect(x, y, plate_w, plate_h, [0.0; 4]) {
        let tilt = Transform::from_rotate_at(PLATE_TILT, x, y + plate_h);
        canvas.fill_path_transformed(&plate, scene.ink, tilt);
    }
    label.paint(canvas, fonts, x + 12.0, y + 4.0, g.plate_text_height);
}

/// One framed column of stacked characters per category, right-aligned.
fn paint_stamps(canvas: &mut Canvas, scene: &Scene, g: &Geometry) {
    let fonts = scene.fonts;
    let ink = scene.ink;
    let spec = FontSpec::new("sans", 10.0).weight(900);
    let bottom = g.row_top + g.row_height;
    let mut x = CONTENT_INSET + CONTENT_WIDTH - stamps_width(scene);
    for category in &scene.categories {
        let height = stamp_height(category);
        let top = bottom - height;
        canvas.fill_rect(x, top, STAMP_WIDTH, height, Color::WHITE.fade(0.8));
        canvas.stroke_rect(x, top, STAMP_WIDTH, height, ink, 2.0, None);
        canvas.stroke_rect(x + 4.0, top + 4.0, STAMP_WIDTH - 8.0, height - 8.0, ink.fade(0.5), 1.0, None);
        let mut y = top + 10.0;
        for ch in category.chars() {
            let glyph = ch.to_string();
            Label::new(&glyph, spec.clone(), ink)
                .anchor(Anchor::Middle)
                .paint(canvas, fonts, x + STAMP_WIDTH / 2.0, y, STAMP_CHAR);
            y += STAMP_CHAR;
        }
        x += STAMP_WIDTH + STAMP_GAP;
    }
}

fn paint_footer(canvas: &mut Canvas, scene: &Scene, top: f32) {
    let fonts = scene.fonts;
    let muted = scene.ink.fade(0.6);
    let right = CONTENT_INSET + CONTENT_WIDTH;
    canvas.line(
        (CONTENT_INSET, top + 0.5),
        (right, top + 0.5),
        muted,
        1.0,
        Some(&[3.0, 2.0]),
    );
    let row = top + 9.0;
    let byline = format!("BY {}", scene.state.author.to_uppercase());
    let spec = FontSpec::mono(10.0);
    let byline = scene.ellipsize(&byline, &spec, 0.25, CONTENT_WIDTH * 0.45);
    Label::new(&byline, spec.clone(), muted)
        .tracking(0.025)
        .paint(canvas, fonts, CONTENT_INSET, row, 15.0);
    Label::new(&scene.reading_label(), scene.body_family(9.0), muted)
        .anchor(Anchor::Middle)
        .paint(canvas, fonts, CANVAS_WIDTH / 2.0 + 24.0, row, 15.0);
    let date = format!("{}/{}/{}", scene.date.year(), scene.date.month(), scene.date.day());
    Label::new(&date, spec, muted)
        .anchor(Anchor::End)
        .paint(canvas, fonts, right, row, 15.0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::FontContext;
    use crate::model::{CoverState, LayoutStyle};
    use chrono::NaiveDate;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn scene<'a>(state: &'a CoverState, fonts: &'a FontContext) -> Scene<'a> {
        let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        Scene::new(state, fonts, date, &mut StdRng::seed_from_u64(9))
    }

    #[test]
    fn test_content_box() {
        assert_eq!(CONTENT_INSET, 47.0);
        assert_eq!(CONTENT_WIDTH, 306.0);
    }

    #[test]
    fn test_long_category_stretches_row() {
        let fonts = FontContext::new();
        let short = CoverState {
            layout_style: LayoutStyle::Storybook,
            category: "文".to_string(),
            subtitle: "短".to_string(),
            ..CoverState::default()
        };
        let tall = CoverState {
            category: "一二三四五六".to_string(),
            ..short.clone()
        };
        let a = geometry(&scene(&short, &fonts));
        let b = geometry(&scene(&tall, &fonts));
        assert_eq!(a.row_height, 40.0);
        assert_eq!(b.row_height, stamp_height("一二三四五六"));
        assert_eq!(b.body_top - a.body_top, b.row_height - 40.0);
    }

    #[test]
    fn test_stamps_width() {
        let fonts = FontContext::new();
        let state = CoverState {
            layout_style: LayoutStyle::Storybook,
            category: "甲、乙".to_string(),
            ..CoverState::default()
        };
        assert_eq!(stamps_width(&scene(&state, &fonts)), 2.0 * STAMP_WIDTH + STAMP_GAP);
    }
}

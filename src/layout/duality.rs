//! `duality`: two stacked halves split by a diagonal. The top half carries
//! the title block and first body; the bottom half is an accent field with
//! the second body and an identity footer. No grid texture.

use chrono::Datelike;
use tiny_skia::{Path, PathBuilder, Rect, Transform};

use super::{Anchor, Label, Scene, CANVAS_WIDTH};
use crate::font::FontSpec;
use crate::raster::{rounded_rect, Canvas};
use crate::style::Color;

const PAD_X: f32 = 24.0;
const PAD_Y: f32 = 16.0;
const INNER_WIDTH: f32 = CANVAS_WIDTH - 2.0 * PAD_X;
const BODY_X: f32 = PAD_X + 16.0;
const BODY_WIDTH: f32 = INNER_WIDTH - 20.0;
const BODY_INSET: f32 = 4.0;
/// Each half is at least this tall in long-text mode.
const HALF_MIN_HEIGHT: f32 = 300.0;
const HEADER_MIN_HEIGHT: f32 = 50.0;
const TAG_HEIGHT: f32 = 17.0;
const TAG_GAP: f32 = 4.0;
/// Height of the band the divider diagonal crosses.
const DIVIDER_BAND: f32 = 40.0;
const FOOTER_GAP: f32 = 24.0;
const FOOTER_ROW: f32 = 32.0;
const NUMERAL_SIZE: f32 = 144.0;
const AUTHOR_SIZE: f32 = 20.0;
/// Author letter spacing in em.
const AUTHOR_TRACKING: f32 = 0.025;
const BARCODE: [f32; 15] = [2.0, 1.0, 3.0, 1.0, 4.0, 1.0, 2.0, 1.0, 3.0, 2.0, 1.0, 4.0, 1.0, 2.0, 3.0];

/// The top half's title block.
struct Header {
    tags: Vec<(String, f32)>,
    tags_width: f32,
    title_height: f32,
    subtitle_height: f32,
    height: f32,
}

fn tag_spec() -> FontSpec {
    FontSpec::new("sans", 9.0).bold()
}

fn header(scene: &Scene) -> Header {
    let spec = tag_spec();
    let tags: Vec<(String, f32)> = scene
        .categories
        .iter()
        .map(|category| {
            let text = category.to_uppercase();
            let width = Label::new(&text, spec.clone(), Color::BLACK)
                .tracking(0.1)
                .width(scene.fonts)
                + 28.0;
            (text, width)
        })
        .collect();
    let tags_width = tags.iter().map(|(_, w)| *w).fold(0.0, f32::max);
    let tags_height = if tags.is_empty() {
        0.0
    } else {
        4.0 + tags.len() as f32 * (TAG_HEIGHT + TAG_GAP) - TAG_GAP
    };
    let title_height = scene.title_spec().size;
    let subtitle_height = (scene.layout().subtitle_font_size(&scene.state.subtitle) * 1.5).round() + 2.0;
    let height = HEADER_MIN_HEIGHT
        .max(tags_height)
        .max(title_height + 6.0 + subtitle_height);
    Header {
        tags,
        tags_width,
        title_height,
        subtitle_height,
        height,
    }
}

fn top_body_top(header: &Header) -> f32 {
    PAD_Y + header.height + 8.0 + BODY_INSET
}

fn top_natural(header: &Header, body: f32) -> f32 {
    top_body_top(header) + body + BODY_INSET + 8.0 + PAD_Y
}

fn bottom_natural(body: f32) -> f32 {
    PAD_Y + 8.0 + BODY_INSET + body + BODY_INSET + FOOTER_GAP + FOOTER_ROW + PAD_Y
}

pub(super) fn content_height(scene: &Scene) -> f32 {
    let header = header(scene);
    let top = scene.wrap_body(&scene.primary, BODY_WIDTH).total_height();
    let bottom = scene.wrap_body(&scene.secondary, BODY_WIDTH).total_height();
    top_natural(&header, top).max(HALF_MIN_HEIGHT) + bottom_natural(bottom).max(HALF_MIN_HEIGHT)
}

pub(super) fn paint(canvas: &mut Canvas, scene: &Scene) {
    let header = header(scene);
    let fonts = scene.fonts;
    let ink = scene.ink;
    let (w, h) = (canvas.width(), canvas.height());
    let top_body = scene.wrap_body(&scene.primary, BODY_WIDTH);
    let bottom_body = scene.wrap_body(&scene.secondary, BODY_WIDTH);
    let divider = if scene.is_long_text() {
        top_natural(&header, top_body.total_height()).max(HALF_MIN_HEIGHT)
    } else {
        h / 2.0
    };

    // Accent field below the diagonal
    let mut pb = PathBuilder::new();
    pb.move_to(w, divider - DIVIDER_BAND / 2.0);
    pb.line_to(w, h);
    pb.line_to(0.0, h);
    pb.line_to(0.0, divider + DIVIDER_BAND / 2.0);
    pb.close();
    if let Some(field) = pb.finish() {
        canvas.fill_path(&field, scene.accent);
    }

    paint_decorations(canvas, ink, w, h);

    // Top half
    Label::new("01", FontSpec::serif(NUMERAL_SIZE).bold(), ink.fade(0.06)).paint(
        canvas,
        fonts,
        -PAD_X,
        divider - NUMERAL_SIZE,
        NUMERAL_SIZE,
    );
    paint_header(canvas, scene, &header);
    let clip = (!scene.is_long_text()).then_some(divider - PAD_Y - 8.0 - BODY_INSET);
    scene.paint_body(canvas, &top_body, BODY_X, top_body_top(&header), BODY_WIDTH, clip, ink);

    // Bottom half
    Label::new("02", FontSpec::serif(NUMERAL_SIZE).bold(), ink.fade(0.06))
        .anchor(Anchor::End)
        .paint(canvas, fonts, w + PAD_X, divider - PAD_Y, NUMERAL_SIZE);
    let bottom_top = divider + PAD_Y + 8.0 + BODY_INSET;
    let footer_top = h - PAD_Y - FOOTER_ROW;
    let clip = (!scene.is_long_text()).then_some(footer_top - FOOTER_GAP - BODY_INSET);
    scene.paint_body(canvas, &bottom_body, BODY_X, bottom_top, BODY_WIDTH, clip, ink);
    paint_footer(canvas, scene, footer_top);

    // Divider on top of both halves
    canvas.line(
        (0.0, divider + DIVIDER_BAND / 2.0),
        (w, divider - DIVIDER_BAND / 2.0),
        ink,
        1.0,
        None,
    );
    canvas.fill_circle(w / 2.0, divider, 13.0, Color::WHITE);
    canvas.stroke_circle(w / 2.0, divider, 12.5, ink, 1.0, None);
    canvas.fill_circle(w / 2.0, divider, 4.0, scene.accent);
}

/// Faint rotated outlines behind both halves, placed relative to the card.
fn paint_decorations(canvas: &mut Canvas, ink: Color, w: f32, h: f32) {
    let (x, y) = (-0.15 * w, 0.1 * h);
    if let Some(square) = rounded_rect(x + 8.0, y + 8.0, 304.0, 304.0, [32.0; 4]) {
        let spin = Transform::from_rotate_at(-15.0, x + 160.0, y + 160.0);
        canvas.stroke_path_transformed(&square, ink.fade(0.08), 16.0, None, spin);
    }

    canvas.stroke_circle(-0.05 * w + 140.0, 0.15 * h + 140.0, 139.0, ink.fade(0.15), 2.0, Some(&[6.0, 4.0]));

    if let Some(arc) = upper_half_circle(0.1 * w + 50.0, 0.28 * h + 50.0, 48.0) {
        canvas.stroke_path(&arc, ink.fade(0.1), 4.0, None);
    }

    // A hairline and a soft band, both wider than the card and tilted.
    let span = 1.2 * w;
    let left = w / 2.0 - span / 2.0;
    for (y, height, opacity) in [(0.05 * h, 1.0, 0.1), (0.08 * h, 20.0, 0.03)] {
        let spin = Transform::from_rotate_at(-25.0, w / 2.0, y + height / 2.0);
        if let Some(path) = Rect::from_xywh(left, y, span, height).map(PathBuilder::from_rect) {
            canvas.fill_path_transformed(&path, ink.fade(opacity), spin);
        }
    }

    let (right, bottom) = (1.05 * w, 0.95 * h);
    canvas.fill_rect(right - 150.0, bottom - 150.0, 150.0, 1.0, ink.fade(0.1));
    canvas.fill_rect(right - 150.0, bottom - 150.0, 1.0, 150.0, ink.fade(0.1));
}

/// The upper half of a circle, left to right.
fn upper_half_circle(cx: f32, cy: f32, r: f32) -> Option<Path> {
    const K: f32 = 0.552_284_8;
    let mut pb = PathBuilder::new();
    pb.move_to(cx - r, cy);
    pb.cubic_to(cx - r, cy - r * K, cx - r * K, cy - r, cx, cy - r);
    pb.cubic_to(cx + r * K, cy - r, cx + r, cy - r * K, cx + r, cy);
    pb.finish()
}

fn paint_header(canvas: &mut Canvas, scene: &Scene, header: &Header) {
    let fonts = scene.fonts;
    let ink = scene.ink;
    let right = canvas.width() - PAD_X;

    // Category tags, stacked on the left
    let spec = tag_spec();
    let skew = (12.0f32).to_radians().tan() * TAG_HEIGHT / 2.0;
    let mut y = PAD_Y + 4.0;
    for (text, width) in &header.tags {
        let x = PAD_X;
        let mut pb = PathBuilder::new();
        pb.move_to(x + skew, y);
        pb.line_to(x + width + skew, y);
        pb.line_to(x + width - skew, y + TAG_HEIGHT);
        pb.line_to(x - skew, y + TAG_HEIGHT);
        pb.close();
        if let Some(path) = pb.finish() {
            canvas.fill_path(&path, ink.fade(0.1));
        }
        canvas.fill_rect(x, y, 2.0, TAG_HEIGHT, ink);
        canvas.fill_rect(x + width - 2.0, y, 2.0, TAG_HEIGHT, ink);
        canvas.fill_circle(x + 12.0, y + TAG_HEIGHT / 2.0, 2.0, ink);
        Label::new(text, spec.clone(), ink)
            .tracking(0.1)
            .paint(canvas, fonts, x + 18.0, y, TAG_HEIGHT);
        y += TAG_HEIGHT + TAG_GAP;
    }

    // Title and subtitle, right-aligned
    Label::new(&scene.state.title, scene.title_spec().bold(), ink)
        .anchor(Anchor::End)
        .paint(canvas, fonts, right, PAD_Y, header.title_height);

    let size = scene.layout().subtitle_font_size(&scene.state.subtitle);
    let row_top = PAD_Y + header.title_height + 6.0;
    let text_height = header.subtitle_height - 2.0;
    let color = ink.fade(0.8);
    let mark_spec = scene.body_family(size * 0.75).bold();
    let spec = scene.body_family(size).bold();
    let filled = Label::new("●", mark_spec.clone(), color).anchor(Anchor::End);
    let hollow = Label::new("○", mark_spec, color).anchor(Anchor::End);
    let marks = filled.width(fonts) + hollow.width(fonts) + 12.0;
    let available = INNER_WIDTH - header.tags_width - 8.0 - marks;
    let subtitle = scene.ellipsize(&scene.state.subtitle, &spec, 0.0, available.max(0.0));

    let mut x = right;
    x -= filled.paint(canvas, fonts, x, row_top, text_height) + 6.0;
    let text_width = Label::new(&subtitle, spec, color)
        .anchor(Anchor::End)
        .paint(canvas, fonts, x, row_top, text_height);
    canvas.fill_rect(x - text_width, row_top + text_height + 1.0, text_width, 1.0, color.fade(0.9));
    x -= text_width + 6.0;
    hollow.paint(canvas, fonts, x, row_top, text_height);
}

fn author_spec(scene: &Scene) -> FontSpec {
    scene.body_family(AUTHOR_SIZE).weight(900).italic(true)
}

/// The author, shortened to half the inner width at its painted tracking.
fn fitted_author(scene: &Scene) -> String {
    scene.ellipsize(
        &scene.state.author,
        &author_spec(scene),
        AUTHOR_TRACKING * AUTHOR_SIZE,
        INNER_WIDTH / 2.0,
    )
}

fn paint_footer(canvas: &mut Canvas, scene: &Scene, top: f32) {
    let fonts = scene.fonts;
    let ink = scene.ink;
    let w = canvas.width();

    // Identity column, right-aligned against its rule
    let identity = Label::new("IDENTITY", FontSpec::mono(5.0), ink.fade(0.5))
        .tracking(0.25)
        .anchor(Anchor::End);
    let author = fitted_author(scene);
    let author = Label::new(&author, author_spec(scene), ink)
        .tracking(AUTHOR_TRACKING)
        .anchor(Anchor::End);
    let column_width = identity.width(fonts).max(author.width(fonts));
    let column_right = PAD_X + column_width;
    identity.paint(canvas, fonts, column_right, top + 2.0, 7.0);
    let author_top = top + 10.0;
    let author_width = author.paint(canvas, fonts, column_right, author_top, 20.0);
    let bracket_x = column_right - author_width - 8.0;
    canvas.fill_rect(bracket_x, author_top - 4.0, 6.0, 1.0, ink.fade(0.6));
    canvas.fill_rect(bracket_x, author_top - 4.0, 1.0, 6.0, ink.fade(0.6));
    let rule_x = column_right + 12.0;
    canvas.fill_rect(rule_x, top, 2.0, FOOTER_ROW, ink);

    // Barcode
    let mut x = rule_x + 2.0 + 12.0;
    let bottom = top + FOOTER_ROW;
    for (i, bar) in BARCODE.iter().enumerate() {
        let height = if i % 3 == 0 { 24.0 } else { 24.0 * 0.7 };
        canvas.fill_rect(x, bottom - height, *bar, height, ink.fade(0.8));
        x += bar + 1.5;
    }

    // System readout
    let right = w - PAD_X;
    let muted = ink.fade(0.6);
    canvas.fill_rect(right - 6.0, top + 2.0, 6.0, 6.0, muted);
    Label::new("SYS.READY", FontSpec::mono(7.0), muted)
        .tracking(0.1)
        .anchor(Anchor::End)
        .paint(canvas, fonts, right - 10.0, top, 10.0);
    let stamp = format!("/// {}.{}", scene.year(), scene.date.month());
    let faint = ink.fade(0.42);
    Label::new(&stamp, FontSpec::mono(6.0), faint)
        .anchor(Anchor::End)
        .paint(canvas, fonts, right, top + 16.0, 8.0);
    Label::new("LOC: 32.45.11 N", FontSpec::mono(6.0), faint)
        .anchor(Anchor::End)
        .paint(canvas, fonts, right, top + 24.0, 8.0);
}

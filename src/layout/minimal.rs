//! `minimal`: a technical dossier. Corner brackets, a status header, label
//! chips, an archive tag row and an indented body with an accent bar.

use super::{Anchor, Label, Scene, CANVAS_WIDTH};
use crate::font::FontSpec;
use crate::raster::Canvas;
use crate::style::Color;

const PAD: f32 = 24.0;
const INNER_WIDTH: f32 = CANVAS_WIDTH - 2.0 * PAD;
const BODY_INDENT: f32 = 24.0;
const BODY_X: f32 = PAD + BODY_INDENT;
const BODY_WIDTH: f32 = INNER_WIDTH - BODY_INDENT;
const BODY_MIN_HEIGHT: f32 = 100.0;
/// Padding above and below the body text inside its column.
const BODY_INSET: f32 = 4.0;

const STATUS_ROW: f32 = 14.0;
const CHIP_HEIGHT: f32 = 16.0;
const CHIP_GAP: f32 = 8.0;
const CHIP_BAR: f32 = 6.0;
const CHIP_TAIL: f32 = 4.0;
const CHIP_PAD_X: f32 = 8.0;
const ARCHIVE_ROW: f32 = 17.0;
/// From the bottom of the body column to the bottom padding.
const FOOTER_HEIGHT: f32 = 49.0;
const FOOTER_ROW: f32 = 28.0;

struct Chip {
    label: String,
    x: f32,
    row: usize,
    width: f32,
}

/// Vertical positions of everything above the body.
struct Geometry {
    chips: Vec<Chip>,
    chips_top: f32,
    title_top: f32,
    title_height: f32,
    rule_y: f32,
    subtitle_top: f32,
    subtitle_height: f32,
    archive_top: f32,
    body_top: f32,
}

fn chip_spec() -> FontSpec {
    FontSpec::new("sans", 10.0).bold()
}

/// Chips flow left to right and wrap onto new rows.
fn layout_chips(scene: &Scene) -> (Vec<Chip>, usize) {
    let spec = chip_spec();
    let mut chips = Vec::new();
    let (mut x, mut row) = (0.0, 0);
    for category in &scene.categories {
        let label = category.to_uppercase();
        let text_width = Label::new(&label, spec.clone(), Color::BLACK)
            .tracking(0.05)
            .width(scene.fonts);
        let width = CHIP_BAR + 2.0 * CHIP_PAD_X + text_width + 1.0 + CHIP_TAIL;
        if x > 0.0 && x + width > INNER_WIDTH {
            row += 1;
            x = 0.0;
        }
        chips.push(Chip {
            label,
            x,
            row,
            width,
        });
        x += width + CHIP_GAP;
    }
    let rows = if chips.is_empty() { 0 } else { row + 1 };
    (chips, rows)
}

fn geometry(scene: &Scene) -> Geometry {
    let mut y = PAD + STATUS_ROW + 8.0 + 1.0 + 12.0;
    let chips_top = y;
    let (chips, rows) = layout_chips(scene);
    if rows > 0 {
        y += rows as f32 * CHIP_HEIGHT + (rows - 1) as f32 * CHIP_GAP + 8.0;
    }

    let title_top = y;
    let title_height = scene.title_spec().size;
    y += title_height + 8.0;

    let rule_y = y + 8.0;
    y = rule_y + 1.0 + 8.0;

    let subtitle_top = y;
    let subtitle_height = (scene.layout().subtitle_font_size(&scene.state.subtitle) * 1.4).round();
    y += subtitle_height + 8.0;

    let archive_top = y;
    y += ARCHIVE_ROW + 4.0;

    Geometry {
        chips,
        chips_top,
        title_top,
        title_height,
        rule_y,
        subtitle_top,
        subtitle_height,
        archive_top,
        body_top: y + BODY_INSET,
    }
}

pub(super) fn content_height(scene: &Scene) -> f32 {
    let g = geometry(scene);
    let body = scene.wrap_body(&scene.primary, BODY_WIDTH).total_height();
    g.body_top + body.max(BODY_MIN_HEIGHT) + BODY_INSET + FOOTER_HEIGHT + PAD
}

pub(super) fn paint(canvas: &mut Canvas, scene: &Scene) {
    let g = geometry(scene);
    let fonts = scene.fonts;
    let ink = scene.ink;
    let (w, h) = (canvas.width(), canvas.height());

    paint_brackets(canvas, ink.fade(0.6), w, h);
    canvas.fill_rect(w - 32.0, 110.0, 32.0, 1.0, ink.fade(0.3));
    canvas.fill_rect(w - 16.0, 116.0, 16.0, 1.0, ink.fade(0.3));

    // Status header
    canvas.fill_rect(PAD, PAD + 4.0, 6.0, 6.0, scene.accent.fade(0.8));
    Label::new("SYSTEM_NORMAL", FontSpec::mono(9.0).bold(), ink.fade(0.8))
        .tracking(0.1)
        .paint(canvas, fonts, PAD + 14.0, PAD, STATUS_ROW);
    let record = format!("REC-{:04}", scene.record_id);
    let record_width = Label::new(&record, FontSpec::mono(9.0), ink.fade(0.48))
        .tracking(0.1)
        .anchor(Anchor::End)
        .paint(canvas, fonts, w - PAD, PAD, STATUS_ROW);
    let meter_x = w - PAD - record_width - 8.0 - 48.0;
    canvas.fill_rect(meter_x, PAD + 5.0, 48.0, 4.0, ink.fade(0.08));
    canvas.fill_rect(meter_x, PAD + 5.0, 32.0, 4.0, ink.fade(0.16));
    canvas.fill_rect(PAD, PAD + STATUS_ROW + 8.0, INNER_WIDTH, 1.0, ink.fade(0.2));

    // Category chips
    let chip_spec = chip_spec();
    for chip in &g.chips {
        let x = PAD + chip.x;
        let y = g.chips_top + chip.row as f32 * (CHIP_HEIGHT + CHIP_GAP);
        let box_x = x + CHIP_BAR;
        let box_w = chip.width - CHIP_BAR - CHIP_TAIL;
        canvas.fill_rect(x, y, CHIP_BAR, CHIP_HEIGHT, ink);
        canvas.fill_rect(box_x, y, box_w, CHIP_HEIGHT, Color::WHITE.fade(0.4));
        canvas.fill_rect(box_x, y, box_w, 1.0, ink);
        canvas.fill_rect(box_x, y + CHIP_HEIGHT - 1.0, box_w, 1.0, ink);
        canvas.fill_rect(box_x + box_w - 1.0, y, 1.0, CHIP_HEIGHT, ink);
        Label::new(&chip.label, chip_spec.clone(), ink)
            .tracking(0.05)
            .paint(canvas, fonts, box_x + CHIP_PAD_X, y, CHIP_HEIGHT);
        canvas.fill_rect(box_x + box_w, y, CHIP_TAIL, CHIP_HEIGHT, scene.accent);
    }

    // Title block
    Label::new(&scene.state.title, scene.title_spec(), ink).paint(
        canvas,
        fonts,
        PAD,
        g.title_top,
        g.title_height,
    );
    canvas.fill_rect(PAD, g.rule_y, INNER_WIDTH, 1.0, ink.fade(0.2));
    let subtitle_spec = scene
        .body_family(scene.layout().subtitle_font_size(&scene.state.subtitle))
        .bold();
    let subtitle = scene.ellipsize(
        &format!("/ {}", scene.state.subtitle),
        &subtitle_spec,
        0.0,
        INNER_WIDTH,
    );
    Label::new(&subtitle, subtitle_spec, ink).paint(
        canvas,
        fonts,
        PAD,
        g.subtitle_top,
        g.subtitle_height,
    );

    // Archive row
    let tag = Label::new("ARCHIVE", FontSpec::new("sans", 9.0).bold(), Color::WHITE).tracking(0.1);
    let tag_width = tag.width(fonts) + 16.0;
    canvas.fill_rect(PAD, g.archive_top, tag_width, ARCHIVE_ROW, ink);
    tag.paint(canvas, fonts, PAD + 8.0, g.archive_top, ARCHIVE_ROW);
    let ref_width = Label::new("REF.07", FontSpec::mono(9.0), ink.fade(0.4))
        .anchor(Anchor::End)
        .paint(canvas, fonts, w - PAD, g.archive_top, ARCHIVE_ROW);
    let rule_start = PAD + tag_width + 8.0;
    let rule_end = w - PAD - ref_width - 8.0;
    if rule_end > rule_start {
        canvas.fill_rect(
            rule_start,
            g.archive_top + ARCHIVE_ROW / 2.0,
            rule_end - rule_start,
            1.0,
            ink.fade(0.3),
        );
    }

    // Body column
    let column_top = g.body_top - BODY_INSET;
    let column_bottom = h - PAD - FOOTER_HEIGHT;
    canvas.fill_rect(PAD, column_top, 1.0, column_bottom - 8.0 - column_top, ink.fade(0.2));
    canvas.fill_rect(PAD, column_top, 4.0, 32.0, scene.accent);
    let body = scene.wrap_body(&scene.primary, BODY_WIDTH);
    let clip = (!scene.is_long_text()).then_some(column_bottom - BODY_INSET);
    scene.paint_body(canvas, &body, BODY_X, g.body_top, BODY_WIDTH, clip, ink.fade(0.9));

    paint_footer(canvas, scene, column_bottom + 4.0);
}

/// Small L-shaped marks 16px in from each corner.
fn paint_brackets(canvas: &mut Canvas, color: Color, w: f32, h: f32) {
    const INSET: f32 = 16.0;
    const ARM: f32 = 8.0;
    let (l, r, t, b) = (INSET, w - INSET, INSET, h - INSET);
    canvas.fill_rect(l, t, ARM, 1.0, color);
    canvas.fill_rect(l, t, 1.0, ARM, color);
    canvas.fill_rect(r - ARM, t, ARM, 1.0, color);
    canvas.fill_rect(r - 1.0, t, 1.0, ARM, color);
    canvas.fill_rect(l, b - 1.0, ARM, 1.0, color);
    canvas.fill_rect(l, b - ARM, 1.0, ARM, color);
    canvas.fill_rect(r - ARM, b - 1.0, ARM, 1.0, color);
    canvas.fill_rect(r - 1.0, b - ARM, 1.0, ARM, color);
}

fn paint_footer(canvas: &mut Canvas, scene: &Scene, top: f32) {
    let fonts = scene.fonts;
    let ink = scene.ink;
    let w = canvas.width();

    let mut x = BODY_X;
    for width in [16.0, 8.0, 32.0, 4.0] {
        canvas.fill_rect(x, top, width, 4.0, ink.fade(0.2));
        x += width + 2.0;
    }

    let rule_y = top + 4.0 + 6.0;
    canvas.line(
        (PAD, rule_y + 0.5),
        (w - PAD, rule_y + 0.5),
        ink.fade(0.2),
        1.0,
        Some(&[3.0, 2.0]),
    );

    let row = rule_y + 1.0 + 6.0;
    Label::new("AUTHORIZED PERSONNEL", FontSpec::mono(8.0), ink.fade(0.4))
        .paint(canvas, fonts, PAD, row, 12.0);
    let author = scene.state.author.to_uppercase();
    let author = scene.ellipsize(&author, &scene.body_family(12.0).bold(), 0.6, INNER_WIDTH * 0.6);
    Label::new(&author, scene.body_family(12.0).bold(), ink.fade(0.8))
        .tracking(0.05)
        .paint(canvas, fonts, PAD, row + 12.0, 16.0);

    let year = scene.year().to_string();
    let year_width = Label::new(&year, FontSpec::mono(20.0), ink.fade(0.16))
        .tracking(-0.05)
        .anchor(Anchor::End)
        .paint(canvas, fonts, w - PAD, row, FOOTER_ROW);
    Label::new(&scene.reading_label(), scene.body_family(9.0), ink.fade(0.5))
        .anchor(Anchor::End)
        .paint(canvas, fonts, w - PAD - year_width - 10.0, row + 8.0, 14.0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::FontContext;
    use crate::model::CoverState;
    use chrono::NaiveDate;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn scene<'a>(state: &'a CoverState, fonts: &'a FontContext) -> Scene<'a> {
        let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        Scene::new(state, fonts, date, &mut StdRng::seed_from_u64(3))
    }

    #[test]
    fn test_chips_wrap_onto_rows() {
        let fonts = FontContext::new();
        let state = CoverState {
            category: "一二三四五六七八九十、一二三四五六七八九十、一二三四五六七八九十".to_string(),
            ..CoverState::default()
        };
        let (chips, rows) = layout_chips(&scene(&state, &fonts));
        assert_eq!(chips.len(), 3);
        assert_eq!(rows, 2);
        assert_eq!(chips[0].x, 0.0);
        assert_eq!(chips[2].row, 1);
        assert_eq!(chips[2].x, 0.0);
    }

    #[test]
    fn test_no_categories_no_chip_row() {
        let fonts = FontContext::new();
        let with = CoverState::default();
        let without = CoverState {
            category: String::new(),
            ..CoverState::default()
        };
        let a = geometry(&scene(&with, &fonts));
        let b = geometry(&scene(&without, &fonts));
        assert_eq!(a.body_top - b.body_top, CHIP_HEIGHT + 8.0);
    }

    #[test]
    fn test_short_body_uses_minimum_height() {
        let fonts = FontContext::new();
        let state = CoverState {
            body_text: "一".to_string(),
            ..CoverState::default()
        };
        let s = scene(&state, &fonts);
        let g = geometry(&s);
        let expected = g.body_top + BODY_MIN_HEIGHT + BODY_INSET + FOOTER_HEIGHT + PAD;
        assert_eq!(content_height(&s), expected);
    }
}

//! `split`: a vintage screenplay title page. Double frame, centred title
//! block, an accent quarter-disc behind the body and a credits footer.

use super::{Anchor, Label, Scene, CANVAS_WIDTH};
use crate::font::FontSpec;
use crate::raster::{rounded_rect, Canvas};
use crate::style::Color;

const PAD: f32 = 32.0;
const INNER_WIDTH: f32 = CANVAS_WIDTH - 2.0 * PAD;
const BODY_X: f32 = PAD + 8.0;
const BODY_WIDTH: f32 = INNER_WIDTH - 16.0;
const KICKER_ROW: f32 = 16.0;
/// Gap between the top of the body area and the first line.
const BODY_OFFSET: f32 = 24.0;
const LONG_TEXT_BODY_MARGIN: f32 = 4.0;
const DISC_SIZE: f32 = 96.0;
/// Rule, credits row and tag row below the body.
const FOOTER_HEIGHT: f32 = 53.0;
const TAG_HEIGHT: f32 = 14.0;

struct Geometry {
    kicker_top: f32,
    title_top: f32,
    title_height: f32,
    band_top: f32,
    band_text_height: f32,
    body_area_top: f32,
}

impl Geometry {
    fn band_height(&self) -> f32 {
        self.band_text_height + 10.0
    }

    fn body_top(&self) -> f32 {
        self.body_area_top + BODY_OFFSET
    }
}

fn geometry(scene: &Scene) -> Geometry {
    let kicker_top = PAD + 8.0;
    let title_top = kicker_top + KICKER_ROW + 4.0;
    let title_height = scene.title_spec().size * 1.25;
    let band_top = title_top + title_height + 8.0;
    let band_text_height = (subtitle_size(scene) * 1.34).round();
    let body_area_top = band_top + band_text_height + 10.0 + 8.0;
    Geometry {
        kicker_top,
        title_top,
        title_height,
        band_top,
        band_text_height,
        body_area_top,
    }
}

fn subtitle_size(scene: &Scene) -> f32 {
    scene.layout().subtitle_font_size(&scene.state.subtitle)
}

pub(super) fn content_height(scene: &Scene) -> f32 {
    let body = scene.wrap_body(&scene.primary, BODY_WIDTH).total_height();
    geometry(scene).body_top() + body + LONG_TEXT_BODY_MARGIN + FOOTER_HEIGHT + PAD
}

pub(super) fn paint(canvas: &mut Canvas, scene: &Scene) {
    let g = geometry(scene);
    let fonts = scene.fonts;
    let ink = scene.ink;
    let (w, h) = (canvas.width(), canvas.height());
    let center = w / 2.0;

    paint_frames(canvas, scene, w, h);

    // Title block on a soft white halo
    let halo_bottom = g.band_top + g.band_height();
    canvas.fill_rect_radial(
        (0.0, g.kicker_top - 16.0, w, halo_bottom - g.kicker_top + 32.0),
        (center, (g.kicker_top + halo_bottom) / 2.0),
        w / 2.0,
        &[(0.0, Color::WHITE.fade(0.3)), (1.0, Color::WHITE.fade(0.0))],
    );
    Label::new("THE STORY OF", scene.body_family(12.0), ink.fade(0.7))
        .tracking(0.3)
        .anchor(Anchor::Middle)
        .paint(canvas, fonts, center, g.kicker_top, KICKER_ROW);
    Label::new(&scene.state.title, scene.title_spec(), ink)
        .anchor(Anchor::Middle)
        .paint(canvas, fonts, center, g.title_top, g.title_height);

    let size = subtitle_size(scene);
    let tracking = if size == scene.layout().subtitle_base_size() {
        0.1
    } else {
        0.0
    };
    let band_spec = scene.body_family(size);
    let subtitle = scene.ellipsize(
        &scene.state.subtitle.to_uppercase(),
        &band_spec,
        tracking * size,
        INNER_WIDTH - 32.0,
    );
    let band_label = Label::new(&subtitle, band_spec, ink.fade(0.8))
        .tracking(tracking)
        .anchor(Anchor::Middle);
    let band_width = (band_label.width(fonts) + 32.0).min(INNER_WIDTH);
    let band_x = center - band_width / 2.0;
    canvas.fill_rect(band_x, g.band_top, band_width, 1.0, ink.fade(0.2));
    canvas.fill_rect(band_x, halo_bottom - 1.0, band_width, 1.0, ink.fade(0.2));
    band_label.paint(canvas, fonts, center, g.band_top + 5.0, g.band_text_height);

    // Body
    if let Some(disc) = rounded_rect(
        w - PAD - DISC_SIZE,
        g.body_area_top,
        DISC_SIZE,
        DISC_SIZE,
        [0.0, 0.0, 0.0, 64.0],
    ) {
        canvas.fill_path(&disc, scene.accent.fade(0.2));
    }
    let footer_top = h - PAD - FOOTER_HEIGHT;
    let body = scene.wrap_body(&scene.primary, BODY_WIDTH);
    let clip = (!scene.is_long_text()).then_some(footer_top);
    scene.paint_body(canvas, &body, BODY_X, g.body_top(), BODY_WIDTH, clip, ink);

    paint_footer(canvas, scene, footer_top);
}

/// Solid and dotted inset frames, centre ticks and the faint volume mark.
fn paint_frames(canvas: &mut Canvas, scene: &Scene, w: f32, h: f32) {
    let ink = scene.ink;
    canvas.stroke_rect(16.0, 16.0, w - 32.0, h - 32.0, ink.fade(0.2), 1.0, None);
    canvas.stroke_rect(18.0, 18.0, w - 36.0, h - 36.0, ink.fade(0.2), 1.0, Some(&[1.0, 2.0]));
    canvas.fill_rect(w / 2.0 - 0.5, 32.0, 1.0, 48.0, ink.fade(0.3));
    canvas.fill_rect(w / 2.0 - 0.5, h - 80.0, 1.0, 48.0, ink.fade(0.3));
    Label::new("Vol.01", FontSpec::serif(48.0).italic(true), ink.fade(0.05))
        .anchor(Anchor::End)
        .paint(canvas, scene.fonts, w - 24.0, 16.0, 48.0);
}

fn paint_footer(canvas: &mut Canvas, scene: &Scene, top: f32) {
    let fonts = scene.fonts;
    let ink = scene.ink;
    let w = canvas.width();

    canvas.fill_rect(PAD, top, INNER_WIDTH, 1.0, ink.fade(0.24));

    // Credits, centred as one group
    let credits_top = top + 9.0;
    let role = Label::new("SCREENPLAY", FontSpec::new("sans", 8.0), ink.fade(0.8)).tracking(0.2);
    let author_spec = scene.body_family(14.0).italic(true);
    let author = scene.ellipsize(&scene.state.author, &author_spec, 0.0, INNER_WIDTH / 2.0);
    let author = Label::new(&author, author_spec, ink.fade(0.8));
    let total = role.width(fonts) + 16.0 + author.width(fonts);
    let mut x = w / 2.0 - total / 2.0;
    x += role.paint(canvas, fonts, x, credits_top, 20.0) + 16.0;
    author.paint(canvas, fonts, x, credits_top, 20.0);

    // Tags, serial and reading time
    let row_top = credits_top + 28.0;
    let muted = ink.fade(0.48);
    let tag_spec = FontSpec::mono(8.0).weight(600);
    let mut x = PAD;
    for category in &scene.categories {
        let text = category.to_uppercase();
        let label = Label::new(&text, tag_spec.clone(), muted).tracking(0.1);
        let tag_width = label.width(fonts) + 18.0;
        if let Some(outline) = rounded_rect(x + 0.5, row_top + 0.5, tag_width - 1.0, TAG_HEIGHT - 1.0, [2.0; 4]) {
            canvas.stroke_path(&outline, muted, 1.0, None);
        }
        let corner_x = x + tag_width - 2.0;
        canvas.fill_rect(corner_x, row_top - 1.0, 3.0, 3.0, Color::WHITE);
        canvas.fill_rect(corner_x, row_top + 1.0, 3.0, 1.0, muted);
        canvas.fill_rect(corner_x, row_top - 1.0, 1.0, 3.0, muted);
        label.paint(canvas, fonts, x + 9.0, row_top, TAG_HEIGHT);
        x += tag_width + 8.0;
    }

    let serial = format!("NO. {:04}", scene.record_id);
    let serial_width = Label::new(&serial, FontSpec::mono(8.0), muted)
        .tracking(0.1)
        .anchor(Anchor::End)
        .paint(canvas, fonts, w - PAD, row_top, TAG_HEIGHT);
    let divider_end = w - PAD - serial_width - 8.0;
    canvas.fill_rect(divider_end - 32.0, row_top + TAG_HEIGHT / 2.0, 32.0, 1.0, ink.fade(0.16));
    Label::new(&scene.reading_label(), scene.body_family(8.0), muted)
        .anchor(Anchor::End)
        .paint(canvas, fonts, divider_end - 40.0, row_top, TAG_HEIGHT);
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
        Scene::new(state, fonts, date, &mut StdRng::seed_from_u64(11))
    }

    #[test]
    fn test_big_title_pushes_body_down() {
        let fonts = FontContext::new();
        let short = CoverState {
            layout_style: LayoutStyle::Split,
            title: "短".to_string(),
            ..CoverState::default()
        };
        let long = CoverState {
            title: "这是一个非常非常长的标题文字".to_string(),
            ..short.clone()
        };
        let a = geometry(&scene(&short, &fonts));
        let b = geometry(&scene(&long, &fonts));
        assert_eq!(a.title_height, 60.0);
        assert_eq!(b.title_height, 30.0);
        assert_eq!(a.body_top() - b.body_top(), 30.0);
    }

    #[test]
    fn test_content_height_counts_lines() {
        let fonts = FontContext::new();
        let state = CoverState {
            layout_style: LayoutStyle::Split,
            body_text: "一<br>二<br>三".to_string(),
            ..CoverState::default()
        };
        let s = scene(&state, &fonts);
        let expected = geometry(&s).body_top()
            + 3.0 * s.body_line_height()
            + LONG_TEXT_BODY_MARGIN
            + FOOTER_HEIGHT
            + PAD;
        assert_eq!(content_height(&s), expected);
    }
}

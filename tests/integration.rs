//! Integration tests for the coverkit pipeline.
//!
//! These tests exercise the public API end to end, from editor HTML and
//! cover JSON to PNG bytes. They verify:
//! - Normalization of both contenteditable line shapes
//! - Plain-text flattening, wrapping and reading time
//! - Formatting rules and their error tolerance
//! - Canvas height in both modes and the PNG's pixel dimensions
//! - The grain layer's statistical presence

use chrono::NaiveDate;
use proptest::prelude::*;

use coverkit::text::Monospace;
use coverkit::{
    apply_rules, cover_height, flatten, normalize, reading_minutes, render_json, render_with, wrap,
    CoverError, CoverState, FontContext, LayoutStyle, Mode, RenderOptions, TransformationRule,
};

// ─── Helpers ────────────────────────────────────────────────────

const LAYOUTS: [LayoutStyle; 4] = [
    LayoutStyle::Minimal,
    LayoutStyle::Split,
    LayoutStyle::Duality,
    LayoutStyle::Storybook,
];

fn options(scale: f32) -> RenderOptions {
    RenderOptions {
        scale,
        noise: false,
        system_fonts: false,
        date: NaiveDate::from_ymd_opt(2025, 6, 1),
        ..RenderOptions::default()
    }
}

fn state(layout: LayoutStyle, mode: Mode, body: &str) -> CoverState {
    CoverState {
        layout_style: layout,
        mode,
        body_text: body.to_string(),
        ..CoverState::default()
    }
}

fn decode(png: &[u8]) -> image::RgbaImage {
    image::load_from_memory(png)
        .expect("render output should be a readable PNG")
        .to_rgba8()
}

/// Share of pixels that differ between two same-sized images.
fn changed_share(a: &image::RgbaImage, b: &image::RgbaImage) -> f64 {
    assert_eq!(a.dimensions(), b.dimensions());
    let changed = a
        .pixels()
        .zip(b.pixels())
        .filter(|(p, q)| p != q)
        .count();
    changed as f64 / (a.width() * a.height()) as f64
}

/// Width and height from the PNG header, without decoding the pixels.
fn png_dimensions(png: &[u8]) -> (u32, u32) {
    image::io::Reader::new(std::io::Cursor::new(png))
        .with_guessed_format()
        .unwrap()
        .into_dimensions()
        .unwrap()
}

fn rule(pattern: &str) -> TransformationRule {
    serde_json::from_value(serde_json::json!({ "pattern": pattern })).unwrap()
}

/// One fragment piece per kind, numbered so pieces stay distinguishable.
fn piece(kind: usize, i: usize) -> String {
    match kind {
        0 => format!("<div>w{i}</div>"),
        1 => "<div><br></div>".to_string(),
        2 => "<br>".to_string(),
        3 => format!("t{i}"),
        4 => format!("<b>b{i}</b>"),
        5 => styled_span(i),
        6 => "<div>&nbsp;</div>".to_string(),
        7 => "<div></div>".to_string(),
        8 => format!(r#"<div style="text-align:center">c{i}</div>"#),
        9 => format!("<div><div>n{i}</div></div>"),
        10 => format!("<span>s{i}<div>d{i}</div></span>"),
        11 => " ".to_string(),
        _ => format!("<!-- m{i} -->"),
    }
}

const PIECE_KINDS: usize = 13;

fn styled_span(i: usize) -> String {
    format!(r#"<span style="color:#c00">f{i}</span>"#)
}

fn fragment(kinds: &[usize]) -> String {
    kinds.iter().enumerate().map(|(i, &k)| piece(k, i)).collect()
}

const EMPTY_WRAPPERS: [&str; 5] = [
    "<div><br></div>",
    "<div></div>",
    "<div>&nbsp;</div>",
    "<div> </div>",
    "<br>",
];

// ─── Normalization ──────────────────────────────────────────────

#[test]
fn test_interior_blank_line_preserved() {
    assert_eq!(
        normalize("Line1<div>Line2</div><div><br></div><div>Line3</div>"),
        "Line1<br>Line2<br><br>Line3"
    );
}

#[test]
fn test_list_fragment_returned_unchanged() {
    let html = "<div>intro</div><ul><li>one</li><li>two</li></ul><div><br></div>";
    assert_eq!(normalize(html), html);
}

#[test]
fn test_both_line_shapes_agree() {
    let br_runs = "第一行<br>第二行<br><br>第四行";
    let div_lines = "<div>第一行</div><div>第二行</div><div><br></div><div>第四行</div>";
    assert_eq!(normalize(br_runs), normalize(div_lines));
}

#[test]
fn test_normalize_then_flatten() {
    assert_eq!(flatten(&normalize("A<div>B</div>C")), "A\nB\nC");
}

#[test]
fn test_styled_block_keeps_its_line_after_normalize() {
    let html = r#"<div>x</div><div style="text-align:center">c</div>"#;
    assert_eq!(flatten(html), "x\nc");
    assert_eq!(flatten(&normalize(html)), "x\nc");
    assert_eq!(flatten("Line1<div>Line2</div>"), "Line1\nLine2");
}

// ─── Text ───────────────────────────────────────────────────────

#[test]
fn test_monospace_wrap_boundary() {
    let w = 7.0;
    let wrapped = wrap("ABCDEFGHIJ", 5.0 * w, &Monospace(w), 10.0);
    assert_eq!(wrapped.texts(), vec!["ABCDE", "FGHIJ"]);
}

#[test]
fn test_blank_paragraph_keeps_its_line() {
    let wrapped = wrap("A\n\nB", 100.0, &Monospace(7.0), 10.0);
    assert_eq!(wrapped.texts(), vec!["A", "", "B"]);
    assert_eq!(wrapped.total_height(), 30.0);
}

#[test]
fn test_reading_time_boundaries() {
    assert_eq!(reading_minutes(&"字".repeat(1)), 1);
    assert_eq!(reading_minutes(&"字".repeat(400)), 1);
    assert_eq!(reading_minutes(&"字".repeat(401)), 2);
    assert_eq!(reading_minutes(&"字".repeat(800)), 2);
    // Whitespace is not read
    assert_eq!(reading_minutes(&format!("{} {}", "字".repeat(200), "字".repeat(200))), 1);
}

// ─── Rules ──────────────────────────────────────────────────────

#[test]
fn test_invalid_rule_is_skipped() {
    let broken = rule("([");
    let mut valid = rule("cat");
    valid.formatting.color = Some("#f00".to_string());
    let out = apply_rules("a cat", &[broken, valid]);
    assert_eq!(out, r#"a <span style="color:#f00">cat</span>"#);
}

#[test]
fn test_inactive_rule_is_ignored() {
    let mut r = rule("cat");
    r.formatting.is_bold = true;
    r.is_active = false;
    assert_eq!(apply_rules("a cat", &[r]), "a cat");
}

// ─── Rendering ──────────────────────────────────────────────────

#[test]
fn test_render_json_parse_error() {
    let result = render_json("{ \"title\": ");
    assert!(matches!(result, Err(CoverError::Parse { .. })));
}

#[test]
fn test_cover_mode_dimensions() {
    let fonts = FontContext::new();
    for layout in LAYOUTS {
        let s = state(layout, Mode::Cover, "<div>正文</div>");
        let png = render_with(&s, &options(2.0), &fonts).unwrap();
        let img = decode(&png);
        assert_eq!(img.dimensions(), (800, 880), "{:?}", layout);
    }
}

#[test]
fn test_long_text_dimensions_follow_height() {
    let fonts = FontContext::new();
    let body = "很长的一段正文。".repeat(80);
    for layout in LAYOUTS {
        let s = state(layout, Mode::LongText, &body);
        let height = cover_height(&s, &fonts);
        assert!(height > 600.0, "{:?} stayed at the minimum", layout);
        let img = decode(&render_with(&s, &options(1.0), &fonts).unwrap());
        assert_eq!(img.dimensions(), (400, height as u32), "{:?}", layout);
    }
}

#[test]
fn test_long_body_renders_at_full_scale() {
    let fonts = FontContext::new();
    let s = state(LayoutStyle::Minimal, Mode::LongText, &"字".repeat(5000));
    let height = cover_height(&s, &fonts);
    assert!(height * 4.0 > 16_384.0, "height {}", height);
    let png = render_with(&s, &options(4.0), &fonts).unwrap();
    assert_eq!(png_dimensions(&png), (1600, (height * 4.0) as u32));
}

#[test]
fn test_cover_mode_ignores_body_length() {
    let fonts = FontContext::new();
    let long = "字".repeat(5000);
    for layout in LAYOUTS {
        assert_eq!(cover_height(&state(layout, Mode::Cover, &long), &fonts), 440.0);
    }
}

#[test]
fn test_render_without_noise_is_stable() {
    let fonts = FontContext::new();
    let s = state(LayoutStyle::Minimal, Mode::Cover, "正文");
    let a = decode(&render_with(&s, &options(1.0), &fonts).unwrap());
    let b = decode(&render_with(&s, &options(1.0), &fonts).unwrap());
    assert_eq!(changed_share(&a, &b), 0.0);
}

#[test]
fn test_noise_darkens_a_share_of_pixels() {
    let fonts = FontContext::new();
    let s = CoverState {
        background_color: "#FFFFFF".to_string(),
        ..state(LayoutStyle::Minimal, Mode::Cover, "")
    };
    let clean = decode(&render_with(&s, &options(1.0), &fonts).unwrap());
    let grainy = RenderOptions {
        noise: true,
        ..options(1.0)
    };
    let first = decode(&render_with(&s, &grainy, &fonts).unwrap());
    let second = decode(&render_with(&s, &grainy, &fonts).unwrap());

    let share = changed_share(&clean, &first);
    assert!(share > 0.3 && share < 0.7, "noise share {}", share);
    assert!(changed_share(&first, &second) > 0.0);

    // Grain only ever darkens
    for (p, q) in clean.pixels().zip(first.pixels()) {
        assert!(q[0] <= p[0] && q[1] <= p[1] && q[2] <= p[2]);
    }
}

// ─── Properties ─────────────────────────────────────────────────

proptest! {
    #[test]
    fn prop_normalize_is_idempotent(kinds in prop::collection::vec(0..PIECE_KINDS, 0..12)) {
        let once = normalize(&fragment(&kinds));
        prop_assert_eq!(normalize(&once), once);
    }

    #[test]
    fn prop_styled_spans_survive_in_order(kinds in prop::collection::vec(0..PIECE_KINDS, 0..12)) {
        let out = normalize(&fragment(&kinds));
        let mut from = 0;
        for (i, _) in kinds.iter().enumerate().filter(|(_, k)| **k == 5) {
            let span = styled_span(i);
            let found = out[from..].find(&span);
            prop_assert!(found.is_some(), "{} missing from {}", span, out);
            from += found.unwrap_or(0) + span.len();
        }
    }

    #[test]
    fn prop_edge_wrappers_trimmed(
        leading in prop::collection::vec(0usize..EMPTY_WRAPPERS.len(), 0..6),
        trailing in prop::collection::vec(0usize..EMPTY_WRAPPERS.len(), 0..6),
    ) {
        let content = "<b>x</b>y<br>z";
        let html: String = leading
            .iter()
            .map(|&i| EMPTY_WRAPPERS[i])
            .chain(std::iter::once(content))
            .chain(trailing.iter().map(|&i| EMPTY_WRAPPERS[i]))
            .collect();
        prop_assert_eq!(normalize(&html), content);
    }

    #[test]
    fn prop_long_text_height_monotonic(
        layout in 0usize..4,
        base in "[a-z一二三]{0,300}",
        extra in "[a-z一二三]{1,200}",
    ) {
        let fonts = FontContext::new();
        let layout = LAYOUTS[layout];
        let shorter = cover_height(&state(layout, Mode::LongText, &base), &fonts);
        let longer = cover_height(&state(layout, Mode::LongText, &format!("{base}{extra}")), &fonts);
        prop_assert!(shorter >= 600.0);
        prop_assert!(longer >= shorter, "{} < {}", longer, shorter);
    }
}

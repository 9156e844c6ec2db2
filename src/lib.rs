//! # coverkit
//!
//! Rich-text normalization and layout-faithful PNG rendering for styled
//! text covers.
//!
//! A cover is a title, subtitle, one or two rich-text bodies, an author and
//! a few categories, dressed in one of four layouts. The editor that
//! produces covers is a contenteditable surface, so bodies arrive as HTML
//! in whatever shape the platform's editing engine chose: `<br>` runs on
//! one, a `<div>` per line on another, stray empty wrappers at both ends
//! everywhere. This crate has two jobs:
//!
//! - **normalize** that HTML into one canonical `<br>` form without losing
//!   inline formatting, and
//! - **render** a cover to PNG by re-laying it out from scratch: measure
//!   with real glyph metrics, wrap, size titles, paint each layout's chrome
//!   and rasterize glyph outlines. No DOM, no browser screenshot.
//!
//! ## Architecture
//!
//! ```text
//! contenteditable HTML
//!       ↓
//!   [html]       — html5ever fragment parse into an owned arena, serializer
//!       ↓
//!   [normalize]  — unwrap line wrappers, collapse breaks, trim edges
//!   [rules]      — optional regex formatting rules
//!       ↓
//! CoverState (JSON)
//!       ↓
//!   [text]       — flatten to plain text, wrap, reading time
//!   [font]       — faces, metrics, fallback
//!       ↓
//!   [layout]     — canvas height, background layers, one painter per layout
//!       ↓
//!   [raster]     — tiny-skia surface, glyph outlines, PNG bytes
//! ```

pub mod error;
pub mod font;
pub mod html;
pub mod layout;
pub mod model;
pub mod normalize;
pub mod raster;
pub mod rules;
pub mod style;
pub mod text;

pub use error::CoverError;
pub use font::FontContext;
pub use model::{CoverState, FontEntry, LayoutStyle, Mode, RenderOptions};
pub use normalize::{normalize, normalize_with, trim_trailing_empty, NormalizeOptions};
pub use rules::{apply_rules, TransformationRule};
pub use text::{flatten, reading_minutes, wrap, WrappedText};

use chrono::NaiveDate;
use layout::Scene;

/// Render a cover to PNG bytes with default options.
///
/// Fonts are discovered from the system font directories on every call;
/// build a [`FontContext`] once and use [`render_with`] when rendering many
/// covers.
pub fn render(state: &CoverState) -> Result<Vec<u8>, CoverError> {
    let options = RenderOptions::default();
    let fonts = FontContext::from_options(&options);
    render_with(state, &options, &fonts)
}

/// Render a cover to PNG bytes.
pub fn render_with(
    state: &CoverState,
    options: &RenderOptions,
    fonts: &FontContext,
) -> Result<Vec<u8>, CoverError> {
    let mut rng = rand::thread_rng();
    let scene = Scene::new(state, fonts, footer_date(options), &mut rng);
    let canvas = layout::render_scene(&scene, options, &mut rng)?;
    canvas.encode_png()
}

/// Render a cover described as JSON to PNG bytes.
pub fn render_json(json: &str) -> Result<Vec<u8>, CoverError> {
    let state: CoverState = serde_json::from_str(json)?;
    render(&state)
}

/// Logical height of the card `state` renders to. Multiply by the scale
/// for pixels.
pub fn cover_height(state: &CoverState, fonts: &FontContext) -> f32 {
    let scene = Scene::new(state, fonts, NaiveDate::default(), &mut rand::thread_rng());
    layout::canvas_height(&scene)
}

fn footer_date(options: &RenderOptions) -> NaiveDate {
    options
        .date
        .unwrap_or_else(|| chrono::Local::now().date_naive())
}

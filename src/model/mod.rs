//! # Cover Model
//!
//! The input record for a render: what the editor has composed (title,
//! subtitle, rich-text bodies, metadata) and how it is styled. Deserializes
//! from the camelCase JSON the web editor persists; every field defaults,
//! so a partial document is a valid cover.

use serde::{Deserialize, Serialize};

use crate::style::{Color, TextAlign};

/// The complete state of one cover.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CoverState {
    pub title: String,
    pub subtitle: String,
    /// Rich-text HTML for the primary body.
    pub body_text: String,
    /// Rich-text HTML for the secondary body.
    pub secondary_body_text: String,
    /// Bodies used by the `duality` layout. Empty falls back to the
    /// regular bodies.
    pub duality_body_text: String,
    pub duality_secondary_body_text: String,
    /// Category list delimited by `、`, `,` or spaces.
    pub category: String,
    pub author: String,
    pub background_color: String,
    pub accent_color: String,
    pub text_color: String,
    pub layout_style: LayoutStyle,
    pub mode: Mode,
    /// Tailwind size hint, e.g. `text-[13px]` or `text-sm`.
    pub body_text_size: String,
    /// Tailwind alignment class, e.g. `text-justify`.
    pub body_text_align: String,
    pub is_body_bold: bool,
    pub is_body_italic: bool,
    pub title_font: Option<String>,
    pub body_font: Option<String>,
}

impl Default for CoverState {
    fn default() -> Self {
        Self {
            title: "加急投递".to_string(),
            subtitle: "好像不说清楚我是谁、你是什么，第二天太阳就不会升起来".to_string(),
            body_text: String::new(),
            secondary_body_text: String::new(),
            duality_body_text: String::new(),
            duality_secondary_body_text: String::new(),
            category: "文稿、常稿".to_string(),
            author: "琉璃".to_string(),
            background_color: "#F9DEE2".to_string(),
            accent_color: "#F0A9A9".to_string(),
            text_color: "#45597B".to_string(),
            layout_style: LayoutStyle::Minimal,
            mode: Mode::LongText,
            body_text_size: "text-[13px]".to_string(),
            body_text_align: "text-justify".to_string(),
            is_body_bold: false,
            is_body_italic: false,
            title_font: Some("serif".to_string()),
            body_font: Some("serif".to_string()),
        }
    }
}

/// The closed set of card layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutStyle {
    #[default]
    Minimal,
    Split,
    Duality,
    Storybook,
}

/// Fixed-height card or content-driven height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Mode {
    #[serde(rename = "cover")]
    Cover,
    #[default]
    #[serde(rename = "long-text")]
    LongText,
}

const DEFAULT_BODY_SIZE: f32 = 13.0;

impl CoverState {
    pub fn background(&self) -> Color {
        Color::hex_or(&self.background_color, Color::WHITE)
    }

    pub fn accent(&self) -> Color {
        Color::hex_or(&self.accent_color, Color::rgb(0.94, 0.66, 0.66))
    }

    pub fn foreground(&self) -> Color {
        Color::hex_or(&self.text_color, Color::BLACK)
    }

    /// Body font size in logical pixels, read from the Tailwind hint.
    pub fn body_font_size(&self) -> f32 {
        parse_text_size(&self.body_text_size).unwrap_or(DEFAULT_BODY_SIZE)
    }

    pub fn body_align(&self) -> TextAlign {
        TextAlign::from_class(&self.body_text_align)
    }

    /// The two bodies the active layout paints, as HTML.
    pub fn bodies(&self) -> (&str, &str) {
        if self.layout_style == LayoutStyle::Duality
            && !(self.duality_body_text.trim().is_empty()
                && self.duality_secondary_body_text.trim().is_empty())
        {
            (&self.duality_body_text, &self.duality_secondary_body_text)
        } else {
            (&self.body_text, &self.secondary_body_text)
        }
    }

    pub fn categories(&self) -> Vec<String> {
        parse_categories(&self.category)
    }
}

/// Split a category string on `、`, `,` and spaces.
///
/// When splitting leaves nothing but the trimmed input is non-empty, the
/// trimmed input is the single category.
pub fn parse_categories(raw: &str) -> Vec<String> {
    let parts: Vec<String> = raw
        .split(['、', ',', ' '])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    if parts.is_empty() && !raw.trim().is_empty() {
        return vec![raw.trim().to_string()];
    }
    parts
}

/// Read a Tailwind text size class into pixels.
pub fn parse_text_size(class: &str) -> Option<f32> {
    let class = class.trim();
    if let Some(inner) = class
        .strip_prefix("text-[")
        .and_then(|rest| rest.strip_suffix(']'))
    {
        let value = inner.strip_suffix("px").unwrap_or(inner);
        return value.trim().parse::<f32>().ok().filter(|v| *v > 0.0);
    }
    match class {
        "text-xs" => Some(12.0),
        "text-sm" => Some(14.0),
        "text-base" => Some(16.0),
        "text-lg" => Some(18.0),
        "text-xl" => Some(20.0),
        "text-2xl" => Some(24.0),
        _ => None,
    }
}

/// A custom font to register with the renderer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FontEntry {
    /// Family key the layouts ask for, e.g. "serif" or "mono".
    pub family: String,
    /// Data URI, raw base64, or a file path.
    pub src: String,
    /// Font weight (100-900). Defaults to 400.
    #[serde(default = "default_weight")]
    pub weight: u16,
    /// Whether this is an italic variant.
    #[serde(default)]
    pub italic: bool,
}

fn default_weight() -> u16 {
    400
}

/// Knobs for one render call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RenderOptions {
    /// Physical pixels per logical pixel.
    pub scale: f32,
    /// Whether to apply the grain layer.
    pub noise: bool,
    /// Probability that a physical pixel is darkened by the grain layer.
    pub noise_density: f32,
    pub fonts: Vec<FontEntry>,
    /// Discover serif, CJK and monospace faces in the standard system
    /// font directories.
    pub system_fonts: bool,
    /// Footer date override. `None` uses today's local date.
    pub date: Option<chrono::NaiveDate>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            scale: 4.0,
            noise: true,
            noise_density: 0.5,
            fonts: Vec::new(),
            system_fonts: true,
            date: None,
        }
    }
}

//! # Style Primitives
//!
//! Colors and alignment shared by the layouts and the raster surface. The
//! cover state carries its styling as CSS hex strings and Tailwind class
//! hints; this module turns them into typed values once, up front.

use serde::{Deserialize, Serialize};

/// An RGBA color, channels in 0.0 - 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };
    pub const WHITE: Color = Color {
        r: 1.0,
        g: 1.0,
        b: 1.0,
        a: 1.0,
    };
    pub const TRANSPARENT: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 0.0,
    };

    pub fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Parse `#RGB`, `#RGBA`, `#RRGGBB` or `#RRGGBBAA`. Returns `None` for
    /// anything else.
    pub fn parse_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().trim_start_matches('#');
        if !hex.is_ascii() {
            return None;
        }
        let channel = |s: &str| u8::from_str_radix(s, 16).ok().map(|v| v as f32 / 255.0);
        let short = |i: usize| channel(&hex[i..i + 1].repeat(2));
        match hex.len() {
            3 => Some(Self::rgb(short(0)?, short(1)?, short(2)?)),
            4 => Some(Self {
                a: short(3)?,
                ..Self::rgb(short(0)?, short(1)?, short(2)?)
            }),
            6 => Some(Self::rgb(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
            )),
            8 => Some(Self {
                a: channel(&hex[6..8])?,
                ..Self::rgb(
                    channel(&hex[0..2])?,
                    channel(&hex[2..4])?,
                    channel(&hex[4..6])?,
                )
            }),
            _ => None,
        }
    }

    /// Lenient parse: malformed input falls back to `fallback`.
    pub fn hex_or(hex: &str, fallback: Color) -> Self {
        Self::parse_hex(hex).unwrap_or(fallback)
    }

    /// The same color with its alpha multiplied by `opacity`.
    pub fn fade(self, opacity: f32) -> Self {
        Self {
            a: (self.a * opacity).clamp(0.0, 1.0),
            ..self
        }
    }

    pub fn to_skia(self) -> tiny_skia::Color {
        tiny_skia::Color::from_rgba(
            self.r.clamp(0.0, 1.0),
            self.g.clamp(0.0, 1.0),
            self.b.clamp(0.0, 1.0),
            self.a.clamp(0.0, 1.0),
        )
        .unwrap_or(tiny_skia::Color::BLACK)
    }
}

/// Horizontal alignment of body lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    Center,
    Right,
    #[default]
    Justify,
}

impl TextAlign {
    /// Read a Tailwind alignment class such as `text-center`. Unknown
    /// classes mean justify, the editor's default.
    pub fn from_class(class: &str) -> Self {
        match class.trim() {
            "text-left" | "text-start" => TextAlign::Left,
            "text-center" => TextAlign::Center,
            "text-right" | "text-end" => TextAlign::Right,
            _ => TextAlign::Justify,
        }
    }
}

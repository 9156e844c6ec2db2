//! # Font Management
//!
//! Loading fonts and measuring text against their real metrics.
//!
//! A [`FontContext`] holds every face registered for a render: faces from
//! [`FontEntry`] sources first, then whatever serif, CJK and monospace faces
//! the system font directories provide. Lookups go by family, then weight
//! and style, and fall through to any face that has the glyph, so a Latin
//! serif and a CJK serif cooperate on mixed text.
//!
//! When no face covers a character (or no font could be loaded at all),
//! measurement falls back to a fixed metric: 1em for East Asian wide
//! characters, 0.55em for everything else. Rendering stays deterministic
//! even on a machine with no fonts.

pub mod source;

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::error::CoverError;
use crate::model::{FontEntry, RenderOptions};
use crate::text::TextMeasure;

/// Parsed metrics from a TrueType/OpenType face via ttf-parser.
#[derive(Debug, Clone)]
pub struct FaceMetrics {
    pub units_per_em: u16,
    pub advance_widths: HashMap<char, u16>,
    pub default_advance: u16,
    pub ascender: i16,
    pub descender: i16,
    /// Maps characters to their glyph IDs in the face.
    pub glyph_ids: HashMap<char, u16>,
}

impl FaceMetrics {
    /// Advance width of a character in pixels.
    pub fn char_width(&self, ch: char, font_size: f32) -> f32 {
        let w = self
            .advance_widths
            .get(&ch)
            .copied()
            .unwrap_or(self.default_advance);
        (w as f32 / self.units_per_em as f32) * font_size
    }

    pub fn has_glyph(&self, ch: char) -> bool {
        self.glyph_ids.contains_key(&ch)
    }

    fn from_face(face: &ttf_parser::Face) -> Self {
        let units_per_em = face.units_per_em();
        let mut advance_widths = HashMap::new();
        let mut glyph_ids = HashMap::new();
        let mut default_advance = 0u16;

        // Sample the BMP to build width and glyph ID maps
        for code in 32u32..=0xFFFF {
            if let Some(ch) = char::from_u32(code) {
                if let Some(glyph_id) = face.glyph_index(ch) {
                    let advance = face.glyph_hor_advance(glyph_id).unwrap_or(0);
                    advance_widths.insert(ch, advance);
                    glyph_ids.insert(ch, glyph_id.0);
                    if ch == ' ' {
                        default_advance = advance;
                    }
                }
            }
        }

        if default_advance == 0 {
            default_advance = units_per_em / 2;
        }

        FaceMetrics {
            units_per_em,
            advance_widths,
            default_advance,
            ascender: face.ascender(),
            descender: face.descender(),
            glyph_ids,
        }
    }
}

/// One registered face with its bytes and sampled metrics.
#[derive(Debug, Clone)]
pub struct LoadedFace {
    pub family: String,
    pub weight: u16,
    pub italic: bool,
    data: Vec<u8>,
    pub metrics: FaceMetrics,
}

impl LoadedFace {
    /// Parse the face for outline access. Cheap: ttf-parser only reads
    /// table offsets.
    pub fn face(&self) -> Option<ttf_parser::Face<'_>> {
        ttf_parser::Face::parse(&self.data, 0).ok()
    }
}

/// What a piece of text asks for: family key, size, weight, style.
#[derive(Debug, Clone, PartialEq)]
pub struct FontSpec {
    pub family: String,
    pub size: f32,
    pub weight: u16,
    pub italic: bool,
}

impl FontSpec {
    pub fn new(family: &str, size: f32) -> Self {
        Self {
            family: family.to_string(),
            size,
            weight: 400,
            italic: false,
        }
    }

    pub fn serif(size: f32) -> Self {
        Self::new("serif", size)
    }

    pub fn mono(size: f32) -> Self {
        Self::new("mono", size)
    }

    pub fn weight(mut self, weight: u16) -> Self {
        self.weight = weight;
        self
    }

    pub fn bold(self) -> Self {
        self.weight(700)
    }

    pub fn italic(mut self, italic: bool) -> Self {
        self.italic = italic;
        self
    }

    pub fn is_bold(&self) -> bool {
        self.weight >= 600
    }
}

/// Families tried, in order, after the requested one.
const FALLBACK_FAMILIES: &[&str] = &["serif", "sans"];

/// All faces available to one or more renders. Immutable once built.
#[derive(Debug, Clone, Default)]
pub struct FontContext {
    faces: Vec<LoadedFace>,
}

impl FontContext {
    /// A context with no faces; every measurement uses the fallback metric.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the option's font entries and, if enabled, system faces.
    /// Failures are logged and skipped.
    pub fn from_options(options: &RenderOptions) -> Self {
        let mut ctx = Self::new();
        for entry in &options.fonts {
            if let Err(e) = ctx.register_entry(entry) {
                warn!(family = %entry.family, error = %e, "skipping font entry");
            }
        }
        if options.system_fonts {
            for found in source::discover_system_faces() {
                let loaded = std::fs::read(&found.path)
                    .map_err(CoverError::from)
                    .and_then(|data| ctx.register(found.family, found.weight, false, data));
                match loaded {
                    Ok(()) => debug!(family = found.family, path = %found.path.display(), "loaded system font"),
                    Err(e) => warn!(path = %found.path.display(), error = %e, "skipping system font"),
                }
            }
        }
        if ctx.faces.is_empty() {
            warn!("no fonts available; text uses fallback metrics and is not drawn");
        }
        ctx
    }

    pub fn register_entry(&mut self, entry: &FontEntry) -> Result<(), CoverError> {
        let data = source::read_source_bytes(&entry.src)?;
        self.register(&entry.family, entry.weight, entry.italic, data)
    }

    /// Register raw TrueType/OpenType bytes under a family key.
    pub fn register(
        &mut self,
        family: &str,
        weight: u16,
        italic: bool,
        data: Vec<u8>,
    ) -> Result<(), CoverError> {
        let metrics = {
            let face = ttf_parser::Face::parse(&data, 0)
                .map_err(|e| CoverError::Font(format!("Failed to parse font '{}': {}", family, e)))?;
            FaceMetrics::from_face(&face)
        };
        self.faces.push(LoadedFace {
            family: family.to_string(),
            weight,
            italic,
            data,
            metrics,
        });
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    pub fn faces(&self) -> &[LoadedFace] {
        &self.faces
    }

    /// Face indices in preference order for `spec`: the requested family
    /// (closest weight and style first), the fallback families, then the
    /// rest.
    fn candidates(&self, spec: &FontSpec) -> Vec<usize> {
        let family_rank = |family: &str| {
            if family == spec.family {
                0
            } else if let Some(pos) = FALLBACK_FAMILIES.iter().position(|f| *f == family) {
                1 + pos
            } else {
                1 + FALLBACK_FAMILIES.len()
            }
        };
        let mut order: Vec<usize> = (0..self.faces.len()).collect();
        order.sort_by_key(|&i| {
            let face = &self.faces[i];
            (
                family_rank(&face.family),
                face.italic != spec.italic,
                (face.weight as i32 - spec.weight as i32).unsigned_abs(),
            )
        });
        order
    }

    /// The preferred face that has a glyph for `ch`.
    pub fn face_for(&self, ch: char, spec: &FontSpec) -> Option<&LoadedFace> {
        self.candidates(spec)
            .into_iter()
            .map(|i| &self.faces[i])
            .find(|f| f.metrics.has_glyph(ch))
    }

    /// Resolve every character of `text` to a face (or `None` for the
    /// fallback metric) in one pass.
    pub fn resolve<'a>(&'a self, text: &str, spec: &FontSpec) -> Vec<(char, Option<&'a LoadedFace>)> {
        let order = self.candidates(spec);
        text.chars()
            .map(|ch| {
                let face = order
                    .iter()
                    .map(|&i| &self.faces[i])
                    .find(|f| f.metrics.has_glyph(ch));
                (ch, face)
            })
            .collect()
    }

    pub fn char_width(&self, ch: char, spec: &FontSpec) -> f32 {
        match self.face_for(ch, spec) {
            Some(face) => face.metrics.char_width(ch, spec.size),
            None => fallback_advance(ch) * spec.size,
        }
    }

    /// Advance width of `text` in pixels.
    pub fn measure(&self, text: &str, spec: &FontSpec) -> f32 {
        self.resolve(text, spec)
            .into_iter()
            .map(|(ch, face)| match face {
                Some(face) => face.metrics.char_width(ch, spec.size),
                None => fallback_advance(ch) * spec.size,
            })
            .sum()
    }

    /// Advance width with `letter_spacing` pixels after every character.
    pub fn measure_spaced(&self, text: &str, spec: &FontSpec, letter_spacing: f32) -> f32 {
        self.measure(text, spec) + letter_spacing * text.chars().count() as f32
    }

    /// Ascent and descent (both positive) in pixels for the spec's primary
    /// face, or the fallback proportions.
    pub fn vertical_metrics(&self, spec: &FontSpec) -> (f32, f32) {
        match self.candidates(spec).first().map(|&i| &self.faces[i]) {
            Some(face) => {
                let m = &face.metrics;
                let upem = m.units_per_em as f32;
                (
                    m.ascender as f32 / upem * spec.size,
                    (m.descender as f32).abs() / upem * spec.size,
                )
            }
            None => (0.88 * spec.size, 0.12 * spec.size),
        }
    }

    /// A [`TextMeasure`] bound to one spec.
    pub fn measurer<'a>(&'a self, spec: &'a FontSpec) -> SpecMeasure<'a> {
        SpecMeasure { fonts: self, spec }
    }
}

/// [`FontContext`] measurement under a fixed [`FontSpec`].
pub struct SpecMeasure<'a> {
    fonts: &'a FontContext,
    spec: &'a FontSpec,
}

impl TextMeasure for SpecMeasure<'_> {
    fn measure(&self, text: &str) -> f32 {
        self.fonts.measure(text, self.spec)
    }
}

/// Advance in em for characters no face covers.
pub fn fallback_advance(ch: char) -> f32 {
    if is_wide(ch) {
        1.0
    } else if ch == ' ' || ch == '\u{a0}' {
        0.3
    } else {
        0.55
    }
}

/// East Asian wide and fullwidth ranges.
fn is_wide(ch: char) -> bool {
    matches!(ch as u32,
        0x1100..=0x115F
        | 0x2E80..=0xA4CF
        | 0xAC00..=0xD7A3
        | 0xF900..=0xFAFF
        | 0xFE30..=0xFE4F
        | 0xFF00..=0xFF60
        | 0xFFE0..=0xFFE6
        | 0x20000..=0x3FFFD)
}

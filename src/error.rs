//! Structured error types for coverkit.
//!
//! Normalization never fails, so every variant here belongs to the render
//! path: JSON input, fonts, the raster surface, and PNG encoding.

use thiserror::Error;

/// The unified error type returned by the fallible public API.
#[derive(Debug, Error)]
pub enum CoverError {
    /// JSON input failed to parse as a cover state or render options.
    #[error("Failed to parse input: {source}{}", format_hint(.hint))]
    Parse {
        #[source]
        source: serde_json::Error,
        hint: String,
    },
    /// A font could not be read or parsed.
    #[error("Font error: {0}")]
    Font(String),
    /// The raster surface could not be created.
    #[error("Canvas error: {0}")]
    Canvas(String),
    /// PNG encoding failed.
    #[error("Encode error: {0}")]
    Encode(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn format_hint(hint: &str) -> String {
    if hint.is_empty() {
        String::new()
    } else {
        format!("\n  Hint: {}", hint)
    }
}

impl From<serde_json::Error> for CoverError {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "Check for trailing commas, missing quotes, or unescaped characters.".to_string()
            }
            serde_json::error::Category::Data => {
                "The JSON is valid but doesn't match the cover state schema. Check field names (camelCase) and types.".to_string()
            }
            serde_json::error::Category::Eof => {
                "Unexpected end of input. Is the JSON truncated?".to_string()
            }
            serde_json::error::Category::Io => String::new(),
        };
        CoverError::Parse { source: e, hint }
    }
}

//! # Text Preparation
//!
//! Everything between a rich-text body and painted lines: flattening the
//! HTML to plain text, measuring, and character-granular line wrapping.
//!
//! Wrapping is deliberately simple. Cover bodies are mostly CJK, where every
//! character is a break opportunity, so lines are built one character at a
//! time against the measured width and committed on overflow. There is no
//! hyphenation and no word-boundary search; justification is the painter's
//! job.

use crate::html::{is_block_tag, is_raw_text_tag, Dom, NodeData, NodeId};

/// Measures the advance width of a string under one fixed font.
pub trait TextMeasure {
    fn measure(&self, text: &str) -> f32;
}

impl<T: TextMeasure + ?Sized> TextMeasure for &T {
    fn measure(&self, text: &str) -> f32 {
        (**self).measure(text)
    }
}

/// Every character has the same advance. Handy for tests and previews.
#[derive(Debug, Clone, Copy)]
pub struct Monospace(pub f32);

impl TextMeasure for Monospace {
    fn measure(&self, text: &str) -> f32 {
        text.chars().count() as f32 * self.0
    }
}

/// A single wrapped line.
#[derive(Debug, Clone, PartialEq)]
pub struct WrappedLine {
    pub text: String,
    /// True when this is the last line of its paragraph. Justified text
    /// leaves such lines at their natural width.
    pub ends_paragraph: bool,
}

/// Lines of a wrapped text block.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WrappedText {
    pub lines: Vec<WrappedLine>,
    pub line_height: f32,
}

impl WrappedText {
    pub fn total_height(&self) -> f32 {
        self.lines.len() as f32 * self.line_height
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Line strings only.
    pub fn texts(&self) -> Vec<&str> {
        self.lines.iter().map(|l| l.text.as_str()).collect()
    }
}

/// Wrap `text` to `max_width`, one paragraph per `\n`.
///
/// An empty paragraph becomes one empty line; an empty input has no lines.
pub fn wrap(text: &str, max_width: f32, measurer: &impl TextMeasure, line_height: f32) -> WrappedText {
    let mut lines = Vec::new();
    if !text.is_empty() {
        for paragraph in text.split('\n') {
            wrap_paragraph(paragraph, max_width, measurer, &mut lines);
        }
    }
    WrappedText { lines, line_height }
}

fn wrap_paragraph(
    paragraph: &str,
    max_width: f32,
    measurer: &impl TextMeasure,
    lines: &mut Vec<WrappedLine>,
) {
    let mut line = String::new();
    for ch in paragraph.chars() {
        let mut candidate = line.clone();
        candidate.push(ch);
        if !line.is_empty() && measurer.measure(&candidate) > max_width {
            lines.push(WrappedLine {
                text: std::mem::take(&mut line),
                ends_paragraph: false,
            });
            line.push(ch);
        } else {
            line = candidate;
        }
    }
    lines.push(WrappedLine {
        text: line,
        ends_paragraph: true,
    });
}

/// Flatten a rich-text fragment to plain text with `\n` line breaks.
pub fn flatten(html: &str) -> String {
    let dom = Dom::parse_fragment(html);
    let mut out = String::new();
    flatten_into(&dom, dom.root(), &mut out);
    collapse_newlines(out.trim())
}

fn flatten_into(dom: &Dom, id: NodeId, out: &mut String) {
    for &child in dom.children(id) {
        match &dom.node(child).data {
            NodeData::Text(text) => push_text(text, out),
            NodeData::Element { name, .. } => {
                let tag = &*name.local;
                if tag == "br" {
                    out.push('\n');
                    continue;
                }
                if is_raw_text_tag(tag) {
                    continue;
                }
                let block = is_block_tag(tag);
                if block && starts_new_line(out) {
                    out.push('\n');
                }
                flatten_into(dom, child, out);
                if block && !out.ends_with('\n') {
                    out.push('\n');
                }
            }
            NodeData::Comment(_) | NodeData::Document => {}
        }
    }
}

/// Whether a block opening here has inline content before it on the same
/// line. Spaces left over from source whitespace do not count.
fn starts_new_line(out: &str) -> bool {
    let tail = out.trim_end_matches(' ');
    !tail.is_empty() && !tail.ends_with('\n')
}

fn push_text(text: &str, out: &mut String) {
    let mut in_break = false;
    for ch in text.chars() {
        if matches!(ch, '\n' | '\r' | '\t') {
            if !in_break {
                out.push(' ');
            }
            in_break = true;
        } else {
            out.push(ch);
            in_break = false;
        }
    }
}

/// Collapse runs of three or more newlines to two.
fn collapse_newlines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut run = 0;
    for ch in text.chars() {
        if ch == '\n' {
            run += 1;
            if run > 2 {
                continue;
            }
        } else {
            run = 0;
        }
        out.push(ch);
    }
    out
}

/// Characters read per minute.
const READING_SPEED: usize = 400;

/// Estimated reading time in whole minutes, at least one.
pub fn reading_minutes(text: &str) -> u32 {
    let chars = text.chars().filter(|c| !c.is_whitespace()).count();
    chars.div_ceil(READING_SPEED).max(1) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_monospace() {
        let wrapped = wrap("ABCDEFGHIJ", 50.0, &Monospace(10.0), 15.0);
        assert_eq!(wrapped.texts(), vec!["ABCDE", "FGHIJ"]);
        assert!(!wrapped.lines[0].ends_paragraph);
        assert!(wrapped.lines[1].ends_paragraph);
        assert_eq!(wrapped.total_height(), 30.0);
    }

    #[test]
    fn test_blank_paragraph_is_a_line() {
        let wrapped = wrap("A\n\nB", 100.0, &Monospace(10.0), 10.0);
        assert_eq!(wrapped.texts(), vec!["A", "", "B"]);
        assert!(wrapped.lines.iter().all(|l| l.ends_paragraph));
    }

    #[test]
    fn test_empty_input_has_no_lines() {
        let wrapped = wrap("", 100.0, &Monospace(10.0), 10.0);
        assert!(wrapped.is_empty());
        assert_eq!(wrapped.total_height(), 0.0);
    }

    #[test]
    fn test_oversized_char_gets_own_line() {
        let wrapped = wrap("ab", 5.0, &Monospace(10.0), 10.0);
        assert_eq!(wrapped.texts(), vec!["a", "b"]);
    }

    #[test]
    fn test_flatten_breaks_and_blocks() {
        assert_eq!(flatten("A<br>B"), "A\nB");
        assert_eq!(flatten("<div>A</div><div>B</div>"), "A\nB");
        assert_eq!(flatten("<div>A</div>\n<div>B</div>"), "A\n B");
    }

    #[test]
    fn test_flatten_breaks_before_block_after_inline() {
        assert_eq!(flatten("Line1<div>Line2</div>"), "Line1\nLine2");
        assert_eq!(flatten(r#"x<div style="text-align:center">c</div>y"#), "x\nc\ny");
        assert_eq!(flatten("<b>a</b><div><div>b</div></div>"), "a\nb");
        assert_eq!(flatten("<div>a<div>b</div></div>"), "a\nb");
    }

    #[test]
    fn test_flatten_collapses_whitespace_controls() {
        assert_eq!(flatten("a\n\tb"), "a b");
        assert_eq!(flatten("A<br><br><br><br>B"), "A\n\nB");
        assert_eq!(flatten("<br><br>  A  <br>"), "A");
    }

    #[test]
    fn test_flatten_keeps_inline_text_and_skips_style() {
        assert_eq!(
            flatten(r#"<span style="color:red">红</span><b>字</b><style>b{}</style>"#),
            "红字"
        );
        assert_eq!(flatten("a&nbsp;b"), "a\u{a0}b");
    }

    #[test]
    fn test_reading_minutes() {
        assert_eq!(reading_minutes(""), 1);
        assert_eq!(reading_minutes(&"字".repeat(400)), 1);
        assert_eq!(reading_minutes(&"字".repeat(401)), 2);
        assert_eq!(reading_minutes(&"字".repeat(800)), 2);
        assert_eq!(reading_minutes(&"字 ".repeat(401)), 2);
    }
}

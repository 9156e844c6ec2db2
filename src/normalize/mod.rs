//! # Rich-Text Normalization
//!
//! Contenteditable surfaces disagree on how a line is represented. Some
//! browsers emit `<br>` runs, others wrap every line in its own `<div>`, and
//! an empty line can be `<div><br></div>`, `<div>&nbsp;</div>` or an empty
//! block. [`normalize`] folds all of these into the `<br>` form:
//!
//! ```text
//! Line1<div>Line2</div><div><br></div><div>Line3</div>
//!       ↓
//! Line1<br>Line2<br><br>Line3
//! ```
//!
//! Inline formatting is never touched, blocks that carry styling or nested
//! block structure are kept, and a fragment with real semantic structure
//! (paragraphs, lists, tables, ...) is returned exactly as given.
//!
//! The pass is idempotent: `normalize(normalize(x)) == normalize(x)`.

use crate::html::{is_block_tag, is_media_tag, Dom, NodeId};

/// Which tags and attributes drive the normalizer.
#[derive(Debug, Clone)]
pub struct NormalizeOptions {
    /// A fragment containing any of these is returned unchanged.
    pub guard_tags: Vec<String>,
    /// Block tags that may be unwrapped into a line break.
    pub wrapper_tags: Vec<String>,
    /// Attributes that make a wrapper worth keeping. `data-*` attributes
    /// always count.
    pub preserving_attrs: Vec<String>,
    /// Subtrees left exactly as they are.
    pub preformatted_tags: Vec<String>,
    /// Longest run of consecutive `<br>` kept at one nesting level.
    pub max_consecutive_breaks: usize,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            guard_tags: strings(&[
                "p", "h1", "h2", "h3", "h4", "h5", "h6", "ul", "ol", "li", "table", "blockquote",
                "dl",
            ]),
            wrapper_tags: strings(&[
                "div", "section", "article", "header", "footer", "aside", "nav", "main",
                "address", "figure", "center",
            ]),
            preserving_attrs: strings(&["style", "class", "align", "dir", "id"]),
            preformatted_tags: strings(&["pre", "textarea", "listing"]),
            max_consecutive_breaks: 2,
        }
    }
}

impl NormalizeOptions {
    fn is_guard(&self, tag: &str) -> bool {
        self.guard_tags.iter().any(|t| t == tag)
    }

    fn is_wrapper(&self, tag: &str) -> bool {
        self.wrapper_tags.iter().any(|t| t == tag)
    }

    fn is_preformatted(&self, tag: &str) -> bool {
        self.preformatted_tags.iter().any(|t| t == tag)
    }

    fn is_preserving_attr(&self, name: &str) -> bool {
        name.starts_with("data-") || self.preserving_attrs.iter().any(|a| a == name)
    }
}

/// Normalize a contenteditable fragment with the default options.
pub fn normalize(html: &str) -> String {
    normalize_with(html, &NormalizeOptions::default())
}

pub fn normalize_with(html: &str, options: &NormalizeOptions) -> String {
    let mut dom = Dom::parse_fragment(html);
    let root = dom.root();
    if dom.has_descendant_tag(root, |t| options.is_guard(t)) {
        return html.to_string();
    }

    let mut pass = Normalizer {
        dom: &mut dom,
        options,
    };
    pass.flatten_wrappers(root);
    pass.collapse_breaks(root);
    trim_edge(pass.dom, root, Edge::Leading);
    trim_edge(pass.dom, root, Edge::Trailing);
    dom.inner_html(root)
}

/// Remove visually-empty nodes from the end of the fragment only.
///
/// Leaves line structure, wrappers and leading content alone. Useful for
/// callers that only need to stop trailing blank lines from growing the
/// rendered card.
pub fn trim_trailing_empty(html: &str) -> String {
    let mut dom = Dom::parse_fragment(html);
    let root = dom.root();
    trim_edge(&mut dom, root, Edge::Trailing);
    dom.inner_html(root)
}

struct Normalizer<'a> {
    dom: &'a mut Dom,
    options: &'a NormalizeOptions,
}

impl Normalizer<'_> {
    /// Rewrite the children of `parent`, unwrapping plain wrappers bottom-up.
    fn flatten_wrappers(&mut self, parent: NodeId) {
        let children = self.dom.take_children(parent);
        let mut out: Vec<NodeId> = Vec::with_capacity(children.len());

        for (i, &child) in children.iter().enumerate() {
            let descend = self
                .dom
                .tag(child)
                .is_some_and(|t| !self.options.is_preformatted(t));
            if descend {
                self.flatten_wrappers(child);
            }
            if !self.is_plain_wrapper(child) {
                out.push(child);
                continue;
            }

            if out.iter().any(|&n| has_content(self.dom, n)) {
                out.push(self.dom.create_element("br"));
            }
            if !is_visually_empty(self.dom, child) {
                let mut inner = self.dom.take_children(child);
                if inner.last().is_some_and(|&n| self.dom.is_tag(n, "br")) {
                    inner.pop();
                }
                out.extend(inner);
            }
            if self.followed_by_inline(&children[i + 1..]) {
                out.push(self.dom.create_element("br"));
            }
        }

        self.dom.set_children(parent, out);
    }

    fn is_plain_wrapper(&self, id: NodeId) -> bool {
        let Some(tag) = self.dom.tag(id) else {
            return false;
        };
        self.options.is_wrapper(tag)
            && !self
                .dom
                .attrs(id)
                .iter()
                .any(|a| self.options.is_preserving_attr(&a.name.local))
            && !self.dom.has_descendant_tag(id, is_block_tag)
    }

    /// Whether the next meaningful sibling is inline content that needs the
    /// wrapper's line end kept.
    fn followed_by_inline(&self, rest: &[NodeId]) -> bool {
        for &next in rest {
            if let Some(text) = self.dom.text(next) {
                if is_blank(text) {
                    continue;
                }
                return true;
            }
            return match self.dom.tag(next) {
                Some("br") => false,
                Some(tag) => !is_block_tag(tag),
                None => continue,
            };
        }
        false
    }

    /// Cap runs of consecutive `<br>` at every nesting level.
    fn collapse_breaks(&mut self, parent: NodeId) {
        let children = self.dom.children(parent).to_vec();
        let mut run = 0;
        for child in children {
            if self.dom.is_tag(child, "br") {
                run += 1;
                if run > self.options.max_consecutive_breaks {
                    self.dom.detach(child);
                }
                continue;
            }
            if self.dom.text(child).is_some_and(is_blank) {
                continue;
            }
            run = 0;
            let descend = self
                .dom
                .tag(child)
                .is_some_and(|t| !self.options.is_preformatted(t));
            if descend {
                self.collapse_breaks(child);
            }
        }
    }
}

#[derive(Clone, Copy)]
enum Edge {
    Leading,
    Trailing,
}

/// Drop visually-empty nodes at one edge of `parent`, descending into the
/// first non-empty edge element.
fn trim_edge(dom: &mut Dom, parent: NodeId, edge: Edge) {
    loop {
        let next = match edge {
            Edge::Leading => dom.children(parent).first(),
            Edge::Trailing => dom.children(parent).last(),
        };
        let Some(&node) = next else {
            return;
        };
        if is_visually_empty(dom, node) {
            dom.detach(node);
            continue;
        }
        let descend = dom
            .tag(node)
            .is_some_and(|t| !is_media_tag(t) && !dom.children(node).is_empty());
        if descend {
            trim_edge(dom, node, edge);
        }
        return;
    }
}

fn is_blank(text: &str) -> bool {
    text.chars().all(|c| c.is_whitespace() || c == '\u{a0}')
}

/// Content that ends a preceding line: any element, or non-blank text.
fn has_content(dom: &Dom, id: NodeId) -> bool {
    dom.is_element(id) || dom.text(id).is_some_and(|t| !is_blank(t))
}

/// Whether a node paints nothing.
pub fn is_visually_empty(dom: &Dom, id: NodeId) -> bool {
    if let Some(text) = dom.text(id) {
        return is_blank(text);
    }
    let Some(tag) = dom.tag(id) else {
        // Comments and processing instructions.
        return true;
    };
    if tag == "br" {
        return true;
    }
    if is_media_tag(tag) || has_painting_style(dom.attr(id, "style").unwrap_or("")) {
        return false;
    }
    dom.children(id).iter().all(|&c| is_visually_empty(dom, c))
}

/// Inline styles that paint even without content.
fn has_painting_style(style: &str) -> bool {
    style.split(';').any(|decl| {
        let Some((prop, value)) = decl.split_once(':') else {
            return false;
        };
        let prop = prop.trim().to_ascii_lowercase();
        let value = value.trim();
        match prop.as_str() {
            "background-image" => !value.is_empty() && value != "none",
            "height" => {
                let number: String = value
                    .chars()
                    .take_while(|c| c.is_ascii_digit() || *c == '.')
                    .collect();
                number.parse::<f32>().is_ok_and(|v| v > 0.0)
            }
            _ => false,
        }
    })
}

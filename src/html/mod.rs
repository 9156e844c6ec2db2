//! # Rich-Text DOM
//!
//! A small arena-owned node tree for contenteditable fragments. Every call
//! that needs a tree parses its own with `html5ever`'s fragment parser
//! (through the [`sink`] tree builder), rewrites it in place, and serializes
//! it back with [`serialize`]. Nothing here is shared between calls.
//!
//! Nodes are addressed by [`NodeId`] indices into the arena. Detached nodes
//! stay in the arena until the `Dom` is dropped; they are simply unreachable
//! from the root.

pub mod serialize;
pub mod sink;

use html5ever::{LocalName, Namespace, QualName};

pub const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// Tags that take part in block layout.
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "center", "details", "dd", "dialog", "div",
    "dl", "dt", "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4",
    "h5", "h6", "header", "hgroup", "hr", "li", "listing", "main", "menu", "nav", "ol", "p",
    "pre", "section", "summary", "table", "tbody", "thead", "tfoot", "tr", "td", "th",
    "caption", "ul",
];

/// Elements that always paint something, whatever their children.
const MEDIA_TAGS: &[&str] = &[
    "img", "hr", "input", "video", "canvas", "svg", "iframe", "object", "embed", "audio",
    "picture",
];

/// Elements serialized without a closing tag.
const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

/// Elements whose text is serialized without escaping.
const RAW_TEXT_TAGS: &[&str] = &[
    "script", "style", "xmp", "iframe", "noembed", "noframes", "plaintext",
];

pub fn is_block_tag(tag: &str) -> bool {
    BLOCK_TAGS.contains(&tag)
}

pub fn is_media_tag(tag: &str) -> bool {
    MEDIA_TAGS.contains(&tag)
}

pub fn is_void_tag(tag: &str) -> bool {
    VOID_TAGS.contains(&tag)
}

pub fn is_raw_text_tag(tag: &str) -> bool {
    RAW_TEXT_TAGS.contains(&tag)
}

/// Index of a node in its [`Dom`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
pub struct Attr {
    pub name: QualName,
    pub value: String,
}

impl Attr {
    /// The attribute name as written in markup (`prefix:local` when
    /// namespaced).
    pub fn qualified(&self) -> String {
        match &self.name.prefix {
            Some(prefix) => format!("{}:{}", prefix, self.name.local),
            None => self.name.local.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum NodeData {
    Document,
    Element { name: QualName, attrs: Vec<Attr> },
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone)]
pub struct Node {
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub data: NodeData,
}

/// An arena of nodes with node 0 as the document.
#[derive(Debug, Clone)]
pub struct Dom {
    nodes: Vec<Node>,
    /// Returned by name lookups on non-element nodes.
    unnamed: QualName,
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

impl Dom {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                data: NodeData::Document,
            }],
            unnamed: html_name(""),
        }
    }

    /// Parse an HTML fragment as if it were the content of a `<body>`.
    pub fn parse_fragment(html: &str) -> Self {
        sink::parse_fragment(html)
    }

    pub fn document(&self) -> NodeId {
        NodeId(0)
    }

    /// The node holding the fragment's content.
    ///
    /// The fragment parser places the parsed nodes under a synthetic `html`
    /// element; an empty document has no such element and is its own root.
    pub fn root(&self) -> NodeId {
        let document = self.document();
        self.children(document)
            .iter()
            .copied()
            .find(|&id| self.tag(id) == Some("html"))
            .unwrap_or(document)
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    pub fn qual_name(&self, id: NodeId) -> &QualName {
        match &self.node(id).data {
            NodeData::Element { name, .. } => name,
            _ => &self.unnamed,
        }
    }

    /// Local tag name of an element, `None` for other nodes.
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).data {
            NodeData::Element { name, .. } => Some(&*name.local),
            _ => None,
        }
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(self.node(id).data, NodeData::Element { .. })
    }

    pub fn is_tag(&self, id: NodeId, tag: &str) -> bool {
        self.tag(id) == Some(tag)
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).data {
            NodeData::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn attrs(&self, id: NodeId) -> &[Attr] {
        match &self.node(id).data {
            NodeData::Element { attrs, .. } => attrs,
            _ => &[],
        }
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attrs(id)
            .iter()
            .find(|a| &*a.name.local == name)
            .map(|a| a.value.as_str())
    }

    /// Set or replace an attribute on an element. No-op on other nodes.
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        if let NodeData::Element { attrs, .. } = &mut self.node_mut(id).data {
            match attrs.iter_mut().find(|a| &*a.name.local == name) {
                Some(existing) => existing.value = value.to_string(),
                None => attrs.push(Attr {
                    name: QualName::new(None, Namespace::from(""), LocalName::from(name)),
                    value: value.to_string(),
                }),
            }
        }
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        self.nodes.push(Node {
            parent: None,
            children: Vec::new(),
            data,
        });
        NodeId(self.nodes.len() - 1)
    }

    pub(crate) fn create_qualified(&mut self, name: QualName, attrs: Vec<Attr>) -> NodeId {
        self.push(NodeData::Element { name, attrs })
    }

    /// Create a detached HTML element.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeData::Element {
            name: html_name(tag),
            attrs: Vec::new(),
        })
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeData::Text(text.to_string()))
    }

    pub fn create_comment(&mut self, text: &str) -> NodeId {
        self.push(NodeData::Comment(text.to_string()))
    }

    /// Unlink a node from its parent. The subtree stays intact.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.node_mut(id).parent.take() {
            self.node_mut(parent).children.retain(|&c| c != id);
        }
    }

    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.node_mut(child).parent = Some(parent);
        self.node_mut(parent).children.push(child);
    }

    /// Insert `child` immediately before `sibling`. No-op when `sibling`
    /// is detached.
    pub fn insert_before(&mut self, sibling: NodeId, child: NodeId) {
        let Some(parent) = self.parent(sibling) else {
            return;
        };
        self.detach(child);
        let index = self
            .children(parent)
            .iter()
            .position(|&c| c == sibling)
            .unwrap_or(0);
        self.node_mut(child).parent = Some(parent);
        self.node_mut(parent).children.insert(index, child);
    }

    /// Detach every child of `id` and hand them back in order.
    pub fn take_children(&mut self, id: NodeId) -> Vec<NodeId> {
        let children = std::mem::take(&mut self.node_mut(id).children);
        for &child in &children {
            self.node_mut(child).parent = None;
        }
        children
    }

    /// Replace the children of `parent` with `children`.
    pub fn set_children(&mut self, parent: NodeId, children: Vec<NodeId>) {
        for child in self.take_children(parent) {
            self.node_mut(child).parent = None;
        }
        for &child in &children {
            self.detach(child);
            self.node_mut(child).parent = Some(parent);
        }
        self.node_mut(parent).children = children;
    }

    /// Append text to `parent`, merging into a trailing text child.
    pub(crate) fn append_text(&mut self, parent: NodeId, text: &str) {
        if let Some(&last) = self.children(parent).last() {
            if let NodeData::Text(existing) = &mut self.node_mut(last).data {
                existing.push_str(text);
                return;
            }
        }
        let id = self.create_text(text);
        self.append(parent, id);
    }

    /// Insert text before `sibling`, merging into a preceding text sibling.
    pub(crate) fn insert_text_before(&mut self, sibling: NodeId, text: &str) {
        let Some(parent) = self.parent(sibling) else {
            return;
        };
        let index = self
            .children(parent)
            .iter()
            .position(|&c| c == sibling)
            .unwrap_or(0);
        if index > 0 {
            let prev = self.children(parent)[index - 1];
            if let NodeData::Text(existing) = &mut self.node_mut(prev).data {
                existing.push_str(text);
                return;
            }
        }
        let id = self.create_text(text);
        self.insert_before(sibling, id);
    }

    /// All nodes under `id` in document order, `id` excluded.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// Concatenated text of every text node under `id`.
    pub fn text_content(&self, id: NodeId) -> String {
        if let Some(text) = self.text(id) {
            return text.to_string();
        }
        self.descendants(id)
            .into_iter()
            .filter_map(|n| self.text(n))
            .collect()
    }

    /// Whether any element under `id` matches `pred` on its tag name.
    pub fn has_descendant_tag(&self, id: NodeId, pred: impl Fn(&str) -> bool) -> bool {
        self.descendants(id)
            .into_iter()
            .any(|n| self.tag(n).is_some_and(&pred))
    }

    pub fn inner_html(&self, id: NodeId) -> String {
        serialize::inner_html(self, id)
    }

    pub fn outer_html(&self, id: NodeId) -> String {
        serialize::outer_html(self, id)
    }
}

/// A qualified name in the HTML namespace.
pub fn html_name(local: &str) -> QualName {
    QualName::new(None, Namespace::from(HTML_NAMESPACE), LocalName::from(local))
}

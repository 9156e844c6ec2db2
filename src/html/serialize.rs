//! HTML serialization for [`Dom`] subtrees.
//!
//! Output follows the HTML fragment serialization rules closely enough that
//! parsing the result yields the same tree: void elements have no end tag,
//! raw-text elements are not escaped, and U+00A0 is written as `&nbsp;` so
//! editor-entered spacing survives a round trip visibly.

use super::{is_raw_text_tag, is_void_tag, Dom, NodeData, NodeId};

pub fn inner_html(dom: &Dom, id: NodeId) -> String {
    let mut out = String::new();
    let raw = dom.tag(id).is_some_and(is_raw_text_tag);
    for &child in dom.children(id) {
        write_node(dom, child, raw, &mut out);
    }
    out
}

pub fn outer_html(dom: &Dom, id: NodeId) -> String {
    let mut out = String::new();
    let raw = dom
        .parent(id)
        .and_then(|p| dom.tag(p))
        .is_some_and(is_raw_text_tag);
    write_node(dom, id, raw, &mut out);
    out
}

fn write_node(dom: &Dom, id: NodeId, raw_text: bool, out: &mut String) {
    match &dom.node(id).data {
        NodeData::Document => {
            for &child in dom.children(id) {
                write_node(dom, child, false, out);
            }
        }
        NodeData::Text(text) => {
            if raw_text {
                out.push_str(text);
            } else {
                out.push_str(&escape_text(text));
            }
        }
        NodeData::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
        NodeData::Element { name, attrs } => {
            let tag = &*name.local;
            out.push('<');
            out.push_str(tag);
            for attr in attrs {
                out.push(' ');
                out.push_str(&attr.qualified());
                out.push_str("=\"");
                out.push_str(&escape_attr(&attr.value));
                out.push('"');
            }
            out.push('>');
            if is_void_tag(tag) {
                return;
            }
            let raw = is_raw_text_tag(tag);
            for &child in dom.children(id) {
                write_node(dom, child, raw, out);
            }
            out.push_str("</");
            out.push_str(tag);
            out.push('>');
        }
    }
}

fn escape_text(text: &str) -> String {
    html_escape::encode_text(text).replace('\u{a0}', "&nbsp;")
}

fn escape_attr(value: &str) -> String {
    html_escape::encode_double_quoted_attribute(value).replace('\u{a0}', "&nbsp;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(html: &str) -> String {
        let dom = Dom::parse_fragment(html);
        dom.inner_html(dom.root())
    }

    #[test]
    fn test_void_elements_have_no_end_tag() {
        assert_eq!(roundtrip("a<br/>b<img src=\"x.png\">"), "a<br>b<img src=\"x.png\">");
    }

    #[test]
    fn test_text_is_escaped() {
        assert_eq!(roundtrip("1 &lt; 2 &amp;&amp; 3 &gt; 2"), "1 &lt; 2 &amp;&amp; 3 &gt; 2");
    }

    #[test]
    fn test_nbsp_stays_visible() {
        assert_eq!(roundtrip("a&nbsp;b"), "a&nbsp;b");
    }

    #[test]
    fn test_attribute_quotes_escaped() {
        assert_eq!(
            roundtrip(r#"<span title='say "hi"'>x</span>"#),
            r#"<span title="say &quot;hi&quot;">x</span>"#
        );
    }

    #[test]
    fn test_style_content_is_raw() {
        assert_eq!(roundtrip("<style>a > b {}</style>"), "<style>a > b {}</style>");
    }

    #[test]
    fn test_outer_html() {
        let dom = Dom::parse_fragment("<b class=\"k\">x</b>");
        let b = dom.children(dom.root())[0];
        assert_eq!(outer_html(&dom, b), "<b class=\"k\">x</b>");
    }
}

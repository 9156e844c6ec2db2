//! # Formatting Rules
//!
//! User-defined regex rules applied in batch to a rich-text body. Each
//! top-level node of the fragment is tested against the active rules in
//! order; the first rule whose pattern matches the node's text rewrites it:
//!
//! - `multi-align-row` structure: the text is split into a three-column
//!   grid (left / center / right);
//! - `paragraph` scope: the whole node gets inline size, weight and
//!   alignment styles;
//! - `match` scope: every match is wrapped in a styled `<span>`.
//!
//! Patterns are case-insensitive. A pattern that fails to compile is
//! skipped; the rest of the batch still runs.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::html::{Dom, NodeId};
use crate::model::{CoverState, LayoutStyle};

/// Styles a rule applies.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormattingStyles {
    pub color: Option<String>,
    pub font_size: Option<f32>,
    pub is_bold: bool,
    pub is_italic: bool,
    pub text_align: Option<RuleAlign>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleAlign {
    Left,
    Center,
    Right,
    Justify,
}

impl RuleAlign {
    fn css(self) -> &'static str {
        match self {
            RuleAlign::Left => "left",
            RuleAlign::Center => "center",
            RuleAlign::Right => "right",
            RuleAlign::Justify => "justify",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleScope {
    #[default]
    Match,
    Paragraph,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuleStructure {
    #[serde(rename = "multi-align-row")]
    MultiAlignRow,
}

/// One user-defined rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformationRule {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub pattern: String,
    #[serde(default)]
    pub formatting: FormattingStyles,
    #[serde(default)]
    pub scope: RuleScope,
    #[serde(default)]
    pub structure: Option<RuleStructure>,
    /// Display hint for the column separator; splitting always uses the
    /// full separator set.
    #[serde(default)]
    pub separator: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

/// Separators accepted between the cells of a multi-align row.
const ROW_SEPARATORS: &[char] = &['|', '｜', '\t', ',', '，', '\u{2014}'];

/// Apply `rules` to every top-level node of `html`.
pub fn apply_rules(html: &str, rules: &[TransformationRule]) -> String {
    if html.is_empty() {
        return String::new();
    }
    let compiled = compile(rules);
    if compiled.is_empty() {
        return html.to_string();
    }

    let mut dom = Dom::parse_fragment(html);
    let root = dom.root();
    for node in dom.children(root).to_vec() {
        let text = dom.text_content(node);
        if text.trim().is_empty() {
            continue;
        }
        if let Some((rule, regex)) = compiled.iter().find(|(_, re)| re.is_match(&text)) {
            apply_rule(&mut dom, node, &text, rule, regex);
        }
    }
    dom.inner_html(root)
}

/// Run `rules` over both bodies the state's layout paints.
pub fn apply_rules_to_state(state: &mut CoverState, rules: &[TransformationRule]) {
    if state.layout_style == LayoutStyle::Duality {
        state.duality_body_text = apply_rules(&state.duality_body_text, rules);
        state.duality_secondary_body_text = apply_rules(&state.duality_secondary_body_text, rules);
    } else {
        state.body_text = apply_rules(&state.body_text, rules);
        state.secondary_body_text = apply_rules(&state.secondary_body_text, rules);
    }
}

fn compile(rules: &[TransformationRule]) -> Vec<(&TransformationRule, Regex)> {
    rules
        .iter()
        .filter(|r| r.is_active)
        .filter_map(|rule| {
            match RegexBuilder::new(&rule.pattern)
                .case_insensitive(true)
                .build()
            {
                Ok(regex) => Some((rule, regex)),
                Err(e) => {
                    debug!(rule = %rule.name, pattern = %rule.pattern, error = %e, "skipping invalid rule pattern");
                    None
                }
            }
        })
        .collect()
}

fn apply_rule(dom: &mut Dom, node: NodeId, text: &str, rule: &TransformationRule, regex: &Regex) {
    let fmt = &rule.formatting;
    if rule.structure == Some(RuleStructure::MultiAlignRow) {
        let parts: Vec<&str> = text
            .split(ROW_SEPARATORS)
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();
        if !parts.is_empty() {
            let row = build_row(dom, &parts, fmt);
            dom.insert_before(node, row);
            dom.detach(node);
            return;
        }
    }

    match rule.scope {
        RuleScope::Paragraph => {
            let target = if dom.is_element(node) {
                node
            } else {
                let div = dom.create_element("div");
                dom.insert_before(node, div);
                dom.append(div, node);
                div
            };
            let mut decls = Vec::new();
            if let Some(size) = fmt.font_size {
                decls.push(format!("font-size: {}px", size));
            }
            if fmt.is_bold {
                decls.push("font-weight: bold".to_string());
            }
            if fmt.is_italic {
                decls.push("font-style: italic".to_string());
            }
            if let Some(align) = fmt.text_align {
                decls.push(format!("text-align: {}", align.css()));
            }
            merge_style(dom, target, &decls);
        }
        RuleScope::Match => {
            let style = match_style(fmt);
            let texts: Vec<NodeId> = if dom.text(node).is_some() {
                vec![node]
            } else {
                dom.descendants(node)
                    .into_iter()
                    .filter(|&n| dom.text(n).is_some())
                    .collect()
            };
            for text_node in texts {
                wrap_matches(dom, text_node, regex, &style);
            }
        }
    }
}

fn build_row(dom: &mut Dom, parts: &[&str], fmt: &FormattingStyles) -> NodeId {
    let row = dom.create_element("div");
    dom.set_attr(row, "class", "multi-align-row");
    dom.set_attr(
        row,
        "style",
        "display: grid; grid-template-columns: 1fr 1fr 1fr; width: 100%;",
    );
    let (left, center, right) = match parts {
        [only] => (*only, "", ""),
        [left, right] => (*left, "", *right),
        [left, center, right, ..] => (*left, *center, *right),
        [] => ("", "", ""),
    };
    for (content, align) in [(left, "left"), (center, "center"), (right, "right")] {
        let col = dom.create_element("div");
        let mut style = format!("text-align: {};", align);
        if let Some(size) = fmt.font_size {
            style.push_str(&format!(" font-size: {}px;", size));
        }
        if fmt.is_bold {
            style.push_str(" font-weight: bold;");
        }
        dom.set_attr(col, "style", &style);
        let text = dom.create_text(if content.is_empty() { "\u{a0}" } else { content });
        dom.append(col, text);
        dom.append(row, col);
    }
    row
}

fn match_style(fmt: &FormattingStyles) -> String {
    let mut decls = Vec::new();
    if let Some(color) = &fmt.color {
        decls.push(format!("color:{}", color));
    }
    if let Some(size) = fmt.font_size {
        decls.push(format!("font-size:{}px", size));
    }
    if fmt.is_bold {
        decls.push("font-weight:bold".to_string());
    }
    if fmt.is_italic {
        decls.push("font-style:italic".to_string());
    }
    decls.join(";")
}

/// Split a text node around `regex` matches, wrapping each match in a span.
fn wrap_matches(dom: &mut Dom, text_node: NodeId, regex: &Regex, style: &str) {
    let Some(text) = dom.text(text_node).map(str::to_string) else {
        return;
    };
    let mut pieces: Vec<NodeId> = Vec::new();
    let mut last = 0;
    for m in regex.find_iter(&text) {
        if m.is_empty() {
            continue;
        }
        if m.start() > last {
            pieces.push(dom.create_text(&text[last..m.start()]));
        }
        let span = dom.create_element("span");
        dom.set_attr(span, "style", style);
        let inner = dom.create_text(m.as_str());
        dom.append(span, inner);
        pieces.push(span);
        last = m.end();
    }
    if pieces.is_empty() {
        return;
    }
    if last < text.len() {
        pieces.push(dom.create_text(&text[last..]));
    }
    for piece in pieces {
        dom.insert_before(text_node, piece);
    }
    dom.detach(text_node);
}

/// Append declarations to an element's inline style, replacing earlier
/// values of the same property.
fn merge_style(dom: &mut Dom, id: NodeId, decls: &[String]) {
    let existing = dom.attr(id, "style").unwrap_or("").to_string();
    let new_props: Vec<&str> = decls
        .iter()
        .filter_map(|d| d.split_once(':').map(|(p, _)| p.trim()))
        .collect();
    let mut kept: Vec<String> = existing
        .split(';')
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .filter(|d| {
            d.split_once(':')
                .map_or(true, |(p, _)| !new_props.contains(&p.trim()))
        })
        .map(str::to_string)
        .collect();
    kept.extend(decls.iter().cloned());
    let mut style = kept.join("; ");
    style.push(';');
    dom.set_attr(id, "style", &style);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(pattern: &str) -> TransformationRule {
        TransformationRule {
            id: "r".to_string(),
            name: pattern.to_string(),
            pattern: pattern.to_string(),
            formatting: FormattingStyles::default(),
            scope: RuleScope::Match,
            structure: None,
            separator: None,
            is_active: true,
        }
    }

    #[test]
    fn test_match_scope_wraps_matches() {
        let mut r = rule("cat");
        r.formatting.color = Some("#f00".to_string());
        r.formatting.is_bold = true;
        let out = apply_rules("the Cat and the cat", &[r]);
        assert_eq!(
            out,
            r#"the <span style="color:#f00;font-weight:bold">Cat</span> and the <span style="color:#f00;font-weight:bold">cat</span>"#
        );
    }

    #[test]
    fn test_match_scope_inside_element() {
        let mut r = rule("x");
        r.formatting.font_size = Some(18.0);
        let out = apply_rules("<b>axb</b>", &[r]);
        assert_eq!(out, r#"<b>a<span style="font-size:18px">x</span>b</b>"#);
    }

    #[test]
    fn test_paragraph_scope_wraps_text() {
        let mut r = rule("^第.章");
        r.scope = RuleScope::Paragraph;
        r.formatting.is_bold = true;
        r.formatting.text_align = Some(RuleAlign::Center);
        let out = apply_rules("第一章<div>正文</div>", &[r]);
        assert_eq!(
            out,
            r#"<div style="font-weight: bold; text-align: center;">第一章</div><div>正文</div>"#
        );
    }

    #[test]
    fn test_paragraph_scope_merges_existing_style() {
        let mut r = rule("title");
        r.scope = RuleScope::Paragraph;
        r.formatting.font_size = Some(20.0);
        let out = apply_rules(r#"<div style="color: red; font-size: 10px">Title</div>"#, &[r]);
        assert_eq!(
            out,
            r#"<div style="color: red; font-size: 20px;">Title</div>"#
        );
    }

    #[test]
    fn test_multi_align_row() {
        let mut r = rule("\\|");
        r.structure = Some(RuleStructure::MultiAlignRow);
        let out = apply_rules("<div>左 | 中 | 右</div>", &[r]);
        assert!(out.starts_with(r#"<div class="multi-align-row""#));
        assert!(out.contains(r#"<div style="text-align: left;">左</div>"#));
        assert!(out.contains(r#"<div style="text-align: center;">中</div>"#));
        assert!(out.contains(r#"<div style="text-align: right;">右</div>"#));
    }

    #[test]
    fn test_multi_align_row_two_parts() {
        let mut r = rule("，");
        r.structure = Some(RuleStructure::MultiAlignRow);
        let out = apply_rules("甲，乙", &[r]);
        assert!(out.contains(r#"<div style="text-align: left;">甲</div>"#));
        assert!(out.contains(r#"<div style="text-align: center;">&nbsp;</div>"#));
        assert!(out.contains(r#"<div style="text-align: right;">乙</div>"#));
    }

    #[test]
    fn test_invalid_pattern_skipped() {
        let broken = rule("(unclosed");
        let mut good = rule("ok");
        good.formatting.is_bold = true;
        let out = apply_rules("ok", &[broken, good]);
        assert_eq!(out, r#"<span style="font-weight:bold">ok</span>"#);
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let mut first = rule("a");
        first.formatting.color = Some("red".to_string());
        let mut second = rule("a");
        second.formatting.color = Some("blue".to_string());
        let out = apply_rules("a", &[first, second]);
        assert_eq!(out, r#"<span style="color:red">a</span>"#);
    }

    #[test]
    fn test_inactive_and_blank_nodes_ignored() {
        let mut r = rule("a");
        r.is_active = false;
        assert_eq!(apply_rules("a", &[r]), "a");
        assert_eq!(apply_rules("<br> ", &[rule("a")]), "<br> ");
    }

    #[test]
    fn test_rules_follow_layout() {
        let mut state = CoverState {
            layout_style: LayoutStyle::Duality,
            body_text: "a".to_string(),
            duality_body_text: "a".to_string(),
            ..Default::default()
        };
        apply_rules_to_state(&mut state, &[rule("a")]);
        assert_eq!(state.body_text, "a");
        assert!(state.duality_body_text.contains("<span"));
    }

    #[test]
    fn test_rule_json_shape() {
        let json = r#"{"id":"1","name":"n","pattern":"x","formatting":{"fontSize":14,"isBold":true},"scope":"paragraph","structure":"multi-align-row","isActive":true}"#;
        let r: TransformationRule = serde_json::from_str(json).unwrap();
        assert_eq!(r.scope, RuleScope::Paragraph);
        assert_eq!(r.structure, Some(RuleStructure::MultiAlignRow));
        assert_eq!(r.formatting.font_size, Some(14.0));
    }
}

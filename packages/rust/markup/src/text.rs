//! Markup-to-text exporter.
//!
//! Produces a plain-text document: a title with an `=` underline, then one
//! paragraph per top-level node. Warnings and important blocks are fenced by
//! [`IMPORTANT_OPEN`] / [`IMPORTANT_CLOSE`], diagrams by [`PICTURE_OPEN`] /
//! [`PICTURE_CLOSE`]. Nested flow content (paragraphs, lists, headings) is
//! linearized by [`inline_text`].

use tracing::{debug, instrument};

use crate::{is_important_block, normalize_block_id};
use crate::tree::{ATTR_BLOCK_ID, ATTR_LATEX, ATTR_TIKZ, Element, Fragment, Node, Tag};

pub const IMPORTANT_OPEN: &str = "<важное>";
pub const IMPORTANT_CLOSE: &str = "<конец важного>";
pub const PICTURE_OPEN: &str = "КАРТИНКА";
pub const PICTURE_CLOSE: &str = "КОНЕЦ КАРТИНКИ";

const DIVIDER_CHAR: char = '─';
const DIVIDER_WIDTH: usize = 50;

/// Parse markup and export it as plain text under `title`.
#[instrument(skip(markup), fields(input_len = markup.len()))]
pub fn export(markup: &str, title: &str) -> String {
    export_fragment(&crate::parse(markup), title)
}

/// Export an already-parsed fragment as plain text under `title`.
pub fn export_fragment(fragment: &Fragment, title: &str) -> String {
    let underline = "=".repeat(title.chars().count().max(1));
    let mut parts = vec![title.to_string(), underline];

    for node in &fragment.nodes {
        push_block(node, &mut parts);
    }

    let text = parts
        .into_iter()
        .filter(|p| !p.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");

    debug!(output_len = text.len(), "markup exported to text");
    text
}

// ---------------------------------------------------------------------------
// Top-level blocks
// ---------------------------------------------------------------------------

fn push_block(node: &Node, parts: &mut Vec<String>) {
    let el = match node {
        Node::Text(text) | Node::Raw(text) => {
            let text = text.trim();
            if !text.is_empty() {
                parts.push(text.to_string());
            }
            return;
        }
        Node::Comment(_) => return,
        Node::Element(el) => el,
    };

    match el.tag {
        Tag::WarningBlock => {
            let body = block_text(el);
            if !body.is_empty() {
                push_important(body, parts);
            }
        }
        Tag::CustomTextBlock => {
            let body = block_text(el);
            if body.is_empty() {
                return;
            }
            if is_important_block(normalize_block_id(el.attr_opt(ATTR_BLOCK_ID))) {
                push_important(body, parts);
            } else {
                parts.push(body);
            }
        }
        Tag::MathImageBlock => {
            parts.push(PICTURE_OPEN.to_string());
            parts.push(el.attr(ATTR_TIKZ).to_string());
            parts.push(PICTURE_CLOSE.to_string());
        }
        Tag::StepDivider => {
            let rule: String = std::iter::repeat_n(DIVIDER_CHAR, DIVIDER_WIDTH).collect();
            parts.push(format!("\n{rule}\n"));
        }
        Tag::MathBlock
        | Tag::TextBlock
        | Tag::Details
        | Tag::Heading(_)
        | Tag::Paragraph
        | Tag::LineBreak
        | Tag::ListItem
        | Tag::List
        | Tag::Other => {
            let body = block_text(el);
            if !body.is_empty() {
                parts.push(body);
            }
        }
    }
}

fn push_important(body: String, parts: &mut Vec<String>) {
    parts.push(IMPORTANT_OPEN.to_string());
    parts.push(body);
    parts.push(IMPORTANT_CLOSE.to_string());
}

/// Inline rendering of an element's children, trimmed.
fn block_text(el: &Element) -> String {
    children_text(el).trim().to_string()
}

// ---------------------------------------------------------------------------
// Inline rendering
// ---------------------------------------------------------------------------

fn children_text(el: &Element) -> String {
    el.children.iter().map(inline_text).collect()
}

/// Linearize a node and its descendants.
pub fn inline_text(node: &Node) -> String {
    let el = match node {
        Node::Text(text) | Node::Raw(text) => return text.clone(),
        Node::Comment(_) => return String::new(),
        Node::Element(el) => el,
    };

    match el.tag {
        Tag::MathBlock => format!("${}$", el.attr(ATTR_LATEX)),
        Tag::MathImageBlock => {
            format!("\n{PICTURE_OPEN}\n{}\n{PICTURE_CLOSE}\n", el.attr(ATTR_TIKZ))
        }
        Tag::LineBreak => "\n".to_string(),
        Tag::Paragraph => format!("{}\n", children_text(el).trim()),
        Tag::Heading(_) => format!("\n{}\n", children_text(el).trim()),
        Tag::ListItem => format!("• {}\n", children_text(el).trim()),
        Tag::List => format!("\n{}\n", children_text(el)),
        Tag::WarningBlock
        | Tag::CustomTextBlock
        | Tag::TextBlock
        | Tag::StepDivider
        | Tag::Details
        | Tag::Other => children_text(el),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str) -> Vec<&str> {
        text.lines().collect()
    }

    #[test]
    fn header_is_title_and_matching_underline() {
        let text = export("<p>Тело</p>", "Дроби");
        assert!(text.starts_with("Дроби\n\n=====\n\n"), "got: {text:?}");
        assert!(text.ends_with("Тело"));
    }

    #[test]
    fn empty_title_still_gets_one_underline_char() {
        assert_eq!(export("", ""), "=");
    }

    #[test]
    fn empty_content_yields_header_only() {
        assert_eq!(export("", "Углы"), "Углы\n\n====");
        assert_eq!(export("   \n  ", "Углы"), "Углы\n\n====");
    }

    #[test]
    fn important_custom_block_is_fenced() {
        let text = export(
            r#"<custom-text-block data-block-id="17">Solve for x</custom-text-block>"#,
            "T",
        );
        let l = lines(&text);
        let open = l.iter().position(|s| *s == IMPORTANT_OPEN).expect("open marker");
        let body = l.iter().position(|s| *s == "Solve for x").expect("body");
        let close = l.iter().position(|s| *s == IMPORTANT_CLOSE).expect("close marker");
        assert!(open < body && body < close);
    }

    #[test]
    fn padded_block_id_is_still_important() {
        let text = export(
            r#"<custom-text-block data-block-id=" 17 ">Solve for x</custom-text-block>"#,
            "T",
        );
        assert_eq!(text, "T\n\n=\n\n<важное>\n\nSolve for x\n\n<конец важного>");
    }

    #[test]
    fn ordinary_custom_block_is_not_fenced() {
        let text = export(
            r#"<custom-text-block data-block-id="99">Solve for x</custom-text-block>"#,
            "T",
        );
        assert!(text.contains("Solve for x"));
        assert!(!text.contains(IMPORTANT_OPEN));
        assert!(!text.contains(IMPORTANT_CLOSE));
    }

    #[test]
    fn empty_blocks_are_dropped() {
        let text = export(
            r#"<warning-block>  </warning-block><custom-text-block data-block-id="14"></custom-text-block>"#,
            "T",
        );
        assert_eq!(text, "T\n\n=");
    }

    #[test]
    fn warning_block_is_fenced() {
        let text = export("<warning-block><p>Не делите на ноль</p></warning-block>", "T");
        assert_eq!(
            text,
            "T\n\n=\n\n<важное>\n\nНе делите на ноль\n\n<конец важного>"
        );
    }

    #[test]
    fn top_level_diagram_is_three_paragraphs() {
        let text = export(
            r#"<math-image-block data-tikz="\draw (0,0) -- (1,0);"></math-image-block>"#,
            "T",
        );
        assert_eq!(
            text,
            "T\n\n=\n\nКАРТИНКА\n\n\\draw (0,0) -- (1,0);\n\nКОНЕЦ КАРТИНКИ"
        );
    }

    #[test]
    fn nested_diagram_keeps_source_between_markers() {
        let text = export(
            r#"<text-block>До<math-image-block data-tikz="a<b"></math-image-block>После</text-block>"#,
            "T",
        );
        assert!(text.contains("До\nКАРТИНКА\na<b\nКОНЕЦ КАРТИНКИ\nПосле"), "got: {text:?}");
    }

    #[test]
    fn step_divider_is_a_rule() {
        let text = export("<p>1</p><step-divider></step-divider><p>2</p>", "T");
        let rule = "─".repeat(50);
        assert!(text.contains(&format!("1\n\n\n{rule}\n\n\n2")), "got: {text:?}");
    }

    #[test]
    fn inline_math_uses_dollar_delimiters() {
        let text = export(
            r#"<p>Если <math-block data-latex="x^2=4"></math-block>, то</p>"#,
            "T",
        );
        assert!(text.ends_with("Если $x^2=4$, то"));
    }

    #[test]
    fn lists_headings_and_breaks_are_linearized() {
        let text = export(
            "<div><h2> Свойства </h2><ul><li> первое </li><li>второе</li></ul><p>a<br>b</p></div>",
            "T",
        );
        assert!(text.ends_with("Свойства\n\n• первое\n• второе\n\na\nb"), "got: {text:?}");
    }

    #[test]
    fn top_level_text_is_trimmed() {
        let text = export("  свободный текст  <p>абзац</p>", "T");
        assert_eq!(text, "T\n\n=\n\nсвободный текст\n\nабзац");
    }

    #[test]
    fn unknown_elements_flatten_to_text() {
        let text = export("<section><span>a</span><em>b</em><!-- c --></section>", "T");
        assert!(text.ends_with("ab"));
    }
}

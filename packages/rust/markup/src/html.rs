//! Markup-to-HTML transformer.
//!
//! Rewrites the dialect's custom tags into plain HTML with CSS classes, then
//! serializes the result. TikZ sources are emitted as [`Node::Raw`] inside a
//! `<script type="text/tikz">` container, so they reach the diagram renderer
//! byte-for-byte while ordinary text stays escaped.

use tracing::{debug, instrument};

use crate::tree::{ATTR_BLOCK_ID, ATTR_LATEX, ATTR_TIKZ, Element, Fragment, Node, Tag};
use crate::{NEUTRAL_BLOCK_ID, STYLED_BLOCK_IDS, normalize_block_id};

/// Class fragment marking editor-only heading styles.
const ADMIN_CLASS_MARKER: &str = "admin-styles";

/// MIME type the diagram renderer scans the DOM for.
pub const TIKZ_SCRIPT_TYPE: &str = "text/tikz";

/// Parse and transform markup into embeddable HTML.
#[instrument(skip_all, fields(input_len = markup.len()))]
pub fn transform(markup: &str) -> String {
    transform_fragment(&crate::parse(markup))
}

/// Transform an already-parsed fragment into embeddable HTML.
pub fn transform_fragment(fragment: &Fragment) -> String {
    let custom = fragment.elements().filter(|el| el.tag.is_custom()).count();
    let rewritten: Vec<Node> = fragment.nodes.iter().map(rewrite_node).collect();

    let mut out = String::new();
    write_nodes(&rewritten, false, &mut out);

    debug!(custom, output_len = out.len(), "markup transformed to HTML");
    out
}

// ---------------------------------------------------------------------------
// Structural rewrite
// ---------------------------------------------------------------------------

fn rewrite_node(node: &Node) -> Node {
    match node {
        Node::Element(el) => rewrite_element(el),
        other => other.clone(),
    }
}

fn rewrite_children(el: &Element) -> Vec<Node> {
    el.children.iter().map(rewrite_node).collect()
}

fn rewrite_element(el: &Element) -> Node {
    match el.tag {
        Tag::MathBlock => {
            let formula = format!("\\({}\\)", el.attr(ATTR_LATEX));
            element("span", &[("class", "math-inline")], vec![Node::Text(formula)])
        }
        Tag::MathImageBlock => {
            let payload = Node::Raw(format!("\n{}\n", el.attr(ATTR_TIKZ)));
            let script = element("script", &[("type", TIKZ_SCRIPT_TYPE)], vec![payload]);
            element("div", &[("class", "tikz-wrap")], vec![script])
        }
        Tag::WarningBlock => element("div", &[("class", "warning-block")], rewrite_children(el)),
        Tag::CustomTextBlock => {
            let class = format!("cblock bid-{}", block_style(el.attr_opt(ATTR_BLOCK_ID)));
            element("div", &[("class", class.as_str())], rewrite_children(el))
        }
        Tag::TextBlock => element("div", &[("class", "text-block")], rewrite_children(el)),
        Tag::StepDivider => element("hr", &[("class", "step-divider")], Vec::new()),
        Tag::Details => {
            let mut details = passthrough(el);
            details.set_attr("open", "");
            Node::Element(details)
        }
        Tag::Heading(_) => {
            let mut heading = passthrough(el);
            strip_admin_classes(&mut heading);
            Node::Element(heading)
        }
        Tag::Paragraph | Tag::LineBreak | Tag::ListItem | Tag::List | Tag::Other => {
            Node::Element(passthrough(el))
        }
    }
}

/// Keeps name and attributes; rewrites the children.
fn passthrough(el: &Element) -> Element {
    Element::new(el.name.clone(), el.attrs.clone(), rewrite_children(el))
}

fn element(name: &str, attrs: &[(&str, &str)], children: Vec<Node>) -> Node {
    let attrs = attrs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Node::Element(Element::new(name, attrs, children))
}

/// Style token for a `custom-text-block`.
fn block_style(block_id: Option<&str>) -> &str {
    let id = normalize_block_id(block_id);
    if STYLED_BLOCK_IDS.contains(&id) {
        id
    } else {
        NEUTRAL_BLOCK_ID
    }
}

fn strip_admin_classes(heading: &mut Element) {
    let Some(class) = heading.attr_opt("class") else {
        return;
    };

    let kept = class
        .split_whitespace()
        .filter(|c| !c.contains(ADMIN_CLASS_MARKER))
        .collect::<Vec<_>>()
        .join(" ");

    if kept.is_empty() {
        heading.remove_attr("class");
    } else {
        heading.set_attr("class", kept);
    }
}

// ---------------------------------------------------------------------------
// Serialization
// ---------------------------------------------------------------------------

fn write_nodes(nodes: &[Node], raw_text: bool, out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) if raw_text => out.push_str(text),
            Node::Text(text) => escape_text(text, out),
            Node::Raw(raw) => out.push_str(raw),
            Node::Comment(comment) => {
                out.push_str("<!--");
                out.push_str(comment);
                out.push_str("-->");
            }
            Node::Element(el) => write_element(el, out),
        }
    }
}

fn write_element(el: &Element, out: &mut String) {
    out.push('<');
    out.push_str(&el.name);
    for (name, value) in &el.attrs {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        escape_attr(value, out);
        out.push('"');
    }

    if is_void_element(&el.name) {
        out.push_str("/>");
        return;
    }
    out.push('>');

    // The parser drops one newline right after these start tags.
    if drops_leading_newline(&el.name)
        && matches!(el.children.first(), Some(Node::Text(text)) if text.starts_with('\n'))
    {
        out.push('\n');
    }

    write_nodes(&el.children, is_raw_text_element(&el.name), out);

    out.push_str("</");
    out.push_str(&el.name);
    out.push('>');
}

fn escape_text(s: &str, out: &mut String) {
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}

fn escape_attr(s: &str, out: &mut String) {
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}

/// Elements whose text content the HTML parser reads verbatim. `noscript`
/// belongs here because the parser runs with scripting enabled.
fn is_raw_text_element(tag: &str) -> bool {
    matches!(
        tag,
        "script" | "style" | "xmp" | "iframe" | "noembed" | "noframes" | "plaintext" | "noscript"
    )
}

fn drops_leading_newline(tag: &str) -> bool {
    matches!(tag, "pre" | "textarea" | "listing")
}

fn is_void_element(tag: &str) -> bool {
    matches!(
        tag,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn math_block_becomes_inline_span() {
        let html = transform(r#"<p>Корень: <math-block data-latex="\sqrt{x}"></math-block></p>"#);
        assert_eq!(
            html,
            r#"<p>Корень: <span class="math-inline">\(\sqrt{x}\)</span></p>"#
        );
    }

    #[test]
    fn math_block_latex_is_escaped_as_text() {
        let html = transform(r#"<math-block data-latex="a<b &amp; c"></math-block>"#);
        assert_eq!(html, r#"<span class="math-inline">\(a&lt;b &amp; c\)</span>"#);
    }

    #[test]
    fn tikz_payload_is_emitted_verbatim() {
        let tikz = r"\draw (0,0) -- (1,1) node {$a<b$ & c};";
        let markup = format!(
            r#"<math-image-block data-tikz="{}"></math-image-block><p>a &lt; b &amp; c</p>"#,
            tikz.replace('&', "&amp;").replace('<', "&lt;")
        );
        let html = transform(&markup);

        let expected_block = format!(
            "<div class=\"tikz-wrap\"><script type=\"text/tikz\">\n{tikz}\n</script></div>"
        );
        assert!(html.starts_with(&expected_block), "got: {html}");
        assert!(html.ends_with("<p>a &lt; b &amp; c</p>"), "got: {html}");
    }

    #[test]
    fn multiple_diagrams_keep_their_own_sources() {
        let html = transform(
            r#"<math-image-block data-tikz="\draw A;"></math-image-block><math-image-block data-tikz="\draw B;"></math-image-block>"#,
        );
        let a = html.find("\\draw A;").expect("first diagram");
        let b = html.find("\\draw B;").expect("second diagram");
        assert!(a < b);
        assert_eq!(html.matches("tikz-wrap").count(), 2);
    }

    #[test]
    fn warning_and_text_blocks_become_divs() {
        let html = transform(
            "<warning-block><p>Внимание</p></warning-block><text-block>Текст</text-block>",
        );
        assert_eq!(
            html,
            r#"<div class="warning-block"><p>Внимание</p></div><div class="text-block">Текст</div>"#
        );
    }

    #[test]
    fn custom_text_block_class_follows_block_id() {
        let html = transform(r#"<custom-text-block data-block-id="17">Важно</custom-text-block>"#);
        assert_eq!(html, r#"<div class="cblock bid-17">Важно</div>"#);

        let html = transform(r#"<custom-text-block data-block-id="99">x</custom-text-block>"#);
        assert_eq!(html, r#"<div class="cblock bid-x">x</div>"#);

        let html = transform("<custom-text-block>x</custom-text-block>");
        assert_eq!(html, r#"<div class="cblock bid-x">x</div>"#);
    }

    #[test]
    fn step_divider_becomes_rule() {
        let html = transform("<p>1</p><step-divider></step-divider><p>2</p>");
        assert_eq!(html, r#"<p>1</p><hr class="step-divider"/><p>2</p>"#);
    }

    #[test]
    fn details_are_forced_open() {
        let html = transform("<details><summary>Решение</summary>x = 2</details>");
        assert_eq!(
            html,
            r#"<details open=""><summary>Решение</summary>x = 2</details>"#
        );
    }

    #[test]
    fn heading_admin_classes_are_stripped() {
        let html = transform(r#"<h2 class="admin-styles-h2 title">Тема</h2>"#);
        assert_eq!(html, r#"<h2 class="title">Тема</h2>"#);

        let html = transform(r#"<h3 class="admin-styles">Тема</h3>"#);
        assert_eq!(html, "<h3>Тема</h3>");

        let html = transform(r#"<h5 class="admin-styles">Тема</h5>"#);
        assert_eq!(html, r#"<h5 class="admin-styles">Тема</h5>"#);
    }

    #[test]
    fn nested_custom_tags_are_rewritten() {
        let html = transform(
            r#"<warning-block><custom-text-block data-block-id="14"><math-block data-latex="x"></math-block></custom-text-block></warning-block>"#,
        );
        assert_eq!(
            html,
            r#"<div class="warning-block"><div class="cblock bid-14"><span class="math-inline">\(x\)</span></div></div>"#
        );
    }

    #[test]
    fn no_custom_tag_survives() {
        let markup = concat!(
            r#"<h1 class="admin-styles">Заголовок</h1>"#,
            r#"<text-block><math-block data-latex="1"></math-block></text-block>"#,
            r#"<custom-text-block data-block-id="18">a</custom-text-block>"#,
            r#"<warning-block>b</warning-block><step-divider/>"#,
            r#"<math-image-block data-tikz="\draw;"/>"#,
        );
        let html = transform(markup);
        for tag in [
            "<math-block",
            "<math-image-block",
            "<warning-block",
            "<custom-text-block",
            "<text-block",
            "<step-divider",
        ] {
            assert!(!html.contains(tag), "{tag} left in {html}");
        }
    }

    #[test]
    fn transform_is_idempotent_on_its_output() {
        let markup = concat!(
            r#"<h2 class="admin-styles x">T</h2>"#,
            r#"<p>1 &lt; 2 <math-block data-latex="a&lt;b"></math-block></p>"#,
            r#"<math-image-block data-tikz="\node at (0,0) {$x<y$};"></math-image-block>"#,
            r#"<details><summary>s</summary><ul><li>i</li></ul></details>"#,
            r#"<step-divider></step-divider><p>a<br>b</p>"#,
            "<pre>\n\nx</pre><textarea>\nt</textarea>",
        );
        let once = transform(markup);
        let twice = transform(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn leading_newline_in_pre_survives() {
        let once = transform("<pre>\n\nx</pre>");
        assert_eq!(once, "<pre>\n\nx</pre>");
        assert_eq!(transform(&once), once);
        assert_eq!(transform("<pre>x</pre>"), "<pre>x</pre>");
    }

    #[test]
    fn raw_text_elements_pass_through_unescaped() {
        let html = transform("<noscript><p>x</p></noscript><xmp>a < b</xmp>");
        assert_eq!(html, "<noscript><p>x</p></noscript><xmp>a < b</xmp>");
        assert_eq!(transform(&html), html);
    }

    #[test]
    fn block_id_whitespace_is_ignored() {
        let html = transform(r#"<custom-text-block data-block-id=" 17 ">a</custom-text-block>"#);
        assert_eq!(html, r#"<div class="cblock bid-17">a</div>"#);
    }

    #[test]
    fn unknown_tags_and_comments_pass_through() {
        let html = transform(r#"<p><mark style="color:red">m</mark><!-- note --></p>"#);
        assert_eq!(html, r#"<p><mark style="color:red">m</mark><!-- note --></p>"#);
    }

    #[test]
    fn empty_markup_yields_empty_html() {
        assert_eq!(transform(""), "");
    }
}

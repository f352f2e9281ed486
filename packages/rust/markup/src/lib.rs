//! Parsing and conversion of the theory markup dialect.
//!
//! Theory items are written in an HTML-like dialect with a handful of custom
//! tags (`math-block`, `math-image-block`, `warning-block`,
//! `custom-text-block`, `text-block`, `step-divider`). This crate parses that
//! markup with `scraper` into an owned [`Fragment`], then either:
//! - rewrites it into browser-ready HTML ([`html::transform`]), or
//! - linearizes it into a plain-text export ([`text::export`]).
//!
//! Both conversions are pure: the input tree is never mutated.

pub mod html;
pub mod text;
mod tree;

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html};
use tracing::trace;

pub use tree::{ATTR_BLOCK_ID, ATTR_LATEX, ATTR_TIKZ, Element, Fragment, Node, Tag};

/// Block ids exported between importance markers.
pub const IMPORTANT_BLOCK_IDS: [&str; 4] = ["14", "17", "18", "20"];

/// Block ids with a dedicated style class; any other id gets [`NEUTRAL_BLOCK_ID`].
pub const STYLED_BLOCK_IDS: [&str; 6] = ["14", "15", "17", "18", "19", "20"];

/// Block id used for missing or unknown `data-block-id` values.
pub const NEUTRAL_BLOCK_ID: &str = "x";

/// Trimmed `data-block-id`, or [`NEUTRAL_BLOCK_ID`] when missing or blank.
pub fn normalize_block_id(raw: Option<&str>) -> &str {
    raw.map(str::trim)
        .filter(|id| !id.is_empty())
        .unwrap_or(NEUTRAL_BLOCK_ID)
}

/// Whether a `custom-text-block` with this id is an important block.
pub fn is_important_block(block_id: &str) -> bool {
    IMPORTANT_BLOCK_IDS.contains(&block_id.trim())
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse markup into an owned fragment.
///
/// Parsing never fails: malformed markup goes through the HTML5 parser's
/// error recovery. Attribute names come back lowercased.
pub fn parse(markup: &str) -> Fragment {
    let markup = expand_self_closing(markup);
    let doc = Html::parse_fragment(&markup);

    // `parse_fragment` wraps the nodes in a synthetic <html> element.
    let nodes = convert_children(doc.root_element());
    trace!(top_level = nodes.len(), "markup parsed");

    Fragment { nodes }
}

/// Rewrite `<step-divider/>`-style custom tags into explicit open/close pairs.
///
/// The HTML5 parser ignores the self-closing flag on non-void elements, which
/// would otherwise swallow every following sibling into the custom tag. The
/// pattern matches whole tags (quoted attribute values included) and comments,
/// so a `/>` inside an attribute value or a comment is never touched.
fn expand_self_closing(markup: &str) -> String {
    static TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(
            r#"(?s)<!--.*?-->|<([a-zA-Z][a-zA-Z0-9-]*)((?:\s+[^\s"'>/=]+(?:\s*=\s*(?:"[^"]*"|'[^']*'|[^\s"'>]+))?)*)\s*(/?)>"#,
        )
        .expect("valid regex")
    });

    TAG_RE
        .replace_all(markup, |caps: &regex::Captures<'_>| {
            let name = caps.get(1).map_or("", |m| m.as_str());
            let self_closing = caps.get(3).is_some_and(|m| m.as_str() == "/");
            if self_closing && Tag::from_name(&name.to_ascii_lowercase()).is_custom() {
                format!("<{name}{}></{name}>", &caps[2])
            } else {
                caps[0].to_string()
            }
        })
        .into_owned()
}

fn convert_children(parent: ElementRef<'_>) -> Vec<Node> {
    parent
        .children()
        .filter_map(|child| match child.value() {
            scraper::Node::Text(text) => Some(Node::Text(text.to_string())),
            scraper::Node::Comment(comment) => Some(Node::Comment(comment.to_string())),
            scraper::Node::Element(_) => ElementRef::wrap(child).map(convert_element),
            _ => None,
        })
        .collect()
}

fn convert_element(el: ElementRef<'_>) -> Node {
    let value = el.value();
    let attrs = value
        .attrs()
        .map(|(name, val)| (name.to_string(), val.to_string()))
        .collect();

    Node::Element(Element::new(value.name(), attrs, convert_children(el)))
}

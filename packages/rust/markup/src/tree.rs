//! Owned markup tree.
//!
//! The parser copies the scraper DOM into these types so that each request
//! works on its own tree. Element kinds are resolved once, at construction,
//! into the closed [`Tag`] enumeration that the HTML transformer and the text
//! exporter both dispatch on.

/// Attribute carrying the LaTeX source of a `math-block`.
pub const ATTR_LATEX: &str = "data-latex";
/// Attribute carrying the TikZ source of a `math-image-block`.
pub const ATTR_TIKZ: &str = "data-tikz";
/// Attribute carrying the style token of a `custom-text-block`.
pub const ATTR_BLOCK_ID: &str = "data-block-id";

/// Element kinds the pipeline distinguishes. Everything else is [`Tag::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    /// `math-block`: inline formula.
    MathBlock,
    /// `math-image-block`: TikZ diagram.
    MathImageBlock,
    /// `warning-block`: callout.
    WarningBlock,
    /// `custom-text-block`: styled block keyed by `data-block-id`.
    CustomTextBlock,
    /// `text-block`: generic styled wrapper.
    TextBlock,
    /// `step-divider`: separator.
    StepDivider,
    /// `details`: collapsible section.
    Details,
    /// `h1`..`h4`.
    Heading(u8),
    Paragraph,
    LineBreak,
    ListItem,
    /// `ul` or `ol`.
    List,
    Other,
}

impl Tag {
    /// Classify a lowercase element name.
    pub fn from_name(name: &str) -> Self {
        match name {
            "math-block" => Self::MathBlock,
            "math-image-block" => Self::MathImageBlock,
            "warning-block" => Self::WarningBlock,
            "custom-text-block" => Self::CustomTextBlock,
            "text-block" => Self::TextBlock,
            "step-divider" => Self::StepDivider,
            "details" => Self::Details,
            "h1" => Self::Heading(1),
            "h2" => Self::Heading(2),
            "h3" => Self::Heading(3),
            "h4" => Self::Heading(4),
            "p" => Self::Paragraph,
            "br" => Self::LineBreak,
            "li" => Self::ListItem,
            "ul" | "ol" => Self::List,
            _ => Self::Other,
        }
    }

    /// Whether this is one of the dialect's own tags (never valid in output HTML).
    pub fn is_custom(self) -> bool {
        matches!(
            self,
            Self::MathBlock
                | Self::MathImageBlock
                | Self::WarningBlock
                | Self::CustomTextBlock
                | Self::TextBlock
                | Self::StepDivider
        )
    }
}

/// A node of the markup tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Decoded text; escaped on serialization.
    Text(String),
    /// Pre-formatted payload written verbatim on serialization.
    ///
    /// Never produced by the parser, only by the HTML rewrite.
    Raw(String),
    Comment(String),
    Element(Element),
}

impl Node {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Self::Element(el) => Some(el),
            _ => None,
        }
    }
}

/// An element with ordered attributes and children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Lowercase local name, as written on serialization.
    pub name: String,
    /// Kind resolved from `name`.
    pub tag: Tag,
    /// Attributes, sorted by name.
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(
        name: impl Into<String>,
        mut attrs: Vec<(String, String)>,
        children: Vec<Node>,
    ) -> Self {
        let name = name.into();
        attrs.sort();
        Self {
            tag: Tag::from_name(&name),
            name,
            attrs,
            children,
        }
    }

    /// Attribute value, or `""` when absent.
    pub fn attr(&self, name: &str) -> &str {
        self.attr_opt(name).unwrap_or("")
    }

    pub fn attr_opt(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Insert or overwrite an attribute, keeping the list sorted.
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attrs.binary_search_by(|(k, _)| k.as_str().cmp(name)) {
            Ok(idx) => self.attrs[idx].1 = value,
            Err(idx) => self.attrs.insert(idx, (name.to_string(), value)),
        }
    }

    pub fn remove_attr(&mut self, name: &str) {
        self.attrs.retain(|(k, _)| k != name);
    }
}

/// Top-level node sequence of one content item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragment {
    pub nodes: Vec<Node>,
}

impl Fragment {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Depth-first walk over every element.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        let mut stack: Vec<&Node> = self.nodes.iter().rev().collect();
        std::iter::from_fn(move || {
            while let Some(node) = stack.pop() {
                if let Node::Element(el) = node {
                    stack.extend(el.children.iter().rev());
                    return Some(el);
                }
            }
            None
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_classification() {
        assert_eq!(Tag::from_name("math-block"), Tag::MathBlock);
        assert_eq!(Tag::from_name("h3"), Tag::Heading(3));
        assert_eq!(Tag::from_name("h5"), Tag::Other);
        assert_eq!(Tag::from_name("ol"), Tag::List);
        assert!(Tag::StepDivider.is_custom());
        assert!(!Tag::Details.is_custom());
    }

    #[test]
    fn attributes_default_to_empty() {
        let el = Element::new("math-block", vec![], vec![]);
        assert_eq!(el.attr(ATTR_LATEX), "");
        assert_eq!(el.attr_opt(ATTR_LATEX), None);
    }

    #[test]
    fn set_attr_keeps_sorted_order() {
        let mut el = Element::new(
            "details",
            vec![("id".into(), "a".into()), ("class".into(), "x".into())],
            vec![],
        );
        el.set_attr("open", "");
        el.set_attr("class", "y");
        let names: Vec<&str> = el.attrs.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(names, ["class", "id", "open"]);
        assert_eq!(el.attr("class"), "y");
    }

    #[test]
    fn elements_walks_depth_first() {
        let inner = Element::new("b", vec![], vec![Node::text("x")]);
        let outer = Element::new("p", vec![], vec![Node::Element(inner)]);
        let fragment = Fragment {
            nodes: vec![
                Node::Element(outer),
                Node::text("tail"),
                Node::Element(Element::new("hr", vec![], vec![])),
            ],
        };
        let names: Vec<&str> = fragment.elements().map(|el| el.name.as_str()).collect();
        assert_eq!(names, ["p", "b", "hr"]);
    }
}

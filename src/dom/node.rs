//! Node payload definitions.
//!
//! The `NodeKind` enum carries the payload for each node type. Navigation
//! links (parent, children, siblings, element siblings) are stored in
//! `NodeData`, not here.

use std::cell::OnceCell;

use crate::parse::Tag;

/// DOM node type codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum NodeType {
    Element = 1,
    Attribute = 2,
    Text = 3,
    Comment = 8,
    Document = 9,
}

impl NodeType {
    /// The numeric DOM code (`ELEMENT_NODE == 1`, ...).
    #[must_use]
    pub fn code(self) -> u16 {
        self as u16
    }
}

/// The kind of a node and its associated data.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// The document node; there is exactly one per `Document`.
    Document,
    /// An element node.
    Element(ElementData),
    /// A text node.
    Text(TextData),
    /// A comment node, holding its content.
    Comment(String),
}

impl NodeKind {
    /// The DOM node type of this payload.
    #[must_use]
    pub fn node_type(&self) -> NodeType {
        match self {
            Self::Document => NodeType::Document,
            Self::Element(_) => NodeType::Element,
            Self::Text(_) => NodeType::Text,
            Self::Comment(_) => NodeType::Comment,
        }
    }

    /// Returns `true` for element nodes.
    #[must_use]
    pub fn is_element(&self) -> bool {
        matches!(self, Self::Element(_))
    }

    /// Returns `true` for the kinds that can hold children: the document
    /// and elements.
    #[must_use]
    pub fn can_have_children(&self) -> bool {
        matches!(self, Self::Document | Self::Element(_))
    }
}

/// An attribute on an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

/// Element payload.
///
/// The tag name is kept in both forms: `tag_name` uppercase (what
/// `Element.tagName` reports for HTML) and `local_name` lowercase.
#[derive(Debug, Clone)]
pub struct ElementData {
    pub tag_name: String,
    pub local_name: String,
    pub tag: Tag,
    pub attributes: Vec<Attribute>,
}

impl ElementData {
    /// Creates element data for `name`, normalizing its case.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            tag_name: name.to_ascii_uppercase(),
            local_name: name.to_ascii_lowercase(),
            tag: Tag::lookup(name),
            attributes: Vec::new(),
        }
    }

    /// Returns the value of the attribute `name`.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Sets `name` to `value`, overwriting an existing attribute of the same
    /// name in place.
    pub fn set_attribute(&mut self, name: &str, value: &str) {
        match self.attributes.iter_mut().find(|a| a.name == name) {
            Some(attr) => value.clone_into(&mut attr.value),
            None => self.attributes.push(Attribute {
                name: name.to_string(),
                value: value.to_string(),
            }),
        }
    }

    /// Removes the attribute `name`, returning its value.
    pub fn remove_attribute(&mut self, name: &str) -> Option<String> {
        let index = self.attributes.iter().position(|a| a.name == name)?;
        Some(self.attributes.remove(index).value)
    }
}

/// Text payload with two cells: plain text and markup.
///
/// Each cell holds either a value that was set explicitly or a cache
/// derived from the other cell. At least one cell is always filled. Setting
/// one cell empties the other; reading an empty cell derives and caches it:
/// plain text is escaped to produce markup, and markup is reparsed as a
/// `body` fragment to recover plain text.
#[derive(Debug, Clone)]
pub struct TextData {
    text: OnceCell<String>,
    markup: OnceCell<String>,
}

impl TextData {
    /// Creates a text payload from plain text.
    #[must_use]
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: OnceCell::from(text.into()),
            markup: OnceCell::new(),
        }
    }

    /// Creates a text payload from markup only.
    #[must_use]
    pub fn from_markup(markup: impl Into<String>) -> Self {
        Self {
            text: OnceCell::new(),
            markup: OnceCell::from(markup.into()),
        }
    }

    /// Creates a text payload with both views known, as parsed text and its
    /// source span.
    #[must_use]
    pub fn from_parts(text: impl Into<String>, markup: impl Into<String>) -> Self {
        Self {
            text: OnceCell::from(text.into()),
            markup: OnceCell::from(markup.into()),
        }
    }

    /// The plain-text view.
    pub fn text(&self) -> &str {
        self.text.get_or_init(|| match self.markup.get() {
            Some(markup) => super::serialize::plain_text_from_markup(markup),
            None => String::new(),
        })
    }

    /// The markup view.
    pub fn markup(&self) -> &str {
        self.markup.get_or_init(|| match self.text.get() {
            Some(text) => super::serialize::escape_html(text),
            None => String::new(),
        })
    }

    /// Replaces the plain text and drops the markup view.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = OnceCell::from(text.into());
        self.markup = OnceCell::new();
    }

    /// Replaces the markup and drops the plain-text view.
    pub fn set_markup(&mut self, markup: impl Into<String>) {
        self.markup = OnceCell::from(markup.into());
        self.text = OnceCell::new();
    }

    /// Appends to both views. A view that was not materialized yet is
    /// derived first so the two stay in step.
    pub fn append(&mut self, text: &str, markup: &str) {
        self.text();
        self.markup();
        if let Some(cell) = self.text.get_mut() {
            cell.push_str(text);
        }
        if let Some(cell) = self.markup.get_mut() {
            cell.push_str(markup);
        }
    }

    /// Returns `true` if the plain-text view is currently filled.
    #[must_use]
    pub fn has_text(&self) -> bool {
        self.text.get().is_some()
    }

    /// Returns `true` if the markup view is currently filled.
    #[must_use]
    pub fn has_markup(&self) -> bool {
        self.markup.get().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_case_forms() {
        let data = ElementData::new("Svg");
        assert_eq!(data.tag_name, "SVG");
        assert_eq!(data.local_name, "svg");
        assert_eq!(data.tag, Tag::Known("svg"));
        assert_eq!(ElementData::new("clippath").tag, Tag::Unknown);
    }

    #[test]
    fn test_set_attribute_overwrites_in_place() {
        let mut data = ElementData::new("a");
        data.set_attribute("href", "#");
        data.set_attribute("class", "x");
        data.set_attribute("href", "/next");
        assert_eq!(data.attributes.len(), 2);
        assert_eq!(data.attributes[0].name, "href");
        assert_eq!(data.attribute("href"), Some("/next"));
        assert_eq!(data.remove_attribute("href"), Some("/next".to_string()));
        assert_eq!(data.remove_attribute("href"), None);
    }

    #[test]
    fn test_text_escapes_lazily() {
        let text = TextData::from_text("a < b & \"c\" 'd'");
        assert!(!text.has_markup());
        assert_eq!(text.markup(), "a &lt; b &amp; &quot;c&quot; 'd'");
        assert!(text.has_markup());
    }

    #[test]
    fn test_text_setters_invalidate() {
        let mut text = TextData::from_parts("x & y", "x &amp; y");
        text.set_text("plain");
        assert!(!text.has_markup());
        assert_eq!(text.markup(), "plain");
        text.set_markup("<b>bold</b> &amp;");
        assert!(!text.has_text());
        assert_eq!(text.text(), "bold &");
    }

    #[test]
    fn test_append_materializes_missing_view() {
        let mut text = TextData::from_text("1 < 2");
        text.append(" & 3", " &amp; 3");
        assert_eq!(text.text(), "1 < 2 & 3");
        assert_eq!(text.markup(), "1 &lt; 2 &amp; 3");
    }

    #[test]
    fn test_node_type_codes() {
        assert_eq!(NodeType::Element.code(), 1);
        assert_eq!(NodeType::Attribute.code(), 2);
        assert_eq!(NodeType::Text.code(), 3);
        assert_eq!(NodeType::Comment.code(), 8);
        assert_eq!(NodeType::Document.code(), 9);
        assert_eq!(NodeKind::Comment(String::new()).node_type(), NodeType::Comment);
    }
}

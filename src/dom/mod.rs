//! Mutable, browser-like document model.
//!
//! All nodes live in a contiguous `Vec<NodeData>` owned by the [`Document`]
//! and are referenced by [`NodeId`], a newtype over `NonZeroU32`. Navigation
//! links are arena indices, so parent and sibling back-references never form
//! ownership cycles. Detaching a node only clears its links: the node stays
//! allocated and its `NodeId` stays valid until the `Document` is dropped.
//!
//! # Two child views
//!
//! Every node keeps two doubly linked child lists: the full list
//! (`first_child`, `next_sibling`, ...) and the element-only list
//! (`first_element_child`, `next_element_sibling`, ...). The element list is
//! always the in-order subsequence of elements in the full list. Every
//! mutation repairs both lists in place.
//!
//! ```
//! use readable_dom::Document;
//!
//! let doc = Document::parse("<p>one <b>two</b> three</p>", "https://example.com/");
//! let body = doc.body().unwrap();
//! let p = doc.first_element_child(body).unwrap();
//! assert_eq!(doc.child_count(p), 3);
//! assert_eq!(doc.element_child_count(p), 1);
//! assert_eq!(doc.text_content(p), "one two three");
//! ```

mod lookup;
mod mutation;
mod node;
mod serialize;
mod style;

pub use node::{Attribute, ElementData, NodeKind, NodeType, TextData};
pub use style::{Style, StyleMut};

use std::num::NonZeroU32;

use crate::encoding::{self, EncodingError};
use crate::parse::Tag;

/// A typed index into the document's node arena.
///
/// `NodeId` is a newtype over `NonZeroU32`, meaning it can never be zero
/// and `Option<NodeId>` has the same size as `NodeId` (niche optimization).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct NodeId(NonZeroU32);

impl NodeId {
    /// Creates a `NodeId` from a raw index.
    ///
    /// # Panics
    ///
    /// Panics if `index` is 0.
    #[allow(clippy::expect_used, clippy::cast_possible_truncation)]
    fn from_index(index: usize) -> Self {
        Self(NonZeroU32::new(index as u32).expect("NodeId index must be non-zero"))
    }

    /// Returns the raw index as a `usize` for indexing into the arena.
    fn as_index(self) -> usize {
        self.0.get() as usize
    }

    /// Converts this `NodeId` to a raw `u32`.
    #[must_use]
    pub fn into_raw(self) -> u32 {
        self.0.get()
    }

    /// Creates a `NodeId` from a raw `u32`, if non-zero.
    #[must_use]
    pub fn from_raw(raw: u32) -> Option<Self> {
        NonZeroU32::new(raw).map(Self)
    }
}

/// Storage for a single node in the document arena.
///
/// Each node stores its kind and its links for both child views. Access
/// individual nodes via [`Document::node`].
#[derive(Debug, Clone)]
pub struct NodeData {
    /// What kind of node this is and its payload.
    pub kind: NodeKind,
    /// Parent node, if any. The document node and detached nodes have none.
    pub parent: Option<NodeId>,
    pub first_child: Option<NodeId>,
    pub last_child: Option<NodeId>,
    pub prev_sibling: Option<NodeId>,
    pub next_sibling: Option<NodeId>,
    /// First child that is an element.
    pub first_element_child: Option<NodeId>,
    /// Last child that is an element.
    pub last_element_child: Option<NodeId>,
    /// Nearest preceding sibling that is an element. Only set on elements.
    pub prev_element_sibling: Option<NodeId>,
    /// Nearest following sibling that is an element. Only set on elements.
    pub next_element_sibling: Option<NodeId>,
}

impl NodeData {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            first_child: None,
            last_child: None,
            prev_sibling: None,
            next_sibling: None,
            first_element_child: None,
            last_element_child: None,
            prev_element_sibling: None,
            next_element_sibling: None,
        }
    }

    /// Clears the links that tie this node to its parent.
    fn clear_position(&mut self) {
        self.parent = None;
        self.prev_sibling = None;
        self.next_sibling = None;
        self.prev_element_sibling = None;
        self.next_element_sibling = None;
    }
}

/// A mutable HTML document.
///
/// The document owns every node created for it, attached or not. Node 1 is
/// the document node itself ([`root`](Self::root)).
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<NodeData>,
    root: NodeId,
    document_uri: String,
    base_uri: String,
}

impl Document {
    /// Creates an empty document for the page at `url`. The base URI starts
    /// out equal to `url`.
    #[must_use]
    pub fn new(url: &str) -> Self {
        let mut nodes = Vec::with_capacity(64);
        // Index 0: placeholder (NodeId uses NonZeroU32)
        nodes.push(NodeData::new(NodeKind::Document));
        // Index 1: the document node
        nodes.push(NodeData::new(NodeKind::Document));
        Self {
            nodes,
            root: NodeId::from_index(1),
            document_uri: url.to_string(),
            base_uri: url.to_string(),
        }
    }

    /// Parses `html` as a whole document and builds the model for it.
    ///
    /// Parsing never fails; malformed markup is recovered.
    ///
    /// ```
    /// use readable_dom::Document;
    ///
    /// let doc = Document::parse("<title>Hi</title><p>x</p>", "https://example.com/a");
    /// assert_eq!(doc.title(), "Hi");
    /// assert_eq!(doc.document_uri(), "https://example.com/a");
    /// ```
    #[must_use]
    pub fn parse(html: &str, url: &str) -> Self {
        let tree = crate::parse::parse_document(html);
        crate::builder::build_document(&tree, url)
    }

    /// Decodes `bytes` (BOM, `<meta charset>`, UTF-8 or windows-1252) and
    /// parses the result as a whole document.
    ///
    /// # Errors
    ///
    /// Returns `EncodingError` if the declared encoding is unsupported or the
    /// bytes are malformed for it.
    pub fn parse_bytes(bytes: &[u8], url: &str) -> Result<Self, EncodingError> {
        let html = encoding::decode_to_utf8(bytes)?;
        Ok(Self::parse(&html, url))
    }

    /// Returns the document node.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Returns a reference to the `NodeData` for the given node.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not refer to a node of this document.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.as_index()]
    }

    /// Returns a mutable reference to the `NodeData` for the given node.
    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.as_index()]
    }

    /// Returns the total number of nodes in the arena, detached ones
    /// included.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len() - 1 // subtract placeholder at index 0
    }

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let index = self.nodes.len();
        self.nodes.push(NodeData::new(kind));
        NodeId::from_index(index)
    }

    // --- Factories ---

    /// Creates a detached element. `tag_name` reports the name uppercased,
    /// `local_name` lowercased.
    pub fn create_element(&mut self, name: &str) -> NodeId {
        self.alloc(NodeKind::Element(ElementData::new(name)))
    }

    /// Creates a detached text node holding `text` as plain text.
    pub fn create_text_node(&mut self, text: &str) -> NodeId {
        self.alloc(NodeKind::Text(TextData::from_text(text)))
    }

    /// Creates a detached text node whose markup view is the source text it
    /// was parsed from. Serializing the node reproduces `source` exactly.
    pub fn create_text_node_with_source(&mut self, text: &str, source: &str) -> NodeId {
        self.alloc(NodeKind::Text(TextData::from_parts(text, source)))
    }

    /// Creates a detached comment node.
    pub fn create_comment(&mut self, text: &str) -> NodeId {
        self.alloc(NodeKind::Comment(text.to_string()))
    }

    /// Appends to both views of a text node. Does nothing for other kinds.
    pub fn append_text(&mut self, id: NodeId, text: &str, source: &str) {
        if let NodeKind::Text(data) = &mut self.node_mut(id).kind {
            data.append(text, source);
        }
    }

    // --- Navigation ---

    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    #[must_use]
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).first_child
    }

    #[must_use]
    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).last_child
    }

    #[must_use]
    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).prev_sibling
    }

    #[must_use]
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).next_sibling
    }

    #[must_use]
    pub fn first_element_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).first_element_child
    }

    #[must_use]
    pub fn last_element_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).last_element_child
    }

    #[must_use]
    pub fn previous_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).prev_element_sibling
    }

    #[must_use]
    pub fn next_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).next_element_sibling
    }

    /// Returns the document node a node is attached under. `None` for the
    /// document node itself and for nodes not attached to it.
    #[must_use]
    pub fn owner_document(&self, id: NodeId) -> Option<NodeId> {
        self.ancestors(id)
            .find(|&ancestor| matches!(self.node(ancestor).kind, NodeKind::Document))
    }

    /// Returns an iterator over the children of a node.
    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            doc: self,
            next: self.node(id).first_child,
        }
    }

    /// Returns an iterator over the element children of a node.
    pub fn element_children(&self, id: NodeId) -> ElementChildren<'_> {
        ElementChildren {
            doc: self,
            next: self.node(id).first_element_child,
        }
    }

    #[must_use]
    pub fn child_count(&self, id: NodeId) -> usize {
        self.children(id).count()
    }

    #[must_use]
    pub fn element_child_count(&self, id: NodeId) -> usize {
        self.element_children(id).count()
    }

    /// Returns an iterator over the ancestors of a node, nearest first. The
    /// node itself is not included.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            doc: self,
            next: self.node(id).parent,
        }
    }

    /// Returns an iterator over all descendants of a node in document order.
    /// The node itself is not included.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            doc: self,
            root: id,
            next: self.first_child(id),
        }
    }

    // --- Introspection ---

    #[must_use]
    pub fn node_type(&self, id: NodeId) -> NodeType {
        self.node(id).kind.node_type()
    }

    /// Returns the DOM `nodeName`: the uppercase tag name for elements,
    /// `#text`, `#comment` or `#document` otherwise.
    #[must_use]
    pub fn node_name(&self, id: NodeId) -> &str {
        match &self.node(id).kind {
            NodeKind::Element(data) => &data.tag_name,
            NodeKind::Text(_) => "#text",
            NodeKind::Comment(_) => "#comment",
            NodeKind::Document => "#document",
        }
    }

    /// Returns `true` if the node is an element.
    #[must_use]
    pub fn is_element(&self, id: NodeId) -> bool {
        self.node(id).kind.is_element()
    }

    /// Returns the element payload of a node.
    #[must_use]
    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match &self.node(id).kind {
            NodeKind::Element(data) => Some(data),
            _ => None,
        }
    }

    fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        match &mut self.node_mut(id).kind {
            NodeKind::Element(data) => Some(data),
            _ => None,
        }
    }

    /// Returns the text payload of a node.
    #[must_use]
    pub fn text(&self, id: NodeId) -> Option<&TextData> {
        match &self.node(id).kind {
            NodeKind::Text(data) => Some(data),
            _ => None,
        }
    }

    /// The uppercase tag name of an element.
    #[must_use]
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|e| e.tag_name.as_str())
    }

    /// The lowercase tag name of an element.
    #[must_use]
    pub fn local_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|e| e.local_name.as_str())
    }

    /// The recognized tag of an element.
    #[must_use]
    pub fn tag(&self, id: NodeId) -> Option<Tag> {
        self.element(id).map(|e| e.tag)
    }

    /// Returns the attributes of an element in insertion order. Empty for
    /// other node kinds.
    #[must_use]
    pub fn attributes(&self, id: NodeId) -> &[Attribute] {
        match self.element(id) {
            Some(element) => &element.attributes,
            None => &[],
        }
    }

    #[must_use]
    pub fn get_attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|e| e.attribute(name))
    }

    #[must_use]
    pub fn has_attribute(&self, id: NodeId, name: &str) -> bool {
        self.get_attribute(id, name).is_some()
    }

    /// Sets an attribute, overwriting a previous value of the same name.
    /// Does nothing for non-elements.
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) {
        if let Some(element) = self.element_mut(id) {
            element.set_attribute(name, value);
        }
    }

    /// Removes an attribute and returns its former value.
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Option<String> {
        self.element_mut(id)?.remove_attribute(name)
    }

    fn attribute_or_empty(&self, id: NodeId, name: &str) -> &str {
        self.get_attribute(id, name).unwrap_or("")
    }

    #[must_use]
    pub fn class_name(&self, id: NodeId) -> &str {
        self.attribute_or_empty(id, "class")
    }

    pub fn set_class_name(&mut self, id: NodeId, value: &str) {
        self.set_attribute(id, "class", value);
    }

    #[must_use]
    pub fn id(&self, id: NodeId) -> &str {
        self.attribute_or_empty(id, "id")
    }

    pub fn set_id(&mut self, id: NodeId, value: &str) {
        self.set_attribute(id, "id", value);
    }

    #[must_use]
    pub fn href(&self, id: NodeId) -> &str {
        self.attribute_or_empty(id, "href")
    }

    pub fn set_href(&mut self, id: NodeId, value: &str) {
        self.set_attribute(id, "href", value);
    }

    #[must_use]
    pub fn src(&self, id: NodeId) -> &str {
        self.attribute_or_empty(id, "src")
    }

    pub fn set_src(&mut self, id: NodeId, value: &str) {
        self.set_attribute(id, "src", value);
    }

    #[must_use]
    pub fn srcset(&self, id: NodeId) -> &str {
        self.attribute_or_empty(id, "srcset")
    }

    pub fn set_srcset(&mut self, id: NodeId, value: &str) {
        self.set_attribute(id, "srcset", value);
    }

    /// Read view over an element's inline `style` attribute.
    #[must_use]
    pub fn style(&self, id: NodeId) -> Style<'_> {
        Style::new(self, id)
    }

    /// Write view over an element's inline `style` attribute.
    pub fn style_mut(&mut self, id: NodeId) -> StyleMut<'_> {
        StyleMut::new(self, id)
    }

    // --- Document accessors ---

    /// The first element child of the document node (normally `html`).
    #[must_use]
    pub fn document_element(&self) -> Option<NodeId> {
        self.first_element_child(self.root)
    }

    /// The text content of the first `title` element, or `""`.
    #[must_use]
    pub fn title(&self) -> String {
        self.first_by_tag_name("title")
            .map(|title| self.text_content(title))
            .unwrap_or_default()
    }

    /// The first `head` element of the document.
    #[must_use]
    pub fn head(&self) -> Option<NodeId> {
        self.first_by_tag_name("head")
    }

    /// The first `body` element of the document.
    #[must_use]
    pub fn body(&self) -> Option<NodeId> {
        self.first_by_tag_name("body")
    }

    fn first_by_tag_name(&self, name: &str) -> Option<NodeId> {
        self.get_elements_by_tag_name_limited(self.root, name, 1)
            .first()
            .copied()
    }

    /// The URL the document was loaded from.
    #[must_use]
    pub fn document_uri(&self) -> &str {
        &self.document_uri
    }

    /// The URL relative references resolve against: the document URL unless
    /// a `<base href>` overrode it.
    #[must_use]
    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    pub fn set_base_uri(&mut self, uri: &str) {
        uri.clone_into(&mut self.base_uri);
    }
}

// --- Iterators ---

/// Iterator over the children of a node.
pub struct Children<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.doc.node(current).next_sibling;
        Some(current)
    }
}

/// Iterator over the element children of a node.
pub struct ElementChildren<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for ElementChildren<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.doc.node(current).next_element_sibling;
        Some(current)
    }
}

/// Iterator over the ancestors of a node.
pub struct Ancestors<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.doc.node(current).parent;
        Some(current)
    }
}

/// Depth-first iterator over all descendants of a node.
pub struct Descendants<'a> {
    doc: &'a Document,
    root: NodeId,
    next: Option<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;

        // Try to go deeper first
        if let Some(child) = self.doc.first_child(current) {
            self.next = Some(child);
            return Some(current);
        }

        // Walk up to find the nearest node with a next sibling, stopping at
        // the root
        let mut node = current;
        while node != self.root {
            if let Some(sibling) = self.doc.next_sibling(node) {
                self.next = Some(sibling);
                return Some(current);
            }
            match self.doc.parent(node) {
                Some(parent) => node = parent,
                None => break,
            }
        }

        self.next = None;
        Some(current)
    }
}

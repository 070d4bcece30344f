//! Projection of a [`ParseTree`] into a [`Document`].
//!
//! [`ModelBuilder`] is a [`Visitor`]: the tree walker drives it with open,
//! text and close events and it reacts through the document's public
//! mutation API only. Two modes exist:
//!
//! - **Whole document**: the target is a document node. Every element of the
//!   parse tree is built, and `<base href>` updates the base URI.
//! - **Subtree**: the target is any other node. The parse tree root (the
//!   implied `html` element or the fragment wrapper) is suppressed and its
//!   children are appended after the target's existing children.
//!
//! Adjacent text, whitespace and CDATA runs are merged into one text node
//! whose markup view is the concatenated source spans, so serialization
//! reproduces the input.
//!
//! Only the document node and elements can be built into; any other target
//! is rejected before a node is allocated.
//!
//! ```
//! use readable_dom::builder::build_into;
//! use readable_dom::parse::{parse_fragment, Tag};
//! use readable_dom::Document;
//!
//! let mut doc = Document::new("");
//! let div = doc.create_element("div");
//! let tree = parse_fragment("a &amp; <b>b</b>", Tag::DIV);
//! build_into(&mut doc, div, &tree).unwrap();
//! assert_eq!(doc.inner_html(div), "a &amp; <b>b</b>");
//! assert_eq!(doc.text_content(div), "a & b");
//! ```

use log::{debug, trace};

use crate::dom::{Document, NodeId, NodeKind};
use crate::error::DomError;
use crate::parse::{ParseElement, ParseNodeId, ParseTree, Tag};
use crate::walker::{TreeWalker, Visitor};

/// Builds a new [`Document`] for `url` from a parse tree.
#[must_use]
pub fn build_document(tree: &ParseTree, url: &str) -> Document {
    let mut doc = Document::new(url);
    let root = doc.root();
    build_into_container(&mut doc, root, tree);
    doc
}

/// Builds the content of `tree` into `target`, after its existing children.
///
/// If `target` is the document node the whole tree is built; otherwise the
/// parse tree's root wrapper is left out.
///
/// # Errors
///
/// Returns [`DomError::HierarchyRequest`] when `target` is a text or comment
/// node. Nothing is allocated in that case.
pub fn build_into(doc: &mut Document, target: NodeId, tree: &ParseTree) -> Result<(), DomError> {
    let mut builder = ModelBuilder::new(doc, target, tree)?;
    TreeWalker::new(tree).walk(&mut builder);
    Ok(())
}

/// [`build_into`] for a target already known to be the document node or an
/// element.
pub(crate) fn build_into_container(doc: &mut Document, target: NodeId, tree: &ParseTree) {
    let mut builder = ModelBuilder::for_container(doc, target, tree);
    TreeWalker::new(tree).walk(&mut builder);
}

/// Visitor that turns walker events into document nodes.
pub struct ModelBuilder<'d> {
    doc: &'d mut Document,
    target: NodeId,
    /// Open elements; the last one is the insertion point.
    open_elements: Vec<NodeId>,
    /// Parse node whose open/close events are ignored.
    skip: Option<ParseNodeId>,
    /// Text node created by the previous event, if it was a text event.
    pending_text: Option<NodeId>,
    whole_document: bool,
    created: usize,
}

impl<'d> ModelBuilder<'d> {
    /// Creates a builder appending into `target`.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::HierarchyRequest`] when `target` cannot hold
    /// children.
    pub fn new(
        doc: &'d mut Document,
        target: NodeId,
        tree: &ParseTree,
    ) -> Result<Self, DomError> {
        if !doc.node(target).kind.can_have_children() {
            debug!("refusing to build into {}", doc.node_name(target));
            return Err(DomError::HierarchyRequest);
        }
        Ok(Self::for_container(doc, target, tree))
    }

    fn for_container(doc: &'d mut Document, target: NodeId, tree: &ParseTree) -> Self {
        let whole_document = matches!(doc.node(target).kind, NodeKind::Document);
        let skip = if whole_document {
            None
        } else {
            Some(tree.root())
        };
        Self {
            doc,
            target,
            open_elements: Vec::new(),
            skip,
            pending_text: None,
            whole_document,
            created: 0,
        }
    }

    fn insertion_point(&self) -> NodeId {
        self.open_elements.last().copied().unwrap_or(self.target)
    }

    /// Appends at the insertion point. The target holds children and every
    /// other insertion point is an element this builder created, so the
    /// append cannot fail.
    fn append(&mut self, child: NodeId) {
        let parent = self.insertion_point();
        if self.doc.append_child(parent, child).is_ok() {
            self.created += 1;
        }
    }

    fn apply_base_href(&mut self, href: &str) {
        let resolved = url::Url::parse(self.doc.document_uri())
            .and_then(|base| base.join(href))
            .map_or_else(|_| href.to_string(), String::from);
        trace!("base URI overridden by <base href={href:?}>: {resolved}");
        self.doc.set_base_uri(&resolved);
    }
}

impl Visitor for ModelBuilder<'_> {
    fn open(&mut self, tree: &ParseTree, node: ParseNodeId) {
        self.pending_text = None;
        if self.skip == Some(node) {
            trace!("suppressing wrapper open");
            return;
        }
        let Some(parsed) = tree.element(node) else {
            return;
        };

        let element = self.doc.create_element(element_name(parsed));
        for attr in &parsed.attributes {
            self.doc.set_attribute(element, &attr.name, &attr.value);
        }
        self.append(element);

        if self.whole_document && self.doc.tag(element) == Some(Tag::BASE) {
            if let Some(href) = self.doc.get_attribute(element, "href").map(str::to_string) {
                self.apply_base_href(&href);
            }
        }
        self.open_elements.push(element);
    }

    fn text(&mut self, tree: &ParseTree, node: ParseNodeId) {
        let Some(parsed) = tree.text(node) else {
            return;
        };
        match self.pending_text {
            Some(pending) => self.doc.append_text(pending, &parsed.text, &parsed.original_text),
            None => {
                let text = self
                    .doc
                    .create_text_node_with_source(&parsed.text, &parsed.original_text);
                self.append(text);
                self.pending_text = Some(text);
            }
        }
    }

    fn close(&mut self, _tree: &ParseTree, node: ParseNodeId) {
        self.pending_text = None;
        if self.skip == Some(node) {
            trace!("suppressing wrapper close");
            return;
        }
        self.open_elements.pop();
    }

    fn finished(&mut self) {
        debug!(
            "built {} nodes into {} ({})",
            self.created,
            self.doc.node_name(self.target),
            if self.whole_document { "document" } else { "subtree" }
        );
    }
}

/// Picks the name to create an element with.
///
/// Recognized tags use their table name. Anything else, prefixed names
/// included, takes the name from the start tag source with any `prefix:`
/// removed, keeping its original case.
fn element_name(parsed: &ParseElement) -> &str {
    if let Some(name) = parsed.tag.name() {
        return name;
    }
    name_from_source(&parsed.original_tag).unwrap_or(&parsed.name)
}

fn name_from_source(original_tag: &str) -> Option<&str> {
    let rest = original_tag.strip_prefix('<')?;
    let end = rest
        .find(|c: char| c.is_ascii_whitespace() || c == '/' || c == '>')
        .unwrap_or(rest.len());
    let qualified = &rest[..end];
    let local = qualified.rsplit(':').next().unwrap_or(qualified);
    (!local.is_empty()).then_some(local)
}

//! Non-recursive depth-first traversal of a [`ParseTree`].
//!
//! The walker turns a parse tree into a flat stream of [`WalkEvent`]s:
//! `Open` before an element's content, `Text` for each text, whitespace or
//! CDATA node, and `Close` once everything below the element has been
//! visited. Comments are skipped. The walk never recurses, so arbitrarily
//! deep trees are fine.
//!
//! Events can be pulled through the [`Iterator`] implementation or pushed to
//! a [`Visitor`]:
//!
//! ```
//! use readable_dom::parse::{parse_fragment, Tag};
//! use readable_dom::walker::{TreeWalker, WalkEvent};
//!
//! let tree = parse_fragment("a<b>c</b>", Tag::DIV);
//! let events: Vec<_> = TreeWalker::new(&tree).collect();
//! assert_eq!(events.len(), 6); // open root, text, open b, text, close b, close root
//! assert!(matches!(events[0], WalkEvent::Open(id) if id == tree.root()));
//! ```

use crate::parse::{ParseNodeId, ParseNodeKind, ParseTree};

/// A traversal event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkEvent {
    /// Entering an element.
    Open(ParseNodeId),
    /// A text, whitespace or CDATA node.
    Text(ParseNodeId),
    /// Leaving an element; all its descendants have been visited.
    Close(ParseNodeId),
}

impl WalkEvent {
    /// The node the event refers to.
    #[must_use]
    pub fn node(self) -> ParseNodeId {
        match self {
            Self::Open(id) | Self::Text(id) | Self::Close(id) => id,
        }
    }
}

/// Callbacks driven by [`TreeWalker::walk`].
///
/// All methods have default no-op implementations so you only need to
/// override what you need.
#[allow(unused_variables)]
pub trait Visitor {
    /// Called when entering an element.
    fn open(&mut self, tree: &ParseTree, node: ParseNodeId) {}

    /// Called for each text, whitespace or CDATA node.
    fn text(&mut self, tree: &ParseTree, node: ParseNodeId) {}

    /// Called when leaving an element.
    fn close(&mut self, tree: &ParseTree, node: ParseNodeId) {}

    /// Called once after the last event.
    fn finished(&mut self) {}
}

/// Where the walk is. Each state holds only the current node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WalkState {
    /// About to visit this node.
    Descending(ParseNodeId),
    /// This node and its subtree are done; move to its next sibling.
    AdvancingSibling(ParseNodeId),
    /// All children of this element are done; close it.
    ClimbingAncestor(ParseNodeId),
    Done,
}

/// Iterative pre-order walker over a parse tree.
///
/// The walk is bounded by its root: it never visits siblings or ancestors
/// of the node it started from.
#[derive(Debug, Clone)]
pub struct TreeWalker<'a> {
    tree: &'a ParseTree,
    root: ParseNodeId,
    state: WalkState,
}

impl<'a> TreeWalker<'a> {
    /// Creates a walker starting at [`ParseTree::root`].
    #[must_use]
    pub fn new(tree: &'a ParseTree) -> Self {
        Self::from_node(tree, tree.root())
    }

    /// Creates a walker over the subtree rooted at `root`.
    #[must_use]
    pub fn from_node(tree: &'a ParseTree, root: ParseNodeId) -> Self {
        Self {
            tree,
            root,
            state: WalkState::Descending(root),
        }
    }

    /// The node the walk started from.
    #[must_use]
    pub fn root(&self) -> ParseNodeId {
        self.root
    }

    /// Runs the walk to completion, forwarding every event to `visitor` and
    /// finally calling [`Visitor::finished`].
    pub fn walk(self, visitor: &mut dyn Visitor) {
        let tree = self.tree;
        for event in self {
            match event {
                WalkEvent::Open(id) => visitor.open(tree, id),
                WalkEvent::Text(id) => visitor.text(tree, id),
                WalkEvent::Close(id) => visitor.close(tree, id),
            }
        }
        visitor.finished();
    }
}

impl Iterator for TreeWalker<'_> {
    type Item = WalkEvent;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.state {
                WalkState::Done => return None,
                WalkState::Descending(node) => match self.tree.kind(node) {
                    ParseNodeKind::Element(_) => {
                        self.state = match self.tree.first_child(node) {
                            Some(child) => WalkState::Descending(child),
                            None => WalkState::ClimbingAncestor(node),
                        };
                        return Some(WalkEvent::Open(node));
                    }
                    ParseNodeKind::Text(_)
                    | ParseNodeKind::Whitespace(_)
                    | ParseNodeKind::CData(_) => {
                        self.state = WalkState::AdvancingSibling(node);
                        return Some(WalkEvent::Text(node));
                    }
                    ParseNodeKind::Comment(_) | ParseNodeKind::Document => {
                        self.state = WalkState::AdvancingSibling(node);
                    }
                },
                WalkState::AdvancingSibling(node) => {
                    self.state = if node == self.root {
                        WalkState::Done
                    } else if let Some(sibling) = self.tree.next_sibling(node) {
                        WalkState::Descending(sibling)
                    } else {
                        match self.tree.parent(node) {
                            Some(parent) => WalkState::ClimbingAncestor(parent),
                            None => WalkState::Done,
                        }
                    };
                }
                WalkState::ClimbingAncestor(node) => {
                    self.state = WalkState::AdvancingSibling(node);
                    return Some(WalkEvent::Close(node));
                }
            }
        }
    }
}

/// Walks `tree` from its root, forwarding events to `visitor`.
pub fn walk(tree: &ParseTree, visitor: &mut dyn Visitor) {
    TreeWalker::new(tree).walk(visitor);
}

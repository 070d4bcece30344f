//! Tree mutation: append, remove, replace.
//!
//! Every operation keeps both child views consistent. The full list is
//! repaired from the node's own sibling links. The element list is repaired
//! from the element-sibling links, scanning the full list only when an
//! element takes the place of a non-element.

use super::{Document, NodeId, NodeKind};
use crate::error::DomError;

impl Document {
    /// Appends `child` as the last child of `parent`, detaching it from its
    /// previous parent first. Returns `child`.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::HierarchyRequest`] without changing the tree when
    /// `parent` cannot have children, `child` is the document node, or
    /// `child` is `parent` or one of its ancestors.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<NodeId, DomError> {
        self.check_insertion(parent, child)?;
        self.detach(child);

        self.node_mut(child).parent = Some(parent);
        match self.node(parent).last_child {
            Some(last) => {
                self.node_mut(last).next_sibling = Some(child);
                self.node_mut(child).prev_sibling = Some(last);
            }
            None => self.node_mut(parent).first_child = Some(child),
        }
        self.node_mut(parent).last_child = Some(child);

        if self.is_element(child) {
            match self.node(parent).last_element_child {
                Some(last) => {
                    self.node_mut(last).next_element_sibling = Some(child);
                    self.node_mut(child).prev_element_sibling = Some(last);
                }
                None => self.node_mut(parent).first_element_child = Some(child),
            }
            self.node_mut(parent).last_element_child = Some(child);
        }
        Ok(child)
    }

    /// Removes `child` from `parent` and returns it. The node stays valid and
    /// can be inserted again.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::NotFound`] if `child` is not a direct child of
    /// `parent`.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<NodeId, DomError> {
        if self.node(child).parent != Some(parent) {
            return Err(DomError::NotFound);
        }
        self.detach(child);
        Ok(child)
    }

    /// Puts `new` at the exact position of `old` under `parent` and returns
    /// `old`, now detached. `new` is detached from its previous parent first.
    /// Replacing a node with itself does nothing.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::NotFound`] if `old` is not a direct child of
    /// `parent`, and [`DomError::HierarchyRequest`] under the same conditions
    /// as [`append_child`](Self::append_child).
    pub fn replace_child(
        &mut self,
        parent: NodeId,
        new: NodeId,
        old: NodeId,
    ) -> Result<NodeId, DomError> {
        if self.node(old).parent != Some(parent) {
            return Err(DomError::NotFound);
        }
        if new == old {
            return Ok(old);
        }
        self.check_insertion(parent, new)?;
        // Detaching first may move old's neighbours when new is a sibling
        self.detach(new);

        let prev = self.node(old).prev_sibling;
        let next = self.node(old).next_sibling;
        {
            let data = self.node_mut(new);
            data.parent = Some(parent);
            data.prev_sibling = prev;
            data.next_sibling = next;
        }
        match prev {
            Some(p) => self.node_mut(p).next_sibling = Some(new),
            None => self.node_mut(parent).first_child = Some(new),
        }
        match next {
            Some(n) => self.node_mut(n).prev_sibling = Some(new),
            None => self.node_mut(parent).last_child = Some(new),
        }

        match (self.is_element(old), self.is_element(new)) {
            (true, true) => {
                let prev_element = self.node(old).prev_element_sibling;
                let next_element = self.node(old).next_element_sibling;
                self.link_element(parent, new, prev_element, next_element);
            }
            (true, false) => self.unlink_element(parent, old),
            (false, true) => {
                let prev_element = self.preceding_element(prev);
                let next_element = match prev_element {
                    Some(element) => self.node(element).next_element_sibling,
                    None => self.node(parent).first_element_child,
                };
                self.link_element(parent, new, prev_element, next_element);
            }
            (false, false) => {}
        }

        self.node_mut(old).clear_position();
        Ok(old)
    }

    /// Removes all children of a node, last first.
    pub fn clear_children(&mut self, id: NodeId) {
        while let Some(last) = self.node(id).last_child {
            self.detach(last);
        }
    }

    /// Detaches a node from its parent. The node keeps its own children.
    pub(crate) fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.node(id).parent else {
            return;
        };

        let prev = self.node(id).prev_sibling;
        let next = self.node(id).next_sibling;
        match prev {
            Some(p) => self.node_mut(p).next_sibling = next,
            None => self.node_mut(parent).first_child = next,
        }
        match next {
            Some(n) => self.node_mut(n).prev_sibling = prev,
            None => self.node_mut(parent).last_child = prev,
        }

        if self.is_element(id) {
            self.unlink_element(parent, id);
        }
        self.node_mut(id).clear_position();
    }

    fn check_insertion(&self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        let parent_can_hold = self.node(parent).kind.can_have_children();
        let child_is_document = matches!(self.node(child).kind, NodeKind::Document);
        let creates_cycle = child == parent || self.ancestors(parent).any(|a| a == child);
        if !parent_can_hold || child_is_document || creates_cycle {
            return Err(DomError::HierarchyRequest);
        }
        Ok(())
    }

    /// Links `element` into `parent`'s element list between the two given
    /// neighbours.
    fn link_element(
        &mut self,
        parent: NodeId,
        element: NodeId,
        prev: Option<NodeId>,
        next: Option<NodeId>,
    ) {
        self.node_mut(element).prev_element_sibling = prev;
        self.node_mut(element).next_element_sibling = next;
        match prev {
            Some(p) => self.node_mut(p).next_element_sibling = Some(element),
            None => self.node_mut(parent).first_element_child = Some(element),
        }
        match next {
            Some(n) => self.node_mut(n).prev_element_sibling = Some(element),
            None => self.node_mut(parent).last_element_child = Some(element),
        }
    }

    /// Removes `element` from `parent`'s element list, joining its former
    /// neighbours.
    fn unlink_element(&mut self, parent: NodeId, element: NodeId) {
        let prev = self.node(element).prev_element_sibling;
        let next = self.node(element).next_element_sibling;
        match prev {
            Some(p) => self.node_mut(p).next_element_sibling = next,
            None => self.node_mut(parent).first_element_child = next,
        }
        match next {
            Some(n) => self.node_mut(n).prev_element_sibling = prev,
            None => self.node_mut(parent).last_element_child = prev,
        }
        self.node_mut(element).prev_element_sibling = None;
        self.node_mut(element).next_element_sibling = None;
    }

    /// Scans backwards through the full list from `start` (inclusive) for
    /// the nearest element.
    fn preceding_element(&self, start: Option<NodeId>) -> Option<NodeId> {
        let mut current = start;
        while let Some(id) = current {
            if self.is_element(id) {
                return Some(id);
            }
            current = self.node(id).prev_sibling;
        }
        None
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::dom::NodeData;
    use pretty_assertions::assert_eq;

    /// Link fields of a node, for before/after comparisons.
    type Links = [Option<NodeId>; 9];

    fn links(doc: &Document, id: NodeId) -> Links {
        let NodeData {
            parent,
            first_child,
            last_child,
            prev_sibling,
            next_sibling,
            first_element_child,
            last_element_child,
            prev_element_sibling,
            next_element_sibling,
            ..
        } = *doc.node(id);
        [
            parent,
            first_child,
            last_child,
            prev_sibling,
            next_sibling,
            first_element_child,
            last_element_child,
            prev_element_sibling,
            next_element_sibling,
        ]
    }

    /// Checks that the element list of `parent` is the element subsequence
    /// of its full list, linked both ways.
    fn assert_views_consistent(doc: &Document, parent: NodeId) {
        let from_full: Vec<NodeId> = doc.children(parent).filter(|&c| doc.is_element(c)).collect();
        let forward: Vec<NodeId> = doc.element_children(parent).collect();
        assert_eq!(forward, from_full);

        let mut backward = Vec::new();
        let mut current = doc.last_element_child(parent);
        while let Some(id) = current {
            backward.push(id);
            current = doc.previous_element_sibling(id);
        }
        backward.reverse();
        assert_eq!(backward, from_full);

        let mut full_backward = Vec::new();
        let mut current = doc.last_child(parent);
        while let Some(id) = current {
            assert_eq!(doc.parent(id), Some(parent));
            full_backward.push(id);
            current = doc.previous_sibling(id);
        }
        full_backward.reverse();
        assert_eq!(full_backward, doc.children(parent).collect::<Vec<_>>());
    }

    /// A parent with children: text, em, text, strong, text.
    fn mixed() -> (Document, NodeId, Vec<NodeId>) {
        let mut doc = Document::new("");
        let parent = doc.create_element("div");
        doc.append_child(doc.root(), parent).unwrap();
        let kids = vec![
            doc.create_text_node("a"),
            doc.create_element("em"),
            doc.create_text_node("b"),
            doc.create_element("strong"),
            doc.create_text_node("c"),
        ];
        for &kid in &kids {
            doc.append_child(parent, kid).unwrap();
        }
        (doc, parent, kids)
    }

    #[test]
    fn test_append_links_both_views() {
        let (doc, parent, kids) = mixed();
        assert_eq!(doc.first_child(parent), Some(kids[0]));
        assert_eq!(doc.last_child(parent), Some(kids[4]));
        assert_eq!(doc.next_sibling(kids[3]), Some(kids[4]));
        assert_eq!(doc.first_element_child(parent), Some(kids[1]));
        assert_eq!(doc.last_element_child(parent), Some(kids[3]));
        assert_eq!(doc.next_element_sibling(kids[1]), Some(kids[3]));
        assert_eq!(doc.previous_element_sibling(kids[3]), Some(kids[1]));
        assert_views_consistent(&doc, parent);
    }

    #[test]
    fn test_append_sets_parent_and_last() {
        let (mut doc, parent, kids) = mixed();
        let extra = doc.create_element("span");
        doc.append_child(parent, extra).unwrap();
        assert_eq!(doc.parent(extra), Some(parent));
        assert_eq!(doc.last_child(parent), Some(extra));
        assert_eq!(doc.next_sibling(kids[4]), Some(extra));
        assert_eq!(doc.next_element_sibling(kids[3]), Some(extra));
        assert_views_consistent(&doc, parent);
    }

    #[test]
    fn test_append_moves_from_previous_parent() {
        let (mut doc, parent, kids) = mixed();
        let other = doc.create_element("section");
        doc.append_child(doc.root(), other).unwrap();

        doc.append_child(other, kids[1]).unwrap();
        assert_eq!(doc.parent(kids[1]), Some(other));
        assert_eq!(doc.child_count(parent), 4);
        assert_eq!(doc.first_element_child(parent), Some(kids[3]));
        assert_eq!(doc.next_sibling(kids[0]), Some(kids[2]));
        assert_views_consistent(&doc, parent);
        assert_views_consistent(&doc, other);
    }

    #[test]
    fn test_append_within_same_parent_moves_to_end() {
        let (mut doc, parent, kids) = mixed();
        doc.append_child(parent, kids[1]).unwrap();
        assert_eq!(doc.last_child(parent), Some(kids[1]));
        assert_eq!(doc.last_element_child(parent), Some(kids[1]));
        assert_eq!(doc.first_element_child(parent), Some(kids[3]));
        assert_eq!(doc.child_count(parent), 5);
        assert_views_consistent(&doc, parent);
    }

    #[test]
    fn test_append_hierarchy_errors() {
        let (mut doc, parent, kids) = mixed();
        let root = doc.root();
        assert_eq!(doc.append_child(parent, parent), Err(DomError::HierarchyRequest));
        assert_eq!(doc.append_child(kids[1], parent), Err(DomError::HierarchyRequest));
        assert_eq!(doc.append_child(parent, root), Err(DomError::HierarchyRequest));
        let stray = doc.create_element("b");
        assert_eq!(doc.append_child(kids[0], stray), Err(DomError::HierarchyRequest));
        let comment = doc.create_comment("c");
        assert_eq!(doc.append_child(comment, stray), Err(DomError::HierarchyRequest));
        // Failed calls leave the tree alone
        assert_eq!(doc.parent(parent), Some(root));
        assert_eq!(doc.child_count(parent), 5);
    }

    #[test]
    fn test_remove_then_append_restores_count() {
        let (mut doc, parent, kids) = mixed();
        assert_eq!(doc.remove_child(parent, kids[3]), Ok(kids[3]));
        assert_eq!(doc.child_count(parent), 4);
        assert_eq!(doc.parent(kids[3]), None);
        assert_eq!(doc.next_sibling(kids[3]), None);
        assert_eq!(doc.previous_element_sibling(kids[3]), None);
        assert_eq!(doc.last_element_child(parent), Some(kids[1]));
        assert_views_consistent(&doc, parent);

        doc.append_child(parent, kids[3]).unwrap();
        assert_eq!(doc.child_count(parent), 5);
        assert_eq!(doc.last_child(parent), Some(kids[3]));
        assert_views_consistent(&doc, parent);
    }

    #[test]
    fn test_remove_not_found() {
        let (mut doc, parent, _) = mixed();
        let stray = doc.create_element("p");
        assert_eq!(doc.remove_child(parent, stray), Err(DomError::NotFound));
        assert_eq!(doc.remove_child(doc.root(), doc.root()), Err(DomError::NotFound));
    }

    #[test]
    fn test_detached_node_keeps_children() {
        let (mut doc, parent, _) = mixed();
        doc.remove_child(doc.root(), parent).unwrap();
        assert_eq!(doc.child_count(parent), 5);
        assert_eq!(doc.first_child(doc.root()), None);
    }

    #[test]
    fn test_replace_element_with_element() {
        let (mut doc, parent, kids) = mixed();
        let new = doc.create_element("i");
        assert_eq!(doc.replace_child(parent, new, kids[1]), Ok(kids[1]));
        assert_eq!(doc.previous_sibling(new), Some(kids[0]));
        assert_eq!(doc.next_sibling(new), Some(kids[2]));
        assert_eq!(doc.first_element_child(parent), Some(new));
        assert_eq!(doc.next_element_sibling(new), Some(kids[3]));
        assert_eq!(links(&doc, kids[1])[..], [None; 9][..]);
        assert_views_consistent(&doc, parent);
    }

    #[test]
    fn test_replace_element_with_text() {
        let (mut doc, parent, kids) = mixed();
        let new = doc.create_text_node("t");
        doc.replace_child(parent, new, kids[3]).unwrap();
        assert_eq!(doc.element_child_count(parent), 1);
        assert_eq!(doc.last_element_child(parent), Some(kids[1]));
        assert_eq!(doc.next_element_sibling(kids[1]), None);
        assert_eq!(doc.next_sibling(new), Some(kids[4]));
        assert_views_consistent(&doc, parent);
    }

    #[test]
    fn test_replace_text_with_element_scans_outward() {
        let (mut doc, parent, kids) = mixed();
        let new = doc.create_element("hr");
        doc.replace_child(parent, new, kids[2]).unwrap();
        assert_eq!(doc.previous_element_sibling(new), Some(kids[1]));
        assert_eq!(doc.next_element_sibling(new), Some(kids[3]));

        let first = doc.create_element("h1");
        doc.replace_child(parent, first, kids[0]).unwrap();
        assert_eq!(doc.first_element_child(parent), Some(first));
        assert_eq!(doc.previous_element_sibling(kids[1]), Some(first));

        let last = doc.create_element("footer");
        doc.replace_child(parent, last, kids[4]).unwrap();
        assert_eq!(doc.last_element_child(parent), Some(last));
        assert_eq!(doc.element_child_count(parent), 5);
        assert_views_consistent(&doc, parent);
    }

    #[test]
    fn test_replace_and_back_restores_links() {
        let (mut doc, parent, kids) = mixed();
        let everything: Vec<NodeId> = std::iter::once(parent).chain(kids.iter().copied()).collect();
        let before: Vec<Links> = everything.iter().map(|&id| links(&doc, id)).collect();

        for &old in &kids {
            let new = doc.create_element("ins");
            doc.replace_child(parent, new, old).unwrap();
            assert_views_consistent(&doc, parent);
            doc.replace_child(parent, old, new).unwrap();
            assert_views_consistent(&doc, parent);

            let after: Vec<Links> = everything.iter().map(|&id| links(&doc, id)).collect();
            assert_eq!(after, before);
        }
    }

    #[test]
    fn test_replace_with_sibling() {
        let (mut doc, parent, kids) = mixed();
        // Move the last text node onto the first element's slot
        doc.replace_child(parent, kids[4], kids[1]).unwrap();
        let order: Vec<NodeId> = doc.children(parent).collect();
        assert_eq!(order, vec![kids[0], kids[4], kids[2], kids[3]]);
        assert_eq!(doc.first_element_child(parent), Some(kids[3]));
        assert_views_consistent(&doc, parent);

        // And an element onto its own neighbour
        doc.replace_child(parent, kids[3], kids[2]).unwrap();
        let order: Vec<NodeId> = doc.children(parent).collect();
        assert_eq!(order, vec![kids[0], kids[4], kids[3]]);
        assert_views_consistent(&doc, parent);
    }

    #[test]
    fn test_replace_errors_and_self() {
        let (mut doc, parent, kids) = mixed();
        let stray = doc.create_element("p");
        assert_eq!(doc.replace_child(parent, stray, stray), Err(DomError::NotFound));
        assert_eq!(doc.replace_child(parent, kids[0], kids[0]), Ok(kids[0]));
        assert_eq!(doc.parent(kids[0]), Some(parent));
        assert_eq!(
            doc.replace_child(parent, doc.root(), kids[0]),
            Err(DomError::HierarchyRequest)
        );
        assert_views_consistent(&doc, parent);
    }

    #[test]
    fn test_clear_children() {
        let (mut doc, parent, kids) = mixed();
        doc.clear_children(parent);
        assert_eq!(doc.first_child(parent), None);
        assert_eq!(doc.last_element_child(parent), None);
        assert!(kids.iter().all(|&k| doc.parent(k).is_none()));
    }
}

//! Element lookup by tag name and id.
//!
//! Both lookups walk the element-only view in document order, starting at
//! the first element child of the context node and never leaving its
//! subtree.

use super::{Document, NodeId};

/// Pre-order walk over the element descendants of a node.
struct ElementWalk<'a> {
    doc: &'a Document,
    root: NodeId,
    next: Option<NodeId>,
}

impl Iterator for ElementWalk<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.doc.first_element_child(current).or_else(|| {
            let mut node = current;
            while node != self.root {
                if let Some(sibling) = self.doc.next_element_sibling(node) {
                    return Some(sibling);
                }
                node = self.doc.parent(node)?;
            }
            None
        });
        Some(current)
    }
}

impl Document {
    fn element_walk(&self, context: NodeId) -> ElementWalk<'_> {
        ElementWalk {
            doc: self,
            root: context,
            next: self.first_element_child(context),
        }
    }

    /// Returns all elements below `context` whose local name equals `name`
    /// (ASCII case-insensitive), in document order. `"*"` matches every
    /// element.
    ///
    /// ```
    /// use readable_dom::Document;
    ///
    /// let doc = Document::parse("<p>1</p><div><P>2</P></div>", "");
    /// assert_eq!(doc.get_elements_by_tag_name(doc.root(), "p").len(), 2);
    /// assert_eq!(doc.get_elements_by_tag_name(doc.root(), "*").len(), 6);
    /// ```
    #[must_use]
    pub fn get_elements_by_tag_name(&self, context: NodeId, name: &str) -> Vec<NodeId> {
        self.get_elements_by_tag_name_limited(context, name, usize::MAX)
    }

    /// Like [`get_elements_by_tag_name`](Self::get_elements_by_tag_name) but
    /// stops after `limit` matches.
    #[must_use]
    pub fn get_elements_by_tag_name_limited(
        &self,
        context: NodeId,
        name: &str,
        limit: usize,
    ) -> Vec<NodeId> {
        let match_all = name == "*";
        self.element_walk(context)
            .filter(|&element| {
                match_all
                    || self
                        .local_name(element)
                        .is_some_and(|local| local.eq_ignore_ascii_case(name))
            })
            .take(limit)
            .collect()
    }

    /// Returns the first element below `context` whose `id` attribute is
    /// exactly `id`.
    #[must_use]
    pub fn get_element_by_id(&self, context: NodeId, id: &str) -> Option<NodeId> {
        self.element_walk(context)
            .find(|&element| self.get_attribute(element, "id") == Some(id))
    }
}

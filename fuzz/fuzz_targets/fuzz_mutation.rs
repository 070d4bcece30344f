#![no_main]
use libfuzzer_sys::fuzz_target;
use readable_dom::{Document, NodeId};

/// Checks that the element list of `parent` matches its full child list.
fn check_views(doc: &Document, parent: NodeId) {
    let from_full: Vec<NodeId> = doc.children(parent).filter(|&c| doc.is_element(c)).collect();
    let from_elements: Vec<NodeId> = doc.element_children(parent).collect();
    assert_eq!(from_full, from_elements);
}

fuzz_target!(|data: &[u8]| {
    let Some((&ops, markup)) = data.split_first() else {
        return;
    };
    let Ok(markup) = std::str::from_utf8(markup) else {
        return;
    };
    let mut doc = Document::parse(markup, "");
    let root = doc.root();
    let nodes: Vec<NodeId> = doc.descendants(root).collect();
    if nodes.len() < 2 {
        return;
    }

    // Drive a few mutations from the first byte; errors are fine, panics and
    // broken child views are not
    for step in 0..usize::from(ops % 16) {
        let a = nodes[(step * 7 + usize::from(ops)) % nodes.len()];
        let b = nodes[(step * 13 + 1) % nodes.len()];
        match step % 3 {
            0 => {
                let _ = doc.append_child(a, b);
            }
            1 => {
                if let Some(parent) = doc.parent(b) {
                    let _ = doc.replace_child(parent, a, b);
                }
            }
            _ => {
                if let Some(parent) = doc.parent(b) {
                    let _ = doc.remove_child(parent, b);
                }
            }
        }
    }

    for &node in &nodes {
        check_views(&doc, node);
    }
    check_views(&doc, root);
});

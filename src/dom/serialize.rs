//! Markup and text content: `outer_html`, `inner_html`, `text_content` and
//! their setters.
//!
//! Elements serialize as `<name attr="value">children</name>`, or `<name/>`
//! when they have no children. Text nodes serialize their markup view, which
//! for parsed text is the exact source span, so unmodified content round
//! trips byte for byte.

use super::{Document, NodeId, NodeKind};
use crate::builder;
use crate::parse::{self, Tag};

/// Escapes `&`, `<`, `>` and `"`.
pub(crate) fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    write_escaped(&mut out, text);
    out
}

fn write_escaped(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
}

/// Recovers plain text from markup by building it as a `body` fragment and
/// reading back the text content.
pub(crate) fn plain_text_from_markup(markup: &str) -> String {
    if markup.is_empty() {
        return String::new();
    }
    let tree = parse::parse_fragment(markup, Tag::BODY);
    let mut scratch = Document::new("");
    let body = scratch.create_element("body");
    builder::build_into_container(&mut scratch, body, &tree);
    scratch.text_content(body)
}

impl Document {
    /// Serializes a node and its subtree.
    ///
    /// ```
    /// use readable_dom::Document;
    ///
    /// let mut doc = Document::new("");
    /// let a = doc.create_element("a");
    /// doc.set_href(a, "/x?a=1&b=\"2\"");
    /// assert_eq!(doc.outer_html(a), r#"<a href="/x?a=1&amp;b=&quot;2&quot;"/>"#);
    /// ```
    #[must_use]
    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_subtree(&mut out, id);
        out
    }

    /// Serializes the children of a node. For a text node this is its markup
    /// view.
    #[must_use]
    pub fn inner_html(&self, id: NodeId) -> String {
        if let Some(text) = self.text(id) {
            return text.markup().to_string();
        }
        let mut out = String::new();
        for child in self.children(id) {
            self.write_subtree(&mut out, child);
        }
        out
    }

    /// The concatenated plain text of all text nodes in a subtree. Comments
    /// return their own content.
    #[must_use]
    pub fn text_content(&self, id: NodeId) -> String {
        match &self.node(id).kind {
            NodeKind::Text(text) => text.text().to_string(),
            NodeKind::Comment(content) => content.clone(),
            NodeKind::Element(_) | NodeKind::Document => {
                let mut out = String::new();
                for node in self.descendants(id) {
                    if let Some(text) = self.text(node) {
                        out.push_str(text.text());
                    }
                }
                out
            }
        }
    }

    /// Replaces the content of a node with plain text.
    ///
    /// An element loses its children and gets one new text node. A text node
    /// takes `text` as its plain text and will escape it on output. Does
    /// nothing for the document node.
    pub fn set_text_content(&mut self, id: NodeId, text: &str) {
        match &mut self.node_mut(id).kind {
            NodeKind::Text(data) => data.set_text(text),
            NodeKind::Comment(content) => text.clone_into(content),
            NodeKind::Element(_) => {
                self.clear_children(id);
                let child = self.create_text_node(text);
                let _ = self.append_child(id, child);
            }
            NodeKind::Document => {}
        }
    }

    /// Replaces the content of a node with parsed markup.
    ///
    /// An element is cleared, then `html` is parsed as a fragment in the
    /// element's context and built into it. A text node takes `html` as its
    /// markup view. The document node is cleared and rebuilt from `html` as a
    /// whole document, with the base URI reset to the document URI until a
    /// `<base href>` in `html` overrides it.
    pub fn set_inner_html(&mut self, id: NodeId, html: &str) {
        match &mut self.node_mut(id).kind {
            NodeKind::Text(data) => data.set_markup(html),
            NodeKind::Comment(_) => {}
            NodeKind::Element(element) => {
                let context = element.tag;
                self.clear_children(id);
                if !html.is_empty() {
                    let tree = parse::parse_fragment(html, context);
                    builder::build_into_container(self, id, &tree);
                }
            }
            NodeKind::Document => {
                self.clear_children(id);
                let document_uri = self.document_uri.clone();
                self.set_base_uri(&document_uri);
                let tree = parse::parse_document(html);
                builder::build_into_container(self, id, &tree);
            }
        }
    }

    /// Writes `root` and everything below it without recursing.
    fn write_subtree(&self, out: &mut String, root: NodeId) {
        let mut current = root;
        loop {
            if self.write_open(out, current) {
                if let Some(child) = self.first_child(current) {
                    current = child;
                    continue;
                }
            }
            loop {
                if current == root {
                    return;
                }
                if let Some(sibling) = self.next_sibling(current) {
                    current = sibling;
                    break;
                }
                let Some(parent) = self.parent(current) else {
                    return;
                };
                current = parent;
                self.write_close(out, current);
            }
        }
    }

    /// Writes the opening part of a node. Returns `true` when its children
    /// should follow.
    fn write_open(&self, out: &mut String, id: NodeId) -> bool {
        let has_children = self.first_child(id).is_some();
        match &self.node(id).kind {
            NodeKind::Element(element) => {
                out.push('<');
                out.push_str(&element.local_name);
                for attr in &element.attributes {
                    out.push(' ');
                    out.push_str(&attr.name);
                    out.push_str("=\"");
                    write_escaped(out, &attr.value);
                    out.push('"');
                }
                out.push_str(if has_children { ">" } else { "/>" });
                has_children
            }
            NodeKind::Text(text) => {
                out.push_str(text.markup());
                false
            }
            NodeKind::Comment(content) => {
                out.push_str("<!--");
                out.push_str(content);
                out.push_str("-->");
                false
            }
            NodeKind::Document => has_children,
        }
    }

    fn write_close(&self, out: &mut String, id: NodeId) {
        if let Some(element) = self.element(id) {
            out.push_str("</");
            out.push_str(&element.local_name);
            out.push('>');
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn first_in_body(doc: &Document) -> NodeId {
        doc.first_element_child(doc.body().unwrap()).unwrap()
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("a & b < c > d \"e\" 'f'"), "a &amp; b &lt; c &gt; d &quot;e&quot; 'f'");
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn test_inner_html_round_trip() {
        let doc = Document::parse("<p>a<b>c</b></p>", "");
        let p = first_in_body(&doc);
        assert_eq!(doc.inner_html(p), "a<b>c</b>");
        assert_eq!(doc.outer_html(p), "<p>a<b>c</b></p>");
    }

    #[test]
    fn test_childless_elements_self_close() {
        let doc = Document::parse("<div><br><span></span><img src=\"x.png\" alt></div>", "");
        let div = first_in_body(&doc);
        assert_eq!(doc.inner_html(div), "<br/><span/><img src=\"x.png\" alt=\"\"/>");
    }

    #[test]
    fn test_source_span_preserved() {
        let doc = Document::parse("<p>Fish &amp; chips &#38; peas &apos;n&apos; stuff</p>", "");
        let p = first_in_body(&doc);
        assert_eq!(doc.inner_html(p), "Fish &amp; chips &#38; peas &apos;n&apos; stuff");
        assert_eq!(doc.text_content(p), "Fish & chips & peas 'n' stuff");
    }

    #[test]
    fn test_text_content_skips_markup_and_comments() {
        let mut doc = Document::parse("<div>one <i>two</i> three</div>", "");
        let div = first_in_body(&doc);
        let comment = doc.create_comment("hidden");
        doc.append_child(div, comment).unwrap();
        assert_eq!(doc.text_content(div), "one two three");
        assert_eq!(doc.text_content(comment), "hidden");
        assert_eq!(doc.outer_html(comment), "<!--hidden-->");
        assert_eq!(doc.inner_html(div), "one <i>two</i> three<!--hidden-->");
    }

    #[test]
    fn test_document_serializes_children() {
        let doc = Document::parse("<title>T</title>x", "");
        assert_eq!(
            doc.outer_html(doc.root()),
            "<html><head><title>T</title></head><body>x</body></html>"
        );
        assert_eq!(doc.inner_html(doc.root()), doc.outer_html(doc.root()));
        assert_eq!(doc.text_content(doc.root()), "Tx");
    }

    #[test]
    fn test_set_text_content_on_element() {
        let mut doc = Document::parse("<p>old <b>bold</b></p>", "");
        let p = first_in_body(&doc);
        doc.set_text_content(p, "1 < 2");
        assert_eq!(doc.child_count(p), 1);
        assert_eq!(doc.inner_html(p), "1 &lt; 2");
        assert_eq!(doc.text_content(p), "1 < 2");

        doc.set_text_content(p, "");
        assert_eq!(doc.child_count(p), 1);
        assert_eq!(doc.inner_html(p), "");
    }

    #[test]
    fn test_set_text_content_on_text_regenerates_markup() {
        let mut doc = Document::parse("<p>&quot;quoted&apos;</p>", "");
        let p = first_in_body(&doc);
        let text = doc.first_child(p).unwrap();
        assert_eq!(doc.inner_html(text), "&quot;quoted&apos;");
        let content = doc.text_content(text);
        doc.set_text_content(text, &content);
        assert_eq!(doc.inner_html(text), "&quot;quoted'");
    }

    #[test]
    fn test_set_text_content_on_document_is_noop() {
        let mut doc = Document::parse("<p>x</p>", "");
        let before = doc.outer_html(doc.root());
        doc.set_text_content(doc.root(), "gone?");
        assert_eq!(doc.outer_html(doc.root()), before);
    }

    #[test]
    fn test_set_inner_html_on_element() {
        let mut doc = Document::parse("<div>old</div>", "");
        let div = first_in_body(&doc);
        doc.set_inner_html(div, "<p>new <em>content</em></p>tail");
        assert_eq!(doc.inner_html(div), "<p>new <em>content</em></p>tail");
        assert_eq!(doc.element_child_count(div), 1);

        doc.set_inner_html(div, "");
        assert_eq!(doc.first_child(div), None);
    }

    #[test]
    fn test_set_inner_html_uses_element_context() {
        let mut doc = Document::parse("<textarea></textarea>", "");
        let textarea = first_in_body(&doc);
        doc.set_inner_html(textarea, "<b>not a tag</b>");
        assert_eq!(doc.element_child_count(textarea), 0);
        assert_eq!(doc.text_content(textarea), "<b>not a tag</b>");
    }

    #[test]
    fn test_set_inner_html_on_text_reparses_for_plain_text() {
        let mut doc = Document::new("");
        let text = doc.create_text_node("x");
        doc.set_inner_html(text, "a &amp; <b>b</b>");
        assert_eq!(doc.inner_html(text), "a &amp; <b>b</b>");
        assert_eq!(doc.text_content(text), "a & b");
    }

    #[test]
    fn test_set_inner_html_on_document_rebuilds() {
        let mut doc = Document::parse("<p>x</p>", "https://example.com/");
        doc.set_inner_html(doc.root(), "<title>New</title><p>y</p>");
        assert_eq!(doc.title(), "New");
        assert_eq!(doc.element_child_count(doc.root()), 1);
        assert_eq!(doc.text_content(doc.body().unwrap()), "y");
    }

    #[test]
    fn test_set_inner_html_on_document_resets_base_uri() {
        let mut doc = Document::parse(
            "<base href=\"https://cdn.example/\"><p>x</p>",
            "https://example.com/",
        );
        assert_eq!(doc.base_uri(), "https://cdn.example/");

        doc.set_inner_html(doc.root(), "<p>no base</p>");
        assert_eq!(doc.base_uri(), "https://example.com/");

        doc.set_inner_html(doc.root(), "<base href=\"/static/\"><p>y</p>");
        assert_eq!(doc.base_uri(), "https://example.com/static/");
    }

    #[test]
    fn test_plain_text_from_markup() {
        assert_eq!(plain_text_from_markup(""), "");
        assert_eq!(plain_text_from_markup("&lt;tag&gt; &amp;amp;"), "<tag> &amp;");
        assert_eq!(plain_text_from_markup("<p>a</p><p>b</p>"), "ab");
    }

    #[test]
    fn test_deep_serialization_does_not_recurse() {
        let mut doc = Document::new("");
        let mut parent = doc.root();
        for _ in 0..5000 {
            let div = doc.create_element("div");
            doc.append_child(parent, div).unwrap();
            parent = div;
        }
        let leaf = doc.create_text_node("x");
        doc.append_child(parent, leaf).unwrap();
        let html = doc.outer_html(doc.root());
        assert!(html.starts_with("<div><div>"));
        assert!(html.ends_with("x</div></div>"));
        assert_eq!(html.len(), 5000 * "<div></div>".len() + 1);
    }
}

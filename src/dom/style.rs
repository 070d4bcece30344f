//! Literal access to an element's inline `style` attribute.
//!
//! No CSS parsing happens here beyond splitting declarations on `;` and each
//! declaration on its first `:`. There is no cascade and no shorthand
//! expansion.

use super::{Document, NodeId};

/// Splits a declaration into trimmed name and value.
fn split_declaration(declaration: &str) -> Option<(&str, &str)> {
    let (name, value) = declaration.split_once(':')?;
    Some((name.trim(), value.trim()))
}

/// Read view over one element's `style` attribute.
#[derive(Debug, Clone, Copy)]
pub struct Style<'a> {
    doc: &'a Document,
    element: NodeId,
}

impl<'a> Style<'a> {
    pub(super) fn new(doc: &'a Document, element: NodeId) -> Self {
        Self { doc, element }
    }

    /// The literal `style` attribute, `""` when absent.
    #[must_use]
    pub fn css_text(&self) -> &'a str {
        self.doc.get_attribute(self.element, "style").unwrap_or("")
    }

    /// Returns the value of the first declaration named `name`, or `""`.
    ///
    /// ```
    /// use readable_dom::Document;
    ///
    /// let mut doc = Document::new("");
    /// let div = doc.create_element("div");
    /// doc.set_attribute(div, "style", "color: red; background: url(a.png)");
    /// assert_eq!(doc.style(div).get("background"), "url(a.png)");
    /// assert_eq!(doc.style(div).get("margin"), "");
    /// ```
    #[must_use]
    pub fn get(&self, name: &str) -> &'a str {
        self.css_text()
            .split(';')
            .filter_map(split_declaration)
            .find(|(declared, _)| *declared == name)
            .map_or("", |(_, value)| value)
    }

    #[must_use]
    pub fn display(&self) -> &'a str {
        self.get("display")
    }
}

/// Write view over one element's `style` attribute.
#[derive(Debug)]
pub struct StyleMut<'a> {
    doc: &'a mut Document,
    element: NodeId,
}

impl<'a> StyleMut<'a> {
    pub(super) fn new(doc: &'a mut Document, element: NodeId) -> Self {
        Self { doc, element }
    }

    /// Returns a read view of the same attribute.
    #[must_use]
    pub fn as_style(&self) -> Style<'_> {
        Style::new(self.doc, self.element)
    }

    /// Sets `name` to `value`. Existing declarations of `name` are removed
    /// and the new one is appended; the rest of the text is kept as is.
    pub fn set(&mut self, name: &str, value: &str) {
        let current = self.as_style().css_text();

        let mut css = String::with_capacity(current.len() + name.len() + value.len() + 4);
        let mut rest = current;
        while !rest.is_empty() {
            let (declaration, tail) = match rest.find(';') {
                Some(end) => (&rest[..=end], &rest[end + 1..]),
                None => (rest, ""),
            };
            let body = declaration.strip_suffix(';').unwrap_or(declaration);
            let matches = split_declaration(body).is_some_and(|(declared, _)| declared == name);
            if !matches {
                css.push_str(declaration);
            }
            rest = tail;
        }

        if !css.trim().is_empty() {
            if !css.trim_end().ends_with(';') {
                css.push(';');
            }
            css.push(' ');
        } else {
            css.clear();
        }
        css.push_str(name);
        css.push_str(": ");
        css.push_str(value);
        css.push(';');

        self.doc.set_attribute(self.element, "style", &css);
    }

    pub fn set_display(&mut self, value: &str) {
        self.set("display", value);
    }
}

//! Recognized HTML tag identifiers.

/// Tag names the parser recognizes, sorted for binary search.
const KNOWN_TAGS: &[&str] = &[
    "a", "abbr", "acronym", "address", "applet", "area", "article", "aside", "audio", "b",
    "base", "basefont", "bdi", "bdo", "bgsound", "big", "blink", "blockquote", "body", "br",
    "button", "canvas", "caption", "center", "cite", "code", "col", "colgroup", "data",
    "datalist", "dd", "del", "details", "dfn", "dialog", "dir", "div", "dl", "dt", "em",
    "embed", "fieldset", "figcaption", "figure", "font", "footer", "form", "frame",
    "frameset", "h1", "h2", "h3", "h4", "h5", "h6", "head", "header", "hgroup", "hr", "html",
    "i", "iframe", "image", "img", "input", "ins", "isindex", "kbd", "keygen", "label",
    "legend", "li", "link", "listing", "main", "map", "mark", "marquee", "math", "menu",
    "menuitem", "meta", "meter", "multicol", "nav", "nextid", "nobr", "noembed", "noframes",
    "noscript", "object", "ol", "optgroup", "option", "output", "p", "param", "picture",
    "plaintext", "pre", "progress", "q", "rb", "rp", "rt", "rtc", "ruby", "s", "samp",
    "script", "section", "select", "small", "source", "spacer", "span", "strike", "strong",
    "style", "sub", "summary", "sup", "svg", "table", "tbody", "td", "template", "textarea",
    "tfoot", "th", "thead", "time", "title", "tr", "track", "tt", "u", "ul", "var", "video",
    "wbr", "xmp",
];

/// A tag identifier: either one of the recognized HTML tag names or
/// `Unknown` (custom elements, namespaced names, typos).
///
/// Recognized names are stored lowercase.
///
/// ```
/// use readable_dom::parse::Tag;
///
/// assert_eq!(Tag::lookup("DIV"), Tag::Known("div"));
/// assert_eq!(Tag::lookup("svg:rect"), Tag::Unknown);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    /// A recognized tag, by its normalized (lowercase) name.
    Known(&'static str),
    /// Any tag name not in the table.
    Unknown,
}

impl Tag {
    pub const HTML: Tag = Tag::Known("html");
    pub const HEAD: Tag = Tag::Known("head");
    pub const BODY: Tag = Tag::Known("body");
    pub const BASE: Tag = Tag::Known("base");
    pub const TITLE: Tag = Tag::Known("title");
    pub const DIV: Tag = Tag::Known("div");

    /// Looks up a tag name, ignoring ASCII case.
    #[must_use]
    pub fn lookup(name: &str) -> Self {
        if name.is_empty() || !name.is_ascii() {
            return Tag::Unknown;
        }
        let lower = name.to_ascii_lowercase();
        match KNOWN_TAGS.binary_search(&lower.as_str()) {
            Ok(index) => Tag::Known(KNOWN_TAGS[index]),
            Err(_) => Tag::Unknown,
        }
    }

    /// Returns the normalized name of a recognized tag.
    #[must_use]
    pub fn name(self) -> Option<&'static str> {
        match self {
            Tag::Known(name) => Some(name),
            Tag::Unknown => None,
        }
    }

    /// Returns `true` for recognized tags.
    #[must_use]
    pub fn is_known(self) -> bool {
        matches!(self, Tag::Known(_))
    }

    /// Returns `true` if this element never has content.
    #[must_use]
    pub fn is_void(self) -> bool {
        self.name().is_some_and(is_void_element)
    }
}

/// Returns true if the given lowercase tag name is a void element.
pub(crate) fn is_void_element(tag: &str) -> bool {
    matches!(
        tag,
        "area"
            | "base"
            | "basefont"
            | "bgsound"
            | "br"
            | "col"
            | "embed"
            | "frame"
            | "hr"
            | "image"
            | "img"
            | "input"
            | "isindex"
            | "keygen"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

/// Returns true if `tag` holds raw text that is not parsed as markup.
pub(crate) fn is_raw_text_element(tag: &str) -> bool {
    matches!(tag, "script" | "style" | "xmp" | "textarea" | "title")
}

/// Returns true if character references are decoded inside the raw text
/// element `tag`.
pub(crate) fn decodes_references(tag: &str) -> bool {
    matches!(tag, "textarea" | "title")
}

/// Returns true if `tag` belongs in `<head>` when seen before body content.
pub(crate) fn is_head_content_element(tag: &str) -> bool {
    matches!(
        tag,
        "title" | "meta" | "link" | "base" | "style" | "script" | "noscript"
    )
}

/// Returns true if opening `tag` implicitly closes an open `open_tag`.
pub(crate) fn auto_closes(open_tag: &str, tag: &str) -> bool {
    match open_tag {
        "p" => matches!(
            tag,
            "p" | "div"
                | "ul"
                | "ol"
                | "dl"
                | "pre"
                | "table"
                | "blockquote"
                | "address"
                | "h1"
                | "h2"
                | "h3"
                | "h4"
                | "h5"
                | "h6"
                | "hr"
                | "form"
                | "fieldset"
                | "section"
                | "article"
                | "aside"
                | "header"
                | "footer"
                | "nav"
                | "figure"
                | "figcaption"
                | "main"
                | "details"
                | "summary"
                | "menu"
        ),
        "li" => tag == "li",
        "dt" | "dd" => matches!(tag, "dt" | "dd"),
        "tr" => tag == "tr",
        "td" | "th" => matches!(tag, "td" | "th" | "tr"),
        "thead" | "tbody" => matches!(tag, "tbody" | "tfoot"),
        "tfoot" => tag == "tbody",
        "option" => matches!(tag, "option" | "optgroup"),
        "optgroup" => tag == "optgroup",
        _ => false,
    }
}

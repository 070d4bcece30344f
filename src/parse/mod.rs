//! Error-tolerant HTML parsing into an immutable parse tree.
//!
//! This module produces a [`ParseTree`]: a read-only record of the markup
//! with tag identifiers, decoded text, the exact source span of every text
//! run and start tag, and ordered attribute lists. The tree is the input of
//! the [`walker`](crate::walker) and, through it, the
//! [`builder`](crate::builder).
//!
//! The parser handles the patterns real pages are full of:
//!
//! - Missing closing tags (auto-closed following HTML 4 content rules)
//! - Unquoted and boolean attribute values
//! - Void elements (`<br>`, `<img>`, ...) and explicit `<x/>` self-closing
//! - Case-insensitive tag names
//! - Bare `&` characters and legacy entities without a semicolon
//! - Raw text content in `script`, `style`, `textarea`, `title` and `xmp`
//!
//! In document mode the tree always has an `html` root holding a `head`
//! and a `body`. In fragment mode a synthetic `html` wrapper is the root and
//! the parsed nodes become its children.
//!
//! Source spans are kept so that serializing the built document reproduces
//! the input, with one normalization in document mode: whitespace before
//! `<head>` is dropped, and anything after `</body>` or `</html>` is placed
//! at the end of the body. Whitespace between `</head>` and `<body>` is kept
//! between the two elements.
//!
//! # Examples
//!
//! ```
//! use readable_dom::parse::{parse_document, ParseNodeKind};
//!
//! let tree = parse_document("<p>Hello <b>world</b>");
//! let html = tree.root();
//! assert_eq!(tree.element(html).map(|e| e.name.as_str()), Some("html"));
//! assert_eq!(tree.children(html).len(), 2);
//! ```

mod entities;
mod input;
mod tag;

pub use entities::lookup_entity;
pub use tag::Tag;

use log::{debug, warn};

use crate::error::{ErrorSeverity, ParseDiagnostic};
use input::{is_html_whitespace, ParserInput};
use tag::{
    auto_closes, decodes_references, is_head_content_element, is_raw_text_element,
    is_void_element,
};

/// Default maximum element nesting depth.
pub const DEFAULT_MAX_DEPTH: usize = 512;

/// Options controlling parser behavior.
///
/// Use the builder pattern to configure options:
///
/// ```
/// use readable_dom::parse::ParseOptions;
///
/// let opts = ParseOptions::default().max_depth(64).no_warnings(true);
/// assert_eq!(opts.max_depth, 64);
/// ```
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Maximum element nesting depth. Elements opened past this depth are
    /// appended flat to the deepest open element.
    pub max_depth: usize,
    /// If true, suppress warning diagnostics. Errors are always recorded.
    pub no_warnings: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            no_warnings: false,
        }
    }
}

impl ParseOptions {
    /// Sets the maximum nesting depth.
    #[must_use]
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Enables or disables warning suppression.
    #[must_use]
    pub fn no_warnings(mut self, yes: bool) -> Self {
        self.no_warnings = yes;
        self
    }
}

// ---------------------------------------------------------------------------
// Parse tree
// ---------------------------------------------------------------------------

/// Index of a node in a [`ParseTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParseNodeId(u32);

impl ParseNodeId {
    #[allow(clippy::cast_possible_truncation)]
    fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    fn as_index(self) -> usize {
        self.0 as usize
    }
}

/// An attribute as written in the source, with its value decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseAttribute {
    /// The attribute name, lowercased.
    pub name: String,
    /// The decoded attribute value. Boolean attributes have an empty value.
    pub value: String,
}

/// Element payload of a parse node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseElement {
    /// The recognized tag, or [`Tag::Unknown`].
    pub tag: Tag,
    /// The tag name as parsed, lowercased (prefix included).
    pub name: String,
    /// The exact source text of the start tag, `<` through `>`. Empty for
    /// implied elements and the fragment wrapper.
    pub original_tag: String,
    /// Attributes in source order. Duplicate names keep the first value.
    pub attributes: Vec<ParseAttribute>,
}

/// Payload of a text-bearing parse node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseText {
    /// Decoded text (character references resolved, newlines normalized).
    pub text: String,
    /// The exact source span the node was produced from.
    pub original_text: String,
}

/// What kind of node a [`ParseNode`] is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseNodeKind {
    /// The document node at index 0.
    Document,
    /// An element.
    Element(ParseElement),
    /// A text run containing at least one non-whitespace character.
    Text(ParseText),
    /// A whitespace-only text run.
    Whitespace(ParseText),
    /// A `<![CDATA[...]]>` section. `text` is the section content and
    /// `original_text` includes the delimiters.
    CData(ParseText),
    /// A comment, with its content.
    Comment(String),
}

/// A node of the parse tree.
#[derive(Debug, Clone)]
pub struct ParseNode {
    /// The node payload.
    pub kind: ParseNodeKind,
    /// Parent node. Only the document node has none.
    pub parent: Option<ParseNodeId>,
    /// Children in document order.
    pub children: Vec<ParseNodeId>,
    /// Position of this node in its parent's `children`.
    pub index_within_parent: usize,
}

/// An immutable HTML parse tree.
///
/// Nodes live in a flat vector and are addressed by [`ParseNodeId`]. The
/// document node is always present; [`root`](Self::root) names the element
/// the walker starts from.
#[derive(Debug, Clone)]
pub struct ParseTree {
    nodes: Vec<ParseNode>,
    root: ParseNodeId,
    fragment_context: Option<Tag>,
    doctype: Option<String>,
    /// Diagnostics collected while parsing.
    pub diagnostics: Vec<ParseDiagnostic>,
}

impl Default for ParseTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ParseTree {
    /// Creates a tree holding only the document node.
    ///
    /// Together with [`append`](Self::append) and
    /// [`set_root`](Self::set_root) this lets other parsers produce trees
    /// the walker and builder consume.
    #[must_use]
    pub fn new() -> Self {
        let document = ParseNode {
            kind: ParseNodeKind::Document,
            parent: None,
            children: Vec::new(),
            index_within_parent: 0,
        };
        Self {
            nodes: vec![document],
            root: ParseNodeId(0),
            fragment_context: None,
            doctype: None,
            diagnostics: Vec::new(),
        }
    }

    /// Returns the document node.
    #[must_use]
    pub fn document(&self) -> ParseNodeId {
        ParseNodeId(0)
    }

    /// Returns the node the walker starts from: the `html` element, or the
    /// synthetic wrapper in fragment mode.
    #[must_use]
    pub fn root(&self) -> ParseNodeId {
        self.root
    }

    /// Sets the walk root.
    pub fn set_root(&mut self, root: ParseNodeId) {
        self.root = root;
    }

    /// The context tag for fragment trees, `None` for whole documents.
    #[must_use]
    pub fn fragment_context(&self) -> Option<Tag> {
        self.fragment_context
    }

    /// Marks the tree as a fragment parsed in the given context.
    pub fn set_fragment_context(&mut self, context: Option<Tag>) {
        self.fragment_context = context;
    }

    /// Returns `true` if this tree was parsed in fragment mode.
    #[must_use]
    pub fn is_fragment(&self) -> bool {
        self.fragment_context.is_some()
    }

    /// The name from the `<!DOCTYPE>` declaration, lowercased.
    #[must_use]
    pub fn doctype(&self) -> Option<&str> {
        self.doctype.as_deref()
    }

    /// Number of nodes in the tree, the document node included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always `false`: the document node exists from construction.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the node for `id`.
    #[must_use]
    pub fn node(&self, id: ParseNodeId) -> &ParseNode {
        &self.nodes[id.as_index()]
    }

    fn node_mut(&mut self, id: ParseNodeId) -> &mut ParseNode {
        &mut self.nodes[id.as_index()]
    }

    /// Returns the payload of `id`.
    #[must_use]
    pub fn kind(&self, id: ParseNodeId) -> &ParseNodeKind {
        &self.node(id).kind
    }

    /// Returns the element payload of `id`, if it is an element.
    #[must_use]
    pub fn element(&self, id: ParseNodeId) -> Option<&ParseElement> {
        match self.kind(id) {
            ParseNodeKind::Element(element) => Some(element),
            _ => None,
        }
    }

    /// Returns the text payload of `id` for text, whitespace and CDATA nodes.
    #[must_use]
    pub fn text(&self, id: ParseNodeId) -> Option<&ParseText> {
        match self.kind(id) {
            ParseNodeKind::Text(text)
            | ParseNodeKind::Whitespace(text)
            | ParseNodeKind::CData(text) => Some(text),
            _ => None,
        }
    }

    /// Returns the children of `id`.
    #[must_use]
    pub fn children(&self, id: ParseNodeId) -> &[ParseNodeId] {
        &self.node(id).children
    }

    /// Returns the parent of `id`.
    #[must_use]
    pub fn parent(&self, id: ParseNodeId) -> Option<ParseNodeId> {
        self.node(id).parent
    }

    /// Returns the first child of `id`.
    #[must_use]
    pub fn first_child(&self, id: ParseNodeId) -> Option<ParseNodeId> {
        self.node(id).children.first().copied()
    }

    /// Returns the next sibling of `id`.
    #[must_use]
    pub fn next_sibling(&self, id: ParseNodeId) -> Option<ParseNodeId> {
        let node = self.node(id);
        let parent = node.parent?;
        self.node(parent)
            .children
            .get(node.index_within_parent + 1)
            .copied()
    }

    /// Appends a new node as the last child of `parent`.
    pub fn append(&mut self, parent: ParseNodeId, kind: ParseNodeKind) -> ParseNodeId {
        let id = ParseNodeId::from_index(self.nodes.len());
        let index_within_parent = self.node(parent).children.len();
        self.nodes.push(ParseNode {
            kind,
            parent: Some(parent),
            children: Vec::new(),
            index_within_parent,
        });
        self.node_mut(parent).children.push(id);
        id
    }

    /// Inserts a new node into `parent`'s children just before `before`.
    fn insert_before(
        &mut self,
        parent: ParseNodeId,
        before: ParseNodeId,
        kind: ParseNodeKind,
    ) -> ParseNodeId {
        let at = self.node(before).index_within_parent;
        let id = ParseNodeId::from_index(self.nodes.len());
        self.nodes.push(ParseNode {
            kind,
            parent: Some(parent),
            children: Vec::new(),
            index_within_parent: at,
        });
        self.node_mut(parent).children.insert(at, id);
        let shifted = self.node(parent).children[at + 1..].to_vec();
        for sibling in shifted {
            self.node_mut(sibling).index_within_parent += 1;
        }
        id
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Parses a whole HTML document with default options.
///
/// The parser never fails: problems are recovered from and described in
/// [`ParseTree::diagnostics`].
#[must_use]
pub fn parse_document(input: &str) -> ParseTree {
    parse_document_with_options(input, &ParseOptions::default())
}

/// Parses a whole HTML document with the given options.
#[must_use]
pub fn parse_document_with_options(input: &str, options: &ParseOptions) -> ParseTree {
    let mut parser = HtmlParser::new(input, options, None);
    parser.parse()
}

/// Parses an HTML fragment as if it were the content of a `context`
/// element, with default options.
///
/// ```
/// use readable_dom::parse::{parse_fragment, Tag};
///
/// let tree = parse_fragment("<b>bold</b> text", Tag::DIV);
/// assert_eq!(tree.fragment_context(), Some(Tag::DIV));
/// assert_eq!(tree.children(tree.root()).len(), 2);
/// ```
#[must_use]
pub fn parse_fragment(input: &str, context: Tag) -> ParseTree {
    parse_fragment_with_options(input, context, &ParseOptions::default())
}

/// Parses an HTML fragment with the given options.
#[must_use]
pub fn parse_fragment_with_options(input: &str, context: Tag, options: &ParseOptions) -> ParseTree {
    let mut parser = HtmlParser::new(input, options, Some(context));
    parser.parse()
}

// ---------------------------------------------------------------------------
// The parser
// ---------------------------------------------------------------------------

/// Implied structural elements of a whole document.
#[derive(Debug, Clone, Copy)]
struct Structure {
    html: ParseNodeId,
    head: ParseNodeId,
    body: ParseNodeId,
}

/// The tokenizer and tree constructor.
///
/// The open-element stack always has the root (`html` or the fragment
/// wrapper) at the bottom; nothing ever pops it.
struct HtmlParser<'a> {
    input: ParserInput<'a>,
    tree: ParseTree,
    options: ParseOptions,
    /// Open elements and their lowercase names.
    open_elements: Vec<(ParseNodeId, String)>,
    /// Set in document mode.
    structure: Option<Structure>,
    /// Set once `</head>` has closed the head.
    head_closed: bool,
}

impl<'a> HtmlParser<'a> {
    fn new(input: &'a str, options: &ParseOptions, context: Option<Tag>) -> Self {
        let mut tree = ParseTree::new();
        tree.set_fragment_context(context);
        let document = tree.document();
        let html = tree.append(document, implied_element(Tag::HTML));
        tree.set_root(html);

        let structure = if context.is_none() {
            let head = tree.append(html, implied_element(Tag::HEAD));
            let body = tree.append(html, implied_element(Tag::BODY));
            Some(Structure { html, head, body })
        } else {
            None
        };

        Self {
            input: ParserInput::new(input),
            tree,
            options: options.clone(),
            open_elements: vec![(html, "html".to_string())],
            structure,
            head_closed: false,
        }
    }

    fn parse(&mut self) -> ParseTree {
        match self.tree.fragment_context() {
            Some(Tag::Known(context)) if is_raw_text_element(context) => {
                self.parse_raw_fragment(context);
            }
            _ => self.parse_content(),
        }

        debug!(
            "parsed {} nodes ({} diagnostics, fragment: {})",
            self.tree.len(),
            self.tree.diagnostics.len(),
            self.tree.is_fragment()
        );
        std::mem::take(&mut self.tree)
    }

    /// Parses a fragment whose context holds raw text: the whole input is a
    /// single text child of the wrapper.
    fn parse_raw_fragment(&mut self, context: &str) {
        let raw = self.input.remaining();
        if raw.is_empty() {
            return;
        }
        let text = if decodes_references(context) {
            self.decode_text(raw)
        } else {
            normalize_newlines(raw)
        };
        let root = self.tree.root();
        self.append_text(root, text, raw.to_string());
    }

    /// Returns the current insertion point.
    fn current_parent(&self) -> ParseNodeId {
        self.open_elements
            .last()
            .map_or_else(|| self.tree.root(), |&(id, _)| id)
    }

    fn parse_content(&mut self) {
        while !self.input.at_end() {
            if self.input.looking_at(b"<!--") {
                self.parse_comment();
            } else if self.input.looking_at_ci(b"<!doctype") {
                self.parse_doctype();
            } else if self.input.looking_at(b"<![CDATA[") {
                self.parse_cdata();
            } else if self.input.looking_at(b"</") {
                if self.input.peek_at(2).is_some_and(|b| b.is_ascii_alphabetic()) {
                    self.parse_end_tag();
                } else if self.input.peek_at(2) == Some(b'>') {
                    self.push_warning("empty end tag </> ignored".to_string());
                    self.input.advance(3);
                } else {
                    self.parse_bogus_comment(2);
                }
            } else if self.input.peek() == Some(b'<')
                && self.input.peek_at(1).is_some_and(|b| b.is_ascii_alphabetic())
            {
                self.parse_start_tag();
            } else if self.input.looking_at(b"<!") || self.input.looking_at(b"<?") {
                self.parse_bogus_comment(1);
            } else {
                self.parse_text();
            }
        }
    }

    // --- Structure (document mode) ---

    fn in_body(&self) -> bool {
        self.structure
            .is_some_and(|s| self.open_elements.iter().any(|&(id, _)| id == s.body))
    }

    fn head_open(&self) -> bool {
        self.structure
            .is_some_and(|s| self.open_elements.iter().any(|&(id, _)| id == s.head))
    }

    /// Makes `<head>` the insertion point.
    fn enter_head(&mut self) {
        if let Some(s) = self.structure {
            if !self.head_open() {
                self.open_elements.truncate(1);
                self.open_elements.push((s.head, "head".to_string()));
            }
        }
    }

    /// Makes `<body>` the insertion point, closing `<head>` if needed.
    fn enter_body(&mut self) {
        if let Some(s) = self.structure {
            if !self.in_body() {
                self.open_elements.truncate(1);
                self.open_elements.push((s.body, "body".to_string()));
            }
        }
    }

    /// Merges attributes from a structural tag into an implied element.
    /// Existing names keep their value.
    fn merge_attributes(&mut self, id: ParseNodeId, attrs: Vec<ParseAttribute>) {
        if let ParseNodeKind::Element(element) = &mut self.tree.node_mut(id).kind {
            for attr in attrs {
                if !element.attributes.iter().any(|a| a.name == attr.name) {
                    element.attributes.push(attr);
                }
            }
        }
    }

    /// Handles `<html>`, `<head>` and `<body>` start tags.
    fn handle_structural_start(&mut self, name: &str, attributes: Vec<ParseAttribute>) {
        let Some(s) = self.structure else {
            self.push_warning(format!("<{name}> ignored in fragment"));
            return;
        };
        match name {
            "html" => self.merge_attributes(s.html, attributes),
            "head" => {
                if self.in_body() {
                    self.push_warning("<head> after body content ignored".to_string());
                } else {
                    self.enter_head();
                    self.merge_attributes(s.head, attributes);
                }
            }
            _ => {
                self.enter_body();
                self.merge_attributes(s.body, attributes);
            }
        }
    }

    /// Chooses `<head>` or `<body>` as the parent for a new element in
    /// document mode.
    fn place_element(&mut self, name: &str) {
        if self.structure.is_none() {
            return;
        }
        if is_head_content_element(name) && !self.in_body() {
            self.enter_head();
        } else {
            self.enter_body();
        }
    }

    fn handle_auto_close(&mut self, new_tag: &str) {
        while self.open_elements.len() > 1
            && self
                .open_elements
                .last()
                .is_some_and(|(_, open_tag)| auto_closes(open_tag, new_tag))
        {
            self.open_elements.pop();
        }
    }

    // --- DOCTYPE ---

    fn parse_doctype(&mut self) {
        self.input.advance(9); // "<!doctype"
        self.input.skip_whitespace();
        let name = self
            .input
            .take_while(|c| c != '>' && !c.is_ascii_whitespace())
            .to_ascii_lowercase();
        let (_, closed) = self.input.take_until(b">");
        if !closed {
            self.push_warning("unterminated doctype".to_string());
        }
        if self.tree.is_fragment() {
            return;
        }
        if self.tree.doctype.is_none() {
            self.tree.doctype = Some(name);
        } else {
            self.push_warning("extra doctype ignored".to_string());
        }
    }

    // --- Start Tag ---

    fn parse_start_tag(&mut self) {
        let start = self.input.pos();
        self.input.advance(1); // consume '<'
        let name = self.parse_tag_name().to_ascii_lowercase();

        let attributes = self.parse_attributes();

        let explicit_self_close = self.input.looking_at(b"/>");
        if explicit_self_close {
            self.input.advance(2);
        } else if self.input.peek() == Some(b'>') {
            self.input.advance(1);
        } else {
            self.push_warning(format!("unterminated start tag <{name}>"));
        }
        let original_tag = self.input.slice(start, self.input.pos()).to_string();

        if matches!(name.as_str(), "html" | "head" | "body") {
            self.handle_structural_start(&name, attributes);
            return;
        }

        self.handle_auto_close(&name);
        self.place_element(&name);

        let parent = self.current_parent();
        let element = ParseElement {
            tag: Tag::lookup(&name),
            name: name.clone(),
            original_tag,
            attributes,
        };
        let id = self.tree.append(parent, ParseNodeKind::Element(element));

        if is_raw_text_element(&name) {
            if !explicit_self_close {
                self.parse_raw_text(id, &name);
            }
            return;
        }
        if is_void_element(&name) || explicit_self_close {
            return;
        }
        if self.open_elements.len() >= self.options.max_depth {
            warn!(
                "nesting depth limit {} reached, flattening <{name}>",
                self.options.max_depth
            );
            self.push_diagnostic(
                ErrorSeverity::Error,
                format!(
                    "maximum nesting depth {} exceeded, <{name}> not nested",
                    self.options.max_depth
                ),
            );
            return;
        }
        self.open_elements.push((id, name));
    }

    /// Parses a tag name. Returns the name as written.
    fn parse_tag_name(&mut self) -> &'a str {
        self.input
            .take_while(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':' | '.'))
    }

    // --- End Tag ---

    fn parse_end_tag(&mut self) {
        self.input.advance(2); // consume '</'
        let name = self.parse_tag_name().to_ascii_lowercase();
        let (_, closed) = self.input.take_until(b">");
        if !closed {
            self.push_warning(format!("unterminated end tag </{name}>"));
        }

        match name.as_str() {
            "html" | "body" => return,
            "head" => {
                if self.head_open() {
                    self.open_elements.truncate(1);
                    self.head_closed = true;
                }
                return;
            }
            _ => {}
        }

        if is_void_element(&name) {
            self.push_warning(format!("end tag for void element </{name}> ignored"));
            return;
        }

        let found = self.open_elements[1..]
            .iter()
            .rposition(|(_, open)| *open == name)
            .map(|index| index + 1);

        if let Some(index) = found {
            for (_, closed_tag) in &self.open_elements[index + 1..] {
                if !self.options.no_warnings {
                    let message = format!("implicitly closing <{closed_tag}> before </{name}>");
                    self.tree.diagnostics.push(ParseDiagnostic {
                        severity: ErrorSeverity::Warning,
                        message,
                        location: self.input.location(),
                    });
                }
            }
            self.open_elements.truncate(index);
        } else {
            self.push_warning(format!("stray end tag </{name}>"));
        }
    }

    // --- Attributes ---

    fn parse_attributes(&mut self) -> Vec<ParseAttribute> {
        let mut attributes: Vec<ParseAttribute> = Vec::new();

        loop {
            self.input.skip_whitespace();

            if self.input.at_end() || self.input.peek() == Some(b'>') || self.input.looking_at(b"/>")
            {
                break;
            }

            let name = self.input.take_while(|c| {
                !matches!(c, '=' | '>' | '/' | '<' | '"' | '\'') && !c.is_ascii_whitespace()
            });
            if name.is_empty() {
                // Skip the stray character and continue
                self.input.next_char();
                continue;
            }
            let name = name.to_ascii_lowercase();

            self.input.skip_whitespace();
            let value = if self.input.peek() == Some(b'=') {
                self.input.advance(1);
                self.input.skip_whitespace();
                self.parse_attr_value()
            } else {
                String::new()
            };

            if attributes.iter().any(|a| a.name == name) {
                self.push_warning(format!("duplicate attribute {name} ignored"));
                continue;
            }
            attributes.push(ParseAttribute { name, value });
        }

        attributes
    }

    /// Parses an attribute value. Handles quoted and unquoted values.
    fn parse_attr_value(&mut self) -> String {
        match self.input.peek() {
            Some(quote @ (b'"' | b'\'')) => {
                self.input.advance(1);
                let (raw, closed) = self.input.take_until(&[quote]);
                if !closed {
                    self.push_warning("unterminated attribute value".to_string());
                }
                self.decode_text(raw)
            }
            _ => {
                let raw = self
                    .input
                    .take_while(|c| c != '>' && !c.is_ascii_whitespace());
                self.decode_text(raw)
            }
        }
    }

    // --- Text Content ---

    /// Returns `true` if the input is at something other than literal text.
    fn at_markup_start(&self) -> bool {
        self.input.peek() == Some(b'<')
            && self
                .input
                .peek_at(1)
                .is_some_and(|b| b.is_ascii_alphabetic() || matches!(b, b'/' | b'!' | b'?'))
    }

    fn parse_text(&mut self) {
        let start = self.input.pos();
        // The first character is literal even if it is a '<'
        self.input.next_char();
        while !self.input.at_end() && !self.at_markup_start() {
            self.input.next_char();
        }
        let raw = self.input.slice(start, self.input.pos());
        let text = self.decode_text(raw);

        if self.structure.is_some() && !self.in_body() {
            if text.bytes().all(is_html_whitespace) {
                // Whitespace before <head> is dropped; between </head> and
                // <body> it stays a child of <html>
                if self.head_open() {
                    let parent = self.current_parent();
                    self.append_text(parent, text, raw.to_string());
                } else if let Some(s) = self.structure.filter(|_| self.head_closed) {
                    let payload = ParseText {
                        text,
                        original_text: raw.to_string(),
                    };
                    self.tree
                        .insert_before(s.html, s.body, ParseNodeKind::Whitespace(payload));
                }
                return;
            }
            self.enter_body();
        }
        let parent = self.current_parent();
        self.append_text(parent, text, raw.to_string());
    }

    /// Appends a text or whitespace node to `parent`.
    fn append_text(&mut self, parent: ParseNodeId, text: String, original_text: String) {
        let whitespace = text.bytes().all(is_html_whitespace);
        let payload = ParseText {
            text,
            original_text,
        };
        let kind = if whitespace {
            ParseNodeKind::Whitespace(payload)
        } else {
            ParseNodeKind::Text(payload)
        };
        self.tree.append(parent, kind);
    }

    // --- Raw text (script/style/textarea/title/xmp) ---

    fn parse_raw_text(&mut self, element: ParseNodeId, tag: &str) {
        let end_tag = format!("</{tag}");
        let start = self.input.pos();
        let mut closed = false;
        while !self.input.at_end() {
            if self.input.looking_at_ci(end_tag.as_bytes())
                && self
                    .input
                    .peek_at(end_tag.len())
                    .map_or(true, |b| b == b'>' || b == b'/' || is_html_whitespace(b))
            {
                closed = true;
                break;
            }
            self.input.next_char();
        }
        let raw = self.input.slice(start, self.input.pos());

        if !raw.is_empty() {
            let text = if decodes_references(tag) {
                self.decode_text(raw)
            } else {
                normalize_newlines(raw)
            };
            self.append_text(element, text, raw.to_string());
        }

        if closed {
            self.input.advance(end_tag.len());
            self.input.take_until(b">");
        } else {
            self.push_warning(format!("unclosed raw text element <{tag}>"));
        }
    }

    // --- Comments and CDATA ---

    fn parse_comment(&mut self) {
        self.input.advance(4); // consume '<!--'

        // Abrupt closing: <!--> and <!--->
        for abrupt in [&b">"[..], &b"->"[..]] {
            if self.input.looking_at(abrupt) {
                self.input.advance(abrupt.len());
                let parent = self.current_parent();
                self.tree.append(parent, ParseNodeKind::Comment(String::new()));
                return;
            }
        }

        let (content, closed) = self.input.take_until(b"-->");
        if !closed {
            self.push_warning("unterminated comment".to_string());
            return;
        }
        let parent = self.current_parent();
        self.tree
            .append(parent, ParseNodeKind::Comment(content.to_string()));
    }

    /// Treats `<!...>`, `<?...>` and malformed end tags as comments. `skip`
    /// is the number of bytes before the comment content.
    fn parse_bogus_comment(&mut self, skip: usize) {
        self.push_warning("malformed markup treated as a comment".to_string());
        self.input.advance(skip);
        let (content, _) = self.input.take_until(b">");
        let parent = self.current_parent();
        self.tree
            .append(parent, ParseNodeKind::Comment(content.to_string()));
    }

    fn parse_cdata(&mut self) {
        let start = self.input.pos();
        self.input.advance(9); // consume '<![CDATA['
        let (content, closed) = self.input.take_until(b"]]>");
        if !closed {
            self.push_warning("unterminated CDATA section".to_string());
        }
        let original_text = self.input.slice(start, self.input.pos()).to_string();
        let text = normalize_newlines(content);

        if self.structure.is_some() && !self.in_body() {
            self.enter_body();
        }
        let parent = self.current_parent();
        self.tree.append(
            parent,
            ParseNodeKind::CData(ParseText {
                text,
                original_text,
            }),
        );
    }

    // --- Character references ---

    /// Decodes character references in `raw` and normalizes newlines.
    fn decode_text(&mut self, raw: &str) -> String {
        if !raw.contains(['&', '\r']) {
            return raw.to_string();
        }
        let mut out = String::with_capacity(raw.len());
        let mut rest = raw;
        while let Some(index) = rest.find(['&', '\r']) {
            out.push_str(&rest[..index]);
            rest = &rest[index..];
            if let Some(after_cr) = rest.strip_prefix('\r') {
                out.push('\n');
                rest = after_cr.strip_prefix('\n').unwrap_or(after_cr);
                continue;
            }
            let (decoded, consumed) = self.decode_reference(rest);
            out.push_str(&decoded);
            rest = &rest[consumed..];
        }
        out.push_str(rest);
        out
    }

    /// Decodes the character reference at the start of `s` (which begins
    /// with `&`). Returns the replacement and the number of bytes consumed;
    /// a bare `&` consumes one byte and stays literal.
    fn decode_reference(&mut self, s: &str) -> (String, usize) {
        let body = &s[1..];

        if let Some(numeric) = body.strip_prefix('#') {
            let (digits, radix, prefix_len) = match numeric.strip_prefix(['x', 'X']) {
                Some(hex) => (leading(hex, |c| c.is_ascii_hexdigit()), 16, 3),
                None => (leading(numeric, |c| c.is_ascii_digit()), 10, 2),
            };
            if digits.is_empty() {
                return ("&".to_string(), 1);
            }
            let mut consumed = prefix_len + digits.len();
            if s[consumed..].starts_with(';') {
                consumed += 1;
            } else {
                self.push_warning(format!("character reference {} missing semicolon", &s[..consumed]));
            }
            let ch = u32::from_str_radix(digits, radix)
                .ok()
                .filter(|&value| value != 0)
                .and_then(char::from_u32)
                .unwrap_or(char::REPLACEMENT_CHARACTER);
            return (ch.to_string(), consumed);
        }

        let name = leading(body, |c| c.is_ascii_alphanumeric());
        if name.is_empty() {
            return ("&".to_string(), 1);
        }
        if body[name.len()..].starts_with(';') {
            if let Some(value) = lookup_entity(name) {
                return (value.to_string(), name.len() + 2);
            }
            self.push_warning(format!("unknown entity reference &{name};"));
            return ("&".to_string(), 1);
        }
        if entities::allows_missing_semicolon(name) {
            if let Some(value) = lookup_entity(name) {
                self.push_warning(format!("entity reference &{name} missing semicolon"));
                return (value.to_string(), name.len() + 1);
            }
        }
        ("&".to_string(), 1)
    }

    // --- Diagnostics ---

    /// Pushes a warning diagnostic. Respects the `no_warnings` option.
    fn push_warning(&mut self, message: String) {
        if self.options.no_warnings {
            return;
        }
        self.push_diagnostic(ErrorSeverity::Warning, message);
    }

    fn push_diagnostic(&mut self, severity: ErrorSeverity, message: String) {
        self.tree.diagnostics.push(ParseDiagnostic {
            severity,
            message,
            location: self.input.location(),
        });
    }
}

fn implied_element(tag: Tag) -> ParseNodeKind {
    ParseNodeKind::Element(ParseElement {
        tag,
        name: tag.name().unwrap_or_default().to_string(),
        original_tag: String::new(),
        attributes: Vec::new(),
    })
}

/// Returns the longest prefix of `s` whose characters satisfy `pred`.
fn leading(s: &str, pred: impl Fn(char) -> bool) -> &str {
    let end = s.find(|c: char| !pred(c)).unwrap_or(s.len());
    &s[..end]
}

/// Converts `\r\n` and lone `\r` to `\n`.
fn normalize_newlines(s: &str) -> String {
    if s.contains('\r') {
        s.replace("\r\n", "\n").replace('\r', "\n")
    } else {
        s.to_string()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn element_names(tree: &ParseTree, id: ParseNodeId) -> Vec<String> {
        tree.children(id)
            .iter()
            .filter_map(|&child| tree.element(child))
            .map(|e| e.name.clone())
            .collect()
    }

    fn find_element(tree: &ParseTree, name: &str) -> ParseNodeId {
        (0..tree.len())
            .map(ParseNodeId::from_index)
            .find(|&id| tree.element(id).is_some_and(|e| e.name == name))
            .unwrap_or_else(|| panic!("no <{name}> in tree"))
    }

    // --- Structure ---

    #[test]
    fn test_document_has_implied_structure() {
        let tree = parse_document("<p>Hello</p>");
        let html = tree.root();
        assert_eq!(tree.parent(html), Some(tree.document()));
        assert_eq!(element_names(&tree, html), vec!["head", "body"]);
        let body = find_element(&tree, "body");
        assert_eq!(element_names(&tree, body), vec!["p"]);
        assert!(!tree.is_fragment());
    }

    #[test]
    fn test_whitespace_between_head_and_body_stays_in_html() {
        let tree = parse_document(
            "\n<html>\n<head><title>T</title></head>\n<body><p>x</p>\n</body>\n</html>\n",
        );
        let html = tree.root();
        let head = find_element(&tree, "head");
        let body = find_element(&tree, "body");
        let children = tree.children(html).to_vec();
        assert_eq!(children.len(), 3);
        assert_eq!(children[0], head);
        assert!(matches!(tree.kind(children[1]), ParseNodeKind::Whitespace(_)));
        assert_eq!(tree.text(children[1]).unwrap().original_text, "\n");
        assert_eq!(children[2], body);
        assert_eq!(tree.next_sibling(head), Some(children[1]));
        assert_eq!(tree.next_sibling(children[1]), Some(body));
        assert_eq!(element_names(&tree, body), vec!["p"]);
    }

    #[test]
    fn test_explicit_structure_merges_attributes() {
        let tree =
            parse_document(r#"<html lang="en"><head></head><body class="a" class="b"><p>x</p></body></html>"#);
        let html = tree.root();
        assert_eq!(tree.children(tree.document()).len(), 1);
        assert_eq!(element_names(&tree, html), vec!["head", "body"]);
        let attrs = &tree.element(html).unwrap().attributes;
        assert_eq!(attrs[0].name, "lang");
        let body = find_element(&tree, "body");
        let body_attrs = &tree.element(body).unwrap().attributes;
        assert_eq!(body_attrs.len(), 1);
        assert_eq!(body_attrs[0].value, "a");
    }

    #[test]
    fn test_head_content_goes_to_head() {
        let tree = parse_document("<title>T</title><meta charset=utf-8><p>body</p><style>x</style>");
        let head = find_element(&tree, "head");
        let body = find_element(&tree, "body");
        assert_eq!(element_names(&tree, head), vec!["title", "meta"]);
        assert_eq!(element_names(&tree, body), vec!["p", "style"]);
    }

    #[test]
    fn test_content_after_body_end_stays_in_body() {
        let tree = parse_document("<body><p>a</p></body></html><div>late</div>");
        let body = find_element(&tree, "body");
        assert_eq!(element_names(&tree, body), vec!["p", "div"]);
    }

    #[test]
    fn test_doctype_recorded() {
        let tree = parse_document("<!DOCTYPE HTML><p>x</p>");
        assert_eq!(tree.doctype(), Some("html"));
        assert_eq!(tree.children(tree.document()).len(), 1);
    }

    // --- Elements ---

    #[test]
    fn test_original_tag_span() {
        let tree = parse_document(r#"<a0:DIV  data-x = 'y' >t</a0:DIV>"#);
        let div = find_element(&tree, "a0:div");
        let element = tree.element(div).unwrap();
        assert_eq!(element.original_tag, "<a0:DIV  data-x = 'y' >");
        assert_eq!(element.tag, Tag::Unknown);
        assert_eq!(element.attributes[0].value, "y");
    }

    #[test]
    fn test_void_and_self_closing() {
        let tree = parse_document("<p>a<br>b<span/>c</p>");
        let p = find_element(&tree, "p");
        assert_eq!(tree.children(p).len(), 5);
        let br = find_element(&tree, "br");
        assert!(tree.children(br).is_empty());
        let span = find_element(&tree, "span");
        assert!(tree.children(span).is_empty());
    }

    #[test]
    fn test_auto_close_paragraph() {
        let tree = parse_document("<p>one<p>two<div>three</div>");
        let body = find_element(&tree, "body");
        assert_eq!(element_names(&tree, body), vec!["p", "p", "div"]);
    }

    #[test]
    fn test_end_tag_closes_intervening() {
        let tree = parse_document("<div><b><i>x</div>y");
        let body = find_element(&tree, "body");
        assert_eq!(element_names(&tree, body), vec!["div"]);
        assert_eq!(tree.children(body).len(), 2);
        assert!(tree
            .diagnostics
            .iter()
            .any(|d| d.message.contains("implicitly closing <i>")));
    }

    #[test]
    fn test_stray_end_tag_warns() {
        let tree = parse_document("<p>x</span></p>");
        assert!(tree.diagnostics.iter().any(|d| d.message == "stray end tag </span>"));
        let quiet = parse_document_with_options("<p>x</span></p>", &ParseOptions::default().no_warnings(true));
        assert!(quiet.diagnostics.is_empty());
    }

    #[test]
    fn test_attributes() {
        let tree = parse_document(r#"<input type=text disabled value="a &amp; b" TYPE="number">"#);
        let input = find_element(&tree, "input");
        let attrs = &tree.element(input).unwrap().attributes;
        assert_eq!(
            attrs,
            &vec![
                ParseAttribute { name: "type".into(), value: "text".into() },
                ParseAttribute { name: "disabled".into(), value: String::new() },
                ParseAttribute { name: "value".into(), value: "a & b".into() },
            ]
        );
    }

    #[test]
    fn test_depth_limit_flattens() {
        let opts = ParseOptions::default().max_depth(4);
        let tree = parse_document_with_options("<div><div><div><div>x</div></div></div></div>", &opts);
        // html, body, div, div are open; the next two divs are appended flat
        let body = find_element(&tree, "body");
        let outer = tree.children(body)[0];
        let inner = tree.children(outer)[0];
        assert_eq!(element_names(&tree, inner), vec!["div", "div"]);
        assert!(tree
            .diagnostics
            .iter()
            .any(|d| d.severity == ErrorSeverity::Error));
    }

    // --- Text ---

    #[test]
    fn test_text_keeps_source_span() {
        let tree = parse_document("<p>a &amp; b &lt;c&gt; &apos;</p>");
        let p = find_element(&tree, "p");
        let text = tree.text(tree.children(p)[0]).unwrap();
        assert_eq!(text.text, "a & b <c> '");
        assert_eq!(text.original_text, "a &amp; b &lt;c&gt; &apos;");
    }

    #[test]
    fn test_bare_ampersand_and_lt_stay_literal() {
        let tree = parse_document("<p>fish & chips < 3 &unknown; &#;</p>");
        let p = find_element(&tree, "p");
        let text = tree.text(tree.children(p)[0]).unwrap();
        assert_eq!(text.text, "fish & chips < 3 &unknown; &#;");
    }

    #[test]
    fn test_numeric_references() {
        let tree = parse_document("<p>&#65;&#x42;&#X43;&#0;&#169</p>");
        let p = find_element(&tree, "p");
        let text = tree.text(tree.children(p)[0]).unwrap();
        assert_eq!(text.text, "ABC\u{FFFD}\u{A9}");
    }

    #[test]
    fn test_newline_normalization() {
        let tree = parse_document("<p>a\r\nb\rc</p>");
        let p = find_element(&tree, "p");
        let text = tree.text(tree.children(p)[0]).unwrap();
        assert_eq!(text.text, "a\nb\nc");
        assert_eq!(text.original_text, "a\r\nb\rc");
    }

    #[test]
    fn test_whitespace_nodes() {
        let tree = parse_document("<div> <p>x</p>\n</div>");
        let div = find_element(&tree, "div");
        let kinds: Vec<_> = tree
            .children(div)
            .iter()
            .map(|&id| matches!(tree.kind(id), ParseNodeKind::Whitespace(_)))
            .collect();
        assert_eq!(kinds, vec![true, false, true]);
    }

    #[test]
    fn test_raw_text_elements() {
        let tree = parse_document(
            "<p>before</p><script>if (a < b && c) { x = '</p>'; }</script><p>after</p>",
        );
        let script = find_element(&tree, "script");
        let text = tree.text(tree.children(script)[0]).unwrap();
        assert_eq!(text.text, "if (a < b && c) { x = '</p>'; }");
        assert_eq!(text.text, text.original_text);
        let body = find_element(&tree, "body");
        assert_eq!(element_names(&tree, body), vec!["p", "script", "p"]);
    }

    #[test]
    fn test_title_decodes_references() {
        let tree = parse_document("<title>A &amp; B <b></title>");
        let title = find_element(&tree, "title");
        let text = tree.text(tree.children(title)[0]).unwrap();
        assert_eq!(text.text, "A & B <b>");
        assert_eq!(text.original_text, "A &amp; B <b>");
    }

    #[test]
    fn test_comments_and_cdata() {
        let tree = parse_document("<p>a<!--x-->b<![CDATA[c<d]]><!-->e</p>");
        let p = find_element(&tree, "p");
        let kinds: Vec<_> = tree.children(p).iter().map(|&id| tree.kind(id).clone()).collect();
        assert_eq!(kinds.len(), 6);
        assert_eq!(kinds[1], ParseNodeKind::Comment("x".to_string()));
        assert_eq!(
            kinds[3],
            ParseNodeKind::CData(ParseText {
                text: "c<d".to_string(),
                original_text: "<![CDATA[c<d]]>".to_string(),
            })
        );
        assert_eq!(kinds[4], ParseNodeKind::Comment(String::new()));
    }

    #[test]
    fn test_bogus_markup_becomes_comment() {
        let tree = parse_document("<p><?php echo 1 ?>x</p>");
        let p = find_element(&tree, "p");
        assert_eq!(
            tree.kind(tree.children(p)[0]),
            &ParseNodeKind::Comment("?php echo 1 ?".to_string())
        );
    }

    // --- Fragments ---

    #[test]
    fn test_fragment_wrapper() {
        let tree = parse_fragment("a<b>c</b><body>d", Tag::DIV);
        let root = tree.root();
        assert_eq!(tree.element(root).unwrap().name, "html");
        assert_eq!(tree.element(root).unwrap().original_tag, "");
        assert_eq!(tree.children(root).len(), 3);
        assert_eq!(element_names(&tree, root), vec!["b"]);
    }

    #[test]
    fn test_raw_text_fragment_context() {
        let tree = parse_fragment("<b>x</b> &amp;", Tag::lookup("textarea"));
        let root = tree.root();
        assert_eq!(tree.children(root).len(), 1);
        let text = tree.text(tree.children(root)[0]).unwrap();
        assert_eq!(text.text, "<b>x</b> &");

        let tree = parse_fragment("<b>x</b> &amp;", Tag::lookup("script"));
        let text = tree.text(tree.children(tree.root())[0]).unwrap();
        assert_eq!(text.text, "<b>x</b> &amp;");
    }

    #[test]
    fn test_next_sibling() {
        let tree = parse_fragment("<i>1</i><b>2</b>", Tag::BODY);
        let first = tree.first_child(tree.root()).unwrap();
        let second = tree.next_sibling(first).unwrap();
        assert_eq!(tree.element(second).unwrap().name, "b");
        assert_eq!(tree.next_sibling(second), None);
        assert_eq!(tree.next_sibling(tree.document()), None);
    }
}

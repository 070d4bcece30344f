//! # readable-dom
//!
//! A mutable, browser-like document model built from an HTML parse tree,
//! with the surface a content-extraction heuristic needs: navigation over
//! all children and over element children only, attribute and inline style
//! access, `innerHTML` / `textContent` getters and setters, tree mutation and
//! tag-name / id lookup.
//!
//! ## Quick Start
//!
//! ```
//! use readable_dom::Document;
//!
//! let mut doc = Document::parse(
//!     "<div id=main><p>Hello <a href=\"/w\">world</a></p></div>",
//!     "https://example.com/",
//! );
//! let main = doc.get_element_by_id(doc.root(), "main").unwrap();
//! assert_eq!(doc.text_content(main), "Hello world");
//!
//! let link = doc.get_elements_by_tag_name(main, "a")[0];
//! doc.set_href(link, "/elsewhere");
//! assert_eq!(doc.inner_html(main), "<p>Hello <a href=\"/elsewhere\">world</a></p>");
//! ```
//!
//! ## Pipeline
//!
//! [`parse`] produces an immutable [`parse::ParseTree`], [`walker`] turns it
//! into open/text/close events and [`builder`] consumes those events to
//! populate a [`Document`].

pub mod builder;
pub mod dom;
pub mod encoding;
pub mod error;
pub mod parse;
pub mod walker;

// Re-export primary types at the crate root for convenience.
pub use dom::{Document, NodeId, NodeKind, NodeType};
pub use error::DomError;
pub use parse::Tag;

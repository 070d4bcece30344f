//! Error types and parse diagnostics.
//!
//! Two families live here:
//!
//! - [`DomError`], returned by tree mutations that were handed a node in the
//!   wrong position (for example removing a node that is not a child).
//! - [`ParseDiagnostic`], collected by the HTML parser. The parser never
//!   fails; malformed markup is recovered and described by diagnostics with
//!   line, column and byte offset information.

use std::fmt;

/// Severity level for a parse diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorSeverity {
    /// A non-fatal issue, the markup was normalized.
    Warning,
    /// A recovered error that changed the shape of the tree (for example
    /// elements flattened past the nesting limit).
    Error,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Source location within an HTML document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceLocation {
    /// 1-based line number.
    pub line: u32,
    /// 1-based column number (in characters, not bytes).
    pub column: u32,
    /// 0-based byte offset from the start of the input.
    pub byte_offset: usize,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A single diagnostic emitted during parsing.
#[derive(Debug, Clone)]
pub struct ParseDiagnostic {
    /// The severity of this diagnostic.
    pub severity: ErrorSeverity,
    /// Human-readable message.
    pub message: String,
    /// Where in the source this occurred.
    pub location: SourceLocation,
}

impl fmt::Display for ParseDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} at {}",
            self.severity, self.message, self.location
        )
    }
}

/// The error type returned by document mutations.
///
/// A failed mutation never changes the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomError {
    /// The reference node is not a direct child of the given parent.
    NotFound,
    /// The insertion would produce an invalid tree: a cycle, a child under a
    /// node that cannot have children, or a Document node as a child.
    HierarchyRequest,
}

impl fmt::Display for DomError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "node is not a child of this parent"),
            Self::HierarchyRequest => write!(f, "node cannot be inserted at this position"),
        }
    }
}

impl std::error::Error for DomError {}

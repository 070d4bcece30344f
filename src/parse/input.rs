//! Low-level input handling for the HTML parser.
//!
//! [`ParserInput`] wraps the source string and tracks position (line,
//! column, byte offset). It offers the peeking, advancing and lookahead
//! primitives the tokenizer is written in terms of.

use crate::error::SourceLocation;

/// Cursor over the HTML source.
///
/// The source is kept as `&str`, so every position the cursor stops at is a
/// character boundary and slices of the input can be handed out as `&str`
/// without re-validation.
pub(crate) struct ParserInput<'a> {
    /// The source text.
    input: &'a str,
    /// Current byte offset in `input`.
    pos: usize,
    /// Current line number (1-based).
    line: u32,
    /// Current column number (1-based, in characters).
    column: u32,
}

impl<'a> ParserInput<'a> {
    /// Creates a new `ParserInput` positioned at the start of `input`.
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    // -- Position queries --

    /// Returns the current source location.
    pub fn location(&self) -> SourceLocation {
        SourceLocation {
            line: self.line,
            column: self.column,
            byte_offset: self.pos,
        }
    }

    /// Returns `true` if all input has been consumed.
    pub fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Returns the current byte offset.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Returns the source text between two byte offsets previously returned
    /// by [`pos`](Self::pos).
    pub fn slice(&self, start: usize, end: usize) -> &'a str {
        &self.input[start..end]
    }

    /// Returns the unconsumed remainder of the input.
    pub fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    // -- Peek operations --

    /// Returns the byte at the current position without consuming it.
    pub fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    /// Returns the byte at `current_position + offset` without consuming.
    pub fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.as_bytes().get(self.pos + offset).copied()
    }

    /// Returns the character at the current position without consuming it.
    fn peek_char(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    // -- Advance operations --

    /// Advances the position by `count` bytes, updating line/column.
    ///
    /// Callers only skip over ASCII they have already matched, so the cursor
    /// stays on a character boundary.
    pub fn advance(&mut self, count: usize) {
        let end = (self.pos + count).min(self.input.len());
        for &b in &self.input.as_bytes()[self.pos..end] {
            if b == b'\n' {
                self.line += 1;
                self.column = 1;
            } else if b & 0xC0 != 0x80 {
                self.column += 1;
            }
        }
        self.pos = end;
    }

    /// Consumes and returns the next character.
    pub fn next_char(&mut self) -> Option<char> {
        let ch = self.peek_char()?;
        self.pos += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    // -- Lookahead --

    /// Returns `true` if the remaining input starts with `s`.
    pub fn looking_at(&self, s: &[u8]) -> bool {
        self.remaining().as_bytes().starts_with(s)
    }

    /// Case-insensitive (ASCII) variant of [`looking_at`](Self::looking_at).
    pub fn looking_at_ci(&self, expected: &[u8]) -> bool {
        self.remaining()
            .as_bytes()
            .get(..expected.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(expected))
    }

    // -- Whitespace --

    /// Skips HTML whitespace. Returns `true` if any was consumed.
    pub fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if is_html_whitespace(b) {
                self.advance(1);
            } else {
                break;
            }
        }
        self.pos > start
    }

    // -- Take while --

    /// Consumes characters while `pred` returns `true` and returns them.
    pub fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while let Some(ch) = self.peek_char() {
            if !pred(ch) {
                break;
            }
            self.next_char();
        }
        self.slice(start, self.pos)
    }

    /// Consumes input up to and including the next occurrence of `delim`,
    /// returning the text before it. At end of input, returns everything
    /// that was left and `false`.
    pub fn take_until(&mut self, delim: &[u8]) -> (&'a str, bool) {
        let start = self.pos;
        match find_bytes(self.remaining().as_bytes(), delim) {
            Some(offset) => {
                self.advance(offset);
                let text = self.slice(start, self.pos);
                self.advance(delim.len());
                (text, true)
            }
            None => {
                self.advance(self.input.len() - self.pos);
                (self.slice(start, self.pos), false)
            }
        }
    }
}

/// Returns `true` for the HTML whitespace bytes (space, tab, LF, FF, CR).
pub(crate) fn is_html_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\x0C' | b'\r')
}

fn find_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

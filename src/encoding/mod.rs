//! Encoding detection and transcoding for HTML byte streams.
//!
//! Bridges raw page bytes to the UTF-8 text the parser works on, using
//! `encoding_rs` for the character conversion.
//!
//! # Encoding Detection Strategy
//!
//! 1. A Byte Order Mark (BOM) wins: its encoding is used and its bytes are
//!    skipped.
//! 2. Otherwise the first 1024 bytes are prescanned for a `<meta charset>`
//!    or `<meta http-equiv="Content-Type" content="...; charset=...">`
//!    declaration.
//! 3. Without a declaration, valid UTF-8 is taken as UTF-8 and anything
//!    else is decoded as windows-1252, the legacy default of the web.

use std::fmt;

/// How many bytes the `<meta>` prescan looks at.
const PRESCAN_LIMIT: usize = 1024;

/// An error that occurs during encoding detection or transcoding.
#[derive(Debug, Clone)]
pub struct EncodingError {
    /// A human-readable description of the encoding error.
    pub message: String,
}

impl EncodingError {
    /// Creates a new `EncodingError` with the given message.
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for EncodingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "encoding error: {}", self.message)
    }
}

impl std::error::Error for EncodingError {}

/// Detects the encoding of a byte stream by inspecting the Byte Order Mark.
///
/// Returns a tuple of (encoding name, number of BOM bytes to skip), or
/// `None` when there is no BOM.
///
/// # Examples
///
/// ```
/// use readable_dom::encoding::detect_bom;
///
/// assert_eq!(detect_bom(b"\xEF\xBB\xBFhello"), Some(("UTF-8", 3)));
/// assert_eq!(detect_bom(b"<p>hello</p>"), None);
/// ```
#[must_use]
pub fn detect_bom(bytes: &[u8]) -> Option<(&'static str, usize)> {
    if bytes.starts_with(&[0xEF, 0xBB, 0xBF]) {
        Some(("UTF-8", 3))
    } else if bytes.starts_with(&[0xFE, 0xFF]) {
        Some(("UTF-16BE", 2))
    } else if bytes.starts_with(&[0xFF, 0xFE]) {
        Some(("UTF-16LE", 2))
    } else {
        None
    }
}

/// Transcodes a byte slice from the named encoding into a UTF-8 `String`.
///
/// The label is looked up with `encoding_rs::Encoding::for_label`, so any
/// WHATWG encoding label works (case-insensitive).
///
/// # Errors
///
/// Returns `EncodingError` if the encoding name is not recognized or if
/// the input contains malformed byte sequences.
///
/// # Examples
///
/// ```
/// use readable_dom::encoding::transcode;
///
/// let result = transcode(b"caf\xE9", "latin1").unwrap();
/// assert_eq!(result, "caf\u{e9}");
/// ```
pub fn transcode(bytes: &[u8], encoding_name: &str) -> Result<String, EncodingError> {
    let encoding = encoding_rs::Encoding::for_label(encoding_name.as_bytes())
        .ok_or_else(|| EncodingError::new(format!("unsupported encoding: {encoding_name}")))?;

    let (result, had_errors) = encoding.decode_without_bom_handling(bytes);
    if had_errors {
        return Err(EncodingError::new(format!(
            "malformed byte sequence for encoding {encoding_name}"
        )));
    }
    Ok(result.into_owned())
}

/// Scans the start of an HTML byte stream for a charset declaration in a
/// `<meta>` tag. Returns the declared label as written.
///
/// ```
/// use readable_dom::encoding::prescan_meta_charset;
///
/// let html = br#"<html><head><meta charset="ISO-8859-1"></head>"#;
/// assert_eq!(prescan_meta_charset(html), Some("ISO-8859-1".to_string()));
/// ```
#[must_use]
pub fn prescan_meta_charset(bytes: &[u8]) -> Option<String> {
    let scan = &bytes[..bytes.len().min(PRESCAN_LIMIT)];
    let mut offset = 0;
    while let Some(found) = find_ci(&scan[offset..], b"<meta") {
        let attrs_start = offset + found + "<meta".len();
        let tag = &scan[attrs_start..];
        let end = tag.iter().position(|&b| b == b'>').unwrap_or(tag.len());
        if let Some(label) = charset_in(&tag[..end]) {
            return Some(label);
        }
        offset = attrs_start + end;
    }
    None
}

/// Finds `charset` followed by `=` inside the attribute text of a `<meta>`
/// tag and returns the (unquoted) value.
fn charset_in(tag: &[u8]) -> Option<String> {
    let pos = find_ci(tag, b"charset")?;
    let after = skip_ascii_whitespace(&tag[pos + "charset".len()..]);
    let after = skip_ascii_whitespace(after.strip_prefix(b"=")?);
    let after = match after.first() {
        Some(b'"' | b'\'') => &after[1..],
        _ => after,
    };
    let end = after
        .iter()
        .position(|&b| matches!(b, b'"' | b'\'' | b';' | b'/') || b.is_ascii_whitespace())
        .unwrap_or(after.len());
    let label = &after[..end];
    if label.is_empty() || !label.is_ascii() {
        return None;
    }
    Some(String::from_utf8_lossy(label).into_owned())
}

/// Decodes raw HTML bytes into a UTF-8 string, detecting the encoding.
///
/// # Errors
///
/// Returns `EncodingError` if the declared encoding is unsupported or the
/// bytes are malformed for the detected encoding.
///
/// # Examples
///
/// ```
/// use readable_dom::encoding::decode_to_utf8;
///
/// let bytes = b"<meta charset=windows-1252><p>caf\xE9</p>";
/// let text = decode_to_utf8(bytes).unwrap();
/// assert!(text.ends_with("<p>caf\u{e9}</p>"));
/// ```
pub fn decode_to_utf8(bytes: &[u8]) -> Result<String, EncodingError> {
    if let Some((encoding, skip)) = detect_bom(bytes) {
        return transcode(&bytes[skip..], encoding);
    }

    if let Some(declared) = prescan_meta_charset(bytes) {
        let upper = declared.to_ascii_uppercase();
        // A UTF-16 declaration in an ASCII-compatible prescan is bogus
        if !upper.starts_with("UTF-16") && !is_utf8_label(&upper) {
            return transcode(bytes, &declared);
        }
    }

    match std::str::from_utf8(bytes) {
        Ok(text) => Ok(text.to_string()),
        Err(_) => transcode(bytes, "windows-1252"),
    }
}

/// Case-insensitive (ASCII) substring search.
fn find_ci(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.len() > haystack.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|w| w.eq_ignore_ascii_case(needle))
}

/// Skips leading ASCII whitespace bytes.
fn skip_ascii_whitespace(bytes: &[u8]) -> &[u8] {
    let skip = bytes.iter().take_while(|b| b.is_ascii_whitespace()).count();
    &bytes[skip..]
}

/// Returns `true` if the label is a recognized alias for UTF-8.
fn is_utf8_label(label: &str) -> bool {
    matches!(label, "UTF-8" | "UTF8" | "UNICODE-1-1-UTF-8")
}

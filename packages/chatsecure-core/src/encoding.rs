//! # Bytes ↔ Text Encoding
//!
//! The single canonical conversion used wherever keys, signatures and
//! envelopes cross the text boundary (database columns, JSON, headers).
//!
//! ```text
//! bytes_to_text(Bytes(b)) = base64(b)      bytes_to_text(Text(s)) = s
//! text_to_bytes(Text(s))  = unbase64(s)    text_to_bytes(Bytes(b)) = b
//! ```
//!
//! Both directions pass input that is already in the target form through
//! unchanged, so callers holding "either a string or bytes" can normalize
//! without tracking which one they have.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

use crate::error::Result;

/// Input to the encoding helpers: either already-text or raw bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encodable<'a> {
    /// Text that is already in canonical (base64) form
    Text(&'a str),
    /// Raw binary data
    Bytes(&'a [u8]),
}

impl<'a> From<&'a str> for Encodable<'a> {
    fn from(value: &'a str) -> Self {
        Encodable::Text(value)
    }
}

impl<'a> From<&'a String> for Encodable<'a> {
    fn from(value: &'a String) -> Self {
        Encodable::Text(value.as_str())
    }
}

impl<'a> From<&'a [u8]> for Encodable<'a> {
    fn from(value: &'a [u8]) -> Self {
        Encodable::Bytes(value)
    }
}

impl<'a> From<&'a Vec<u8>> for Encodable<'a> {
    fn from(value: &'a Vec<u8>) -> Self {
        Encodable::Bytes(value.as_slice())
    }
}

impl<'a, const N: usize> From<&'a [u8; N]> for Encodable<'a> {
    fn from(value: &'a [u8; N]) -> Self {
        Encodable::Bytes(value.as_slice())
    }
}

/// Convert bytes to their canonical text form
///
/// Text input is returned unchanged.
pub fn bytes_to_text<'a>(input: impl Into<Encodable<'a>>) -> String {
    match input.into() {
        Encodable::Text(text) => text.to_owned(),
        Encodable::Bytes(bytes) => BASE64.encode(bytes),
    }
}

/// Convert canonical text back to bytes
///
/// Byte input is returned unchanged. Text that is not valid base64 is an
/// `InvalidEncoding` error.
pub fn text_to_bytes<'a>(input: impl Into<Encodable<'a>>) -> Result<Vec<u8>> {
    match input.into() {
        Encodable::Text(text) => Ok(BASE64.decode(text.trim())?),
        Encodable::Bytes(bytes) => Ok(bytes.to_vec()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_binary_round_trip() {
        let data: Vec<u8> = (0..=255u8).collect();
        let text = bytes_to_text(&data);
        assert_eq!(text_to_bytes(text.as_str()).unwrap(), data);
    }

    #[test]
    fn test_text_is_idempotent() {
        assert_eq!(bytes_to_text("already-a-string"), "already-a-string");

        let text = bytes_to_text(b"hello");
        assert_eq!(bytes_to_text(&text), text);
    }

    #[test]
    fn test_bytes_pass_through() {
        let raw = b"already-bytes";
        assert_eq!(text_to_bytes(raw).unwrap(), raw.to_vec());
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(bytes_to_text(&Vec::<u8>::new()), "");
        assert!(text_to_bytes("").unwrap().is_empty());
    }

    #[test]
    fn test_invalid_text_is_rejected() {
        let result = text_to_bytes("not base64 at all!");
        assert!(matches!(result, Err(Error::InvalidEncoding(_))));
    }
}

//! Content type sniffing.
//!
//! Recognizes a small fixed set of media types from leading bytes, ignoring
//! whatever the client claimed. Pure and total: short or empty input yields
//! `None`, never a panic.

use std::fmt;

/// Media types the sniffer can recognize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SniffedType {
    /// `FF D8`.
    Jpeg,
    /// `89 50 4E 47`.
    Png,
    /// `%PDF`.
    Pdf,
    /// `RIFF....WEBP`.
    Webp,
    /// Printable UTF-8 text with no other signature.
    PlainText,
}

impl SniffedType {
    /// Canonical media type string.
    #[must_use]
    pub fn mime(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Pdf => "application/pdf",
            Self::Webp => "image/webp",
            Self::PlainText => "text/plain",
        }
    }

    /// Whether this type satisfies a declared media type.
    ///
    /// Parameters such as `; charset=utf-8` and ASCII case are ignored.
    #[must_use]
    pub fn matches_declared(&self, declared: &str) -> bool {
        let essence = declared.split(';').next().unwrap_or_default().trim();
        essence.eq_ignore_ascii_case(self.mime())
    }
}

impl fmt::Display for SniffedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime())
    }
}

const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G'];
const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8];
const PDF_MAGIC: &[u8] = b"%PDF";

/// Identify `prefix` by its magic bytes.
///
/// # Examples
///
/// ```
/// use assetgate_core::sniff::{SniffedType, sniff};
///
/// assert_eq!(sniff(b"%PDF-1.7\n"), Some(SniffedType::Pdf));
/// assert_eq!(sniff(&[0xFF]), None);
/// ```
#[must_use]
pub fn sniff(prefix: &[u8]) -> Option<SniffedType> {
    if prefix.starts_with(JPEG_MAGIC) {
        return Some(SniffedType::Jpeg);
    }
    if prefix.starts_with(PNG_MAGIC) {
        return Some(SniffedType::Png);
    }
    if prefix.starts_with(PDF_MAGIC) {
        return Some(SniffedType::Pdf);
    }
    if prefix.len() >= 12 && &prefix[0..4] == b"RIFF" && &prefix[8..12] == b"WEBP" {
        return Some(SniffedType::Webp);
    }
    if looks_like_text(prefix) {
        return Some(SniffedType::PlainText);
    }
    None
}

/// Valid UTF-8 (allowing one character cut at the end) without control
/// bytes other than TAB, LF, FF and CR.
fn looks_like_text(prefix: &[u8]) -> bool {
    if prefix.is_empty() {
        return false;
    }
    let valid = match std::str::from_utf8(prefix) {
        Ok(s) => s,
        // `error_len() == None` means the input ended mid-character.
        Err(e) if e.error_len().is_none() => {
            match std::str::from_utf8(&prefix[..e.valid_up_to()]) {
                Ok(s) => s,
                Err(_) => return false,
            }
        }
        Err(_) => return false,
    };
    !valid.is_empty()
        && valid
            .bytes()
            .all(|b| !b.is_ascii_control() || matches!(b, b'\t' | b'\n' | 0x0C | b'\r'))
}

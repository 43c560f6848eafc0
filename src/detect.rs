//! Content sniffing for template bytes and image blobs.

use crate::error::{Error, Result};

/// PDF header information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfHeader {
    /// PDF version (e.g., "1.7", "2.0")
    pub version: String,
    /// Byte offset of the `%PDF-` marker
    pub offset: usize,
}

impl std::fmt::Display for PdfHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PDF {}", self.version)
    }
}

const PDF_MAGIC: &[u8] = b"%PDF-";
const VERSION_LEN: usize = 3; // e.g., "1.7"

/// Readers accept a header anywhere in the first kilobyte.
const HEADER_SEARCH_WINDOW: usize = 1024;

/// Locate and validate the PDF header in template bytes.
///
/// # Returns
/// * `Ok(PdfHeader)` if a `%PDF-x.y` marker appears in the first 1024 bytes
/// * `Err(Error::UnknownFormat)` if no marker is found
/// * `Err(Error::UnsupportedVersion)` if the version is malformed or outside 1.0-2.0
pub fn sniff_pdf(data: &[u8]) -> Result<PdfHeader> {
    let window = &data[..data.len().min(HEADER_SEARCH_WINDOW)];
    let offset = window
        .windows(PDF_MAGIC.len())
        .position(|w| w == PDF_MAGIC)
        .ok_or(Error::UnknownFormat)?;

    let start = offset + PDF_MAGIC.len();
    let version_bytes = data
        .get(start..start + VERSION_LEN)
        .ok_or(Error::UnknownFormat)?;
    let version = String::from_utf8_lossy(version_bytes).to_string();

    if !is_valid_version(&version) {
        return Err(Error::UnsupportedVersion(version));
    }

    Ok(PdfHeader { version, offset })
}

/// Versions from 1.0 through 2.0.
fn is_valid_version(version: &str) -> bool {
    match version.as_bytes() {
        [b'1', b'.', minor] => minor.is_ascii_digit(),
        [b'2', b'.', b'0'] => true,
        _ => false,
    }
}

/// Check if bytes carry a PDF header.
pub fn is_pdf_bytes(data: &[u8]) -> bool {
    sniff_pdf(data).is_ok()
}

/// Guess an image MIME type from magic bytes.
///
/// Only used to fill in a missing MIME type; a declared type always wins.
pub fn sniff_image_mime(data: &[u8]) -> Option<&'static str> {
    image::guess_format(data).ok().map(|f| f.to_mime_type())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff_valid_pdf() {
        let header = sniff_pdf(b"%PDF-1.7\n%\xe2\xe3\xcf\xd3").unwrap();
        assert_eq!(header.version, "1.7");
        assert_eq!(header.offset, 0);
    }

    #[test]
    fn test_sniff_pdf_with_leading_junk() {
        let header = sniff_pdf(b"\r\n\x00junk%PDF-1.4\n").unwrap();
        assert_eq!(header.version, "1.4");
        assert_eq!(header.offset, 7);
    }

    #[test]
    fn test_sniff_invalid_format() {
        assert!(matches!(
            sniff_pdf(b"<!DOCTYPE html>"),
            Err(Error::UnknownFormat)
        ));
        assert!(matches!(sniff_pdf(b"%PDF"), Err(Error::UnknownFormat)));
    }

    #[test]
    fn test_sniff_bad_version() {
        assert!(matches!(
            sniff_pdf(b"%PDF-x.y\n"),
            Err(Error::UnsupportedVersion(_))
        ));
    }

    #[test]
    fn test_sniff_version_range() {
        assert_eq!(sniff_pdf(b"%PDF-1.0\n").unwrap().version, "1.0");
        assert_eq!(sniff_pdf(b"%PDF-2.0\n").unwrap().version, "2.0");
        for header in ["9.9", "2.1", "0.9"].map(|v| format!("%PDF-{}\n", v)) {
            assert!(matches!(
                sniff_pdf(header.as_bytes()),
                Err(Error::UnsupportedVersion(_))
            ));
        }
    }

    #[test]
    fn test_sniff_image_mime() {
        assert_eq!(sniff_image_mime(&[0xFF, 0xD8, 0xFF, 0xE0]), Some("image/jpeg"));
        assert_eq!(sniff_image_mime(b"\x89PNG\r\n\x1a\n...."), Some("image/png"));
        assert_eq!(sniff_image_mime(b"BM\x00\x00"), Some("image/bmp"));
        assert_eq!(sniff_image_mime(b"hello"), None);
    }
}

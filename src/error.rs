//! Error types for fillpdf library.

use std::io;
use thiserror::Error;

/// Result type alias for fillpdf operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while loading, filling, or saving a template.
///
/// Variants fall into two groups. Document-level errors (fetch, parse,
/// encode) abort a whole regeneration run. Field-level errors are caught by
/// the injector, logged, and the run carries on with the next field.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Template bytes could not be retrieved.
    #[error("Failed to fetch template: {0}")]
    Fetch(String),

    /// The bytes are not recognized as PDF.
    #[error("Unknown file format: not a valid PDF")]
    UnknownFormat,

    /// The PDF version is not supported.
    #[error("Unsupported PDF version: {0}")]
    UnsupportedVersion(String),

    /// Error parsing PDF structure.
    #[error("PDF parsing error: {0}")]
    PdfParse(String),

    /// The PDF document is encrypted.
    #[error("Document is encrypted")]
    Encrypted,

    /// Serializing the document model failed.
    #[error("Failed to encode document: {0}")]
    Encode(String),

    /// No field with this name exists in the form.
    #[error("Form field not found: {0}")]
    FieldNotFound(String),

    /// The field exists but its dictionary is malformed.
    #[error("Invalid form field: {0}")]
    InvalidField(String),

    /// Image MIME type is neither JPEG nor PNG.
    #[error("Unsupported image type: {0}")]
    UnsupportedImageFormat(String),

    /// Image bytes could not be decoded.
    #[error("Image decoding error: {0}")]
    ImageDecode(String),

    /// Image field has no button appearance and no widget rectangle.
    #[error("Field {0} has no widget rectangle to place an image on")]
    MissingWidgetGeometry(String),

    /// Text value is longer than the field's /MaxLen.
    #[error("Value for field {field} has {len} characters, exceeding max length {max}")]
    ExceededMaxLength {
        field: String,
        len: usize,
        max: usize,
    },

    /// Template id is not registered.
    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    /// Invalid template manifest.
    #[error("Invalid template manifest: {0}")]
    Manifest(String),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether this error aborts a whole run rather than a single field.
    pub fn is_document_level(&self) -> bool {
        matches!(
            self,
            Error::Io(_)
                | Error::Fetch(_)
                | Error::UnknownFormat
                | Error::UnsupportedVersion(_)
                | Error::PdfParse(_)
                | Error::Encrypted
                | Error::Encode(_)
                | Error::TemplateNotFound(_)
                | Error::Manifest(_)
        )
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            lopdf::Error::Decryption(_) => Error::Encrypted,
            _ => Error::PdfParse(err.to_string()),
        }
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::ImageDecode(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Manifest(err.to_string())
    }
}

//! Serializer: re-encodes a mutated document model to bytes.
//!
//! Saving is idempotent for field content. With metadata updates enabled
//! (the default) the document's `/ModDate` reflects the save time, so two
//! saves of the same model can differ in that entry only. Disable
//! [`SaveOptions::update_metadata`] for byte-identical output.

use chrono::{DateTime, Utc};
use lopdf::{dictionary, Document as LopdfDocument, Object};

use crate::error::{Error, Result};
use crate::form::FormBackend;

/// Options for serializing a filled document.
#[derive(Debug, Clone)]
pub struct SaveOptions {
    /// Stamp `/Producer` and `/ModDate` into the document info dictionary
    pub update_metadata: bool,

    /// Producer string written when metadata is updated
    pub producer: String,

    /// Flate-compress streams that are stored uncompressed
    pub compress: bool,
}

impl SaveOptions {
    /// Create save options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable metadata stamping.
    pub fn with_metadata(mut self, update: bool) -> Self {
        self.update_metadata = update;
        self
    }

    /// Keep document metadata untouched, making output deterministic.
    pub fn deterministic(mut self) -> Self {
        self.update_metadata = false;
        self
    }

    /// Set producer string.
    pub fn with_producer(mut self, producer: impl Into<String>) -> Self {
        self.producer = producer.into();
        self
    }

    /// Enable or disable stream compression.
    pub fn with_compression(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            update_metadata: true,
            producer: concat!("fillpdf ", env!("CARGO_PKG_VERSION")).to_string(),
            compress: true,
        }
    }
}

/// Serialize a document model.
///
/// Failures surface as [`Error::Encode`]; the model itself is left as it
/// was so the caller may retry or discard it.
pub fn serialize<B: FormBackend + ?Sized>(doc: &mut B, options: &SaveOptions) -> Result<Vec<u8>> {
    let bytes = doc.save(options)?;
    log::debug!("Serialized document: {} bytes", bytes.len());
    Ok(bytes)
}

/// Format a timestamp as a PDF date string.
pub fn pdf_date(time: DateTime<Utc>) -> String {
    time.format("D:%Y%m%d%H%M%S+00'00'").to_string()
}

/// Write `/Producer` and `/ModDate` into the info dictionary, creating it
/// when the trailer has none.
pub(crate) fn stamp_metadata(
    doc: &mut LopdfDocument,
    producer: &str,
    now: DateTime<Utc>,
) -> Result<()> {
    let info_id = match doc.trailer.get(b"Info") {
        Ok(Object::Reference(id)) => *id,
        Ok(Object::Dictionary(inline)) => {
            let inline = inline.clone();
            let id = doc.add_object(Object::Dictionary(inline));
            doc.trailer.set("Info", id);
            id
        }
        _ => {
            let id = doc.add_object(dictionary! {});
            doc.trailer.set("Info", id);
            id
        }
    };

    let info = doc
        .get_dictionary_mut(info_id)
        .map_err(|e| Error::Encode(format!("info dictionary: {}", e)))?;
    info.set("Producer", Object::string_literal(producer));
    info.set("ModDate", Object::string_literal(pdf_date(now)));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_pdf_date_format() {
        let time = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(pdf_date(time), "D:20240309140507+00'00'");
    }

    #[test]
    fn test_stamp_creates_info() {
        let mut doc = LopdfDocument::with_version("1.7");
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        stamp_metadata(&mut doc, "fillpdf test", now).unwrap();

        let info_id = doc.trailer.get(b"Info").unwrap().as_reference().unwrap();
        let info = doc.get_dictionary(info_id).unwrap();
        match info.get(b"Producer").unwrap() {
            Object::String(bytes, _) => assert_eq!(bytes, b"fillpdf test"),
            other => panic!("unexpected producer {:?}", other),
        }
    }

    #[test]
    fn test_options_builder() {
        let options = SaveOptions::new().deterministic().with_compression(false);
        assert!(!options.update_metadata);
        assert!(!options.compress);
        assert!(SaveOptions::default().update_metadata);
    }
}

//! User-supplied field values.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::detect::sniff_image_mime;
use crate::error::Result;

use super::FieldCatalog;

/// Image formats the injector can embed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// Embedded as-is with DCTDecode
    Jpeg,
    /// Decoded and re-encoded with FlateDecode
    Png,
}

impl ImageFormat {
    /// Map a MIME type onto a supported format.
    ///
    /// `image/jpeg`, `image/jpg` and `image/png` are recognized (case
    /// insensitive, parameters ignored); everything else is `None`.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or("").trim();
        if essence.eq_ignore_ascii_case("image/jpeg") || essence.eq_ignore_ascii_case("image/jpg")
        {
            Some(ImageFormat::Jpeg)
        } else if essence.eq_ignore_ascii_case("image/png") {
            Some(ImageFormat::Png)
        } else {
            None
        }
    }
}

/// Raw image bytes plus their declared MIME type.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageBlob {
    bytes: Arc<[u8]>,
    mime: String,
}

impl ImageBlob {
    /// Create a blob from bytes and a declared MIME type.
    pub fn new(bytes: impl Into<Arc<[u8]>>, mime: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            mime: mime.into(),
        }
    }

    /// Read an image file, inferring the MIME type from its extension and
    /// falling back to magic bytes.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let mime = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(mime_from_extension)
            .or_else(|| sniff_image_mime(&bytes))
            .unwrap_or("application/octet-stream");
        Ok(Self::new(bytes, mime))
    }

    /// Raw image bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Declared MIME type.
    pub fn mime(&self) -> &str {
        &self.mime
    }

    /// Embeddable format, if the MIME type is supported.
    pub fn format(&self) -> Option<ImageFormat> {
        ImageFormat::from_mime(&self.mime)
    }

    /// Whether the MIME type names any image at all.
    ///
    /// Uploads failing this check are rejected before they reach the value
    /// map; images of unsupported formats pass and are skipped later.
    pub fn is_image_mime(&self) -> bool {
        self.mime.trim().to_ascii_lowercase().starts_with("image/")
    }

    /// Size in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the blob has no bytes.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl std::fmt::Debug for ImageBlob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageBlob")
            .field("mime", &self.mime)
            .field("len", &self.bytes.len())
            .finish()
    }
}

fn mime_from_extension(ext: &str) -> Option<&'static str> {
    image::ImageFormat::from_extension(ext).map(|f| f.to_mime_type())
}

/// A value supplied for one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// Text for text-capable fields
    Text(String),
    /// Image for button or placement fields
    Image(ImageBlob),
}

impl FieldValue {
    /// Whether this value would be skipped without touching the document.
    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::Image(blob) => blob.is_empty(),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<ImageBlob> for FieldValue {
    fn from(blob: ImageBlob) -> Self {
        FieldValue::Image(blob)
    }
}

/// Mapping from field name to value. A missing key means "absent".
///
/// Keys need not match the current catalog; entries for unknown fields are
/// carried but never injected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValueMap {
    values: HashMap<String, FieldValue>,
}

impl ValueMap {
    /// Create an empty value map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set or replace a value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.values.insert(name.into(), value.into());
    }

    /// Builder-style [`ValueMap::set`].
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.set(name, value);
        self
    }

    /// Apply a setter-style change: `None` clears the entry.
    pub fn apply(&mut self, name: impl Into<String>, value: Option<FieldValue>) {
        let name = name.into();
        match value {
            Some(v) => {
                self.values.insert(name, v);
            }
            None => {
                self.values.remove(&name);
            }
        }
    }

    /// Get the value for a field.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    /// Remove a value.
    pub fn remove(&mut self, name: &str) -> Option<FieldValue> {
        self.values.remove(name)
    }

    /// Remove every value.
    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Number of entries, including ones for unknown fields.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the map has no entries.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over entries in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Names with entries that the catalog does not know about.
    pub fn unknown_keys<'a>(&'a self, catalog: &'a FieldCatalog) -> Vec<&'a str> {
        let mut keys: Vec<&str> = self
            .values
            .keys()
            .map(|k| k.as_str())
            .filter(|k| !catalog.contains(k))
            .collect();
        keys.sort_unstable();
        keys
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for ValueMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = ValueMap::new();
        for (k, v) in iter {
            map.set(k, v);
        }
        map
    }
}

//! # fillpdf
//!
//! PDF form-template filling for Rust.
//!
//! This library reads the interactive fields of a PDF template, injects
//! text and image values into them, and serializes the result. A debounced
//! controller keeps a filled preview up to date while values are edited.
//!
//! ## Quick Start
//!
//! ```no_run
//! use fillpdf::{extract_fields, fill, ValueMap};
//!
//! fn main() -> fillpdf::Result<()> {
//!     let template = std::fs::read("flyer.pdf")?;
//!
//!     // Inspect the form
//!     for field in &extract_fields(&template)? {
//!         println!("{} ({})", field.name, field.kind);
//!     }
//!
//!     // Fill it
//!     let values = ValueMap::new().with("mainHeadline", "Grand Opening");
//!     let output = fill(&template, &values)?;
//!     std::fs::write("filled.pdf", output.bytes)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Canonical field catalog**: seven field kinds, native tag suffixes stripped
//! - **Text injection**: values, `/MaxLen`, generated appearance streams
//! - **Image injection**: JPEG/PNG into push buttons, or drawn over the widget
//! - **Partial success**: one bad field never aborts the others
//! - **Debounced regeneration**: async controller with sequenced runs

pub mod detect;
pub mod error;
pub mod extract;
pub mod form;
pub mod inject;
pub mod model;
pub mod pipeline;
pub mod provider;
pub mod regen;
pub mod save;

// Re-export commonly used types
pub use detect::{is_pdf_bytes, sniff_image_mime, sniff_pdf, PdfHeader};
pub use error::{Error, Result};
pub use extract::{extract_catalog, extract_fields};
pub use form::{FormBackend, FormDocument};
pub use inject::{
    decode_image, inject_values, AppliedAs, FieldOutcome, FillOptions, InjectionReport,
    SkipReason, WarningKind,
};
pub use model::{
    Alignment, FieldCatalog, FieldDescriptor, FieldKind, FieldValue, ImageBlob, ImageFormat,
    Rect, Template, TemplateRegistry, ValueMap,
};
pub use pipeline::{fill_document, fill_template, FillOutput};
pub use provider::{FsTemplateProvider, MemoryTemplateProvider, TemplateProvider};
pub use regen::{
    inspect_output, GeneratedOutput, Notification, Phase, PreviewInfo, PreviewStatus,
    RegenConfig, RegenerationController, Severity,
};
pub use save::SaveOptions;

use std::path::Path;

/// Fill a template with default options.
///
/// The field catalog is extracted from `template` first.
///
/// # Example
///
/// ```no_run
/// use fillpdf::{fill, ValueMap};
///
/// let template = std::fs::read("flyer.pdf").unwrap();
/// let values = ValueMap::new().with("mainHeadline", "Grand Opening");
/// let output = fill(&template, &values).unwrap();
/// println!("{} fields filled", output.report.applied_count());
/// ```
pub fn fill(template: &[u8], values: &ValueMap) -> Result<FillOutput> {
    fill_with_options(template, values, &FillOptions::default())
}

/// Fill a template with custom options.
pub fn fill_with_options(
    template: &[u8],
    values: &ValueMap,
    options: &FillOptions,
) -> Result<FillOutput> {
    let mut doc = FormDocument::load(template)?;
    let catalog = extract_catalog(&doc)?;
    fill_document(&mut doc, &catalog, values, options)
}

/// Fill a template file.
///
/// # Example
///
/// ```no_run
/// use fillpdf::{fill_file, ValueMap};
///
/// let output = fill_file("flyer.pdf", &ValueMap::new()).unwrap();
/// std::fs::write("filled.pdf", output.bytes).unwrap();
/// ```
pub fn fill_file<P: AsRef<Path>>(path: P, values: &ValueMap) -> Result<FillOutput> {
    let data = std::fs::read(path)?;
    fill(&data, values)
}

/// Builder for one-shot fills.
///
/// # Example
///
/// ```no_run
/// use fillpdf::{Filler, ImageBlob};
///
/// let output = Filler::new()
///     .text("mainHeadline", "Grand Opening")
///     .image("logoTlAfImage", ImageBlob::from_path("logo.png")?)
///     .deterministic()
///     .fill_file("flyer.pdf")?;
/// # Ok::<(), fillpdf::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Filler {
    values: ValueMap,
    options: FillOptions,
}

impl Filler {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a text value.
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.set(name, value.into());
        self
    }

    /// Set an image value.
    pub fn image(mut self, name: impl Into<String>, blob: ImageBlob) -> Self {
        self.values.set(name, blob);
        self
    }

    /// Replace all values.
    pub fn with_values(mut self, values: ValueMap) -> Self {
        self.values = values;
        self
    }

    /// Set fill options.
    pub fn with_options(mut self, options: FillOptions) -> Self {
        self.options = options;
        self
    }

    /// Skip appearance stream generation.
    pub fn without_appearances(mut self) -> Self {
        self.options = self.options.with_appearances(false);
        self
    }

    /// Produce byte-identical output for identical input.
    pub fn deterministic(mut self) -> Self {
        self.options = self.options.deterministic();
        self
    }

    /// Values collected so far.
    pub fn values(&self) -> &ValueMap {
        &self.values
    }

    /// Fill template bytes.
    pub fn fill_bytes(&self, template: &[u8]) -> Result<FillOutput> {
        fill_with_options(template, &self.values, &self.options)
    }

    /// Fill a template file.
    pub fn fill_file<P: AsRef<Path>>(&self, path: P) -> Result<FillOutput> {
        let data = std::fs::read(path)?;
        self.fill_bytes(&data)
    }
}

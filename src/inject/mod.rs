//! Value injection into a loaded form.
//!
//! Every catalog field is handled on its own. A field that cannot take its
//! value is logged, recorded in the [`InjectionReport`], and skipped; the
//! rest of the pass is unaffected.

mod image;
mod report;

pub use image::decode_image;
pub use report::{
    AppliedAs, FieldOutcome, FieldReport, FieldWarning, InjectionReport, SkipReason, WarningKind,
};

use crate::error::{Error, Result};
use crate::form::FormBackend;
use crate::model::{Alignment, FieldCatalog, FieldDescriptor, FieldValue, ImageBlob, ValueMap};
use crate::save::SaveOptions;

/// Page that receives images for fields without a button appearance.
pub const IMAGE_PLACEMENT_PAGE: u32 = 1;

/// Options controlling how values are written into a form.
#[derive(Debug, Clone)]
pub struct FillOptions {
    /// Build appearance streams for filled text fields
    pub generate_appearances: bool,

    /// Set `/NeedAppearances` so viewers refresh text fields themselves
    pub need_appearances: bool,

    /// Horizontal placement of images inside push buttons
    pub image_alignment: Alignment,

    /// Serialization options
    pub save: SaveOptions,
}

impl FillOptions {
    /// Create fill options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable appearance stream generation.
    pub fn with_appearances(mut self, generate: bool) -> Self {
        self.generate_appearances = generate;
        self
    }

    /// Enable or disable the `/NeedAppearances` flag.
    pub fn with_need_appearances(mut self, need: bool) -> Self {
        self.need_appearances = need;
        self
    }

    /// Set button image alignment.
    pub fn with_image_alignment(mut self, alignment: Alignment) -> Self {
        self.image_alignment = alignment;
        self
    }

    /// Set serialization options.
    pub fn with_save_options(mut self, save: SaveOptions) -> Self {
        self.save = save;
        self
    }

    /// Produce byte-identical output for identical input.
    pub fn deterministic(mut self) -> Self {
        self.save = self.save.deterministic();
        self
    }
}

impl Default for FillOptions {
    fn default() -> Self {
        Self {
            generate_appearances: true,
            need_appearances: true,
            image_alignment: Alignment::Center,
            save: SaveOptions::default(),
        }
    }
}

/// Write `values` into the fields of `doc` named by `catalog`.
///
/// Catalog fields without a value, or with a blank one, are left untouched.
/// Value keys that name no catalog field are ignored.
pub fn inject_values<B: FormBackend + ?Sized>(
    doc: &mut B,
    catalog: &FieldCatalog,
    values: &ValueMap,
    options: &FillOptions,
) -> InjectionReport {
    let mut report = InjectionReport::new();

    for field in catalog {
        let outcome = match values.get(&field.name) {
            Some(value) if !value.is_blank() => inject_field(doc, field, value, options),
            _ => Ok(FieldOutcome::Skipped(SkipReason::NoValue)),
        };

        match outcome {
            Ok(outcome) => report.record(&field.name, outcome),
            Err(err) => {
                log::warn!("Skipping field {}: {}", field.name, err);
                report.fail(&field.name, &err);
            }
        }
    }

    let unknown = values.unknown_keys(catalog);
    if !unknown.is_empty() {
        log::debug!("Ignoring values for unknown fields: {:?}", unknown);
    }

    if options.need_appearances && report.wrote_text() {
        if let Err(err) = doc.set_need_appearances(true) {
            log::warn!("Could not set NeedAppearances: {}", err);
        }
    }

    log::debug!(
        "Injection finished: {} applied, {} skipped, {} warnings",
        report.applied_count(),
        report.skipped_count(),
        report.warnings.len()
    );
    report
}

fn inject_field<B: FormBackend + ?Sized>(
    doc: &mut B,
    field: &FieldDescriptor,
    value: &FieldValue,
    options: &FillOptions,
) -> Result<FieldOutcome> {
    match value {
        FieldValue::Text(text) => inject_text(doc, &field.name, text, options),
        FieldValue::Image(blob) => inject_image(doc, &field.name, blob, options),
    }
}

fn inject_text<B: FormBackend + ?Sized>(
    doc: &mut B,
    name: &str,
    text: &str,
    options: &FillOptions,
) -> Result<FieldOutcome> {
    match doc.try_resolve_text_field(name) {
        Some(control) => {
            doc.set_text(control, text, options.generate_appearances)?;
            Ok(FieldOutcome::Applied(AppliedAs::Text))
        }
        None => {
            log::debug!("Field {} does not take text; value ignored", name);
            Ok(FieldOutcome::Skipped(SkipReason::NotTextCapable))
        }
    }
}

/// Images go into a push button's appearance when the field is one,
/// otherwise they are drawn on the placement page over the field's first
/// widget. Nothing is embedded until a destination is confirmed.
fn inject_image<B: FormBackend + ?Sized>(
    doc: &mut B,
    name: &str,
    blob: &ImageBlob,
    options: &FillOptions,
) -> Result<FieldOutcome> {
    let image = decode_image(blob)?;

    if let Some(control) = doc.try_resolve_image_control(name) {
        let embedded = doc.embed_image(&image)?;
        doc.set_control_image(control, &embedded, options.image_alignment)?;
        return Ok(FieldOutcome::Applied(AppliedAs::ControlAppearance));
    }

    let field = doc
        .find_field(name)
        .ok_or_else(|| Error::FieldNotFound(name.to_string()))?;
    let rect = doc
        .first_widget_rect(field)
        .ok_or_else(|| Error::MissingWidgetGeometry(name.to_string()))?;

    let embedded = doc.embed_image(&image)?;
    doc.draw_image(IMAGE_PLACEMENT_PAGE, &embedded, rect)?;
    Ok(FieldOutcome::Applied(AppliedAs::PagePlacement {
        page: IMAGE_PLACEMENT_PAGE,
        rect,
    }))
}

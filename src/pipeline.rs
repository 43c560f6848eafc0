//! One regeneration pass: load, inject, serialize.

use crate::error::Result;
use crate::form::{FormBackend, FormDocument};
use crate::inject::{inject_values, FillOptions, InjectionReport};
use crate::model::{FieldCatalog, ValueMap};
use crate::save::serialize;

/// Bytes of a filled document plus what happened to each field.
#[derive(Debug, Clone)]
pub struct FillOutput {
    pub bytes: Vec<u8>,
    pub report: InjectionReport,
}

/// Inject into an already loaded document and serialize it.
pub fn fill_document<B: FormBackend + ?Sized>(
    doc: &mut B,
    catalog: &FieldCatalog,
    values: &ValueMap,
    options: &FillOptions,
) -> Result<FillOutput> {
    let report = inject_values(doc, catalog, values, options);
    let bytes = serialize(doc, &options.save)?;
    Ok(FillOutput { bytes, report })
}

/// Parse template bytes into a fresh document model and fill it.
///
/// The model lives only for this call, so repeated runs never see each
/// other's mutations.
pub fn fill_template(
    template: &[u8],
    catalog: &FieldCatalog,
    values: &ValueMap,
    options: &FillOptions,
) -> Result<FillOutput> {
    let mut doc = FormDocument::load(template)?;
    fill_document(&mut doc, catalog, values, options)
}

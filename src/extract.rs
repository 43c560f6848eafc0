//! Field catalog extraction.

use crate::error::Result;
use crate::form::{FormBackend, FormDocument};
use crate::model::{FieldCatalog, FieldDescriptor, FieldKind};

/// Build the field catalog of a loaded form, in declaration order.
///
/// Each native type tag is canonicalized once, here; downstream stages
/// read [`FieldDescriptor::kind`] and never re-derive it. Fields whose tag
/// names none of the seven kinds are left out of the catalog.
pub fn extract_catalog<B: FormBackend + ?Sized>(backend: &B) -> Result<FieldCatalog> {
    let entries = backend.field_entries()?;
    let mut catalog = FieldCatalog::new();

    for entry in entries {
        let Some(kind) = FieldKind::from_native_tag(&entry.native_tag) else {
            log::warn!(
                "Field {} has unrecognized type tag {:?}; left out of catalog",
                entry.name,
                entry.native_tag
            );
            continue;
        };

        let mut descriptor = FieldDescriptor::new(entry.name, kind);
        if kind.is_enumerable() {
            descriptor = descriptor.with_options(entry.options);
        }
        catalog.push(descriptor);
    }

    Ok(catalog)
}

/// Parse template bytes and extract their field catalog.
///
/// All or nothing: unparseable bytes yield an error, never a partial
/// catalog.
pub fn extract_fields(data: &[u8]) -> Result<FieldCatalog> {
    let doc = FormDocument::load(data)?;
    extract_catalog(&doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_garbage_yields_no_catalog() {
        assert!(matches!(
            extract_fields(b"definitely not a pdf"),
            Err(Error::UnknownFormat)
        ));
    }

    #[test]
    fn test_truncated_pdf_is_parse_error() {
        let result = extract_fields(b"%PDF-1.7\n1 0 obj\n<< /Type /Catalog");
        assert!(result.is_err());
        assert!(result.unwrap_err().is_document_level());
    }
}

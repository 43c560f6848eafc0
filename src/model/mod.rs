//! Data model for templates, field catalogs, and values.

mod field;
mod geometry;
mod template;
mod value;

pub use field::{FieldCatalog, FieldDescriptor, FieldKind};
pub use geometry::{Alignment, Rect};
pub use template::{Template, TemplateRegistry};
pub use value::{FieldValue, ImageBlob, ImageFormat, ValueMap};

//! Interactive form access: the backend seam and its lopdf implementation.

mod appearance;
mod backend;
mod document;
mod text;

pub use appearance::{DefaultAppearance, TextLayout};
pub use backend::{
    ColorSpace, EmbeddedImage, FieldEntry, FieldRef, FormBackend, ImageControl, ImageFilter,
    ImageXObject, ObjectRef, TextControl,
};
pub use document::FormDocument;
pub use text::{decode_text_string, encode_text_string};

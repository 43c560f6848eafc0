//! Form backend abstraction layer.
//!
//! Provides a trait-based interface for form operations, isolating the
//! concrete PDF library (lopdf) from the catalog extractor and the value
//! injector. Capability queries return `Option`s: a field that is not a text
//! control, or not an image-bearing control, is an ordinary answer rather
//! than an error.

use crate::error::Result;
use crate::model::{Alignment, Rect};
use crate::save::SaveOptions;

/// Object identifier: (object number, generation number).
pub type ObjectRef = (u32, u16);

/// Handle to a terminal form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldRef(pub ObjectRef);

/// A field confirmed to accept text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextControl(FieldRef);

impl TextControl {
    /// Wrap a field that the backend has verified is a text field.
    pub fn new(field: FieldRef) -> Self {
        Self(field)
    }

    /// Underlying field handle.
    pub fn field(&self) -> FieldRef {
        self.0
    }
}

/// A field whose appearance can be set to an image directly (push button).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageControl(FieldRef);

impl ImageControl {
    /// Wrap a field that the backend has verified is a push button.
    pub fn new(field: FieldRef) -> Self {
        Self(field)
    }

    /// Underlying field handle.
    pub fn field(&self) -> FieldRef {
        self.0
    }
}

/// Field information returned by the backend, before canonicalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldEntry {
    /// Fully qualified field name
    pub name: String,
    /// Backend-specific type tag (may carry a variant suffix)
    pub native_tag: String,
    /// Option values, empty when the field has none
    pub options: Vec<String>,
}

/// Color space of an image XObject.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    Gray,
    Rgb,
    Cmyk,
}

impl ColorSpace {
    /// PDF name of the device color space.
    pub fn pdf_name(self) -> &'static str {
        match self {
            ColorSpace::Gray => "DeviceGray",
            ColorSpace::Rgb => "DeviceRGB",
            ColorSpace::Cmyk => "DeviceCMYK",
        }
    }
}

/// Stream filter already applied to image data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFilter {
    /// JPEG bytes, passed through untouched
    Dct,
    /// Zlib-compressed samples
    Flate,
}

/// A decoded image ready to become an image XObject.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageXObject {
    pub width: u32,
    pub height: u32,
    pub color_space: ColorSpace,
    pub bits_per_component: u8,
    pub filter: ImageFilter,
    /// Encoded sample data matching `filter`
    pub data: Vec<u8>,
    /// Flate-compressed 8-bit alpha channel, if any
    pub soft_mask: Option<Vec<u8>>,
    /// Adobe CMYK JPEGs store inverted samples
    pub inverted: bool,
}

/// An image embedded in the document, drawable any number of times.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmbeddedImage {
    pub id: ObjectRef,
    pub width: u32,
    pub height: u32,
}

/// Abstract interface to a mutable form document.
///
/// Implementations provide field enumeration, capability queries, and the
/// handful of mutations the injector needs, without exposing any concrete
/// PDF library types.
pub trait FormBackend {
    /// All terminal fields, in declaration order.
    fn field_entries(&self) -> Result<Vec<FieldEntry>>;

    /// Resolve a field by fully qualified name.
    fn find_field(&self, name: &str) -> Option<FieldRef>;

    /// Resolve a field as a text-capable control.
    fn try_resolve_text_field(&self, name: &str) -> Option<TextControl>;

    /// Resolve a field as a control that takes an image appearance.
    fn try_resolve_image_control(&self, name: &str) -> Option<ImageControl>;

    /// Rectangle of the field's first widget, if it has one.
    fn first_widget_rect(&self, field: FieldRef) -> Option<Rect>;

    /// Set a text field's value verbatim.
    fn set_text(&mut self, control: TextControl, text: &str, generate_appearance: bool)
        -> Result<()>;

    /// Mark the form so viewers regenerate field appearances.
    fn set_need_appearances(&mut self, need: bool) -> Result<()>;

    /// Add an image XObject to the document.
    fn embed_image(&mut self, image: &ImageXObject) -> Result<EmbeddedImage>;

    /// Use an embedded image as a control's appearance.
    fn set_control_image(
        &mut self,
        control: ImageControl,
        image: &EmbeddedImage,
        alignment: Alignment,
    ) -> Result<()>;

    /// Draw an embedded image on a page (1-indexed), stretched to `rect`.
    fn draw_image(&mut self, page: u32, image: &EmbeddedImage, rect: Rect) -> Result<()>;

    /// Serialize the document.
    fn save(&mut self, options: &SaveOptions) -> Result<Vec<u8>>;
}

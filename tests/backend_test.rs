//! Injector behaviour against a mock form backend.

mod common;

use std::collections::HashMap;

use common::{bmp_blob, jpeg_blob, png_blob};
use fillpdf::error::{Error, Result};
use fillpdf::form::{
    EmbeddedImage, FieldEntry, FieldRef, ImageControl, ImageXObject, TextControl,
};
use fillpdf::{
    extract_catalog, inject_values, Alignment, AppliedAs, FieldKind, FieldOutcome, FillOptions,
    FormBackend, Rect, SaveOptions, SkipReason, ValueMap, WarningKind,
};

#[derive(Debug, Clone, PartialEq)]
enum Call {
    SetText(String, String),
    NeedAppearances(bool),
    Embed(u32, u32),
    ControlImage(String, Alignment),
    Draw(u32, Rect),
}

struct MockField {
    tag: &'static str,
    options: Vec<String>,
    rect: Option<Rect>,
}

/// Records every mutation; `set_text` fails for names listed in `broken`.
struct MockBackend {
    order: Vec<String>,
    fields: HashMap<String, MockField>,
    broken: Vec<String>,
    calls: Vec<Call>,
}

impl MockBackend {
    fn new() -> Self {
        Self {
            order: Vec::new(),
            fields: HashMap::new(),
            broken: Vec::new(),
            calls: Vec::new(),
        }
    }

    fn field(mut self, name: &str, tag: &'static str, rect: Option<Rect>) -> Self {
        self.order.push(name.to_string());
        self.fields.insert(
            name.to_string(),
            MockField {
                tag,
                options: Vec::new(),
                rect,
            },
        );
        self
    }

    fn broken(mut self, name: &str) -> Self {
        self.broken.push(name.to_string());
        self
    }

    fn id(&self, name: &str) -> Option<FieldRef> {
        self.order
            .iter()
            .position(|n| n == name)
            .map(|i| FieldRef((i as u32 + 1, 0)))
    }

    fn name_of(&self, field: FieldRef) -> &str {
        &self.order[field.0 .0 as usize - 1]
    }
}

impl FormBackend for MockBackend {
    fn field_entries(&self) -> Result<Vec<FieldEntry>> {
        Ok(self
            .order
            .iter()
            .map(|name| {
                let f = &self.fields[name];
                FieldEntry {
                    name: name.clone(),
                    native_tag: f.tag.to_string(),
                    options: f.options.clone(),
                }
            })
            .collect())
    }

    fn find_field(&self, name: &str) -> Option<FieldRef> {
        self.id(name)
    }

    fn try_resolve_text_field(&self, name: &str) -> Option<TextControl> {
        let f = self.fields.get(name)?;
        self.id(name)
            .filter(|_| f.tag.starts_with("PDFTextField"))
            .map(TextControl::new)
    }

    fn try_resolve_image_control(&self, name: &str) -> Option<ImageControl> {
        let f = self.fields.get(name)?;
        self.id(name)
            .filter(|_| f.tag.starts_with("PDFButton"))
            .map(ImageControl::new)
    }

    fn first_widget_rect(&self, field: FieldRef) -> Option<Rect> {
        self.fields[self.name_of(field)].rect
    }

    fn set_text(&mut self, control: TextControl, text: &str, _generate: bool) -> Result<()> {
        let name = self.name_of(control.field()).to_string();
        if self.broken.contains(&name) {
            return Err(Error::InvalidField(name));
        }
        self.calls.push(Call::SetText(name, text.to_string()));
        Ok(())
    }

    fn set_need_appearances(&mut self, need: bool) -> Result<()> {
        self.calls.push(Call::NeedAppearances(need));
        Ok(())
    }

    fn embed_image(&mut self, image: &ImageXObject) -> Result<EmbeddedImage> {
        self.calls.push(Call::Embed(image.width, image.height));
        Ok(EmbeddedImage {
            id: (100, 0),
            width: image.width,
            height: image.height,
        })
    }

    fn set_control_image(
        &mut self,
        control: ImageControl,
        _image: &EmbeddedImage,
        alignment: Alignment,
    ) -> Result<()> {
        let name = self.name_of(control.field()).to_string();
        self.calls.push(Call::ControlImage(name, alignment));
        Ok(())
    }

    fn draw_image(&mut self, page: u32, _image: &EmbeddedImage, rect: Rect) -> Result<()> {
        self.calls.push(Call::Draw(page, rect));
        Ok(())
    }

    fn save(&mut self, _options: &SaveOptions) -> Result<Vec<u8>> {
        Ok(b"%PDF-1.7 mock".to_vec())
    }
}

#[test]
fn test_suffixed_tags_are_canonicalized() {
    let backend = MockBackend::new()
        .field("a", "PDFTextField2", None)
        .field("b", "PDFButton7", None)
        .field("c", "PDFHologram", None);
    let catalog = extract_catalog(&backend).unwrap();
    assert_eq!(catalog.len(), 2);
    assert_eq!(catalog.get("a").unwrap().kind, FieldKind::Text);
    assert_eq!(catalog.get("b").unwrap().kind, FieldKind::Button);
}

#[test]
fn test_failing_field_does_not_stop_the_run() {
    let mut backend = MockBackend::new()
        .field("first", "PDFTextField", None)
        .field("broken", "PDFTextField", None)
        .field("last", "PDFTextField", None)
        .broken("broken");
    let catalog = extract_catalog(&backend).unwrap();
    let values = ValueMap::new()
        .with("first", "1")
        .with("broken", "2")
        .with("last", "3");

    let report = inject_values(&mut backend, &catalog, &values, &FillOptions::default());

    assert_eq!(report.applied_count(), 2);
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].kind, WarningKind::FieldResolution);
    assert_eq!(
        backend.calls[..2],
        [
            Call::SetText("first".into(), "1".into()),
            Call::SetText("last".into(), "3".into()),
        ]
    );
    assert_eq!(backend.calls.last(), Some(&Call::NeedAppearances(true)));
}

#[test]
fn test_button_takes_native_path_first() {
    let mut backend = MockBackend::new().field(
        "logo",
        "PDFButton",
        Some(Rect::new(0.0, 0.0, 10.0, 10.0)),
    );
    let catalog = extract_catalog(&backend).unwrap();
    let values = ValueMap::new().with("logo", png_blob(4, 4));
    let options = FillOptions::new().with_image_alignment(Alignment::Left);

    let report = inject_values(&mut backend, &catalog, &values, &options);
    assert_eq!(
        report.outcome("logo"),
        Some(&FieldOutcome::Applied(AppliedAs::ControlAppearance))
    );
    assert_eq!(
        backend.calls,
        vec![
            Call::Embed(4, 4),
            Call::ControlImage("logo".into(), Alignment::Left)
        ]
    );
}

#[test]
fn test_fallback_draws_on_first_page() {
    let rect = Rect::new(50.0, 700.0, 100.0, 40.0);
    let mut backend = MockBackend::new().field("logoTlAfImage", "PDFTextField", Some(rect));
    let catalog = extract_catalog(&backend).unwrap();
    let values = ValueMap::new().with("logoTlAfImage", jpeg_blob(10, 4));

    inject_values(&mut backend, &catalog, &values, &FillOptions::default());
    assert_eq!(backend.calls, vec![Call::Embed(10, 4), Call::Draw(1, rect)]);
}

#[test]
fn test_nothing_embedded_without_destination() {
    let mut backend = MockBackend::new()
        .field("floating", "PDFTextField", None)
        .field("bitmap", "PDFTextField", Some(Rect::new(0.0, 0.0, 5.0, 5.0)));
    let catalog = extract_catalog(&backend).unwrap();
    let values = ValueMap::new()
        .with("floating", png_blob(2, 2))
        .with("bitmap", bmp_blob());

    let report = inject_values(&mut backend, &catalog, &values, &FillOptions::default());
    assert!(backend.calls.is_empty());
    let kinds: Vec<WarningKind> = report.warnings.iter().map(|w| w.kind).collect();
    assert_eq!(
        kinds,
        vec![
            WarningKind::MissingWidgetGeometry,
            WarningKind::UnsupportedImageFormat
        ]
    );
}

#[test]
fn test_need_appearances_only_after_text() {
    let mut backend = MockBackend::new()
        .field("title", "PDFTextField", None)
        .field("agree", "PDFCheckBox", None);
    let catalog = extract_catalog(&backend).unwrap();
    let values = ValueMap::new().with("agree", "yes");

    let report = inject_values(&mut backend, &catalog, &values, &FillOptions::default());
    assert_eq!(
        report.outcome("agree"),
        Some(&FieldOutcome::Skipped(SkipReason::NotTextCapable))
    );
    assert_eq!(
        report.outcome("title"),
        Some(&FieldOutcome::Skipped(SkipReason::NoValue))
    );
    assert!(backend.calls.is_empty());
}

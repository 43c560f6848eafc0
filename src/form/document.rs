//! Form document backed by lopdf.

use std::collections::HashSet;

use lopdf::{dictionary, Dictionary, Document as LopdfDocument, Object, ObjectId, Stream};

use crate::detect::sniff_pdf;
use crate::error::{Error, Result};
use crate::model::{Alignment, Rect};
use crate::save::{stamp_metadata, SaveOptions};

use super::appearance::{
    button_image_appearance, image_draw, text_appearance, DefaultAppearance, TextLayout,
};
use super::backend::{
    EmbeddedImage, FieldEntry, FieldRef, FormBackend, ImageControl, ImageFilter, ImageXObject,
    TextControl,
};
use super::text::{decode_text_string, encode_text_string, object_text};

// Field flag bits (PDF 32000-1, 12.7.4)
const FF_MULTILINE: i64 = 1 << 12;
const FF_RADIO: i64 = 1 << 15;
const FF_PUSHBUTTON: i64 = 1 << 16;
const FF_COMBO: i64 = 1 << 17;

/// Guard against cyclic /Kids chains.
const MAX_FIELD_DEPTH: usize = 32;

/// Terminal field as discovered while walking the AcroForm tree.
#[derive(Debug, Clone)]
struct FieldNode {
    id: ObjectId,
    name: String,
    field_type: Option<Vec<u8>>,
    flags: i64,
    da: Option<String>,
    quadding: i64,
    max_len: Option<usize>,
    widgets: Vec<ObjectId>,
    options: Vec<String>,
}

impl FieldNode {
    fn native_tag(&self) -> Option<&'static str> {
        match self.field_type.as_deref()? {
            b"Tx" => Some("PDFTextField"),
            b"Btn" if self.flags & FF_PUSHBUTTON != 0 => Some("PDFButton"),
            b"Btn" if self.flags & FF_RADIO != 0 => Some("PDFRadioGroup"),
            b"Btn" => Some("PDFCheckBox"),
            b"Ch" if self.flags & FF_COMBO != 0 => Some("PDFDropdown"),
            b"Ch" => Some("PDFOptionList"),
            b"Sig" => Some("PDFSignature"),
            _ => None,
        }
    }

    fn is_text(&self) -> bool {
        matches!(self.field_type.as_deref(), Some(b"Tx"))
    }

    fn is_pushbutton(&self) -> bool {
        matches!(self.field_type.as_deref(), Some(b"Btn")) && self.flags & FF_PUSHBUTTON != 0
    }
}

/// Attributes a field inherits from its ancestors.
#[derive(Debug, Clone, Default)]
struct Inherited {
    field_type: Option<Vec<u8>>,
    flags: Option<i64>,
    da: Option<String>,
    quadding: Option<i64>,
    max_len: Option<usize>,
}

/// A parsed template with an interactive form, ready to be filled.
///
/// The document model is exclusive to one fill: load it fresh from
/// template bytes, mutate it, save it, and drop it.
pub struct FormDocument {
    doc: LopdfDocument,
    fields: Vec<FieldNode>,
    wrapped_pages: HashSet<ObjectId>,
}

impl FormDocument {
    /// Parse template bytes.
    ///
    /// Fails with a parse-class error when the bytes are not a PDF, are
    /// encrypted, or have a malformed object structure.
    pub fn load(data: &[u8]) -> Result<Self> {
        sniff_pdf(data)?;

        let doc = LopdfDocument::load_mem(data).map_err(|e| match e {
            lopdf::Error::Decryption(_) => Error::Encrypted,
            _ => Error::from(e),
        })?;

        if doc.is_encrypted() {
            return Err(Error::Encrypted);
        }

        let fields = collect_fields(&doc)?;
        log::debug!(
            "Loaded PDF {} with {} pages and {} form fields",
            doc.version,
            doc.get_pages().len(),
            fields.len()
        );

        Ok(Self {
            doc,
            fields,
            wrapped_pages: HashSet::new(),
        })
    }

    /// Direct access to the underlying `lopdf::Document`.
    ///
    /// Escape hatch for inspection not covered by `FormBackend`.
    pub fn raw_doc(&self) -> &LopdfDocument {
        &self.doc
    }

    /// PDF version string.
    pub fn version(&self) -> String {
        self.doc.version.to_string()
    }

    /// Number of pages.
    pub fn page_count(&self) -> u32 {
        self.doc.get_pages().len() as u32
    }

    /// Page size (width, height) from the effective MediaBox.
    pub fn page_size(&self, page_num: u32) -> Result<(f32, f32)> {
        let page_id = self.page_id(page_num)?;
        let mut current = Some(page_id);
        let mut depth = 0;
        while let Some(id) = current {
            let dict = self.doc.get_dictionary(id)?;
            if let Some(rect) = dict.get(b"MediaBox").ok().and_then(|o| self.rect_of(o)) {
                return Ok((rect.width, rect.height));
            }
            current = dict.get(b"Parent").and_then(|p| p.as_reference()).ok();
            depth += 1;
            if depth > MAX_FIELD_DEPTH {
                break;
            }
        }
        Ok((612.0, 792.0))
    }

    /// Decompressed, concatenated content streams of a page.
    pub fn page_content(&self, page_num: u32) -> Result<Vec<u8>> {
        let page_id = self.page_id(page_num)?;
        let mut content = Vec::new();
        for obj in self.content_refs(page_id) {
            if let Object::Reference(r) = obj {
                if let Ok(Object::Stream(s)) = self.doc.get_object(r) {
                    let data = if s.dict.has(b"Filter") {
                        s.decompressed_content()
                            .map_err(|e| Error::PdfParse(e.to_string()))?
                    } else {
                        s.content.clone()
                    };
                    content.extend_from_slice(&data);
                    content.push(b'\n');
                }
            }
        }
        Ok(content)
    }

    /// Current value of a field, decoded as text.
    pub fn field_value(&self, name: &str) -> Option<String> {
        let node = self.node(name)?;
        let mut current = Some(node.id);
        while let Some(id) = current {
            let dict = self.doc.get_dictionary(id).ok()?;
            if let Ok(v) = dict.get(b"V") {
                return self.resolve(v).and_then(object_text);
            }
            current = dict.get(b"Parent").and_then(|p| p.as_reference()).ok();
        }
        None
    }

    /// Whether the field's first widget has a normal appearance stream.
    pub fn has_appearance(&self, name: &str) -> bool {
        self.node(name)
            .and_then(|n| n.widgets.first())
            .and_then(|w| self.doc.get_dictionary(*w).ok())
            .and_then(|d| d.get(b"AP").ok())
            .and_then(|ap| self.resolve(ap))
            .and_then(|ap| ap.as_dict().ok())
            .map(|ap| ap.has(b"N"))
            .unwrap_or(false)
    }

    fn page_id(&self, page_num: u32) -> Result<ObjectId> {
        let pages = self.doc.get_pages();
        pages
            .get(&page_num)
            .copied()
            .ok_or_else(|| {
                Error::PdfParse(format!("page {} of {} not found", page_num, pages.len()))
            })
    }

    fn node(&self, name: &str) -> Option<&FieldNode> {
        self.fields.iter().find(|f| f.name == name)
    }

    fn node_by_id(&self, id: ObjectId) -> Result<&FieldNode> {
        self.fields
            .iter()
            .find(|f| f.id == id)
            .ok_or_else(|| Error::FieldNotFound(format!("{} {} R", id.0, id.1)))
    }

    fn resolve<'a>(&'a self, obj: &'a Object) -> Option<&'a Object> {
        resolve(&self.doc, obj)
    }

    fn rect_of(&self, obj: &Object) -> Option<Rect> {
        rect_from_object(&self.doc, obj)
    }

    fn root_id(&self) -> Result<ObjectId> {
        self.doc
            .trailer
            .get(b"Root")
            .and_then(|r| r.as_reference())
            .map_err(|e| Error::PdfParse(format!("document catalog: {}", e)))
    }

    /// Make `owner[key]` an indirect dictionary and return its id.
    ///
    /// Inline dictionaries are hoisted into their own object; a missing
    /// entry becomes `fallback` (or an empty dictionary).
    fn ensure_subdict(
        &mut self,
        owner: ObjectId,
        key: &[u8],
        fallback: Option<Dictionary>,
    ) -> Result<ObjectId> {
        let existing = self.doc.get_dictionary(owner)?.get(key).ok().cloned();
        let id = match existing {
            Some(Object::Reference(id)) if self.doc.get_dictionary(id).is_ok() => return Ok(id),
            Some(Object::Dictionary(inline)) => self.doc.add_object(Object::Dictionary(inline)),
            _ => self
                .doc
                .add_object(Object::Dictionary(fallback.unwrap_or_default())),
        };
        self.doc.get_dictionary_mut(owner)?.set(key.to_vec(), id);
        Ok(id)
    }

    fn acroform_id(&mut self) -> Result<ObjectId> {
        let root = self.root_id()?;
        self.ensure_subdict(root, b"AcroForm", None)
    }

    /// Resources in effect for a page, including ones inherited from the
    /// page tree, copied onto the page itself.
    fn page_resources_id(&mut self, page_id: ObjectId) -> Result<ObjectId> {
        let own = self.doc.get_dictionary(page_id)?.has(b"Resources");
        let inherited = if own {
            None
        } else {
            self.inherited_resources(page_id)
        };
        self.ensure_subdict(page_id, b"Resources", inherited)
    }

    fn inherited_resources(&self, page_id: ObjectId) -> Option<Dictionary> {
        let mut current = self
            .doc
            .get_dictionary(page_id)
            .ok()?
            .get(b"Parent")
            .and_then(|p| p.as_reference())
            .ok();
        let mut depth = 0;
        while let Some(id) = current {
            let dict = self.doc.get_dictionary(id).ok()?;
            if let Ok(res) = dict.get(b"Resources") {
                return self.resolve(res)?.as_dict().ok().cloned();
            }
            current = dict.get(b"Parent").and_then(|p| p.as_reference()).ok();
            depth += 1;
            if depth > MAX_FIELD_DEPTH {
                break;
            }
        }
        None
    }

    fn content_refs(&self, page_id: ObjectId) -> Vec<Object> {
        let Ok(page) = self.doc.get_dictionary(page_id) else {
            return Vec::new();
        };
        match page.get(b"Contents") {
            Ok(Object::Reference(id)) => match self.doc.get_object(*id) {
                Ok(Object::Array(arr)) => arr.clone(),
                Ok(_) => vec![Object::Reference(*id)],
                Err(_) => Vec::new(),
            },
            Ok(Object::Array(arr)) => arr.clone(),
            _ => Vec::new(),
        }
    }

    /// Append a content stream to a page, isolating the existing content in
    /// its own graphics state the first time.
    fn append_page_content(&mut self, page_id: ObjectId, content: Vec<u8>) -> Result<()> {
        let mut contents = self.content_refs(page_id);

        if self.wrapped_pages.insert(page_id) && !contents.is_empty() {
            let open = self.doc.add_object(Stream::new(dictionary! {}, b"q\n".to_vec()));
            let close = self.doc.add_object(Stream::new(dictionary! {}, b"\nQ\n".to_vec()));
            contents.insert(0, Object::Reference(open));
            contents.push(Object::Reference(close));
        }

        let draw = self.doc.add_object(Stream::new(dictionary! {}, content));
        contents.push(Object::Reference(draw));

        self.doc
            .get_dictionary_mut(page_id)?
            .set("Contents", Object::Array(contents));
        Ok(())
    }

    /// Register an XObject under a fresh name in a resources dictionary.
    fn add_xobject(&mut self, resources: ObjectId, image: ObjectId) -> Result<Vec<u8>> {
        let xobjects = self.ensure_subdict(resources, b"XObject", None)?;
        let dict = self.doc.get_dictionary_mut(xobjects)?;
        let mut n = 1;
        let name = loop {
            let candidate = format!("FillIm{}", n).into_bytes();
            if !dict.has(&candidate) {
                break candidate;
            }
            n += 1;
        };
        dict.set(name.clone(), image);
        Ok(name)
    }

    /// Font object for appearance streams, from `/AcroForm /DR /Font`.
    ///
    /// Adds Helvetica under the requested name when the form lacks it.
    fn form_font(&mut self, font_name: &[u8]) -> Result<Object> {
        let acroform = self.acroform_id()?;
        let dr = self.ensure_subdict(acroform, b"DR", None)?;
        let fonts = self.ensure_subdict(dr, b"Font", None)?;

        if let Ok(font) = self.doc.get_dictionary(fonts)?.get(font_name) {
            return Ok(font.clone());
        }

        let helvetica = self.doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        self.doc
            .get_dictionary_mut(fonts)?
            .set(font_name.to_vec(), helvetica);
        Ok(Object::Reference(helvetica))
    }

    fn widget_rect(&self, widget: ObjectId) -> Option<Rect> {
        let dict = self.doc.get_dictionary(widget).ok()?;
        let rect = self.rect_of(dict.get(b"Rect").ok()?)?;
        if rect.is_degenerate() {
            None
        } else {
            Some(rect)
        }
    }

    fn set_normal_appearance(&mut self, widget: ObjectId, stream: ObjectId) -> Result<()> {
        let dict = self.doc.get_dictionary_mut(widget)?;
        dict.set("AP", dictionary! { "N" => stream });
        Ok(())
    }

    fn form_xobject(
        &mut self,
        width: f32,
        height: f32,
        resources: Dictionary,
        content: Vec<u8>,
    ) -> ObjectId {
        let stream = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Form",
                "BBox" => vec![0.0f32.into(), 0.0f32.into(), width.into(), height.into()],
                "Resources" => resources,
            },
            content,
        );
        self.doc.add_object(stream)
    }
}

impl FormBackend for FormDocument {
    fn field_entries(&self) -> Result<Vec<FieldEntry>> {
        let mut entries = Vec::with_capacity(self.fields.len());
        for node in &self.fields {
            match node.native_tag() {
                Some(tag) => entries.push(FieldEntry {
                    name: node.name.clone(),
                    native_tag: tag.to_string(),
                    options: node.options.clone(),
                }),
                None => log::debug!("Skipping field {} with no recognized /FT", node.name),
            }
        }
        Ok(entries)
    }

    fn find_field(&self, name: &str) -> Option<FieldRef> {
        self.node(name).map(|n| FieldRef(n.id))
    }

    fn try_resolve_text_field(&self, name: &str) -> Option<TextControl> {
        self.node(name)
            .filter(|n| n.is_text())
            .map(|n| TextControl::new(FieldRef(n.id)))
    }

    fn try_resolve_image_control(&self, name: &str) -> Option<ImageControl> {
        self.node(name)
            .filter(|n| n.is_pushbutton())
            .map(|n| ImageControl::new(FieldRef(n.id)))
    }

    fn first_widget_rect(&self, field: FieldRef) -> Option<Rect> {
        let node = self.node_by_id(field.0).ok()?;
        let widget = *node.widgets.first()?;
        self.widget_rect(widget)
    }

    fn set_text(
        &mut self,
        control: TextControl,
        text: &str,
        generate_appearance: bool,
    ) -> Result<()> {
        let node = self.node_by_id(control.field().0)?.clone();

        if let Some(max) = node.max_len {
            let len = text.chars().count();
            if len > max {
                return Err(Error::ExceededMaxLength {
                    field: node.name.clone(),
                    len,
                    max,
                });
            }
        }

        // A failed appearance must leave /V untouched
        let mut appearances = Vec::new();
        if generate_appearance {
            let da = DefaultAppearance::parse(node.da.as_deref().unwrap_or(""));
            let layout = TextLayout {
                multiline: node.flags & FF_MULTILINE != 0,
                quadding: node.quadding,
            };
            let font = self.form_font(&da.font)?;

            for widget in &node.widgets {
                let Some(rect) = self.widget_rect(*widget) else {
                    log::debug!("Widget of {} has no rectangle; appearance left to viewer", node.name);
                    continue;
                };
                let content = text_appearance(text, rect.width, rect.height, &da, layout)?;
                let mut fonts = Dictionary::new();
                fonts.set(da.font.clone(), font.clone());
                appearances.push((*widget, rect, dictionary! { "Font" => fonts }, content));
            }
        }

        self.doc
            .get_dictionary_mut(node.id)?
            .set("V", encode_text_string(text));

        for (widget, rect, resources, content) in appearances {
            let stream = self.form_xobject(rect.width, rect.height, resources, content);
            self.set_normal_appearance(widget, stream)?;
        }
        Ok(())
    }

    fn set_need_appearances(&mut self, need: bool) -> Result<()> {
        let acroform = self.acroform_id()?;
        self.doc
            .get_dictionary_mut(acroform)?
            .set("NeedAppearances", Object::Boolean(need));
        Ok(())
    }

    fn embed_image(&mut self, image: &ImageXObject) -> Result<EmbeddedImage> {
        let mut dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => image.width as i64,
            "Height" => image.height as i64,
            "ColorSpace" => image.color_space.pdf_name(),
            "BitsPerComponent" => image.bits_per_component as i64,
            "Filter" => match image.filter {
                ImageFilter::Dct => "DCTDecode",
                ImageFilter::Flate => "FlateDecode",
            },
        };

        if image.inverted {
            let decode: Vec<Object> = (0..4)
                .flat_map(|_| [Object::Integer(1), Object::Integer(0)])
                .collect();
            dict.set("Decode", decode);
        }

        if let Some(alpha) = &image.soft_mask {
            let mut mask = Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => image.width as i64,
                    "Height" => image.height as i64,
                    "ColorSpace" => "DeviceGray",
                    "BitsPerComponent" => 8,
                    "Filter" => "FlateDecode",
                },
                alpha.clone(),
            );
            mask.allows_compression = false;
            let mask_id = self.doc.add_object(mask);
            dict.set("SMask", mask_id);
        }

        let mut stream = Stream::new(dict, image.data.clone());
        stream.allows_compression = false;
        let id = self.doc.add_object(stream);

        Ok(EmbeddedImage {
            id,
            width: image.width,
            height: image.height,
        })
    }

    fn set_control_image(
        &mut self,
        control: ImageControl,
        image: &EmbeddedImage,
        alignment: Alignment,
    ) -> Result<()> {
        let node = self.node_by_id(control.field().0)?.clone();
        let name = b"Img".to_vec();
        let mut applied = 0;

        for widget in &node.widgets {
            let Some(rect) = self.widget_rect(*widget) else {
                continue;
            };
            let content = button_image_appearance(
                &name,
                rect.width,
                rect.height,
                image.width,
                image.height,
                alignment,
            )?;
            let mut xobjects = Dictionary::new();
            xobjects.set(name.clone(), image.id);
            let resources = dictionary! { "XObject" => xobjects };
            let stream = self.form_xobject(rect.width, rect.height, resources, content);
            self.set_normal_appearance(*widget, stream)?;
            applied += 1;
        }

        if applied == 0 {
            return Err(Error::MissingWidgetGeometry(node.name));
        }
        Ok(())
    }

    fn draw_image(&mut self, page: u32, image: &EmbeddedImage, rect: Rect) -> Result<()> {
        let page_id = self.page_id(page)?;
        let resources = self.page_resources_id(page_id)?;
        let name = self.add_xobject(resources, image.id)?;
        let content = image_draw(&name, rect)?;
        self.append_page_content(page_id, content)
    }

    fn save(&mut self, options: &SaveOptions) -> Result<Vec<u8>> {
        if options.update_metadata {
            stamp_metadata(&mut self.doc, &options.producer, chrono::Utc::now())?;
        }
        if options.compress {
            self.doc.compress();
        }

        let mut buffer = Vec::new();
        self.doc
            .save_to(&mut buffer)
            .map_err(|e| Error::Encode(e.to_string()))?;
        Ok(buffer)
    }
}

fn resolve<'a>(doc: &'a LopdfDocument, obj: &'a Object) -> Option<&'a Object> {
    let mut current = obj;
    for _ in 0..MAX_FIELD_DEPTH {
        match current {
            Object::Reference(id) => current = doc.get_object(*id).ok()?,
            other => return Some(other),
        }
    }
    None
}

fn rect_from_object(doc: &LopdfDocument, obj: &Object) -> Option<Rect> {
    let arr = resolve(doc, obj)?.as_array().ok()?;
    if arr.len() != 4 {
        return None;
    }
    let mut v = [0.0f32; 4];
    for (slot, item) in v.iter_mut().zip(arr) {
        *slot = resolve(doc, item)?.as_float().ok()?;
    }
    Some(Rect::from_corners(v[0], v[1], v[2], v[3]))
}

/// Walk `/AcroForm /Fields` depth-first, returning terminal fields in
/// declaration order.
fn collect_fields(doc: &LopdfDocument) -> Result<Vec<FieldNode>> {
    let root_id = doc
        .trailer
        .get(b"Root")
        .and_then(|r| r.as_reference())
        .map_err(|e| Error::PdfParse(format!("document catalog: {}", e)))?;
    let catalog = doc.get_dictionary(root_id)?;

    let Some(acroform) = catalog
        .get(b"AcroForm")
        .ok()
        .and_then(|a| resolve(doc, a))
        .and_then(|a| a.as_dict().ok())
    else {
        return Ok(Vec::new());
    };

    let root_inherited = Inherited {
        da: acroform
            .get(b"DA")
            .ok()
            .and_then(|d| resolve(doc, d))
            .and_then(object_text),
        quadding: acroform.get(b"Q").and_then(|q| q.as_i64()).ok(),
        ..Default::default()
    };

    let Some(fields) = acroform
        .get(b"Fields")
        .ok()
        .and_then(|f| resolve(doc, f))
        .and_then(|f| f.as_array().ok())
    else {
        return Ok(Vec::new());
    };

    let mut out = Vec::new();
    let mut visited = HashSet::new();
    for item in fields {
        match item {
            Object::Reference(id) => {
                walk_field(doc, *id, "", &root_inherited, 0, &mut visited, &mut out)
            }
            other => log::warn!("Ignoring non-reference entry in /Fields: {:?}", other),
        }
    }
    Ok(out)
}

fn walk_field(
    doc: &LopdfDocument,
    id: ObjectId,
    prefix: &str,
    inherited: &Inherited,
    depth: usize,
    visited: &mut HashSet<ObjectId>,
    out: &mut Vec<FieldNode>,
) {
    if depth > MAX_FIELD_DEPTH || !visited.insert(id) {
        log::warn!("Field tree too deep or cyclic at {} {} R", id.0, id.1);
        return;
    }
    let Ok(dict) = doc.get_dictionary(id) else {
        log::warn!("Field reference {} {} R is not a dictionary", id.0, id.1);
        return;
    };

    let partial = dict
        .get(b"T")
        .ok()
        .and_then(|t| resolve(doc, t))
        .and_then(object_text);
    let name = match (&partial, prefix.is_empty()) {
        (Some(p), true) => p.clone(),
        (Some(p), false) => format!("{}.{}", prefix, p),
        (None, _) => prefix.to_string(),
    };

    let here = Inherited {
        field_type: match dict.get(b"FT") {
            Ok(Object::Name(n)) => Some(n.clone()),
            _ => inherited.field_type.clone(),
        },
        flags: dict.get(b"Ff").and_then(|f| f.as_i64()).ok().or(inherited.flags),
        da: dict
            .get(b"DA")
            .ok()
            .and_then(|d| resolve(doc, d))
            .and_then(object_text)
            .or_else(|| inherited.da.clone()),
        quadding: dict.get(b"Q").and_then(|q| q.as_i64()).ok().or(inherited.quadding),
        max_len: dict
            .get(b"MaxLen")
            .and_then(|m| m.as_i64())
            .ok()
            .and_then(|m| usize::try_from(m).ok())
            .or(inherited.max_len),
    };

    let kids: Vec<ObjectId> = dict
        .get(b"Kids")
        .ok()
        .and_then(|k| resolve(doc, k))
        .and_then(|k| k.as_array().ok())
        .map(|arr| arr.iter().filter_map(|k| k.as_reference().ok()).collect())
        .unwrap_or_default();

    let (field_kids, widget_kids): (Vec<ObjectId>, Vec<ObjectId>) = kids
        .into_iter()
        .partition(|kid| doc.get_dictionary(*kid).map(|d| d.has(b"T")).unwrap_or(false));

    if !field_kids.is_empty() {
        for kid in field_kids {
            walk_field(doc, kid, &name, &here, depth + 1, visited, out);
        }
        if widget_kids.is_empty() {
            return;
        }
    }

    if name.is_empty() {
        log::debug!("Skipping unnamed field {} {} R", id.0, id.1);
        return;
    }

    let widgets = if !widget_kids.is_empty() {
        widget_kids
    } else if dict.has(b"Rect")
        || matches!(dict.get(b"Subtype"), Ok(Object::Name(n)) if n == b"Widget")
    {
        vec![id]
    } else {
        Vec::new()
    };

    let flags = here.flags.unwrap_or(0);
    let options = match here.field_type.as_deref() {
        Some(b"Ch") => choice_options(doc, dict),
        Some(b"Btn") if flags & FF_RADIO != 0 => {
            let opts = choice_options(doc, dict);
            if opts.is_empty() {
                radio_on_states(doc, &widgets)
            } else {
                opts
            }
        }
        _ => Vec::new(),
    };

    out.push(FieldNode {
        id,
        name,
        field_type: here.field_type,
        flags,
        da: here.da,
        quadding: here.quadding.unwrap_or(0),
        max_len: here.max_len,
        widgets,
        options,
    });
}

/// `/Opt` entries: plain strings or `[export display]` pairs.
fn choice_options(doc: &LopdfDocument, dict: &Dictionary) -> Vec<String> {
    let Some(opts) = dict
        .get(b"Opt")
        .ok()
        .and_then(|o| resolve(doc, o))
        .and_then(|o| o.as_array().ok())
    else {
        return Vec::new();
    };

    opts.iter()
        .filter_map(|opt| match resolve(doc, opt)? {
            Object::Array(pair) => pair
                .last()
                .and_then(|display| resolve(doc, display))
                .and_then(object_text),
            other => object_text(other),
        })
        .collect()
}

/// On-state appearance names of a radio group's widgets.
fn radio_on_states(doc: &LopdfDocument, widgets: &[ObjectId]) -> Vec<String> {
    let mut states: Vec<String> = Vec::new();
    for widget in widgets {
        let normal = doc
            .get_dictionary(*widget)
            .ok()
            .and_then(|w| w.get(b"AP").ok())
            .and_then(|ap| resolve(doc, ap))
            .and_then(|ap| ap.as_dict().ok())
            .and_then(|ap| ap.get(b"N").ok())
            .and_then(|n| resolve(doc, n))
            .and_then(|n| n.as_dict().ok());
        if let Some(normal) = normal {
            for (key, _) in normal.iter() {
                if key.as_slice() != b"Off" {
                    let state = decode_text_string(key);
                    if !states.contains(&state) {
                        states.push(state);
                    }
                }
            }
        }
    }
    states
}

//! Shared fixtures: synthetic AcroForm templates and image blobs.

#![allow(dead_code)]

use std::io::Cursor;

use image::{DynamicImage, ImageBuffer, Rgb, Rgba};
use lopdf::content::Content;
use lopdf::{dictionary, Dictionary, Document, Object, StringFormat, Stream};

use fillpdf::{FormDocument, ImageBlob};

pub const FF_MULTILINE: i64 = 1 << 12;
pub const FF_RADIO: i64 = 1 << 15;
pub const FF_PUSHBUTTON: i64 = 1 << 16;
pub const FF_COMBO: i64 = 1 << 17;

fn text(s: &str) -> Object {
    Object::String(s.as_bytes().to_vec(), StringFormat::Literal)
}

fn rect(x1: f32, y1: f32, x2: f32, y2: f32) -> Object {
    Object::Array(vec![Object::Real(x1), Object::Real(y1), Object::Real(x2), Object::Real(y2)])
}

enum FieldSpec {
    Terminal(Dictionary),
    Radio {
        name: String,
        states: Vec<String>,
    },
}

/// Builds a one-page template whose fields are also its widgets.
pub struct TemplateBuilder {
    fields: Vec<FieldSpec>,
    page_content: Option<Vec<u8>>,
    default_da: Option<String>,
}

impl TemplateBuilder {
    pub fn new() -> Self {
        Self {
            fields: Vec::new(),
            page_content: None,
            default_da: Some("/Helv 0 Tf 0 g".to_string()),
        }
    }

    fn terminal(mut self, name: &str, ft: &str, flags: i64, r: [f32; 4]) -> Self {
        self.fields.push(FieldSpec::Terminal(dictionary! {
            "T" => text(name),
            "FT" => ft,
            "Ff" => flags,
            "Subtype" => "Widget",
            "Rect" => rect(r[0], r[1], r[2], r[3]),
        }));
        self
    }

    pub fn text_field(self, name: &str, r: [f32; 4]) -> Self {
        self.terminal(name, "Tx", 0, r)
    }

    pub fn multiline_field(self, name: &str, r: [f32; 4]) -> Self {
        self.terminal(name, "Tx", FF_MULTILINE, r)
    }

    pub fn button(self, name: &str, r: [f32; 4]) -> Self {
        self.terminal(name, "Btn", FF_PUSHBUTTON, r)
    }

    pub fn checkbox(self, name: &str, r: [f32; 4]) -> Self {
        self.terminal(name, "Btn", 0, r)
    }

    pub fn signature(self, name: &str, r: [f32; 4]) -> Self {
        self.terminal(name, "Sig", 0, r)
    }

    pub fn dropdown(mut self, name: &str, options: &[&str]) -> Self {
        let opts: Vec<Object> = options.iter().map(|o| text(o)).collect();
        self.fields.push(FieldSpec::Terminal(dictionary! {
            "T" => text(name),
            "FT" => "Ch",
            "Ff" => FF_COMBO,
            "Subtype" => "Widget",
            "Rect" => rect(300.0, 500.0, 400.0, 520.0),
            "Opt" => opts,
        }));
        self
    }

    pub fn option_list(mut self, name: &str, pairs: &[(&str, &str)]) -> Self {
        let opts: Vec<Object> = pairs
            .iter()
            .map(|(export, display)| Object::Array(vec![text(export), text(display)]))
            .collect();
        self.fields.push(FieldSpec::Terminal(dictionary! {
            "T" => text(name),
            "FT" => "Ch",
            "Subtype" => "Widget",
            "Rect" => rect(300.0, 400.0, 400.0, 480.0),
            "Opt" => opts,
        }));
        self
    }

    /// Radio group with one widget kid per on-state.
    pub fn radio(mut self, name: &str, states: &[&str]) -> Self {
        self.fields.push(FieldSpec::Radio {
            name: name.to_string(),
            states: states.iter().map(|s| s.to_string()).collect(),
        });
        self
    }

    /// Field with no rectangle and no widget.
    pub fn geometry_less_field(mut self, name: &str) -> Self {
        self.fields.push(FieldSpec::Terminal(dictionary! {
            "T" => text(name),
            "FT" => "Tx",
        }));
        self
    }

    /// Field dictionary with no /FT at all.
    pub fn untyped_field(mut self, name: &str) -> Self {
        self.fields.push(FieldSpec::Terminal(dictionary! {
            "T" => text(name),
            "Subtype" => "Widget",
            "Rect" => rect(0.0, 0.0, 10.0, 10.0),
        }));
        self
    }

    pub fn with_max_len(mut self, max: i64) -> Self {
        if let Some(FieldSpec::Terminal(dict)) = self.fields.last_mut() {
            dict.set("MaxLen", max);
        }
        self
    }

    pub fn with_page_content(mut self, content: &[u8]) -> Self {
        self.page_content = Some(content.to_vec());
        self
    }

    pub fn without_default_appearance(mut self) -> Self {
        self.default_da = None;
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();

        let mut page = dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Resources" => dictionary! {},
        };
        if let Some(content) = self.page_content {
            let id = doc.add_object(Stream::new(dictionary! {}, content));
            page.set("Contents", id);
        }
        let page_id = doc.add_object(page);
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );

        let mut refs = Vec::new();
        let mut annots = Vec::new();
        for spec in self.fields {
            match spec {
                FieldSpec::Terminal(mut dict) => {
                    dict.set("P", page_id);
                    let id = doc.add_object(dict);
                    refs.push(Object::Reference(id));
                    annots.push(Object::Reference(id));
                }
                FieldSpec::Radio { name, states } => {
                    let parent_id = doc.new_object_id();
                    let mut kids = Vec::new();
                    for (i, state) in states.iter().enumerate() {
                        let on = doc.add_object(Stream::new(dictionary! {}, Vec::new()));
                        let off = doc.add_object(Stream::new(dictionary! {}, Vec::new()));
                        let mut normal = Dictionary::new();
                        normal.set(state.as_bytes().to_vec(), on);
                        normal.set("Off", off);
                        let x = 50.0 + 30.0 * i as f32;
                        let kid = doc.add_object(dictionary! {
                            "Type" => "Annot",
                            "Subtype" => "Widget",
                            "Parent" => parent_id,
                            "P" => page_id,
                            "Rect" => rect(x, 300.0, x + 20.0, 320.0),
                            "AP" => dictionary! { "N" => normal },
                        });
                        kids.push(Object::Reference(kid));
                        annots.push(Object::Reference(kid));
                    }
                    doc.objects.insert(
                        parent_id,
                        Object::Dictionary(dictionary! {
                            "T" => text(&name),
                            "FT" => "Btn",
                            "Ff" => FF_RADIO,
                            "Kids" => kids,
                        }),
                    );
                    refs.push(Object::Reference(parent_id));
                }
            }
        }

        if let Ok(page) = doc.get_dictionary_mut(page_id) {
            page.set("Annots", annots);
        }

        let mut acroform = dictionary! { "Fields" => refs };
        if let Some(da) = self.default_da {
            acroform.set("DA", text(&da));
        }
        let acroform_id = doc.add_object(acroform);
        let catalog = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
            "AcroForm" => acroform_id,
        });
        doc.trailer.set("Root", catalog);

        let mut out = Vec::new();
        doc.save_to(&mut out).expect("fixture saves");
        out
    }
}

/// The flyer template used across the integration tests.
pub fn flyer_template() -> Vec<u8> {
    TemplateBuilder::new()
        .text_field("mainHeadline", [50.0, 600.0, 550.0, 650.0])
        .button("logoButton", [450.0, 700.0, 550.0, 760.0])
        .text_field("logoTlAfImage", [50.0, 700.0, 150.0, 740.0])
        .multiline_field("eventDescription", [50.0, 200.0, 550.0, 400.0])
        .build()
}

fn encode(img: DynamicImage, format: image::ImageFormat) -> Vec<u8> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), format)
        .expect("fixture image encodes");
    buf
}

pub fn png_blob(width: u32, height: u32) -> ImageBlob {
    let img = ImageBuffer::from_pixel(width, height, Rgba([20u8, 120, 220, 255]));
    ImageBlob::new(
        encode(DynamicImage::ImageRgba8(img), image::ImageFormat::Png),
        "image/png",
    )
}

pub fn jpeg_blob(width: u32, height: u32) -> ImageBlob {
    let img = ImageBuffer::from_pixel(width, height, Rgb([220u8, 60, 30]));
    ImageBlob::new(
        encode(DynamicImage::ImageRgb8(img), image::ImageFormat::Jpeg),
        "image/jpeg",
    )
}

/// Minimal BMP header; never decoded.
pub fn bmp_blob() -> ImageBlob {
    let mut bytes = b"BM".to_vec();
    bytes.extend_from_slice(&[0u8; 52]);
    ImageBlob::new(bytes, "image/bmp")
}

/// Decoded operations of a page's content.
pub fn page_operations(doc: &FormDocument, page: u32) -> Vec<lopdf::content::Operation> {
    let bytes = doc.page_content(page).expect("page content");
    Content::decode(&bytes).expect("content decodes").operations
}

/// Operands of every `cm` that is immediately followed by a `Do`.
pub fn image_placements(doc: &FormDocument, page: u32) -> Vec<[f32; 6]> {
    let ops = page_operations(doc, page);
    ops.windows(2)
        .filter(|pair| pair[0].operator == "cm" && pair[1].operator == "Do")
        .map(|pair| {
            let v: Vec<f32> = pair[0]
                .operands
                .iter()
                .map(|o| o.as_float().expect("numeric operand"))
                .collect();
            [v[0], v[1], v[2], v[3], v[4], v[5]]
        })
        .collect()
}

pub fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 0.01
}

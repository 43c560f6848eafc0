//! Appearance stream content for filled fields.

use std::sync::OnceLock;

use lopdf::content::{Content, Operation};
use lopdf::{Object, StringFormat};
use regex::Regex;

use crate::error::{Error, Result};
use crate::model::{Alignment, Rect};

use super::text::encode_latin1_lossy;

/// Inner padding between the widget border and its text.
const TEXT_PADDING: f32 = 2.0;
const LINE_HEIGHT: f32 = 1.15;
const MIN_AUTO_FONT_SIZE: f32 = 4.0;
const MAX_AUTO_FONT_SIZE: f32 = 12.0;
/// Rough Helvetica advance per em, used to place centered and right text.
const AVERAGE_GLYPH_WIDTH: f32 = 0.5;

/// Font name used when a field's DA does not name one.
pub const DEFAULT_FONT_NAME: &[u8] = b"Helv";

/// Parsed `/DA` default appearance string.
#[derive(Debug, Clone, PartialEq)]
pub struct DefaultAppearance {
    /// Font resource name (without the slash)
    pub font: Vec<u8>,
    /// Font size; 0 means auto
    pub size: f32,
    /// Color operator and operands, e.g. `("rg", [0, 0, 1])`
    pub color: Option<(String, Vec<f32>)>,
}

impl Default for DefaultAppearance {
    fn default() -> Self {
        Self {
            font: DEFAULT_FONT_NAME.to_vec(),
            size: 0.0,
            color: None,
        }
    }
}

fn font_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"/([^\s/\[\]()<>{}%]+)\s+(-?\d*\.?\d+)\s+Tf").expect("valid font regex")
    })
}

fn color_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"((?:-?\d*\.?\d+\s+){1,4})(rg|g|k)\b").expect("valid color regex")
    })
}

impl DefaultAppearance {
    /// Parse a DA string such as `/Helv 12 Tf 0 g`.
    ///
    /// Missing pieces fall back to defaults: font `Helv`, auto size, no
    /// color operator.
    pub fn parse(da: &str) -> Self {
        let mut parsed = DefaultAppearance::default();

        if let Some(caps) = font_regex().captures(da) {
            parsed.font = caps[1].as_bytes().to_vec();
            parsed.size = caps[2].parse().unwrap_or(0.0);
        }

        if let Some(caps) = color_regex().captures_iter(da).last() {
            let operands: Vec<f32> = caps[1]
                .split_whitespace()
                .filter_map(|n| n.parse().ok())
                .collect();
            let op = caps[2].to_string();
            let expected = match op.as_str() {
                "g" => 1,
                "rg" => 3,
                _ => 4,
            };
            if operands.len() >= expected {
                let start = operands.len() - expected;
                parsed.color = Some((op, operands[start..].to_vec()));
            }
        }

        parsed
    }
}

/// Layout flags for a text widget.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextLayout {
    pub multiline: bool,
    /// Quadding: 0 left, 1 centered, 2 right
    pub quadding: i64,
}

fn real(v: f32) -> Object {
    Object::Real(v)
}

fn encode(operations: Vec<Operation>) -> Result<Vec<u8>> {
    Content { operations }
        .encode()
        .map_err(|e| Error::Encode(e.to_string()))
}

fn auto_font_size(text: &str, width: f32, height: f32, multiline: bool) -> f32 {
    let usable_h = (height - 2.0 * TEXT_PADDING).max(1.0);
    let usable_w = (width - 2.0 * TEXT_PADDING).max(1.0);
    if multiline {
        return MAX_AUTO_FONT_SIZE.min(usable_h).max(MIN_AUTO_FONT_SIZE);
    }
    let chars = text.chars().count().max(1) as f32;
    let by_height = usable_h / LINE_HEIGHT;
    let by_width = usable_w / (chars * AVERAGE_GLYPH_WIDTH);
    by_height
        .min(by_width)
        .clamp(MIN_AUTO_FONT_SIZE, MAX_AUTO_FONT_SIZE)
}

fn line_x(line: &str, size: f32, width: f32, quadding: i64) -> f32 {
    let estimated = line.chars().count() as f32 * size * AVERAGE_GLYPH_WIDTH;
    match quadding {
        1 => ((width - estimated) / 2.0).max(TEXT_PADDING),
        2 => (width - TEXT_PADDING - estimated).max(TEXT_PADDING),
        _ => TEXT_PADDING,
    }
}

/// Content of a text field's normal appearance, in widget-local space.
pub fn text_appearance(
    text: &str,
    width: f32,
    height: f32,
    da: &DefaultAppearance,
    layout: TextLayout,
) -> Result<Vec<u8>> {
    let size = if da.size > 0.0 {
        da.size
    } else {
        auto_font_size(text, width, height, layout.multiline)
    };

    let mut ops = vec![
        Operation::new("BMC", vec![Object::Name(b"Tx".to_vec())]),
        Operation::new("q", vec![]),
        Operation::new(
            "re",
            vec![
                real(1.0),
                real(1.0),
                real((width - 2.0).max(0.0)),
                real((height - 2.0).max(0.0)),
            ],
        ),
        Operation::new("W", vec![]),
        Operation::new("n", vec![]),
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec![Object::Name(da.font.clone()), real(size)]),
    ];

    if let Some((op, operands)) = &da.color {
        ops.push(Operation::new(op, operands.iter().map(|v| real(*v)).collect()));
    }

    let lines: Vec<&str> = if layout.multiline {
        text.lines().collect()
    } else {
        vec![text.lines().next().unwrap_or("")]
    };

    let leading = size * LINE_HEIGHT;
    let mut y = if layout.multiline {
        height - TEXT_PADDING - size
    } else {
        (height - size) / 2.0 + size * 0.22
    };
    let mut prev_x = 0.0;
    let mut prev_y = 0.0;

    for line in lines {
        let x = line_x(line, size, width, layout.quadding);
        ops.push(Operation::new("Td", vec![real(x - prev_x), real(y - prev_y)]));
        ops.push(Operation::new(
            "Tj",
            vec![Object::String(encode_latin1_lossy(line), StringFormat::Literal)],
        ));
        prev_x = x;
        prev_y = y;
        y -= leading;
    }

    ops.push(Operation::new("ET", vec![]));
    ops.push(Operation::new("Q", vec![]));
    ops.push(Operation::new("EMC", vec![]));

    encode(ops)
}

/// Content drawing an image XObject into `target`.
pub fn image_draw(xobject_name: &[u8], target: Rect) -> Result<Vec<u8>> {
    encode(vec![
        Operation::new("q", vec![]),
        Operation::new(
            "cm",
            vec![
                real(target.width),
                real(0.0),
                real(0.0),
                real(target.height),
                real(target.x),
                real(target.y),
            ],
        ),
        Operation::new("Do", vec![Object::Name(xobject_name.to_vec())]),
        Operation::new("Q", vec![]),
    ])
}

/// Content of a push button's normal appearance showing an image.
///
/// The image keeps its aspect ratio and is fitted inside the widget.
pub fn button_image_appearance(
    xobject_name: &[u8],
    width: f32,
    height: f32,
    image_width: u32,
    image_height: u32,
    alignment: Alignment,
) -> Result<Vec<u8>> {
    let frame = Rect::new(0.0, 0.0, width, height);
    let target = frame.fit(image_width as f32, image_height as f32, alignment);
    image_draw(xobject_name, target)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ops(bytes: &[u8]) -> Vec<Operation> {
        Content::decode(bytes).unwrap().operations
    }

    #[test]
    fn test_parse_da() {
        let da = DefaultAppearance::parse("/Helv 12 Tf 0 g");
        assert_eq!(da.font, b"Helv".to_vec());
        assert_eq!(da.size, 12.0);
        assert_eq!(da.color, Some(("g".to_string(), vec![0.0])));

        let da = DefaultAppearance::parse("0.2 0.4 0.6 rg /F1 0 Tf");
        assert_eq!(da.font, b"F1".to_vec());
        assert_eq!(da.size, 0.0);
        assert_eq!(da.color, Some(("rg".to_string(), vec![0.2, 0.4, 0.6])));
    }

    #[test]
    fn test_parse_empty_da() {
        assert_eq!(DefaultAppearance::parse(""), DefaultAppearance::default());
    }

    #[test]
    fn test_text_appearance_shows_text() {
        let da = DefaultAppearance::parse("/Helv 10 Tf 0 g");
        let bytes = text_appearance("Grand Opening", 200.0, 20.0, &da, TextLayout::default())
            .unwrap();
        let ops = ops(&bytes);
        let tj = ops.iter().find(|op| op.operator == "Tj").unwrap();
        assert_eq!(
            tj.operands[0],
            Object::String(b"Grand Opening".to_vec(), StringFormat::Literal)
        );
        assert_eq!(ops.first().unwrap().operator, "BMC");
        assert_eq!(ops.last().unwrap().operator, "EMC");
    }

    #[test]
    fn test_multiline_emits_one_show_per_line() {
        let da = DefaultAppearance::parse("/Helv 0 Tf");
        let layout = TextLayout {
            multiline: true,
            quadding: 0,
        };
        let bytes = text_appearance("one\ntwo\nthree", 200.0, 80.0, &da, layout).unwrap();
        let shows = ops(&bytes).iter().filter(|op| op.operator == "Tj").count();
        assert_eq!(shows, 3);
    }

    #[test]
    fn test_auto_size_is_bounded() {
        let size = auto_font_size("a very long line of text indeed", 50.0, 300.0, false);
        assert!(size >= MIN_AUTO_FONT_SIZE && size <= MAX_AUTO_FONT_SIZE);
    }

    #[test]
    fn test_image_draw_matrix() {
        let bytes = image_draw(b"Im1", Rect::new(50.0, 700.0, 100.0, 40.0)).unwrap();
        let ops = ops(&bytes);
        let cm = ops.iter().find(|op| op.operator == "cm").unwrap();
        let values: Vec<f32> = cm.operands.iter().map(|o| o.as_float().unwrap()).collect();
        assert_eq!(values, vec![100.0, 0.0, 0.0, 40.0, 50.0, 700.0]);
    }
}

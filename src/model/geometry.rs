//! Page-space geometry.

use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in PDF user space (origin bottom-left).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    /// Create a rectangle from its lower-left corner and size.
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Build from a PDF `[x1 y1 x2 y2]` array, whichever corners it names.
    pub fn from_corners(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self {
            x: x1.min(x2),
            y: y1.min(y2),
            width: (x2 - x1).abs(),
            height: (y2 - y1).abs(),
        }
    }

    /// Whether the rectangle encloses no area.
    pub fn is_degenerate(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    /// Largest rectangle of the given aspect that fits inside `self`,
    /// positioned by `alignment`.
    pub fn fit(&self, content_width: f32, content_height: f32, alignment: Alignment) -> Rect {
        if content_width <= 0.0 || content_height <= 0.0 || self.is_degenerate() {
            return *self;
        }
        let scale = (self.width / content_width).min(self.height / content_height);
        let w = content_width * scale;
        let h = content_height * scale;
        let x = match alignment {
            Alignment::Left => self.x,
            Alignment::Center => self.x + (self.width - w) / 2.0,
            Alignment::Right => self.x + self.width - w,
        };
        let y = self.y + (self.height - h) / 2.0;
        Rect::new(x, y, w, h)
    }
}

/// Horizontal placement of fitted content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Alignment {
    Left,
    #[default]
    Center,
    Right,
}

//! Data models for design elements.

use serde::{Deserialize, Serialize};

use crate::document::new_id;

/// Element identifier.
pub type ElementId = String;

/// A 2-D point in page-local pixel coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Width/height dimensions in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// The kind of element and its type-specific payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ElementKind {
    /// A geometric shape from the shape library.
    Shape { shape: String },
    /// An icon glyph from the icon library.
    Icon { glyph: String },
    /// A QR code pointing at a target URL.
    Qrcode { url: String },
}

impl ElementKind {
    /// Human-readable label for the element kind.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Shape { .. } => "Shape",
            Self::Icon { .. } => "Icon",
            Self::Qrcode { .. } => "QR Code",
        }
    }
}

/// Visual style attributes shared by all element kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElementStyle {
    pub fill: String,
    pub stroke: String,
    pub stroke_width: f64,
    pub opacity: f64,
}

impl Default for ElementStyle {
    fn default() -> Self {
        Self {
            fill: "#1a1a1a".to_string(),
            stroke: "none".to_string(),
            stroke_width: 0.0,
            opacity: 1.0,
        }
    }
}

/// A free-positioned overlay on a page canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignElement {
    pub id: ElementId,
    #[serde(flatten)]
    pub kind: ElementKind,
    pub position: Point,
    pub size: Size,
    /// Rotation in degrees, clockwise.
    pub rotation: f64,
    /// Paint order; higher draws on top, ties broken by insertion order.
    pub z_index: i32,
    /// Blocks delete and drag while true.
    pub locked: bool,
    pub visible: bool,
    pub style: ElementStyle,
}

impl DesignElement {
    /// Creates a new element of the given kind at a position.
    pub fn new(kind: ElementKind, position: Point, size: Size) -> Self {
        Self {
            id: new_id(),
            kind,
            position,
            size,
            rotation: 0.0,
            z_index: 0,
            locked: false,
            visible: true,
            style: ElementStyle::default(),
        }
    }

    /// Builder: set the style.
    pub fn with_style(mut self, style: ElementStyle) -> Self {
        self.style = style;
        self
    }

    /// Builder: set the rotation in degrees.
    pub fn with_rotation(mut self, degrees: f64) -> Self {
        self.rotation = degrees;
        self
    }

    /// Inline style string for the element's DOM node.
    pub fn inline_style(&self) -> String {
        format!(
            "left:{}px;top:{}px;width:{}px;height:{}px;transform:rotate({}deg);\
             z-index:{};opacity:{}",
            self.position.x,
            self.position.y,
            self.size.width,
            self.size.height,
            self.rotation,
            self.z_index,
            self.style.opacity,
        )
    }

    /// Serialized markup for the clipboard buffer and DOM insertion.
    pub fn markup(&self) -> String {
        let body = match &self.kind {
            ElementKind::Shape { shape } => format!("<svg data-shape=\"{shape}\"></svg>"),
            ElementKind::Icon { glyph } => format!("<i data-glyph=\"{glyph}\"></i>"),
            ElementKind::Qrcode { url } => format!("<canvas data-qr=\"{url}\"></canvas>"),
        };
        format!(
            "<div class=\"design-element\" data-element-id=\"{}\" style=\"{}\">{}</div>",
            self.id,
            self.inline_style(),
            body
        )
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_element_defaults() {
        let el = DesignElement::new(
            ElementKind::Shape {
                shape: "circle".into(),
            },
            Point::new(10.0, 20.0),
            Size::new(100.0, 50.0),
        );
        assert!(!el.id.is_empty());
        assert!(!el.locked);
        assert!(el.visible);
        assert_eq!(el.z_index, 0);
        assert_eq!(el.style.opacity, 1.0);
    }

    #[test]
    fn test_kind_wire_format() {
        let el = DesignElement::new(
            ElementKind::Qrcode {
                url: "https://example.com/listing".into(),
            },
            Point::default(),
            Size::new(80.0, 80.0),
        );
        let json = serde_json::to_value(&el).unwrap();
        assert_eq!(json["type"], "qrcode");
        assert_eq!(json["url"], "https://example.com/listing");
    }

    #[test]
    fn test_markup_carries_id_and_position() {
        let el = DesignElement::new(
            ElementKind::Icon {
                glyph: "key".into(),
            },
            Point::new(5.0, 6.0),
            Size::new(24.0, 24.0),
        );
        let markup = el.markup();
        assert!(markup.contains(&el.id));
        assert!(markup.contains("left:5px;top:6px"));
        assert!(markup.contains("data-glyph=\"key\""));
    }
}

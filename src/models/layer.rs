// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Layer data structures.
//!
//! A layer is one positioned, orderable visual element. The fields shared by
//! every layer live on [`Layer`]; the type-specific payload lives in
//! [`LayerKind`], which is serialized with a `type` tag alongside the common
//! fields.

use super::color::Color;
use serde::{Deserialize, Serialize};

/// A 2D point in canvas pixel space.
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

/// Crop rectangle in source image pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Crop {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Declarative filter parameters of an image layer.
///
/// Numeric fields are signed deltas; `None` means no effect.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brightness: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contrast: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saturation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hue: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blur: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sharpen: Option<f64>,
    pub grayscale: bool,
    pub sepia: bool,
    pub invert: bool,
}

impl ImageFilters {
    fn clamp(&mut self) {
        clamp_opt(&mut self.brightness, -100.0, 100.0);
        clamp_opt(&mut self.contrast, -100.0, 100.0);
        clamp_opt(&mut self.saturation, -100.0, 100.0);
        clamp_opt(&mut self.hue, -180.0, 180.0);
        clamp_opt(&mut self.blur, 0.0, 100.0);
        clamp_opt(&mut self.sharpen, 0.0, 100.0);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagePayload {
    pub src: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default)]
    pub flip_x: bool,
    #[serde(default)]
    pub flip_y: bool,
    #[serde(default)]
    pub rotation: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop: Option<Crop>,
    #[serde(default)]
    pub filters: ImageFilters,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextPayload {
    pub content: String,
    pub font_size: f64,
    pub font_family: String,
    pub color: Color,
    #[serde(default)]
    pub font_weight: FontWeight,
    #[serde(default)]
    pub font_style: FontStyle,
    #[serde(default)]
    pub text_align: TextAlign,
    #[serde(default)]
    pub underline: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeType {
    Rectangle,
    Circle,
    Line,
    Arrow,
    Triangle,
}

impl ShapeType {
    /// Human-readable label for the shape type.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Rectangle => "Rectangle",
            Self::Circle => "Circle",
            Self::Line => "Line",
            Self::Arrow => "Arrow",
            Self::Triangle => "Triangle",
        }
    }

    /// All variants in definition order.
    pub fn all() -> [Self; 5] {
        [
            Self::Rectangle,
            Self::Circle,
            Self::Line,
            Self::Arrow,
            Self::Triangle,
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapePayload {
    pub shape_type: ShapeType,
    pub fill: Color,
    pub stroke: Color,
    pub stroke_width: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StickerPayload {
    pub sticker_id: String,
    pub sticker_url: String,
    pub category: String,
    /// Catalog name; the layer's own `name` is separate and user editable.
    #[serde(rename = "stickerName")]
    pub name: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrushType {
    #[default]
    Pen,
    Brush,
    Eraser,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawingPayload {
    pub points: Vec<Point>,
    pub brush_size: f64,
    pub brush_color: Color,
    #[serde(default)]
    pub brush_type: BrushType,
}

/// Type-specific payload of a layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LayerKind {
    Image(ImagePayload),
    Text(TextPayload),
    Shape(ShapePayload),
    Sticker(StickerPayload),
    Drawing(DrawingPayload),
}

/// Discriminant of [`LayerKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerType {
    Image,
    Text,
    Shape,
    Sticker,
    Drawing,
}

impl LayerType {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Image => "Image",
            Self::Text => "Text",
            Self::Shape => "Shape",
            Self::Sticker => "Sticker",
            Self::Drawing => "Drawing",
        }
    }
}

/// A layer with its common properties and payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layer {
    pub id: String,
    pub name: String,
    pub visible: bool,
    pub locked: bool,
    /// Percent, 0 to 100.
    pub opacity: u8,
    pub position: Point,
    pub z_index: i32,
    #[serde(flatten)]
    pub kind: LayerKind,
}

impl Layer {
    /// Create a visible, unlocked, fully opaque layer at the origin.
    ///
    /// `z_index` is assigned by the document store when the layer is added.
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: LayerKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            visible: true,
            locked: false,
            opacity: 100,
            position: Point::default(),
            z_index: 0,
            kind,
        }
    }

    pub fn image(id: impl Into<String>, src: impl Into<String>) -> Self {
        Self::new(
            id,
            "Image",
            LayerKind::Image(ImagePayload {
                src: src.into(),
                width: None,
                height: None,
                flip_x: false,
                flip_y: false,
                rotation: 0.0,
                crop: None,
                filters: ImageFilters::default(),
            }),
        )
    }

    pub fn text(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(
            id,
            "Text",
            LayerKind::Text(TextPayload {
                content: content.into(),
                font_size: 32.0,
                font_family: "Arial".to_string(),
                color: Color::BLACK,
                font_weight: FontWeight::Normal,
                font_style: FontStyle::Normal,
                text_align: TextAlign::Left,
                underline: false,
            }),
        )
    }

    pub fn shape(id: impl Into<String>, shape_type: ShapeType) -> Self {
        let (width, height, radius) = match shape_type {
            ShapeType::Circle => (None, None, Some(50.0)),
            ShapeType::Line | ShapeType::Arrow => (Some(150.0), None, None),
            ShapeType::Rectangle | ShapeType::Triangle => (Some(100.0), Some(100.0), None),
        };
        Self::new(
            id,
            shape_type.label(),
            LayerKind::Shape(ShapePayload {
                shape_type,
                fill: Color::rgb(0x3b, 0x82, 0xf6),
                stroke: Color::rgb(0x1e, 0x40, 0xaf),
                stroke_width: 2.0,
                width,
                height,
                radius,
            }),
        )
    }

    pub fn sticker(
        id: impl Into<String>,
        sticker_id: impl Into<String>,
        sticker_url: impl Into<String>,
        category: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        let name = name.into();
        Self::new(
            id,
            name.clone(),
            LayerKind::Sticker(StickerPayload {
                sticker_id: sticker_id.into(),
                sticker_url: sticker_url.into(),
                category: category.into(),
                name,
            }),
        )
    }

    pub fn drawing(id: impl Into<String>, brush_color: Color, brush_size: f64) -> Self {
        Self::new(
            id,
            "Drawing",
            LayerKind::Drawing(DrawingPayload {
                points: Vec::new(),
                brush_size,
                brush_color,
                brush_type: BrushType::Pen,
            }),
        )
    }

    pub fn with_position(mut self, x: f64, y: f64) -> Self {
        self.position = Point::new(x, y);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn layer_type(&self) -> LayerType {
        match self.kind {
            LayerKind::Image(_) => LayerType::Image,
            LayerKind::Text(_) => LayerType::Text,
            LayerKind::Shape(_) => LayerType::Shape,
            LayerKind::Sticker(_) => LayerType::Sticker,
            LayerKind::Drawing(_) => LayerType::Drawing,
        }
    }

    /// Bring numeric properties back into their documented ranges.
    pub fn clamp(&mut self) {
        self.opacity = self.opacity.min(100);
        match &mut self.kind {
            LayerKind::Image(image) => {
                clamp_opt(&mut image.width, 0.0, f64::MAX);
                clamp_opt(&mut image.height, 0.0, f64::MAX);
                image.filters.clamp();
            }
            LayerKind::Text(text) => {
                text.font_size = text.font_size.max(0.0);
            }
            LayerKind::Shape(shape) => {
                shape.stroke_width = shape.stroke_width.max(0.0);
                clamp_opt(&mut shape.width, 0.0, f64::MAX);
                clamp_opt(&mut shape.height, 0.0, f64::MAX);
                clamp_opt(&mut shape.radius, 0.0, f64::MAX);
            }
            LayerKind::Sticker(_) => {}
            LayerKind::Drawing(drawing) => {
                drawing.brush_size = drawing.brush_size.max(0.0);
            }
        }
    }

    /// Merge a partial update into this layer and clamp the result.
    ///
    /// Returns `false` when the update carried a payload for a different
    /// layer type; the common fields are applied regardless.
    pub fn apply_update(&mut self, update: LayerUpdate) -> bool {
        let LayerUpdate {
            name,
            visible,
            locked,
            opacity,
            position,
            z_index,
            payload,
        } = update;

        if let Some(name) = name {
            self.name = name;
        }
        if let Some(visible) = visible {
            self.visible = visible;
        }
        if let Some(locked) = locked {
            self.locked = locked;
        }
        if let Some(opacity) = opacity {
            self.opacity = opacity.clamp(0, 100) as u8;
        }
        if let Some(position) = position {
            self.position = position;
        }
        if let Some(z_index) = z_index {
            self.z_index = z_index;
        }

        let matched = match payload {
            None => true,
            Some(payload) => payload.merge_into(&mut self.kind),
        };
        self.clamp();
        matched
    }
}

fn clamp_opt(value: &mut Option<f64>, min: f64, max: f64) {
    if let Some(v) = value {
        *v = v.clamp(min, max);
    }
}

fn set<T>(target: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *target = value;
    }
}

/// Partial update of a layer. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayerUpdate {
    pub name: Option<String>,
    pub visible: Option<bool>,
    pub locked: Option<bool>,
    /// Out-of-range values are clamped to 0..=100.
    pub opacity: Option<i32>,
    pub position: Option<Point>,
    pub z_index: Option<i32>,
    pub payload: Option<PayloadUpdate>,
}

impl LayerUpdate {
    pub fn position(x: f64, y: f64) -> Self {
        Self {
            position: Some(Point::new(x, y)),
            ..Default::default()
        }
    }

    pub fn opacity(opacity: i32) -> Self {
        Self {
            opacity: Some(opacity),
            ..Default::default()
        }
    }

    pub fn payload(payload: PayloadUpdate) -> Self {
        Self {
            payload: Some(payload),
            ..Default::default()
        }
    }
}

/// Partial update of a layer payload; must match the layer's type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PayloadUpdate {
    Image(ImageUpdate),
    Text(TextUpdate),
    Shape(ShapeUpdate),
    Sticker(StickerUpdate),
    Drawing(DrawingUpdate),
}

impl PayloadUpdate {
    fn merge_into(self, kind: &mut LayerKind) -> bool {
        match (self, kind) {
            (PayloadUpdate::Image(u), LayerKind::Image(p)) => {
                set(&mut p.src, u.src);
                if u.width.is_some() {
                    p.width = u.width;
                }
                if u.height.is_some() {
                    p.height = u.height;
                }
                set(&mut p.flip_x, u.flip_x);
                set(&mut p.flip_y, u.flip_y);
                set(&mut p.rotation, u.rotation);
                set(&mut p.crop, u.crop);
                if let Some(filters) = u.filters {
                    filters.merge_into(&mut p.filters);
                }
                true
            }
            (PayloadUpdate::Text(u), LayerKind::Text(p)) => {
                set(&mut p.content, u.content);
                set(&mut p.font_size, u.font_size);
                set(&mut p.font_family, u.font_family);
                set(&mut p.color, u.color);
                set(&mut p.font_weight, u.font_weight);
                set(&mut p.font_style, u.font_style);
                set(&mut p.text_align, u.text_align);
                set(&mut p.underline, u.underline);
                true
            }
            (PayloadUpdate::Shape(u), LayerKind::Shape(p)) => {
                set(&mut p.shape_type, u.shape_type);
                set(&mut p.fill, u.fill);
                set(&mut p.stroke, u.stroke);
                set(&mut p.stroke_width, u.stroke_width);
                if u.width.is_some() {
                    p.width = u.width;
                }
                if u.height.is_some() {
                    p.height = u.height;
                }
                if u.radius.is_some() {
                    p.radius = u.radius;
                }
                true
            }
            (PayloadUpdate::Sticker(u), LayerKind::Sticker(p)) => {
                set(&mut p.sticker_id, u.sticker_id);
                set(&mut p.sticker_url, u.sticker_url);
                set(&mut p.category, u.category);
                set(&mut p.name, u.name);
                true
            }
            (PayloadUpdate::Drawing(u), LayerKind::Drawing(p)) => {
                set(&mut p.points, u.points);
                set(&mut p.brush_size, u.brush_size);
                set(&mut p.brush_color, u.brush_color);
                set(&mut p.brush_type, u.brush_type);
                true
            }
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageUpdate {
    pub src: Option<String>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub flip_x: Option<bool>,
    pub flip_y: Option<bool>,
    pub rotation: Option<f64>,
    /// `Some(None)` removes the crop.
    pub crop: Option<Option<Crop>>,
    pub filters: Option<FilterUpdate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterUpdate {
    pub brightness: Option<f64>,
    pub contrast: Option<f64>,
    pub saturation: Option<f64>,
    pub hue: Option<f64>,
    pub blur: Option<f64>,
    pub sharpen: Option<f64>,
    pub grayscale: Option<bool>,
    pub sepia: Option<bool>,
    pub invert: Option<bool>,
}

impl FilterUpdate {
    fn merge_into(self, filters: &mut ImageFilters) {
        let deltas = [
            (self.brightness, &mut filters.brightness),
            (self.contrast, &mut filters.contrast),
            (self.saturation, &mut filters.saturation),
            (self.hue, &mut filters.hue),
            (self.blur, &mut filters.blur),
            (self.sharpen, &mut filters.sharpen),
        ];
        for (value, target) in deltas {
            if value.is_some() {
                *target = value;
            }
        }
        set(&mut filters.grayscale, self.grayscale);
        set(&mut filters.sepia, self.sepia);
        set(&mut filters.invert, self.invert);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextUpdate {
    pub content: Option<String>,
    pub font_size: Option<f64>,
    pub font_family: Option<String>,
    pub color: Option<Color>,
    pub font_weight: Option<FontWeight>,
    pub font_style: Option<FontStyle>,
    pub text_align: Option<TextAlign>,
    pub underline: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShapeUpdate {
    pub shape_type: Option<ShapeType>,
    pub fill: Option<Color>,
    pub stroke: Option<Color>,
    pub stroke_width: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub radius: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StickerUpdate {
    pub sticker_id: Option<String>,
    pub sticker_url: Option<String>,
    pub category: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DrawingUpdate {
    pub points: Option<Vec<Point>>,
    pub brush_size: Option<f64>,
    pub brush_color: Option<Color>,
    pub brush_type: Option<BrushType>,
}

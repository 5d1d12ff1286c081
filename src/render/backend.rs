// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Rendering backend contract.
//!
//! The compositor never paints pixels itself. It translates layers into
//! [`Drawable`]s and submits them to a [`RenderBackend`], which owns the
//! drawing surface. Backends report interaction back as [`BackendEvent`]s.

use super::filters::EffectChain;
use crate::error::BackendError;
use crate::models::layer::{Crop, DrawingPayload, TextPayload};
use crate::models::{Color, Point};
use image::RgbaImage;

/// Largest raster side a backend is asked to allocate, for surfaces,
/// exports and baked images alike.
pub const MAX_DIMENSION: u32 = 16_384;

/// Handle to a drawable submitted to a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DrawableRef(pub u64);

/// Flip and rotation applied around the drawable's center.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Transform {
    pub flip_x: bool,
    pub flip_y: bool,
    /// Degrees, clockwise.
    pub rotation: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageDrawable {
    pub src: String,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub crop: Option<Crop>,
    pub effects: EffectChain,
    pub sharpen: Option<f64>,
}

/// Primitive geometry; `Line` and `Arrow` endpoints are absolute canvas
/// coordinates, the other shapes are sized from the drawable position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShapeGeometry {
    Rectangle { width: f64, height: f64 },
    Circle { radius: f64 },
    Line { from: Point, to: Point },
    Arrow { from: Point, to: Point },
    Triangle { width: f64, height: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShapeDrawable {
    pub geometry: ShapeGeometry,
    pub fill: Color,
    pub stroke: Color,
    pub stroke_width: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawableKind {
    Image(ImageDrawable),
    Text(TextPayload),
    Shape(ShapeDrawable),
    Path(DrawingPayload),
}

/// One element of the drawing program produced from a layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Drawable {
    pub layer_id: String,
    pub position: Point,
    /// 0.0 to 1.0.
    pub opacity: f32,
    pub transform: Transform,
    pub selectable: bool,
    pub kind: DrawableKind,
}

impl Drawable {
    /// Backend filter string for image drawables; empty otherwise.
    pub fn filter_string(&self) -> String {
        match &self.kind {
            DrawableKind::Image(image) => image.effects.to_filter_string(),
            _ => String::new(),
        }
    }
}

/// Interaction reported by a backend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BackendEvent {
    Picked(DrawableRef),
    Cleared,
    Transformed { drawable: DrawableRef, position: Point },
}

pub trait RenderBackend {
    fn create_surface(&mut self, width: u32, height: u32, background: Color);

    /// Release the surface and everything drawn on it.
    fn dispose_surface(&mut self);

    fn surface_size(&self) -> Option<(u32, u32)>;

    fn has_surface(&self) -> bool {
        self.surface_size().is_some()
    }

    fn add_drawable(&mut self, drawable: Drawable) -> Result<DrawableRef, BackendError>;

    fn remove_drawable(&mut self, drawable: DrawableRef);

    fn set_zoom(&mut self, factor: f64);

    /// Render the surface into an RGBA raster of exactly `width` x `height`.
    fn rasterize(&self, width: u32, height: u32) -> Result<RgbaImage, BackendError>;
}

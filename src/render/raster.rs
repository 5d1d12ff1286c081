// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! CPU raster backend built on `tiny-skia`.
//!
//! Image drawables are decoded and baked (crop, size, effect chain, sharpen,
//! flips, quarter turns) when they are added. Shapes, paths and text are
//! drawn as vector content when the surface is rasterized, so scaled
//! exports stay sharp.

use super::backend::{
    BackendEvent, Drawable, DrawableKind, DrawableRef, ImageDrawable, RenderBackend,
    ShapeDrawable, ShapeGeometry, Transform, MAX_DIMENSION,
};
use super::filters::Effect;
use super::text::{TextEngine, TextExtent};
use crate::error::BackendError;
use crate::io::media;
use crate::models::layer::{BrushType, DrawingPayload, TextPayload};
use crate::models::{Color, Point};
use crate::util::geometry::{self, Rect};
use image::imageops::{self, FilterType};
use image::RgbaImage;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use tiny_skia::{
    Color as SkColor, ColorU8, FillRule, FilterQuality, LineCap, LineJoin, Paint, Path,
    PathBuilder, Pixmap, PixmapPaint, Rect as SkRect, Stroke, Transform as SkTransform,
};

/// Minimum arrow head length in canvas pixels.
const ARROW_HEAD_MIN: f64 = 10.0;
/// Pick tolerance around thin strokes, in canvas pixels.
const HIT_SLOP: f64 = 3.0;

enum Content {
    /// Baked pixels with the canvas position of their top-left corner and
    /// any rotation left over after quarter turns.
    Bitmap {
        pixmap: Pixmap,
        origin: Point,
        rotation: f64,
    },
    Shape(ShapeDrawable),
    Path(DrawingPayload),
    Text {
        text: TextPayload,
        extent: TextExtent,
    },
}

struct Entry {
    handle: DrawableRef,
    position: Point,
    opacity: f32,
    selectable: bool,
    content: Content,
}

struct Surface {
    width: u32,
    height: u32,
    background: Color,
    entries: Vec<Entry>,
}

/// Software rendering backend.
pub struct RasterBackend {
    surface: Option<Surface>,
    zoom: f64,
    next_handle: u64,
    /// Decoded sources by reference. Failed decodes are not cached so they
    /// are retried on the next composite.
    sources: HashMap<String, RgbaImage>,
    /// Created on the first text drawable.
    text: Mutex<Option<TextEngine>>,
}

impl Default for RasterBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl RasterBackend {
    pub fn new() -> Self {
        Self {
            surface: None,
            zoom: 1.0,
            next_handle: 1,
            sources: HashMap::new(),
            text: Mutex::new(None),
        }
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn drawable_count(&self) -> usize {
        self.surface.as_ref().map_or(0, |s| s.entries.len())
    }

    /// Topmost selectable drawable under a canvas point.
    pub fn hit_test(&self, point: Point) -> Option<DrawableRef> {
        let surface = self.surface.as_ref()?;
        surface
            .entries
            .iter()
            .rev()
            .filter(|e| e.selectable)
            .find(|e| hits(e, point))
            .map(|e| e.handle)
    }

    /// Selection event for a click at a canvas point.
    pub fn pick(&self, point: Point) -> BackendEvent {
        match self.hit_test(point) {
            Some(handle) => BackendEvent::Picked(handle),
            None => BackendEvent::Cleared,
        }
    }

    /// Canvas-space bounds of a drawable.
    pub fn bounds(&self, handle: DrawableRef) -> Option<Rect> {
        let surface = self.surface.as_ref()?;
        surface
            .entries
            .iter()
            .find(|e| e.handle == handle)
            .and_then(entry_bounds)
    }

    fn source(&mut self, src: &str) -> Result<&RgbaImage, BackendError> {
        if !self.sources.contains_key(src) {
            let decoded = media::decode_source(src).map_err(|e| BackendError::SourceUnavailable {
                src: abbreviate(src),
                reason: format!("{e:#}"),
            })?;
            self.sources.insert(src.to_string(), decoded.to_rgba8());
        }
        self.sources
            .get(src)
            .ok_or_else(|| BackendError::SourceUnavailable {
                src: abbreviate(src),
                reason: "not cached".into(),
            })
    }

    fn bake_image(
        &mut self,
        position: Point,
        transform: Transform,
        image: &ImageDrawable,
    ) -> Result<Content, BackendError> {
        let mut pixels = self.source(&image.src)?.clone();

        if let Some(crop) = image.crop {
            let x = crop.x.max(0.0) as u32;
            let y = crop.y.max(0.0) as u32;
            let w = (crop.width.max(1.0) as u32).min(pixels.width().saturating_sub(x).max(1));
            let h = (crop.height.max(1.0) as u32).min(pixels.height().saturating_sub(y).max(1));
            pixels = imageops::crop_imm(&pixels, x, y, w, h).to_image();
        }

        let (src_w, src_h) = (pixels.width() as f64, pixels.height() as f64);
        let (target_w, target_h) = match (image.width, image.height) {
            (Some(w), Some(h)) => (w, h),
            (Some(w), None) => (w, w * src_h / src_w),
            (None, Some(h)) => (h * src_w / src_h, h),
            (None, None) => (src_w, src_h),
        };
        let (target_w, target_h) = (target_w.round().max(1.0), target_h.round().max(1.0));
        if target_w > MAX_DIMENSION as f64 || target_h > MAX_DIMENSION as f64 {
            return Err(BackendError::TooLarge {
                width: target_w as u32,
                height: target_h as u32,
            });
        }
        let (target_w, target_h) = (target_w as u32, target_h as u32);
        if (target_w, target_h) != pixels.dimensions() {
            pixels = imageops::resize(&pixels, target_w, target_h, FilterType::Triangle);
        }

        for effect in image.effects.effects() {
            pixels = apply_effect(pixels, *effect);
        }
        if let Some(amount) = image.sharpen.filter(|a| *a > 0.0) {
            pixels = imageops::unsharpen(&pixels, (amount / 20.0) as f32 + 0.5, 1);
        }

        if transform.flip_x {
            imageops::flip_horizontal_in_place(&mut pixels);
        }
        if transform.flip_y {
            imageops::flip_vertical_in_place(&mut pixels);
        }

        let (baked_w, baked_h) = (pixels.width() as f64, pixels.height() as f64);
        let (pixels, rotation) = quarter_turns(pixels, transform.rotation);
        let origin = Point::new(
            position.x - (pixels.width() as f64 - baked_w) / 2.0,
            position.y - (pixels.height() as f64 - baked_h) / 2.0,
        );
        Ok(Content::Bitmap {
            pixmap: to_pixmap(&pixels)?,
            origin,
            rotation,
        })
    }

    fn measure_text(&mut self, text: &TextPayload) -> TextExtent {
        let engine = self.text.get_mut().unwrap_or_else(PoisonError::into_inner);
        engine.get_or_insert_with(TextEngine::new).measure(text)
    }
}

impl RenderBackend for RasterBackend {
    fn create_surface(&mut self, width: u32, height: u32, background: Color) {
        log::debug!("Creating {}x{} raster surface", width, height);
        self.surface = Some(Surface {
            width: width.max(1),
            height: height.max(1),
            background,
            entries: Vec::new(),
        });
    }

    fn dispose_surface(&mut self) {
        if self.surface.take().is_some() {
            log::debug!("Disposed raster surface");
        }
        self.sources.clear();
    }

    fn surface_size(&self) -> Option<(u32, u32)> {
        self.surface.as_ref().map(|s| (s.width, s.height))
    }

    fn add_drawable(&mut self, drawable: Drawable) -> Result<DrawableRef, BackendError> {
        if self.surface.is_none() {
            return Err(BackendError::NoSurface);
        }

        let Drawable {
            position,
            opacity,
            transform,
            selectable,
            kind,
            ..
        } = drawable;
        let content = match kind {
            DrawableKind::Image(image) => self.bake_image(position, transform, &image)?,
            DrawableKind::Shape(shape) => Content::Shape(shape),
            DrawableKind::Path(path) => Content::Path(path),
            DrawableKind::Text(text) => {
                let extent = self.measure_text(&text);
                Content::Text { text, extent }
            }
        };

        let handle = DrawableRef(self.next_handle);
        self.next_handle += 1;
        let surface = self.surface.as_mut().ok_or(BackendError::NoSurface)?;
        surface.entries.push(Entry {
            handle,
            position,
            opacity: opacity.clamp(0.0, 1.0),
            selectable,
            content,
        });
        Ok(handle)
    }

    fn remove_drawable(&mut self, drawable: DrawableRef) {
        if let Some(surface) = self.surface.as_mut() {
            surface.entries.retain(|e| e.handle != drawable);
        }
    }

    fn set_zoom(&mut self, factor: f64) {
        if factor.is_finite() && factor > 0.0 {
            self.zoom = factor;
        }
    }

    fn rasterize(&self, width: u32, height: u32) -> Result<RgbaImage, BackendError> {
        let surface = self.surface.as_ref().ok_or(BackendError::NoSurface)?;
        let (width, height) = (width.max(1), height.max(1));
        if width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(BackendError::TooLarge { width, height });
        }
        let sx = width as f32 / surface.width as f32;
        let sy = height as f32 / surface.height as f32;
        let scale = SkTransform::from_scale(sx, sy);

        let mut target = Pixmap::new(width, height).ok_or(BackendError::TooLarge { width, height })?;
        target.fill(sk_color(surface.background, 1.0));
        for entry in &surface.entries {
            match &entry.content {
                Content::Bitmap {
                    pixmap,
                    origin,
                    rotation,
                } => draw_bitmap(&mut target, pixmap, *origin, *rotation, entry.opacity, scale),
                Content::Shape(shape) => draw_shape(&mut target, shape, entry, scale),
                Content::Path(path) => {
                    draw_path(&mut target, path, surface.background, entry.opacity, scale)
                }
                Content::Text { text, .. } => {
                    let mut engine = self.text.lock().unwrap_or_else(PoisonError::into_inner);
                    engine.get_or_insert_with(TextEngine::new).draw(
                        &mut target,
                        text,
                        entry.position,
                        entry.opacity,
                        sx,
                        sy,
                    );
                }
            }
        }
        to_rgba(&target)
    }
}

fn abbreviate(src: &str) -> String {
    if src.len() > 64 && src.is_char_boundary(64) {
        format!("{}...", &src[..64])
    } else {
        src.to_string()
    }
}

fn entry_bounds(entry: &Entry) -> Option<Rect> {
    match &entry.content {
        Content::Bitmap {
            pixmap,
            origin,
            rotation,
        } => {
            let (w, h) = (pixmap.width() as f64, pixmap.height() as f64);
            let (sin, cos) = rotation.to_radians().sin_cos();
            let (rw, rh) = (w * cos.abs() + h * sin.abs(), w * sin.abs() + h * cos.abs());
            Some(Rect::new(
                origin.x + (w - rw) / 2.0,
                origin.y + (h - rh) / 2.0,
                rw,
                rh,
            ))
        }
        Content::Shape(shape) => Some(shape_bounds(shape, entry.position)),
        Content::Path(path) => Rect::bounding(&path.points, path.brush_size / 2.0),
        Content::Text { extent, .. } => Some(Rect::new(
            entry.position.x,
            entry.position.y,
            extent.width,
            extent.height,
        )),
    }
}

/// Whether a click at `point` lands on the drawable. Thin strokes are
/// tested against their segments, everything else against its bounds.
fn hits(entry: &Entry, point: Point) -> bool {
    match &entry.content {
        Content::Path(path) => {
            let reach = path.brush_size / 2.0 + HIT_SLOP;
            match path.points.as_slice() {
                [] => false,
                [only] => geometry::distance_to_segment(point, *only, *only) <= reach,
                points => points
                    .windows(2)
                    .any(|w| geometry::distance_to_segment(point, w[0], w[1]) <= reach),
            }
        }
        Content::Shape(shape) => match shape.geometry {
            ShapeGeometry::Line { from, to } => {
                geometry::distance_to_segment(point, from, to) <= shape.stroke_width / 2.0 + HIT_SLOP
            }
            ShapeGeometry::Triangle { width, height } => {
                let (a, b, c) = triangle(entry.position, width, height);
                geometry::point_in_triangle(point, a, b, c)
            }
            _ => shape_bounds(shape, entry.position).contains(point),
        },
        _ => entry_bounds(entry).is_some_and(|b| b.contains(point)),
    }
}

fn to_u8(v: f64) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

fn map_rgb(mut pixels: RgbaImage, f: impl Fn(f64, f64, f64) -> (f64, f64, f64)) -> RgbaImage {
    for px in pixels.pixels_mut() {
        let (r, g, b) = f(px[0] as f64, px[1] as f64, px[2] as f64);
        px[0] = to_u8(r);
        px[1] = to_u8(g);
        px[2] = to_u8(b);
    }
    pixels
}

fn saturate(s: f64) -> impl Fn(f64, f64, f64) -> (f64, f64, f64) {
    move |r, g, b| {
        (
            (0.213 + 0.787 * s) * r + (0.715 - 0.715 * s) * g + (0.072 - 0.072 * s) * b,
            (0.213 - 0.213 * s) * r + (0.715 + 0.285 * s) * g + (0.072 - 0.072 * s) * b,
            (0.213 - 0.213 * s) * r + (0.715 - 0.715 * s) * g + (0.072 + 0.928 * s) * b,
        )
    }
}

fn apply_effect(pixels: RgbaImage, effect: Effect) -> RgbaImage {
    match effect {
        Effect::Brightness(f) => map_rgb(pixels, |r, g, b| (r * f, g * f, b * f)),
        Effect::Contrast(f) => {
            let c = move |v: f64| (v - 128.0) * f + 128.0;
            map_rgb(pixels, |r, g, b| (c(r), c(g), c(b)))
        }
        Effect::Saturate(s) => map_rgb(pixels, saturate(s)),
        Effect::HueRotate(degrees) => imageops::huerotate(&pixels, degrees.round() as i32),
        Effect::Blur(radius) if radius > 0.0 => imageops::blur(&pixels, radius as f32),
        Effect::Blur(_) => pixels,
        Effect::Grayscale => map_rgb(pixels, saturate(0.0)),
        Effect::Sepia => map_rgb(pixels, |r, g, b| {
            (
                0.393 * r + 0.769 * g + 0.189 * b,
                0.349 * r + 0.686 * g + 0.168 * b,
                0.272 * r + 0.534 * g + 0.131 * b,
            )
        }),
        Effect::Invert => map_rgb(pixels, |r, g, b| (255.0 - r, 255.0 - g, 255.0 - b)),
    }
}

/// Apply whole quarter turns exactly; the remaining clockwise angle is
/// drawn through the rasterizer's transform.
fn quarter_turns(pixels: RgbaImage, degrees: f64) -> (RgbaImage, f64) {
    let degrees = degrees.rem_euclid(360.0);
    if degrees == 90.0 {
        (imageops::rotate90(&pixels), 0.0)
    } else if degrees == 180.0 {
        (imageops::rotate180(&pixels), 0.0)
    } else if degrees == 270.0 {
        (imageops::rotate270(&pixels), 0.0)
    } else {
        (pixels, degrees)
    }
}

fn to_pixmap(image: &RgbaImage) -> Result<Pixmap, BackendError> {
    let (width, height) = image.dimensions();
    let mut pixmap = Pixmap::new(width, height).ok_or(BackendError::TooLarge { width, height })?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(image.pixels()) {
        let [r, g, b, a] = src.0;
        *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
    }
    Ok(pixmap)
}

fn to_rgba(pixmap: &Pixmap) -> Result<RgbaImage, BackendError> {
    let (width, height) = (pixmap.width(), pixmap.height());
    let mut raw = Vec::with_capacity(width as usize * height as usize * 4);
    for px in pixmap.pixels() {
        let c = px.demultiply();
        raw.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    RgbaImage::from_raw(width, height, raw).ok_or(BackendError::TooLarge { width, height })
}

fn sk_color(color: Color, opacity: f32) -> SkColor {
    let mut c = SkColor::from_rgba8(color.r, color.g, color.b, color.a);
    c.apply_opacity(opacity);
    c
}

fn paint(color: Color, opacity: f32) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(sk_color(color, opacity));
    paint.anti_alias = true;
    paint
}

fn draw_bitmap(
    target: &mut Pixmap,
    pixmap: &Pixmap,
    origin: Point,
    rotation: f64,
    opacity: f32,
    scale: SkTransform,
) {
    let (w, h) = (pixmap.width() as f32, pixmap.height() as f32);
    let transform = scale
        .pre_translate(origin.x as f32, origin.y as f32)
        .pre_concat(SkTransform::from_rotate_at(rotation as f32, w / 2.0, h / 2.0));
    let paint = PixmapPaint {
        opacity,
        quality: FilterQuality::Bilinear,
        ..PixmapPaint::default()
    };
    target.draw_pixmap(0, 0, pixmap.as_ref(), &paint, transform, None);
}

fn triangle(position: Point, width: f64, height: f64) -> (Point, Point, Point) {
    (
        Point::new(position.x + width / 2.0, position.y),
        Point::new(position.x + width, position.y + height),
        Point::new(position.x, position.y + height),
    )
}

fn arrow_head(from: Point, to: Point, stroke_width: f64) -> Option<(Point, Point, Point)> {
    let (dx, dy) = (to.x - from.x, to.y - from.y);
    let len = (dx * dx + dy * dy).sqrt();
    if len == 0.0 {
        return None;
    }
    let head = (stroke_width * 4.0).max(ARROW_HEAD_MIN);
    let (ux, uy) = (dx / len, dy / len);
    let base = Point::new(to.x - ux * head, to.y - uy * head);
    let (px, py) = (-uy * head / 2.0, ux * head / 2.0);
    Some((
        to,
        Point::new(base.x + px, base.y + py),
        Point::new(base.x - px, base.y - py),
    ))
}

fn shape_bounds(shape: &ShapeDrawable, position: Point) -> Rect {
    let half = shape.stroke_width / 2.0;
    match shape.geometry {
        ShapeGeometry::Rectangle { width, height } | ShapeGeometry::Triangle { width, height } => {
            Rect::new(position.x - half, position.y - half, width + 2.0 * half, height + 2.0 * half)
        }
        ShapeGeometry::Circle { radius } => Rect::new(
            position.x - half,
            position.y - half,
            2.0 * radius + 2.0 * half,
            2.0 * radius + 2.0 * half,
        ),
        ShapeGeometry::Line { from, to } => Rect::bounding(&[from, to], half.max(0.5))
            .unwrap_or(Rect::new(from.x, from.y, 0.0, 0.0)),
        ShapeGeometry::Arrow { from, to } => {
            let margin = (shape.stroke_width * 4.0).max(ARROW_HEAD_MIN);
            Rect::bounding(&[from, to], margin).unwrap_or(Rect::new(from.x, from.y, 0.0, 0.0))
        }
    }
}

fn polyline(points: &[Point], close: bool) -> Option<Path> {
    let (first, rest) = points.split_first()?;
    let mut builder = PathBuilder::new();
    builder.move_to(first.x as f32, first.y as f32);
    for p in rest {
        builder.line_to(p.x as f32, p.y as f32);
    }
    if close {
        builder.close();
    }
    builder.finish()
}

fn stroke(width: f64, round: bool) -> Stroke {
    let mut stroke = Stroke {
        width: width as f32,
        ..Stroke::default()
    };
    if round {
        stroke.line_cap = LineCap::Round;
        stroke.line_join = LineJoin::Round;
    }
    stroke
}

fn draw_shape(target: &mut Pixmap, shape: &ShapeDrawable, entry: &Entry, scale: SkTransform) {
    let position = entry.position;
    let fill = paint(shape.fill, entry.opacity);
    let outline = paint(shape.stroke, entry.opacity);
    let stroked = shape.stroke_width > 0.0;

    let body = match shape.geometry {
        ShapeGeometry::Rectangle { width, height } => SkRect::from_xywh(
            position.x as f32,
            position.y as f32,
            width as f32,
            height as f32,
        )
        .map(PathBuilder::from_rect),
        ShapeGeometry::Circle { radius } => PathBuilder::from_circle(
            (position.x + radius) as f32,
            (position.y + radius) as f32,
            radius as f32,
        ),
        ShapeGeometry::Triangle { width, height } => {
            let (a, b, c) = triangle(position, width, height);
            polyline(&[a, b, c], true)
        }
        ShapeGeometry::Line { from, to } => {
            if let Some(line) = polyline(&[from, to], false) {
                let width = shape.stroke_width.max(1.0);
                target.stroke_path(&line, &outline, &stroke(width, false), scale, None);
            }
            return;
        }
        ShapeGeometry::Arrow { from, to } => {
            if let Some(shaft) = polyline(&[from, to], false) {
                let width = shape.stroke_width.max(1.0);
                target.stroke_path(&shaft, &outline, &stroke(width, false), scale, None);
            }
            if let Some(head) = arrow_head(from, to, shape.stroke_width)
                .and_then(|(a, b, c)| polyline(&[a, b, c], true))
            {
                target.fill_path(&head, &outline, FillRule::Winding, scale, None);
            }
            return;
        }
    };

    let Some(body) = body else {
        return;
    };
    target.fill_path(&body, &fill, FillRule::Winding, scale, None);
    if stroked {
        target.stroke_path(&body, &outline, &stroke(shape.stroke_width, false), scale, None);
    }
}

fn draw_path(
    target: &mut Pixmap,
    path: &DrawingPayload,
    background: Color,
    opacity: f32,
    scale: SkTransform,
) {
    let color = match path.brush_type {
        BrushType::Eraser => background,
        BrushType::Pen | BrushType::Brush => path.brush_color,
    };
    let brush = paint(color, opacity);
    let width = path.brush_size.max(1.0);

    match path.points.as_slice() {
        [] => {}
        [dot] => {
            if let Some(circle) =
                PathBuilder::from_circle(dot.x as f32, dot.y as f32, (width / 2.0) as f32)
            {
                target.fill_path(&circle, &brush, FillRule::Winding, scale, None);
            }
        }
        points => {
            if let Some(line) = polyline(points, false) {
                target.stroke_path(&line, &brush, &stroke(width, true), scale, None);
            }
        }
    }
}

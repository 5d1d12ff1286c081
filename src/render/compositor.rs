// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Compositor: turns a project into backend drawing calls.
//!
//! Every rebuild is a full re-composite. Visible layers are stably sorted by
//! `z_index` and submitted bottom to top. A drawable the backend cannot
//! realize (for example an image whose source fails to decode) is skipped
//! for that pass only.

use super::backend::{
    BackendEvent, Drawable, DrawableKind, DrawableRef, ImageDrawable, RenderBackend,
    ShapeDrawable, ShapeGeometry, Transform,
};
use super::filters::EffectChain;
use crate::models::layer::{DrawingPayload, ShapePayload, ShapeType};
use crate::models::{Canvas, Layer, LayerKind, Point, Project};

const DEFAULT_SHAPE_SIZE: f64 = 100.0;
const DEFAULT_RADIUS: f64 = 50.0;

/// Interaction reported to the host after translating backend events.
#[derive(Debug, Clone, PartialEq)]
pub enum CompositorEvent {
    SelectionChanged(Option<String>),
    DrawableTransformed { layer_id: String, position: Point },
}

/// Outcome of one rebuild pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RebuildStats {
    pub submitted: usize,
    pub skipped: usize,
}

pub struct Compositor<B: RenderBackend> {
    backend: B,
    /// Canvas the current surface was created for.
    surface: Option<Canvas>,
    /// Submitted drawables in submission order with their layer ids.
    submitted: Vec<(DrawableRef, String)>,
    selected: Option<String>,
}

impl<B: RenderBackend> Compositor<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            surface: None,
            submitted: Vec::new(),
            selected: None,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn select(&mut self, layer_id: Option<String>) {
        self.selected = layer_id;
    }

    /// Drawable currently representing a layer.
    pub fn drawable_for(&self, layer_id: &str) -> Option<DrawableRef> {
        self.submitted
            .iter()
            .find(|(_, id)| id == layer_id)
            .map(|(handle, _)| *handle)
    }

    pub fn layer_for(&self, drawable: DrawableRef) -> Option<&str> {
        self.submitted
            .iter()
            .find(|(handle, _)| *handle == drawable)
            .map(|(_, id)| id.as_str())
    }

    /// The drawing program for a project, bottom to top.
    pub fn plan(project: &Project) -> Vec<Drawable> {
        project
            .layers_in_display_order()
            .into_iter()
            .filter(|l| l.visible)
            .map(layer_drawable)
            .collect()
    }

    /// Re-composite the whole project onto the backend.
    pub fn rebuild(&mut self, project: &Project) -> RebuildStats {
        if self.surface != Some(project.canvas) || !self.backend.has_surface() {
            self.reset_surface(project.canvas);
        } else {
            for (handle, _) in self.submitted.drain(..) {
                self.backend.remove_drawable(handle);
            }
        }

        let mut stats = RebuildStats::default();
        for drawable in Self::plan(project) {
            let layer_id = drawable.layer_id.clone();
            match self.backend.add_drawable(drawable) {
                Ok(handle) => {
                    self.submitted.push((handle, layer_id));
                    stats.submitted += 1;
                }
                Err(e) => {
                    log::warn!("Skipped layer '{}' this pass: {}", layer_id, e);
                    stats.skipped += 1;
                }
            }
        }

        if self
            .selected
            .as_deref()
            .is_some_and(|id| !project.contains_layer(id))
        {
            self.selected = None;
        }

        log::debug!(
            "Composited {} drawables ({} skipped)",
            stats.submitted,
            stats.skipped
        );
        stats
    }

    fn reset_surface(&mut self, canvas: Canvas) {
        if self.backend.has_surface() {
            self.backend.dispose_surface();
        }
        self.submitted.clear();
        self.backend
            .create_surface(canvas.width, canvas.height, canvas.background_color);
        self.surface = Some(canvas);
    }

    /// Tear down the backend surface.
    pub fn dispose(&mut self) {
        self.backend.dispose_surface();
        self.submitted.clear();
        self.surface = None;
        self.selected = None;
    }

    pub fn set_zoom(&mut self, factor: f64) {
        self.backend.set_zoom(factor);
    }

    /// Translate a backend event into layer terms.
    pub fn on_backend_event(&mut self, event: BackendEvent) -> Option<CompositorEvent> {
        match event {
            BackendEvent::Picked(handle) => {
                let layer_id = self.layer_for(handle)?.to_string();
                self.selected = Some(layer_id.clone());
                Some(CompositorEvent::SelectionChanged(Some(layer_id)))
            }
            BackendEvent::Cleared => {
                self.selected = None;
                Some(CompositorEvent::SelectionChanged(None))
            }
            BackendEvent::Transformed { drawable, position } => {
                let layer_id = self.layer_for(drawable)?.to_string();
                Some(CompositorEvent::DrawableTransformed { layer_id, position })
            }
        }
    }
}

impl<B: RenderBackend> Drop for Compositor<B> {
    fn drop(&mut self) {
        if self.backend.has_surface() {
            self.backend.dispose_surface();
        }
    }
}

fn layer_drawable(layer: &Layer) -> Drawable {
    let mut transform = Transform::default();
    let kind = match &layer.kind {
        LayerKind::Image(image) => {
            transform = Transform {
                flip_x: image.flip_x,
                flip_y: image.flip_y,
                rotation: image.rotation,
            };
            DrawableKind::Image(ImageDrawable {
                src: image.src.clone(),
                width: image.width,
                height: image.height,
                crop: image.crop,
                effects: EffectChain::from_filters(&image.filters),
                sharpen: image.filters.sharpen,
            })
        }
        LayerKind::Sticker(sticker) => DrawableKind::Image(ImageDrawable {
            src: sticker.sticker_url.clone(),
            width: None,
            height: None,
            crop: None,
            effects: EffectChain::default(),
            sharpen: None,
        }),
        LayerKind::Text(text) => DrawableKind::Text(text.clone()),
        LayerKind::Shape(shape) => DrawableKind::Shape(ShapeDrawable {
            geometry: shape_geometry(shape, layer.position),
            fill: shape.fill,
            stroke: shape.stroke,
            stroke_width: shape.stroke_width,
        }),
        LayerKind::Drawing(drawing) => DrawableKind::Path(DrawingPayload {
            points: drawing
                .points
                .iter()
                .map(|p| Point::new(p.x + layer.position.x, p.y + layer.position.y))
                .collect(),
            ..drawing.clone()
        }),
    };

    Drawable {
        layer_id: layer.id.clone(),
        position: layer.position,
        opacity: layer.opacity.min(100) as f32 / 100.0,
        transform,
        selectable: !layer.locked,
        kind,
    }
}

/// Lines and arrows are horizontal segments from the layer position,
/// whatever height is stored.
fn shape_geometry(shape: &ShapePayload, position: Point) -> ShapeGeometry {
    let width = shape.width.unwrap_or(DEFAULT_SHAPE_SIZE);
    let height = shape.height.unwrap_or(DEFAULT_SHAPE_SIZE);
    let end = Point::new(position.x + width, position.y);
    match shape.shape_type {
        ShapeType::Rectangle => ShapeGeometry::Rectangle { width, height },
        ShapeType::Circle => ShapeGeometry::Circle {
            radius: shape.radius.unwrap_or(DEFAULT_RADIUS),
        },
        ShapeType::Line => ShapeGeometry::Line { from: position, to: end },
        ShapeType::Arrow => ShapeGeometry::Arrow { from: position, to: end },
        ShapeType::Triangle => ShapeGeometry::Triangle { width, height },
    }
}

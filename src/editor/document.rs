// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Document store.
//!
//! Owns the live [`Project`] and is the only place it is mutated. Every
//! effective mutation refreshes `updated_at`; operations on ids that are not
//! present are silent no-ops so repeated user actions never fail.

use crate::error::{EditorError, Result};
use crate::models::{Color, Layer, LayerUpdate, Point, Project};
use crate::render::MAX_DIMENSION;

/// Direction for [`DocumentStore::reorder_layer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reorder {
    Forward,
    Backward,
    ToFront,
    ToBack,
}

/// Offset applied to duplicated layers so the copy is visible.
const DUPLICATE_OFFSET: f64 = 20.0;

#[derive(Debug, Clone)]
pub struct DocumentStore {
    project: Project,
    /// Bumped on every effective mutation.
    revision: u64,
}

impl DocumentStore {
    pub fn new(project: Project) -> Self {
        Self {
            project,
            revision: 0,
        }
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn mark_changed(&mut self) {
        self.project.touch();
        self.revision += 1;
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn layer(&self, id: &str) -> Option<&Layer> {
        self.project.layer(id)
    }

    /// Replace the live project, e.g. with a history snapshot.
    pub fn replace_project(&mut self, project: Project) -> &Project {
        self.project = project;
        self.revision += 1;
        &self.project
    }

    /// Append a layer on top of the stack.
    pub fn add_layer(&mut self, mut layer: Layer) -> Result<&Project> {
        if self.project.contains_layer(&layer.id) {
            return Err(EditorError::DuplicateLayerId(layer.id));
        }

        layer.clamp();
        layer.z_index = self.project.layers.len() as i32;
        log::info!(
            "Added {} layer '{}' at z {}",
            layer.layer_type().label(),
            layer.id,
            layer.z_index
        );
        self.project.layers.push(layer);
        self.mark_changed();
        Ok(&self.project)
    }

    pub fn delete_layer(&mut self, id: &str) -> &Project {
        let before = self.project.layers.len();
        self.project.layers.retain(|l| l.id != id);
        if self.project.layers.len() != before {
            self.mark_changed();
            log::info!("Deleted layer '{}', total: {}", id, self.project.layers.len());
        }
        &self.project
    }

    pub fn update_layer(&mut self, id: &str, update: LayerUpdate) -> &Project {
        if let Some(layer) = self.project.layer_mut(id) {
            if !layer.apply_update(update) {
                log::warn!(
                    "Ignored payload update for {} layer '{}': type mismatch",
                    layer.layer_type().label(),
                    id
                );
            }
            self.mark_changed();
        }
        &self.project
    }

    pub fn toggle_visibility(&mut self, id: &str) -> &Project {
        match self.layer(id).map(|l| !l.visible) {
            Some(visible) => self.update_layer(
                id,
                LayerUpdate {
                    visible: Some(visible),
                    ..Default::default()
                },
            ),
            None => &self.project,
        }
    }

    pub fn toggle_lock(&mut self, id: &str) -> &Project {
        match self.layer(id).map(|l| !l.locked) {
            Some(locked) => self.update_layer(
                id,
                LayerUpdate {
                    locked: Some(locked),
                    ..Default::default()
                },
            ),
            None => &self.project,
        }
    }

    /// Change the canvas size. Layer positions are left as they are.
    pub fn resize_canvas(&mut self, width: u32, height: u32) -> Result<&Project> {
        if width == 0 || height == 0 || width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(EditorError::InvalidCanvasSize { width, height });
        }
        self.project.canvas.width = width;
        self.project.canvas.height = height;
        self.mark_changed();
        Ok(&self.project)
    }

    pub fn set_background(&mut self, color: Color) -> &Project {
        self.project.canvas.background_color = color;
        self.mark_changed();
        &self.project
    }

    /// Move a layer in display order and renumber every `z_index` to
    /// `0..n` following the new order.
    pub fn reorder_layer(&mut self, id: &str, direction: Reorder) -> &Project {
        let mut order: Vec<String> = self
            .project
            .layers_in_display_order()
            .iter()
            .map(|l| l.id.clone())
            .collect();
        let Some(from) = order.iter().position(|l| l == id) else {
            return &self.project;
        };
        let last = order.len() - 1;
        let to = match direction {
            Reorder::Forward => (from + 1).min(last),
            Reorder::Backward => from.saturating_sub(1),
            Reorder::ToFront => last,
            Reorder::ToBack => 0,
        };

        let unchanged = order
            .iter()
            .enumerate()
            .all(|(z, layer_id)| self.layer(layer_id).is_some_and(|l| l.z_index == z as i32));
        if from == to && unchanged {
            return &self.project;
        }

        let moved = order.remove(from);
        order.insert(to, moved);
        for (z, layer_id) in order.iter().enumerate() {
            if let Some(layer) = self.project.layer_mut(layer_id) {
                layer.z_index = z as i32;
            }
        }
        self.mark_changed();
        log::info!("Moved layer '{}' from position {} to {}", id, from, to);
        &self.project
    }

    /// Copy a layer under a new id, offset and placed on top.
    pub fn duplicate_layer(&mut self, id: &str, new_id: impl Into<String>) -> Result<&Project> {
        let Some(source) = self.layer(id) else {
            return Ok(&self.project);
        };
        let mut copy = source.clone();
        copy.id = new_id.into();
        copy.name = format!("{} copy", source.name);
        copy.position = Point::new(
            source.position.x + DUPLICATE_OFFSET,
            source.position.y + DUPLICATE_OFFSET,
        );
        self.add_layer(copy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::layer::ShapeType;
    use crate::models::Canvas;

    fn store() -> DocumentStore {
        DocumentStore::new(Project::new("test", Canvas::default()))
    }

    fn z_of(store: &DocumentStore, id: &str) -> i32 {
        store.layer(id).unwrap().z_index
    }

    #[test]
    fn test_add_assigns_z_index_from_count() {
        let mut store = store();
        store.add_layer(Layer::image("a", "a.png")).unwrap();
        store.add_layer(Layer::text("b", "Hello")).unwrap();
        assert_eq!(z_of(&store, "a"), 0);
        assert_eq!(z_of(&store, "b"), 1);
    }

    #[test]
    fn test_duplicate_id_rejected_and_state_unchanged() {
        let mut store = store();
        store.add_layer(Layer::image("a", "a.png")).unwrap();
        let before = store.project().clone();

        let err = store.add_layer(Layer::text("a", "dup")).unwrap_err();
        assert!(matches!(err, EditorError::DuplicateLayerId(ref id) if id == "a"));
        assert_eq!(store.project(), &before);
    }

    #[test]
    fn test_delete_is_idempotent() {
        let mut store = store();
        store.add_layer(Layer::image("a", "a.png")).unwrap();
        store.add_layer(Layer::text("b", "Hello")).unwrap();

        let once = store.delete_layer("a").clone();
        let twice = store.delete_layer("a").clone();
        assert_eq!(once, twice);
        assert_eq!(twice.layers.len(), 1);
    }

    #[test]
    fn test_revision_tracks_effective_changes() {
        let mut store = store();
        store.add_layer(Layer::image("a", "a.png")).unwrap();
        let revision = store.revision();
        store.delete_layer("ghost");
        store.toggle_lock("ghost");
        assert_eq!(store.revision(), revision);
        store.delete_layer("a");
        assert_eq!(store.revision(), revision + 1);
    }

    #[test]
    fn test_update_absent_layer_is_noop() {
        let mut store = store();
        let before = store.project().clone();
        store.update_layer("ghost", LayerUpdate::opacity(10));
        assert_eq!(store.project(), &before);
    }

    #[test]
    fn test_update_clamps_opacity() {
        let mut store = store();
        store.add_layer(Layer::image("a", "a.png")).unwrap();
        store.update_layer("a", LayerUpdate::opacity(150));
        assert_eq!(store.layer("a").unwrap().opacity, 100);
    }

    #[test]
    fn test_update_refreshes_timestamp() {
        let mut store = store();
        store.add_layer(Layer::image("a", "a.png")).unwrap();
        let before = store.project().updated_at;
        std::thread::sleep(std::time::Duration::from_millis(2));
        store.update_layer("a", LayerUpdate::position(10.0, 10.0));
        assert!(store.project().updated_at > before);
    }

    #[test]
    fn test_toggles() {
        let mut store = store();
        store.add_layer(Layer::text("t", "Hi")).unwrap();
        store.toggle_visibility("t");
        store.toggle_lock("t");
        let layer = store.layer("t").unwrap();
        assert!(!layer.visible);
        assert!(layer.locked);
        store.toggle_visibility("t");
        assert!(store.layer("t").unwrap().visible);
    }

    #[test]
    fn test_resize_keeps_positions() {
        let mut store = store();
        store
            .add_layer(Layer::shape("s", ShapeType::Rectangle).with_position(400.0, 300.0))
            .unwrap();
        store.resize_canvas(1920, 1080).unwrap();
        assert_eq!(store.project().canvas.width, 1920);
        assert_eq!(store.layer("s").unwrap().position, Point::new(400.0, 300.0));
        assert!(matches!(
            store.resize_canvas(0, 10),
            Err(EditorError::InvalidCanvasSize { width: 0, height: 10 })
        ));
        assert!(store.resize_canvas(MAX_DIMENSION + 1, 10).is_err());
        assert_eq!(store.project().canvas.width, 1920);
    }

    #[test]
    fn test_reorder_renumbers_display_order() {
        let mut store = store();
        for id in ["a", "b", "c"] {
            store.add_layer(Layer::text(id, id)).unwrap();
        }
        store.reorder_layer("a", Reorder::ToFront);
        assert_eq!((z_of(&store, "b"), z_of(&store, "c"), z_of(&store, "a")), (0, 1, 2));

        store.reorder_layer("a", Reorder::Backward);
        assert_eq!((z_of(&store, "b"), z_of(&store, "a"), z_of(&store, "c")), (0, 1, 2));

        store.reorder_layer("c", Reorder::ToBack);
        assert_eq!((z_of(&store, "c"), z_of(&store, "b"), z_of(&store, "a")), (0, 1, 2));
    }

    #[test]
    fn test_reorder_at_edge_is_noop() {
        let mut store = store();
        store.add_layer(Layer::text("a", "a")).unwrap();
        store.add_layer(Layer::text("b", "b")).unwrap();
        let before = store.project().clone();
        store.reorder_layer("b", Reorder::Forward);
        store.reorder_layer("ghost", Reorder::ToBack);
        assert_eq!(store.project(), &before);
    }

    #[test]
    fn test_duplicate_layer() {
        let mut store = store();
        store
            .add_layer(Layer::text("a", "Hello").with_position(10.0, 10.0))
            .unwrap();
        store.duplicate_layer("a", "a2").unwrap();
        let copy = store.layer("a2").unwrap();
        assert_eq!(copy.name, "Text copy");
        assert_eq!(copy.position, Point::new(30.0, 30.0));
        assert_eq!(copy.z_index, 1);
        assert!(store.duplicate_layer("a", "a2").is_err());
    }
}

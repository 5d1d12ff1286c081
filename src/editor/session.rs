// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Editing session.
//!
//! Ties the document store, the history timeline and the compositor
//! together. Every effective mutation is followed by exactly one history
//! record and a rebuild of the backend surface. Mutations that change
//! nothing record nothing.

use super::document::{DocumentStore, Reorder};
use super::history::{History, DEFAULT_CAPACITY};
use crate::error::{EditorError, Result};
use crate::models::{Color, Layer, LayerUpdate, Point, Project};
use crate::render::export::{self, EncodedImage, ExportConfig};
use crate::render::{BackendEvent, Compositor, CompositorEvent, RebuildStats, RenderBackend};

pub struct Session<B: RenderBackend> {
    document: DocumentStore,
    history: History,
    compositor: Compositor<B>,
    last_rebuild: RebuildStats,
}

impl<B: RenderBackend> Session<B> {
    pub fn new(project: Project, backend: B) -> Self {
        Self::with_history_capacity(project, backend, DEFAULT_CAPACITY)
    }

    /// Start a session on `project`. The initial state is recorded so undo
    /// can return to it.
    pub fn with_history_capacity(project: Project, backend: B, capacity: usize) -> Self {
        let mut session = Self {
            document: DocumentStore::new(project),
            history: History::with_capacity(capacity),
            compositor: Compositor::new(backend),
            last_rebuild: RebuildStats::default(),
        };
        session.start();
        session
    }

    pub fn project(&self) -> &Project {
        self.document.project()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn compositor(&self) -> &Compositor<B> {
        &self.compositor
    }

    pub fn backend(&self) -> &B {
        self.compositor.backend()
    }

    pub fn backend_mut(&mut self) -> &mut B {
        self.compositor.backend_mut()
    }

    pub fn selected(&self) -> Option<&str> {
        self.compositor.selected()
    }

    /// Stats of the most recent compositor pass.
    pub fn last_rebuild(&self) -> RebuildStats {
        self.last_rebuild
    }

    pub fn add_layer(&mut self, layer: Layer) -> Result<()> {
        let revision = self.document.revision();
        let description = format!("Added {} layer", layer.layer_type().label().to_lowercase());
        self.document.add_layer(layer)?;
        self.commit(revision, "add_layer", description);
        Ok(())
    }

    pub fn delete_layer(&mut self, id: &str) {
        let revision = self.document.revision();
        let name = self.layer_name(id);
        self.document.delete_layer(id);
        self.commit(revision, "delete_layer", format!("Deleted {}", name));
    }

    pub fn update_layer(&mut self, id: &str, update: LayerUpdate) {
        let revision = self.document.revision();
        self.document.update_layer(id, update);
        let name = self.layer_name(id);
        self.commit(revision, "update_layer", format!("Updated {}", name));
    }

    pub fn toggle_visibility(&mut self, id: &str) {
        let revision = self.document.revision();
        self.document.toggle_visibility(id);
        let description = match self.document.layer(id) {
            Some(layer) if layer.visible => format!("Showed {}", layer.name),
            Some(layer) => format!("Hid {}", layer.name),
            None => String::new(),
        };
        self.commit(revision, "toggle_visibility", description);
    }

    pub fn toggle_lock(&mut self, id: &str) {
        let revision = self.document.revision();
        self.document.toggle_lock(id);
        let description = match self.document.layer(id) {
            Some(layer) if layer.locked => format!("Locked {}", layer.name),
            Some(layer) => format!("Unlocked {}", layer.name),
            None => String::new(),
        };
        self.commit(revision, "toggle_lock", description);
    }

    pub fn resize_canvas(&mut self, width: u32, height: u32) -> Result<()> {
        let revision = self.document.revision();
        self.document.resize_canvas(width, height)?;
        self.commit(
            revision,
            "resize_canvas",
            format!("Resized canvas to {}x{}", width, height),
        );
        Ok(())
    }

    pub fn set_background(&mut self, color: Color) {
        let revision = self.document.revision();
        self.document.set_background(color);
        self.commit(
            revision,
            "set_background",
            format!("Set background to {}", color),
        );
    }

    pub fn reorder_layer(&mut self, id: &str, direction: Reorder) {
        let revision = self.document.revision();
        self.document.reorder_layer(id, direction);
        let name = self.layer_name(id);
        self.commit(revision, "reorder_layer", format!("Reordered {}", name));
    }

    /// Duplicate a layer under a fresh id. Returns the new id, or `None`
    /// when `id` is not present.
    pub fn duplicate_layer(&mut self, id: &str) -> Result<Option<String>> {
        if self.document.layer(id).is_none() {
            return Ok(None);
        }
        let revision = self.document.revision();
        let new_id = uuid::Uuid::new_v4().to_string();
        self.document.duplicate_layer(id, new_id.clone())?;
        let name = self.layer_name(id);
        self.commit(revision, "duplicate_layer", format!("Duplicated {}", name));
        Ok(Some(new_id))
    }

    /// Step back one history entry. Returns `false` at the start of the
    /// timeline.
    pub fn undo(&mut self) -> bool {
        match self.history.undo() {
            Some(project) => {
                self.adopt(project);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.history.redo() {
            Some(project) => {
                self.adopt(project);
                true
            }
            None => false,
        }
    }

    pub fn restore(&mut self, index: usize) -> Result<()> {
        let project = self.history.restore(index)?;
        self.adopt(project);
        Ok(())
    }

    /// Select a layer by id, or clear the selection. Unknown ids clear it.
    pub fn select(&mut self, layer_id: Option<&str>) {
        let selection = layer_id
            .filter(|id| self.document.layer(id).is_some())
            .map(str::to_string);
        self.compositor.select(selection);
    }

    /// Route a backend interaction. Transforms are applied to the document
    /// and recorded.
    pub fn handle_backend_event(&mut self, event: BackendEvent) -> Result<Option<CompositorEvent>> {
        let translated = self.compositor.on_backend_event(event);
        if let Some(CompositorEvent::DrawableTransformed { layer_id, position }) = &translated {
            self.apply_drawable_transform(layer_id, *position)?;
        }
        Ok(translated)
    }

    /// Move a layer in response to an interactive tool. Locked layers are
    /// rejected.
    pub fn apply_drawable_transform(&mut self, layer_id: &str, position: Point) -> Result<()> {
        let (locked, current, name) = self
            .document
            .layer(layer_id)
            .map(|l| (l.locked, l.position, l.name.clone()))
            .ok_or_else(|| EditorError::LayerNotFound(layer_id.to_string()))?;
        if locked {
            // Put the drawable back where the document says it is.
            self.refresh();
            return Err(EditorError::LayerLocked(layer_id.to_string()));
        }
        if current == position {
            return Ok(());
        }

        let revision = self.document.revision();
        self.document
            .update_layer(layer_id, LayerUpdate::position(position.x, position.y));
        self.commit(revision, "transform", format!("Moved {}", name));
        Ok(())
    }

    pub fn export(&self, config: &ExportConfig) -> Result<EncodedImage> {
        export::export(self.compositor.backend(), config)
    }

    pub fn set_zoom(&mut self, factor: f64) {
        self.compositor.set_zoom(factor);
    }

    /// Switch to another project. The old surface is disposed before the
    /// new one is created and the timeline starts over.
    pub fn open_project(&mut self, project: Project) {
        log::info!("Opening project '{}'", project.name);
        self.compositor.dispose();
        self.document.replace_project(project);
        self.history.clear();
        self.start();
    }

    fn start(&mut self) {
        let description = format!("Opened {}", self.document.project().name);
        self.history
            .record("open_project", description, self.document.project());
        self.refresh();
    }

    fn commit(&mut self, revision: u64, action: &str, description: String) {
        if self.document.revision() == revision {
            return;
        }
        self.history
            .record(action, description, self.document.project());
        self.refresh();
    }

    fn adopt(&mut self, project: Project) {
        self.document.replace_project(project);
        self.refresh();
    }

    fn refresh(&mut self) {
        self.last_rebuild = self.compositor.rebuild(self.document.project());
    }

    fn layer_name(&self, id: &str) -> String {
        self.document
            .layer(id)
            .map_or_else(|| id.to_string(), |l| l.name.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::layer::ShapeType;
    use crate::models::Canvas;
    use crate::render::{ExportFormat, RasterBackend};

    fn session() -> Session<RasterBackend> {
        Session::new(Project::new("test", Canvas::default()), RasterBackend::new())
    }

    #[test]
    fn test_new_session_records_initial_state() {
        let session = session();
        assert_eq!(session.history().len(), 1);
        assert_eq!(session.history().current_index(), Some(0));
        assert!(session.backend().has_surface());
    }

    #[test]
    fn test_each_mutation_records_once() {
        let mut session = session();
        session.add_layer(Layer::text("a", "Hello")).unwrap();
        session.update_layer("a", LayerUpdate::opacity(40));
        session.toggle_lock("a");
        assert_eq!(session.history().len(), 4);
        assert_eq!(session.history().current().unwrap().action, "toggle_lock");
    }

    #[test]
    fn test_noop_mutations_not_recorded() {
        let mut session = session();
        session.delete_layer("ghost");
        session.update_layer("ghost", LayerUpdate::opacity(10));
        session.reorder_layer("ghost", Reorder::ToFront);
        assert_eq!(session.duplicate_layer("ghost").unwrap(), None);
        assert_eq!(session.history().len(), 1);
    }

    #[test]
    fn test_duplicate_id_not_recorded() {
        let mut session = session();
        session.add_layer(Layer::text("a", "Hello")).unwrap();
        assert!(session.add_layer(Layer::text("a", "Again")).is_err());
        assert_eq!(session.history().len(), 2);
    }

    #[test]
    fn test_undo_redo_rebuilds_surface() {
        let mut session = session();
        session.add_layer(Layer::shape("s", ShapeType::Rectangle)).unwrap();
        assert_eq!(session.backend().drawable_count(), 1);

        assert!(session.undo());
        assert!(session.project().layers.is_empty());
        assert_eq!(session.backend().drawable_count(), 0);
        assert!(!session.undo());

        assert!(session.redo());
        assert_eq!(session.project().layers.len(), 1);
        assert_eq!(session.backend().drawable_count(), 1);
        assert!(!session.redo());
    }

    #[test]
    fn test_restore_out_of_range() {
        let mut session = session();
        session.add_layer(Layer::text("a", "Hello")).unwrap();
        assert!(matches!(
            session.restore(9),
            Err(EditorError::IndexOutOfRange { index: 9, len: 2 })
        ));
        session.restore(0).unwrap();
        assert!(session.project().layers.is_empty());
        assert_eq!(session.history().current_index(), Some(0));
    }

    #[test]
    fn test_locked_layer_rejects_interactive_move() {
        let mut session = session();
        session
            .add_layer(Layer::shape("s", ShapeType::Rectangle).with_position(10.0, 10.0))
            .unwrap();
        session.toggle_lock("s");
        let recorded = session.history().len();

        let err = session
            .apply_drawable_transform("s", Point::new(200.0, 200.0))
            .unwrap_err();
        assert!(matches!(err, EditorError::LayerLocked(ref id) if id == "s"));
        assert_eq!(session.project().layer("s").unwrap().position, Point::new(10.0, 10.0));
        assert_eq!(session.history().len(), recorded);

        // Programmatic updates are not gated.
        session.update_layer("s", LayerUpdate::position(50.0, 50.0));
        assert_eq!(session.project().layer("s").unwrap().position, Point::new(50.0, 50.0));
    }

    #[test]
    fn test_transform_missing_layer() {
        let mut session = session();
        assert!(matches!(
            session.apply_drawable_transform("ghost", Point::new(1.0, 1.0)),
            Err(EditorError::LayerNotFound(_))
        ));
    }

    #[test]
    fn test_backend_events_drive_selection_and_moves() {
        let mut session = session();
        session
            .add_layer(Layer::shape("s", ShapeType::Rectangle).with_position(10.0, 10.0))
            .unwrap();

        let picked = session.backend().pick(Point::new(50.0, 50.0));
        let event = session.handle_backend_event(picked).unwrap();
        assert_eq!(event, Some(CompositorEvent::SelectionChanged(Some("s".into()))));
        assert_eq!(session.selected(), Some("s"));

        let drawable = session.compositor().drawable_for("s").unwrap();
        session
            .handle_backend_event(BackendEvent::Transformed {
                drawable,
                position: Point::new(300.0, 200.0),
            })
            .unwrap();
        assert_eq!(session.project().layer("s").unwrap().position, Point::new(300.0, 200.0));
        assert_eq!(session.history().current().unwrap().action, "transform");

        let cleared = session.backend().pick(Point::new(5.0, 5.0));
        session.handle_backend_event(cleared).unwrap();
        assert_eq!(session.selected(), None);
    }

    #[test]
    fn test_select_unknown_clears() {
        let mut session = session();
        session.add_layer(Layer::text("a", "Hello")).unwrap();
        session.select(Some("a"));
        assert_eq!(session.selected(), Some("a"));
        session.select(Some("ghost"));
        assert_eq!(session.selected(), None);
    }

    #[test]
    fn test_open_project_resets_history_and_surface() {
        let mut session = session();
        session.add_layer(Layer::text("a", "Hello")).unwrap();

        let other = Project::new(
            "other",
            Canvas {
                width: 320,
                height: 240,
                background_color: Color::BLACK,
            },
        );
        session.open_project(other);
        assert_eq!(session.history().len(), 1);
        assert_eq!(session.backend().surface_size(), Some((320, 240)));
        assert!(!session.undo());

        let png = session.export(&ExportConfig::with_format(ExportFormat::Png)).unwrap();
        assert_eq!((png.width, png.height), (320, 240));
    }

    #[test]
    fn test_history_capacity_applies() {
        let mut session =
            Session::with_history_capacity(Project::new("cap", Canvas::default()), RasterBackend::new(), 3);
        for i in 0..5 {
            session.add_layer(Layer::text(format!("t{i}"), "x")).unwrap();
        }
        assert_eq!(session.history().len(), 3);
        assert_eq!(session.history().current_index(), Some(2));
    }
}

// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Main application state and egui App implementation.
//!
//! The app owns an editing [`Session`] over the CPU raster backend and maps
//! menus, keyboard shortcuts and canvas interaction onto session
//! operations. The composited raster is re-uploaded as a texture whenever
//! the current history entry changes.

use crate::ui::edit::PendingEdit;
use crate::ui::{canvas, history, layers, toolbar};
use pixelstack::config::EditorConfig;
use pixelstack::io::autosave::AutosaveTask;
use pixelstack::io::{media, serialization};
use pixelstack::models::layer::ShapeType;
use pixelstack::models::{Color, Layer, LayerKind, Point, Project};
use pixelstack::render::{
    BackendEvent, DrawableRef, ExportConfig, ExportFormat, RasterBackend, RenderBackend,
};
use pixelstack::util::geometry::Rect;
use pixelstack::{EditorError, Session};
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver};

const ZOOM_STEP: f64 = 1.25;
const BRUSH_SIZE: f64 = 4.0;

/// Current editing tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Select,
    Text,
    Shape(ShapeType),
    Draw,
}

impl Tool {
    pub fn label(&self) -> &'static str {
        match self {
            Tool::Select => "Select",
            Tool::Text => "Text",
            Tool::Shape(shape) => shape.label(),
            Tool::Draw => "Draw",
        }
    }
}

/// Result of background image loading.
struct LoadedImageData {
    name: String,
    data_uri: String,
}

/// A layer being moved with the select tool.
struct Drag {
    drawable: DrawableRef,
    grab: Point,
    origin: Point,
    bounds: Rect,
    current: Point,
}

pub struct EditorApp {
    config: EditorConfig,
    session: Session<RasterBackend>,
    current_tool: Tool,
    layers_panel: layers::LayersPanel,
    /// Background color being picked, committed on release.
    background_edit: PendingEdit<Color>,

    /// Composited raster for display
    texture: Option<egui::TextureHandle>,
    /// History entry the texture was rendered from
    rendered_entry: Option<String>,

    drag: Option<Drag>,
    stroke: Vec<Point>,

    project_path: Option<PathBuf>,
    autosave: Option<AutosaveTask>,

    image_loader: Option<Receiver<Result<LoadedImageData, String>>>,
    loading_message: Option<String>,
    status: Option<String>,
}

impl EditorApp {
    pub fn new(config: EditorConfig) -> Self {
        let config = config.with_defaults_for_invalid();
        let project = Project::new("Untitled", config.canvas.into());
        let session = Session::with_history_capacity(
            project,
            RasterBackend::new(),
            config.history_capacity,
        );
        let autosave = config
            .autosave
            .enabled
            .then(|| AutosaveTask::spawn(config.autosave.path.clone(), config.autosave.interval()));

        Self {
            config,
            session,
            current_tool: Tool::Select,
            layers_panel: layers::LayersPanel::default(),
            background_edit: PendingEdit::default(),
            texture: None,
            rendered_entry: None,
            drag: None,
            stroke: Vec::new(),
            project_path: None,
            autosave,
            image_loader: None,
            loading_message: None,
            status: None,
        }
    }

    fn new_layer_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    fn report(&mut self, result: pixelstack::Result<()>) {
        match result {
            Ok(()) => self.status = None,
            Err(EditorError::LayerLocked(id)) => {
                let name = self
                    .session
                    .project()
                    .layer(&id)
                    .map_or(id.clone(), |l| l.name.clone());
                self.status = Some(format!("{} is locked", name));
            }
            Err(e) => {
                log::error!("{}", e);
                self.status = Some(e.to_string());
            }
        }
    }

    fn new_project(&mut self) {
        let project = Project::new("Untitled", self.config.canvas.into());
        self.session.open_project(project);
        self.project_path = None;
        self.drag = None;
        self.stroke.clear();
    }

    fn open_project_file(&mut self, path: PathBuf) {
        match serialization::load_project(&path) {
            Ok(project) => {
                log::info!("Loaded {} layers from {}", project.layers.len(), path.display());
                self.session.open_project(project);
                self.project_path = Some(path);
                self.drag = None;
                self.stroke.clear();
            }
            Err(e) => {
                log::error!("Failed to load project: {:#}", e);
                self.status = Some(format!("Failed to load project: {e}"));
            }
        }
    }

    fn save_project(&mut self, path: Option<PathBuf>) {
        let path = path.or_else(|| self.project_path.clone()).or_else(|| {
            rfd::FileDialog::new()
                .add_filter("Project", &["json", "yaml", "yml"])
                .set_file_name("project.json")
                .save_file()
        });
        let Some(path) = path else {
            return;
        };
        match serialization::save_project(self.session.project(), &path) {
            Ok(()) => {
                log::info!("Saved project to {}", path.display());
                self.project_path = Some(path);
            }
            Err(e) => {
                log::error!("Failed to save project: {:#}", e);
                self.status = Some(format!("Failed to save project: {e}"));
            }
        }
    }

    fn export_image(&mut self, format: ExportFormat) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter(format.extension(), &[format.extension()])
            .set_file_name(format!("export.{}", format.extension()))
            .save_file()
        else {
            return;
        };

        let config = ExportConfig {
            format,
            ..self.config.export
        };
        let result = self
            .session
            .export(&config)
            .map_err(anyhow::Error::from)
            .and_then(|image| {
                std::fs::write(&path, &image.bytes)?;
                Ok(image)
            });
        match result {
            Ok(image) => log::info!(
                "Exported {}x{} to {}",
                image.width,
                image.height,
                path.display()
            ),
            Err(e) => {
                log::error!("Failed to export: {:#}", e);
                self.status = Some(format!("Failed to export: {e}"));
            }
        }
    }

    /// Decode an image file off the UI thread.
    fn load_image_file(&mut self, path: PathBuf) {
        let (sender, receiver) = channel();
        self.image_loader = Some(receiver);
        self.loading_message = Some("Loading image...".to_string());

        std::thread::spawn(move || {
            let result = (|| -> Result<LoadedImageData, String> {
                let loaded = media::load_image(&path)
                    .map_err(|e| format!("Failed to load image: {:#}", e))?;
                log::info!("Loaded image: {} ({}x{})", path.display(), loaded.width, loaded.height);

                let raster = image::RgbaImage::from_raw(loaded.width, loaded.height, loaded.pixels)
                    .ok_or_else(|| "Decoded pixel buffer has the wrong size".to_string())?;
                let data_uri = media::png_data_uri(&raster)
                    .map_err(|e| format!("Failed to encode image: {:#}", e))?;
                let name = path
                    .file_stem()
                    .map(|s| s.to_string_lossy().to_string())
                    .unwrap_or_else(|| "Image".to_string());
                Ok(LoadedImageData { name, data_uri })
            })();

            let _ = sender.send(result);
        });
    }

    fn add_text(&mut self, at: Point) {
        let layer = Layer::text(Self::new_layer_id(), "Text").with_position(at.x, at.y);
        let result = self.session.add_layer(layer);
        self.report(result);
    }

    fn add_shape(&mut self, shape: ShapeType, at: Point) {
        let layer = Layer::shape(Self::new_layer_id(), shape).with_position(at.x, at.y);
        let result = self.session.add_layer(layer);
        self.report(result);
    }

    fn canvas_center(&self) -> Point {
        let canvas = self.session.project().canvas;
        Point::new(canvas.width as f64 / 2.0, canvas.height as f64 / 2.0)
    }

    fn delete_selected(&mut self) {
        if let Some(id) = self.session.selected().map(str::to_string) {
            self.session.delete_layer(&id);
        }
    }

    fn duplicate_selected(&mut self) {
        if let Some(id) = self.session.selected().map(str::to_string) {
            match self.session.duplicate_layer(&id) {
                Ok(Some(copy)) => self.session.select(Some(copy.as_str())),
                Ok(None) => {}
                Err(e) => self.report(Err(e)),
            }
        }
    }

    fn zoom_by(&mut self, factor: f64) {
        let zoom = (self.session.backend().zoom() * factor).clamp(0.1, 8.0);
        self.session.set_zoom(zoom);
    }

    /// Re-upload the raster when the document changed.
    fn refresh_texture(&mut self, ctx: &egui::Context) {
        let entry = self.session.history().current().map(|e| e.id.clone());
        if entry == self.rendered_entry && self.texture.is_some() {
            return;
        }

        let canvas = self.session.project().canvas;
        match self.session.backend().rasterize(canvas.width, canvas.height) {
            Ok(raster) => {
                let size = [raster.width() as usize, raster.height() as usize];
                let color_image = egui::ColorImage::from_rgba_unmultiplied(size, raster.as_raw());
                match &mut self.texture {
                    Some(texture) => texture.set(color_image, egui::TextureOptions::LINEAR),
                    None => {
                        self.texture =
                            Some(ctx.load_texture("canvas", color_image, egui::TextureOptions::LINEAR))
                    }
                }
            }
            Err(e) => log::error!("Failed to rasterize canvas: {}", e),
        }

        if let Some(autosave) = &self.autosave {
            if self.rendered_entry.is_some() {
                autosave.update(self.session.project());
            }
        }
        self.rendered_entry = entry;
    }

    fn handle_canvas_action(&mut self, action: canvas::CanvasAction) {
        use canvas::CanvasAction;

        match (self.current_tool, action) {
            (_, CanvasAction::None) => {}
            (Tool::Select, CanvasAction::Click(point)) => {
                let event = self.session.backend().pick(point);
                let result = self.session.handle_backend_event(event).map(|_| ());
                self.report(result);
            }
            (Tool::Select, CanvasAction::DragStart(point)) => {
                let Some(drawable) = self.session.backend().hit_test(point) else {
                    return;
                };
                let picked = self.session.handle_backend_event(BackendEvent::Picked(drawable));
                let layer = self
                    .session
                    .selected()
                    .and_then(|id| self.session.project().layer(id));
                let bounds = self.session.backend().bounds(drawable);
                if let (Ok(_), Some(layer), Some(bounds)) = (picked, layer, bounds) {
                    self.drag = Some(Drag {
                        drawable,
                        grab: point,
                        origin: layer.position,
                        bounds,
                        current: point,
                    });
                }
            }
            (Tool::Select, CanvasAction::Drag(point)) => {
                if let Some(drag) = &mut self.drag {
                    drag.current = point;
                }
            }
            (Tool::Select, CanvasAction::DragEnd(point)) => {
                let Some(drag) = self.drag.take() else {
                    return;
                };
                let position = Point::new(
                    drag.origin.x + point.x - drag.grab.x,
                    drag.origin.y + point.y - drag.grab.y,
                );
                let result = self
                    .session
                    .handle_backend_event(BackendEvent::Transformed {
                        drawable: drag.drawable,
                        position,
                    })
                    .map(|_| ());
                self.report(result);
            }
            (Tool::Text, CanvasAction::Click(point)) => self.add_text(point),
            (Tool::Shape(shape), CanvasAction::Click(point)) => self.add_shape(shape, point),
            (Tool::Draw, CanvasAction::DragStart(point)) => {
                self.stroke = vec![point];
            }
            (Tool::Draw, CanvasAction::Drag(point)) => self.stroke.push(point),
            (Tool::Draw, CanvasAction::DragEnd(point)) => {
                self.stroke.push(point);
                let mut layer = Layer::drawing(Self::new_layer_id(), Color::BLACK, BRUSH_SIZE);
                if let LayerKind::Drawing(drawing) = &mut layer.kind {
                    drawing.points = std::mem::take(&mut self.stroke);
                }
                let result = self.session.add_layer(layer);
                self.report(result);
            }
            _ => {}
        }
    }

    fn drag_preview(&self) -> Option<Rect> {
        self.drag.as_ref().map(|drag| Rect {
            x: drag.bounds.x + drag.current.x - drag.grab.x,
            y: drag.bounds.y + drag.current.y - drag.grab.y,
            ..drag.bounds
        })
    }

    fn selection_bounds(&self) -> Option<Rect> {
        let id = self.session.selected()?;
        let drawable = self.session.compositor().drawable_for(id)?;
        self.session.backend().bounds(drawable)
    }

    fn menu_bar(&mut self, ctx: &egui::Context, ui: &mut egui::Ui) {
        egui::menu::bar(ui, |ui| {
            ui.menu_button("File", |ui| {
                if ui.button("New Project").clicked() {
                    self.new_project();
                    ui.close_menu();
                }
                if ui.button("Open Project...").clicked() {
                    if let Some(path) = rfd::FileDialog::new()
                        .add_filter("Project", &["json", "yaml", "yml"])
                        .pick_file()
                    {
                        self.open_project_file(path);
                    }
                    ui.close_menu();
                }
                if ui.button("Save Project (Ctrl+S)").clicked() {
                    self.save_project(None);
                    ui.close_menu();
                }
                ui.separator();
                if ui.button("Add Image...").clicked() {
                    if let Some(path) = rfd::FileDialog::new()
                        .add_filter("Images", &["jpg", "jpeg", "png", "bmp", "webp", "gif"])
                        .pick_file()
                    {
                        self.load_image_file(path);
                    }
                    ui.close_menu();
                }
                ui.menu_button("Export Image", |ui| {
                    for format in [ExportFormat::Png, ExportFormat::Jpg, ExportFormat::Webp] {
                        let label = format!("Export as {}...", format.extension().to_uppercase());
                        if ui.button(label).clicked() {
                            self.export_image(format);
                            ui.close_menu();
                        }
                    }
                });
                ui.separator();
                if ui.button("Quit").clicked() {
                    ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                }
            });

            ui.menu_button("Edit", |ui| {
                let can_undo = self.session.history().can_undo();
                if ui.add_enabled(can_undo, egui::Button::new("Undo (Ctrl+Z)")).clicked() {
                    self.session.undo();
                    ui.close_menu();
                }
                let can_redo = self.session.history().can_redo();
                if ui
                    .add_enabled(can_redo, egui::Button::new("Redo (Ctrl+Shift+Z)"))
                    .clicked()
                {
                    self.session.redo();
                    ui.close_menu();
                }

                ui.separator();

                let has_selection = self.session.selected().is_some();
                if ui
                    .add_enabled(has_selection, egui::Button::new("Duplicate (Ctrl+D)"))
                    .clicked()
                {
                    self.duplicate_selected();
                    ui.close_menu();
                }
                if ui
                    .add_enabled(has_selection, egui::Button::new("Delete Selected"))
                    .clicked()
                {
                    self.delete_selected();
                    ui.close_menu();
                }
            });

            ui.menu_button("Insert", |ui| {
                if ui.button("Text").clicked() {
                    self.add_text(self.canvas_center());
                    ui.close_menu();
                }
                for shape in ShapeType::all() {
                    if ui.button(shape.label()).clicked() {
                        self.add_shape(shape, self.canvas_center());
                        ui.close_menu();
                    }
                }
            });

            ui.menu_button("Canvas", |ui| {
                let canvas = self.session.project().canvas;
                for (width, height) in [(800, 600), (1080, 1080), (1280, 720), (1920, 1080)] {
                    let label = format!("{}x{}", width, height);
                    let current = (canvas.width, canvas.height) == (width, height);
                    if ui.radio(current, label).clicked() {
                        let result = self.session.resize_canvas(width, height);
                        self.report(result);
                        ui.close_menu();
                    }
                }
                ui.separator();
                let shown = self
                    .background_edit
                    .current()
                    .copied()
                    .unwrap_or(canvas.background_color);
                let mut rgba =
                    egui::Color32::from_rgba_unmultiplied(shown.r, shown.g, shown.b, shown.a);
                ui.horizontal(|ui| {
                    ui.label("Background");
                    if ui.color_edit_button_srgba(&mut rgba).changed() {
                        let [r, g, b, a] = rgba.to_srgba_unmultiplied();
                        self.background_edit.update(Color::rgba(r, g, b, a));
                    }
                });
            });

            ui.menu_button("View", |ui| {
                if ui.button("Zoom In").clicked() {
                    self.zoom_by(ZOOM_STEP);
                    ui.close_menu();
                }
                if ui.button("Zoom Out").clicked() {
                    self.zoom_by(1.0 / ZOOM_STEP);
                    ui.close_menu();
                }
                if ui.button("Reset Zoom").clicked() {
                    self.session.set_zoom(1.0);
                    ui.close_menu();
                }
            });
        });
    }

    fn handle_shortcuts(&mut self, ctx: &egui::Context) {
        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            self.drag = None;
            self.stroke.clear();
            self.session.select(None);
            self.current_tool = Tool::Select;
        }

        // Text fields keep their own editing keys
        if ctx.wants_keyboard_input() {
            return;
        }

        if ctx.input(|i| i.key_pressed(egui::Key::Delete) || i.key_pressed(egui::Key::Backspace)) {
            self.delete_selected();
        }

        if ctx.input(|i| i.modifiers.command && i.key_pressed(egui::Key::Z) && !i.modifiers.shift) {
            self.session.undo();
        }

        if ctx.input(|i| {
            (i.modifiers.command && i.modifiers.shift && i.key_pressed(egui::Key::Z))
                || (i.modifiers.command && i.key_pressed(egui::Key::Y))
        }) {
            self.session.redo();
        }

        if ctx.input(|i| i.modifiers.command && i.key_pressed(egui::Key::D)) {
            self.duplicate_selected();
        }

        if ctx.input(|i| i.modifiers.command && i.key_pressed(egui::Key::S)) {
            self.save_project(None);
        }

        if ctx.input(|i| i.modifiers.command && i.key_pressed(egui::Key::E)) {
            self.export_image(self.config.export.format);
        }
    }
}

impl eframe::App for EditorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Check for completed image loading
        if let Some(ref receiver) = self.image_loader {
            if let Ok(result) = receiver.try_recv() {
                self.image_loader = None;
                self.loading_message = None;

                match result {
                    Ok(loaded) => {
                        let layer =
                            Layer::image(Self::new_layer_id(), loaded.data_uri).with_name(loaded.name);
                        let result = self.session.add_layer(layer);
                        self.report(result);
                    }
                    Err(e) => {
                        log::error!("{}", e);
                        self.status = Some(e);
                    }
                }
            }
        }

        // Request repaint if still loading (to update spinner)
        if self.loading_message.is_some() {
            ctx.request_repaint();
        }

        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| self.menu_bar(ctx, ui));
        let pointer_down = ctx.input(|i| i.pointer.any_down());
        if let Some(color) = self.background_edit.release(pointer_down) {
            self.session.set_background(color);
        }

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            toolbar::show(ui, &mut self.current_tool);
        });

        if let Some(status) = self.status.clone() {
            egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label(egui::RichText::new(&status).color(egui::Color32::LIGHT_RED));
                    if ui.small_button("✖").clicked() {
                        self.status = None;
                    }
                });
            });
        }

        let (layers_action, restore) = egui::SidePanel::right("layers")
            .default_width(260.0)
            .show(ctx, |ui| {
                let action =
                    self.layers_panel
                        .show(ui, self.session.project(), self.session.selected());
                ui.separator();
                let restore = history::show(ui, self.session.history());
                (action, restore)
            })
            .inner;

        match layers_action {
            layers::LayersAction::None => {}
            layers::LayersAction::Select(id) => self.session.select(Some(id.as_str())),
            layers::LayersAction::ToggleVisibility(id) => self.session.toggle_visibility(&id),
            layers::LayersAction::ToggleLock(id) => self.session.toggle_lock(&id),
            layers::LayersAction::Reorder(id, direction) => self.session.reorder_layer(&id, direction),
            layers::LayersAction::Duplicate(id) => {
                if let Err(e) = self.session.duplicate_layer(&id) {
                    self.report(Err(e));
                }
            }
            layers::LayersAction::Delete(id) => self.session.delete_layer(&id),
            layers::LayersAction::SetOpacity(id, opacity) => self
                .session
                .update_layer(&id, pixelstack::LayerUpdate::opacity(opacity as i32)),
        }
        if let Some(index) = restore {
            let result = self.session.restore(index);
            self.report(result);
        }

        self.handle_shortcuts(ctx);
        self.refresh_texture(ctx);

        let canvas_action = egui::CentralPanel::default()
            .show(ctx, |ui| {
                if let Some(ref message) = self.loading_message {
                    ui.centered_and_justified(|ui| {
                        ui.vertical_centered(|ui| {
                            ui.add_space(20.0);
                            ui.spinner();
                            ui.add_space(10.0);
                            ui.label(
                                egui::RichText::new(message)
                                    .size(16.0)
                                    .color(egui::Color32::from_gray(200)),
                            );
                        });
                    });
                    return canvas::CanvasAction::None;
                }

                let view = canvas::CanvasView {
                    project: self.session.project(),
                    texture: self.texture.as_ref(),
                    tool: self.current_tool,
                    zoom: self.session.backend().zoom(),
                    selection: self.selection_bounds(),
                    drag_preview: self.drag_preview(),
                    stroke_preview: &self.stroke,
                };
                canvas::show(ui, &view)
            })
            .inner;

        self.handle_canvas_action(canvas_action);
    }
}

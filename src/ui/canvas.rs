// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Canvas view.
//!
//! Shows the composited raster scaled to fit the available space, outlines
//! the current selection, and reports pointer interaction in canvas pixel
//! coordinates.

use crate::app::Tool;
use pixelstack::models::{Point, Project};
use pixelstack::util::geometry::{canvas_to_view, fit_scale, view_to_canvas, Rect};

/// Result of canvas interaction.
pub enum CanvasAction {
    None,
    Click(Point),
    DragStart(Point),
    Drag(Point),
    DragEnd(Point),
}

/// Everything the canvas needs to draw one frame.
pub struct CanvasView<'a> {
    pub project: &'a Project,
    pub texture: Option<&'a egui::TextureHandle>,
    pub tool: Tool,
    pub zoom: f64,
    /// Bounds of the selected drawable, in canvas pixels.
    pub selection: Option<Rect>,
    /// Ghost outline of a drag in progress.
    pub drag_preview: Option<Rect>,
    /// Brush stroke being drawn.
    pub stroke_preview: &'a [Point],
}

/// Display the canvas and handle mouse interactions.
pub fn show(ui: &mut egui::Ui, view: &CanvasView) -> CanvasAction {
    let mut action = CanvasAction::None;
    ui.style_mut().visuals.extreme_bg_color = egui::Color32::from_gray(40);

    let canvas = view.project.canvas;
    let available_size = ui.available_size() - egui::vec2(0.0, 24.0);

    egui::Frame::canvas(ui.style()).show(ui, |ui| {
        ui.set_min_size(available_size);

        let Some(texture) = view.texture else {
            ui.centered_and_justified(|ui| {
                ui.label(egui::RichText::new("Rendering...").color(egui::Color32::WHITE));
            });
            return;
        };

        let available = ui.available_size();
        let scale = (fit_scale(
            canvas.width,
            canvas.height,
            available.x as f64,
            available.y as f64,
        ) * view.zoom)
            .max(0.01);
        let display = egui::vec2(
            (canvas.width as f64 * scale) as f32,
            (canvas.height as f64 * scale) as f32,
        );

        // Center the canvas
        let offset = ((available - display) / 2.0).max(egui::Vec2::ZERO);
        let canvas_rect = egui::Rect::from_min_size(ui.min_rect().min + offset, display);
        let origin = Point::new(canvas_rect.min.x as f64, canvas_rect.min.y as f64);

        ui.painter().image(
            texture.id(),
            canvas_rect,
            egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
            egui::Color32::WHITE,
        );

        let response = ui.allocate_rect(canvas_rect, egui::Sense::click_and_drag());
        let to_canvas = |pos: egui::Pos2| {
            view_to_canvas(Point::new(pos.x as f64, pos.y as f64), origin, scale)
        };

        if let Some(pos) = response.interact_pointer_pos() {
            let point = to_canvas(pos);
            if response.drag_started() {
                action = CanvasAction::DragStart(point);
            } else if response.drag_stopped() {
                action = CanvasAction::DragEnd(point);
            } else if response.dragged() {
                action = CanvasAction::Drag(point);
            } else if response.clicked() {
                action = CanvasAction::Click(point);
            }
        }

        let painter = ui.painter_at(canvas_rect);

        if let Some(bounds) = view.selection {
            painter.rect_stroke(
                to_view_rect(bounds, origin, scale),
                0.0,
                egui::Stroke::new(1.5, egui::Color32::from_rgb(0x3b, 0x82, 0xf6)),
            );
        }
        if let Some(bounds) = view.drag_preview {
            painter.rect_stroke(
                to_view_rect(bounds, origin, scale),
                0.0,
                egui::Stroke::new(1.0, egui::Color32::LIGHT_BLUE),
            );
        }
        if view.stroke_preview.len() > 1 {
            let points = view
                .stroke_preview
                .iter()
                .map(|p| to_pos(canvas_to_view(*p, origin, scale)))
                .collect();
            painter.add(egui::Shape::line(
                points,
                egui::Stroke::new(2.0, egui::Color32::LIGHT_BLUE),
            ));
        }
    });

    ui.separator();
    ui.horizontal(|ui| {
        ui.label(format!("Tool: {}", view.tool.label()));
        ui.separator();
        ui.label(format!(
            "{}x{}  {} layers",
            canvas.width,
            canvas.height,
            view.project.layers.len()
        ));
        ui.separator();
        ui.label(format!("Zoom: {:.0}%", view.zoom * 100.0));
    });

    action
}

fn to_pos(point: Point) -> egui::Pos2 {
    egui::pos2(point.x as f32, point.y as f32)
}

fn to_view_rect(bounds: Rect, origin: Point, scale: f64) -> egui::Rect {
    let min = canvas_to_view(Point::new(bounds.x, bounds.y), origin, scale);
    egui::Rect::from_min_size(
        to_pos(min),
        egui::vec2((bounds.width * scale) as f32, (bounds.height * scale) as f32),
    )
}

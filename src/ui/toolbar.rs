// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Toolbar and tool selection UI.

use crate::app::Tool;
use pixelstack::models::layer::ShapeType;

/// Display the toolbar with tool selection buttons.
pub fn show(ui: &mut egui::Ui, current_tool: &mut Tool) {
    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing.x = 8.0;

        ui.label("Tools:");

        ui.separator();

        if ui.selectable_label(*current_tool == Tool::Select, "⬆ Select").clicked() {
            *current_tool = Tool::Select;
        }

        if ui.selectable_label(*current_tool == Tool::Text, "T Text").clicked() {
            *current_tool = Tool::Text;
        }

        for shape in ShapeType::all() {
            let selected = *current_tool == Tool::Shape(shape);
            if ui.selectable_label(selected, shape.label()).clicked() {
                *current_tool = Tool::Shape(shape);
            }
        }

        if ui.selectable_label(*current_tool == Tool::Draw, "✏ Draw").clicked() {
            *current_tool = Tool::Draw;
        }

        ui.separator();

        let tool_text = match current_tool {
            Tool::Select => "Click to select a layer, drag to move it",
            Tool::Text => "Click to place a text layer",
            Tool::Shape(_) => "Click to place the shape",
            Tool::Draw => "Drag to paint a stroke",
        };

        ui.label(egui::RichText::new(tool_text).italics().weak());
    });
}

// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Layer list and properties of the selected layer.

use super::edit::PendingEdit;
use pixelstack::editor::Reorder;
use pixelstack::models::Project;

/// Result of layer panel interaction.
pub enum LayersAction {
    None,
    Select(String),
    ToggleVisibility(String),
    ToggleLock(String),
    Reorder(String, Reorder),
    Duplicate(String),
    Delete(String),
    SetOpacity(String, u8),
}

/// Panel state that outlives a frame.
#[derive(Default)]
pub struct LayersPanel {
    /// Opacity being dragged, committed when the drag ends.
    opacity_edit: PendingEdit<(String, u8)>,
}

impl LayersPanel {
    pub fn show(&mut self, ui: &mut egui::Ui, project: &Project, selected: Option<&str>) -> LayersAction {
        let mut action = LayersAction::None;

        ui.heading("Layers");
        ui.separator();

        if project.layers.is_empty() {
            ui.label(egui::RichText::new("No layers yet").weak());
        }

        egui::ScrollArea::vertical()
            .max_height(ui.available_height() * 0.6)
            .show(ui, |ui| {
                // Topmost first
                for layer in project.layers_in_display_order().into_iter().rev() {
                    ui.horizontal(|ui| {
                        let eye = if layer.visible { "👁" } else { "–" };
                        if ui.small_button(eye).on_hover_text("Toggle visibility").clicked() {
                            action = LayersAction::ToggleVisibility(layer.id.clone());
                        }
                        let lock = if layer.locked { "🔒" } else { "🔓" };
                        if ui.small_button(lock).on_hover_text("Toggle lock").clicked() {
                            action = LayersAction::ToggleLock(layer.id.clone());
                        }
                        let is_selected = selected == Some(layer.id.as_str());
                        let label = format!("{} ({})", layer.name, layer.layer_type().label());
                        if ui.selectable_label(is_selected, label).clicked() {
                            action = LayersAction::Select(layer.id.clone());
                        }
                    });
                }
            });

        let Some(layer) = selected.and_then(|id| project.layer(id)) else {
            return action;
        };

        ui.separator();
        ui.label(egui::RichText::new(&layer.name).strong());
        ui.label(format!(
            "Position: ({:.0}, {:.0})  z: {}",
            layer.position.x, layer.position.y, layer.z_index
        ));

        let mut opacity = match self.opacity_edit.current() {
            Some((id, value)) if *id == layer.id => *value,
            _ => layer.opacity,
        };
        let response = ui.add(egui::Slider::new(&mut opacity, 0..=100).text("Opacity"));
        if response.changed() {
            self.opacity_edit.update((layer.id.clone(), opacity));
        }
        let pointer_down = ui.input(|i| i.pointer.any_down());
        if let Some((id, value)) = self.opacity_edit.release(pointer_down) {
            action = LayersAction::SetOpacity(id, value);
        }

        ui.horizontal(|ui| {
            if ui.button("⬆").on_hover_text("Bring forward").clicked() {
                action = LayersAction::Reorder(layer.id.clone(), Reorder::Forward);
            }
            if ui.button("⬇").on_hover_text("Send backward").clicked() {
                action = LayersAction::Reorder(layer.id.clone(), Reorder::Backward);
            }
            if ui.button("⏫").on_hover_text("Bring to front").clicked() {
                action = LayersAction::Reorder(layer.id.clone(), Reorder::ToFront);
            }
            if ui.button("⏬").on_hover_text("Send to back").clicked() {
                action = LayersAction::Reorder(layer.id.clone(), Reorder::ToBack);
            }
        });
        ui.horizontal(|ui| {
            if ui.button("Duplicate").clicked() {
                action = LayersAction::Duplicate(layer.id.clone());
            }
            if ui.button("Delete").clicked() {
                action = LayersAction::Delete(layer.id.clone());
            }
        });

        action
    }
}

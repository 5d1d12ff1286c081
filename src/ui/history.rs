// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! History list. Clicking an entry restores that state.

use pixelstack::editor::History;

/// Display the timeline, newest at the bottom. Returns the index to restore.
pub fn show(ui: &mut egui::Ui, history: &History) -> Option<usize> {
    let mut restore = None;

    ui.heading("History");
    ui.separator();

    egui::ScrollArea::vertical()
        .stick_to_bottom(true)
        .show(ui, |ui| {
            let current = history.current_index();
            for (index, entry) in history.entries().iter().enumerate() {
                let time = entry.timestamp.with_timezone(&chrono::Local).format("%H:%M:%S");
                let text = format!("{}  {}", time, entry.description);
                let mut label = egui::RichText::new(text);
                if current.is_some_and(|c| index > c) {
                    label = label.weak();
                }
                if ui
                    .selectable_label(current == Some(index), label)
                    .on_hover_text(&entry.action)
                    .clicked()
                {
                    restore = Some(index);
                }
            }
        });

    ui.label(format!("{} / {} entries", history.len(), history.capacity()));
    restore
}

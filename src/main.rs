// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! PixelStack - layered image editor.
//!
//! A desktop editor for composing images from image, text, shape, sticker
//! and drawing layers with full undo/redo and PNG/JPEG/WebP export.

mod app;
mod ui;

use anyhow::Result;
use app::EditorApp;
use pixelstack::config::EditorConfig;
use std::path::PathBuf;

fn main() -> Result<()> {
    // Initialize logging
    env_logger::init();

    let config = match std::env::var_os("PIXELSTACK_CONFIG") {
        Some(path) => EditorConfig::load(&PathBuf::from(path))?,
        None => EditorConfig::default(),
    };
    for problem in config.validate() {
        log::warn!("Config: {}, using default", problem);
    }

    // Configure egui options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([800.0, 600.0])
            .with_title("PixelStack"),
        ..Default::default()
    };

    // Run the application
    eframe::run_native(
        "PixelStack",
        options,
        Box::new(move |_cc| Ok(Box::new(EditorApp::new(config)))),
    )
    .map_err(|e| anyhow::anyhow!("Application error: {}", e))?;

    Ok(())
}

// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! PixelStack - layered image editing core.
//!
//! A project is a canvas plus a stack of image, text, shape, sticker and
//! drawing layers. The [`editor::Session`] mutates it through the document
//! store, records every change on a bounded undo timeline and re-composites
//! the result onto a [`render::RenderBackend`], from which it can be
//! exported as PNG, JPEG or WebP.

pub mod config;
pub mod editor;
pub mod error;
pub mod io;
pub mod models;
pub mod render;
pub mod util;

pub use config::EditorConfig;
pub use editor::{DocumentStore, History, Reorder, Session};
pub use error::{BackendError, EditorError, Result};
pub use models::{Canvas, Color, Layer, LayerKind, LayerUpdate, Point, Project};
pub use render::{Compositor, ExportConfig, ExportFormat, RasterBackend, RenderBackend};

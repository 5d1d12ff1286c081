// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Compositing and export pipeline.

pub mod backend;
pub mod compositor;
pub mod export;
pub mod filters;
pub mod raster;
pub mod text;

pub use backend::{
    BackendEvent, Drawable, DrawableKind, DrawableRef, RenderBackend, MAX_DIMENSION,
};
pub use compositor::{Compositor, CompositorEvent, RebuildStats};
pub use export::{EncodedImage, ExportConfig, ExportFormat};
pub use filters::{Effect, EffectChain};
pub use raster::RasterBackend;

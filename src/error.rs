// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Error types for the editing core.
//!
//! Structural errors are surfaced to the caller. Per-layer render failures
//! are reported by the backend as [`BackendError`] and swallowed by the
//! compositor.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, EditorError>;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("layer id already exists: {0}")]
    DuplicateLayerId(String),

    #[error("history index {index} out of range (timeline has {len} entries)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("export failed: {0}")]
    ExportFailed(String),

    #[error("layer is locked: {0}")]
    LayerLocked(String),

    #[error("layer not found: {0}")]
    LayerNotFound(String),

    #[error("invalid canvas size {width}x{height}")]
    InvalidCanvasSize { width: u32, height: u32 },

    #[error("invalid export config: {0}")]
    InvalidExportConfig(String),
}

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("no active surface")]
    NoSurface,

    #[error("source unavailable: {src} ({reason})")]
    SourceUnavailable { src: String, reason: String },

    #[error("raster of {width}x{height} exceeds the size limit")]
    TooLarge { width: u32, height: u32 },
}

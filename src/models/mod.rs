// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Document data model: colors, layers and projects.

pub mod color;
pub mod layer;
pub mod project;

pub use color::Color;
pub use layer::{Layer, LayerKind, LayerType, LayerUpdate, PayloadUpdate, Point};
pub use project::{Canvas, Project};

// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! UI components for the PixelStack editor.

pub mod canvas;
pub mod edit;
pub mod history;
pub mod layers;
pub mod toolbar;

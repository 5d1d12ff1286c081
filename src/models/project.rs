// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Project state.
//!
//! A project is the full editable document: canvas settings plus the layer
//! collection. Layers are kept in insertion order; display order is derived
//! from `z_index`.

use super::color::Color;
use super::layer::Layer;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Canvas size and background.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
    pub background_color: Color,
}

impl Default for Canvas {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            background_color: Color::WHITE,
        }
    }
}

/// Complete project data for serialization and history snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub canvas: Canvas,
    pub layers: Vec<Layer>,
}

impl Project {
    /// Create an empty project with the given canvas.
    pub fn new(name: impl Into<String>, canvas: Canvas) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            created_at: now,
            updated_at: now,
            canvas,
            layers: Vec::new(),
        }
    }

    pub fn layer(&self, id: &str) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id == id)
    }

    pub fn layer_mut(&mut self, id: &str) -> Option<&mut Layer> {
        self.layers.iter_mut().find(|l| l.id == id)
    }

    pub fn contains_layer(&self, id: &str) -> bool {
        self.layer(id).is_some()
    }

    /// Layers sorted back to front. Ties keep insertion order.
    pub fn layers_in_display_order(&self) -> Vec<&Layer> {
        let mut ordered: Vec<&Layer> = self.layers.iter().collect();
        ordered.sort_by_key(|l| l.z_index);
        ordered
    }

    /// Refresh `updated_at`.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Editor configuration, persisted as YAML or JSON.

use crate::editor::history::DEFAULT_CAPACITY;
use crate::models::{Canvas, Color};
use crate::render::{ExportConfig, MAX_DIMENSION};
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Canvas used for new projects.
    pub canvas: CanvasDefaults,
    pub history_capacity: usize,
    pub export: ExportConfig,
    pub autosave: AutosaveConfig,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            canvas: CanvasDefaults::default(),
            history_capacity: DEFAULT_CAPACITY,
            export: ExportConfig::default(),
            autosave: AutosaveConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasDefaults {
    pub width: u32,
    pub height: u32,
    pub background_color: Color,
}

impl Default for CanvasDefaults {
    fn default() -> Self {
        let canvas = Canvas::default();
        Self {
            width: canvas.width,
            height: canvas.height,
            background_color: canvas.background_color,
        }
    }
}

impl CanvasDefaults {
    fn in_range(&self) -> bool {
        (1..=MAX_DIMENSION).contains(&self.width) && (1..=MAX_DIMENSION).contains(&self.height)
    }
}

impl From<CanvasDefaults> for Canvas {
    fn from(defaults: CanvasDefaults) -> Self {
        Canvas {
            width: defaults.width,
            height: defaults.height,
            background_color: defaults.background_color,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutosaveConfig {
    pub enabled: bool,
    pub interval_secs: u64,
    pub path: PathBuf,
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 30,
            path: PathBuf::from("autosave.json"),
        }
    }
}

impl AutosaveConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }
}

impl EditorConfig {
    /// Load from a `.yaml`/`.yml` or `.json` file. A missing file yields the
    /// defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config = match path.extension().and_then(|s| s.to_str()) {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)?,
            Some("json") => serde_json::from_str(&content)?,
            extension => bail!("Unsupported config extension: {:?}", extension),
        };
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = match path.extension().and_then(|s| s.to_str()) {
            Some("yaml") | Some("yml") => serde_yaml::to_string(self)?,
            Some("json") => serde_json::to_string_pretty(self)?,
            extension => bail!("Unsupported config extension: {:?}", extension),
        };
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validation problems, empty when the config is usable as is.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if !self.canvas.in_range() {
            errors.push(format!("canvas width and height must be 1 to {MAX_DIMENSION}"));
        }
        if self.history_capacity == 0 {
            errors.push("history_capacity must be at least 1".to_string());
        }
        if !(self.export.scale.is_finite() && self.export.scale > 0.0) {
            errors.push("export scale must be positive".to_string());
        }
        if !(1..=100).contains(&self.export.quality) {
            errors.push("export quality must be between 1 and 100".to_string());
        }
        errors
    }

    /// Copy with invalid values replaced by their defaults.
    pub fn with_defaults_for_invalid(&self) -> Self {
        let defaults = Self::default();
        let mut config = self.clone();
        if !config.canvas.in_range() {
            config.canvas = defaults.canvas;
        }
        if config.history_capacity == 0 {
            config.history_capacity = defaults.history_capacity;
        }
        if !(config.export.scale.is_finite() && config.export.scale > 0.0) {
            config.export.scale = defaults.export.scale;
        }
        config.export.quality = config.export.quality.clamp(1, 100);
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::ExportFormat;

    #[test]
    fn test_defaults() {
        let config = EditorConfig::default();
        assert_eq!(config.canvas.width, 800);
        assert_eq!(config.canvas.height, 600);
        assert_eq!(config.canvas.background_color, Color::WHITE);
        assert_eq!(config.history_capacity, 50);
        assert_eq!(config.export.format, ExportFormat::Png);
        assert_eq!(config.export.quality, 92);
        assert_eq!(config.export.scale, 1.0);
        assert!(config.autosave.enabled);
        assert_eq!(config.autosave.interval(), Duration::from_secs(30));
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pixelstack.yaml");
        std::fs::write(
            &path,
            "history_capacity: 10\ncanvas:\n  width: 1024\nexport:\n  format: jpeg\n",
        )
        .unwrap();

        let config = EditorConfig::load(&path).unwrap();
        assert_eq!(config.history_capacity, 10);
        assert_eq!(config.canvas.width, 1024);
        assert_eq!(config.canvas.height, 600);
        assert_eq!(config.export.format, ExportFormat::Jpg);
        assert_eq!(config.export.quality, 92);
        assert_eq!(config.autosave, AutosaveConfig::default());
    }

    #[test]
    fn test_json_save_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pixelstack.json");
        let mut config = EditorConfig::default();
        config.autosave.enabled = false;
        config.canvas.background_color = Color::BLACK;
        config.save(&path).unwrap();
        assert_eq!(EditorConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = EditorConfig::load(&dir.path().join("absent.yaml")).unwrap();
        assert_eq!(config, EditorConfig::default());
    }

    #[test]
    fn test_invalid_values_replaced() {
        let mut config = EditorConfig::default();
        config.history_capacity = 0;
        config.export.scale = -1.0;
        config.export.quality = 0;
        config.canvas.width = MAX_DIMENSION * 2;
        assert_eq!(config.validate().len(), 4);

        let fixed = config.with_defaults_for_invalid();
        assert!(fixed.validate().is_empty());
        assert_eq!(fixed.history_capacity, 50);
        assert_eq!(fixed.export.quality, 1);
        assert_eq!(fixed.canvas.width, 800);
    }
}

// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Project data serialization and deserialization.
//!
//! This module handles saving and loading projects in YAML and JSON
//! formats, chosen by file extension.

use crate::models::Project;
use anyhow::{bail, Context, Result};
use std::path::Path;

/// On-disk project format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectFormat {
    Yaml,
    Json,
}

impl ProjectFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|s| s.to_str()) {
            Some("yaml") | Some("yml") => Ok(Self::Yaml),
            Some("json") => Ok(Self::Json),
            extension => bail!("Unsupported file extension: {:?}", extension),
        }
    }

    pub fn encode(self, project: &Project) -> Result<String> {
        Ok(match self {
            Self::Yaml => serde_yaml::to_string(project)?,
            Self::Json => serde_json::to_string_pretty(project)?,
        })
    }

    pub fn decode(self, text: &str) -> Result<Project> {
        Ok(match self {
            Self::Yaml => serde_yaml::from_str(text)?,
            Self::Json => serde_json::from_str(text)?,
        })
    }
}

/// Save a project, picking the format from the extension.
pub fn save_project(project: &Project, path: &Path) -> Result<()> {
    let text = ProjectFormat::from_path(path)?.encode(project)?;
    std::fs::write(path, text).with_context(|| format!("Failed to write {}", path.display()))?;
    log::debug!("Saved project '{}' to {}", project.name, path.display());
    Ok(())
}

/// Load a project, picking the format from the extension.
pub fn load_project(path: &Path) -> Result<Project> {
    let format = ProjectFormat::from_path(path)?;
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    format
        .decode(&text)
        .with_context(|| format!("Invalid project file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::layer::{ImageUpdate, FilterUpdate, ShapeType};
    use crate::models::{Canvas, Color, Layer, LayerUpdate, PayloadUpdate, Point};

    fn sample() -> Project {
        let mut project = Project::new(
            "sample",
            Canvas {
                width: 640,
                height: 480,
                background_color: Color::rgb(0xee, 0xee, 0xee),
            },
        );
        let mut image = Layer::image("img", "photo.png").with_position(12.0, 34.5);
        image.apply_update(LayerUpdate::payload(PayloadUpdate::Image(ImageUpdate {
            filters: Some(FilterUpdate {
                brightness: Some(15.0),
                sepia: Some(true),
                ..Default::default()
            }),
            ..Default::default()
        })));
        project.layers.push(image);
        project.layers.push(Layer::text("txt", "Hello"));
        project.layers.push(Layer::shape("arrow", ShapeType::Arrow));
        let mut drawing = Layer::drawing("pen", Color::BLACK, 4.0);
        if let crate::models::LayerKind::Drawing(d) = &mut drawing.kind {
            d.points = vec![Point::new(0.0, 0.0), Point::new(3.0, 4.0)];
        }
        project.layers.push(drawing);
        project
            .layers
            .push(Layer::sticker("st", "s-1", "stickers/star.png", "shapes", "Star"));
        project
    }

    #[test]
    fn test_json_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("project.json");
        let project = sample();
        save_project(&project, &path).unwrap();
        assert_eq!(load_project(&path).unwrap(), project);
    }

    #[test]
    fn test_yaml_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("project.yml");
        let project = sample();
        save_project(&project, &path).unwrap();
        assert_eq!(load_project(&path).unwrap(), project);
    }

    #[test]
    fn test_json_uses_camel_case() {
        let json = serde_json::to_value(sample()).unwrap();
        assert!(json.get("createdAt").is_some());
        assert_eq!(json["canvas"]["backgroundColor"], "#eeeeee");
        assert_eq!(json["layers"][0]["filters"]["brightness"], 15.0);
        assert_eq!(json["layers"][1]["fontFamily"], "Arial");
    }

    #[test]
    fn test_sticker_project_reloads_in_both_formats() {
        let mut project = Project::new("stickers", Canvas::default());
        project
            .layers
            .push(Layer::sticker("st", "s-9", "stickers/heart.png", "love", "Heart"));
        for format in [ProjectFormat::Json, ProjectFormat::Yaml] {
            let text = format.encode(&project).unwrap();
            assert_eq!(format.decode(&text).unwrap(), project);
        }
    }

    #[test]
    fn test_load_error_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        let message = format!("{:#}", load_project(&path).unwrap_err());
        assert!(message.contains("broken.json"));
    }

    #[test]
    fn test_unknown_extension_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("project.txt");
        assert!(save_project(&sample(), &path).is_err());
        assert!(load_project(&path).is_err());
    }
}

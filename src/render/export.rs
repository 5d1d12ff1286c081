// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Raster export of the composited surface.
//!
//! The output size is either an explicit width/height or the canvas size
//! multiplied by `scale`. Aspect ratio is not enforced when both explicit
//! dimensions are given.

use super::backend::{RenderBackend, MAX_DIMENSION};
use crate::error::{EditorError, Result};
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageError, RgbaImage};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Png,
    #[serde(alias = "jpeg")]
    Jpg,
    Webp,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpg => "jpg",
            Self::Webp => "webp",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpg => "image/jpeg",
            Self::Webp => "image/webp",
        }
    }

    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpg),
            "webp" => Some(Self::Webp),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub format: ExportFormat,
    /// 1 to 100; ignored for PNG and WebP.
    pub quality: u8,
    pub scale: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            format: ExportFormat::Png,
            quality: 92,
            scale: 1.0,
            width: None,
            height: None,
        }
    }
}

impl ExportConfig {
    pub fn with_format(format: ExportFormat) -> Self {
        Self {
            format,
            ..Default::default()
        }
    }

    /// Resolve the output pixel size for a canvas of the given size.
    ///
    /// A single explicit dimension derives its partner from the canvas
    /// aspect ratio.
    pub fn output_size(&self, canvas_width: u32, canvas_height: u32) -> Result<(u32, u32)> {
        if self.width == Some(0) || self.height == Some(0) {
            return Err(EditorError::InvalidExportConfig(
                "custom size must be positive".into(),
            ));
        }
        let aspect = canvas_width as f64 / canvas_height.max(1) as f64;
        let (width, height) = match (self.width, self.height) {
            (Some(w), Some(h)) => (w, h),
            (Some(w), None) => (w, scaled_dimension(w, 1.0 / aspect)),
            (None, Some(h)) => (scaled_dimension(h, aspect), h),
            (None, None) => {
                if !(self.scale.is_finite() && self.scale > 0.0) {
                    return Err(EditorError::InvalidExportConfig(format!(
                        "scale must be positive, got {}",
                        self.scale
                    )));
                }
                (
                    scaled_dimension(canvas_width, self.scale),
                    scaled_dimension(canvas_height, self.scale),
                )
            }
        };
        if width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(EditorError::InvalidExportConfig(format!(
                "output {}x{} exceeds the {}px limit per side",
                width, height, MAX_DIMENSION
            )));
        }
        Ok((width, height))
    }
}

/// An encoded raster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub format: ExportFormat,
    pub width: u32,
    pub height: u32,
    pub bytes: Vec<u8>,
}

impl EncodedImage {
    pub fn to_data_uri(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.format.mime_type(),
            base64::engine::general_purpose::STANDARD.encode(&self.bytes)
        )
    }
}

fn scaled_dimension(size: u32, scale: f64) -> u32 {
    ((size as f64 * scale).round() as u32).max(1)
}

/// Encode an RGBA raster. JPEG drops the alpha channel.
pub fn encode(
    raster: &RgbaImage,
    format: ExportFormat,
    quality: u8,
) -> std::result::Result<Vec<u8>, ImageError> {
    let (width, height) = raster.dimensions();
    let mut bytes = Vec::new();
    match format {
        ExportFormat::Png => PngEncoder::new(&mut bytes).write_image(
            raster.as_raw(),
            width,
            height,
            ExtendedColorType::Rgba8,
        )?,
        ExportFormat::Jpg => {
            let rgb = DynamicImage::ImageRgba8(raster.clone()).to_rgb8();
            JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100)).write_image(
                rgb.as_raw(),
                width,
                height,
                ExtendedColorType::Rgb8,
            )?
        }
        ExportFormat::Webp => WebPEncoder::new_lossless(&mut bytes).write_image(
            raster.as_raw(),
            width,
            height,
            ExtendedColorType::Rgba8,
        )?,
    }
    Ok(bytes)
}

/// Rasterize and encode the backend's current surface.
pub fn export<B: RenderBackend + ?Sized>(backend: &B, config: &ExportConfig) -> Result<EncodedImage> {
    let (canvas_width, canvas_height) = backend
        .surface_size()
        .ok_or_else(|| EditorError::ExportFailed("no active rendering surface".into()))?;
    let (width, height) = config.output_size(canvas_width, canvas_height)?;

    let raster = backend
        .rasterize(width, height)
        .map_err(|e| EditorError::ExportFailed(e.to_string()))?;
    let bytes = encode(&raster, config.format, config.quality.clamp(1, 100))
        .map_err(|e| EditorError::ExportFailed(e.to_string()))?;

    log::info!(
        "Exported {}x{} {} ({} bytes)",
        width,
        height,
        config.format.extension(),
        bytes.len()
    );
    Ok(EncodedImage {
        format: config.format,
        width,
        height,
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_size_from_scale() {
        let config = ExportConfig {
            scale: 2.0,
            ..Default::default()
        };
        assert_eq!(config.output_size(800, 600).unwrap(), (1600, 1200));
    }

    #[test]
    fn test_custom_size_overrides_scale() {
        let config = ExportConfig {
            scale: 3.0,
            width: Some(100),
            height: Some(100),
            ..Default::default()
        };
        assert_eq!(config.output_size(800, 600).unwrap(), (100, 100));
    }

    #[test]
    fn test_single_dimension_keeps_aspect() {
        let config = ExportConfig {
            width: Some(400),
            ..Default::default()
        };
        assert_eq!(config.output_size(800, 600).unwrap(), (400, 300));
    }

    #[test]
    fn test_invalid_config() {
        let bad_scale = ExportConfig {
            scale: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            bad_scale.output_size(10, 10),
            Err(EditorError::InvalidExportConfig(_))
        ));
        let zero = ExportConfig {
            height: Some(0),
            ..Default::default()
        };
        assert!(zero.output_size(10, 10).is_err());
    }

    #[test]
    fn test_output_size_is_bounded() {
        let huge_scale = ExportConfig {
            scale: 1e6,
            ..Default::default()
        };
        assert!(matches!(
            huge_scale.output_size(800, 600),
            Err(EditorError::InvalidExportConfig(_))
        ));
        let wide = ExportConfig {
            width: Some(u32::MAX),
            ..Default::default()
        };
        assert!(wide.output_size(800, 600).is_err());
        let at_limit = ExportConfig {
            width: Some(MAX_DIMENSION),
            height: Some(1),
            ..Default::default()
        };
        assert_eq!(at_limit.output_size(800, 600).unwrap(), (MAX_DIMENSION, 1));
    }

    #[test]
    fn test_encode_formats_decode_back() {
        let raster = RgbaImage::from_pixel(6, 4, image::Rgba([200, 10, 10, 255]));
        for format in [ExportFormat::Png, ExportFormat::Jpg, ExportFormat::Webp] {
            let bytes = encode(&raster, format, 80).unwrap();
            let decoded = image::load_from_memory(&bytes).unwrap();
            assert_eq!((decoded.width(), decoded.height()), (6, 4), "{format:?}");
        }
    }

    #[test]
    fn test_data_uri_prefix() {
        let encoded = EncodedImage {
            format: ExportFormat::Jpg,
            width: 1,
            height: 1,
            bytes: vec![1, 2, 3],
        };
        assert_eq!(encoded.to_data_uri(), "data:image/jpeg;base64,AQID");
    }
}

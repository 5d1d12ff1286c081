// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Media loading for layer sources.
//!
//! A layer source is either a filesystem path or a `data:` URI with a
//! base64 payload. Both decode into RGBA pixels.

use anyhow::{bail, Context, Result};
use base64::Engine;
use image::DynamicImage;
use std::path::Path;

/// A decoded image ready for display.
pub struct LoadedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// Load an image file as RGBA pixels.
pub fn load_image(path: &Path) -> Result<LoadedImage> {
    let img = image::open(path).with_context(|| format!("opening {}", path.display()))?;
    let rgba = img.to_rgba8();
    Ok(LoadedImage {
        width: rgba.width(),
        height: rgba.height(),
        pixels: rgba.into_raw(),
    })
}

/// Decode a layer source reference.
pub fn decode_source(src: &str) -> Result<DynamicImage> {
    if let Some(rest) = src.strip_prefix("data:") {
        let (header, payload) = rest
            .split_once(',')
            .context("data URI has no payload separator")?;
        if !header.ends_with(";base64") {
            bail!("only base64 data URIs are supported");
        }
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(payload.trim())
            .context("invalid base64 payload")?;
        return image::load_from_memory(&bytes).context("decoding data URI image");
    }

    image::open(src).with_context(|| format!("opening {src}"))
}

/// Build a PNG data URI for an RGBA image.
pub fn png_data_uri(image: &image::RgbaImage) -> Result<String> {
    let bytes = crate::render::export::encode(image, crate::render::ExportFormat::Png, 100)?;
    Ok(format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(bytes)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn test_data_uri_roundtrip() {
        let img = RgbaImage::from_pixel(3, 2, Rgba([1, 2, 3, 255]));
        let uri = png_data_uri(&img).unwrap();
        let decoded = decode_source(&uri).unwrap().to_rgba8();
        assert_eq!(decoded, img);
    }

    #[test]
    fn test_bad_sources_fail() {
        assert!(decode_source("data:image/png,rawbytes").is_err());
        assert!(decode_source("data:image/png;base64,!!!").is_err());
        assert!(decode_source("/definitely/not/here.png").is_err());
    }

    #[test]
    fn test_load_image_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pixel.png");
        RgbaImage::from_pixel(4, 5, Rgba([9, 9, 9, 255]))
            .save(&path)
            .unwrap();
        let loaded = load_image(&path).unwrap();
        assert_eq!((loaded.width, loaded.height), (4, 5));
        assert_eq!(loaded.pixels.len(), 4 * 5 * 4);
    }
}

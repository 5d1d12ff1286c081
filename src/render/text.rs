// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Text shaping and glyph rasterization.
//!
//! Fonts come from the set bundled with egui, so a project renders the same
//! on every machine. A layer asking for a family that is not bundled falls
//! back to the proportional default.

use crate::models::layer::{FontStyle, FontWeight, TextAlign, TextPayload};
use crate::models::Point;
use cosmic_text::fontdb::{self, Family, Query, Stretch};
use cosmic_text::{
    Attrs, Buffer, Color as GlyphColor, FontSystem, Metrics, Shaping, Style, SwashCache, Weight,
};
use tiny_skia::{ColorU8, Pixmap, PixmapPaint, Transform};

/// Line height as a multiple of the font size.
const LINE_SPACING: f32 = 1.2;
/// Bundled font used when a layer's family is unavailable.
const DEFAULT_FONT: &str = "Ubuntu-Light";

/// Size of a laid out text block in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextExtent {
    pub width: f64,
    pub height: f64,
}

pub struct TextEngine {
    fonts: FontSystem,
    glyphs: SwashCache,
    fallback: String,
}

impl Default for TextEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TextEngine {
    pub fn new() -> Self {
        let mut definitions = egui::FontDefinitions::default().font_data;
        let mut db = fontdb::Database::new();

        if let Some(data) = definitions.remove(DEFAULT_FONT) {
            db.load_font_data(data.font.into_owned());
        }
        let fallback = db
            .faces()
            .next()
            .and_then(|face| face.families.first())
            .map(|(name, _)| name.clone())
            .unwrap_or_else(|| "sans-serif".to_string());
        for data in definitions.into_values() {
            db.load_font_data(data.font.into_owned());
        }
        db.set_sans_serif_family(fallback.clone());
        log::debug!("Loaded {} bundled font faces, default '{}'", db.len(), fallback);

        Self {
            fonts: FontSystem::new_with_locale_and_db("en-US".to_string(), db),
            glyphs: SwashCache::new(),
            fallback,
        }
    }

    /// Unscaled size of the text block.
    pub fn measure(&mut self, text: &TextPayload) -> TextExtent {
        let (buffer, line_height) = self.layout(text, 1.0);
        let (width, height) = block_size(&buffer, line_height);
        TextExtent {
            width: width as f64,
            height: height as f64,
        }
    }

    /// Draw `text` with its top-left corner at `position` (canvas pixels),
    /// scaled by `sx`/`sy` into `target`.
    pub fn draw(
        &mut self,
        target: &mut Pixmap,
        text: &TextPayload,
        position: Point,
        opacity: f32,
        sx: f32,
        sy: f32,
    ) {
        let (buffer, line_height) = self.layout(text, sy);
        let (block_width, block_height) = block_size(&buffer, line_height);
        let pad = (line_height / 2.0).ceil() as i32;
        let width = block_width.ceil() as u32 + 2 * pad as u32;
        let height = block_height.ceil() as u32 + 2 * pad as u32;
        let Some(mut block) = Pixmap::new(width.max(1), height.max(1)) else {
            log::warn!("Text block {}x{} could not be allocated", width, height);
            return;
        };

        let c = text.color;
        let color = GlyphColor::rgba(c.r, c.g, c.b, c.a);
        let font_size = line_height / LINE_SPACING;
        for run in buffer.layout_runs() {
            let shift = match text.text_align {
                TextAlign::Left | TextAlign::Justify => 0.0,
                TextAlign::Center => (block_width - run.line_w) / 2.0,
                TextAlign::Right => block_width - run.line_w,
            };
            let baseline = run.line_y as i32 + pad;
            for glyph in run.glyphs.iter() {
                let physical = glyph.physical((pad as f32 + shift, 0.0), 1.0);
                self.glyphs
                    .with_pixels(&mut self.fonts, physical.cache_key, color, |x, y, pixel| {
                        put_pixel(&mut block, physical.x + x, baseline + physical.y + y, pixel);
                    });
            }
            if text.underline {
                let top = baseline + (font_size * 0.12).round() as i32;
                let thickness = (font_size / 16.0).round().max(1.0) as i32;
                let left = pad + shift.round() as i32;
                for y in top..top + thickness {
                    for x in left..left + run.line_w.round() as i32 {
                        put_pixel(&mut block, x, y, color);
                    }
                }
            }
        }

        let x = (position.x as f32 * sx).round() as i32 - pad;
        let y = (position.y as f32 * sy).round() as i32 - pad;
        let paint = PixmapPaint {
            opacity,
            ..PixmapPaint::default()
        };
        target.draw_pixmap(x, y, block.as_ref(), &paint, Transform::identity(), None);
    }

    fn layout(&mut self, text: &TextPayload, scale: f32) -> (Buffer, f32) {
        let font_size = (text.font_size as f32 * scale).max(1.0);
        let line_height = font_size * LINE_SPACING;
        let (family, weight, style) = self.resolve_face(text);

        let mut buffer = Buffer::new(&mut self.fonts, Metrics::new(font_size, line_height));
        buffer.set_size(&mut self.fonts, None, None);
        let attrs = Attrs::new()
            .family(Family::Name(&family))
            .weight(weight)
            .style(style);
        buffer.set_text(&mut self.fonts, &text.content, &attrs, Shaping::Advanced, None);
        buffer.shape_until_scroll(&mut self.fonts, false);
        (buffer, line_height)
    }

    /// Closest loaded face to the layer's family, weight and style.
    fn resolve_face(&self, text: &TextPayload) -> (String, Weight, Style) {
        let weight = match text.font_weight {
            FontWeight::Normal => Weight::NORMAL,
            FontWeight::Bold => Weight::BOLD,
        };
        let style = match text.font_style {
            FontStyle::Normal => Style::Normal,
            FontStyle::Italic => Style::Italic,
        };
        let families = [Family::Name(&text.font_family), Family::Name(&self.fallback)];
        let db = self.fonts.db();
        db.query(&Query {
            families: &families,
            weight,
            stretch: Stretch::Normal,
            style,
        })
        .and_then(|id| db.face(id))
        .and_then(|face| {
            face.families
                .first()
                .map(|(name, _)| (name.clone(), face.weight, face.style))
        })
        .unwrap_or_else(|| (self.fallback.clone(), weight, style))
    }
}

fn block_size(buffer: &Buffer, line_height: f32) -> (f32, f32) {
    let mut width: f32 = 0.0;
    let mut lines = 0usize;
    for run in buffer.layout_runs() {
        width = width.max(run.line_w);
        lines += 1;
    }
    (width, lines.max(1) as f32 * line_height)
}

/// Write a glyph coverage sample, keeping the stronger one where glyphs
/// overlap.
fn put_pixel(block: &mut Pixmap, x: i32, y: i32, color: GlyphColor) {
    let (width, height) = (block.width() as i32, block.height() as i32);
    if x < 0 || y < 0 || x >= width || y >= height || color.a() == 0 {
        return;
    }
    let pixel = ColorU8::from_rgba(color.r(), color.g(), color.b(), color.a()).premultiply();
    if let Some(slot) = block.pixels_mut().get_mut((y * width + x) as usize) {
        if pixel.alpha() > slot.alpha() {
            *slot = pixel;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Layer;
    use crate::models::LayerKind;

    fn payload(content: &str, size: f64) -> TextPayload {
        let LayerKind::Text(mut text) = Layer::text("t", content).kind else {
            panic!("expected text payload");
        };
        text.font_size = size;
        text
    }

    #[test]
    fn test_measure_grows_with_content_and_lines() {
        let mut engine = TextEngine::new();
        let short = engine.measure(&payload("Hi", 20.0));
        let long = engine.measure(&payload("Hello there", 20.0));
        let two_lines = engine.measure(&payload("Hi\nHi", 20.0));

        assert!(short.width > 0.0);
        assert!(long.width > short.width);
        assert!((short.height - 24.0).abs() < 0.01);
        assert!((two_lines.height - 48.0).abs() < 0.01);
    }

    #[test]
    fn test_unknown_family_falls_back() {
        let engine = TextEngine::new();
        let mut text = payload("x", 12.0);
        text.font_family = "No Such Family".into();
        let (family, _, _) = engine.resolve_face(&text);
        assert_eq!(family, engine.fallback);
    }

    #[test]
    fn test_draw_marks_pixels_near_position() {
        let mut engine = TextEngine::new();
        let mut target = Pixmap::new(200, 60).unwrap();
        engine.draw(&mut target, &payload("Hello", 32.0), Point::new(10.0, 5.0), 1.0, 1.0, 1.0);

        let inked: Vec<(u32, u32)> = (0..60)
            .flat_map(|y| (0..200).map(move |x| (x, y)))
            .filter(|&(x, y)| target.pixel(x, y).is_some_and(|p| p.alpha() > 0))
            .collect();
        assert!(!inked.is_empty());
        assert!(inked.iter().all(|&(x, y)| x >= 8 && y >= 3));
    }
}

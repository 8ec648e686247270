// SPDX-License-Identifier: GPL-3.0-only

//! Caption text rasterization with system fonts

use super::draw::blend_pixel;
use crate::color::Rgb;
use crate::constants::text;
use crate::pipelines::composition::CaptionLine;
use cosmic_text::{Attrs, Buffer, Color, Family, FontSystem, Metrics, Shaping, SwashCache};
use image::RgbaImage;
use tracing::{debug, warn};

/// Shapes and draws caption lines
///
/// Font discovery is slow, so one painter is kept per renderer.
pub struct TextPainter {
    font_system: FontSystem,
    swash_cache: SwashCache,
}

impl std::fmt::Debug for TextPainter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextPainter")
            .field("faces", &self.font_system.db().faces().count())
            .finish()
    }
}

impl TextPainter {
    /// Load system fonts; `None` when the system has none
    pub fn new() -> Option<Self> {
        let font_system = FontSystem::new();
        let faces = font_system.db().faces().count();
        if faces == 0 {
            warn!("No system fonts found, captions will not be drawn");
            return None;
        }
        debug!(faces, "Loaded system fonts");
        Some(Self {
            font_system,
            swash_cache: SwashCache::new(),
        })
    }

    /// Draw `line` centered in its box, scaled to device pixels
    pub fn draw_line(&mut self, canvas: &mut RgbaImage, line: &CaptionLine, color: Rgb, scale: f32) {
        let font_size = line.font_size * scale;
        let line_height = font_size * text::LINE_HEIGHT;
        let rect = line.rect.scale(scale);

        let mut buffer = Buffer::new(&mut self.font_system, Metrics::new(font_size, line_height));
        buffer.set_size(&mut self.font_system, Some(rect.width), None);
        let attrs = Attrs::new().family(Family::SansSerif);
        buffer.set_text(
            &mut self.font_system,
            &line.text,
            &attrs,
            Shaping::Advanced,
            None,
        );
        buffer.shape_until_scroll(&mut self.font_system, false);

        let text_width = buffer
            .layout_runs()
            .flat_map(|run| run.glyphs.iter().map(|g| g.x + g.w))
            .fold(0.0f32, f32::max);
        let offset_x = (rect.x + (rect.width - text_width) / 2.0).round() as i32;
        let offset_y = rect.y.round() as i32;

        let alpha = (line.opacity.clamp(0.0, 1.0) * 255.0).round() as u8;
        let base = Color::rgba(color.r, color.g, color.b, alpha);
        let (width, height) = (canvas.width() as i32, canvas.height() as i32);

        buffer.draw(
            &mut self.font_system,
            &mut self.swash_cache,
            base,
            |x, y, w, h, color| {
                let coverage = color.a() as f32 / 255.0;
                if coverage <= 0.0 {
                    return;
                }
                let rgb = [color.r() as f32, color.g() as f32, color.b() as f32];
                for dy in 0..h as i32 {
                    for dx in 0..w as i32 {
                        let px = offset_x + x + dx;
                        let py = offset_y + y + dy;
                        if px < 0 || py < 0 || px >= width || py >= height {
                            continue;
                        }
                        blend_pixel(canvas, px as u32, py as u32, rgb, coverage);
                    }
                }
            },
        );
    }
}

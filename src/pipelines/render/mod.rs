// SPDX-License-Identifier: GPL-3.0-only

//! Composite renderer
//!
//! Flattens a [`CompositionDescription`] into one raster at a fixed
//! supersampling factor:
//!
//! 1. Panel background in the frame color
//! 2. Slot photos, mirrored once, cover-fitted with rounded corners
//! 3. Frame decorations
//! 4. Caption lines
//!
//! The raster is then encoded by [`export::encode`].

pub mod draw;
pub mod export;
pub mod text;

pub use export::{ExportFormat, ExportedArtifact, suggested_filename};
pub use text::TextPainter;

use crate::config::Config;
use crate::constants::{encoding, export as export_consts};
use crate::errors::RenderError;
use crate::pipelines::composition::{ComposedSlot, CompositionDescription};
use image::{RgbaImage, imageops};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Renderer settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Device pixels per logical pixel
    pub supersample: u32,
    /// Largest surface that will be allocated
    pub max_canvas_pixels: u64,
    /// JPEG quality for lossy exports
    pub jpeg_quality: u8,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            supersample: export_consts::DEFAULT_SUPERSAMPLE,
            max_canvas_pixels: export_consts::MAX_CANVAS_PIXELS,
            jpeg_quality: encoding::EXPORT_JPEG_QUALITY,
        }
    }
}

impl From<&Config> for RenderOptions {
    fn from(config: &Config) -> Self {
        Self {
            supersample: config.supersample.max(export_consts::MIN_SUPERSAMPLE),
            max_canvas_pixels: config.max_canvas_pixels,
            jpeg_quality: config.export_jpeg_quality,
        }
    }
}

/// Flattened composite
#[derive(Debug, Clone)]
pub struct RenderedComposite {
    pub pixels: RgbaImage,
    pub layout_id: &'static str,
    pub supersample: u32,
}

impl RenderedComposite {
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Encode in `format`
    pub fn encode(&self, format: ExportFormat, jpeg_quality: u8) -> Result<Vec<u8>, RenderError> {
        export::encode(&self.pixels, format, jpeg_quality)
    }
}

pub struct Renderer {
    options: RenderOptions,
    text: Option<TextPainter>,
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("options", &self.options)
            .field("text", &self.text.is_some())
            .finish()
    }
}

impl Renderer {
    /// Renderer with system fonts for captions
    pub fn new(options: RenderOptions) -> Self {
        Self {
            options,
            text: TextPainter::new(),
        }
    }

    /// Renderer that skips caption text
    pub fn without_text(options: RenderOptions) -> Self {
        Self {
            options,
            text: None,
        }
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Rasterize `description`
    pub fn render(
        &mut self,
        description: &CompositionDescription,
    ) -> Result<RenderedComposite, RenderError> {
        let started = Instant::now();
        let scale = self.options.supersample.max(1) as f32;
        let (width, height) = self.canvas_size(description)?;

        let mut canvas = RgbaImage::from_pixel(width, height, description.background.to_rgba(255));

        for slot in &description.slots {
            draw_slot(&mut canvas, slot, scale)?;
        }

        for placed in &description.decorations {
            draw::draw_shape(
                &mut canvas,
                &placed.decoration.shape,
                &placed.rect.scale(scale),
                placed.decoration.opacity,
                scale,
            );
        }

        let caption = &description.caption;
        match self.text.as_mut() {
            Some(painter) => {
                for line in caption.lines() {
                    painter.draw_line(&mut canvas, line, caption.color, scale);
                }
            }
            None if caption.lines().next().is_some() => {
                warn!("Caption skipped, no fonts available");
            }
            None => {}
        }

        info!(
            layout = description.layout_id,
            width,
            height,
            slots = description.slots.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Composite rendered"
        );

        Ok(RenderedComposite {
            pixels: canvas,
            layout_id: description.layout_id,
            supersample: self.options.supersample,
        })
    }

    /// Render and encode in one step
    pub fn export(
        &mut self,
        description: &CompositionDescription,
        format: ExportFormat,
        app_tag: &str,
        unix_millis: i64,
    ) -> Result<ExportedArtifact, RenderError> {
        let composite = self.render(description)?;
        let bytes = composite.encode(format, self.options.jpeg_quality)?;
        Ok(ExportedArtifact {
            bytes,
            format,
            width: composite.width(),
            height: composite.height(),
            filename: suggested_filename(app_tag, description.layout_id, unix_millis, format),
        })
    }

    fn canvas_size(&self, description: &CompositionDescription) -> Result<(u32, u32), RenderError> {
        let scale = self.options.supersample.max(1) as f32;
        let width = (description.width * scale).round();
        let height = (description.height * scale).round();
        if !(width >= 1.0 && height >= 1.0) {
            return Err(RenderError::RenderTargetUnavailable(format!(
                "empty surface {}x{}",
                width, height
            )));
        }
        let pixels = (width as u64).saturating_mul(height as u64);
        if width > u32::MAX as f32 || height > u32::MAX as f32 || pixels > self.options.max_canvas_pixels
        {
            return Err(RenderError::RenderTargetUnavailable(format!(
                "surface {}x{} exceeds {} pixels",
                width, height, self.options.max_canvas_pixels
            )));
        }
        Ok((width as u32, height as u32))
    }
}

/// Decode, mirror and cover-fit one slot photo, then mask it into place
fn draw_slot(canvas: &mut RgbaImage, slot: &ComposedSlot, scale: f32) -> Result<(), RenderError> {
    let rect = slot.rect.scale(scale);
    let x = rect.x.round().max(0.0) as u32;
    let y = rect.y.round().max(0.0) as u32;
    let width = (rect.right().round() as u32).saturating_sub(x);
    let height = (rect.bottom().round() as u32).saturating_sub(y);
    if width == 0 || height == 0 {
        return Ok(());
    }

    let photo = slot.image.decode()?.to_rgba8();
    // Captures are stored unmirrored; the composite shows them as previewed
    let photo = imageops::flip_horizontal(&photo);
    let fitted = cover(&photo, width, height);
    debug!(
        slot = slot.slot,
        photo_index = slot.photo_index,
        width,
        height,
        "Drawing slot"
    );
    draw::blit_rounded(canvas, &fitted, x, y, slot.corner_radius * scale);
    Ok(())
}

/// Scale to fill `width` x `height`, cropping the overflow evenly
fn cover(image: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    let (iw, ih) = (image.width().max(1) as f32, image.height().max(1) as f32);
    let factor = (width as f32 / iw).max(height as f32 / ih);
    let sw = ((iw * factor).ceil() as u32).max(width);
    let sh = ((ih * factor).ceil() as u32).max(height);
    let resized = imageops::resize(image, sw, sh, imageops::FilterType::Triangle);
    let (cx, cy) = ((sw - width) / 2, (sh - height) / 2);
    imageops::crop_imm(&resized, cx, cy, width, height).to_image()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipelines::composition::{Customization, compose};
    use crate::pipelines::photo::{EncodedImage, Photo, PhotoEncoder};
    use image::Rgba;

    fn split_photo(index: usize) -> Photo {
        // Left half red, right half blue
        let pixels = RgbaImage::from_fn(40, 30, |x, _| {
            if x < 20 {
                Rgba([255, 0, 0, 255])
            } else {
                Rgba([0, 0, 255, 255])
            }
        });
        Photo {
            index,
            image: PhotoEncoder::png().encode(&pixels).unwrap(),
        }
    }

    fn renderer() -> Renderer {
        Renderer::without_text(RenderOptions::default())
    }

    #[test]
    fn test_canvas_is_supersampled() {
        let description = compose(&[], &Customization::default()).unwrap();
        let composite = renderer().render(&description).unwrap();
        assert_eq!(composite.width(), (description.width * 2.0).round() as u32);
        assert_eq!(composite.height(), (description.height * 2.0).round() as u32);
        assert_eq!(composite.pixels.get_pixel(0, 0).0, [255, 255, 255, 255]);
    }

    #[test]
    fn test_slots_are_mirrored() {
        let customization = Customization {
            layout_id: "single".into(),
            ..Customization::default()
        };
        let description = compose(&[split_photo(0)], &customization).unwrap();
        let rect = description.slots[0].rect.scale(2.0);
        let composite = renderer().render(&description).unwrap();

        let (cx, cy) = rect.center();
        let left = composite.pixels.get_pixel((rect.x + 8.0) as u32, cy as u32).0;
        let right = composite.pixels.get_pixel((rect.right() - 8.0) as u32, cy as u32).0;
        assert!(left[2] > 200 && left[0] < 50, "left {left:?}");
        assert!(right[0] > 200 && right[2] < 50, "right {right:?}");
        assert!(cx > rect.x);
    }

    #[test]
    fn test_oversized_canvas_is_rejected() {
        let description = compose(&[], &Customization::default()).unwrap();
        let mut renderer = Renderer::without_text(RenderOptions {
            max_canvas_pixels: 100,
            ..RenderOptions::default()
        });
        assert!(matches!(
            renderer.render(&description),
            Err(RenderError::RenderTargetUnavailable(_))
        ));
    }

    #[test]
    fn test_zero_canvas_is_rejected() {
        let mut description = compose(&[], &Customization::default()).unwrap();
        description.width = 0.0;
        assert!(matches!(
            renderer().render(&description),
            Err(RenderError::RenderTargetUnavailable(_))
        ));
    }

    #[test]
    fn test_undecodable_slot_fails() {
        let mut description = compose(&[split_photo(0)], &Customization::default()).unwrap();
        let bytes: Vec<u8> = vec![0x89, b'P', b'N', b'G', 0, 0, 0, 0];
        description.slots[0].image = EncodedImage {
            data: bytes.into(),
            ..description.slots[0].image.clone()
        };
        assert!(matches!(
            renderer().render(&description),
            Err(RenderError::Decode(_))
        ));
    }

    #[test]
    fn test_cover_fills_target() {
        let wide = RgbaImage::from_pixel(100, 20, Rgba([1, 2, 3, 255]));
        let fitted = cover(&wide, 30, 30);
        assert_eq!(fitted.dimensions(), (30, 30));
    }
}

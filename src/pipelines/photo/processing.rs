// SPDX-License-Identifier: GPL-3.0-only

//! Filter engine
//!
//! Runs a catalog filter over an encoded photo. Pixels are processed as
//! sRGB floats (0.0 - 1.0) using the CSS filter-function matrices, with
//! clamping after every operation. Alpha is carried through untouched.
//!
//! Filtering never fails: unknown filter ids behave as identity and
//! undecodable input is returned as-is.

use super::encoding::{EncodedImage, PhotoEncoder};
use crate::catalog::{Filter, FilterCatalog, PixelOp};
use crate::constants::encoding::CAPTURE_JPEG_QUALITY;
use image::{DynamicImage, Rgba32FImage};
use tracing::{debug, warn};

/// 3x3 color matrix applied to (r, g, b)
type ColorMatrix = [[f32; 3]; 3];

/// Applies catalog filters to encoded photos
#[derive(Debug, Clone, Copy)]
pub struct FilterEngine {
    jpeg_quality: u8,
}

impl Default for FilterEngine {
    fn default() -> Self {
        Self::new(CAPTURE_JPEG_QUALITY)
    }
}

impl FilterEngine {
    /// Engine re-encoding JPEG output at `jpeg_quality`
    pub fn new(jpeg_quality: u8) -> Self {
        Self { jpeg_quality }
    }

    /// Apply the filter named `filter_id`
    pub fn apply(&self, image: &EncodedImage, filter_id: &str) -> EncodedImage {
        let filter = match FilterCatalog::get(filter_id) {
            Some(filter) => filter,
            None => {
                debug!(filter_id, "Filter not found, using identity");
                FilterCatalog::identity()
            }
        };
        self.apply_filter(image, filter)
    }

    /// Apply a resolved filter
    pub fn apply_filter(&self, image: &EncodedImage, filter: &Filter) -> EncodedImage {
        if filter.is_identity() {
            return image.clone();
        }

        let decoded = match image.decode() {
            Ok(decoded) => decoded,
            Err(e) => {
                warn!(error = %e, filter = filter.id, "Cannot decode photo, leaving it unfiltered");
                return image.clone();
            }
        };

        let mut pixels = decoded.to_rgba32f();
        apply_operations(&mut pixels, filter.operations);
        let rgba8 = DynamicImage::ImageRgba32F(pixels).to_rgba8();

        match PhotoEncoder::matching(image, self.jpeg_quality).encode(&rgba8) {
            Ok(encoded) => {
                debug!(
                    filter = filter.id,
                    width = encoded.width,
                    height = encoded.height,
                    "Filter applied"
                );
                encoded
            }
            Err(e) => {
                warn!(error = %e, filter = filter.id, "Cannot re-encode filtered photo");
                image.clone()
            }
        }
    }
}

/// Run a chain of pixel operations in order
pub fn apply_operations(pixels: &mut Rgba32FImage, operations: &[PixelOp]) {
    for op in operations {
        match *op {
            PixelOp::Identity => {}
            PixelOp::Glow { radius, strength } => apply_glow(pixels, radius, strength),
            PixelOp::Brightness(amount) => {
                map_rgb(pixels, |r, g, b| (r * amount, g * amount, b * amount))
            }
            PixelOp::Contrast(amount) => map_rgb(pixels, |r, g, b| {
                let c = |v: f32| (v - 0.5) * amount + 0.5;
                (c(r), c(g), c(b))
            }),
            PixelOp::Grayscale(amount) => apply_matrix(pixels, &grayscale_matrix(amount)),
            PixelOp::Sepia(amount) => apply_matrix(pixels, &sepia_matrix(amount)),
            PixelOp::Saturate(amount) => apply_matrix(pixels, &saturate_matrix(amount)),
            PixelOp::HueRotate(degrees) => apply_matrix(pixels, &hue_rotate_matrix(degrees)),
        }
    }
}

fn map_rgb(pixels: &mut Rgba32FImage, f: impl Fn(f32, f32, f32) -> (f32, f32, f32)) {
    for pixel in pixels.pixels_mut() {
        let (r, g, b) = f(pixel[0], pixel[1], pixel[2]);
        pixel[0] = r.clamp(0.0, 1.0);
        pixel[1] = g.clamp(0.0, 1.0);
        pixel[2] = b.clamp(0.0, 1.0);
    }
}

fn apply_matrix(pixels: &mut Rgba32FImage, m: &ColorMatrix) {
    map_rgb(pixels, |r, g, b| {
        (
            m[0][0] * r + m[0][1] * g + m[0][2] * b,
            m[1][0] * r + m[1][1] * g + m[1][2] * b,
            m[2][0] * r + m[2][1] * g + m[2][2] * b,
        )
    });
}

fn grayscale_matrix(amount: f32) -> ColorMatrix {
    let a = 1.0 - amount.clamp(0.0, 1.0);
    [
        [0.2126 + 0.7874 * a, 0.7152 - 0.7152 * a, 0.0722 - 0.0722 * a],
        [0.2126 - 0.2126 * a, 0.7152 + 0.2848 * a, 0.0722 - 0.0722 * a],
        [0.2126 - 0.2126 * a, 0.7152 - 0.7152 * a, 0.0722 + 0.9278 * a],
    ]
}

fn sepia_matrix(amount: f32) -> ColorMatrix {
    let a = 1.0 - amount.clamp(0.0, 1.0);
    [
        [0.393 + 0.607 * a, 0.769 - 0.769 * a, 0.189 - 0.189 * a],
        [0.349 - 0.349 * a, 0.686 + 0.314 * a, 0.168 - 0.168 * a],
        [0.272 - 0.272 * a, 0.534 - 0.534 * a, 0.131 + 0.869 * a],
    ]
}

fn saturate_matrix(s: f32) -> ColorMatrix {
    let s = s.max(0.0);
    [
        [0.213 + 0.787 * s, 0.715 - 0.715 * s, 0.072 - 0.072 * s],
        [0.213 - 0.213 * s, 0.715 + 0.285 * s, 0.072 - 0.072 * s],
        [0.213 - 0.213 * s, 0.715 - 0.715 * s, 0.072 + 0.928 * s],
    ]
}

fn hue_rotate_matrix(degrees: f32) -> ColorMatrix {
    let (sin, cos) = degrees.to_radians().sin_cos();
    [
        [
            0.213 + cos * 0.787 - sin * 0.213,
            0.715 - cos * 0.715 - sin * 0.715,
            0.072 - cos * 0.072 + sin * 0.928,
        ],
        [
            0.213 - cos * 0.213 + sin * 0.143,
            0.715 + cos * 0.285 + sin * 0.140,
            0.072 - cos * 0.072 - sin * 0.283,
        ],
        [
            0.213 - cos * 0.213 - sin * 0.787,
            0.715 - cos * 0.715 + sin * 0.715,
            0.072 + cos * 0.928 + sin * 0.072,
        ],
    ]
}

/// Blur the bright parts of the image and screen them back on top
///
/// Only luminance above mid-gray contributes, so shadows stay crisp.
fn apply_glow(pixels: &mut Rgba32FImage, radius: f32, strength: f32) {
    let (width, height) = pixels.dimensions();
    if width == 0 || height == 0 {
        return;
    }
    let sigma = (radius * width.min(height) as f32).max(1.0);

    let mut highlights = pixels.clone();
    for pixel in highlights.pixels_mut() {
        let luma = 0.2126 * pixel[0] + 0.7152 * pixel[1] + 0.0722 * pixel[2];
        let weight = ((luma - 0.5) * 2.0).clamp(0.0, 1.0);
        pixel[0] *= weight;
        pixel[1] *= weight;
        pixel[2] *= weight;
    }
    let blurred = image::imageops::blur(&highlights, sigma);

    let strength = strength.clamp(0.0, 1.0);
    for (pixel, glow) in pixels.pixels_mut().zip(blurred.pixels()) {
        for c in 0..3 {
            let base = pixel[c];
            let screened = 1.0 - (1.0 - base) * (1.0 - glow[c]);
            pixel[c] = (base + (screened - base) * strength).clamp(0.0, 1.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn solid(r: f32, g: f32, b: f32) -> Rgba32FImage {
        Rgba32FImage::from_pixel(4, 4, Rgba([r, g, b, 1.0]))
    }

    #[test]
    fn test_grayscale_equalizes_channels() {
        let mut pixels = solid(0.9, 0.2, 0.4);
        apply_operations(&mut pixels, &[PixelOp::Grayscale(1.0)]);
        let p = pixels.get_pixel(0, 0);
        assert!((p[0] - p[1]).abs() < 1e-5);
        assert!((p[1] - p[2]).abs() < 1e-5);
    }

    #[test]
    fn test_zero_amounts_are_noops() {
        let mut pixels = solid(0.3, 0.6, 0.1);
        apply_operations(
            &mut pixels,
            &[
                PixelOp::Grayscale(0.0),
                PixelOp::Sepia(0.0),
                PixelOp::Saturate(1.0),
                PixelOp::HueRotate(0.0),
                PixelOp::Brightness(1.0),
                PixelOp::Contrast(1.0),
            ],
        );
        let p = pixels.get_pixel(0, 0);
        assert!((p[0] - 0.3).abs() < 1e-3);
        assert!((p[1] - 0.6).abs() < 1e-3);
        assert!((p[2] - 0.1).abs() < 1e-3);
    }

    #[test]
    fn test_brightness_clamps() {
        let mut pixels = solid(0.8, 0.8, 0.8);
        apply_operations(&mut pixels, &[PixelOp::Brightness(1.5)]);
        assert_eq!(pixels.get_pixel(0, 0)[0], 1.0);
    }

    #[test]
    fn test_alpha_is_preserved() {
        let mut pixels = Rgba32FImage::from_pixel(2, 2, Rgba([0.5, 0.5, 0.5, 0.25]));
        apply_operations(&mut pixels, &[PixelOp::Sepia(1.0), PixelOp::Contrast(2.0)]);
        assert_eq!(pixels.get_pixel(1, 1)[3], 0.25);
    }

    #[test]
    fn test_glow_brightens_highlights_only() {
        let mut dark = solid(0.1, 0.1, 0.1);
        apply_operations(
            &mut dark,
            &[PixelOp::Glow {
                radius: 0.1,
                strength: 1.0,
            }],
        );
        assert!((dark.get_pixel(0, 0)[0] - 0.1).abs() < 1e-4);

        let mut bright = solid(0.8, 0.8, 0.8);
        apply_operations(
            &mut bright,
            &[PixelOp::Glow {
                radius: 0.1,
                strength: 1.0,
            }],
        );
        assert!(bright.get_pixel(0, 0)[0] > 0.8);
    }

    #[test]
    fn test_undecodable_input_is_returned() {
        let junk = EncodedImage {
            data: std::sync::Arc::from(vec![0u8; 8]),
            format: super::super::encoding::PhotoFormat::Png,
            width: 1,
            height: 1,
        };
        let out = FilterEngine::default().apply(&junk, "vintage");
        assert_eq!(out, junk);
    }
}

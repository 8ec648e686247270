// SPDX-License-Identifier: GPL-3.0-only

//! Photo encoding
//!
//! Captured and filtered photos travel through the pipeline as encoded
//! bytes. JPEG drops the alpha channel, PNG keeps it.

use crate::errors::PhotoError;
use image::{DynamicImage, ImageFormat, RgbaImage};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use std::sync::Arc;
use tracing::debug;

/// Supported photo formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhotoFormat {
    /// JPEG format (lossy compression)
    Jpeg,
    /// PNG format (lossless compression)
    Png,
}

impl PhotoFormat {
    /// Get file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            PhotoFormat::Jpeg => "jpg",
            PhotoFormat::Png => "png",
        }
    }

    fn to_image_format(self) -> ImageFormat {
        match self {
            PhotoFormat::Jpeg => ImageFormat::Jpeg,
            PhotoFormat::Png => ImageFormat::Png,
        }
    }

    /// Sniff the format from the leading bytes
    pub fn detect(bytes: &[u8]) -> Option<Self> {
        match image::guess_format(bytes).ok()? {
            ImageFormat::Jpeg => Some(PhotoFormat::Jpeg),
            ImageFormat::Png => Some(PhotoFormat::Png),
            _ => None,
        }
    }
}

/// Encoded image bytes plus the format tag
///
/// Cloning shares the byte buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub data: Arc<[u8]>,
    pub format: PhotoFormat,
    pub width: u32,
    pub height: u32,
}

impl EncodedImage {
    /// Wrap already-encoded bytes, reading dimensions from the header
    pub fn from_bytes(data: impl Into<Arc<[u8]>>) -> Result<Self, PhotoError> {
        let data: Arc<[u8]> = data.into();
        let format = PhotoFormat::detect(&data)
            .ok_or_else(|| PhotoError::Decode("unrecognized image format".to_string()))?;
        let (width, height) = image::ImageReader::with_format(
            Cursor::new(&data[..]),
            format.to_image_format(),
        )
        .into_dimensions()
        .map_err(|e| PhotoError::Decode(e.to_string()))?;

        Ok(Self {
            data,
            format,
            width,
            height,
        })
    }

    /// Decode to pixels
    pub fn decode(&self) -> Result<DynamicImage, PhotoError> {
        image::load_from_memory_with_format(&self.data, self.format.to_image_format())
            .map_err(|e| PhotoError::Decode(e.to_string()))
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// A captured photo
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Photo {
    /// Capture sequence number within the session
    pub index: usize,
    pub image: EncodedImage,
}

/// Photo encoder
#[derive(Debug, Clone, Copy)]
pub struct PhotoEncoder {
    format: PhotoFormat,
    jpeg_quality: u8,
}

impl PhotoEncoder {
    pub fn jpeg(quality: u8) -> Self {
        Self {
            format: PhotoFormat::Jpeg,
            jpeg_quality: quality.clamp(1, 100),
        }
    }

    pub fn png() -> Self {
        Self {
            format: PhotoFormat::Png,
            jpeg_quality: 100,
        }
    }

    /// Encoder producing the same format as `image`
    pub fn matching(image: &EncodedImage, jpeg_quality: u8) -> Self {
        match image.format {
            PhotoFormat::Jpeg => Self::jpeg(jpeg_quality),
            PhotoFormat::Png => Self::png(),
        }
    }

    pub fn format(&self) -> PhotoFormat {
        self.format
    }

    /// Encode RGBA pixels
    pub fn encode(&self, pixels: &RgbaImage) -> Result<EncodedImage, PhotoError> {
        let data = match self.format {
            PhotoFormat::Jpeg => encode_jpeg(pixels, self.jpeg_quality)?,
            PhotoFormat::Png => encode_png(pixels)?,
        };

        debug!(
            size = data.len(),
            format = ?self.format,
            width = pixels.width(),
            height = pixels.height(),
            "Encoding complete"
        );

        Ok(EncodedImage {
            data: Arc::from(data),
            format: self.format,
            width: pixels.width(),
            height: pixels.height(),
        })
    }
}

/// Encode RGBA pixels as JPEG, dropping alpha
pub fn encode_jpeg(pixels: &RgbaImage, quality: u8) -> Result<Vec<u8>, PhotoError> {
    let rgb = DynamicImage::ImageRgba8(pixels.clone()).to_rgb8();
    let mut buffer = Vec::new();
    let mut encoder =
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));

    encoder
        .encode(
            rgb.as_raw(),
            rgb.width(),
            rgb.height(),
            image::ExtendedColorType::Rgb8,
        )
        .map_err(|e| PhotoError::Encode(format!("JPEG encoding failed: {}", e)))?;

    Ok(buffer)
}

/// Encode RGBA pixels as PNG
pub fn encode_png(pixels: &RgbaImage) -> Result<Vec<u8>, PhotoError> {
    let mut buffer = Vec::new();

    pixels
        .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .map_err(|e| PhotoError::Encode(format!("PNG encoding failed: {}", e)))?;

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            if (x + y) % 2 == 0 {
                image::Rgba([240, 20, 20, 255])
            } else {
                image::Rgba([20, 20, 240, 255])
            }
        })
    }

    #[test]
    fn test_format_extensions() {
        assert_eq!(PhotoFormat::Jpeg.extension(), "jpg");
        assert_eq!(PhotoFormat::Png.extension(), "png");
    }

    #[test]
    fn test_jpeg_is_detected_with_dimensions() {
        let encoded = PhotoEncoder::jpeg(90).encode(&checker(16, 8)).unwrap();
        assert_eq!(encoded.format, PhotoFormat::Jpeg);

        let wrapped = EncodedImage::from_bytes(encoded.data.to_vec()).unwrap();
        assert_eq!(wrapped.format, PhotoFormat::Jpeg);
        assert_eq!((wrapped.width, wrapped.height), (16, 8));
    }

    #[test]
    fn test_png_keeps_pixels() {
        let pixels = checker(4, 4);
        let encoded = PhotoEncoder::png().encode(&pixels).unwrap();
        assert_eq!(encoded.decode().unwrap().to_rgba8(), pixels);
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(EncodedImage::from_bytes(vec![1u8, 2, 3, 4]).is_err());
    }
}

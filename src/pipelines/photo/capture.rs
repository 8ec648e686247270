// SPDX-License-Identifier: GPL-3.0-only

//! Single-shot photo capture
//!
//! Grabs the current frame from the leased feed, encodes it as JPEG and
//! runs the session's filter over it.

use super::encoding::{Photo, PhotoEncoder};
use super::processing::FilterEngine;
use crate::backends::{FeedLease, VideoFrame};
use crate::errors::CameraError;
use tracing::{debug, info};

/// Photo capture handler
#[derive(Debug, Clone, Copy)]
pub struct PhotoCapture {
    encoder: PhotoEncoder,
    engine: FilterEngine,
}

impl PhotoCapture {
    /// Capture handler encoding JPEG at `jpeg_quality`
    pub fn new(jpeg_quality: u8) -> Self {
        Self {
            encoder: PhotoEncoder::jpeg(jpeg_quality),
            engine: FilterEngine::new(jpeg_quality),
        }
    }

    /// Grab, encode and filter one photo
    pub fn capture(
        &self,
        lease: &mut FeedLease,
        index: usize,
        filter_id: &str,
    ) -> Result<Photo, CameraError> {
        info!(source = lease.name(), index, filter_id, "Capturing photo");

        let frame = lease.grab_frame()?;
        debug!(
            width = frame.width,
            height = frame.height,
            "Frame captured from source"
        );

        self.process_frame(&frame, index, filter_id)
    }

    /// Encode and filter an already grabbed frame
    pub fn process_frame(
        &self,
        frame: &VideoFrame,
        index: usize,
        filter_id: &str,
    ) -> Result<Photo, CameraError> {
        let pixels = frame.to_rgba_image()?;
        let encoded = self.encoder.encode(&pixels)?;
        let image = self.engine.apply(&encoded, filter_id);

        Ok(Photo { index, image })
    }
}

impl Default for PhotoCapture {
    fn default() -> Self {
        Self::new(crate::constants::encoding::CAPTURE_JPEG_QUALITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::{StreamRequest, TestPatternSource};
    use crate::pipelines::photo::PhotoFormat;

    #[test]
    fn test_capture_produces_filtered_jpeg() {
        let source = TestPatternSource::new(64, 48);
        let mut lease = FeedLease::acquire(Box::new(source), StreamRequest::any()).unwrap();

        let photo = PhotoCapture::default()
            .capture(&mut lease, 3, "grayscale")
            .unwrap();
        assert_eq!(photo.index, 3);
        assert_eq!(photo.image.format, PhotoFormat::Jpeg);
        assert_eq!((photo.image.width, photo.image.height), (64, 48));

        let pixels = photo.image.decode().unwrap().to_rgb8();
        let p = pixels.get_pixel(40, 20);
        assert!((p[0] as i16 - p[1] as i16).abs() <= 3);
        assert!((p[1] as i16 - p[2] as i16).abs() <= 3);
    }

    #[test]
    fn test_truncated_frame_is_rejected() {
        let frame = VideoFrame {
            width: 10,
            height: 10,
            data: std::sync::Arc::from(vec![0u8; 12]),
            captured_at: std::time::Instant::now(),
        };
        assert!(PhotoCapture::default().process_frame(&frame, 0, "normal").is_err());
    }
}

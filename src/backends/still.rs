// SPDX-License-Identifier: GPL-3.0-only

//! Still image video source
//!
//! Serves one image file as a never-changing live feed. Useful for kiosks
//! without a camera and for reproducible captures.

use super::{StreamRequest, VideoFrame, VideoSource};
use crate::errors::CameraError;
use image::imageops::FilterType;
use std::path::{Path, PathBuf};
use tracing::info;

pub struct StillImageSource {
    path: PathBuf,
    frame: Option<VideoFrame>,
}

impl StillImageSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            frame: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Load an image file as an RGBA frame
pub fn load_image_as_frame(path: &Path) -> Result<VideoFrame, CameraError> {
    info!(path = %path.display(), "Loading image file");

    let img = image::open(path).map_err(|e| match e {
        image::ImageError::IoError(io) => CameraError::from(io),
        image::ImageError::Unsupported(_) => CameraError::Unsupported,
        other => CameraError::Other(format!(
            "Failed to load image '{}': {}",
            path.display(),
            other
        )),
    })?;

    let rgba = img.to_rgba8();
    info!(width = rgba.width(), height = rgba.height(), "Image loaded successfully");
    Ok(VideoFrame::from_rgba(rgba))
}

impl VideoSource for StillImageSource {
    fn name(&self) -> &str {
        "still-image"
    }

    fn open(&mut self, request: &StreamRequest) -> Result<(), CameraError> {
        let mut frame = load_image_as_frame(&self.path)?;

        if let Some(resolution) = request.resolution
            && (frame.width, frame.height) != (resolution.width, resolution.height)
        {
            let image = frame.to_rgba_image()?;
            let resized = image::imageops::resize(
                &image,
                resolution.width.max(1),
                resolution.height.max(1),
                FilterType::Triangle,
            );
            frame = VideoFrame::from_rgba(resized);
        }

        self.frame = Some(frame);
        Ok(())
    }

    fn close(&mut self) {
        self.frame = None;
    }

    fn is_open(&self) -> bool {
        self.frame.is_some()
    }

    fn poll_ready(&mut self) -> Result<bool, CameraError> {
        Ok(self.frame.is_some())
    }

    fn grab_frame(&mut self) -> Result<VideoFrame, CameraError> {
        self.frame
            .clone()
            .ok_or_else(|| CameraError::Other("still image source is not open".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_no_device() {
        let mut source = StillImageSource::new("/nonexistent/booth.png");
        assert_eq!(
            source.open(&StreamRequest::any()),
            Err(CameraError::NoDevice)
        );
        assert!(!source.is_open());
    }

    #[test]
    fn test_resizes_to_requested_resolution() {
        let dir = std::env::temp_dir().join(format!("still-source-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("frame.png");
        image::RgbaImage::from_pixel(20, 10, image::Rgba([10, 200, 30, 255]))
            .save(&path)
            .unwrap();

        let mut source = StillImageSource::new(&path);
        source
            .open(&StreamRequest::preferred(crate::config::Resolution {
                width: 40,
                height: 20,
            }))
            .unwrap();
        let frame = source.grab_frame().unwrap();
        assert_eq!((frame.width, frame.height), (40, 20));

        source.close();
        assert!(source.grab_frame().is_err());
        std::fs::remove_dir_all(&dir).ok();
    }
}

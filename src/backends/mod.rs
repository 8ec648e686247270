// SPDX-License-Identifier: GPL-3.0-only

//! Video source abstraction for the capture session
//!
//! ```text
//! ┌─────────────────────┐
//! │   CaptureSession    │
//! └──────────┬──────────┘
//!            │ FeedLease (open once, close once)
//!            ▼
//! ┌─────────────────────┐
//! │  VideoSource trait  │
//! └──────────┬──────────┘
//!            │
//!    ┌───────┼─────────────┐
//!    ▼       ▼             ▼
//!  Still  TestPattern    V4L2
//! ```

pub mod lease;
pub mod pattern;
pub mod still;
#[cfg(all(target_os = "linux", feature = "v4l2"))]
pub mod v4l2;

pub use lease::{FeedLease, OpenFailure};
pub use pattern::{SourceProbe, TestPatternSource};
pub use still::StillImageSource;
#[cfg(all(target_os = "linux", feature = "v4l2"))]
pub use v4l2::V4l2Source;

use crate::config::Resolution;
use crate::errors::CameraError;
use image::RgbaImage;
use std::sync::Arc;
use std::time::Instant;

/// A single RGBA frame from a live feed
#[derive(Debug, Clone)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    /// Tightly packed RGBA pixels
    pub data: Arc<[u8]>,
    pub captured_at: Instant,
}

impl VideoFrame {
    pub fn from_rgba(image: RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            data: Arc::from(image.into_raw()),
            captured_at: Instant::now(),
        }
    }

    /// Copy the frame into an owned image buffer
    pub fn to_rgba_image(&self) -> Result<RgbaImage, CameraError> {
        let expected = self.width as usize * self.height as usize * 4;
        if self.data.len() < expected {
            return Err(CameraError::Other(format!(
                "Frame data too small: expected {}, got {}",
                expected,
                self.data.len()
            )));
        }
        RgbaImage::from_raw(self.width, self.height, self.data[..expected].to_vec())
            .ok_or_else(|| CameraError::Other("Failed to wrap frame data".to_string()))
    }
}

/// Stream parameters requested when opening a source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreamRequest {
    /// Exact resolution wanted, or `None` for whatever the device offers
    pub resolution: Option<Resolution>,
}

impl StreamRequest {
    pub fn preferred(resolution: Resolution) -> Self {
        Self {
            resolution: Some(resolution),
        }
    }

    pub fn any() -> Self {
        Self { resolution: None }
    }
}

/// Live camera feed
///
/// Implementations only need to be usable from one thread at a time; the
/// capture session serializes all calls.
pub trait VideoSource: Send {
    /// Human-readable name for logs
    fn name(&self) -> &str;

    /// Acquire the device and start streaming
    fn open(&mut self, request: &StreamRequest) -> Result<(), CameraError>;

    /// Stop streaming and release the device
    fn close(&mut self);

    fn is_open(&self) -> bool;

    /// Whether the first frame is available
    ///
    /// Must not block. Called repeatedly while the session is starting.
    fn poll_ready(&mut self) -> Result<bool, CameraError>;

    /// Grab the current frame
    fn grab_frame(&mut self) -> Result<VideoFrame, CameraError>;
}

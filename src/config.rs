// SPDX-License-Identifier: GPL-3.0-only

//! Pipeline configuration
//!
//! Every field has a default matching the stock photo booth behaviour, so a
//! partial JSON document only needs the values it overrides.

use crate::constants::{CountdownSetting, encoding, export, palette, timing};
use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Capture resolution requested from the camera
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Default for Resolution {
    fn default() -> Self {
        Self {
            width: encoding::PREFERRED_WIDTH,
            height: encoding::PREFERRED_HEIGHT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Countdown length before each shot
    pub countdown: CountdownSetting,
    /// JPEG quality for captured photos (1-100)
    pub capture_jpeg_quality: u8,
    /// JPEG quality for lossy exports (1-100)
    pub export_jpeg_quality: u8,
    /// Supersampling factor for the exported composite (>= 2)
    pub supersample: u32,
    /// Milliseconds to wait for the first camera frame
    pub camera_start_timeout_ms: u64,
    /// Resolution requested on the first open attempt
    pub preferred_resolution: Resolution,
    /// Largest composite surface the renderer will allocate
    pub max_canvas_pixels: u64,
    /// Tag prefixed to suggested export filenames
    pub app_tag: String,
    /// Frame color used before the user picks one
    pub default_frame_color: String,
    /// Export directory override (defaults to the pictures folder)
    pub output_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            countdown: CountdownSetting::default(),
            capture_jpeg_quality: encoding::CAPTURE_JPEG_QUALITY,
            export_jpeg_quality: encoding::EXPORT_JPEG_QUALITY,
            supersample: export::DEFAULT_SUPERSAMPLE,
            camera_start_timeout_ms: timing::CAMERA_START_TIMEOUT_MS,
            preferred_resolution: Resolution::default(),
            max_canvas_pixels: export::MAX_CANVAS_PIXELS,
            app_tag: export::APP_TAG.to_string(),
            default_frame_color: palette::DEFAULT_FRAME_COLOR.to_string(),
            output_dir: None,
        }
    }
}

impl Config {
    /// Parse and validate a JSON document
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        info!(path = %path.display(), "Loading config");
        let json = std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::from_json(&json)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.supersample < export::MIN_SUPERSAMPLE {
            return Err(ConfigError::Invalid(format!(
                "supersample must be at least {}, got {}",
                export::MIN_SUPERSAMPLE,
                self.supersample
            )));
        }
        for (name, quality) in [
            ("capture_jpeg_quality", self.capture_jpeg_quality),
            ("export_jpeg_quality", self.export_jpeg_quality),
        ] {
            if !(1..=100).contains(&quality) {
                return Err(ConfigError::Invalid(format!(
                    "{} must be within 1-100, got {}",
                    name, quality
                )));
            }
        }
        if self.camera_start_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "camera_start_timeout_ms must be positive".to_string(),
            ));
        }
        if self.max_canvas_pixels == 0 {
            return Err(ConfigError::Invalid(
                "max_canvas_pixels must be positive".to_string(),
            ));
        }
        debug!(?self, "Config validated");
        Ok(())
    }

    /// Camera start-up timeout as a Duration
    pub fn camera_start_timeout(&self) -> Duration {
        Duration::from_millis(self.camera_start_timeout_ms)
    }
}

// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Countdown length before each shot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CountdownSetting {
    /// 3 second countdown (default)
    #[default]
    Three,
    /// 5 second countdown
    Five,
    /// 10 second countdown
    Ten,
}

impl CountdownSetting {
    /// Get all settings for UI iteration
    pub const ALL: [CountdownSetting; 3] = [
        CountdownSetting::Three,
        CountdownSetting::Five,
        CountdownSetting::Ten,
    ];

    /// Countdown length in seconds
    pub fn seconds(&self) -> u32 {
        match self {
            CountdownSetting::Three => 3,
            CountdownSetting::Five => 5,
            CountdownSetting::Ten => 10,
        }
    }

    /// Get display name for the setting
    pub fn display_name(&self) -> &'static str {
        match self {
            CountdownSetting::Three => "3s",
            CountdownSetting::Five => "5s",
            CountdownSetting::Ten => "10s",
        }
    }

    /// Cycle to the next setting (wraps around)
    pub fn next(&self) -> Self {
        match self {
            CountdownSetting::Three => CountdownSetting::Five,
            CountdownSetting::Five => CountdownSetting::Ten,
            CountdownSetting::Ten => CountdownSetting::Three,
        }
    }

    /// Map a seconds value back to a setting
    pub fn from_seconds(seconds: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.seconds() == seconds)
    }
}

/// Timing constants
pub mod timing {
    use super::Duration;

    /// Interval between countdown ticks
    pub const COUNTDOWN_TICK: Duration = Duration::from_secs(1);

    /// Interval between readiness polls while the camera is starting
    pub const READY_POLL_INTERVAL: Duration = Duration::from_millis(50);

    /// How long the camera may stay in Starting before it is reported as failed
    pub const CAMERA_START_TIMEOUT_MS: u64 = 3000;

    /// Command queue depth for the session actor
    pub const SESSION_COMMAND_QUEUE: usize = 32;

    /// Longest wait for one V4L2 buffer before the stop flag is checked again
    pub const V4L2_DEQUEUE_TIMEOUT: Duration = Duration::from_millis(250);
}

/// Capture encoding constants
pub mod encoding {
    /// JPEG quality used for captured and filtered photos
    pub const CAPTURE_JPEG_QUALITY: u8 = 90;

    /// JPEG quality used for lossy exports
    pub const EXPORT_JPEG_QUALITY: u8 = 92;

    /// Preferred capture width requested from the camera
    pub const PREFERRED_WIDTH: u32 = 1280;

    /// Preferred capture height requested from the camera
    pub const PREFERRED_HEIGHT: u32 = 720;
}

/// Export constants
pub mod export {
    /// Default supersampling factor for the final composite
    pub const DEFAULT_SUPERSAMPLE: u32 = 2;

    /// Smallest supersampling factor accepted for export
    pub const MIN_SUPERSAMPLE: u32 = 2;

    /// Upper bound on composite surface size (pixels)
    pub const MAX_CANVAS_PIXELS: u64 = 64 * 1024 * 1024;

    /// Tag prefixed to suggested export filenames
    pub const APP_TAG: &str = "Photobooth";

    /// Default folder name under the user's pictures directory
    pub const DEFAULT_SAVE_FOLDER: &str = "Photobooth";

    /// PDF resolution used to map composite pixels to page points
    pub const PDF_DPI: f32 = 144.0;
}

/// Frame color presets offered by the preview screen
pub mod palette {
    /// Preset frame colors (hex)
    pub const FRAME_COLORS: [&str; 12] = [
        "#E63946", "#FFB703", "#2B2D42", "#FF6B6B", "#4ECDC4", "#45B7D1", "#96CEB4", "#FFEAA7",
        "#FFFFFF", "#000000", "#8B4513", "#FF69B4",
    ];

    /// Default frame color
    pub const DEFAULT_FRAME_COLOR: &str = "#FFFFFF";

    /// Caption color on dark panels
    pub const LIGHT_TEXT: [u8; 3] = [0xFF, 0xFF, 0xFF];

    /// Caption color on light panels
    pub const DARK_TEXT: [u8; 3] = [0x37, 0x41, 0x51];

    /// Perceived brightness below which a panel counts as dark
    pub const DARK_THRESHOLD: f32 = 128.0;
}

/// Caption text constants (logical pixels)
pub mod text {
    /// Watermark shown when the user has not typed one
    pub const DEFAULT_WATERMARK: &str = "Photobooth";

    /// Title font size for the single layout
    pub const TITLE_SIZE_LARGE: f32 = 16.0;

    /// Title font size for the other layouts
    pub const TITLE_SIZE: f32 = 14.0;

    /// Date line font size
    pub const DATE_SIZE: f32 = 12.0;

    /// Line height multiplier
    pub const LINE_HEIGHT: f32 = 1.4;

    /// Opacity applied to the date line
    pub const DATE_OPACITY: f32 = 0.8;
}

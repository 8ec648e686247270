// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the photo booth pipeline

use serde::{Deserialize, Serialize};

/// Result type alias using BoothError
pub type BoothResult<T> = Result<T, BoothError>;

/// Main error type
#[derive(Debug, Clone, thiserror::Error)]
pub enum BoothError {
    /// Camera-related errors
    #[error("Camera error: {0}")]
    Camera(#[from] CameraError),
    /// Capture session errors
    #[error("Session error: {0}")]
    Session(#[from] SessionError),
    /// Composition errors
    #[error("Composition error: {0}")]
    Compose(#[from] ComposeError),
    /// Rendering and export errors
    #[error("Render error: {0}")]
    Render(#[from] RenderError),
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    /// Storage/filesystem errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Camera failures surfaced to the user
///
/// Every variant is fatal to the capture session until the user
/// explicitly retries starting the camera.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum CameraError {
    /// The user or the system refused access to the camera
    #[error("Camera access was denied")]
    PermissionDenied,
    /// No camera device is connected
    #[error("No camera found")]
    NoDevice,
    /// The device or platform cannot provide a usable stream
    #[error("Camera access is not supported")]
    Unsupported,
    /// Any other failure, including start-up timeouts
    #[error("Camera error: {0}")]
    Other(String),
}

impl CameraError {
    /// Short machine-readable kind, used in logs and snapshots
    pub fn kind(&self) -> &'static str {
        match self {
            CameraError::PermissionDenied => "permission-denied",
            CameraError::NoDevice => "no-device",
            CameraError::Unsupported => "unsupported",
            CameraError::Other(_) => "other",
        }
    }

    /// Whether a single fallback open attempt makes sense for this failure
    pub fn is_retryable(&self) -> bool {
        matches!(self, CameraError::Unsupported | CameraError::Other(_))
    }
}

impl From<std::io::Error> for CameraError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => CameraError::PermissionDenied,
            std::io::ErrorKind::NotFound => CameraError::NoDevice,
            std::io::ErrorKind::Unsupported => CameraError::Unsupported,
            _ => CameraError::Other(err.to_string()),
        }
    }
}

/// Capture session errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// Layout id not present in the layout catalog
    #[error("Unknown layout: {0}")]
    UnknownLayout(String),
    /// Retake index does not name a captured photo
    #[error("No photo at index {index} (have {count})")]
    PhotoIndexOutOfRange { index: usize, count: usize },
    /// The session actor has shut down
    #[error("Capture session is closed")]
    SessionClosed,
}

/// Photo encode/decode errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PhotoError {
    /// The pixel data could not be encoded
    #[error("Photo encoding failed: {0}")]
    Encode(String),
    /// The encoded bytes could not be decoded
    #[error("Photo decoding failed: {0}")]
    Decode(String),
}

impl From<PhotoError> for RenderError {
    fn from(err: PhotoError) -> Self {
        match err {
            PhotoError::Encode(msg) => RenderError::Encode(msg),
            PhotoError::Decode(msg) => RenderError::Decode(msg),
        }
    }
}

impl From<PhotoError> for CameraError {
    fn from(err: PhotoError) -> Self {
        CameraError::Other(err.to_string())
    }
}

/// Composition errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ComposeError {
    /// Layout id not present in the layout catalog
    #[error("Unknown layout: {0}")]
    UnknownLayout(String),
    /// Customization is confirmed and must be reopened before editing
    #[error("Customization is confirmed")]
    Confirmed,
}

/// Rendering and export errors
///
/// None of these leave a partial artifact behind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    /// The drawing surface could not be allocated
    #[error("Render target unavailable: {0}")]
    RenderTargetUnavailable(String),
    /// A slot image could not be decoded
    #[error("Failed to decode slot image: {0}")]
    Decode(String),
    /// The final artifact could not be encoded
    #[error("Encoding failed: {0}")]
    Encode(String),
}

impl From<image::ImageError> for RenderError {
    fn from(err: image::ImageError) -> Self {
        RenderError::Encode(err.to_string())
    }
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Reading the configuration file failed
    #[error("Failed to read config: {0}")]
    Io(String),
    /// The configuration is not valid JSON for this schema
    #[error("Failed to parse config: {0}")]
    Parse(String),
    /// A value is out of range
    #[error("Invalid config value: {0}")]
    Invalid(String),
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

/// Storage errors for exported artifacts
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    /// Creating the output directory failed
    #[error("Failed to create directory: {0}")]
    CreateDir(String),
    /// Writing or renaming the output file failed
    #[error("Failed to save file: {0}")]
    Save(String),
    /// Background task failed
    #[error("Save task error: {0}")]
    Task(String),
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Save(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_maps_to_camera_kind() {
        let denied = std::io::Error::from(std::io::ErrorKind::PermissionDenied);
        assert_eq!(CameraError::from(denied), CameraError::PermissionDenied);

        let missing = std::io::Error::from(std::io::ErrorKind::NotFound);
        assert_eq!(CameraError::from(missing), CameraError::NoDevice);

        let other = std::io::Error::other("busy");
        assert_eq!(CameraError::from(other).kind(), "other");
    }

    #[test]
    fn test_permission_denied_is_not_retried() {
        assert!(!CameraError::PermissionDenied.is_retryable());
        assert!(!CameraError::NoDevice.is_retryable());
        assert!(CameraError::Unsupported.is_retryable());
    }

    #[test]
    fn test_aggregate_display() {
        let err: BoothError = RenderError::RenderTargetUnavailable("0x0".into()).into();
        assert_eq!(
            err.to_string(),
            "Render error: Render target unavailable: 0x0"
        );
    }
}

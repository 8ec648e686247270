// SPDX-License-Identifier: GPL-3.0-only

//! Photobooth - capture and composition pipeline for a photo booth
//!
//! A countdown-driven capture session collects a fixed number of shots for a
//! chosen layout, applies a filter to each, and hands the photos to a studio
//! where frame, color and caption are chosen before the composite is
//! rendered and exported.
//!
//! # Architecture
//!
//! - [`backends`]: Video sources and the lease that guarantees release
//! - [`catalog`]: Built-in filters, layouts and frames
//! - [`session`]: Capture state machine and its async driver
//! - [`pipelines`]: Photo filtering, composition and rendering
//! - [`studio`]: Preview, confirmation and export
//! - [`storage`]: Atomic saving of exported files
//! - [`config`]: Pipeline configuration
//!
//! # Example
//!
//! ```no_run
//! use photobooth::{Config, CaptureSession, SessionDriver, TestPatternSource};
//!
//! # async fn run() -> Result<(), photobooth::BoothError> {
//! let config = Config::default();
//! let session = CaptureSession::new(Box::new(TestPatternSource::new(640, 480)), &config);
//! let handle = SessionDriver::spawn(session);
//! handle.select_layout("strip").await?;
//! handle.start_camera().await?;
//! # Ok(())
//! # }
//! ```

pub mod backends;
pub mod catalog;
pub mod color;
pub mod config;
pub mod constants;
pub mod errors;
pub mod logging;
pub mod pipelines;
pub mod session;
pub mod storage;
pub mod studio;

// Re-export commonly used types
pub use backends::{StillImageSource, TestPatternSource, VideoSource};
pub use color::Rgb;
pub use config::Config;
pub use constants::CountdownSetting;
pub use errors::{BoothError, BoothResult, CameraError};
pub use pipelines::composition::{CompositionDescription, Customization, compose};
pub use pipelines::render::{ExportFormat, ExportedArtifact, RenderOptions, Renderer};
pub use session::{CaptureSession, CaptureState, SessionDriver, SessionHandle, SessionSnapshot};
pub use studio::Studio;

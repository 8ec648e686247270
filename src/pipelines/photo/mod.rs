// SPDX-License-Identifier: GPL-3.0-only

//! Photo pipeline
//!
//! ```text
//! VideoSource → Capture → JPEG encode → FilterEngine → Photo
//! ```
//!
//! Each stage works on owned, encoded images so photos can move between
//! threads (rayon composition, blocking export) without copies.

pub mod capture;
pub mod encoding;
pub mod processing;

pub use capture::PhotoCapture;
pub use encoding::{EncodedImage, Photo, PhotoEncoder, PhotoFormat};
pub use processing::FilterEngine;

// SPDX-License-Identifier: GPL-3.0-only

//! Processing pipelines from captured frame to exported composite
//!
//! ```text
//! ┌──────────────┐     ┌───────────────────┐     ┌──────────────────┐     ┌──────────────┐
//! │ Video Frame  │ ──▶ │  Photo Pipeline   │ ──▶ │   Composition    │ ──▶ │   Renderer   │
//! │   (RGBA)     │     │  - JPEG encode    │     │  - Slot geometry │     │  - Raster    │
//! │              │     │  - Filters        │     │  - Decorations   │     │  - PNG/JPEG  │
//! │              │     │                   │     │  - Caption       │     │  - PDF       │
//! └──────────────┘     └───────────────────┘     └──────────────────┘     └──────────────┘
//! ```
//!
//! Composition is a pure function of the photos and the customization. The
//! preview and the export both go through it.

pub mod composition;
pub mod photo;
pub mod render;

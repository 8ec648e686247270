// SPDX-License-Identifier: GPL-3.0-only

//! Static registries for filters, layouts and frames
//!
//! All three catalogs are built at compile time and never change. Lookups
//! are by the string ids the UI hands over.

pub mod filters;
pub mod frames;
pub mod layouts;

pub use filters::{Filter, FilterCatalog, PixelOp};
pub use frames::{Anchor, Decoration, Frame, FrameCatalog, Overlay, PanelStyle, Placement, Shape};
pub use layouts::{Arrangement, Layout, LayoutCatalog, LayoutKind, LayoutMetrics};

// SPDX-License-Identifier: GPL-3.0-only

//! Filter registry
//!
//! A filter is an ordered chain of pixel operations. The operations mirror
//! the CSS filter functions the booth's looks were designed with, so the
//! chains read the same way the looks were tuned.

use serde::Serialize;

/// Pixel operation applied by the filter engine
///
/// Amounts follow CSS filter semantics: `Grayscale(1.0)` is fully
/// desaturated, `Brightness(1.0)` and `Contrast(1.0)` are no-ops.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum PixelOp {
    /// Leave pixels untouched
    Identity,
    /// Desaturate towards luminance (0.0 - 1.0)
    Grayscale(f32),
    /// Sepia tone (0.0 - 1.0)
    Sepia(f32),
    /// Multiply all channels
    Brightness(f32),
    /// Scale distance from mid-gray
    Contrast(f32),
    /// Saturation multiplier
    Saturate(f32),
    /// Hue rotation in degrees
    HueRotate(f32),
    /// Blur the highlights and screen them back over the image
    Glow {
        /// Blur radius as a fraction of the shorter image side
        radius: f32,
        /// Blend strength (0.0 - 1.0)
        strength: f32,
    },
}

/// Named filter
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Filter {
    pub id: &'static str,
    pub label: &'static str,
    pub operations: &'static [PixelOp],
}

impl Filter {
    /// Whether applying this filter leaves the image unchanged
    pub fn is_identity(&self) -> bool {
        self.operations.iter().all(|op| *op == PixelOp::Identity)
    }
}

/// Id of the pass-through filter
pub const IDENTITY_FILTER_ID: &str = "normal";

static FILTERS: [Filter; 9] = [
    Filter {
        id: IDENTITY_FILTER_ID,
        label: "Normal",
        operations: &[PixelOp::Identity],
    },
    Filter {
        id: "grayscale",
        label: "Grayscale",
        operations: &[PixelOp::Grayscale(1.0)],
    },
    Filter {
        id: "blackwhite",
        label: "B&W",
        operations: &[PixelOp::Grayscale(1.0)],
    },
    Filter {
        id: "vintage",
        label: "Vintage",
        operations: &[PixelOp::Sepia(0.8), PixelOp::HueRotate(30.0)],
    },
    Filter {
        id: "warm",
        label: "Warm",
        operations: &[
            PixelOp::Sepia(0.5),
            PixelOp::Brightness(1.1),
            PixelOp::Saturate(1.2),
        ],
    },
    Filter {
        id: "cool",
        label: "Cool",
        operations: &[PixelOp::HueRotate(180.0), PixelOp::Saturate(1.2)],
    },
    Filter {
        id: "glow",
        label: "Glow",
        operations: &[
            PixelOp::Brightness(1.3),
            PixelOp::Saturate(1.5),
            PixelOp::Glow {
                radius: 0.015,
                strength: 0.8,
            },
        ],
    },
    Filter {
        id: "dark",
        label: "Dark",
        operations: &[PixelOp::Brightness(0.6), PixelOp::Contrast(1.2)],
    },
    Filter {
        id: "light",
        label: "Light",
        operations: &[
            PixelOp::Brightness(1.4),
            PixelOp::Contrast(0.8),
            PixelOp::Saturate(1.2),
        ],
    },
];

/// Lookup over the built-in filters
pub struct FilterCatalog;

impl FilterCatalog {
    /// All filters in display order
    pub fn all() -> &'static [Filter] {
        &FILTERS
    }

    /// Find a filter by id
    pub fn get(id: &str) -> Option<&'static Filter> {
        FILTERS.iter().find(|f| f.id == id)
    }

    /// The pass-through filter
    pub fn identity() -> &'static Filter {
        &FILTERS[0]
    }

    /// Find a filter by id, falling back to the pass-through filter
    pub fn get_or_identity(id: &str) -> &'static Filter {
        Self::get(id).unwrap_or_else(Self::identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        let mut ids: Vec<_> = FilterCatalog::all().iter().map(|f| f.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), FilterCatalog::all().len());
    }

    #[test]
    fn test_identity_lookup() {
        assert!(FilterCatalog::identity().is_identity());
        assert_eq!(FilterCatalog::identity().id, IDENTITY_FILTER_ID);
        assert!(!FilterCatalog::get("vintage").unwrap().is_identity());
    }

    #[test]
    fn test_unknown_id_falls_back() {
        assert!(FilterCatalog::get("sparkle").is_none());
        assert_eq!(FilterCatalog::get_or_identity("sparkle").id, "normal");
    }
}

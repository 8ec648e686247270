// SPDX-License-Identifier: GPL-3.0-only

//! Layout registry
//!
//! Dimensions are logical pixels. The renderer multiplies them by the
//! supersampling factor.

use serde::Serialize;

/// How slots are arranged inside the panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Arrangement {
    /// One square slot
    Single,
    /// Slots stacked top to bottom
    Stack,
    /// Row-major grid with a fixed column count
    Grid { columns: u32 },
    /// 3x3 grid where the first slot spans the top-left 2x2 block
    Collage,
}

/// Layout family used to look up frame decorations
///
/// Grid and collage share their decoration sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayoutKind {
    Single,
    Strip,
    Compact,
}

/// Fixed panel geometry for a layout
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LayoutMetrics {
    /// Panel width
    pub panel_width: f32,
    /// Height of one grid cell (ignored by [`Arrangement::Single`])
    pub cell_height: f32,
    /// Space between slots
    pub gap: f32,
    /// Slot corner radius
    pub corner_radius: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub slot_count: usize,
    pub arrangement: Arrangement,
    pub metrics: LayoutMetrics,
}

impl Layout {
    /// Decoration family for this layout
    pub fn kind(&self) -> LayoutKind {
        match self.arrangement {
            Arrangement::Single => LayoutKind::Single,
            Arrangement::Stack => LayoutKind::Strip,
            Arrangement::Grid { .. } | Arrangement::Collage => LayoutKind::Compact,
        }
    }
}

static LAYOUTS: [Layout; 4] = [
    Layout {
        id: "single",
        name: "Single",
        description: "One large photo",
        slot_count: 1,
        arrangement: Arrangement::Single,
        metrics: LayoutMetrics {
            panel_width: 448.0,
            cell_height: 0.0,
            gap: 0.0,
            corner_radius: 16.0,
        },
    },
    Layout {
        id: "strip",
        name: "Photo Strip",
        description: "Four photos stacked like a classic booth strip",
        slot_count: 4,
        arrangement: Arrangement::Stack,
        metrics: LayoutMetrics {
            panel_width: 320.0,
            cell_height: 180.0,
            gap: 8.0,
            corner_radius: 8.0,
        },
    },
    Layout {
        id: "grid",
        name: "Grid",
        description: "Four photos in a 2x2 grid",
        slot_count: 4,
        arrangement: Arrangement::Grid { columns: 2 },
        metrics: LayoutMetrics {
            panel_width: 448.0,
            cell_height: 160.0,
            gap: 8.0,
            corner_radius: 8.0,
        },
    },
    Layout {
        id: "collage",
        name: "Collage",
        description: "One large photo with five small ones",
        slot_count: 6,
        arrangement: Arrangement::Collage,
        metrics: LayoutMetrics {
            panel_width: 480.0,
            cell_height: 120.0,
            gap: 4.0,
            corner_radius: 8.0,
        },
    },
];

/// Lookup over the built-in layouts
pub struct LayoutCatalog;

impl LayoutCatalog {
    /// All layouts in display order
    pub fn all() -> &'static [Layout] {
        &LAYOUTS
    }

    pub fn get(id: &str) -> Option<&'static Layout> {
        LAYOUTS.iter().find(|l| l.id == id)
    }

    /// Layout selected when a session opens
    pub fn default_layout() -> &'static Layout {
        &LAYOUTS[1]
    }
}

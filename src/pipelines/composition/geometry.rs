// SPDX-License-Identifier: GPL-3.0-only

//! Panel geometry
//!
//! All values are logical pixels measured from the panel's top-left corner.

use crate::catalog::{Anchor, Arrangement, Layout, PanelStyle, Placement};
use serde::Serialize;

/// Space above the slot area inside the content box
pub const SLOT_AREA_TOP: f32 = 16.0;

/// Padding around the photo of the single layout
pub const SINGLE_PHOTO_PADDING: f32 = 16.0;

/// Space between the slot area and the caption
pub const CAPTION_GAP: f32 = 8.0;

/// Space between caption lines
pub const CAPTION_LINE_GAP: f32 = 4.0;

/// Space below the caption
pub const CAPTION_BOTTOM: f32 = 16.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn scale(&self, factor: f32) -> Rect {
        Rect::new(
            self.x * factor,
            self.y * factor,
            self.width * factor,
            self.height * factor,
        )
    }

    pub fn contains(&self, other: &Rect) -> bool {
        const EPS: f32 = 1e-3;
        other.x >= self.x - EPS
            && other.y >= self.y - EPS
            && other.right() <= self.right() + EPS
            && other.bottom() <= self.bottom() + EPS
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}

/// Slot rectangles for every slot of a layout
#[derive(Debug, Clone, PartialEq)]
pub struct SlotGrid {
    pub slots: Vec<Rect>,
    /// Bottom edge of the slot area, including its trailing padding
    pub bottom: f32,
}

/// Lay out every slot of `layout` inside a panel styled by `style`
pub fn slot_grid(layout: &Layout, style: &PanelStyle) -> SlotGrid {
    let m = &layout.metrics;
    let inset = style.inset();
    let content_width = (m.panel_width - 2.0 * inset).max(0.0);
    let top = inset + SLOT_AREA_TOP;

    match layout.arrangement {
        Arrangement::Single => {
            let side = (content_width - 2.0 * SINGLE_PHOTO_PADDING).max(0.0);
            let rect = Rect::new(inset + SINGLE_PHOTO_PADDING, top, side, side);
            SlotGrid {
                bottom: rect.bottom() + SINGLE_PHOTO_PADDING,
                slots: vec![rect],
            }
        }
        Arrangement::Stack => {
            let slots: Vec<Rect> = (0..layout.slot_count)
                .map(|i| {
                    let y = top + i as f32 * (m.cell_height + m.gap);
                    Rect::new(inset, y, content_width, m.cell_height)
                })
                .collect();
            SlotGrid {
                bottom: slots.last().map(Rect::bottom).unwrap_or(top),
                slots,
            }
        }
        Arrangement::Grid { columns } => {
            let columns = columns.max(1) as usize;
            let cell_width =
                (content_width - m.gap * (columns as f32 - 1.0)).max(0.0) / columns as f32;
            let slots: Vec<Rect> = (0..layout.slot_count)
                .map(|i| {
                    let (row, col) = (i / columns, i % columns);
                    Rect::new(
                        inset + col as f32 * (cell_width + m.gap),
                        top + row as f32 * (m.cell_height + m.gap),
                        cell_width,
                        m.cell_height,
                    )
                })
                .collect();
            SlotGrid {
                bottom: slots.iter().map(Rect::bottom).fold(top, f32::max),
                slots,
            }
        }
        Arrangement::Collage => {
            let cell_width = (content_width - 2.0 * m.gap).max(0.0) / 3.0;
            let cell = |col: usize, row: usize, span: f32| {
                Rect::new(
                    inset + col as f32 * (cell_width + m.gap),
                    top + row as f32 * (m.cell_height + m.gap),
                    span * cell_width + (span - 1.0) * m.gap,
                    span * m.cell_height + (span - 1.0) * m.gap,
                )
            };
            // Slot 0 covers the top-left 2x2 block, the rest fill the free cells
            let mut slots = vec![cell(0, 0, 2.0)];
            slots.extend(
                [(2, 0), (2, 1), (0, 2), (1, 2), (2, 2)]
                    .into_iter()
                    .map(|(col, row)| cell(col, row, 1.0)),
            );
            slots.truncate(layout.slot_count);
            SlotGrid {
                bottom: slots.iter().map(Rect::bottom).fold(top, f32::max),
                slots,
            }
        }
    }
}

/// Resolve a decoration placement against the panel size
pub fn place(placement: &Placement, panel_width: f32, panel_height: f32) -> Rect {
    match *placement {
        Placement::Anchored {
            anchor,
            offset,
            size,
        } => {
            let far_x = panel_width - offset - size;
            let far_y = panel_height - offset - size;
            let (x, y) = match anchor {
                Anchor::TopLeft => (offset, offset),
                Anchor::TopRight => (far_x, offset),
                Anchor::BottomLeft => (offset, far_y),
                Anchor::BottomRight => (far_x, far_y),
                Anchor::Center => ((panel_width - size) / 2.0, (panel_height - size) / 2.0),
            };
            Rect::new(x, y, size, size)
        }
        Placement::Inset { inset } => Rect::new(
            inset,
            inset,
            (panel_width - 2.0 * inset).max(0.0),
            (panel_height - 2.0 * inset).max(0.0),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::LayoutCatalog;

    fn grid_for(id: &str) -> SlotGrid {
        slot_grid(LayoutCatalog::get(id).unwrap(), &PanelStyle::STANDARD)
    }

    #[test]
    fn test_single_slot_is_square() {
        let grid = grid_for("single");
        assert_eq!(grid.slots.len(), 1);
        let slot = grid.slots[0];
        assert_eq!(slot.width, slot.height);
        assert_eq!(slot.x, 30.0);
        assert_eq!(slot.width, 448.0 - 28.0 - 32.0);
    }

    #[test]
    fn test_strip_slots_stack_downwards() {
        let grid = grid_for("strip");
        assert_eq!(grid.slots.len(), 4);
        for pair in grid.slots.windows(2) {
            assert_eq!(pair[0].x, pair[1].x);
            assert_eq!(pair[1].y, pair[0].bottom() + 8.0);
        }
    }

    #[test]
    fn test_grid_is_row_major() {
        let grid = grid_for("grid");
        let s = &grid.slots;
        assert_eq!(s[0].y, s[1].y);
        assert!(s[1].x > s[0].x);
        assert_eq!(s[2].x, s[0].x);
        assert!(s[2].y > s[0].y);
    }

    #[test]
    fn test_collage_slots_do_not_overlap() {
        let grid = grid_for("collage");
        assert_eq!(grid.slots.len(), 6);
        let big = grid.slots[0];
        assert!(big.width > 1.9 * grid.slots[1].width);
        for (i, a) in grid.slots.iter().enumerate() {
            for b in grid.slots.iter().skip(i + 1) {
                assert!(!a.intersects(b), "{a:?} overlaps {b:?}");
            }
        }
        // Slot 1 sits right of the large slot, slot 3 below it
        assert!(grid.slots[1].x >= big.right());
        assert!(grid.slots[3].y >= big.bottom());
    }

    #[test]
    fn test_anchor_placement() {
        let top_right = place(
            &Placement::Anchored {
                anchor: Anchor::TopRight,
                offset: 16.0,
                size: 80.0,
            },
            448.0,
            600.0,
        );
        assert_eq!(top_right, Rect::new(352.0, 16.0, 80.0, 80.0));

        let inset = place(&Placement::Inset { inset: 8.0 }, 100.0, 50.0);
        assert_eq!(inset, Rect::new(8.0, 8.0, 84.0, 34.0));
    }
}

// SPDX-License-Identifier: GPL-3.0-only

//! Frame registry
//!
//! A frame contributes two things to the composite: the panel style
//! (padding and border around the slots) and an optional set of decorations
//! drawn over the whole panel. Decoration sizes differ per layout family, so
//! they are resolved through [`Frame::decorations`] with a [`LayoutKind`].

use super::layouts::LayoutKind;
use crate::color::Rgb;
use serde::Serialize;

/// Panel spacing contributed by a frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PanelStyle {
    /// Space between the panel edge and its content
    pub padding: f32,
    /// Border drawn in the frame color around the panel
    pub border_width: f32,
}

impl PanelStyle {
    pub const STANDARD: PanelStyle = PanelStyle {
        padding: 12.0,
        border_width: 2.0,
    };

    /// Distance from the panel edge to the content box
    pub fn inset(&self) -> f32 {
        self.padding + self.border_width
    }
}

/// Where an anchored decoration sits on the panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Anchor {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    Center,
}

/// Decoration placement relative to the panel
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Placement {
    /// Square box of `size` at `offset` from the anchored corner
    Anchored { anchor: Anchor, offset: f32, size: f32 },
    /// Rectangle inset from every panel edge
    Inset { inset: f32 },
}

/// Decoration shape
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Shape {
    /// Filled circle with a top-left to bottom-right gradient
    GradientCircle { from: Rgb, to: Rgb },
    /// Rounded rectangle outline
    Border { color: Rgb, width: f32, radius: f32 },
    /// Filled five-point star
    Star { color: Rgb },
    /// Filled heart
    Heart { color: Rgb },
    /// Rectangle outline rotated about its center
    RotatedOutline { color: Rgb, width: f32, degrees: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Decoration {
    pub shape: Shape,
    pub placement: Placement,
    /// Overall opacity (0.0 - 1.0)
    pub opacity: f32,
}

/// Built-in overlay sets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Overlay {
    PinkCircle,
    YellowCircle,
    BlueCircle,
    GreenCircle,
    WhiteBorder,
    CornerStars,
    Heart,
    Diamond,
}

const PINK_400: Rgb = Rgb::new(0xF4, 0x72, 0xB6);
const PURPLE_600: Rgb = Rgb::new(0x93, 0x33, 0xEA);
const YELLOW_400: Rgb = Rgb::new(0xFA, 0xCC, 0x15);
const ORANGE_500: Rgb = Rgb::new(0xF9, 0x73, 0x16);
const BLUE_400: Rgb = Rgb::new(0x60, 0xA5, 0xFA);
const CYAN_500: Rgb = Rgb::new(0x06, 0xB6, 0xD4);
const GREEN_400: Rgb = Rgb::new(0x4A, 0xDE, 0x80);
const TEAL_500: Rgb = Rgb::new(0x14, 0xB8, 0xA6);
const RED_500: Rgb = Rgb::new(0xEF, 0x44, 0x44);
const PURPLE_500: Rgb = Rgb::new(0xA8, 0x55, 0xF7);

fn anchored(shape: Shape, anchor: Anchor, offset: f32, size: f32, opacity: f32) -> Decoration {
    Decoration {
        shape,
        placement: Placement::Anchored {
            anchor,
            offset,
            size,
        },
        opacity,
    }
}

fn inset(shape: Shape, inset: f32, opacity: f32) -> Decoration {
    Decoration {
        shape,
        placement: Placement::Inset { inset },
        opacity,
    }
}

impl Overlay {
    /// Decorations for a layout family
    ///
    /// Sizes are `(single, strip, compact)` in logical pixels.
    pub fn decorations(&self, kind: LayoutKind) -> Vec<Decoration> {
        let pick = |single: f32, strip: f32, compact: f32| match kind {
            LayoutKind::Single => single,
            LayoutKind::Strip => strip,
            LayoutKind::Compact => compact,
        };
        let corner_offset = pick(16.0, 8.0, 8.0);

        match self {
            Overlay::PinkCircle => vec![anchored(
                Shape::GradientCircle {
                    from: PINK_400,
                    to: PURPLE_600,
                },
                Anchor::TopRight,
                corner_offset,
                pick(80.0, 48.0, 56.0),
                0.9,
            )],
            Overlay::YellowCircle => vec![anchored(
                Shape::GradientCircle {
                    from: YELLOW_400,
                    to: ORANGE_500,
                },
                Anchor::TopLeft,
                corner_offset,
                pick(64.0, 40.0, 48.0),
                0.9,
            )],
            Overlay::BlueCircle => vec![anchored(
                Shape::GradientCircle {
                    from: BLUE_400,
                    to: CYAN_500,
                },
                Anchor::BottomRight,
                corner_offset,
                pick(96.0, 56.0, 64.0),
                0.9,
            )],
            Overlay::GreenCircle => vec![anchored(
                Shape::GradientCircle {
                    from: GREEN_400,
                    to: TEAL_500,
                },
                Anchor::Center,
                0.0,
                pick(128.0, 64.0, 80.0),
                0.9,
            )],
            Overlay::WhiteBorder => vec![inset(
                Shape::Border {
                    color: Rgb::WHITE,
                    width: pick(4.0, 3.0, 3.0),
                    radius: pick(16.0, 8.0, 8.0),
                },
                pick(16.0, 8.0, 8.0),
                0.6,
            )],
            Overlay::CornerStars => {
                let offset = pick(8.0, 4.0, 4.0);
                let size = pick(32.0, 24.0, 28.0);
                [
                    Anchor::TopLeft,
                    Anchor::TopRight,
                    Anchor::BottomLeft,
                    Anchor::BottomRight,
                ]
                .into_iter()
                .map(|anchor| {
                    anchored(Shape::Star { color: YELLOW_400 }, anchor, offset, size, 0.9)
                })
                .collect()
            }
            Overlay::Heart => vec![anchored(
                Shape::Heart { color: RED_500 },
                Anchor::TopRight,
                pick(8.0, 4.0, 4.0),
                pick(24.0, 20.0, 24.0),
                0.9,
            )],
            Overlay::Diamond => vec![inset(
                Shape::RotatedOutline {
                    color: PURPLE_500,
                    width: pick(4.0, 3.0, 3.0),
                    degrees: 45.0,
                },
                pick(8.0, 4.0, 4.0),
                0.8,
            )],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
    pub id: &'static str,
    pub name: &'static str,
    pub style: PanelStyle,
    pub overlay: Option<Overlay>,
}

impl Frame {
    /// Decorations for a layout family, empty for plain panel styles
    pub fn decorations(&self, kind: LayoutKind) -> Vec<Decoration> {
        self.overlay
            .map(|overlay| overlay.decorations(kind))
            .unwrap_or_default()
    }
}

/// Id of the frame without decorations
pub const NO_FRAME_ID: &str = "none";

const fn overlay_frame(id: &'static str, name: &'static str, overlay: Overlay) -> Frame {
    Frame {
        id,
        name,
        style: PanelStyle::STANDARD,
        overlay: Some(overlay),
    }
}

const fn panel_frame(id: &'static str, name: &'static str, padding: f32, border: f32) -> Frame {
    Frame {
        id,
        name,
        style: PanelStyle {
            padding,
            border_width: border,
        },
        overlay: None,
    }
}

static FRAMES: [Frame; 13] = [
    panel_frame(NO_FRAME_ID, "None", 12.0, 2.0),
    overlay_frame("overlay1", "Pink Corner Circle", Overlay::PinkCircle),
    overlay_frame("overlay2", "Yellow Corner Circle", Overlay::YellowCircle),
    overlay_frame("overlay3", "Blue Bottom Circle", Overlay::BlueCircle),
    overlay_frame("overlay4", "Green Center Circle", Overlay::GreenCircle),
    overlay_frame("overlay5", "White Border Frame", Overlay::WhiteBorder),
    overlay_frame("overlay6", "Corner Stars", Overlay::CornerStars),
    overlay_frame("overlay7", "Heart Corner", Overlay::Heart),
    overlay_frame("overlay8", "Diamond Frame", Overlay::Diamond),
    panel_frame("strip", "Photo Strip", 12.0, 2.0),
    panel_frame("polaroid", "Polaroid", 16.0, 2.0),
    panel_frame("vintage", "Vintage", 12.0, 4.0),
    panel_frame("modern", "Modern", 8.0, 2.0),
];

/// Lookup over the built-in frames
pub struct FrameCatalog;

impl FrameCatalog {
    pub fn all() -> &'static [Frame] {
        &FRAMES
    }

    pub fn get(id: &str) -> Option<&'static Frame> {
        FRAMES.iter().find(|f| f.id == id)
    }

    /// Find a frame by id, falling back to the undecorated frame
    pub fn get_or_none(id: &str) -> &'static Frame {
        Self::get(id).unwrap_or(&FRAMES[0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_styles_have_no_decorations() {
        for id in ["none", "strip", "polaroid", "vintage", "modern"] {
            let frame = FrameCatalog::get(id).unwrap();
            assert!(frame.decorations(LayoutKind::Single).is_empty(), "{id}");
        }
        assert_eq!(FrameCatalog::get("polaroid").unwrap().style.inset(), 18.0);
    }

    #[test]
    fn test_sizes_follow_layout_kind() {
        let frame = FrameCatalog::get("overlay1").unwrap();
        let size = |kind| match frame.decorations(kind)[0].placement {
            Placement::Anchored { size, .. } => size,
            Placement::Inset { .. } => unreachable!(),
        };
        assert_eq!(size(LayoutKind::Single), 80.0);
        assert_eq!(size(LayoutKind::Strip), 48.0);
        assert_eq!(size(LayoutKind::Compact), 56.0);
    }

    #[test]
    fn test_stars_fill_every_corner() {
        let stars = FrameCatalog::get("overlay6")
            .unwrap()
            .decorations(LayoutKind::Strip);
        assert_eq!(stars.len(), 4);
    }

    #[test]
    fn test_unknown_frame_falls_back_to_none() {
        assert_eq!(FrameCatalog::get_or_none("confetti").id, NO_FRAME_ID);
    }
}

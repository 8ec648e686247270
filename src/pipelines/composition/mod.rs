// SPDX-License-Identifier: GPL-3.0-only

//! Composition model
//!
//! [`compose`] turns the captured photos and the user's [`Customization`]
//! into a [`CompositionDescription`]: panel size and color, filtered photos
//! in their slots, resolved decorations and the caption block. It is pure
//! (same input, same description) and is shared by the live preview and the
//! final export.

pub mod caption;
pub mod geometry;

pub use caption::{Caption, CaptionLine, format_date_text};
pub use geometry::Rect;

use crate::catalog::{
    Decoration, FilterCatalog, FrameCatalog, LayoutCatalog, LayoutKind,
    filters::IDENTITY_FILTER_ID, frames::NO_FRAME_ID,
};
use crate::color::Rgb;
use crate::constants::{palette, text};
use crate::errors::ComposeError;
use crate::pipelines::photo::{EncodedImage, FilterEngine, Photo};
use geometry::{CAPTION_BOTTOM, CAPTION_GAP};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// User choices applied to the captured photos
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Customization {
    pub layout_id: String,
    pub filter_id: String,
    pub frame_id: String,
    pub frame_color: Rgb,
    pub watermark_text: String,
    pub show_date: bool,
    /// Date shown when `show_date` is set
    pub date_text: String,
}

impl Default for Customization {
    fn default() -> Self {
        Self {
            layout_id: LayoutCatalog::default_layout().id.to_string(),
            filter_id: IDENTITY_FILTER_ID.to_string(),
            frame_id: NO_FRAME_ID.to_string(),
            frame_color: Rgb::from_hex(palette::DEFAULT_FRAME_COLOR).unwrap_or_default(),
            watermark_text: text::DEFAULT_WATERMARK.to_string(),
            show_date: false,
            date_text: String::new(),
        }
    }
}

/// A photo placed in its slot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComposedSlot {
    /// Slot position within the layout
    pub slot: usize,
    /// Capture index of the photo
    pub photo_index: usize,
    pub rect: Rect,
    pub corner_radius: f32,
    /// Filtered photo; left out of serialized previews
    #[serde(skip)]
    pub image: EncodedImage,
    /// Filter actually applied
    pub filter_id: &'static str,
}

/// A decoration resolved to panel coordinates
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedDecoration {
    pub decoration: Decoration,
    pub rect: Rect,
}

/// Everything needed to draw a composite
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompositionDescription {
    pub layout_id: &'static str,
    pub frame_id: &'static str,
    pub width: f32,
    pub height: f32,
    pub background: Rgb,
    pub border_width: f32,
    /// Populated slots in capture order
    pub slots: Vec<ComposedSlot>,
    /// Slots the layout offers, populated or not
    pub slot_count: usize,
    pub decorations: Vec<PlacedDecoration>,
    pub caption: Caption,
}

impl CompositionDescription {
    /// Preview-friendly JSON without image bytes
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Compose with the default filter engine
pub fn compose(
    photos: &[Photo],
    customization: &Customization,
) -> Result<CompositionDescription, ComposeError> {
    compose_with(&FilterEngine::default(), photos, customization)
}

/// Compose using `engine` for filtering
pub fn compose_with(
    engine: &FilterEngine,
    photos: &[Photo],
    customization: &Customization,
) -> Result<CompositionDescription, ComposeError> {
    let layout = LayoutCatalog::get(&customization.layout_id)
        .ok_or_else(|| ComposeError::UnknownLayout(customization.layout_id.clone()))?;
    let frame = FrameCatalog::get_or_none(&customization.frame_id);
    let filter = FilterCatalog::get_or_identity(&customization.filter_id);
    if filter.id != customization.filter_id {
        debug!(filter_id = %customization.filter_id, "Filter not found, using identity");
    }

    let grid = geometry::slot_grid(layout, &frame.style);
    let selected = &photos[..photos.len().min(layout.slot_count)];

    let filtered: Vec<EncodedImage> = selected
        .par_iter()
        .map(|photo| engine.apply_filter(&photo.image, filter))
        .collect();

    let slots: Vec<ComposedSlot> = selected
        .iter()
        .zip(filtered)
        .zip(&grid.slots)
        .enumerate()
        .map(|(slot, ((photo, image), rect))| ComposedSlot {
            slot,
            photo_index: photo.index,
            rect: *rect,
            corner_radius: layout.metrics.corner_radius,
            image,
            filter_id: filter.id,
        })
        .collect();

    let inset = frame.style.inset();
    let width = layout.metrics.panel_width;
    let title_size = match layout.kind() {
        LayoutKind::Single => text::TITLE_SIZE_LARGE,
        _ => text::TITLE_SIZE,
    };
    let caption_top = grid.bottom + CAPTION_GAP;
    let caption = caption::build_caption(
        &customization.watermark_text,
        customization
            .show_date
            .then_some(customization.date_text.as_str()),
        title_size,
        customization.frame_color,
        inset,
        width - 2.0 * inset,
        caption_top,
    );
    let height = caption.bottom(caption_top) + CAPTION_BOTTOM + inset;

    let decorations = frame
        .decorations(layout.kind())
        .into_iter()
        .map(|decoration| PlacedDecoration {
            rect: geometry::place(&decoration.placement, width, height),
            decoration,
        })
        .collect();

    info!(
        layout = layout.id,
        frame = frame.id,
        filter = filter.id,
        photos = slots.len(),
        slot_count = layout.slot_count,
        width,
        height,
        "Composition built"
    );

    Ok(CompositionDescription {
        layout_id: layout.id,
        frame_id: frame.id,
        width,
        height,
        background: customization.frame_color,
        border_width: frame.style.border_width,
        slots,
        slot_count: layout.slot_count,
        decorations,
        caption,
    })
}

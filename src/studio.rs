// SPDX-License-Identifier: GPL-3.0-only

//! Preview and download boundary
//!
//! A [`Studio`] owns the photos handed off by a finished capture session and
//! the editable [`Customization`]. Every edit is visible through
//! [`Studio::preview`]; [`Studio::confirm`] freezes the customization until
//! [`Studio::reopen`] is called. Exports always reflect the current
//! customization.

use crate::catalog::LayoutCatalog;
use crate::color::Rgb;
use crate::config::Config;
use crate::errors::{BoothError, ComposeError, StorageError};
use crate::pipelines::composition::{
    CompositionDescription, Customization, caption::format_timestamp, compose_with,
};
use crate::pipelines::photo::{FilterEngine, Photo};
use crate::pipelines::render::{ExportFormat, ExportedArtifact, RenderOptions, Renderer};
use crate::storage;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug)]
pub struct Studio {
    photos: Vec<Photo>,
    customization: Customization,
    confirmed: bool,
    engine: FilterEngine,
    renderer: Renderer,
    app_tag: String,
    output_dir: PathBuf,
}

impl Studio {
    /// Studio for `photos` captured with `layout_id` and `filter_id`
    pub fn new(photos: Vec<Photo>, layout_id: &str, filter_id: &str, config: &Config) -> Self {
        Self::with_renderer(
            photos,
            layout_id,
            filter_id,
            config,
            Renderer::new(RenderOptions::from(config)),
        )
    }

    /// Same as [`Studio::new`] with a caller-supplied renderer
    pub fn with_renderer(
        photos: Vec<Photo>,
        layout_id: &str,
        filter_id: &str,
        config: &Config,
        renderer: Renderer,
    ) -> Self {
        let customization = Customization {
            layout_id: layout_id.to_string(),
            filter_id: filter_id.to_string(),
            frame_color: Rgb::from_hex(&config.default_frame_color).unwrap_or_default(),
            date_text: format_timestamp(&chrono::Local::now().naive_local()),
            ..Customization::default()
        };
        info!(photos = photos.len(), layout = layout_id, "Opening studio");
        Self {
            photos,
            customization,
            confirmed: false,
            engine: FilterEngine::new(config.capture_jpeg_quality),
            renderer,
            app_tag: config.app_tag.clone(),
            output_dir: storage::output_dir(config),
        }
    }

    pub fn photos(&self) -> &[Photo] {
        &self.photos
    }

    pub fn customization(&self) -> &Customization {
        &self.customization
    }

    pub fn is_confirmed(&self) -> bool {
        self.confirmed
    }

    /// Apply `change` unless the customization is frozen
    fn edit(&mut self, field: &'static str, change: impl FnOnce(&mut Customization)) {
        if self.confirmed {
            warn!(field, "Customization is confirmed, edit ignored");
            return;
        }
        change(&mut self.customization);
        debug!(field, "Customization edited");
    }

    /// Switch layout
    ///
    /// Unlike the other setters this reports a refused edit, since a layout
    /// change decides how many photos the composite shows.
    pub fn set_layout(&mut self, layout_id: &str) -> Result<(), ComposeError> {
        if self.confirmed {
            warn!(layout = layout_id, "Customization is confirmed, layout change refused");
            return Err(ComposeError::Confirmed);
        }
        if LayoutCatalog::get(layout_id).is_none() {
            return Err(ComposeError::UnknownLayout(layout_id.to_string()));
        }
        self.edit("layout", |c| c.layout_id = layout_id.to_string());
        Ok(())
    }

    pub fn set_filter(&mut self, filter_id: &str) {
        self.edit("filter", |c| c.filter_id = filter_id.to_string());
    }

    pub fn set_frame(&mut self, frame_id: &str) {
        self.edit("frame", |c| c.frame_id = frame_id.to_string());
    }

    pub fn set_frame_color(&mut self, color: Rgb) {
        self.edit("frame_color", |c| c.frame_color = color);
    }

    pub fn set_watermark(&mut self, text: &str) {
        self.edit("watermark", |c| c.watermark_text = text.to_string());
    }

    pub fn set_show_date(&mut self, show: bool) {
        self.edit("show_date", |c| c.show_date = show);
    }

    pub fn set_date_text(&mut self, text: &str) {
        self.edit("date_text", |c| c.date_text = text.to_string());
    }

    /// Live composition for the current customization
    pub fn preview(&self) -> Result<CompositionDescription, ComposeError> {
        compose_with(&self.engine, &self.photos, &self.customization)
    }

    /// Freeze the customization and return the composition it produces
    pub fn confirm(&mut self) -> Result<CompositionDescription, ComposeError> {
        let description = self.preview()?;
        self.confirmed = true;
        info!(
            layout = %self.customization.layout_id,
            filter = %self.customization.filter_id,
            frame = %self.customization.frame_id,
            "Customization confirmed"
        );
        Ok(description)
    }

    /// Allow edits again after a confirm
    pub fn reopen(&mut self) {
        self.confirmed = false;
    }

    /// Render the current customization in `format`
    pub fn export(&mut self, format: ExportFormat) -> Result<ExportedArtifact, BoothError> {
        let description = self.preview()?;
        let unix_millis = chrono::Utc::now().timestamp_millis();
        let artifact = self
            .renderer
            .export(&description, format, &self.app_tag, unix_millis)?;
        info!(
            filename = %artifact.filename,
            size = artifact.len(),
            confirmed = self.confirmed,
            "Export ready"
        );
        Ok(artifact)
    }

    /// Save `artifact` to `dir`, or to the configured output directory
    pub async fn save(
        &self,
        artifact: ExportedArtifact,
        dir: Option<&Path>,
    ) -> Result<PathBuf, StorageError> {
        let dir = dir.map_or_else(|| self.output_dir.clone(), Path::to_path_buf);
        storage::save_artifact(dir, artifact).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipelines::photo::PhotoEncoder;
    use image::{Rgba, RgbaImage};

    fn studio(count: usize) -> Studio {
        let photos = (0..count)
            .map(|index| Photo {
                index,
                image: PhotoEncoder::jpeg(90)
                    .encode(&RgbaImage::from_pixel(16, 12, Rgba([120, 80, 40, 255])))
                    .unwrap(),
            })
            .collect();
        let config = Config::default();
        Studio::with_renderer(
            photos,
            "strip",
            "normal",
            &config,
            Renderer::without_text(RenderOptions::from(&config)),
        )
    }

    #[test]
    fn test_edits_show_in_preview() {
        let mut studio = studio(4);
        studio.set_frame_color(Rgb::BLACK);
        studio.set_watermark("Party");
        let preview = studio.preview().unwrap();
        assert_eq!(preview.background, Rgb::BLACK);
        assert_eq!(preview.caption.color, Rgb::WHITE);
        assert_eq!(preview.caption.title.unwrap().text, "Party");
    }

    #[test]
    fn test_confirm_freezes_until_reopen() {
        let mut studio = studio(4);
        studio.confirm().unwrap();
        studio.set_watermark("Ignored");
        assert_eq!(studio.customization().watermark_text, "Photobooth");

        studio.reopen();
        studio.set_watermark("Kept");
        assert_eq!(studio.customization().watermark_text, "Kept");
    }

    #[test]
    fn test_unknown_layout_rejected() {
        let mut studio = studio(1);
        assert_eq!(
            studio.set_layout("mosaic"),
            Err(ComposeError::UnknownLayout("mosaic".into()))
        );
        assert_eq!(studio.customization().layout_id, "strip");
    }

    #[test]
    fn test_layout_change_refused_while_confirmed() {
        let mut studio = studio(4);
        studio.confirm().unwrap();
        assert_eq!(studio.set_layout("grid"), Err(ComposeError::Confirmed));
        assert_eq!(studio.customization().layout_id, "strip");

        studio.reopen();
        assert_eq!(studio.set_layout("grid"), Ok(()));
        assert_eq!(studio.customization().layout_id, "grid");
    }

    #[test]
    fn test_export_names_file_after_layout() {
        let mut studio = studio(2);
        let artifact = studio.export(ExportFormat::Png).unwrap();
        assert!(artifact.filename.starts_with("Photobooth-strip-"));
        assert!(artifact.filename.ends_with(".png"));
        assert!(artifact.bytes.starts_with(&[0x89, b'P', b'N', b'G']));
    }
}

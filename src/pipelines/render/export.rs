// SPDX-License-Identifier: GPL-3.0-only

//! Export encodings for the rendered composite
//!
//! The format only changes the final encoding; every format starts from the
//! same raster.

use crate::constants::export::PDF_DPI;
use crate::errors::RenderError;
use crate::pipelines::photo::encoding::{encode_jpeg, encode_png};
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;
use std::str::FromStr;
use tracing::info;

/// Export formats offered on the download screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Lossless raster
    Png,
    /// Lossy raster
    Jpeg,
    /// Single page document embedding the JPEG
    Pdf,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 3] = [ExportFormat::Png, ExportFormat::Jpeg, ExportFormat::Pdf];

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpeg => "jpg",
            ExportFormat::Pdf => "pdf",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Png => "image/png",
            ExportFormat::Jpeg => "image/jpeg",
            ExportFormat::Pdf => "application/pdf",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(ExportFormat::Png),
            "jpg" | "jpeg" => Ok(ExportFormat::Jpeg),
            "pdf" => Ok(ExportFormat::Pdf),
            other => Err(format!("Unknown export format: {}", other)),
        }
    }
}

/// Encoded composite ready to hand to the caller
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedArtifact {
    pub bytes: Vec<u8>,
    pub format: ExportFormat,
    /// Raster size in pixels
    pub width: u32,
    pub height: u32,
    /// Suggested file name
    pub filename: String,
}

impl ExportedArtifact {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// `{app_tag}-{layout_id}-{unix_millis}.{ext}`
pub fn suggested_filename(
    app_tag: &str,
    layout_id: &str,
    unix_millis: i64,
    format: ExportFormat,
) -> String {
    format!(
        "{}-{}-{}.{}",
        app_tag,
        layout_id,
        unix_millis,
        format.extension()
    )
}

/// Encode a raster in `format`
pub fn encode(
    pixels: &RgbaImage,
    format: ExportFormat,
    jpeg_quality: u8,
) -> Result<Vec<u8>, RenderError> {
    let bytes = match format {
        ExportFormat::Png => encode_png(pixels)?,
        ExportFormat::Jpeg => encode_jpeg(pixels, jpeg_quality)?,
        ExportFormat::Pdf => {
            let jpeg = encode_jpeg(pixels, jpeg_quality)?;
            pdf_with_jpeg(&jpeg, pixels.width(), pixels.height())
                .map_err(|e| RenderError::Encode(e.to_string()))?
        }
    };
    info!(
        format = %format,
        width = pixels.width(),
        height = pixels.height(),
        size = bytes.len(),
        "Composite encoded"
    );
    Ok(bytes)
}

/// Single page PDF showing one JPEG at full page size
///
/// The page measures the image at [`PDF_DPI`].
pub fn pdf_with_jpeg(jpeg: &[u8], width: u32, height: u32) -> std::io::Result<Vec<u8>> {
    let page_w = width as f32 * 72.0 / PDF_DPI;
    let page_h = height as f32 * 72.0 / PDF_DPI;
    let content = format!("q\n{page_w:.2} 0 0 {page_h:.2} 0 0 cm\n/Im0 Do\nQ\n");

    let mut out = Vec::with_capacity(jpeg.len() + 1024);
    let mut offsets = Vec::with_capacity(5);
    out.write_all(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n")?;

    offsets.push(out.len());
    out.write_all(b"1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n")?;

    offsets.push(out.len());
    out.write_all(b"2 0 obj\n<< /Type /Pages /Kids [3 0 R] /Count 1 >>\nendobj\n")?;

    offsets.push(out.len());
    write!(
        out,
        "3 0 obj\n<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {page_w:.2} {page_h:.2}] \
         /Resources << /XObject << /Im0 4 0 R >> >> /Contents 5 0 R >>\nendobj\n"
    )?;

    offsets.push(out.len());
    write!(
        out,
        "4 0 obj\n<< /Type /XObject /Subtype /Image /Width {width} /Height {height} \
         /ColorSpace /DeviceRGB /BitsPerComponent 8 /Filter /DCTDecode /Length {} >>\nstream\n",
        jpeg.len()
    )?;
    out.write_all(jpeg)?;
    out.write_all(b"\nendstream\nendobj\n")?;

    offsets.push(out.len());
    write!(
        out,
        "5 0 obj\n<< /Length {} >>\nstream\n{content}endstream\nendobj\n",
        content.len()
    )?;

    let xref = out.len();
    write!(out, "xref\n0 {}\n0000000000 65535 f \n", offsets.len() + 1)?;
    for offset in &offsets {
        write!(out, "{offset:010} 00000 n \n")?;
    }
    write!(
        out,
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref}\n%%EOF\n",
        offsets.len() + 1
    )?;
    Ok(out)
}

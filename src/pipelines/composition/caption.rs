// SPDX-License-Identifier: GPL-3.0-only

//! Caption block under the slots: watermark title plus optional date

use super::geometry::{CAPTION_LINE_GAP, Rect};
use crate::color::Rgb;
use crate::constants::text;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;

/// Display format for the date line, e.g. `Oct 16, 2026, 02:05:09 PM`
pub const DATE_DISPLAY_FORMAT: &str = "%b %-d, %Y, %I:%M:%S %p";

/// One centered line of caption text
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaptionLine {
    pub text: String,
    pub font_size: f32,
    pub opacity: f32,
    /// Line box; text is centered horizontally inside it
    pub rect: Rect,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Caption {
    pub color: Rgb,
    pub title: Option<CaptionLine>,
    pub date: Option<CaptionLine>,
}

impl Caption {
    pub fn lines(&self) -> impl Iterator<Item = &CaptionLine> {
        self.title.iter().chain(self.date.iter())
    }

    /// Bottom edge of the last line, or `top` when empty
    pub fn bottom(&self, top: f32) -> f32 {
        self.lines().map(|l| l.rect.bottom()).fold(top, f32::max)
    }
}

/// Format a timestamp the way the date line shows it
pub fn format_timestamp(timestamp: &NaiveDateTime) -> String {
    timestamp.format(DATE_DISPLAY_FORMAT).to_string()
}

/// Normalize user-supplied date text for display
///
/// RFC 3339, `YYYY-MM-DD HH:MM:SS` and `YYYY-MM-DD` are reformatted; any
/// other text is shown verbatim. Blank text yields no date line.
pub fn format_date_text(input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(format_timestamp(&dt.naive_local()));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(input, "%Y-%m-%d %H:%M:%S") {
        return Some(format_timestamp(&dt));
    }
    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Some(format_timestamp(&date.and_time(chrono::NaiveTime::MIN)));
    }
    Some(input.to_string())
}

/// Lay out the caption block starting at `top`
pub fn build_caption(
    title: &str,
    date_text: Option<&str>,
    title_size: f32,
    background: Rgb,
    left: f32,
    width: f32,
    top: f32,
) -> Caption {
    let mut y = top;

    let title = title.trim();
    let title = (!title.is_empty()).then(|| {
        let height = title_size * text::LINE_HEIGHT;
        let line = CaptionLine {
            text: title.to_string(),
            font_size: title_size,
            opacity: 1.0,
            rect: Rect::new(left, y, width, height),
        };
        y += height;
        line
    });

    let date = date_text.and_then(format_date_text).map(|formatted| {
        if title.is_some() {
            y += CAPTION_LINE_GAP;
        }
        CaptionLine {
            text: formatted,
            font_size: text::DATE_SIZE,
            opacity: text::DATE_OPACITY,
            rect: Rect::new(left, y, width, text::DATE_SIZE * text::LINE_HEIGHT),
        }
    });

    Caption {
        color: background.contrasting_text(),
        title,
        date,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_formats() {
        assert_eq!(
            format_date_text("2026-10-16T14:05:09+02:00").as_deref(),
            Some("Oct 16, 2026, 02:05:09 PM")
        );
        assert_eq!(
            format_date_text("2024-01-05 09:00:00").as_deref(),
            Some("Jan 5, 2024, 09:00:00 AM")
        );
        assert_eq!(
            format_date_text("2024-03-01").as_deref(),
            Some("Mar 1, 2024, 12:00:00 AM")
        );
    }

    #[test]
    fn test_free_text_and_blank() {
        assert_eq!(
            format_date_text("Summer party").as_deref(),
            Some("Summer party")
        );
        assert_eq!(format_date_text("   "), None);
    }

    #[test]
    fn test_date_line_sits_below_title() {
        let caption = build_caption("Party", Some("2024-03-01"), 14.0, Rgb::WHITE, 0.0, 100.0, 10.0);
        let title = caption.title.as_ref().unwrap();
        let date = caption.date.as_ref().unwrap();
        assert!(date.rect.y >= title.rect.bottom());
        assert_eq!(date.opacity, text::DATE_OPACITY);
        assert_eq!(caption.color, Rgb::new(0x37, 0x41, 0x51));
    }

    #[test]
    fn test_empty_caption_has_no_height() {
        let caption = build_caption("", None, 14.0, Rgb::BLACK, 0.0, 100.0, 42.0);
        assert_eq!(caption.lines().count(), 0);
        assert_eq!(caption.bottom(42.0), 42.0);
        assert_eq!(caption.color, Rgb::WHITE);
    }
}

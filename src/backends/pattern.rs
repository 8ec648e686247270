// SPDX-License-Identifier: GPL-3.0-only

//! Synthetic video source
//!
//! Produces deterministic color-bar frames without any hardware. Failure
//! modes (refused opens, late readiness, broken grabs) can be scripted, and
//! a shared [`SourceProbe`] counts device acquisitions.

use super::{StreamRequest, VideoFrame, VideoSource};
use crate::errors::CameraError;
use image::{Rgba, RgbaImage};
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::debug;

/// Shared open/close counters for a source
#[derive(Debug, Clone, Default)]
pub struct SourceProbe {
    open_attempts: Arc<AtomicUsize>,
    opens: Arc<AtomicUsize>,
    closes: Arc<AtomicUsize>,
    grabs: Arc<AtomicUsize>,
}

impl SourceProbe {
    pub fn open_attempts(&self) -> usize {
        self.open_attempts.load(Ordering::SeqCst)
    }

    /// Successful opens
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn grabs(&self) -> usize {
        self.grabs.load(Ordering::SeqCst)
    }

    /// Acquisitions not yet released
    pub fn active(&self) -> usize {
        self.opens().saturating_sub(self.closes())
    }
}

const BARS: [[u8; 3]; 7] = [
    [0xC0, 0xC0, 0xC0],
    [0xC0, 0xC0, 0x00],
    [0x00, 0xC0, 0xC0],
    [0x00, 0xC0, 0x00],
    [0xC0, 0x00, 0xC0],
    [0xC0, 0x00, 0x00],
    [0x00, 0x00, 0xC0],
];

pub struct TestPatternSource {
    width: u32,
    height: u32,
    open: bool,
    frame_count: u32,
    polls: u32,
    /// Polls before the first frame shows up (`None` never becomes ready)
    ready_after: Option<u32>,
    fail_opens: VecDeque<CameraError>,
    fail_grabs: bool,
    /// Time `open` and `grab_frame` block for, like a USB handshake
    latency: Duration,
    probe: SourceProbe,
}

impl TestPatternSource {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            open: false,
            frame_count: 0,
            polls: 0,
            ready_after: Some(0),
            fail_opens: VecDeque::new(),
            fail_grabs: false,
            latency: Duration::ZERO,
            probe: SourceProbe::default(),
        }
    }

    pub fn with_probe(mut self, probe: SourceProbe) -> Self {
        self.probe = probe;
        self
    }

    /// Fail the next open calls with these errors, in order
    pub fn fail_next_opens(mut self, errors: Vec<CameraError>) -> Self {
        self.fail_opens = errors.into();
        self
    }

    /// Report ready only after `polls` unsuccessful polls
    pub fn ready_after(mut self, polls: u32) -> Self {
        self.ready_after = Some(polls);
        self
    }

    /// Never deliver a first frame
    pub fn never_ready(mut self) -> Self {
        self.ready_after = None;
        self
    }

    /// Make every grab fail
    pub fn fail_grabs(mut self) -> Self {
        self.fail_grabs = true;
        self
    }

    /// Block the calling thread for `latency` on every open and grab
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn probe(&self) -> SourceProbe {
        self.probe.clone()
    }

    fn block(&self) {
        if !self.latency.is_zero() {
            std::thread::sleep(self.latency);
        }
    }

    fn render(&self) -> RgbaImage {
        let bar_width = (self.width / BARS.len() as u32).max(1);
        let shade = (self.frame_count % 32) as u8 * 2;
        RgbaImage::from_fn(self.width, self.height, |x, _| {
            let bar = ((x / bar_width) as usize).min(BARS.len() - 1);
            let [r, g, b] = BARS[bar];
            Rgba([r.saturating_add(shade), g, b, 255])
        })
    }
}

impl VideoSource for TestPatternSource {
    fn name(&self) -> &str {
        "test-pattern"
    }

    fn open(&mut self, request: &StreamRequest) -> Result<(), CameraError> {
        self.probe.open_attempts.fetch_add(1, Ordering::SeqCst);
        self.block();
        if self.open {
            return Ok(());
        }
        if let Some(error) = self.fail_opens.pop_front() {
            debug!(%error, "Scripted open failure");
            return Err(error);
        }
        if let Some(resolution) = request.resolution {
            self.width = resolution.width.max(1);
            self.height = resolution.height.max(1);
        }
        self.open = true;
        self.polls = 0;
        self.probe.opens.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn close(&mut self) {
        if self.open {
            self.open = false;
            self.probe.closes.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn poll_ready(&mut self) -> Result<bool, CameraError> {
        if !self.open {
            return Err(CameraError::Other("test pattern is not open".to_string()));
        }
        let ready = match self.ready_after {
            Some(after) => self.polls >= after,
            None => false,
        };
        self.polls = self.polls.saturating_add(1);
        Ok(ready)
    }

    fn grab_frame(&mut self) -> Result<VideoFrame, CameraError> {
        if !self.open {
            return Err(CameraError::Other("test pattern is not open".to_string()));
        }
        if self.fail_grabs {
            return Err(CameraError::Other("scripted grab failure".to_string()));
        }
        self.block();
        self.probe.grabs.fetch_add(1, Ordering::SeqCst);
        let frame = VideoFrame::from_rgba(self.render());
        self.frame_count = self.frame_count.wrapping_add(1);
        Ok(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_applies_requested_resolution() {
        let mut source = TestPatternSource::new(8, 8);
        source
            .open(&StreamRequest::preferred(crate::config::Resolution {
                width: 64,
                height: 48,
            }))
            .unwrap();
        let frame = source.grab_frame().unwrap();
        assert_eq!((frame.width, frame.height), (64, 48));
        assert_eq!(frame.data.len(), 64 * 48 * 4);
    }

    #[test]
    fn test_ready_after_polls() {
        let mut source = TestPatternSource::new(8, 8).ready_after(2);
        source.open(&StreamRequest::any()).unwrap();
        assert!(!source.poll_ready().unwrap());
        assert!(!source.poll_ready().unwrap());
        assert!(source.poll_ready().unwrap());
    }

    #[test]
    fn test_closed_source_refuses_grab() {
        let mut source = TestPatternSource::new(8, 8);
        assert!(source.grab_frame().is_err());
    }
}

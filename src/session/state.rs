// SPDX-License-Identifier: GPL-3.0-only

//! Capture session states, snapshots and timer effects

use crate::constants::CountdownSetting;
use crate::errors::CameraError;
use serde::Serialize;
use std::time::Duration;

/// Capture session state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "detail", rename_all = "kebab-case")]
pub enum CaptureState {
    /// No video source acquired
    Idle,
    /// Source opened, waiting for the first frame
    Starting,
    /// Live feed, waiting for a capture trigger
    Ready,
    /// Seconds left before the next shot
    Countdown(u32),
    /// Grabbing and processing a frame
    Capturing,
    /// Every slot of the layout is filled
    Complete,
    /// Camera failed; only an explicit restart leaves this state
    CameraError(CameraError),
}

impl CaptureState {
    /// Whether the session holds a live feed
    pub fn is_live(&self) -> bool {
        matches!(
            self,
            CaptureState::Ready
                | CaptureState::Countdown(_)
                | CaptureState::Capturing
                | CaptureState::Complete
        )
    }

    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            CaptureState::Idle => "idle",
            CaptureState::Starting => "starting",
            CaptureState::Ready => "ready",
            CaptureState::Countdown(_) => "countdown",
            CaptureState::Capturing => "capturing",
            CaptureState::Complete => "complete",
            CaptureState::CameraError(_) => "camera-error",
        }
    }
}

/// Observable session state for the capture screen
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub state: CaptureState,
    /// Seconds left while counting down
    pub countdown: Option<u32>,
    pub photo_count: usize,
    pub remaining: usize,
    /// All slots are filled and the photos can be handed off
    pub can_proceed: bool,
    pub layout_id: &'static str,
    pub filter_id: String,
    pub countdown_setting: CountdownSetting,
}

/// Side effect requested by a state transition
///
/// Timer effects carry the epoch that was current when they were issued.
/// Delivering them back with a stale epoch is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEffect {
    /// Call `poll_ready(epoch)` after the delay
    ScheduleReadyPoll { epoch: u64, after: Duration },
    /// Call `on_start_timeout(epoch)` after the delay
    ScheduleStartTimeout { epoch: u64, after: Duration },
    /// Call `on_tick(epoch)` after the delay
    ScheduleTick { epoch: u64, after: Duration },
    /// A photo was appended
    Captured { index: usize },
    /// The last slot was filled
    Completed,
}

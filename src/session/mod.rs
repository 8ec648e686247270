// SPDX-License-Identifier: GPL-3.0-only

//! Countdown-driven multi-shot capture
//!
//! [`CaptureSession`] is a synchronous state machine. Every operation
//! returns the [`SessionEffect`]s it needs (timers to schedule, captures to
//! announce) instead of spawning anything itself, so the same machine runs
//! under the async [`driver`] and in plain unit tests.
//!
//! ```text
//! Idle ─start─▶ Starting ─ready─▶ Ready ─trigger─▶ Countdown(n) ─0─▶ Capturing
//!                  │                ▲                                   │
//!               timeout             └──────────── remaining > 0 ────────┤
//!                  ▼                                                    ▼
//!            CameraError ◀──────────── grab failure ─────────────── Complete
//! ```

pub mod driver;
pub mod state;

pub use driver::{SessionDriver, SessionHandle};
pub use state::{CaptureState, SessionEffect, SessionSnapshot};

use crate::backends::{FeedLease, OpenFailure, StreamRequest, VideoSource};
use crate::catalog::{Layout, LayoutCatalog};
use crate::catalog::filters::IDENTITY_FILTER_ID;
use crate::config::{Config, Resolution};
use crate::constants::{CountdownSetting, timing};
use crate::errors::{CameraError, SessionError};
use crate::pipelines::photo::{Photo, PhotoCapture};
use std::time::Duration;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

pub struct CaptureSession {
    id: Uuid,
    state: CaptureState,
    layout: &'static Layout,
    filter_id: String,
    countdown: CountdownSetting,
    photos: Vec<Photo>,
    next_index: usize,
    /// Epoch for countdown ticks
    timer_epoch: u64,
    /// Epoch for start-up polls and the start timeout
    camera_epoch: u64,
    /// Source while no lease is held
    idle_source: Option<Box<dyn VideoSource>>,
    lease: Option<FeedLease>,
    capture: PhotoCapture,
    preferred_resolution: Resolution,
    start_timeout: Duration,
}

impl CaptureSession {
    pub fn new(source: Box<dyn VideoSource>, config: &Config) -> Self {
        let session = Self {
            id: Uuid::new_v4(),
            state: CaptureState::Idle,
            layout: LayoutCatalog::default_layout(),
            filter_id: IDENTITY_FILTER_ID.to_string(),
            countdown: config.countdown,
            photos: Vec::new(),
            next_index: 0,
            timer_epoch: 0,
            camera_epoch: 0,
            idle_source: Some(source),
            lease: None,
            capture: PhotoCapture::new(config.capture_jpeg_quality),
            preferred_resolution: config.preferred_resolution,
            start_timeout: config.camera_start_timeout(),
        };
        info!(session = %session.id, layout = session.layout.id, "Capture session created");
        session
    }

    // ===== Accessors =====

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> &CaptureState {
        &self.state
    }

    pub fn layout(&self) -> &'static Layout {
        self.layout
    }

    pub fn filter_id(&self) -> &str {
        &self.filter_id
    }

    pub fn countdown_setting(&self) -> CountdownSetting {
        self.countdown
    }

    /// Photos in capture order
    pub fn photos(&self) -> &[Photo] {
        &self.photos
    }

    /// Captures still needed to fill the layout
    pub fn remaining(&self) -> usize {
        self.layout.slot_count.saturating_sub(self.photos.len())
    }

    /// Whether a video source is currently acquired
    pub fn holds_source(&self) -> bool {
        self.lease.is_some()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state.clone(),
            countdown: match self.state {
                CaptureState::Countdown(n) => Some(n),
                _ => None,
            },
            photo_count: self.photos.len(),
            remaining: self.remaining(),
            can_proceed: self.remaining() == 0,
            layout_id: self.layout.id,
            filter_id: self.filter_id.clone(),
            countdown_setting: self.countdown,
        }
    }

    /// Hand the photos off, leaving the session empty
    pub fn take_photos(&mut self) -> Vec<Photo> {
        self.cancel_countdown();
        if matches!(self.state, CaptureState::Complete) {
            self.set_state(CaptureState::Ready);
        }
        self.next_index = 0;
        std::mem::take(&mut self.photos)
    }

    // ===== Camera lifecycle =====

    /// Acquire the video source
    ///
    /// Only acts from `Idle` or `CameraError`.
    pub fn start_camera(&mut self) -> Vec<SessionEffect> {
        if !matches!(self.state, CaptureState::Idle | CaptureState::CameraError(_)) {
            debug!(session = %self.id, state = self.state.name(), "Camera already started");
            return Vec::new();
        }

        let Some(source) = self.idle_source.take() else {
            return self.fail(CameraError::Other("video source unavailable".to_string()));
        };

        let request = StreamRequest::preferred(self.preferred_resolution);
        match FeedLease::acquire(source, request) {
            Ok(lease) => {
                self.lease = Some(lease);
                self.camera_epoch += 1;
                self.set_state(CaptureState::Starting);

                let epoch = self.camera_epoch;
                let mut effects = vec![SessionEffect::ScheduleStartTimeout {
                    epoch,
                    after: self.start_timeout,
                }];
                effects.extend(self.poll_ready(epoch));
                effects
            }
            Err(OpenFailure { source, error }) => {
                self.idle_source = Some(source);
                self.fail(error)
            }
        }
    }

    /// Check whether the first frame has arrived
    pub fn poll_ready(&mut self, epoch: u64) -> Vec<SessionEffect> {
        if epoch != self.camera_epoch || self.state != CaptureState::Starting {
            return Vec::new();
        }
        let polled = match self.lease.as_mut() {
            Some(lease) => lease.poll_ready(),
            None => Err(CameraError::Other("video source released".to_string())),
        };
        match polled {
            Ok(true) => self.on_camera_ready(),
            Ok(false) => vec![SessionEffect::ScheduleReadyPoll {
                epoch,
                after: timing::READY_POLL_INTERVAL,
            }],
            Err(e) => self.fail(e),
        }
    }

    /// Camera-ready signal
    ///
    /// The first signal while `Starting` wins; later ones are ignored.
    pub fn on_camera_ready(&mut self) -> Vec<SessionEffect> {
        if self.state != CaptureState::Starting {
            debug!(session = %self.id, state = self.state.name(), "Ignoring redundant ready signal");
            return Vec::new();
        }
        self.camera_epoch += 1;
        if self.remaining() == 0 {
            self.set_state(CaptureState::Complete);
        } else {
            self.set_state(CaptureState::Ready);
        }
        Vec::new()
    }

    /// Start-up timer expired
    pub fn on_start_timeout(&mut self, epoch: u64) -> Vec<SessionEffect> {
        if epoch != self.camera_epoch || self.state != CaptureState::Starting {
            return Vec::new();
        }
        warn!(
            session = %self.id,
            timeout_ms = self.start_timeout.as_millis() as u64,
            "Camera did not become ready in time"
        );
        self.fail(CameraError::Other(format!(
            "camera did not become ready within {} ms",
            self.start_timeout.as_millis()
        )))
    }

    /// Release the source and return to `Idle`
    ///
    /// Photos are kept for hand-off.
    pub fn stop(&mut self) {
        self.cancel_countdown();
        self.camera_epoch += 1;
        self.release_source();
        self.set_state(CaptureState::Idle);
    }

    // ===== Capture =====

    /// Begin the countdown for the next shot
    ///
    /// Ignored unless `Ready`, so a trigger during a running countdown or
    /// capture never yields a second shot.
    pub fn start_capture(&mut self) -> Vec<SessionEffect> {
        if self.state != CaptureState::Ready || self.remaining() == 0 {
            debug!(session = %self.id, state = self.state.name(), "Ignoring capture trigger");
            return Vec::new();
        }
        self.timer_epoch += 1;
        let seconds = self.countdown.seconds();
        info!(session = %self.id, seconds, "Starting countdown");
        self.set_state(CaptureState::Countdown(seconds));
        vec![SessionEffect::ScheduleTick {
            epoch: self.timer_epoch,
            after: timing::COUNTDOWN_TICK,
        }]
    }

    /// One countdown second elapsed
    pub fn on_tick(&mut self, epoch: u64) -> Vec<SessionEffect> {
        if epoch != self.timer_epoch {
            debug!(session = %self.id, epoch, current = self.timer_epoch, "Stale countdown tick");
            return Vec::new();
        }
        let CaptureState::Countdown(remaining) = self.state else {
            return Vec::new();
        };

        if remaining > 1 {
            self.set_state(CaptureState::Countdown(remaining - 1));
            vec![SessionEffect::ScheduleTick {
                epoch,
                after: timing::COUNTDOWN_TICK,
            }]
        } else {
            self.capture_now()
        }
    }

    fn capture_now(&mut self) -> Vec<SessionEffect> {
        self.set_state(CaptureState::Capturing);

        let index = self.next_index;
        let result = match self.lease.as_mut() {
            Some(lease) => self.capture.capture(lease, index, &self.filter_id),
            None => Err(CameraError::Other("video source released".to_string())),
        };

        match result {
            Ok(photo) => {
                self.next_index += 1;
                self.photos.push(photo);
                info!(
                    session = %self.id,
                    index,
                    photo_count = self.photos.len(),
                    remaining = self.remaining(),
                    "Photo captured"
                );

                let mut effects = vec![SessionEffect::Captured { index }];
                if self.remaining() == 0 {
                    self.set_state(CaptureState::Complete);
                    effects.push(SessionEffect::Completed);
                } else {
                    self.set_state(CaptureState::Ready);
                }
                effects
            }
            Err(e) => self.fail(e),
        }
    }

    // ===== Editing =====

    /// Remove the photo at `position` in capture order
    pub fn retake(&mut self, position: usize) -> Result<(), SessionError> {
        if position >= self.photos.len() {
            return Err(SessionError::PhotoIndexOutOfRange {
                index: position,
                count: self.photos.len(),
            });
        }
        let removed = self.photos.remove(position);
        info!(
            session = %self.id,
            position,
            index = removed.index,
            remaining = self.remaining(),
            "Photo removed for retake"
        );
        if self.state == CaptureState::Complete {
            self.set_state(CaptureState::Ready);
        }
        Ok(())
    }

    /// Switch layout, discarding captured photos
    pub fn select_layout(&mut self, id: &str) -> Result<(), SessionError> {
        let layout =
            LayoutCatalog::get(id).ok_or_else(|| SessionError::UnknownLayout(id.to_string()))?;
        info!(session = %self.id, layout = layout.id, slots = layout.slot_count, "Layout selected");
        self.layout = layout;
        self.clear_photos();
        Ok(())
    }

    /// Filter for subsequent captures
    ///
    /// Unknown ids are kept and behave as identity when applied.
    pub fn select_filter(&mut self, id: &str) {
        info!(session = %self.id, filter = id, "Filter selected");
        self.filter_id = id.to_string();
    }

    /// Countdown length for subsequent shots
    pub fn set_countdown(&mut self, setting: CountdownSetting) {
        info!(session = %self.id, countdown = setting.display_name(), "Countdown changed");
        self.countdown = setting;
    }

    /// Discard all photos and any running countdown
    pub fn reset_all(&mut self) {
        info!(session = %self.id, "Resetting session");
        self.clear_photos();
    }

    // ===== Internals =====

    fn clear_photos(&mut self) {
        self.cancel_countdown();
        self.photos.clear();
        self.next_index = 0;
        if matches!(
            self.state,
            CaptureState::Countdown(_) | CaptureState::Capturing | CaptureState::Complete
        ) {
            self.set_state(CaptureState::Ready);
        }
    }

    fn cancel_countdown(&mut self) {
        self.timer_epoch += 1;
    }

    fn release_source(&mut self) {
        if let Some(lease) = self.lease.take()
            && let Some(source) = lease.release()
        {
            self.idle_source = Some(source);
        }
    }

    fn fail(&mut self, error: CameraError) -> Vec<SessionEffect> {
        error!(session = %self.id, kind = error.kind(), %error, "Camera error");
        self.cancel_countdown();
        self.camera_epoch += 1;
        self.release_source();
        self.set_state(CaptureState::CameraError(error));
        Vec::new()
    }

    fn set_state(&mut self, state: CaptureState) {
        if self.state != state {
            debug!(
                session = %self.id,
                from = self.state.name(),
                to = state.name(),
                "State transition"
            );
            self.state = state;
        }
    }
}

impl std::fmt::Debug for CaptureSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureSession")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("layout", &self.layout.id)
            .field("filter_id", &self.filter_id)
            .field("photos", &self.photos.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::{SourceProbe, TestPatternSource};

    fn session_with(source: TestPatternSource) -> CaptureSession {
        let config = Config {
            preferred_resolution: Resolution {
                width: 32,
                height: 24,
            },
            ..Config::default()
        };
        CaptureSession::new(Box::new(source), &config)
    }

    fn run_countdown(session: &mut CaptureSession) -> Vec<SessionEffect> {
        let mut effects = session.start_capture();
        loop {
            match effects.as_slice() {
                [SessionEffect::ScheduleTick { epoch, .. }] => effects = session.on_tick(*epoch),
                _ => return effects,
            }
        }
    }

    #[test]
    fn test_start_camera_becomes_ready() {
        let mut session = session_with(TestPatternSource::new(8, 8));
        let effects = session.start_camera();
        assert!(matches!(
            effects[0],
            SessionEffect::ScheduleStartTimeout { .. }
        ));
        assert_eq!(session.state(), &CaptureState::Ready);
        assert_eq!(session.remaining(), 4);
    }

    #[test]
    fn test_countdown_ticks_down_before_capture() {
        let mut session = session_with(TestPatternSource::new(8, 8));
        session.start_camera();

        let effects = session.start_capture();
        assert_eq!(session.state(), &CaptureState::Countdown(3));
        let SessionEffect::ScheduleTick { epoch, after } = effects[0] else {
            panic!("expected a tick");
        };
        assert_eq!(after, Duration::from_secs(1));

        session.on_tick(epoch);
        assert_eq!(session.snapshot().countdown, Some(2));
        session.on_tick(epoch);
        assert_eq!(session.snapshot().countdown, Some(1));
        let effects = session.on_tick(epoch);
        assert_eq!(effects, vec![SessionEffect::Captured { index: 0 }]);
        assert_eq!(session.state(), &CaptureState::Ready);
        assert_eq!(session.photos().len(), 1);
    }

    #[test]
    fn test_trigger_during_countdown_is_ignored() {
        let mut session = session_with(TestPatternSource::new(8, 8));
        session.start_camera();
        let first = session.start_capture();
        assert!(session.start_capture().is_empty());
        assert_eq!(first.len(), 1);
    }

    #[test]
    fn test_layout_change_cancels_countdown() {
        let mut session = session_with(TestPatternSource::new(8, 8));
        session.start_camera();
        let effects = session.start_capture();
        let SessionEffect::ScheduleTick { epoch, .. } = effects[0] else {
            panic!("expected a tick");
        };

        session.select_layout("single").unwrap();
        assert_eq!(session.state(), &CaptureState::Ready);
        assert!(session.on_tick(epoch).is_empty());
        assert!(session.photos().is_empty());
        assert_eq!(session.remaining(), 1);
    }

    #[test]
    fn test_single_layout_completes_after_one_shot() {
        let mut session = session_with(TestPatternSource::new(8, 8));
        session.start_camera();
        session.select_layout("single").unwrap();
        let effects = run_countdown(&mut session);
        assert_eq!(
            effects,
            vec![SessionEffect::Captured { index: 0 }, SessionEffect::Completed]
        );
        assert!(session.snapshot().can_proceed);
        assert!(session.start_capture().is_empty());
    }

    #[test]
    fn test_start_timeout_surfaces_error_and_releases() {
        let probe = SourceProbe::default();
        let mut session =
            session_with(TestPatternSource::new(8, 8).never_ready().with_probe(probe.clone()));
        let effects = session.start_camera();
        assert_eq!(session.state(), &CaptureState::Starting);
        let SessionEffect::ScheduleStartTimeout { epoch, after } = effects[0] else {
            panic!("expected a start timeout");
        };
        assert_eq!(after, Duration::from_millis(3000));

        session.on_start_timeout(epoch);
        assert!(matches!(
            session.state(),
            CaptureState::CameraError(CameraError::Other(_))
        ));
        assert_eq!(probe.active(), 0);
    }

    #[test]
    fn test_late_ready_signal_is_ignored() {
        let mut session = session_with(TestPatternSource::new(8, 8).ready_after(1));
        let effects = session.start_camera();
        assert_eq!(session.state(), &CaptureState::Starting);
        let poll_epoch = effects
            .iter()
            .find_map(|e| match e {
                SessionEffect::ScheduleReadyPoll { epoch, .. } => Some(*epoch),
                _ => None,
            })
            .unwrap();

        session.on_camera_ready();
        assert_eq!(session.state(), &CaptureState::Ready);
        assert!(session.poll_ready(poll_epoch).is_empty());
        assert!(session.on_camera_ready().is_empty());
        assert_eq!(session.state(), &CaptureState::Ready);
    }

    #[test]
    fn test_permission_denied_needs_explicit_retry() {
        let mut session = session_with(
            TestPatternSource::new(8, 8).fail_next_opens(vec![CameraError::PermissionDenied]),
        );
        session.start_camera();
        assert_eq!(
            session.state(),
            &CaptureState::CameraError(CameraError::PermissionDenied)
        );
        assert!(session.start_capture().is_empty());

        session.start_camera();
        assert_eq!(session.state(), &CaptureState::Ready);
    }

    #[test]
    fn test_grab_failure_moves_to_camera_error() {
        let probe = SourceProbe::default();
        let mut session =
            session_with(TestPatternSource::new(8, 8).fail_grabs().with_probe(probe.clone()));
        session.start_camera();
        run_countdown(&mut session);
        assert!(matches!(
            session.state(),
            CaptureState::CameraError(CameraError::Other(_))
        ));
        assert!(session.photos().is_empty());
        assert_eq!(probe.active(), 0);
    }

    #[test]
    fn test_retake_out_of_range() {
        let mut session = session_with(TestPatternSource::new(8, 8));
        assert_eq!(
            session.retake(0),
            Err(SessionError::PhotoIndexOutOfRange { index: 0, count: 0 })
        );
    }

    #[test]
    fn test_unknown_layout_is_rejected() {
        let mut session = session_with(TestPatternSource::new(8, 8));
        assert_eq!(
            session.select_layout("panorama"),
            Err(SessionError::UnknownLayout("panorama".to_string()))
        );
        assert_eq!(session.layout().id, "strip");
    }

    #[test]
    fn test_drop_releases_source() {
        let probe = SourceProbe::default();
        {
            let mut session = session_with(TestPatternSource::new(8, 8).with_probe(probe.clone()));
            session.start_camera();
            assert_eq!(probe.active(), 1);
        }
        assert_eq!(probe.active(), 0);
        assert_eq!(probe.closes(), 1);
    }
}

// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the async session driver
//!
//! The tokio clock is paused, so countdowns and start-up timeouts run
//! instantly while keeping their relative timing.

use photobooth::backends::TestPatternSource;
use photobooth::config::{Config, Resolution};
use photobooth::constants::CountdownSetting;
use photobooth::errors::{CameraError, SessionError};
use photobooth::session::{CaptureSession, CaptureState, SessionDriver, SessionHandle};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::time::Instant;

fn config() -> Config {
    Config {
        preferred_resolution: Resolution {
            width: 64,
            height: 48,
        },
        ..Config::default()
    }
}

fn spawn(source: TestPatternSource) -> SessionHandle {
    photobooth::logging::init();
    SessionDriver::spawn(CaptureSession::new(Box::new(source), &config()))
}

async fn ready(handle: &SessionHandle) {
    handle.start_camera().await.unwrap();
    handle
        .wait_for(|s| s.state == CaptureState::Ready)
        .await
        .unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_strip_run_completes() {
    let source = TestPatternSource::new(64, 48);
    let probe = source.probe();
    let handle = spawn(source);
    ready(&handle).await;

    for n in 1..=4 {
        handle.start_capture().await.unwrap();
        handle.wait_for(|s| s.photo_count == n).await.unwrap();
    }
    let snapshot = handle.snapshot();
    assert_eq!(snapshot.state, CaptureState::Complete);
    assert!(snapshot.can_proceed);
    assert_eq!(snapshot.remaining, 0);

    let photos = handle.take_photos().await.unwrap();
    let order: Vec<_> = photos.iter().map(|p| p.index).collect();
    assert_eq!(order, vec![0, 1, 2, 3]);

    handle.shutdown().await.unwrap();
    handle
        .wait_for(|s| s.state == CaptureState::Idle)
        .await
        .unwrap();
    assert_eq!(probe.active(), 0);
}

/// Keep sleeping in 10 ms steps until `done`, returning the longest step
async fn longest_sleep(done: Arc<AtomicBool>) -> Duration {
    let mut longest = Duration::ZERO;
    while !done.load(Ordering::SeqCst) {
        let started = Instant::now();
        tokio::time::sleep(Duration::from_millis(10)).await;
        longest = longest.max(started.elapsed());
    }
    longest
}

// Real clock: the source blocks its thread the way a V4L2 handshake does
#[tokio::test]
async fn test_slow_source_keeps_runtime_responsive() {
    let latency = Duration::from_millis(300);
    let source = TestPatternSource::new(64, 48).with_latency(latency);
    let probe = source.probe();
    let handle = spawn(source);

    let done = Arc::new(AtomicBool::new(false));
    let sleeper = tokio::spawn(longest_sleep(Arc::clone(&done)));

    ready(&handle).await;
    handle.start_capture().await.unwrap();
    handle.wait_for(|s| s.photo_count == 1).await.unwrap();
    done.store(true, Ordering::SeqCst);

    let longest = sleeper.await.unwrap();
    assert_eq!(probe.grabs(), 1);
    assert!(longest < latency * 2 / 3, "runtime stalled for {longest:?}");
}

#[tokio::test(start_paused = true)]
async fn test_countdown_lasts_configured_seconds() {
    let handle = spawn(TestPatternSource::new(64, 48));
    handle.set_countdown(CountdownSetting::Five).await.unwrap();
    ready(&handle).await;

    let started = Instant::now();
    handle.start_capture().await.unwrap();
    let counting = handle.wait_for(|s| s.countdown.is_some()).await.unwrap();
    assert_eq!(counting.countdown, Some(5));

    handle.wait_for(|s| s.photo_count == 1).await.unwrap();
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(5), "{elapsed:?}");
    assert!(elapsed < Duration::from_secs(6), "{elapsed:?}");
}

#[tokio::test(start_paused = true)]
async fn test_repeated_trigger_captures_once() {
    let source = TestPatternSource::new(64, 48);
    let probe = source.probe();
    let handle = spawn(source);
    ready(&handle).await;

    handle.start_capture().await.unwrap();
    handle.start_capture().await.unwrap();
    handle.wait_for(|s| s.photo_count == 1).await.unwrap();

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(handle.snapshot().photo_count, 1);
    assert_eq!(probe.grabs(), 1);
    assert_eq!(handle.snapshot().state, CaptureState::Ready);
}

#[tokio::test(start_paused = true)]
async fn test_start_timeout_reports_error() {
    let source = TestPatternSource::new(64, 48).never_ready();
    let probe = source.probe();
    let handle = spawn(source);

    let started = Instant::now();
    handle.start_camera().await.unwrap();
    let snapshot = handle
        .wait_for(|s| matches!(s.state, CaptureState::CameraError(_)))
        .await
        .unwrap();

    assert!(matches!(
        snapshot.state,
        CaptureState::CameraError(CameraError::Other(_))
    ));
    assert!(started.elapsed() >= config().camera_start_timeout());
    assert_eq!(probe.active(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_slow_camera_becomes_ready_before_timeout() {
    let handle = spawn(TestPatternSource::new(64, 48).ready_after(5));
    ready(&handle).await;
    assert!(handle.snapshot().state.is_live());
}

#[tokio::test(start_paused = true)]
async fn test_layout_change_mid_countdown_cancels_shot() {
    let source = TestPatternSource::new(64, 48);
    let probe = source.probe();
    let handle = spawn(source);
    ready(&handle).await;

    handle.start_capture().await.unwrap();
    handle.wait_for(|s| s.countdown.is_some()).await.unwrap();
    handle.select_layout("single").await.unwrap();

    tokio::time::sleep(Duration::from_secs(5)).await;
    let snapshot = handle.snapshot();
    assert_eq!(snapshot.layout_id, "single");
    assert_eq!(snapshot.photo_count, 0);
    assert_eq!(snapshot.state, CaptureState::Ready);
    assert_eq!(probe.grabs(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_errors_are_returned_to_caller() {
    let handle = spawn(TestPatternSource::new(64, 48));
    assert_eq!(
        handle.select_layout("mosaic").await,
        Err(SessionError::UnknownLayout("mosaic".into()))
    );
    assert_eq!(
        handle.retake(2).await,
        Err(SessionError::PhotoIndexOutOfRange { index: 2, count: 0 })
    );
}

#[tokio::test(start_paused = true)]
async fn test_dropping_handle_releases_source() {
    let source = TestPatternSource::new(64, 48);
    let probe = source.probe();
    let handle = spawn(source);
    ready(&handle).await;
    assert_eq!(probe.active(), 1);

    let mut snapshots = handle.subscribe();
    drop(handle);
    snapshots
        .wait_for(|s| s.state == CaptureState::Idle)
        .await
        .unwrap();
    assert_eq!(probe.active(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_closed_session_reports_error() {
    let handle = spawn(TestPatternSource::new(64, 48));
    handle.shutdown().await.unwrap();
    handle
        .wait_for(|s| s.state == CaptureState::Idle)
        .await
        .unwrap();
    // Give the actor a moment to drop its receiver
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(handle.start_camera().await, Err(SessionError::SessionClosed));
}

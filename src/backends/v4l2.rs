// SPDX-License-Identifier: GPL-3.0-only

//! V4L2 webcam source
//!
//! Streams MJPEG frames from a `/dev/video*` node on a dedicated capture
//! thread. Only the most recent decoded frame is kept; the session grabs it
//! on demand.
//!
//! Buffer dequeues time out, so a device that stops delivering frames
//! cannot keep the thread from seeing a close request.

use super::{StreamRequest, VideoFrame, VideoSource};
use crate::constants::timing;
use crate::errors::CameraError;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, mpsc};
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, info, warn};
use v4l::buffer::Type;
use v4l::io::traits::CaptureStream;
use v4l::prelude::*;
use v4l::video::Capture;

type LatestFrame = Arc<Mutex<Option<VideoFrame>>>;

pub struct V4l2Source {
    device_path: String,
    running: Arc<AtomicBool>,
    latest: LatestFrame,
    thread: Option<JoinHandle<()>>,
}

impl V4l2Source {
    pub fn new(device_path: impl Into<String>) -> Self {
        Self {
            device_path: device_path.into(),
            running: Arc::new(AtomicBool::new(false)),
            latest: Arc::new(Mutex::new(None)),
            thread: None,
        }
    }

    fn latest(&self) -> Option<VideoFrame> {
        self.latest.lock().ok().and_then(|guard| guard.clone())
    }
}

impl VideoSource for V4l2Source {
    fn name(&self) -> &str {
        &self.device_path
    }

    fn open(&mut self, request: &StreamRequest) -> Result<(), CameraError> {
        if self.thread.is_some() {
            return Ok(());
        }

        let (ready_tx, ready_rx) = mpsc::channel();
        let device_path = self.device_path.clone();
        let request = *request;
        let running = Arc::clone(&self.running);
        let latest = Arc::clone(&self.latest);
        running.store(true, Ordering::SeqCst);

        let handle = std::thread::Builder::new()
            .name("v4l2-capture".to_string())
            .spawn(move || {
                if let Err(e) = capture_loop(&device_path, request, &ready_tx, &running, &latest) {
                    let _ = ready_tx.send(Err(e));
                }
                running.store(false, Ordering::SeqCst);
            })
            .map_err(CameraError::from)?;

        match ready_rx.recv() {
            Ok(Ok(())) => {
                self.thread = Some(handle);
                Ok(())
            }
            Ok(Err(e)) => {
                let _ = handle.join();
                Err(e)
            }
            Err(_) => {
                let _ = handle.join();
                Err(CameraError::Other("capture thread exited".to_string()))
            }
        }
    }

    fn close(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread.take() {
            if handle.join().is_err() {
                warn!(device = %self.device_path, "Capture thread panicked");
            }
            info!(device = %self.device_path, "V4L2 stream closed");
        }
        if let Ok(mut guard) = self.latest.lock() {
            *guard = None;
        }
    }

    fn is_open(&self) -> bool {
        self.thread.is_some()
    }

    fn poll_ready(&mut self) -> Result<bool, CameraError> {
        if self.thread.is_some() && !self.running.load(Ordering::SeqCst) {
            return Err(CameraError::Other("capture thread stopped".to_string()));
        }
        Ok(self.latest().is_some())
    }

    fn grab_frame(&mut self) -> Result<VideoFrame, CameraError> {
        self.latest()
            .ok_or_else(|| CameraError::Other("no frame available".to_string()))
    }
}

impl Drop for V4l2Source {
    fn drop(&mut self) {
        self.close();
    }
}

fn capture_loop(
    device_path: &str,
    request: StreamRequest,
    ready: &mpsc::Sender<Result<(), CameraError>>,
    running: &AtomicBool,
    latest: &LatestFrame,
) -> Result<(), CameraError> {
    static FRAME_COUNTER: AtomicU64 = AtomicU64::new(0);

    info!(device_path, ?request, "Opening V4L2 device");
    let mut dev = Device::with_path(device_path).map_err(CameraError::from)?;

    let mjpg = v4l::FourCC::new(b"MJPG");
    let mut format = dev.format().map_err(CameraError::from)?;
    if let Some(resolution) = request.resolution {
        format.width = resolution.width;
        format.height = resolution.height;
    }
    format.fourcc = mjpg;

    let format = dev.set_format(&format).map_err(CameraError::from)?;
    if format.fourcc != mjpg {
        warn!(got = ?format.fourcc, "Device does not offer MJPEG");
        return Err(CameraError::Unsupported);
    }
    if let Some(resolution) = request.resolution
        && (format.width, format.height) != (resolution.width, resolution.height)
    {
        return Err(CameraError::Unsupported);
    }
    info!(width = format.width, height = format.height, "Set V4L2 format");

    let mut stream =
        MmapStream::with_buffers(&mut dev, Type::VideoCapture, 4).map_err(CameraError::from)?;
    stream.set_timeout(timing::V4L2_DEQUEUE_TIMEOUT);
    let _ = ready.send(Ok(()));

    while running.load(Ordering::SeqCst) {
        match stream.next() {
            Ok((buf, meta)) => {
                let frame_num = FRAME_COUNTER.fetch_add(1, Ordering::Relaxed);
                match image::load_from_memory_with_format(buf, image::ImageFormat::Jpeg) {
                    Ok(decoded) => {
                        let frame = VideoFrame::from_rgba(decoded.to_rgba8());
                        if let Ok(mut guard) = latest.lock() {
                            *guard = Some(frame);
                        }
                        if frame_num % 60 == 0 {
                            debug!(frame = frame_num, sequence = meta.sequence, "Frame captured");
                        }
                    }
                    Err(e) => {
                        if frame_num % 30 == 0 {
                            warn!(frame = frame_num, error = %e, "Dropping undecodable frame");
                        }
                    }
                }
            }
            Err(e) if is_dequeue_timeout(&e) => {
                debug!(device_path, "No frame within dequeue timeout");
            }
            Err(e) => {
                warn!(error = %e, "Failed to capture frame");
                std::thread::sleep(Duration::from_millis(10));
            }
        }
    }

    info!("V4L2 capture loop ended");
    Ok(())
}

/// A dequeue that gave up waiting, as opposed to a device error
fn is_dequeue_timeout(error: &io::Error) -> bool {
    matches!(error.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dequeue_timeout_is_not_a_device_error() {
        assert!(is_dequeue_timeout(&io::Error::new(
            io::ErrorKind::TimedOut,
            "VIDIOC_DQBUF"
        )));
        assert!(!is_dequeue_timeout(&io::Error::new(
            io::ErrorKind::NotFound,
            "device unplugged"
        )));
    }

    #[test]
    fn test_dequeue_timeout_is_shorter_than_start_timeout() {
        assert!(
            timing::V4L2_DEQUEUE_TIMEOUT.as_millis() < u128::from(timing::CAMERA_START_TIMEOUT_MS)
        );
    }

    #[test]
    fn test_close_without_open_returns() {
        let mut source = V4l2Source::new("/dev/video-missing");
        source.close();
        assert!(!source.is_open());
    }
}

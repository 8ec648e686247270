// SPDX-License-Identifier: GPL-3.0-only

//! Scoped ownership of an open video source
//!
//! A [`FeedLease`] exists only while its source is open. The source is
//! closed exactly once: by [`FeedLease::release`], or on drop.

use super::{StreamRequest, VideoFrame, VideoSource};
use crate::errors::CameraError;
use tracing::{debug, info, warn};

/// Failed open, carrying the closed source back to the caller
pub struct OpenFailure {
    pub source: Box<dyn VideoSource>,
    pub error: CameraError,
}

impl std::fmt::Debug for OpenFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenFailure")
            .field("source", &self.source.name())
            .field("error", &self.error)
            .finish()
    }
}

pub struct FeedLease {
    source: Option<Box<dyn VideoSource>>,
    request: StreamRequest,
}

impl FeedLease {
    /// Open `source`, retrying once without a resolution constraint
    ///
    /// Permission and missing-device failures are not retried. On failure
    /// the closed source is handed back so the caller can retry later.
    pub fn acquire(
        mut source: Box<dyn VideoSource>,
        preferred: StreamRequest,
    ) -> Result<Self, OpenFailure> {
        info!(source = source.name(), ?preferred, "Opening video source");

        let request = match source.open(&preferred) {
            Ok(()) => preferred,
            Err(e) if e.is_retryable() && preferred.resolution.is_some() => {
                warn!(
                    source = source.name(),
                    error = %e,
                    "Preferred resolution failed, retrying with any resolution"
                );
                let fallback = StreamRequest::any();
                match source.open(&fallback) {
                    Ok(()) => fallback,
                    Err(error) => return Err(OpenFailure { source, error }),
                }
            }
            Err(error) => return Err(OpenFailure { source, error }),
        };

        debug!(source = source.name(), ?request, "Video source open");
        Ok(Self {
            source: Some(source),
            request,
        })
    }

    /// Request the source was opened with
    pub fn request(&self) -> StreamRequest {
        self.request
    }

    pub fn name(&self) -> &str {
        self.source.as_ref().map(|s| s.name()).unwrap_or("released")
    }

    pub fn poll_ready(&mut self) -> Result<bool, CameraError> {
        match self.source.as_mut() {
            Some(source) => source.poll_ready(),
            None => Err(CameraError::Other("video source released".to_string())),
        }
    }

    pub fn grab_frame(&mut self) -> Result<VideoFrame, CameraError> {
        match self.source.as_mut() {
            Some(source) => source.grab_frame(),
            None => Err(CameraError::Other("video source released".to_string())),
        }
    }

    /// Close the source and hand it back
    pub fn release(mut self) -> Option<Box<dyn VideoSource>> {
        self.source.take().map(|mut source| {
            source.close();
            info!(source = source.name(), "Video source released");
            source
        })
    }
}

impl Drop for FeedLease {
    fn drop(&mut self) {
        if let Some(mut source) = self.source.take() {
            source.close();
            info!(source = source.name(), "Video source released on drop");
        }
    }
}

impl std::fmt::Debug for FeedLease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedLease")
            .field("source", &self.name())
            .field("request", &self.request)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::{SourceProbe, TestPatternSource};
    use crate::config::Resolution;

    #[test]
    fn test_release_closes_once() {
        let probe = SourceProbe::default();
        let source = TestPatternSource::new(32, 24).with_probe(probe.clone());
        let lease = FeedLease::acquire(
            Box::new(source),
            StreamRequest::preferred(Resolution::default()),
        )
        .unwrap();
        assert_eq!(probe.active(), 1);

        let source = lease.release().unwrap();
        assert!(!source.is_open());
        assert_eq!(probe.opens(), 1);
        assert_eq!(probe.closes(), 1);
        assert_eq!(probe.active(), 0);
    }

    #[test]
    fn test_drop_closes() {
        let probe = SourceProbe::default();
        let source = TestPatternSource::new(8, 8).with_probe(probe.clone());
        {
            let _lease = FeedLease::acquire(Box::new(source), StreamRequest::any()).unwrap();
            assert_eq!(probe.active(), 1);
        }
        assert_eq!(probe.active(), 0);
        assert_eq!(probe.closes(), 1);
    }

    #[test]
    fn test_fallback_after_unsupported_resolution() {
        let source = TestPatternSource::new(8, 8)
            .fail_next_opens(vec![CameraError::Unsupported]);
        let lease = FeedLease::acquire(
            Box::new(source),
            StreamRequest::preferred(Resolution::default()),
        )
        .unwrap();
        assert_eq!(lease.request(), StreamRequest::any());
    }

    #[test]
    fn test_permission_denied_is_not_retried() {
        let probe = SourceProbe::default();
        let source = TestPatternSource::new(8, 8)
            .with_probe(probe.clone())
            .fail_next_opens(vec![CameraError::PermissionDenied]);
        let failure = FeedLease::acquire(
            Box::new(source),
            StreamRequest::preferred(Resolution::default()),
        )
        .unwrap_err();
        assert_eq!(failure.error, CameraError::PermissionDenied);
        assert_eq!(probe.open_attempts(), 1);
        assert_eq!(probe.active(), 0);
    }
}

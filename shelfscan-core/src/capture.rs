//! Capture session state machine
//!
//! One session runs camera-acquire to handoff-or-abort. Side effects
//! (camera, network) sit behind the injected [`Camera`] and
//! [`CoverAnalyzer`] capabilities; the transitions themselves are plain
//! functions over [`CaptureState`].

use std::sync::Arc;

use image::DynamicImage;

use crate::analyzer::CoverAnalyzer;
use crate::camera::{Camera, READY_FOR_CAPTURE};
use crate::error::AnalysisError;
use crate::normalize::{self, MAX_DIMENSION};
use crate::types::{AnalysisResult, CapturedImage, ImageOrigin};

/// States of one capture session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureState {
    /// No live stream; carries the acquisition error when one occurred
    Idle { camera_error: Option<String> },

    /// Stream is live, waiting for a shutter or upload action
    Capturing,

    /// Normalize + analyze in flight; further actions are ignored
    Processing,

    /// Terminal: image and analysis were handed to review, camera released
    Handoff,
}

/// Payload handed to the review stage on success
#[derive(Debug, Clone)]
pub struct Handoff {
    pub image: CapturedImage,
    pub analysis: AnalysisResult,
}

/// Outcome of a shutter or upload action
#[derive(Debug)]
pub enum CaptureOutcome {
    /// Silent no-op: wrong state, camera not warmed up, or an attempt
    /// already in flight
    Ignored,

    /// Normalization produced nothing; "capture failed, try again"
    CaptureFailed,

    /// The analysis call failed; the session is back to capturing with the
    /// camera still live
    AnalysisFailed(AnalysisError),

    /// A newer attempt superseded this one while it was in flight; the
    /// result was discarded unacted-upon
    Superseded,

    /// Success; the session is over and the camera released
    Ready(Handoff),
}

pub struct CaptureController<C: Camera> {
    camera: C,
    analyzer: Arc<dyn CoverAnalyzer>,
    state: CaptureState,
    /// Monotone attempt token; results whose token no longer matches are
    /// discarded (last capture wins)
    attempt: u64,
    torch_on: bool,
}

impl<C: Camera> CaptureController<C> {
    pub fn new(camera: C, analyzer: Arc<dyn CoverAnalyzer>) -> Self {
        Self {
            camera,
            analyzer,
            state: CaptureState::Idle { camera_error: None },
            attempt: 0,
            torch_on: false,
        }
    }

    pub fn state(&self) -> &CaptureState {
        &self.state
    }

    pub fn camera(&self) -> &C {
        &self.camera
    }

    pub fn torch_on(&self) -> bool {
        self.torch_on
    }

    /// Enter the session: acquire the camera stream. On failure the session
    /// sits in `Idle` with the error surfaced and a retry available.
    pub async fn start(&mut self) {
        match self.camera.acquire().await {
            Ok(()) => self.state = CaptureState::Capturing,
            Err(e) => {
                tracing::warn!("camera acquisition failed: {}", e);
                self.state = CaptureState::Idle {
                    camera_error: Some(e.to_string()),
                };
            }
        }
    }

    /// Re-attempt acquisition after a surfaced camera error.
    pub async fn retry_acquire(&mut self) {
        if matches!(self.state, CaptureState::Idle { .. }) {
            self.start().await;
        }
    }

    /// Shutter action: grab the current live frame and run the pipeline.
    ///
    /// A silent no-op while the camera is still warming up (readiness below
    /// the capture threshold or zero intrinsic width).
    pub async fn shutter(&mut self) -> CaptureOutcome {
        if self.state != CaptureState::Capturing {
            return CaptureOutcome::Ignored;
        }
        if self.camera.ready_state() < READY_FOR_CAPTURE {
            tracing::debug!("camera not ready yet");
            return CaptureOutcome::Ignored;
        }
        let Some(frame) = self.camera.frame() else {
            tracing::debug!("no frame available");
            return CaptureOutcome::Ignored;
        };
        if frame.width == 0 {
            tracing::debug!("camera not ready yet");
            return CaptureOutcome::Ignored;
        }

        let image = normalize::normalize(&frame, ImageOrigin::LiveCapture, MAX_DIMENSION);
        self.process(image).await
    }

    /// Upload action: run a decoded still image through the pipeline.
    ///
    /// Also permitted from `Idle`, so a denied camera does not block file
    /// ingestion.
    pub async fn upload(&mut self, still: &DynamicImage) -> CaptureOutcome {
        match self.state {
            CaptureState::Capturing | CaptureState::Idle { .. } => {}
            _ => return CaptureOutcome::Ignored,
        }

        let image = normalize::normalize(still, ImageOrigin::UploadedFile, MAX_DIMENSION);
        self.process(image).await
    }

    /// Cancel the session (navigation away). The camera is released and any
    /// in-flight analysis result will be discarded when it resolves.
    pub fn cancel(&mut self) {
        self.attempt += 1;
        self.camera.release();
        self.state = CaptureState::Idle { camera_error: None };
    }

    /// Torch toggle; unsupported or failing hardware is swallowed.
    pub fn toggle_torch(&mut self) {
        if !self.camera.supports_torch() {
            return;
        }
        let want = !self.torch_on;
        match self.camera.set_torch(want) {
            Ok(()) => self.torch_on = want,
            Err(e) => tracing::debug!("torch toggle failed: {}", e),
        }
    }

    async fn process(&mut self, image: Option<CapturedImage>) -> CaptureOutcome {
        let resume = std::mem::replace(&mut self.state, CaptureState::Processing);
        let token = self.begin_attempt();

        let Some(image) = image else {
            tracing::warn!("normalization produced an empty image");
            self.state = resume;
            return CaptureOutcome::CaptureFailed;
        };

        let analysis = self.analyzer.analyze(&image).await;
        self.finish_attempt(token, resume, image, analysis)
    }

    fn begin_attempt(&mut self) -> u64 {
        self.attempt += 1;
        self.attempt
    }

    /// Apply an attempt's result. Failures restore the pre-processing state
    /// (camera stays live for an immediate retry); a stale token means a
    /// newer attempt owns the session and this result is dropped.
    fn finish_attempt(
        &mut self,
        token: u64,
        resume: CaptureState,
        image: CapturedImage,
        analysis: Result<AnalysisResult, AnalysisError>,
    ) -> CaptureOutcome {
        if self.attempt != token {
            tracing::debug!(token, current = self.attempt, "discarding stale analysis result");
            return CaptureOutcome::Superseded;
        }

        match analysis {
            Ok(analysis) => {
                self.state = CaptureState::Handoff;
                self.camera.release();
                CaptureOutcome::Ready(Handoff { image, analysis })
            }
            Err(e) => {
                tracing::warn!("cover analysis failed: {}", e);
                self.state = resume;
                CaptureOutcome::AnalysisFailed(e)
            }
        }
    }
}

impl<C: Camera> Drop for CaptureController<C> {
    // The stream must be released on every exit path, error and
    // navigation-away included
    fn drop(&mut self) {
        self.camera.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::PlaceholderAnalyzer;
    use crate::camera::MockCamera;
    use crate::normalize::RawFrame;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    fn placeholder() -> Arc<dyn CoverAnalyzer> {
        Arc::new(PlaceholderAnalyzer::with_delay(Duration::ZERO))
    }

    struct FailingAnalyzer;

    #[async_trait::async_trait]
    impl CoverAnalyzer for FailingAnalyzer {
        async fn analyze(&self, _: &CapturedImage) -> Result<AnalysisResult, AnalysisError> {
            Err(AnalysisError::EmptyResponse)
        }
    }

    #[tokio::test]
    async fn test_shutter_happy_path_scales_and_hands_off() {
        let camera = MockCamera::working(RawFrame::solid(1600, 1200, [90, 90, 90, 255]));
        let releases = camera.release_counter();
        let mut controller = CaptureController::new(camera, placeholder());

        controller.start().await;
        assert_eq!(*controller.state(), CaptureState::Capturing);

        let outcome = controller.shutter().await;
        let CaptureOutcome::Ready(handoff) = outcome else {
            panic!("expected handoff, got {:?}", outcome);
        };
        assert_eq!((handoff.image.width, handoff.image.height), (800, 600));
        assert_eq!(handoff.analysis, PlaceholderAnalyzer::fixed_result());
        assert_eq!(*controller.state(), CaptureState::Handoff);

        // Camera released on success
        assert!(releases.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test]
    async fn test_acquisition_failure_surfaces_error_and_retry_works() {
        let camera = MockCamera::failing("permission denied");
        let mut controller = CaptureController::new(camera, placeholder());

        controller.start().await;
        match controller.state() {
            CaptureState::Idle { camera_error: Some(e) } => {
                assert!(e.contains("permission denied"))
            }
            other => panic!("expected idle with error, got {:?}", other),
        }

        // MockCamera::failing fails once; the retry acquires
        controller.retry_acquire().await;
        assert_eq!(*controller.state(), CaptureState::Capturing);
    }

    #[tokio::test]
    async fn test_shutter_is_noop_while_camera_warms_up() {
        let mut camera = MockCamera::working(RawFrame::solid(640, 480, [1, 2, 3, 255]));
        camera.ready_state = 1;
        let mut controller = CaptureController::new(camera, placeholder());

        controller.start().await;
        assert!(matches!(controller.shutter().await, CaptureOutcome::Ignored));
        assert_eq!(*controller.state(), CaptureState::Capturing);
    }

    #[tokio::test]
    async fn test_shutter_is_noop_on_zero_width_frame() {
        let camera = MockCamera::working(RawFrame {
            width: 0,
            height: 480,
            rgba: Vec::new(),
        });
        let mut controller = CaptureController::new(camera, placeholder());

        controller.start().await;
        assert!(matches!(controller.shutter().await, CaptureOutcome::Ignored));
        assert_eq!(*controller.state(), CaptureState::Capturing);
    }

    #[tokio::test]
    async fn test_analysis_failure_returns_to_capturing_with_camera_live() {
        let camera = MockCamera::working(RawFrame::solid(800, 600, [50, 50, 50, 255]));
        let releases = camera.release_counter();
        let mut controller = CaptureController::new(camera, Arc::new(FailingAnalyzer));

        controller.start().await;
        let outcome = controller.shutter().await;
        assert!(matches!(outcome, CaptureOutcome::AnalysisFailed(_)));
        assert_eq!(*controller.state(), CaptureState::Capturing);
        // The camera was not torn down; retry needs no re-acquisition
        assert_eq!(releases.load(Ordering::SeqCst), 0);
        assert!(controller.camera().acquired);
    }

    #[tokio::test]
    async fn test_upload_allowed_when_camera_failed() {
        let camera = MockCamera::failing("no device");
        let mut controller = CaptureController::new(camera, placeholder());
        controller.start().await;

        let still = DynamicImage::new_rgb8(1200, 1600);
        let outcome = controller.upload(&still).await;
        let CaptureOutcome::Ready(handoff) = outcome else {
            panic!("expected handoff");
        };
        assert_eq!((handoff.image.width, handoff.image.height), (600, 800));
        assert_eq!(handoff.image.origin, ImageOrigin::UploadedFile);
    }

    #[tokio::test]
    async fn test_actions_ignored_after_handoff() {
        let camera = MockCamera::working(RawFrame::solid(320, 240, [9, 9, 9, 255]));
        let mut controller = CaptureController::new(camera, placeholder());
        controller.start().await;
        assert!(matches!(controller.shutter().await, CaptureOutcome::Ready(_)));

        assert!(matches!(controller.shutter().await, CaptureOutcome::Ignored));
        let still = DynamicImage::new_rgb8(10, 10);
        assert!(matches!(controller.upload(&still).await, CaptureOutcome::Ignored));
    }

    #[tokio::test]
    async fn test_stale_attempt_result_is_discarded() {
        let camera = MockCamera::working(RawFrame::solid(100, 100, [0, 0, 0, 255]));
        let mut controller = CaptureController::new(camera, placeholder());
        controller.start().await;

        let stale_token = controller.begin_attempt();
        let image = normalize::normalize(
            &RawFrame::solid(100, 100, [0, 0, 0, 255]),
            ImageOrigin::LiveCapture,
            MAX_DIMENSION,
        )
        .unwrap();

        // A newer attempt (recapture) starts before the first resolves
        controller.begin_attempt();

        let outcome = controller.finish_attempt(
            stale_token,
            CaptureState::Capturing,
            image,
            Ok(PlaceholderAnalyzer::fixed_result()),
        );
        assert!(matches!(outcome, CaptureOutcome::Superseded));
    }

    #[tokio::test]
    async fn test_cancel_releases_camera_and_invalidates_attempts() {
        let camera = MockCamera::working(RawFrame::solid(100, 100, [0, 0, 0, 255]));
        let releases = camera.release_counter();
        let mut controller = CaptureController::new(camera, placeholder());
        controller.start().await;

        let token = controller.begin_attempt();
        controller.cancel();
        assert_eq!(releases.load(Ordering::SeqCst), 1);
        assert_eq!(
            *controller.state(),
            CaptureState::Idle { camera_error: None }
        );

        let image = normalize::normalize(
            &RawFrame::solid(100, 100, [0, 0, 0, 255]),
            ImageOrigin::LiveCapture,
            MAX_DIMENSION,
        )
        .unwrap();
        let outcome = controller.finish_attempt(
            token,
            CaptureState::Capturing,
            image,
            Ok(PlaceholderAnalyzer::fixed_result()),
        );
        assert!(matches!(outcome, CaptureOutcome::Superseded));
    }

    #[tokio::test]
    async fn test_camera_released_on_drop() {
        let camera = MockCamera::working(RawFrame::solid(100, 100, [0, 0, 0, 255]));
        let releases = camera.release_counter();
        {
            let mut controller = CaptureController::new(camera, placeholder());
            controller.start().await;
        }
        assert!(releases.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test]
    async fn test_torch_toggle_swallows_failures() {
        let mut camera = MockCamera::working(RawFrame::solid(100, 100, [0, 0, 0, 255]));
        camera.torch_supported = true;
        let mut controller = CaptureController::new(camera, placeholder());
        controller.start().await;

        controller.toggle_torch();
        assert!(controller.torch_on());
        controller.toggle_torch();
        assert!(!controller.torch_on());
    }

    #[tokio::test]
    async fn test_torch_toggle_noop_without_support() {
        let camera = MockCamera::working(RawFrame::solid(100, 100, [0, 0, 0, 255]));
        let mut controller = CaptureController::new(camera, placeholder());
        controller.start().await;

        controller.toggle_torch();
        assert!(!controller.torch_on());
    }
}

//! Camera capability boundary
//!
//! The capture state machine only ever touches hardware through [`Camera`],
//! so it is testable without a device.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::CaptureError;
use crate::normalize::RawFrame;

/// Readiness level at which a live frame may be grabbed; mirrors the
/// "current data available" threshold of media streams.
pub const READY_FOR_CAPTURE: u8 = 2;

/// A device camera stream as seen by the capture controller.
#[async_trait]
pub trait Camera: Send {
    /// Acquire the stream, preferring the rear-facing camera.
    async fn acquire(&mut self) -> Result<(), CaptureError>;

    /// Release the stream. Must be safe to call repeatedly and without a
    /// prior successful acquire.
    fn release(&mut self);

    /// Readiness level of the live stream; frames may be grabbed at
    /// [`READY_FOR_CAPTURE`] and above.
    fn ready_state(&self) -> u8;

    /// Grab the current live frame, if one is available.
    fn frame(&self) -> Option<RawFrame>;

    /// Whether the stream exposes a torch/flash light
    fn supports_torch(&self) -> bool {
        false
    }

    /// Toggle the torch. Failures are cosmetic; callers swallow them.
    fn set_torch(&mut self, _on: bool) -> Result<(), CaptureError> {
        Err(CaptureError::TorchNotSupported)
    }
}

/// Camera for hosts without capture hardware: acquisition always fails, so
/// sessions run on the file-upload path only.
#[derive(Debug, Default)]
pub struct NoCamera;

#[async_trait]
impl Camera for NoCamera {
    async fn acquire(&mut self) -> Result<(), CaptureError> {
        Err(CaptureError::CameraUnavailable(
            "no camera device on this host".to_string(),
        ))
    }

    fn release(&mut self) {}

    fn ready_state(&self) -> u8 {
        0
    }

    fn frame(&self) -> Option<RawFrame> {
        None
    }
}

/// Scripted camera (for testing)
pub struct MockCamera {
    /// When set, `acquire` fails with this message
    pub acquire_error: Option<String>,
    pub ready_state: u8,
    pub frame: Option<RawFrame>,
    pub torch_supported: bool,
    pub torch_fails: bool,
    pub torch_on: bool,
    pub acquired: bool,
    releases: Arc<AtomicUsize>,
}

impl MockCamera {
    /// A healthy camera delivering the given frame
    pub fn working(frame: RawFrame) -> Self {
        Self {
            acquire_error: None,
            ready_state: 4,
            frame: Some(frame),
            torch_supported: false,
            torch_fails: false,
            torch_on: false,
            acquired: false,
            releases: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A camera whose acquisition fails (permission denied, missing device)
    pub fn failing(message: impl Into<String>) -> Self {
        let mut camera = Self::working(RawFrame::solid(0, 0, [0, 0, 0, 0]));
        camera.acquire_error = Some(message.into());
        camera.frame = None;
        camera
    }

    /// Shared counter of release calls, for asserting teardown discipline
    /// after the controller is dropped
    pub fn release_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.releases)
    }
}

#[async_trait]
impl Camera for MockCamera {
    async fn acquire(&mut self) -> Result<(), CaptureError> {
        match self.acquire_error.take() {
            Some(message) => Err(CaptureError::CameraUnavailable(message)),
            None => {
                self.acquired = true;
                Ok(())
            }
        }
    }

    fn release(&mut self) {
        self.acquired = false;
        self.releases.fetch_add(1, Ordering::SeqCst);
    }

    fn ready_state(&self) -> u8 {
        self.ready_state
    }

    fn frame(&self) -> Option<RawFrame> {
        self.frame.clone()
    }

    fn supports_torch(&self) -> bool {
        self.torch_supported
    }

    fn set_torch(&mut self, on: bool) -> Result<(), CaptureError> {
        if self.torch_fails {
            return Err(CaptureError::TorchNotSupported);
        }
        self.torch_on = on;
        Ok(())
    }
}

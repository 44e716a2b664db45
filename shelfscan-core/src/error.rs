//! Error types for ShelfScan Core

use thiserror::Error;

/// Result type alias using ShelfScanError
pub type Result<T> = std::result::Result<T, ShelfScanError>;

/// Top-level error type for all ShelfScan operations
#[derive(Debug, Error)]
pub enum ShelfScanError {
    #[error("Analysis error: {0}")]
    Analysis(#[from] AnalysisError),

    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),

    #[error("Snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from the external cover-analysis exchange.
/// Never retried automatically: retry is a user-initiated recapture.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("empty response")]
    EmptyResponse,

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Service error ({status}): {message}")]
    Service { status: u16, message: String },
}

/// Errors inside a capture session
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Camera unavailable: {0}")]
    CameraUnavailable(String),

    #[error("Torch not supported by this camera")]
    TorchNotSupported,
}

/// Errors loading or writing the catalog snapshot
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Invalid snapshot: {0}")]
    Parse(#[from] serde_json::Error),
}

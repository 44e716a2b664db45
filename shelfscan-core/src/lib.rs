//! ShelfScan Core Library
//!
//! Capture-to-catalog pipeline for a personal book tracker: a photographed
//! cover is normalized (downscaled, flattened, re-encoded), sent to a
//! multimodal analysis service for title/author/genre extraction, confirmed
//! by the user in a review step, and committed to the catalog of record.

pub mod analyzer;
pub mod camera;
pub mod capture;
pub mod config;
pub mod error;
pub mod normalize;
pub mod review;
pub mod snapshot;
pub mod stats;
pub mod store;
pub mod types;

pub use error::{AnalysisError, CaptureError, Result, ShelfScanError, SnapshotError};
pub use types::{AnalysisResult, BookRecord, BookStatus, CapturedImage, ImageOrigin};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_default() {
        assert_eq!(BookStatus::default(), BookStatus::ToRead);
    }
}

//! Core data model: catalog records and the transient capture values

mod analysis;
mod book;
mod image;

pub use analysis::AnalysisResult;
pub use book::{BookRecord, BookStatus};
pub use image::{CapturedImage, ImageOrigin};

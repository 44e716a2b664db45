//! Scan command: run the capture pipeline on an image file
//!
//! The CLI has no live camera, so sessions run on the upload path; the
//! controller surfaces the (expected) acquisition failure and accepts the
//! file anyway, exactly as the capture screen does when camera permission
//! is denied.

use std::time::Duration;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use shelfscan_core::analyzer::analyzer_from_config;
use shelfscan_core::camera::NoCamera;
use shelfscan_core::capture::{CaptureController, CaptureOutcome};
use shelfscan_core::config::Config;
use shelfscan_core::review::ReviewSession;
use shelfscan_core::BookStatus;

use super::open_store;

/// Review-field overrides from the command line
pub struct ScanOverrides {
    pub title: Option<String>,
    pub author: Option<String>,
    pub genre: Option<String>,
    pub status: BookStatus,
}

pub async fn scan(image_path: &str, overrides: ScanOverrides, dry_run: bool) -> Result<()> {
    let config = Config::from_env();

    let still = image::open(image_path)
        .with_context(|| format!("Failed to open image: {}", image_path))?;

    let analyzer = analyzer_from_config(&config);
    if analyzer.is_placeholder() {
        println!("No analysis credential configured; using placeholder results.");
    }

    let mut controller = CaptureController::new(NoCamera, analyzer);
    controller.start().await;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner());
    spinner.set_message("Analyzing cover...");
    spinner.enable_steady_tick(Duration::from_millis(100));

    let outcome = controller.upload(&still).await;
    spinner.finish_and_clear();

    let handoff = match outcome {
        CaptureOutcome::Ready(handoff) => handoff,
        CaptureOutcome::CaptureFailed => {
            anyhow::bail!("Could not process this image, try another file")
        }
        CaptureOutcome::AnalysisFailed(e) => anyhow::bail!("Cover analysis failed: {}", e),
        CaptureOutcome::Ignored | CaptureOutcome::Superseded => {
            anyhow::bail!("Capture was not accepted")
        }
    };

    let mut review = ReviewSession::from_handoff(handoff);
    if let Some(title) = overrides.title {
        review.title = title;
    }
    if let Some(author) = overrides.author {
        review.author = author;
    }
    if let Some(genre) = overrides.genre {
        review.genre = genre;
    }
    review.status = overrides.status;

    println!("Title:  {}", review.title);
    println!("Author: {}", review.author);
    println!("Genre:  {}", review.genre);
    println!("Status: {}", review.status);
    if !review.notes.is_empty() {
        println!("Notes:  {}", review.notes);
    }

    if dry_run {
        println!("(dry run, nothing added)");
        return Ok(());
    }

    let mut store = open_store(&config).await;
    if review.genre.is_empty() {
        let suggestions = review.genre_suggestions(&store);
        if !suggestions.is_empty() {
            println!("Known genres: {}", suggestions.join(", "));
        }
    }

    let id = review.commit(&mut store).await;
    println!("Added to library: {}", id);
    Ok(())
}

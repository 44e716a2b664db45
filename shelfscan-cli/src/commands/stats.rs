//! Statistics and export commands

use anyhow::{Context, Result};
use shelfscan_core::config::Config;
use shelfscan_core::stats::{export_csv, library_stats};

use super::open_store;

pub async fn stats(json: bool) -> Result<()> {
    let config = Config::from_env();
    let store = open_store(&config).await;
    let stats = library_stats(&store);

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("Books:     {}", stats.total);
    println!("To read:   {}", stats.status.to_read);
    println!("Reading:   {}", stats.status.reading);
    println!("Finished:  {}", stats.status.finished);
    println!("Favorites: {}", stats.favorites);
    if let Some(progress) = stats.average_progress {
        println!("Progress:  {}% average", progress);
    }

    if !stats.genres.is_empty() {
        println!("Genres:");
        for genre in &stats.genres {
            println!("  {:3}  {}", genre.count, genre.name);
        }
    }
    if !stats.monthly_added.is_empty() {
        println!("Added per month:");
        for month in &stats.monthly_added {
            println!("  {}  {}", month.month, month.count);
        }
    }
    Ok(())
}

pub async fn export(output: &str) -> Result<()> {
    let config = Config::from_env();
    let store = open_store(&config).await;

    let csv = export_csv(&store);
    std::fs::write(output, csv)
        .with_context(|| format!("Failed to write export to {}", output))?;

    println!("Exported {} books to {}", store.len(), output);
    Ok(())
}

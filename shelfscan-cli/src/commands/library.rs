//! Catalog browsing and editing commands

use anyhow::{Context, Result};
use shelfscan_core::config::Config;
use shelfscan_core::review::EditSession;
use shelfscan_core::store::{BookPatch, NewBook, DEFAULT_GENRE};
use shelfscan_core::types::{BookRecord, BookStatus, CapturedImage, ImageOrigin};

use super::{open_store, parse_id};

pub async fn add(
    title: String,
    author: String,
    genre: Option<String>,
    status: BookStatus,
    notes: Option<String>,
) -> Result<()> {
    let config = Config::from_env();
    let mut store = open_store(&config).await;

    let genre = genre
        .filter(|g| !g.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_GENRE.to_string());

    let id = store
        .create(NewBook {
            title,
            author,
            genre: Some(genre),
            status,
            notes,
            ..NewBook::default()
        })
        .await;

    println!("Added to library: {}", id);
    Ok(())
}

pub async fn list(
    status: Option<BookStatus>,
    search: Option<&str>,
    favorites: bool,
    json: bool,
) -> Result<()> {
    let config = Config::from_env();
    let store = open_store(&config).await;

    let books: Vec<&BookRecord> = store
        .search(search.unwrap_or(""))
        .into_iter()
        .filter(|book| status.map_or(true, |s| book.status == s))
        .filter(|book| !favorites || book.is_favorite)
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&books)?);
        return Ok(());
    }

    if books.is_empty() {
        println!("No books found.");
        return Ok(());
    }
    for book in books {
        print_line(book);
    }
    Ok(())
}

pub async fn show(id: &str, json: bool, cover_out: Option<&str>) -> Result<()> {
    let config = Config::from_env();
    let store = open_store(&config).await;

    let id = parse_id(id)?;
    let book = store
        .get(id)
        .with_context(|| format!("No book with id {}", id))?;

    if json {
        println!("{}", serde_json::to_string_pretty(book)?);
    } else {
        println!("Title:    {}", book.title);
        println!("Author:   {}", book.author);
        println!("Status:   {}", book.status);
        if let Some(genre) = &book.genre {
            println!("Genre:    {}", genre);
        }
        if let Some(percent) = book.progress_percent() {
            println!(
                "Progress: {}/{} ({}%)",
                book.current_page.unwrap_or(0),
                book.total_pages.unwrap_or(0),
                percent
            );
        }
        if let Some(notes) = &book.notes {
            println!("Notes:    {}", notes);
        }
        println!("Added:    {}", book.added_at.format("%Y-%m-%d"));
        if book.is_favorite {
            println!("Favorite: yes");
        }
    }

    if let Some(path) = cover_out {
        let uri = book
            .cover_url
            .as_ref()
            .context("This book has no stored cover image")?;
        let cover = CapturedImage::from_data_uri(uri, ImageOrigin::UploadedFile)
            .context("Stored cover is not a decodable data URI")?;
        std::fs::write(path, cover.as_bytes())
            .with_context(|| format!("Failed to write cover to {}", path))?;
        println!("Cover written to {}", path);
    }

    Ok(())
}

pub async fn update(
    id: &str,
    status: Option<BookStatus>,
    current_page: Option<u32>,
    total_pages: Option<u32>,
    notes: Option<String>,
    favorite: Option<bool>,
) -> Result<()> {
    let config = Config::from_env();
    let mut store = open_store(&config).await;
    let id = parse_id(id)?;

    // Edit the record the way the detail view does when it exists; an
    // unknown id stays a silent no-op like the store contract says
    if let Some(mut session) = EditSession::open(&store, id) {
        if let Some(status) = status {
            session.status = status;
        }
        if let Some(current_page) = current_page {
            session.current_page = current_page;
        }
        if let Some(total_pages) = total_pages {
            session.total_pages = total_pages;
        }
        if let Some(notes) = notes {
            session.notes = notes;
        }
        if let Some(favorite) = favorite {
            session.is_favorite = favorite;
        }
        session.commit(&mut store).await;
        println!("Updated {}", id);
    } else {
        store.update(id, BookPatch::default()).await;
        println!("No book with id {} (nothing changed)", id);
    }
    Ok(())
}

pub async fn delete(id: &str) -> Result<()> {
    let config = Config::from_env();
    let mut store = open_store(&config).await;
    let id = parse_id(id)?;

    let known = store.get(id).is_some();
    store.delete(id).await;
    if known {
        println!("Deleted {}", id);
    } else {
        println!("No book with id {} (nothing changed)", id);
    }
    Ok(())
}

fn print_line(book: &BookRecord) {
    let star = if book.is_favorite { " ★" } else { "" };
    let genre = book.genre.as_deref().unwrap_or("-");
    let progress = book
        .progress_percent()
        .map(|p| format!(" {}%", p))
        .unwrap_or_default();
    println!(
        "{}  {} by {} [{}] ({}){}{}",
        book.id, book.title, book.author, book.status, genre, progress, star
    );
}

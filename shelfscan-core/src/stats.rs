//! Derived statistics and catalog export

use std::collections::BTreeMap;

use serde::Serialize;

use crate::store::{LibraryStore, StatusCounts};

/// Count of books in one genre
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenreStat {
    pub name: String,
    pub count: usize,
}

/// Books added in one calendar month (`YYYY-MM`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyStat {
    pub month: String,
    pub count: usize,
}

/// Everything the statistics screen shows
#[derive(Debug, Serialize)]
pub struct LibraryStats {
    pub total: usize,
    pub status: StatusCounts,
    pub favorites: usize,
    /// Mean display progress over books that track pages, percent
    pub average_progress: Option<u32>,
    pub genres: Vec<GenreStat>,
    pub monthly_added: Vec<MonthlyStat>,
}

pub fn library_stats(store: &LibraryStore) -> LibraryStats {
    let mut genre_counts: BTreeMap<String, usize> = BTreeMap::new();
    for book in store.books() {
        if let Some(genre) = book.genre.as_ref().filter(|g| !g.is_empty()) {
            *genre_counts.entry(genre.clone()).or_default() += 1;
        }
    }
    let mut genres: Vec<GenreStat> = genre_counts
        .into_iter()
        .map(|(name, count)| GenreStat { name, count })
        .collect();
    // Largest genres first; ties stay alphabetical
    genres.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));

    let mut monthly: BTreeMap<String, usize> = BTreeMap::new();
    for book in store.books() {
        *monthly
            .entry(book.added_at.format("%Y-%m").to_string())
            .or_default() += 1;
    }
    let monthly_added = monthly
        .into_iter()
        .map(|(month, count)| MonthlyStat { month, count })
        .collect();

    let progresses: Vec<u32> = store
        .books()
        .iter()
        .filter_map(|book| book.progress_percent())
        .collect();
    let average_progress = (!progresses.is_empty())
        .then(|| progresses.iter().sum::<u32>() / progresses.len() as u32);

    LibraryStats {
        total: store.len(),
        status: store.status_counts(),
        favorites: store.favorites().len(),
        average_progress,
        genres,
        monthly_added,
    }
}

/// Export the whole catalog as CSV (the app's Excel/CSV backup), RFC 4180
/// quoting.
pub fn export_csv(store: &LibraryStore) -> String {
    let mut out = String::from(
        "id,title,author,status,genre,added_at,current_page,total_pages,is_favorite,notes\r\n",
    );
    for book in store.books() {
        let fields = [
            book.id.to_string(),
            book.title.clone(),
            book.author.clone(),
            book.status.label().to_string(),
            book.genre.clone().unwrap_or_default(),
            book.added_at.to_rfc3339(),
            book.current_page.map(|p| p.to_string()).unwrap_or_default(),
            book.total_pages.map(|p| p.to_string()).unwrap_or_default(),
            book.is_favorite.to_string(),
            book.notes.clone().unwrap_or_default(),
        ];
        let row: Vec<String> = fields.iter().map(|field| csv_field(field)).collect();
        out.push_str(&row.join(","));
        out.push_str("\r\n");
    }
    out
}

fn csv_field(value: &str) -> String {
    if value.contains(['"', ',', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

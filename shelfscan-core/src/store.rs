//! The catalog of record
//!
//! Owns the collection exclusively; every other component holds at most a
//! transient reference to one record while editing. Single-writer model: all
//! mutations happen on the one logical thread that also reads the views.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::snapshot::SnapshotStore;
use crate::types::{BookRecord, BookStatus};

/// Genre label applied when a record is committed without one
pub const DEFAULT_GENRE: &str = "Chung";

/// Fields supplied at creation; id and timestamp are assigned by the store
#[derive(Debug, Clone, Default)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub cover_url: Option<String>,
    pub status: BookStatus,
    pub notes: Option<String>,
    pub genre: Option<String>,
    pub current_page: Option<u32>,
    pub total_pages: Option<u32>,
    pub is_favorite: bool,
}

/// Partial update; `None` fields are left unchanged
#[derive(Debug, Clone, Default)]
pub struct BookPatch {
    pub title: Option<String>,
    pub author: Option<String>,
    pub status: Option<BookStatus>,
    pub notes: Option<String>,
    pub genre: Option<String>,
    pub current_page: Option<u32>,
    pub total_pages: Option<u32>,
    pub is_favorite: Option<bool>,
}

/// Per-status counts for the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct StatusCounts {
    pub to_read: usize,
    pub reading: usize,
    pub finished: usize,
}

pub struct LibraryStore {
    books: Vec<BookRecord>,
    snapshot: Arc<dyn SnapshotStore>,
}

impl LibraryStore {
    /// Open the catalog, loading the persisted snapshot once. A missing or
    /// unparseable snapshot falls back to the seed collection.
    pub async fn open(snapshot: Arc<dyn SnapshotStore>) -> Self {
        let books = match snapshot.load().await {
            Ok(Some(data)) => match serde_json::from_str(&data) {
                Ok(books) => books,
                Err(e) => {
                    tracing::warn!("catalog snapshot failed to parse, using seed collection: {}", e);
                    seed_books()
                }
            },
            Ok(None) => seed_books(),
            Err(e) => {
                tracing::warn!("failed to load catalog snapshot, using seed collection: {}", e);
                seed_books()
            }
        };
        tracing::debug!(count = books.len(), "catalog opened");
        Self { books, snapshot }
    }

    /// Create a record with a fresh id and creation timestamp and prepend it
    /// (most-recent-first is the presentation order, not a storage
    /// invariant).
    pub async fn create(&mut self, fields: NewBook) -> Uuid {
        let id = Uuid::new_v4();
        // Creation times never go backwards within one store, even when the
        // wall clock does
        let added_at = self
            .books
            .iter()
            .map(|book| book.added_at)
            .max()
            .map_or_else(Utc::now, |last| Utc::now().max(last));

        let record = BookRecord {
            id,
            title: fields.title,
            author: fields.author,
            cover_url: fields.cover_url,
            status: fields.status,
            added_at,
            notes: fields.notes,
            genre: fields.genre,
            current_page: fields.current_page,
            total_pages: fields.total_pages,
            is_favorite: fields.is_favorite,
        };
        self.books.insert(0, record);
        self.persist().await;
        id
    }

    /// Merge `patch` into the record with `id`; unspecified fields are left
    /// unchanged. An unknown id is a silent no-op, matching the catalog
    /// behavior this store replaces.
    pub async fn update(&mut self, id: Uuid, patch: BookPatch) {
        let Some(book) = self.books.iter_mut().find(|book| book.id == id) else {
            tracing::debug!(%id, "update for unknown record ignored");
            return;
        };

        if let Some(title) = patch.title {
            book.title = title;
        }
        if let Some(author) = patch.author {
            book.author = author;
        }
        if let Some(status) = patch.status {
            book.status = status;
        }
        if let Some(notes) = patch.notes {
            book.notes = Some(notes);
        }
        if let Some(genre) = patch.genre {
            book.genre = Some(genre);
        }
        if let Some(current_page) = patch.current_page {
            book.current_page = Some(current_page);
        }
        if let Some(total_pages) = patch.total_pages {
            book.total_pages = Some(total_pages);
        }
        if let Some(is_favorite) = patch.is_favorite {
            book.is_favorite = is_favorite;
        }
        self.persist().await;
    }

    /// Remove the record with `id`; an unknown id is a no-op.
    pub async fn delete(&mut self, id: Uuid) {
        let before = self.books.len();
        self.books.retain(|book| book.id != id);
        if self.books.len() == before {
            tracing::debug!(%id, "delete for unknown record ignored");
            return;
        }
        self.persist().await;
    }

    pub fn books(&self) -> &[BookRecord] {
        &self.books
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    pub fn get(&self, id: Uuid) -> Option<&BookRecord> {
        self.books.iter().find(|book| book.id == id)
    }

    pub fn status_counts(&self) -> StatusCounts {
        let count = |status| self.books.iter().filter(|b| b.status == status).count();
        StatusCounts {
            to_read: count(BookStatus::ToRead),
            reading: count(BookStatus::Reading),
            finished: count(BookStatus::Finished),
        }
    }

    pub fn favorites(&self) -> Vec<&BookRecord> {
        self.books.iter().filter(|book| book.is_favorite).collect()
    }

    /// Case-insensitive substring match over title, author and genre
    pub fn search(&self, query: &str) -> Vec<&BookRecord> {
        let needle = query.to_lowercase();
        self.books
            .iter()
            .filter(|book| {
                book.title.to_lowercase().contains(&needle)
                    || book.author.to_lowercase().contains(&needle)
                    || book
                        .genre
                        .as_ref()
                        .is_some_and(|genre| genre.to_lowercase().contains(&needle))
            })
            .collect()
    }

    /// Most recently added records first
    pub fn recent(&self, limit: usize) -> Vec<&BookRecord> {
        let mut books: Vec<&BookRecord> = self.books.iter().collect();
        books.sort_by(|a, b| b.added_at.cmp(&a.added_at));
        books.truncate(limit);
        books
    }

    /// Distinct non-empty genres, sorted lexicographically
    pub fn distinct_genres(&self) -> Vec<String> {
        let mut genres: Vec<String> = self
            .books
            .iter()
            .filter_map(|book| book.genre.clone())
            .filter(|genre| !genre.is_empty())
            .collect();
        genres.sort();
        genres.dedup();
        genres
    }

    /// Write the whole collection after every mutation. Persistence failures
    /// are logged, not surfaced: the in-memory catalog stays authoritative
    /// and mutations are infallible to callers.
    async fn persist(&self) {
        match serde_json::to_string_pretty(&self.books) {
            Ok(data) => {
                if let Err(e) = self.snapshot.save(&data).await {
                    tracing::error!("failed to persist catalog snapshot: {}", e);
                }
            }
            Err(e) => tracing::error!("failed to serialize catalog: {}", e),
        }
    }
}

/// Seed collection used when no snapshot exists yet
fn seed_books() -> Vec<BookRecord> {
    let now = Utc::now();
    vec![
        BookRecord {
            id: Uuid::new_v4(),
            title: "Đắc Nhân Tâm".to_string(),
            author: "Dale Carnegie".to_string(),
            cover_url: Some(
                "https://images.unsplash.com/photo-1589829085413-56de8ae18c73?auto=format&fit=crop&q=80&w=300&h=450".to_string(),
            ),
            status: BookStatus::Reading,
            added_at: now - chrono::Duration::milliseconds(100_000_000),
            notes: Some(
                "Nghệ thuật thu phục lòng người. Cuốn sách hay nhất mọi thời đại đưa bạn đến thành công.".to_string(),
            ),
            genre: Some("Phát triển bản thân".to_string()),
            current_page: Some(45),
            total_pages: Some(320),
            is_favorite: true,
        },
        BookRecord {
            id: Uuid::new_v4(),
            title: "Modern Spaces".to_string(),
            author: "Francisco Spencer".to_string(),
            cover_url: Some(
                "https://images.unsplash.com/photo-1544947950-fa07a98d237f?auto=format&fit=crop&q=80&w=300&h=450".to_string(),
            ),
            status: BookStatus::Finished,
            added_at: now - chrono::Duration::milliseconds(500_000_000),
            notes: Some("Nguồn cảm hứng tuyệt vời cho thiết kế nội thất.".to_string()),
            genre: Some("Thiết kế".to_string()),
            current_page: Some(320),
            total_pages: Some(320),
            is_favorite: false,
        },
        BookRecord {
            id: Uuid::new_v4(),
            title: "Atomic Habits".to_string(),
            author: "James Clear".to_string(),
            cover_url: None,
            status: BookStatus::ToRead,
            added_at: now,
            notes: None,
            genre: Some("Phát triển bản thân".to_string()),
            current_page: Some(0),
            total_pages: Some(300),
            is_favorite: false,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::MemorySnapshot;

    async fn empty_store() -> (LibraryStore, Arc<MemorySnapshot>) {
        let snapshot = Arc::new(MemorySnapshot::with_contents("[]"));
        let store = LibraryStore::open(snapshot.clone() as Arc<dyn SnapshotStore>).await;
        (store, snapshot)
    }

    fn new_book(title: &str) -> NewBook {
        NewBook {
            title: title.to_string(),
            author: "Tác giả".to_string(),
            genre: Some("Tiểu thuyết".to_string()),
            ..NewBook::default()
        }
    }

    #[tokio::test]
    async fn test_create_assigns_unique_ids_and_monotone_timestamps() {
        let (mut store, _) = empty_store().await;

        let first = store.create(new_book("Một")).await;
        let second = store.create(new_book("Hai")).await;
        assert_ne!(first, second);

        let first_at = store.get(first).unwrap().added_at;
        let second_at = store.get(second).unwrap().added_at;
        assert!(second_at >= first_at);

        // Prepended: most recent first
        assert_eq!(store.books()[0].id, second);
        assert_eq!(store.books()[1].id, first);
    }

    #[tokio::test]
    async fn test_update_merges_and_preserves_unspecified_fields() {
        let (mut store, _) = empty_store().await;
        let id = store.create(new_book("Một")).await;

        store
            .update(
                id,
                BookPatch {
                    status: Some(BookStatus::Reading),
                    current_page: Some(42),
                    ..BookPatch::default()
                },
            )
            .await;

        let book = store.get(id).unwrap();
        assert_eq!(book.status, BookStatus::Reading);
        assert_eq!(book.current_page, Some(42));
        // Untouched fields survive the merge
        assert_eq!(book.title, "Một");
        assert_eq!(book.genre.as_deref(), Some("Tiểu thuyết"));
    }

    #[tokio::test]
    async fn test_update_unknown_id_is_noop() {
        let (mut store, _) = empty_store().await;
        store.create(new_book("Một")).await;
        let before = store.books().to_vec();

        store
            .update(
                Uuid::new_v4(),
                BookPatch {
                    title: Some("khác".to_string()),
                    ..BookPatch::default()
                },
            )
            .await;

        assert_eq!(store.books(), &before[..]);
    }

    #[tokio::test]
    async fn test_delete_and_unknown_delete() {
        let (mut store, _) = empty_store().await;
        let id = store.create(new_book("Một")).await;

        store.delete(Uuid::new_v4()).await;
        assert_eq!(store.len(), 1);

        store.delete(id).await;
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_snapshot_round_trip_preserves_order_and_fields() {
        let snapshot = Arc::new(MemorySnapshot::with_contents("[]"));
        let mut store = LibraryStore::open(snapshot.clone() as Arc<dyn SnapshotStore>).await;
        store.create(new_book("Một")).await;
        store.create(new_book("Hai")).await;
        let original = store.books().to_vec();

        let reloaded = LibraryStore::open(snapshot as Arc<dyn SnapshotStore>).await;
        assert_eq!(reloaded.books(), &original[..]);
    }

    #[tokio::test]
    async fn test_missing_snapshot_falls_back_to_seeds() {
        let store = LibraryStore::open(Arc::new(MemorySnapshot::new())).await;
        assert_eq!(store.len(), 3);
        assert!(store.books().iter().any(|b| b.title == "Atomic Habits"));
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_falls_back_to_seeds() {
        let snapshot = Arc::new(MemorySnapshot::with_contents("{ not json ["));
        let store = LibraryStore::open(snapshot).await;
        assert_eq!(store.len(), 3);
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive_over_title_author_genre() {
        let store = LibraryStore::open(Arc::new(MemorySnapshot::new())).await;

        assert_eq!(store.search("atomic").len(), 1);
        assert_eq!(store.search("DALE").len(), 1);
        assert_eq!(store.search("thiết kế").len(), 1);
        assert!(store.search("nonexistent-xyz").is_empty());
        // Empty query matches everything
        assert_eq!(store.search("").len(), 3);
    }

    #[tokio::test]
    async fn test_views() {
        let store = LibraryStore::open(Arc::new(MemorySnapshot::new())).await;

        let counts = store.status_counts();
        assert_eq!(
            (counts.to_read, counts.reading, counts.finished),
            (1, 1, 1)
        );

        assert_eq!(store.favorites().len(), 1);
        assert_eq!(store.favorites()[0].title, "Đắc Nhân Tâm");

        let recent = store.recent(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].title, "Atomic Habits");

        assert_eq!(
            store.distinct_genres(),
            vec!["Phát triển bản thân".to_string(), "Thiết kế".to_string()]
        );
    }
}

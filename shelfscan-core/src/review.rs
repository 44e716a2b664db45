//! Review step: user confirmation of the analyzer's best guess before commit

use uuid::Uuid;

use crate::capture::Handoff;
use crate::store::{BookPatch, LibraryStore, NewBook, DEFAULT_GENRE};
use crate::types::{BookStatus, CapturedImage};

/// Editable fields for one new record under review.
///
/// Discarded wholesale when the user abandons the screen; nothing reaches
/// the catalog until [`ReviewSession::commit`].
#[derive(Debug)]
pub struct ReviewSession {
    pub title: String,
    pub author: String,
    pub genre: String,
    pub notes: String,
    pub status: BookStatus,
    image: CapturedImage,
}

impl ReviewSession {
    /// Pre-fill from the capture handoff. Status defaults to to-read until
    /// the user changes it.
    pub fn from_handoff(handoff: Handoff) -> Self {
        let Handoff { image, analysis } = handoff;
        Self {
            title: analysis.title.unwrap_or_default(),
            author: analysis.author.unwrap_or_default(),
            genre: analysis.genre.unwrap_or_default(),
            notes: analysis.description.unwrap_or_default(),
            status: BookStatus::default(),
            image,
        }
    }

    pub fn image(&self) -> &CapturedImage {
        &self.image
    }

    /// Genre autocomplete: the catalog's distinct non-empty genres filtered
    /// by case-insensitive substring match against the current input,
    /// sorted lexicographically.
    pub fn genre_suggestions(&self, store: &LibraryStore) -> Vec<String> {
        let needle = self.genre.to_lowercase();
        store
            .distinct_genres()
            .into_iter()
            .filter(|genre| genre.to_lowercase().contains(&needle))
            .collect()
    }

    /// Commit the edited fields to the catalog. Infallible: empty title and
    /// author are permitted. An empty genre becomes the default label here,
    /// at commit time, and nowhere earlier.
    pub async fn commit(self, store: &mut LibraryStore) -> Uuid {
        let genre = if self.genre.trim().is_empty() {
            DEFAULT_GENRE.to_string()
        } else {
            self.genre
        };

        store
            .create(NewBook {
                title: self.title,
                author: self.author,
                cover_url: Some(self.image.to_data_uri()),
                status: self.status,
                notes: (!self.notes.is_empty()).then_some(self.notes),
                genre: Some(genre),
                current_page: None,
                total_pages: None,
                is_favorite: false,
            })
            .await
    }
}

/// Edit session over an existing record (the browser's detail view).
///
/// Holds only the record id plus draft fields; it goes dead when the record
/// is deleted underneath it.
#[derive(Debug)]
pub struct EditSession {
    id: Uuid,
    pub status: BookStatus,
    pub current_page: u32,
    pub total_pages: u32,
    pub notes: String,
    pub is_favorite: bool,
}

impl EditSession {
    pub fn open(store: &LibraryStore, id: Uuid) -> Option<Self> {
        let book = store.get(id)?;
        Some(Self {
            id,
            status: book.status,
            current_page: book.current_page.unwrap_or(0),
            total_pages: book.total_pages.unwrap_or(0),
            notes: book.notes.clone().unwrap_or_default(),
            is_favorite: book.is_favorite,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Whether the underlying record still exists
    pub fn is_live(&self, store: &LibraryStore) -> bool {
        store.get(self.id).is_some()
    }

    /// Apply the draft edits. A session whose record was deleted leaves the
    /// catalog unchanged: the store's unknown-id update is a no-op.
    pub async fn commit(self, store: &mut LibraryStore) {
        store
            .update(
                self.id,
                BookPatch {
                    status: Some(self.status),
                    current_page: Some(self.current_page),
                    total_pages: Some(self.total_pages),
                    notes: Some(self.notes),
                    is_favorite: Some(self.is_favorite),
                    ..BookPatch::default()
                },
            )
            .await;
    }
}

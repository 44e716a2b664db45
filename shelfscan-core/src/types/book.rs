//! The catalog record type and its reading status

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Reading status of a catalog entry
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum BookStatus {
    #[default]
    ToRead,
    Reading,
    Finished,
}

impl BookStatus {
    pub const ALL: [BookStatus; 3] = [
        BookStatus::ToRead,
        BookStatus::Reading,
        BookStatus::Finished,
    ];

    /// Display label in the catalog's working language (Vietnamese)
    pub fn label(&self) -> &'static str {
        match self {
            BookStatus::ToRead => "Muốn đọc",
            BookStatus::Reading => "Đang đọc",
            BookStatus::Finished => "Đã đọc",
        }
    }
}

impl std::fmt::Display for BookStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One catalog entry. Created only by the capture pipeline's commit step;
/// mutated in place by status/progress/notes/favorite edits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BookRecord {
    /// Unique identifier, assigned at creation, immutable
    pub id: Uuid,

    /// May be empty pending a user edit
    pub title: String,

    pub author: String,

    /// Reference to the stored cover bitmap (data URI or remote URL)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,

    pub status: BookStatus,

    /// Creation time, immutable after creation
    pub added_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,

    // Progress is display-only: current_page > total_pages is accepted as-is
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_page: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<u32>,

    #[serde(default)]
    pub is_favorite: bool,
}

impl BookRecord {
    /// Reading progress for display, clamped to 100%
    pub fn progress_percent(&self) -> Option<u32> {
        match (self.current_page, self.total_pages) {
            (Some(current), Some(total)) if total > 0 => {
                Some(((current as u64 * 100 / total as u64).min(100)) as u32)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> BookRecord {
        BookRecord {
            id: Uuid::new_v4(),
            title: "Atomic Habits".to_string(),
            author: "James Clear".to_string(),
            cover_url: None,
            status: BookStatus::Reading,
            added_at: Utc::now(),
            notes: None,
            genre: Some("Phát triển bản thân".to_string()),
            current_page: Some(45),
            total_pages: Some(300),
            is_favorite: false,
        }
    }

    #[test]
    fn test_progress_percent() {
        let mut book = record();
        assert_eq!(book.progress_percent(), Some(15));

        book.current_page = None;
        assert_eq!(book.progress_percent(), None);

        // Over-complete progress is legal and clamps for display only
        book.current_page = Some(450);
        assert_eq!(book.progress_percent(), Some(100));

        book.total_pages = Some(0);
        assert_eq!(book.progress_percent(), None);
    }

    #[test]
    fn test_record_serialization_round_trip() {
        let book = record();
        let json = serde_json::to_string(&book).unwrap();
        let back: BookRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(book, back);
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(BookStatus::ToRead.label(), "Muốn đọc");
        assert_eq!(BookStatus::Reading.label(), "Đang đọc");
        assert_eq!(BookStatus::Finished.label(), "Đã đọc");
    }
}

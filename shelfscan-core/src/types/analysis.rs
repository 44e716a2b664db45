//! Structured result of one cover analysis

use serde::{Deserialize, Serialize};

/// Best-guess fields extracted from a cover image.
///
/// Produced once per capture attempt; never retried automatically and
/// superseded entirely when the user recaptures. Results parsed from the
/// real service always carry title, author and genre (the declared response
/// schema requires them); description is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnalysisResult {
    pub title: Option<String>,
    pub author: Option<String>,
    pub genre: Option<String>,
    pub description: Option<String>,
}

impl AnalysisResult {
    /// Whether the required fields of the service contract are all present
    pub fn has_required_fields(&self) -> bool {
        self.title.is_some() && self.author.is_some() && self.genre.is_some()
    }
}

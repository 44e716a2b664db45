//! Environment-driven configuration

use std::path::PathBuf;

/// Directory holding catalog data
pub const DATA_PATH_ENV: &str = "SHELFSCAN_DATA_PATH";

/// Credential for the cover analysis service; absent selects placeholder mode
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Override for the analysis model name
pub const MODEL_ENV: &str = "SHELFSCAN_MODEL";

const DEFAULT_DATA_PATH: &str = "./shelfscan_data";
const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Runtime configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the catalog snapshot
    pub data_path: PathBuf,

    /// Analysis service credential; `None` selects placeholder mode
    pub api_key: Option<String>,

    /// Analysis model name
    pub model: String,
}

impl Config {
    pub fn from_env() -> Self {
        let data_path =
            std::env::var(DATA_PATH_ENV).unwrap_or_else(|_| DEFAULT_DATA_PATH.to_string());
        let api_key = std::env::var(API_KEY_ENV).ok().filter(|key| !key.is_empty());
        let model = std::env::var(MODEL_ENV).unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        Self {
            data_path: PathBuf::from(data_path),
            api_key,
            model,
        }
    }

    /// Fixed key the whole-collection snapshot lives under
    pub fn snapshot_path(&self) -> PathBuf {
        self.data_path.join("shelfscan_books.json")
    }
}

//! Whole-collection snapshot persistence
//!
//! The catalog persists as a single JSON document under a fixed key: read
//! once at startup, replaced after every mutation.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::SnapshotError;

/// Result type for snapshot operations
pub type SnapshotResult<T> = std::result::Result<T, SnapshotError>;

/// Abstract snapshot backend
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Load the snapshot; `None` when none has been written yet
    async fn load(&self) -> SnapshotResult<Option<String>>;

    /// Replace the snapshot
    async fn save(&self, data: &str) -> SnapshotResult<()>;
}

/// File-backed snapshot
pub struct FileSnapshot {
    path: PathBuf,
}

impl FileSnapshot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

fn backend(e: std::io::Error) -> SnapshotError {
    SnapshotError::Backend(e.to_string())
}

#[async_trait]
impl SnapshotStore for FileSnapshot {
    async fn load(&self) -> SnapshotResult<Option<String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(backend(e)),
        }
    }

    /// Writes to a temp file then renames to avoid partial writes
    async fn save(&self, data: &str) -> SnapshotResult<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(backend)?;
        }

        // Temp file in the same directory ensures the rename stays on one
        // filesystem
        let temp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&temp_path, data).await.map_err(backend)?;
        tokio::fs::rename(&temp_path, &self.path)
            .await
            .map_err(backend)?;
        Ok(())
    }
}

/// In-memory snapshot (for testing)
#[derive(Default)]
pub struct MemorySnapshot {
    data: std::sync::RwLock<Option<String>>,
}

impl MemorySnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seeded snapshot contents
    pub fn with_contents(data: impl Into<String>) -> Self {
        Self {
            data: std::sync::RwLock::new(Some(data.into())),
        }
    }

    pub fn contents(&self) -> Option<String> {
        self.data
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshot {
    async fn load(&self) -> SnapshotResult<Option<String>> {
        // A poisoned lock still holds valid contents; recover instead of
        // panicking
        Ok(self.data.read().unwrap_or_else(|e| e.into_inner()).clone())
    }

    async fn save(&self, data: &str) -> SnapshotResult<()> {
        *self.data.write().unwrap_or_else(|e| e.into_inner()) = Some(data.to_string());
        Ok(())
    }
}

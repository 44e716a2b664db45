//! CLI command implementations

mod library;
mod scan;
mod stats;

pub use library::{add, delete, list, show, update};
pub use scan::{scan, ScanOverrides};
pub use stats::{export, stats};

use std::sync::Arc;

use shelfscan_core::config::Config;
use shelfscan_core::snapshot::FileSnapshot;
use shelfscan_core::store::LibraryStore;

/// Open the catalog at the configured data path
pub(crate) async fn open_store(config: &Config) -> LibraryStore {
    LibraryStore::open(Arc::new(FileSnapshot::new(config.snapshot_path()))).await
}

/// Parse a record id argument
pub(crate) fn parse_id(id: &str) -> anyhow::Result<uuid::Uuid> {
    uuid::Uuid::parse_str(id).map_err(|_| anyhow::anyhow!("'{}' is not a valid record id", id))
}

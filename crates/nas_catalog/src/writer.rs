//! Soft-failing catalog writes.

use crate::store::CatalogStore;
use nas_catalog_db::CatalogEntry;
use std::sync::Arc;
use tracing::{debug, warn};

/// Upserts entries, logging failures instead of returning them.
///
/// A file whose write fails stays stale and is retried by the next scan.
#[derive(Clone)]
pub struct CatalogWriter {
    store: Arc<dyn CatalogStore>,
}

impl CatalogWriter {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    /// Returns true when the entry was stored.
    pub async fn write(&self, entry: &CatalogEntry) -> bool {
        match self.store.upsert(entry).await {
            Ok(()) => {
                debug!(path = %entry.path, group = %entry.group, "Catalog entry written");
                true
            }
            Err(e) => {
                warn!(path = %entry.path, error = %e, "Failed to write catalog entry");
                false
            }
        }
    }
}

//! Catalog store interface consumed by the pipeline.
//!
//! The SQLite catalog implements it directly; tests swap in an in-memory
//! double. Implementations must make `upsert` a single atomic
//! insert-or-update keyed by path.

use async_trait::async_trait;
use nas_catalog_db::{CatalogDb, CatalogEntry, Result};
use std::collections::BTreeSet;

#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Prior entry for a root-relative path, if any.
    async fn get_by_path(&self, path: &str) -> Result<Option<CatalogEntry>>;

    /// Last-write-wins insert or update keyed by `entry.path`.
    async fn upsert(&self, entry: &CatalogEntry) -> Result<()>;

    /// Every directory that holds at least one entry.
    async fn list_distinct_directories(&self) -> Result<BTreeSet<String>>;
}

#[async_trait]
impl CatalogStore for CatalogDb {
    async fn get_by_path(&self, path: &str) -> Result<Option<CatalogEntry>> {
        self.get_file_by_path(path).await
    }

    async fn upsert(&self, entry: &CatalogEntry) -> Result<()> {
        self.upsert_file(entry).await
    }

    async fn list_distinct_directories(&self) -> Result<BTreeSet<String>> {
        self.list_directories().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_catalog_db_as_store() {
        let db = CatalogDb::open_in_memory().await.unwrap();
        let store: &dyn CatalogStore = &db;

        assert!(store.get_by_path("/a.jpg").await.unwrap().is_none());

        let mut entry = CatalogEntry::new("/x/a.jpg");
        entry.updated_at = 42;
        store.upsert(&entry).await.unwrap();

        let loaded = store.get_by_path("/x/a.jpg").await.unwrap().unwrap();
        assert_eq!(loaded, entry);
        assert!(store.list_distinct_directories().await.unwrap().contains("/x/"));
    }
}

//! Catalog store for the NAS catalog.
//!
//! One SQLite table holds one row per known file, keyed by its path
//! relative to the scan root. Writes are single conflict-aware upserts.
//!
//! # Usage
//!
//! ```rust,ignore
//! use nas_catalog_db::{CatalogDb, CatalogEntry};
//!
//! let db = CatalogDb::open("~/.nas_catalog/catalog.sqlite3").await?;
//! db.upsert_file(&CatalogEntry::new("/photos/a.jpg")).await?;
//! let dirs = db.list_directories().await?;
//! ```

mod error;
mod files;
mod schema;
mod types;

pub use error::{DbError, Result};
pub use types::*;

use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::path::Path;
use tracing::info;

/// Handle to the catalog database. Clone is cheap and shares the pool.
#[derive(Clone)]
pub struct CatalogDb {
    pool: SqlitePool,
}

impl CatalogDb {
    /// Open or create a catalog at the given path.
    ///
    /// Creates the schema if it doesn't exist.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let url = format!("sqlite:{}?mode=rwc", path.display());

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await?;

        let db = Self { pool };
        db.ensure_schema(true).await?;

        info!(path = %path.display(), "Catalog opened");

        Ok(db)
    }

    /// In-memory catalog for tests. A single connection, since every
    /// SQLite memory connection is its own database.
    pub async fn open_in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        let db = Self { pool };
        db.ensure_schema(false).await?;
        Ok(db)
    }

    /// Underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(self) {
        self.pool.close().await;
    }

    /// Current time as milliseconds since Unix epoch.
    pub fn now_millis() -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

//! Catalog schema creation.

use crate::error::Result;
use crate::CatalogDb;
use tracing::debug;

impl CatalogDb {
    /// Ensure the catalog tables exist.
    pub(crate) async fn ensure_schema(&self, wal: bool) -> Result<()> {
        if wal {
            // Readers stay unblocked during scan writes
            sqlx::query("PRAGMA journal_mode=WAL")
                .execute(&self.pool)
                .await?;
            sqlx::query("PRAGMA synchronous=NORMAL")
                .execute(&self.pool)
                .await?;
        }

        // Files: one row per catalogued path
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS files (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                path TEXT NOT NULL UNIQUE,
                directory TEXT NOT NULL,
                name TEXT NOT NULL,
                extension TEXT NOT NULL DEFAULT '',
                size INTEGER NOT NULL DEFAULT 0,
                checksum TEXT NOT NULL DEFAULT '',
                "type" TEXT NOT NULL DEFAULT '',
                "group" TEXT NOT NULL DEFAULT 'unknown',
                description TEXT NOT NULL DEFAULT '',
                tags TEXT NOT NULL DEFAULT '',
                caption TEXT NOT NULL DEFAULT '',
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            )"#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_files_directory ON files(directory)")
            .execute(&self.pool)
            .await?;
        sqlx::query(r#"CREATE INDEX IF NOT EXISTS idx_files_group ON files("group")"#)
            .execute(&self.pool)
            .await?;

        debug!("Catalog schema verified");
        Ok(())
    }
}

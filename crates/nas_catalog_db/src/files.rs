//! File catalog operations

use crate::error::{DbError, Result};
use crate::types::CatalogEntry;
use crate::CatalogDb;
use sqlx::Row;
use std::collections::BTreeSet;

const ENTRY_COLUMNS: &str = r#"path, directory, name, extension, size, checksum, "type", "group", description, tags, caption, updated_at"#;

impl CatalogDb {
    /// Insert or update a file, keyed by path.
    ///
    /// One statement, so a concurrent insert of the same path resolves to
    /// an update instead of a unique-constraint failure. Every column except
    /// `created_at` takes the new value.
    pub async fn upsert_file(&self, entry: &CatalogEntry) -> Result<()> {
        let size = i64::try_from(entry.size).map_err(|_| {
            DbError::invalid_state(format!("size {} out of range for {}", entry.size, entry.path))
        })?;

        sqlx::query(
            r#"
            INSERT INTO files (
                path, directory, name, extension, size, checksum,
                "type", "group", description, tags, caption, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(path) DO UPDATE SET
                directory = excluded.directory,
                name = excluded.name,
                extension = excluded.extension,
                size = excluded.size,
                checksum = excluded.checksum,
                "type" = excluded."type",
                "group" = excluded."group",
                description = excluded.description,
                tags = excluded.tags,
                caption = excluded.caption,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&entry.path)
        .bind(&entry.directory)
        .bind(&entry.name)
        .bind(&entry.extension)
        .bind(size)
        .bind(&entry.checksum)
        .bind(&entry.file_type)
        .bind(&entry.group)
        .bind(&entry.description)
        .bind(&entry.tags)
        .bind(&entry.caption)
        .bind(Self::now_millis())
        .bind(entry.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get a file by its root-relative path
    pub async fn get_file_by_path(&self, path: &str) -> Result<Option<CatalogEntry>> {
        let sql = format!("SELECT {ENTRY_COLUMNS} FROM files WHERE path = ?");
        let row = sqlx::query(&sql)
            .bind(path)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(row_to_entry(&row)?)),
            None => Ok(None),
        }
    }

    /// List the files directly inside `directory` (e.g. `"/photos/"`)
    pub async fn list_files_by_directory(&self, directory: &str) -> Result<Vec<CatalogEntry>> {
        let sql = format!("SELECT {ENTRY_COLUMNS} FROM files WHERE directory = ? ORDER BY name");
        let rows = sqlx::query(&sql)
            .bind(directory)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_entry).collect()
    }

    /// Distinct directories holding at least one catalogued file
    pub async fn list_directories(&self) -> Result<BTreeSet<String>> {
        let rows = sqlx::query("SELECT DISTINCT directory FROM files")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(|row| row.get::<String, _>("directory"))
            .collect())
    }

    pub async fn count_files(&self) -> Result<u64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM files")
            .fetch_one(&self.pool)
            .await?;
        let n: i64 = row.get("n");
        Ok(n.max(0) as u64)
    }
}

fn row_to_entry(row: &sqlx::sqlite::SqliteRow) -> Result<CatalogEntry> {
    let path: String = row.get("path");
    let size: i64 = row.get("size");
    let size = u64::try_from(size)
        .map_err(|_| DbError::invalid_state(format!("negative size {size} for {path}")))?;

    Ok(CatalogEntry {
        directory: row.get("directory"),
        name: row.get("name"),
        extension: row.get("extension"),
        size,
        updated_at: row.get("updated_at"),
        checksum: row.get("checksum"),
        file_type: row.get("type"),
        group: row.get("group"),
        description: row.get("description"),
        tags: row.get("tags"),
        caption: row.get("caption"),
        path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classified(path: &str, group: &str, updated_at: i64) -> CatalogEntry {
        CatalogEntry {
            size: 42,
            updated_at,
            checksum: "abc123".into(),
            file_type: "jpeg".into(),
            group: group.into(),
            description: "holiday".into(),
            tags: "beach,sea".into(),
            caption: "a beach at dusk".into(),
            ..CatalogEntry::new(path)
        }
    }

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let db = CatalogDb::open_in_memory().await.unwrap();
        assert!(db.get_file_by_path("/nope.jpg").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_then_get_round_trips_every_field() {
        let db = CatalogDb::open_in_memory().await.unwrap();
        let entry = classified("/photos/a.jpg", "image", 1_700_000_000_123);

        db.upsert_file(&entry).await.unwrap();

        let stored = db.get_file_by_path("/photos/a.jpg").await.unwrap().unwrap();
        assert_eq!(stored, entry);
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent() {
        let db = CatalogDb::open_in_memory().await.unwrap();
        let entry = classified("/a.jpg", "image", 10);

        db.upsert_file(&entry).await.unwrap();
        db.upsert_file(&entry).await.unwrap();

        assert_eq!(db.count_files().await.unwrap(), 1);
        assert_eq!(db.get_file_by_path("/a.jpg").await.unwrap().unwrap(), entry);
    }

    #[tokio::test]
    async fn test_upsert_last_write_wins() {
        let db = CatalogDb::open_in_memory().await.unwrap();
        db.upsert_file(&classified("/a.jpg", "image", 10)).await.unwrap();

        let mut newer = classified("/a.jpg", "document", 20);
        newer.checksum = "def456".into();
        newer.size = 7;
        db.upsert_file(&newer).await.unwrap();

        let stored = db.get_file_by_path("/a.jpg").await.unwrap().unwrap();
        assert_eq!(stored, newer);
        assert_eq!(db.count_files().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_upsert_keeps_created_at() {
        let db = CatalogDb::open_in_memory().await.unwrap();
        db.upsert_file(&classified("/a.jpg", "image", 10)).await.unwrap();
        let first: i64 = sqlx::query("SELECT created_at FROM files WHERE path = '/a.jpg'")
            .fetch_one(db.pool())
            .await
            .unwrap()
            .get("created_at");

        db.upsert_file(&classified("/a.jpg", "image", 20)).await.unwrap();
        let second: i64 = sqlx::query("SELECT created_at FROM files WHERE path = '/a.jpg'")
            .fetch_one(db.pool())
            .await
            .unwrap()
            .get("created_at");

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_list_directories_is_distinct() {
        let db = CatalogDb::open_in_memory().await.unwrap();
        for path in ["/a.jpg", "/b.jpg", "/x/c.jpg", "/x/y/d.jpg"] {
            db.upsert_file(&CatalogEntry::new(path)).await.unwrap();
        }

        let dirs = db.list_directories().await.unwrap();
        let dirs: Vec<&str> = dirs.iter().map(String::as_str).collect();
        assert_eq!(dirs, vec!["/", "/x/", "/x/y/"]);
    }

    #[tokio::test]
    async fn test_list_files_by_directory() {
        let db = CatalogDb::open_in_memory().await.unwrap();
        for path in ["/x/b.jpg", "/x/a.jpg", "/x/y/c.jpg", "/d.jpg"] {
            db.upsert_file(&CatalogEntry::new(path)).await.unwrap();
        }

        let files = db.list_files_by_directory("/x/").await.unwrap();
        let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a.jpg", "b.jpg"]);
    }
}

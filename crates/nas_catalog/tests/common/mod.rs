//! Test doubles shared by the pipeline integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use filetime::{set_file_mtime, FileTime};
use nas_catalog::{
    CancellationToken, CatalogDb, CatalogEntry, CatalogStore, Classification, ClassificationRequest,
    ClassifyError, FileProbe, FileStat, FsProbe,
};
use nas_catalog_db::DbError;
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Classifier that answers by extension and records every call.
#[derive(Default)]
pub struct StubClassifier {
    calls: AtomicUsize,
    seen: Mutex<Vec<String>>,
    failing: HashSet<String>,
    cancel_after: Option<(usize, CancellationToken)>,
}

impl StubClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every request for `path`.
    pub fn failing_on(mut self, path: &str) -> Self {
        self.failing.insert(path.to_string());
        self
    }

    /// Cancel `token` while handling the `n`th call.
    pub fn cancelling_after(mut self, n: usize, token: CancellationToken) -> Self {
        self.cancel_after = Some((n, token));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl nas_catalog::Classifier for StubClassifier {
    fn name(&self) -> &str {
        "stub"
    }

    async fn classify(&self, request: &ClassificationRequest) -> Result<Classification, ClassifyError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.seen.lock().unwrap().push(request.path.clone());
        if let Some((after, token)) = &self.cancel_after {
            if n == *after {
                token.cancel();
            }
        }
        if self.failing.contains(&request.path) {
            return Err(ClassifyError::Service(format!("cannot classify {}", request.path)));
        }

        let group = if request.path.ends_with(".jpg") || request.path.ends_with(".png") {
            "image"
        } else {
            "document"
        };
        Ok(Classification {
            group: group.to_string(),
            file_type: group.to_string(),
            description: format!("stub for {}", request.path),
            tags: "stub".to_string(),
            caption: String::new(),
        })
    }
}

/// Filesystem probe counting stat and hash calls.
#[derive(Default)]
pub struct CountingProbe {
    stats: AtomicUsize,
    hashes: AtomicUsize,
}

impl CountingProbe {
    pub fn stats(&self) -> usize {
        self.stats.load(Ordering::SeqCst)
    }

    pub fn hashes(&self) -> usize {
        self.hashes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FileProbe for CountingProbe {
    fn stat(&self, path: &Path) -> FileStat {
        self.stats.fetch_add(1, Ordering::SeqCst);
        FsProbe.stat(path)
    }

    async fn checksum(&self, path: &Path) -> String {
        self.hashes.fetch_add(1, Ordering::SeqCst);
        FsProbe.checksum(path).await
    }
}

/// SQLite store that counts upserts and can refuse chosen paths.
pub struct CountingStore {
    pub db: CatalogDb,
    upserts: AtomicUsize,
    rejecting: HashSet<String>,
}

impl CountingStore {
    pub async fn new() -> Self {
        Self {
            db: CatalogDb::open_in_memory().await.unwrap(),
            upserts: AtomicUsize::new(0),
            rejecting: HashSet::new(),
        }
    }

    pub fn rejecting(mut self, path: &str) -> Self {
        self.rejecting.insert(path.to_string());
        self
    }

    pub fn upserts(&self) -> usize {
        self.upserts.load(Ordering::SeqCst)
    }

    pub async fn all(&self) -> Vec<CatalogEntry> {
        let mut out = Vec::new();
        for dir in self.db.list_directories().await.unwrap() {
            out.extend(self.db.list_files_by_directory(&dir).await.unwrap());
        }
        out.sort_by(|a, b| a.path.cmp(&b.path));
        out
    }

    pub async fn get(&self, path: &str) -> Option<CatalogEntry> {
        self.db.get_file_by_path(path).await.unwrap()
    }
}

#[async_trait]
impl CatalogStore for CountingStore {
    async fn get_by_path(&self, path: &str) -> nas_catalog_db::Result<Option<CatalogEntry>> {
        self.db.get_file_by_path(path).await
    }

    async fn upsert(&self, entry: &CatalogEntry) -> nas_catalog_db::Result<()> {
        self.upserts.fetch_add(1, Ordering::SeqCst);
        if self.rejecting.contains(&entry.path) {
            return Err(DbError::invalid_state(format!("rejected {}", entry.path)));
        }
        self.db.upsert_file(entry).await
    }

    async fn list_distinct_directories(&self) -> nas_catalog_db::Result<BTreeSet<String>> {
        self.db.list_directories().await
    }
}

/// Write `contents` at `root/rel` and pin its mtime.
pub fn write_file(root: &Path, rel: &str, contents: &[u8], mtime_secs: i64) -> PathBuf {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, contents).unwrap();
    set_mtime(&path, mtime_secs);
    path
}

pub fn set_mtime(path: &Path, mtime_secs: i64) {
    set_file_mtime(path, FileTime::from_unix_time(mtime_secs, 0)).unwrap();
}

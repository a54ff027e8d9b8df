//! Per-file metadata: a cheap stat and a full-content SHA-256.
//!
//! Both fail soft. A failed stat reports size 0 and mtime 0 ("unknown"),
//! a failed hash reports an empty checksum; callers treat either as a
//! reason to reprocess, never to drop the file.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::warn;

const HASH_BUF_SIZE: usize = 64 * 1024;

/// Result of a stat. `modified_ms == 0` means unknown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileStat {
    pub size: u64,
    /// Modification time, milliseconds since the Unix epoch.
    pub modified_ms: i64,
}

impl FileStat {
    pub fn is_known(&self) -> bool {
        self.modified_ms > 0
    }
}

/// Stat a file, failing soft.
pub fn stat_file(path: &Path) -> FileStat {
    let metadata = match std::fs::metadata(path) {
        Ok(m) => m,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to stat file");
            return FileStat::default();
        }
    };
    let modified_ms = match metadata.modified() {
        Ok(t) => modified_millis(t),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "No modification time");
            0
        }
    };
    FileStat {
        size: metadata.len(),
        modified_ms,
    }
}

/// Millisecond mtime, never below 1. Times at or before the epoch clamp
/// to 1 so they stay distinct from "unknown" and the timestamp gate holds.
fn modified_millis(t: SystemTime) -> i64 {
    match t.duration_since(UNIX_EPOCH) {
        Ok(d) => i64::try_from(d.as_millis()).unwrap_or(i64::MAX).max(1),
        Err(_) => 1,
    }
}

/// Hex SHA-256 of the whole file, or `""` on any I/O error.
pub fn hash_file(path: &Path) -> String {
    match try_hash(path) {
        Ok(hex) => hex,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to hash file");
            String::new()
        }
    }
}

fn try_hash(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; HASH_BUF_SIZE];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Source of file metadata for change detection.
#[async_trait]
pub trait FileProbe: Send + Sync {
    fn stat(&self, path: &Path) -> FileStat;

    /// Full-content checksum; reads every byte.
    async fn checksum(&self, path: &Path) -> String;
}

/// Probe backed by the local filesystem. Hashing runs on the blocking pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsProbe;

#[async_trait]
impl FileProbe for FsProbe {
    fn stat(&self, path: &Path) -> FileStat {
        stat_file(path)
    }

    async fn checksum(&self, path: &Path) -> String {
        let owned: PathBuf = path.to_path_buf();
        match tokio::task::spawn_blocking(move || hash_file(&owned)).await {
            Ok(hex) => hex,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Hash task failed");
                String::new()
            }
        }
    }
}

//! Recursive traversal of the scan root.
//!
//! A missing or unreadable root yields nothing and logs a warning; an
//! unreadable subdirectory is skipped the same way. A NAS mount that is
//! down must not take the scanner with it.

use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Counters collected while walking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkStats {
    pub files: u64,
    pub dirs: u64,
    pub errors: u64,
}

/// Lazy depth-first walk yielding every non-directory entry.
///
/// Order is whatever the filesystem reports.
pub struct TreeWalk {
    inner: Option<walkdir::IntoIter>,
    stats: WalkStats,
}

impl TreeWalk {
    pub fn new(root: &Path) -> Self {
        match std::fs::metadata(root) {
            Ok(_) => Self {
                inner: Some(WalkDir::new(root).follow_links(false).into_iter()),
                stats: WalkStats::default(),
            },
            Err(e) => {
                warn!(root = %root.display(), error = %e, "Scan root unavailable, nothing to walk");
                Self {
                    inner: None,
                    stats: WalkStats {
                        errors: 1,
                        ..Default::default()
                    },
                }
            }
        }
    }

    pub fn stats(&self) -> WalkStats {
        self.stats
    }
}

impl Iterator for TreeWalk {
    type Item = PathBuf;

    fn next(&mut self) -> Option<PathBuf> {
        let inner = self.inner.as_mut()?;
        loop {
            match inner.next()? {
                Ok(entry) => {
                    if entry.file_type().is_dir() {
                        self.stats.dirs += 1;
                        continue;
                    }
                    self.stats.files += 1;
                    return Some(entry.into_path());
                }
                Err(e) => {
                    self.stats.errors += 1;
                    let path = e.path().map(|p| p.display().to_string()).unwrap_or_default();
                    warn!(path = %path, error = %e, "Skipping unreadable entry");
                }
            }
        }
    }
}

/// Eagerly collect every file under `root`.
pub fn walk(root: &Path) -> Vec<PathBuf> {
    TreeWalk::new(root).collect()
}

/// Walk `root` on a blocking thread, streaming paths through a bounded
/// channel. Dropping the receiver stops the walk at the next send.
pub fn spawn_walk(root: PathBuf, buffer: usize) -> (mpsc::Receiver<PathBuf>, JoinHandle<WalkStats>) {
    let (tx, rx) = mpsc::channel(buffer.max(1));
    let handle = tokio::task::spawn_blocking(move || {
        let mut walk = TreeWalk::new(&root);
        for path in walk.by_ref() {
            if tx.blocking_send(path).is_err() {
                debug!(root = %root.display(), "Walk receiver closed, stopping early");
                break;
            }
        }
        walk.stats()
    });
    (rx, handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, rel.as_bytes()).unwrap();
    }

    #[test]
    fn test_walk_finds_nested_files() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "a.jpg");
        touch(tmp.path(), "x/b.txt");
        touch(tmp.path(), "x/y/z/c.png");
        fs::create_dir_all(tmp.path().join("empty/dir")).unwrap();

        let found: BTreeSet<PathBuf> = walk(tmp.path()).into_iter().collect();
        let expected: BTreeSet<PathBuf> = ["a.jpg", "x/b.txt", "x/y/z/c.png"]
            .iter()
            .map(|rel| tmp.path().join(rel))
            .collect();
        assert_eq!(found, expected);
    }

    #[test]
    fn test_missing_root_is_empty() {
        let mut walk = TreeWalk::new(Path::new("/no/such/nas/mount"));
        assert!(walk.next().is_none());
        assert_eq!(walk.stats().errors, 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_subdirectory_is_skipped() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "a.jpg");
        touch(tmp.path(), "open/b.txt");
        touch(tmp.path(), "locked/secret.txt");
        let locked = tmp.path().join("locked");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Root ignores directory permissions; nothing to observe then.
        if fs::read_dir(&locked).is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let mut walk = TreeWalk::new(tmp.path());
        let found: BTreeSet<PathBuf> = walk.by_ref().collect();
        let stats = walk.stats();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        let expected: BTreeSet<PathBuf> = ["a.jpg", "open/b.txt"]
            .iter()
            .map(|rel| tmp.path().join(rel))
            .collect();
        assert_eq!(found, expected);
        assert_eq!(stats.errors, 1);
    }

    #[test]
    fn test_root_that_is_a_file_yields_itself() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "only.bin");
        let root = tmp.path().join("only.bin");
        assert_eq!(walk(&root), vec![root]);
    }

    #[test]
    fn test_stats_count_files_and_dirs() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "a/1");
        touch(tmp.path(), "a/2");
        touch(tmp.path(), "b/3");

        let mut walk = TreeWalk::new(tmp.path());
        assert_eq!(walk.by_ref().count(), 3);
        let stats = walk.stats();
        assert_eq!(stats.files, 3);
        // root + a + b
        assert_eq!(stats.dirs, 3);
    }

    #[tokio::test]
    async fn test_spawn_walk_streams_all_paths() {
        let tmp = TempDir::new().unwrap();
        for i in 0..20 {
            touch(tmp.path(), &format!("d{}/f{}.dat", i % 3, i));
        }

        let (mut rx, handle) = spawn_walk(tmp.path().to_path_buf(), 2);
        let mut seen = 0;
        while rx.recv().await.is_some() {
            seen += 1;
        }
        assert_eq!(seen, 20);
        assert_eq!(handle.await.unwrap().files, 20);
    }

    #[tokio::test]
    async fn test_spawn_walk_stops_when_receiver_dropped() {
        let tmp = TempDir::new().unwrap();
        for i in 0..50 {
            touch(tmp.path(), &format!("f{i}.dat"));
        }

        let (mut rx, handle) = spawn_walk(tmp.path().to_path_buf(), 1);
        assert!(rx.recv().await.is_some());
        drop(rx);

        let stats = handle.await.unwrap();
        assert!(stats.files < 50);
    }
}

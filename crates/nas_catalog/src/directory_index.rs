//! Scan-scoped set of directories seen during discovery.

use nas_catalog_db::directory_of;
use std::collections::BTreeSet;

/// Distinct catalog directories (`/`, `/photos/`, ...) found in one scan.
///
/// Owned by the scan; collaborators receive a snapshot once it ends.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryIndex {
    dirs: BTreeSet<String>,
}

impl DirectoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a directory. Returns false if it was already present.
    pub fn add(&mut self, directory: impl Into<String>) -> bool {
        self.dirs.insert(directory.into())
    }

    /// Record the parent directory of a catalog key.
    pub fn add_parent_of(&mut self, catalog_key: &str) -> bool {
        let dir = directory_of(catalog_key);
        if self.dirs.contains(dir) {
            return false;
        }
        self.dirs.insert(dir.to_string())
    }

    pub fn contains(&self, directory: &str) -> bool {
        self.dirs.contains(directory)
    }

    pub fn len(&self) -> usize {
        self.dirs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty()
    }

    pub fn snapshot(&self) -> BTreeSet<String> {
        self.dirs.clone()
    }

    pub fn into_set(self) -> BTreeSet<String> {
        self.dirs
    }
}

//! Catalog entity types.
//!
//! `CatalogEntry` is the single persisted unit: one row per file path,
//! keyed by the path relative to the scan root.

use serde::{Deserialize, Serialize};

/// Group assigned to entries that have not been classified yet.
pub const UNKNOWN_GROUP: &str = "unknown";

/// Group reported by the classifier for image files.
pub const IMAGE_GROUP: &str = "image";

/// A file known to the catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    /// Root-relative path, always starting with `/`. Unique key.
    pub path: String,
    /// `path` with the file name removed, trailing `/` kept.
    pub directory: String,
    /// Final path component.
    pub name: String,
    /// Suffix of `name` from the last `.` (inclusive), or empty.
    pub extension: String,
    /// Size in bytes.
    pub size: u64,
    /// Source modification time, milliseconds since the Unix epoch.
    pub updated_at: i64,
    /// Hex content checksum, empty until computed.
    pub checksum: String,
    /// Classification fields.
    #[serde(rename = "type")]
    pub file_type: String,
    pub group: String,
    pub description: String,
    pub tags: String,
    pub caption: String,
}

impl CatalogEntry {
    /// Build an unclassified entry for a root-relative path.
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        let name = file_name(&path).to_string();
        Self {
            directory: directory_of(&path).to_string(),
            extension: extension_of(&name).to_string(),
            name,
            path,
            group: UNKNOWN_GROUP.to_string(),
            ..Default::default()
        }
    }

    /// True once the classifier has assigned a real group.
    pub fn is_classified(&self) -> bool {
        !self.group.is_empty() && self.group != UNKNOWN_GROUP
    }

    pub fn is_image(&self) -> bool {
        self.group == IMAGE_GROUP
    }

    /// Copy the classification fields of `other` onto this entry.
    pub fn inherit_classification(&mut self, other: &CatalogEntry) {
        if other.group.is_empty() {
            return;
        }
        self.file_type = other.file_type.clone();
        self.group = other.group.clone();
        self.description = other.description.clone();
        self.tags = other.tags.clone();
        self.caption = other.caption.clone();
    }
}

/// Final `/`-separated component of `path`.
pub fn file_name(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

/// `path` without its final component; keeps the trailing separator.
pub fn directory_of(path: &str) -> &str {
    &path[..path.len() - file_name(path).len()]
}

/// Extension of a file name including the dot, or `""`.
pub fn extension_of(name: &str) -> &str {
    match name.rfind('.') {
        Some(idx) => &name[idx..],
        None => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_entry_derives_fields() {
        let entry = CatalogEntry::new("/photos/2020/beach.jpg");
        assert_eq!(entry.directory, "/photos/2020/");
        assert_eq!(entry.name, "beach.jpg");
        assert_eq!(entry.extension, ".jpg");
        assert_eq!(entry.group, UNKNOWN_GROUP);
        assert!(entry.checksum.is_empty());
        assert!(!entry.is_classified());
    }

    #[test]
    fn test_root_level_file_has_slash_directory() {
        let entry = CatalogEntry::new("/a.jpg");
        assert_eq!(entry.directory, "/");
        assert_eq!(entry.name, "a.jpg");
    }

    #[test]
    fn test_extension_ignores_dotted_directories() {
        let entry = CatalogEntry::new("/conf.d/README");
        assert_eq!(entry.extension, "");
        assert_eq!(entry.directory, "/conf.d/");
    }

    #[test]
    fn test_default_entry_is_unclassified() {
        let entry = CatalogEntry::default();
        assert_eq!(entry.updated_at, 0);
        assert!(!entry.is_classified());
    }

    #[test]
    fn test_inherit_classification_skips_empty_source() {
        let mut entry = CatalogEntry::new("/a.jpg");
        entry.inherit_classification(&CatalogEntry::default());
        assert_eq!(entry.group, UNKNOWN_GROUP);

        let prior = CatalogEntry {
            group: "image".into(),
            file_type: "photo".into(),
            caption: "a beach".into(),
            ..CatalogEntry::new("/a.jpg")
        };
        entry.inherit_classification(&prior);
        assert!(entry.is_image());
        assert_eq!(entry.caption, "a beach");
    }
}

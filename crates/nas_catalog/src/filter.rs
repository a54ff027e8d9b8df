//! Inclusion filter for discovered paths.
//!
//! Three rule families: root-relative prefixes, regexes searched in the
//! absolute path, and file suffixes. A path is in scope when at least one
//! configured family matches; with no rules at all, everything is in scope.

use crate::config::ScanOptions;
use crate::error::{ConfigError, PatternError};
use regex::Regex;
use std::path::{Path, PathBuf};

/// Compiled, read-only filter for one scan root.
#[derive(Debug, Clone)]
pub struct ScanFilter {
    root: PathBuf,
    prefixes: Vec<String>,
    patterns: Vec<Regex>,
    extensions: Vec<String>,
}

impl ScanFilter {
    /// Compile the filter lists for `root`.
    ///
    /// Every regex is tried; all failures come back in one
    /// `ConfigError::InvalidPatterns`.
    pub fn new(root: impl Into<PathBuf>, options: &ScanOptions) -> Result<Self, ConfigError> {
        let root = root.into();

        let mut patterns = Vec::with_capacity(options.regex_paths.len());
        let mut invalid = Vec::new();
        for pattern in &options.regex_paths {
            match Regex::new(pattern) {
                Ok(re) => patterns.push(re),
                Err(e) => invalid.push(PatternError {
                    pattern: pattern.clone(),
                    message: e.to_string(),
                }),
            }
        }
        if !invalid.is_empty() {
            return Err(ConfigError::InvalidPatterns(invalid));
        }

        let prefixes = options
            .paths
            .iter()
            .map(|p| normalize_prefix(&root, p))
            .collect();
        let extensions = options
            .extensions
            .iter()
            .filter(|e| !e.is_empty())
            .map(|e| {
                if e.starts_with('.') {
                    e.clone()
                } else {
                    format!(".{e}")
                }
            })
            .collect();

        Ok(Self {
            root,
            prefixes,
            patterns,
            extensions,
        })
    }

    /// Filter with no rules: everything under `root` is in scope.
    pub fn allow_all(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            prefixes: Vec::new(),
            patterns: Vec::new(),
            extensions: Vec::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_unconstrained(&self) -> bool {
        self.prefixes.is_empty() && self.patterns.is_empty() && self.extensions.is_empty()
    }

    /// Decide whether an absolute path discovered under the root is in scope.
    pub fn is_in_scope(&self, path: &Path) -> bool {
        if self.is_unconstrained() {
            return true;
        }
        let absolute = to_slash_string(path);
        self.matches_prefix(path)
            || self.patterns.iter().any(|re| re.is_match(&absolute))
            || self.extensions.iter().any(|ext| absolute.ends_with(ext.as_str()))
    }

    fn matches_prefix(&self, path: &Path) -> bool {
        if self.prefixes.is_empty() {
            return false;
        }
        let key = catalog_key(&self.root, path);
        self.prefixes.iter().any(|p| key.starts_with(p.as_str()))
    }

    /// Catalog key for an absolute path under this filter's root.
    pub fn catalog_key(&self, path: &Path) -> String {
        catalog_key(&self.root, path)
    }

    /// One-line description for scan logs.
    pub fn summary(&self) -> String {
        format!(
            "prefixes={:?} regexes={:?} extensions={:?}",
            self.prefixes,
            self.patterns.iter().map(Regex::as_str).collect::<Vec<_>>(),
            self.extensions
        )
    }
}

/// Root-relative, `/`-separated key with a leading `/`.
///
/// Paths outside `root` keep their full form.
pub fn catalog_key(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    let joined = to_slash_string(rel);
    if joined.starts_with('/') {
        joined
    } else {
        format!("/{joined}")
    }
}

fn to_slash_string(path: &Path) -> String {
    let mut out = String::new();
    for component in path.components() {
        match component {
            std::path::Component::RootDir => out.push('/'),
            other => {
                if !out.is_empty() && !out.ends_with('/') {
                    out.push('/');
                }
                out.push_str(&other.as_os_str().to_string_lossy());
            }
        }
    }
    out
}

/// Root-relative form of a configured prefix. An absolute prefix under
/// `root` loses the root, compared by path component, so `/nas2` is not
/// under `/nas`.
fn normalize_prefix(root: &Path, prefix: &str) -> String {
    let rel = match Path::new(prefix).strip_prefix(root) {
        Ok(rel) if !root.as_os_str().is_empty() => to_slash_string(rel),
        _ => prefix.to_string(),
    };
    if rel.starts_with('/') {
        rel
    } else {
        format!("/{rel}")
    }
}

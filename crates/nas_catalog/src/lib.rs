//! NAS Catalog - File Discovery, Change Detection & Enrichment
//!
//! Walks a NAS mount, decides which files are new or changed, classifies
//! them through an external understanding service and upserts the result
//! into the catalog keyed by root-relative path.
//!
//! # Pipeline
//!
//! ```text
//! ┌──────────┐   ┌──────────┐   ┌────────────┐   ┌───────────┐   ┌──────────┐
//! │  Walker  │──▶│  Filter  │──▶│ Reconciler │──▶│  Enricher │──▶│  Writer  │
//! │ (stream) │   │ (gate)   │   │ (2 gates)  │   │ (classify │   │ (upsert) │
//! └──────────┘   └────┬─────┘   └────────────┘   │  ∥ hash)  │   └──────────┘
//!                     ▼                          └─────┬─────┘
//!              DirectoryIndex                     ImageQueue
//! ```
//!
//! # Core Concepts
//!
//! - **Catalog key**: path relative to the scan root, always starting with `/`
//! - **Timestamp gate**: prior `updated_at >= mtime` skips the file outright
//! - **Checksum gate**: unchanged content with a known group skips classification
//! - **Soft failure**: per-file I/O, classification and write errors are
//!   logged and counted, never fatal to the scan

pub mod cancel;
pub mod classifier;
pub mod config;
pub mod directory_index;
pub mod enrich;
pub mod error;
pub mod filter;
pub mod image_queue;
pub mod probe;
pub mod reconcile;
pub mod scan;
pub mod store;
pub mod task;
pub mod walker;
pub mod writer;

// Re-exports for convenience
pub use cancel::CancellationToken;
pub use classifier::{Classification, ClassificationRequest, Classifier, HttpClassifier};
pub use config::{CatalogConfig, ClassifierConfig, ScanOptions};
pub use directory_index::DirectoryIndex;
pub use enrich::{Enriched, Enricher};
pub use error::{ClassifyError, ConfigError, Result, ScanError};
pub use filter::ScanFilter;
pub use image_queue::{ImageJob, ImageQueue};
pub use probe::{FileProbe, FileStat, FsProbe};
pub use reconcile::{Candidate, Decision, Reconciler};
pub use scan::{ScanReport, ScanState, ScanTask};
pub use store::CatalogStore;
pub use task::{Task, TaskServer};
pub use walker::{spawn_walk, walk, WalkStats};
pub use writer::CatalogWriter;

pub use nas_catalog_db::{CatalogDb, CatalogEntry};

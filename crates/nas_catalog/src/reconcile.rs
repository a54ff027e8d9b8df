//! Change detection against the prior catalog entry.
//!
//! Two gates, cheapest first:
//! 1. timestamp: prior `updated_at >= mtime` means unchanged, nothing else runs;
//! 2. checksum: same content and an already resolved group means the
//!    classification is still valid.
//!
//! When the prior group is unresolved the checksum gate can never skip, so
//! hashing is left to the enrichment step where it overlaps classification.

use crate::probe::FileProbe;
use crate::store::CatalogStore;
use nas_catalog_db::CatalogEntry;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// An entry that needs classification.
///
/// `entry` still holds the prior `updated_at` and `checksum`; they only
/// advance to the probed values once classification succeeds, so a failed
/// call is retried by the next scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Prior classification carried over, probed size.
    pub entry: CatalogEntry,
    /// Probed modification time, 0 when unknown.
    pub modified_ms: i64,
    /// Checksum already computed by the checksum gate; `None` defers hashing.
    pub checksum: Option<String>,
}

/// Outcome of reconciling one discovered file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Timestamp gate passed: no hash, no classification, no write.
    Unchanged,
    /// Content identical and classification known. The entry carries the
    /// refreshed size and timestamp and only needs writing.
    ContentUnchanged(CatalogEntry),
    /// Needs classification.
    Enrich(Candidate),
}

pub struct Reconciler {
    store: Arc<dyn CatalogStore>,
    probe: Arc<dyn FileProbe>,
}

impl Reconciler {
    pub fn new(store: Arc<dyn CatalogStore>, probe: Arc<dyn FileProbe>) -> Self {
        Self { store, probe }
    }

    /// Decide what to do with the file at `source`, catalogued as `key`.
    pub async fn reconcile(&self, key: &str, source: &Path) -> Decision {
        let prior = match self.store.get_by_path(key).await {
            Ok(prior) => prior,
            Err(e) => {
                warn!(path = %key, error = %e, "Failed to read prior entry, treating as new");
                None
            }
        };

        let stat = self.probe.stat(source);
        if let Some(prior) = &prior {
            if stat.is_known() && prior.updated_at >= stat.modified_ms {
                debug!(path = %key, updated_at = prior.updated_at, mtime = stat.modified_ms, "Unchanged");
                return Decision::Unchanged;
            }
        }

        let mut entry = CatalogEntry::new(key);
        entry.size = stat.size;
        if let Some(prior) = &prior {
            entry.inherit_classification(prior);
            entry.checksum = prior.checksum.clone();
            entry.updated_at = prior.updated_at;
            if !stat.is_known() {
                entry.size = prior.size;
            }
        }

        let resolved = prior.as_ref().filter(|p| p.is_classified());
        let Some(prior) = resolved else {
            debug!(path = %key, "Stale or new, hashing deferred to enrichment");
            return Decision::Enrich(Candidate {
                entry,
                modified_ms: stat.modified_ms,
                checksum: None,
            });
        };

        let checksum = self.probe.checksum(source).await;
        if !checksum.is_empty() && checksum == prior.checksum {
            debug!(path = %key, "Timestamp moved but content unchanged");
            entry.checksum = checksum;
            entry.updated_at = entry.updated_at.max(stat.modified_ms);
            return Decision::ContentUnchanged(entry);
        }

        debug!(path = %key, "Content changed");
        Decision::Enrich(Candidate {
            entry,
            modified_ms: stat.modified_ms,
            checksum: Some(checksum),
        })
    }
}

//! Enrichment: classification and checksum for one stale file.
//!
//! The two calls are independent, so they run together and are joined
//! before the entry is finalised. A failed classification leaves the
//! candidate's existing classification, checksum and timestamp in place.

use crate::classifier::{ClassificationRequest, Classifier};
use crate::error::ClassifyError;
use crate::image_queue::{ImageJob, ImageQueue};
use crate::probe::FileProbe;
use crate::reconcile::Candidate;
use nas_catalog_db::CatalogEntry;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Result of enriching one file.
#[derive(Debug)]
pub struct Enriched {
    pub entry: CatalogEntry,
    /// Classification error, if the call failed or timed out.
    pub classify_error: Option<ClassifyError>,
    /// True when the entry was handed to the image queue.
    pub image_queued: bool,
}

impl Enriched {
    pub fn classified(&self) -> bool {
        self.classify_error.is_none()
    }
}

pub struct Enricher {
    classifier: Arc<dyn Classifier>,
    probe: Arc<dyn FileProbe>,
    timeout: Duration,
    images: Option<ImageQueue>,
}

impl Enricher {
    pub fn new(classifier: Arc<dyn Classifier>, probe: Arc<dyn FileProbe>, timeout: Duration) -> Self {
        Self {
            classifier,
            probe,
            timeout,
            images: None,
        }
    }

    /// Route newly classified images to `queue`.
    pub fn with_image_queue(mut self, queue: ImageQueue) -> Self {
        self.images = Some(queue);
        self
    }

    pub async fn enrich(&self, candidate: Candidate, source: &Path) -> Enriched {
        let Candidate {
            mut entry,
            modified_ms,
            checksum,
        } = candidate;
        let request = ClassificationRequest::new(entry.path.clone());

        let classify = async {
            match tokio::time::timeout(self.timeout, self.classifier.classify(&request)).await {
                Ok(result) => result,
                Err(_) => Err(ClassifyError::Timeout(self.timeout)),
            }
        };
        let hash = async {
            match checksum {
                Some(digest) => digest,
                None => self.probe.checksum(source).await,
            }
        };

        let (classification, digest) = tokio::join!(classify, hash);

        let classify_error = match classification {
            Ok(classification) => {
                classification.apply_to(&mut entry);
                entry.checksum = digest;
                entry.updated_at = entry.updated_at.max(modified_ms);
                debug!(path = %entry.path, group = %entry.group, "Classified");
                None
            }
            Err(e) => {
                warn!(
                    path = %entry.path,
                    classifier = self.classifier.name(),
                    error = %e,
                    "Classification failed, keeping previous classification"
                );
                Some(e)
            }
        };

        let image_queued = match (&self.images, classify_error.is_none() && entry.is_image()) {
            (Some(queue), true) => queue.offer(ImageJob {
                source: source.to_path_buf(),
                entry: entry.clone(),
            }),
            _ => false,
        };

        Enriched {
            entry,
            classify_error,
            image_queued,
        }
    }
}

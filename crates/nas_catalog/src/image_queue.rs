//! Hand-off of freshly classified images to the compression worker.

use nas_catalog_db::CatalogEntry;
use std::path::PathBuf;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

/// One image waiting for compression.
#[derive(Debug, Clone)]
pub struct ImageJob {
    /// Absolute path on the NAS.
    pub source: PathBuf,
    pub entry: CatalogEntry,
}

/// Bounded, non-blocking sender side. The scan never waits on it.
#[derive(Debug, Clone)]
pub struct ImageQueue {
    tx: mpsc::Sender<ImageJob>,
}

impl ImageQueue {
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<ImageJob>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    /// Try to enqueue; returns false when the job was dropped.
    pub fn offer(&self, job: ImageJob) -> bool {
        match self.tx.try_send(job) {
            Ok(()) => true,
            Err(TrySendError::Full(job)) => {
                warn!(path = %job.entry.path, "Image queue full, dropping");
                false
            }
            Err(TrySendError::Closed(job)) => {
                debug!(path = %job.entry.path, "Image queue closed, dropping");
                false
            }
        }
    }
}

//! Scan orchestrator: one full pass over the NAS root.
//!
//! Walk → filter → directory index → reconcile → enrich → write, one file
//! at a time. Cancellation is polled before each discovered path; work
//! already started for a file always finishes.

use crate::cancel::CancellationToken;
use crate::classifier::Classifier;
use crate::directory_index::DirectoryIndex;
use crate::enrich::Enricher;
use crate::error::{Result, ScanError};
use crate::filter::ScanFilter;
use crate::image_queue::ImageQueue;
use crate::probe::{FileProbe, FsProbe};
use crate::reconcile::{Decision, Reconciler};
use crate::store::CatalogStore;
use crate::task::Task;
use crate::walker::spawn_walk;
use crate::writer::CatalogWriter;
use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{debug, info, warn};

const DEFAULT_CLASSIFY_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_WALK_BUFFER: usize = 1024;

/// Lifecycle of the most recent scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanState {
    #[default]
    Idle,
    Running,
    Completed,
    Cancelled,
}

impl ScanState {
    fn as_u8(self) -> u8 {
        match self {
            ScanState::Idle => 0,
            ScanState::Running => 1,
            ScanState::Completed => 2,
            ScanState::Cancelled => 3,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            1 => ScanState::Running,
            2 => ScanState::Completed,
            3 => ScanState::Cancelled,
            _ => ScanState::Idle,
        }
    }
}

/// Counters for one scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    pub discovered: u64,
    pub in_scope: u64,
    /// Skipped by the timestamp gate.
    pub unchanged: u64,
    /// Skipped by the checksum gate (timestamp refreshed).
    pub content_unchanged: u64,
    pub enriched: u64,
    pub classify_failures: u64,
    pub write_failures: u64,
    pub images_queued: u64,
    pub state: ScanState,
    pub elapsed_ms: u64,
    pub directories: BTreeSet<String>,
}

/// The scan unit scheduled by the task server.
pub struct ScanTask {
    name: String,
    filter: ScanFilter,
    store: Arc<dyn CatalogStore>,
    classifier: Arc<dyn Classifier>,
    probe: Arc<dyn FileProbe>,
    images: Option<ImageQueue>,
    classify_timeout: Duration,
    walk_buffer: usize,
    rescan_interval: Option<Duration>,
    state: AtomicU8,
    directories: watch::Sender<BTreeSet<String>>,
    reports: watch::Sender<Option<ScanReport>>,
}

impl ScanTask {
    pub fn new(filter: ScanFilter, store: Arc<dyn CatalogStore>, classifier: Arc<dyn Classifier>) -> Self {
        let (directories, _) = watch::channel(BTreeSet::new());
        let (reports, _) = watch::channel(None);
        Self {
            name: "file-scan".to_string(),
            filter,
            store,
            classifier,
            probe: Arc::new(FsProbe),
            images: None,
            classify_timeout: DEFAULT_CLASSIFY_TIMEOUT,
            walk_buffer: DEFAULT_WALK_BUFFER,
            rescan_interval: None,
            state: AtomicU8::new(ScanState::Idle.as_u8()),
            directories,
            reports,
        }
    }

    pub fn with_probe(mut self, probe: Arc<dyn FileProbe>) -> Self {
        self.probe = probe;
        self
    }

    pub fn with_image_queue(mut self, queue: ImageQueue) -> Self {
        self.images = Some(queue);
        self
    }

    pub fn with_classify_timeout(mut self, timeout: Duration) -> Self {
        self.classify_timeout = timeout;
        self
    }

    pub fn with_walk_buffer(mut self, buffer: usize) -> Self {
        self.walk_buffer = buffer.max(1);
        self
    }

    /// Rescan on this interval from `start` until cancelled.
    pub fn with_rescan_interval(mut self, interval: Option<Duration>) -> Self {
        self.rescan_interval = interval;
        self
    }

    pub fn state(&self) -> ScanState {
        ScanState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Directory set of the latest finished scan.
    pub fn subscribe_directories(&self) -> watch::Receiver<BTreeSet<String>> {
        self.directories.subscribe()
    }

    pub fn last_report(&self) -> Option<ScanReport> {
        self.reports.borrow().clone()
    }

    pub fn subscribe_reports(&self) -> watch::Receiver<Option<ScanReport>> {
        self.reports.subscribe()
    }

    fn begin(&self) -> Result<()> {
        let running = ScanState::Running.as_u8();
        self.state
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                (current != running).then_some(running)
            })
            .map(|_| ())
            .map_err(|_| ScanError::AlreadyRunning(self.filter.root().display().to_string()))
    }

    /// Run one full scan.
    pub async fn run_scan(&self, cancel: &CancellationToken) -> Result<ScanReport> {
        self.begin()?;
        let started = Instant::now();
        let root = self.filter.root().to_path_buf();
        info!(root = %root.display(), filter = %self.filter.summary(), "Scan started");

        let reconciler = Reconciler::new(Arc::clone(&self.store), Arc::clone(&self.probe));
        let mut enricher = Enricher::new(
            Arc::clone(&self.classifier),
            Arc::clone(&self.probe),
            self.classify_timeout,
        );
        if let Some(queue) = &self.images {
            enricher = enricher.with_image_queue(queue.clone());
        }
        let writer = CatalogWriter::new(Arc::clone(&self.store));

        let mut report = ScanReport::default();
        let mut index = DirectoryIndex::new();
        let mut cancelled = false;

        let (mut paths, walker) = spawn_walk(root.clone(), self.walk_buffer);
        while let Some(path) = paths.recv().await {
            if cancel.is_cancelled() {
                cancelled = true;
                break;
            }
            report.discovered += 1;
            if !self.filter.is_in_scope(&path) {
                continue;
            }
            report.in_scope += 1;

            let key = self.filter.catalog_key(&path);
            index.add_parent_of(&key);
            self.process(&key, &path, &reconciler, &enricher, &writer, &mut report)
                .await;
        }
        drop(paths);

        match walker.await {
            Ok(stats) if stats.errors > 0 => {
                warn!(root = %root.display(), errors = stats.errors, "Walk skipped unreadable entries")
            }
            Ok(_) => {}
            Err(e) => warn!(root = %root.display(), error = %e, "Walker task failed"),
        }

        let state = if cancelled {
            ScanState::Cancelled
        } else {
            ScanState::Completed
        };
        report.state = state;
        report.elapsed_ms = started.elapsed().as_millis() as u64;
        report.directories = index.into_set();

        self.directories.send_replace(report.directories.clone());
        self.reports.send_replace(Some(report.clone()));
        self.state.store(state.as_u8(), Ordering::SeqCst);

        info!(
            root = %root.display(),
            state = ?state,
            discovered = report.discovered,
            in_scope = report.in_scope,
            unchanged = report.unchanged,
            content_unchanged = report.content_unchanged,
            enriched = report.enriched,
            classify_failures = report.classify_failures,
            write_failures = report.write_failures,
            images_queued = report.images_queued,
            directories = report.directories.len(),
            elapsed_ms = report.elapsed_ms,
            "Scan finished"
        );
        Ok(report)
    }

    async fn process(
        &self,
        key: &str,
        source: &Path,
        reconciler: &Reconciler,
        enricher: &Enricher,
        writer: &CatalogWriter,
        report: &mut ScanReport,
    ) {
        match reconciler.reconcile(key, source).await {
            Decision::Unchanged => report.unchanged += 1,
            Decision::ContentUnchanged(entry) => {
                report.content_unchanged += 1;
                if !writer.write(&entry).await {
                    report.write_failures += 1;
                }
            }
            Decision::Enrich(candidate) => {
                let enriched = enricher.enrich(candidate, source).await;
                report.enriched += 1;
                if !enriched.classified() {
                    report.classify_failures += 1;
                }
                if enriched.image_queued {
                    report.images_queued += 1;
                }
                if !writer.write(&enriched.entry).await {
                    report.write_failures += 1;
                }
            }
        }
    }
}

#[async_trait]
impl Task for ScanTask {
    fn name(&self) -> &str {
        &self.name
    }

    async fn start(&self, cancel: CancellationToken) -> Result<()> {
        loop {
            let report = self.run_scan(&cancel).await?;
            let Some(interval) = self.rescan_interval else {
                return Ok(());
            };
            if report.state == ScanState::Cancelled {
                return Ok(());
            }
            debug!(next_in_secs = interval.as_secs(), "Waiting for next scan");
            tokio::select! {
                _ = cancel.cancelled() => return Ok(()),
                _ = tokio::time::sleep(interval) => {}
            }
        }
    }

    async fn stop(&self, _cancel: CancellationToken) -> Result<()> {
        debug!(task = %self.name, state = ?self.state(), "Scan task stopped");
        Ok(())
    }
}

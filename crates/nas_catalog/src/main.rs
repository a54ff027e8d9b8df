//! NAS Catalog scanner
//!
//! Usage:
//!     nas-catalog --config /etc/nas-catalog.toml
//!     nas-catalog --root /volume1/share --once --json

use anyhow::Context;
use clap::Parser;
use nas_catalog::{
    CancellationToken, CatalogConfig, CatalogDb, HttpClassifier, ImageQueue, ScanFilter, ScanTask,
    TaskServer,
};
use nas_catalog_logging::{init_logging, LogConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "nas-catalog", about = "Scan a NAS mount into the file catalog")]
struct Args {
    /// TOML configuration file
    #[arg(long, env = "NAS_CATALOG_CONFIG")]
    config: Option<PathBuf>,

    /// Scan root, overrides `root_path`
    #[arg(long)]
    root: Option<String>,

    /// Catalog database, overrides `database_path`
    #[arg(long)]
    database: Option<String>,

    /// Scan once and exit, ignoring `rescan_interval_secs`
    #[arg(long)]
    once: bool,

    /// Print the last scan report as JSON on exit
    #[arg(long)]
    json: bool,

    /// Log at info level on stderr
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => CatalogConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => CatalogConfig::default(),
    };
    if let Some(root) = args.root {
        config.root_path = root;
    }
    if let Some(database) = args.database {
        config.database_path = database;
    }
    if args.once {
        config.rescan_interval_secs = None;
    }
    config.validate()?;

    init_logging(LogConfig {
        app_name: "nas-catalog",
        log_dir: config.log_dir.as_ref().map(PathBuf::from),
        verbose: args.verbose,
    })?;

    // Bad regexes stop us here, before anything is scanned
    let filter = ScanFilter::new(config.root_path.clone(), &config.scan)?;

    info!("Starting NAS catalog scanner");
    info!("  Root: {}", config.root_path);
    info!("  Database: {}", config.database_path);
    info!("  Classifier: {}", config.classifier.base_url);

    let db = CatalogDb::open(&config.database_path)
        .await
        .with_context(|| format!("Failed to open catalog {}", config.database_path))?;
    let classifier = HttpClassifier::new(&config.classifier)?;

    let (images, mut pending_images) = ImageQueue::channel(config.image_queue_capacity);
    tokio::spawn(async move {
        while let Some(job) = pending_images.recv().await {
            info!(path = %job.entry.path, source = %job.source.display(), "Image ready for compression");
        }
    });

    let scan = Arc::new(
        ScanTask::new(filter, Arc::new(db.clone()), Arc::new(classifier))
            .with_image_queue(images)
            .with_classify_timeout(config.classifier.timeout())
            .with_walk_buffer(config.scan.walk_buffer)
            .with_rescan_interval(config.rescan_interval()),
    );

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Interrupt received, stopping after the current file");
                cancel.cancel();
            }
        });
    }

    let mut server = TaskServer::new();
    server.register(scan.clone());
    let outcome = server.run(cancel).await;

    if args.json {
        if let Some(report) = scan.last_report() {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    db.close().await;
    outcome?;
    Ok(())
}

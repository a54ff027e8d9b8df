//! Task lifecycle: long-running units started with a shared cancellation
//! token and stopped at shutdown.

use crate::cancel::CancellationToken;
use crate::error::{Result, ScanError};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

#[async_trait]
pub trait Task: Send + Sync {
    fn name(&self) -> &str;

    /// Run until the work is done or `cancel` fires.
    async fn start(&self, cancel: CancellationToken) -> Result<()>;

    /// Shutdown hook, called once after every task has returned.
    async fn stop(&self, cancel: CancellationToken) -> Result<()>;
}

/// Runs registered tasks concurrently and collects their outcome.
///
/// The first failure cancels the shared token so siblings wind down; it is
/// the error returned once everything has stopped.
#[derive(Default)]
pub struct TaskServer {
    tasks: Vec<Arc<dyn Task>>,
}

impl TaskServer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, task: Arc<dyn Task>) -> &mut Self {
        self.tasks.push(task);
        self
    }

    pub fn task_names(&self) -> Vec<String> {
        self.tasks.iter().map(|t| t.name().to_string()).collect()
    }

    pub async fn run(&self, cancel: CancellationToken) -> Result<()> {
        let mut set = JoinSet::new();
        for task in &self.tasks {
            let task = Arc::clone(task);
            let cancel = cancel.clone();
            info!(task = task.name(), "Starting task");
            set.spawn(async move {
                let result = task.start(cancel).await;
                (task.name().to_string(), result)
            });
        }

        let mut first_error: Option<ScanError> = None;
        while let Some(joined) = set.join_next().await {
            let failure = match joined {
                Ok((name, Ok(()))) => {
                    info!(task = %name, "Task finished");
                    None
                }
                Ok((name, Err(e))) => Some(ScanError::Task {
                    task: name,
                    message: e.to_string(),
                }),
                Err(e) => Some(ScanError::Join(e)),
            };
            if let Some(e) = failure {
                error!(error = %e, "Task failed");
                cancel.cancel();
                first_error.get_or_insert(e);
            }
        }

        for task in &self.tasks {
            if let Err(e) = task.stop(cancel.clone()).await {
                warn!(task = task.name(), error = %e, "Task stop failed");
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

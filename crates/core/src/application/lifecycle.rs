// Lifecycle Coordinator - starts and stops the worker task

use crate::application::service::QueueService;
use crate::application::worker::{shutdown_channel, ShutdownSender, ShutdownToken, Worker};
use crate::domain::WorkerState;
use crate::error::{AppError, Result};
use crate::port::{ChatNotifier, MediaFetcher, StatsStore};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Collaborators the worker needs
pub struct WorkerDeps {
    pub fetcher: Arc<dyn MediaFetcher>,
    pub notifier: Arc<dyn ChatNotifier>,
    pub stats: Arc<dyn StatsStore>,
}

pub struct WorkerLifecycle;

impl WorkerLifecycle {
    /// Initialize storage, then spawn the worker loop.
    ///
    /// Every job resolution writes a stat, so a store that cannot initialize
    /// aborts startup instead of running the worker against it.
    pub async fn start(service: &QueueService, deps: WorkerDeps) -> Result<RunningWorker> {
        deps.stats.initialize().await.map_err(|e| {
            error!(error = %e, "Statistics store failed to initialize");
            e
        })?;

        let (shutdown, token) = shutdown_channel();
        let worker = Worker::new(service.queue(), deps.fetcher, deps.notifier, deps.stats);
        let status = worker.subscribe();

        let handle = tokio::spawn(async move {
            worker.run(token).await;
        });

        info!("Download worker started");
        Ok(RunningWorker {
            shutdown,
            handle,
            status,
        })
    }
}

/// Handle to the spawned worker
pub struct RunningWorker {
    shutdown: ShutdownSender,
    handle: JoinHandle<()>,
    status: watch::Receiver<WorkerState>,
}

impl RunningWorker {
    /// Live view of the worker state
    pub fn status(&self) -> watch::Receiver<WorkerState> {
        self.status.clone()
    }

    /// Token fired when `stop` is called; lets other background tasks share
    /// the worker's shutdown signal
    pub fn shutdown_token(&self) -> ShutdownToken {
        self.shutdown.token()
    }

    /// Signal shutdown and wait for the worker to finish its current job.
    ///
    /// No timeout here; callers that need one wrap this call.
    pub async fn stop(self) -> Result<()> {
        self.shutdown.shutdown();
        self.handle.await.map_err(|e| {
            if e.is_panic() {
                AppError::Internal(format!("worker task panicked: {}", e))
            } else {
                AppError::Internal(format!("worker task cancelled: {}", e))
            }
        })?;
        info!("Download worker stopped");
        Ok(())
    }
}

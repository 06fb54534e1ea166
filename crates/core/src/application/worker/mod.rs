// Worker - sequential job execution loop

pub mod constants;
mod shutdown;

pub use shutdown::{shutdown_channel, ShutdownSender, ShutdownToken};

use crate::application::queue::JobQueue;
use crate::domain::{Job, JobFailure, JobOutcome, WorkerState};
use crate::port::{ChatNotifier, FetchResult, MediaFetcher, StatsStore};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Drains the job queue one job at a time.
///
/// Every job is fully resolved (fetch, notify, clean up) before the next one is
/// dequeued, and no job is ever requeued.
pub struct Worker {
    queue: Arc<JobQueue>,
    fetcher: Arc<dyn MediaFetcher>,
    notifier: Arc<dyn ChatNotifier>,
    stats: Arc<dyn StatsStore>,
    state: watch::Sender<WorkerState>,
}

impl Worker {
    pub fn new(
        queue: Arc<JobQueue>,
        fetcher: Arc<dyn MediaFetcher>,
        notifier: Arc<dyn ChatNotifier>,
        stats: Arc<dyn StatsStore>,
    ) -> Self {
        let (state, _) = watch::channel(WorkerState::Idle);
        Self {
            queue,
            fetcher,
            notifier,
            stats,
            state,
        }
    }

    /// Observe state transitions
    pub fn subscribe(&self) -> watch::Receiver<WorkerState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> WorkerState {
        *self.state.borrow()
    }

    fn set_state(&self, state: WorkerState) {
        self.state.send_replace(state);
    }

    /// Run worker loop with graceful shutdown support.
    ///
    /// Shutdown is observed between jobs; a job already dequeued runs to
    /// completion. Jobs still queued stay in the queue.
    pub async fn run(&self, mut shutdown: ShutdownToken) {
        info!("Worker started");
        loop {
            // Check for shutdown signal
            if shutdown.is_shutdown() {
                info!("Worker shutting down");
                break;
            }

            let job = tokio::select! {
                biased;
                _ = shutdown.wait() => {
                    info!("Worker interrupted during idle");
                    break;
                }
                job = self.queue.dequeue() => job,
            };

            self.process_job(job).await;
        }
        self.set_state(WorkerState::Stopped);
        info!(
            pending = self.queue.current_depth(),
            "Worker stopped"
        );
    }

    /// Resolve one job: fetch, notify, record, clean up
    pub async fn process_job(&self, job: Job) -> JobOutcome {
        self.set_state(WorkerState::Fetching);
        info!(
            job_id = %job.id,
            submitter_id = job.submitter_id,
            position = job.position_at_submission,
            "Processing job"
        );

        self.mark_in_progress(&job).await;

        let fetched = self.fetch_isolated(&job).await;
        let artifact = fetched.as_ref().ok().cloned();

        self.set_state(WorkerState::Notifying);
        let resolution = Resolution {
            notifier: Arc::clone(&self.notifier),
            stats: Arc::clone(&self.stats),
            recorded: Arc::new(AtomicBool::new(false)),
        };
        let handle = {
            let resolution = resolution.clone();
            let job = job.clone();
            tokio::spawn(async move {
                match fetched {
                    Ok(file_path) => resolution.deliver(job, file_path).await,
                    Err(failure) => resolution.fail(job, failure).await,
                }
            })
        };

        let outcome = match handle.await {
            Ok(outcome) => outcome,
            Err(join_err) => {
                error!(job_id = %job.id, "Job resolution crashed: {:?}", join_err);
                let failure = JobFailure::Unexpected("notification crashed".to_string());
                resolution.recover(&job, &failure).await;
                JobOutcome::failed(job, &failure, artifact.clone())
            }
        };

        // Always, even if delivery failed or crashed
        if let Some(path) = &artifact {
            self.set_state(WorkerState::CleaningUp);
            remove_artifact(path).await;
        }

        self.set_state(WorkerState::Idle);
        outcome
    }

    /// Best-effort: the status indicator is cosmetic
    async fn mark_in_progress(&self, job: &Job) {
        let notifier = Arc::clone(&self.notifier);
        let reply = job.reply.clone();
        match tokio::spawn(async move { notifier.mark_in_progress(&reply).await }).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => debug!(job_id = %job.id, error = %e, "Could not update status indicator"),
            Err(join_err) => warn!(job_id = %job.id, "Status update crashed: {:?}", join_err),
        }
    }

    /// Run the fetch in its own task so a panicking fetcher cannot take the
    /// worker down with it.
    async fn fetch_isolated(&self, job: &Job) -> Result<PathBuf, JobFailure> {
        let fetcher = Arc::clone(&self.fetcher);
        let source_url = job.source_url.clone();

        let handle = tokio::spawn(async move { fetcher.fetch(&source_url).await });

        match handle.await {
            Ok(Ok(FetchResult::Fetched { file_path })) => Ok(file_path),
            Ok(Ok(FetchResult::Failed { error })) => Err(JobFailure::FetchFailed(error)),
            Ok(Err(e)) => {
                error!(job_id = %job.id, error = %e, "Fetcher fault");
                Err(JobFailure::Unexpected(e.to_string()))
            }
            Err(join_err) => {
                if join_err.is_panic() {
                    error!(job_id = %job.id, "Fetcher panicked: {:?}", join_err);
                } else {
                    error!(job_id = %job.id, "Fetch task cancelled: {:?}", join_err);
                }
                Err(JobFailure::Unexpected("fetcher crashed".to_string()))
            }
        }
    }
}

/// Notifier and store calls for one job, run in their own task.
///
/// `recorded` is flipped before the store is called, so a job gets exactly
/// one `record_attempt` even when the store itself panics.
#[derive(Clone)]
struct Resolution {
    notifier: Arc<dyn ChatNotifier>,
    stats: Arc<dyn StatsStore>,
    recorded: Arc<AtomicBool>,
}

impl Resolution {
    async fn deliver(&self, job: Job, file_path: PathBuf) -> JobOutcome {
        match self.notifier.deliver_media(&job.reply, &file_path).await {
            Ok(()) => {
                self.record_attempt(&job, true).await;
                if let Err(e) = self.notifier.clear_status(&job.reply).await {
                    debug!(job_id = %job.id, error = %e, "Could not clear status indicator");
                }
                info!(job_id = %job.id, "Job delivered");
                JobOutcome::succeeded(job, file_path)
            }
            Err(e) => {
                warn!(job_id = %job.id, error = %e, "Delivery failed after successful fetch");
                let failure = JobFailure::DeliveryFailed(e.to_string());
                self.record_attempt(&job, false).await;
                self.show_failure(&job, &failure).await;
                JobOutcome::failed(job, &failure, Some(file_path))
            }
        }
    }

    async fn fail(&self, job: Job, failure: JobFailure) -> JobOutcome {
        warn!(job_id = %job.id, error = %failure.detail(), "Job failed");

        self.record_attempt(&job, false).await;
        self.show_failure(&job, &failure).await;

        JobOutcome::failed(job, &failure, None)
    }

    /// After a crash mid-resolution: record and report the failure unless the
    /// attempt was already recorded. Runs isolated as well.
    async fn recover(&self, job: &Job, failure: &JobFailure) {
        let this = self.clone();
        let job = job.clone();
        let failure = failure.clone();
        let job_id = job.id.clone();
        let handle = tokio::spawn(async move {
            if this.record_attempt(&job, false).await {
                this.show_failure(&job, &failure).await;
            }
        });
        if let Err(join_err) = handle.await {
            warn!(job_id = %job_id, "Failure reporting crashed: {:?}", join_err);
        }
    }

    /// Storage problems never change what the submitter is told.
    ///
    /// Returns false if this job already had its attempt recorded.
    async fn record_attempt(&self, job: &Job, success: bool) -> bool {
        if self.recorded.swap(true, Ordering::SeqCst) {
            return false;
        }
        if let Err(e) = self
            .stats
            .record_attempt(job.submitter_id, &job.source_url, success)
            .await
        {
            warn!(job_id = %job.id, error = %e, "Failed to record download attempt");
        }
        true
    }

    async fn show_failure(&self, job: &Job, failure: &JobFailure) {
        if let Err(e) = self.notifier.report_failure(&job.reply, failure).await {
            warn!(job_id = %job.id, error = %e, "Failed to report failure to submitter");
        }
    }
}

/// Delete a fetched file. Already gone is fine.
async fn remove_artifact(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!(path = %path.display(), "Artifact removed"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove artifact"),
    }
}

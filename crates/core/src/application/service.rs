// Queue Service - owns the job queue and the cooldown registry

use crate::application::admission::{
    validate_source_url, Accepted, AdmissionConfig, CooldownRegistry, Submission,
};
use crate::application::queue::JobQueue;
use crate::domain::{Job, Rejection};
use crate::port::{IdProvider, TimeProvider};
use std::sync::Arc;
use tracing::{debug, info};

/// Entry point for submissions.
///
/// Constructed once at startup and shared (`Arc`) between the chat front end,
/// the HTTP surface and the worker.
pub struct QueueService {
    queue: Arc<JobQueue>,
    cooldowns: CooldownRegistry,
    config: AdmissionConfig,
    id_provider: Arc<dyn IdProvider>,
    time_provider: Arc<dyn TimeProvider>,
}

impl QueueService {
    pub fn new(
        config: AdmissionConfig,
        id_provider: Arc<dyn IdProvider>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            queue: Arc::new(JobQueue::new()),
            cooldowns: CooldownRegistry::new(),
            config,
            id_provider,
            time_provider,
        }
    }

    /// Admit a submission at the current time
    pub fn submit(&self, submission: Submission) -> Result<Accepted, Rejection> {
        let now = self.time_provider.now_millis();
        self.try_admit(submission, now)
    }

    /// Admit a submission at `now_millis`.
    ///
    /// On acceptance the cooldown is recorded unconditionally (a later failure
    /// of the job does not refund it) and the job is enqueued. No I/O.
    pub fn try_admit(&self, submission: Submission, now_millis: i64) -> Result<Accepted, Rejection> {
        let url = validate_source_url(&submission.source_url, &self.config.url_marker)?;

        if let Err(rejection) = self.cooldowns.check_and_record(
            submission.submitter_id,
            now_millis,
            self.config.cooldown_millis(),
        ) {
            debug!(
                submitter_id = submission.submitter_id,
                reason = %rejection,
                "Submission rejected"
            );
            return Err(rejection);
        }

        let job_id = self.id_provider.generate_id();
        let reply = submission.reply;
        let position = self.queue.enqueue_with(|depth| {
            Job::new(
                job_id.clone(),
                submission.submitter_id,
                url,
                now_millis,
                depth,
                reply,
            )
        });

        info!(
            job_id = %job_id,
            submitter_id = submission.submitter_id,
            position = position,
            "Job accepted"
        );

        Ok(Accepted { job_id, position })
    }

    /// Number of jobs waiting (not counting the one in flight)
    pub fn current_depth(&self) -> usize {
        self.queue.current_depth()
    }

    pub fn queue(&self) -> Arc<JobQueue> {
        Arc::clone(&self.queue)
    }

    pub fn config(&self) -> &AdmissionConfig {
        &self.config
    }

    pub fn cooldowns(&self) -> &CooldownRegistry {
        &self.cooldowns
    }

    /// Forget submitters whose cooldown has fully elapsed
    pub fn prune_cooldowns(&self) -> usize {
        let now = self.time_provider.now_millis();
        self.cooldowns
            .prune_expired(now, self.config.cooldown_millis())
    }
}

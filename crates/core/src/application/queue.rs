// Job Queue - unbounded FIFO with a suspending dequeue

use crate::domain::Job;
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use tokio::sync::Notify;

/// Pending jobs in arrival order.
///
/// No capacity bound: the only backpressure signal is the position reported
/// to the submitter.
#[derive(Debug, Default)]
pub struct JobQueue {
    jobs: Mutex<VecDeque<Job>>,
    available: Notify,
}

impl JobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a job
    ///
    /// # Returns
    /// Depth before insertion (0 = next to run)
    pub fn enqueue(&self, job: Job) -> usize {
        self.enqueue_with(|_| job)
    }

    /// Build and append a job while holding the queue lock, so the job can
    /// record the exact depth it was inserted at.
    pub fn enqueue_with(&self, make_job: impl FnOnce(usize) -> Job) -> usize {
        let depth = {
            let mut jobs = self.jobs.lock().unwrap_or_else(PoisonError::into_inner);
            let depth = jobs.len();
            jobs.push_back(make_job(depth));
            depth
        };
        self.available.notify_one();
        depth
    }

    /// Take the oldest job, waiting while the queue is empty.
    ///
    /// Cancel-safe: the job is removed in the same poll that returns it, so
    /// dropping this future (e.g. in `select!`) never loses a job.
    pub async fn dequeue(&self) -> Job {
        loop {
            // Register interest before checking, so an enqueue in between is not missed
            let notified = self.available.notified();
            if let Some(job) = self.try_dequeue() {
                return job;
            }
            notified.await;
        }
    }

    /// Take the oldest job if there is one
    pub fn try_dequeue(&self) -> Option<Job> {
        self.jobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }

    /// Snapshot of the number of pending jobs. Never suspends.
    pub fn current_depth(&self) -> usize {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

// Job Domain Model

use std::sync::{Arc, OnceLock};

/// Job ID (UUID v4)
pub type JobId = String;

/// Chat-side identity of whoever submitted a link
pub type SubmitterId = i64;

/// Message id of the status indicator, filled in by the chat front end once
/// it has posted the "queued"/"processing" message.
///
/// The job is enqueued before that message exists, so the slot is shared
/// between the front end and the worker and written at most once.
#[derive(Debug, Clone, Default)]
pub struct StatusSlot(Arc<OnceLock<i64>>);

impl StatusSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if a status message was already recorded
    pub fn set(&self, message_id: i64) -> bool {
        self.0.set(message_id).is_ok()
    }

    pub fn get(&self) -> Option<i64> {
        self.0.get().copied()
    }
}

/// Where results and status updates for a job go
#[derive(Debug, Clone)]
pub struct ReplyHandle {
    pub chat_id: i64,
    pub request_message_id: i64,
    pub status: StatusSlot,
}

impl ReplyHandle {
    pub fn new(chat_id: i64, request_message_id: i64) -> Self {
        Self {
            chat_id,
            request_message_id,
            status: StatusSlot::new(),
        }
    }
}

/// An accepted submission waiting in (or taken from) the job queue.
///
/// Immutable once enqueued.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: JobId,
    pub submitter_id: SubmitterId,
    pub source_url: String,
    /// Milliseconds since epoch
    pub submitted_at: i64,
    /// Queue depth seen at admission; 0 means "runs next"
    pub position_at_submission: usize,
    pub reply: ReplyHandle,
}

impl Job {
    pub fn new(
        id: JobId,
        submitter_id: SubmitterId,
        source_url: impl Into<String>,
        submitted_at: i64,
        position_at_submission: usize,
        reply: ReplyHandle,
    ) -> Self {
        Self {
            id,
            submitter_id,
            source_url: source_url.into(),
            submitted_at,
            position_at_submission,
            reply,
        }
    }
}

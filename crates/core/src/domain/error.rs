// Admission rejections

use thiserror::Error;

/// Why the admission gate refused a submission.
///
/// Rejections are surfaced synchronously to the submitter and never enqueued.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("Invalid submission: {0}")]
    InvalidSubmission(String),

    #[error("Cooldown active: {remaining_seconds}s remaining")]
    CooldownActive { remaining_seconds: u64 },
}

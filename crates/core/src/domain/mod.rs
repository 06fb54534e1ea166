// Domain Layer - Pure business logic and entities

pub mod error;
pub mod job;
pub mod outcome;

// Re-exports
pub use error::Rejection;
pub use job::{Job, JobId, ReplyHandle, StatusSlot, SubmitterId};
pub use outcome::{JobFailure, JobOutcome, WorkerState};

// Job outcome and worker state

use super::job::Job;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Worker Loop state, published to observers instead of a side "processing" flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkerState {
    Idle,
    Fetching,
    Notifying,
    CleaningUp,
    Stopped,
}

impl WorkerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerState::Idle => "IDLE",
            WorkerState::Fetching => "FETCHING",
            WorkerState::Notifying => "NOTIFYING",
            WorkerState::CleaningUp => "CLEANING_UP",
            WorkerState::Stopped => "STOPPED",
        }
    }
}

impl std::fmt::Display for WorkerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure shown to the submitter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobFailure {
    /// The fetcher reported an ordinary failure (bad link, upstream error)
    FetchFailed(String),
    /// The media was fetched but could not be delivered
    DeliveryFailed(String),
    /// Fetcher fault or panic
    Unexpected(String),
}

impl JobFailure {
    pub fn detail(&self) -> &str {
        match self {
            JobFailure::FetchFailed(d) | JobFailure::DeliveryFailed(d) | JobFailure::Unexpected(d) => d,
        }
    }
}

/// Result of processing one job. Never persisted.
#[derive(Debug, Clone)]
pub struct JobOutcome {
    pub job: Job,
    pub success: bool,
    pub error_detail: Option<String>,
    pub artifact_path: Option<PathBuf>,
}

impl JobOutcome {
    pub fn succeeded(job: Job, artifact_path: PathBuf) -> Self {
        Self {
            job,
            success: true,
            error_detail: None,
            artifact_path: Some(artifact_path),
        }
    }

    pub fn failed(job: Job, failure: &JobFailure, artifact_path: Option<PathBuf>) -> Self {
        Self {
            job,
            success: false,
            error_detail: Some(failure.detail().to_string()),
            artifact_path,
        }
    }
}

// Admission Gate - shape check and per-submitter cooldown

use crate::application::worker::constants::{DEFAULT_COOLDOWN_WINDOW, DEFAULT_URL_MARKER};
use crate::domain::{JobId, Rejection, ReplyHandle, SubmitterId};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// Admission settings
#[derive(Debug, Clone)]
pub struct AdmissionConfig {
    /// Minimum interval between two accepted submissions from one submitter
    pub cooldown: Duration,
    /// Case-insensitive substring a source URL must contain
    pub url_marker: String,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            cooldown: DEFAULT_COOLDOWN_WINDOW,
            url_marker: DEFAULT_URL_MARKER.to_string(),
        }
    }
}

impl AdmissionConfig {
    pub fn cooldown_millis(&self) -> i64 {
        i64::try_from(self.cooldown.as_millis()).unwrap_or(i64::MAX)
    }
}

/// A request to fetch one source URL
#[derive(Debug, Clone)]
pub struct Submission {
    pub submitter_id: SubmitterId,
    pub source_url: String,
    pub reply: ReplyHandle,
}

impl Submission {
    pub fn new(submitter_id: SubmitterId, source_url: impl Into<String>, reply: ReplyHandle) -> Self {
        Self {
            submitter_id,
            source_url: source_url.into(),
            reply,
        }
    }
}

/// Result of a successful admission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accepted {
    pub job_id: JobId,
    /// Queue depth before insertion; 0 means the job runs next
    pub position: usize,
}

/// Trim the URL and make sure it looks like something the fetcher can handle.
///
/// Deep URL validation is the fetcher's job.
pub fn validate_source_url<'a>(raw: &'a str, marker: &str) -> Result<&'a str, Rejection> {
    let url = raw.trim();
    if url.is_empty() {
        return Err(Rejection::InvalidSubmission(
            "source URL is empty".to_string(),
        ));
    }
    if !url.to_lowercase().contains(&marker.to_lowercase()) {
        return Err(Rejection::InvalidSubmission(format!(
            "source URL must contain '{}'",
            marker
        )));
    }
    Ok(url)
}

/// Whole seconds left in the window, rounded up and never below 1
pub fn remaining_seconds(window_millis: i64, elapsed_millis: i64) -> u64 {
    let remaining = window_millis.saturating_sub(elapsed_millis.max(0));
    let secs = remaining.saturating_add(999) / 1000;
    secs.max(1) as u64
}

/// Last accepted submission time per submitter.
///
/// Last-write-wins per key; each submission touches exactly one key, so a
/// single mutex around the map is all the coordination needed.
#[derive(Debug, Default)]
pub struct CooldownRegistry {
    entries: Mutex<HashMap<SubmitterId, i64>>,
}

impl CooldownRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject if `submitter_id` is inside its window, otherwise record `now_millis`.
    ///
    /// Check and write happen under one lock so two racing submissions from the
    /// same submitter cannot both pass.
    pub fn check_and_record(
        &self,
        submitter_id: SubmitterId,
        now_millis: i64,
        window_millis: i64,
    ) -> Result<(), Rejection> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(&last) = entries.get(&submitter_id) {
            let elapsed = now_millis - last;
            if elapsed < window_millis {
                return Err(Rejection::CooldownActive {
                    remaining_seconds: remaining_seconds(window_millis, elapsed),
                });
            }
        }

        // Acceptance implies now >= last + window, so entries only move forward
        entries.insert(submitter_id, now_millis);
        Ok(())
    }

    pub fn last_submission(&self, submitter_id: SubmitterId) -> Option<i64> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&submitter_id)
            .copied()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop entries that can no longer reject anything.
    ///
    /// # Returns
    /// Number of entries removed
    pub fn prune_expired(&self, now_millis: i64, window_millis: i64) -> usize {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|_, last| now_millis - *last < window_millis);
        before - entries.len()
    }
}

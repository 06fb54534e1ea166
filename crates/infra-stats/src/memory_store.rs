// In-memory StatsStore (no persistence)

use crate::{start_of_day_millis, truncate_url};
use async_trait::async_trait;
use clipqueue_core::domain::SubmitterId;
use clipqueue_core::error::Result;
use clipqueue_core::port::{AggregateStats, StatsStore, TimeProvider, UserStats};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Debug, Clone)]
struct Attempt {
    submitter_id: SubmitterId,
    #[allow(dead_code)]
    source_url: String,
    success: bool,
    created_at: i64,
}

#[derive(Default)]
struct Inner {
    users: HashMap<SubmitterId, String>,
    attempts: Vec<Attempt>,
}

/// Process-local statistics, lost on restart.
///
/// Used when no database is configured. Attempt history grows without bound
/// for the lifetime of the process.
pub struct InMemoryStatsStore {
    inner: Mutex<Inner>,
    time_provider: Arc<dyn TimeProvider>,
}

impl InMemoryStatsStore {
    pub fn new(time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            time_provider,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn summarize<'a>(&self, attempts: impl Iterator<Item = &'a Attempt>) -> UserStats {
        let today_start = start_of_day_millis(self.time_provider.now_millis());
        let mut stats = UserStats::default();
        for attempt in attempts {
            stats.total_downloads += 1;
            if attempt.success {
                stats.successful_downloads += 1;
            } else {
                stats.failed_downloads += 1;
            }
            if attempt.created_at >= today_start {
                stats.today_downloads += 1;
            }
        }
        stats
    }
}

#[async_trait]
impl StatsStore for InMemoryStatsStore {
    async fn initialize(&self) -> Result<()> {
        Ok(())
    }

    async fn record_user(&self, submitter_id: SubmitterId, display_name: &str) -> Result<()> {
        self.lock()
            .users
            .insert(submitter_id, display_name.to_string());
        Ok(())
    }

    async fn record_attempt(
        &self,
        submitter_id: SubmitterId,
        source_url: &str,
        success: bool,
    ) -> Result<()> {
        let created_at = self.time_provider.now_millis();
        self.lock().attempts.push(Attempt {
            submitter_id,
            source_url: truncate_url(source_url),
            success,
            created_at,
        });
        Ok(())
    }

    async fn aggregate_stats(&self) -> Result<AggregateStats> {
        let inner = self.lock();
        let summary = self.summarize(inner.attempts.iter());
        Ok(AggregateStats {
            total_users: inner.users.len() as i64,
            total_downloads: summary.total_downloads,
            successful_downloads: summary.successful_downloads,
            failed_downloads: summary.failed_downloads,
            today_downloads: summary.today_downloads,
        })
    }

    async fn user_stats(&self, submitter_id: SubmitterId) -> Result<UserStats> {
        let inner = self.lock();
        Ok(self.summarize(
            inner
                .attempts
                .iter()
                .filter(|a| a.submitter_id == submitter_id),
        ))
    }
}

// Statistics Store Port (Interface)

use crate::domain::SubmitterId;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Service-wide counters (dashboard and /api/stats)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateStats {
    pub total_users: i64,
    pub total_downloads: i64,
    pub successful_downloads: i64,
    pub failed_downloads: i64,
    pub today_downloads: i64,
}

/// Counters for a single submitter (/stats command)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStats {
    pub total_downloads: i64,
    pub successful_downloads: i64,
    pub failed_downloads: i64,
    pub today_downloads: i64,
}

/// Persistence for users and download attempts
///
/// Errors are reported as `AppError::StorageUnavailable`. The worker swallows
/// them; read endpoints surface them.
#[async_trait]
pub trait StatsStore: Send + Sync {
    /// Prepare the backing store. Must succeed before the worker starts.
    async fn initialize(&self) -> Result<()>;

    /// Insert or refresh a user
    async fn record_user(&self, submitter_id: SubmitterId, display_name: &str) -> Result<()>;

    /// Record one resolved job
    async fn record_attempt(
        &self,
        submitter_id: SubmitterId,
        source_url: &str,
        success: bool,
    ) -> Result<()>;

    async fn aggregate_stats(&self) -> Result<AggregateStats>;

    async fn user_stats(&self, submitter_id: SubmitterId) -> Result<UserStats>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::error::AppError;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    /// One record_attempt call
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct RecordedAttempt {
        pub submitter_id: SubmitterId,
        pub source_url: String,
        pub success: bool,
    }

    /// Stats store that remembers calls and can be switched to failing
    #[derive(Default)]
    pub struct RecordingStatsStore {
        attempts: Mutex<Vec<RecordedAttempt>>,
        users: Mutex<Vec<(SubmitterId, String)>>,
        failing: AtomicBool,
        fail_initialize: AtomicBool,
        initialized: AtomicBool,
        panic_on_record: AtomicBool,
    }

    impl RecordingStatsStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// Every write and read returns StorageUnavailable
        pub fn new_unavailable() -> Self {
            let store = Self::default();
            store.failing.store(true, Ordering::SeqCst);
            store
        }

        /// initialize() fails, everything else works
        pub fn new_broken_init() -> Self {
            let store = Self::default();
            store.fail_initialize.store(true, Ordering::SeqCst);
            store
        }

        /// record_attempt panics after remembering the call
        pub fn new_panicking() -> Self {
            let store = Self::default();
            store.panic_on_record.store(true, Ordering::SeqCst);
            store
        }

        pub fn attempts(&self) -> Vec<RecordedAttempt> {
            self.attempts.lock().unwrap().clone()
        }

        pub fn users(&self) -> Vec<(SubmitterId, String)> {
            self.users.lock().unwrap().clone()
        }

        pub fn is_initialized(&self) -> bool {
            self.initialized.load(Ordering::SeqCst)
        }

        fn check(&self) -> Result<()> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(AppError::StorageUnavailable("mock store offline".to_string()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl StatsStore for RecordingStatsStore {
        async fn initialize(&self) -> Result<()> {
            if self.fail_initialize.load(Ordering::SeqCst) {
                return Err(AppError::StorageUnavailable("mock init failure".to_string()));
            }
            self.initialized.store(true, Ordering::SeqCst);
            Ok(())
        }

        async fn record_user(&self, submitter_id: SubmitterId, display_name: &str) -> Result<()> {
            self.check()?;
            self.users
                .lock()
                .unwrap()
                .push((submitter_id, display_name.to_string()));
            Ok(())
        }

        async fn record_attempt(
            &self,
            submitter_id: SubmitterId,
            source_url: &str,
            success: bool,
        ) -> Result<()> {
            // Remember the call even when failing, so tests can count attempts
            self.attempts.lock().unwrap().push(RecordedAttempt {
                submitter_id,
                source_url: source_url.to_string(),
                success,
            });
            if self.panic_on_record.load(Ordering::SeqCst) {
                panic!("stats driver crashed");
            }
            self.check()
        }

        async fn aggregate_stats(&self) -> Result<AggregateStats> {
            self.check()?;
            let attempts = self.attempts.lock().unwrap();
            let successful = attempts.iter().filter(|a| a.success).count() as i64;
            Ok(AggregateStats {
                total_users: self.users.lock().unwrap().len() as i64,
                total_downloads: attempts.len() as i64,
                successful_downloads: successful,
                failed_downloads: attempts.len() as i64 - successful,
                today_downloads: attempts.len() as i64,
            })
        }

        async fn user_stats(&self, submitter_id: SubmitterId) -> Result<UserStats> {
            self.check()?;
            let attempts = self.attempts.lock().unwrap();
            let mine: Vec<_> = attempts
                .iter()
                .filter(|a| a.submitter_id == submitter_id)
                .collect();
            let successful = mine.iter().filter(|a| a.success).count() as i64;
            Ok(UserStats {
                total_downloads: mine.len() as i64,
                successful_downloads: successful,
                failed_downloads: mine.len() as i64 - successful,
                today_downloads: mine.len() as i64,
            })
        }
    }
}

// Artifact Janitor Port
// Sweeps leftover media files the worker never got to clean up (e.g. after a crash)

use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;

#[async_trait]
pub trait ArtifactJanitor: Send + Sync {
    /// Delete artifacts older than `max_age`
    ///
    /// # Returns
    /// Number of files deleted
    async fn sweep(&self, max_age: Duration) -> Result<usize>;
}

pub mod mocks {
    use super::*;
    use std::sync::Mutex;

    /// Records the max_age of every sweep
    #[derive(Default)]
    pub struct RecordingJanitor {
        sweeps: Mutex<Vec<Duration>>,
    }

    impl RecordingJanitor {
        pub fn sweeps(&self) -> Vec<Duration> {
            self.sweeps.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ArtifactJanitor for RecordingJanitor {
        async fn sweep(&self, max_age: Duration) -> Result<usize> {
            self.sweeps.lock().unwrap().push(max_age);
            Ok(0)
        }
    }
}

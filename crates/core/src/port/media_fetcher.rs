// Media Fetcher Port
// Abstraction over the scraping client that turns a source URL into a local file

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

/// Result of a fetch that ran to completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchResult {
    /// Media written to a local file owned by the caller from now on
    Fetched { file_path: PathBuf },
    /// Ordinary failure (token not found, no link, non-200 upstream)
    Failed { error: String },
}

/// Faults a fetcher could not classify as an ordinary failure
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Client setup failed: {0}")]
    Client(String),

    #[error("Unexpected fetch fault: {0}")]
    Unexpected(String),
}

/// Media Fetcher trait
///
/// Implementations:
/// - SsstikFetcher (infra-scraper): token-based form flow against ssstik.io
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    /// Fetch the media behind `source_url` into a local file
    ///
    /// # Errors
    /// Only for faults that are not ordinary upstream failures; those are
    /// reported as `FetchResult::Failed`.
    async fn fetch(&self, source_url: &str) -> Result<FetchResult, FetchError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Mock fetcher behavior
    #[derive(Debug, Clone)]
    pub enum MockBehavior {
        /// Write a small file into the output dir and return it
        Success,
        /// Return FetchResult::Failed with message
        Fail(String),
        /// Return FetchError::Unexpected with message
        Fault(String),
        /// Panic with message (for panic isolation testing)
        Panic(String),
    }

    /// Mock Media Fetcher for testing
    ///
    /// Tracks call order and how many fetches overlap in time.
    pub struct MockMediaFetcher {
        output_dir: PathBuf,
        default_behavior: MockBehavior,
        scripted: Mutex<VecDeque<MockBehavior>>,
        delay: Duration,
        calls: Mutex<Vec<String>>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        produced: Mutex<Vec<PathBuf>>,
    }

    impl MockMediaFetcher {
        pub fn new(output_dir: impl Into<PathBuf>, behavior: MockBehavior) -> Self {
            Self {
                output_dir: output_dir.into(),
                default_behavior: behavior,
                scripted: Mutex::new(VecDeque::new()),
                delay: Duration::ZERO,
                calls: Mutex::new(Vec::new()),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
                produced: Mutex::new(Vec::new()),
            }
        }

        pub fn new_success(output_dir: impl Into<PathBuf>) -> Self {
            Self::new(output_dir, MockBehavior::Success)
        }

        pub fn new_fail(output_dir: impl Into<PathBuf>, message: impl Into<String>) -> Self {
            Self::new(output_dir, MockBehavior::Fail(message.into()))
        }

        /// Simulated network round trip per fetch
        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        /// Behaviors consumed one per call before falling back to the default
        pub fn with_script(self, script: Vec<MockBehavior>) -> Self {
            *self.scripted.lock().unwrap() = script.into();
            self
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        pub fn max_in_flight(&self) -> usize {
            self.max_in_flight.load(Ordering::SeqCst)
        }

        /// Every file this mock has written
        pub fn produced_files(&self) -> Vec<PathBuf> {
            self.produced.lock().unwrap().clone()
        }
    }

    struct InFlight<'a>(&'a AtomicUsize);

    impl Drop for InFlight<'_> {
        fn drop(&mut self) {
            self.0.fetch_sub(1, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl MediaFetcher for MockMediaFetcher {
        async fn fetch(&self, source_url: &str) -> Result<FetchResult, FetchError> {
            let index = {
                let mut calls = self.calls.lock().unwrap();
                calls.push(source_url.to_string());
                calls.len()
            };

            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            let _guard = InFlight(&self.in_flight);

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            let behavior = self
                .scripted
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| self.default_behavior.clone());

            match behavior {
                MockBehavior::Success => {
                    let path = self.output_dir.join(format!("mock_{}.mp4", index));
                    tokio::fs::write(&path, b"mock video").await?;
                    self.produced.lock().unwrap().push(path.clone());
                    Ok(FetchResult::Fetched { file_path: path })
                }
                MockBehavior::Fail(msg) => Ok(FetchResult::Failed { error: msg }),
                MockBehavior::Fault(msg) => Err(FetchError::Unexpected(msg)),
                MockBehavior::Panic(msg) => {
                    panic!("{}", msg); // Actually panic for panic isolation testing
                }
            }
        }
    }
}

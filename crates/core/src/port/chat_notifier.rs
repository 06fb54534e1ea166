// Chat Notifier Port
// Status updates and final delivery back to the submitter

use crate::domain::{JobFailure, ReplyHandle};
use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

/// Delivery errors
#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("Chat API error: {0}")]
    Api(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Chat Notifier trait
///
/// Implementations:
/// - TelegramNotifier (telegram crate)
#[async_trait]
pub trait ChatNotifier: Send + Sync {
    /// Show "in progress" on the status indicator.
    ///
    /// Best-effort: callers ignore the error, it only affects UX.
    async fn mark_in_progress(&self, reply: &ReplyHandle) -> Result<(), DeliveryError>;

    /// Send the fetched media to the submitter
    async fn deliver_media(&self, reply: &ReplyHandle, file_path: &Path)
        -> Result<(), DeliveryError>;

    /// Show the failure (with its detail) to the submitter
    async fn report_failure(
        &self,
        reply: &ReplyHandle,
        failure: &JobFailure,
    ) -> Result<(), DeliveryError>;

    /// Remove the status indicator after a successful delivery.
    ///
    /// Best-effort, like mark_in_progress.
    async fn clear_status(&self, reply: &ReplyHandle) -> Result<(), DeliveryError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    /// What the notifier was asked to do
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum NotifierEvent {
        InProgress { chat_id: i64 },
        Delivered { chat_id: i64, file_path: PathBuf, existed: bool },
        Failure { chat_id: i64, failure: JobFailure },
        Cleared { chat_id: i64 },
    }

    /// Notifier that records every call
    #[derive(Default)]
    pub struct RecordingNotifier {
        events: Mutex<Vec<NotifierEvent>>,
        fail_delivery: AtomicBool,
        fail_status: AtomicBool,
        panic_delivery: AtomicBool,
    }

    impl RecordingNotifier {
        pub fn new() -> Self {
            Self::default()
        }

        /// deliver_media always fails
        pub fn failing_delivery() -> Self {
            let notifier = Self::default();
            notifier.fail_delivery.store(true, Ordering::SeqCst);
            notifier
        }

        /// deliver_media panics after recording the call
        pub fn panicking_delivery() -> Self {
            let notifier = Self::default();
            notifier.panic_delivery.store(true, Ordering::SeqCst);
            notifier
        }

        /// mark_in_progress and clear_status always fail
        pub fn failing_status() -> Self {
            let notifier = Self::default();
            notifier.fail_status.store(true, Ordering::SeqCst);
            notifier
        }

        pub fn events(&self) -> Vec<NotifierEvent> {
            self.events.lock().unwrap().clone()
        }

        pub fn failures(&self) -> Vec<JobFailure> {
            self.events()
                .into_iter()
                .filter_map(|e| match e {
                    NotifierEvent::Failure { failure, .. } => Some(failure),
                    _ => None,
                })
                .collect()
        }

        fn push(&self, event: NotifierEvent) {
            self.events.lock().unwrap().push(event);
        }

        fn status_result(&self) -> Result<(), DeliveryError> {
            if self.fail_status.load(Ordering::SeqCst) {
                return Err(DeliveryError::Api("message to edit not found".to_string()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl ChatNotifier for RecordingNotifier {
        async fn mark_in_progress(&self, reply: &ReplyHandle) -> Result<(), DeliveryError> {
            self.push(NotifierEvent::InProgress {
                chat_id: reply.chat_id,
            });
            self.status_result()
        }

        async fn deliver_media(
            &self,
            reply: &ReplyHandle,
            file_path: &Path,
        ) -> Result<(), DeliveryError> {
            self.push(NotifierEvent::Delivered {
                chat_id: reply.chat_id,
                file_path: file_path.to_path_buf(),
                existed: file_path.exists(),
            });
            if self.panic_delivery.load(Ordering::SeqCst) {
                panic!("upload client crashed");
            }
            if self.fail_delivery.load(Ordering::SeqCst) {
                return Err(DeliveryError::Transport("upload timed out".to_string()));
            }
            Ok(())
        }

        async fn report_failure(
            &self,
            reply: &ReplyHandle,
            failure: &JobFailure,
        ) -> Result<(), DeliveryError> {
            self.push(NotifierEvent::Failure {
                chat_id: reply.chat_id,
                failure: failure.clone(),
            });
            Ok(())
        }

        async fn clear_status(&self, reply: &ReplyHandle) -> Result<(), DeliveryError> {
            self.push(NotifierEvent::Cleared {
                chat_id: reply.chat_id,
            });
            self.status_result()
        }
    }
}

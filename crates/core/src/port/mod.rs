// Port Layer - Interfaces for external collaborators

pub mod artifact_janitor;
pub mod chat_notifier;
pub mod id_provider; // For deterministic testing
pub mod media_fetcher;
pub mod stats_store;
pub mod time_provider;

// Re-exports
pub use artifact_janitor::ArtifactJanitor;
pub use chat_notifier::{ChatNotifier, DeliveryError};
pub use id_provider::IdProvider;
pub use media_fetcher::{FetchError, FetchResult, MediaFetcher};
pub use stats_store::{AggregateStats, StatsStore, UserStats};
pub use time_provider::TimeProvider;

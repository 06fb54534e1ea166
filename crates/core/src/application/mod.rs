// Application Layer - Use Cases and Business Logic

pub mod admission;
pub mod lifecycle;
pub mod maintenance;
pub mod queue;
pub mod service;
pub mod worker;

// Re-exports
pub use admission::{Accepted, AdmissionConfig, CooldownRegistry, Submission};
pub use lifecycle::{RunningWorker, WorkerDeps, WorkerLifecycle};
pub use maintenance::{MaintenanceConfig, MaintenanceScheduler};
pub use queue::JobQueue;
pub use service::QueueService;
pub use worker::{shutdown_channel, ShutdownSender, ShutdownToken, Worker};

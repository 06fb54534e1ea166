// Maintenance Service
// Periodic housekeeping: cooldown pruning and leftover artifact sweeping

use crate::application::service::QueueService;
use crate::application::worker::constants::{DEFAULT_ARTIFACT_MAX_AGE, DEFAULT_MAINTENANCE_INTERVAL};
use crate::application::worker::ShutdownToken;
use crate::port::ArtifactJanitor;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tracing::{debug, error, info};

/// Maintenance configuration
#[derive(Debug, Clone)]
pub struct MaintenanceConfig {
    /// How often housekeeping runs
    pub interval: Duration,
    /// Artifacts older than this are deleted
    pub artifact_max_age: Duration,
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_MAINTENANCE_INTERVAL,
            artifact_max_age: DEFAULT_ARTIFACT_MAX_AGE,
        }
    }
}

/// What one maintenance pass did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaintenanceReport {
    pub cooldowns_pruned: usize,
    pub artifacts_deleted: usize,
}

/// Maintenance scheduler
///
/// Runs periodic maintenance in the background until shutdown
pub struct MaintenanceScheduler {
    service: Arc<QueueService>,
    janitor: Arc<dyn ArtifactJanitor>,
    config: MaintenanceConfig,
}

impl MaintenanceScheduler {
    pub fn new(
        service: Arc<QueueService>,
        janitor: Arc<dyn ArtifactJanitor>,
        config: MaintenanceConfig,
    ) -> Self {
        Self {
            service,
            janitor,
            config,
        }
    }

    /// Run maintenance loop (background task)
    ///
    /// First pass runs immediately, which also clears files left behind by a
    /// previous process.
    pub async fn run(self, mut shutdown: ShutdownToken) {
        info!(
            interval_secs = self.config.interval.as_secs(),
            artifact_max_age_secs = self.config.artifact_max_age.as_secs(),
            "Maintenance scheduler started"
        );

        let mut tick = interval(self.config.interval);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.wait() => break,
                _ = tick.tick() => {
                    self.run_once().await;
                }
            }
        }

        info!("Maintenance scheduler stopped");
    }

    /// One housekeeping pass
    pub async fn run_once(&self) -> MaintenanceReport {
        let cooldowns_pruned = self.service.prune_cooldowns();

        let artifacts_deleted = match self.janitor.sweep(self.config.artifact_max_age).await {
            Ok(count) => count,
            Err(e) => {
                error!(error = %e, "Artifact sweep failed");
                0
            }
        };

        if cooldowns_pruned > 0 || artifacts_deleted > 0 {
            info!(
                cooldowns_pruned = cooldowns_pruned,
                artifacts_deleted = artifacts_deleted,
                "Maintenance completed"
            );
        } else {
            debug!("Maintenance found nothing to do");
        }

        MaintenanceReport {
            cooldowns_pruned,
            artifacts_deleted,
        }
    }
}

//! Edge case integration tests
//!
//! Faults that must never take the worker down, plus housekeeping against a
//! real download directory.

use std::sync::Arc;
use std::time::Duration;

use clipqueue_core::application::{
    AdmissionConfig, MaintenanceConfig, MaintenanceScheduler, QueueService, RunningWorker,
    Submission, WorkerDeps, WorkerLifecycle,
};
use clipqueue_core::domain::{JobFailure, ReplyHandle, WorkerState};
use clipqueue_core::error::AppError;
use clipqueue_core::port::chat_notifier::mocks::RecordingNotifier;
use clipqueue_core::port::id_provider::UuidProvider;
use clipqueue_core::port::media_fetcher::mocks::{MockBehavior, MockMediaFetcher};
use clipqueue_core::port::stats_store::mocks::RecordingStatsStore;
use clipqueue_core::port::time_provider::mocks::ManualTimeProvider;
use clipqueue_core::port::time_provider::SystemTimeProvider;
use clipqueue_core::port::{StatsStore, TimeProvider};
use clipqueue_infra_scraper::DownloadDirJanitor;
use clipqueue_infra_stats::{create_pool, SqliteStatsStore};
use tempfile::TempDir;

const URL: &str = "https://vm.tiktok.com/ZMabc123/";

fn service(time_provider: Arc<dyn TimeProvider>) -> Arc<QueueService> {
    Arc::new(QueueService::new(
        AdmissionConfig::default(),
        Arc::new(UuidProvider),
        time_provider,
    ))
}

fn submit(service: &QueueService, submitter: i64) {
    service
        .submit(Submission::new(submitter, URL, ReplyHandle::new(submitter, 1)))
        .unwrap();
}

/// Wait until the worker has pulled everything and gone back to idle
async fn drain(service: &QueueService, running: &RunningWorker, fetcher: &MockMediaFetcher, calls: usize) {
    let mut status = running.status();
    tokio::time::timeout(Duration::from_secs(5), async {
        while fetcher.call_count() < calls || service.current_depth() > 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        status
            .wait_for(|state| *state == WorkerState::Idle)
            .await
            .unwrap();
    })
    .await
    .expect("worker did not drain the queue");
}

/// Edge Case 1: A panicking fetcher fails its job and the next job still runs
#[tokio::test]
async fn test_fetcher_panic_is_isolated() {
    let dir = TempDir::new().unwrap();
    let svc = service(Arc::new(SystemTimeProvider));
    let pool = create_pool(":memory:").await.unwrap();
    let stats = Arc::new(SqliteStatsStore::new(pool, Arc::new(SystemTimeProvider)));
    let notifier = Arc::new(RecordingNotifier::new());
    let fetcher = Arc::new(
        MockMediaFetcher::new_success(dir.path())
            .with_script(vec![MockBehavior::Panic("scraper exploded".to_string())]),
    );

    let running = WorkerLifecycle::start(
        &svc,
        WorkerDeps {
            fetcher: fetcher.clone(),
            notifier: notifier.clone(),
            stats: stats.clone(),
        },
    )
    .await
    .unwrap();

    submit(&svc, 1);
    submit(&svc, 2);
    drain(&svc, &running, &fetcher, 2).await;

    assert_eq!(
        notifier.failures(),
        vec![JobFailure::Unexpected("fetcher crashed".to_string())]
    );
    let aggregate = stats.aggregate_stats().await.unwrap();
    assert_eq!(aggregate.failed_downloads, 1);
    assert_eq!(aggregate.successful_downloads, 1);

    running.stop().await.unwrap();
    println!("✅ Edge Case 1: panic contained to its job");
}

/// Edge Case 2: An offline statistics store never blocks delivery
#[tokio::test]
async fn test_storage_outage_does_not_stop_worker() {
    let dir = TempDir::new().unwrap();
    let svc = service(Arc::new(SystemTimeProvider));
    let stats = Arc::new(RecordingStatsStore::new_unavailable());
    let notifier = Arc::new(RecordingNotifier::new());
    let fetcher = Arc::new(MockMediaFetcher::new_success(dir.path()));

    let running = WorkerLifecycle::start(
        &svc,
        WorkerDeps {
            fetcher: fetcher.clone(),
            notifier: notifier.clone(),
            stats: stats.clone(),
        },
    )
    .await
    .unwrap();

    for submitter in 1..=3 {
        submit(&svc, submitter);
    }
    drain(&svc, &running, &fetcher, 3).await;

    assert_eq!(stats.attempts().len(), 3);
    assert!(notifier.failures().is_empty());
    assert!(fetcher.produced_files().iter().all(|f| !f.exists()));
    assert!(matches!(
        stats.aggregate_stats().await,
        Err(AppError::StorageUnavailable(_))
    ));

    running.stop().await.unwrap();
    println!("✅ Edge Case 2: storage outage swallowed by the worker");
}

/// Edge Case 3: A failed upload is shown to the submitter and the file is still removed
#[tokio::test]
async fn test_delivery_failure_still_cleans_up() {
    let dir = TempDir::new().unwrap();
    let svc = service(Arc::new(SystemTimeProvider));
    let stats = Arc::new(RecordingStatsStore::new());
    let notifier = Arc::new(RecordingNotifier::failing_delivery());
    let fetcher = Arc::new(MockMediaFetcher::new_success(dir.path()));

    let running = WorkerLifecycle::start(
        &svc,
        WorkerDeps {
            fetcher: fetcher.clone(),
            notifier: notifier.clone(),
            stats: stats.clone(),
        },
    )
    .await
    .unwrap();

    submit(&svc, 5);
    drain(&svc, &running, &fetcher, 1).await;

    assert!(matches!(
        notifier.failures().as_slice(),
        [JobFailure::DeliveryFailed(_)]
    ));
    let attempts = stats.attempts();
    assert_eq!(attempts.len(), 1);
    assert!(!attempts[0].success);
    assert!(fetcher.produced_files().iter().all(|f| !f.exists()));

    running.stop().await.unwrap();
    println!("✅ Edge Case 3: delivery failure recorded, artifact removed");
}

/// Edge Case 4: Maintenance sweeps stale files and forgets expired cooldowns
#[tokio::test]
async fn test_maintenance_against_download_dir() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("ssstik_leftover.mp4"), b"stale").unwrap();
    std::fs::create_dir(dir.path().join("keep")).unwrap();

    let clock = Arc::new(ManualTimeProvider::new(0));
    let svc = service(clock.clone());
    submit(&svc, 1);
    submit(&svc, 2);
    clock.advance_secs(16);

    let scheduler = MaintenanceScheduler::new(
        svc.clone(),
        Arc::new(DownloadDirJanitor::new(dir.path())),
        MaintenanceConfig {
            interval: Duration::from_secs(60),
            artifact_max_age: Duration::ZERO,
        },
    );

    let report = scheduler.run_once().await;

    assert_eq!(report.cooldowns_pruned, 2);
    assert_eq!(report.artifacts_deleted, 1);
    assert!(!dir.path().join("ssstik_leftover.mp4").exists());
    assert!(dir.path().join("keep").is_dir());
    // Pruning never touches queued work
    assert_eq!(svc.current_depth(), 2);
    println!("✅ Edge Case 4: maintenance sweep");
}

/// Edge Case 5: Startup is refused when the store cannot initialize
#[tokio::test]
async fn test_broken_store_refuses_start() {
    let dir = TempDir::new().unwrap();
    let svc = service(Arc::new(SystemTimeProvider));
    let fetcher = Arc::new(MockMediaFetcher::new_success(dir.path()));
    submit(&svc, 1);

    let result = WorkerLifecycle::start(
        &svc,
        WorkerDeps {
            fetcher: fetcher.clone(),
            notifier: Arc::new(RecordingNotifier::new()),
            stats: Arc::new(RecordingStatsStore::new_broken_init()),
        },
    )
    .await;

    assert!(matches!(result, Err(AppError::StorageUnavailable(_))));
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(fetcher.call_count(), 0);
    assert_eq!(svc.current_depth(), 1);
    println!("✅ Edge Case 5: no worker without a store");
}

//! Pipeline Definition of Done (DoD) Integration Tests
//!
//! Admission, the worker loop and the SQLite statistics store wired together,
//! with the fetcher and chat side replaced by recording mocks.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use clipqueue_core::application::{
    AdmissionConfig, QueueService, RunningWorker, Submission, WorkerDeps, WorkerLifecycle,
};
use clipqueue_core::domain::{JobFailure, Rejection, ReplyHandle, WorkerState};
use clipqueue_core::port::chat_notifier::mocks::{NotifierEvent, RecordingNotifier};
use clipqueue_core::port::id_provider::mocks::SequentialIdProvider;
use clipqueue_core::port::media_fetcher::mocks::{MockBehavior, MockMediaFetcher};
use clipqueue_core::port::time_provider::mocks::ManualTimeProvider;
use clipqueue_core::port::StatsStore;
use clipqueue_infra_stats::{create_pool, SqliteStatsStore};
use tempfile::TempDir;

const URL: &str = "https://www.tiktok.com/@someone/video/7301234567890123456";

struct Harness {
    service: Arc<QueueService>,
    stats: Arc<SqliteStatsStore>,
    notifier: Arc<RecordingNotifier>,
    fetcher: Arc<MockMediaFetcher>,
    clock: Arc<ManualTimeProvider>,
    running: RunningWorker,
    _dir: TempDir,
}

async fn start(make_fetcher: impl FnOnce(&TempDir) -> MockMediaFetcher) -> Harness {
    let dir = TempDir::new().unwrap();
    let clock = Arc::new(ManualTimeProvider::new(1_700_000_000_000));
    let pool = create_pool(":memory:").await.unwrap();
    let stats = Arc::new(SqliteStatsStore::new(pool, clock.clone()));
    let notifier = Arc::new(RecordingNotifier::new());
    let fetcher = Arc::new(make_fetcher(&dir));
    let service = Arc::new(QueueService::new(
        AdmissionConfig::default(),
        Arc::new(SequentialIdProvider::default()),
        clock.clone(),
    ));

    let running = WorkerLifecycle::start(
        &service,
        WorkerDeps {
            fetcher: fetcher.clone(),
            notifier: notifier.clone(),
            stats: stats.clone(),
        },
    )
    .await
    .unwrap();

    Harness {
        service,
        stats,
        notifier,
        fetcher,
        clock,
        running,
        _dir: dir,
    }
}

fn submission(submitter: i64, url: &str) -> Submission {
    Submission::new(submitter, url, ReplyHandle::new(submitter * 10, 1))
}

/// Poll the store until `expected` attempts have been recorded, then wait for
/// the worker to finish cleaning up
async fn settle(h: &Harness, expected: i64) {
    let mut status = h.running.status();
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let total = h.stats.aggregate_stats().await.unwrap().total_downloads;
            if total >= expected {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        status
            .wait_for(|state| *state == WorkerState::Idle)
            .await
            .unwrap();
    })
    .await
    .expect("worker did not resolve the expected jobs in time");
}

/// DoD 1: A delivered job is recorded once and its artifact is gone
#[tokio::test]
async fn test_successful_job_recorded_and_cleaned_up() {
    let h = start(|dir| MockMediaFetcher::new_success(dir.path())).await;

    let accepted = h.service.submit(submission(42, URL)).unwrap();
    assert_eq!(accepted.position, 0);
    settle(&h, 1).await;

    let stats = h.stats.user_stats(42).await.unwrap();
    assert_eq!(stats.total_downloads, 1);
    assert_eq!(stats.successful_downloads, 1);
    assert_eq!(stats.today_downloads, 1);

    let delivered = h
        .notifier
        .events()
        .into_iter()
        .find_map(|e| match e {
            NotifierEvent::Delivered { chat_id, existed, .. } => Some((chat_id, existed)),
            _ => None,
        })
        .expect("media should have been delivered");
    assert_eq!(delivered, (420, true));

    for file in h.fetcher.produced_files() {
        assert!(!file.exists(), "{} should have been removed", file.display());
    }

    h.running.stop().await.unwrap();
    println!("✅ DoD 1: delivery recorded, artifact removed");
}

/// DoD 2: Submitter 42 is turned away inside the window and admitted after it
#[tokio::test]
async fn test_cooldown_scenario_42() {
    let h = start(|dir| MockMediaFetcher::new_success(dir.path())).await;

    let first = h.service.submit(submission(42, URL)).unwrap();
    assert_eq!(first.job_id, "job-1");

    h.clock.advance_secs(1);
    let rejected = h.service.submit(submission(42, URL)).unwrap_err();
    assert_eq!(rejected, Rejection::CooldownActive { remaining_seconds: 14 });

    // Another submitter is not affected
    h.service.submit(submission(43, URL)).unwrap();

    h.clock.advance_secs(14);
    h.service.submit(submission(42, URL)).unwrap();

    settle(&h, 3).await;
    assert_eq!(h.stats.user_stats(42).await.unwrap().total_downloads, 2);
    assert_eq!(h.fetcher.call_count(), 3);

    h.running.stop().await.unwrap();
    println!("✅ DoD 2: cooldown enforced per submitter");
}

/// DoD 3: Jobs run one at a time, in submission order
#[tokio::test]
async fn test_jobs_run_sequentially_in_fifo_order() {
    let h = start(|dir| {
        MockMediaFetcher::new_success(dir.path()).with_delay(Duration::from_millis(20))
    })
    .await;

    let urls: Vec<String> = (1..=5)
        .map(|i| format!("https://vm.tiktok.com/clip{}", i))
        .collect();
    let positions: Vec<usize> = urls
        .iter()
        .enumerate()
        .map(|(i, url)| h.service.submit(submission(i as i64 + 1, url)).unwrap().position)
        .collect();

    // The first job may already be in flight when the second arrives
    assert_eq!(positions[0], 0);
    assert!(positions.windows(2).all(|w| w[1] >= w[0]));

    settle(&h, 5).await;

    assert_eq!(h.fetcher.calls(), urls);
    assert_eq!(h.fetcher.max_in_flight(), 1);
    assert_eq!(h.service.current_depth(), 0);

    let aggregate = h.stats.aggregate_stats().await.unwrap();
    assert_eq!(aggregate.total_downloads, 5);
    assert_eq!(aggregate.successful_downloads, 5);

    h.running.stop().await.unwrap();
    println!("✅ DoD 3: FIFO with a single job in flight");
}

/// DoD 4: "No download link found" reaches the submitter and is recorded once
#[tokio::test]
async fn test_fetch_failure_recorded_once() {
    let h = start(|dir| MockMediaFetcher::new_fail(dir.path(), "No download link found")).await;

    h.service.submit(submission(7, URL)).unwrap();
    settle(&h, 1).await;
    // Give the worker a chance to (wrongly) record a second attempt
    tokio::time::sleep(Duration::from_millis(50)).await;

    let stats = h.stats.user_stats(7).await.unwrap();
    assert_eq!(stats.total_downloads, 1);
    assert_eq!(stats.failed_downloads, 1);
    assert_eq!(
        h.notifier.failures(),
        vec![JobFailure::FetchFailed("No download link found".to_string())]
    );
    assert_eq!(h.fetcher.call_count(), 1);

    h.running.stop().await.unwrap();
    println!("✅ DoD 4: failure reported and recorded once");
}

/// DoD 5: A mix of outcomes leaves no artifacts and accurate counters
#[tokio::test]
async fn test_mixed_outcomes_leave_no_artifacts() {
    let h = start(|dir| {
        MockMediaFetcher::new_success(dir.path()).with_script(vec![
            MockBehavior::Success,
            MockBehavior::Fail("Failed to load page: 503".to_string()),
            MockBehavior::Fault("socket closed".to_string()),
            MockBehavior::Success,
        ])
    })
    .await;

    for submitter in 1..=4 {
        h.service.submit(submission(submitter, URL)).unwrap();
    }
    settle(&h, 4).await;

    let aggregate = h.stats.aggregate_stats().await.unwrap();
    assert_eq!(aggregate.successful_downloads, 2);
    assert_eq!(aggregate.failed_downloads, 2);
    assert_eq!(h.fetcher.produced_files().len(), 2);
    assert!(h.fetcher.produced_files().iter().all(|f| !f.exists()));

    h.running.stop().await.unwrap();
    println!("✅ DoD 5: every outcome cleaned up");
}

/// DoD 6: Stopping an idle worker returns promptly and the queue stays readable
#[tokio::test]
async fn test_stop_while_idle() {
    let h = start(|dir| MockMediaFetcher::new_success(dir.path())).await;
    let status = h.running.status();
    assert_eq!(*status.borrow(), WorkerState::Idle);

    tokio::time::timeout(Duration::from_secs(1), h.running.stop())
        .await
        .expect("idle worker should stop immediately")
        .unwrap();

    assert_eq!(*status.borrow(), WorkerState::Stopped);
    assert_eq!(h.service.current_depth(), 0);

    // Admission still works without a worker; the job simply waits
    h.service.submit(submission(9, URL)).unwrap();
    assert_eq!(h.service.current_depth(), 1);
    assert_eq!(h.fetcher.call_count(), 0);
    println!("✅ DoD 6: clean stop while idle");
}

/// DoD 7: Submissions racing in from many tasks still run strictly one at a time
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_submissions_fetch_sequentially() {
    const N: usize = 12;
    let h = start(|dir| {
        MockMediaFetcher::new_success(dir.path()).with_delay(Duration::from_millis(5))
    })
    .await;
    let barrier = Arc::new(tokio::sync::Barrier::new(N));

    let handles: Vec<_> = (0..N)
        .map(|i| {
            let service = Arc::clone(&h.service);
            let barrier = Arc::clone(&barrier);
            tokio::spawn(async move {
                barrier.wait().await;
                let url = format!("https://vm.tiktok.com/burst{}", i);
                service.submit(submission(100 + i as i64, &url)).map(|a| (url, a))
            })
        })
        .collect();

    let mut urls = Vec::with_capacity(N);
    let mut job_ids = HashSet::new();
    for handle in handles {
        let (url, accepted) = handle.await.unwrap().unwrap();
        urls.push(url);
        job_ids.insert(accepted.job_id);
    }
    assert_eq!(job_ids.len(), N);

    settle(&h, N as i64).await;

    assert_eq!(h.fetcher.call_count(), N);
    assert_eq!(h.fetcher.max_in_flight(), 1);
    let mut fetched = h.fetcher.calls();
    fetched.sort();
    urls.sort();
    assert_eq!(fetched, urls);
    assert_eq!(h.stats.aggregate_stats().await.unwrap().successful_downloads, N as i64);

    h.running.stop().await.unwrap();
    println!("✅ DoD 7: concurrent admission, sequential fetches");
}

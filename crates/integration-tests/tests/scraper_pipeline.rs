//! Scraper pipeline integration tests
//!
//! The real ssstik fetcher runs inside the worker against a local upstream,
//! with statistics written to SQLite.

use std::sync::Arc;
use std::time::Duration;

use axum::http::header;
use axum::response::{Html, IntoResponse};
use axum::routing::{get, post};
use axum::Router;
use clipqueue_core::application::{
    AdmissionConfig, QueueService, Submission, WorkerDeps, WorkerLifecycle,
};
use clipqueue_core::domain::{JobFailure, ReplyHandle, WorkerState};
use clipqueue_core::port::chat_notifier::mocks::{NotifierEvent, RecordingNotifier};
use clipqueue_core::port::id_provider::UuidProvider;
use clipqueue_core::port::time_provider::SystemTimeProvider;
use clipqueue_core::port::StatsStore;
use clipqueue_infra_scraper::{ScraperConfig, SsstikFetcher};
use clipqueue_infra_stats::{create_pool, SqliteStatsStore};
use tempfile::TempDir;

const URL: &str = "https://www.tiktok.com/@someone/video/7301234567890123456";

async fn serve_upstream(with_link: bool) -> String {
    let landing = get(|| async {
        (
            [(header::SET_COOKIE, "session=s1; Path=/")],
            Html(r#"<input type="hidden" name="tt" value="tok-1">"#),
        )
    });
    let api = post(move || async move {
        if with_link {
            Html(r#"<a href="/media/clip.mp4">Without watermark</a>"#).into_response()
        } else {
            Html("<div>Video unavailable</div>").into_response()
        }
    });
    let app = Router::new()
        .route("/en-1", landing)
        .route("/abc", api)
        .route("/media/clip.mp4", get(|| async { b"fake-mp4".to_vec() }));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn run_one(with_link: bool) -> (Arc<SqliteStatsStore>, Arc<RecordingNotifier>, TempDir) {
    let base_url = serve_upstream(with_link).await;
    let download_dir = TempDir::new().unwrap();
    let fetcher = SsstikFetcher::new(ScraperConfig {
        base_url,
        download_dir: download_dir.path().to_path_buf(),
        timeout: Duration::from_secs(5),
        ..ScraperConfig::default()
    })
    .unwrap();

    let time_provider = Arc::new(SystemTimeProvider);
    let stats = Arc::new(SqliteStatsStore::new(
        create_pool(":memory:").await.unwrap(),
        time_provider.clone(),
    ));
    let notifier = Arc::new(RecordingNotifier::new());
    let service = QueueService::new(AdmissionConfig::default(), Arc::new(UuidProvider), time_provider);

    let running = WorkerLifecycle::start(
        &service,
        WorkerDeps {
            fetcher: Arc::new(fetcher),
            notifier: notifier.clone(),
            stats: stats.clone(),
        },
    )
    .await
    .unwrap();
    let mut status = running.status();

    service
        .submit(Submission::new(42, URL, ReplyHandle::new(4200, 1)))
        .unwrap();

    tokio::time::timeout(Duration::from_secs(10), async {
        while stats.aggregate_stats().await.unwrap().total_downloads == 0 {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        status
            .wait_for(|state| *state == WorkerState::Idle)
            .await
            .unwrap();
    })
    .await
    .expect("job was not resolved in time");

    running.stop().await.unwrap();
    (stats, notifier, download_dir)
}

fn dir_is_empty(dir: &TempDir) -> bool {
    std::fs::read_dir(dir.path()).unwrap().next().is_none()
}

#[tokio::test]
async fn test_fetched_clip_is_delivered_then_removed() {
    let (stats, notifier, dir) = run_one(true).await;

    let delivered: Vec<_> = notifier
        .events()
        .into_iter()
        .filter_map(|e| match e {
            NotifierEvent::Delivered { file_path, existed, .. } => Some((file_path, existed)),
            _ => None,
        })
        .collect();
    assert_eq!(delivered.len(), 1);
    let (path, existed) = &delivered[0];
    assert!(existed);
    assert!(path
        .file_name()
        .unwrap()
        .to_string_lossy()
        .starts_with("ssstik_7301234567890123456_"));

    assert!(dir_is_empty(&dir), "artifact should be removed after delivery");
    assert_eq!(stats.user_stats(42).await.unwrap().successful_downloads, 1);
}

#[tokio::test]
async fn test_missing_link_is_reported_and_recorded_once() {
    let (stats, notifier, dir) = run_one(false).await;

    assert_eq!(
        notifier.failures(),
        vec![JobFailure::FetchFailed("No download link found".to_string())]
    );
    let user = stats.user_stats(42).await.unwrap();
    assert_eq!(user.total_downloads, 1);
    assert_eq!(user.failed_downloads, 1);
    assert!(dir_is_empty(&dir));
}

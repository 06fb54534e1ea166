// Client, handler, notifier and poller against a fake Bot API server

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use clipqueue_core::application::{shutdown_channel, AdmissionConfig, QueueService};
use clipqueue_core::domain::{JobFailure, ReplyHandle};
use clipqueue_core::port::id_provider::mocks::SequentialIdProvider;
use clipqueue_core::port::stats_store::mocks::RecordingStatsStore;
use clipqueue_core::port::time_provider::mocks::ManualTimeProvider;
use clipqueue_core::port::ChatNotifier;
use clipqueue_telegram::{
    BotHandler, ParseMode, Poller, PollerConfig, TelegramClient, TelegramError, TelegramNotifier,
    Update,
};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const TOKEN: &str = "123:test";

#[derive(Debug, Clone)]
struct Call {
    method: String,
    /// JSON body, or `{"multipart": <raw text>}` for uploads
    body: Value,
}

#[derive(Clone, Default)]
struct FakeApi {
    calls: Arc<Mutex<Vec<Call>>>,
    pending_updates: Arc<Mutex<VecDeque<Value>>>,
    failing_method: Arc<Mutex<Option<String>>>,
    next_message_id: Arc<AtomicI64>,
}

impl FakeApi {
    fn calls(&self, method: &str) -> Vec<Value> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.method == method)
            .map(|c| c.body.clone())
            .collect()
    }

    fn fail(&self, method: &str) {
        *self.failing_method.lock().unwrap() = Some(method.to_string());
    }

    fn push_update(&self, update: Value) {
        self.pending_updates.lock().unwrap().push_back(update);
    }
}

fn ok(result: Value) -> Response {
    Json(json!({ "ok": true, "result": result })).into_response()
}

async fn bot_method(
    State(api): State<FakeApi>,
    Path((bot, method)): Path<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if bot != format!("bot{}", TOKEN) {
        return StatusCode::NOT_FOUND.into_response();
    }

    let is_multipart = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("multipart/form-data"));
    let parsed = if is_multipart {
        json!({ "multipart": String::from_utf8_lossy(&body) })
    } else {
        serde_json::from_slice(&body).unwrap_or(Value::Null)
    };
    api.calls.lock().unwrap().push(Call {
        method: method.clone(),
        body: parsed.clone(),
    });

    if api.failing_method.lock().unwrap().as_deref() == Some(method.as_str()) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"ok": false, "error_code": 400, "description": "Bad Request: boom"})),
        )
            .into_response();
    }

    match method.as_str() {
        "getUpdates" => {
            let next = api.pending_updates.lock().unwrap().pop_front();
            match next {
                Some(update) => ok(json!([update])),
                None => {
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    ok(json!([]))
                }
            }
        }
        "deleteWebhook" | "deleteMessage" => ok(json!(true)),
        "sendMessage" | "editMessageText" | "sendVideo" => {
            let id = api.next_message_id.fetch_add(1, Ordering::SeqCst) + 100;
            let chat_id = parsed.get("chat_id").cloned().unwrap_or(json!(0));
            ok(json!({ "message_id": id, "date": 0, "chat": { "id": chat_id } }))
        }
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn start_fake_api() -> (Arc<TelegramClient>, FakeApi) {
    let api = FakeApi::default();
    let app = Router::new()
        .route("/:bot/:method", post(bot_method))
        .with_state(api.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let client = TelegramClient::with_api_base(TOKEN, &format!("http://{}", addr)).unwrap();
    (Arc::new(client), api)
}

fn service() -> Arc<QueueService> {
    Arc::new(QueueService::new(
        AdmissionConfig::default(),
        Arc::new(SequentialIdProvider::default()),
        Arc::new(ManualTimeProvider::new(1_000_000)),
    ))
}

fn text_update(update_id: i64, user_id: i64, text: &str) -> Update {
    serde_json::from_value(text_update_json(update_id, user_id, text)).unwrap()
}

fn text_update_json(update_id: i64, user_id: i64, text: &str) -> Value {
    json!({
        "update_id": update_id,
        "message": {
            "message_id": update_id * 10,
            "chat": { "id": user_id },
            "from": { "id": user_id, "first_name": "Ada", "username": "ada_l" },
            "text": text
        }
    })
}

// ============================================================================
// Client
// ============================================================================

#[tokio::test]
async fn test_send_message_omits_empty_options() {
    let (client, api) = start_fake_api().await;

    let message = client
        .send_message(7, "hi", None, Some(ParseMode::Markdown))
        .await
        .unwrap();
    assert_eq!(message.chat.id, 7);

    let body = &api.calls("sendMessage")[0];
    assert_eq!(body["text"], "hi");
    assert_eq!(body["parse_mode"], "Markdown");
    assert!(body.get("reply_to_message_id").is_none());
}

#[tokio::test]
async fn test_api_error_is_mapped() {
    let (client, api) = start_fake_api().await;
    api.fail("sendMessage");

    let err = client.send_message(7, "hi", None, None).await.unwrap_err();
    match err {
        TelegramError::Api { code, description } => {
            assert_eq!(code, 400);
            assert!(description.contains("boom"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_send_video_uploads_file() {
    let (client, api) = start_fake_api().await;
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("ssstik_1.mp4");
    std::fs::write(&path, b"fake-video-bytes").unwrap();

    client
        .send_video(7, &path, "caption text", Some(70))
        .await
        .unwrap();

    let raw = api.calls("sendVideo")[0]["multipart"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(raw.contains("caption text"));
    assert!(raw.contains("fake-video-bytes"));
    assert!(raw.contains("filename=\"ssstik_1.mp4\""));
    assert!(raw.contains("reply_to_message_id"));
}

// ============================================================================
// Handler
// ============================================================================

#[tokio::test]
async fn test_start_records_user_and_welcomes() {
    let (client, api) = start_fake_api().await;
    let stats = Arc::new(RecordingStatsStore::new());
    let handler = BotHandler::new(client, service(), stats.clone());

    handler.handle_update(text_update(1, 42, "/start")).await;

    assert_eq!(stats.users(), vec![(42, "ada_l".to_string())]);
    let sent = api.calls("sendMessage");
    assert_eq!(sent.len(), 1);
    assert!(sent[0]["text"].as_str().unwrap().contains("Hi Ada!"));
}

#[tokio::test]
async fn test_stats_command_replies_with_personal_stats() {
    let (client, api) = start_fake_api().await;
    let stats = Arc::new(RecordingStatsStore::new());
    let handler = BotHandler::new(client, service(), stats);

    handler.handle_update(text_update(1, 42, "/stats")).await;

    let sent = api.calls("sendMessage");
    assert!(sent[0]["text"]
        .as_str()
        .unwrap()
        .contains("Your Download Statistics"));
}

#[tokio::test]
async fn test_link_is_enqueued_and_status_slot_filled() {
    let (client, api) = start_fake_api().await;
    let service = service();
    let handler = BotHandler::new(client, service.clone(), Arc::new(RecordingStatsStore::new()));

    handler
        .handle_update(text_update(1, 42, "https://www.tiktok.com/@u/video/1"))
        .await;

    assert_eq!(service.current_depth(), 1);
    let sent = api.calls("sendMessage");
    assert_eq!(sent[0]["text"], "⏳ Processing your video...");

    let job = service.queue().try_dequeue().unwrap();
    assert_eq!(job.submitter_id, 42);
    assert_eq!(job.reply.chat_id, 42);
    assert_eq!(job.reply.request_message_id, 10);
    // First message the fake API hands out
    assert_eq!(job.reply.status.get(), Some(100));
}

#[tokio::test]
async fn test_second_link_reports_queue_position() {
    let (client, api) = start_fake_api().await;
    let service = service();
    let handler = BotHandler::new(client, service.clone(), Arc::new(RecordingStatsStore::new()));

    handler
        .handle_update(text_update(1, 1, "https://www.tiktok.com/@u/video/1"))
        .await;
    handler
        .handle_update(text_update(2, 2, "https://www.tiktok.com/@u/video/2"))
        .await;

    let sent = api.calls("sendMessage");
    assert!(sent[1]["text"].as_str().unwrap().contains("Position: *2*"));
    assert_eq!(service.current_depth(), 2);
}

#[tokio::test]
async fn test_invalid_link_and_cooldown_replies() {
    let (client, api) = start_fake_api().await;
    let service = service();
    let handler = BotHandler::new(client, service.clone(), Arc::new(RecordingStatsStore::new()));

    handler.handle_update(text_update(1, 42, "hello there")).await;
    handler
        .handle_update(text_update(2, 42, "https://www.tiktok.com/@u/video/1"))
        .await;
    handler
        .handle_update(text_update(3, 42, "https://www.tiktok.com/@u/video/2"))
        .await;

    let sent = api.calls("sendMessage");
    assert_eq!(sent.len(), 3);
    assert!(sent[0]["text"]
        .as_str()
        .unwrap()
        .contains("valid TikTok video link"));
    // Clock never moved: the whole window remains
    assert!(sent[2]["text"].as_str().unwrap().contains("*15* seconds"));
    assert_eq!(service.current_depth(), 1);
}

#[tokio::test]
async fn test_unknown_command_is_ignored() {
    let (client, api) = start_fake_api().await;
    let handler = BotHandler::new(client, service(), Arc::new(RecordingStatsStore::new()));

    handler.handle_update(text_update(1, 42, "/settings")).await;

    assert!(api.calls("sendMessage").is_empty());
}

// ============================================================================
// Notifier
// ============================================================================

#[tokio::test]
async fn test_notifier_edits_status_message() {
    let (client, api) = start_fake_api().await;
    let notifier = TelegramNotifier::new(client);
    let reply = ReplyHandle::new(42, 10);
    reply.status.set(55);

    notifier.mark_in_progress(&reply).await.unwrap();
    notifier
        .report_failure(&reply, &JobFailure::FetchFailed("no link found".to_string()))
        .await
        .unwrap();
    notifier.clear_status(&reply).await.unwrap();

    let edits = api.calls("editMessageText");
    assert_eq!(edits.len(), 2);
    assert_eq!(edits[0]["message_id"], 55);
    assert_eq!(edits[0]["text"], "⏳ Downloading your video...");
    assert!(edits[1]["text"].as_str().unwrap().contains("no link found"));
    assert_eq!(api.calls("deleteMessage")[0]["message_id"], 55);
}

#[tokio::test]
async fn test_notifier_without_status_message() {
    let (client, api) = start_fake_api().await;
    let notifier = TelegramNotifier::new(client);
    let reply = ReplyHandle::new(42, 10);

    notifier.mark_in_progress(&reply).await.unwrap();
    notifier.clear_status(&reply).await.unwrap();
    notifier
        .report_failure(&reply, &JobFailure::Unexpected("fetcher crashed".to_string()))
        .await
        .unwrap();

    assert!(api.calls("editMessageText").is_empty());
    assert!(api.calls("deleteMessage").is_empty());
    let sent = api.calls("sendMessage");
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0]["reply_to_message_id"], 10);
}

#[tokio::test]
async fn test_notifier_delivery_error_maps_to_api() {
    let (client, api) = start_fake_api().await;
    api.fail("sendVideo");
    let notifier = TelegramNotifier::new(client);
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("v.mp4");
    std::fs::write(&path, b"x").unwrap();

    let err = notifier
        .deliver_media(&ReplyHandle::new(42, 10), &path)
        .await
        .unwrap_err();
    assert!(matches!(err, clipqueue_core::port::DeliveryError::Api(_)));
}

// ============================================================================
// Poller
// ============================================================================

#[tokio::test]
async fn test_poller_dispatches_until_shutdown() {
    let (client, api) = start_fake_api().await;
    api.push_update(text_update_json(5, 42, "/help"));

    let handler = Arc::new(BotHandler::new(
        client.clone(),
        service(),
        Arc::new(RecordingStatsStore::new()),
    ));
    let (shutdown, token) = shutdown_channel();
    let poller = Poller::new(
        client,
        handler,
        PollerConfig {
            timeout_secs: 0,
            error_backoff: Duration::from_millis(10),
        },
    );
    let handle = tokio::spawn(poller.run(token));

    // The poll after update 5 acknowledges it
    tokio::time::timeout(Duration::from_secs(5), async {
        while !api.calls("getUpdates").iter().any(|p| p["offset"] == 6) {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();

    shutdown.shutdown();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(api.calls("deleteWebhook")[0]["drop_pending_updates"], true);
    assert_eq!(api.calls("sendMessage").len(), 1);
}

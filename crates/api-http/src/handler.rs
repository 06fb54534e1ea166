//! HTTP Handlers

use crate::dashboard::render_dashboard;
use crate::error::ApiError;
use crate::server::AppState;
use crate::types::{HealthResponse, QueueResponse, WebhookAck};
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::response::Html;
use axum::Json;
use chrono::{SecondsFormat, Utc};
use clipqueue_core::domain::SubmitterId;
use clipqueue_core::port::{AggregateStats, UserStats};
use clipqueue_telegram::Update;
use tracing::{debug, warn};

pub const SERVICE_NAME: &str = "clipqueue-bot";

/// Uptime probe
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
        service: SERVICE_NAME.to_string(),
    })
}

/// Telegram webhook ingress. Always acknowledges so Telegram does not retry,
/// whatever the body or content type.
pub async fn webhook(State(state): State<AppState>, body: Bytes) -> Json<WebhookAck> {
    match (&state.bot, serde_json::from_slice::<Update>(&body)) {
        (Some(bot), Ok(update)) => bot.handle_update(update).await,
        (Some(_), Err(e)) => warn!(error = %e, "Ignoring malformed webhook update"),
        (None, _) => debug!("Webhook update received while bot is disabled"),
    }
    Json(WebhookAck { ok: true })
}

pub async fn aggregate_stats(
    State(state): State<AppState>,
) -> Result<Json<AggregateStats>, ApiError> {
    Ok(Json(state.stats.aggregate_stats().await?))
}

pub async fn user_stats(
    State(state): State<AppState>,
    Path(submitter_id): Path<SubmitterId>,
) -> Result<Json<UserStats>, ApiError> {
    Ok(Json(state.stats.user_stats(submitter_id).await?))
}

pub async fn queue_status(State(state): State<AppState>) -> Json<QueueResponse> {
    Json(QueueResponse {
        depth: state.service.current_depth(),
        worker_state: *state.worker_status.borrow(),
    })
}

pub async fn dashboard(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    let stats = state.stats.aggregate_stats().await?;
    let worker_state = *state.worker_status.borrow();
    Ok(Html(render_dashboard(
        &stats,
        state.service.current_depth(),
        worker_state,
        state.bot_link.as_deref(),
        Utc::now(),
    )))
}

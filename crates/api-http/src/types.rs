//! HTTP Request/Response Types

use clipqueue_core::domain::WorkerState;
use serde::{Deserialize, Serialize};

/// GET /health
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    /// RFC 3339, UTC
    pub timestamp: String,
    pub service: String,
}

/// POST /webhook
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookAck {
    pub ok: bool,
}

/// GET /api/queue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueResponse {
    pub depth: usize,
    pub worker_state: WorkerState,
}

/// Body of every error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

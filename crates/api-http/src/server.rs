//! HTTP Server
//!
//! axum over TCP, stopped by the daemon's shutdown token.

use crate::handler;
use axum::routing::{get, post};
use axum::Router;
use clipqueue_core::application::{QueueService, ShutdownToken};
use clipqueue_core::domain::WorkerState;
use clipqueue_core::error::{AppError, Result};
use clipqueue_core::port::StatsStore;
use clipqueue_telegram::BotHandler;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

const DEFAULT_HTTP_HOST: &str = "0.0.0.0";
const DEFAULT_HTTP_PORT: u16 = 8000;

/// HTTP Server Configuration
#[derive(Debug, Clone)]
pub struct HttpServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HTTP_HOST.to_string(),
            port: DEFAULT_HTTP_PORT,
        }
    }
}

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<QueueService>,
    pub stats: Arc<dyn StatsStore>,
    pub worker_status: watch::Receiver<WorkerState>,
    /// None when no bot token is configured; webhook updates are then dropped
    pub bot: Option<Arc<BotHandler>>,
    /// Link behind the dashboard's "Open in Telegram" button
    pub bot_link: Option<String>,
}

/// Build the router (exposed for in-process tests)
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handler::dashboard))
        .route("/health", get(handler::health))
        .route("/webhook", post(handler::webhook))
        .route("/api/stats", get(handler::aggregate_stats))
        .route("/api/stats/users/:id", get(handler::user_stats))
        .route("/api/queue", get(handler::queue_status))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Bound HTTP server, not yet serving
pub struct HttpServer {
    listener: TcpListener,
    app: Router,
}

impl HttpServer {
    /// Bind the listener. Failure here is a startup failure.
    pub async fn bind(config: &HttpServerConfig, state: AppState) -> Result<Self> {
        let addr = format!("{}:{}", config.host, config.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| AppError::Config(format!("Failed to bind HTTP server on {}: {}", addr, e)))?;

        Ok(Self {
            listener,
            app: router(state),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve until the shutdown token fires; in-flight requests are drained
    pub async fn serve(self, mut shutdown: ShutdownToken) -> Result<()> {
        let addr = self.local_addr()?;
        info!(addr = %addr, "HTTP server listening");

        axum::serve(self.listener, self.app)
            .with_graceful_shutdown(async move { shutdown.wait().await })
            .await?;

        info!("HTTP server stopped");
        Ok(())
    }
}

//! ClipQueue - Main Entry Point
//! Telegram bot + HTTP surface + single sequential download worker

mod logging;
mod settings;

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use clipqueue_api_http::{AppState, HttpServer};
use clipqueue_core::application::{
    shutdown_channel, MaintenanceScheduler, QueueService, WorkerDeps, WorkerLifecycle,
};
use clipqueue_core::domain::{JobFailure, ReplyHandle};
use clipqueue_core::port::id_provider::UuidProvider;
use clipqueue_core::port::time_provider::SystemTimeProvider;
use clipqueue_core::port::{ChatNotifier, DeliveryError, StatsStore, TimeProvider};
use clipqueue_infra_scraper::{DownloadDirJanitor, SsstikFetcher};
use clipqueue_infra_stats::{create_pool, InMemoryStatsStore, SqliteStatsStore};
use clipqueue_telegram::{BotHandler, Poller, TelegramClient, TelegramNotifier};

use logging::{init_logging, LogFormat, LOG_FORMAT_VAR};
use settings::{BotMode, Settings};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Stands in for the Telegram notifier when no bot token is configured.
/// Nothing can submit jobs then, so it is only reachable through a bug.
struct DisabledNotifier;

#[async_trait]
impl ChatNotifier for DisabledNotifier {
    async fn mark_in_progress(&self, _reply: &ReplyHandle) -> Result<(), DeliveryError> {
        Ok(())
    }

    async fn deliver_media(&self, _reply: &ReplyHandle, _file: &Path) -> Result<(), DeliveryError> {
        Err(DeliveryError::Transport("bot disabled".to_string()))
    }

    async fn report_failure(
        &self,
        _reply: &ReplyHandle,
        _failure: &JobFailure,
    ) -> Result<(), DeliveryError> {
        Err(DeliveryError::Transport("bot disabled".to_string()))
    }

    async fn clear_status(&self, _reply: &ReplyHandle) -> Result<(), DeliveryError> {
        Ok(())
    }
}

async fn build_stats_store(
    settings: &Settings,
    time_provider: Arc<dyn TimeProvider>,
) -> Result<Arc<dyn StatsStore>> {
    match settings.database_url() {
        Some(url) => {
            info!(database = %url, "Using SQLite statistics");
            let pool = create_pool(&url)
                .await
                .with_context(|| format!("DB pool creation failed for {}", url))?;
            Ok(Arc::new(SqliteStatsStore::new(pool, time_provider)))
        }
        None => {
            info!("No database configured - using in-memory statistics");
            Ok(Arc::new(InMemoryStatsStore::new(time_provider)))
        }
    }
}

async fn wait_for_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut terminate = signal(SignalKind::terminate())?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => result?,
            _ = terminate.recv() => {}
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
    }

    Ok(())
}

async fn join_with_timeout(name: &str, handle: JoinHandle<()>, timeout: Duration) {
    match tokio::time::timeout(timeout, handle).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!(task = name, error = %e, "Task ended abnormally"),
        Err(_) => warn!(task = name, "Task did not stop in time"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Logging
    let log_format = std::env::var(LOG_FORMAT_VAR).ok();
    init_logging(LogFormat::parse(log_format.as_deref()));

    info!("ClipQueue v{} starting...", VERSION);

    // 2. Configuration
    let settings = Settings::load().context("Invalid configuration")?;
    let bot_token = settings.bot_token().map(str::to_string);
    info!(
        telegram_configured = bot_token.is_some(),
        sqlite_stats = settings.database_url().is_some(),
        "Configuration loaded"
    );

    // 3. DI wiring
    let time_provider: Arc<dyn TimeProvider> = Arc::new(SystemTimeProvider);
    let stats = build_stats_store(&settings, time_provider.clone()).await?;

    let service = Arc::new(QueueService::new(
        settings.admission(),
        Arc::new(UuidProvider),
        time_provider.clone(),
    ));

    let scraper_config = settings.scraper_config();
    let download_dir = scraper_config.download_dir.clone();
    let fetcher = Arc::new(SsstikFetcher::new(scraper_config).context("Scraper setup failed")?);

    let telegram_client = match bot_token.as_deref() {
        Some(token) => Some(Arc::new(
            TelegramClient::with_api_base(token, &settings.telegram.api_base)
                .context("Telegram client setup failed")?,
        )),
        None => None,
    };
    let notifier: Arc<dyn ChatNotifier> = match &telegram_client {
        Some(client) => Arc::new(TelegramNotifier::new(client.clone())),
        None => Arc::new(DisabledNotifier),
    };

    // 4. Worker (initializes the stats store first; failure is fatal)
    info!("Starting worker...");
    let running = WorkerLifecycle::start(
        &service,
        WorkerDeps {
            fetcher,
            notifier,
            stats: stats.clone(),
        },
    )
    .await
    .context("Worker startup failed")?;
    info!("Download queue worker started");

    // Ingress and maintenance stop on their own token, before the worker
    let (shutdown_tx, shutdown_token) = shutdown_channel();

    // 5. Maintenance
    let maintenance = MaintenanceScheduler::new(
        service.clone(),
        Arc::new(DownloadDirJanitor::new(download_dir)),
        settings.maintenance_config(),
    );
    let maintenance_handle = tokio::spawn(maintenance.run(shutdown_token.clone()));

    // 6. Telegram
    let bot = telegram_client.as_ref().map(|client| {
        Arc::new(BotHandler::new(
            client.clone(),
            service.clone(),
            stats.clone(),
        ))
    });

    let poller_handle = match (&telegram_client, &bot, settings.telegram.mode) {
        (Some(client), Some(bot), BotMode::Polling) => {
            let poller = Poller::new(client.clone(), bot.clone(), settings.poller());
            Some(tokio::spawn(poller.run(shutdown_token.clone())))
        }
        (Some(_), Some(_), BotMode::Webhook) => {
            info!("Bot in webhook mode - expecting updates on POST /webhook");
            None
        }
        _ => {
            warn!("No TELEGRAM_BOT_TOKEN set - bot functionality disabled");
            None
        }
    };

    // 7. HTTP
    let state = AppState {
        service: service.clone(),
        stats,
        worker_status: running.status(),
        bot,
        bot_link: settings.telegram.bot_link.clone(),
    };
    let server = HttpServer::bind(&settings.http_server(), state)
        .await
        .context("HTTP server start failed")?;
    let http_token = shutdown_token.clone();
    let http_handle = tokio::spawn(async move {
        if let Err(e) = server.serve(http_token).await {
            error!(error = %e, "HTTP server failed");
        }
    });

    info!("System ready. Press Ctrl+C to shutdown");

    // 8. Wait for shutdown signal
    wait_for_signal().await?;
    info!(queued = service.current_depth(), "Shutdown signal received");

    // 9. Graceful shutdown: ingress first, then the worker
    let timeout = settings.shutdown_timeout();
    shutdown_tx.shutdown();
    join_with_timeout("http", http_handle, timeout).await;
    if let Some(handle) = poller_handle {
        join_with_timeout("poller", handle, timeout).await;
    }
    join_with_timeout("maintenance", maintenance_handle, timeout).await;

    match tokio::time::timeout(timeout, running.stop()).await {
        Ok(Ok(())) => info!("Worker stopped"),
        Ok(Err(e)) => error!(error = %e, "Worker stopped with error"),
        Err(_) => warn!("Worker did not stop within {:?}", timeout),
    }

    info!("Shutdown complete.");
    Ok(())
}

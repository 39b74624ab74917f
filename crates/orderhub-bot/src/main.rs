//! OrderHub bot-service
//!
//! Serves the internal send API and receives Telegram updates by polling or
//! webhook, depending on `bot.mode`.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use orderhub_bot::store::{
    CampaignStore, MemoryCampaignStore, MemoryStartMessageStore, StartMessageStore,
};
use orderhub_bot::{BotState, PollingLoop, build_router};
use orderhub_core::config::{AppConfig, BotMode};
use orderhub_core::error::AppError;
use orderhub_core::logging::init_logging;
use orderhub_database::repositories::{CampaignRepository, StartMessageRepository};
use orderhub_telegram::TelegramClient;

#[tokio::main]
async fn main() {
    let config = match AppConfig::load_from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config.logging);

    if let Err(e) = run(config).await {
        tracing::error!("Bot-service error: {}", e);
        std::process::exit(1);
    }
}

async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting OrderHub bot-service v{}", env!("CARGO_PKG_VERSION"));
    let config = Arc::new(config);

    // ── Step 1: Telegram client ──────────────────────────────────
    let telegram = TelegramClient::new(&config.telegram)?;
    match telegram.get_me().await {
        Ok(me) => tracing::info!(bot_id = me.id, username = ?me.username, "Telegram bot authenticated"),
        Err(e) => tracing::warn!(error = %e, "getMe failed, continuing"),
    }

    // ── Step 2: Stores ───────────────────────────────────────────
    let (start_store, campaign_store) = open_stores(&config).await?;

    // ── Step 3: Services and router ──────────────────────────────
    let state = BotState::new(Arc::clone(&config), telegram.clone(), start_store, campaign_store);
    let processor = Arc::clone(&state.processor);
    let app = build_router(state);

    // ── Step 4: Update ingress ───────────────────────────────────
    let shutdown = CancellationToken::new();
    let polling_handle = match config.bot.mode {
        BotMode::Polling => {
            let polling = PollingLoop::new(telegram.clone(), processor, &config.telegram);
            let cancel = shutdown.clone();
            Some(tokio::spawn(polling.run(cancel)))
        }
        BotMode::Webhook => {
            match config.bot.webhook_url.as_deref().filter(|u| !u.trim().is_empty()) {
                Some(url) => {
                    let secret = Some(config.bot.webhook_secret.as_str()).filter(|s| !s.is_empty());
                    telegram.set_webhook(url, secret).await?;
                    tracing::info!(url, "Webhook registered");
                }
                None => tracing::warn!("Webhook mode without bot.webhook_url; expecting an externally registered webhook"),
            }
            None
        }
    };

    // ── Step 5: HTTP server ──────────────────────────────────────
    let addr = format!("{}:{}", config.bot.host, config.bot.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {}: {}", addr, e)))?;

    tracing::info!("Bot-service listening on {}", addr);

    let server_shutdown = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            tracing::info!("Shutdown signal received, starting graceful shutdown...");
            server_shutdown.cancel();
        })
        .await
        .map_err(|e| AppError::internal(format!("Server error: {}", e)))?;

    // ── Step 6: Wait for the polling loop ────────────────────────
    if let Some(handle) = polling_handle {
        let _ = tokio::time::timeout(std::time::Duration::from_secs(10), handle).await;
    }

    tracing::info!("Bot-service shut down gracefully");
    Ok(())
}

/// PostgreSQL stores when a database is configured, memory stores otherwise.
async fn open_stores(
    config: &AppConfig,
) -> Result<(Arc<dyn StartMessageStore>, Arc<dyn CampaignStore>), AppError> {
    if config.database.url.trim().is_empty() {
        tracing::warn!("database.url not set; start messages and campaigns are kept in memory");
        return Ok((
            Arc::new(MemoryStartMessageStore::default()),
            Arc::new(MemoryCampaignStore::new()),
        ));
    }

    tracing::info!("Connecting to database...");
    let db = orderhub_database::DatabasePool::connect(&config.database).await?;
    if config.database.run_migrations {
        orderhub_database::migration::run_migrations(db.pool()).await?;
        tracing::info!("Database migrations complete");
    }

    Ok((
        Arc::new(StartMessageRepository::new(db.pool().clone())),
        Arc::new(CampaignRepository::new(db.pool().clone())),
    ))
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

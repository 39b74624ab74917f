//! OrderHub Server: realtime order events and Telegram notification delivery
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use orderhub_core::config::AppConfig;
use orderhub_core::error::AppError;
use orderhub_core::logging::init_logging;
use orderhub_worker::{
    CachedSettingsSource, JobQueue, JobStore, MemoryJobStore, RedisJobStore, RetryPolicy,
    SettingsSource, StaticSettingsSource, WorkerRunner,
};

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
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting OrderHub v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Initialize cache ─────────────────────────────────
    tracing::info!(
        "Initializing cache (provider: {})...",
        config.cache.provider
    );
    let cache = orderhub_cache::CacheManager::new(&config.cache).await?;
    tracing::info!("Cache initialized");

    // ── Step 2: Job queue ────────────────────────────────────────
    let store: Arc<dyn JobStore> = if config.cache.provider == "redis" {
        tracing::info!("Using Redis job store");
        let client = orderhub_cache::redis::RedisClient::connect(&config.cache.redis).await?;
        Arc::new(RedisJobStore::new(client))
    } else {
        tracing::warn!("Using in-memory job store; queued notifications are lost on restart");
        Arc::new(MemoryJobStore::new())
    };
    let queue = Arc::new(JobQueue::new(store, RetryPolicy::from_config(&config.worker)));

    // ── Step 3: Notification settings ────────────────────────────
    let settings: Arc<dyn SettingsSource> = if config.database.url.trim().is_empty() {
        tracing::warn!("database.url not set; using default notification settings");
        Arc::new(StaticSettingsSource::default())
    } else {
        tracing::info!("Connecting to database...");
        let db = orderhub_database::DatabasePool::connect(&config.database).await?;
        if config.database.run_migrations {
            tracing::info!("Running database migrations...");
            orderhub_database::migration::run_migrations(db.pool()).await?;
            tracing::info!("Database migrations complete");
        }
        let repository = Arc::new(orderhub_database::repositories::SettingsRepository::new(
            db.pool().clone(),
        ));
        Arc::new(CachedSettingsSource::new(
            repository,
            cache.clone(),
            Duration::from_secs(config.worker.settings_cache_ttl_seconds),
        ))
    };

    // ── Step 4: Shutdown channel ─────────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // ── Step 5: Start notification workers ───────────────────────
    let worker_handle = if config.worker.enabled {
        tracing::info!("Starting notification workers...");
        let telegram = orderhub_telegram::TelegramClient::new(&config.telegram)?;

        let executor = Arc::new(orderhub_worker::jobs::telegram_executor(telegram, settings));
        let runner = WorkerRunner::new(Arc::clone(&queue), executor, config.worker.clone());

        let worker_cancel = shutdown_rx.clone();
        let handle = tokio::spawn(async move {
            runner.run(worker_cancel).await;
        });

        tracing::info!("Notification workers started");
        Some(handle)
    } else {
        tracing::info!("Notification workers disabled");
        None
    };

    // ── Step 6: Initialize realtime engine ───────────────────────
    let realtime = orderhub_realtime::RealtimeEngine::new(
        config.realtime.clone(),
        cache.clone(),
        Some(Arc::clone(&queue)),
    );
    tracing::info!("Realtime engine initialized");

    // ── Step 7: Build and start HTTP server ──────────────────────
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
    let drain = Duration::from_secs(config.worker.drain_timeout_seconds);

    let state = orderhub_api::AppState::new(
        Arc::new(config),
        cache,
        realtime.clone(),
        Arc::clone(&queue),
    );
    let app = orderhub_api::build_app(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {}: {}", addr, e)))?;

    tracing::info!("OrderHub server listening on {}", addr);

    let mut server_cancel = shutdown_rx.clone();
    let server_handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = server_cancel.changed().await;
            })
            .await
    });

    // ── Step 8: Graceful shutdown ────────────────────────────────
    shutdown_signal().await;
    tracing::info!("Shutdown signal received, starting graceful shutdown...");
    let _ = shutdown_tx.send(true);
    realtime.shutdown();

    match tokio::time::timeout(grace, server_handle).await {
        Ok(Ok(result)) => {
            result.map_err(|e| AppError::internal(format!("Server error: {}", e)))?
        }
        Ok(Err(e)) => tracing::error!("HTTP server task failed: {}", e),
        Err(_) => tracing::warn!("HTTP server did not drain within {}s", grace.as_secs()),
    }

    // ── Step 9: Wait for background tasks ────────────────────────
    tracing::info!("Waiting for background tasks to complete...");

    if let Some(handle) = worker_handle {
        let _ = tokio::time::timeout(drain + Duration::from_secs(1), handle).await;
    }

    tracing::info!("OrderHub server shut down gracefully");
    Ok(())
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

//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section. Every section has defaults, so an empty file is a valid
//! development configuration.

pub mod app;
pub mod bot;
pub mod cache;
pub mod database;
pub mod logging;
pub mod realtime;
pub mod telegram;
pub mod worker;

use serde::{Deserialize, Serialize};

pub use self::app::{CorsConfig, InternalConfig, ServerConfig};
pub use self::bot::{BotConfig, BotMode};
pub use self::cache::{CacheConfig, MemoryCacheConfig, RedisCacheConfig};
pub use self::database::DatabaseConfig;
pub use self::logging::LoggingConfig;
pub use self::realtime::RealtimeConfig;
pub use self::telegram::TelegramConfig;
pub use self::worker::WorkerConfig;

use crate::error::AppError;

/// Root application configuration.
///
/// Shared by the backend (`orderhub-server`) and the bot-service
/// (`orderhub-bot`); each binary reads the sections it needs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Service-to-service authentication.
    #[serde(default)]
    pub internal: InternalConfig,
    /// Database connection settings.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Cache provider settings (also selects the job store backend).
    #[serde(default)]
    pub cache: CacheConfig,
    /// Realtime connection settings.
    #[serde(default)]
    pub realtime: RealtimeConfig,
    /// Notification worker settings.
    #[serde(default)]
    pub worker: WorkerConfig,
    /// Telegram Bot API settings.
    #[serde(default)]
    pub telegram: TelegramConfig,
    /// Bot-service settings.
    #[serde(default)]
    pub bot: BotConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges `config/default.toml`, the environment overlay
    /// `config/{env}.toml` and environment variables prefixed with
    /// `ORDERHUB` (nested keys separated by `__`).
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("ORDERHUB")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }

    /// Load configuration using `ORDERHUB_ENV` (default `development`).
    pub fn load_from_env() -> Result<Self, AppError> {
        let env = std::env::var("ORDERHUB_ENV").unwrap_or_else(|_| "development".to_string());
        Self::load(&env)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config: AppConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.worker.concurrency, 5);
        assert_eq!(config.worker.max_attempts, 5);
        assert_eq!(config.realtime.ticket_ttl_seconds, 30);
        assert_eq!(config.telegram.long_poll_timeout_seconds, 25);
        assert_eq!(config.bot.mode, BotMode::Polling);
        assert_eq!(config.cache.provider, "memory");
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"worker": {"concurrency": 2}}"#).unwrap();
        assert_eq!(config.worker.concurrency, 2);
        assert_eq!(config.worker.backoff_base_ms, 2_000);
    }
}

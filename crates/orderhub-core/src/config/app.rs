//! Server, CORS and internal service authentication configuration.

use serde::{Deserialize, Serialize};

/// HTTP server configuration for the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address.
    #[serde(default = "default_host")]
    pub host: String,
    /// Bind port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Graceful shutdown timeout in seconds.
    #[serde(default = "default_shutdown_grace")]
    pub shutdown_grace_seconds: u64,
    /// CORS configuration.
    #[serde(default)]
    pub cors: CorsConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            shutdown_grace_seconds: default_shutdown_grace(),
            cors: CorsConfig::default(),
        }
    }
}

/// CORS (Cross-Origin Resource Sharing) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Allowed origins (use `["*"]` for development only).
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
    /// Max age for preflight cache in seconds.
    #[serde(default = "default_max_age")]
    pub max_age_seconds: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: default_allowed_origins(),
            max_age_seconds: default_max_age(),
        }
    }
}

/// Static shared secret used between the backend and the bot-service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InternalConfig {
    /// Shared secret value. Internal routes reject every request while empty.
    #[serde(default)]
    pub shared_secret: String,
    /// Header carrying the secret.
    #[serde(default = "default_secret_header")]
    pub header: String,
    /// Base URL of the bot-service, as seen from the backend.
    #[serde(default = "default_bot_service_url")]
    pub bot_service_url: String,
}

impl Default for InternalConfig {
    fn default() -> Self {
        Self {
            shared_secret: String::new(),
            header: default_secret_header(),
            bot_service_url: default_bot_service_url(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_shutdown_grace() -> u64 {
    30
}

fn default_allowed_origins() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_max_age() -> u64 {
    3600
}

fn default_secret_header() -> String {
    "x-internal-secret".to_string()
}

fn default_bot_service_url() -> String {
    "http://localhost:3001".to_string()
}

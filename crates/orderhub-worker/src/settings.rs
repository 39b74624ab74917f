//! Sources of notification settings.
//!
//! The worker reads settings on every alert. [`CachedSettingsSource`] keeps
//! that off the database: a fresh copy is cached for a bounded window, and
//! if a refresh fails the last good copy keeps serving.

use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use orderhub_cache::CacheManager;
use orderhub_cache::keys;
use orderhub_core::result::AppResult;
use orderhub_core::traits::cache::CacheProvider;
use orderhub_database::repositories::SettingsRepository;
use orderhub_entity::settings::NotificationSettings;

/// Anything that can produce the current notification settings.
#[async_trait]
pub trait SettingsSource: Send + Sync + Debug {
    /// Load the current settings.
    async fn notification_settings(&self) -> AppResult<NotificationSettings>;
}

#[async_trait]
impl SettingsSource for SettingsRepository {
    async fn notification_settings(&self) -> AppResult<NotificationSettings> {
        SettingsRepository::notification_settings(self).await
    }
}

/// Fixed settings held in memory. Used when no database is configured.
#[derive(Debug, Default)]
pub struct StaticSettingsSource {
    settings: RwLock<NotificationSettings>,
}

impl StaticSettingsSource {
    /// Wrap a settings value.
    pub fn new(settings: NotificationSettings) -> Self {
        Self {
            settings: RwLock::new(settings),
        }
    }

    /// Replace the settings.
    pub async fn set(&self, settings: NotificationSettings) {
        *self.settings.write().await = settings;
    }
}

#[async_trait]
impl SettingsSource for StaticSettingsSource {
    async fn notification_settings(&self) -> AppResult<NotificationSettings> {
        Ok(self.settings.read().await.clone())
    }
}

/// Time-bounded cache in front of another source, stale on error.
#[derive(Debug)]
pub struct CachedSettingsSource {
    inner: Arc<dyn SettingsSource>,
    cache: CacheManager,
    ttl: Duration,
    last_good: RwLock<Option<NotificationSettings>>,
}

impl CachedSettingsSource {
    /// Create a cached source.
    pub fn new(inner: Arc<dyn SettingsSource>, cache: CacheManager, ttl: Duration) -> Self {
        Self {
            inner,
            cache,
            ttl,
            last_good: RwLock::new(None),
        }
    }

    /// Drop the cached copy so the next read refreshes.
    pub async fn invalidate(&self) {
        if let Err(e) = self.cache.delete(&keys::notification_settings()).await {
            warn!(error = %e, "Failed to invalidate cached notification settings");
        }
    }
}

#[async_trait]
impl SettingsSource for CachedSettingsSource {
    async fn notification_settings(&self) -> AppResult<NotificationSettings> {
        let key = keys::notification_settings();

        match self.cache.get_json::<NotificationSettings>(&key).await {
            Ok(Some(settings)) => return Ok(settings),
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Settings cache read failed"),
        }

        match self.inner.notification_settings().await {
            Ok(settings) => {
                if let Err(e) = self.cache.set_json(&key, &settings, self.ttl).await {
                    warn!(error = %e, "Settings cache write failed");
                }
                *self.last_good.write().await = Some(settings.clone());
                debug!("Notification settings refreshed");
                Ok(settings)
            }
            Err(e) => match self.last_good.read().await.clone() {
                Some(stale) => {
                    warn!(error = %e, "Settings refresh failed, serving last good copy");
                    Ok(stale)
                }
                None => Err(e),
            },
        }
    }
}

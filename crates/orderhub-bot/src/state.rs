//! Shared state for the bot-service router.

use std::sync::Arc;

use orderhub_core::config::AppConfig;
use orderhub_telegram::TelegramClient;

use crate::services::{CampaignService, StartMessageService};
use crate::store::{CampaignStore, StartMessageStore};
use crate::update::UpdateProcessor;

/// Shared application state passed to every handler.
#[derive(Debug, Clone)]
pub struct BotState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Telegram Bot API client.
    pub telegram: TelegramClient,
    /// `/start` welcome message composer.
    pub start: Arc<StartMessageService>,
    /// Subscription campaign flow.
    pub campaigns: Arc<CampaignService>,
    /// Inbound update dispatcher shared by the webhook and the polling loop.
    pub processor: Arc<UpdateProcessor>,
}

impl BotState {
    /// Wire the services over the given stores.
    pub fn new(
        config: Arc<AppConfig>,
        telegram: TelegramClient,
        start_store: Arc<dyn StartMessageStore>,
        campaign_store: Arc<dyn CampaignStore>,
    ) -> Self {
        let start = Arc::new(StartMessageService::new(
            telegram.clone(),
            start_store,
            &config.bot,
        ));
        let campaigns = Arc::new(CampaignService::new(telegram.clone(), campaign_store));
        let processor = Arc::new(UpdateProcessor::new(
            telegram.clone(),
            Arc::clone(&start),
            Arc::clone(&campaigns),
        ));

        Self {
            config,
            telegram,
            start,
            campaigns,
            processor,
        }
    }
}

//! Storage seams for the bot-service.
//!
//! The PostgreSQL repositories implement these traits in production. The
//! in-memory stores back single-node setups without a database and tests.

use std::collections::HashMap;
use std::fmt::Debug;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use orderhub_core::error::AppError;
use orderhub_core::result::AppResult;
use orderhub_database::repositories::{CampaignRepository, StartMessageRepository};
use orderhub_entity::campaign::{CampaignStatus, ParticipantStatus, SubscriptionCampaign};
use orderhub_entity::settings::StartMessageSettings;

/// Welcome message configuration and per-recipient image history.
#[async_trait]
pub trait StartMessageStore: Send + Sync + Debug {
    /// Stored settings, `None` when nothing is configured.
    async fn load(&self) -> AppResult<Option<StartMessageSettings>>;
    /// URL of the last image shown to a recipient.
    async fn last_image(&self, telegram_id: i64) -> AppResult<Option<String>>;
    /// Remember the image just shown.
    async fn record_image(&self, telegram_id: i64, url: &str) -> AppResult<()>;
}

/// Subscription campaigns and their participants.
#[async_trait]
pub trait CampaignStore: Send + Sync + Debug {
    /// Campaign by deep-link tag.
    async fn find_by_tag(&self, tag: &str) -> AppResult<Option<SubscriptionCampaign>>;
    /// Campaign by id.
    async fn find_by_id(&self, id: i64) -> AppResult<Option<SubscriptionCampaign>>;
    /// Move a campaign along its lifecycle; invalid transitions are conflicts.
    async fn update_status(&self, id: i64, next: CampaignStatus) -> AppResult<SubscriptionCampaign>;
    /// Record that a user opened the campaign link.
    async fn record_started(&self, campaign_id: i64, telegram_id: i64) -> AppResult<()>;
    /// Mark a participant subscribed; `false` if they already were.
    async fn mark_subscribed(&self, campaign_id: i64, telegram_id: i64) -> AppResult<bool>;
}

#[async_trait]
impl StartMessageStore for StartMessageRepository {
    async fn load(&self) -> AppResult<Option<StartMessageSettings>> {
        StartMessageRepository::load(self).await
    }

    async fn last_image(&self, telegram_id: i64) -> AppResult<Option<String>> {
        StartMessageRepository::last_image(self, telegram_id).await
    }

    async fn record_image(&self, telegram_id: i64, url: &str) -> AppResult<()> {
        StartMessageRepository::record_image(self, telegram_id, url).await
    }
}

#[async_trait]
impl CampaignStore for CampaignRepository {
    async fn find_by_tag(&self, tag: &str) -> AppResult<Option<SubscriptionCampaign>> {
        CampaignRepository::find_by_tag(self, tag).await
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<SubscriptionCampaign>> {
        CampaignRepository::find_by_id(self, id).await
    }

    async fn update_status(&self, id: i64, next: CampaignStatus) -> AppResult<SubscriptionCampaign> {
        CampaignRepository::update_status(self, id, next).await
    }

    async fn record_started(&self, campaign_id: i64, telegram_id: i64) -> AppResult<()> {
        CampaignRepository::record_started(self, campaign_id, telegram_id)
            .await
            .map(|_| ())
    }

    async fn mark_subscribed(&self, campaign_id: i64, telegram_id: i64) -> AppResult<bool> {
        CampaignRepository::mark_subscribed(self, campaign_id, telegram_id).await
    }
}

/// In-memory [`StartMessageStore`].
#[derive(Debug, Default)]
pub struct MemoryStartMessageStore {
    settings: RwLock<Option<StartMessageSettings>>,
    history: RwLock<HashMap<i64, String>>,
}

impl MemoryStartMessageStore {
    /// Store holding `settings`.
    pub fn new(settings: Option<StartMessageSettings>) -> Self {
        Self {
            settings: RwLock::new(settings),
            history: RwLock::default(),
        }
    }
}

#[async_trait]
impl StartMessageStore for MemoryStartMessageStore {
    async fn load(&self) -> AppResult<Option<StartMessageSettings>> {
        Ok(self.settings.read().await.clone())
    }

    async fn last_image(&self, telegram_id: i64) -> AppResult<Option<String>> {
        Ok(self.history.read().await.get(&telegram_id).cloned())
    }

    async fn record_image(&self, telegram_id: i64, url: &str) -> AppResult<()> {
        self.history.write().await.insert(telegram_id, url.to_string());
        Ok(())
    }
}

/// In-memory [`CampaignStore`].
#[derive(Debug, Default)]
pub struct MemoryCampaignStore {
    campaigns: RwLock<HashMap<i64, SubscriptionCampaign>>,
    participants: RwLock<HashMap<(i64, i64), ParticipantStatus>>,
}

impl MemoryCampaignStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a campaign.
    pub async fn insert(&self, campaign: SubscriptionCampaign) {
        self.campaigns.write().await.insert(campaign.id, campaign);
    }

    /// Progress of a participant, if any.
    pub async fn participant(&self, campaign_id: i64, telegram_id: i64) -> Option<ParticipantStatus> {
        self.participants
            .read()
            .await
            .get(&(campaign_id, telegram_id))
            .copied()
    }
}

#[async_trait]
impl CampaignStore for MemoryCampaignStore {
    async fn find_by_tag(&self, tag: &str) -> AppResult<Option<SubscriptionCampaign>> {
        Ok(self
            .campaigns
            .read()
            .await
            .values()
            .find(|c| c.tag == tag)
            .cloned())
    }

    async fn find_by_id(&self, id: i64) -> AppResult<Option<SubscriptionCampaign>> {
        Ok(self.campaigns.read().await.get(&id).cloned())
    }

    async fn update_status(&self, id: i64, next: CampaignStatus) -> AppResult<SubscriptionCampaign> {
        let mut campaigns = self.campaigns.write().await;
        let campaign = campaigns
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("Campaign {id} not found")))?;

        if !campaign.status.can_transition_to(next) {
            return Err(AppError::conflict(format!(
                "Campaign {id} cannot move from {} to {next}",
                campaign.status
            )));
        }
        campaign.status = next;
        campaign.updated_at = Utc::now();
        Ok(campaign.clone())
    }

    async fn record_started(&self, campaign_id: i64, telegram_id: i64) -> AppResult<()> {
        self.participants
            .write()
            .await
            .entry((campaign_id, telegram_id))
            .or_insert(ParticipantStatus::Started);
        Ok(())
    }

    async fn mark_subscribed(&self, campaign_id: i64, telegram_id: i64) -> AppResult<bool> {
        let previous = self
            .participants
            .write()
            .await
            .insert((campaign_id, telegram_id), ParticipantStatus::Subscribed);
        Ok(previous != Some(ParticipantStatus::Subscribed))
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// An active campaign with tag `spring`.
    pub fn campaign(id: i64, status: CampaignStatus) -> SubscriptionCampaign {
        let now = Utc::now();
        SubscriptionCampaign {
            id,
            tag: "spring".into(),
            title: "Spring giveaway".into(),
            channel_id: "@orderhub_news".into(),
            channel_url: Some("https://t.me/orderhub_news".into()),
            prompt_text: "Subscribe to our channel and get a free dessert!".into(),
            reward_text: "Thanks! Your promo code: SPRING24".into(),
            status,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::campaign;
    use super::*;

    #[tokio::test]
    async fn test_memory_campaign_lifecycle() {
        let store = MemoryCampaignStore::new();
        store.insert(campaign(1, CampaignStatus::Draft)).await;

        let updated = store.update_status(1, CampaignStatus::Active).await.unwrap();
        assert_eq!(updated.status, CampaignStatus::Active);

        store.update_status(1, CampaignStatus::Ended).await.unwrap();
        let err = store.update_status(1, CampaignStatus::Active).await.unwrap_err();
        assert_eq!(err.kind, orderhub_core::error::ErrorKind::Conflict);

        let err = store.update_status(9, CampaignStatus::Active).await.unwrap_err();
        assert_eq!(err.kind, orderhub_core::error::ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_mark_subscribed_once() {
        let store = MemoryCampaignStore::new();
        store.record_started(1, 42).await.unwrap();
        assert_eq!(store.participant(1, 42).await, Some(ParticipantStatus::Started));

        assert!(store.mark_subscribed(1, 42).await.unwrap());
        assert!(!store.mark_subscribed(1, 42).await.unwrap());

        store.record_started(1, 42).await.unwrap();
        assert_eq!(store.participant(1, 42).await, Some(ParticipantStatus::Subscribed));
    }
}

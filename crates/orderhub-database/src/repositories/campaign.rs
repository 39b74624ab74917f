//! Subscription campaign repository.

use sqlx::PgPool;

use orderhub_core::error::{AppError, ErrorKind};
use orderhub_core::result::AppResult;
use orderhub_entity::campaign::{
    CampaignParticipant, CampaignStatus, ParticipantStatus, SubscriptionCampaign,
};

const CAMPAIGN_COLUMNS: &str = "id, tag, title, channel_id, channel_url, prompt_text, \
     reward_text, status, created_at, updated_at";

/// Repository for campaigns and their participants.
#[derive(Debug, Clone)]
pub struct CampaignRepository {
    pool: PgPool,
}

impl CampaignRepository {
    /// Create a new campaign repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a campaign by its deep-link tag.
    pub async fn find_by_tag(&self, tag: &str) -> AppResult<Option<SubscriptionCampaign>> {
        sqlx::query_as::<_, SubscriptionCampaign>(&format!(
            "SELECT {CAMPAIGN_COLUMNS} FROM subscription_campaigns WHERE tag = $1"
        ))
        .bind(tag)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find campaign", e))
    }

    /// Find a campaign by id.
    pub async fn find_by_id(&self, id: i64) -> AppResult<Option<SubscriptionCampaign>> {
        sqlx::query_as::<_, SubscriptionCampaign>(&format!(
            "SELECT {CAMPAIGN_COLUMNS} FROM subscription_campaigns WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find campaign", e))
    }

    /// Move a campaign to a new status, enforcing the lifecycle.
    pub async fn update_status(
        &self,
        id: i64,
        next: CampaignStatus,
    ) -> AppResult<SubscriptionCampaign> {
        let current = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Campaign {id} not found")))?;

        if !current.status.can_transition_to(next) {
            return Err(AppError::conflict(format!(
                "Campaign {id} cannot move from {} to {next}",
                current.status
            )));
        }

        sqlx::query_as::<_, SubscriptionCampaign>(&format!(
            "UPDATE subscription_campaigns SET status = $2, updated_at = NOW() \
             WHERE id = $1 AND status = $3 RETURNING {CAMPAIGN_COLUMNS}"
        ))
        .bind(id)
        .bind(next)
        .bind(current.status)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update campaign", e))?
        .ok_or_else(|| AppError::conflict(format!("Campaign {id} was modified concurrently")))
    }

    /// Record that a user opened the campaign link. Keeps an existing row.
    pub async fn record_started(
        &self,
        campaign_id: i64,
        telegram_id: i64,
    ) -> AppResult<CampaignParticipant> {
        sqlx::query_as::<_, CampaignParticipant>(
            "INSERT INTO subscription_participants (campaign_id, telegram_id, status) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (campaign_id, telegram_id) DO UPDATE SET campaign_id = EXCLUDED.campaign_id \
             RETURNING campaign_id, telegram_id, status, started_at, subscribed_at",
        )
        .bind(campaign_id)
        .bind(telegram_id)
        .bind(ParticipantStatus::Started)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to record participant", e))
    }

    /// Mark a participant as subscribed. Returns `false` if they already were.
    pub async fn mark_subscribed(&self, campaign_id: i64, telegram_id: i64) -> AppResult<bool> {
        let result = sqlx::query(
            "INSERT INTO subscription_participants \
             (campaign_id, telegram_id, status, subscribed_at) VALUES ($1, $2, $3, NOW()) \
             ON CONFLICT (campaign_id, telegram_id) DO UPDATE \
             SET status = EXCLUDED.status, subscribed_at = NOW() \
             WHERE subscription_participants.status <> EXCLUDED.status",
        )
        .bind(campaign_id)
        .bind(telegram_id)
        .bind(ParticipantStatus::Subscribed)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to mark subscribed", e))?;

        Ok(result.rows_affected() > 0)
    }
}

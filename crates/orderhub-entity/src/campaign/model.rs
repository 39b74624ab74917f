//! Subscription campaign entity models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::status::{CampaignStatus, ParticipantStatus};

/// A "subscribe to our channel, get a reward" campaign reached via `/start <tag>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct SubscriptionCampaign {
    /// Campaign id.
    pub id: i64,
    /// Deep-link tag.
    pub tag: String,
    /// Admin-facing title.
    pub title: String,
    /// Channel whose membership is checked (`@name` or numeric id).
    pub channel_id: String,
    /// Public channel link shown on the subscribe button.
    pub channel_url: Option<String>,
    /// Text sent when the link is opened.
    pub prompt_text: String,
    /// Text sent once membership is confirmed.
    pub reward_text: String,
    /// Lifecycle status.
    pub status: CampaignStatus,
    /// When the campaign was created.
    pub created_at: DateTime<Utc>,
    /// When the campaign was last updated.
    pub updated_at: DateTime<Utc>,
}

/// A recipient's progress in a campaign. One row per campaign and user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct CampaignParticipant {
    /// Campaign id.
    pub campaign_id: i64,
    /// Telegram user id.
    pub telegram_id: i64,
    /// Progress.
    pub status: ParticipantStatus,
    /// When the link was first opened.
    pub started_at: DateTime<Utc>,
    /// When membership was confirmed.
    pub subscribed_at: Option<DateTime<Utc>>,
}

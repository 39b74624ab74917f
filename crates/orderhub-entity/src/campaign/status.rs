//! Campaign and participant status enumerations.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of a subscription campaign.
///
/// `draft -> active <-> paused -> ended`; `ended` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "campaign_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    /// Being prepared; `/start <tag>` falls back to the ordinary start message.
    Draft,
    /// Accepting participants.
    Active,
    /// Temporarily not accepting participants.
    Paused,
    /// Finished.
    Ended,
}

impl CampaignStatus {
    /// Whether the campaign may move to `next`.
    pub fn can_transition_to(&self, next: CampaignStatus) -> bool {
        matches!(
            (self, next),
            (Self::Draft, Self::Active)
                | (Self::Active, Self::Paused)
                | (Self::Paused, Self::Active)
                | (Self::Active, Self::Ended)
                | (Self::Paused, Self::Ended)
        )
    }

    /// Whether `/start <tag>` enrolls new participants.
    pub fn accepts_participants(&self) -> bool {
        matches!(self, Self::Active)
    }

    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Ended => "ended",
        }
    }
}

impl fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Progress of a single participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "participant_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ParticipantStatus {
    /// Opened the campaign link.
    Started,
    /// Membership in the target channel was confirmed.
    Subscribed,
}

//! Subscription campaign entities.

pub mod model;
pub mod status;

pub use model::{CampaignParticipant, SubscriptionCampaign};
pub use status::{CampaignStatus, ParticipantStatus};

//! Bot conversation services.

pub mod campaign;
pub mod start_message;

pub use campaign::CampaignService;
pub use start_message::StartMessageService;

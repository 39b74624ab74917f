//! Repository implementations.

pub mod campaign;
pub mod settings;
pub mod start_message;

pub use campaign::CampaignRepository;
pub use settings::SettingsRepository;
pub use start_message::StartMessageRepository;

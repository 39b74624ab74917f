//! Externally managed settings read by the notification core and the bot.

pub mod notification;
pub mod start_message;

pub use notification::NotificationSettings;
pub use start_message::{ImageHistory, StartButton, StartImage, StartMessageSettings};

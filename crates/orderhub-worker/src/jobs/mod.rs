//! Built-in job handler implementations.

pub mod broadcast;
pub mod custom;
pub mod order_alert;

pub use broadcast::BroadcastHandler;
pub use custom::CustomMessageHandler;
pub use order_alert::OrderAlertHandler;

use std::sync::Arc;

use orderhub_telegram::TelegramClient;

use crate::executor::JobExecutor;
use crate::settings::SettingsSource;

/// Executor with every Telegram delivery handler registered.
pub fn telegram_executor(telegram: TelegramClient, settings: Arc<dyn SettingsSource>) -> JobExecutor {
    let mut executor = JobExecutor::new();
    executor.register(Arc::new(OrderAlertHandler::new(telegram.clone(), settings)));
    executor.register(Arc::new(CustomMessageHandler::new(telegram.clone())));
    executor.register(Arc::new(BroadcastHandler::new(telegram)));
    executor
}

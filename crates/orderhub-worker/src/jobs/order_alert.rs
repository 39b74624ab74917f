//! Order alerts for the staff group chat.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::{debug, info};

use orderhub_entity::job::{JobPayload, JobType, NotificationJob, OrderNotification};
use orderhub_entity::order::snapshot::status_label;
use orderhub_telegram::{ParseMode, SendMessage, TelegramClient};

use crate::executor::{JobExecutionError, JobHandler};
use crate::settings::SettingsSource;
use crate::template::{
    DEFAULT_NEW_ORDER_TEMPLATE, DEFAULT_STATUS_CHANGE_TEMPLATE, render_or_default,
};

/// Handles `new_order` and `status_change` jobs
#[derive(Debug)]
pub struct OrderAlertHandler {
    /// Bot API client
    telegram: TelegramClient,
    /// Current notification settings
    settings: Arc<dyn SettingsSource>,
}

impl OrderAlertHandler {
    /// Create a new order alert handler
    pub fn new(telegram: TelegramClient, settings: Arc<dyn SettingsSource>) -> Self {
        Self { telegram, settings }
    }

    async fn deliver(
        &self,
        job: &NotificationJob,
        kind: JobType,
        alert: OrderNotification,
    ) -> Result<Option<Value>, JobExecutionError> {
        let settings = self.settings.notification_settings().await?;

        let (enabled, configured, default) = match kind {
            JobType::StatusChange => (
                settings.notify_on_status_change,
                settings.status_change_template.as_deref(),
                DEFAULT_STATUS_CHANGE_TEMPLATE,
            ),
            _ => (
                settings.notify_on_new_order,
                settings.new_order_template.as_deref(),
                DEFAULT_NEW_ORDER_TEMPLATE,
            ),
        };

        if !enabled && !alert.is_test {
            debug!(job_id = %job.id, job_type = %kind, "Notifications disabled, skipping");
            return Ok(Some(skipped("notifications disabled")));
        }

        let Some(chat_id) = alert
            .chat_id
            .clone()
            .or_else(|| settings.group_chat().map(str::to_string))
        else {
            debug!(job_id = %job.id, "No target chat configured, skipping");
            return Ok(Some(skipped("no target chat configured")));
        };

        let thread_id = alert
            .message_thread_id
            .or_else(|| settings.thread_for(alert.order.city_id));

        let mut values = alert.order.placeholders();
        let old_status = alert.old_status.unwrap_or_default();
        values.insert("old_status_label".into(), status_label(&old_status));
        values.insert("old_status".into(), old_status);

        let text = render_or_default(configured, default, &values);
        let request = SendMessage::new(chat_id.as_str(), text)
            .with_parse_mode(Some(ParseMode::Html))
            .in_thread(thread_id);
        let message_id = self.telegram.send_message(&request).await?;

        info!(
            job_id = %job.id,
            chat_id = %chat_id,
            message_id,
            "Order alert sent"
        );
        Ok(Some(json!({ "message_id": message_id, "chat_id": chat_id })))
    }
}

fn skipped(reason: &str) -> Value {
    json!({ "skipped": true, "reason": reason })
}

#[async_trait]
impl JobHandler for OrderAlertHandler {
    fn job_types(&self) -> &[JobType] {
        &[JobType::NewOrder, JobType::StatusChange]
    }

    async fn execute(
        &self,
        job: &NotificationJob,
        payload: JobPayload,
    ) -> Result<Option<Value>, JobExecutionError> {
        match payload {
            JobPayload::NewOrder(alert) => self.deliver(job, JobType::NewOrder, alert).await,
            JobPayload::StatusChange(alert) => {
                self.deliver(job, JobType::StatusChange, alert).await
            }
            other => Err(JobExecutionError::Permanent(format!(
                "Order alert handler cannot run '{}' jobs",
                other.job_type()
            ))),
        }
    }
}

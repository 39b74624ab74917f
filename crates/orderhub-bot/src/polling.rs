//! Long-polling update loop.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use orderhub_core::config::TelegramConfig;
use orderhub_telegram::TelegramClient;

use crate::update::UpdateProcessor;

/// Pulls updates with `getUpdates` and hands them to the processor.
///
/// The cursor advances past each update before it is processed, so an
/// update that keeps failing is not redelivered forever.
#[derive(Debug)]
pub struct PollingLoop {
    telegram: TelegramClient,
    processor: Arc<UpdateProcessor>,
    error_delay: Duration,
}

impl PollingLoop {
    /// Create a polling loop.
    pub fn new(telegram: TelegramClient, processor: Arc<UpdateProcessor>, config: &TelegramConfig) -> Self {
        Self {
            telegram,
            processor,
            error_delay: Duration::from_secs(config.poll_error_delay_seconds),
        }
    }

    /// Override the delay after a failed poll.
    pub fn with_error_delay(mut self, delay: Duration) -> Self {
        self.error_delay = delay;
        self
    }

    /// Run until `shutdown` is cancelled. Cancellation aborts an in-flight poll.
    pub async fn run(self, shutdown: CancellationToken) {
        if let Err(e) = self.telegram.delete_webhook(false).await {
            warn!(error = %e, "Failed to delete webhook before polling");
        }
        info!("Polling for updates");

        let mut offset: Option<i64> = None;
        loop {
            let batch = tokio::select! {
                _ = shutdown.cancelled() => break,
                batch = self.telegram.get_updates(offset) => batch,
            };

            let updates = match batch {
                Ok(updates) => updates,
                Err(e) => {
                    error!(error = %e, delay_s = self.error_delay.as_secs(), "getUpdates failed");
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = tokio::time::sleep(self.error_delay) => continue,
                    }
                }
            };

            for update in updates {
                let update_id = update.update_id;
                offset = Some(offset.map_or(update_id + 1, |o| o.max(update_id + 1)));

                if let Err(e) = self.processor.process(update).await {
                    warn!(update_id, error = %e, "Update processing failed");
                } else {
                    debug!(update_id, "Update processed");
                }
            }
        }

        info!("Polling stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{CampaignService, StartMessageService};
    use crate::store::{MemoryCampaignStore, MemoryStartMessageStore};
    use crate::test_support::{ok_true, telegram};
    use orderhub_core::config::BotConfig;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn polling(server: &MockServer) -> PollingLoop {
        let telegram = telegram(&server.uri());
        let start = StartMessageService::new(
            telegram.clone(),
            Arc::new(MemoryStartMessageStore::default()),
            &BotConfig::default(),
        );
        let campaigns = CampaignService::new(telegram.clone(), Arc::new(MemoryCampaignStore::new()));
        let processor = UpdateProcessor::new(telegram.clone(), Arc::new(start), Arc::new(campaigns));
        PollingLoop::new(telegram, Arc::new(processor), &TelegramConfig::default())
    }

    async fn wait_for(server: &MockServer, method_path: &str) {
        for _ in 0..200 {
            let requests = server.received_requests().await.unwrap();
            if requests.iter().any(|r| r.url.path() == method_path) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("{method_path} never called");
    }

    #[tokio::test]
    async fn test_cursor_advances_past_processed_updates() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/botTEST/deleteWebhook"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_true()))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/botTEST/getUpdates"))
            .and(body_partial_json(json!({"offset": 13})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true, "result": []})))
            .with_priority(1)
            .expect(1..)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/botTEST/getUpdates"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ok": true,
                "result": [
                    {"update_id": 12, "callback_query": {"id": "cb-2", "from": {"id": 1}, "data": "x"}},
                    {"update_id": 11, "callback_query": {"id": "cb-1", "from": {"id": 1}, "data": "x"}}
                ]
            })))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/botTEST/answerCallbackQuery"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_true()))
            .expect(2)
            .mount(&server)
            .await;

        let shutdown = CancellationToken::new();
        let task = tokio::spawn(polling(&server).run(shutdown.clone()));

        wait_for(&server, "/botTEST/answerCallbackQuery").await;
        for _ in 0..200 {
            let polls = server
                .received_requests()
                .await
                .unwrap()
                .iter()
                .filter(|r| r.url.path() == "/botTEST/getUpdates")
                .count();
            if polls >= 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        shutdown.cancel();
        tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .expect("Polling loop did not stop")
            .unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_interrupts_error_delay() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/botTEST/getUpdates"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let shutdown = CancellationToken::new();
        let polling = polling(&server).with_error_delay(Duration::from_secs(3600));
        let task = tokio::spawn(polling.run(shutdown.clone()));

        wait_for(&server, "/botTEST/getUpdates").await;
        shutdown.cancel();
        tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .expect("Polling loop did not stop")
            .unwrap();
    }
}

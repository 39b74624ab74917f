//! Welcome message composer.
//!
//! The message text is rendered with the recipient's first name. When images
//! are configured one is picked at random by weight, avoiding the image the
//! recipient saw last time whenever another candidate exists.

use std::collections::BTreeMap;
use std::sync::Arc;

use rand::Rng;
use rand::distributions::{Distribution, WeightedIndex};
use tracing::{debug, warn};

use orderhub_core::config::BotConfig;
use orderhub_core::result::AppResult;
use orderhub_entity::settings::{StartButton, StartImage, StartMessageSettings};
use orderhub_telegram::{
    InlineKeyboardButton, InlineKeyboardMarkup, ParseMode, SendMessage, SendPhoto, TelegramClient,
};
use orderhub_worker::template::{render, render_raw};

use crate::store::StartMessageStore;

/// Longest caption Telegram accepts on a photo.
const CAPTION_LIMIT: usize = 1024;

/// Sends the `/start` welcome message.
#[derive(Debug, Clone)]
pub struct StartMessageService {
    telegram: TelegramClient,
    store: Arc<dyn StartMessageStore>,
    default_text: String,
    default_image: Option<String>,
}

impl StartMessageService {
    /// Create the service.
    pub fn new(telegram: TelegramClient, store: Arc<dyn StartMessageStore>, config: &BotConfig) -> Self {
        Self {
            telegram,
            store,
            default_text: config.default_start_text.clone(),
            default_image: config
                .default_start_image
                .clone()
                .filter(|url| !url.trim().is_empty()),
        }
    }

    /// Send the welcome message to `chat_id`.
    ///
    /// `overrides` replaces the stored settings (admin preview). Returns the
    /// id of the last message sent.
    pub async fn send(
        &self,
        chat_id: i64,
        first_name: &str,
        overrides: Option<StartMessageSettings>,
    ) -> AppResult<i64> {
        let settings = match overrides {
            Some(settings) => settings,
            None => self.load_settings().await,
        };

        let parse_mode = settings.parse_mode.as_deref().and_then(ParseMode::parse);
        let text = self.render_text(&settings, first_name, parse_mode);
        let reply_markup = keyboard(&settings.buttons);

        let candidates: Vec<&StartImage> = settings.active_images().collect();
        let last_shown = if candidates.len() > 1 {
            self.last_image(chat_id).await
        } else {
            None
        };
        let chosen = choose_image(&candidates, last_shown.as_deref(), &mut rand::thread_rng())
            .map(|img| img.url.clone());
        let from_settings = chosen.is_some();

        let Some(image) = chosen.or_else(|| self.default_image.clone()) else {
            let request = SendMessage::new(chat_id, text)
                .with_parse_mode(parse_mode)
                .with_reply_markup(reply_markup);
            return Ok(self.telegram.send_message(&request).await?);
        };

        let fits = text.chars().count() <= CAPTION_LIMIT;
        let photo = SendPhoto {
            chat_id: chat_id.into(),
            photo: image.clone(),
            caption: fits.then(|| text.clone()),
            parse_mode: if fits { parse_mode } else { None },
            reply_markup: if fits { reply_markup.clone() } else { None },
            message_thread_id: None,
        };
        let mut message_id = self.telegram.send_photo(&photo).await?;

        if !fits {
            let request = SendMessage::new(chat_id, text)
                .with_parse_mode(parse_mode)
                .with_reply_markup(reply_markup);
            message_id = self.telegram.send_message(&request).await?;
        }

        if from_settings {
            if let Err(e) = self.store.record_image(chat_id, &image).await {
                warn!(chat_id, error = %e, "Failed to record start image history");
            }
        }

        debug!(chat_id, image = %image, "Start message sent");
        Ok(message_id)
    }

    async fn load_settings(&self) -> StartMessageSettings {
        match self.store.load().await {
            Ok(settings) => settings.unwrap_or_default(),
            Err(e) => {
                warn!(error = %e, "Failed to load start message settings, using defaults");
                StartMessageSettings::default()
            }
        }
    }

    async fn last_image(&self, chat_id: i64) -> Option<String> {
        self.store.last_image(chat_id).await.unwrap_or_else(|e| {
            warn!(chat_id, error = %e, "Failed to read start image history");
            None
        })
    }

    fn render_text(
        &self,
        settings: &StartMessageSettings,
        first_name: &str,
        parse_mode: Option<ParseMode>,
    ) -> String {
        let template = if settings.text.trim().is_empty() {
            self.default_text.as_str()
        } else {
            settings.text.as_str()
        };
        let values = BTreeMap::from([("first_name".to_string(), first_name.to_string())]);
        match parse_mode {
            Some(ParseMode::Html) => render(template, &values),
            _ => render_raw(template, &values),
        }
    }
}

/// Pick an image by weight, skipping `last_shown` when another candidate exists.
pub fn choose_image<'a, R: Rng + ?Sized>(
    candidates: &[&'a StartImage],
    last_shown: Option<&str>,
    rng: &mut R,
) -> Option<&'a StartImage> {
    let mut pool: Vec<&'a StartImage> = candidates.to_vec();
    if pool.len() > 1 {
        if let Some(last) = last_shown {
            pool.retain(|img| img.url != last);
            if pool.is_empty() {
                pool = candidates.to_vec();
            }
        }
    }

    let weights = WeightedIndex::new(pool.iter().map(|img| img.effective_weight())).ok()?;
    pool.get(weights.sample(rng)).copied()
}

/// Inline keyboard from configured buttons; buttons without a target are skipped.
fn keyboard(buttons: &[StartButton]) -> Option<serde_json::Value> {
    let rows: Vec<InlineKeyboardButton> = buttons
        .iter()
        .filter_map(|b| {
            let non_empty = |v: &Option<String>| v.clone().filter(|s| !s.trim().is_empty());
            if let Some(url) = non_empty(&b.web_app_url) {
                Some(InlineKeyboardButton::web_app(&b.text, url))
            } else {
                non_empty(&b.url).map(|url| InlineKeyboardButton::url(&b.text, url))
            }
        })
        .collect();

    if rows.is_empty() {
        None
    } else {
        InlineKeyboardMarkup::single_column(rows).to_value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStartMessageStore;
    use crate::test_support::{sent, telegram};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn image(id: i64, url: &str, weight: i32) -> StartImage {
        StartImage {
            id,
            url: url.into(),
            weight,
            is_active: true,
        }
    }

    fn service(server: &MockServer, store: Arc<MemoryStartMessageStore>) -> StartMessageService {
        StartMessageService::new(telegram(&server.uri()), store, &BotConfig::default())
    }

    #[test]
    fn test_choose_image_skips_last_shown() {
        let a = image(1, "https://img/a.jpg", 1);
        let b = image(2, "https://img/b.jpg", 5);
        let candidates = vec![&a, &b];
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..100 {
            let chosen = choose_image(&candidates, Some("https://img/b.jpg"), &mut rng).unwrap();
            assert_eq!(chosen.id, 1);
        }
    }

    #[test]
    fn test_single_candidate_repeats() {
        let a = image(1, "https://img/a.jpg", 0);
        let mut rng = StdRng::seed_from_u64(1);
        let chosen = choose_image(&[&a], Some("https://img/a.jpg"), &mut rng).unwrap();
        assert_eq!(chosen.id, 1);
        assert!(choose_image(&[], None, &mut rng).is_none());
    }

    #[test]
    fn test_non_positive_weights_still_chosen() {
        let a = image(1, "a", -2);
        let b = image(2, "b", 0);
        let mut rng = StdRng::seed_from_u64(3);
        let mut seen = [false; 2];
        for _ in 0..200 {
            let chosen = choose_image(&[&a, &b], None, &mut rng).unwrap();
            seen[(chosen.id - 1) as usize] = true;
        }
        assert_eq!(seen, [true, true]);
    }

    #[tokio::test]
    async fn test_photo_with_caption_and_history() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/botTEST/sendPhoto"))
            .and(body_partial_json(json!({
                "chat_id": 42,
                "photo": "https://img/a.jpg",
                "caption": "Hi Ann &amp; Bob",
                "parse_mode": "HTML"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(sent(5)))
            .expect(1)
            .mount(&server)
            .await;

        let store = Arc::new(MemoryStartMessageStore::new(Some(StartMessageSettings {
            text: "Hi {{first_name}}".into(),
            images: vec![image(1, "https://img/a.jpg", 1)],
            buttons: vec![],
            parse_mode: Some("HTML".into()),
        })));

        let id = service(&server, Arc::clone(&store))
            .send(42, "Ann & Bob", None)
            .await
            .unwrap();
        assert_eq!(id, 5);
        assert_eq!(
            store.last_image(42).await.unwrap().as_deref(),
            Some("https://img/a.jpg")
        );
    }

    #[tokio::test]
    async fn test_plain_message_with_buttons_when_no_images() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/botTEST/sendMessage"))
            .and(body_partial_json(json!({
                "chat_id": 42,
                "text": "Welcome, Ann & <Bob>",
                "reply_markup": {"inline_keyboard": [[{"text": "Menu", "web_app": {"url": "https://app"}}]]}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(sent(6)))
            .expect(1)
            .mount(&server)
            .await;

        let store = Arc::new(MemoryStartMessageStore::new(Some(StartMessageSettings {
            text: "Welcome, {{first_name}}".into(),
            images: vec![],
            buttons: vec![StartButton {
                text: "Menu".into(),
                url: None,
                web_app_url: Some("https://app".into()),
            }],
            parse_mode: None,
        })));

        assert_eq!(
            service(&server, store).send(42, "Ann & <Bob>", None).await.unwrap(),
            6
        );
    }

    #[tokio::test]
    async fn test_default_image_used_without_settings() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/botTEST/sendPhoto"))
            .and(body_partial_json(json!({"photo": "https://img/default.jpg"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(sent(7)))
            .expect(1)
            .mount(&server)
            .await;

        let config = BotConfig {
            default_start_image: Some("https://img/default.jpg".into()),
            ..Default::default()
        };
        let store = Arc::new(MemoryStartMessageStore::default());
        let service = StartMessageService::new(telegram(&server.uri()), store.clone(), &config);

        assert_eq!(service.send(42, "Ann", None).await.unwrap(), 7);
        assert!(store.last_image(42).await.unwrap().is_none());
    }
}

//! # orderhub-telegram
//!
//! Thin async client for the Telegram Bot API.
//!
//! Every call is a JSON `POST` to `{base}/bot{token}/{method}` and returns
//! the decoded `result` or a [`TelegramError`] carrying the provider's
//! error code and description. The only built-in retry is the markup
//! fallback: a send rejected because its entities could not be parsed is
//! repeated once without `parse_mode`.

pub mod client;
pub mod error;
pub mod types;

pub use client::TelegramClient;
pub use error::TelegramError;
pub use types::{
    AnswerCallbackQuery, CallbackQuery, Chat, ChatId, ChatMember, InlineKeyboardButton,
    InlineKeyboardMarkup, Message, ParseMode, SendMessage, SendPhoto, SendVideo, Update, User,
};

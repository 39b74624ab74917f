//! Telegram client errors.

use orderhub_core::error::{AppError, ErrorKind};

/// Failure of a single Bot API call.
#[derive(Debug, thiserror::Error)]
pub enum TelegramError {
    /// The API answered `ok: false`.
    #[error("Telegram {method} failed ({code}): {description}")]
    Api {
        /// Bot API method name.
        method: String,
        /// `error_code` from the response, or the HTTP status.
        code: u16,
        /// `description` from the response.
        description: String,
        /// Flood-control hint in seconds.
        retry_after: Option<u64>,
    },
    /// The request never produced an HTTP response (timeout, connect error).
    #[error("Telegram {method} request failed: {source}")]
    Transport {
        /// Bot API method name.
        method: String,
        /// Underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },
    /// A 2xx response whose body could not be decoded.
    #[error("Telegram {method} returned an unreadable response: {message}")]
    Decode {
        /// Bot API method name.
        method: String,
        /// Decode failure.
        message: String,
    },
    /// The client cannot be built from the given settings.
    #[error("Telegram client misconfigured: {0}")]
    Config(String),
}

impl TelegramError {
    /// Transport failure with the request URL stripped; the URL embeds the bot token.
    pub fn transport(method: &str, source: reqwest::Error) -> Self {
        Self::Transport {
            method: method.to_string(),
            source: source.without_url(),
        }
    }

    /// Whether the API rejected the message markup for the requested parse mode.
    pub fn is_markup_error(&self) -> bool {
        match self {
            Self::Api {
                code, description, ..
            } => {
                let description = description.to_lowercase();
                *code == 400
                    && (description.contains("can't parse entities")
                        || description.contains("can't parse message text"))
            }
            _ => false,
        }
    }

    /// Provider error code, when the API answered.
    pub fn code(&self) -> Option<u16> {
        match self {
            Self::Api { code, .. } => Some(*code),
            _ => None,
        }
    }
}

impl From<TelegramError> for AppError {
    fn from(err: TelegramError) -> Self {
        let kind = match err {
            TelegramError::Config(_) => ErrorKind::Configuration,
            _ => ErrorKind::ExternalService,
        };
        AppError::with_source(kind, err.to_string(), err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(code: u16, description: &str) -> TelegramError {
        TelegramError::Api {
            method: "sendMessage".into(),
            code,
            description: description.into(),
            retry_after: None,
        }
    }

    #[test]
    fn test_markup_error_detection() {
        assert!(
            api(
                400,
                "Bad Request: can't parse entities: Can't find end of the entity starting at byte offset 5"
            )
            .is_markup_error()
        );
        assert!(!api(400, "Bad Request: chat not found").is_markup_error());
        assert!(!api(500, "can't parse entities").is_markup_error());
    }

    #[test]
    fn test_display_carries_code_and_description() {
        let err = api(403, "Forbidden: bot was blocked by the user");
        assert_eq!(
            err.to_string(),
            "Telegram sendMessage failed (403): Forbidden: bot was blocked by the user"
        );
    }
}

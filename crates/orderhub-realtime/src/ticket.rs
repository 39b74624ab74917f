//! Single-use connection tickets.
//!
//! A ticket proves the holder had an authenticated HTTP session moments ago.
//! It is stored in the shared cache so any backend instance can redeem it,
//! and redemption is an atomic take: the first caller wins.

use std::time::Duration;

use rand::RngCore;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use orderhub_cache::{CacheManager, keys};
use orderhub_core::config::RealtimeConfig;
use orderhub_core::error::AppError;
use orderhub_core::result::AppResult;

/// Random bytes per ticket (hex-encoded to 64 characters).
const TICKET_BYTES: usize = 32;

/// The authenticated admin a ticket or connection belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Admin user id.
    pub user_id: i64,
    /// Role name as stored in the session.
    pub role: String,
}

impl Principal {
    /// Create a principal.
    pub fn new(user_id: i64, role: impl Into<String>) -> Self {
        Self {
            user_id,
            role: role.into(),
        }
    }
}

/// Issues and redeems connection tickets.
#[derive(Debug, Clone)]
pub struct TicketService {
    cache: CacheManager,
    ttl: Duration,
}

impl TicketService {
    /// Create a ticket service over the shared cache.
    pub fn new(cache: CacheManager, ttl: Duration) -> Self {
        Self { cache, ttl }
    }

    /// Ticket service using the configured TTL.
    pub fn from_config(cache: CacheManager, config: &RealtimeConfig) -> Self {
        Self::new(cache, Duration::from_secs(config.ticket_ttl_seconds))
    }

    /// Mint a ticket bound to `principal`.
    pub async fn issue(&self, principal: &Principal) -> AppResult<String> {
        let mut bytes = [0u8; TICKET_BYTES];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        let ticket = hex::encode(bytes);

        self.cache
            .set_json(&keys::ws_ticket(&ticket), principal, self.ttl)
            .await?;

        debug!(user_id = principal.user_id, "Connection ticket issued");
        Ok(ticket)
    }

    /// Consume a ticket. Fails with an authentication error when the ticket
    /// is unknown, expired or already used.
    pub async fn redeem(&self, ticket: &str) -> AppResult<Principal> {
        if ticket.is_empty() || ticket.len() != TICKET_BYTES * 2 {
            return Err(AppError::authentication("Invalid connection ticket"));
        }

        match self.cache.take_json::<Principal>(&keys::ws_ticket(ticket)).await? {
            Some(principal) => Ok(principal),
            None => {
                warn!("Connection ticket missing, expired or already used");
                Err(AppError::authentication("Invalid or expired connection ticket"))
            }
        }
    }
}

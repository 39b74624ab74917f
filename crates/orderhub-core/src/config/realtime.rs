//! Realtime (WebSocket) configuration.

use serde::{Deserialize, Serialize};

/// Realtime connection registry configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Lifetime of a connection ticket in seconds.
    #[serde(default = "default_ticket_ttl")]
    pub ticket_ttl_seconds: u64,
    /// Per-connection outbound buffer. A full buffer drops events for that connection.
    #[serde(default = "default_outbound_buffer")]
    pub outbound_buffer_size: usize,
    /// Maximum rooms a single connection may join.
    #[serde(default = "default_max_rooms")]
    pub max_rooms_per_connection: usize,
    /// Inbound messages larger than this are dropped.
    #[serde(default = "default_max_message_bytes")]
    pub max_message_bytes: usize,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            ticket_ttl_seconds: default_ticket_ttl(),
            outbound_buffer_size: default_outbound_buffer(),
            max_rooms_per_connection: default_max_rooms(),
            max_message_bytes: default_max_message_bytes(),
        }
    }
}

fn default_ticket_ttl() -> u64 {
    30
}

fn default_outbound_buffer() -> usize {
    256
}

fn default_max_rooms() -> usize {
    64
}

fn default_max_message_bytes() -> usize {
    16 * 1024
}

//! Realtime event envelope pushed to connected dashboard clients.
//!
//! Every outbound frame is a JSON object `{ "type": <name>, "data": <payload> }`.

use serde::{Deserialize, Serialize};

/// Event emitted when an order is created.
pub const NEW_ORDER: &str = "new-order";

/// Event emitted when an order's status changes.
pub const ORDER_STATUS_UPDATED: &str = "order-status-updated";

/// Event emitted when a customer's bonus balance changes.
pub const BONUS_UPDATED: &str = "bonus-updated";

/// Event name used for ad-hoc broadcasts (`broadcast:{name}`).
pub fn broadcast(name: &str) -> String {
    format!("broadcast:{name}")
}

/// Outbound realtime event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealtimeEvent {
    /// Event name.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Event payload.
    pub data: serde_json::Value,
}

impl RealtimeEvent {
    /// Build an event from a name and any serializable payload.
    pub fn new(event_type: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            event_type: event_type.into(),
            data,
        }
    }

    /// Serialize into the wire frame.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

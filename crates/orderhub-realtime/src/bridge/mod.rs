//! Order event fan-out to rooms and the notification queue.

pub mod order_events;

pub use order_events::{OrderEvent, OrderEventBridge, PublishOutcome};

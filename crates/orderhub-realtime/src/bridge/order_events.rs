//! Domain event → realtime broadcast + notification job mapping.
//!
//! Order events reach the admin panel immediately through rooms and, when
//! they warrant a Telegram alert, become jobs in the notification queue.
//! Publishing never fails: a broken queue must not break order handling.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use orderhub_core::events::{self, RealtimeEvent};
use orderhub_entity::job::{JobPayload, JobPriority, OrderNotification};
use orderhub_entity::order::OrderSnapshot;
use orderhub_worker::JobQueue;

use crate::connection::manager::ConnectionManager;
use crate::room;

/// Events emitted by the order service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
pub enum OrderEvent {
    /// A new order was placed.
    NewOrder(OrderSnapshot),
    /// An order moved to another status.
    OrderStatusUpdated {
        /// Order after the transition.
        order: OrderSnapshot,
        /// Status before the transition.
        #[serde(default)]
        old_status: Option<String>,
    },
    /// A customer's bonus balance changed.
    BonusUpdated {
        /// City room to notify besides `admin:all`.
        #[serde(default)]
        city_id: Option<i64>,
        /// Event payload, forwarded as-is.
        #[serde(default)]
        data: Value,
    },
    /// Ad-hoc event delivered to every connection as `broadcast:{name}`.
    Broadcast {
        /// Suffix of the event name.
        name: String,
        /// Event payload, forwarded as-is.
        #[serde(default)]
        data: Value,
    },
}

/// What [`OrderEventBridge::publish`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PublishOutcome {
    /// Connections the realtime frame was queued for.
    pub delivered: usize,
    /// Notification job created for the event, if any.
    pub job_id: Option<Uuid>,
}

/// Bridges order events into the realtime system and the notification queue.
#[derive(Debug)]
pub struct OrderEventBridge {
    /// Connection manager
    connections: Arc<ConnectionManager>,
    /// Notification queue; `None` disables alerts
    queue: Option<Arc<JobQueue>>,
}

impl OrderEventBridge {
    /// Create a new event bridge
    pub fn new(connections: Arc<ConnectionManager>, queue: Option<Arc<JobQueue>>) -> Self {
        Self { connections, queue }
    }

    /// Broadcast an event and enqueue its notification job.
    pub async fn publish(&self, event: OrderEvent) -> PublishOutcome {
        match event {
            OrderEvent::NewOrder(order) => {
                let rooms = order_rooms(&order);
                let frame = RealtimeEvent::new(events::NEW_ORDER, to_value(&order));
                let delivered = self.connections.broadcast_rooms(&rooms, &frame);

                let payload = JobPayload::NewOrder(notification(order, None));
                let job_id = self.enqueue(&payload, JobPriority::High).await;
                PublishOutcome { delivered, job_id }
            }
            OrderEvent::OrderStatusUpdated { order, old_status } => {
                let rooms = order_rooms(&order);
                let mut data = to_value(&order);
                if let (Value::Object(map), Some(old)) = (&mut data, &old_status) {
                    map.insert("old_status".into(), Value::String(old.clone()));
                }
                let frame = RealtimeEvent::new(events::ORDER_STATUS_UPDATED, data);
                let delivered = self.connections.broadcast_rooms(&rooms, &frame);

                let payload = JobPayload::StatusChange(notification(order, old_status));
                let job_id = self.enqueue(&payload, JobPriority::Normal).await;
                PublishOutcome { delivered, job_id }
            }
            OrderEvent::BonusUpdated { city_id, data } => {
                let mut rooms = vec![room::ADMIN_ALL.to_string()];
                rooms.extend(city_id.map(room::city));
                let frame = RealtimeEvent::new(events::BONUS_UPDATED, data);
                PublishOutcome {
                    delivered: self.connections.broadcast_rooms(&rooms, &frame),
                    job_id: None,
                }
            }
            OrderEvent::Broadcast { name, data } => {
                let frame = RealtimeEvent::new(events::broadcast(&name), data);
                PublishOutcome {
                    delivered: self.connections.broadcast_all(&frame),
                    job_id: None,
                }
            }
        }
    }

    async fn enqueue(&self, payload: &JobPayload, priority: JobPriority) -> Option<Uuid> {
        let queue = self.queue.as_ref()?;
        match queue.enqueue_payload(payload, priority).await {
            Ok(job_id) => {
                debug!(job_id = %job_id, job_type = %payload.job_type(), "Notification job enqueued");
                Some(job_id)
            }
            Err(e) => {
                warn!(job_type = %payload.job_type(), error = %e, "Failed to enqueue notification job");
                None
            }
        }
    }
}

/// Rooms interested in an order: its city, its branch and `admin:all`.
fn order_rooms(order: &OrderSnapshot) -> Vec<String> {
    let mut rooms = Vec::with_capacity(3);
    rooms.extend(order.city_id.map(room::city));
    rooms.extend(order.branch_id.map(room::branch));
    rooms.push(room::ADMIN_ALL.to_string());
    rooms
}

fn notification(order: OrderSnapshot, old_status: Option<String>) -> OrderNotification {
    OrderNotification {
        order,
        is_test: false,
        chat_id: None,
        message_thread_id: None,
        old_status,
    }
}

fn to_value(order: &OrderSnapshot) -> Value {
    serde_json::to_value(order).unwrap_or(Value::Null)
}

//! Notification job domain entities.

pub mod model;
pub mod payload;
pub mod status;

pub use model::{NewNotificationJob, NotificationJob};
pub use payload::{
    BroadcastMedia, BroadcastPayload, CustomMessage, JobPayload, OrderNotification, PayloadError,
};
pub use status::{JobPriority, JobStatus, JobType};

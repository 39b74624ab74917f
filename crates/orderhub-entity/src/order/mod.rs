//! Order snapshots carried inside notification jobs and realtime events.

pub mod snapshot;

pub use snapshot::{OrderItem, OrderSnapshot};

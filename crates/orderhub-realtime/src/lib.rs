//! # orderhub-realtime
//!
//! Real-time WebSocket engine for the OrderHub admin panel. Provides:
//!
//! - Single-use connection tickets exchanged for an authenticated session
//! - A process-local connection pool indexed by connection and principal
//! - Named rooms (per city, per branch, admin-wide) for scoped fan-out
//! - A bridge from order events to room broadcasts and notification jobs
//!
//! The registry is process-local: a client connected to one backend
//! instance does not receive events published on another.

pub mod bridge;
pub mod connection;
pub mod message;
pub mod room;
pub mod server;
pub mod ticket;

pub use bridge::{OrderEvent, OrderEventBridge, PublishOutcome};
pub use connection::{ConnectionHandle, ConnectionId, ConnectionManager, ConnectionState};
pub use room::RoomRegistry;
pub use server::RealtimeEngine;
pub use ticket::{Principal, TicketService};

//! Request handlers.

pub mod admin;
pub mod events;
pub mod health;
pub mod realtime;
pub mod ws;

//! # orderhub-api
//!
//! HTTP API layer for the OrderHub backend built on Axum.
//!
//! Provides connection ticket issuance, the ticket-gated WebSocket upgrade,
//! admin queue inspection, internal order event ingress, health, and the
//! middleware around them (CORS, request logging).

pub mod app;
pub mod dto;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::build_app;
pub use state::AppState;

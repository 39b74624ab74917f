//! # orderhub-entity
//!
//! Domain entity models for OrderHub. Every struct in this crate represents
//! a database table row, a queued job or a domain value object. Database
//! entities additionally derive `sqlx::FromRow`.

pub mod campaign;
pub mod job;
pub mod order;
pub mod settings;

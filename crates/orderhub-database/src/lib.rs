//! # orderhub-database
//!
//! PostgreSQL connection management and repositories for the settings and
//! campaign tables the notification core and the bot read.

pub mod connection;
pub mod migration;
pub mod repositories;

pub use connection::DatabasePool;

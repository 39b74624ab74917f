//! # orderhub-core
//!
//! Core crate for OrderHub. Contains configuration schemas, the unified
//! error system, the cache provider trait, logging setup and the realtime
//! event envelope shared by the backend and its consumers.
//!
//! This crate has **no** internal dependencies on other OrderHub crates.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;
pub mod response;
pub mod result;
pub mod secret;
pub mod traits;

pub use error::AppError;
pub use result::AppResult;

//! HTTP request handlers.

pub mod health;
pub mod internal;
pub mod webhook;

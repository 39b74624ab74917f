//! Admin-only handlers.

pub mod queue;

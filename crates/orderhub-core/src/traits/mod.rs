//! Core traits shared by the infrastructure crates.

pub mod cache;

pub use cache::CacheProvider;

// src/lib.rs
pub mod types;
pub mod config;
#[cfg(feature = "metrics")]
pub mod metrics;
pub mod providers;
pub mod scoring;
pub mod cache;
pub mod scheduler;
pub mod api;

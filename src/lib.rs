//! taskroute - task-aware router for hosted LLMs
//!
//! Classifies each prompt into a task category, selects the best-fit model
//! candidate for the caller's priority and latency budget, and executes it
//! against the owning provider with a single fallback.

pub mod classifier;
pub mod cli;
pub mod config;
pub mod error;
pub mod executor;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod providers;
pub mod telemetry;

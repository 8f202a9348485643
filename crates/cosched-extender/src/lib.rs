//! Cosched Extender - kube-scheduler extender endpoint
//!
//! This crate provides:
//! - Axum-based HTTP server
//! - `/filter` and `/prioritize` extender webhooks backed by the co-scheduling plugin
//! - Health and readiness probes

pub mod error;
pub mod server;
pub mod handlers;
pub mod state;
pub mod response;
pub mod types;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use error::{ApiError, Result};
pub use server::{router, ExtenderConfig, ExtenderServer};
pub use state::ExtenderState;
pub use types::{ExtenderArgs, ExtenderFilterResult, HostPriority, NodeList};

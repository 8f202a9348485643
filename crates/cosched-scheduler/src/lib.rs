//! Cosched Scheduler - Longhorn share-manager co-scheduling
//!
//! This crate provides:
//! - The opt-in gate and migration-target exception
//! - Companion node resolution against the cluster
//! - Filter and score plugins keeping VM pods next to their share-manager
//! - A minimal in-process framework driving the plugins

pub mod error;
pub mod types;
pub mod gate;
pub mod resolver;
pub mod filter;
pub mod score;
pub mod plugin;
pub mod framework;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use error::{SchedulerError, Result};
pub use filter::FilterPlugin;
pub use framework::{CycleOutcome, Framework};
pub use gate::GateDecision;
pub use plugin::CoSchedulePlugin;
pub use resolver::DependencyResolver;
pub use score::ScorePlugin;
pub use types::{CycleContext, FilterResult, Resolution, ScoreResult, StatusCode};

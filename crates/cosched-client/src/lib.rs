//! Cosched Client - Read access to the cluster objects the plugin inspects
//!
//! This crate provides:
//! - The `ClusterReader` trait (not-found is `Ok(None)`, everything else is an error)
//! - `ApiClient`, a reqwest-based reader for a live API server
//! - `MockCluster`, an in-memory reader for tests

// Allow unused assignments for diagnostic fields - they're used by the thiserror/miette macros
#![allow(unused_assignments)]

pub mod api_client;
pub mod config;
pub mod error;
pub mod mock;
pub mod reader;

pub use api_client::ApiClient;
pub use config::ApiClientConfig;
pub use error::{ClientError, Result};
pub use mock::{MockCluster, MockKind};
pub use reader::ClusterReader;

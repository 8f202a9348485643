//! Cosched Core - Shared types for the Longhorn co-scheduling plugin
//!
//! This crate provides:
//! - Contract constants and the `CoScheduleConfig` built from them
//! - Error types with miette diagnostics
//! - Resource keys and API paths
//! - A typed view of the Longhorn ShareManager resource
//! - Manifest (de)serialization helpers

pub mod config;
pub mod error;
pub mod share_manager;
pub mod types;

// Re-export commonly used types
pub use config::{ConflictPolicy, CoScheduleConfig, MAX_NODE_SCORE, PLUGIN_NAME};
pub use error::{CoreError, Result};
pub use share_manager::{ShareManager, ShareManagerState};
pub use types::{pod_namespace, GroupVersionKind, ObjectKey, ResourceKey, DEFAULT_NAMESPACE};

// Re-export k8s-openapi types for convenience
pub use k8s_openapi;
pub use k8s_openapi::api::core::v1::{Node, PersistentVolumeClaim, Pod};
pub use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

/// Serialize a resource to pretty JSON
pub fn to_json_pretty<T: serde::Serialize>(resource: &T) -> Result<String> {
    serde_json::to_string_pretty(resource).map_err(|e| {
        CoreError::serialization_error(
            format!("Failed to serialize to JSON: {}", e),
            Some(Box::new(e)),
        )
    })
}

/// Deserialize a resource from JSON
pub fn from_json<T: for<'de> serde::Deserialize<'de>>(data: &str) -> Result<T> {
    serde_json::from_str(data).map_err(|e| {
        CoreError::serialization_error(
            format!("Failed to deserialize from JSON: {}", e),
            Some(Box::new(e)),
        )
    })
}

/// Deserialize a resource from YAML
pub fn from_yaml<T: for<'de> serde::Deserialize<'de>>(data: &str) -> Result<T> {
    serde_yaml::from_str(data).map_err(|e| {
        CoreError::serialization_error(
            format!("Failed to deserialize from YAML: {}", e),
            Some(Box::new(e)),
        )
    })
}

/// Deserialize a manifest, picking the format from its first non-blank character
pub fn from_manifest<T: for<'de> serde::Deserialize<'de>>(data: &str) -> Result<T> {
    if data.trim_start().starts_with('{') {
        from_json(data)
    } else {
        from_yaml(data)
    }
}

use crate::error::Result;
use async_trait::async_trait;
use cosched_core::GroupVersionKind;
use k8s_openapi::api::core::v1::{PersistentVolumeClaim, Pod};
use serde_json::Value;

/// Read-only access to the objects the co-scheduling plugin inspects
///
/// Every lookup returns `Ok(None)` when the object does not exist. Any other
/// failure (transport, authorization, decoding) is an error, so callers can
/// tell "absent" apart from "could not find out".
///
/// Implemented by `ApiClient` against a live API server and by `MockCluster`
/// for tests.
#[async_trait]
pub trait ClusterReader: Send + Sync {
    /// GET a pod by namespace and name
    async fn get_pod(&self, namespace: &str, name: &str) -> Result<Option<Pod>>;

    /// GET a persistent volume claim by namespace and name
    async fn get_persistent_volume_claim(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<PersistentVolumeClaim>>;

    /// GET a namespaced custom resource as untyped JSON
    async fn get_custom_object(
        &self,
        gvk: &GroupVersionKind,
        namespace: &str,
        name: &str,
    ) -> Result<Option<Value>>;
}

use crate::error::{ClientError, Result};
use crate::reader::ClusterReader;
use async_trait::async_trait;
use cosched_core::{pod_namespace, GroupVersionKind};
use k8s_openapi::api::core::v1::{PersistentVolumeClaim, Pod};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

/// Object kinds served by `MockCluster`, used to target injected failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockKind {
    Pod,
    PersistentVolumeClaim,
    CustomObject,
}

type Key = (String, String);

/// In-memory cluster for tests
///
/// Holds pods, claims and custom objects keyed by namespace/name. Failures
/// can be injected per kind, every lookup is recorded, and an optional
/// latency makes cancellation observable.
#[derive(Clone, Default)]
pub struct MockCluster {
    pods: Arc<RwLock<HashMap<Key, Pod>>>,
    claims: Arc<RwLock<HashMap<Key, PersistentVolumeClaim>>>,
    custom_objects: Arc<RwLock<HashMap<(String, Key), Value>>>,
    failures: Arc<RwLock<HashMap<MockKind, String>>>,
    object_failures: Arc<RwLock<HashMap<(MockKind, Key), String>>>,
    queries: Arc<RwLock<Vec<String>>>,
    latency: Arc<RwLock<Option<Duration>>>,
}

impl MockCluster {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_pod(&self, pod: Pod) {
        let key = (
            pod_namespace(&pod).to_string(),
            pod.metadata.name.clone().unwrap_or_default(),
        );
        self.pods.write().await.insert(key, pod);
    }

    pub async fn add_claim(&self, claim: PersistentVolumeClaim) {
        let key = (
            claim.metadata.namespace.clone().unwrap_or_default(),
            claim.metadata.name.clone().unwrap_or_default(),
        );
        self.claims.write().await.insert(key, claim);
    }

    /// Store a custom object under the name and namespace in its metadata
    pub async fn add_custom_object(&self, gvk: &GroupVersionKind, object: Value) {
        let metadata = object.get("metadata");
        let field = |name: &str| {
            metadata
                .and_then(|m| m.get(name))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        let key = (gvk.to_string(), (field("namespace"), field("name")));
        self.custom_objects.write().await.insert(key, object);
    }

    pub async fn remove_custom_object(&self, gvk: &GroupVersionKind, namespace: &str, name: &str) {
        let key = (gvk.to_string(), (namespace.to_string(), name.to_string()));
        self.custom_objects.write().await.remove(&key);
    }

    /// Make every lookup of `kind` fail with a 500
    pub async fn fail(&self, kind: MockKind, message: impl Into<String>) {
        self.failures.write().await.insert(kind, message.into());
    }

    /// Make lookups of one object fail with a 500
    pub async fn fail_object(
        &self,
        kind: MockKind,
        namespace: &str,
        name: &str,
        message: impl Into<String>,
    ) {
        let key = (kind, (namespace.to_string(), name.to_string()));
        self.object_failures
            .write()
            .await
            .insert(key, message.into());
    }

    pub async fn set_latency(&self, latency: Duration) {
        *self.latency.write().await = Some(latency);
    }

    /// Lookups performed so far, as `kind namespace/name`
    pub async fn queries(&self) -> Vec<String> {
        self.queries.read().await.clone()
    }

    async fn record(&self, kind: MockKind, namespace: &str, name: &str) -> Result<()> {
        let entry = format!("{:?} {}/{}", kind, namespace, name);
        debug!("Mock: GET {}", entry);
        self.queries.write().await.push(entry);

        let latency = *self.latency.read().await;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        let object_key = (kind, (namespace.to_string(), name.to_string()));
        let failure = match self.object_failures.read().await.get(&object_key) {
            Some(message) => Some(message.clone()),
            None => self.failures.read().await.get(&kind).cloned(),
        };

        match failure {
            Some(message) => Err(ClientError::unexpected_status(
                format!("mock://{:?}/{}/{}", kind, namespace, name),
                500,
                message,
            )),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ClusterReader for MockCluster {
    async fn get_pod(&self, namespace: &str, name: &str) -> Result<Option<Pod>> {
        self.record(MockKind::Pod, namespace, name).await?;
        let key = (namespace.to_string(), name.to_string());
        Ok(self.pods.read().await.get(&key).cloned())
    }

    async fn get_persistent_volume_claim(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<PersistentVolumeClaim>> {
        self.record(MockKind::PersistentVolumeClaim, namespace, name)
            .await?;
        let key = (namespace.to_string(), name.to_string());
        Ok(self.claims.read().await.get(&key).cloned())
    }

    async fn get_custom_object(
        &self,
        gvk: &GroupVersionKind,
        namespace: &str,
        name: &str,
    ) -> Result<Option<Value>> {
        self.record(MockKind::CustomObject, namespace, name).await?;
        let key = (gvk.to_string(), (namespace.to_string(), name.to_string()));
        Ok(self.custom_objects.read().await.get(&key).cloned())
    }
}

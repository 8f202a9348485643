use crate::config::ApiClientConfig;
use crate::error::{ClientError, Result};
use crate::reader::ClusterReader;
use async_trait::async_trait;
use cosched_core::{GroupVersionKind, ResourceKey};
use k8s_openapi::api::core::v1::{PersistentVolumeClaim, Pod};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

/// Lightweight HTTP client for reading objects from the Kubernetes API server
pub struct ApiClient {
    base_url: String,
    client: Client,
    bearer_token: Option<String>,
}

impl ApiClient {
    pub fn new(config: &ApiClientConfig) -> Result<Self> {
        let mut builder = Client::builder()
            .timeout(config.request_timeout)
            .danger_accept_invalid_certs(config.accept_invalid_certs);

        if let Some(pem) = &config.ca_cert_pem {
            let cert = reqwest::Certificate::from_pem(pem).map_err(|e| {
                ClientError::invalid_config(
                    format!("CA bundle is not valid PEM: {}", e),
                    "Pass the cluster CA certificate with --ca-file",
                )
            })?;
            builder = builder.add_root_certificate(cert);
        }

        let client = builder.build().map_err(|e| {
            ClientError::invalid_config(
                format!("failed to build HTTP client: {}", e),
                "Check the TLS settings",
            )
        })?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
            bearer_token: config.bearer_token.clone(),
        })
    }

    /// GET a single object, mapping 404 to `None`
    async fn get_object<T: DeserializeOwned>(&self, key: &ResourceKey) -> Result<Option<T>> {
        let url = format!("{}{}", self.base_url, key.api_path());
        debug!("GET {}", url);

        let mut request = self.client.get(&url);
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }

        let resp = request
            .send()
            .await
            .map_err(|e| ClientError::request_failed(&url, e.to_string()))?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            debug!("{} not found", key);
            return Ok(None);
        }

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ClientError::unexpected_status(&url, status.as_u16(), body));
        }

        resp.json::<T>()
            .await
            .map(Some)
            .map_err(|e| ClientError::decode_failed(&url, e.to_string()))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl ClusterReader for ApiClient {
    /// GET /api/v1/namespaces/{namespace}/pods/{name}
    async fn get_pod(&self, namespace: &str, name: &str) -> Result<Option<Pod>> {
        let key = ResourceKey::new(GroupVersionKind::pod(), namespace, name);
        self.get_object(&key).await
    }

    /// GET /api/v1/namespaces/{namespace}/persistentvolumeclaims/{name}
    async fn get_persistent_volume_claim(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<PersistentVolumeClaim>> {
        let key = ResourceKey::new(GroupVersionKind::persistent_volume_claim(), namespace, name);
        self.get_object(&key).await
    }

    /// GET /apis/{group}/{version}/namespaces/{namespace}/{resource}/{name}
    async fn get_custom_object(
        &self,
        gvk: &GroupVersionKind,
        namespace: &str,
        name: &str,
    ) -> Result<Option<Value>> {
        let key = ResourceKey::new(gvk.clone(), namespace, name);
        self.get_object(&key).await
    }
}

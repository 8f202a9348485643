use crate::error::{ClientError, Result};
use std::path::Path;
use std::time::Duration;

/// Directory kubelet mounts service account credentials into
pub const SERVICE_ACCOUNT_DIR: &str = "/var/run/secrets/kubernetes.io/serviceaccount";

/// Configuration for `ApiClient`
#[derive(Clone)]
pub struct ApiClientConfig {
    /// API server URL (e.g., "https://10.96.0.1:443")
    pub base_url: String,
    /// Bearer token sent with every request
    pub bearer_token: Option<String>,
    /// PEM bundle trusted in addition to the system roots
    pub ca_cert_pem: Option<Vec<u8>>,
    /// Skip TLS verification (development clusters only)
    pub accept_invalid_certs: bool,
    /// Upper bound for a single GET
    pub request_timeout: Duration,
}

impl std::fmt::Debug for ApiClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClientConfig")
            .field("base_url", &self.base_url)
            .field("bearer_token", &self.bearer_token.as_ref().map(|_| "<redacted>"))
            .field("ca_cert_pem", &self.ca_cert_pem.as_ref().map(|pem| pem.len()))
            .field("accept_invalid_certs", &self.accept_invalid_certs)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl ApiClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            bearer_token: None,
            ca_cert_pem: None,
            accept_invalid_certs: false,
            request_timeout: Duration::from_secs(5),
        }
    }

    /// Configuration for a process running inside a pod
    ///
    /// Uses `KUBERNETES_SERVICE_HOST`/`KUBERNETES_SERVICE_PORT` and the
    /// mounted service account token and CA bundle.
    pub fn in_cluster() -> Result<Self> {
        let host = std::env::var("KUBERNETES_SERVICE_HOST").map_err(|_| {
            ClientError::invalid_config(
                "KUBERNETES_SERVICE_HOST is not set",
                "Run inside a pod or pass --api-url explicitly",
            )
        })?;
        let port = std::env::var("KUBERNETES_SERVICE_PORT").unwrap_or_else(|_| "443".to_string());

        Self::in_cluster_with(&host, &port, Path::new(SERVICE_ACCOUNT_DIR))
    }

    /// Same as `in_cluster`, with the environment and credential directory supplied
    pub fn in_cluster_with(host: &str, port: &str, service_account_dir: &Path) -> Result<Self> {
        if host.is_empty() {
            return Err(ClientError::invalid_config(
                "empty API server host",
                "Run inside a pod or pass --api-url explicitly",
            ));
        }

        // IPv6 service hosts need brackets in the URL
        let base_url = if host.contains(':') {
            format!("https://[{}]:{}", host, port)
        } else {
            format!("https://{}:{}", host, port)
        };

        Self::new(base_url)
            .with_token_file(&service_account_dir.join("token"))?
            .with_ca_file(&service_account_dir.join("ca.crt"))
    }

    /// Read the bearer token from a file, trimming trailing whitespace
    pub fn with_token_file(mut self, path: &Path) -> Result<Self> {
        let token = std::fs::read_to_string(path)
            .map_err(|e| ClientError::file_unreadable(path.display().to_string(), e))?;
        let token = token.trim().to_string();
        if token.is_empty() {
            return Err(ClientError::invalid_config(
                format!("token file {} is empty", path.display()),
                "Check that the service account token is mounted",
            ));
        }
        self.bearer_token = Some(token);
        Ok(self)
    }

    /// Read an additional trusted CA bundle from a file
    pub fn with_ca_file(mut self, path: &Path) -> Result<Self> {
        let pem = std::fs::read(path)
            .map_err(|e| ClientError::file_unreadable(path.display().to_string(), e))?;
        self.ca_cert_pem = Some(pem);
        Ok(self)
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_in_cluster_with_reads_credentials() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("token"), "abc.def.ghi\n").unwrap();
        std::fs::write(dir.path().join("ca.crt"), "-----BEGIN CERTIFICATE-----\n").unwrap();

        let config = ApiClientConfig::in_cluster_with("10.96.0.1", "443", dir.path()).unwrap();
        assert_eq!(config.base_url, "https://10.96.0.1:443");
        assert_eq!(config.bearer_token.as_deref(), Some("abc.def.ghi"));
        assert!(config.ca_cert_pem.is_some());
        assert!(!config.accept_invalid_certs);
    }

    #[test]
    fn test_in_cluster_with_ipv6_host() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("token"), "t").unwrap();
        std::fs::write(dir.path().join("ca.crt"), "ca").unwrap();

        let config = ApiClientConfig::in_cluster_with("fd00::1", "6443", dir.path()).unwrap();
        assert_eq!(config.base_url, "https://[fd00::1]:6443");
    }

    #[test]
    fn test_missing_token_file() {
        let dir = tempdir().unwrap();
        let result = ApiClientConfig::in_cluster_with("10.96.0.1", "443", dir.path());
        assert!(matches!(
            result.unwrap_err(),
            ClientError::FileUnreadable { .. }
        ));
    }

    #[test]
    fn test_empty_token_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("token");
        std::fs::write(&path, "  \n").unwrap();

        let result = ApiClientConfig::new("https://api:6443").with_token_file(&path);
        assert!(matches!(result.unwrap_err(), ClientError::InvalidConfig { .. }));
    }

    #[test]
    fn test_debug_redacts_token() {
        let mut config = ApiClientConfig::new("https://api:6443");
        config.bearer_token = Some("secret-token".to_string());
        let debug = format!("{:?}", config);
        assert!(!debug.contains("secret-token"));
        assert!(debug.contains("<redacted>"));
    }
}

use crate::error::{CoreError, Result};
use k8s_openapi::api::core::v1::Pod;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Namespace assumed for objects that do not carry one
pub const DEFAULT_NAMESPACE: &str = "default";

/// GroupVersionKind uniquely identifies a Kubernetes resource type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupVersionKind {
    /// API group (e.g., "", "longhorn.io")
    pub group: String,
    /// API version (e.g., "v1", "v1beta2")
    pub version: String,
    /// Resource kind (e.g., "Pod", "ShareManager")
    pub kind: String,
}

impl GroupVersionKind {
    /// Create a new GVK
    pub fn new(group: impl Into<String>, version: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            version: version.into(),
            kind: kind.into(),
        }
    }

    /// Create a GVK from apiVersion and kind
    /// apiVersion format: "v1" or "group/version"
    pub fn from_api_version_kind(api_version: &str, kind: &str) -> Self {
        let (group, version) = match api_version.split_once('/') {
            Some((g, v)) => (g.to_string(), v.to_string()),
            None => (String::new(), api_version.to_string()),
        };

        Self {
            group,
            version,
            kind: kind.to_string(),
        }
    }

    pub fn pod() -> Self {
        Self::from_api_version_kind("v1", "Pod")
    }

    pub fn persistent_volume_claim() -> Self {
        Self::from_api_version_kind("v1", "PersistentVolumeClaim")
    }

    /// Get the apiVersion string (group/version or just version)
    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }

    /// Get the full API path segment
    pub fn api_path(&self) -> String {
        if self.group.is_empty() {
            format!("api/{}", self.version)
        } else {
            format!("apis/{}/{}", self.group, self.version)
        }
    }

    /// Get the resource name (lowercase, plural)
    pub fn resource_name(&self) -> String {
        let lower = self.kind.to_lowercase();
        if lower.ends_with('s') {
            format!("{}es", lower)
        } else if lower.ends_with('y') {
            format!("{}ies", &lower[..lower.len() - 1])
        } else {
            format!("{}s", lower)
        }
    }
}

impl fmt::Display for GroupVersionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.api_version(), self.kind)
    }
}

/// ResourceKey identifies one namespaced object of a given type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceKey {
    pub gvk: GroupVersionKind,
    pub namespace: String,
    pub name: String,
}

impl ResourceKey {
    pub fn new(gvk: GroupVersionKind, namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            gvk,
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Get the API path for this resource
    /// (e.g., /apis/longhorn.io/v1beta2/namespaces/longhorn-system/sharemanagers/pvc-1)
    pub fn api_path(&self) -> String {
        format!(
            "/{}/namespaces/{}/{}/{}",
            self.gvk.api_path(),
            self.namespace,
            self.gvk.resource_name(),
            self.name
        )
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.gvk, self.namespace, self.name)
    }
}

/// Namespace and name of an object, rendered as `namespace/name`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectKey {
    pub namespace: String,
    pub name: String,
}

impl ObjectKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Key of a pod, substituting the default namespace when unset
    pub fn for_pod(pod: &Pod) -> Self {
        Self {
            namespace: pod_namespace(pod).to_string(),
            name: pod.metadata.name.clone().unwrap_or_default(),
        }
    }

    /// Parse `namespace/name` or a bare `name`
    pub fn parse(reference: &str) -> Result<Self> {
        let (namespace, name) = match reference.split_once('/') {
            Some((ns, name)) => (ns, name),
            None => (DEFAULT_NAMESPACE, reference),
        };

        if namespace.is_empty() || name.is_empty() || name.contains('/') {
            return Err(CoreError::invalid_object_key(reference));
        }

        Ok(Self::new(namespace, name))
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Namespace of a pod, falling back to `default`
pub fn pod_namespace(pod: &Pod) -> &str {
    pod.metadata
        .namespace
        .as_deref()
        .filter(|ns| !ns.is_empty())
        .unwrap_or(DEFAULT_NAMESPACE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gvk_from_api_version() {
        let gvk = GroupVersionKind::from_api_version_kind("v1", "Pod");
        assert_eq!(gvk.group, "");
        assert_eq!(gvk.version, "v1");
        assert_eq!(gvk.api_version(), "v1");

        let gvk = GroupVersionKind::from_api_version_kind("longhorn.io/v1beta2", "ShareManager");
        assert_eq!(gvk.group, "longhorn.io");
        assert_eq!(gvk.version, "v1beta2");
        assert_eq!(gvk.api_version(), "longhorn.io/v1beta2");
    }

    #[test]
    fn test_gvk_resource_name() {
        assert_eq!(GroupVersionKind::pod().resource_name(), "pods");
        assert_eq!(
            GroupVersionKind::persistent_volume_claim().resource_name(),
            "persistentvolumeclaims"
        );
        let gvk = GroupVersionKind::from_api_version_kind("longhorn.io/v1beta2", "ShareManager");
        assert_eq!(gvk.resource_name(), "sharemanagers");
    }

    #[test]
    fn test_resource_key_api_path() {
        let key = ResourceKey::new(GroupVersionKind::pod(), "longhorn-system", "share-manager-pvc-1");
        assert_eq!(
            key.api_path(),
            "/api/v1/namespaces/longhorn-system/pods/share-manager-pvc-1"
        );

        let gvk = GroupVersionKind::from_api_version_kind("longhorn.io/v1beta2", "ShareManager");
        let key = ResourceKey::new(gvk, "longhorn-system", "pvc-1");
        assert_eq!(
            key.api_path(),
            "/apis/longhorn.io/v1beta2/namespaces/longhorn-system/sharemanagers/pvc-1"
        );
    }

    #[test]
    fn test_object_key_parse() {
        let key = ObjectKey::parse("vms/vm-1").unwrap();
        assert_eq!(key, ObjectKey::new("vms", "vm-1"));

        let key = ObjectKey::parse("vm-1").unwrap();
        assert_eq!(key.namespace, "default");
        assert_eq!(key.to_string(), "default/vm-1");

        assert!(ObjectKey::parse("").is_err());
        assert!(ObjectKey::parse("/vm").is_err());
        assert!(ObjectKey::parse("a/b/c").is_err());
    }

    #[test]
    fn test_pod_namespace_fallback() {
        let mut pod = Pod::default();
        assert_eq!(pod_namespace(&pod), "default");

        pod.metadata.namespace = Some("vms".to_string());
        assert_eq!(pod_namespace(&pod), "vms");
    }
}

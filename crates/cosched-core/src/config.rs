use crate::error::{CoreError, Result};
use crate::types::GroupVersionKind;
use std::fmt;
use std::str::FromStr;

/// Name of the plugin in the scheduler profile
pub const PLUGIN_NAME: &str = "LonghornCoSchedule";

/// Opt-in annotation a pod must carry to be co-scheduled
pub const ANNOTATION_KEY: &str = "kubevirt-scheduler/co-schedule";

/// Only this exact annotation value opts a pod in
pub const ANNOTATION_VALUE: &str = "true";

/// Label KubeVirt sets on migration target pods
pub const MIGRATION_TARGET_LABEL: &str = "kubevirt.io/migrationJobUID";

/// Namespace holding Longhorn share-managers and their pods
pub const LONGHORN_NAMESPACE: &str = "longhorn-system";

/// Share-manager pods are named `share-manager-<pv-name>`
pub const SHARE_MANAGER_PREFIX: &str = "share-manager-";

pub const SHARE_MANAGER_API_VERSION: &str = "longhorn.io/v1beta2";
pub const SHARE_MANAGER_KIND: &str = "ShareManager";

/// Highest score a node can receive
pub const MAX_NODE_SCORE: i64 = 100;

/// What the resolver does once the first usable claim has answered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConflictPolicy {
    /// Stop at the first claim that resolves to a node
    #[default]
    FirstMatch,
    /// Keep the first answer, but resolve the remaining claims and warn on disagreement
    Report,
}

impl fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictPolicy::FirstMatch => write!(f, "first-match"),
            ConflictPolicy::Report => write!(f, "report"),
        }
    }
}

impl FromStr for ConflictPolicy {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "first-match" => Ok(ConflictPolicy::FirstMatch),
            "report" => Ok(ConflictPolicy::Report),
            other => Err(CoreError::invalid_config(
                format!("unknown conflict policy '{}'", other),
                "Use 'first-match' or 'report'",
            )),
        }
    }
}

/// Markers, names and limits shared by the gate, resolver and engines
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoScheduleConfig {
    pub annotation_key: String,
    pub annotation_value: String,
    pub migration_target_label: String,
    /// Namespace queried for both the ShareManager and its pod
    pub companion_namespace: String,
    pub share_manager_prefix: String,
    pub share_manager_gvk: GroupVersionKind,
    pub max_node_score: i64,
    pub conflict_policy: ConflictPolicy,
}

impl Default for CoScheduleConfig {
    fn default() -> Self {
        Self {
            annotation_key: ANNOTATION_KEY.to_string(),
            annotation_value: ANNOTATION_VALUE.to_string(),
            migration_target_label: MIGRATION_TARGET_LABEL.to_string(),
            companion_namespace: LONGHORN_NAMESPACE.to_string(),
            share_manager_prefix: SHARE_MANAGER_PREFIX.to_string(),
            share_manager_gvk: GroupVersionKind::from_api_version_kind(
                SHARE_MANAGER_API_VERSION,
                SHARE_MANAGER_KIND,
            ),
            max_node_score: MAX_NODE_SCORE,
            conflict_policy: ConflictPolicy::default(),
        }
    }
}

impl CoScheduleConfig {
    /// Name of the share-manager pod serving the given PV
    pub fn share_manager_pod_name(&self, pv_name: &str) -> String {
        format!("{}{}", self.share_manager_prefix, pv_name)
    }

    /// Reject configurations that could never match anything
    pub fn validate(&self) -> Result<()> {
        if self.annotation_key.is_empty() {
            return Err(CoreError::invalid_config(
                "opt-in annotation key is empty",
                "Leave the annotation key at its default or provide a non-empty key",
            ));
        }
        if self.migration_target_label.is_empty() {
            return Err(CoreError::invalid_config(
                "migration target label is empty",
                "Leave the label at its default or provide a non-empty key",
            ));
        }
        if self.companion_namespace.is_empty() {
            return Err(CoreError::invalid_config(
                "companion namespace is empty",
                "Set --companion-namespace to the namespace Longhorn is installed in",
            ));
        }
        if self.max_node_score <= 0 {
            return Err(CoreError::invalid_config(
                format!("max node score must be positive, got {}", self.max_node_score),
                "Use the scheduler framework's MaxNodeScore (100)",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CoScheduleConfig::default();
        assert_eq!(config.annotation_key, "kubevirt-scheduler/co-schedule");
        assert_eq!(config.companion_namespace, "longhorn-system");
        assert_eq!(config.share_manager_gvk.resource_name(), "sharemanagers");
        assert_eq!(config.max_node_score, 100);
        assert_eq!(config.conflict_policy, ConflictPolicy::FirstMatch);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_share_manager_pod_name() {
        let config = CoScheduleConfig::default();
        assert_eq!(
            config.share_manager_pod_name("pvc-0a1b"),
            "share-manager-pvc-0a1b"
        );
    }

    #[test]
    fn test_validate_rejects_empty_namespace() {
        let config = CoScheduleConfig {
            companion_namespace: String::new(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate().unwrap_err(),
            CoreError::InvalidConfig { .. }
        ));
    }

    #[test]
    fn test_conflict_policy_parse() {
        assert_eq!(
            "first-match".parse::<ConflictPolicy>().unwrap(),
            ConflictPolicy::FirstMatch
        );
        assert_eq!("report".parse::<ConflictPolicy>().unwrap(), ConflictPolicy::Report);
        assert!("loudly".parse::<ConflictPolicy>().is_err());
        assert_eq!(ConflictPolicy::Report.to_string(), "report");
    }
}

//! Wire types of the kube-scheduler extender protocol (`k8s.io/kube-scheduler/extender/v1`).

use cosched_core::{Node, Pod};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Highest priority an extender may report
pub const MAX_EXTENDER_PRIORITY: i64 = 10;

/// Request body of both `/filter` and `/prioritize`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtenderArgs {
    pub pod: Pod,
    /// Full node objects, sent when the extender is not node-cache capable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nodes: Option<NodeList>,
    /// Node names only, sent when the extender is node-cache capable
    #[serde(default, rename = "nodenames", skip_serializing_if = "Option::is_none")]
    pub node_names: Option<Vec<String>>,
}

impl ExtenderArgs {
    /// Candidate node names in request order, `None` for a nameless node object
    pub fn candidates(&self) -> Option<Vec<Option<String>>> {
        if let Some(nodes) = &self.nodes {
            return Some(
                nodes
                    .items
                    .iter()
                    .map(|n| n.metadata.name.clone().filter(|name| !name.is_empty()))
                    .collect(),
            );
        }
        self.node_names
            .as_ref()
            .map(|names| names.iter().cloned().map(Some).collect())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeList {
    #[serde(default)]
    pub items: Vec<Node>,
}

/// Response body of `/filter`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtenderFilterResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nodes: Option<NodeList>,
    #[serde(default, rename = "nodenames", skip_serializing_if = "Option::is_none")]
    pub node_names: Option<Vec<String>>,
    /// Rejected node name to reason
    #[serde(default, rename = "failedNodes")]
    pub failed_nodes: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExtenderFilterResult {
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Default::default()
        }
    }
}

/// One entry of the `/prioritize` response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostPriority {
    pub host: String,
    pub score: i64,
}

/// Map a plugin score in `[0, max_score]` onto `[0, MAX_EXTENDER_PRIORITY]`
pub fn scale_score(score: i64, max_score: i64) -> i64 {
    if max_score <= 0 {
        return 0;
    }
    (score.clamp(0, max_score) * MAX_EXTENDER_PRIORITY) / max_score
}

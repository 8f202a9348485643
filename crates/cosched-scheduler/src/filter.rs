use crate::gate::GateDecision;
use crate::types::{CycleContext, FilterResult, Resolution};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Node, Pod};

/// Filter plugin trait
#[async_trait]
pub trait FilterPlugin: Send + Sync {
    /// Decide whether the pod may run on the node
    async fn filter(&self, ctx: &CycleContext, pod: &Pod, node: &Node) -> FilterResult;

    /// Name of the plugin
    fn name(&self) -> &str;
}

/// Constraint check for one candidate node
///
/// Pure: the same inputs always give the same result, whatever other
/// candidates are being evaluated alongside.
pub fn evaluate(gate: &GateDecision, resolution: &Resolution, node_name: &str) -> FilterResult {
    if !gate.applies() {
        return FilterResult::pass(node_name);
    }

    match resolution {
        Resolution::Unassigned => FilterResult::pass(node_name),
        Resolution::Failed(cause) => FilterResult::error(node_name, cause.clone()),
        Resolution::Node(target) if target == node_name => FilterResult::pass(node_name),
        Resolution::Node(target) => FilterResult::fail(
            node_name,
            format!(
                "node {:?} rejected: Longhorn share-manager is running on node {:?}",
                node_name, target
            ),
        ),
    }
}

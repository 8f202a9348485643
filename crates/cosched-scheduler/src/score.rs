use crate::gate::GateDecision;
use crate::types::{CycleContext, Resolution, ScoreResult};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;

/// Score plugin trait
#[async_trait]
pub trait ScorePlugin: Send + Sync {
    /// Score a node for the given pod (0 to `max_score`, higher is better)
    async fn score(&self, ctx: &CycleContext, pod: &Pod, node_name: &str) -> ScoreResult;

    /// Highest score this plugin hands out
    fn max_score(&self) -> i64;

    /// Name of the plugin
    fn name(&self) -> &str;
}

/// Preference for one candidate node
///
/// A step function: the companion node gets `max_score`, every other case 0.
pub fn score(
    gate: &GateDecision,
    resolution: &Resolution,
    node_name: &str,
    max_score: i64,
) -> ScoreResult {
    if !gate.applies() {
        return ScoreResult::new(node_name, 0);
    }

    match resolution {
        Resolution::Node(target) if target == node_name => ScoreResult::new(node_name, max_score),
        Resolution::Node(_) | Resolution::Unassigned => ScoreResult::new(node_name, 0),
        Resolution::Failed(cause) => ScoreResult::error(node_name, cause.clone()),
    }
}

/// Sum per-plugin scores for one node
pub fn total_score(scores: &[ScoreResult]) -> i64 {
    scores.iter().map(|s| s.score).sum()
}

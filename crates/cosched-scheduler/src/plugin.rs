use crate::error::Result;
use crate::filter::{self, FilterPlugin};
use crate::gate::{self, GateDecision};
use crate::resolver::DependencyResolver;
use crate::score::{self, ScorePlugin};
use crate::types::{CycleContext, FilterResult, Resolution, ScoreResult};
use async_trait::async_trait;
use cosched_client::ClusterReader;
use cosched_core::{CoScheduleConfig, ObjectKey, PLUGIN_NAME};
use k8s_openapi::api::core::v1::{Node, Pod};
use std::sync::Arc;
use tracing::{debug, error};

/// Keeps opted-in VM pods on the node running their Longhorn share-manager
///
/// Holds no state between calls: every `filter` and `score` evaluates the
/// gate and, when it applies, resolves the companion node afresh.
pub struct CoSchedulePlugin {
    config: Arc<CoScheduleConfig>,
    resolver: DependencyResolver,
}

impl CoSchedulePlugin {
    /// Create the plugin around an injected cluster reader
    pub fn new(reader: Arc<dyn ClusterReader>, config: CoScheduleConfig) -> Result<Self> {
        config.validate()?;
        let config = Arc::new(config);

        Ok(Self {
            resolver: DependencyResolver::new(reader, config.clone()),
            config,
        })
    }

    pub fn name(&self) -> &'static str {
        PLUGIN_NAME
    }

    pub fn config(&self) -> &CoScheduleConfig {
        &self.config
    }

    pub fn resolver(&self) -> &DependencyResolver {
        &self.resolver
    }

    pub fn gate(&self, pod: &Pod) -> GateDecision {
        gate::evaluate(pod, &self.config)
    }

    /// Resolve the companion node when the gate applies
    ///
    /// Failures are logged and carried in the returned `Resolution`.
    pub async fn resolve(
        &self,
        ctx: &CycleContext,
        pod: &Pod,
        gate: &GateDecision,
    ) -> Resolution {
        let pod_key = ObjectKey::for_pod(pod);

        match gate {
            GateDecision::Applies => {}
            GateDecision::NotOptedIn => {
                debug!(pod = %pod_key, "Pod has not opted in to co-scheduling");
                return Resolution::Unassigned;
            }
            GateDecision::MigrationTarget { migration_job } => {
                debug!(
                    pod = %pod_key,
                    migration_job = %migration_job,
                    "Pod is a migration target, co-scheduling suppressed"
                );
                return Resolution::Unassigned;
            }
        }

        let result = self.resolver.resolve(ctx, pod).await;
        if let Err(e) = &result {
            error!(pod = %pod_key, error = %e, "Failed to resolve share-manager node");
        }
        Resolution::from(result)
    }

    /// Gate and resolution for one pod, computed once for a whole candidate set
    pub async fn prepare(&self, ctx: &CycleContext, pod: &Pod) -> (GateDecision, Resolution) {
        let gate = self.gate(pod);
        let resolution = self.resolve(ctx, pod, &gate).await;
        (gate, resolution)
    }
}

#[async_trait]
impl FilterPlugin for CoSchedulePlugin {
    async fn filter(&self, ctx: &CycleContext, pod: &Pod, node: &Node) -> FilterResult {
        let node_name = node.metadata.name.as_deref().unwrap_or_default();
        let gate = self.gate(pod);

        // Pods outside the gate pass any node, named or not
        if gate.applies() && node_name.is_empty() {
            return FilterResult::error("", "node not found");
        }

        let resolution = self.resolve(ctx, pod, &gate).await;
        let result = filter::evaluate(&gate, &resolution, node_name);

        debug!(
            pod = %ObjectKey::for_pod(pod),
            node = %node_name,
            status = %result.code,
            reason = result.reason.as_deref().unwrap_or(""),
            "Filter"
        );
        result
    }

    fn name(&self) -> &str {
        PLUGIN_NAME
    }
}

#[async_trait]
impl ScorePlugin for CoSchedulePlugin {
    async fn score(&self, ctx: &CycleContext, pod: &Pod, node_name: &str) -> ScoreResult {
        let (gate, resolution) = self.prepare(ctx, pod).await;
        let result = score::score(&gate, &resolution, node_name, self.config.max_node_score);

        debug!(
            pod = %ObjectKey::for_pod(pod),
            node = %node_name,
            score = result.score,
            status = %result.code,
            "Score"
        );
        result
    }

    fn max_score(&self) -> i64 {
        self.config.max_node_score
    }

    fn name(&self) -> &str {
        PLUGIN_NAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;
    use crate::types::StatusCode;
    use cosched_client::{MockCluster, MockKind};
    use futures_util::future::join_all;

    fn plugin(cluster: &MockCluster) -> CoSchedulePlugin {
        CoSchedulePlugin::new(Arc::new(cluster.clone()), CoScheduleConfig::default()).unwrap()
    }

    async fn filter_all(plugin: &CoSchedulePlugin, pod: &Pod, nodes: &[&str]) -> Vec<FilterResult> {
        let ctx = CycleContext::background();
        let mut results = Vec::new();
        for name in nodes {
            results.push(plugin.filter(&ctx, pod, &make_node(name)).await);
        }
        results
    }

    async fn score_all(plugin: &CoSchedulePlugin, pod: &Pod, nodes: &[&str]) -> Vec<i64> {
        let ctx = CycleContext::background();
        let mut scores = Vec::new();
        for name in nodes {
            scores.push(plugin.score(&ctx, pod, name).await.score);
        }
        scores
    }

    /// Cluster with one bound RWX claim whose share-manager runs on node-2
    async fn cluster_with_companion() -> MockCluster {
        let cluster = MockCluster::new();
        cluster.add_claim(make_rwx_claim("vm-disk", "pvc-1")).await;
        add_share_manager(&cluster, "pvc-1", Some("node-2"), Some("running")).await;
        cluster
    }

    #[test]
    fn test_plugin_name() {
        let plugin = plugin(&MockCluster::new());
        assert_eq!(plugin.name(), "LonghornCoSchedule");
        assert_eq!(FilterPlugin::name(&plugin), "LonghornCoSchedule");
        assert_eq!(ScorePlugin::name(&plugin), "LonghornCoSchedule");
        assert_eq!(plugin.max_score(), 100);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = CoScheduleConfig {
            companion_namespace: String::new(),
            ..Default::default()
        };
        assert!(CoSchedulePlugin::new(Arc::new(MockCluster::new()), config).is_err());
    }

    #[tokio::test]
    async fn test_not_opted_in_is_transparent() {
        let cluster = cluster_with_companion().await;
        let plugin = plugin(&cluster);
        let pod = make_vm(false, &["vm-disk"]);

        let results = filter_all(&plugin, &pod, &["node-1", "node-2"]).await;
        assert!(results.iter().all(|r| r.passed()));
        assert_eq!(score_all(&plugin, &pod, &["node-1", "node-2"]).await, vec![0, 0]);
        assert!(cluster.queries().await.is_empty());
    }

    #[tokio::test]
    async fn test_no_companion_admits_all() {
        let cluster = MockCluster::new();
        cluster.add_claim(make_rwx_claim("vm-disk", "pvc-1")).await;
        let plugin = plugin(&cluster);
        let pod = make_vm(true, &["vm-disk"]);

        let results = filter_all(&plugin, &pod, &["node-1", "node-2", "node-3"]).await;
        assert!(results.iter().all(|r| r.passed()));
        assert_eq!(
            score_all(&plugin, &pod, &["node-1", "node-2", "node-3"]).await,
            vec![0, 0, 0]
        );
    }

    #[tokio::test]
    async fn test_share_manager_owner_pins_pod() {
        let cluster = cluster_with_companion().await;
        let plugin = plugin(&cluster);
        let pod = make_vm(true, &["vm-disk"]);

        let results = filter_all(&plugin, &pod, &["node-1", "node-2"]).await;
        assert_eq!(results[0].code, StatusCode::Unschedulable);
        assert!(results[1].passed());
        assert_eq!(score_all(&plugin, &pod, &["node-1", "node-2"]).await, vec![0, 100]);
    }

    #[tokio::test]
    async fn test_share_manager_pod_pins_pod() {
        let cluster = MockCluster::new();
        cluster.add_claim(make_rwx_claim("vm-disk", "pvc-1")).await;
        cluster
            .add_pod(make_share_manager_pod("pvc-1", "node-2", "Running"))
            .await;
        let plugin = plugin(&cluster);
        let pod = make_vm(true, &["vm-disk"]);

        let results = filter_all(&plugin, &pod, &["node-1", "node-2"]).await;
        assert_eq!(results[0].code, StatusCode::Unschedulable);
        assert!(results[1].passed());
        assert_eq!(score_all(&plugin, &pod, &["node-1", "node-2"]).await, vec![0, 100]);
    }

    #[tokio::test]
    async fn test_migration_target_is_transparent() {
        let cluster = cluster_with_companion().await;
        let plugin = plugin(&cluster);
        let pod = make_migration_target(make_vm(true, &["vm-disk"]));

        let results = filter_all(&plugin, &pod, &["node-1", "node-2"]).await;
        assert!(results.iter().all(|r| r.passed()));
        assert_eq!(score_all(&plugin, &pod, &["node-1", "node-2"]).await, vec![0, 0]);
        assert!(cluster.queries().await.is_empty());
    }

    #[tokio::test]
    async fn test_lookup_failure_is_error_everywhere() {
        let cluster = MockCluster::new();
        cluster.add_claim(make_rwx_claim("vm-disk", "pvc-1")).await;
        cluster
            .fail(MockKind::CustomObject, "etcdserver: leader changed")
            .await;
        let plugin = plugin(&cluster);
        let pod = make_vm(true, &["vm-disk"]);
        let ctx = CycleContext::background();

        for name in ["node-1", "node-2"] {
            let filtered = plugin.filter(&ctx, &pod, &make_node(name)).await;
            assert!(filtered.is_error(), "{}", name);
            assert!(filtered
                .reason
                .as_deref()
                .unwrap_or_default()
                .contains("ShareManager"));

            let scored = plugin.score(&ctx, &pod, name).await;
            assert!(scored.is_error());
            assert_eq!(scored.score, 0);
        }
    }

    #[tokio::test]
    async fn test_unnamed_node_is_error() {
        let plugin = plugin(&MockCluster::new());
        let pod = make_vm(true, &["vm-disk"]);

        let result = plugin
            .filter(&CycleContext::background(), &pod, &Node::default())
            .await;
        assert!(result.is_error());
        assert_eq!(result.reason.as_deref(), Some("node not found"));
    }

    #[tokio::test]
    async fn test_unnamed_node_passes_outside_gate() {
        let cluster = cluster_with_companion().await;
        let plugin = plugin(&cluster);
        let ctx = CycleContext::background();

        for pod in [
            make_vm(false, &["vm-disk"]),
            make_migration_target(make_vm(true, &["vm-disk"])),
        ] {
            let result = plugin.filter(&ctx, &pod, &Node::default()).await;
            assert!(result.passed(), "{:?}", result);
            assert!(result.reason.is_none());
        }
        assert!(cluster.queries().await.is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_cycle_is_error() {
        let cluster = cluster_with_companion().await;
        let plugin = plugin(&cluster);
        let pod = make_vm(true, &["vm-disk"]);

        let ctx = CycleContext::background();
        ctx.token().cancel();

        let result = plugin.filter(&ctx, &pod, &make_node("node-2")).await;
        assert!(result.is_error());
    }

    #[tokio::test]
    async fn test_filter_and_score_agree() {
        let cluster = cluster_with_companion().await;
        let plugin = plugin(&cluster);
        let pod = make_vm(true, &["vm-disk"]);
        let nodes = ["node-1", "node-2", "node-3"];

        let filtered = filter_all(&plugin, &pod, &nodes).await;
        let scores = score_all(&plugin, &pod, &nodes).await;

        for (result, score) in filtered.iter().zip(scores) {
            if score == 100 {
                assert!(result.passed());
            }
            if !result.passed() {
                assert_eq!(score, 0);
            }
        }
    }

    #[tokio::test]
    async fn test_concurrent_filters_agree() {
        let cluster = cluster_with_companion().await;
        let plugin = plugin(&cluster);
        let pod = make_vm(true, &["vm-disk"]);
        let ctx = CycleContext::background();
        let nodes: Vec<Node> = (1..=8).map(|i| make_node(&format!("node-{}", i))).collect();

        let results = join_all(nodes.iter().map(|node| plugin.filter(&ctx, &pod, node))).await;

        let admitted: Vec<_> = results
            .iter()
            .filter(|r| r.passed())
            .map(|r| r.node_name.as_str())
            .collect();
        assert_eq!(admitted, vec!["node-2"]);
    }

    #[tokio::test]
    async fn test_prepare_resolves_once() {
        let cluster = cluster_with_companion().await;
        let plugin = plugin(&cluster);
        let pod = make_vm(true, &["vm-disk"]);

        let (gate, resolution) = plugin.prepare(&CycleContext::background(), &pod).await;
        assert_eq!(gate, GateDecision::Applies);
        assert_eq!(resolution, Resolution::Node("node-2".to_string()));
        assert_eq!(
            cluster.queries().await,
            vec![
                "PersistentVolumeClaim vms/vm-disk".to_string(),
                "CustomObject longhorn-system/pvc-1".to_string(),
            ]
        );
    }
}
